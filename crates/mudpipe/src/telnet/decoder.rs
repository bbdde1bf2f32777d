//! Telnet 解碼器
//!
//! 可跨任意讀取邊界續接的逐位元組狀態機：
//! 從原始位元組流剝離協定框架，輸出乾淨的應用資料與協商事件

use std::collections::HashMap;

use tracing::{debug, trace};

use super::protocol::{
    should_filter, OptionState, TelnetCommand, TelnetEvent, TelnetOption, IAC,
};

/// 解碼器狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    /// 一般資料
    Data,
    /// 已讀到 IAC，等待命令位元組
    Command,
    /// 已讀到 WILL/WONT/DO/DONT，等待選項位元組
    Negotiation(TelnetCommand),
    /// 已讀到 IAC SB，等待選項位元組
    SubnegotiationOption,
    /// 收集 sub-negotiation 內容
    Subnegotiation,
    /// sub-negotiation 中讀到 IAC，等待 SE 或轉義
    SubnegotiationIac,
}

/// 一次 `decode` 呼叫的結果
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DecodeOutput {
    /// 乾淨的應用資料（不含任何 Telnet 命令位元組）
    pub data: Vec<u8>,
    /// 解析出的協定事件
    pub events: Vec<TelnetEvent>,
    /// 應回傳給伺服器的協商回應位元組
    pub replies: Vec<u8>,
}

/// Telnet 協定解碼器
///
/// 協定狀態跨呼叫保存：命令或 sub-negotiation 被 TCP 讀取邊界
/// 切開時，下一次呼叫會從中斷處續接。畸形序列不回報錯誤，
/// 解碼器停留在部分命令狀態直到可辨識的形式完成
pub struct TelnetDecoder {
    state: DecoderState,
    /// 目前 sub-negotiation 的選項位元組
    sub_option: u8,
    /// sub-negotiation 內容緩衝
    sub_buffer: Vec<u8>,
    /// 各選項的協商狀態，首次協商時建立
    options: HashMap<u8, OptionState>,
}

impl TelnetDecoder {
    /// 創建新的解碼器
    ///
    /// 預設接受 Suppress Go Ahead 與 GMCP；其他選項一律拒絕
    pub fn new() -> Self {
        let mut options = HashMap::new();
        for opt in [TelnetOption::SuppressGoAhead, TelnetOption::Gmcp] {
            options.insert(
                opt.as_byte(),
                OptionState {
                    supported: true,
                    ..OptionState::default()
                },
            );
        }

        Self {
            state: DecoderState::Data,
            sub_option: 0,
            sub_buffer: Vec::new(),
            options,
        }
    }

    /// 設定某選項是否由本端支援
    pub fn set_supported(&mut self, option: TelnetOption, supported: bool) {
        self.options.entry(option.as_byte()).or_default().supported = supported;
    }

    /// 查詢某選項的協商狀態
    pub fn option_state(&self, option: TelnetOption) -> Option<OptionState> {
        self.options.get(&option.as_byte()).copied()
    }

    /// 解碼一段位元組
    ///
    /// 輸入可以在任意邊界切割，結果與一次送入完全相同。
    /// `replies` 由呼叫方負責送回伺服器
    pub fn decode(&mut self, input: &[u8]) -> DecodeOutput {
        let mut output = DecodeOutput::default();

        for &b in input {
            match self.state {
                DecoderState::Data => {
                    if b == IAC {
                        self.state = DecoderState::Command;
                    } else if !should_filter(b) {
                        output.data.push(b);
                    }
                }
                DecoderState::Command => match TelnetCommand::from_byte(b) {
                    _ if b == IAC => {
                        // IAC IAC = 字面 0xFF
                        output.data.push(IAC);
                        self.state = DecoderState::Data;
                    }
                    Some(TelnetCommand::Sb) => {
                        self.state = DecoderState::SubnegotiationOption;
                    }
                    Some(
                        cmd @ (TelnetCommand::Will
                        | TelnetCommand::Wont
                        | TelnetCommand::Do
                        | TelnetCommand::Dont),
                    ) => {
                        self.state = DecoderState::Negotiation(cmd);
                    }
                    Some(cmd) if cmd.is_simple() => {
                        trace!("收到單位元組命令: {:?}", cmd);
                        self.state = DecoderState::Data;
                    }
                    _ => {
                        // 未預期的位元組，靜默吸收
                        trace!("IAC 後收到未預期位元組: {}", b);
                        self.state = DecoderState::Data;
                    }
                },
                DecoderState::Negotiation(cmd) => {
                    let option = TelnetOption::from_byte(b);
                    debug!("收到協商: {:?} {:?}", cmd, option);
                    output.events.push(TelnetEvent::Command(cmd, option));
                    self.negotiate(cmd, b, &mut output.replies);
                    self.state = DecoderState::Data;
                }
                DecoderState::SubnegotiationOption => {
                    self.sub_option = b;
                    self.sub_buffer.clear();
                    self.state = DecoderState::Subnegotiation;
                }
                DecoderState::Subnegotiation => {
                    if b == IAC {
                        self.state = DecoderState::SubnegotiationIac;
                    } else {
                        self.sub_buffer.push(b);
                    }
                }
                DecoderState::SubnegotiationIac => {
                    if b == TelnetCommand::Se as u8 {
                        let option = TelnetOption::from_byte(self.sub_option);
                        debug!(
                            "收到 sub-negotiation: {:?} ({} bytes)",
                            option,
                            self.sub_buffer.len()
                        );
                        output.events.push(TelnetEvent::Subnegotiation(
                            option,
                            std::mem::take(&mut self.sub_buffer),
                        ));
                        self.state = DecoderState::Data;
                    } else if b == IAC {
                        // IAC IAC 在 sub-negotiation 內 = 字面 0xFF
                        self.sub_buffer.push(IAC);
                        self.state = DecoderState::Subnegotiation;
                    } else {
                        // 非 SE 的命令位元組，原樣併入內容繼續收集
                        self.sub_buffer.push(IAC);
                        self.sub_buffer.push(b);
                        self.state = DecoderState::Subnegotiation;
                    }
                }
            }
        }

        output
    }

    /// 依 RFC 854 產生協商回應並更新選項狀態
    fn negotiate(&mut self, cmd: TelnetCommand, option_byte: u8, replies: &mut Vec<u8>) {
        let state = self.options.entry(option_byte).or_default();

        let reply = match cmd {
            TelnetCommand::Will => {
                if state.supported {
                    state.remote_enabled = true;
                    TelnetCommand::Do
                } else {
                    TelnetCommand::Dont
                }
            }
            TelnetCommand::Wont => {
                state.remote_enabled = false;
                TelnetCommand::Dont
            }
            TelnetCommand::Do => {
                if state.supported {
                    state.local_enabled = true;
                    TelnetCommand::Will
                } else {
                    TelnetCommand::Wont
                }
            }
            TelnetCommand::Dont => {
                state.local_enabled = false;
                TelnetCommand::Wont
            }
            _ => return,
        };

        replies.extend_from_slice(&[IAC, reply as u8, option_byte]);
    }
}

impl Default for TelnetDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_passthrough() {
        let mut decoder = TelnetDecoder::new();
        let out = decoder.decode(b"Hello World");
        assert_eq!(out.data, b"Hello World");
        assert!(out.events.is_empty());
        assert!(out.replies.is_empty());
    }

    #[test]
    fn test_escaped_iac() {
        let mut decoder = TelnetDecoder::new();
        let out = decoder.decode(&[b'A', IAC, IAC, b'B']);
        assert_eq!(out.data, vec![b'A', IAC, b'B']);
        assert!(out.events.is_empty());
    }

    #[test]
    fn test_will_unsupported_refused() {
        let mut decoder = TelnetDecoder::new();
        let out = decoder.decode(&[IAC, TelnetCommand::Will as u8, 1]); // ECHO
        assert!(out.data.is_empty());
        assert_eq!(
            out.events,
            vec![TelnetEvent::Command(
                TelnetCommand::Will,
                TelnetOption::Echo
            )]
        );
        assert_eq!(out.replies, vec![IAC, TelnetCommand::Dont as u8, 1]);
    }

    #[test]
    fn test_will_supported_accepted() {
        let mut decoder = TelnetDecoder::new();
        let sga = TelnetOption::SuppressGoAhead.as_byte();
        let out = decoder.decode(&[IAC, TelnetCommand::Will as u8, sga]);
        assert_eq!(out.replies, vec![IAC, TelnetCommand::Do as u8, sga]);
        assert!(
            decoder
                .option_state(TelnetOption::SuppressGoAhead)
                .unwrap()
                .remote_enabled
        );
    }

    #[test]
    fn test_do_supported_accepted() {
        let mut decoder = TelnetDecoder::new();
        decoder.set_supported(TelnetOption::Naws, true);
        let naws = TelnetOption::Naws.as_byte();
        let out = decoder.decode(&[IAC, TelnetCommand::Do as u8, naws]);
        assert_eq!(out.replies, vec![IAC, TelnetCommand::Will as u8, naws]);
        assert!(
            decoder
                .option_state(TelnetOption::Naws)
                .unwrap()
                .local_enabled
        );
    }

    #[test]
    fn test_dont_disables_local() {
        let mut decoder = TelnetDecoder::new();
        let sga = TelnetOption::SuppressGoAhead.as_byte();
        decoder.decode(&[IAC, TelnetCommand::Do as u8, sga]);
        let out = decoder.decode(&[IAC, TelnetCommand::Dont as u8, sga]);
        assert_eq!(out.replies, vec![IAC, TelnetCommand::Wont as u8, sga]);
        assert!(
            !decoder
                .option_state(TelnetOption::SuppressGoAhead)
                .unwrap()
                .local_enabled
        );
    }

    #[test]
    fn test_split_boundary_invariance() {
        // 3 位元組協商命令在每個邊界切開，結果都必須與一次送入相同
        let input = [IAC, TelnetCommand::Will as u8, 1];

        let mut whole = TelnetDecoder::new();
        let expected = whole.decode(&input);

        for split in 1..input.len() {
            let mut decoder = TelnetDecoder::new();
            let mut first = decoder.decode(&input[..split]);
            let second = decoder.decode(&input[split..]);
            first.events.extend(second.events);
            first.replies.extend(second.replies);
            first.data.extend(second.data);
            assert_eq!(first.events, expected.events, "split at {}", split);
            assert_eq!(first.replies, expected.replies, "split at {}", split);
            assert_eq!(first.data, expected.data, "split at {}", split);
        }
    }

    #[test]
    fn test_subnegotiation() {
        let mut decoder = TelnetDecoder::new();
        let mut input = vec![IAC, TelnetCommand::Sb as u8, 201]; // GMCP
        input.extend_from_slice(b"Core.Hello");
        input.extend_from_slice(&[IAC, TelnetCommand::Se as u8]);

        let out = decoder.decode(&input);
        assert_eq!(
            out.events,
            vec![TelnetEvent::Subnegotiation(
                TelnetOption::Gmcp,
                b"Core.Hello".to_vec()
            )]
        );
        assert!(out.data.is_empty());
    }

    #[test]
    fn test_subnegotiation_split_across_reads() {
        let mut decoder = TelnetDecoder::new();
        let out1 = decoder.decode(&[IAC, TelnetCommand::Sb as u8, 201, b'a']);
        assert!(out1.events.is_empty());

        let out2 = decoder.decode(&[b'b', IAC, TelnetCommand::Se as u8, b'X']);
        assert_eq!(
            out2.events,
            vec![TelnetEvent::Subnegotiation(
                TelnetOption::Gmcp,
                b"ab".to_vec()
            )]
        );
        assert_eq!(out2.data, b"X");
    }

    #[test]
    fn test_subnegotiation_escaped_iac_in_payload() {
        let mut decoder = TelnetDecoder::new();
        let input = [
            IAC,
            TelnetCommand::Sb as u8,
            69, // MSDP
            IAC,
            IAC,
            IAC,
            TelnetCommand::Se as u8,
        ];
        let out = decoder.decode(&input);
        assert_eq!(
            out.events,
            vec![TelnetEvent::Subnegotiation(TelnetOption::Msdp, vec![IAC])]
        );
    }

    #[test]
    fn test_simple_commands_dropped() {
        let mut decoder = TelnetDecoder::new();
        let out = decoder.decode(&[b'A', IAC, TelnetCommand::GoAhead as u8, b'B']);
        assert_eq!(out.data, b"AB");
        assert!(out.events.is_empty());
        assert!(out.replies.is_empty());
    }

    #[test]
    fn test_control_chars_filtered() {
        let mut decoder = TelnetDecoder::new();
        let out = decoder.decode(&[b'A', 0x00, 0x01, b'B', 0x07, 0x1B, b'[']);
        // NUL 與 SOH 被過濾，BEL 與 ESC 保留
        assert_eq!(out.data, vec![b'A', b'B', 0x07, 0x1B, b'[']);
    }

    #[test]
    fn test_unexpected_byte_after_iac_absorbed() {
        let mut decoder = TelnetDecoder::new();
        // 239 (EOR) 不在已知命令中，吸收後繼續
        let out = decoder.decode(&[b'A', IAC, 239, b'B']);
        assert_eq!(out.data, b"AB");
        assert!(out.events.is_empty());
    }

    #[test]
    fn test_option_state_lazy_creation() {
        let mut decoder = TelnetDecoder::new();
        assert!(decoder.option_state(TelnetOption::Echo).is_none());
        decoder.decode(&[IAC, TelnetCommand::Will as u8, 1]);
        let state = decoder.option_state(TelnetOption::Echo).unwrap();
        assert!(!state.supported);
        assert!(!state.remote_enabled);
    }
}
