//! ANSI 行組裝器
//!
//! 將解碼後的位元組流切割為離散的行，並跨行追蹤顏色狀態，
//! 使每一行的顯示內容都能獨立渲染

use bytes::BytesMut;

use super::color::ColorState;
use crate::encoding::Charset;
use crate::line::Line;

/// 行組裝器
///
/// 狀態跨呼叫保存：被讀取邊界切開的轉義序列或多位元組字元
/// 會在後續位元組到達後重組。尚未以換行結尾的尾端
/// 以提示行形式重新評估，不會重複產生
pub struct LineAssembler {
    /// 前一行結束時的顏色狀態，於行完成時才前進
    carried: ColorState,
    /// 尚未換行的位元組
    pending: BytesMut,
    charset: Charset,
}

impl LineAssembler {
    /// 創建新的組裝器
    pub fn new(charset: Charset) -> Self {
        Self {
            carried: ColorState::new(),
            pending: BytesMut::with_capacity(4096),
            charset,
        }
    }

    /// 送入一段解碼後的位元組
    ///
    /// 回傳 (完整行列表, 目前的提示行)。
    /// 提示行由累積中的尾端即時產生，下次呼叫會重新評估
    pub fn feed(&mut self, data: &[u8]) -> (Vec<Line>, Option<Line>) {
        self.pending.extend_from_slice(data);

        let mut lines = Vec::new();
        while let Some(idx) = self.pending.iter().position(|&b| b == b'\n') {
            let mut raw_bytes = self.pending.split_to(idx + 1);
            // 去掉 LF 與 CRLF 的 CR
            raw_bytes.truncate(idx);
            if raw_bytes.last() == Some(&b'\r') {
                raw_bytes.truncate(raw_bytes.len() - 1);
            }
            lines.push(self.finalize(&raw_bytes, true));
        }

        let prompt = if self.pending.is_empty() {
            None
        } else {
            let mut line = self.compose(&self.pending.clone(), self.carried.clone());
            line.is_prompt = true;
            Some(line)
        };

        (lines, prompt)
    }

    /// 強制完成累積中的尾端（用於斷線時的最後一行）
    pub fn flush(&mut self) -> Option<Line> {
        if self.pending.is_empty() {
            return None;
        }
        let bytes = self.pending.split_to(self.pending.len());
        Some(self.finalize(&bytes, false))
    }

    /// 清空攜帶的顏色狀態與累積位元組（緩衝區清空、重新連線時使用）
    pub fn reset(&mut self) {
        self.carried.reset();
        self.pending.clear();
    }

    /// 目前攜帶的顏色狀態
    pub fn carried_state(&self) -> &ColorState {
        &self.carried
    }

    /// 完成一行：產生 Line 並將行末狀態存為下一行的起始狀態
    fn finalize(&mut self, raw_bytes: &[u8], complete: bool) -> Line {
        let mut state = self.carried.clone();
        let mut line = self.compose(raw_bytes, state.clone());
        line.complete = complete;

        apply_sgr_sequences(&line.raw, &mut state);
        self.carried = state;

        line
    }

    /// 以指定的起始狀態產生 Line，不改動組裝器本身
    fn compose(&self, raw_bytes: &[u8], state: ColorState) -> Line {
        let raw = self.charset.decode(raw_bytes);
        let display = if state.has_attributes() {
            format!("{}{}", state.to_ansi(), raw)
        } else {
            raw.clone()
        };

        let mut line = Line::new(raw);
        line.display = display;
        line
    }
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::new(Charset::default())
    }
}

/// 由左至右掃描文字中的 SGR 序列並套用到狀態
///
/// 只解讀以 'm' 結尾的序列；其他 CSI 序列（游標控制等）不影響顏色
fn apply_sgr_sequences(text: &str, state: &mut ColorState) {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == 0x1B && i + 1 < bytes.len() && bytes[i + 1] == b'[' {
            // 找到終止位元組 (0x40-0x7E)
            let mut j = i + 2;
            while j < bytes.len() && !(0x40..=0x7E).contains(&bytes[j]) {
                j += 1;
            }
            if j >= bytes.len() {
                break;
            }
            let params = &bytes[i + 2..j];
            if bytes[j] == b'm' && params.iter().all(|b| b.is_ascii_digit() || *b == b';') {
                state.apply_codes(&parse_params(params));
            }
            i = j + 1;
        } else {
            i += 1;
        }
    }
}

/// 解析 SGR 參數列表；空參數視為 0（重置）
fn parse_params(params: &[u8]) -> Vec<u16> {
    std::str::from_utf8(params)
        .unwrap_or("")
        .split(';')
        .map(|p| p.parse::<u16>().unwrap_or(0))
        .collect()
}
