//! Telnet 協定常數和型別
//!
//! 實作 RFC 854 Telnet 協定的基本命令與選項

/// Telnet IAC (Interpret As Command) - 0xFF
pub const IAC: u8 = 255;

/// Telnet 命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TelnetCommand {
    /// Sub-negotiation End
    Se = 240,
    /// No Operation
    Nop = 241,
    /// Data Mark
    DataMark = 242,
    /// Break
    Break = 243,
    /// Interrupt Process
    InterruptProcess = 244,
    /// Abort Output
    AbortOutput = 245,
    /// Are You There
    AreYouThere = 246,
    /// Erase Character
    EraseCharacter = 247,
    /// Erase Line
    EraseLine = 248,
    /// Go Ahead
    GoAhead = 249,
    /// Sub-negotiation Begin
    Sb = 250,
    /// Will
    Will = 251,
    /// Won't
    Wont = 252,
    /// Do
    Do = 253,
    /// Don't
    Dont = 254,
}

impl TelnetCommand {
    /// 從位元組解析 Telnet 命令
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            240 => Some(Self::Se),
            241 => Some(Self::Nop),
            242 => Some(Self::DataMark),
            243 => Some(Self::Break),
            244 => Some(Self::InterruptProcess),
            245 => Some(Self::AbortOutput),
            246 => Some(Self::AreYouThere),
            247 => Some(Self::EraseCharacter),
            248 => Some(Self::EraseLine),
            249 => Some(Self::GoAhead),
            250 => Some(Self::Sb),
            251 => Some(Self::Will),
            252 => Some(Self::Wont),
            253 => Some(Self::Do),
            254 => Some(Self::Dont),
            _ => None,
        }
    }

    /// 是否為單位元組命令（IAC 之後即結束）
    pub fn is_simple(&self) -> bool {
        matches!(
            self,
            Self::Nop
                | Self::DataMark
                | Self::Break
                | Self::InterruptProcess
                | Self::AbortOutput
                | Self::AreYouThere
                | Self::EraseCharacter
                | Self::EraseLine
                | Self::GoAhead
        )
    }
}

/// Telnet 選項
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TelnetOption {
    /// Binary Transmission
    BinaryTransmission,
    /// Echo
    Echo,
    /// Suppress Go Ahead
    SuppressGoAhead,
    /// Terminal Type
    TerminalType,
    /// Window Size (NAWS)
    Naws,
    /// Terminal Speed
    TerminalSpeed,
    /// Remote Flow Control
    RemoteFlowControl,
    /// Linemode
    Linemode,
    /// Environment Variables (New)
    NewEnviron,
    /// Charset
    Charset,
    /// MSDP (MUD Server Data Protocol)
    Msdp,
    /// MSSP (MUD Server Status Protocol)
    Mssp,
    /// MCCP2 (MUD Client Compression Protocol)
    Mccp2,
    /// MCCP3
    Mccp3,
    /// MSP (MUD Sound Protocol)
    Msp,
    /// MXP (MUD Extension Protocol)
    Mxp,
    /// GMCP (Generic MUD Communication Protocol)
    Gmcp,
    /// Unknown option
    Unknown(u8),
}

impl TelnetOption {
    /// 從位元組解析 Telnet 選項
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0 => Self::BinaryTransmission,
            1 => Self::Echo,
            3 => Self::SuppressGoAhead,
            24 => Self::TerminalType,
            31 => Self::Naws,
            32 => Self::TerminalSpeed,
            33 => Self::RemoteFlowControl,
            34 => Self::Linemode,
            39 => Self::NewEnviron,
            42 => Self::Charset,
            69 => Self::Msdp,
            70 => Self::Mssp,
            86 => Self::Mccp2,
            87 => Self::Mccp3,
            90 => Self::Msp,
            91 => Self::Mxp,
            201 => Self::Gmcp,
            other => Self::Unknown(other),
        }
    }

    /// 獲取選項的位元組值
    pub fn as_byte(&self) -> u8 {
        match self {
            Self::BinaryTransmission => 0,
            Self::Echo => 1,
            Self::SuppressGoAhead => 3,
            Self::TerminalType => 24,
            Self::Naws => 31,
            Self::TerminalSpeed => 32,
            Self::RemoteFlowControl => 33,
            Self::Linemode => 34,
            Self::NewEnviron => 39,
            Self::Charset => 42,
            Self::Msdp => 69,
            Self::Mssp => 70,
            Self::Mccp2 => 86,
            Self::Mccp3 => 87,
            Self::Msp => 90,
            Self::Mxp => 91,
            Self::Gmcp => 201,
            Self::Unknown(b) => *b,
        }
    }
}

/// 單一 Telnet 選項的協商狀態
///
/// 於首次協商時延遲建立，存活至連線結束
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptionState {
    /// 本端是否有能力實作此選項
    pub supported: bool,
    /// 本端是否已啟用
    pub local_enabled: bool,
    /// 遠端是否已啟用
    pub remote_enabled: bool,
}

/// Telnet 協定事件
#[derive(Debug, Clone, PartialEq)]
pub enum TelnetEvent {
    /// 協商命令（WILL, WONT, DO, DONT）
    Command(TelnetCommand, TelnetOption),
    /// Sub-negotiation 資料
    Subnegotiation(TelnetOption, Vec<u8>),
}

/// 資料流中應被過濾掉的控制位元組
///
/// 保留：BEL, BS, HT, LF, VT, FF, CR, ESC
pub fn should_filter(byte: u8) -> bool {
    byte < 0x20
        && !matches!(
            byte,
            0x07 | 0x08 | 0x09 | 0x0A | 0x0B | 0x0C | 0x0D | 0x1B
        )
}

/// 轉義送出資料中的字面 0xFF（IAC IAC）
pub fn escape_iac(data: &[u8]) -> Vec<u8> {
    let mut escaped = Vec::with_capacity(data.len());
    for &b in data {
        if b == IAC {
            escaped.push(IAC);
        }
        escaped.push(b);
    }
    escaped
}
