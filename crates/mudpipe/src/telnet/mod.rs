//! Telnet 協定模組
//!
//! 提供協定常數、可續接的解碼器與非同步連線管理

pub mod client;
pub mod decoder;
pub mod protocol;

pub use client::{ConnectionState, TelnetClient, TelnetConfig, TelnetError, Transport};
pub use decoder::{DecodeOutput, TelnetDecoder};
pub use protocol::{OptionState, TelnetCommand, TelnetEvent, TelnetOption, IAC};
