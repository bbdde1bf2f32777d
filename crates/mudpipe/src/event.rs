//! 管線事件
//!
//! 每條完成的行與協定事件重新發佈給外部消費者
//! （腳本引擎、渲染層）

use crate::line::Line;
use crate::telnet::protocol::{TelnetCommand, TelnetOption};

/// 發佈到外部事件通道的管線事件
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// 連線已建立
    Connected,
    /// 一條完成的行（已通過腳本掛鉤）
    Line(Line),
    /// 提示行被建立或更新
    Prompt(Line),
    /// 收到選項協商
    Negotiation {
        command: TelnetCommand,
        option: TelnetOption,
    },
    /// 收到 sub-negotiation 資料（GMCP 等）
    Subnegotiation {
        option: TelnetOption,
        data: Vec<u8>,
    },
    /// 連線已結束
    Disconnected,
}
