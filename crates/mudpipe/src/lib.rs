//! MUD 終端 I/O 管線
//!
//! 提供 MUD 客戶端的核心資料流：
//! - `telnet`: Telnet 協定解碼與連線管理
//! - `ansi`: ANSI 顏色狀態與行組裝
//! - `buffer`: 有界回捲緩衝區
//! - `pipeline`: 讀取任務驅動器與事件發佈
//! - `hooks`: 腳本引擎掛鉤介面
//! - `encoding`: 字元編碼轉換
//! - `logger`: 對話日誌記錄
//!
//! 資料單向流動：socket 位元組 → 解碼器 → 行組裝器 →
//! 回捲緩衝區 → 外部事件通道

pub mod ansi;
pub mod buffer;
pub mod debug_log;
pub mod encoding;
pub mod event;
pub mod hooks;
pub mod line;
pub mod logger;
pub mod pipeline;
pub mod telnet;

pub use ansi::{ColorState, LineAssembler};
pub use buffer::ScrollbackBuffer;
pub use encoding::Charset;
pub use event::PipelineEvent;
pub use hooks::{NoopHooks, ScriptHooks};
pub use line::Line;
pub use logger::{LogFormat, Logger};
pub use pipeline::{Pipeline, PipelineCommand, PipelineConfig};
pub use telnet::{TelnetClient, TelnetDecoder};
