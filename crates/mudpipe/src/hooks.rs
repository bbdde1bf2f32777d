//! 腳本掛鉤介面
//!
//! 管線與內嵌腳本引擎之間的窄能力介面。
//! 實際的腳本語言（Lua、Python 等）由外部提供

use crate::line::Line;

/// 腳本掛鉤
///
/// 由驅動器在組裝與入庫之間呼叫。實作可以改寫 `display`、
/// 切換 `gag` / `skip_log` / `matched` 等旗標，
/// 或對輸入命令做別名展開。預設實作為恆等
pub trait ScriptHooks: Send {
    /// 處理一條伺服器輸出行，回傳（可能被改寫的）行
    fn process_output(&mut self, line: Line) -> Line {
        line
    }

    /// 處理一條使用者輸入行，回傳（可能被改寫的）行
    fn process_input(&mut self, line: Line) -> Line {
        line
    }
}

/// 不做任何事的掛鉤實作
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl ScriptHooks for NoopHooks {}
