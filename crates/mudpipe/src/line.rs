//! 行資料型別
//!
//! 管線中流動的基本單位：一行來自伺服器的文字

use std::time::SystemTime;

/// 一行 MUD 輸出
///
/// `raw` 與 `display` 在組裝完成後不再變動；
/// 旗標欄位允許下游（觸發器、腳本）事後切換
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// 原始內容（已去除 Telnet 框架，保留 ANSI 碼）
    pub raw: String,
    /// 顯示內容（已補上繼承的顏色狀態，可獨立渲染）
    pub display: String,
    /// 接收時間
    pub timestamp: SystemTime,
    /// 是否為提示行（未以換行結尾）
    pub is_prompt: bool,
    /// 是否為完整行（以換行結尾）
    pub complete: bool,
    /// 是否被觸發器匹配過
    pub matched: bool,
    /// 是否隱藏不顯示
    pub gag: bool,
    /// 是否不寫入日誌
    pub skip_log: bool,
}

impl Line {
    /// 創建新的一般行
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        Self {
            display: raw.clone(),
            raw,
            timestamp: SystemTime::now(),
            is_prompt: false,
            complete: false,
            matched: false,
            gag: false,
            skip_log: false,
        }
    }

    /// 創建新的提示行
    pub fn new_prompt(raw: impl Into<String>) -> Self {
        let mut line = Self::new(raw);
        line.is_prompt = true;
        line
    }
}
