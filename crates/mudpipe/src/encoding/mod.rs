//! 字元編碼模組
//!
//! 將伺服器位元組流轉換為 UTF-8 文字，以及反向編碼送出的命令

use encoding_rs::{BIG5, UTF_8, WINDOWS_1252};
use serde::{Deserialize, Serialize};

/// 連線使用的字元編碼
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Charset {
    /// UTF-8（預設）
    #[default]
    Utf8,
    /// Latin-1 / Windows-1252（西歐 MUD 常見）
    Latin1,
    /// Big5（台灣 MUD 常見）
    Big5,
}

impl Charset {
    /// 將此編碼的位元組解碼為 UTF-8 字串
    ///
    /// 無效位元組會被替換為 U+FFFD
    pub fn decode(&self, bytes: &[u8]) -> String {
        let (decoded, _, _) = self.encoding().decode(bytes);
        decoded.into_owned()
    }

    /// 將 UTF-8 字串編碼為此編碼的位元組
    ///
    /// 無法表示的字元會被替換
    pub fn encode(&self, text: &str) -> Vec<u8> {
        let (encoded, _, _) = self.encoding().encode(text);
        encoded.into_owned()
    }

    fn encoding(&self) -> &'static encoding_rs::Encoding {
        match self {
            Self::Utf8 => UTF_8,
            Self::Latin1 => WINDOWS_1252,
            Self::Big5 => BIG5,
        }
    }
}
