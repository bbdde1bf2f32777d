//! 原始位元組除錯日誌
//!
//! 協定除錯用：把每次讀到的原始位元組以 hex + ASCII 傾印到檔案。
//! 未初始化時所有呼叫都是空操作

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

lazy_static::lazy_static! {
    static ref DEBUG_LOGGER: Mutex<Option<DebugLogger>> = Mutex::new(None);
}

pub struct DebugLogger {
    file: File,
}

impl DebugLogger {
    /// 初始化全域除錯日誌
    pub fn init(path: PathBuf) {
        if let Ok(file) = File::create(path) {
            let mut logger = DEBUG_LOGGER.lock().unwrap();
            *logger = Some(DebugLogger { file });
        }
    }

    /// 寫入一條訊息
    pub fn log(msg: &str) {
        let mut logger = DEBUG_LOGGER.lock().unwrap();
        if let Some(l) = logger.as_mut() {
            let _ = writeln!(l.file, "[{}] {}", unix_timestamp(), msg);
        }
    }

    /// 傾印一段位元組
    pub fn log_bytes(prefix: &str, bytes: &[u8]) {
        let logger = DEBUG_LOGGER.lock().unwrap();
        if logger.is_none() {
            return;
        }
        drop(logger);
        Self::log(&format!("{} ({} bytes)\n{}", prefix, bytes.len(), hex_dump(bytes)));
    }
}

fn unix_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// 每列 16 位元組的 hex + ASCII 傾印
fn hex_dump(data: &[u8]) -> String {
    let mut out = String::new();
    for (row, chunk) in data.chunks(16).enumerate() {
        out.push_str(&format!("{:04x}: ", row * 16));
        for i in 0..16 {
            match chunk.get(i) {
                Some(b) => out.push_str(&format!("{:02x} ", b)),
                None => out.push_str("   "),
            }
        }
        out.push('|');
        for &b in chunk {
            out.push(if (0x20..=0x7E).contains(&b) {
                b as char
            } else {
                '.'
            });
        }
        out.push_str("|\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_dump_format() {
        let dump = hex_dump(b"Hello\xff");
        assert!(dump.starts_with("0000: 48 65 6c 6c 6f ff"));
        assert!(dump.contains("|Hello.|"));
    }

    #[test]
    fn test_hex_dump_multiple_rows() {
        let data: Vec<u8> = (0u8..20).collect();
        let dump = hex_dump(&data);
        assert_eq!(dump.lines().count(), 2);
        assert!(dump.contains("0010: "));
    }

    #[test]
    fn test_log_without_init_is_noop() {
        // 不觸碰全域狀態，僅確認不會 panic
        DebugLogger::log("nothing happens");
        DebugLogger::log_bytes("TEST", b"abc");
    }
}
