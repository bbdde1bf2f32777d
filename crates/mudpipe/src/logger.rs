//! 日誌記錄模組
//!
//! 自動記錄 MUD 對話到檔案。標記為 gag 或 skip_log 的行
//! 以及提示行不會寫入

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::line::Line;

/// 日誌記錄錯誤
#[derive(Debug, Error)]
pub enum LogError {
    #[error("IO 錯誤: {0}")]
    Io(#[from] io::Error),

    #[error("日誌未開啟")]
    NotOpen,
}

/// 日誌格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogFormat {
    /// 純文字（移除 ANSI 顏色碼）
    #[default]
    PlainText,
    /// 原始格式（保留顏色，寫入可獨立渲染的 display 內容）
    Raw,
}

/// 日誌記錄器
pub struct Logger {
    /// 日誌檔案路徑
    path: Option<PathBuf>,
    /// 緩衝寫入器
    writer: Option<BufWriter<File>>,
    /// 日誌格式
    format: LogFormat,
    /// 是否正在記錄
    recording: bool,
}

impl Logger {
    /// 創建新的日誌記錄器
    pub fn new(format: LogFormat) -> Self {
        Self {
            path: None,
            writer: None,
            format,
            recording: false,
        }
    }

    /// 日誌格式
    pub fn format(&self) -> LogFormat {
        self.format
    }

    /// 是否正在記錄
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// 日誌檔案路徑
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// 開始記錄到指定檔案（附加模式）
    pub fn start(&mut self, path: impl AsRef<Path>) -> Result<(), LogError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        self.writer = Some(BufWriter::new(file));
        self.path = Some(path.to_path_buf());
        self.recording = true;

        Ok(())
    }

    /// 停止記錄
    pub fn stop(&mut self) -> Result<(), LogError> {
        if !self.recording {
            return Ok(());
        }

        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }

        self.writer = None;
        self.recording = false;

        Ok(())
    }

    /// 記錄一條完成的行
    ///
    /// 未在記錄中時靜默忽略；gag、skip_log 與提示行被跳過
    pub fn log_line(&mut self, line: &Line) -> Result<(), LogError> {
        if !self.recording {
            return Ok(());
        }
        if line.gag || line.skip_log || line.is_prompt {
            return Ok(());
        }

        let writer = self.writer.as_mut().ok_or(LogError::NotOpen)?;

        match self.format {
            LogFormat::PlainText => {
                writeln!(writer, "{}", strip_ansi(&line.raw))?;
            }
            LogFormat::Raw => {
                writeln!(writer, "{}", line.display)?;
            }
        }

        Ok(())
    }

    /// 刷新緩衝區
    pub fn flush(&mut self) -> Result<(), LogError> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LogFormat::default())
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// 移除 ANSI 轉義碼，只保留純文字
pub fn strip_ansi(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\x1b' {
            // 跳過 CSI 序列直至終止符
            if chars.peek() == Some(&'[') {
                chars.next();
                while let Some(&ch) = chars.peek() {
                    chars.next();
                    if (0x40..=0x7E).contains(&(ch as u32)) {
                        break;
                    }
                }
            }
        } else {
            result.push(c);
        }
    }

    result
}
