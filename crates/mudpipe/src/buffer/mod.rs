//! 回捲緩衝區模組
//!
//! 執行緒安全、容量有界的行儲存：單一寫入者（讀取任務）、
//! 任意多讀取者（渲染、腳本）。滿時淘汰最舊的行

use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::line::Line;

/// 回捲緩衝區
///
/// 已完成的行依到達順序儲存；至多一條提示行保存在
/// 主序列之外的欄位。所有操作不會失敗，
/// 超出範圍的參數被夾限而非回報錯誤
#[derive(Debug)]
pub struct ScrollbackBuffer {
    inner: RwLock<Inner>,
}

#[derive(Debug)]
struct Inner {
    lines: VecDeque<Line>,
    prompt: Option<Line>,
    max_lines: usize,
}

impl ScrollbackBuffer {
    /// 創建新的緩衝區
    ///
    /// # Arguments
    /// * `max_lines` - 保留的最大行數，超出時淘汰最舊的行
    pub fn new(max_lines: usize) -> Self {
        Self {
            inner: RwLock::new(Inner {
                lines: VecDeque::with_capacity(max_lines.min(4096)),
                prompt: None,
                max_lines,
            }),
        }
    }

    /// 寫入一行
    ///
    /// 提示行進入提示欄位；一般行附加到主序列，
    /// 超出容量時淘汰最舊的行（純粹丟棄，不改寫其餘行）
    pub fn write(&self, line: Line) {
        let mut inner = self.write_inner();
        if line.is_prompt {
            inner.prompt = Some(line);
        } else {
            inner.lines.push_back(line);
            while inner.lines.len() > inner.max_lines {
                inner.lines.pop_front();
            }
        }
    }

    /// 以文字建立或取代提示行
    pub fn handle_prompt(&self, text: impl Into<String>) {
        let mut inner = self.write_inner();
        inner.prompt = Some(Line::new_prompt(text));
    }

    /// 使用者送出命令後清除提示行
    pub fn input_sent(&self) {
        self.write_inner().prompt = None;
    }

    /// 目前的提示行
    pub fn prompt(&self) -> Option<Line> {
        self.read_inner().prompt.clone()
    }

    /// 取得 `[start, end)` 範圍的行（防禦性複製）
    ///
    /// `start < 0` 夾限為 0，`end > len` 夾限為 `len`，
    /// `start >= end` 回傳空。當範圍觸及尾端且有提示行時，
    /// 提示行附加在切片之後
    pub fn get_lines(&self, start: isize, end: isize) -> Vec<Line> {
        let inner = self.read_inner();
        let len = inner.lines.len();

        let start = start.max(0) as usize;
        let end = (end.max(0) as usize).min(len);

        let mut result: Vec<Line> = if start >= end {
            Vec::new()
        } else {
            inner
                .lines
                .iter()
                .skip(start)
                .take(end - start)
                .cloned()
                .collect()
        };

        if end == len && start <= end {
            if let Some(prompt) = &inner.prompt {
                result.push(prompt.clone());
            }
        }

        result
    }

    /// 清空所有行與提示行
    pub fn clear(&self) {
        let mut inner = self.write_inner();
        inner.lines.clear();
        inner.prompt = None;
        debug!("已清空回捲緩衝區");
    }

    /// 已完成（非提示）行的數量
    pub fn len(&self) -> usize {
        self.read_inner().lines.len()
    }

    /// 是否沒有任何已完成的行
    pub fn is_empty(&self) -> bool {
        self.read_inner().lines.is_empty()
    }

    /// 容量上限
    pub fn max_lines(&self) -> usize {
        self.read_inner().max_lines
    }

    // 鎖中毒時取回內部資料繼續服務，緩衝區操作不回報錯誤
    fn read_inner(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_inner(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn complete_line(text: &str) -> Line {
        let mut line = Line::new(text);
        line.complete = true;
        line
    }

    #[test]
    fn test_new_buffer_empty() {
        let buffer = ScrollbackBuffer::new(10);
        assert_eq!(buffer.len(), 0);
        assert!(buffer.is_empty());
        assert!(buffer.prompt().is_none());
    }

    #[test]
    fn test_windowed_retrieval() {
        let buffer = ScrollbackBuffer::new(100);
        for i in 0..10 {
            buffer.write(complete_line(&format!("Line {}", i)));
        }

        let lines = buffer.get_lines(3, 7);
        let raws: Vec<&str> = lines.iter().map(|l| l.raw.as_str()).collect();
        assert_eq!(raws, vec!["Line 3", "Line 4", "Line 5", "Line 6"]);
    }

    #[test]
    fn test_inverted_range_empty() {
        let buffer = ScrollbackBuffer::new(100);
        for i in 0..10 {
            buffer.write(complete_line(&format!("Line {}", i)));
        }
        assert!(buffer.get_lines(5, 2).is_empty());
    }

    #[test]
    fn test_negative_start_clamped() {
        let buffer = ScrollbackBuffer::new(100);
        for i in 0..10 {
            buffer.write(complete_line(&format!("Line {}", i)));
        }
        assert_eq!(buffer.get_lines(-1, 5), buffer.get_lines(0, 5));
        assert_eq!(buffer.get_lines(-1, 5).len(), 5);
    }

    #[test]
    fn test_end_clamped_to_len() {
        let buffer = ScrollbackBuffer::new(100);
        for i in 0..3 {
            buffer.write(complete_line(&format!("Line {}", i)));
        }
        let lines = buffer.get_lines(0, 99);
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_fifo_eviction() {
        let buffer = ScrollbackBuffer::new(5);
        for i in 0..7 {
            buffer.write(complete_line(&format!("Line {}", i)));
        }

        assert_eq!(buffer.len(), 5);
        let lines = buffer.get_lines(0, buffer.len() as isize);
        let raws: Vec<&str> = lines.iter().map(|l| l.raw.as_str()).collect();
        assert_eq!(
            raws,
            vec!["Line 2", "Line 3", "Line 4", "Line 5", "Line 6"]
        );
    }

    #[test]
    fn test_prompt_not_counted() {
        let buffer = ScrollbackBuffer::new(100);
        buffer.handle_prompt("What is your name: ");

        assert_eq!(buffer.len(), 0);
        let lines = buffer.get_lines(0, buffer.len() as isize);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].raw, "What is your name: ");
        assert!(lines[0].is_prompt);
    }

    #[test]
    fn test_prompt_appended_after_window_at_end() {
        let buffer = ScrollbackBuffer::new(100);
        for i in 0..5 {
            buffer.write(complete_line(&format!("Line {}", i)));
        }
        buffer.handle_prompt("> ");

        let lines = buffer.get_lines(0, 5);
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[5].raw, "> ");

        // 未觸及尾端的視窗不含提示行
        let lines = buffer.get_lines(0, 3);
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_prompt_replaced() {
        let buffer = ScrollbackBuffer::new(100);
        buffer.handle_prompt("first> ");
        buffer.handle_prompt("second> ");
        assert_eq!(buffer.prompt().unwrap().raw, "second> ");
    }

    #[test]
    fn test_input_sent_clears_prompt() {
        let buffer = ScrollbackBuffer::new(100);
        buffer.handle_prompt("> ");
        buffer.input_sent();
        assert!(buffer.prompt().is_none());
        assert!(buffer.get_lines(0, 0).is_empty());
    }

    #[test]
    fn test_prompt_flagged_line_routes_to_slot() {
        let buffer = ScrollbackBuffer::new(100);
        buffer.write(Line::new_prompt("hp 100> "));
        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.prompt().unwrap().raw, "hp 100> ");
    }

    #[test]
    fn test_clear() {
        let buffer = ScrollbackBuffer::new(100);
        buffer.write(complete_line("text"));
        buffer.handle_prompt("> ");
        buffer.clear();
        assert!(buffer.is_empty());
        assert!(buffer.prompt().is_none());
    }

    #[test]
    fn test_defensive_copy() {
        let buffer = ScrollbackBuffer::new(100);
        buffer.write(complete_line("original"));
        let mut lines = buffer.get_lines(0, 1);
        lines[0].raw = "mutated".to_string();
        assert_eq!(buffer.get_lines(0, 1)[0].raw, "original");
    }

    #[test]
    fn test_concurrent_readers_and_writer() {
        let buffer = Arc::new(ScrollbackBuffer::new(50));

        let writer = {
            let buffer = Arc::clone(&buffer);
            std::thread::spawn(move || {
                for i in 0..200 {
                    buffer.write(complete_line(&format!("Line {}", i)));
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let buffer = Arc::clone(&buffer);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let len = buffer.len();
                        let lines = buffer.get_lines(0, len as isize);
                        assert!(lines.len() <= 50 + 1);
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }

        assert_eq!(buffer.len(), 50);
    }
}
