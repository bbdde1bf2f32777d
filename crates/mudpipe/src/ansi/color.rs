//! ANSI 顏色與屬性狀態
//!
//! SGR (Select Graphic Rendition) 子集的狀態模型

/// 顏色與屬性狀態
///
/// 值型別：附加到行時以複製方式快照，
/// 之後的變動不影響歷史行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorState {
    pub bold: bool,
    pub dim: bool,
    pub italic: bool,
    pub underline: bool,
    pub blink: bool,
    pub reverse: bool,
    pub hidden: bool,
    /// 前景色：-1 為預設，0-255 為調色盤索引
    pub fg_color: i16,
    /// 背景色：-1 為預設，0-255 為調色盤索引
    pub bg_color: i16,
}

impl Default for ColorState {
    fn default() -> Self {
        Self {
            bold: false,
            dim: false,
            italic: false,
            underline: false,
            blink: false,
            reverse: false,
            hidden: false,
            fg_color: -1,
            bg_color: -1,
        }
    }
}

impl ColorState {
    /// 創建預設狀態
    pub fn new() -> Self {
        Self::default()
    }

    /// 重置所有屬性與顏色為預設
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// 是否有任何屬性或顏色被設定
    pub fn has_attributes(&self) -> bool {
        self.bold
            || self.dim
            || self.italic
            || self.underline
            || self.blink
            || self.reverse
            || self.hidden
            || self.fg_color >= 0
            || self.bg_color >= 0
    }

    /// 依序套用一組 SGR 參數
    ///
    /// 重置碼（0）清空工作狀態，同一序列中後續的碼
    /// 套用在全新狀態上，不與重置前的值合併
    pub fn apply_codes(&mut self, codes: &[u16]) {
        let mut i = 0;
        while i < codes.len() {
            match codes[i] {
                0 => self.reset(),
                1 => self.bold = true,
                2 => self.dim = true,
                3 => self.italic = true,
                4 => self.underline = true,
                5 => self.blink = true,
                7 => self.reverse = true,
                8 => self.hidden = true,
                21 | 22 => {
                    self.bold = false;
                    self.dim = false;
                }
                23 => self.italic = false,
                24 => self.underline = false,
                25 => self.blink = false,
                27 => self.reverse = false,
                28 => self.hidden = false,
                code @ 30..=37 => self.fg_color = (code - 30) as i16,
                38 => {
                    i += self.apply_extended(&codes[i..], true);
                }
                39 => self.fg_color = -1,
                code @ 40..=47 => self.bg_color = (code - 40) as i16,
                48 => {
                    i += self.apply_extended(&codes[i..], false);
                }
                49 => self.bg_color = -1,
                code @ 90..=97 => self.fg_color = (code - 90 + 8) as i16,
                code @ 100..=107 => self.bg_color = (code - 100 + 8) as i16,
                _ => {}
            }
            i += 1;
        }
    }

    /// 處理 38/48 的擴展色參數，回傳額外消耗的參數數量
    fn apply_extended(&mut self, rest: &[u16], foreground: bool) -> usize {
        match rest.get(1).copied() {
            // 38;5;N - 256 色調色盤
            Some(5) => {
                if let Some(&n) = rest.get(2) {
                    if n <= 255 {
                        if foreground {
                            self.fg_color = n as i16;
                        } else {
                            self.bg_color = n as i16;
                        }
                    }
                    2
                } else {
                    0
                }
            }
            // 38;2;r;g;b - 真彩色不納入調色盤模型，跳過參數避免錯位
            Some(2) => 4.min(rest.len().saturating_sub(1)),
            _ => 0,
        }
    }

    /// 將目前狀態渲染為單一 ANSI 轉義序列
    ///
    /// 無任何屬性時回傳空字串
    pub fn to_ansi(&self) -> String {
        if !self.has_attributes() {
            return String::new();
        }

        let mut attrs: Vec<String> = Vec::new();
        if self.bold {
            attrs.push("1".into());
        }
        if self.dim {
            attrs.push("2".into());
        }
        if self.italic {
            attrs.push("3".into());
        }
        if self.underline {
            attrs.push("4".into());
        }
        if self.blink {
            attrs.push("5".into());
        }
        if self.reverse {
            attrs.push("7".into());
        }
        if self.hidden {
            attrs.push("8".into());
        }
        if self.fg_color >= 0 {
            if self.fg_color < 8 {
                attrs.push(format!("{}", self.fg_color + 30));
            } else {
                attrs.push(format!("38;5;{}", self.fg_color));
            }
        }
        if self.bg_color >= 0 {
            if self.bg_color < 8 {
                attrs.push(format!("{}", self.bg_color + 40));
            } else {
                attrs.push(format!("48;5;{}", self.bg_color));
            }
        }

        format!("\x1b[{}m", attrs.join(";"))
    }
}
