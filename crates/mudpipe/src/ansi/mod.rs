//! ANSI 處理模組
//!
//! 顏色狀態模型與跨行攜帶狀態的行組裝器

pub mod assembler;
pub mod color;

pub use assembler::LineAssembler;
pub use color::ColorState;
