//! 错误类型
use std::io;
use thiserror::Error;

/// 扫描失败原因；任一错误都会立即中止本次扫描，不重试
#[derive(Debug, Error)]
pub enum ScanError {
    /// 输入缺失或为空，扫描不会开始
    #[error("Input string is null or empty")]
    InvalidInput,
    /// 输出端写入失败；失败前已写出的内容保留在输出端
    #[error("output write failed")]
    Output(#[from] io::Error),
    /// 参数非法（例如缓冲容量过小）
    #[error("invalid scan options: {0}")]
    InvalidOptions(String),
}
