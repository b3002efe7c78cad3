//! 扫描选项（模块）
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::emitter::{DEFAULT_BUFFER_CAPACITY, MIN_BUFFER_CAPACITY};
use crate::error::ScanError;

/// 报告格式
/// - Text：`{a, b}` 形式，经分块写出器输出
/// - Json：`{"duplicates":[..],"count":n}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// 扫描选项；可由 TOML 文件加载，缺省字段取默认值
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// 输出缓冲容量（字节），不小于 3
    pub buffer_capacity: usize,
    /// 报告格式
    pub format: ReportFormat,
    /// 目录扫描时的最大文件大小（字节）；超过则跳过
    pub max_file_size: Option<u64>,
    /// 目录扫描线程数：None 表示自动（等于 CPU 核数）；Some(1) 走串行
    pub threads: Option<usize>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            format: ReportFormat::Text,
            max_file_size: None,
            threads: None,
        }
    }
}

impl ScanOptions {
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.buffer_capacity < MIN_BUFFER_CAPACITY {
            return Err(ScanError::InvalidOptions(format!(
                "buffer_capacity must be at least {MIN_BUFFER_CAPACITY}, got {}",
                self.buffer_capacity
            )));
        }
        if self.threads == Some(0) {
            return Err(ScanError::InvalidOptions("threads must be at least 1".into()));
        }
        Ok(())
    }
}

/// 从 TOML 文件加载选项并校验
pub fn load_options(path: &Path) -> Result<ScanOptions> {
    let txt = std::fs::read_to_string(path).with_context(|| format!("read options file {}", path.display()))?;
    let opts: ScanOptions = toml::from_str(&txt).context("parse options toml")?;
    opts.validate()?;
    Ok(opts)
}
