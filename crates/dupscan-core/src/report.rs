//! JSON 报告
use serde::Serialize;
use std::io::Write;

use crate::error::ScanError;
use crate::scan::collect_duplicates;

/// JSON 报告结构（单个输入）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JsonReport {
    pub duplicates: Vec<String>,
    pub count: usize,
}

impl JsonReport {
    pub fn from_input(input: &[u8]) -> Self {
        let duplicates: Vec<String> = collect_duplicates(input).into_iter().map(|b| char::from(b).to_string()).collect();
        let count = duplicates.len();
        Self { duplicates, count }
    }
}

/// 以 JSON 形式写出报告（末尾换行）；空输入规则与文本报告一致
pub fn write_json_report<W: Write + ?Sized>(input: Option<&[u8]>, out: &mut W) -> Result<JsonReport, ScanError> {
    let input = match input {
        Some(s) if !s.is_empty() => s,
        _ => return Err(ScanError::InvalidInput),
    };
    let report = JsonReport::from_input(input);
    serde_json::to_writer(&mut *out, &report).map_err(std::io::Error::from)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(report)
}
