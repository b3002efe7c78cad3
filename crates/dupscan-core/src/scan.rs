//! 单次扫描主流程
use std::io::Write;

use serde::Serialize;
use tracing::debug;

use crate::emitter::ChunkedWriter;
use crate::error::ScanError;
use crate::options::ScanOptions;
use crate::tracker::{CharTracker, Observation};

const OPEN: &[u8] = b"{";
const SEPARATOR: &[u8] = b", ";
const CLOSE: &[u8] = b"}\n";

/// 单次扫描统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// 输入总字节数
    pub bytes_scanned: usize,
    /// 字母表外被忽略的字节数
    pub bytes_ignored: usize,
    /// 报告中的重复字符个数
    pub duplicates: usize,
    /// 输出端写入次数
    pub flushes: usize,
    pub bytes_written: usize,
}

/// 以默认选项扫描并把报告写入 `out`
pub fn scan_for_duplicates<W: Write + ?Sized>(input: Option<&[u8]>, out: &mut W) -> Result<ScanStats, ScanError> {
    scan_with_options(input, out, &ScanOptions::default())
}

/// 扫描输入，按第二次出现的顺序输出每个重复的可打印字符一次
/// - 输入缺失或为空：返回 `InvalidInput`，不写任何内容
/// - 输出端失败：立即返回 `Output`，已写出的块不回滚
/// - 只使用 `buffer_capacity`；`format` 由调用方（CLI / 目录扫描）处理
pub fn scan_with_options<W: Write + ?Sized>(
    input: Option<&[u8]>,
    out: &mut W,
    opts: &ScanOptions,
) -> Result<ScanStats, ScanError> {
    let input = match input {
        Some(s) if !s.is_empty() => s,
        _ => return Err(ScanError::InvalidInput),
    };
    opts.validate()?;

    let mut tracker = CharTracker::new();
    let mut writer = ChunkedWriter::with_capacity(opts.buffer_capacity, out);
    let mut stats = ScanStats { bytes_scanned: input.len(), ..ScanStats::default() };

    writer.reserve(OPEN.len())?;
    writer.push(OPEN);

    for &byte in input {
        match tracker.observe(byte) {
            Observation::Ignored => stats.bytes_ignored += 1,
            Observation::FirstSeen | Observation::AlreadyReported => {}
            Observation::NewDuplicate => {
                // 最坏情况：分隔符 + 字符
                writer.reserve(SEPARATOR.len() + 1)?;
                if stats.duplicates > 0 {
                    writer.push(SEPARATOR);
                }
                writer.push(&[byte]);
                stats.duplicates += 1;
            }
        }
    }

    writer.reserve(CLOSE.len())?;
    writer.push(CLOSE);
    let emitted = writer.finish()?;
    stats.flushes = emitted.flushes;
    stats.bytes_written = emitted.bytes_written;

    debug!(
        bytes = stats.bytes_scanned,
        ignored = stats.bytes_ignored,
        duplicates = stats.duplicates,
        flushes = stats.flushes,
        "scan finished"
    );
    Ok(stats)
}

/// 返回重复字符列表（输出顺序，不含格式）
pub fn collect_duplicates(input: &[u8]) -> Vec<u8> {
    let mut tracker = CharTracker::new();
    input
        .iter()
        .copied()
        .filter(|&b| tracker.observe(b) == Observation::NewDuplicate)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn report(input: &[u8]) -> String {
        let mut out = Vec::new();
        scan_for_duplicates(Some(input), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn empty_and_absent_input_are_rejected() {
        let mut out = Vec::new();
        assert!(matches!(scan_for_duplicates(Some(&b""[..]), &mut out), Err(ScanError::InvalidInput)));
        assert!(matches!(scan_for_duplicates(None, &mut out), Err(ScanError::InvalidInput)));
        assert!(out.is_empty());
        assert_eq!(ScanError::InvalidInput.to_string(), "Input string is null or empty");
    }

    #[test]
    fn no_duplicates() {
        assert_eq!(report(b"abcXYZ"), "{}\n");
    }

    #[test]
    fn order_follows_second_occurrence() {
        assert_eq!(report(b"aabbcc"), "{a, b, c}\n");
        assert_eq!(report(b"abcba"), "{b, a}\n");
    }

    #[test]
    fn repeats_reported_once() {
        assert_eq!(report(b"aaaa"), "{a}\n");
    }

    #[test]
    fn non_printable_bytes_are_ignored() {
        assert_eq!(report(b"\t\t\x01\x01a\x7f\x7f\xff\xffa"), "{a}\n");
        assert_eq!(report(b"\n\n\n"), "{}\n");
    }

    #[test]
    fn space_and_tilde_are_tracked() {
        assert_eq!(report(b"~ ~ "), "{~,  }\n");
    }

    #[test]
    fn stats_are_reported() {
        let mut out = Vec::new();
        let stats = scan_for_duplicates(Some(&b"a\na\nb"[..]), &mut out).unwrap();
        assert_eq!(stats.bytes_scanned, 5);
        assert_eq!(stats.bytes_ignored, 2);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.flushes, 1);
        assert_eq!(stats.bytes_written, out.len());
    }

    #[test]
    fn small_buffer_splits_output() {
        let opts = ScanOptions { buffer_capacity: 3, ..ScanOptions::default() };
        let mut out = Vec::new();
        let stats = scan_with_options(Some(&b"aabbccdd"[..]), &mut out, &opts).unwrap();
        assert_eq!(out, b"{a, b, c, d}\n");
        assert!(stats.flushes > 1);
    }

    #[test]
    fn invalid_options_fail_before_writing() {
        let opts = ScanOptions { buffer_capacity: 1, ..ScanOptions::default() };
        let mut out = Vec::new();
        assert!(matches!(scan_with_options(Some(&b"aa"[..]), &mut out, &opts), Err(ScanError::InvalidOptions(_))));
        assert!(out.is_empty());
    }

    /// 前 `ok` 次写入成功，之后全部失败
    struct FailAfter {
        ok: usize,
        written: Vec<u8>,
    }

    impl Write for FailAfter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.ok == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "sink rejected write"));
            }
            self.ok -= 1;
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn sink_failure_aborts_and_keeps_flushed_output() {
        let opts = ScanOptions { buffer_capacity: 4, ..ScanOptions::default() };
        let mut sink = FailAfter { ok: 1, written: Vec::new() };
        let err = scan_with_options(Some(&b"aabbccdd"[..]), &mut sink, &opts).unwrap_err();
        assert!(matches!(err, ScanError::Output(_)));
        assert_eq!(sink.written, b"{a");
    }

    #[test]
    fn collect_matches_report_order() {
        assert_eq!(collect_duplicates(b"xyzzyx"), b"zyx");
        assert!(collect_duplicates(b"").is_empty());
    }
}
