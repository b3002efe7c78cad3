//! 目录批量扫描与并行调度
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::options::{ReportFormat, ScanOptions};
use crate::report::JsonReport;
use crate::scan::scan_with_options;

/// 目录扫描统计（便于 CLI 打印）
#[derive(Debug, Default, Clone, Serialize)]
pub struct BatchStats {
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub duplicates_total: usize,
}

/// 单个文件的处理结果
enum Outcome {
    /// 文本报告（已含 `{..}\n`）与重复个数
    Text(Vec<u8>, usize),
    Json(Vec<String>),
    Skipped(&'static str),
}

/// 扫描目录下（深度 1）的每个文件，按文件名顺序输出每个文件的报告
/// - 每个文件独立的跟踪状态与缓冲，互不影响
/// - 空文件、超限文件、读取失败的文件跳过并计数
/// - threads > 1 时并行扫描，由单一 writer 按序输出
pub fn scan_dir_and_write(input_dir: &Path, out: &mut dyn Write, opts: &ScanOptions) -> Result<BatchStats> {
    opts.validate()?;

    let mut files: Vec<PathBuf> = vec![];
    for entry in WalkDir::new(input_dir).min_depth(1).max_depth(1) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "skip unreadable entry");
                continue;
            }
        };
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    // 按文件名排序，确保输出顺序稳定
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let threads = opts.threads.unwrap_or_else(num_cpus::get);
    let mut stats = BatchStats::default();

    if opts.format == ReportFormat::Json {
        write!(out, "[")?;
    }
    let mut first = true;

    if threads > 1 && files.len() > 1 {
        debug!(threads, files = files.len(), "parallel directory scan");
        scan_parallel(files, out, opts, threads, &mut stats, &mut first)?;
    } else {
        for path in &files {
            let name = file_label(path);
            let outcome = scan_one(path, opts);
            write_outcome(out, opts.format, &name, outcome, &mut stats, &mut first)?;
        }
    }

    if opts.format == ReportFormat::Json {
        writeln!(out, "]")?;
    }
    out.flush().context("flush batch output")?;
    Ok(stats)
}

/// 并行调度：
/// - Rayon 线程池在后台线程中扫描
/// - 当前线程作为 writer，按 idx 重排后输出
fn scan_parallel(
    files: Vec<PathBuf>,
    out: &mut dyn Write,
    opts: &ScanOptions,
    threads: usize,
    stats: &mut BatchStats,
    first: &mut bool,
) -> Result<()> {
    use crossbeam_channel as channel;
    use rayon::prelude::*;

    type Msg = (usize, String, Outcome);
    let (tx, rx) = channel::bounded::<Msg>(256);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .context("build rayon pool")?;
    let worker_opts = opts.clone();
    let indexed: Vec<(usize, PathBuf)> = files.into_iter().enumerate().collect();

    let scan_thread = std::thread::spawn(move || {
        pool.install(|| {
            indexed.par_iter().for_each_with(tx, |tx, (idx, path)| {
                let outcome = scan_one(path, &worker_opts);
                let _ = tx.send((*idx, file_label(path), outcome));
            });
        });
    });

    let mut next_idx: usize = 0;
    let mut pending: BTreeMap<usize, (String, Outcome)> = BTreeMap::new();
    let mut write_result: Result<()> = Ok(());
    while let Ok((idx, name, outcome)) = rx.recv() {
        pending.insert(idx, (name, outcome));
        while let Some((name, outcome)) = pending.remove(&next_idx) {
            if write_result.is_ok() {
                write_result = write_outcome(out, opts.format, &name, outcome, stats, first);
            }
            next_idx += 1;
        }
    }

    if scan_thread.join().is_err() {
        anyhow::bail!("scan worker panicked");
    }
    write_result
}

fn file_label(path: &Path) -> String {
    path.file_name().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
}

fn scan_one(path: &Path, opts: &ScanOptions) -> Outcome {
    if let Some(max) = opts.max_file_size {
        if let Ok(md) = std::fs::metadata(path) {
            if md.len() > max {
                return Outcome::Skipped("file too large");
            }
        }
    }
    let data = match std::fs::read(path) {
        Ok(d) => d,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "read failed");
            return Outcome::Skipped("unreadable");
        }
    };
    if data.is_empty() {
        return Outcome::Skipped("empty");
    }
    match opts.format {
        ReportFormat::Json => Outcome::Json(JsonReport::from_input(&data).duplicates),
        ReportFormat::Text => {
            let mut body = Vec::new();
            match scan_with_options(Some(data.as_slice()), &mut body, opts) {
                Ok(s) => Outcome::Text(body, s.duplicates),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "scan failed");
                    Outcome::Skipped("scan failed")
                }
            }
        }
    }
}

fn write_outcome(
    out: &mut dyn Write,
    format: ReportFormat,
    name: &str,
    outcome: Outcome,
    stats: &mut BatchStats,
    first: &mut bool,
) -> Result<()> {
    match outcome {
        Outcome::Skipped(reason) => {
            debug!(file = name, reason, "skipped");
            stats.files_skipped += 1;
        }
        Outcome::Text(body, n) => {
            stats.files_scanned += 1;
            stats.duplicates_total += n;
            write!(out, "{name}: ")?;
            out.write_all(&body)?;
        }
        Outcome::Json(dups) => {
            stats.files_scanned += 1;
            stats.duplicates_total += dups.len();
            if !*first {
                write!(out, ",")?;
            } else {
                *first = false;
            }
            let item = serde_json::json!({ "file": name, "duplicates": dups });
            serde_json::to_writer(&mut *out, &item)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "hello").unwrap();
        std::fs::write(dir.path().join("a.txt"), "aabbcc").unwrap();
        std::fs::write(dir.path().join("c.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("d.txt"), "zz").unwrap();
        dir
    }

    #[test]
    fn serial_text_output_is_sorted() {
        let dir = fixture();
        let opts = ScanOptions { threads: Some(1), ..ScanOptions::default() };
        let mut out = Vec::new();
        let stats = scan_dir_and_write(dir.path(), &mut out, &opts).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "a.txt: {a, b, c}\nb.txt: {l}\n");
        assert_eq!(stats.files_scanned, 2);
        assert_eq!(stats.files_skipped, 1);
        assert_eq!(stats.duplicates_total, 4);
    }

    #[test]
    fn parallel_matches_serial() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..40u8 {
            let body: Vec<u8> = (0..=i).map(|k| b'!' + ((k as u16 * 7) % 90) as u8).chain(b"xx".iter().copied()).collect();
            std::fs::write(dir.path().join(format!("f{i:02}")), body).unwrap();
        }
        let mut serial = Vec::new();
        let mut parallel = Vec::new();
        let base = ScanOptions { buffer_capacity: 5, ..ScanOptions::default() };
        scan_dir_and_write(dir.path(), &mut serial, &ScanOptions { threads: Some(1), ..base.clone() }).unwrap();
        scan_dir_and_write(dir.path(), &mut parallel, &ScanOptions { threads: Some(4), ..base }).unwrap();
        assert!(!serial.is_empty());
        assert_eq!(serial, parallel);
    }

    #[test]
    fn json_array_output() {
        let dir = fixture();
        let opts = ScanOptions { threads: Some(1), format: ReportFormat::Json, ..ScanOptions::default() };
        let mut out = Vec::new();
        scan_dir_and_write(dir.path(), &mut out, &opts).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(v[0]["file"], "a.txt");
        assert_eq!(v[0]["duplicates"], serde_json::json!(["a", "b", "c"]));
        assert_eq!(v[1]["duplicates"], serde_json::json!(["l"]));
        assert_eq!(v.as_array().unwrap().len(), 2);
    }

    #[test]
    fn oversized_files_are_skipped() {
        let dir = fixture();
        let opts = ScanOptions { threads: Some(1), max_file_size: Some(5), ..ScanOptions::default() };
        let mut out = Vec::new();
        let stats = scan_dir_and_write(dir.path(), &mut out, &opts).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "b.txt: {l}\n");
        assert_eq!(stats.files_skipped, 2);
    }
}
