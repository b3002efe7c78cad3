//! 可打印 ASCII 重复字符扫描库
//!
//! 设计要点：
//! - 单次遍历输入，字母表固定为 32..=126 共 95 个符号，范围外字节直接忽略。
//! - 每个符号两位状态（seen / 已输出），状态大小与输入长度无关。
//! - 报告按“第二次出现”的顺序输出，格式为 `{a, b, c}` + 换行，经定长缓冲分块写出。
//! - 每次调用独立持有状态，调用之间不共享任何可变数据。

mod tracker;
mod emitter;
mod error;
mod options;
mod report;
mod scan;
mod batch;
mod demo;

pub use tracker::{alphabet_index, CharTracker, Observation, ALPHABET_FIRST, ALPHABET_LAST, ALPHABET_SIZE};
pub use emitter::{ChunkedWriter, EmitStats, DEFAULT_BUFFER_CAPACITY, MIN_BUFFER_CAPACITY};
pub use error::ScanError;
pub use options::{load_options, ReportFormat, ScanOptions};
pub use report::{write_json_report, JsonReport};
pub use scan::{collect_duplicates, scan_for_duplicates, scan_with_options, ScanStats};
pub use batch::{scan_dir_and_write, BatchStats};
pub use demo::demo_input;
