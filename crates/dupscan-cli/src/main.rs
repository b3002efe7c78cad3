use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use dupscan_core::{
    demo_input, load_options, scan_dir_and_write, scan_with_options, write_json_report, ReportFormat, ScanOptions,
};
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;
use tracing::{debug, info};

/// 命令行入口（基于 clap）
#[derive(Parser, Debug)]
#[command(name = "dupscan", version, about = "报告输入中重复出现的可打印 ASCII 字符")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// 报告格式参数
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

impl From<FormatArg> for ReportFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Text => ReportFormat::Text,
            FormatArg::Json => ReportFormat::Json,
        }
    }
}

/// 各子命令共用的选项
#[derive(clap::Args, Debug)]
struct CommonArgs {
    /// 报告格式：text 或 json
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// 输出缓冲容量（字节，至少 3）
    #[arg(long)]
    buffer_capacity: Option<usize>,

    /// 选项文件路径（TOML）；命令行参数优先
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 扫描单个输入（--text、--input 或标准输入）
    Scan {
        /// 直接给出的输入字符串
        #[arg(long, conflicts_with = "input")]
        text: Option<String>,

        /// 输入文件；未指定 --text 与 --input 时读取标准输入
        #[arg(long)]
        input: Option<PathBuf>,

        #[command(flatten)]
        common: CommonArgs,
    },
    /// 扫描目录下的每个文件，每个文件一行报告
    ScanDir {
        /// 输入目录
        #[arg(long)]
        input: PathBuf,

        /// 输出文件；默认标准输出
        #[arg(long)]
        output: Option<PathBuf>,

        /// 线程数（"auto"=CPU 核心数）
        #[arg(long, default_value = "auto")]
        threads: String,

        /// 最大扫描文件大小（单位字节）
        #[arg(long)]
        max_file_size: Option<u64>,

        #[command(flatten)]
        common: CommonArgs,
    },
    /// 扫描内置演示输入（每个可打印字符各两次）
    Demo {
        #[command(flatten)]
        common: CommonArgs,
    },
}

fn main() -> Result<()> {
    // 初始化日志（支持通过 RUST_LOG 控制等级，例如 info、debug）
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { text, input, common } => {
            let opts = resolve_options(&common)?;
            let data = match (text, input) {
                (Some(t), _) => t.into_bytes(),
                (None, Some(path)) => std::fs::read(&path).with_context(|| format!("read input {}", path.display()))?,
                (None, None) => {
                    let mut buf = Vec::new();
                    io::stdin().lock().read_to_end(&mut buf).context("read stdin")?;
                    buf
                }
            };
            run_single(&data, &opts)?;
        }
        Commands::ScanDir { input, output, threads, max_file_size, common } => {
            let mut opts = resolve_options(&common)?;
            if let Some(n) = parse_threads(&threads) {
                opts.threads = Some(n);
            }
            if max_file_size.is_some() {
                opts.max_file_size = max_file_size;
            }
            info!(?input, ?output, "starting directory scan");

            let stats = match output {
                Some(path) => {
                    let mut out = BufWriter::new(File::create(&path).context("create output file")?);
                    scan_dir_and_write(&input, &mut out, &opts).context("scan directory failed")?
                }
                None => {
                    let stdout = io::stdout();
                    let mut out = stdout.lock();
                    scan_dir_and_write(&input, &mut out, &opts).context("scan directory failed")?
                }
            };
            info!(
                files_scanned = stats.files_scanned,
                files_skipped = stats.files_skipped,
                duplicates = stats.duplicates_total,
                "directory scan finished"
            );
        }
        Commands::Demo { common } => {
            let opts = resolve_options(&common)?;
            run_single(&demo_input(), &opts)?;
        }
    }

    Ok(())
}

/// 扫描单个输入并写到标准输出
fn run_single(data: &[u8], opts: &ScanOptions) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match opts.format {
        ReportFormat::Text => {
            let stats = scan_with_options(Some(data), &mut out, opts).context("duplicate scan failed")?;
            debug!(?stats, "scan stats");
        }
        ReportFormat::Json => {
            let report = write_json_report(Some(data), &mut out).context("duplicate scan failed")?;
            debug!(count = report.count, "json report written");
        }
    }
    out.flush().ok();
    Ok(())
}

/// 合并选项：默认值 ← 选项文件 ← 命令行参数
fn resolve_options(common: &CommonArgs) -> Result<ScanOptions> {
    let mut opts = match &common.config {
        Some(path) => load_options(path)?,
        None => ScanOptions::default(),
    };
    if let Some(f) = common.format {
        opts.format = f.into();
    }
    if let Some(cap) = common.buffer_capacity {
        opts.buffer_capacity = cap;
    }
    opts.validate()?;
    Ok(opts)
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    // 日志写到 stderr，stdout 只保留报告
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(env_filter).with_writer(io::stderr).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// 解析线程参数："auto" 返回 None，交由选项文件或 CPU 核数决定
fn parse_threads(s: &str) -> Option<usize> {
    if s.eq_ignore_ascii_case("auto") { return None; }
    match s.parse::<usize>() {
        Ok(n) if n >= 1 => Some(n),
        _ => None,
    }
}
