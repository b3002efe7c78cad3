//! 定长缓冲分块写出器
use std::io::{self, Write};

use tracing::trace;

/// 默认缓冲容量（字节）
pub const DEFAULT_BUFFER_CAPACITY: usize = 256;
/// 最小容量：一次追加最多 3 字节（`, ` + 字符）
pub const MIN_BUFFER_CAPACITY: usize = 3;

/// 写出统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EmitStats {
    /// 实际调用输出端写入的次数
    pub flushes: usize,
    pub bytes_written: usize,
}

/// 在定长缓冲中累积输出，容量不足时整块写出并复用缓冲
/// - 缓冲不会扩容；`reserve` 负责在追加前腾出空间
/// - 输出端出错后进入失败状态，之后不再写（包括 drop 时）
/// - 未调用 `finish` 就被 drop 时，尽力写出剩余内容
pub struct ChunkedWriter<'w, W: Write + ?Sized> {
    sink: &'w mut W,
    buf: Vec<u8>,
    capacity: usize,
    stats: EmitStats,
    failed: bool,
    finished: bool,
}

impl<'w, W: Write + ?Sized> ChunkedWriter<'w, W> {
    /// 以默认容量创建
    pub fn new(sink: &'w mut W) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY, sink)
    }

    /// 指定容量创建；容量会被抬到 `MIN_BUFFER_CAPACITY`
    pub fn with_capacity(capacity: usize, sink: &'w mut W) -> Self {
        let capacity = capacity.max(MIN_BUFFER_CAPACITY);
        Self { sink, buf: Vec::with_capacity(capacity), capacity, stats: EmitStats::default(), failed: false, finished: false }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 当前缓冲中尚未写出的字节数
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    pub fn stats(&self) -> EmitStats {
        self.stats
    }

    /// 保证接下来 `n` 字节放得下；放不下则先写出缓冲并清零长度
    pub fn reserve(&mut self, n: usize) -> io::Result<()> {
        debug_assert!(n <= self.capacity);
        if self.buf.len() + n > self.capacity {
            self.flush_pending()?;
        }
        Ok(())
    }

    /// 追加字节；调用方需先 `reserve`
    pub fn push(&mut self, bytes: &[u8]) {
        debug_assert!(self.buf.len() + bytes.len() <= self.capacity);
        self.buf.extend_from_slice(bytes);
    }

    /// 将缓冲整体写出到输出端，成功后长度归零
    pub fn flush_pending(&mut self) -> io::Result<()> {
        if self.failed {
            return Err(io::Error::new(io::ErrorKind::Other, "sink previously failed"));
        }
        if self.buf.is_empty() {
            return Ok(());
        }
        if let Err(e) = self.sink.write_all(&self.buf) {
            self.failed = true;
            return Err(e);
        }
        self.stats.flushes += 1;
        self.stats.bytes_written += self.buf.len();
        trace!(chunk = self.buf.len(), "flushed chunk");
        self.buf.clear();
        Ok(())
    }

    /// 写出剩余内容并刷新输出端
    pub fn finish(mut self) -> io::Result<EmitStats> {
        self.finished = true;
        self.flush_pending()?;
        if let Err(e) = self.sink.flush() {
            self.failed = true;
            return Err(e);
        }
        Ok(self.stats)
    }
}

impl<W: Write + ?Sized> Drop for ChunkedWriter<'_, W> {
    fn drop(&mut self) {
        if !self.finished && !self.failed {
            let _ = self.flush_pending();
        }
    }
}
