//! 字母表与逐符号跟踪状态

/// 字母表起点（空格）
pub const ALPHABET_FIRST: u8 = 32;
/// 字母表终点（`~`）
pub const ALPHABET_LAST: u8 = 126;
/// 字母表大小：95 个可打印 ASCII 字符
pub const ALPHABET_SIZE: usize = (ALPHABET_LAST - ALPHABET_FIRST) as usize + 1;

const WORDS: usize = ALPHABET_SIZE.div_ceil(64);

/// 字节到字母表下标的映射；范围外返回 None
#[inline]
pub fn alphabet_index(byte: u8) -> Option<usize> {
    if (ALPHABET_FIRST..=ALPHABET_LAST).contains(&byte) {
        Some((byte - ALPHABET_FIRST) as usize)
    } else {
        None
    }
}

/// 单个字节的分类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// 不在字母表内，状态不变
    Ignored,
    /// 首次出现，仅置 seen 位
    FirstSeen,
    /// 第二次出现且尚未输出：调用方需要写入报告
    NewDuplicate,
    /// 已经输出过
    AlreadyReported,
}

/// 跟踪状态：每个符号一位 seen + 一位已输出
/// - 定长数组，大小只取决于字母表
/// - 下标越界（>= ALPHABET_SIZE）会 panic，调用方应先经 `alphabet_index` 映射
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharTracker {
    seen: [u64; WORDS],
    emitted: [u64; WORDS],
}

#[inline]
fn locate(symbol: usize) -> (usize, u64) {
    assert!(symbol < ALPHABET_SIZE, "symbol index {symbol} out of alphabet");
    (symbol / 64, 1u64 << (symbol % 64))
}

impl CharTracker {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_seen(&self, symbol: usize) -> bool {
        let (w, mask) = locate(symbol);
        self.seen[w] & mask != 0
    }

    #[inline]
    pub fn mark_seen(&mut self, symbol: usize) {
        let (w, mask) = locate(symbol);
        self.seen[w] |= mask;
    }

    #[inline]
    pub fn is_duplicate_emitted(&self, symbol: usize) -> bool {
        let (w, mask) = locate(symbol);
        self.emitted[w] & mask != 0
    }

    #[inline]
    pub fn mark_duplicate_emitted(&mut self, symbol: usize) {
        let (w, mask) = locate(symbol);
        self.emitted[w] |= mask;
    }

    /// 已输出的重复符号个数
    pub fn duplicate_count(&self) -> usize {
        self.emitted.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// 处理一个字节并更新状态
    #[inline]
    pub fn observe(&mut self, byte: u8) -> Observation {
        let Some(idx) = alphabet_index(byte) else {
            return Observation::Ignored;
        };
        if !self.is_seen(idx) {
            self.mark_seen(idx);
            return Observation::FirstSeen;
        }
        if self.is_duplicate_emitted(idx) {
            return Observation::AlreadyReported;
        }
        self.mark_duplicate_emitted(idx);
        Observation::NewDuplicate
    }
}
