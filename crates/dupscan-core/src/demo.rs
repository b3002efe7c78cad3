//! 内置演示输入
use crate::tracker::{ALPHABET_FIRST, ALPHABET_LAST, ALPHABET_SIZE};

/// 每个可打印字符按升序各出现两次（共 190 字节）
pub fn demo_input() -> Vec<u8> {
    let mut s = Vec::with_capacity(ALPHABET_SIZE * 2);
    for b in ALPHABET_FIRST..=ALPHABET_LAST {
        s.push(b);
        s.push(b);
    }
    s
}
