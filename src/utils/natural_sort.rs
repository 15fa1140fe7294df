//! 自然排序：把字符串拆成文本段和数字段逐段比较

use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Chunk<'a> {
    Number(u64),
    Text(&'a str),
}

fn chunks(s: &str) -> Vec<Chunk<'_>> {
    let mut result = Vec::new();
    let mut start = 0;
    let mut in_digits = None;

    for (idx, ch) in s.char_indices() {
        let is_digit = ch.is_ascii_digit();
        if in_digits.is_some_and(|d| d != is_digit) {
            result.push(chunk(&s[start..idx]));
            start = idx;
        }
        in_digits = Some(is_digit);
    }
    if start < s.len() {
        result.push(chunk(&s[start..]));
    }
    result
}

fn chunk(part: &str) -> Chunk<'_> {
    match part.parse::<u64>() {
        Ok(n) if part.bytes().all(|b| b.is_ascii_digit()) => Chunk::Number(n),
        _ => Chunk::Text(part),
    }
}

/// 自然顺序比较，数字段按数值大小
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    chunks(a).cmp(&chunks(b)).then_with(|| a.cmp(b))
}
