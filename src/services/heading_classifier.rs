//! 标题分类 - 业务能力层
//!
//! 只负责根据 Markdown 单元格首行判断它是题目、投票/反馈还是普通文本。
//! 纯函数，不修改任何单元格。

use regex::Regex;
use std::sync::LazyLock;

use crate::models::notebook::first_line;

static QUESTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^#+ Exercise").expect("valid question pattern"));

static POLL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^#+ .*(poll|Notes for the Instructors|Reading Journal Feedback)")
        .expect("valid poll pattern")
});

static OPTIONAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)optional").expect("valid optional pattern"));

static POLL_HINT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)poll|feedback").expect("valid poll hint pattern"));

/// 首行分类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingKind {
    /// 题目标题，如 `## Exercise 3`
    Question,
    /// 投票或反馈标题，同时也算作题目
    Poll,
    /// 其他
    Plain,
}

/// 对单元格源文本的首行分类
///
/// 题目模式优先于投票模式。
pub fn classify_heading(source: &str) -> HeadingKind {
    let line = first_line(source);
    if QUESTION_RE.is_match(line) {
        HeadingKind::Question
    } else if POLL_RE.is_match(line) {
        HeadingKind::Poll
    } else {
        HeadingKind::Plain
    }
}

/// 首行是否提到 "optional"
pub fn mentions_optional(source: &str) -> bool {
    OPTIONAL_RE.is_match(first_line(source))
}

/// 首行是否像投票或反馈题
pub fn mentions_poll(source: &str) -> bool {
    POLL_HINT_RE.is_match(first_line(source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_question_heading() {
        assert_eq!(classify_heading("## Exercise 1"), HeadingKind::Question);
        assert_eq!(classify_heading("# exercise 2\nbody"), HeadingKind::Question);
        assert_eq!(classify_heading("### EXERCISE"), HeadingKind::Question);
    }

    #[test]
    fn test_classify_poll_heading() {
        assert_eq!(classify_heading("## Quick poll"), HeadingKind::Poll);
        assert_eq!(
            classify_heading("## Reading Journal feedback"),
            HeadingKind::Poll
        );
        assert_eq!(
            classify_heading("# Notes for the Instructors"),
            HeadingKind::Poll
        );
    }

    #[test]
    fn test_classify_plain() {
        assert_eq!(classify_heading("Exercise 1"), HeadingKind::Plain);
        assert_eq!(classify_heading("##Exercise"), HeadingKind::Plain);
        assert_eq!(classify_heading("some text\n## Exercise 1"), HeadingKind::Plain);
        assert_eq!(classify_heading(""), HeadingKind::Plain);
    }

    #[test]
    fn test_hints_only_look_at_first_line() {
        assert!(mentions_optional("## Exercise 4 (Optional)"));
        assert!(!mentions_optional("## Exercise 4\nthis part is optional"));
        assert!(mentions_poll("## Reading Journal Feedback"));
        assert!(!mentions_poll("## Exercise 5"));
    }
}
