//! 单元格区间匹配 - 业务能力层
//!
//! 负责在提交者的单元格序列中找到某道题对应的连续单元格区间。
//!
//! 用字符级编辑距离定位题目开始单元格，超过阈值视为没有作答；
//! 并列时取第一个出现的单元格，保证结果确定。

use std::ops::Range;
use tracing::debug;

use crate::models::notebook::Cell;
use crate::models::prompt::{QuestionPrompt, StopMarker};

/// 默认匹配阈值（最大编辑距离）
pub const DEFAULT_MATCH_THRESHOLD: usize = 10;

/// 合成题目标题的级别
const QUESTION_HEADING_LEVEL: usize = 2;

/// 单元格区间匹配器
#[derive(Debug, Clone)]
pub struct CellMatcher {
    threshold: usize,
    question_heading: String,
}

impl Default for CellMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_THRESHOLD, "")
    }
}

impl CellMatcher {
    /// 创建匹配器
    ///
    /// # 参数
    /// - `threshold`: 可接受的最大编辑距离
    /// - `question_heading`: 合成标题文本，空字符串表示不合成
    pub fn new(threshold: usize, question_heading: impl Into<String>) -> Self {
        Self {
            threshold,
            question_heading: question_heading.into(),
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// 定位题目区间，不构造任何单元格
    ///
    /// 返回的区间以题目开始单元格为起点，不包含结束标记单元格。
    pub fn locate(&self, prompt: &QuestionPrompt, cells: &[Cell]) -> Option<Range<usize>> {
        let best = self.closest(&prompt.start_marker, cells)?;

        let end = match &prompt.stop_marker {
            StopMarker::NextCell => (best + 2).min(cells.len()),
            StopMarker::EndOfDocument => cells.len(),
            StopMarker::Text(stop) => {
                let Some(offset) = self.closest(stop, &cells[best..]) else {
                    debug!("题目 {} 找到开始标记但没有结束标记", prompt.index);
                    return None;
                };
                // 结束标记就是开始单元格时只保留开始单元格
                (best + offset).max(best + 1)
            }
        };

        Some(best..end)
    }

    /// 返回与题目最匹配的单元格列表，没有匹配时为空
    ///
    /// `suppress_boilerplate` 为真时省略合成标题和题目开始单元格，
    /// 用于题目本身已经从更早的提交中取得之后。
    pub fn match_cells(
        &self,
        prompt: &QuestionPrompt,
        cells: &[Cell],
        suppress_boilerplate: bool,
    ) -> Vec<Cell> {
        let Some(range) = self.locate(prompt, cells) else {
            return Vec::new();
        };

        let mut matched = Vec::with_capacity(range.len() + 1);
        if !suppress_boilerplate {
            if !self.question_heading.is_empty() {
                matched.push(self.heading_cell());
            }
            matched.push(cells[range.start].clone());
        }
        matched.extend_from_slice(&cells[range.start + 1..range.end]);
        matched
    }

    // 合成标题算作题目单元格，随题目一起输出
    fn heading_cell(&self) -> Cell {
        let mut cell = Cell::markdown_heading(&self.question_heading, QUESTION_HEADING_LEVEL);
        cell.tags.is_question = true;
        cell
    }

    /// 编辑距离最小且不超过阈值的单元格下标
    fn closest(&self, marker: &str, cells: &[Cell]) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        for (idx, cell) in cells.iter().enumerate() {
            let limit = best.map_or(self.threshold, |(d, _)| d);
            if let Some(distance) = bounded_levenshtein(marker, &cell.source, limit) {
                // 严格小于才替换，保证并列时取第一个
                if best.map_or(true, |(d, _)| distance < d) {
                    best = Some((distance, idx));
                    if distance == 0 {
                        break;
                    }
                }
            }
        }
        best.map(|(_, idx)| idx)
    }
}

/// 字符级 Levenshtein 距离
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let limit = a_chars.len().max(b_chars.len());
    bounded_distance(&a_chars, &b_chars, limit).unwrap_or(limit)
}

/// 距离不超过 `limit` 时返回距离，否则返回 `None`
///
/// 一旦某一行的最小值超过上限就提前结束。
pub fn bounded_levenshtein(a: &str, b: &str, limit: usize) -> Option<usize> {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    bounded_distance(&a_chars, &b_chars, limit)
}

fn bounded_distance(a: &[char], b: &[char], limit: usize) -> Option<usize> {
    let m = a.len();
    let n = b.len();

    if m.abs_diff(n) > limit {
        return None;
    }
    if m == 0 || n == 0 {
        return Some(m.max(n));
    }

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0usize; n + 1];

    for i in 1..=m {
        curr[0] = i;
        let mut row_min = curr[0];
        for j in 1..=n {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
            row_min = row_min.min(curr[j]);
        }
        if row_min > limit {
            return None;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    let distance = prev[n];
    (distance <= limit).then_some(distance)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(start: &str, stop: StopMarker) -> QuestionPrompt {
        let mut prompt = QuestionPrompt::new(0, "Q", start);
        prompt.stop_marker = stop;
        prompt
    }

    fn sources(cells: &[Cell]) -> Vec<&str> {
        cells.iter().map(|c| c.source.as_str()).collect()
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
        assert_eq!(levenshtein("é", "e"), 1);
    }

    #[test]
    fn test_bounded_levenshtein_cuts_off() {
        assert_eq!(bounded_levenshtein("kitten", "sitting", 3), Some(3));
        assert_eq!(bounded_levenshtein("kitten", "sitting", 2), None);
        assert_eq!(bounded_levenshtein("a", "abcdef", 2), None);
        assert_eq!(bounded_levenshtein("", "", 0), Some(0));
    }

    #[test]
    fn test_threshold_boundary() {
        let cells = vec![Cell::markdown("## Exercize 1"), Cell::code("answer()")];
        let p = prompt("## Exercise 1", StopMarker::NextCell);

        let strict = CellMatcher::new(0, "");
        assert!(strict.match_cells(&p, &cells, false).is_empty());

        let loose = CellMatcher::new(1, "");
        assert_eq!(
            sources(&loose.match_cells(&p, &cells, false)),
            vec!["## Exercize 1", "answer()"]
        );
    }

    #[test]
    fn test_ties_take_first_occurrence() {
        let cells = vec![
            Cell::markdown("intro"),
            Cell::markdown("## Exercise 1"),
            Cell::code("first"),
            Cell::markdown("## Exercise 1"),
            Cell::code("second"),
        ];
        let p = prompt("## Exercise 1", StopMarker::NextCell);

        let matcher = CellMatcher::default();
        assert_eq!(matcher.locate(&p, &cells), Some(1..3));
    }

    #[test]
    fn test_next_cell_on_last_cell_is_clipped() {
        let cells = vec![Cell::code("x"), Cell::markdown("## Exercise 1")];
        let p = prompt("## Exercise 1", StopMarker::NextCell);

        assert_eq!(CellMatcher::default().locate(&p, &cells), Some(1..2));
    }

    #[test]
    fn test_end_of_document_reads_to_end() {
        let cells = vec![
            Cell::markdown("## Exercise 9"),
            Cell::code("a"),
            Cell::code("b"),
            Cell::markdown("c"),
        ];
        let p = prompt("## Exercise 9", StopMarker::EndOfDocument);

        let matched = CellMatcher::default().match_cells(&p, &cells, false);
        assert_eq!(sources(&matched), vec!["## Exercise 9", "a", "b", "c"]);
    }

    #[test]
    fn test_explicit_stop_marker_excludes_boundary_cell() {
        let cells = vec![
            Cell::markdown("## Exercise 1"),
            Cell::code("a"),
            Cell::markdown("more"),
            Cell::markdown("## Exercise 2"),
            Cell::code("b"),
        ];
        let p = prompt("## Exercise 1", StopMarker::from("## Exercise 2"));

        let matched = CellMatcher::default().match_cells(&p, &cells, false);
        assert_eq!(sources(&matched), vec!["## Exercise 1", "a", "more"]);
    }

    #[test]
    fn test_missing_stop_marker_is_no_match() {
        let cells = vec![Cell::markdown("## Exercise 1"), Cell::code("a")];
        let p = prompt(
            "## Exercise 1",
            StopMarker::from("## Completely different closing heading"),
        );

        assert!(CellMatcher::default().match_cells(&p, &cells, false).is_empty());
    }

    #[test]
    fn test_suppress_boilerplate_drops_start_cell_and_heading() {
        let cells = vec![Cell::markdown("## Exercise 1"), Cell::code("a")];
        let p = prompt("## Exercise 1", StopMarker::NextCell);
        let matcher = CellMatcher::new(10, "Reading");

        let full = matcher.match_cells(&p, &cells, false);
        assert_eq!(sources(&full), vec!["## Reading", "## Exercise 1", "a"]);
        assert!(full[0].tags.is_question);

        let suppressed = matcher.match_cells(&p, &cells, true);
        assert_eq!(sources(&suppressed), vec!["a"]);
    }

    #[test]
    fn test_empty_document_has_no_match() {
        let p = prompt("## Exercise 1", StopMarker::NextCell);
        assert!(CellMatcher::default().locate(&p, &[]).is_none());
    }
}
