//! 答案收集 - 业务能力层
//!
//! 对每道题、每位提交者调用匹配器，判定答题状态并记录答案单元格。

use tracing::debug;

use crate::models::notebook::{Cell, Notebook};
use crate::models::prompt::{AnswerStatus, QuestionPrompt};
use crate::services::cell_matcher::CellMatcher;

/// 答案收集器
pub struct AnswerCollector<'a> {
    matcher: &'a CellMatcher,
}

impl<'a> AnswerCollector<'a> {
    pub fn new(matcher: &'a CellMatcher) -> Self {
        Self { matcher }
    }

    /// 收集所有提交者对所有题目的作答
    ///
    /// `submissions` 中值为 `None` 表示文档缺失或无法解析，
    /// 该提交者的每道题都记为 `missing`。
    pub fn collect<'s, I>(&self, prompts: &mut [QuestionPrompt], submissions: I)
    where
        I: IntoIterator<Item = (&'s str, Option<&'s Notebook>)> + Clone,
    {
        for prompt in prompts.iter_mut() {
            for (submitter, notebook) in submissions.clone() {
                self.collect_one(prompt, submitter, notebook);
            }
            debug!(
                "题目 {} 收集完成: {} 份有效作答",
                prompt.name,
                prompt.answers.len()
            );
        }
    }

    /// 处理一位提交者对一道题的作答
    pub fn collect_one(
        &self,
        prompt: &mut QuestionPrompt,
        submitter: &str,
        notebook: Option<&Notebook>,
    ) -> AnswerStatus {
        let status = match notebook {
            Some(nb) => self.record(prompt, submitter, &nb.cells),
            None => AnswerStatus::Missing,
        };
        prompt.status.insert(submitter, status);
        status
    }

    fn record(&self, prompt: &mut QuestionPrompt, submitter: &str, cells: &[Cell]) -> AnswerStatus {
        // 状态只看定位结果，与提交者顺序无关
        let Some(range) = self.matcher.locate(prompt, cells) else {
            return AnswerStatus::Missing;
        };
        // 区间内重复出现的题目单元格不算作答内容
        let body = &cells[range.start + 1..range.end];
        if body
            .iter()
            .filter(|cell| !cell.is_question_cell())
            .all(Cell::is_blank)
        {
            return AnswerStatus::Blank;
        }

        let first_answer = prompt.answers.is_empty();
        // 多单元格题目在区间内会重复题目单元格，每份答案都要去掉
        let (question_cells, answer): (Vec<Cell>, Vec<Cell>) = self
            .matcher
            .match_cells(prompt, cells, !first_answer)
            .into_iter()
            .partition(Cell::is_question_cell);
        if first_answer {
            // 第一份作答提供题目单元格
            prompt.matched_question_cells = question_cells;
        }
        prompt.answers.insert(submitter, answer);
        AnswerStatus::Answered
    }
}

/// 答案文本归一化：拼接所有单元格源文本并去掉首尾空白
pub fn normalized_answer_text(cells: &[Cell]) -> String {
    cells
        .iter()
        .map(|cell| cell.source.as_str())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
