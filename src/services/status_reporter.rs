//! 答题状态报告 - 业务能力层

use crate::models::prompt::QuestionPrompt;
use crate::models::report::{MissingAnswerReport, PromptStatusRow};

/// 按题目顺序投影出状态表，跳过投票题和选做题
pub fn report(prompts: &[QuestionPrompt]) -> MissingAnswerReport {
    let rows = prompts
        .iter()
        .filter(|prompt| prompt.is_reported())
        .map(|prompt| PromptStatusRow {
            name: prompt.name.clone(),
            statuses: prompt.status.clone(),
        })
        .collect();
    MissingAnswerReport { rows }
}
