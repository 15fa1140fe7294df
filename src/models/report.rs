use serde::Serialize;

use crate::models::prompt::{AnswerStatus, SubmitterMap};

/// 一道题的答题状态行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptStatusRow {
    pub name: String,
    pub statuses: SubmitterMap<AnswerStatus>,
}

impl PromptStatusRow {
    /// 某一状态的人数
    pub fn count(&self, status: AnswerStatus) -> usize {
        self.statuses.iter().filter(|(_, s)| **s == status).count()
    }
}

/// 缺交报告：按题目顺序排列的状态表
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MissingAnswerReport {
    pub rows: Vec<PromptStatusRow>,
}

impl MissingAnswerReport {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 查询某人某题的状态
    pub fn status_of(&self, prompt_name: &str, submitter: &str) -> Option<AnswerStatus> {
        self.rows
            .iter()
            .find(|row| row.name == prompt_name)
            .and_then(|row| row.statuses.get(submitter).copied())
    }

    /// 全部题目中某一状态的总数
    pub fn total(&self, status: AnswerStatus) -> usize {
        self.rows.iter().map(|row| row.count(status)).sum()
    }

    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
