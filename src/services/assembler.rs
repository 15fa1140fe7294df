//! 合并文档组装 - 业务能力层
//!
//! 把每道题的题目单元格和各提交者的答案拼成一份笔记本。
//! 只读取收集阶段的结果，不重新匹配。

use std::collections::HashSet;
use tracing::debug;

use crate::models::notebook::{Cell, Notebook};
use crate::models::prompt::QuestionPrompt;
use crate::services::answer_collector::normalized_answer_text;

/// 提交者姓名标题的级别
const IDENTITY_HEADING_LEVEL: usize = 4;

/// 组装合并文档
///
/// # 参数
/// - `template`: 模板笔记本，元数据沿用到输出
/// - `prompts`: 已完成收集的题目
/// - `include_identities`: 为真时在每份答案前插入提交者标题且不去重；
///   为假时跳过与已输出答案文本相同的答案
pub fn assemble(template: &Notebook, prompts: &[QuestionPrompt], include_identities: bool) -> Notebook {
    let mut cells = Vec::new();

    for prompt in prompts {
        if prompt.matched_question_cells.is_empty() {
            // 没有任何人作答时退回模板中的题目
            cells.push(Cell::markdown(prompt.start_marker.clone()));
        } else {
            cells.extend(prompt.matched_question_cells.iter().cloned());
        }

        let mut seen = HashSet::new();
        let mut skipped = 0usize;
        for (submitter, answer) in prompt.answers.iter() {
            if include_identities {
                cells.push(Cell::markdown_heading(submitter, IDENTITY_HEADING_LEVEL));
            } else if !seen.insert(normalized_answer_text(answer)) {
                skipped += 1;
                continue;
            }
            cells.extend(answer.iter().cloned());
        }

        if skipped > 0 {
            debug!("题目 {} 跳过 {} 份重复答案", prompt.name, skipped);
        }
    }

    let mut collated = template.clone();
    collated.cells = cells;
    collated
}
