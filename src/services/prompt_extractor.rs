//! 题目提取 - 业务能力层
//!
//! 扫描一次已标注的模板笔记本，按出现顺序生成 `QuestionPrompt` 列表。
//!
//! 扫描过程是对单元格的一次折叠，状态只有两种：
//! 没有打开的多单元格题目，或者打开了第 `i` 道题。

use tracing::debug;

use crate::models::notebook::{Cell, Notebook};
use crate::models::prompt::{QuestionPrompt, StopMarker};
use crate::services::heading_classifier::{mentions_optional, mentions_poll};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtractState {
    NoOpenPrompt,
    OpenPrompt(usize),
}

/// 从模板中提取题目
pub fn extract_prompts(template: &Notebook) -> Vec<QuestionPrompt> {
    let cell_count = template.cells.len();

    let (mut prompts, state) = template.cells.iter().enumerate().fold(
        (Vec::new(), ExtractState::NoOpenPrompt),
        |(mut prompts, state), (idx, cell)| {
            if !cell.tags.is_question {
                return (prompts, state);
            }
            let is_final_cell = idx + 1 == cell_count;
            let state = step(&mut prompts, state, cell, is_final_cell);
            (prompts, state)
        },
    );

    // 多单元格题目一直没有被后续题目关闭时，读到文档末尾
    if let ExtractState::OpenPrompt(open) = state {
        if prompts[open].stop_marker == StopMarker::NextCell {
            prompts[open].stop_marker = StopMarker::EndOfDocument;
        }
    }

    debug!("从模板中提取到 {} 道题目", prompts.len());
    prompts
}

fn step(
    prompts: &mut Vec<QuestionPrompt>,
    state: ExtractState,
    cell: &Cell,
    is_final_cell: bool,
) -> ExtractState {
    if let ExtractState::OpenPrompt(open) = state {
        let open_prompt = &mut prompts[open];
        if open_prompt.start_marker.trim() == cell.source.trim() {
            // 同一道题的延续
            if is_final_cell {
                open_prompt.stop_marker = StopMarker::EndOfDocument;
            }
            return state;
        }
        open_prompt.stop_marker = StopMarker::Text(cell.source.clone());
    }

    let index = prompts.len();
    let mut prompt = QuestionPrompt::new(index, prompt_name(index, cell), cell.source.clone());
    prompt.is_optional = cell
        .tags
        .is_optional
        .unwrap_or_else(|| mentions_optional(&cell.source));
    prompt.is_poll = cell
        .tags
        .is_poll
        .unwrap_or_else(|| mentions_poll(&cell.source));
    prompt.allow_multi_cell = cell.tags.allow_multi_cell;

    let next_state = if prompt.allow_multi_cell {
        if is_final_cell {
            prompt.stop_marker = StopMarker::EndOfDocument;
        }
        ExtractState::OpenPrompt(index)
    } else {
        ExtractState::NoOpenPrompt
    };

    prompts.push(prompt);
    next_state
}

fn prompt_name(index: usize, cell: &Cell) -> String {
    match cell.tags.problem.as_deref() {
        Some(problem) if !problem.is_empty() => problem.to_string(),
        _ => QuestionPrompt::derive_name(index, &cell.source),
    }
}
