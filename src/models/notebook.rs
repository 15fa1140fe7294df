//! 笔记本文档模型
//!
//! 与 Jupyter nbformat v4 JSON 兼容的最小内存表示：有序的单元格列表，
//! 每个单元格带类型、源文本、输出和元数据标记。
//!
//! 解析永远不会 panic，格式错误的输入返回 `None`。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use crate::services::heading_classifier::{classify_heading, HeadingKind};

/// 支持的 nbformat 主版本
pub const NBFORMAT_VERSION: u32 = 4;

/// 单元格类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    Markdown,
    Code,
    /// raw 以及其他未知类型
    #[serde(rename = "raw", other)]
    Other,
}

/// 单元格元数据中的标记
///
/// 未识别的键保存在 `extra` 中，写回时原样输出。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellTags {
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_question: bool,
    /// `None` 表示未显式标注，由题目首行推断
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_poll: Option<bool>,
    /// `None` 表示未显式标注，由题目首行推断
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_optional: Option<bool>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub allow_multi_cell: bool,
    /// 显式题目名称
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// 单个单元格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    #[serde(rename = "cell_type")]
    pub kind: CellKind,
    #[serde(deserialize_with = "deserialize_source")]
    pub source: String,
    #[serde(default, rename = "metadata")]
    pub tags: CellTags,
    /// 只有代码单元格带输出
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Vec<JsonValue>>,
    /// execution_count、id、attachments 等其余字段
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Cell {
    /// 创建 Markdown 单元格
    pub fn markdown(source: impl Into<String>) -> Self {
        Self {
            kind: CellKind::Markdown,
            source: source.into(),
            tags: CellTags::default(),
            outputs: None,
            extra: Map::new(),
        }
    }

    /// 创建代码单元格（无输出）
    pub fn code(source: impl Into<String>) -> Self {
        let mut extra = Map::new();
        extra.insert("execution_count".to_string(), JsonValue::Null);
        Self {
            kind: CellKind::Code,
            source: source.into(),
            tags: CellTags::default(),
            outputs: Some(Vec::new()),
            extra,
        }
    }

    /// 合成一个指定级别的 Markdown 标题单元格
    ///
    /// 例如 `markdown_heading("Alice", 4)` 得到 `#### Alice`
    pub fn markdown_heading(text: &str, level: usize) -> Self {
        Self::markdown(format!("{} {}", "#".repeat(level), text))
    }

    /// 源文本的第一行
    pub fn first_line(&self) -> &str {
        first_line(&self.source)
    }

    /// 源文本是否只有空白
    pub fn is_blank(&self) -> bool {
        self.source.trim().is_empty()
    }

    /// 是否题目单元格：已标注，或者是未标注但首行符合题目/投票标题的 Markdown
    pub fn is_question_cell(&self) -> bool {
        self.tags.is_question
            || (self.kind == CellKind::Markdown
                && classify_heading(&self.source) != HeadingKind::Plain)
    }
}

/// 返回文本的第一行
pub fn first_line(text: &str) -> &str {
    text.split('\n').next().unwrap_or_default()
}

/// 笔记本级元数据
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotebookMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// 一个解析后的笔记本文档
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    pub cells: Vec<Cell>,
    #[serde(default)]
    pub metadata: NotebookMetadata,
    #[serde(default = "default_nbformat")]
    pub nbformat: u32,
    #[serde(default)]
    pub nbformat_minor: u32,
}

fn default_nbformat() -> u32 {
    NBFORMAT_VERSION
}

impl Notebook {
    /// 用给定单元格创建 v4 笔记本
    pub fn new(cells: Vec<Cell>) -> Self {
        Self {
            cells,
            metadata: NotebookMetadata::default(),
            nbformat: NBFORMAT_VERSION,
            nbformat_minor: 2,
        }
    }

    /// 解析 nbformat JSON
    ///
    /// 非 JSON、缺少 `cells` 数组或版本不是 v4 时返回 `None`，从不报错。
    pub fn parse(raw: &str) -> Option<Self> {
        match serde_json::from_str::<Notebook>(raw) {
            Ok(nb) if nb.nbformat == NBFORMAT_VERSION => Some(nb),
            Ok(nb) => {
                debug!("不支持的 nbformat 版本: {}", nb.nbformat);
                None
            }
            Err(e) => {
                debug!("笔记本解析失败: {}", e);
                None
            }
        }
    }

    /// 清空所有代码单元格的输出
    pub fn clear_outputs(&mut self) {
        for cell in &mut self.cells {
            if let Some(outputs) = cell.outputs.as_mut() {
                outputs.clear();
            }
        }
    }

    /// 记录所有者并标记题目/投票单元格
    pub fn annotate(&mut self, owner: Option<&str>) {
        if let Some(owner) = owner {
            self.metadata.owner = Some(owner.to_string());
        }
        for cell in &mut self.cells {
            if cell.kind != CellKind::Markdown || cell.source.is_empty() {
                continue;
            }
            match classify_heading(&cell.source) {
                HeadingKind::Question => cell.tags.is_question = true,
                HeadingKind::Poll => {
                    cell.tags.is_question = true;
                    // 显式标注优先
                    if cell.tags.is_poll.is_none() {
                        cell.tags.is_poll = Some(true);
                    }
                }
                HeadingKind::Plain => {}
            }
        }
    }

    /// 所有者标识
    pub fn owner(&self) -> Option<&str> {
        self.metadata.owner.as_deref()
    }

    /// 序列化为 nbformat JSON
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// 一步完成解析、标注和（可选的）输出清理
pub fn safe_read(raw: &str, owner: Option<&str>, clear_outputs: bool) -> Option<Notebook> {
    let mut nb = Notebook::parse(raw)?;
    nb.annotate(owner);
    if clear_outputs {
        nb.clear_outputs();
    }
    Some(nb)
}

// nbformat 允许 source 是字符串或字符串数组
fn deserialize_source<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{SeqAccess, Visitor};
    use std::fmt;

    struct SourceVisitor;

    impl<'de> Visitor<'de> for SourceVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut source = String::new();
            while let Some(line) = seq.next_element::<String>()? {
                source.push_str(&line);
            }
            Ok(source)
        }
    }

    deserializer.deserialize_any(SourceVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r###"{
        "cells": [
            {"cell_type": "markdown", "metadata": {}, "source": ["## Exercise 1\n", "Say hi."]},
            {"cell_type": "code", "metadata": {"collapsed": true}, "execution_count": 3,
             "outputs": [{"output_type": "stream", "name": "stdout", "text": "hi"}],
             "source": "print('hi')"},
            {"cell_type": "markdown", "metadata": {}, "source": "## Reading Journal Feedback"},
            {"cell_type": "raw", "metadata": {}, "source": "raw text"}
        ],
        "metadata": {"kernelspec": {"name": "python3"}},
        "nbformat": 4,
        "nbformat_minor": 2
    }"###;

    #[test]
    fn test_parse_joins_source_lines() {
        let nb = Notebook::parse(SAMPLE).unwrap();
        assert_eq!(nb.cells.len(), 4);
        assert_eq!(nb.cells[0].source, "## Exercise 1\nSay hi.");
        assert_eq!(nb.cells[0].first_line(), "## Exercise 1");
        assert_eq!(nb.cells[3].kind, CellKind::Other);
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        assert!(Notebook::parse("not json at all").is_none());
        assert!(Notebook::parse(r#"{"metadata": {}}"#).is_none());
        assert!(Notebook::parse(r#"{"cells": [], "nbformat": 3}"#).is_none());
        assert!(Notebook::parse(r#"{"cells": [{"source": "x"}]}"#).is_none());
    }

    #[test]
    fn test_annotate_tags_questions_and_polls() {
        let mut nb = Notebook::parse(SAMPLE).unwrap();
        nb.annotate(Some("osteele"));

        assert_eq!(nb.owner(), Some("osteele"));
        assert!(nb.cells[0].tags.is_question);
        assert_eq!(nb.cells[0].tags.is_poll, None);
        assert!(!nb.cells[1].tags.is_question);
        assert!(nb.cells[2].tags.is_question);
        assert_eq!(nb.cells[2].tags.is_poll, Some(true));
    }

    #[test]
    fn test_annotate_keeps_explicit_poll_tag() {
        let mut cell = Cell::markdown("## Quick poll");
        cell.tags.is_poll = Some(false);
        let mut nb = Notebook::new(vec![cell]);
        nb.annotate(None);

        assert!(nb.cells[0].tags.is_question);
        assert_eq!(nb.cells[0].tags.is_poll, Some(false));
    }

    #[test]
    fn test_clear_outputs_only_touches_code_cells() {
        let mut nb = Notebook::parse(SAMPLE).unwrap();
        nb.clear_outputs();

        assert_eq!(nb.cells[1].outputs, Some(vec![]));
        assert_eq!(nb.cells[0].outputs, None);
    }

    #[test]
    fn test_round_trip_keeps_unknown_metadata() {
        let nb = safe_read(SAMPLE, None, false).unwrap();
        let json = nb.to_json_string().unwrap();
        let reparsed = Notebook::parse(&json).unwrap();

        assert_eq!(reparsed, nb);
        assert_eq!(
            reparsed.cells[1].tags.extra.get("collapsed"),
            Some(&JsonValue::Bool(true))
        );
        assert!(reparsed.metadata.extra.contains_key("kernelspec"));
    }

    #[test]
    fn test_markdown_heading() {
        let cell = Cell::markdown_heading("Alice", 4);
        assert_eq!(cell.source, "#### Alice");
        assert_eq!(cell.kind, CellKind::Markdown);
    }
}
