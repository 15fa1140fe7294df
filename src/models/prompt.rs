use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use crate::models::notebook::Cell;

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#+\s*(.+)\n").expect("valid title pattern"));

/// 答题状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerStatus {
    Answered,
    Blank,
    Missing,
}

impl fmt::Display for AnswerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            AnswerStatus::Answered => "answered",
            AnswerStatus::Blank => "blank",
            AnswerStatus::Missing => "missing",
        };
        f.write_str(text)
    }
}

/// 答案区域的结束边界
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopMarker {
    /// 匹配单元格加上紧随其后的一个单元格
    NextCell,
    /// 读到文档末尾
    EndOfDocument,
    /// 显式的结束标记文本
    Text(String),
}

impl StopMarker {
    /// 文本哨兵形式："next_cell"、"" 或标记文本本身
    pub fn as_str(&self) -> &str {
        match self {
            StopMarker::NextCell => "next_cell",
            StopMarker::EndOfDocument => "",
            StopMarker::Text(text) => text,
        }
    }
}

impl From<&str> for StopMarker {
    fn from(text: &str) -> Self {
        match text {
            "next_cell" => StopMarker::NextCell,
            "" => StopMarker::EndOfDocument,
            other => StopMarker::Text(other.to_string()),
        }
    }
}

/// 按插入顺序保存的 提交者 → 值 映射
///
/// 查找是线性扫描，一份作业的提交者只有几十到几百人。
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitterMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for SubmitterMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> SubmitterMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入或覆盖；覆盖时保留原位置
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> + Clone {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + Clone {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// 按顺序切成每片最多 `size` 项的分片
    pub fn into_shards(self, size: usize) -> Vec<SubmitterMap<V>> {
        let size = size.max(1);
        let mut shards = Vec::new();
        let mut current = SubmitterMap::new();
        for entry in self.entries {
            current.entries.push(entry);
            if current.len() == size {
                shards.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            shards.push(current);
        }
        shards
    }

    /// 把另一份映射按顺序并入；已存在的键保留原位置
    pub fn extend(&mut self, other: SubmitterMap<V>) {
        for (k, v) in other.entries {
            self.insert(k, v);
        }
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for SubmitterMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

// 序列化为 JSON 对象，键顺序与插入顺序一致
impl<V: Serialize> Serialize for SubmitterMap<V> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<V> IntoIterator for SubmitterMap<V> {
    type Item = (String, V);
    type IntoIter = std::vec::IntoIter<(String, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// 从模板中提取出的一道题
///
/// 由提取器创建；收集阶段写入 `answers`、`status` 和
/// `matched_question_cells`，之后只读。
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionPrompt {
    pub index: usize,
    pub name: String,
    pub start_marker: String,
    pub stop_marker: StopMarker,
    pub is_optional: bool,
    pub is_poll: bool,
    pub allow_multi_cell: bool,
    /// 从第一份作答中取出的题目单元格
    pub matched_question_cells: Vec<Cell>,
    pub answers: SubmitterMap<Vec<Cell>>,
    pub status: SubmitterMap<AnswerStatus>,
}

impl QuestionPrompt {
    pub fn new(index: usize, name: impl Into<String>, start_marker: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
            start_marker: start_marker.into(),
            stop_marker: StopMarker::NextCell,
            is_optional: false,
            is_poll: false,
            allow_multi_cell: false,
            matched_question_cells: Vec::new(),
            answers: SubmitterMap::new(),
            status: SubmitterMap::new(),
        }
    }

    /// 根据题号和标题行生成名称
    ///
    /// `"## Exercise 2\n..."`（index 1）得到 `"2. Exercise 2"`；
    /// 没有标题行时只有题号。
    pub fn derive_name(index: usize, start_marker: &str) -> String {
        match TITLE_RE.captures(start_marker).and_then(|c| c.get(1)) {
            Some(title) => format!("{}. {}", index + 1, title.as_str()),
            None => format!("{}", index + 1),
        }
    }

    /// 是否计入缺交报告
    pub fn is_reported(&self) -> bool {
        !self.is_poll && !self.is_optional
    }
}
