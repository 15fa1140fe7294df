use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::utils::natural_sort::natural_cmp;

/// 一份作业的清单
///
/// ```toml
/// name = "day3_reading_journal"
/// owner = "osteele"
/// include_identities = true
///
/// [submissions]
/// osteele = "osteele.ipynb"
/// alice = "alice/day3.ipynb"
///
/// [display_names]
/// alice = "Alice Liddell"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentManifest {
    pub name: String,
    /// 模板所有者
    pub owner: String,
    /// 模板路径，缺省时使用所有者的提交
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// 是否同时输出带姓名的合并文档
    #[serde(default)]
    pub include_identities: bool,
    /// 提交者 → 笔记本路径（相对清单所在目录）
    pub submissions: BTreeMap<String, String>,
    #[serde(default)]
    pub display_names: BTreeMap<String, String>,
    #[serde(skip_serializing, skip_deserializing)]
    pub file_path: Option<PathBuf>,
}

impl AssignmentManifest {
    /// 清单所在目录
    pub fn base_dir(&self) -> PathBuf {
        self.file_path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    /// 解析相对路径
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.base_dir().join(relative)
    }

    /// 模板路径
    pub fn template_path(&self) -> Option<PathBuf> {
        self.template
            .as_deref()
            .or_else(|| self.submissions.get(&self.owner).map(String::as_str))
            .map(|p| self.resolve(p))
    }

    /// 提交者按自然顺序排列（`student2` 在 `student10` 之前）
    pub fn ordered_submitters(&self) -> Vec<&str> {
        let mut submitters: Vec<&str> = self.submissions.keys().map(String::as_str).collect();
        submitters.sort_by(|a, b| natural_cmp(a, b));
        submitters
    }

    /// 显示名称，没有配置时用登录名
    pub fn display_name<'a>(&'a self, submitter: &'a str) -> &'a str {
        self.display_names
            .get(submitter)
            .map(String::as_str)
            .unwrap_or(submitter)
    }
}
