//! 一次合并流程 - 流程层
//!
//! 核心职责：定义"一份作业"的完整合并流程
//!
//! 流程顺序：
//! 1. 校验模板并提取题目（每次调用只提取一次）
//! 2. 逐题、逐提交者收集作答
//! 3. 组装合并文档 + 生成缺交报告
//!
//! 所有题目和答案状态都属于单个 `Collation` 值，调用之间不共享。

use tracing::{debug, info};

use crate::config::CollateOptions;
use crate::error::CollateError;
use crate::models::notebook::Notebook;
use crate::models::prompt::{QuestionPrompt, SubmitterMap};
use crate::models::report::MissingAnswerReport;
use crate::services::answer_collector::AnswerCollector;
use crate::services::assembler::assemble;
use crate::services::cell_matcher::CellMatcher;
use crate::services::prompt_extractor::extract_prompts;
use crate::services::status_reporter::report;

/// 提交者 → 文档；`None` 表示文档缺失或无法解析
pub type Submissions = SubmitterMap<Option<Notebook>>;

/// `collate` 的结果
#[derive(Debug, Clone, PartialEq)]
pub struct CollateOutput {
    pub collated: Notebook,
    pub report: MissingAnswerReport,
}

/// 单次合并的全部状态
#[derive(Debug, Clone)]
pub struct Collation {
    template: Notebook,
    prompts: Vec<QuestionPrompt>,
    matcher: CellMatcher,
}

impl Collation {
    /// 校验模板并提取题目
    ///
    /// 模板会被复制并重新标注，调用方的文档不受影响。
    pub fn new(template: Option<&Notebook>, options: &CollateOptions) -> Result<Self, CollateError> {
        let template = template.ok_or_else(|| CollateError::invalid_template("模板文档缺失或无法解析"))?;

        let mut template = template.clone();
        template.annotate(None);
        let prompts = extract_prompts(&template);

        Ok(Self {
            template,
            prompts,
            matcher: options.matcher(),
        })
    }

    /// 模板所有者必须出现在提交集合中
    pub fn check_owner(&self, submissions: &Submissions) -> Result<(), CollateError> {
        let owner = self
            .template
            .owner()
            .ok_or_else(|| CollateError::invalid_template("模板缺少所有者信息"))?;
        if !submissions.contains_key(owner) {
            return Err(CollateError::OwnerDocumentMissing {
                owner: owner.to_string(),
            });
        }
        Ok(())
    }

    pub fn prompts(&self) -> &[QuestionPrompt] {
        &self.prompts
    }

    pub fn matcher(&self) -> &CellMatcher {
        &self.matcher
    }

    /// 对全部提交者收集作答
    pub fn collect(&mut self, submissions: &Submissions) {
        let collector = AnswerCollector::new(&self.matcher);
        collector.collect(
            &mut self.prompts,
            submissions.iter().map(|(k, nb)| (k, nb.as_ref())),
        );
        debug!(
            "收集完成: {} 道题 × {} 位提交者",
            self.prompts.len(),
            submissions.len()
        );
    }

    /// 在一份新的题目副本上收集一个分片
    ///
    /// 各分片互不共享可变状态，可以在不同线程上运行，
    /// 结果用 [`Collation::merge_shards`] 合并。
    pub fn collect_shard(&self, shard: &Submissions) -> Vec<QuestionPrompt> {
        collect_shard(self.prompts.clone(), &self.matcher, shard)
    }

    /// 按分片顺序合并各分片的收集结果
    ///
    /// 答案和状态按提交者有序并集；题目单元格取第一个有作答的分片。
    pub fn merge_shards(&mut self, shards: Vec<Vec<QuestionPrompt>>) {
        for shard in shards {
            for (prompt, collected) in self.prompts.iter_mut().zip(shard) {
                if prompt.matched_question_cells.is_empty() {
                    prompt.matched_question_cells = collected.matched_question_cells;
                }
                prompt.answers.extend(collected.answers);
                prompt.status.extend(collected.status);
            }
        }
    }

    /// 组装合并文档
    pub fn collated(&self, include_identities: bool) -> Notebook {
        assemble(&self.template, &self.prompts, include_identities)
    }

    /// 缺交报告
    pub fn report(&self) -> MissingAnswerReport {
        report(&self.prompts)
    }
}

/// 在给定题目副本上收集一个分片，供跨线程调用
pub fn collect_shard(
    mut prompts: Vec<QuestionPrompt>,
    matcher: &CellMatcher,
    shard: &Submissions,
) -> Vec<QuestionPrompt> {
    let collector = AnswerCollector::new(matcher);
    collector.collect(&mut prompts, shard.iter().map(|(k, nb)| (k, nb.as_ref())));
    prompts
}

/// 合并所有提交，生成去重后的合并文档和缺交报告
pub fn collate(
    template: Option<&Notebook>,
    submissions: &Submissions,
) -> Result<CollateOutput, CollateError> {
    collate_with_options(template, submissions, &CollateOptions::default())
}

/// 同 [`collate`]，使用自定义阈值和标题
pub fn collate_with_options(
    template: Option<&Notebook>,
    submissions: &Submissions,
    options: &CollateOptions,
) -> Result<CollateOutput, CollateError> {
    let mut collation = Collation::new(template, options)?;
    collation.check_owner(submissions)?;
    collation.collect(submissions);

    let output = CollateOutput {
        collated: collation.collated(false),
        report: collation.report(),
    };
    info!(
        "✓ 合并完成: {} 道题, {} 位提交者, {} 个单元格",
        collation.prompts().len(),
        submissions.len(),
        output.collated.cells.len()
    );
    Ok(output)
}

/// 按显示名称标注每份答案的合并文档，不去重
///
/// 键为显示名称，不要求包含模板所有者。
pub fn collate_with_identities(
    template: Option<&Notebook>,
    submissions: &Submissions,
) -> Result<Notebook, CollateError> {
    collate_with_identities_and_options(template, submissions, &CollateOptions::default())
}

/// 同 [`collate_with_identities`]，使用自定义阈值和标题
pub fn collate_with_identities_and_options(
    template: Option<&Notebook>,
    submissions: &Submissions,
    options: &CollateOptions,
) -> Result<Notebook, CollateError> {
    let mut collation = Collation::new(template, options)?;
    collation.collect(submissions);
    Ok(collation.collated(true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::notebook::Cell;
    use crate::models::prompt::AnswerStatus;

    fn template() -> Notebook {
        let mut nb = Notebook::new(vec![
            Cell::markdown("## Exercise 1\nWhat is 1 + 1?"),
            Cell::code(""),
            Cell::markdown("## Exercise 2\nWhat is 2 + 2?"),
            Cell::code(""),
        ]);
        nb.metadata.owner = Some("owner".to_string());
        nb
    }

    fn submission(a1: &str, a2: &str) -> Notebook {
        Notebook::new(vec![
            Cell::markdown("## Exercise 1\nWhat is 1 + 1?"),
            Cell::code(a1),
            Cell::markdown("## Exercise 2\nWhat is 2 + 2?"),
            Cell::code(a2),
        ])
    }

    fn submissions() -> Submissions {
        let mut subs = Submissions::new();
        subs.insert("owner", Some(template()));
        for (name, a1, a2) in [
            ("s1", "2", "4"),
            ("s2", "2", ""),
            ("s3", "two", "four"),
            ("s4", "", "4"),
            ("s5", "3", "5"),
        ] {
            subs.insert(name, Some(submission(a1, a2)));
        }
        subs.insert("s6", None);
        subs
    }

    #[test]
    fn test_missing_template_is_invalid() {
        let err = collate(None, &submissions()).unwrap_err();
        assert!(matches!(err, CollateError::InvalidTemplate { .. }));
    }

    #[test]
    fn test_template_without_owner_is_invalid() {
        let mut nb = template();
        nb.metadata.owner = None;
        let err = collate(Some(&nb), &submissions()).unwrap_err();
        assert!(matches!(err, CollateError::InvalidTemplate { .. }));
    }

    #[test]
    fn test_owner_must_be_submitted() {
        let mut subs = Submissions::new();
        subs.insert("s1", Some(submission("2", "4")));

        let err = collate(Some(&template()), &subs).unwrap_err();
        assert_eq!(
            err,
            CollateError::OwnerDocumentMissing {
                owner: "owner".to_string()
            }
        );
    }

    #[test]
    fn test_identities_do_not_require_owner() {
        let mut subs = Submissions::new();
        subs.insert("Alice", Some(submission("2", "4")));

        let nb = collate_with_identities(Some(&template()), &subs).unwrap();
        assert!(nb.cells.iter().any(|c| c.source == "#### Alice"));
    }

    #[test]
    fn test_sharded_collection_matches_serial_report() {
        let subs = submissions();
        let options = CollateOptions::default();

        let mut serial = Collation::new(Some(&template()), &options).unwrap();
        serial.collect(&subs);

        let mut sharded = Collation::new(Some(&template()), &options).unwrap();
        let shards: Vec<Vec<QuestionPrompt>> = subs
            .clone()
            .into_shards(2)
            .iter()
            .map(|shard| sharded.collect_shard(shard))
            .collect();
        sharded.merge_shards(shards);

        assert_eq!(serial.report(), sharded.report());
        assert_eq!(
            sharded.report().status_of("2. Exercise 2", "s2"),
            Some(AnswerStatus::Blank)
        );
        assert_eq!(
            sharded.report().status_of("1. Exercise 1", "s6"),
            Some(AnswerStatus::Missing)
        );
        let keys: Vec<&str> = sharded.prompts()[0].status.keys().collect();
        assert_eq!(keys, vec!["owner", "s1", "s2", "s3", "s4", "s5", "s6"]);
    }

    #[test]
    fn test_question_text_emitted_once() {
        let output = collate(Some(&template()), &submissions()).unwrap();
        let q1 = output
            .collated
            .cells
            .iter()
            .filter(|c| c.source.starts_with("## Exercise 1"))
            .count();
        assert_eq!(q1, 1);
    }
}
