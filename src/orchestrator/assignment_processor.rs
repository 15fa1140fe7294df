//! 单份作业处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块负责一份作业的完整合并，是作业级别的编排器。
//!
//! ## 核心功能
//!
//! 1. **读取文档**：按清单读取模板和每份提交，无法读取或解析的记为缺失
//! 2. **分片收集**：把提交者切成分片，在阻塞线程池上并行收集
//! 3. **合并输出**：写出合并笔记本、状态报告和（可选的）带姓名版本
//! 4. **统计输出**：记录已答/空白/缺失数量

use anyhow::{Context, Result};
use futures::future::join_all;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::FileError;
use crate::models::manifest::AssignmentManifest;
use crate::models::notebook::{safe_read, Notebook};
use crate::models::prompt::AnswerStatus;
use crate::models::report::MissingAnswerReport;
use crate::utils::logging::truncate_text;
use crate::workflow::collation::{collect_shard, Collation, Submissions};

/// 作业处理统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AssignmentStats {
    pub prompts: usize,
    pub submitters: usize,
    pub answered: usize,
    pub blank: usize,
    pub missing: usize,
}

impl AssignmentStats {
    fn from_report(prompts: usize, submitters: usize, report: &MissingAnswerReport) -> Self {
        Self {
            prompts,
            submitters,
            answered: report.total(AnswerStatus::Answered),
            blank: report.total(AnswerStatus::Blank),
            missing: report.total(AnswerStatus::Missing),
        }
    }
}

/// 输出文件路径
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentOutputs {
    pub combined: PathBuf,
    pub status: PathBuf,
    pub with_names: Option<PathBuf>,
}

impl AssignmentOutputs {
    fn new(output_folder: &Path, manifest: &AssignmentManifest) -> Self {
        Self {
            combined: output_folder.join(format!("{}-combined.ipynb", manifest.name)),
            status: output_folder.join(format!("{}-status.json", manifest.name)),
            with_names: manifest
                .include_identities
                .then(|| output_folder.join(format!("{}-with-names.ipynb", manifest.name))),
        }
    }
}

/// 处理单份作业
///
/// # 参数
/// - `manifest`: 作业清单
/// - `assignment_index`: 作业序号（仅用于日志）
/// - `config`: 配置
///
/// # 返回
/// 返回本作业的统计
pub async fn process_assignment(
    manifest: &AssignmentManifest,
    assignment_index: usize,
    config: &Config,
) -> Result<AssignmentStats> {
    info!(
        "[作业 {}] 📄 开始合并: {} ({} 份提交)",
        assignment_index,
        manifest.name,
        manifest.submissions.len()
    );

    let template = load_template(manifest, config).await?;
    let submissions = load_submissions(manifest, assignment_index, config).await;

    let options = config.collate_options();
    let mut collation = Collation::new(template.as_ref(), &options)
        .with_context(|| format!("作业 {} 的模板无效", manifest.name))?;
    collation
        .check_owner(&submissions)
        .with_context(|| format!("作业 {} 缺少所有者的提交", manifest.name))?;

    let identity_run = manifest
        .include_identities
        .then(|| identity_submissions(manifest, &submissions));

    let submitter_count = submissions.len();
    collect_sharded(&mut collation, submissions, config.shard_size).await?;

    let report = collation.report();
    let collated = collation.collated(false);

    let outputs = AssignmentOutputs::new(Path::new(&config.output_folder), manifest);
    fs::create_dir_all(&config.output_folder)
        .await
        .with_context(|| format!("无法创建输出目录: {}", config.output_folder))?;
    write_notebook(&outputs.combined, &collated).await?;
    write_text(&outputs.status, &report.to_json_string()?).await?;

    if let (Some(path), Some(named)) = (&outputs.with_names, identity_run) {
        // 带姓名版本单独运行一次，答案顺序与去重版本互不影响
        let mut named_collation = Collation::new(template.as_ref(), &options)?;
        collect_sharded(&mut named_collation, named, config.shard_size).await?;
        write_notebook(path, &named_collation.collated(true)).await?;
    }

    if config.verbose_logging {
        for row in &report.rows {
            debug!(
                "[作业 {}] {} → 已答 {} / 空白 {} / 缺失 {}",
                assignment_index,
                truncate_text(&row.name, 40),
                row.count(AnswerStatus::Answered),
                row.count(AnswerStatus::Blank),
                row.count(AnswerStatus::Missing)
            );
        }
    }

    let stats = AssignmentStats::from_report(collation.prompts().len(), submitter_count, &report);
    info!(
        "[作业 {}] ✓ 合并完成: {} 道题, 已答 {} / 空白 {} / 缺失 {}",
        assignment_index, stats.prompts, stats.answered, stats.blank, stats.missing
    );
    Ok(stats)
}

/// 分片收集并合并结果
///
/// 每个分片拿到自己的题目副本，在阻塞线程池上运行。
pub async fn collect_sharded(
    collation: &mut Collation,
    submissions: Submissions,
    shard_size: usize,
) -> Result<()> {
    let handles = submissions.into_shards(shard_size).into_iter().map(|shard| {
        let prompts = collation.prompts().to_vec();
        let matcher = collation.matcher().clone();
        tokio::task::spawn_blocking(move || collect_shard(prompts, &matcher, &shard))
    });

    let mut shards = Vec::new();
    for result in join_all(handles).await {
        shards.push(result.context("分片收集任务失败")?);
    }
    debug!("{} 个分片收集完成", shards.len());

    collation.merge_shards(shards);
    Ok(())
}

async fn load_template(manifest: &AssignmentManifest, config: &Config) -> Result<Option<Notebook>> {
    let Some(path) = manifest.template_path() else {
        warn!("作业 {} 没有指定模板，所有者也没有提交", manifest.name);
        return Ok(None);
    };
    let raw = fs::read_to_string(&path)
        .await
        .map_err(|e| FileError::read_failed(path.display().to_string(), e))?;
    Ok(safe_read(&raw, Some(&manifest.owner), config.clear_outputs))
}

/// 读取全部提交；读取或解析失败的记为 `None`
async fn load_submissions(
    manifest: &AssignmentManifest,
    assignment_index: usize,
    config: &Config,
) -> Submissions {
    let mut submissions = Submissions::new();
    for submitter in manifest.ordered_submitters() {
        let relative = &manifest.submissions[submitter];
        let path = manifest.resolve(relative);
        let notebook = match fs::read_to_string(&path).await {
            Ok(raw) => {
                let nb = safe_read(&raw, Some(submitter), config.clear_outputs);
                if nb.is_none() {
                    warn!(
                        "[作业 {}] ⚠️ {} 的笔记本无法解析: {}",
                        assignment_index,
                        submitter,
                        path.display()
                    );
                }
                nb
            }
            Err(e) => {
                warn!(
                    "[作业 {}] ⚠️ 无法读取 {} 的笔记本 {}: {}",
                    assignment_index,
                    submitter,
                    path.display(),
                    e
                );
                None
            }
        };
        submissions.insert(submitter, notebook);
    }
    submissions
}

/// 带姓名版本：以显示名称为键，去掉所有者和无法解析的提交，按自然顺序排列
fn identity_submissions(manifest: &AssignmentManifest, submissions: &Submissions) -> Submissions {
    let mut named: Vec<(String, Notebook)> = submissions
        .iter()
        .filter(|(submitter, _)| *submitter != manifest.owner)
        .filter_map(|(submitter, nb)| {
            nb.clone()
                .map(|nb| (manifest.display_name(submitter).to_string(), nb))
        })
        .collect();
    named.sort_by(|(a, _), (b, _)| crate::utils::natural_cmp(a, b));
    named.into_iter().map(|(name, nb)| (name, Some(nb))).collect()
}

async fn write_notebook(path: &Path, notebook: &Notebook) -> Result<()> {
    let json = notebook
        .to_json_string()
        .with_context(|| format!("无法序列化笔记本: {}", path.display()))?;
    write_text(path, &json).await
}

async fn write_text(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content)
        .await
        .map_err(|e| FileError::write_failed(path.display().to_string(), e))?;
    debug!("已写入: {}", path.display());
    Ok(())
}
