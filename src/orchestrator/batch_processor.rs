//! 批量作业处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量作业的加载和并发调度。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：校验配置、创建运行日志
//! 2. **批量加载**：扫描并加载所有作业清单（`Vec<AssignmentManifest>`）
//! 3. **并发控制**：使用 Semaphore 限制同时合并的作业数量
//! 4. **全局统计**：汇总所有作业的处理结果
//!
//! 每份作业各自提取题目、各自持有答案状态，任务之间没有共享的可变状态。

use crate::config::Config;
use crate::models::manifest::AssignmentManifest;
use crate::orchestrator::assignment_processor::{self, AssignmentStats};
use crate::utils::logging::{
    append_log_line, init_log_file, log_manifests_loaded, log_startup, print_final_stats,
};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// 应用主结构
pub struct App {
    config: Arc<Config>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate()?;

        // 初始化日志文件
        init_log_file(&config.output_log_file)?;

        log_startup(config.max_concurrent_assignments, config.match_threshold);

        Ok(Self {
            config: Arc::new(config),
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<ProcessingStats> {
        let manifests = self.load_manifests().await?;

        if manifests.is_empty() {
            warn!("⚠️ 没有找到作业清单，程序结束");
            return Ok(ProcessingStats::default());
        }

        log_manifests_loaded(manifests.len(), self.config.max_concurrent_assignments);

        let stats = self.process_all(manifests).await?;

        print_final_stats(
            stats.success,
            stats.failed,
            stats.total,
            &self.config.output_log_file,
        );

        Ok(stats)
    }

    /// 加载作业清单
    async fn load_manifests(&self) -> Result<Vec<AssignmentManifest>> {
        info!("\n📁 正在扫描作业清单...");
        crate::models::load_all_manifests(&self.config.manifest_folder).await
    }

    /// 并发处理所有作业
    async fn process_all(&self, manifests: Vec<AssignmentManifest>) -> Result<ProcessingStats> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_assignments));
        let mut stats = ProcessingStats {
            total: manifests.len(),
            ..Default::default()
        };

        let mut handles = Vec::new();
        for (idx, manifest) in manifests.into_iter().enumerate() {
            let assignment_index = idx + 1;
            let permit = semaphore.clone().acquire_owned().await?;
            let config = Arc::clone(&self.config);

            let handle = tokio::spawn(async move {
                let _permit = permit;
                let result =
                    assignment_processor::process_assignment(&manifest, assignment_index, &config)
                        .await;
                (manifest.name, result)
            });
            handles.push((assignment_index, handle));
        }

        for (assignment_index, handle) in handles {
            match handle.await {
                Ok((name, Ok(assignment_stats))) => {
                    stats.success += 1;
                    self.record(&name, &assignment_stats);
                }
                Ok((name, Err(e))) => {
                    error!("[作业 {}] ❌ {} 处理失败: {:#}", assignment_index, name, e);
                    stats.failed += 1;
                    self.record_failure(&name, &e);
                }
                Err(e) => {
                    error!("[作业 {}] 任务执行失败: {}", assignment_index, e);
                    stats.failed += 1;
                }
            }
        }

        Ok(stats)
    }

    fn record(&self, name: &str, assignment_stats: &AssignmentStats) {
        let line = format!(
            "✓ {}: {} 道题, {} 位提交者, 已答 {} / 空白 {} / 缺失 {}",
            name,
            assignment_stats.prompts,
            assignment_stats.submitters,
            assignment_stats.answered,
            assignment_stats.blank,
            assignment_stats.missing
        );
        if let Err(e) = append_log_line(&self.config.output_log_file, &line) {
            warn!("写入运行日志失败: {}", e);
        }
    }

    fn record_failure(&self, name: &str, err: &anyhow::Error) {
        let line = format!("✗ {}: {:#}", name, err);
        if let Err(e) = append_log_line(&self.config.output_log_file, &line) {
            warn!("写入运行日志失败: {}", e);
        }
    }
}

/// 处理统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessingStats {
    pub success: usize,
    pub failed: usize,
    pub total: usize,
}
