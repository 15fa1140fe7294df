use crate::error::{AppResult, ConfigError};
use crate::services::cell_matcher::{CellMatcher, DEFAULT_MATCH_THRESHOLD};

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 作业清单（TOML）所在目录
    pub manifest_folder: String,
    /// 合并结果输出目录
    pub output_folder: String,
    /// 同时处理的作业数量
    pub max_concurrent_assignments: usize,
    /// 单个分片的提交者数量
    pub shard_size: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    // --- 匹配配置 ---
    pub match_threshold: usize,
    /// 合成题目标题，空字符串表示不合成
    pub question_heading: String,
    /// 合并前清空代码单元格输出
    pub clear_outputs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            manifest_folder: "assignments".to_string(),
            output_folder: "collated".to_string(),
            max_concurrent_assignments: 4,
            shard_size: 50,
            verbose_logging: false,
            output_log_file: "collate_log.txt".to_string(),
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            question_heading: String::new(),
            clear_outputs: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            manifest_folder: std::env::var("MANIFEST_FOLDER").unwrap_or(default.manifest_folder),
            output_folder: std::env::var("OUTPUT_FOLDER").unwrap_or(default.output_folder),
            max_concurrent_assignments: std::env::var("MAX_CONCURRENT_ASSIGNMENTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_concurrent_assignments),
            shard_size: std::env::var("SHARD_SIZE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.shard_size),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            match_threshold: std::env::var("MATCH_THRESHOLD").ok().and_then(|v| v.parse().ok()).unwrap_or(default.match_threshold),
            question_heading: std::env::var("QUESTION_HEADING").unwrap_or(default.question_heading),
            clear_outputs: std::env::var("CLEAR_OUTPUTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.clear_outputs),
        }
    }

    /// 检查取值范围
    pub fn validate(&self) -> AppResult<()> {
        if self.max_concurrent_assignments == 0 {
            return Err(ConfigError::InvalidValue {
                name: "MAX_CONCURRENT_ASSIGNMENTS".to_string(),
                reason: "必须大于 0".to_string(),
            }
            .into());
        }
        if self.shard_size == 0 {
            return Err(ConfigError::InvalidValue {
                name: "SHARD_SIZE".to_string(),
                reason: "必须大于 0".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// 引擎相关的配置子集
    pub fn collate_options(&self) -> CollateOptions {
        CollateOptions {
            match_threshold: self.match_threshold,
            question_heading: self.question_heading.clone(),
        }
    }
}

/// 合并引擎选项
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollateOptions {
    pub match_threshold: usize,
    pub question_heading: String,
}

impl Default for CollateOptions {
    fn default() -> Self {
        Self {
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            question_heading: String::new(),
        }
    }
}

impl CollateOptions {
    pub fn matcher(&self) -> CellMatcher {
        CellMatcher::new(self.match_threshold, self.question_heading.clone())
    }
}
