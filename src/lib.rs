//! # nb_collate
//!
//! 把同一份模板派生出的多份笔记本作答合并成一份文档，并生成答题状态报告
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 模型层（Models）
//! - `models/` - 笔记本、题目、报告和作业清单的数据类型
//! - `Notebook` - nbformat v4 的内存表示，解析失败返回 `None`
//! - `QuestionPrompt` - 从模板中提取的一道题及其收集结果
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 每个模块只提供一种能力
//! - `prompt_extractor` - 从模板提取题目
//! - `cell_matcher` - 用编辑距离定位作答区间
//! - `answer_collector` - 判定答题状态并记录答案
//! - `assembler` / `status_reporter` - 组装合并文档、投影状态表
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 一次合并的完整流程
//! - `collate` / `collate_with_identities` - 引擎入口
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量作业处理器，控制并发
//! - `orchestrator/assignment_processor` - 单份作业处理器，读写文件
//!
//! 引擎本身（①②③）不做任何 I/O。

pub mod config;
pub mod error;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{CollateOptions, Config};
pub use error::{AppError, AppResult, CollateError};
pub use models::{AnswerStatus, Cell, MissingAnswerReport, Notebook, QuestionPrompt};
pub use orchestrator::{process_assignment, App};
pub use workflow::{collate, collate_with_identities, CollateOutput, Collation, Submissions};
