//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和文件读写，是整个系统中唯一做 I/O 的部分。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量作业处理器
//! - 管理应用生命周期（初始化、运行）
//! - 批量加载作业清单
//! - 控制并发数量（Semaphore）
//! - 输出全局统计信息
//!
//! ### `assignment_processor` - 单份作业处理器
//! - 读取模板和提交的笔记本
//! - 分片收集作答并合并
//! - 写出合并文档和状态报告
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<AssignmentManifest>)
//!     ↓
//! assignment_processor (处理一份作业的全部提交)
//!     ↓
//! workflow::Collation (一次合并流程)
//!     ↓
//! services (能力层：extract / match / collect / assemble / report)
//! ```

pub mod assignment_processor;
pub mod batch_processor;

// 重新导出主要类型
pub use assignment_processor::{process_assignment, AssignmentStats};
pub use batch_processor::{App, ProcessingStats};
