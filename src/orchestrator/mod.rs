//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责一次完整运行的调度，是整个系统的"指挥中心"。
//!
//! ### `batch_processor` - 批量样本处理器
//! - 管理应用生命周期（初始化、运行、清理）
//! - 解析计算器并确定输出路径
//! - 管理浏览器资源（启动或连接）
//! - 输出运行统计
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<Sample>)
//!     ↓
//! workflow::FormDriver (逐个填写样本)
//!     ↓
//! services (能力层：抽取 / 进度 / 写出)
//!     ↓
//! infrastructure (基础设施：PageDriver)
//! ```

pub mod batch_processor;

pub use batch_processor::{App, RunSummary};
