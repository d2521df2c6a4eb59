//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `batch_controller` - 批处理控制器
//! - 校验参数、发现并选择样本
//! - 逐个样本：建输出目录 → 改 SIMX → 运行 core → 检查退出码
//! - 首个失败即停止（fail-fast），不重试、不回滚
//!
//! ### `batch_runner` - 前端入口
//! - 在独立任务里运行批处理，日志经通道回传
//! - 持有"运行中"标志，批处理结束后无条件复位
//!
//! ## 层次关系
//!
//! ```text
//! batch_runner (前端 / 运行标志)
//!     ↓
//! batch_controller (Vec<样本 ID>)
//!     ↓
//! services (样本发现 / 日志通道)
//!     ↓
//! infrastructure (SimxDocument / CoreProcess)
//! ```

pub mod batch_controller;
pub mod batch_runner;

pub use batch_controller::run_batch;
pub use batch_runner::{AlreadyRunning, BatchRunner, BatchTask};
