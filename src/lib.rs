//! # ENVI-met Batch Runner
//!
//! 批量驱动外部模拟程序（ENVI-met core）：按样本改写共享的 `.SIMX`
//! 配置文件，运行 core，并把它的控制台输出汇入日志。
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `SimxDocument` - 共享 SIMX 文档，windows-1252 读写，标签替换
//! - `CoreProcess` - core 子进程，回答启动提示并逐行转发输出
//!
//! ### ② 业务能力层（Services）
//! - `sample_discovery` - 发现 `sample_<N>.INX` 样本和 `.SIMX` 文档
//! - `LogSink` - 线程安全、只追加的日志通道
//!
//! ### ③ 编排层（Orchestration）
//! - `orchestrator/batch_controller` - 批处理状态机，逐个样本 fail-fast
//! - `orchestrator/batch_runner` - 独立任务运行批处理，管理"运行中"标志
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use config::Config;
pub use error::{BatchError, BatchResult, InfrastructureError, InputError, SampleFailure};
pub use infrastructure::{CoreProcess, SimxDocument};
pub use models::{select_samples, BatchParams, RunOutcome, SampleRun, SampleSelection, SelectionMode};
pub use orchestrator::{run_batch, BatchRunner};
pub use services::{discover_samples, LogSink};
