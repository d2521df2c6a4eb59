//! 基础设施层：持有共享 SIMX 文档和子进程这两类外部资源

pub mod core_process;
pub mod simx_document;

pub use core_process::{CoreProcess, STDIN_ANSWER};
pub use simx_document::{normalize_path, SimxDocument};
