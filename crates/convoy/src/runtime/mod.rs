//! Runtime components for deployment orchestration

pub mod deployment;
pub mod graph;
pub mod monitor;
pub mod orchestrator;
pub mod plan;

pub use deployment::*;
pub use graph::*;
pub use monitor::*;
pub use orchestrator::*;
pub use plan::*;
