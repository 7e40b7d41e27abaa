//! The periodic sync job: batch orchestration, status logging, scheduling

pub mod cycle;
pub mod orchestrator;
pub mod scheduler;
pub mod status;

pub use cycle::{CycleReport, CycleRunner};
pub use orchestrator::{BatchOrchestrator, BatchOutcome, BatchReport, BatchSettings, FetchResult};
pub use scheduler::CycleScheduler;
pub use status::{CycleStatus, StatusRecorder};
