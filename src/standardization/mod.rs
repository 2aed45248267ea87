pub mod client;
pub mod config;
pub mod fallback;
pub mod orchestrator;

pub use client::{HttpStandardizationClient, StandardizationResult, StandardizationService};
pub use config::StandardizationConfig;
pub use fallback::BatchOperation;
pub use orchestrator::{
    apply_standardization, BatchOutcome, CancellationToken, DuplicateOutcome, ProgressCallback,
    StandardizationOrchestrator,
};
