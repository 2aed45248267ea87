// src/utils/progress_bars/progress_config.rs

use indicatif::{ProgressBar, ProgressStyle};
use std::env;
use std::sync::Arc;

use crate::standardization::orchestrator::ProgressCallback;

/// Configuration for progress tracking in the CLI
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Whether to show progress bars at all
    pub enabled: bool,
    /// Whether to show per-batch messages on the bar
    pub detailed: bool,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            detailed: true,
        }
    }
}

impl ProgressConfig {
    /// Create progress configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            enabled: env::var("PROGRESS_ENABLED")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
            detailed: env::var("PROGRESS_DETAILED")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
        }
    }

    /// A percentage bar if progress is enabled, None otherwise
    pub fn create_bar(&self, label: &str) -> Option<ProgressBar> {
        if !self.enabled {
            return None;
        }
        let pb = ProgressBar::new(100);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        pb.set_message(label.to_string());
        Some(pb)
    }

    /// Adapts a bar into the orchestrator's progress callback.
    pub fn callback_for(&self, pb: &ProgressBar) -> ProgressCallback {
        let pb = pb.clone();
        let detailed = self.detailed;
        Arc::new(move |percent: u8, message: String| {
            pb.set_position(percent as u64);
            if detailed {
                pb.set_message(message);
            }
        })
    }
}

/// Finishes a bar that ran to completion, or freezes it where it stopped.
pub fn close_bar(pb: Option<ProgressBar>, completed: bool, message: &str) {
    if let Some(pb) = pb {
        if completed {
            pb.finish_with_message(message.to_string());
        } else {
            pb.abandon_with_message(message.to_string());
        }
    }
}
