// src/utils/progress_bars/logging.rs - stage-tagged logging helpers for the pipeline
use log::{debug, info, warn};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Extraction,
    Dedup,
    Standardization,
    DuplicateFinding,
    Export,
}

#[derive(Clone)]
pub struct DedupLogger {
    stage_name: &'static str,
    stage_emoji: &'static str,
    start_time: Instant,
}

impl DedupLogger {
    pub fn new(stage: PipelineStage) -> Self {
        let (stage_name, stage_emoji) = match stage {
            PipelineStage::Extraction => ("EXTRACT", "📥"),
            PipelineStage::Dedup => ("DEDUP", "🧹"),
            PipelineStage::Standardization => ("STANDARDIZE", "✍️"),
            PipelineStage::DuplicateFinding => ("DUPLICATES", "👥"),
            PipelineStage::Export => ("EXPORT", "📤"),
        };
        Self {
            stage_name,
            stage_emoji,
            start_time: Instant::now(),
        }
    }

    pub fn log_start(&self, run_id: &str, detail: &str) {
        info!(
            "[{}] {} 🚀 Starting {} (run ID: {}) {}",
            self.stage_name,
            self.stage_emoji,
            self.stage_name.to_lowercase(),
            run_id,
            detail
        );
    }

    pub fn log_phase(&self, phase: &str, details: Option<&str>) {
        let elapsed = self.start_time.elapsed();
        match details {
            Some(details) => info!(
                "[{}] {} 🔄 Phase: {} - {} [+{:.1}s]",
                self.stage_name, self.stage_emoji, phase, details, elapsed.as_secs_f32()
            ),
            None => info!(
                "[{}] {} 🔄 Phase: {} [+{:.1}s]",
                self.stage_name, self.stage_emoji, phase, elapsed.as_secs_f32()
            ),
        }
    }

    pub fn log_grouping_complete(&self, raw_count: usize, unique_keys: usize, groups_with_multiple: usize) {
        info!(
            "[{}] {} ✅ Grouping complete: {} records → {} unique keys → {} keys with 2+ records",
            self.stage_name, self.stage_emoji, raw_count, unique_keys, groups_with_multiple
        );
    }

    pub fn log_skipped_rows(&self, skipped: usize, reason: &str) {
        if skipped > 0 {
            warn!(
                "[{}] {} ⏭️  Skipped {} rows ({})",
                self.stage_name, self.stage_emoji, skipped, reason
            );
        }
    }

    pub fn log_batch_processing_start(&self, total_items: usize, batch_size: usize) {
        let batch_count = total_items.div_ceil(batch_size.max(1));
        info!(
            "[{}] {} ⚙️  Processing {} records in {} batches (batch size: {})",
            self.stage_name, self.stage_emoji, total_items, batch_count, batch_size
        );
    }

    pub fn log_batch_fallback(&self, batch_index: usize, records: usize, error: &str) {
        warn!(
            "[{}] {} ⚠️  Batch {} failed, applying local fallback to {} records: {}",
            self.stage_name, self.stage_emoji, batch_index + 1, records, error
        );
    }

    pub fn log_debug(&self, message: &str) {
        debug!("[{}] {} {}", self.stage_name, self.stage_emoji, message);
    }

    pub fn log_warning(&self, message: &str) {
        warn!("[{}] {} ⚠️  {}", self.stage_name, self.stage_emoji, message);
    }

    pub fn log_completion(&self, summary: &str) {
        info!(
            "[{}] {} 🏁 Completed in {:.2?}: {}",
            self.stage_name,
            self.stage_emoji,
            self.start_time.elapsed(),
            summary
        );
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }
}
