use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::processors::CycleOutcome;

/// Running tally of cycle outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleTally {
    pub accepted: u64,
    pub flagged: u64,
    pub rejected: u64,
    pub failed: u64,
}

impl CycleTally {
    pub fn record(&mut self, outcome: &CycleOutcome) {
        match outcome {
            Ok(snapshot) if snapshot.is_flagged() => self.flagged += 1,
            Ok(_) => self.accepted += 1,
            Err(e) if e.is_rejection() => self.rejected += 1,
            Err(_) => self.failed += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.accepted + self.flagged + self.rejected + self.failed
    }

    pub fn summary(&self) -> String {
        format!(
            "{} accepted, {} flagged, {} rejected, {} failed",
            self.accepted, self.flagged, self.rejected, self.failed
        )
    }
}

/// Progress bar over a replay. Silent mode keeps the tally but draws nothing.
pub struct ProgressReporter {
    progress_bar: Option<ProgressBar>,
    tally: CycleTally,
}

impl ProgressReporter {
    pub fn new(total: u64, message: &str, silent: bool) -> Self {
        let progress_bar = (!silent).then(|| {
            let pb = ProgressBar::new(total);
            let style = ProgressStyle::default_bar()
                .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-");
            pb.set_style(style);
            pb.set_message(message.to_string());
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        });

        Self {
            progress_bar,
            tally: CycleTally::default(),
        }
    }

    pub fn record(&mut self, outcome: &CycleOutcome) {
        self.tally.record(outcome);
        if let Some(ref pb) = self.progress_bar {
            pb.inc(1);
            pb.set_message(self.tally.summary());
        }
    }

    pub fn tally(&self) -> CycleTally {
        self.tally
    }

    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_with_message(format!("Replay complete: {}", self.tally.summary()));
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if let Some(ref pb) = self.progress_bar {
            if !pb.is_finished() {
                pb.finish();
            }
        }
    }
}
