// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records the per-epoch losses to a CSV file next to the
// checkpoint, and formats the console line printed each epoch.
//
// Output file: <checkpoint_dir>/metrics.csv
//
//   epoch,train_loss,test_loss
//   1,0.912345,0.934567
//   2,0.701234,0.755678
//   ...
//
// The file is recreated at the start of every run.

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

/// Average losses for one epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochMetrics {
    /// Epoch number, starting at 1
    pub epoch: usize,

    /// Mean cosine-embedding loss over the training batches
    pub train_loss: f64,

    /// Mean cosine-embedding loss over the test batches
    pub test_loss: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, test_loss: f64) -> Self {
        Self { epoch, train_loss, test_loss }
    }

    /// `Epoch [i/total], Train Loss: x.xxxx, Test Loss: x.xxxx`
    pub fn report_line(&self, total_epochs: usize) -> String {
        format!(
            "Epoch [{}/{}], Train Loss: {:.4}, Test Loss: {:.4}",
            self.epoch, total_epochs, self.train_loss, self.test_loss
        )
    }
}

/// Appends one CSV row per epoch.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create `dir` if needed and start a fresh CSV with its header row.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create directory '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        let mut f = fs::File::create(&csv_path)
            .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
        writeln!(f, "epoch,train_loss,test_loss")?;
        tracing::debug!("Created metrics CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(f, "{},{:.6},{:.6}", m.epoch, m.train_loss, m.test_loss)?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, test_loss={:.4}",
            m.epoch, m.train_loss, m.test_loss,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
