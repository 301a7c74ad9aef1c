// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the training pipeline in order:
//
//   Step 1: Open the train split       (Layer 4 - data)
//   Step 2: Open the test split        (Layer 4 - data)
//   Step 3: Run training loop          (Layer 5 - ml)
//           → metrics.csv, loss_curves.svg, checkpoint (Layer 6)

use anyhow::Result;
use std::path::PathBuf;

use crate::data::dataset::EmbeddingDataset;
use crate::infra::{checkpoint::CheckpointManager, metrics::EpochMetrics};
use crate::ml::{backend::BackendKind, model::ClipToClapConfig, trainer::run_training};

// ─── Training Configuration ──────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub train_dir:      PathBuf,
    pub test_dir:       PathBuf,
    pub checkpoint_dir: PathBuf,
    pub epochs:         usize,
    pub batch_size:     usize,
    pub lr:             f64,
    pub input_dim:      usize,
    pub hidden_dim:     usize,
    pub output_dim:     usize,
    pub margin:         f64,
    /// Seed for the per-epoch shuffle of the train split
    pub seed:           u64,
    pub backend:        BackendKind,
}

impl TrainConfig {
    pub fn model_config(&self) -> ClipToClapConfig {
        ClipToClapConfig::new()
            .with_input_dim(self.input_dim)
            .with_hidden_dim(self.hidden_dim)
            .with_output_dim(self.output_dim)
    }
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            train_dir:      PathBuf::from("data/embeddings/train"),
            test_dir:       PathBuf::from("data/embeddings/test"),
            checkpoint_dir: PathBuf::from("checkpoints"),
            epochs:         50,
            batch_size:     64,
            lr:             1e-3,
            input_dim:      512,
            hidden_dim:     256,
            output_dim:     512,
            margin:         1.0,
            seed:           42,
            backend:        BackendKind::default(),
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline and return the per-epoch losses.
    pub fn execute(&self) -> Result<Vec<EpochMetrics>> {
        let cfg = &self.config;

        // ── Step 1 + 2: Open both splits ──────────────────────────────────────
        // Every file is parsed once here so malformed input fails
        // before the first epoch.
        tracing::info!("Opening train split '{}'", cfg.train_dir.display());
        let train_dataset = EmbeddingDataset::open(&cfg.train_dir)?;
        tracing::info!("Opening test split '{}'", cfg.test_dir.display());
        let test_dataset = EmbeddingDataset::open(&cfg.test_dir)?;

        // ── Step 3: Train, plot, checkpoint ───────────────────────────────────
        tracing::info!(
            "Training for {} epochs, batch size {}, lr {}, shuffle seed {}",
            cfg.epochs, cfg.batch_size, cfg.lr, cfg.seed
        );
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir);
        run_training(cfg, train_dataset, test_dataset, &ckpt_manager)
    }
}
