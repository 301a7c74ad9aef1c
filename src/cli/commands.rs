// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `project`, and all
// their flags. Defaults reproduce the reference training run.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::application::{project_use_case::ProjectConfig, train_use_case::TrainConfig};
use crate::ml::backend::BackendKind;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the CLIP → CLAP projection on paired embedding files
    Train(TrainArgs),

    /// Project one embedding file's CLIP section with a trained checkpoint
    Project(ProjectArgs),
}

/// Burn backend to run on
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum BackendArg {
    /// GPU through wgpu
    #[default]
    Wgpu,
    /// CPU through ndarray
    Ndarray,
}

impl From<BackendArg> for BackendKind {
    fn from(b: BackendArg) -> Self {
        match b {
            BackendArg::Wgpu    => BackendKind::Wgpu,
            BackendArg::Ndarray => BackendKind::NdArray,
        }
    }
}

/// Model dimensions, shared by both commands so a checkpoint can be
/// reloaded with the architecture it was trained with.
#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// Flattened width of one file's CLIP section
    #[arg(long, default_value_t = 512)]
    pub input_dim: usize,

    /// Width of both hidden layers
    #[arg(long, default_value_t = 256)]
    pub hidden_dim: usize,

    /// Flattened width of one file's CLAP section
    #[arg(long, default_value_t = 512)]
    pub output_dim: usize,
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory of training embedding files
    #[arg(long, default_value = "data/embeddings/train")]
    pub train_dir: PathBuf,

    /// Directory of test embedding files
    #[arg(long, default_value = "data/embeddings/test")]
    pub test_dir: PathBuf,

    /// Where the checkpoint, metrics.csv and loss_curves.svg are written
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    #[arg(long, default_value_t = 50)]
    pub epochs: usize,

    /// Files per batch for both splits
    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Shuffle seed; random when omitted
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, value_enum, default_value_t = BackendArg::Wgpu)]
    pub backend: BackendArg,

    #[command(flatten)]
    pub model: ModelArgs,
}

impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            train_dir:      a.train_dir,
            test_dir:       a.test_dir,
            checkpoint_dir: a.checkpoint_dir,
            epochs:         a.epochs,
            batch_size:     a.batch_size,
            lr:             a.lr,
            input_dim:      a.model.input_dim,
            hidden_dim:     a.model.hidden_dim,
            output_dim:     a.model.output_dim,
            seed:           a.seed.unwrap_or_else(rand::random),
            backend:        a.backend.into(),
            ..TrainConfig::default()
        }
    }
}

#[derive(Args, Debug)]
pub struct ProjectArgs {
    /// Embedding file whose CLIP section is projected
    #[arg(long)]
    pub input: PathBuf,

    /// Directory holding clip_to_clap.mpk.gz
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = BackendArg::Wgpu)]
    pub backend: BackendArg,

    #[command(flatten)]
    pub model: ModelArgs,
}

impl From<ProjectArgs> for ProjectConfig {
    fn from(a: ProjectArgs) -> Self {
        ProjectConfig {
            input:          a.input,
            checkpoint_dir: a.checkpoint_dir,
            input_dim:      a.model.input_dim,
            hidden_dim:     a.model.hidden_dim,
            output_dim:     a.model.output_dim,
            backend:        a.backend.into(),
        }
    }
}
