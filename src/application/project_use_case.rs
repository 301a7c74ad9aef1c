// ============================================================
// Layer 2 — ProjectUseCase
// ============================================================
// Reads one embedding file, loads the checkpoint and returns
// the projected CLAP vector formatted as an embedding section.

use anyhow::Result;
use burn::prelude::Backend;
use std::path::PathBuf;

use crate::data::reader::read_embeddings;
use crate::domain::embedding::Section;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    backend::BackendKind,
    model::ClipToClapConfig,
    projector::{Projection, Projector},
};

#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub input:          PathBuf,
    pub checkpoint_dir: PathBuf,
    pub input_dim:      usize,
    pub hidden_dim:     usize,
    pub output_dim:     usize,
    pub backend:        BackendKind,
}

impl ProjectConfig {
    pub fn model_config(&self) -> ClipToClapConfig {
        ClipToClapConfig::new()
            .with_input_dim(self.input_dim)
            .with_hidden_dim(self.hidden_dim)
            .with_output_dim(self.output_dim)
    }
}

pub struct ProjectUseCase {
    config: ProjectConfig,
}

impl ProjectUseCase {
    pub fn new(config: ProjectConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<Projection> {
        match self.config.backend {
            BackendKind::Wgpu => self.run::<burn::backend::Wgpu>(Default::default()),
            BackendKind::NdArray => self.run::<burn::backend::NdArray>(Default::default()),
        }
    }

    fn run<B: Backend>(&self, device: B::Device) -> Result<Projection> {
        let cfg  = &self.config;
        let pair = read_embeddings(&cfg.input)?;

        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir);
        let projector    = Projector::<B>::from_checkpoint(&ckpt_manager, &cfg.model_config(), device)?;
        projector.project(&pair)
    }
}

/// Render a projection as a `CLAP Embedding:` section. The similarity
/// line, when present, goes above the header so the reader skips it.
pub fn format_projection(p: &Projection) -> String {
    let values: Vec<String> = p.vector.iter().map(|v| v.to_string()).collect();

    let mut lines = Vec::with_capacity(3);
    if let Some(sim) = p.similarity {
        lines.push(format!("Cosine similarity to input CLAP: {sim:.4}"));
    }
    lines.push(Section::Clap.header().to_string());
    lines.push(values.join(" "));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
