// ============================================================
// Layer 5 — Projector
// ============================================================
// Loads a trained checkpoint and maps the CLIP section of an
// embedding file into CLAP space.
use anyhow::{anyhow, bail, Result};
use burn::prelude::*;

use crate::domain::embedding::{EmbeddingMatrix, EmbeddingPair};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::loss::cosine_similarity;
use crate::ml::model::{ClipToClapConfig, ClipToClapModel};

/// Result of projecting one file.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    /// Predicted CLAP embedding, unit norm
    pub vector: Vec<f32>,

    /// Cosine similarity to the file's own CLAP section, when it
    /// has the model's output width
    pub similarity: Option<f32>,
}

pub struct Projector<B: Backend> {
    model:      ClipToClapModel<B>,
    input_dim:  usize,
    output_dim: usize,
    device:     B::Device,
}

impl<B: Backend> Projector<B> {
    pub fn new(model: ClipToClapModel<B>, config: &ClipToClapConfig, device: B::Device) -> Self {
        Self {
            model,
            input_dim:  config.input_dim,
            output_dim: config.output_dim,
            device,
        }
    }

    pub fn from_checkpoint(
        ckpt_manager: &CheckpointManager,
        config:       &ClipToClapConfig,
        device:       B::Device,
    ) -> Result<Self> {
        let model = config.init::<B>(&device);
        let model = ckpt_manager.load_model(model, &device)?;
        tracing::info!("Model loaded from checkpoint");
        Ok(Self::new(model, config, device))
    }

    pub fn project(&self, pair: &EmbeddingPair) -> Result<Projection> {
        if pair.clip.flat_len() != self.input_dim {
            bail!(
                "'{}': flattened CLIP width {} does not match model input_dim {}",
                pair.source, pair.clip.flat_len(), self.input_dim
            );
        }

        let clip   = self.row_tensor(&pair.clip);
        let target = (pair.clap.flat_len() == self.output_dim).then(|| self.row_tensor(&pair.clap));

        let predicted  = self.model.forward(clip, target.clone());
        let similarity = target.map(|t| {
            cosine_similarity(predicted.clone(), t).into_scalar().elem::<f32>()
        });

        let vector = predicted
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow!("Cannot read projection back from device: {e:?}"))?;

        tracing::debug!("Projected '{}' (similarity {:?})", pair.source, similarity);
        Ok(Projection { vector, similarity })
    }

    /// Flatten a matrix into a [1, rows*cols] tensor.
    fn row_tensor(&self, m: &EmbeddingMatrix) -> Tensor<B, 2> {
        Tensor::from_data(
            TensorData::new(m.flattened().to_vec(), [1, m.flat_len()]),
            &self.device,
        )
    }
}
