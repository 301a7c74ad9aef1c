// ============================================================
// Layer 4 — Embedding Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<EmbeddingPair>
// into two float tensors.
//
// Each example is flattened to ONE row per side:
//   CLIP matrix (r x c) → row of length r*c
//   CLAP matrix (r x c) → row of length r*c
// then the rows are stacked:
//   clip: [batch_size, clip_width]
//   clap: [batch_size, clap_width]
//
// EmbeddingDataset::open has already checked that every file
// flattens to the same widths, so all rows line up.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::domain::embedding::EmbeddingPair;

/// A batch of flattened (CLIP, CLAP) rows.
#[derive(Debug, Clone)]
pub struct EmbeddingBatch<B: Backend> {
    /// Model input — shape: [batch_size, clip_width]
    pub clip: Tensor<B, 2>,

    /// Regression target — shape: [batch_size, clap_width]
    pub clap: Tensor<B, 2>,
}

impl<B: Backend> EmbeddingBatch<B> {
    /// Number of examples in this batch.
    pub fn len(&self) -> usize {
        self.clip.dims()[0]
    }
}

/// Stateless batcher; the DataLoader supplies the device.
#[derive(Clone, Debug, Default)]
pub struct EmbeddingBatcher;

impl EmbeddingBatcher {
    pub fn new() -> Self {
        Self
    }
}

impl<B: Backend> Batcher<B, EmbeddingPair, EmbeddingBatch<B>> for EmbeddingBatcher {
    fn batch(&self, items: Vec<EmbeddingPair>, device: &B::Device) -> EmbeddingBatch<B> {
        let batch_size = items.len();
        let clip_width = items.first().map_or(0, |p| p.clip.flat_len());
        let clap_width = items.first().map_or(0, |p| p.clap.flat_len());

        let clip_flat: Vec<f32> = items
            .iter()
            .flat_map(|p| p.clip.flattened().iter().copied())
            .collect();
        let clap_flat: Vec<f32> = items
            .iter()
            .flat_map(|p| p.clap.flattened().iter().copied())
            .collect();

        let clip = Tensor::<B, 2>::from_data(
            TensorData::new(clip_flat, [batch_size, clip_width]),
            device,
        );
        let clap = Tensor::<B, 2>::from_data(
            TensorData::new(clap_flat, [batch_size, clap_width]),
            device,
        );

        EmbeddingBatch { clip, clap }
    }
}
