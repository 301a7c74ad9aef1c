// ============================================================
// Layer 5 — Cosine Embedding Loss
// ============================================================
// For each pair (x1, x2) with label y ∈ {+1, -1}:
//
//   cos  = x1·x2 / sqrt((|x1|² + ε)(|x2|² + ε))
//   loss = 1 - cos                 if y = +1
//        = max(0, cos - margin)    if y = -1
//
// then averaged over the batch. Training only ever passes
// all-ones labels, so the margin branch stays idle there.

use burn::prelude::*;

const EPS: f64 = 1e-12;

#[derive(Config, Debug)]
pub struct CosineEmbeddingLossConfig {
    #[config(default = 1.0)]
    pub margin: f64,
}

impl CosineEmbeddingLossConfig {
    pub fn init(&self) -> CosineEmbeddingLoss {
        CosineEmbeddingLoss { margin: self.margin }
    }
}

#[derive(Debug, Clone)]
pub struct CosineEmbeddingLoss {
    margin: f64,
}

impl CosineEmbeddingLoss {
    /// Mean loss over the batch. `labels` holds +1 or -1 per row;
    /// any other label contributes zero.
    pub fn forward<B: Backend>(
        &self,
        x1:     Tensor<B, 2>,
        x2:     Tensor<B, 2>,
        labels: Tensor<B, 1, Int>,
    ) -> Tensor<B, 1> {
        let cos = cosine_similarity(x1, x2);

        let positive = cos.clone().neg().add_scalar(1.0);
        let negative = cos.clone().sub_scalar(self.margin).clamp_min(0.0);

        let pos_mask = labels.clone().equal_elem(1);
        let neg_mask = labels.equal_elem(-1);

        cos.zeros_like()
            .mask_where(pos_mask, positive)
            .mask_where(neg_mask, negative)
            .mean()
    }

    /// Every pair labelled similar: the form used by training.
    pub fn forward_positive<B: Backend>(&self, x1: Tensor<B, 2>, x2: Tensor<B, 2>) -> Tensor<B, 1> {
        let [batch, _] = x1.dims();
        let labels = Tensor::<B, 1, Int>::ones([batch], &x1.device());
        self.forward(x1, x2, labels)
    }
}

/// Row-wise cosine similarity: [batch, d] x [batch, d] → [batch].
pub fn cosine_similarity<B: Backend>(x1: Tensor<B, 2>, x2: Tensor<B, 2>) -> Tensor<B, 1> {
    let dot = (x1.clone() * x2.clone()).sum_dim(1);
    let n1  = x1.powf_scalar(2.0).sum_dim(1).add_scalar(EPS);
    let n2  = x2.powf_scalar(2.0).sum_dim(1).add_scalar(EPS);
    (dot / (n1 * n2).sqrt()).flatten::<1>(0, 1)
}
