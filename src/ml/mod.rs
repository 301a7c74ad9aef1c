// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn model, loss and training code lives here. The data
// layer only touches Burn through its Dataset and Batcher
// traits; the domain layer not at all.
//
//   model.rs     — ClipToClapModel: normalise → 3 Linear layers
//                  (ReLU between) → normalise
//   loss.rs      — cosine embedding loss with margin
//   trainer.rs   — epoch loop: Adam updates on the train split,
//                  evaluation on the test split, reporting
//   projector.rs — loads a checkpoint and projects new files
//   backend.rs   — which Burn backend to run on
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Selectable compute backend
pub mod backend;

/// CLIP → CLAP regression model
pub mod model;

/// Cosine embedding loss
pub mod loss;

/// Training loop with per-epoch test evaluation
pub mod trainer;

/// Checkpoint-backed inference
pub mod projector;
