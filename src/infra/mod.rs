// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
//   checkpoint.rs — saves/loads model weights with Burn's
//                   NamedMpkGzFileRecorder
//   metrics.rs    — per-epoch losses: console line + CSV
//   plot.rs       — train/test loss curves as an SVG chart

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

/// Loss curve rendering
pub mod plot;
