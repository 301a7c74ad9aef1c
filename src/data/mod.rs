// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// From embedding text files to tensor batches:
//
//   directory of .txt files
//       │
//       ▼
//   reader            → parses one file into (CLIP, CLAP) matrices
//       │
//       ▼
//   EmbeddingDataset  → implements Burn's Dataset trait,
//       │               re-reading a file on every get()
//       ▼
//   EmbeddingBatcher  → flattens each example to one row per side
//       │               and stacks rows into tensors
//       ▼
//   DataLoader        → feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Parses the CLIP/CLAP text format
pub mod reader;

/// Implements Burn's Dataset trait over a directory of files
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
