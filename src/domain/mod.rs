// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types with no Burn, file I/O or ML code:
// embedding matrices and the (CLIP, CLAP) pair read from one
// file.

pub mod embedding;
