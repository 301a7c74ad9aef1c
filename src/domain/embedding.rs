// ============================================================
// Layer 3 — Embedding Domain Types
// ============================================================
// A plain row-major matrix of f32 plus the (CLIP, CLAP) pair
// read from one embedding file. No Burn types here — the
// batcher is the only place these become tensors.

use std::fmt;

/// Which block of an embedding file a vector belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Clip,
    Clap,
}

impl Section {
    /// Header prefix that switches the reader into this section.
    pub fn header(self) -> &'static str {
        match self {
            Section::Clip => "CLIP Embedding:",
            Section::Clap => "CLAP Embedding:",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Clip => write!(f, "CLIP"),
            Section::Clap => write!(f, "CLAP"),
        }
    }
}

/// A dense `rows x cols` matrix stored row-major.
///
/// An absent or empty section is the 0x0 matrix.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EmbeddingMatrix {
    rows:   usize,
    cols:   usize,
    values: Vec<f32>,
}

impl EmbeddingMatrix {
    /// Build from row vectors that are already known to share one width.
    /// Returns `None` if any row differs in length from the first.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Option<Self> {
        let Some(first) = rows.first() else {
            return Some(Self::default());
        };
        let cols = first.len();
        if rows.iter().any(|r| r.len() != cols) {
            return None;
        }
        let n = rows.len();
        let values = rows.into_iter().flatten().collect();
        Some(Self { rows: n, cols, values })
    }

    pub fn rows(&self) -> usize { self.rows }

    pub fn cols(&self) -> usize { self.cols }

    /// All rows concatenated into one.
    pub fn flattened(&self) -> &[f32] {
        &self.values
    }

    /// Width of the matrix once flattened to a single row.
    pub fn flat_len(&self) -> usize {
        self.values.len()
    }
}

/// One training example: everything read from a single embedding file.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingPair {
    /// File name the pair was read from, for log messages
    pub source: String,
    pub clip:   EmbeddingMatrix,
    pub clap:   EmbeddingMatrix,
}

impl EmbeddingPair {
    pub fn new(source: impl Into<String>, clip: EmbeddingMatrix, clap: EmbeddingMatrix) -> Self {
        Self { source: source.into(), clip, clap }
    }
}
