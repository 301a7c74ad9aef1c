// ============================================================
// Layer 4 — Embedding File Reader
// ============================================================
// Parses one embedding text file into a (CLIP, CLAP) pair.
//
// File layout:
//
//   CLIP Embedding:
//   0.12 -0.03 0.88 ...
//
//   CLAP Embedding:
//   0.40 0.10 -0.27 ...
//
// A line starting with a header switches the current section
// (the last header seen wins). Non-blank lines inside a section
// are whitespace-separated floats; blank lines are skipped
// everywhere, and lines before the first header are ignored.
// Every row of a section must have the same width.

use anyhow::{Context, Result};
use std::{fs, path::Path};
use thiserror::Error;

use crate::domain::embedding::{EmbeddingMatrix, EmbeddingPair, Section};

/// Ways a file's contents can fail to form two matrices.
#[derive(Debug, Error, PartialEq)]
pub enum EmbeddingParseError {
    #[error("line {line}: '{token}' is not a floating-point number")]
    InvalidFloat { line: usize, token: String },

    #[error("line {line}: {section} vector has {found} values, expected {expected}")]
    RaggedSection {
        section:  Section,
        line:     usize,
        expected: usize,
        found:    usize,
    },
}

/// Parse the text of an embedding file into `(clip, clap)`.
pub fn parse_embeddings(
    text: &str,
) -> std::result::Result<(EmbeddingMatrix, EmbeddingMatrix), EmbeddingParseError> {
    let mut clip_rows: Vec<Vec<f32>> = Vec::new();
    let mut clap_rows: Vec<Vec<f32>> = Vec::new();
    let mut current: Option<Section> = None;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;

        if line.starts_with(Section::Clip.header()) {
            current = Some(Section::Clip);
            continue;
        }
        if line.starts_with(Section::Clap.header()) {
            current = Some(Section::Clap);
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }
        let Some(section) = current else { continue };

        let row = parse_row(line, line_no)?;
        let rows = match section {
            Section::Clip => &mut clip_rows,
            Section::Clap => &mut clap_rows,
        };

        // Check width as rows arrive so the error can name the line.
        if let Some(first) = rows.first() {
            if first.len() != row.len() {
                return Err(EmbeddingParseError::RaggedSection {
                    section,
                    line: line_no,
                    expected: first.len(),
                    found: row.len(),
                });
            }
        }
        rows.push(row);
    }

    // Widths were checked row by row above, so from_rows cannot fail here.
    let clip = EmbeddingMatrix::from_rows(clip_rows).unwrap_or_default();
    let clap = EmbeddingMatrix::from_rows(clap_rows).unwrap_or_default();
    Ok((clip, clap))
}

fn parse_row(line: &str, line_no: usize) -> std::result::Result<Vec<f32>, EmbeddingParseError> {
    line.split_whitespace()
        .map(|tok| {
            tok.parse::<f32>().map_err(|_| EmbeddingParseError::InvalidFloat {
                line:  line_no,
                token: tok.to_string(),
            })
        })
        .collect()
}

/// Read and parse one embedding file from disk.
pub fn read_embeddings(path: &Path) -> Result<EmbeddingPair> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read embedding file '{}'", path.display()))?;

    let (clip, clap) = parse_embeddings(&text)
        .with_context(|| format!("Malformed embedding file '{}'", path.display()))?;

    let source = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();

    tracing::debug!(
        "Read {}: CLIP {}x{}, CLAP {}x{}",
        source, clip.rows(), clip.cols(), clap.rows(), clap.cols()
    );

    Ok(EmbeddingPair::new(source, clip, clap))
}
