use anyhow::{bail, Context, Result};
use burn::data::dataset::Dataset;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::data::reader::read_embeddings;
use crate::domain::embedding::EmbeddingPair;

/// A directory of embedding files exposed as a Burn dataset.
///
/// Files are listed once, sorted by name. Each `get` re-reads and
/// re-parses its file, so memory use stays flat however large the
/// directory is.
pub struct EmbeddingDataset {
    dir:        PathBuf,
    files:      Vec<PathBuf>,
    clip_width: usize,
    clap_width: usize,
}

impl EmbeddingDataset {
    /// List `dir` and read every file once to learn the flattened
    /// CLIP and CLAP widths. Fails on an unreadable directory, an
    /// unparsable file, or files that disagree on either width.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();

        let mut files = Vec::new();
        for entry in fs::read_dir(&dir)
            .with_context(|| format!("Cannot read directory '{}'", dir.display()))?
        {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();

        // (clip_width, clap_width) of the first file, and its name
        let mut widths: Option<((usize, usize), String)> = None;
        for path in &files {
            let pair  = read_embeddings(path)?;
            let found = (pair.clip.flat_len(), pair.clap.flat_len());
            let (expected, first) = widths.get_or_insert_with(|| (found, pair.source.clone()));
            if *expected != found {
                bail!(
                    "'{}' has flattened widths CLIP={} CLAP={}, but '{}' has CLIP={} CLAP={}",
                    pair.source, found.0, found.1, first, expected.0, expected.1
                );
            }
        }
        let (clip_width, clap_width) = widths.map(|(w, _)| w).unwrap_or((0, 0));

        tracing::info!(
            "Dataset '{}': {} files, CLIP width {}, CLAP width {}",
            dir.display(), files.len(), clip_width, clap_width
        );

        Ok(Self { dir, files, clip_width, clap_width })
    }

    /// Re-read the file at `index`.
    pub fn read_pair(&self, index: usize) -> Result<EmbeddingPair> {
        let Some(path) = self.files.get(index) else {
            bail!(
                "Index {} out of range for '{}' ({} files)",
                index, self.dir.display(), self.files.len()
            );
        };
        read_embeddings(path)
    }

    pub fn dir(&self) -> &Path { &self.dir }

    /// Length of one example's CLIP matrix flattened to a row.
    pub fn clip_width(&self) -> usize { self.clip_width }

    /// Length of one example's CLAP matrix flattened to a row.
    pub fn clap_width(&self) -> usize { self.clap_width }
}

impl Dataset<EmbeddingPair> for EmbeddingDataset {
    fn get(&self, index: usize) -> Option<EmbeddingPair> {
        if index >= self.files.len() {
            return None;
        }
        match self.read_pair(index) {
            Ok(pair) => Some(pair),
            // The trainer counts rows per epoch and aborts on a short one.
            Err(e) => {
                tracing::error!("Failed to re-read example {}: {:#}", index, e);
                None
            }
        }
    }

    fn len(&self) -> usize {
        self.files.len()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn test_len_matches_file_count() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..3 {
            write(dir.path(), &format!("{i}.txt"), "CLIP Embedding:\n1 2\nCLAP Embedding:\n3 4 5\n");
        }
        fs::create_dir(dir.path().join("nested")).unwrap();

        let ds = EmbeddingDataset::open(dir.path()).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.clip_width(), 2);
        assert_eq!(ds.clap_width(), 3);
    }

    #[test]
    fn test_get_is_idempotent_and_ordered() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.txt", "CLIP Embedding:\n2 2\nCLAP Embedding:\n2 2\n");
        write(dir.path(), "a.txt", "CLIP Embedding:\n1 1\nCLAP Embedding:\n1 1\n");

        let ds    = EmbeddingDataset::open(dir.path()).unwrap();
        let first = ds.get(0).unwrap();
        assert_eq!(first.source, "a.txt");
        assert_eq!(ds.get(0).unwrap(), first);
        assert_eq!(ds.get(1).unwrap().clip.flattened(), &[2.0, 2.0]);
    }

    #[test]
    fn test_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.txt", "CLIP Embedding:\n1\nCLAP Embedding:\n1\n");
        let ds = EmbeddingDataset::open(dir.path()).unwrap();
        assert!(ds.get(1).is_none());
        assert!(ds.read_pair(5).is_err());
    }

    #[test]
    fn test_width_mismatch_across_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.txt", "CLIP Embedding:\n1 2\nCLAP Embedding:\n1 2\n");
        write(dir.path(), "b.txt", "CLIP Embedding:\n1 2 3\nCLAP Embedding:\n1 2\n");
        assert!(EmbeddingDataset::open(dir.path()).is_err());
    }

    #[test]
    fn test_bad_file_fails_open() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.txt", "CLIP Embedding:\n1 two\n");
        assert!(EmbeddingDataset::open(dir.path()).is_err());
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(EmbeddingDataset::open(dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_get_returns_none_when_file_breaks_after_open() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.txt", "CLIP Embedding:\n1 2\nCLAP Embedding:\n1 2\n");
        let ds = EmbeddingDataset::open(dir.path()).unwrap();
        write(dir.path(), "a.txt", "CLIP Embedding:\n1 x\n");
        assert!(ds.get(0).is_none());
    }
}
