// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores the model weights with Burn's
// NamedMpkGzFileRecorder at full precision, so a reloaded model
// reproduces the trained model's outputs exactly.
//
// One file, no metadata:
//   checkpoints/
//     clip_to_clap.mpk.gz   ← weights + biases of fc1, fc2, fc3
//
// Loading needs a model built from the same ClipToClapConfig;
// load_model rejects a checkpoint whose layer shapes differ.

use anyhow::{bail, Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
};

use crate::ml::model::ClipToClapModel;

/// File stem of the checkpoint; the recorder appends `.mpk.gz`.
const CHECKPOINT_STEM: &str = "clip_to_clap";

type CheckpointRecorder = NamedMpkGzFileRecorder<FullPrecisionSettings>;

/// Saves and loads the model checkpoint in one directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of the checkpoint file, extension included.
    pub fn checkpoint_path(&self) -> PathBuf {
        self.dir.join(format!("{CHECKPOINT_STEM}.mpk.gz"))
    }

    /// Write the model's parameters, creating the directory if needed.
    pub fn save_model<B: Backend>(&self, model: &ClipToClapModel<B>) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create directory '{}'", self.dir.display()))?;

        // Without extension — the recorder adds it
        let stem = self.dir.join(CHECKPOINT_STEM);
        CheckpointRecorder::new()
            .record(model.clone().into_record(), stem)
            .with_context(|| {
                format!("Failed to save checkpoint to '{}'", self.checkpoint_path().display())
            })?;

        let path = self.checkpoint_path();
        tracing::info!("Saved checkpoint: '{}'", path.display());
        Ok(path)
    }

    /// Restore saved parameters into `model`, which must have been
    /// initialised with the same dimensions.
    pub fn load_model<B: Backend>(
        &self,
        model:  ClipToClapModel<B>,
        device: &B::Device,
    ) -> Result<ClipToClapModel<B>> {
        let stem = self.dir.join(CHECKPOINT_STEM);

        let record = CheckpointRecorder::new()
            .load(stem, device)
            .with_context(|| {
                format!(
                    "Cannot load checkpoint '{}'. Have you trained the model first?",
                    self.checkpoint_path().display()
                )
            })?;

        // load_record swaps tensors in without comparing shapes
        let expected = weight_shapes(&model);
        let model    = model.load_record(record);
        let found    = weight_shapes(&model);
        if found != expected {
            bail!(
                "Checkpoint '{}' has layer shapes {:?}, model expects {:?}",
                self.checkpoint_path().display(), found, expected
            );
        }

        tracing::info!("Loaded checkpoint '{}'", self.checkpoint_path().display());
        Ok(model)
    }
}

fn weight_shapes<B: Backend>(model: &ClipToClapModel<B>) -> [[usize; 2]; 3] {
    [
        model.fc1.weight.dims(),
        model.fc2.weight.dims(),
        model.fc3.weight.dims(),
    ]
}
