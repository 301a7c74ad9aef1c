// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Train + test loop using Burn's DataLoader and Adam.
//
//   - Training runs on an Autodiff backend so loss.backward()
//     produces gradients
//   - model.valid() returns the same weights on the inner
//     backend; the test loader must batch onto that backend too
//   - Every pair is scored as a positive pair (label +1)
//
// After the last epoch the loss curves are plotted and the
// final weights written to the checkpoint directory.

use anyhow::{bail, Result};
use burn::{
    data::{
        dataloader::{DataLoader, DataLoaderBuilder},
        dataset::Dataset,
    },
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use std::sync::Arc;

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{EmbeddingBatch, EmbeddingBatcher},
    dataset::EmbeddingDataset,
};
use crate::domain::embedding::EmbeddingPair;
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
    plot::save_loss_plot,
};
use crate::ml::backend::BackendKind;
use crate::ml::loss::{CosineEmbeddingLoss, CosineEmbeddingLossConfig};
use crate::ml::model::ClipToClapModel;

type WgpuBackend    = burn::backend::Autodiff<burn::backend::Wgpu>;
type NdArrayBackend = burn::backend::Autodiff<burn::backend::NdArray>;

/// Train on the chosen backend, then write plot and checkpoint.
pub fn run_training(
    cfg:           &TrainConfig,
    train_dataset: EmbeddingDataset,
    test_dataset:  EmbeddingDataset,
    ckpt_manager:  &CheckpointManager,
) -> Result<Vec<EpochMetrics>> {
    match cfg.backend {
        BackendKind::Wgpu => {
            let device = burn::backend::wgpu::WgpuDevice::default();
            tracing::info!("Using WGPU device: {:?}", device);
            train_and_save::<WgpuBackend>(cfg, train_dataset, test_dataset, ckpt_manager, device)
        }
        BackendKind::NdArray => {
            let device = burn::backend::ndarray::NdArrayDevice::default();
            tracing::info!("Using NdArray device: {:?}", device);
            train_and_save::<NdArrayBackend>(cfg, train_dataset, test_dataset, ckpt_manager, device)
        }
    }
}

fn train_and_save<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    train_dataset: EmbeddingDataset,
    test_dataset:  EmbeddingDataset,
    ckpt_manager:  &CheckpointManager,
    device:        B::Device,
) -> Result<Vec<EpochMetrics>> {
    let metrics = MetricsLogger::new(ckpt_manager.dir())?;
    let (model, history) = train_loop::<B>(cfg, train_dataset, test_dataset, &metrics, device)?;

    let train: Vec<f64> = history.iter().map(|m| m.train_loss).collect();
    let test:  Vec<f64> = history.iter().map(|m| m.test_loss).collect();
    save_loss_plot(&train, &test, &ckpt_manager.dir().join("loss_curves.svg"))?;

    ckpt_manager.save_model(&model)?;
    Ok(history)
}

/// Run every epoch and return the final model with its loss history.
pub fn train_loop<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    train_dataset: EmbeddingDataset,
    test_dataset:  EmbeddingDataset,
    metrics:       &MetricsLogger,
    device:        B::Device,
) -> Result<(ClipToClapModel<B>, Vec<EpochMetrics>)> {
    let model_cfg = cfg.model_config();

    // ── Shape checks before any tensor is built ───────────────────────────────
    for ds in [&train_dataset, &test_dataset] {
        if ds.is_empty() {
            bail!("No embedding files in '{}'", ds.dir().display());
        }
        if ds.clip_width() != model_cfg.input_dim {
            bail!(
                "'{}': flattened CLIP width {} does not match model input_dim {}",
                ds.dir().display(), ds.clip_width(), model_cfg.input_dim
            );
        }
        if ds.clap_width() != model_cfg.output_dim {
            bail!(
                "'{}': flattened CLAP width {} does not match model output_dim {}",
                ds.dir().display(), ds.clap_width(), model_cfg.output_dim
            );
        }
    }
    let n_train = train_dataset.len();
    let n_test  = test_dataset.len();

    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: ClipToClapModel<B> = model_cfg.init(&device);
    tracing::info!(
        "Model ready: {} → {} → {} → {}",
        model_cfg.input_dim, model_cfg.hidden_dim, model_cfg.hidden_dim, model_cfg.output_dim
    );

    // ── Adam optimiser ────────────────────────────────────────────────────────
    // m = β1*m + (1-β1)*g        (mean)
    // v = β2*v + (1-β2)*g²       (variance)
    // θ = θ - lr * m / (√v + ε)  (update)
    let mut optim = AdamConfig::new().with_epsilon(1e-8).init();

    let criterion: CosineEmbeddingLoss = CosineEmbeddingLossConfig::new()
        .with_margin(cfg.margin)
        .init();

    let train_loader = build_train_loader::<B>(cfg, train_dataset, &device);
    let test_loader  = build_test_loader::<B::InnerBackend>(cfg, test_dataset, &device);

    let mut history = Vec::with_capacity(cfg.epochs);

    for epoch in 1..=cfg.epochs {

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;
        let mut train_rows     = 0usize;

        for batch in train_loader.iter() {
            train_rows += batch.len();

            let predicted = model.forward(batch.clip, Some(batch.clap.clone()));
            let loss      = criterion.forward_positive(predicted, batch.clap);

            train_loss_sum += loss.clone().into_scalar().elem::<f64>();
            train_batches  += 1;

            // Gradients are fresh per backward(), nothing to zero
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
        }
        check_epoch_rows("training", epoch, train_rows, n_train)?;
        let avg_train_loss = train_loss_sum / train_batches as f64;

        // ── Test phase ────────────────────────────────────────────────────────
        let model_valid = model.valid();

        let mut test_loss_sum = 0.0f64;
        let mut test_batches  = 0usize;
        let mut test_rows     = 0usize;

        for batch in test_loader.iter() {
            test_rows += batch.len();

            let predicted = model_valid.forward(batch.clip, Some(batch.clap.clone()));
            let loss      = criterion.forward_positive(predicted, batch.clap);

            test_loss_sum += loss.into_scalar().elem::<f64>();
            test_batches  += 1;
        }
        check_epoch_rows("test", epoch, test_rows, n_test)?;
        let avg_test_loss = test_loss_sum / test_batches as f64;

        let m = EpochMetrics::new(epoch, avg_train_loss, avg_test_loss);
        println!("{}", m.report_line(cfg.epochs));
        metrics.log(&m)?;
        history.push(m);
    }

    tracing::info!("Training complete! Metrics in '{}'", metrics.csv_path().display());
    Ok((model, history))
}

/// Training batches: a new permutation every `iter()`, seeded once.
fn build_train_loader<B: Backend>(
    cfg:     &TrainConfig,
    dataset: EmbeddingDataset,
    device:  &B::Device,
) -> Arc<dyn DataLoader<B, EmbeddingBatch<B>>> {
    DataLoaderBuilder::<B, EmbeddingPair, EmbeddingBatch<B>>::new(EmbeddingBatcher::new())
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .set_device(device.clone())
        .build(dataset)
}

/// Test batches: dataset order, no shuffle.
fn build_test_loader<B: Backend>(
    cfg:     &TrainConfig,
    dataset: EmbeddingDataset,
    device:  &B::Device,
) -> Arc<dyn DataLoader<B, EmbeddingBatch<B>>> {
    DataLoaderBuilder::<B, EmbeddingPair, EmbeddingBatch<B>>::new(EmbeddingBatcher::new())
        .batch_size(cfg.batch_size)
        .set_device(device.clone())
        .build(dataset)
}

/// A file that fails to re-read is dropped by the loader; catch it here.
fn check_epoch_rows(phase: &str, epoch: usize, seen: usize, expected: usize) -> Result<()> {
    if seen != expected {
        bail!(
            "Epoch {}: {} phase saw {} of {} examples; an embedding file could not be re-read",
            epoch, phase, seen, expected
        );
    }
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, path::Path};

    type TestBackend = burn::backend::Autodiff<burn::backend::NdArray<f32>>;

    fn write_pairs(dir: &Path, n: usize, clip: &str, clap: &str) {
        for i in 0..n {
            fs::write(
                dir.join(format!("pair_{i}.txt")),
                format!("CLIP Embedding:\n{clip}\n\nCLAP Embedding:\n{clap}\n"),
            )
            .unwrap();
        }
    }

    fn tiny_config(epochs: usize) -> TrainConfig {
        TrainConfig {
            epochs,
            batch_size: 2,
            input_dim:  2,
            hidden_dim: 4,
            output_dim: 2,
            seed:       7,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_one_epoch_two_files() {
        let root = tempfile::tempdir().unwrap();
        let data = root.path().join("train");
        fs::create_dir(&data).unwrap();
        write_pairs(&data, 2, "1.0 0.0", "0.0 1.0");

        let cfg     = tiny_config(1);
        let train   = EmbeddingDataset::open(&data).unwrap();
        let test    = EmbeddingDataset::open(&data).unwrap();
        let metrics = MetricsLogger::new(root.path().join("ckpt")).unwrap();

        let (model, history) =
            train_loop::<TestBackend>(&cfg, train, test, &metrics, Default::default()).unwrap();

        assert_eq!(history.len(), 1);
        let m = history[0];
        assert_eq!(m.epoch, 1);
        // 1 - cos is bounded to [0, 2]
        assert!((0.0..=2.0 + 1e-6).contains(&m.train_loss));
        assert!((0.0..=2.0 + 1e-6).contains(&m.test_loss));

        let line = m.report_line(cfg.epochs);
        assert!(line.starts_with("Epoch [1/1], Train Loss: "));
        assert!(line.contains(", Test Loss: "));
        let test_part = line.rsplit(": ").next().unwrap();
        assert_eq!(test_part.split('.').nth(1).unwrap().len(), 4);

        assert_eq!(model.fc1.weight.dims(), [2, 4]);
    }

    #[test]
    fn test_training_reduces_loss_on_constant_mapping() {
        let root = tempfile::tempdir().unwrap();
        write_pairs(root.path(), 4, "1.0 0.0", "0.0 1.0");

        let mut cfg = tiny_config(30);
        cfg.hidden_dim = 8;
        cfg.lr         = 0.01;

        let train   = EmbeddingDataset::open(root.path()).unwrap();
        let test    = EmbeddingDataset::open(root.path()).unwrap();
        let metrics = MetricsLogger::new(root.path().join("out")).unwrap();

        let (_, history) =
            train_loop::<TestBackend>(&cfg, train, test, &metrics, Default::default()).unwrap();

        assert_eq!(history.len(), 30);
        let first = history.first().unwrap().train_loss;
        let last  = history.last().unwrap().train_loss;
        assert!(last < first, "loss did not decrease: {first} -> {last}");
    }

    #[test]
    fn test_partial_final_batch_is_used() {
        let root = tempfile::tempdir().unwrap();
        write_pairs(root.path(), 3, "0.5 0.5", "1.0 0.0");

        let cfg     = tiny_config(1);
        let train   = EmbeddingDataset::open(root.path()).unwrap();
        let test    = EmbeddingDataset::open(root.path()).unwrap();
        let metrics = MetricsLogger::new(root.path().join("out")).unwrap();

        // 3 examples in batches of 2 → rows counted must still be 3
        let result = train_loop::<TestBackend>(&cfg, train, test, &metrics, Default::default());
        assert!(result.is_ok());
    }

    #[test]
    fn test_width_mismatch_with_model_aborts() {
        let root = tempfile::tempdir().unwrap();
        write_pairs(root.path(), 2, "1.0 0.0 0.0", "0.0 1.0");

        let cfg     = tiny_config(1);
        let train   = EmbeddingDataset::open(root.path()).unwrap();
        let test    = EmbeddingDataset::open(root.path()).unwrap();
        let metrics = MetricsLogger::new(root.path().join("out")).unwrap();

        let result = train_loop::<TestBackend>(&cfg, train, test, &metrics, Default::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_split_aborts() {
        let root  = tempfile::tempdir().unwrap();
        let train = root.path().join("train");
        let test  = root.path().join("test");
        fs::create_dir(&train).unwrap();
        fs::create_dir(&test).unwrap();
        write_pairs(&train, 2, "1.0 0.0", "0.0 1.0");

        let cfg     = tiny_config(1);
        let metrics = MetricsLogger::new(root.path().join("out")).unwrap();
        let result  = train_loop::<TestBackend>(
            &cfg,
            EmbeddingDataset::open(&train).unwrap(),
            EmbeddingDataset::open(&test).unwrap(),
            &metrics,
            Default::default(),
        );
        assert!(result.is_err());
    }

    /// Files whose CLIP row is `[i, 0]`, so a batch row identifies its file.
    fn write_indexed(dir: &Path, n: usize) {
        for i in 0..n {
            fs::write(
                dir.join(format!("pair_{i:02}.txt")),
                format!("CLIP Embedding:\n{i} 0\nCLAP Embedding:\n0 1\n"),
            )
            .unwrap();
        }
    }

    /// One pass over a loader, as file indices in batch order.
    fn epoch_order<B: Backend>(loader: &Arc<dyn DataLoader<B, EmbeddingBatch<B>>>) -> Vec<usize> {
        loader
            .iter()
            .flat_map(|batch| {
                let values = batch.clip.into_data().to_vec::<f32>().unwrap();
                values.into_iter().step_by(2).map(|v| v as usize).collect::<Vec<_>>()
            })
            .collect()
    }

    #[test]
    fn test_train_loader_reshuffles_every_epoch() {
        type Cpu = burn::backend::NdArray<f32>;

        let root = tempfile::tempdir().unwrap();
        write_indexed(root.path(), 10);

        let cfg    = TrainConfig { batch_size: 3, ..tiny_config(1) };
        let loader = build_train_loader::<Cpu>(
            &cfg,
            EmbeddingDataset::open(root.path()).unwrap(),
            &Default::default(),
        );

        let orders: Vec<Vec<usize>> = (0..3).map(|_| epoch_order(&loader)).collect();
        for order in &orders {
            let mut sorted = order.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, (0..10).collect::<Vec<_>>());
        }
        assert!(
            orders[0] != orders[1] || orders[1] != orders[2],
            "same order on every epoch: {:?}", orders[0]
        );
    }

    #[test]
    fn test_test_loader_keeps_file_order() {
        type Cpu = burn::backend::NdArray<f32>;

        let root = tempfile::tempdir().unwrap();
        write_indexed(root.path(), 10);

        let cfg    = TrainConfig { batch_size: 3, ..tiny_config(1) };
        let loader = build_test_loader::<Cpu>(
            &cfg,
            EmbeddingDataset::open(root.path()).unwrap(),
            &Default::default(),
        );

        let expected: Vec<usize> = (0..10).collect();
        assert_eq!(epoch_order(&loader), expected);
        assert_eq!(epoch_order(&loader), expected);
    }

    #[test]
    fn test_check_epoch_rows() {
        assert!(check_epoch_rows("training", 1, 4, 4).is_ok());
        assert!(check_epoch_rows("training", 1, 3, 4).is_err());
    }

    #[test]
    fn test_run_training_writes_artifacts() {
        let root = tempfile::tempdir().unwrap();
        let data = root.path().join("data");
        fs::create_dir(&data).unwrap();
        write_pairs(&data, 2, "1.0 0.0", "0.0 1.0");

        let mut cfg = tiny_config(2);
        cfg.backend = BackendKind::NdArray;
        let ckpt    = CheckpointManager::new(root.path().join("ckpt"));

        let history = run_training(
            &cfg,
            EmbeddingDataset::open(&data).unwrap(),
            EmbeddingDataset::open(&data).unwrap(),
            &ckpt,
        )
        .unwrap();

        assert_eq!(history.len(), 2);
        assert!(ckpt.checkpoint_path().exists());
        assert!(ckpt.dir().join("loss_curves.svg").exists());
        let csv = fs::read_to_string(ckpt.dir().join("metrics.csv")).unwrap();
        assert_eq!(csv.lines().count(), 3);
    }
}
