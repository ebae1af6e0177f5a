//! Subcommand definitions and implementations.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use image::imageops::FilterType;
use tracing::{error, info, warn};

use ml_dataset::{DatasetSplits, DatasetSummary, SplitFractions, scan_image_folder};
use ml_models::{
    CatDogCnnConfig, CheckpointFormat, DefaultBackend, checkpoint_path, default_device,
    save_checkpoint,
};
use ml_preprocess::{Augmentation, TransformConfig, load_image};
use ml_training::{RunTracker, Trainer, TrainingConfig};
use ml_types::ClassList;
use serve_api::AppContext;

const EXPERIMENT_NAME: &str = "cats-dogs-classification";

/// Cats-vs-dogs classifier pipeline.
#[derive(Debug, Parser)]
#[command(name = "catdog", version, about)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Train the classifier on a directory of class-named image folders.
    Train {
        /// Directory of class-named subfolders with processed images.
        #[arg(long)]
        data_dir: PathBuf,

        /// Number of training epochs.
        #[arg(long, default_value_t = 10)]
        epochs: usize,

        /// Batch size.
        #[arg(long, default_value_t = 32)]
        batch_size: usize,

        /// Adam learning rate.
        #[arg(long, default_value_t = 1e-3)]
        learning_rate: f64,

        /// Seed for the split, shuffles, and augmentation.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Where the checkpoint and class list are written.
        #[arg(long, default_value = "models")]
        model_dir: PathBuf,

        /// Root of the experiment tracking store.
        #[arg(long, default_value = "runs")]
        runs_dir: PathBuf,
    },

    /// Serve the trained model over HTTP.
    Serve {
        /// Listen address.
        #[arg(long, default_value = "0.0.0.0:8000")]
        addr: SocketAddr,

        /// Directory holding `model.bin` and `classes.txt`.
        #[arg(long, default_value = "models")]
        model_dir: PathBuf,
    },

    /// Resize raw class folders into the processed 224x224 JPEG layout.
    Prepare {
        /// Directory of raw class-named subfolders.
        #[arg(long)]
        raw_dir: PathBuf,

        /// Target directory for processed images.
        #[arg(long)]
        out_dir: PathBuf,
    },

    /// Write an untrained checkpoint and default class list.
    InitModel {
        /// Target directory.
        #[arg(long, default_value = "models")]
        model_dir: PathBuf,
    },
}

/// Dispatches the parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Train {
            data_dir,
            epochs,
            batch_size,
            learning_rate,
            seed,
            model_dir,
            runs_dir,
        } => train(
            &data_dir,
            epochs,
            batch_size,
            learning_rate,
            seed,
            &model_dir,
            &runs_dir,
        ),
        Commands::Serve { addr, model_dir } => serve(addr, &model_dir),
        Commands::Prepare { raw_dir, out_dir } => {
            let report = prepare(&raw_dir, &out_dir)?;
            println!(
                "Prepared {} images in {} ({} already present, {} failed)",
                report.processed,
                out_dir.display(),
                report.skipped,
                report.failed
            );
            Ok(())
        }
        Commands::InitModel { model_dir } => init_model(&model_dir),
    }
}

#[allow(clippy::too_many_arguments)]
fn train(
    data_dir: &Path,
    epochs: usize,
    batch_size: usize,
    learning_rate: f64,
    seed: u64,
    model_dir: &Path,
    runs_dir: &Path,
) -> Result<()> {
    let (records, classes) = scan_image_folder(data_dir)
        .with_context(|| format!("scanning dataset at {}", data_dir.display()))?;
    let summary = DatasetSummary::from_records(&records, &classes);
    info!(%summary, "dataset scanned");

    let config = TrainingConfig {
        epochs,
        batch_size,
        learning_rate,
        seed,
        fractions: SplitFractions::default(),
        patience: 0,
        model: CatDogCnnConfig::new(classes.len()),
    };
    let transform = TransformConfig::default().with_augmentation(Augmentation::default());
    let splits = DatasetSplits::new(&records, config.fractions, seed, transform);

    let mut tracker =
        RunTracker::create(runs_dir, EXPERIMENT_NAME).context("creating experiment run")?;
    let outcome = Trainer::new(config)
        .fit(&splits, &classes, model_dir, &mut tracker)
        .context("training run failed")?;

    println!(
        "Best validation accuracy: {:.2}%",
        outcome.metrics.best_val_accuracy.unwrap_or(0.0) * 100.0
    );
    println!("Test accuracy: {:.2}%", outcome.test.accuracy * 100.0);
    println!("Model saved to {}", outcome.final_checkpoint.display());
    println!("Run artifacts in {}", tracker.dir().display());
    Ok(())
}

fn serve(addr: SocketAddr, model_dir: &Path) -> Result<()> {
    let ctx = AppContext::initialize(model_dir, CatDogCnnConfig::default())
        .context("initializing inference context")?;

    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    runtime.block_on(serve_api::serve(Arc::new(ctx), addr));
    Ok(())
}

/// Outcome of a `prepare` pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PrepareReport {
    /// Images resized and written.
    pub processed: usize,

    /// Images skipped because the target already existed.
    pub skipped: usize,

    /// Images that failed to decode or write.
    pub failed: usize,
}

/// Resizes every image of every class folder to 224x224 JPEG.
///
/// Idempotent: files whose target already exists are skipped, so the
/// command can be re-run after a partial pass. Per-file failures are
/// logged and counted, never fatal.
pub fn prepare(raw_dir: &Path, out_dir: &Path) -> Result<PrepareReport> {
    if !raw_dir.is_dir() {
        bail!("raw directory not found: {}", raw_dir.display());
    }

    let mut report = PrepareReport::default();
    for entry in std::fs::read_dir(raw_dir)? {
        let class_dir = entry?.path();
        if !class_dir.is_dir() {
            continue;
        }
        let Some(class_name) = class_dir.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        let target_dir = out_dir.join(class_name.to_lowercase());
        std::fs::create_dir_all(&target_dir)
            .with_context(|| format!("creating {}", target_dir.display()))?;

        for file in std::fs::read_dir(&class_dir)? {
            let path = file?.path();
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if !is_image_path(&path) {
                continue;
            }

            let target = target_dir.join(format!("{stem}.jpg"));
            if target.exists() {
                report.skipped += 1;
                continue;
            }

            match load_image(&path) {
                Ok(img) => {
                    let resized = img.resize_exact(224, 224, FilterType::Triangle);
                    if let Err(e) = resized.to_rgb8().save(&target) {
                        error!(path = %path.display(), error = %e, "failed to write image");
                        report.failed += 1;
                    } else {
                        report.processed += 1;
                    }
                }
                Err(e) => {
                    error!(path = %path.display(), error = %e, "failed to read image");
                    report.failed += 1;
                }
            }
        }
        info!(class = class_name, "prepared class directory");
    }

    if report.processed == 0 && report.skipped == 0 {
        warn!(raw = %raw_dir.display(), "no images found to prepare");
    }
    Ok(report)
}

fn is_image_path(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                matches!(ext.to_lowercase().as_str(), "jpg" | "jpeg" | "png")
            })
}

/// Writes an untrained checkpoint plus the default class list, the
/// fixture used by deployment smoke tests.
fn init_model(model_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(model_dir)?;

    let classes = ClassList::cats_dogs();
    let device = default_device();
    let model = CatDogCnnConfig::new(classes.len()).init::<DefaultBackend>(&device);

    let weights_path = checkpoint_path(model_dir, "model", CheckpointFormat::Binary);
    save_checkpoint(&model, &weights_path).context("writing untrained checkpoint")?;
    classes
        .save(&model_dir.join("classes.txt"))
        .context("writing class list")?;

    println!("Saved model to {}", weights_path.display());
    println!("Saved classes to {}", model_dir.join("classes.txt").display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use image::{Rgb, RgbImage};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_parses_train_arguments() {
        let cli = Cli::try_parse_from([
            "catdog",
            "train",
            "--data-dir",
            "data/processed",
            "--epochs",
            "3",
            "--learning-rate",
            "0.0001",
        ])
        .unwrap();

        match cli.command {
            Commands::Train {
                data_dir,
                epochs,
                batch_size,
                learning_rate,
                ..
            } => {
                assert_eq!(data_dir, PathBuf::from("data/processed"));
                assert_eq!(epochs, 3);
                assert_eq!(batch_size, 32);
                assert!((learning_rate - 1e-4).abs() < 1e-12);
            }
            other => panic!("expected train, got {other:?}"),
        }
    }

    fn write_image(path: &Path, side: u32) {
        let mut img = RgbImage::new(side, side);
        for pixel in img.pixels_mut() {
            *pixel = Rgb([10, 150, 40]);
        }
        img.save(path).unwrap();
    }

    #[test]
    fn prepare_resizes_and_is_idempotent() {
        let raw = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();

        let cat_dir = raw.path().join("Cat");
        std::fs::create_dir(&cat_dir).unwrap();
        write_image(&cat_dir.join("a.png"), 100);
        write_image(&cat_dir.join("b.jpg"), 300);
        std::fs::write(cat_dir.join("notes.txt"), "skip me").unwrap();

        let first = prepare(raw.path(), out.path()).unwrap();
        assert_eq!(first.processed, 2);
        assert_eq!(first.skipped, 0);
        assert_eq!(first.failed, 0);

        // Class folder names are lowercased; outputs are 224x224 JPEGs.
        let a = out.path().join("cat").join("a.jpg");
        let img = image::open(&a).unwrap();
        assert_eq!((img.width(), img.height()), (224, 224));

        let second = prepare(raw.path(), out.path()).unwrap();
        assert_eq!(second.processed, 0);
        assert_eq!(second.skipped, 2);
    }

    #[test]
    fn prepare_skips_corrupt_files() {
        let raw = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();

        let dog_dir = raw.path().join("dog");
        std::fs::create_dir(&dog_dir).unwrap();
        write_image(&dog_dir.join("ok.png"), 64);
        std::fs::write(dog_dir.join("broken.jpg"), b"not a real jpeg").unwrap();

        let report = prepare(raw.path(), out.path()).unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.failed, 1);
    }

    #[test]
    fn prepare_missing_raw_dir_fails() {
        let out = tempfile::tempdir().unwrap();
        assert!(prepare(Path::new("/nonexistent"), out.path()).is_err());
    }
}
