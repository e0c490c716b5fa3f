use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use fidelity_vision::core_modules::image_profile::ImageProfile;
use fidelity_vision::parallel_pipeline::{BatchOutcome, BatchPair, BatchRunner};
use fidelity_vision::pipeline::{ComparisonSession, PipelineConfig, QualityPipeline, Slot};
use fidelity_vision::source::{SUPPORTED_MEDIA_TYPES, load_image};
use fidelity_vision::store::{DEFAULT_STORE_FILE, JsonFileStore, MemoryStore, MetricsStore};
use fidelity_vision::ComparisonResult;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Compare images with MSE, PSNR, SSIM, FSSIM and AEMC.
#[derive(Debug, Parser)]
#[command(name = "fidelity_tester", version)]
struct Cli {
    /// JSON file holding the comparison history.
    #[arg(long, global = true, env = "FIDELITY_STORE", default_value = DEFAULT_STORE_FILE)]
    store: PathBuf,

    /// Weight of SSIM inside FSSIM.
    #[arg(long, global = true, default_value_t = 0.5)]
    alpha: f64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compare two images and record the result.
    Compare {
        image1: PathBuf,
        image2: PathBuf,
        /// Print the metrics without appending them to the history.
        #[arg(long)]
        no_store: bool,
    },
    /// Compare every pair listed in a JSON manifest of {"image1", "image2"} entries.
    Batch {
        manifest: PathBuf,
        /// Worker count; defaults to the number of CPUs.
        #[arg(long)]
        workers: Option<usize>,
    },
    /// List the recorded comparisons.
    History,
    /// Delete one recorded comparison by its position in the history.
    Remove { index: usize },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let pipeline = QualityPipeline::new(PipelineConfig {
        fssim_alpha: cli.alpha,
        ..PipelineConfig::default()
    });

    match cli.command {
        Commands::Compare {
            image1,
            image2,
            no_store,
        } => {
            if no_store {
                compare(pipeline, MemoryStore::new(), image1, image2)
            } else {
                compare(pipeline, JsonFileStore::new(&cli.store), image1, image2)
            }
        }
        Commands::Batch { manifest, workers } => {
            let json = std::fs::read_to_string(&manifest)
                .with_context(|| format!("failed to read manifest {}", manifest.display()))?;
            let pairs: Vec<BatchPair> = serde_json::from_str(&json)
                .with_context(|| format!("invalid manifest {}", manifest.display()))?;
            let runner = match workers {
                Some(count) => BatchRunner::with_workers(pipeline, count),
                None => BatchRunner::new(pipeline),
            };
            let mut store = JsonFileStore::new(&cli.store);
            let outcomes = runner.run(pairs, &mut store).await?;
            print_batch(&outcomes);
            Ok(())
        }
        Commands::History => {
            let records = JsonFileStore::new(&cli.store).load_all()?;
            if records.is_empty() {
                println!("No metrics recorded in {}", cli.store.display());
            }
            for (index, record) in records.iter().enumerate() {
                println!(
                    "[{index}] {} vs {}: MSE {:.2}, PSNR {:.2}, SSIM {:.4}, FSSIM {:.3}, AEMC {:.3}",
                    record.image1, record.image2, record.mse, record.psnr, record.ssim, record.fsim,
                    record.adaptive_metric
                );
            }
            Ok(())
        }
        Commands::Remove { index } => {
            let mut store = JsonFileStore::new(&cli.store);
            let removed = store.remove(index)?;
            println!("Removed [{index}] {} vs {}", removed.image1, removed.image2);
            Ok(())
        }
    }
}

fn compare<S: MetricsStore>(
    pipeline: QualityPipeline,
    store: S,
    image1: PathBuf,
    image2: PathBuf,
) -> Result<()> {
    let first = load_image(&image1).with_context(|| {
        format!("cannot use {} (supported: {})", image1.display(), SUPPORTED_MEDIA_TYPES.join(", "))
    })?;
    let second = load_image(&image2).with_context(|| {
        format!("cannot use {} (supported: {})", image2.display(), SUPPORTED_MEDIA_TYPES.join(", "))
    })?;
    print_profile(&first.profile);
    print_profile(&second.profile);

    let mut session = ComparisonSession::new(pipeline, store);
    session.set_image(Slot::First, first)?;
    match session.set_image(Slot::Second, second)? {
        Some(result) => print_result(&result),
        None => bail!("images must have the same dimensions to be compared"),
    }
    Ok(())
}

fn print_profile(profile: &ImageProfile) {
    println!("\n{} ({}, {} KB)", profile.name, profile.media_type, profile.size_kb);
    println!("  Resolution: {}x{} ({} MP)", profile.width, profile.height, profile.megapixels);
    println!("  Brightness: {}  Contrast: {}", profile.brightness, profile.contrast);
    println!(
        "  Quality: {:?}  Noise: {:?}  Clarity: {:?}",
        profile.quality, profile.noise, profile.clarity
    );
}

fn print_result(result: &ComparisonResult) {
    let show = |value: Option<f64>, precision: usize| {
        value.map_or_else(|| "undefined".to_string(), |v| format!("{v:.precision$}"))
    };
    println!("\nQuality Metrics:");
    println!("  MSE:   {}", show(result.mse, 2));
    println!("  PSNR:  {} dB", show(result.psnr, 2));
    println!("  SSIM:  {}", show(result.ssim, 4));
    println!("  FSSIM: {}", show(result.fssim, 3));
    println!("  AEMC:  {}", show(result.aemc, 3));
    if result.aemc.is_some() {
        println!(
            "  Weights: PSNR {:.3}, SSIM {:.3}, FSSIM {:.3}",
            result.weights.w_psnr, result.weights.w_ssim, result.weights.w_fssim
        );
    }
}

fn print_batch(outcomes: &[BatchOutcome]) {
    for outcome in outcomes {
        match outcome {
            BatchOutcome::Compared(comparison) => {
                println!("\n{} vs {}", comparison.image1, comparison.image2);
                print_result(&comparison.result);
            }
            BatchOutcome::Incomparable(comparison) => {
                println!("\n{} vs {}: different dimensions, skipped", comparison.image1, comparison.image2);
            }
            BatchOutcome::Duplicate(pair) => {
                println!("\n{} vs {}: duplicate, skipped", pair.image1.display(), pair.image2.display());
            }
            BatchOutcome::Failed { pair, error } => {
                println!("\n{} vs {}: {error}", pair.image1.display(), pair.image2.display());
            }
        }
    }
}
