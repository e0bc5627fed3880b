use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rand::seq::SliceRandom;

use qr_healer::codec::{DecodeAdapter, QrEncoder};
use qr_healer::data::{SampleGenerator, SampleStore};
use qr_healer::eval::{comparison_strip, evaluate_pair, evaluate_pairs};
use qr_healer::heal::{HealingService, Scanner};
use qr_healer::train::train_from_store;
use qr_healer::{HealError, HealerConfig, Result};

#[derive(Parser)]
#[command(name = "qr-healer", version, about = "Heal damaged QR codes with a convolutional autoencoder")]
struct Cli {
    /// JSON config file; unset keys keep their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write clean/damaged training pairs
    Generate {
        #[arg(long)]
        count: Option<usize>,
        #[arg(long)]
        damage: Option<f64>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Fit the model on stored pairs and save the weights
    Train {
        #[arg(long)]
        epochs: Option<usize>,
        #[arg(long)]
        batch_size: Option<usize>,
        #[arg(long)]
        data: Option<PathBuf>,
        #[arg(long)]
        model: Option<PathBuf>,
    },
    /// Heal one image and write the result
    Heal {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        #[arg(long)]
        model: Option<PathBuf>,
    },
    /// Decode an image, healing it first if needed; prints JSON
    Scan {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        model: Option<PathBuf>,
    },
    /// Compare decode success on clean, damaged and healed pairs
    Evaluate {
        #[arg(long)]
        data: Option<PathBuf>,
        #[arg(long)]
        model: Option<PathBuf>,
        #[arg(long)]
        samples: Option<usize>,
        /// Write a clean | damaged | healed strip of one sample here
        #[arg(long)]
        comparison: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let cli = Cli::parse();

    let result = HealerConfig::load(cli.config.as_deref()).and_then(|mut config| match cli.command {
        Command::Generate { count, damage, out } => {
            config.num_samples = count.unwrap_or(config.num_samples);
            config.damage_fraction = damage.unwrap_or(config.damage_fraction);
            config.data_root = out.unwrap_or(config.data_root);
            config.validate()?;
            generate_cmd(&config)
        }
        Command::Train { epochs, batch_size, data, model } => {
            config.epochs = epochs.unwrap_or(config.epochs);
            config.batch_size = batch_size.unwrap_or(config.batch_size);
            config.data_root = data.unwrap_or(config.data_root);
            config.model_path = model.unwrap_or(config.model_path);
            config.validate()?;
            train_cmd(&config)
        }
        Command::Heal { input, output, model } => {
            config.model_path = model.unwrap_or(config.model_path);
            heal_cmd(&config, &input, &output)
        }
        Command::Scan { input, model } => {
            config.model_path = model.unwrap_or(config.model_path);
            scan_cmd(&config, &input)
        }
        Command::Evaluate { data, model, samples, comparison } => {
            config.data_root = data.unwrap_or(config.data_root);
            config.model_path = model.unwrap_or(config.model_path);
            evaluate_cmd(&config, samples, comparison.as_deref())
        }
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn generate_cmd(config: &HealerConfig) -> Result<()> {
    let store = SampleStore::new(&config.data_root);
    let mut generator = SampleGenerator::new(QrEncoder::default(), config.image_size as u32, config.damage_fraction);
    log::info!("generating {} pairs into {}", config.num_samples, store.root().display());
    let report = generator.generate_into(&store, config.num_samples)?;
    println!("Wrote {} pairs ({} skipped) to {}", report.written, report.skipped, store.root().display());
    Ok(())
}

fn train_cmd(config: &HealerConfig) -> Result<()> {
    let store = SampleStore::new(&config.data_root);
    let outcome = train_from_store(&store, &config.train_config(), &config.model_path)?;
    if let Some(last) = outcome.history.last() {
        println!(
            "Trained {} epochs: train_loss={:.5}{}",
            outcome.history.len(),
            last.train_loss,
            last.val_loss.map(|v| format!(" val_loss={:.5}", v)).unwrap_or_default()
        );
    }
    println!("Model saved to {}", config.model_path.display());
    Ok(())
}

/// Loads the weights, failing instead of degrading when they are missing.
fn ready_healer(config: &HealerConfig) -> Result<HealingService> {
    let healer = HealingService::load(&config.model_path, config.image_size);
    if !healer.is_ready() {
        return Err(HealError::ModelUnavailable);
    }
    Ok(healer)
}

fn heal_cmd(config: &HealerConfig, input: &Path, output: &Path) -> Result<()> {
    let healer = ready_healer(config)?;
    let result = healer.heal(&image::open(input)?)?;
    result.healed.save(output)?;
    println!("Healed image written to {} (confidence {:.3})", output.display(), result.confidence);
    Ok(())
}

fn scan_cmd(config: &HealerConfig, input: &Path) -> Result<()> {
    let bytes = std::fs::read(input)?;
    let scanner = Scanner::new(
        HealingService::load(&config.model_path, config.image_size),
        DecodeAdapter::platform_default(),
    );
    let result = scanner.heal_and_decode(&bytes);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn evaluate_cmd(config: &HealerConfig, samples: Option<usize>, comparison: Option<&Path>) -> Result<()> {
    let healer = ready_healer(config)?;
    let decoder = DecodeAdapter::platform_default();
    let mut pairs = SampleStore::new(&config.data_root).load_pairs(Some(config.image_size as u32))?;
    pairs.shuffle(&mut rand::thread_rng());
    if let Some(n) = samples {
        pairs.truncate(n.max(1));
    }

    let report = evaluate_pairs(&healer, &decoder, &pairs)?;
    println!("{}", "=".repeat(30));
    println!("Pairs evaluated: {}", report.total);
    println!("Original decoded: {}", report.clean_decoded);
    println!("Damaged decoded:  {}", report.damaged_decoded);
    println!("Healed decoded:   {}", report.healed_decoded);
    println!("Mean confidence:  {:.3}", report.mean_confidence);
    println!("{}", "=".repeat(30));

    if let (Some(path), Some(pair)) = (comparison, pairs.first()) {
        let evaluation = evaluate_pair(&healer, &decoder, pair)?;
        comparison_strip(pair, &evaluation.healed).save(path)?;
        println!("Comparison for {} written to {}", pair.name, path.display());
    }
    Ok(())
}
