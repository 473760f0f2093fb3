//! ffnn CLI: train a feed-forward network on an IDX dataset, score it, and
//! inspect saved models.
//!
//!   ffnn train --train-images train-images.idx3-ubyte --train-labels train-labels.idx1-ubyte \
//!              --test-images t10k-images.idx3-ubyte --test-labels t10k-labels.idx1-ubyte \
//!              --hidden 30 --epochs 30 --out mnist.bin
//!   ffnn evaluate --model mnist.bin --images t10k-images.idx3-ubyte --labels t10k-labels.idx1-ubyte
//!   ffnn info mnist.bin

use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info};

use ffnn::{
    load_model, save_model, Activation, Dataset, IdxDataset, ImageShape, Network, NetworkSpec,
    NnError, Result, TrainConfig,
};

#[derive(Parser)]
#[command(name = "ffnn")]
#[command(about = "Train and evaluate a from-scratch feed-forward network on IDX data")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ActivationArg {
    Sigmoid,
    Relu,
}

impl From<ActivationArg> for Activation {
    fn from(arg: ActivationArg) -> Activation {
        match arg {
            ActivationArg::Sigmoid => Activation::Sigmoid,
            ActivationArg::Relu => Activation::ReLU,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Train a network and save its weights plus a JSON architecture file
    Train {
        /// IDX image file (magic 2051)
        #[arg(long)]
        train_images: String,

        /// IDX label file (magic 2049)
        #[arg(long)]
        train_labels: String,

        /// Optional held-out images scored after training
        #[arg(long, requires = "test_labels")]
        test_images: Option<String>,

        #[arg(long, requires = "test_images")]
        test_labels: Option<String>,

        /// Hidden layer widths, comma separated
        #[arg(long, value_delimiter = ',', default_value = "30")]
        hidden: Vec<usize>,

        /// Number of output classes
        #[arg(long, default_value = "10")]
        classes: usize,

        #[arg(long, value_enum, default_value = "sigmoid")]
        activation: ActivationArg,

        /// JSON training config; flags below override its fields
        #[arg(long)]
        config: Option<String>,

        #[arg(long)]
        epochs: Option<usize>,

        #[arg(long)]
        batch_size: Option<usize>,

        #[arg(long)]
        learning_rate: Option<f64>,

        #[arg(long)]
        l2_lambda: Option<f64>,

        /// Seeds weight init and shuffling for a reproducible run
        #[arg(long)]
        seed: Option<u64>,

        /// Use only the first N samples of each dataset
        #[arg(long)]
        limit: Option<usize>,

        /// Output weight file; the architecture goes next to it as .json
        #[arg(short, long, default_value = "model.bin")]
        out: String,
    },

    /// Report the accuracy of a saved model on an IDX dataset
    Evaluate {
        #[arg(short, long)]
        model: String,

        #[arg(long)]
        images: String,

        #[arg(long)]
        labels: String,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print the architecture stored next to a weight file
    Info {
        model: String,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Train {
            train_images,
            train_labels,
            test_images,
            test_labels,
            hidden,
            classes,
            activation,
            config,
            epochs,
            batch_size,
            learning_rate,
            l2_lambda,
            seed,
            limit,
            out,
        } => {
            let overrides = Overrides { epochs, batch_size, learning_rate, l2_lambda, seed };
            build_config(config.as_deref(), &overrides).and_then(|config| {
                let test = test_images.as_deref().zip(test_labels.as_deref());
                cmd_train(
                    (train_images.as_str(), train_labels.as_str()),
                    test,
                    &hidden,
                    classes,
                    activation.into(),
                    &config,
                    limit,
                    &out,
                )
            })
        }
        Commands::Evaluate { model, images, labels, limit } => {
            cmd_evaluate(&model, &images, &labels, limit)
        }
        Commands::Info { model } => cmd_info(&model),
    };

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
}

struct Overrides {
    epochs: Option<usize>,
    batch_size: Option<usize>,
    learning_rate: Option<f64>,
    l2_lambda: Option<f64>,
    seed: Option<u64>,
}

/// Defaults, then the JSON file, then individual flags.
fn build_config(path: Option<&str>, overrides: &Overrides) -> Result<TrainConfig> {
    let mut config = match path {
        Some(path) => TrainConfig::load_json(path)?,
        None => TrainConfig::new(30, 32, 3.0),
    };
    if let Some(epochs) = overrides.epochs {
        config.epochs = epochs;
    }
    if let Some(batch_size) = overrides.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(learning_rate) = overrides.learning_rate {
        config.learning_rate = learning_rate;
    }
    if let Some(l2_lambda) = overrides.l2_lambda {
        config.l2_lambda = l2_lambda;
    }
    if overrides.seed.is_some() {
        config.seed = overrides.seed;
    }
    config.validate()?;
    Ok(config)
}

fn load_dataset(images: &str, labels: &str, limit: Option<usize>) -> Result<IdxDataset> {
    let dataset = IdxDataset::load(images, labels)?;
    Ok(match limit {
        Some(n) => dataset.take(n),
        None => dataset,
    })
}

#[allow(clippy::too_many_arguments)]
fn cmd_train(
    train: (&str, &str),
    test: Option<(&str, &str)>,
    hidden: &[usize],
    classes: usize,
    activation: Activation,
    config: &TrainConfig,
    limit: Option<usize>,
    out: &str,
) -> Result<()> {
    let train_set = load_dataset(train.0, train.1, limit)?;
    let shape = train_set.image_shape();
    info!("training set: {} images of {}x{}", train_set.len(), shape.rows, shape.cols);

    let mut widths = vec![shape.rows * shape.cols];
    widths.extend_from_slice(hidden);
    widths.push(classes);

    let mut spec = NetworkSpec::new(&model_name(out), widths, activation);
    spec.input_shape = Some(ImageShape { rows: shape.rows, cols: shape.cols });
    let mut network = spec.build(config.seed.unwrap_or_else(rand::random))?;

    println!("Network: {:?} ({:?})", spec.widths, activation);
    println!(
        "Training: epochs = {}, batch_size = {}, learning_rate = {}",
        config.epochs, config.batch_size, config.learning_rate
    );

    let history = network.train(train_set.images(), train_set.labels(), config)?;
    if let (Some(first), Some(last)) = (history.first(), history.last()) {
        println!("Loss: {:.6} (epoch 1) -> {:.6} (epoch {})", first.train_loss, last.train_loss, last.epoch);
    }

    if let Some((images, labels)) = test {
        let test_set = load_dataset(images, labels, limit)?;
        let accuracy = network.evaluate(test_set.images(), test_set.labels())?;
        println!("Overall model accuracy: {:.2}%", accuracy);
    }

    save_model(&network, out)?;
    let spec_path = NetworkSpec::sidecar_path(out);
    spec.save_json(&spec_path)?;
    println!("Model saved to {} (architecture in {})", out, spec_path);
    Ok(())
}

/// Rebuilds a network from the sidecar spec and loads the weights into it.
fn open_model(path: &str) -> Result<(NetworkSpec, Network)> {
    let spec = NetworkSpec::load_json(&NetworkSpec::sidecar_path(path))?;
    let mut network = spec.build(0)?;
    load_model(&mut network, path)?;
    Ok((spec, network))
}

fn cmd_evaluate(model: &str, images: &str, labels: &str, limit: Option<usize>) -> Result<()> {
    let (_, mut network) = open_model(model)?;
    let test_set = load_dataset(images, labels, limit)?;
    if let Some(first) = test_set.images().first() {
        let pixels = first.rows() * first.cols();
        if pixels != network.input_width() {
            return Err(NnError::Format(format!(
                "dataset images have {} pixels, model expects {} inputs",
                pixels,
                network.input_width()
            )));
        }
    }
    let accuracy = network.evaluate(test_set.images(), test_set.labels())?;
    println!("Accuracy on {} samples: {:.2}%", test_set.len(), accuracy);
    Ok(())
}

fn cmd_info(model: &str) -> Result<()> {
    let (spec, network) = open_model(model)?;
    println!("Model:      {}", spec.name);
    println!("Widths:     {:?}", spec.widths);
    println!("Activation: {:?}", spec.activation);
    if let Some(shape) = spec.input_shape {
        println!("Input:      {}x{} image", shape.rows, shape.cols);
    }
    let params: usize = network.layers().iter()
        .map(|l| l.weights().rows() * l.weights().cols() + l.biases().rows())
        .sum();
    println!("Parameters: {}", params);
    Ok(())
}

fn model_name(path: &str) -> String {
    std::path::Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("model")
        .to_owned()
}
