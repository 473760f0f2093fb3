use serde::{Serialize, Deserialize};

use crate::activation::activation::Activation;
use crate::error::{NnError, Result};
use crate::network::network::Network;

/// Height and width of the image a network's input vector was flattened from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageShape {
    pub rows: usize,
    pub cols: usize,
}

/// A fully serializable description of a network architecture.
///
/// Binary weight files carry no architecture, so the CLI stores a
/// `NetworkSpec` next to each one (`model.bin` → `model.json`) and uses it
/// to build a network of the right shape before loading the weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Human-readable name of the model.
    pub name: String,
    /// Layer widths `[n0, ..., nL]`, input first.
    pub widths: Vec<usize>,
    pub activation: Activation,
    /// Image shape of the input, when the input is an image.
    #[serde(default)]
    pub input_shape: Option<ImageShape>,
    #[serde(default)]
    pub description: Option<String>,
}

impl NetworkSpec {
    pub fn new(name: &str, widths: Vec<usize>, activation: Activation) -> NetworkSpec {
        NetworkSpec {
            name: name.to_owned(),
            widths,
            activation,
            input_shape: None,
            description: None,
        }
    }

    /// Describes an existing network.
    pub fn of(name: &str, network: &Network) -> NetworkSpec {
        NetworkSpec::new(name, network.widths(), network.activation())
    }

    /// Builds a freshly initialised network with this architecture.
    pub fn build(&self, seed: u64) -> Result<Network> {
        if let Some(shape) = self.input_shape {
            if self.widths.first() != Some(&(shape.rows * shape.cols)) {
                return Err(NnError::InvalidArchitecture(format!(
                    "input shape {}x{} does not match input width {:?}",
                    shape.rows, shape.cols, self.widths.first()
                )));
            }
        }
        Network::seeded(&self.widths, self.activation, seed)
    }

    /// Path of the spec file that accompanies a weight file.
    pub fn sidecar_path(model_path: &str) -> String {
        std::path::Path::new(model_path)
            .with_extension("json")
            .to_string_lossy()
            .into_owned()
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `NetworkSpec` from a JSON file.
    pub fn load_json(path: &str) -> Result<NetworkSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
