use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::error::{HealError, Result};
use crate::layers::{Gradients, Layer};
use crate::math::tensor::Tensor;
use crate::network::metadata::ModelMetadata;
use crate::network::spec::NetworkSpec;

/// Intermediate values of one training forward pass.
///
/// `inputs[i]` is the tensor fed to layer `i`, so layer `i` produced
/// `inputs[i + 1]` (or `output` for the last layer).
pub struct Trace {
    pub inputs: Vec<Tensor>,
    pub output: Tensor,
}

impl Trace {
    /// Activation produced by layer `i`.
    pub fn layer_output(&self, i: usize) -> &Tensor {
        self.inputs.get(i + 1).unwrap_or(&self.output)
    }
}

/// The restoration model: an ordered stack of layers plus its input shape.
///
/// Inference (`predict`) takes `&self` and never mutates the network, so a
/// single instance can be shared behind an `Arc` by concurrent callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    /// `(channels, height, width)` accepted by the first layer.
    pub input_shape: (usize, usize, usize),
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub metadata: Option<ModelMetadata>,
}

impl Network {
    /// Builds a freshly initialized network from an architecture spec.
    pub fn from_spec(spec: &NetworkSpec) -> Result<Network> {
        Network::from_spec_with_rng(spec, &mut rand::thread_rng())
    }

    pub fn from_spec_with_rng<R: Rng + ?Sized>(spec: &NetworkSpec, rng: &mut R) -> Result<Network> {
        spec.validate()?;
        Ok(Network {
            input_shape: (spec.input_channels, spec.input_size, spec.input_size),
            layers: spec.build_layers(rng),
            metadata: spec.metadata.clone(),
        })
    }

    /// Untrained QR autoencoder for `size × size` grayscale input.
    pub fn qr_autoencoder(size: usize) -> Result<Network> {
        Network::from_spec(&NetworkSpec::qr_autoencoder(size))
    }

    /// Side length of the square input the network expects.
    pub fn input_size(&self) -> usize {
        self.input_shape.1
    }

    pub fn param_count(&self) -> usize {
        self.layers.iter().map(Layer::param_count).sum()
    }

    /// Verifies that the layer chain accepts `input_shape` and returns to it.
    fn check_layers(&self) -> Result<()> {
        let mut shape = self.input_shape;
        for layer in &self.layers {
            shape = layer.output_shape(shape)?;
        }
        if shape != self.input_shape {
            return Err(HealError::InputShape(format!(
                "network maps {:?} to {:?}", self.input_shape, shape
            )));
        }
        Ok(())
    }

    /// Forward pass without gradient bookkeeping.
    pub fn predict(&self, input: &Tensor) -> Result<Tensor> {
        if input.shape() != self.input_shape {
            return Err(HealError::InputShape(format!(
                "expected {:?}, got {:?}", self.input_shape, input.shape()
            )));
        }
        let mut current = input.clone();
        for layer in &self.layers {
            current = layer.forward(&current);
        }
        Ok(current)
    }

    /// Forward pass that keeps every intermediate tensor for `backward`.
    pub fn forward_trace(&self, input: &Tensor) -> Trace {
        let mut inputs = Vec::with_capacity(self.layers.len());
        let mut current = input.clone();
        for layer in &self.layers {
            let next = layer.forward(&current);
            inputs.push(current);
            current = next;
        }
        Trace { inputs, output: current }
    }

    /// Backpropagates `output_delta` (∂L/∂output) through the whole stack.
    ///
    /// Returns one entry per layer, `Some` for layers with parameters.
    pub fn backward(&self, trace: &Trace, output_delta: Tensor) -> Vec<Option<Gradients>> {
        let mut grads: Vec<Option<Gradients>> = vec![None; self.layers.len()];
        let mut delta = output_delta;
        for i in (0..self.layers.len()).rev() {
            let (g, input_delta) = self.layers[i].backward(
                &trace.inputs[i],
                trace.layer_output(i),
                &delta,
            );
            grads[i] = g;
            delta = input_delta;
        }
        grads
    }

    /// Serializes the network to a JSON weights artifact.
    ///
    /// The file is written to a temporary sibling first and renamed into
    /// place, so a failed save never leaves a truncated artifact behind.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer(&mut writer, self)?;
            writer.flush()?;
        }
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Deserializes a network from a file previously written by `save_json`.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Network> {
        let reader = BufReader::new(File::open(path)?);
        let network: Network = serde_json::from_reader(reader)?;
        network.check_layers()?;
        Ok(network)
    }
}
