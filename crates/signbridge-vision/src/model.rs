//! The sign classification model: a dense network loaded from a JSON
//! topology manifest plus a raw little-endian `f32` weights file.
//!
//! The manifest/weights split mirrors the artifact layout the model is
//! exported in. The loader validates the whole artifact up front so that a
//! ready model can run inference without further error paths.

use serde::Deserialize;
use signbridge_core::{Label, SignbridgeError, SignbridgeResult};
use std::path::Path;

/// Expected input width in pixels.
pub const INPUT_WIDTH: u32 = 28;
/// Expected input height in pixels.
pub const INPUT_HEIGHT: u32 = 28;
/// Expected input channel depth (RGB).
pub const INPUT_CHANNELS: u32 = 3;
/// Flattened input length: 28 · 28 · 3.
pub const INPUT_LEN: usize = (INPUT_WIDTH * INPUT_HEIGHT * INPUT_CHANNELS) as usize;

/// Manifest format identifier this loader understands.
const MANIFEST_FORMAT: &str = "signbridge-dense";

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// Activation function of one dense layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    /// Rectified linear unit, used on hidden layers.
    Relu,
    /// Softmax over the class axis, used on the output layer.
    Softmax,
}

/// One dense layer entry in the manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct LayerSpec {
    /// Number of output units.
    pub units: usize,
    /// Activation applied after the affine transform.
    pub activation: Activation,
}

/// The model topology manifest (`model.json`).
#[derive(Debug, Deserialize)]
pub struct ModelManifest {
    /// Format identifier; must be `signbridge-dense`.
    pub format: String,
    /// Spatial input shape `[height, width, channels]`.
    pub input_shape: [usize; 3],
    /// Output class names, in output-unit order.
    pub classes: Vec<String>,
    /// Dense layers, first to last.
    pub layers: Vec<LayerSpec>,
    /// Weights file path, relative to the manifest.
    pub weights_path: String,
}

// ---------------------------------------------------------------------------
// DenseModel
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct DenseLayer {
    inputs: usize,
    units: usize,
    /// Row-major `[inputs × units]` kernel.
    kernel: Vec<f32>,
    bias: Vec<f32>,
    activation: Activation,
}

/// A loaded, validated dense network ready for inference.
#[derive(Debug)]
pub struct DenseModel {
    layers: Vec<DenseLayer>,
}

impl DenseModel {
    /// Loads and validates a model from its manifest path.
    ///
    /// Every validation failure maps to [`SignbridgeError::ModelLoad`] with
    /// the underlying cause, leaving the caller free to retry.
    pub async fn load(manifest_path: &Path) -> SignbridgeResult<Self> {
        let raw = tokio::fs::read_to_string(manifest_path).await.map_err(|e| {
            SignbridgeError::ModelLoad(format!(
                "failed to read manifest {}: {e}",
                manifest_path.display()
            ))
        })?;
        let manifest: ModelManifest = serde_json::from_str(&raw)
            .map_err(|e| SignbridgeError::ModelLoad(format!("invalid manifest: {e}")))?;

        Self::validate_manifest(&manifest)?;

        let weights_path = manifest_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(&manifest.weights_path);
        let bytes = tokio::fs::read(&weights_path).await.map_err(|e| {
            SignbridgeError::ModelLoad(format!(
                "failed to read weights {}: {e}",
                weights_path.display()
            ))
        })?;

        Self::from_parts(&manifest, &bytes)
    }

    fn validate_manifest(manifest: &ModelManifest) -> SignbridgeResult<()> {
        if manifest.format != MANIFEST_FORMAT {
            return Err(SignbridgeError::ModelLoad(format!(
                "unsupported manifest format '{}'",
                manifest.format
            )));
        }
        let expected_shape = [
            INPUT_HEIGHT as usize,
            INPUT_WIDTH as usize,
            INPUT_CHANNELS as usize,
        ];
        if manifest.input_shape != expected_shape {
            return Err(SignbridgeError::ModelLoad(format!(
                "unsupported input shape {:?}, expected {expected_shape:?}",
                manifest.input_shape
            )));
        }
        if manifest.classes.len() != Label::COUNT {
            return Err(SignbridgeError::ModelLoad(format!(
                "manifest declares {} classes, expected {}",
                manifest.classes.len(),
                Label::COUNT
            )));
        }
        for (index, class) in manifest.classes.iter().enumerate() {
            match Label::from_name(class) {
                Some(label) if label.index() == index => {}
                _ => {
                    return Err(SignbridgeError::ModelLoad(format!(
                        "class '{class}' at index {index} does not match the label alphabet"
                    )));
                }
            }
        }
        let last = manifest.layers.last().ok_or_else(|| {
            SignbridgeError::ModelLoad("manifest declares no layers".to_string())
        })?;
        if last.units != manifest.classes.len() {
            return Err(SignbridgeError::ModelLoad(format!(
                "output layer has {} units but {} classes are declared",
                last.units,
                manifest.classes.len()
            )));
        }
        if last.activation != Activation::Softmax {
            return Err(SignbridgeError::ModelLoad(
                "output layer activation must be softmax".to_string(),
            ));
        }
        Ok(())
    }

    fn from_parts(manifest: &ModelManifest, bytes: &[u8]) -> SignbridgeResult<Self> {
        let mut expected_len = 0usize;
        let mut inputs = INPUT_LEN;
        for spec in &manifest.layers {
            expected_len += (inputs * spec.units + spec.units) * std::mem::size_of::<f32>();
            inputs = spec.units;
        }
        if bytes.len() != expected_len {
            return Err(SignbridgeError::ModelLoad(format!(
                "weights file holds {} bytes, topology requires {expected_len}",
                bytes.len()
            )));
        }

        let mut offset = 0usize;
        let mut read_f32s = |count: usize| -> Vec<f32> {
            let mut values = Vec::with_capacity(count);
            for chunk in bytes[offset..offset + count * 4].chunks_exact(4) {
                values.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
            }
            offset += count * 4;
            values
        };

        let mut layers = Vec::with_capacity(manifest.layers.len());
        let mut inputs = INPUT_LEN;
        for spec in &manifest.layers {
            let kernel = read_f32s(inputs * spec.units);
            let bias = read_f32s(spec.units);
            layers.push(DenseLayer {
                inputs,
                units: spec.units,
                kernel,
                bias,
                activation: spec.activation,
            });
            inputs = spec.units;
        }

        Ok(Self { layers })
    }

    /// Flattened input length the model expects.
    pub fn input_len(&self) -> usize {
        INPUT_LEN
    }

    /// Number of output classes.
    pub fn class_count(&self) -> usize {
        self.layers.last().map_or(0, |l| l.units)
    }

    /// Runs the forward pass over one flattened, normalized input.
    ///
    /// The input must be `input_len()` values in `[0, 1]`; the output is one
    /// probability per class.
    pub fn forward(&self, input: &[f32]) -> Vec<f32> {
        debug_assert_eq!(input.len(), self.input_len());

        let mut activations = input.to_vec();
        for layer in &self.layers {
            let mut next = layer.bias.clone();
            for (i, &x) in activations.iter().enumerate().take(layer.inputs) {
                if x == 0.0 {
                    continue;
                }
                let row = &layer.kernel[i * layer.units..(i + 1) * layer.units];
                for (j, &w) in row.iter().enumerate() {
                    next[j] += x * w;
                }
            }
            match layer.activation {
                Activation::Relu => {
                    for v in &mut next {
                        *v = v.max(0.0);
                    }
                }
                Activation::Softmax => softmax_in_place(&mut next),
            }
            activations = next;
        }
        activations
    }

    /// Runs one inference against an all-zero input to force any lazy
    /// initialization before the model is marked ready.
    pub fn warm_up(&self) {
        let zeros = vec![0.0f32; self.input_len()];
        let _ = self.forward(&zeros);
    }
}

/// Numerically stable softmax.
fn softmax_in_place(values: &mut [f32]) {
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0f32;
    for v in values.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    if sum > 0.0 {
        for v in values.iter_mut() {
            *v /= sum;
        }
    }
}
