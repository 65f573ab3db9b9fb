//! The sign classifier: owns the loaded model and turns one captured frame
//! into a ranked classification.

use crate::model::{DenseModel, INPUT_HEIGHT, INPUT_WIDTH};
use image::imageops::FilterType;
use image::DynamicImage;
use signbridge_core::{ClassificationResult, Label, SignbridgeError, SignbridgeResult};
use std::path::PathBuf;
use tokio::sync::{Mutex, RwLock};

/// Classifies captured frames against the sign model.
///
/// The model is loaded once, on demand, with single-flight semantics: while
/// a load is in flight, concurrent callers queue behind it instead of
/// starting a second load, and observe the loaded model once it lands. A
/// caller that queued behind a failed attempt retries the load itself.
pub struct SignClassifier {
    manifest_path: PathBuf,
    model: RwLock<Option<DenseModel>>,
    load_guard: Mutex<()>,
}

impl SignClassifier {
    /// Creates a classifier for the model at `manifest_path`. No I/O happens
    /// until [`load`](Self::load) is called.
    pub fn new(manifest_path: impl Into<PathBuf>) -> Self {
        Self {
            manifest_path: manifest_path.into(),
            model: RwLock::new(None),
            load_guard: Mutex::new(()),
        }
    }

    /// Loads the model if it is not loaded yet. Idempotent and single-flight.
    ///
    /// On failure the classifier stays in the "not loaded" state and the
    /// error carries the underlying cause; the caller may retry.
    pub async fn load(&self) -> SignbridgeResult<()> {
        if self.model.read().await.is_some() {
            return Ok(());
        }

        let _guard = self.load_guard.lock().await;
        // A load that finished while we waited for the guard wins.
        if self.model.read().await.is_some() {
            return Ok(());
        }

        let model = DenseModel::load(&self.manifest_path).await?;
        model.warm_up();
        tracing::info!(path = %self.manifest_path.display(), "sign model loaded");
        *self.model.write().await = Some(model);
        Ok(())
    }

    /// Whether a loaded model is available for classification.
    pub async fn is_ready(&self) -> bool {
        self.model.read().await.is_some()
    }

    /// Classifies one frame.
    ///
    /// The frame is resized to the model's 28×28 RGB input, normalized to
    /// `[0, 1]`, and run through the network. Fails with
    /// [`SignbridgeError::ModelNotReady`] if no model is loaded.
    pub async fn classify(&self, frame: &DynamicImage) -> SignbridgeResult<ClassificationResult> {
        let guard = self.model.read().await;
        let model = guard.as_ref().ok_or(SignbridgeError::ModelNotReady)?;

        let input = preprocess(frame);
        let probs = model.forward(&input);

        let ranked: Vec<(Label, f32)> = Label::ALL
            .iter()
            .copied()
            .zip(probs.iter().copied())
            .collect();
        Ok(ClassificationResult::from_probabilities(ranked))
    }

    /// Releases the loaded model's resources. Safe to call if never loaded;
    /// a later [`load`](Self::load) starts fresh.
    pub async fn dispose(&self) {
        *self.model.write().await = None;
    }
}

/// Resizes a frame to the model input dimensions and flattens it into
/// normalized `[0, 1]` RGB values.
fn preprocess(frame: &DynamicImage) -> Vec<f32> {
    let resized = frame.resize_exact(INPUT_WIDTH, INPUT_HEIGHT, FilterType::Triangle);
    let rgb = resized.to_rgb8();
    rgb.as_raw().iter().map(|&b| f32::from(b) / 255.0).collect()
}
