//! Frame capture and sign classification.
//!
//! This crate owns the two vision-side collaborators of the recognition
//! pipeline:
//!
//! - [`FrameSource`] / [`CameraSource`] — on-demand capture of a single
//!   still image from a live video device.
//! - [`SignClassifier`] — loads the sign model once (single-flight) and
//!   turns one frame into a ranked [`ClassificationResult`].
//!
//! [`ClassificationResult`]: signbridge_core::ClassificationResult

pub mod capture;
pub mod classifier;
pub mod model;

pub use capture::FrameSource;
#[cfg(target_os = "linux")]
pub use capture::CameraSource;
pub use classifier::SignClassifier;
pub use model::DenseModel;
