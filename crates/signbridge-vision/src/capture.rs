//! Frame capture.
//!
//! [`FrameSource`] is the seam the recognition pipeline is built against:
//! one call, one still image. [`CameraSource`] implements it on top of the
//! Linux video-device API.

use async_trait::async_trait;
use image::DynamicImage;
use signbridge_core::SignbridgeResult;

/// On-demand capture of a single still image from a live video stream.
///
/// Implementations are injected into the pipeline explicitly; nothing in the
/// crate reaches for a globally shared capture hook.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Captures one frame.
    async fn capture_frame(&self) -> SignbridgeResult<DynamicImage>;
}

#[cfg(target_os = "linux")]
pub use linux::CameraSource;

#[cfg(target_os = "linux")]
mod linux {
    use super::FrameSource;
    use async_trait::async_trait;
    use image::DynamicImage;
    use signbridge_core::{SignbridgeError, SignbridgeResult};
    use std::sync::{Arc, Mutex};
    use v4l::buffer::Type;
    use v4l::io::mmap::Stream as MmapStream;
    use v4l::io::traits::CaptureStream;
    use v4l::video::Capture;
    use v4l::{Device, Format, FourCC};

    /// A webcam frame source backed by `/dev/videoN`.
    ///
    /// The device is acquired once on [`open`](CameraSource::open) and held
    /// for the lifetime of the source; dropping the source releases the
    /// device handle.
    pub struct CameraSource {
        device: Arc<Mutex<Device>>,
    }

    impl CameraSource {
        /// Opens video device `index` and negotiates an MJPG capture format
        /// at the requested resolution.
        ///
        /// Access refusal maps to [`SignbridgeError::PermissionDenied`]; a
        /// missing or busy device maps to
        /// [`SignbridgeError::CaptureUnavailable`].
        pub fn open(index: usize, width: u32, height: u32) -> SignbridgeResult<Self> {
            let device = Device::new(index).map_err(map_camera_error)?;
            let format = device
                .set_format(&Format::new(width, height, FourCC::new(b"MJPG")))
                .map_err(map_camera_error)?;
            tracing::info!(
                index,
                width = format.width,
                height = format.height,
                fourcc = %format.fourcc,
                "camera opened"
            );
            Ok(Self {
                device: Arc::new(Mutex::new(device)),
            })
        }
    }

    #[async_trait]
    impl FrameSource for CameraSource {
        async fn capture_frame(&self) -> SignbridgeResult<DynamicImage> {
            let device = Arc::clone(&self.device);
            tokio::task::spawn_blocking(move || {
                let device = device.lock().map_err(|_| {
                    SignbridgeError::CaptureUnavailable("camera state poisoned".to_string())
                })?;
                let mut stream =
                    MmapStream::new(&device, Type::VideoCapture).map_err(map_camera_error)?;
                let (data, _meta) = stream.next().map_err(map_camera_error)?;
                image::load_from_memory(data).map_err(|e| {
                    SignbridgeError::CaptureUnavailable(format!("undecodable frame: {e}"))
                })
            })
            .await
            .map_err(|e| SignbridgeError::CaptureUnavailable(format!("capture task failed: {e}")))?
        }
    }

    fn map_camera_error(e: std::io::Error) -> SignbridgeError {
        match e.kind() {
            std::io::ErrorKind::PermissionDenied => SignbridgeError::PermissionDenied,
            _ => SignbridgeError::CaptureUnavailable(e.to_string()),
        }
    }

}
