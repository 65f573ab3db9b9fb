//! Wires the frame source, classifier, and accumulator into the tick loop.

use crate::accumulator::TextAccumulator;
use crate::scheduler::{SchedulerHandle, TickScheduler};
use signbridge_vision::{FrameSource, SignClassifier};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// The capture → classify → accumulate pipeline.
///
/// The classifier and frame source are injected; the pipeline owns neither
/// beyond a shared handle, so the same classifier instance can serve other
/// consumers.
pub struct RecognitionPipeline {
    classifier: Arc<SignClassifier>,
    source: Arc<dyn FrameSource>,
    period: Duration,
}

impl RecognitionPipeline {
    /// Creates a pipeline ticking at `period`.
    pub fn new(
        classifier: Arc<SignClassifier>,
        source: Arc<dyn FrameSource>,
        period: Duration,
    ) -> Self {
        Self {
            classifier,
            source,
            period,
        }
    }

    /// Starts streaming: spawns the tick loop and returns the handle used to
    /// read, confirm, and stop.
    ///
    /// Per-tick failures (capture or classification) are logged and the tick
    /// is skipped; the pipeline itself keeps running. Ticks are also skipped
    /// while the classifier is not ready.
    pub fn start(&self) -> PipelineHandle {
        let accumulator = Arc::new(RwLock::new(TextAccumulator::new()));

        let classifier = Arc::clone(&self.classifier);
        let source = Arc::clone(&self.source);
        let shared = Arc::clone(&accumulator);
        let scheduler = TickScheduler::new(self.period).spawn(move || {
            let classifier = Arc::clone(&classifier);
            let source = Arc::clone(&source);
            let accumulator = Arc::clone(&shared);
            async move {
                if !classifier.is_ready().await {
                    tracing::debug!("classifier not ready; skipping tick");
                    return;
                }
                let frame = match source.capture_frame().await {
                    Ok(frame) => frame,
                    Err(error) => {
                        tracing::warn!(%error, "frame capture failed");
                        return;
                    }
                };
                let result = match classifier.classify(&frame).await {
                    Ok(result) => result,
                    Err(error) => {
                        tracing::warn!(%error, "classification failed");
                        return;
                    }
                };
                tracing::debug!(
                    label = %result.label,
                    confidence = f64::from(result.confidence),
                    "frame classified"
                );
                accumulator.write().await.observe(&result);
            }
        });

        PipelineHandle {
            scheduler,
            accumulator,
        }
    }
}

/// Handle to a running pipeline: the caller's view of the text buffer plus
/// the stop control.
pub struct PipelineHandle {
    scheduler: SchedulerHandle,
    accumulator: Arc<RwLock<TextAccumulator>>,
}

impl PipelineHandle {
    /// Snapshot of the accumulated text.
    pub async fn text(&self) -> String {
        self.accumulator.read().await.text().to_string()
    }

    /// Confirms the accumulated text as a message: returns it and resets the
    /// buffer to empty.
    pub async fn take_text(&self) -> String {
        self.accumulator.write().await.take()
    }

    /// Stops streaming.
    ///
    /// The tick loop is cancelled; a tick already in flight runs to
    /// completion, and the buffer — including anything that tick
    /// contributed — is discarded afterwards.
    pub async fn stop(self) {
        self.scheduler.stop().await;
        self.accumulator.write().await.clear();
    }
}
