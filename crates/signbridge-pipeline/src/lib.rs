//! The real-time classification-to-text pipeline.
//!
//! A [`TickScheduler`] drives one capture → classify → accumulate cycle per
//! fixed period; [`TextAccumulator`] folds the resulting observations into
//! the text buffer the caller reads and eventually confirms as a message.

pub mod accumulator;
pub mod pipeline;
pub mod scheduler;

pub use accumulator::{TextAccumulator, CONFIDENCE_GATE};
pub use pipeline::{PipelineHandle, RecognitionPipeline};
pub use scheduler::{SchedulerHandle, TickScheduler};
