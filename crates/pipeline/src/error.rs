use thiserror::Error;

use pubsub_transport::TransportError;

/// A failure that stops the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The transport failed in a way it could not recover from.
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    /// A stage task panicked or was aborted.
    #[error("stage `{stage}` aborted: {reason}")]
    StageAborted { stage: &'static str, reason: String },
}
