//! Pipeline error types

use thiserror::Error;

/// Errors from decoding, transforming or encoding image payloads
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Parameter invalid: {0}")]
    ParamInvalid(&'static str),

    #[error("Image codec error: {0}")]
    Codec(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
