//! SDK error types

use thiserror::Error;

pub use streamdock_image::PipelineError;
pub use streamdock_transport::TransportError;

/// Errors surfaced by the device manager and binding path
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("No model registered for vid {vid:04X} pid {pid:04X}")]
    Unsupported { vid: u16, pid: u16 },

    #[error("Hot-plug monitor error: {0}")]
    Monitor(String),
}
