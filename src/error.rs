//! Adapter errors.

use thiserror::Error;

use crate::engine::EngineError;

/// Result returned from [`Emu`](crate::Emu) methods.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// The host refused the 16-bit RGB565 framebuffer format.
    #[error("host does not support RGB565")]
    UnsupportedPixelFormat,
    /// Operation needs a loaded cartridge.
    #[error("no game is loaded")]
    NotLoaded,
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    /// Serialize target smaller than `serialize_size()`.
    #[error("snapshot buffer too small: need {required} bytes, got {provided}")]
    SnapshotTooSmall { required: usize, provided: usize },
    /// The engine wrote fewer bytes than it said a snapshot takes.
    #[error("engine wrote {written} of {expected} snapshot bytes")]
    SnapshotShort { expected: usize, written: usize },
    /// The engine refused to restore the buffer.
    #[error("snapshot rejected: {0}")]
    SnapshotRejected(EngineError),
}
