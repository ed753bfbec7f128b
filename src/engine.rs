//! Emulation engine boundary
//!
//! The Z80 interpreter, VDP renderer, PSG/SCC synthesis and cartridge mappers
//! live behind [`Engine`]. While it runs, the engine calls back into the
//! adapter through [`EngineHost`] for palette writes, input lines, the frame
//! buffer, the end-of-frame signal and its audio device.

use std::path::PathBuf;

use thiserror::Error;

use crate::audio::AudioSink;
use crate::config::MachineMode;
use crate::input::{Joystick, KeyMatrix};
use crate::video::{Palette, VideoFrame};

/// 16 KiB RAM pages installed by default.
pub const DEFAULT_RAM_PAGES: u32 = 4;
/// 16 KiB VRAM pages installed by default.
pub const DEFAULT_VRAM_PAGES: u32 = 2;
/// Percentage of frames the renderer draws.
pub const DEFAULT_UPDATE_PERIOD: u8 = 100;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("failed to start: {0}")]
    Start(String),
    #[error("state data is invalid")]
    InvalidState,
    #[error("state size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("output buffer too small: need {required} bytes, got {provided}")]
    ShortBuffer { required: usize, provided: usize },
}

/// Everything the engine needs to bring up a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub mode: MachineMode,
    pub ram_pages: u32,
    pub vram_pages: u32,
    /// Cartridge image path
    pub cartridge: PathBuf,
    /// Where BIOS images are looked up
    pub system_dir: Option<PathBuf>,
    pub update_period: u8,
    /// Joystick plugged into port 1 / port 2
    pub joysticks: [bool; 2],
}

impl EngineConfig {
    pub fn new(mode: MachineMode, cartridge: PathBuf, system_dir: Option<PathBuf>) -> Self {
        Self {
            mode,
            ram_pages: DEFAULT_RAM_PAGES,
            vram_pages: DEFAULT_VRAM_PAGES,
            cartridge,
            system_dir,
            update_period: DEFAULT_UPDATE_PERIOD,
            joysticks: [true, true],
        }
    }
}

/// Adapter services available to the engine during a call.
pub trait EngineHost {
    /// Store palette entry `index` (0 = background).
    fn set_color(&mut self, index: u8, r: u8, g: u8, b: u8);
    fn palette(&self) -> &Palette;
    /// Buffer the renderer draws into.
    fn frame(&mut self) -> &mut VideoFrame;
    /// Keyboard matrix for this frame.
    fn keys(&self) -> &KeyMatrix;
    /// Joystick lines for this frame.
    fn joystick(&self) -> Joystick;
    /// The renderer finished a frame. The engine must return from
    /// `run_frame` once this has been called.
    fn frame_complete(&mut self);
    /// Whether the engine should stop executing and return.
    fn exit_requested(&self) -> bool;
    fn audio(&mut self) -> &mut dyn AudioSink;
}

/// An MSX emulation engine.
pub trait Engine {
    /// Power on with `config`. Returns once initialization is done.
    fn start(&mut self, config: &EngineConfig, host: &mut dyn EngineHost) -> Result<(), EngineError>;

    /// Hard reset, applying `config`'s mode and memory sizes.
    fn reset(&mut self, config: &EngineConfig, host: &mut dyn EngineHost) -> Result<(), EngineError>;

    /// Execute until the renderer signals a complete frame.
    fn run_frame(&mut self, host: &mut dyn EngineHost);

    /// Synthesize `samples` mono samples and write them to `host.audio()`.
    fn render_audio(&mut self, samples: usize, host: &mut dyn EngineHost);

    /// Bytes a snapshot takes under the current configuration.
    fn state_size(&self) -> usize;

    /// Serialize into `out`. Returns bytes written.
    fn save_state(&self, out: &mut [u8]) -> Result<usize, EngineError>;

    /// Restore from a buffer produced by `save_state`.
    fn load_state(&mut self, data: &[u8]) -> Result<(), EngineError>;

    /// Release cartridge and memory.
    fn shutdown(&mut self) {}
}
