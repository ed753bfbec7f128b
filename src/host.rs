//! Host capability set
//!
//! Everything the adapter needs from the plugin host, expressed as traits so
//! the frame driver owns its host explicitly instead of reaching through a
//! table of global callbacks. Optional capabilities (logging, performance
//! counters) are `Option`s: `None` means the host does not provide them and
//! every use becomes a no-op.

use std::path::PathBuf;

/// Log severity, matching the host's four levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Framebuffer formats the adapter can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 16-bit 5:6:5
    Rgb565,
}

/// A single digital input the host can be asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputSource {
    /// Host keyboard key (libretro `RETROK_*` code)
    Key(u32),
    /// Digital button on a joypad port (libretro `RETRO_DEVICE_ID_JOYPAD_*`)
    Joypad { port: u32, button: u32 },
}

/// Read-only view of host input for the current frame.
pub trait InputQuery {
    /// Whether `source` is held. Hosts without input report `false`.
    fn is_pressed(&self, source: InputSource) -> bool;
}

/// Named configuration options exposed by the host.
pub trait OptionSource {
    /// Current value of option `key`, or `None` when the host has none.
    fn variable(&self, key: &str) -> Option<String>;
}

/// Batched audio submission.
pub trait AudioOutput {
    /// Submit interleaved stereo 16-bit samples (`frames.len() / 2` frames).
    /// Returns the number of frames the host accepted.
    fn submit_audio(&mut self, frames: &[i16]) -> usize;
}

/// Sink for leveled diagnostics.
pub trait LogSink {
    fn write(&self, level: LogLevel, message: &str);
}

/// Handle for a counter registered with a [`PerfInterface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterId(pub usize);

/// Host performance-measurement capability.
pub trait PerfInterface {
    /// Register a named counter. Called at most once per counter.
    fn register(&mut self, name: &'static str) -> CounterId;
    fn start(&mut self, id: CounterId);
    fn stop(&mut self, id: CounterId);
    /// Cumulative ticks recorded for `id` across all start/stop pairs.
    fn total(&self, id: CounterId) -> u64;
    /// Ask the host to print every registered counter.
    fn log(&mut self);
}

/// Full capability set a frontend offers the adapter.
pub trait Host: InputQuery + OptionSource + AudioOutput {
    /// Negotiate the framebuffer format. `false` is fatal for loading.
    fn set_pixel_format(&mut self, format: PixelFormat) -> bool;

    /// Directory holding BIOS images, if the host exposes one.
    fn system_directory(&self) -> Option<PathBuf>;

    /// Whether any option changed since the last call.
    fn variables_updated(&mut self) -> bool;

    /// Latch host input for this frame.
    fn poll_input(&mut self);

    /// Deliver one frame. `pitch` is the row stride in bytes.
    fn present_video(&mut self, pixels: &[u16], width: u32, height: u32, pitch: usize);

    fn log_sink(&self) -> Option<&dyn LogSink>;

    fn perf(&mut self) -> Option<&mut dyn PerfInterface>;

    fn log(&self, level: LogLevel, message: &str) {
        if let Some(sink) = self.log_sink() {
            sink.write(level, message);
        }
    }
}
