//! Audio Batcher
//!
//! The engine produces mono 16-bit samples; the host wants interleaved
//! stereo. Each mono sample is written to both channels.
//!
//! A single submission carries at most [`AUDIO_CHUNK_FRAMES`] frames.
//! Anything past that is dropped, not queued: the drop is visible in the
//! returned [`BatchReport`] and accumulated in [`AudioStats`]. Frames the host
//! declines are likewise only counted; the engine is told the accepted count
//! and nothing is retried.

use crate::host::{AudioOutput, Host, LogLevel};

/// Output rate handed to the engine and announced to the host.
pub const SAMPLE_RATE: u32 = 48_000;

/// Frames per submission.
pub const AUDIO_CHUNK_FRAMES: usize = 1024;

/// Engine-facing audio device.
///
/// Only `write` does real work; the host owns the actual audio device, so
/// opening, pausing and closing are inert.
pub trait AudioSink {
    /// Open the device. Returns the rate actually used.
    fn init(&mut self, rate: u32, latency_ms: u32) -> u32;
    /// Close the device.
    fn release(&mut self);
    /// Pause or resume. Returns whether the request was honored.
    fn pause(&mut self, paused: bool) -> bool;
    /// Frames the device can take right now.
    fn free_space(&self) -> usize;
    /// Queue mono samples. Returns the number of samples consumed.
    fn write(&mut self, samples: &[i16]) -> usize;
}

/// Outcome of one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchReport {
    /// Mono samples offered by the engine
    pub requested: usize,
    /// Stereo frames handed to the host
    pub delivered: usize,
    /// Stereo frames the host took
    pub accepted: usize,
}

impl BatchReport {
    /// Samples cut by the chunk limit.
    pub fn dropped(&self) -> usize {
        self.requested - self.delivered
    }

    /// Frames handed over but not taken by the host.
    pub fn rejected(&self) -> usize {
        self.delivered.saturating_sub(self.accepted)
    }
}

/// Running totals for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AudioStats {
    pub batches: u64,
    pub frames_delivered: u64,
    pub frames_dropped: u64,
    pub frames_rejected: u64,
}

/// Mono → interleaved stereo converter with a fixed chunk buffer.
pub struct AudioBatcher {
    buf: Box<[i16; AUDIO_CHUNK_FRAMES * 2]>,
    stats: AudioStats,
}

impl Default for AudioBatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBatcher {
    pub fn new() -> Self {
        Self {
            buf: Box::new([0; AUDIO_CHUNK_FRAMES * 2]),
            stats: AudioStats::default(),
        }
    }

    /// Duplicate up to one chunk of mono samples into the stereo buffer.
    pub fn interleave(&mut self, mono: &[i16]) -> &[i16] {
        let frames = mono.len().min(AUDIO_CHUNK_FRAMES);
        for (i, &sample) in mono[..frames].iter().enumerate() {
            self.buf[i << 1] = sample;
            self.buf[(i << 1) + 1] = sample;
        }
        &self.buf[..frames * 2]
    }

    /// Interleave `mono` and hand it to `output` in a single call.
    pub fn submit<O: AudioOutput + ?Sized>(&mut self, mono: &[i16], output: &mut O) -> BatchReport {
        let stereo = self.interleave(mono);
        let delivered = stereo.len() / 2;
        let accepted = output.submit_audio(stereo);

        let report = BatchReport {
            requested: mono.len(),
            delivered,
            accepted,
        };
        self.stats.batches += 1;
        self.stats.frames_delivered += delivered as u64;
        self.stats.frames_dropped += report.dropped() as u64;
        self.stats.frames_rejected += report.rejected() as u64;
        report
    }

    pub fn stats(&self) -> AudioStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = AudioStats::default();
    }
}

/// [`AudioSink`] that forwards engine writes through an [`AudioBatcher`]
/// to the host for the duration of one frame.
pub struct BatchingSink<'a, H: Host + ?Sized> {
    batcher: &'a mut AudioBatcher,
    host: &'a mut H,
}

impl<'a, H: Host + ?Sized> BatchingSink<'a, H> {
    pub fn new(batcher: &'a mut AudioBatcher, host: &'a mut H) -> Self {
        Self { batcher, host }
    }
}

impl<H: Host + ?Sized> AudioSink for BatchingSink<'_, H> {
    fn init(&mut self, rate: u32, _latency_ms: u32) -> u32 {
        rate
    }

    fn release(&mut self) {}

    fn pause(&mut self, _paused: bool) -> bool {
        true
    }

    fn free_space(&self) -> usize {
        AUDIO_CHUNK_FRAMES
    }

    fn write(&mut self, samples: &[i16]) -> usize {
        let before = self.batcher.stats();
        let report = self.batcher.submit(samples, &mut *self.host);

        if report.dropped() > 0 && before.frames_dropped == 0 {
            self.host.log(
                LogLevel::Warn,
                &format!(
                    "audio: {} samples in one write, {} over the {} frame chunk were dropped",
                    report.requested,
                    report.dropped(),
                    AUDIO_CHUNK_FRAMES
                ),
            );
        }
        if report.rejected() > 0 && before.frames_rejected == 0 {
            self.host.log(
                LogLevel::Warn,
                &format!(
                    "audio: host accepted {} of {} frames",
                    report.accepted, report.delivered
                ),
            );
        }
        report.accepted
    }
}
