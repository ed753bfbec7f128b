//! In-memory host and engine used by unit and integration tests.
//!
//! `FakeHost` records every host interaction in order. `FakeEngine` is a
//! small deterministic machine: it draws a block that the joystick moves,
//! marks held keys with a stripe, plays a square wave and serializes all of
//! that state, so save/restore and determinism can be checked end to end.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use crate::audio::SAMPLE_RATE;
use crate::engine::{Engine, EngineConfig, EngineError, EngineHost};
use crate::host::{
    AudioOutput, CounterId, Host, InputQuery, InputSource, LogLevel, LogSink, OptionSource,
    PerfInterface, PixelFormat,
};
use crate::input::{InputState, Joystick};
use crate::video::{SCREEN_HEIGHT, SCREEN_WIDTH};

/// Host interactions in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    VariablesChecked,
    Poll,
    /// Stereo frames offered
    Audio(usize),
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoCapture {
    pub pixels: Vec<u16>,
    pub width: u32,
    pub height: u32,
    pub pitch: usize,
}

/// Performance counters that advance by a scripted cost on every stop.
#[derive(Debug, Default)]
pub struct FakePerf {
    pub costs: Vec<u64>,
    pub names: Vec<&'static str>,
    pub totals: Vec<u64>,
    pub stops: usize,
    pub logged: u32,
}

impl FakePerf {
    pub fn new(costs: &[u64]) -> Self {
        Self {
            costs: costs.to_vec(),
            ..Self::default()
        }
    }
}

impl PerfInterface for FakePerf {
    fn register(&mut self, name: &'static str) -> CounterId {
        self.names.push(name);
        self.totals.push(0);
        CounterId(self.totals.len() - 1)
    }

    fn start(&mut self, _id: CounterId) {}

    fn stop(&mut self, id: CounterId) {
        let cost = if self.costs.is_empty() {
            0
        } else {
            self.costs[self.stops % self.costs.len()]
        };
        self.stops += 1;
        self.totals[id.0] += cost;
    }

    fn total(&self, id: CounterId) -> u64 {
        self.totals[id.0]
    }

    fn log(&mut self) {
        self.logged += 1;
    }
}

pub struct FakeHost {
    pub events: Vec<HostEvent>,
    pub accept_rgb565: bool,
    pub system_dir: Option<PathBuf>,
    /// Reported (and cleared) by the next `variables_updated`
    pub updated: bool,
    pub held: HashSet<InputSource>,
    pub options: HashMap<String, String>,
    /// Frames accepted per submission; `None` accepts everything
    pub audio_limit: Option<usize>,
    pub videos: Vec<VideoCapture>,
    pub audio: Vec<Vec<i16>>,
    pub logs: RefCell<Vec<(LogLevel, String)>>,
    pub log_enabled: bool,
    pub perf: Option<FakePerf>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            accept_rgb565: true,
            system_dir: None,
            updated: false,
            held: HashSet::new(),
            options: HashMap::new(),
            audio_limit: None,
            videos: Vec::new(),
            audio: Vec::new(),
            logs: RefCell::new(Vec::new()),
            log_enabled: true,
            perf: None,
        }
    }
}

impl FakeHost {
    pub fn set_option(&mut self, key: &str, value: &str) {
        self.options.insert(key.to_string(), value.to_string());
    }

    pub fn press(&mut self, source: InputSource) {
        self.held.insert(source);
    }

    pub fn release(&mut self, source: InputSource) {
        self.held.remove(&source);
    }

    pub fn release_all(&mut self) {
        self.held.clear();
    }

    /// Whether a message at `level` containing `needle` was logged.
    pub fn logged(&self, level: LogLevel, needle: &str) -> bool {
        self.logs
            .borrow()
            .iter()
            .any(|(l, msg)| *l == level && msg.contains(needle))
    }
}

impl InputQuery for FakeHost {
    fn is_pressed(&self, source: InputSource) -> bool {
        self.held.contains(&source)
    }
}

impl OptionSource for FakeHost {
    fn variable(&self, key: &str) -> Option<String> {
        self.options.get(key).cloned()
    }
}

impl AudioOutput for FakeHost {
    fn submit_audio(&mut self, frames: &[i16]) -> usize {
        let offered = frames.len() / 2;
        self.events.push(HostEvent::Audio(offered));
        self.audio.push(frames.to_vec());
        offered.min(self.audio_limit.unwrap_or(usize::MAX))
    }
}

impl LogSink for FakeHost {
    fn write(&self, level: LogLevel, message: &str) {
        self.logs.borrow_mut().push((level, message.to_string()));
    }
}

impl Host for FakeHost {
    fn set_pixel_format(&mut self, format: PixelFormat) -> bool {
        match format {
            PixelFormat::Rgb565 => self.accept_rgb565,
        }
    }

    fn system_directory(&self) -> Option<PathBuf> {
        self.system_dir.clone()
    }

    fn variables_updated(&mut self) -> bool {
        self.events.push(HostEvent::VariablesChecked);
        std::mem::take(&mut self.updated)
    }

    fn poll_input(&mut self) {
        self.events.push(HostEvent::Poll);
    }

    fn present_video(&mut self, pixels: &[u16], width: u32, height: u32, pitch: usize) {
        self.events.push(HostEvent::Video);
        self.videos.push(VideoCapture {
            pixels: pixels.to_vec(),
            width,
            height,
            pitch,
        });
    }

    fn log_sink(&self) -> Option<&dyn LogSink> {
        if self.log_enabled {
            Some(self)
        } else {
            None
        }
    }

    fn perf(&mut self) -> Option<&mut dyn PerfInterface> {
        self.perf.as_mut().map(|perf| perf as &mut dyn PerfInterface)
    }
}

/// TMS9918 colors 1..=15. Color 0 (transparent) is left to the backdrop.
pub const TMS9918_COLORS: [(u8, u8, u8); 15] = [
    (0, 0, 0),
    (33, 200, 66),
    (94, 220, 120),
    (84, 85, 237),
    (125, 118, 252),
    (212, 82, 77),
    (66, 235, 245),
    (252, 85, 84),
    (255, 121, 120),
    (212, 193, 84),
    (230, 206, 128),
    (33, 176, 59),
    (201, 91, 186),
    (204, 204, 204),
    (255, 255, 255),
];

const STATE_MAGIC: &[u8; 8] = b"FAKEMSX1";
/// magic + mode + ticks + frames + x + y + phase
const STATE_HEADER: usize = 8 + 4 + 8 + 8 + 4 + 4 + 4;
const PAGE_BYTES: usize = 0x4000;
const BLOCK: usize = 16;
const TONE_PERIOD: u32 = 109;

/// Deterministic stand-in for the MSX engine.
#[derive(Debug, Default)]
pub struct FakeEngine {
    /// Config from the last start or reset
    pub started: Option<EngineConfig>,
    pub resets: u32,
    pub frames_run: u64,
    /// Machine time; advances once per frame and is saved in snapshots
    pub ticks: u64,
    pub x: i32,
    pub y: i32,
    pub phase: u32,
    pub ram: Vec<u8>,
    pub vram: Vec<u8>,
    /// Input observed at the start of each frame
    pub seen: Vec<InputState>,
    /// Frames accepted by the last audio write
    pub last_accepted: usize,
    pub fail_start: bool,
    pub skip_frame_complete: bool,
    pub exit_seen_at_start: bool,
    pub short_write: bool,
    /// Synthesize this many samples instead of what was asked for
    pub samples_override: Option<usize>,
    pub shut_down: bool,
}

impl FakeEngine {
    pub fn state_size_for(ram_pages: u32, vram_pages: u32) -> usize {
        STATE_HEADER + (ram_pages as usize + vram_pages as usize) * PAGE_BYTES
    }

    fn power_on(&mut self, config: &EngineConfig, host: &mut dyn EngineHost) {
        self.started = Some(config.clone());
        self.ticks = 0;
        self.x = (SCREEN_WIDTH / 2) as i32;
        self.y = (SCREEN_HEIGHT / 2) as i32;
        self.phase = 0;
        self.ram = vec![0; config.ram_pages as usize * PAGE_BYTES];
        self.vram = vec![0; config.vram_pages as usize * PAGE_BYTES];
        for (i, &(r, g, b)) in TMS9918_COLORS.iter().enumerate() {
            host.set_color(i as u8 + 1, r, g, b);
        }
        host.audio().init(SAMPLE_RATE, 100);
    }

    fn mode_bits(&self) -> u32 {
        self.started.as_ref().map_or(0, |c| c.mode.bits())
    }
}

fn put<const N: usize>(out: &mut [u8], at: &mut usize, bytes: [u8; N]) {
    out[*at..*at + N].copy_from_slice(&bytes);
    *at += N;
}

fn take<const N: usize>(data: &[u8], at: &mut usize) -> [u8; N] {
    let mut bytes = [0u8; N];
    bytes.copy_from_slice(&data[*at..*at + N]);
    *at += N;
    bytes
}

impl Engine for FakeEngine {
    fn start(&mut self, config: &EngineConfig, host: &mut dyn EngineHost) -> Result<(), EngineError> {
        if self.fail_start {
            return Err(EngineError::Start(format!(
                "cannot open {}",
                config.cartridge.display()
            )));
        }
        self.exit_seen_at_start = host.exit_requested();
        self.power_on(config, host);
        Ok(())
    }

    fn reset(&mut self, config: &EngineConfig, host: &mut dyn EngineHost) -> Result<(), EngineError> {
        self.resets += 1;
        self.power_on(config, host);
        Ok(())
    }

    fn run_frame(&mut self, host: &mut dyn EngineHost) {
        let joy = host.joystick();
        let keys = *host.keys();
        self.seen.push(InputState {
            keys,
            joystick: joy,
        });

        if joy.contains(Joystick::UP) {
            self.y -= 2;
        }
        if joy.contains(Joystick::DOWN) {
            self.y += 2;
        }
        if joy.contains(Joystick::LEFT) {
            self.x -= 2;
        }
        if joy.contains(Joystick::RIGHT) {
            self.x += 2;
        }
        self.x = self.x.clamp(0, (SCREEN_WIDTH - BLOCK) as i32);
        self.y = self.y.clamp(0, (SCREEN_HEIGHT - BLOCK) as i32);

        if !self.ram.is_empty() {
            let len = self.ram.len();
            self.ram[self.ticks as usize % len] = (joy.bits() ^ (joy.bits() >> 8)) as u8;
        }
        if !self.vram.is_empty() {
            let len = self.vram.len();
            self.vram[(self.x as usize + self.y as usize * SCREEN_WIDTH) % len] ^= 0xFF;
        }

        let backdrop = host.palette().color(4);
        let block = host.palette().color(15);
        let stripe = host.palette().color(8);
        // Second stick lights the stripe when no key is held
        let second = if joy.bits() >> 8 != 0 {
            host.palette().color(2)
        } else {
            backdrop
        };
        let (x, y) = (self.x as usize, self.y as usize);

        let frame = host.frame();
        for row in 0..frame.height() {
            let Some(line) = frame.row_mut(row) else {
                break;
            };
            line.fill(backdrop);
            if row < 4 {
                let color = if keys.any_pressed() { stripe } else { second };
                line.fill(color);
            }
            if (y..y + BLOCK).contains(&row) {
                line[x..x + BLOCK].fill(block);
            }
        }

        self.ticks += 1;
        self.frames_run += 1;
        if !self.skip_frame_complete {
            host.frame_complete();
        }
    }

    fn render_audio(&mut self, samples: usize, host: &mut dyn EngineHost) {
        let count = self.samples_override.unwrap_or(samples);
        let level = 1000 + (self.ticks % 8) as i16 * 500;
        let buf: Vec<i16> = (0..count)
            .map(|_| {
                let high = self.phase < TONE_PERIOD / 2;
                self.phase = (self.phase + 1) % TONE_PERIOD;
                if high {
                    level
                } else {
                    -level
                }
            })
            .collect();
        self.last_accepted = host.audio().write(&buf);
    }

    fn state_size(&self) -> usize {
        match &self.started {
            Some(config) => Self::state_size_for(config.ram_pages, config.vram_pages),
            None => 0,
        }
    }

    fn save_state(&self, out: &mut [u8]) -> Result<usize, EngineError> {
        let size = self.state_size();
        if out.len() < size {
            return Err(EngineError::ShortBuffer {
                required: size,
                provided: out.len(),
            });
        }

        let mut at = 0;
        put(out, &mut at, *STATE_MAGIC);
        put(out, &mut at, self.mode_bits().to_le_bytes());
        put(out, &mut at, self.ticks.to_le_bytes());
        put(out, &mut at, self.frames_run.to_le_bytes());
        put(out, &mut at, self.x.to_le_bytes());
        put(out, &mut at, self.y.to_le_bytes());
        put(out, &mut at, self.phase.to_le_bytes());
        out[at..at + self.ram.len()].copy_from_slice(&self.ram);
        at += self.ram.len();
        out[at..at + self.vram.len()].copy_from_slice(&self.vram);
        at += self.vram.len();

        if self.short_write {
            return Ok(at - 1);
        }
        Ok(at)
    }

    fn load_state(&mut self, data: &[u8]) -> Result<(), EngineError> {
        let size = self.state_size();
        if data.len() != size {
            return Err(EngineError::SizeMismatch {
                expected: size,
                actual: data.len(),
            });
        }

        let mut at = 0;
        if &take::<8>(data, &mut at) != STATE_MAGIC {
            return Err(EngineError::InvalidState);
        }
        if u32::from_le_bytes(take(data, &mut at)) != self.mode_bits() {
            return Err(EngineError::InvalidState);
        }
        self.ticks = u64::from_le_bytes(take(data, &mut at));
        self.frames_run = u64::from_le_bytes(take(data, &mut at));
        self.x = i32::from_le_bytes(take(data, &mut at));
        self.y = i32::from_le_bytes(take(data, &mut at));
        self.phase = u32::from_le_bytes(take(data, &mut at));
        let ram_len = self.ram.len();
        self.ram.copy_from_slice(&data[at..at + ram_len]);
        at += ram_len;
        let vram_len = self.vram.len();
        self.vram.copy_from_slice(&data[at..at + vram_len]);
        Ok(())
    }

    fn shutdown(&mut self) {
        self.shut_down = true;
        self.ram.clear();
        self.vram.clear();
    }
}
