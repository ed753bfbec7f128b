//! Frame Driver
//!
//! [`Emu`] owns one session: the engine, the host, the frame buffer, the
//! palette, this frame's input and the audio batcher. The host calls
//! [`Emu::run_frame`] once per display refresh; a frame always runs to the end
//! before control returns:
//!
//! 1. re-resolve configuration if the host reports a change
//! 2. poll host input
//! 3. rebuild keyboard matrix and joystick lines
//! 4. engine executes until the renderer completes a frame, then synthesizes
//!    one frame of audio (timed by the performance probe)
//! 5. audio reaches the host through the batcher as the engine writes it
//! 6. the frame buffer is handed to the host

use std::path::Path;

use crate::audio::{AudioBatcher, AudioSink, AudioStats, BatchingSink, SAMPLE_RATE};
use crate::config::{resolve, MachineMode};
use crate::engine::{Engine, EngineConfig, EngineHost};
use crate::error::{Error, Result};
use crate::host::{Host, LogLevel, PixelFormat};
use crate::input::{InputMapper, InputState, Joystick, KeyMatrix};
use crate::perf::PerfProbe;
use crate::video::{Palette, PixelLayout, VideoFrame};

/// Frames per second reported to the host.
pub const FRAME_RATE: u32 = 60;

/// Mono samples the engine synthesizes per frame.
pub const SAMPLES_PER_FRAME: usize = (SAMPLE_RATE / FRAME_RATE) as usize;

/// Adapter state lent to the engine for one call.
struct FrameContext<'a, H: Host + ?Sized> {
    palette: &'a mut Palette,
    frame: &'a mut VideoFrame,
    input: &'a InputState,
    exit: bool,
    sink: BatchingSink<'a, H>,
}

impl<'a, H: Host + ?Sized> FrameContext<'a, H> {
    fn new(
        palette: &'a mut Palette,
        frame: &'a mut VideoFrame,
        input: &'a InputState,
        batcher: &'a mut AudioBatcher,
        host: &'a mut H,
    ) -> Self {
        Self {
            palette,
            frame,
            input,
            exit: false,
            sink: BatchingSink::new(batcher, host),
        }
    }
}

impl<H: Host + ?Sized> EngineHost for FrameContext<'_, H> {
    fn set_color(&mut self, index: u8, r: u8, g: u8, b: u8) {
        self.palette.set(index, r, g, b);
    }

    fn palette(&self) -> &Palette {
        &*self.palette
    }

    fn frame(&mut self) -> &mut VideoFrame {
        &mut *self.frame
    }

    fn keys(&self) -> &KeyMatrix {
        &self.input.keys
    }

    fn joystick(&self) -> Joystick {
        self.input.joystick
    }

    fn frame_complete(&mut self) {
        self.exit = true;
    }

    fn exit_requested(&self) -> bool {
        self.exit
    }

    fn audio(&mut self) -> &mut dyn AudioSink {
        &mut self.sink
    }
}

/// One emulation session driven by a plugin host.
pub struct Emu<E, H> {
    engine: E,
    host: H,
    mapper: InputMapper,
    /// Input applied to the current/last frame
    input: InputState,
    frame: VideoFrame,
    palette: Palette,
    batcher: AudioBatcher,
    perf: PerfProbe,
    /// Most recently resolved mode; the engine picks it up on reset
    mode: MachineMode,
    /// Set while a cartridge is loaded
    config: Option<EngineConfig>,
    frames: u64,
}

impl<E: Engine, H: Host> Emu<E, H> {
    /// Create an idle session. Nothing runs until [`load`](Self::load).
    pub fn new(engine: E, host: H) -> Self {
        Self {
            engine,
            host,
            mapper: InputMapper::default(),
            input: InputState::default(),
            frame: VideoFrame::default(),
            palette: Palette::new(PixelLayout::default()),
            batcher: AudioBatcher::new(),
            perf: PerfProbe::new(),
            mode: MachineMode::default(),
            config: None,
            frames: 0,
        }
    }

    /// Negotiate the pixel format, resolve options and power on the engine
    /// with `cartridge`. A cartridge already running is unloaded first.
    pub fn load(&mut self, cartridge: &Path) -> Result<()> {
        self.unload();
        if !self.host.set_pixel_format(PixelFormat::Rgb565) {
            self.host.log(LogLevel::Error, "RGB565 is not supported.");
            return Err(Error::UnsupportedPixelFormat);
        }

        let system_dir = self.host.system_directory();
        self.mode = resolve(&self.host);
        self.palette.clear();
        self.frame.clear();
        self.input = InputState::default();
        self.batcher.reset_stats();

        let config = EngineConfig::new(self.mode, cartridge.to_path_buf(), system_dir);
        let started = {
            let mut ctx = FrameContext::new(
                &mut self.palette,
                &mut self.frame,
                &self.input,
                &mut self.batcher,
                &mut self.host,
            );
            // Return as soon as initialization is done
            ctx.exit = true;
            self.engine.start(&config, &mut ctx)
        };
        if let Err(err) = started {
            self.host.log(
                LogLevel::Error,
                &format!("failed to start {}: {err}", cartridge.display()),
            );
            return Err(err.into());
        }

        self.host.log(
            LogLevel::Info,
            &format!(
                "loaded {}: mode {}, RAM pages {}, VRAM pages {}",
                cartridge.display(),
                config.mode,
                config.ram_pages,
                config.vram_pages
            ),
        );
        self.config = Some(config);
        self.frames = 0;
        Ok(())
    }

    /// Hard reset, applying the most recently resolved mode.
    pub fn reset(&mut self) -> Result<()> {
        let Some(config) = self.config.as_mut() else {
            return Err(Error::NotLoaded);
        };
        config.mode = self.mode;
        let config = config.clone();

        self.host
            .log(LogLevel::Info, &format!("reset: mode {}", config.mode));
        let mut ctx = FrameContext::new(
            &mut self.palette,
            &mut self.frame,
            &self.input,
            &mut self.batcher,
            &mut self.host,
        );
        ctx.exit = true;
        self.engine.reset(&config, &mut ctx)?;
        Ok(())
    }

    /// Re-resolve host options from scratch.
    pub fn refresh_config(&mut self) {
        let mode = resolve(&self.host);
        if mode != self.mode {
            self.host.log(
                LogLevel::Info,
                &format!("options changed: mode {mode} takes effect on next reset"),
            );
        }
        self.mode = mode;
    }

    /// Run exactly one frame and deliver its audio and video.
    /// Does nothing while no cartridge is loaded.
    pub fn run_frame(&mut self) {
        if self.config.is_none() {
            return;
        }

        if self.host.variables_updated() {
            self.refresh_config();
        }

        self.host.poll_input();
        self.input = self.mapper.map(&self.host);

        self.perf.start(self.host.perf());
        let completed = {
            let mut ctx = FrameContext::new(
                &mut self.palette,
                &mut self.frame,
                &self.input,
                &mut self.batcher,
                &mut self.host,
            );
            self.engine.run_frame(&mut ctx);
            let completed = ctx.exit_requested();
            self.engine.render_audio(SAMPLES_PER_FRAME, &mut ctx);
            completed
        };
        self.perf.stop(self.host.perf());

        if !completed {
            self.host.log(
                LogLevel::Warn,
                &format!("frame {}: engine returned without completing a frame", self.frames),
            );
        }

        self.host.present_video(
            self.frame.pixels(),
            self.frame.width() as u32,
            self.frame.height() as u32,
            self.frame.pitch(),
        );
        self.frames += 1;
    }

    /// Release the cartridge. The session can load again afterwards.
    pub fn unload(&mut self) {
        if self.config.take().is_none() {
            return;
        }
        self.engine.shutdown();

        let stats = self.batcher.stats();
        if stats.frames_dropped > 0 || stats.frames_rejected > 0 {
            self.host.log(
                LogLevel::Warn,
                &format!(
                    "audio: {} frames dropped by chunk limit, {} refused by host over {} batches",
                    stats.frames_dropped, stats.frames_rejected, stats.batches
                ),
            );
        }
        self.host.log(
            LogLevel::Info,
            &format!("unloaded after {} frames", self.frames),
        );
    }

    /// End of process: unload, print host counters and the worst frame cost.
    pub fn shutdown(&mut self) {
        self.unload();
        self.perf.report(self.host.perf());
        self.host.log(
            LogLevel::Info,
            &format!("maximum frame ticks : {}", self.perf.max_frame_ticks()),
        );
    }

    pub fn is_loaded(&self) -> bool {
        self.config.is_some()
    }

    pub fn mode(&self) -> MachineMode {
        self.mode
    }

    /// Configuration the engine is currently running with.
    pub fn engine_config(&self) -> Option<&EngineConfig> {
        self.config.as_ref()
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn frame(&self) -> &VideoFrame {
        &self.frame
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn audio_stats(&self) -> AudioStats {
        self.batcher.stats()
    }

    pub fn max_frame_ticks(&self) -> u64 {
        self.perf.max_frame_ticks()
    }

    /// Frames run since load.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub(crate) fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Generation, OPT_MODE, OPT_VIDEO_MODE};
    use crate::test_support::{FakeEngine, FakeHost, HostEvent};

    fn loaded() -> Emu<FakeEngine, FakeHost> {
        let mut emu = Emu::new(FakeEngine::default(), FakeHost::default());
        emu.load(Path::new("game.rom")).unwrap();
        emu
    }

    #[test]
    fn test_samples_per_frame() {
        assert_eq!(SAMPLES_PER_FRAME, 800);
    }

    #[test]
    fn test_run_before_load_does_nothing() {
        let mut emu = Emu::new(FakeEngine::default(), FakeHost::default());
        emu.run_frame();
        assert!(emu.host().events.is_empty());
        assert_eq!(emu.engine().frames_run, 0);
        assert_eq!(emu.reset(), Err(Error::NotLoaded));
    }

    #[test]
    fn test_load_rejected_pixel_format() {
        let mut host = FakeHost::default();
        host.accept_rgb565 = false;
        let mut emu = Emu::new(FakeEngine::default(), host);
        assert_eq!(emu.load(Path::new("game.rom")), Err(Error::UnsupportedPixelFormat));
        assert!(!emu.is_loaded());
        assert!(emu.engine().started.is_none());
        assert!(emu.host().logged(LogLevel::Error, "RGB565"));
    }

    #[test]
    fn test_load_failure_from_engine() {
        let mut engine = FakeEngine::default();
        engine.fail_start = true;
        let mut emu = Emu::new(engine, FakeHost::default());
        assert!(matches!(emu.load(Path::new("missing.rom")), Err(Error::Engine(_))));
        assert!(!emu.is_loaded());
    }

    #[test]
    fn test_load_passes_session_parameters() {
        let mut host = FakeHost::default();
        host.system_dir = Some("/bios".into());
        host.set_option(OPT_MODE, "MSX2");
        let mut emu = Emu::new(FakeEngine::default(), host);
        emu.load(Path::new("/roms/nemesis.rom")).unwrap();

        let config = emu.engine().started.clone().unwrap();
        assert_eq!(config.cartridge, Path::new("/roms/nemesis.rom"));
        assert_eq!(config.system_dir.as_deref(), Some(Path::new("/bios")));
        assert_eq!(config.mode.generation, Generation::Msx2);
        assert_eq!(config.ram_pages, 4);
        assert_eq!(config.vram_pages, 2);
        assert!(emu.engine().exit_seen_at_start);
        assert!(emu.host().logged(LogLevel::Info, "loaded /roms/nemesis.rom"));
    }

    #[test]
    fn test_engine_palette_writes_reach_session() {
        let emu = loaded();
        // FakeEngine programs the 16 TMS9918 colors on start
        assert_eq!(emu.palette().color(15), PixelLayout::Rgb565.encode(255, 255, 255));
        assert_eq!(emu.palette().background(), 0);
    }

    #[test]
    fn test_frame_sequence() {
        let mut emu = loaded();
        emu.run_frame();
        assert_eq!(
            emu.host().events,
            vec![
                HostEvent::VariablesChecked,
                HostEvent::Poll,
                HostEvent::Audio(SAMPLES_PER_FRAME),
                HostEvent::Video,
            ]
        );
        assert_eq!(emu.engine().frames_run, 1);
        assert_eq!(emu.frame_count(), 1);
    }

    #[test]
    fn test_video_uses_logical_geometry() {
        let mut emu = loaded();
        emu.run_frame();
        let video = &emu.host().videos[0];
        assert_eq!((video.width, video.height), (272, 228));
        assert_eq!(video.pitch, 544);
        assert_eq!(video.pixels.len(), 272 * 228);
    }

    #[test]
    fn test_option_change_applies_on_reset() {
        let mut emu = loaded();
        emu.host_mut().set_option(OPT_VIDEO_MODE, "PAL");
        emu.host_mut().updated = true;
        emu.run_frame();

        assert_eq!(emu.mode().video, crate::config::VideoStandard::Pal);
        assert!(emu.host().logged(LogLevel::Info, "next reset"));
        assert_eq!(
            emu.engine_config().unwrap().mode.video,
            crate::config::VideoStandard::Ntsc
        );

        emu.reset().unwrap();
        assert_eq!(emu.engine_config().unwrap().mode, emu.mode());
        assert_eq!(emu.engine().resets, 1);
        assert_eq!(emu.engine().started.as_ref().unwrap().mode, emu.mode());
    }

    #[test]
    fn test_incomplete_frame_is_logged() {
        let mut emu = loaded();
        emu.engine_mut().skip_frame_complete = true;
        emu.run_frame();
        assert!(emu.host().logged(LogLevel::Warn, "without completing"));
        // Still exactly one delivery of each kind
        assert_eq!(emu.host().videos.len(), 1);
        assert_eq!(emu.host().audio.len(), 1);
    }

    #[test]
    fn test_load_replaces_running_cartridge() {
        let mut emu = loaded();
        emu.run_frame();
        emu.load(Path::new("second.rom")).unwrap();

        assert!(emu.engine().shut_down);
        assert!(emu.host().logged(LogLevel::Info, "unloaded after 1 frames"));
        assert_eq!(emu.engine_config().unwrap().cartridge, Path::new("second.rom"));
        assert_eq!(emu.frame_count(), 0);
    }

    #[test]
    fn test_unload_and_shutdown() {
        let mut emu = loaded();
        emu.run_frame();
        emu.unload();
        assert!(!emu.is_loaded());
        assert!(emu.engine().shut_down);
        emu.run_frame();
        assert_eq!(emu.host().videos.len(), 1);

        emu.shutdown();
        assert!(emu.host().logged(LogLevel::Info, "maximum frame ticks : 0"));
    }
}
