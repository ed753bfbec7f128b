//! fMSX libretro Frame Adapter
//!
//! This crate lets an MSX emulation engine run as a libretro core. It owns the
//! per-frame loop: it translates host input into the MSX keyboard matrix and
//! joystick lines, resolves machine configuration from host options, hands the
//! rendered frame to the host, turns the engine's mono samples into stereo
//! batches and passes save states through.
//!
//! # Architecture
//!
//! - `ffi`: the slice of the libretro C ABI this core uses
//! - `host`: host capability traits (`Host`, `LogSink`, `PerfInterface`)
//! - `retro`: `Host` implemented over libretro callbacks, plus `SyncCore`
//! - `input`: Input Mapper (keyboard matrix, joystick lines)
//! - `config`: Configuration Resolver and the option table
//! - `video`: frame buffer, palette, RGB565 encoding
//! - `audio`: Audio Batcher and the engine-facing `AudioSink`
//! - `engine`: the `Engine` boundary the emulator implements
//! - `emu`: Frame Driver, one session
//! - `snapshot`: save-state pass-through
//! - `perf`: frame timing through host performance counters
//!
//! # Frame pipeline
//!
//! ```text
//! options ─► config ─► EngineConfig ─► Engine::start / reset
//! host input ─► input ─► KeyMatrix + Joystick ─┐
//!                                              ▼
//!                              Engine::run_frame ─► VideoFrame ─► host video
//!                              Engine::render_audio ─► AudioBatcher ─► host audio
//! ```
//!
//! The engine itself is not part of this crate. A binding crate implements
//! [`Engine`] for it and calls [`export_libretro_core!`] once to emit every
//! `retro_*` entry point.

pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod ffi;
pub mod host;
pub mod input;
pub mod perf;
pub mod retro;
pub mod video;
mod emu;
mod snapshot;

#[cfg(test)]
mod test_support;



pub use audio::{AudioSink, AudioStats, BatchReport};
pub use config::MachineMode;
pub use emu::{Emu, FRAME_RATE, SAMPLES_PER_FRAME};
pub use engine::{Engine, EngineConfig, EngineError, EngineHost};
pub use error::{Error, Result};
pub use host::{Host, LogLevel};
pub use input::{InputState, Joystick, KeyMatrix, MsxKey};
pub use retro::{RetroHost, SyncCore};
pub use video::{Palette, VideoFrame};

/// Emit the libretro C entry points for an engine type.
///
/// The engine must implement [`Engine`], `Default` and `Send`. Invoke once,
/// in the crate that builds the `cdylib`:
///
/// ```ignore
/// fmsx_retro::export_libretro_core!(my_engine::Fmsx);
/// ```
///
/// All entry points share one [`SyncCore`]. Null pointers from the frontend
/// are tolerated everywhere; failures come back as `false`, `0` or null.
#[macro_export]
macro_rules! export_libretro_core {
    ($engine:ty) => {
        const _: () = {
            use ::std::os::raw::{c_uint, c_void};
            use ::std::ptr;

            use $crate::ffi::*;
            use $crate::retro::{self, SyncCore};

            static CORE: SyncCore<$engine> = SyncCore::new();

            #[no_mangle]
            pub extern "C" fn retro_api_version() -> c_uint {
                RETRO_API_VERSION
            }

            /// Also announces controllers, options and the pad layout.
            #[no_mangle]
            pub extern "C" fn retro_set_environment(cb: Option<EnvironmentFn>) {
                CORE.set_environment(cb);
            }

            #[no_mangle]
            pub extern "C" fn retro_set_video_refresh(cb: Option<VideoRefreshFn>) {
                CORE.set_video_refresh(cb);
            }

            /// Single-sample audio is never used; batches only.
            #[no_mangle]
            pub extern "C" fn retro_set_audio_sample(_cb: Option<AudioSampleFn>) {}

            #[no_mangle]
            pub extern "C" fn retro_set_audio_sample_batch(cb: Option<AudioSampleBatchFn>) {
                CORE.set_audio_sample_batch(cb);
            }

            #[no_mangle]
            pub extern "C" fn retro_set_input_poll(cb: Option<InputPollFn>) {
                CORE.set_input_poll(cb);
            }

            #[no_mangle]
            pub extern "C" fn retro_set_input_state(cb: Option<InputStateFn>) {
                CORE.set_input_state(cb);
            }

            #[no_mangle]
            pub extern "C" fn retro_init() {
                CORE.init();
            }

            /// Prints host counters and the worst frame cost.
            #[no_mangle]
            pub extern "C" fn retro_deinit() {
                CORE.deinit();
            }

            #[no_mangle]
            pub extern "C" fn retro_get_system_info(info: *mut SystemInfo) {
                unsafe { retro::system_info(info) };
            }

            #[no_mangle]
            pub extern "C" fn retro_get_system_av_info(info: *mut SystemAvInfo) {
                unsafe { CORE.av_info(info) };
            }

            /// Both ports always read keyboard and joypad; nothing to switch.
            #[no_mangle]
            pub extern "C" fn retro_set_controller_port_device(_port: c_uint, _device: c_uint) {}

            #[no_mangle]
            pub extern "C" fn retro_reset() {
                CORE.reset();
            }

            #[no_mangle]
            pub extern "C" fn retro_run() {
                CORE.run();
            }

            #[no_mangle]
            pub extern "C" fn retro_serialize_size() -> usize {
                CORE.serialize_size()
            }

            #[no_mangle]
            pub extern "C" fn retro_serialize(data: *mut c_void, size: usize) -> bool {
                unsafe { CORE.serialize(data, size) }
            }

            #[no_mangle]
            pub extern "C" fn retro_unserialize(data: *const c_void, size: usize) -> bool {
                unsafe { CORE.unserialize(data, size) }
            }

            #[no_mangle]
            pub extern "C" fn retro_cheat_reset() {}

            #[no_mangle]
            pub extern "C" fn retro_cheat_set(
                _index: c_uint,
                _enabled: bool,
                _code: *const ::std::os::raw::c_char,
            ) {
            }

            /// Content is always loaded from its path.
            #[no_mangle]
            pub extern "C" fn retro_load_game(info: *const GameInfo) -> bool {
                unsafe { CORE.load_game(info) }
            }

            #[no_mangle]
            pub extern "C" fn retro_load_game_special(
                _game_type: c_uint,
                _info: *const GameInfo,
                _num_info: usize,
            ) -> bool {
                false
            }

            #[no_mangle]
            pub extern "C" fn retro_unload_game() {
                CORE.unload_game();
            }

            #[no_mangle]
            pub extern "C" fn retro_get_region() -> c_uint {
                RETRO_REGION_NTSC
            }

            #[no_mangle]
            pub extern "C" fn retro_get_memory_data(_id: c_uint) -> *mut c_void {
                ptr::null_mut()
            }

            #[no_mangle]
            pub extern "C" fn retro_get_memory_size(_id: c_uint) -> usize {
                0
            }
        };
    };
}
