//! libretro C ABI
//!
//! Only the slice of `libretro.h` this core touches: callback signatures,
//! environment commands, device/button ids and the plain-data structs
//! exchanged with the frontend. Layouts must match the header exactly.

use std::os::raw::{c_char, c_int, c_uint, c_void};

pub const RETRO_API_VERSION: c_uint = 1;

// Devices
pub const RETRO_DEVICE_JOYPAD: c_uint = 1;
pub const RETRO_DEVICE_KEYBOARD: c_uint = 3;

// Joypad buttons
pub const RETRO_DEVICE_ID_JOYPAD_B: c_uint = 0;
pub const RETRO_DEVICE_ID_JOYPAD_Y: c_uint = 1;
pub const RETRO_DEVICE_ID_JOYPAD_SELECT: c_uint = 2;
pub const RETRO_DEVICE_ID_JOYPAD_START: c_uint = 3;
pub const RETRO_DEVICE_ID_JOYPAD_UP: c_uint = 4;
pub const RETRO_DEVICE_ID_JOYPAD_DOWN: c_uint = 5;
pub const RETRO_DEVICE_ID_JOYPAD_LEFT: c_uint = 6;
pub const RETRO_DEVICE_ID_JOYPAD_RIGHT: c_uint = 7;
pub const RETRO_DEVICE_ID_JOYPAD_A: c_uint = 8;
pub const RETRO_DEVICE_ID_JOYPAD_X: c_uint = 9;
pub const RETRO_DEVICE_ID_JOYPAD_L: c_uint = 10;
pub const RETRO_DEVICE_ID_JOYPAD_R: c_uint = 11;
pub const RETRO_DEVICE_ID_JOYPAD_L2: c_uint = 12;
pub const RETRO_DEVICE_ID_JOYPAD_R2: c_uint = 13;
pub const RETRO_DEVICE_ID_JOYPAD_L3: c_uint = 14;
pub const RETRO_DEVICE_ID_JOYPAD_R3: c_uint = 15;

// Keyboard (subset of enum retro_key)
pub const RETROK_BACKSPACE: c_uint = 8;
pub const RETROK_TAB: c_uint = 9;
pub const RETROK_RETURN: c_uint = 13;
pub const RETROK_PAUSE: c_uint = 19;
pub const RETROK_ESCAPE: c_uint = 27;
pub const RETROK_SPACE: c_uint = 32;
pub const RETROK_DELETE: c_uint = 127;
pub const RETROK_KP0: c_uint = 256;
pub const RETROK_KP1: c_uint = 257;
pub const RETROK_KP2: c_uint = 258;
pub const RETROK_KP3: c_uint = 259;
pub const RETROK_KP4: c_uint = 260;
pub const RETROK_KP5: c_uint = 261;
pub const RETROK_KP6: c_uint = 262;
pub const RETROK_KP7: c_uint = 263;
pub const RETROK_KP8: c_uint = 264;
pub const RETROK_KP9: c_uint = 265;
pub const RETROK_UP: c_uint = 273;
pub const RETROK_DOWN: c_uint = 274;
pub const RETROK_RIGHT: c_uint = 275;
pub const RETROK_LEFT: c_uint = 276;
pub const RETROK_INSERT: c_uint = 277;
pub const RETROK_HOME: c_uint = 278;
pub const RETROK_END: c_uint = 279;
pub const RETROK_PAGEUP: c_uint = 280;
pub const RETROK_F1: c_uint = 282;
pub const RETROK_F2: c_uint = 283;
pub const RETROK_F3: c_uint = 284;
pub const RETROK_F4: c_uint = 285;
pub const RETROK_F5: c_uint = 286;
pub const RETROK_CAPSLOCK: c_uint = 301;
pub const RETROK_RSHIFT: c_uint = 303;
pub const RETROK_LSHIFT: c_uint = 304;
pub const RETROK_RCTRL: c_uint = 305;
pub const RETROK_LCTRL: c_uint = 306;
pub const RETROK_RALT: c_uint = 307;
pub const RETROK_LALT: c_uint = 308;

pub const RETRO_REGION_NTSC: c_uint = 0;

// Environment commands
pub const RETRO_ENVIRONMENT_GET_SYSTEM_DIRECTORY: c_uint = 9;
pub const RETRO_ENVIRONMENT_SET_PIXEL_FORMAT: c_uint = 10;
pub const RETRO_ENVIRONMENT_SET_INPUT_DESCRIPTORS: c_uint = 11;
pub const RETRO_ENVIRONMENT_GET_VARIABLE: c_uint = 15;
pub const RETRO_ENVIRONMENT_SET_VARIABLES: c_uint = 16;
pub const RETRO_ENVIRONMENT_GET_VARIABLE_UPDATE: c_uint = 17;
pub const RETRO_ENVIRONMENT_GET_LOG_INTERFACE: c_uint = 27;
pub const RETRO_ENVIRONMENT_GET_PERF_INTERFACE: c_uint = 28;
pub const RETRO_ENVIRONMENT_SET_CONTROLLER_INFO: c_uint = 35;

// enum retro_pixel_format
pub const RETRO_PIXEL_FORMAT_RGB565: c_int = 2;

// enum retro_log_level
pub const RETRO_LOG_DEBUG: c_int = 0;
pub const RETRO_LOG_INFO: c_int = 1;
pub const RETRO_LOG_WARN: c_int = 2;
pub const RETRO_LOG_ERROR: c_int = 3;

pub type EnvironmentFn = unsafe extern "C" fn(cmd: c_uint, data: *mut c_void) -> bool;
pub type VideoRefreshFn =
    unsafe extern "C" fn(data: *const c_void, width: c_uint, height: c_uint, pitch: usize);
pub type AudioSampleFn = unsafe extern "C" fn(left: i16, right: i16);
pub type AudioSampleBatchFn = unsafe extern "C" fn(data: *const i16, frames: usize) -> usize;
pub type InputPollFn = unsafe extern "C" fn();
pub type InputStateFn =
    unsafe extern "C" fn(port: c_uint, device: c_uint, index: c_uint, id: c_uint) -> i16;
pub type LogPrintfFn = unsafe extern "C" fn(level: c_int, fmt: *const c_char, ...);

pub type PerfTick = u64;
pub type PerfRegisterFn = unsafe extern "C" fn(counter: *mut PerfCounterRaw);
pub type PerfStartFn = unsafe extern "C" fn(counter: *mut PerfCounterRaw);
pub type PerfStopFn = unsafe extern "C" fn(counter: *mut PerfCounterRaw);
pub type PerfLogFn = unsafe extern "C" fn();

#[repr(C)]
pub struct LogCallback {
    pub log: Option<LogPrintfFn>,
}

/// `struct retro_perf_counter`
#[repr(C)]
#[derive(Debug)]
pub struct PerfCounterRaw {
    pub ident: *const c_char,
    pub start: PerfTick,
    pub total: PerfTick,
    pub call_cnt: PerfTick,
    pub registered: bool,
}

/// `struct retro_perf_callback`
#[repr(C)]
#[derive(Default)]
pub struct PerfCallback {
    pub get_time_usec: Option<unsafe extern "C" fn() -> i64>,
    pub get_cpu_features: Option<unsafe extern "C" fn() -> u64>,
    pub get_perf_counter: Option<unsafe extern "C" fn() -> PerfTick>,
    pub perf_register: Option<PerfRegisterFn>,
    pub perf_start: Option<PerfStartFn>,
    pub perf_stop: Option<PerfStopFn>,
    pub perf_log: Option<PerfLogFn>,
}

#[repr(C)]
pub struct Variable {
    pub key: *const c_char,
    pub value: *const c_char,
}

#[repr(C)]
pub struct GameInfo {
    pub path: *const c_char,
    pub data: *const c_void,
    pub size: usize,
    pub meta: *const c_char,
}

#[repr(C)]
pub struct SystemInfo {
    pub library_name: *const c_char,
    pub library_version: *const c_char,
    pub valid_extensions: *const c_char,
    pub need_fullpath: bool,
    pub block_extract: bool,
}

#[repr(C)]
pub struct GameGeometry {
    pub base_width: c_uint,
    pub base_height: c_uint,
    pub max_width: c_uint,
    pub max_height: c_uint,
    pub aspect_ratio: f32,
}

#[repr(C)]
pub struct SystemTiming {
    pub fps: f64,
    pub sample_rate: f64,
}

#[repr(C)]
pub struct SystemAvInfo {
    pub geometry: GameGeometry,
    pub timing: SystemTiming,
}

#[repr(C)]
pub struct ControllerDescription {
    pub desc: *const c_char,
    pub id: c_uint,
}

#[repr(C)]
pub struct ControllerInfo {
    pub types: *const ControllerDescription,
    pub num_types: c_uint,
}

#[repr(C)]
pub struct InputDescriptor {
    pub port: c_uint,
    pub device: c_uint,
    pub index: c_uint,
    pub id: c_uint,
    pub description: *const c_char,
}
