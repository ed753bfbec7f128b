//! libretro frontend binding
//!
//! [`RetroHost`] implements the host capability traits on top of the callback
//! pointers a libretro frontend registers. [`SyncCore`] holds those callbacks
//! and the single session behind mutexes; `export_libretro_core!` puts one in
//! a static and forwards every `retro_*` entry point to it.
//!
//! libretro calls a core from one thread at a time. The mutexes only make the
//! statics sound; they are never contended.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_uint, c_void};
use std::path::PathBuf;
use std::ptr;
use std::slice;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::audio::SAMPLE_RATE;
use crate::config::OPTIONS;
use crate::emu::{Emu, FRAME_RATE};
use crate::engine::Engine;
use crate::ffi::*;
use crate::host::{
    AudioOutput, CounterId, Host, InputQuery, InputSource, LogLevel, LogSink, OptionSource,
    PerfInterface, PixelFormat,
};
use crate::video::{MAX_HEIGHT, MAX_WIDTH, SCREEN_HEIGHT, SCREEN_WIDTH};

/// Callback pointers registered through the `retro_set_*` functions.
#[derive(Debug, Clone, Copy)]
pub struct Callbacks {
    pub environment: Option<EnvironmentFn>,
    pub video_refresh: Option<VideoRefreshFn>,
    pub input_poll: Option<InputPollFn>,
    pub input_state: Option<InputStateFn>,
    pub audio_batch: Option<AudioSampleBatchFn>,
}

impl Callbacks {
    pub const EMPTY: Callbacks = Callbacks {
        environment: None,
        video_refresh: None,
        input_poll: None,
        input_state: None,
        audio_batch: None,
    };

    fn environment(&self, cmd: c_uint, data: *mut c_void) -> bool {
        match self.environment {
            Some(env) => unsafe { env(cmd, data) },
            None => false,
        }
    }
}

impl Default for Callbacks {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Frontend `printf`-style logger.
struct RetroLog {
    printf: LogPrintfFn,
}

impl LogSink for RetroLog {
    fn write(&self, level: LogLevel, message: &str) {
        let level = match level {
            LogLevel::Debug => RETRO_LOG_DEBUG,
            LogLevel::Info => RETRO_LOG_INFO,
            LogLevel::Warn => RETRO_LOG_WARN,
            LogLevel::Error => RETRO_LOG_ERROR,
        };
        let Ok(message) = CString::new(message.replace('\0', "")) else {
            return;
        };
        static FORMAT: &[u8] = b"%s\n\0";
        unsafe { (self.printf)(level, FORMAT.as_ptr() as *const c_char, message.as_ptr()) };
    }
}

/// Frontend performance counters.
///
/// Counters are boxed because the frontend keeps pointers to them after
/// registration. Each name is kept next to the counter that points at it.
struct RetroPerf {
    callback: PerfCallback,
    counters: Vec<(Box<PerfCounterRaw>, CString)>,
}

// SAFETY: the raw pointers only reference the boxed counters and names owned
// by this struct, and libretro never calls into a core concurrently.
unsafe impl Send for RetroPerf {}

impl RetroPerf {
    fn counter(&mut self, id: CounterId) -> Option<*mut PerfCounterRaw> {
        self.counters
            .get_mut(id.0)
            .map(|(counter, _)| &mut **counter as *mut PerfCounterRaw)
    }
}

impl PerfInterface for RetroPerf {
    fn register(&mut self, name: &'static str) -> CounterId {
        let name = CString::new(name).unwrap_or_default();
        let mut counter = Box::new(PerfCounterRaw {
            ident: name.as_ptr(),
            start: 0,
            total: 0,
            call_cnt: 0,
            registered: false,
        });
        if let Some(register) = self.callback.perf_register {
            unsafe { register(&mut *counter) };
        }
        self.counters.push((counter, name));
        CounterId(self.counters.len() - 1)
    }

    fn start(&mut self, id: CounterId) {
        if let (Some(start), Some(counter)) = (self.callback.perf_start, self.counter(id)) {
            unsafe { start(counter) };
        }
    }

    fn stop(&mut self, id: CounterId) {
        if let (Some(stop), Some(counter)) = (self.callback.perf_stop, self.counter(id)) {
            unsafe { stop(counter) };
        }
    }

    fn total(&self, id: CounterId) -> u64 {
        self.counters.get(id.0).map_or(0, |(counter, _)| counter.total)
    }

    fn log(&mut self) {
        if let Some(log) = self.callback.perf_log {
            unsafe { log() };
        }
    }
}

/// [`Host`] backed by libretro callbacks.
pub struct RetroHost {
    callbacks: Callbacks,
    log: Option<RetroLog>,
    perf: Option<RetroPerf>,
}

impl RetroHost {
    /// Bind to the frontend, picking up its log and performance interfaces
    /// if it offers them.
    pub fn new(callbacks: Callbacks) -> Self {
        let mut log = LogCallback { log: None };
        let log = if callbacks.environment(
            RETRO_ENVIRONMENT_GET_LOG_INTERFACE,
            &mut log as *mut LogCallback as *mut c_void,
        ) {
            log.log.map(|printf| RetroLog { printf })
        } else {
            None
        };

        let mut callback = PerfCallback::default();
        let perf = if callbacks.environment(
            RETRO_ENVIRONMENT_GET_PERF_INTERFACE,
            &mut callback as *mut PerfCallback as *mut c_void,
        ) && callback.perf_register.is_some()
        {
            Some(RetroPerf {
                callback,
                counters: Vec::new(),
            })
        } else {
            None
        };

        Self {
            callbacks,
            log,
            perf,
        }
    }

    /// Pick up callbacks the frontend registered after the session started.
    pub fn set_callbacks(&mut self, callbacks: Callbacks) {
        self.callbacks = callbacks;
    }
}

impl InputQuery for RetroHost {
    fn is_pressed(&self, source: InputSource) -> bool {
        let Some(input_state) = self.callbacks.input_state else {
            return false;
        };
        let state = match source {
            InputSource::Key(code) => unsafe { input_state(0, RETRO_DEVICE_KEYBOARD, 0, code) },
            InputSource::Joypad { port, button } => unsafe {
                input_state(port, RETRO_DEVICE_JOYPAD, 0, button)
            },
        };
        state != 0
    }
}

impl OptionSource for RetroHost {
    fn variable(&self, key: &str) -> Option<String> {
        let key = CString::new(key).ok()?;
        let mut var = Variable {
            key: key.as_ptr(),
            value: ptr::null(),
        };
        if !self
            .callbacks
            .environment(RETRO_ENVIRONMENT_GET_VARIABLE, &mut var as *mut Variable as *mut c_void)
            || var.value.is_null()
        {
            return None;
        }
        let value = unsafe { CStr::from_ptr(var.value) };
        Some(value.to_string_lossy().into_owned())
    }
}

impl AudioOutput for RetroHost {
    fn submit_audio(&mut self, frames: &[i16]) -> usize {
        match self.callbacks.audio_batch {
            Some(batch) => unsafe { batch(frames.as_ptr(), frames.len() / 2) },
            None => 0,
        }
    }
}

impl Host for RetroHost {
    fn set_pixel_format(&mut self, format: PixelFormat) -> bool {
        let mut format: c_int = match format {
            PixelFormat::Rgb565 => RETRO_PIXEL_FORMAT_RGB565,
        };
        self.callbacks.environment(
            RETRO_ENVIRONMENT_SET_PIXEL_FORMAT,
            &mut format as *mut c_int as *mut c_void,
        )
    }

    fn system_directory(&self) -> Option<PathBuf> {
        let mut dir: *const c_char = ptr::null();
        if !self.callbacks.environment(
            RETRO_ENVIRONMENT_GET_SYSTEM_DIRECTORY,
            &mut dir as *mut *const c_char as *mut c_void,
        ) || dir.is_null()
        {
            return None;
        }
        let dir = unsafe { CStr::from_ptr(dir) };
        Some(PathBuf::from(dir.to_string_lossy().into_owned()))
    }

    fn variables_updated(&mut self) -> bool {
        let mut updated = false;
        self.callbacks.environment(
            RETRO_ENVIRONMENT_GET_VARIABLE_UPDATE,
            &mut updated as *mut bool as *mut c_void,
        ) && updated
    }

    fn poll_input(&mut self) {
        if let Some(poll) = self.callbacks.input_poll {
            unsafe { poll() };
        }
    }

    fn present_video(&mut self, pixels: &[u16], width: u32, height: u32, pitch: usize) {
        if let Some(refresh) = self.callbacks.video_refresh {
            unsafe { refresh(pixels.as_ptr() as *const c_void, width, height, pitch) };
        }
    }

    fn log_sink(&self) -> Option<&dyn LogSink> {
        self.log.as_ref().map(|log| log as &dyn LogSink)
    }

    fn perf(&mut self) -> Option<&mut dyn PerfInterface> {
        self.perf.as_mut().map(|perf| perf as &mut dyn PerfInterface)
    }
}

/// Read-only table shared with the frontend.
#[repr(transparent)]
struct Shared<T>(T);

// SAFETY: only ever read, and everything it points to is 'static.
unsafe impl<T> Sync for Shared<T> {}

static PORT_TYPES: Shared<[ControllerDescription; 2]> = Shared([
    ControllerDescription {
        desc: b"RetroKeyboard\0".as_ptr() as *const c_char,
        id: RETRO_DEVICE_KEYBOARD,
    },
    ControllerDescription {
        desc: b"RetroPad\0".as_ptr() as *const c_char,
        id: RETRO_DEVICE_JOYPAD,
    },
]);

static PORTS: Shared<[ControllerInfo; 3]> = Shared([
    ControllerInfo {
        types: PORT_TYPES.0.as_ptr(),
        num_types: 2,
    },
    ControllerInfo {
        types: PORT_TYPES.0.as_ptr(),
        num_types: 2,
    },
    ControllerInfo {
        types: ptr::null(),
        num_types: 0,
    },
]);

/// Port 0 pad layout shown by the frontend.
const PAD_DESCRIPTORS: [(c_uint, &str); 12] = [
    (RETRO_DEVICE_ID_JOYPAD_LEFT, "Left"),
    (RETRO_DEVICE_ID_JOYPAD_UP, "Up"),
    (RETRO_DEVICE_ID_JOYPAD_DOWN, "Down"),
    (RETRO_DEVICE_ID_JOYPAD_RIGHT, "Right"),
    (RETRO_DEVICE_ID_JOYPAD_A, "Primary fire"),
    (RETRO_DEVICE_ID_JOYPAD_B, "Secondary fire"),
    (RETRO_DEVICE_ID_JOYPAD_X, "F1"),
    (RETRO_DEVICE_ID_JOYPAD_Y, "F2"),
    (RETRO_DEVICE_ID_JOYPAD_L, "F3"),
    (RETRO_DEVICE_ID_JOYPAD_R, "F4"),
    (RETRO_DEVICE_ID_JOYPAD_L2, "F5"),
    (RETRO_DEVICE_ID_JOYPAD_L3, "Spacebar"),
];

/// Tell a new environment callback about controllers, options and the pad
/// layout. The frontend copies everything but the static port table.
pub fn announce(env: EnvironmentFn) {
    let callbacks = Callbacks {
        environment: Some(env),
        ..Callbacks::EMPTY
    };

    callbacks.environment(
        RETRO_ENVIRONMENT_SET_CONTROLLER_INFO,
        PORTS.0.as_ptr() as *mut c_void,
    );

    let declarations: Vec<(CString, CString)> = OPTIONS
        .iter()
        .filter_map(|opt| Some((CString::new(opt.key).ok()?, CString::new(opt.declaration()).ok()?)))
        .collect();
    let mut vars: Vec<Variable> = declarations
        .iter()
        .map(|(key, value)| Variable {
            key: key.as_ptr(),
            value: value.as_ptr(),
        })
        .collect();
    vars.push(Variable {
        key: ptr::null(),
        value: ptr::null(),
    });
    callbacks.environment(
        RETRO_ENVIRONMENT_SET_VARIABLES,
        vars.as_mut_ptr() as *mut c_void,
    );

    let labels: Vec<CString> = PAD_DESCRIPTORS
        .iter()
        .filter_map(|&(_, label)| CString::new(label).ok())
        .collect();
    let mut descriptors: Vec<InputDescriptor> = PAD_DESCRIPTORS
        .iter()
        .zip(&labels)
        .map(|(&(id, _), label)| InputDescriptor {
            port: 0,
            device: RETRO_DEVICE_JOYPAD,
            index: 0,
            id,
            description: label.as_ptr(),
        })
        .collect();
    descriptors.push(InputDescriptor {
        port: 0,
        device: 0,
        index: 0,
        id: 0,
        description: ptr::null(),
    });
    callbacks.environment(
        RETRO_ENVIRONMENT_SET_INPUT_DESCRIPTORS,
        descriptors.as_mut_ptr() as *mut c_void,
    );
}

/// # Safety
/// `info` must be null or point to a writable `retro_system_info`.
pub unsafe fn system_info(info: *mut SystemInfo) {
    if info.is_null() {
        return;
    }
    *info = SystemInfo {
        library_name: b"fMSX\0".as_ptr() as *const c_char,
        library_version: b"3.9\0".as_ptr() as *const c_char,
        valid_extensions: b"rom|mx1|mx2\0".as_ptr() as *const c_char,
        need_fullpath: true,
        block_extract: false,
    };
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Thread-safe home for the frontend callbacks and the session.
/// Every `retro_*` entry point goes through one of these.
pub struct SyncCore<E> {
    callbacks: Mutex<Callbacks>,
    session: Mutex<Option<Emu<E, RetroHost>>>,
}

impl<E> SyncCore<E> {
    pub const fn new() -> Self {
        Self {
            callbacks: Mutex::new(Callbacks::EMPTY),
            session: Mutex::new(None),
        }
    }
}

impl<E: Engine + Default> SyncCore<E> {
    fn update_callbacks(&self, update: impl FnOnce(&mut Callbacks)) {
        let callbacks = {
            let mut callbacks = lock(&self.callbacks);
            update(&mut callbacks);
            *callbacks
        };
        if let Some(emu) = lock(&self.session).as_mut() {
            emu.host_mut().set_callbacks(callbacks);
        }
    }

    pub fn set_environment(&self, env: Option<EnvironmentFn>) {
        self.update_callbacks(|cbs| cbs.environment = env);
        if let Some(env) = env {
            announce(env);
        }
    }

    pub fn set_video_refresh(&self, cb: Option<VideoRefreshFn>) {
        self.update_callbacks(|cbs| cbs.video_refresh = cb);
    }

    pub fn set_input_poll(&self, cb: Option<InputPollFn>) {
        self.update_callbacks(|cbs| cbs.input_poll = cb);
    }

    pub fn set_input_state(&self, cb: Option<InputStateFn>) {
        self.update_callbacks(|cbs| cbs.input_state = cb);
    }

    pub fn set_audio_sample_batch(&self, cb: Option<AudioSampleBatchFn>) {
        self.update_callbacks(|cbs| cbs.audio_batch = cb);
    }

    /// Start a fresh session. A previous one is shut down first.
    pub fn init(&self) {
        let callbacks = *lock(&self.callbacks);
        let mut session = lock(&self.session);
        if let Some(mut old) = session.take() {
            old.shutdown();
        }
        *session = Some(Emu::new(E::default(), RetroHost::new(callbacks)));
    }

    pub fn deinit(&self) {
        if let Some(mut emu) = lock(&self.session).take() {
            emu.shutdown();
        }
    }

    #[cfg(test)]
    pub(crate) fn is_initialized(&self) -> bool {
        lock(&self.session).is_some()
    }

    /// # Safety
    /// `info` must be null or point to a valid `retro_game_info`.
    pub unsafe fn load_game(&self, info: *const GameInfo) -> bool {
        let mut session = lock(&self.session);
        let Some(emu) = session.as_mut() else {
            return false;
        };
        if info.is_null() || (*info).path.is_null() {
            emu.host().log(LogLevel::Error, "load_game: content path required");
            return false;
        }
        let path = CStr::from_ptr((*info).path).to_string_lossy().into_owned();
        emu.load(PathBuf::from(path).as_path()).is_ok()
    }

    pub fn unload_game(&self) {
        if let Some(emu) = lock(&self.session).as_mut() {
            emu.unload();
        }
    }

    pub fn reset(&self) {
        if let Some(emu) = lock(&self.session).as_mut() {
            // NotLoaded is the only failure and needs no report
            let _ = emu.reset();
        }
    }

    pub fn run(&self) {
        if let Some(emu) = lock(&self.session).as_mut() {
            emu.run_frame();
        }
    }

    pub fn serialize_size(&self) -> usize {
        lock(&self.session)
            .as_ref()
            .filter(|emu| emu.is_loaded())
            .map_or(0, |emu| emu.serialize_size())
    }

    /// # Safety
    /// `data` must be null or valid for writes of `size` bytes.
    pub unsafe fn serialize(&self, data: *mut c_void, size: usize) -> bool {
        if data.is_null() {
            return false;
        }
        let out = slice::from_raw_parts_mut(data as *mut u8, size);
        match lock(&self.session).as_mut() {
            Some(emu) => emu.serialize(out).is_ok(),
            None => false,
        }
    }

    /// # Safety
    /// `data` must be null or valid for reads of `size` bytes.
    pub unsafe fn unserialize(&self, data: *const c_void, size: usize) -> bool {
        if data.is_null() {
            return false;
        }
        let data = slice::from_raw_parts(data as *const u8, size);
        match lock(&self.session).as_mut() {
            Some(emu) => emu.unserialize(data).is_ok(),
            None => false,
        }
    }

    /// # Safety
    /// `info` must be null or point to a writable `retro_system_av_info`.
    pub unsafe fn av_info(&self, info: *mut SystemAvInfo) {
        if info.is_null() {
            return;
        }
        let (width, height) = lock(&self.session)
            .as_ref()
            .map_or((SCREEN_WIDTH, SCREEN_HEIGHT), |emu| {
                (emu.frame().width(), emu.frame().height())
            });
        *info = SystemAvInfo {
            geometry: GameGeometry {
                base_width: width as c_uint,
                base_height: height as c_uint,
                max_width: MAX_WIDTH as c_uint,
                max_height: MAX_HEIGHT as c_uint,
                aspect_ratio: 0.0,
            },
            timing: SystemTiming {
                fps: FRAME_RATE as f64,
                sample_rate: SAMPLE_RATE as f64,
            },
        };
    }
}

impl<E> Default for SyncCore<E> {
    fn default() -> Self {
        Self::new()
    }
}
