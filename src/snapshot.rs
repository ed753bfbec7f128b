//! Snapshot Adapter
//!
//! Save states are opaque engine bytes. The adapter reports the engine's size,
//! checks the caller's buffer against it and passes the buffer through.
//! A snapshot only restores under the configuration (mode, RAM and VRAM
//! pages) it was taken with; that is the caller's responsibility.
//!
//! A failed restore leaves engine state unspecified. Nothing is rolled back.

use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::host::{Host, LogLevel};
use crate::Emu;

impl<E: Engine, H: Host> Emu<E, H> {
    /// Bytes needed to serialize the current session.
    pub fn serialize_size(&self) -> usize {
        self.engine().state_size()
    }

    /// Write the engine state into `out`, which must hold at least
    /// [`serialize_size`](Self::serialize_size) bytes.
    pub fn serialize(&mut self, out: &mut [u8]) -> Result<()> {
        if !self.is_loaded() {
            return Err(Error::NotLoaded);
        }

        let required = self.serialize_size();
        if out.len() < required {
            self.host().log(
                LogLevel::Warn,
                &format!("serialize: buffer holds {} of {required} bytes", out.len()),
            );
            return Err(Error::SnapshotTooSmall {
                required,
                provided: out.len(),
            });
        }

        let written = match self.engine().save_state(out) {
            Ok(written) => written,
            Err(err) => {
                self.host().log(LogLevel::Warn, &format!("serialize: {err}"));
                return Err(err.into());
            }
        };
        if written != required {
            self.host().log(
                LogLevel::Warn,
                &format!("serialize: engine wrote {written} of {required} bytes"),
            );
            return Err(Error::SnapshotShort {
                expected: required,
                written,
            });
        }
        Ok(())
    }

    /// Restore engine state from a buffer produced by [`serialize`](Self::serialize).
    pub fn unserialize(&mut self, data: &[u8]) -> Result<()> {
        if !self.is_loaded() {
            return Err(Error::NotLoaded);
        }

        if let Err(err) = self.engine_mut().load_state(data) {
            self.host()
                .log(LogLevel::Warn, &format!("unserialize {} bytes: {err}", data.len()));
            return Err(Error::SnapshotRejected(err));
        }
        Ok(())
    }
}
