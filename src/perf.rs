//! Performance Probe
//!
//! Times the engine's execute+render step with the host's performance
//! counters and keeps the worst frame seen. Observability only: every call is
//! a no-op when the host has no performance interface.

use crate::host::{CounterId, PerfInterface};

/// Counter name registered with the host.
pub const FRAME_COUNTER: &str = "core_retro_run";

#[derive(Debug, Default)]
pub struct PerfProbe {
    /// Registered lazily on first use
    counter: Option<CounterId>,
    /// Counter total when the current measurement started
    before: u64,
    max_frame_ticks: u64,
}

impl PerfProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, perf: Option<&mut dyn PerfInterface>) {
        let Some(perf) = perf else {
            return;
        };
        let id = match self.counter {
            Some(id) => id,
            None => {
                let id = perf.register(FRAME_COUNTER);
                self.counter = Some(id);
                id
            }
        };
        self.before = perf.total(id);
        perf.start(id);
    }

    pub fn stop(&mut self, perf: Option<&mut dyn PerfInterface>) {
        let (Some(perf), Some(id)) = (perf, self.counter) else {
            return;
        };
        perf.stop(id);
        let ticks = perf.total(id).saturating_sub(self.before);
        self.max_frame_ticks = self.max_frame_ticks.max(ticks);
    }

    /// Worst single-frame cost so far.
    pub fn max_frame_ticks(&self) -> u64 {
        self.max_frame_ticks
    }

    #[cfg(test)]
    pub(crate) fn is_registered(&self) -> bool {
        self.counter.is_some()
    }

    /// Have the host print its counters.
    pub fn report(&self, perf: Option<&mut dyn PerfInterface>) {
        if let Some(perf) = perf {
            perf.log();
        }
    }
}
