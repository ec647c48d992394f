//! Telemetry intake and wakelock capability traits.
//!
//! The publish/subscribe transport that actually carries `battery_state` and
//! `device_temperature` samples, and the host power-management API backing
//! `PowerLock`, are both external collaborators. This crate only defines the
//! narrow capability it consumes.

use charger_control_interface::{BatterySample, SkinSample};

/// Source of battery and skin-temperature telemetry samples.
pub trait TelemetrySource {
    /// Waits for and returns the next battery telemetry sample.
    async fn next_battery_sample(&mut self) -> BatterySample;

    /// Waits for and returns the next skin-temperature telemetry sample.
    async fn next_skin_sample(&mut self) -> SkinSample;
}

/// Host wakelock capability.
///
/// `ChargerManager` calls `acquire`/`release` only on edges (tracked by its own
/// `pm_lock` flag), never on an already-held or already-released lock.
pub trait PowerLock {
    /// Acquires the wakelock.
    fn acquire(&mut self);

    /// Releases the wakelock.
    fn release(&mut self);
}
