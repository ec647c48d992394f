//! Wireless-charge control service: a five-state charging control loop that reads
//! battery and skin-temperature telemetry, selects a charging-curve row from a
//! configured profile table, and drives a linear buck converter or charge-pump
//! handshake through a board-supplied [`hardware::HardwareIo`] implementation.
//!
//! No concrete hardware driver, telemetry transport or power-management API is
//! shipped here; a board support crate supplies [`hardware::HardwareIo`],
//! [`telemetry::TelemetrySource`] and [`telemetry::PowerLock`] and drives
//! [`task::run`] from its own executor.

#![no_std]
#![warn(missing_docs)]

pub mod algorithm;
pub mod config;
pub mod context;
pub mod hardware;
pub mod plot;
pub mod profile;
pub mod task;
pub mod telemetry;

pub use charger_control_interface::{AdapterType, BatterySample, ChargerStatus, ChipIndex, Event, SkinSample};
pub use config::{ChargerDesc, ConfigError, MAX_CHIPS};
pub use context::{ChargerManager, ControlState, StateMachineError};
pub use hardware::{HardwareError, HardwareIo};
pub use plot::{Hysteresis, NoVtermData, PlotSelector};
pub use profile::{BatteryDefaultParameter, ProfileRow, ProfileTable, TempVTerm, VtermBand};
pub use task::{CommandQueue, COMMAND_QUEUE_DEPTH};
pub use telemetry::{PowerLock, TelemetrySource};
