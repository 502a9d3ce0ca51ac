//! Device status watcher
//!
//! Reads a roster of devices from CSV, asks the io.solutions worker API for the
//! status of each one in turn, and alerts a Telegram chat when a device is not up.

pub mod config;
pub mod errors;
pub mod monitor;
pub mod notifier;
pub mod roster;
pub mod status;

pub use config::Config;
pub use errors::{CheckFailure, MonitorError, Result};
pub use monitor::{DeviceMonitor, RunSummary};
pub use notifier::{Notifier, TelegramNotifier};
pub use roster::DeviceRecord;
pub use status::{CheckOutcome, StatusChecker};
