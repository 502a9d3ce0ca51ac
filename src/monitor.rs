//! Run orchestration: roster, status checks, alerts

use crate::config::Config;
use crate::errors::{CheckFailure, MonitorError, Result};
use crate::notifier::{Notifier, deliver};
use crate::roster::{DeviceRecord, load_roster};
use crate::status::{CheckOutcome, StatusChecker};

use std::any::Any;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Checks every device in the roster, one at a time, alerting on anomalies
pub struct DeviceMonitor {
    config: Config,
    checker: StatusChecker,
    notifier: Arc<dyn Notifier>,
    run_id: String,
}

/// Counters for a single run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: String,
    pub devices_checked: usize,
    pub normal: usize,
    pub anomalous: usize,
    pub check_errors: usize,
    pub notifications_sent: usize,
    pub notification_failures: usize,
    pub roster_failed: bool,
}

impl RunSummary {
    fn record_delivery(&mut self, sent: bool) {
        if sent {
            self.notifications_sent += 1;
        } else {
            self.notification_failures += 1;
        }
    }
}

pub fn anomaly_message(device: &DeviceRecord, status: &str) -> String {
    format!(
        "Alert: Device \"{}\" (ID: {}) is not up. Current status: {}",
        device.work_name, device.device_id, status
    )
}

pub fn check_error_message(device: &DeviceRecord, err: &MonitorError) -> String {
    format!(
        "Error checking device {} ({}): {}",
        device.device_id, device.work_name, err
    )
}

pub fn roster_error_message(err: &MonitorError) -> String {
    format!("Error processing CSV: {}", err)
}

pub fn unhandled_error_message(err: &MonitorError) -> String {
    format!("Unhandled error in main execution: {}", err)
}

/// Wait for a spawned run; a panic or cancellation is reported as unhandled
///
/// The failure is logged and notified once, best-effort. Returns the run's
/// output when it finished normally.
pub async fn await_run<T>(run: JoinHandle<T>, notifier: &dyn Notifier) -> Option<T> {
    match run.await {
        Ok(output) => Some(output),
        Err(e) => {
            let detail = if e.is_panic() {
                panic_detail(e.into_panic())
            } else {
                e.to_string()
            };
            let message = unhandled_error_message(&MonitorError::Unhandled(detail));
            error!("{}", message);
            deliver(notifier, &message).await;
            None
        }
    }
}

fn panic_detail(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "task panicked".to_string()
    }
}

impl DeviceMonitor {
    /// Create a monitor that alerts through the given notifier
    pub fn new(config: Config, notifier: Arc<dyn Notifier>) -> Result<Self> {
        config.validate().map_err(MonitorError::Config)?;

        let checker = StatusChecker::new(&config)?;

        Ok(Self {
            config,
            checker,
            notifier,
            run_id: Uuid::new_v4().to_string(),
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Run one full pass over the roster
    #[instrument(skip(self), fields(run_id = %self.run_id))]
    pub async fn run(&self) -> RunSummary {
        let mut summary = RunSummary {
            run_id: self.run_id.clone(),
            ..RunSummary::default()
        };

        info!("Loading roster from {}", self.config.roster_path);

        let devices = match load_roster(&self.config.roster_path) {
            Ok(devices) => devices,
            Err(e) => {
                let message = roster_error_message(&e);
                error!("{}", message);
                summary.roster_failed = true;
                let sent = deliver(self.notifier.as_ref(), &message).await;
                summary.record_delivery(sent);
                self.log_summary(&summary);
                return summary;
            }
        };

        info!("Checking {} devices", devices.len());

        for device in &devices {
            self.check_device(device, &mut summary).await;
        }

        self.log_summary(&summary);
        summary
    }

    /// Check one device and act on the outcome
    async fn check_device(&self, device: &DeviceRecord, summary: &mut RunSummary) {
        summary.devices_checked += 1;

        match self.checker.check(&device.device_id).await {
            Ok(CheckOutcome::Normal { status }) => {
                summary.normal += 1;
                info!(
                    "Device {} ({}) status: {}",
                    device.device_id,
                    device.work_name,
                    status.as_deref().unwrap_or("unknown")
                );
            }
            Ok(CheckOutcome::Anomalous { status }) => {
                summary.anomalous += 1;
                let message = anomaly_message(device, &status);
                warn!("{}", message);
                let sent = deliver(self.notifier.as_ref(), &message).await;
                summary.record_delivery(sent);
            }
            Err(e) => {
                summary.check_errors += 1;
                let message = check_error_message(device, &e);
                error!("{}", message);
                if let MonitorError::CheckRequest {
                    reason: CheckFailure::HttpStatus { status, body },
                    ..
                } = &e
                {
                    error!("Status: {}", status);
                    error!("Data: {}", body);
                }

                if self.config.notify_on_check_error {
                    let sent = deliver(self.notifier.as_ref(), &message).await;
                    summary.record_delivery(sent);
                }
            }
        }
    }

    fn log_summary(&self, summary: &RunSummary) {
        info!(
            "Run {} complete - {} checked, {} up, {} anomalous, {} check errors, {} notifications sent, {} failed",
            summary.run_id,
            summary.devices_checked,
            summary.normal,
            summary.anomalous,
            summary.check_errors,
            summary.notifications_sent,
            summary.notification_failures
        );
    }
}
