//! Batch execution loop.
//!
//! Groups are processed one after another, and devices within a group one
//! at a time. Every device gets a fresh driver; a failure at any stage is
//! logged and recorded, and the loop moves on to the next device.

use std::borrow::Borrow;
use std::fmt;

use log::{debug, error, info, warn};

use crate::driver::{
    Credentials, DeviceDriver, EapiDriver, GnmiDriver, NetconfDriver, RestconfDriver, ShellDriver,
};
use crate::error::Error;
use crate::inventory::{DeviceRecord, Inventory, Protocol, Settings};
use crate::tls::options_for;

/// Lifecycle step at which a device failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Connect,
    Execute,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Connect => f.write_str("connect"),
            Stage::Execute => f.write_str("execute"),
        }
    }
}

/// What happened to one device.
#[derive(Debug)]
pub enum Outcome {
    /// The record had no operation; no driver was created.
    Skipped,
    /// The operation ran; its output.
    Succeeded(String),
    /// The device failed at `stage`.
    Failed { stage: Stage, error: Error },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded(_))
    }
}

/// Outcome tagged with the device it belongs to.
#[derive(Debug)]
pub struct DeviceOutcome {
    pub hostname: String,
    pub address: String,
    pub protocol: Protocol,
    pub outcome: Outcome,
}

/// Runs every device in an inventory with shared credentials.
pub struct Collector {
    credentials: Credentials,
    settings: Settings,
}

impl Collector {
    pub fn new(credentials: Credentials, settings: Settings) -> Self {
        Self {
            credentials,
            settings,
        }
    }

    /// Process every group in order and return one outcome per record.
    ///
    /// Groups run in the fixed order `ssh`, `http`, `netconf`, `gnmi`,
    /// `restconf`, each device with its own driver instance. A device that
    /// fails to connect or execute is recorded and logged; it never stops
    /// the batch. Records without an operation come back as
    /// [`Outcome::Skipped`].
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use netcollect::inventory::Inventory;
    /// use netcollect::{Collector, Credentials};
    ///
    /// # async fn example() -> Result<(), netcollect::Error> {
    /// let inventory = Inventory::load("devices.yaml")?;
    /// let collector = Collector::new(Credentials::new("admin", "admin"), inventory.settings.clone());
    /// for device in collector.run(&inventory).await {
    ///     println!("{} {}: {}", device.protocol, device.hostname, device.outcome.is_success());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run(&self, inventory: &Inventory) -> Vec<DeviceOutcome> {
        let timeout = self.settings.timeout();
        let host_keys = self.settings.host_key_checking;
        let known_hosts = &self.settings.known_hosts;
        let mut outcomes = Vec::with_capacity(inventory.len());

        for protocol in Protocol::ALL {
            let records = inventory.group(protocol);
            if records.is_empty() {
                debug!("{}: no devices configured", protocol);
                continue;
            }
            info!("{}: processing {} device(s)", protocol, records.len());

            let group = match protocol {
                Protocol::Shell => {
                    self.run_group(protocol, records, |record| {
                        let command = record.text_operation(protocol)?.to_string();
                        let driver = ShellDriver::new(record.dialect.trim())
                            .timeout(timeout)
                            .host_key_verification(host_keys)
                            .known_hosts(known_hosts.clone());
                        Some((driver, command))
                    })
                    .await
                }
                Protocol::Http => {
                    self.run_group(protocol, records, |record| {
                        let commands = record.text_operation(protocol)?.to_string();
                        let driver = EapiDriver::new()
                            .scheme(record.scheme.unwrap_or_default())
                            .timeout(timeout);
                        Some((driver, commands))
                    })
                    .await
                }
                Protocol::Netconf => {
                    self.run_group(protocol, records, |record| {
                        let rpc = record.text_operation(protocol)?.to_string();
                        let driver = NetconfDriver::new()
                            .timeout(timeout)
                            .host_key_verification(host_keys)
                            .known_hosts(known_hosts.clone());
                        Some((driver, rpc))
                    })
                    .await
                }
                Protocol::Gnmi => {
                    self.run_group(protocol, records, |record| {
                        let path = record.text_operation(protocol)?.to_string();
                        Some((GnmiDriver::new().timeout(timeout), path))
                    })
                    .await
                }
                Protocol::Restconf => {
                    self.run_group(protocol, records, |record| {
                        let request = record.restconf_request()?;
                        let driver = RestconfDriver::new()
                            .scheme(record.scheme.unwrap_or_default())
                            .timeout(timeout);
                        Some((driver, request))
                    })
                    .await
                }
            };
            outcomes.extend(group);
        }

        outcomes
    }

    /// Run one group.
    ///
    /// `prepare` returns the driver and operation for a record, or `None`
    /// when the record has no operation, in which case it is skipped
    /// without constructing a driver.
    pub async fn run_group<D, Op, F>(
        &self,
        protocol: Protocol,
        records: &[DeviceRecord],
        mut prepare: F,
    ) -> Vec<DeviceOutcome>
    where
        D: DeviceDriver,
        Op: Borrow<D::Operation>,
        F: FnMut(&DeviceRecord) -> Option<(D, Op)>,
    {
        let mut outcomes = Vec::with_capacity(records.len());
        for record in records {
            let outcome = match prepare(record) {
                Some((driver, operation)) => {
                    self.run_device(driver, record, protocol, operation.borrow())
                        .await
                }
                None => {
                    info!(
                        "{}: no operation configured for {} ({}), skipping",
                        protocol, record.hostname, record.ip
                    );
                    Outcome::Skipped
                }
            };
            outcomes.push(DeviceOutcome {
                hostname: record.hostname.clone(),
                address: record.ip.clone(),
                protocol,
                outcome,
            });
        }
        outcomes
    }

    /// Connect, execute once and close.
    async fn run_device<D: DeviceDriver>(
        &self,
        mut driver: D,
        record: &DeviceRecord,
        protocol: Protocol,
        operation: &D::Operation,
    ) -> Outcome {
        let options = options_for(record.skip_tls);
        if let Err(error) = driver
            .connect(&record.target(), &self.credentials, &options)
            .await
        {
            error!(
                "{}: error connecting to {} ({}): {}",
                protocol, record.hostname, record.ip, error
            );
            return Outcome::Failed {
                stage: Stage::Connect,
                error,
            };
        }

        let outcome = match driver.execute(operation).await {
            Ok(output) => {
                info!(
                    "{}: output for {} ({}):\n{}",
                    protocol, record.hostname, record.ip, output
                );
                Outcome::Succeeded(output)
            }
            Err(error) => {
                error!(
                    "{}: error executing on {} ({}): {}",
                    protocol, record.hostname, record.ip, error
                );
                Outcome::Failed {
                    stage: Stage::Execute,
                    error,
                }
            }
        };

        if let Err(e) = driver.close().await {
            warn!(
                "{}: error closing session to {} ({}): {}",
                protocol, record.hostname, record.ip, e
            );
        }

        outcome
    }
}
