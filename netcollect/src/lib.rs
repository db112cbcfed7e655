//! # netcollect
//!
//! Collect operational state from network devices over whichever management
//! protocol each device exposes.
//!
//! ## Features
//!
//! - Interactive CLI over SSH via russh, with per-dialect prompt and privilege handling
//! - Arista eAPI (JSON-RPC over HTTPS)
//! - NETCONF 1.0/1.1 over an SSH subsystem
//! - gNMI `Get` over gRPC
//! - RESTCONF
//! - One `connect`/`execute`/`close` lifecycle for all of them, and a batch
//!   loop that isolates per-device failures
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use netcollect::{Credentials, DeviceDriver, RestconfDriver, RestconfRequest, Target};
//! use netcollect::tls::ConnectOption;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), netcollect::Error> {
//!     let mut driver = RestconfDriver::new();
//!     let credentials = Credentials::new("admin", "secret");
//!
//!     driver
//!         .connect(&Target::new("10.0.0.1"), &credentials, &[ConnectOption::SkipTlsVerify])
//!         .await?;
//!     let output = driver
//!         .execute(&RestconfRequest::new("GET", "data/interfaces"))
//!         .await;
//!     driver.close().await?;
//!
//!     println!("{}", output?);
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod collector;
pub mod dialect;
pub mod driver;
pub mod error;
pub mod gnmi;
pub mod inventory;
pub mod netconf;
pub mod tls;
pub mod transport;

// Re-export main types for convenience
pub use collector::{Collector, DeviceOutcome, Outcome, Stage};
pub use dialect::{Dialect, PrivilegeLevel};
pub use driver::{
    Credentials, DeviceDriver, EapiDriver, GnmiDriver, NetconfDriver, RestconfDriver, RestconfRequest,
    Scheme, ShellDriver, Target,
};
pub use error::{Error, ErrorKind, Result};
pub use inventory::{DeviceRecord, Inventory, Protocol, Settings};
