//! enodeb-acsd - TR-069/CWMP auto-configuration server for LTE eNodeB devices
//!
//! Drives each connected device through a provisioning state machine:
//! discover transient status, reconcile PLMN objects and scalar parameters
//! against operator-desired configuration, apply changes, and reboot to
//! apply them when required.
//!
//! **Sponsored by [Carrier One Inc](https://carrierone.com) - Professional Telecommunications Solutions**

pub mod acs_server;
pub mod config;
pub mod data_model;
pub mod desired_config;
pub mod device_config;
pub mod error;
pub mod reconcile;
pub mod state_machine;
pub mod stats;
pub mod status;
pub mod timer;
pub mod tr069;
pub mod utils;

pub use error::{Error, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
