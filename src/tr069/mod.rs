//! TR-069 (CWMP) message model for the ACS side of the protocol

pub mod messages;

pub use messages::*;
