//! Data-model facade: parameter metadata, name↔path, device↔native value
//! transforms, and presence tracking.

pub mod enodeb_model;
pub mod parameter;

pub use enodeb_model::{DataModel, EnodebDataModel};
pub use parameter::{NativeValue, ParamType, ParameterName, ParameterSpec, Presence};
