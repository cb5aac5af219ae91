//! A representative LTE eNodeB data model: one scalar parameter set plus one
//! addable object type (`Plmn`), matching the glossary's object example.

use std::collections::HashMap;
use std::sync::RwLock;

use super::parameter::{NativeValue, ParamType, ParameterName, ParameterSpec, Presence};
use crate::{Error, Result};

/// External data-model facade: parameter metadata, name↔path, device↔native
/// value transforms, and presence tracking. Read-only except for presence,
/// which is interior-mutable so the facade can be shared across machines
/// without cloning (spec.md §5: "data-model facade is read-only and
/// shareable").
pub trait DataModel: Send + Sync {
    fn get_parameter(&self, name: ParameterName) -> Option<ParameterSpec>;

    fn is_parameter_present(&self, name: ParameterName) -> bool {
        matches!(self.presence(name), Presence::KnownPresent)
    }

    fn set_parameter_presence(&self, name: ParameterName, present: bool);

    fn presence(&self, name: ParameterName) -> Presence;

    /// Device wire value → native (ACS-internal) value.
    fn to_native(&self, name: ParameterName, wire: &str) -> Result<NativeValue>;

    /// Native (ACS-internal) value → device wire value.
    fn to_device(&self, name: ParameterName, value: &NativeValue) -> Result<String>;

    /// Object template name → ordered sub-parameter names.
    fn get_numbered_param_names(&self) -> HashMap<&'static str, &'static [ParameterName]>;

    /// Every scalar parameter tracked by this model (object sub-parameters
    /// excluded — presence discovery only applies to top-level scalars).
    fn known_scalar_names(&self) -> Vec<ParameterName>;
}

struct ParamEntry {
    spec: ParameterSpec,
}

pub struct EnodebDataModel {
    params: HashMap<ParameterName, ParamEntry>,
    presence: RwLock<HashMap<ParameterName, Presence>>,
}

impl EnodebDataModel {
    pub fn new() -> Self {
        let mut params = HashMap::new();
        let mut presence = HashMap::new();

        let scalar = [
            (ParameterName::OpState, "Device.DeviceInfo.X_OPSTATE", ParamType::Boolean),
            (ParameterName::RfTxStatus, "Device.FAP.RF.TxStatus", ParamType::Boolean),
            (ParameterName::GpsStatus, "Device.FAP.GPS.ScanStatus", ParamType::Boolean),
            (ParameterName::GpsLat, "Device.FAP.GPS.LockedLatitude", ParamType::String),
            (ParameterName::GpsLong, "Device.FAP.GPS.LockedLongitude", ParamType::String),
            (ParameterName::PtpStatus, "Device.FAP.PTP.Status", ParamType::Boolean),
            (ParameterName::MmeStatus, "Device.FAP.Mme.Status", ParamType::Boolean),
            (ParameterName::NumPlmns, "Device.Services.FAPService.1.CellConfig.LTE.EPC.PLMNListNumberOfEntries", ParamType::UnsignedInt),
            (ParameterName::AdminState, "Device.Services.FAPService.1.FAPControl.LTE.AdminState", ParamType::Boolean),
            (ParameterName::SoftwareVersion, "Device.DeviceInfo.SoftwareVersion", ParamType::String),
            (ParameterName::SerialNumber, "Device.DeviceInfo.SerialNumber", ParamType::String),
        ];

        for (name, path, param_type) in scalar {
            params.insert(
                name,
                ParamEntry {
                    spec: ParameterSpec {
                        path: path.to_string(),
                        param_type,
                    },
                },
            );
            presence.insert(name, Presence::Unknown);
        }

        let plmn_sub = [
            (ParameterName::PlmnId, "Device.Services.FAPService.1.CellConfig.LTE.EPC.PLMNList.{}.PLMNID", ParamType::String),
            (ParameterName::PlmnEnable, "Device.Services.FAPService.1.CellConfig.LTE.EPC.PLMNList.{}.Enable", ParamType::Boolean),
            (ParameterName::PlmnCellReserved, "Device.Services.FAPService.1.CellConfig.LTE.EPC.PLMNList.{}.CellReservedForOperatorUse", ParamType::Boolean),
            (ParameterName::PlmnPrimary, "Device.Services.FAPService.1.CellConfig.LTE.EPC.PLMNList.{}.IsPrimary", ParamType::Boolean),
        ];

        for (name, path, param_type) in plmn_sub {
            params.insert(
                name,
                ParamEntry {
                    spec: ParameterSpec {
                        path: path.to_string(),
                        param_type,
                    },
                },
            );
        }

        Self {
            params,
            presence: RwLock::new(presence),
        }
    }

    pub fn plmn_object_template(&self) -> &'static str {
        "Device.Services.FAPService.1.CellConfig.LTE.EPC.PLMNList."
    }
}

impl Default for EnodebDataModel {
    fn default() -> Self {
        Self::new()
    }
}

impl DataModel for EnodebDataModel {
    fn get_parameter(&self, name: ParameterName) -> Option<ParameterSpec> {
        self.params.get(&name).map(|e| e.spec.clone())
    }

    fn set_parameter_presence(&self, name: ParameterName, present: bool) {
        let mut presence = self.presence.write().expect("presence lock poisoned");
        presence.insert(
            name,
            if present {
                Presence::KnownPresent
            } else {
                Presence::KnownAbsent
            },
        );
    }

    fn presence(&self, name: ParameterName) -> Presence {
        let presence = self.presence.read().expect("presence lock poisoned");
        *presence.get(&name).unwrap_or(&Presence::Unknown)
    }

    fn to_native(&self, name: ParameterName, wire: &str) -> Result<NativeValue> {
        let spec = self
            .get_parameter(name)
            .ok_or_else(|| Error::tr069(format!("unknown parameter {}", name)))?;
        Ok(match spec.param_type {
            ParamType::Int => NativeValue::Int(
                wire.parse()
                    .map_err(|_| Error::tr069(format!("invalid int for {}: {}", name, wire)))?,
            ),
            ParamType::UnsignedInt => NativeValue::UnsignedInt(
                wire.parse()
                    .map_err(|_| Error::tr069(format!("invalid uint for {}: {}", name, wire)))?,
            ),
            ParamType::Boolean => NativeValue::Bool(wire == "1" || wire.eq_ignore_ascii_case("true")),
            ParamType::String => NativeValue::Str(wire.to_string()),
        })
    }

    fn to_device(&self, name: ParameterName, value: &NativeValue) -> Result<String> {
        let spec = self
            .get_parameter(name)
            .ok_or_else(|| Error::tr069(format!("unknown parameter {}", name)))?;
        Ok(match (spec.param_type, value) {
            (ParamType::Int, NativeValue::Int(i)) => i.to_string(),
            (ParamType::UnsignedInt, NativeValue::UnsignedInt(u)) => u.to_string(),
            (ParamType::Boolean, NativeValue::Bool(b)) => {
                if *b {
                    "1".to_string()
                } else {
                    "0".to_string()
                }
            }
            (ParamType::String, NativeValue::Str(s)) => s.clone(),
            _ => {
                return Err(Error::tr069(format!(
                    "value/type mismatch for parameter {}",
                    name
                )))
            }
        })
    }

    fn get_numbered_param_names(&self) -> HashMap<&'static str, &'static [ParameterName]> {
        let mut map = HashMap::new();
        map.insert("Plmn", ParameterName::PLMN_SUB_PARAMS);
        map
    }

    fn known_scalar_names(&self) -> Vec<ParameterName> {
        self.params
            .keys()
            .copied()
            .filter(|n| !n.is_object_sub_param())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_boolean() {
        let model = EnodebDataModel::new();
        let wire = model
            .to_device(ParameterName::RfTxStatus, &NativeValue::Bool(true))
            .unwrap();
        assert_eq!(wire, "1");
        let native = model.to_native(ParameterName::RfTxStatus, &wire).unwrap();
        assert_eq!(native, NativeValue::Bool(true));
    }

    #[test]
    fn round_trip_string() {
        let model = EnodebDataModel::new();
        let native = NativeValue::Str("00101".to_string());
        let wire = model.to_device(ParameterName::PlmnId, &native).unwrap();
        let back = model.to_native(ParameterName::PlmnId, &wire).unwrap();
        assert_eq!(back, native);
    }

    #[test]
    fn presence_defaults_unknown_then_settable() {
        let model = EnodebDataModel::new();
        assert_eq!(model.presence(ParameterName::GpsLat), Presence::Unknown);
        model.set_parameter_presence(ParameterName::GpsLat, false);
        assert_eq!(model.presence(ParameterName::GpsLat), Presence::KnownAbsent);
    }

    #[test]
    fn rejects_type_mismatched_value() {
        let model = EnodebDataModel::new();
        let err = model.to_device(ParameterName::RfTxStatus, &NativeValue::Str("x".into()));
        assert!(err.is_err());
    }
}
