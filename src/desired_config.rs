//! Desired configuration builder: target state derived from operator config
//! that the machine drives the device toward.

use crate::config::OperatorConfig;
use crate::data_model::{DataModel, NativeValue, ParameterName};
use crate::device_config::{ConfigStore, DeviceConfigStore, ObjectId};

pub type DesiredConfigStore = ConfigStore;

/// Hook for deployment-specific adjustments to a freshly built desired
/// config (e.g. quirks for a particular vendor/firmware combination).
/// Matches spec.md §6's `build_desired_config(... postprocessor)` contract.
pub trait ConfigPostprocessor {
    fn postprocess(&self, desired: &mut DesiredConfigStore, device: &DeviceConfigStore);
}

/// No-op postprocessor used when no deployment-specific adjustment is needed.
pub struct NoopPostprocessor;

impl ConfigPostprocessor for NoopPostprocessor {
    fn postprocess(&self, _desired: &mut DesiredConfigStore, _device: &DeviceConfigStore) {}
}

/// Builds the desired configuration from operator config, the current
/// device store, the data model, and a postprocessor hook. Pure with
/// respect to `device` (read-only); called at most once per provisioning
/// cycle by `WaitGetObjectParameters`.
pub fn build_desired_config(
    operator_cfg: &OperatorConfig,
    device: &DeviceConfigStore,
    _model: &dyn DataModel,
    postprocessor: &dyn ConfigPostprocessor,
) -> DesiredConfigStore {
    let mut desired = ConfigStore::new();

    desired.set_parameter(ParameterName::AdminState, NativeValue::Bool(true));

    for (idx, plmn) in operator_cfg.plmns.iter().enumerate() {
        let id = ObjectId::new("Plmn", (idx + 1) as u32);
        desired.add_object(id.clone());
        desired.set_parameter_for_object(
            &id,
            ParameterName::PlmnId,
            NativeValue::Str(plmn.plmnid.clone()),
        );
        desired.set_parameter_for_object(
            &id,
            ParameterName::PlmnEnable,
            NativeValue::Bool(plmn.enable),
        );
        desired.set_parameter_for_object(
            &id,
            ParameterName::PlmnCellReserved,
            NativeValue::Bool(plmn.cell_reserved),
        );
        desired.set_parameter_for_object(
            &id,
            ParameterName::PlmnPrimary,
            NativeValue::Bool(plmn.primary),
        );
    }

    postprocessor.postprocess(&mut desired, device);
    desired
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlmnConfig;
    use crate::data_model::EnodebDataModel;

    #[test]
    fn builds_one_object_per_configured_plmn() {
        let operator_cfg = OperatorConfig {
            plmns: vec![PlmnConfig {
                plmnid: "001010".to_string(),
                enable: true,
                cell_reserved: false,
                primary: true,
            }],
        };
        let model = EnodebDataModel::new();
        let device = DeviceConfigStore::new();
        let desired = build_desired_config(&operator_cfg, &device, &model, &NoopPostprocessor);

        let id = ObjectId::new("Plmn", 1);
        assert!(desired.has_object(&id));
        assert_eq!(
            desired.get_parameter_for_object(&id, ParameterName::PlmnId),
            Some(&NativeValue::Str("001010".to_string()))
        );
    }
}
