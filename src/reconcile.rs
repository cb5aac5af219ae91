//! Pure reconciliation helpers: diff desired vs. observed configuration.
//! None of these functions mutate their inputs.

use std::collections::HashMap;

use crate::data_model::{DataModel, NativeValue, ParameterName, Presence};
use crate::device_config::{ConfigStore, ObjectId};

/// Scalar parameters the model knows about but whose value is not yet
/// recorded in `device` (present-or-unknown presence only — a known-absent
/// parameter is never worth asking for).
pub fn params_to_get(device: &ConfigStore, model: &dyn DataModel) -> Vec<ParameterName> {
    model
        .known_scalar_names()
        .into_iter()
        .filter(|&name| !matches!(model.presence(name), Presence::KnownAbsent))
        .filter(|&name| !device.has_parameter(name))
        .collect()
}

/// Device-side dotted paths for sub-parameters of object instances that
/// still need querying: every instance implied by `device`'s `NumPlmns`
/// count and still wanted in `desired`, for any sub-parameter not already
/// recorded in `device`. An instance `desired` no longer wants (pending
/// deletion) is skipped — there is no further diff to answer for it.
pub fn object_params_to_get(
    desired: &ConfigStore,
    device: &ConfigStore,
    model: &dyn DataModel,
) -> Vec<String> {
    let num_plmns = match device.get_parameter(ParameterName::NumPlmns) {
        Some(v) => v.as_u64().unwrap_or(0),
        None => 0,
    };

    let mut paths = Vec::new();
    let sub_names = ParameterName::PLMN_SUB_PARAMS;

    for instance in 1..=num_plmns {
        let id = ObjectId::new("Plmn", instance as u32);
        if !desired.has_object(&id) {
            continue;
        }
        for &sub in sub_names {
            if device.get_parameter_for_object(&id, sub).is_none() {
                if let Some(spec) = model.get_parameter(sub) {
                    paths.push(spec.path.replace("{}", &instance.to_string()));
                }
            }
        }
    }

    paths
}

/// Object instances present in `device` but absent from `desired`.
pub fn objects_to_delete(desired: &ConfigStore, device: &ConfigStore) -> Vec<ObjectId> {
    device
        .objects()
        .filter(|id| !desired.has_object(id))
        .cloned()
        .collect()
}

/// Object instances present in `desired` but absent from `device`, in the
/// template form `AddObject` expects (template name with trailing dot).
pub fn objects_to_add(desired: &ConfigStore, device: &ConfigStore) -> Vec<String> {
    desired
        .objects()
        .filter(|id| !device.has_object(id))
        .map(|id| format!("{}.", id.template))
        .collect()
}

/// Scalar parameters whose desired value differs from the device's current
/// value. When `exclude_admin` is set, `AdminState` is left out (used by
/// `SetParameterValuesNotAdmin` so the set does not radiate yet).
pub fn param_values_to_set(
    desired: &ConfigStore,
    device: &ConfigStore,
    exclude_admin: bool,
) -> HashMap<ParameterName, NativeValue> {
    let mut out = HashMap::new();
    for (&name, value) in desired.scalar_entries() {
        if exclude_admin && name == ParameterName::AdminState {
            continue;
        }
        if device.get_parameter(name) != Some(value) {
            out.insert(name, value.clone());
        }
    }
    out
}

/// Same as `param_values_to_set`, grouped by object instance.
pub fn obj_param_values_to_set(
    desired: &ConfigStore,
    device: &ConfigStore,
) -> HashMap<ObjectId, HashMap<ParameterName, NativeValue>> {
    let mut out: HashMap<ObjectId, HashMap<ParameterName, NativeValue>> = HashMap::new();
    for id in desired.objects() {
        let desired_sub = match desired.object_sub_params(id) {
            Some(m) => m,
            None => continue,
        };
        for (&name, value) in desired_sub {
            if device.get_parameter_for_object(id, name) != Some(value) {
                out.entry(id.clone()).or_default().insert(name, value.clone());
            }
        }
    }
    out
}

/// Next scalar parameter whose presence is still unknown, or `None` once the
/// model has a definite answer for everything.
pub fn optional_param_to_check(model: &dyn DataModel) -> Option<ParameterName> {
    model
        .known_scalar_names()
        .into_iter()
        .find(|&name| model.presence(name) == Presence::Unknown)
}
