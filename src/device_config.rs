//! Device and desired configuration stores: parameter name → native value,
//! plus (object instance, sub-parameter name) → native value.

use std::collections::HashMap;

use crate::data_model::{NativeValue, ParameterName};

/// An object instance identified by its template name and instance index
/// (e.g. `("Plmn", 2)`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectId {
    pub template: String,
    pub instance: u32,
}

impl ObjectId {
    pub fn new(template: impl Into<String>, instance: u32) -> Self {
        Self {
            template: template.into(),
            instance,
        }
    }
}

/// Shared shape for both the device configuration store (observed, mutated
/// only on confirmed device responses) and the desired configuration store
/// (target, built from operator config).
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    scalars: HashMap<ParameterName, NativeValue>,
    objects: HashMap<ObjectId, HashMap<ParameterName, NativeValue>>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_parameter(&self, name: ParameterName) -> bool {
        self.scalars.contains_key(&name)
    }

    pub fn get_parameter(&self, name: ParameterName) -> Option<&NativeValue> {
        self.scalars.get(&name)
    }

    pub fn set_parameter(&mut self, name: ParameterName, value: NativeValue) {
        self.scalars.insert(name, value);
    }

    pub fn objects(&self) -> impl Iterator<Item = &ObjectId> {
        self.objects.keys()
    }

    pub fn scalar_entries(&self) -> impl Iterator<Item = (&ParameterName, &NativeValue)> {
        self.scalars.iter()
    }

    pub fn has_object(&self, id: &ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    pub fn add_object(&mut self, id: ObjectId) {
        self.objects.entry(id).or_default();
    }

    pub fn delete_object(&mut self, id: &ObjectId) {
        self.objects.remove(id);
    }

    pub fn set_parameter_for_object(&mut self, id: &ObjectId, name: ParameterName, value: NativeValue) {
        self.objects.entry(id.clone()).or_default().insert(name, value);
    }

    pub fn get_parameter_for_object(&self, id: &ObjectId, name: ParameterName) -> Option<&NativeValue> {
        self.objects.get(id).and_then(|m| m.get(&name))
    }

    pub fn object_sub_params(&self, id: &ObjectId) -> Option<&HashMap<ParameterName, NativeValue>> {
        self.objects.get(id)
    }
}

/// The observed-from-device store. Mutated only as a consequence of
/// confirmed device responses (spec.md §3 invariant).
pub type DeviceConfigStore = ConfigStore;
