//! Wire-shaped CWMP message model.
//!
//! These structs stand in for the SOAP/XML codec a real deployment would use;
//! they carry the same fields the standard defines so that a codec layer can
//! be swapped in without touching the state machine.

use serde::{Deserialize, Serialize};

/// TR-069 fault codes, per the CWMP specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaultCode {
    MethodNotSupported = 9000,
    RequestDenied = 9001,
    InternalError = 9002,
    InvalidArguments = 9003,
    ResourcesExceeded = 9004,
    InvalidParameterName = 9005,
    InvalidParameterType = 9006,
    InvalidParameterValue = 9007,
    AttemptToSetNonWritableParameter = 9008,
    NotificationRequestRejected = 9009,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceIdStruct {
    pub manufacturer: String,
    pub oui: String,
    pub product_class: String,
    pub serial_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventStruct {
    pub event_code: String,
    pub command_key: String,
}

/// The `M Reboot` event code an Inform carries after a device-initiated
/// reboot completes.
pub const INFORM_EVENT_CODE_M_REBOOT: &str = "M Reboot";
pub const INFORM_EVENT_CODE_BOOTSTRAP: &str = "0 BOOTSTRAP";
pub const INFORM_EVENT_CODE_BOOT: &str = "1 BOOT";
pub const INFORM_EVENT_CODE_PERIODIC: &str = "2 PERIODIC";
pub const INFORM_EVENT_CODE_VALUE_CHANGE: &str = "4 VALUE CHANGE";

/// Wire type tags, as they appear in `xsi:type` attributes.
pub const XSD_STRING: &str = "xsd:string";
pub const XSD_INT: &str = "xsd:int";
pub const XSD_UNSIGNED_INT: &str = "xsd:unsignedInt";
pub const XSD_BOOLEAN: &str = "xsd:boolean";

pub fn xsd_string_array_type(n: usize) -> String {
    format!("xsd:string[{}]", n)
}

pub fn parameter_value_struct_array_type(n: usize) -> String {
    format!("cwmp:ParameterValueStruct[{}]", n)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterValueStruct {
    pub name: String,
    pub value: String,
    #[serde(rename = "type")]
    pub value_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetParameterAttributesStruct {
    pub name: String,
    pub notification_change: bool,
    pub notification: u8,
}

/// One entry of a `SetParameterValuesFault` list carried by a `Fault`
/// envelope responding to a `SetParameterValues` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterFaultDetail {
    pub parameter_name: String,
    pub fault_code: String,
    pub fault_string: String,
}

/// One request/response message exchanged between ACS and CPE. `Inbound`
/// variants are produced by the CPE; `Outbound` variants are produced by the
/// ACS and handed to the transport layer for delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CwmpMessage {
    Inform {
        device_id: DeviceIdStruct,
        events: Vec<EventStruct>,
        parameter_list: Vec<ParameterValueStruct>,
    },
    InformResponse {
        max_envelopes: u32,
    },
    GetParameterValues {
        parameter_names: Vec<String>,
        /// `xsd:string[<N>]`, per spec.md §6 — computed from
        /// `parameter_names.len()` at construction.
        array_type: String,
    },
    GetParameterValuesResponse {
        parameter_list: Vec<ParameterValueStruct>,
    },
    SetParameterValues {
        parameter_list: Vec<ParameterValueStruct>,
        parameter_key: String,
        /// `cwmp:ParameterValueStruct[<N>]`, per spec.md §6 — computed from
        /// `parameter_list.len()` at construction.
        array_type: String,
    },
    SetParameterValuesResponse {
        status: i32,
    },
    AddObject {
        object_name: String,
        parameter_key: String,
    },
    AddObjectResponse {
        instance_number: u32,
        status: i32,
    },
    DeleteObject {
        object_name: String,
        parameter_key: String,
    },
    DeleteObjectResponse {
        status: i32,
    },
    Reboot {
        command_key: String,
    },
    RebootResponse,
    Fault {
        fault_code: FaultCode,
        fault_string: String,
        #[serde(default)]
        parameter_faults: Vec<ParameterFaultDetail>,
    },
    /// No actual message — used to represent "nothing was sent" transitions
    /// in states whose `get_msg` half is a formality (e.g. waiting on a
    /// device-initiated RebootResponse).
    DummyInput,
}

impl CwmpMessage {
    /// Builds `GetParameterValues` with its `array_type` derived from the
    /// name list, so every call site gets the wire constant for free.
    pub fn get_parameter_values(parameter_names: Vec<String>) -> Self {
        let array_type = xsd_string_array_type(parameter_names.len());
        CwmpMessage::GetParameterValues { parameter_names, array_type }
    }

    /// Builds `SetParameterValues` with its `array_type` derived from the
    /// parameter list, so every call site gets the wire constant for free.
    pub fn set_parameter_values(parameter_list: Vec<ParameterValueStruct>, parameter_key: String) -> Self {
        let array_type = parameter_value_struct_array_type(parameter_list.len());
        CwmpMessage::SetParameterValues { parameter_list, parameter_key, array_type }
    }
}
