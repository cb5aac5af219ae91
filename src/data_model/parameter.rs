//! Symbolic parameter names, wire types, and the native value representation.

use std::fmt;

/// Symbolic scalar and per-object sub-parameter names. The fixed enumeration
/// spec.md §3 requires — no string-keyed lookups in the state machine itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterName {
    OpState,
    RfTxStatus,
    GpsStatus,
    GpsLat,
    GpsLong,
    PtpStatus,
    MmeStatus,
    NumPlmns,
    AdminState,
    SoftwareVersion,
    SerialNumber,
    PlmnId,
    PlmnEnable,
    PlmnCellReserved,
    PlmnPrimary,
}

impl ParameterName {
    /// The fixed list the `SendGetTransientParameters` state polls for,
    /// per spec.md §4.2.
    pub const TRANSIENT: &'static [ParameterName] = &[
        ParameterName::OpState,
        ParameterName::RfTxStatus,
        ParameterName::GpsStatus,
        ParameterName::GpsLat,
        ParameterName::GpsLong,
        ParameterName::PtpStatus,
        ParameterName::MmeStatus,
    ];

    /// Sub-parameter names carried by a PLMN object instance.
    pub const PLMN_SUB_PARAMS: &'static [ParameterName] = &[
        ParameterName::PlmnId,
        ParameterName::PlmnEnable,
        ParameterName::PlmnCellReserved,
        ParameterName::PlmnPrimary,
    ];

    pub fn is_object_sub_param(self) -> bool {
        matches!(
            self,
            ParameterName::PlmnId
                | ParameterName::PlmnEnable
                | ParameterName::PlmnCellReserved
                | ParameterName::PlmnPrimary
        )
    }
}

impl fmt::Display for ParameterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Int,
    UnsignedInt,
    Boolean,
    String,
}

/// The "native" (ACS-internal) side of a device↔native transform pair.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Int(i64),
    UnsignedInt(u64),
    Bool(bool),
    Str(String),
}

impl NativeValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            NativeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            NativeValue::UnsignedInt(u) => Some(*u),
            NativeValue::Int(i) if *i >= 0 => Some(*i as u64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            NativeValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// Device-side identity of a parameter: its dotted path (a template
/// containing `{}` for object instance substitution) and wire type tag.
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    pub path: String,
    pub param_type: ParamType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    KnownPresent,
    KnownAbsent,
    Unknown,
}
