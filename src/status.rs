//! Status sink: per-device status snapshot and Prometheus metrics.

use once_cell::sync::Lazy;
use prometheus::{IntCounterVec, IntGaugeVec, Opts, Registry};
use tracing::debug;

use crate::data_model::{DataModel, NativeValue, ParameterName};
use crate::device_config::ConfigStore;

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

static OP_STATE_GAUGE: Lazy<IntGaugeVec> = Lazy::new(|| {
    let gauge = IntGaugeVec::new(
        Opts::new("enodeb_op_state", "eNodeB operational state (1=up)"),
        &["device_id"],
    )
    .expect("metric can be created");
    REGISTRY.register(Box::new(gauge.clone())).ok();
    gauge
});

static RF_TX_GAUGE: Lazy<IntGaugeVec> = Lazy::new(|| {
    let gauge = IntGaugeVec::new(
        Opts::new("enodeb_rf_tx_status", "eNodeB RF transmit status (1=on)"),
        &["device_id"],
    )
    .expect("metric can be created");
    REGISTRY.register(Box::new(gauge.clone())).ok();
    gauge
});

static REBOOT_COUNTER: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new("enodeb_reboot_total", "Reboots observed per device"),
        &["device_id"],
    )
    .expect("metric can be created");
    REGISTRY.register(Box::new(counter.clone())).ok();
    counter
});

static FAULT_COUNTER: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new("enodeb_fault_total", "Tr069Error faults observed per device"),
        &["device_id"],
    )
    .expect("metric can be created");
    REGISTRY.register(Box::new(counter.clone())).ok();
    counter
});

pub fn registry() -> &'static Registry {
    &REGISTRY
}

#[derive(Debug, Clone, Default)]
pub struct EnodebStatus {
    pub op_state: Option<bool>,
    pub rf_tx_status: Option<bool>,
    pub gps_status: Option<bool>,
    pub ptp_status: Option<bool>,
    pub mme_status: Option<bool>,
}

/// Reads the current status snapshot out of the device config store. Pure —
/// does not touch the metrics registry.
pub fn get_enodeb_status(device: &ConfigStore, _model: &dyn DataModel) -> EnodebStatus {
    EnodebStatus {
        op_state: device.get_parameter(ParameterName::OpState).and_then(NativeValue::as_bool),
        rf_tx_status: device.get_parameter(ParameterName::RfTxStatus).and_then(NativeValue::as_bool),
        gps_status: device.get_parameter(ParameterName::GpsStatus).and_then(NativeValue::as_bool),
        ptp_status: device.get_parameter(ParameterName::PtpStatus).and_then(NativeValue::as_bool),
        mme_status: device.get_parameter(ParameterName::MmeStatus).and_then(NativeValue::as_bool),
    }
}

pub fn update_status_metrics(device_id: &str, status: &EnodebStatus) {
    if let Some(op_state) = status.op_state {
        OP_STATE_GAUGE.with_label_values(&[device_id]).set(op_state as i64);
    }
    if let Some(rf_tx) = status.rf_tx_status {
        RF_TX_GAUGE.with_label_values(&[device_id]).set(rf_tx as i64);
    }
    debug!(device_id, ?status, "status metrics updated");
}

pub fn record_reboot(device_id: &str) {
    REBOOT_COUNTER.with_label_values(&[device_id]).inc();
}

pub fn record_fault(device_id: &str) {
    FAULT_COUNTER.with_label_values(&[device_id]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_reads_known_scalars() {
        let mut device = ConfigStore::new();
        device.set_parameter(ParameterName::RfTxStatus, NativeValue::Bool(true));
        let model = crate::data_model::EnodebDataModel::new();
        let status = get_enodeb_status(&device, &model);
        assert_eq!(status.rf_tx_status, Some(true));
        assert_eq!(status.op_state, None);
    }
}
