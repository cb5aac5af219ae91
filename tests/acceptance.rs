//! End-to-end acceptance tests driving `AcsServer`/`AcsStateMachine` purely
//! through the public API, one scenario per spec.md §8 case.

use std::sync::Arc;

use enodeb_acsd::acs_server::AcsServer;
use enodeb_acsd::config::AcsConfig;
use enodeb_acsd::data_model::EnodebDataModel;
use enodeb_acsd::desired_config::NoopPostprocessor;
use enodeb_acsd::state_machine::states::{ERROR, WAIT_INFORM_M_REBOOT};
use enodeb_acsd::state_machine::AcsStateMachine;
use enodeb_acsd::stats::StatsManager;
use enodeb_acsd::timer::TokioEventLoop;
use enodeb_acsd::tr069::messages::{
    CwmpMessage, DeviceIdStruct, EventStruct, FaultCode, ParameterValueStruct,
    INFORM_EVENT_CODE_BOOTSTRAP, XSD_BOOLEAN, XSD_STRING, XSD_UNSIGNED_INT,
};

fn bootstrap_inform(device_id: &str) -> CwmpMessage {
    CwmpMessage::Inform {
        device_id: DeviceIdStruct {
            manufacturer: "Baicells".into(),
            oui: "ABCDEF".into(),
            product_class: "eNB".into(),
            serial_number: device_id.into(),
        },
        events: vec![EventStruct {
            event_code: INFORM_EVENT_CODE_BOOTSTRAP.into(),
            command_key: String::new(),
        }],
        parameter_list: vec![],
    }
}

/// Plausible discovery value for one of the eleven scalar paths, keyed by
/// the wire path `EnodebDataModel` assigns them. RF starts "on" so the
/// radio-stop scenario has a true→false edge to trigger later.
fn discovery_value_for(path: &str) -> (String, String) {
    match path {
        "Device.FAP.RF.TxStatus" => ("1".into(), XSD_BOOLEAN.into()),
        "Device.Services.FAPService.1.CellConfig.LTE.EPC.PLMNListNumberOfEntries" => {
            ("0".into(), XSD_UNSIGNED_INT.into())
        }
        "Device.DeviceInfo.SoftwareVersion" => ("1.2.3".into(), XSD_STRING.into()),
        "Device.DeviceInfo.SerialNumber" => ("SN-TEST-1".into(), XSD_STRING.into()),
        "Device.FAP.GPS.LockedLatitude" => ("51.5".into(), XSD_STRING.into()),
        "Device.FAP.GPS.LockedLongitude" => ("-0.1".into(), XSD_STRING.into()),
        // Discovered disabled so SetParameterValues has a genuine AdminState
        // diff to apply (the operator's desired config always wants it on).
        "Device.Services.FAPService.1.FAPControl.LTE.AdminState" => ("0".into(), XSD_BOOLEAN.into()),
        _ => ("1".into(), XSD_BOOLEAN.into()),
    }
}

fn param_response(path: &str, value: &str, value_type: &str) -> CwmpMessage {
    CwmpMessage::GetParameterValuesResponse {
        parameter_list: vec![ParameterValueStruct {
            name: path.to_string(),
            value: value.to_string(),
            value_type: value_type.to_string(),
        }],
    }
}

fn fault(message: &str) -> CwmpMessage {
    CwmpMessage::Fault {
        fault_code: FaultCode::InvalidParameterName,
        fault_string: message.to_string(),
        parameter_faults: vec![],
    }
}

/// Drives `CheckOptionalParams`'s one-candidate-at-a-time handshake to
/// completion, answering each single-name `GetParameterValues` with a
/// plausible value, and returns the first message after discovery ends
/// (the transient parameter poll).
async fn drive_discovery(server: &AcsServer, device_id: &str, mut current: CwmpMessage) -> CwmpMessage {
    loop {
        let names = match &current {
            CwmpMessage::GetParameterValues { parameter_names, .. } if parameter_names.len() == 1 => {
                parameter_names.clone()
            }
            _ => return current,
        };
        let (value, value_type) = discovery_value_for(&names[0]);
        current = server
            .dispatch(device_id, param_response(&names[0], &value, &value_type))
            .await
            .unwrap();
    }
}

fn transient_response(paths: &[String]) -> CwmpMessage {
    let parameter_list = paths
        .iter()
        .map(|path| {
            let (value, value_type) = discovery_value_for(path);
            ParameterValueStruct {
                name: path.clone(),
                value,
                value_type,
            }
        })
        .collect();
    CwmpMessage::GetParameterValuesResponse { parameter_list }
}

fn transient_names(msg: &CwmpMessage) -> Vec<String> {
    match msg {
        CwmpMessage::GetParameterValues { parameter_names, .. } => parameter_names.clone(),
        other => panic!("expected a transient GetParameterValues, got {:?}", other),
    }
}

fn test_server(config: AcsConfig) -> AcsServer {
    AcsServer::new(
        config,
        Arc::new(EnodebDataModel::new()),
        Arc::new(NoopPostprocessor),
        Arc::new(TokioEventLoop),
    )
}

/// Scenario 1 (fresh provisioning) + scenario 3 (add-one-PLMN): a brand new
/// device with no PLMN instances reaches `AddObject` for the operator's one
/// configured PLMN, then `SetParameterValues`, then reboots.
#[tokio::test]
async fn fresh_device_adds_configured_plmn_and_reboots() {
    let server = test_server(AcsConfig::default_config());
    let device_id = "enb-fresh";

    let inform_response = server.dispatch(device_id, bootstrap_inform(device_id)).await.unwrap();
    assert!(matches!(inform_response, CwmpMessage::InformResponse { .. }));

    let first_candidate = server.dispatch(device_id, CwmpMessage::DummyInput).await.unwrap();
    let transient_request = drive_discovery(&server, device_id, first_candidate).await;
    let names = transient_names(&transient_request);
    assert_eq!(names.len(), 7);

    let add_object = server
        .dispatch(device_id, transient_response(&names))
        .await
        .unwrap();
    let object_name = match add_object {
        CwmpMessage::AddObject { object_name, .. } => object_name,
        other => panic!("expected AddObject for the configured PLMN, got {:?}", other),
    };
    assert_eq!(object_name, "Plmn.");

    let set_values = server
        .dispatch(
            device_id,
            CwmpMessage::AddObjectResponse {
                instance_number: 1,
                status: 0,
            },
        )
        .await
        .unwrap();
    let parameter_list = match set_values {
        CwmpMessage::SetParameterValues { parameter_list, .. } => parameter_list,
        other => panic!("expected SetParameterValues after add, got {:?}", other),
    };
    assert!(parameter_list.iter().any(|pv| pv.name.ends_with("AdminState")));
    assert!(parameter_list
        .iter()
        .any(|pv| pv.name.contains("PLMNList.1.PLMNID")));

    let reboot = server
        .dispatch(device_id, CwmpMessage::SetParameterValuesResponse { status: 0 })
        .await
        .unwrap();
    assert!(matches!(reboot, CwmpMessage::Reboot { .. }));

    let after_reboot_response = server.dispatch(device_id, CwmpMessage::RebootResponse).await.unwrap();
    assert!(matches!(after_reboot_response, CwmpMessage::DummyInput));
    assert_eq!(server.current_state(device_id).await.unwrap(), WAIT_INFORM_M_REBOOT);
}

/// Scenario 2: a radio-stop edge (RF_TX_STATUS true→false) observed in the
/// transient poll clears the stats counter exactly once.
#[tokio::test]
async fn radio_stop_edge_clears_stats_once() {
    let server = test_server(AcsConfig::default_config());
    let device_id = "enb-radio-stop";

    server.dispatch(device_id, bootstrap_inform(device_id)).await.unwrap();
    let first_candidate = server.dispatch(device_id, CwmpMessage::DummyInput).await.unwrap();
    let transient_request = drive_discovery(&server, device_id, first_candidate).await;
    let names = transient_names(&transient_request);

    assert_eq!(server.stats().clear_count(), 0);

    // Same as the default transient response, but RF has now gone quiet.
    let parameter_list = names
        .iter()
        .map(|path| {
            let (mut value, value_type) = discovery_value_for(path);
            if path == "Device.FAP.RF.TxStatus" {
                value = "0".to_string();
            }
            ParameterValueStruct {
                name: path.clone(),
                value,
                value_type,
            }
        })
        .collect();

    server
        .dispatch(device_id, CwmpMessage::GetParameterValuesResponse { parameter_list })
        .await
        .unwrap();

    assert_eq!(server.stats().clear_count(), 1);
}

/// Scenario 4 (set-fault / enable-only cycle): with no PLMNs configured,
/// object discovery never has anything to add, so the ladder skips straight
/// to `SetParameterValues` carrying only the `AdminState` diff.
#[tokio::test]
async fn no_configured_plmns_skips_straight_to_set_parameter_values() {
    let mut config = AcsConfig::default_config();
    config.operator.plmns = vec![];
    let server = test_server(config);
    let device_id = "enb-no-plmns";

    server.dispatch(device_id, bootstrap_inform(device_id)).await.unwrap();
    let first_candidate = server.dispatch(device_id, CwmpMessage::DummyInput).await.unwrap();
    let transient_request = drive_discovery(&server, device_id, first_candidate).await;
    let names = transient_names(&transient_request);

    let set_values = server
        .dispatch(device_id, transient_response(&names))
        .await
        .unwrap();
    let parameter_list = match set_values {
        CwmpMessage::SetParameterValues { parameter_list, .. } => parameter_list,
        other => panic!("expected SetParameterValues directly (skip branch), got {:?}", other),
    };
    assert_eq!(parameter_list.len(), 1);
    assert!(parameter_list[0].name.ends_with("AdminState"));
    assert_eq!(parameter_list[0].value, "1");

    let reboot = server
        .dispatch(device_id, CwmpMessage::SetParameterValuesResponse { status: 0 })
        .await
        .unwrap();
    assert!(matches!(reboot, CwmpMessage::Reboot { .. }));
}

/// Scenario 5: no post-reboot `Inform` arrives within the configured
/// timeout, so the machine is forced into `error`.
#[tokio::test]
async fn reboot_inform_timeout_forces_error_state() {
    let mut config = AcsConfig::default_config();
    config.operator.plmns = vec![];
    config.timers.reboot_inform_timeout = 1;
    let server = test_server(config);
    let device_id = "enb-reboot-timeout";

    server.dispatch(device_id, bootstrap_inform(device_id)).await.unwrap();
    let first_candidate = server.dispatch(device_id, CwmpMessage::DummyInput).await.unwrap();
    let transient_request = drive_discovery(&server, device_id, first_candidate).await;
    let names = transient_names(&transient_request);
    server.dispatch(device_id, transient_response(&names)).await.unwrap();
    server
        .dispatch(device_id, CwmpMessage::SetParameterValuesResponse { status: 0 })
        .await
        .unwrap();
    server.dispatch(device_id, CwmpMessage::RebootResponse).await.unwrap();
    assert_eq!(server.current_state(device_id).await.unwrap(), WAIT_INFORM_M_REBOOT);

    tokio::time::sleep(std::time::Duration::from_millis(1300)).await;
    assert_eq!(server.current_state(device_id).await.unwrap(), ERROR);
}

/// Scenario 6: optional parameter discovery tracks presence per candidate —
/// a faulted candidate is marked absent, a responded one is marked present
/// and its value recorded — and the machine doesn't move on to the
/// transient poll until every known scalar has a definite answer.
#[tokio::test]
async fn optional_param_discovery_marks_presence_for_every_candidate() {
    let model: Arc<dyn enodeb_acsd::data_model::DataModel> = Arc::new(EnodebDataModel::new());
    let config = AcsConfig::default_config();
    let (machine, handle) = AcsStateMachine::new(
        "enb-discovery",
        &config,
        Arc::clone(&model),
        Arc::new(NoopPostprocessor),
        Arc::new(StatsManager::new()),
        Arc::new(TokioEventLoop),
    );
    tokio::spawn(machine.run());

    let inform_response = handle.dispatch(bootstrap_inform("enb-discovery")).await.unwrap();
    assert!(matches!(inform_response, CwmpMessage::InformResponse { .. }));

    let mut current = handle.dispatch(CwmpMessage::DummyInput).await.unwrap();
    let mut faulted = 0;
    let mut answered = 0;
    let mut round = 0;

    loop {
        let names = match &current {
            CwmpMessage::GetParameterValues { parameter_names, .. } if parameter_names.len() == 1 => {
                parameter_names.clone()
            }
            _ => break,
        };
        round += 1;
        current = if round <= 4 {
            faulted += 1;
            handle.dispatch(fault("not supported on this device")).await.unwrap()
        } else {
            answered += 1;
            let (value, value_type) = discovery_value_for(&names[0]);
            handle
                .dispatch(param_response(&names[0], &value, &value_type))
                .await
                .unwrap()
        };
    }

    assert_eq!(faulted, 4);
    assert_eq!(answered, 7);
    let names = transient_names(&current);
    assert_eq!(names.len(), 7);

    use enodeb_acsd::data_model::Presence;
    let absent = model
        .known_scalar_names()
        .into_iter()
        .filter(|&n| model.presence(n) == Presence::KnownAbsent)
        .count();
    let present = model
        .known_scalar_names()
        .into_iter()
        .filter(|&n| model.presence(n) == Presence::KnownPresent)
        .count();
    assert_eq!(absent, 4);
    assert_eq!(present, 7);
}

/// `AcsServer::reset_device` recovers a machine stuck in `error` by
/// respawning it fresh, decoupled from the automatic reboot-triggered reset.
#[tokio::test]
async fn reset_device_recovers_from_error() {
    let server = test_server(AcsConfig::default_config());
    let device_id = "enb-stuck";

    server.dispatch(device_id, bootstrap_inform(device_id)).await.unwrap();
    let first_candidate = server.dispatch(device_id, CwmpMessage::DummyInput).await.unwrap();
    let transient_request = drive_discovery(&server, device_id, first_candidate).await;
    transient_names(&transient_request);

    // wait_get_transient_params only understands GetParameterValuesResponse;
    // anything else is NotHandled, which the dispatcher now treats as a
    // protocol fault and forces the machine into `error`.
    let err = server.dispatch(device_id, fault("device rejected transient poll")).await;
    assert!(err.is_err());
    assert_eq!(server.current_state(device_id).await.unwrap(), ERROR);

    server.reset_device(device_id);
    assert_eq!(
        server.current_state(device_id).await.unwrap(),
        enodeb_acsd::state_machine::states::DISCONNECTED
    );
}
