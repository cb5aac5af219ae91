//! ACS daemon shell: owns one state machine actor per device and the HTTP
//! dispatch seam a real CWMP transport layer would call into.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::info;

use crate::config::AcsConfig;
use crate::data_model::DataModel;
use crate::desired_config::ConfigPostprocessor;
use crate::stats::StatsManager;
use crate::state_machine::{AcsStateMachine, AcsStateMachineHandle};
use crate::timer::EventLoop;
use crate::tr069::messages::CwmpMessage;
use crate::{Error, Result};

/// Multi-device ACS server. Each device gets its own long-lived state
/// machine actor; `DashMap` gives lock-free concurrent lookup across the
/// many devices an ACS instance serves (spec.md §5).
pub struct AcsServer {
    config: Arc<AcsConfig>,
    model: Arc<dyn DataModel>,
    postprocessor: Arc<dyn ConfigPostprocessor + Send + Sync>,
    stats: Arc<StatsManager>,
    event_loop: Arc<dyn EventLoop>,
    machines: DashMap<String, AcsStateMachineHandle>,
}

impl AcsServer {
    pub fn new(
        config: AcsConfig,
        model: Arc<dyn DataModel>,
        postprocessor: Arc<dyn ConfigPostprocessor + Send + Sync>,
        event_loop: Arc<dyn EventLoop>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            model,
            postprocessor,
            stats: Arc::new(StatsManager::new()),
            event_loop,
            machines: DashMap::new(),
        }
    }

    /// Looks up the device's machine, spawning a fresh one on first contact.
    /// Uses `DashMap::entry` rather than a separate get-then-insert so two
    /// concurrent first-contact dispatches for the same device can't each
    /// spawn their own machine and strand one of them outside the map.
    fn handle_for(&self, device_id: &str) -> AcsStateMachineHandle {
        self.machines
            .entry(device_id.to_string())
            .or_insert_with(|| {
                let handle = self.spawn_machine(device_id);
                info!(device_id, "spawned new state machine");
                handle
            })
            .clone()
    }

    fn spawn_machine(&self, device_id: &str) -> AcsStateMachineHandle {
        let (machine, handle) = AcsStateMachine::new(
            device_id.to_string(),
            &self.config,
            Arc::clone(&self.model),
            Arc::clone(&self.postprocessor),
            Arc::clone(&self.stats),
            Arc::clone(&self.event_loop),
        );
        tokio::spawn(machine.run());
        handle
    }

    /// Discards and respawns a device's machine. Reboot-triggered desired-
    /// config invalidation happens inside `WaitRebootDelayState` itself
    /// (see `state_machine::states`); this is an operator-facing reset for
    /// recovering a device stuck in `error` or otherwise desynced.
    pub fn reset_device(&self, device_id: &str) -> AcsStateMachineHandle {
        let handle = self.spawn_machine(device_id);
        self.machines.insert(device_id.to_string(), handle.clone());
        info!(device_id, "reset state machine");
        handle
    }

    /// The single seam a transport layer (HTTP server, test harness) calls
    /// into: one inbound CWMP message for a device in, one outbound out.
    pub async fn dispatch(&self, device_id: &str, inbound: CwmpMessage) -> Result<CwmpMessage> {
        let handle = self.handle_for(device_id);
        handle.dispatch(inbound).await
    }

    pub async fn force_reboot(&self, device_id: &str) -> Result<()> {
        let handle = self
            .machines
            .get(device_id)
            .ok_or_else(|| Error::internal(format!("unknown device {}", device_id)))?
            .clone();
        handle.force_reboot().await
    }

    pub async fn current_state(&self, device_id: &str) -> Result<&'static str> {
        let handle = self
            .machines
            .get(device_id)
            .ok_or_else(|| Error::internal(format!("unknown device {}", device_id)))?
            .clone();
        handle.current_state().await
    }

    pub fn device_count(&self) -> usize {
        self.machines.len()
    }

    pub fn config(&self) -> &AcsConfig {
        &self.config
    }

    pub fn stats(&self) -> Arc<StatsManager> {
        Arc::clone(&self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_model::EnodebDataModel;
    use crate::desired_config::NoopPostprocessor;
    use crate::timer::TokioEventLoop;
    use crate::tr069::messages::{DeviceIdStruct, EventStruct};

    fn test_server() -> AcsServer {
        AcsServer::new(
            AcsConfig::default_config(),
            Arc::new(EnodebDataModel::new()),
            Arc::new(NoopPostprocessor),
            Arc::new(TokioEventLoop),
        )
    }

    #[tokio::test]
    async fn first_contact_spawns_a_machine() {
        let server = test_server();
        assert_eq!(server.device_count(), 0);

        let inform = CwmpMessage::Inform {
            device_id: DeviceIdStruct {
                manufacturer: "Baicells".into(),
                oui: "ABCDEF".into(),
                product_class: "eNB".into(),
                serial_number: "1".into(),
            },
            events: vec![EventStruct {
                event_code: "0 BOOTSTRAP".into(),
                command_key: String::new(),
            }],
            parameter_list: vec![],
        };

        let response = server.dispatch("enb-1", inform).await.unwrap();
        assert!(matches!(response, CwmpMessage::InformResponse { .. }));
        assert_eq!(server.device_count(), 1);
    }

    #[tokio::test]
    async fn force_reboot_on_unknown_device_errors() {
        let server = test_server();
        assert!(server.force_reboot("nonexistent").await.is_err());
    }
}
