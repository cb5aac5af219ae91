//! Per-device provisioning state machine: an actor owning one `AcsState`
//! catalog, driven by inbound CWMP messages and timer callbacks delivered
//! over an mpsc channel (spec.md §5/§9 — avoids an `Arc<Mutex<_>>` back
//! reference from state to machine).

pub mod states;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

use crate::config::{AcsConfig, OperatorConfig};
use crate::data_model::DataModel;
use crate::desired_config::{ConfigPostprocessor, DesiredConfigStore};
use crate::device_config::DeviceConfigStore;
use crate::stats::StatsManager;
use crate::status::record_fault;
use crate::timer::EventLoop;
use crate::tr069::messages::CwmpMessage;
use crate::{Error, Result};

pub use states::{
    build_state_catalog, AcsMsgAndTransition, AcsReadMsgResult, AcsState, StateContext, DISCONNECTED,
};

/// Commands delivered to a running machine's actor loop.
pub enum MachineCommand {
    /// An inbound CWMP message paired with the channel to deliver the
    /// resulting outbound message on.
    Inbound {
        msg: CwmpMessage,
        reply: oneshot::Sender<Result<CwmpMessage>>,
    },
    /// A timer previously scheduled by `originating_state` has fired. Acted
    /// on only if that state is still current — a timer that fires after
    /// its state has already been left via a normal transition is stale and
    /// ignored.
    TimerFired {
        originating_state: &'static str,
        target_state: &'static str,
        error: Option<String>,
    },
    /// Operator-driven forced transition (e.g. `enodebd-acsctl force-reboot`).
    ForceTransition { target_state: &'static str },
    /// Reports the currently active state name.
    QueryState { reply: oneshot::Sender<&'static str> },
}

/// Cloneable handle to a running machine's actor. States never hold this —
/// only `AcsServer` and external callers do.
#[derive(Clone)]
pub struct AcsStateMachineHandle {
    command_tx: mpsc::Sender<MachineCommand>,
}

impl AcsStateMachineHandle {
    /// Runs one dispatch cycle: `read_msg` on the current state (maybe
    /// transitioning), then `get_msg` on whichever state is current after
    /// that (maybe transitioning again). This single algorithm reproduces
    /// every state's documented behavior, including same-cycle two-phase
    /// handling (e.g. `Disconnected`'s Inform-then-InformResponse) and
    /// internal self-loops (e.g. `CheckOptionalParams`).
    pub async fn dispatch(&self, msg: CwmpMessage) -> Result<CwmpMessage> {
        let (reply, rx) = oneshot::channel();
        self.command_tx
            .send(MachineCommand::Inbound { msg, reply })
            .await
            .map_err(|_| Error::internal("state machine actor has shut down"))?;
        rx.await.map_err(|_| Error::internal("state machine actor dropped reply"))?
    }

    pub async fn force_transition(&self, target_state: &'static str) -> Result<()> {
        self.command_tx
            .send(MachineCommand::ForceTransition { target_state })
            .await
            .map_err(|_| Error::internal("state machine actor has shut down"))
    }

    pub async fn force_reboot(&self) -> Result<()> {
        self.force_transition(states::SEND_REBOOT).await
    }

    pub async fn current_state(&self) -> Result<&'static str> {
        let (reply, rx) = oneshot::channel();
        self.command_tx
            .send(MachineCommand::QueryState { reply })
            .await
            .map_err(|_| Error::internal("state machine actor has shut down"))?;
        rx.await.map_err(|_| Error::internal("state machine actor dropped reply"))
    }
}

/// Owns the state catalog and per-device configuration stores. Runs as a
/// single task; all mutable state lives here, touched only from within
/// `run()` — no locking required across dispatch cycles.
pub struct AcsStateMachine {
    device_id: String,
    states: HashMap<&'static str, Box<dyn AcsState>>,
    current_name: &'static str,
    model: Arc<dyn DataModel>,
    device_cfg: DeviceConfigStore,
    desired_cfg: Option<DesiredConfigStore>,
    operator_cfg: Arc<OperatorConfig>,
    postprocessor: Arc<dyn ConfigPostprocessor + Send + Sync>,
    stats: Arc<StatsManager>,
    event_loop: Arc<dyn EventLoop>,
    command_tx: mpsc::Sender<MachineCommand>,
    command_rx: mpsc::Receiver<MachineCommand>,
}

impl AcsStateMachine {
    pub fn new(
        device_id: impl Into<String>,
        config: &AcsConfig,
        model: Arc<dyn DataModel>,
        postprocessor: Arc<dyn ConfigPostprocessor + Send + Sync>,
        stats: Arc<StatsManager>,
        event_loop: Arc<dyn EventLoop>,
    ) -> (Self, AcsStateMachineHandle) {
        let (command_tx, command_rx) = mpsc::channel(64);
        let states = build_state_catalog(&config.timers);

        let machine = Self {
            device_id: device_id.into(),
            states,
            current_name: DISCONNECTED,
            model,
            device_cfg: DeviceConfigStore::new(),
            desired_cfg: None,
            operator_cfg: Arc::new(config.operator.clone()),
            postprocessor,
            stats,
            event_loop,
            command_tx: command_tx.clone(),
            command_rx,
        };
        let handle = AcsStateMachineHandle { command_tx };
        (machine, handle)
    }

    fn context(&mut self) -> StateContext<'_> {
        StateContext {
            device_id: &self.device_id,
            model: self.model.as_ref(),
            device_cfg: &mut self.device_cfg,
            desired_cfg: &mut self.desired_cfg,
            operator_cfg: &self.operator_cfg,
            postprocessor: self.postprocessor.as_ref(),
            stats: &self.stats,
            event_loop: self.event_loop.as_ref(),
            command_tx: self.command_tx.clone(),
        }
    }

    fn transition_to(&mut self, next: &'static str) -> Result<()> {
        if next == self.current_name {
            return Ok(());
        }
        {
            let mut state = self
                .states
                .remove(self.current_name)
                .ok_or_else(|| Error::internal(format!("unknown state {}", self.current_name)))?;
            let mut ctx = self.context();
            let result = state.exit(&mut ctx);
            self.states.insert(self.current_name, state);
            result?;
        }
        self.current_name = next;
        {
            let mut state = self
                .states
                .remove(self.current_name)
                .ok_or_else(|| Error::internal(format!("unknown state {}", self.current_name)))?;
            let mut ctx = self.context();
            let result = state.enter(&mut ctx);
            self.states.insert(self.current_name, state);
            result?;
        }
        info!(device_id = %self.device_id, state = self.current_name, "state transition");
        Ok(())
    }

    fn force_to_error(&mut self, reason: &str) {
        warn!(device_id = %self.device_id, reason, "forcing transition to error state");
        record_fault(&self.device_id);
        if let Err(e) = self.transition_to(states::ERROR) {
            error!(device_id = %self.device_id, error = %e, "failed forcing error state");
        }
    }

    /// Routes a fault raised by a state's `read_msg`/`get_msg` per spec.md
    /// §7: a `Tr069` fault is a recoverable device-level deviation, so the
    /// machine drops into the `Error` absorbing state and stays reachable. A
    /// `Configuration` fault means the catalog/context itself is wired
    /// wrong — a programmer mistake, not a device deviation — so it is not
    /// folded into per-device `Error` handling and escalates to the host
    /// process instead.
    fn route_fault(&mut self, e: Error) -> Error {
        match &e {
            Error::Configuration(msg) => {
                error!(device_id = %self.device_id, error = msg, "unrecoverable configuration error");
                panic!("configuration error in state machine for device {}: {}", self.device_id, msg);
            }
            _ => {
                self.force_to_error(&e.to_string());
                e
            }
        }
    }

    /// One read-then-send dispatch cycle for an inbound message.
    fn dispatch_inbound(&mut self, msg: CwmpMessage) -> Result<CwmpMessage> {
        let read_result = {
            let mut state = self
                .states
                .remove(self.current_name)
                .ok_or_else(|| Error::internal(format!("unknown state {}", self.current_name)))?;
            let mut ctx = self.context();
            let result = state.read_msg(&mut ctx, msg);
            self.states.insert(self.current_name, state);
            result
        };

        match read_result {
            Ok(AcsReadMsgResult::Handled(Some(next))) => self.transition_to(next)?,
            Ok(AcsReadMsgResult::Handled(None)) => {}
            Ok(AcsReadMsgResult::NotHandled) => {
                // spec.md §4.1: a handler that declines a message is a
                // protocol deviation, not a no-op — signal a fault to the
                // caller rather than silently falling through to get_msg as
                // if the message had never arrived.
                let e = Error::tr069(format!(
                    "message not handled by state {}",
                    self.current_name
                ));
                return Err(self.route_fault(e));
            }
            Err(e) => return Err(self.route_fault(e)),
        }

        let sent = {
            let mut state = self
                .states
                .remove(self.current_name)
                .ok_or_else(|| Error::internal(format!("unknown state {}", self.current_name)))?;
            let mut ctx = self.context();
            let result = state.get_msg(&mut ctx);
            self.states.insert(self.current_name, state);
            result
        };

        let AcsMsgAndTransition { msg: outbound, next_state } = match sent {
            Ok(sent) => sent,
            Err(e) => return Err(self.route_fault(e)),
        };

        if let Some(next) = next_state {
            self.transition_to(next)?;
        }

        Ok(outbound)
    }

    fn handle_timer_fired(&mut self, originating_state: &'static str, target_state: &'static str, error: Option<String>) {
        if originating_state != self.current_name {
            warn!(
                device_id = %self.device_id,
                originating_state,
                current = self.current_name,
                "ignoring stale timer"
            );
            return;
        }
        if let Some(reason) = error {
            self.force_to_error(&reason);
            return;
        }
        if let Err(e) = self.transition_to(target_state) {
            error!(device_id = %self.device_id, error = %e, "timer-driven transition failed");
        }
    }

    /// Runs the actor loop until the command channel is closed (i.e. every
    /// `AcsStateMachineHandle` has been dropped).
    pub async fn run(mut self) {
        while let Some(command) = self.command_rx.recv().await {
            match command {
                MachineCommand::Inbound { msg, reply } => {
                    let result = self.dispatch_inbound(msg);
                    let _ = reply.send(result);
                }
                MachineCommand::TimerFired {
                    originating_state,
                    target_state,
                    error,
                } => self.handle_timer_fired(originating_state, target_state, error),
                MachineCommand::ForceTransition { target_state } => {
                    if let Err(e) = self.transition_to(target_state) {
                        error!(device_id = %self.device_id, error = %e, "forced transition failed");
                    }
                }
                MachineCommand::QueryState { reply } => {
                    let _ = reply.send(self.current_name);
                }
            }
        }
        info!(device_id = %self.device_id, "state machine actor stopped");
    }

    pub fn current_state(&self) -> &'static str {
        self.current_name
    }
}
