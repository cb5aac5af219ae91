//! The concrete state catalog: one struct per named state, behind a single
//! `AcsState` trait. States are long-lived — one instance per state name per
//! machine — and carry their transition targets as constructor fields, with
//! per-visit data reset in `enter()` and released in `exit()`.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{error, warn};

use crate::config::{OperatorConfig, TimerConfig};
use crate::data_model::{DataModel, NativeValue, ParameterName};
use crate::desired_config::{build_desired_config, ConfigPostprocessor, DesiredConfigStore};
use crate::device_config::{ConfigStore, DeviceConfigStore, ObjectId};
use crate::reconcile;
use crate::stats::StatsManager;
use crate::status::{get_enodeb_status, record_reboot, update_status_metrics};
use crate::timer::{EventLoop, TimerHandle};
use crate::tr069::messages::{
    CwmpMessage, EventStruct, FaultCode, ParameterValueStruct, INFORM_EVENT_CODE_M_REBOOT,
};
use crate::{Error, Result};

use super::MachineCommand;

/// Outcome of a state's `read_msg`. `Handled(None)` is the self-loop case:
/// the dispatcher stays on the same state and re-asks it for an outbound.
#[derive(Debug)]
pub enum AcsReadMsgResult {
    NotHandled,
    Handled(Option<&'static str>),
}

#[derive(Debug)]
pub struct AcsMsgAndTransition {
    pub msg: CwmpMessage,
    pub next_state: Option<&'static str>,
}

/// Per-dispatch context, passed by the dispatcher rather than owned by the
/// state — states hold no back-pointer to the machine (spec's "weak
/// reference, not ownership" guidance), avoiding any `Arc`/`Rc` cycle.
pub struct StateContext<'a> {
    pub device_id: &'a str,
    pub model: &'a dyn DataModel,
    pub device_cfg: &'a mut DeviceConfigStore,
    pub desired_cfg: &'a mut Option<DesiredConfigStore>,
    pub operator_cfg: &'a OperatorConfig,
    pub postprocessor: &'a dyn ConfigPostprocessor,
    pub stats: &'a StatsManager,
    pub event_loop: &'a dyn EventLoop,
    pub command_tx: mpsc::Sender<MachineCommand>,
}

pub trait AcsState: Send {
    fn name(&self) -> &'static str;

    fn enter(&mut self, _ctx: &mut StateContext<'_>) -> Result<()> {
        Ok(())
    }

    fn exit(&mut self, _ctx: &mut StateContext<'_>) -> Result<()> {
        Ok(())
    }

    fn read_msg(&mut self, _ctx: &mut StateContext<'_>, _msg: CwmpMessage) -> Result<AcsReadMsgResult> {
        Err(Error::configuration(format!("{} has no read handler", self.name())))
    }

    fn get_msg(&mut self, _ctx: &mut StateContext<'_>) -> Result<AcsMsgAndTransition> {
        Err(Error::configuration(format!("{} has no send handler", self.name())))
    }
}

fn apply_inform_parameter_list(ctx: &mut StateContext<'_>, parameter_list: &[ParameterValueStruct]) {
    for pv in parameter_list {
        if let Some(name) = resolve_parameter_by_path(ctx.model, &pv.name) {
            if let Ok(native) = ctx.model.to_native(name, &pv.value) {
                ctx.device_cfg.set_parameter(name, native);
            }
        }
    }
}

/// Reverse path→name lookup over the model's known scalars. Linear scan is
/// fine — Inform parameter lists are small and this runs once per Inform.
fn resolve_parameter_by_path(model: &dyn DataModel, path: &str) -> Option<ParameterName> {
    model
        .known_scalar_names()
        .into_iter()
        .find(|&name| model.get_parameter(name).map(|s| s.path) == Some(path.to_string()))
}

fn schedule_timer(
    ctx: &mut StateContext<'_>,
    seconds: u64,
    originating_state: &'static str,
    target_state: &'static str,
    error: Option<String>,
) -> TimerHandle {
    let tx = ctx.command_tx.clone();
    ctx.event_loop.call_later(
        seconds,
        Box::new(move || {
            Box::pin(async move {
                let _ = tx
                    .send(MachineCommand::TimerFired {
                        originating_state,
                        target_state,
                        error,
                    })
                    .await;
            })
        }),
    )
}

// ---------------------------------------------------------------------
// Disconnected / UnexpectedInform / BaicellsDisconnected
// ---------------------------------------------------------------------

pub const DISCONNECTED: &str = "disconnected";
pub const UNEXPECTED_INFORM: &str = "unexpected_inform";
pub const BAICELLS_DISCONNECTED: &str = "baicells_disconnected";

/// Terminal-idle entry point: reads the initial/periodic `Inform`, replies
/// `InformResponse`, and hands off to the configured after-inform target.
pub struct DisconnectedState {
    name: &'static str,
    after_inform_target: &'static str,
    reset_desired_on_enter: bool,
}

impl DisconnectedState {
    pub fn new(name: &'static str, after_inform_target: &'static str) -> Self {
        Self {
            name,
            after_inform_target,
            reset_desired_on_enter: false,
        }
    }

    /// `UnexpectedInform`'s variant: a re-inform mid-cycle invalidates the
    /// desired config cache so the next provisioning pass rebuilds it.
    pub fn unexpected_inform(after_inform_target: &'static str) -> Self {
        Self {
            name: UNEXPECTED_INFORM,
            after_inform_target,
            reset_desired_on_enter: true,
        }
    }
}

impl AcsState for DisconnectedState {
    fn name(&self) -> &'static str {
        self.name
    }

    fn enter(&mut self, ctx: &mut StateContext<'_>) -> Result<()> {
        if self.reset_desired_on_enter {
            *ctx.desired_cfg = None;
        }
        Ok(())
    }

    fn read_msg(&mut self, ctx: &mut StateContext<'_>, msg: CwmpMessage) -> Result<AcsReadMsgResult> {
        match msg {
            CwmpMessage::Inform { parameter_list, .. } => {
                apply_inform_parameter_list(ctx, &parameter_list);
                Ok(AcsReadMsgResult::Handled(None))
            }
            _ => Ok(AcsReadMsgResult::NotHandled),
        }
    }

    fn get_msg(&mut self, _ctx: &mut StateContext<'_>) -> Result<AcsMsgAndTransition> {
        Ok(AcsMsgAndTransition {
            msg: CwmpMessage::InformResponse { max_envelopes: 1 },
            next_state: Some(self.after_inform_target),
        })
    }
}

// ---------------------------------------------------------------------
// BaicellsRemWait
// ---------------------------------------------------------------------

pub const BAICELLS_REM_WAIT: &str = "baicells_rem_wait";

/// Vendor-specific delay state: certain firmware refuses configuration
/// during boot-time radio environment measurement.
pub struct BaicellsRemWaitState {
    target: &'static str,
    wait_seconds: u64,
    timer: Option<TimerHandle>,
}

impl BaicellsRemWaitState {
    pub fn new(target: &'static str, wait_seconds: u64) -> Self {
        Self {
            target,
            wait_seconds,
            timer: None,
        }
    }
}

impl AcsState for BaicellsRemWaitState {
    fn name(&self) -> &'static str {
        BAICELLS_REM_WAIT
    }

    fn enter(&mut self, ctx: &mut StateContext<'_>) -> Result<()> {
        self.timer = Some(schedule_timer(ctx, self.wait_seconds, BAICELLS_REM_WAIT, self.target, None));
        Ok(())
    }

    fn exit(&mut self, _ctx: &mut StateContext<'_>) -> Result<()> {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        Ok(())
    }

    fn read_msg(&mut self, _ctx: &mut StateContext<'_>, _msg: CwmpMessage) -> Result<AcsReadMsgResult> {
        Ok(AcsReadMsgResult::Handled(None))
    }

    fn get_msg(&mut self, _ctx: &mut StateContext<'_>) -> Result<AcsMsgAndTransition> {
        Ok(AcsMsgAndTransition {
            msg: CwmpMessage::DummyInput,
            next_state: None,
        })
    }
}

// ---------------------------------------------------------------------
// WaitEmptyMessage
// ---------------------------------------------------------------------

pub const WAIT_EMPTY_MESSAGE: &str = "wait_empty_message";

pub struct WaitEmptyMessageState {
    target: &'static str,
}

impl WaitEmptyMessageState {
    pub fn new(target: &'static str) -> Self {
        Self { target }
    }
}

impl AcsState for WaitEmptyMessageState {
    fn name(&self) -> &'static str {
        WAIT_EMPTY_MESSAGE
    }

    fn read_msg(&mut self, _ctx: &mut StateContext<'_>, msg: CwmpMessage) -> Result<AcsReadMsgResult> {
        match msg {
            CwmpMessage::DummyInput => Ok(AcsReadMsgResult::Handled(Some(self.target))),
            _ => Ok(AcsReadMsgResult::NotHandled),
        }
    }
}

// ---------------------------------------------------------------------
// CheckOptionalParams
// ---------------------------------------------------------------------

pub const CHECK_OPTIONAL_PARAMS: &str = "check_optional_params";

pub struct CheckOptionalParamsState {
    target: &'static str,
    current_candidate: Option<ParameterName>,
}

impl CheckOptionalParamsState {
    pub fn new(target: &'static str) -> Self {
        Self {
            target,
            current_candidate: None,
        }
    }
}

impl AcsState for CheckOptionalParamsState {
    fn name(&self) -> &'static str {
        CHECK_OPTIONAL_PARAMS
    }

    fn enter(&mut self, ctx: &mut StateContext<'_>) -> Result<()> {
        self.current_candidate = reconcile::optional_param_to_check(ctx.model);
        Ok(())
    }

    fn read_msg(&mut self, ctx: &mut StateContext<'_>, msg: CwmpMessage) -> Result<AcsReadMsgResult> {
        let candidate = self
            .current_candidate
            .ok_or_else(|| Error::invalid_state("no optional parameter candidate pending"))?;

        match msg {
            CwmpMessage::Fault { .. } => {
                ctx.model.set_parameter_presence(candidate, false);
            }
            CwmpMessage::GetParameterValuesResponse { parameter_list } => {
                ctx.model.set_parameter_presence(candidate, true);
                if let Some(pv) = parameter_list.first() {
                    if let Ok(native) = ctx.model.to_native(candidate, &pv.value) {
                        ctx.device_cfg.set_parameter(candidate, native);
                    }
                }
            }
            _ => return Ok(AcsReadMsgResult::NotHandled),
        }

        self.current_candidate = reconcile::optional_param_to_check(ctx.model);
        if self.current_candidate.is_some() {
            Ok(AcsReadMsgResult::Handled(None))
        } else {
            Ok(AcsReadMsgResult::Handled(Some(self.target)))
        }
    }

    fn get_msg(&mut self, ctx: &mut StateContext<'_>) -> Result<AcsMsgAndTransition> {
        let candidate = self
            .current_candidate
            .ok_or_else(|| Error::tr069("Invalid State"))?;
        let spec = ctx
            .model
            .get_parameter(candidate)
            .ok_or_else(|| Error::tr069(format!("unknown parameter {}", candidate)))?;
        Ok(AcsMsgAndTransition {
            msg: CwmpMessage::get_parameter_values(vec![spec.path]),
            next_state: None,
        })
    }
}

// ---------------------------------------------------------------------
// SendGetTransientParameters / WaitGetTransientParameters
// ---------------------------------------------------------------------

pub const SEND_GET_TRANSIENT_PARAMS: &str = "send_get_transient_params";
pub const WAIT_GET_TRANSIENT_PARAMS: &str = "wait_get_transient_params";

pub struct SendGetTransientParametersState {
    target: &'static str,
}

impl SendGetTransientParametersState {
    pub fn new(target: &'static str) -> Self {
        Self { target }
    }
}

impl AcsState for SendGetTransientParametersState {
    fn name(&self) -> &'static str {
        SEND_GET_TRANSIENT_PARAMS
    }

    fn get_msg(&mut self, ctx: &mut StateContext<'_>) -> Result<AcsMsgAndTransition> {
        let names: Vec<String> = ParameterName::TRANSIENT
            .iter()
            .filter(|&&name| ctx.model.get_parameter(name).is_some())
            .filter_map(|&name| ctx.model.get_parameter(name).map(|s| s.path))
            .collect();
        Ok(AcsMsgAndTransition {
            msg: CwmpMessage::get_parameter_values(names),
            next_state: Some(self.target),
        })
    }
}

/// The ladder `WaitGetTransientParameters` uses to pick the next
/// provisioning step (see `ObjectLadderTargets` for the sibling ladder
/// `WaitGetObjectParameters` uses once object discovery has run).
pub struct LadderTargets {
    pub get_params: &'static str,
    pub get_obj_params: &'static str,
    pub delete_obj: &'static str,
    pub add_obj: &'static str,
    pub set_params: &'static str,
    pub skip: &'static str,
}

pub struct WaitGetTransientParametersState {
    ladder: LadderTargets,
}

impl WaitGetTransientParametersState {
    pub fn new(ladder: LadderTargets) -> Self {
        Self { ladder }
    }
}

impl AcsState for WaitGetTransientParametersState {
    fn name(&self) -> &'static str {
        WAIT_GET_TRANSIENT_PARAMS
    }

    fn read_msg(&mut self, ctx: &mut StateContext<'_>, msg: CwmpMessage) -> Result<AcsReadMsgResult> {
        let parameter_list = match msg {
            CwmpMessage::GetParameterValuesResponse { parameter_list } => parameter_list,
            _ => return Ok(AcsReadMsgResult::NotHandled),
        };

        let prior_rf_tx = ctx
            .device_cfg
            .get_parameter(ParameterName::RfTxStatus)
            .and_then(NativeValue::as_bool);

        apply_inform_parameter_list(ctx, &parameter_list);

        let new_rf_tx = ctx
            .device_cfg
            .get_parameter(ParameterName::RfTxStatus)
            .and_then(NativeValue::as_bool);

        if prior_rf_tx == Some(true) && new_rf_tx == Some(false) {
            ctx.stats.clear_stats(ctx.device_id);
        }

        let status = get_enodeb_status(ctx.device_cfg, ctx.model);
        update_status_metrics(ctx.device_id, &status);

        // Built here, not only in WaitGetObjectParameters: a device with zero
        // existing object instances (e.g. NumPlmns == 0) never produces any
        // object_params_to_get, so WaitGetObjectParameters is never visited
        // this cycle. Without building desired here first, the delete_obj/
        // add_obj checks below would compare against an empty placeholder and
        // miss a genuinely desired new object. Guarded the same way as every
        // other build site, so it still runs at most once per cycle.
        if ctx.desired_cfg.is_none() {
            *ctx.desired_cfg = Some(build_desired_config(
                ctx.operator_cfg,
                ctx.device_cfg,
                ctx.model,
                ctx.postprocessor,
            ));
        }
        let desired = ctx.desired_cfg.as_ref().expect("just built above");

        let next = if !reconcile::params_to_get(ctx.device_cfg, ctx.model).is_empty() {
            self.ladder.get_params
        } else if !reconcile::object_params_to_get(desired, ctx.device_cfg, ctx.model).is_empty() {
            self.ladder.get_obj_params
        } else if !reconcile::objects_to_delete(desired, ctx.device_cfg).is_empty() {
            self.ladder.delete_obj
        } else if !reconcile::objects_to_add(desired, ctx.device_cfg).is_empty() {
            self.ladder.add_obj
        } else if !reconcile::param_values_to_set(desired, ctx.device_cfg, false).is_empty()
            || !reconcile::obj_param_values_to_set(desired, ctx.device_cfg).is_empty()
        {
            // Steady-state status poll with an actual diff to apply (e.g. an
            // operator config change) still needs to reach SetParameterValues.
            self.ladder.set_params
        } else {
            // Device already matches desired config: this is the ordinary
            // steady-state poll spec.md §1/§2 describes, not a provisioning
            // cycle, so go idle rather than driving a needless reboot.
            self.ladder.skip
        };

        Ok(AcsReadMsgResult::Handled(Some(next)))
    }
}

// ---------------------------------------------------------------------
// GetParameters / WaitGetParameters
// ---------------------------------------------------------------------

pub const GET_PARAMETERS: &str = "get_parameters";
pub const WAIT_GET_PARAMETERS: &str = "wait_get_parameters";

pub struct GetParametersState {
    target: &'static str,
}

impl GetParametersState {
    pub fn new(target: &'static str) -> Self {
        Self { target }
    }
}

impl AcsState for GetParametersState {
    fn name(&self) -> &'static str {
        GET_PARAMETERS
    }

    fn read_msg(&mut self, _ctx: &mut StateContext<'_>, msg: CwmpMessage) -> Result<AcsReadMsgResult> {
        match msg {
            CwmpMessage::DummyInput => Ok(AcsReadMsgResult::Handled(None)),
            _ => Ok(AcsReadMsgResult::NotHandled),
        }
    }

    fn get_msg(&mut self, ctx: &mut StateContext<'_>) -> Result<AcsMsgAndTransition> {
        let names: Vec<String> = reconcile::params_to_get(ctx.device_cfg, ctx.model)
            .into_iter()
            .filter_map(|name| ctx.model.get_parameter(name).map(|s| s.path))
            .collect();
        Ok(AcsMsgAndTransition {
            msg: CwmpMessage::get_parameter_values(names),
            next_state: Some(self.target),
        })
    }
}

pub struct WaitGetParametersState {
    target: &'static str,
}

impl WaitGetParametersState {
    pub fn new(target: &'static str) -> Self {
        Self { target }
    }
}

impl AcsState for WaitGetParametersState {
    fn name(&self) -> &'static str {
        WAIT_GET_PARAMETERS
    }

    fn read_msg(&mut self, ctx: &mut StateContext<'_>, msg: CwmpMessage) -> Result<AcsReadMsgResult> {
        match msg {
            CwmpMessage::GetParameterValuesResponse { parameter_list } => {
                apply_inform_parameter_list(ctx, &parameter_list);
                Ok(AcsReadMsgResult::Handled(Some(self.target)))
            }
            _ => Ok(AcsReadMsgResult::NotHandled),
        }
    }
}

// ---------------------------------------------------------------------
// GetObjectParameters / WaitGetObjectParameters
// ---------------------------------------------------------------------

pub const GET_OBJECT_PARAMETERS: &str = "get_object_parameters";
pub const WAIT_GET_OBJECT_PARAMETERS: &str = "wait_get_object_parameters";

pub struct GetObjectParametersState {
    target: &'static str,
}

impl GetObjectParametersState {
    pub fn new(target: &'static str) -> Self {
        Self { target }
    }
}

impl AcsState for GetObjectParametersState {
    fn name(&self) -> &'static str {
        GET_OBJECT_PARAMETERS
    }

    fn get_msg(&mut self, ctx: &mut StateContext<'_>) -> Result<AcsMsgAndTransition> {
        let empty = ConfigStore::new();
        let desired = ctx.desired_cfg.as_ref().unwrap_or(&empty);
        let names = reconcile::object_params_to_get(desired, ctx.device_cfg, ctx.model);
        Ok(AcsMsgAndTransition {
            msg: CwmpMessage::get_parameter_values(names),
            next_state: Some(self.target),
        })
    }
}

pub struct ObjectLadderTargets {
    pub delete_obj: &'static str,
    pub add_obj: &'static str,
    pub set_params: &'static str,
    pub skip: &'static str,
}

pub struct WaitGetObjectParametersState {
    ladder: ObjectLadderTargets,
}

impl WaitGetObjectParametersState {
    pub fn new(ladder: ObjectLadderTargets) -> Self {
        Self { ladder }
    }
}

impl AcsState for WaitGetObjectParametersState {
    fn name(&self) -> &'static str {
        WAIT_GET_OBJECT_PARAMETERS
    }

    fn read_msg(&mut self, ctx: &mut StateContext<'_>, msg: CwmpMessage) -> Result<AcsReadMsgResult> {
        let parameter_list = match msg {
            CwmpMessage::GetParameterValuesResponse { parameter_list } => parameter_list,
            _ => return Ok(AcsReadMsgResult::NotHandled),
        };

        let mut by_path: HashMap<String, String> = HashMap::new();
        for pv in parameter_list {
            by_path.insert(pv.name, pv.value);
        }

        let num_plmns = ctx
            .device_cfg
            .get_parameter(ParameterName::NumPlmns)
            .and_then(NativeValue::as_u64)
            .unwrap_or(0);

        for instance in 1..=num_plmns {
            let id = ObjectId::new("Plmn", instance as u32);
            for &sub in ParameterName::PLMN_SUB_PARAMS {
                let spec = match ctx.model.get_parameter(sub) {
                    Some(s) => s,
                    None => continue,
                };
                let path = spec.path.replace("{}", &instance.to_string());
                if let Some(wire) = by_path.get(&path) {
                    if let Ok(native) = ctx.model.to_native(sub, wire) {
                        ctx.device_cfg.set_parameter_for_object(&id, sub, native);
                    }
                }
            }
        }

        if ctx.desired_cfg.is_none() {
            *ctx.desired_cfg = Some(build_desired_config(
                ctx.operator_cfg,
                ctx.device_cfg,
                ctx.model,
                ctx.postprocessor,
            ));
        }

        let desired = ctx.desired_cfg.as_ref().expect("just built above");
        let next = if !reconcile::objects_to_delete(desired, ctx.device_cfg).is_empty() {
            self.ladder.delete_obj
        } else if !reconcile::objects_to_add(desired, ctx.device_cfg).is_empty() {
            self.ladder.add_obj
        } else if !reconcile::param_values_to_set(desired, ctx.device_cfg, false).is_empty()
            || !reconcile::obj_param_values_to_set(desired, ctx.device_cfg).is_empty()
        {
            self.ladder.set_params
        } else {
            self.ladder.skip
        };

        Ok(AcsReadMsgResult::Handled(Some(next)))
    }
}

// ---------------------------------------------------------------------
// DeleteObjects / AddObjects
// ---------------------------------------------------------------------

pub const DELETE_OBJECTS: &str = "delete_objects";
pub const ADD_OBJECTS: &str = "add_objects";

pub struct DeleteObjectsState {
    add_target: &'static str,
    skip_target: &'static str,
    pending: Option<ObjectId>,
}

impl DeleteObjectsState {
    pub fn new(add_target: &'static str, skip_target: &'static str) -> Self {
        Self {
            add_target,
            skip_target,
            pending: None,
        }
    }
}

impl AcsState for DeleteObjectsState {
    fn name(&self) -> &'static str {
        DELETE_OBJECTS
    }

    fn get_msg(&mut self, ctx: &mut StateContext<'_>) -> Result<AcsMsgAndTransition> {
        let empty = ConfigStore::new();
        let desired = ctx.desired_cfg.as_ref().unwrap_or(&empty);
        let to_delete = reconcile::objects_to_delete(desired, ctx.device_cfg);
        let id = to_delete
            .into_iter()
            .next()
            .ok_or_else(|| Error::invalid_state("no object pending deletion"))?;
        let object_name = format!("{}.{}.", id.template, id.instance);
        self.pending = Some(id);
        Ok(AcsMsgAndTransition {
            msg: CwmpMessage::DeleteObject {
                object_name,
                parameter_key: String::new(),
            },
            next_state: None,
        })
    }

    fn read_msg(&mut self, ctx: &mut StateContext<'_>, msg: CwmpMessage) -> Result<AcsReadMsgResult> {
        match msg {
            CwmpMessage::DeleteObjectResponse { status } if status == 0 => {
                let id = self
                    .pending
                    .take()
                    .ok_or_else(|| Error::invalid_state("no delete pending"))?;
                ctx.device_cfg.delete_object(&id);

                let empty = ConfigStore::new();
                let desired = ctx.desired_cfg.as_ref().unwrap_or(&empty);
                if !reconcile::objects_to_delete(desired, ctx.device_cfg).is_empty() {
                    Ok(AcsReadMsgResult::Handled(None))
                } else if reconcile::objects_to_add(desired, ctx.device_cfg).is_empty() {
                    Ok(AcsReadMsgResult::Handled(Some(self.skip_target)))
                } else {
                    Ok(AcsReadMsgResult::Handled(Some(self.add_target)))
                }
            }
            CwmpMessage::DeleteObjectResponse { .. } => Err(Error::tr069("delete object failed")),
            CwmpMessage::Fault { fault_string, .. } => Err(Error::tr069(fault_string)),
            _ => Ok(AcsReadMsgResult::NotHandled),
        }
    }
}

pub struct AddObjectsState {
    target: &'static str,
    pending_template: Option<String>,
}

impl AddObjectsState {
    pub fn new(target: &'static str) -> Self {
        Self {
            target,
            pending_template: None,
        }
    }
}

impl AcsState for AddObjectsState {
    fn name(&self) -> &'static str {
        ADD_OBJECTS
    }

    fn get_msg(&mut self, ctx: &mut StateContext<'_>) -> Result<AcsMsgAndTransition> {
        let empty = ConfigStore::new();
        let desired = ctx.desired_cfg.as_ref().unwrap_or(&empty);
        let to_add = reconcile::objects_to_add(desired, ctx.device_cfg);
        let template = to_add
            .into_iter()
            .next()
            .ok_or_else(|| Error::invalid_state("no object pending addition"))?;
        self.pending_template = Some(template.clone());
        Ok(AcsMsgAndTransition {
            msg: CwmpMessage::AddObject {
                object_name: template,
                parameter_key: String::new(),
            },
            next_state: None,
        })
    }

    fn read_msg(&mut self, ctx: &mut StateContext<'_>, msg: CwmpMessage) -> Result<AcsReadMsgResult> {
        match msg {
            CwmpMessage::AddObjectResponse { status, instance_number } if status == 0 => {
                let template = self
                    .pending_template
                    .take()
                    .ok_or_else(|| Error::invalid_state("no add pending"))?;
                let base = template.trim_end_matches('.').to_string();
                ctx.device_cfg.add_object(ObjectId::new(base, instance_number));

                let empty = ConfigStore::new();
                let desired = ctx.desired_cfg.as_ref().unwrap_or(&empty);
                if !reconcile::objects_to_add(desired, ctx.device_cfg).is_empty() {
                    Ok(AcsReadMsgResult::Handled(None))
                } else {
                    Ok(AcsReadMsgResult::Handled(Some(self.target)))
                }
            }
            CwmpMessage::AddObjectResponse { .. } => Err(Error::tr069("add object failed")),
            CwmpMessage::Fault { fault_string, .. } => Err(Error::tr069(fault_string)),
            _ => Ok(AcsReadMsgResult::NotHandled),
        }
    }
}

// ---------------------------------------------------------------------
// SetParameterValues / SetParameterValuesNotAdmin / WaitSetParameterValues
// ---------------------------------------------------------------------

pub const SET_PARAMETER_VALUES: &str = "set_parameter_values";
pub const SET_PARAMETER_VALUES_NOT_ADMIN: &str = "set_parameter_values_not_admin";
pub const WAIT_SET_PARAMETER_VALUES: &str = "wait_set_parameter_values";

fn wire_type_tag(param_type: crate::data_model::ParamType) -> &'static str {
    use crate::data_model::ParamType;
    match param_type {
        ParamType::Int => "xsd:int",
        ParamType::UnsignedInt => "xsd:unsignedInt",
        ParamType::Boolean => "xsd:boolean",
        ParamType::String => "xsd:string",
    }
}

pub struct SetParameterValuesState {
    name: &'static str,
    target: &'static str,
    exclude_admin: bool,
}

impl SetParameterValuesState {
    pub fn new(target: &'static str) -> Self {
        Self {
            name: SET_PARAMETER_VALUES,
            target,
            exclude_admin: false,
        }
    }

    pub fn not_admin(target: &'static str) -> Self {
        Self {
            name: SET_PARAMETER_VALUES_NOT_ADMIN,
            target,
            exclude_admin: true,
        }
    }
}

impl AcsState for SetParameterValuesState {
    fn name(&self) -> &'static str {
        self.name
    }

    fn get_msg(&mut self, ctx: &mut StateContext<'_>) -> Result<AcsMsgAndTransition> {
        // WaitGetObjectParameters is the usual place desired config gets
        // built, but WaitGetTransientParameters's ladder can reach `skip`
        // (and so land here) without ever visiting it, e.g. when nothing on
        // the device needs a scalar/object GET this cycle. Build it here too
        // so that path isn't left without a diff to work from.
        if ctx.desired_cfg.is_none() {
            *ctx.desired_cfg = Some(build_desired_config(
                ctx.operator_cfg,
                ctx.device_cfg,
                ctx.model,
                ctx.postprocessor,
            ));
        }
        let desired = ctx.desired_cfg.as_ref().expect("just built above");

        let scalar_diffs = reconcile::param_values_to_set(desired, ctx.device_cfg, self.exclude_admin);
        let obj_diffs = reconcile::obj_param_values_to_set(desired, ctx.device_cfg);

        let mut parameter_list = Vec::new();
        for (name, value) in &scalar_diffs {
            let spec = ctx
                .model
                .get_parameter(*name)
                .ok_or_else(|| Error::tr069(format!("unknown parameter {}", name)))?;
            let wire = ctx.model.to_device(*name, value)?;
            parameter_list.push(ParameterValueStruct {
                name: spec.path,
                value: wire,
                value_type: wire_type_tag(spec.param_type).to_string(),
            });
        }
        for (id, sub_values) in &obj_diffs {
            for (name, value) in sub_values {
                let spec = ctx
                    .model
                    .get_parameter(*name)
                    .ok_or_else(|| Error::tr069(format!("unknown parameter {}", name)))?;
                let wire = ctx.model.to_device(*name, value)?;
                parameter_list.push(ParameterValueStruct {
                    name: spec.path.replace("{}", &id.instance.to_string()),
                    value: wire,
                    value_type: wire_type_tag(spec.param_type).to_string(),
                });
            }
        }

        Ok(AcsMsgAndTransition {
            msg: CwmpMessage::set_parameter_values(parameter_list, String::new()),
            next_state: Some(self.target),
        })
    }
}

pub struct WaitSetParameterValuesState {
    target: &'static str,
    exclude_admin: bool,
}

impl WaitSetParameterValuesState {
    pub fn new(target: &'static str) -> Self {
        Self {
            target,
            exclude_admin: false,
        }
    }
}

impl AcsState for WaitSetParameterValuesState {
    fn name(&self) -> &'static str {
        WAIT_SET_PARAMETER_VALUES
    }

    fn read_msg(&mut self, ctx: &mut StateContext<'_>, msg: CwmpMessage) -> Result<AcsReadMsgResult> {
        match msg {
            CwmpMessage::SetParameterValuesResponse { status } if status == 0 => {
                let empty = ConfigStore::new();
                let desired = ctx.desired_cfg.as_ref().unwrap_or(&empty);
                let scalar_diffs =
                    reconcile::param_values_to_set(desired, ctx.device_cfg, self.exclude_admin);
                let obj_diffs = reconcile::obj_param_values_to_set(desired, ctx.device_cfg);

                for (name, value) in scalar_diffs {
                    ctx.device_cfg.set_parameter(name, value);
                }
                for (id, sub_values) in obj_diffs {
                    for (name, value) in sub_values {
                        ctx.device_cfg.set_parameter_for_object(&id, name, value);
                    }
                }

                Ok(AcsReadMsgResult::Handled(Some(self.target)))
            }
            CwmpMessage::SetParameterValuesResponse { .. } => {
                Err(Error::tr069("set parameter values failed with non-zero status"))
            }
            CwmpMessage::Fault {
                fault_string,
                parameter_faults,
                ..
            } => {
                for detail in &parameter_faults {
                    error!(
                        parameter = %detail.parameter_name,
                        code = %detail.fault_code,
                        message = %detail.fault_string,
                        "set parameter value fault"
                    );
                }
                Err(Error::tr069(fault_string))
            }
            _ => Ok(AcsReadMsgResult::NotHandled),
        }
    }
}

// ---------------------------------------------------------------------
// SendReboot / WaitRebootResponse
// ---------------------------------------------------------------------

pub const SEND_REBOOT: &str = "send_reboot";
pub const WAIT_REBOOT_RESPONSE: &str = "wait_reboot_response";

pub struct SendRebootState {
    target: &'static str,
}

impl SendRebootState {
    pub fn new(target: &'static str) -> Self {
        Self { target }
    }
}

impl AcsState for SendRebootState {
    fn name(&self) -> &'static str {
        SEND_REBOOT
    }

    /// Consumes all inbound as handled/no-transition while initiating
    /// reboot. This loses a genuine post-reboot `Inform` that might race
    /// the outbound `Reboot`; preserved as specified, flagged for review.
    fn read_msg(&mut self, _ctx: &mut StateContext<'_>, _msg: CwmpMessage) -> Result<AcsReadMsgResult> {
        Ok(AcsReadMsgResult::Handled(None))
    }

    fn get_msg(&mut self, ctx: &mut StateContext<'_>) -> Result<AcsMsgAndTransition> {
        record_reboot(ctx.device_id);
        Ok(AcsMsgAndTransition {
            msg: CwmpMessage::Reboot {
                command_key: String::new(),
            },
            next_state: Some(self.target),
        })
    }
}

pub struct WaitRebootResponseState {
    target: &'static str,
}

impl WaitRebootResponseState {
    pub fn new(target: &'static str) -> Self {
        Self { target }
    }
}

impl AcsState for WaitRebootResponseState {
    fn name(&self) -> &'static str {
        WAIT_REBOOT_RESPONSE
    }

    fn read_msg(&mut self, _ctx: &mut StateContext<'_>, msg: CwmpMessage) -> Result<AcsReadMsgResult> {
        match msg {
            CwmpMessage::RebootResponse => Ok(AcsReadMsgResult::Handled(Some(self.target))),
            CwmpMessage::Fault { fault_string, .. } => Err(Error::tr069(fault_string)),
            _ => Ok(AcsReadMsgResult::NotHandled),
        }
    }
}

// ---------------------------------------------------------------------
// WaitInformMReboot / WaitRebootDelay
// ---------------------------------------------------------------------

pub const WAIT_INFORM_M_REBOOT: &str = "wait_inform_m_reboot";
pub const WAIT_REBOOT_DELAY: &str = "wait_reboot_delay";

pub struct WaitInformMRebootState {
    timeout_target: &'static str,
    success_target: &'static str,
    timeout_seconds: u64,
    received_inform: bool,
    timer: Option<TimerHandle>,
}

impl WaitInformMRebootState {
    pub fn new(timeout_target: &'static str, success_target: &'static str, timeout_seconds: u64) -> Self {
        Self {
            timeout_target,
            success_target,
            timeout_seconds,
            received_inform: false,
            timer: None,
        }
    }
}

impl AcsState for WaitInformMRebootState {
    fn name(&self) -> &'static str {
        WAIT_INFORM_M_REBOOT
    }

    fn enter(&mut self, ctx: &mut StateContext<'_>) -> Result<()> {
        self.received_inform = false;
        self.timer = Some(schedule_timer(
            ctx,
            self.timeout_seconds,
            WAIT_INFORM_M_REBOOT,
            self.timeout_target,
            Some("timed out waiting for post-reboot Inform".to_string()),
        ));
        Ok(())
    }

    fn exit(&mut self, _ctx: &mut StateContext<'_>) -> Result<()> {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        Ok(())
    }

    fn read_msg(&mut self, ctx: &mut StateContext<'_>, msg: CwmpMessage) -> Result<AcsReadMsgResult> {
        match msg {
            CwmpMessage::Inform { events, parameter_list, .. } => {
                let has_m_reboot = events
                    .iter()
                    .any(|e: &EventStruct| e.event_code == INFORM_EVENT_CODE_M_REBOOT);
                if !has_m_reboot {
                    return Err(Error::tr069("Inform missing expected M Reboot event code"));
                }
                self.received_inform = true;
                apply_inform_parameter_list(ctx, &parameter_list);
                Ok(AcsReadMsgResult::Handled(None))
            }
            CwmpMessage::Fault { .. } => {
                warn!("tolerated pre-reboot fault while awaiting M Reboot inform");
                Ok(AcsReadMsgResult::Handled(None))
            }
            _ => Ok(AcsReadMsgResult::NotHandled),
        }
    }

    fn get_msg(&mut self, _ctx: &mut StateContext<'_>) -> Result<AcsMsgAndTransition> {
        if self.received_inform {
            Ok(AcsMsgAndTransition {
                msg: CwmpMessage::InformResponse { max_envelopes: 1 },
                next_state: Some(self.success_target),
            })
        } else {
            Ok(AcsMsgAndTransition {
                msg: CwmpMessage::DummyInput,
                next_state: None,
            })
        }
    }
}

pub struct WaitRebootDelayState {
    target: &'static str,
    settle_seconds: u64,
    timer: Option<TimerHandle>,
}

impl WaitRebootDelayState {
    pub fn new(target: &'static str, settle_seconds: u64) -> Self {
        Self {
            target,
            settle_seconds,
            timer: None,
        }
    }
}

impl AcsState for WaitRebootDelayState {
    fn name(&self) -> &'static str {
        WAIT_REBOOT_DELAY
    }

    fn enter(&mut self, ctx: &mut StateContext<'_>) -> Result<()> {
        // The reboot just applied the prior cycle's full diff; drop the
        // cached desired config so the next cycle rebuilds it against
        // whatever the device reports fresh after restart.
        *ctx.desired_cfg = None;
        self.timer = Some(schedule_timer(ctx, self.settle_seconds, WAIT_REBOOT_DELAY, self.target, None));
        Ok(())
    }

    fn exit(&mut self, _ctx: &mut StateContext<'_>) -> Result<()> {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        Ok(())
    }

    fn read_msg(&mut self, _ctx: &mut StateContext<'_>, _msg: CwmpMessage) -> Result<AcsReadMsgResult> {
        Ok(AcsReadMsgResult::Handled(None))
    }

    fn get_msg(&mut self, _ctx: &mut StateContext<'_>) -> Result<AcsMsgAndTransition> {
        Ok(AcsMsgAndTransition {
            msg: CwmpMessage::DummyInput,
            next_state: None,
        })
    }
}

// ---------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------

pub const ERROR: &str = "error";

/// Absorbing sink for unhandled faults. Exit requires an external
/// force-transition (operator action / watchdog-driven reboot).
#[derive(Default)]
pub struct ErrorState;

impl AcsState for ErrorState {
    fn name(&self) -> &'static str {
        ERROR
    }

    fn read_msg(&mut self, _ctx: &mut StateContext<'_>, _msg: CwmpMessage) -> Result<AcsReadMsgResult> {
        Ok(AcsReadMsgResult::Handled(None))
    }

    fn get_msg(&mut self, _ctx: &mut StateContext<'_>) -> Result<AcsMsgAndTransition> {
        Ok(AcsMsgAndTransition {
            msg: CwmpMessage::DummyInput,
            next_state: None,
        })
    }
}

/// Builds the full state catalog for one machine, wired with a concrete
/// topology: fresh Inform → empty-message handshake → transient status poll
/// → full parameter/object discovery → object sync → parameter set →
/// reboot → settle → back to idle. See `state_machine::mod` for the
/// `AcsStateMachine` that owns this registry.
pub fn build_state_catalog(timers: &TimerConfig) -> HashMap<&'static str, Box<dyn AcsState>> {
    let mut states: HashMap<&'static str, Box<dyn AcsState>> = HashMap::new();

    states.insert(DISCONNECTED, Box::new(DisconnectedState::new(DISCONNECTED, WAIT_EMPTY_MESSAGE)));
    states.insert(
        UNEXPECTED_INFORM,
        Box::new(DisconnectedState::unexpected_inform(WAIT_EMPTY_MESSAGE)),
    );
    states.insert(
        BAICELLS_DISCONNECTED,
        Box::new(DisconnectedState::new(BAICELLS_DISCONNECTED, BAICELLS_REM_WAIT)),
    );
    states.insert(
        BAICELLS_REM_WAIT,
        Box::new(BaicellsRemWaitState::new(WAIT_EMPTY_MESSAGE, timers.rem_wait_timeout)),
    );
    states.insert(
        WAIT_EMPTY_MESSAGE,
        Box::new(WaitEmptyMessageState::new(CHECK_OPTIONAL_PARAMS)),
    );
    states.insert(
        CHECK_OPTIONAL_PARAMS,
        Box::new(CheckOptionalParamsState::new(SEND_GET_TRANSIENT_PARAMS)),
    );
    states.insert(
        SEND_GET_TRANSIENT_PARAMS,
        Box::new(SendGetTransientParametersState::new(WAIT_GET_TRANSIENT_PARAMS)),
    );
    states.insert(
        WAIT_GET_TRANSIENT_PARAMS,
        Box::new(WaitGetTransientParametersState::new(LadderTargets {
            get_params: GET_PARAMETERS,
            get_obj_params: GET_OBJECT_PARAMETERS,
            delete_obj: DELETE_OBJECTS,
            add_obj: ADD_OBJECTS,
            set_params: SET_PARAMETER_VALUES,
            skip: DISCONNECTED,
        })),
    );
    states.insert(GET_PARAMETERS, Box::new(GetParametersState::new(WAIT_GET_PARAMETERS)));
    states.insert(
        WAIT_GET_PARAMETERS,
        Box::new(WaitGetParametersState::new(GET_OBJECT_PARAMETERS)),
    );
    states.insert(
        GET_OBJECT_PARAMETERS,
        Box::new(GetObjectParametersState::new(WAIT_GET_OBJECT_PARAMETERS)),
    );
    states.insert(
        WAIT_GET_OBJECT_PARAMETERS,
        Box::new(WaitGetObjectParametersState::new(ObjectLadderTargets {
            delete_obj: DELETE_OBJECTS,
            add_obj: ADD_OBJECTS,
            set_params: SET_PARAMETER_VALUES,
            skip: DISCONNECTED,
        })),
    );
    states.insert(
        DELETE_OBJECTS,
        Box::new(DeleteObjectsState::new(ADD_OBJECTS, SET_PARAMETER_VALUES)),
    );
    states.insert(ADD_OBJECTS, Box::new(AddObjectsState::new(SET_PARAMETER_VALUES)));
    states.insert(
        SET_PARAMETER_VALUES,
        Box::new(SetParameterValuesState::new(WAIT_SET_PARAMETER_VALUES)),
    );
    states.insert(
        SET_PARAMETER_VALUES_NOT_ADMIN,
        Box::new(SetParameterValuesState::not_admin(WAIT_SET_PARAMETER_VALUES)),
    );
    states.insert(
        WAIT_SET_PARAMETER_VALUES,
        Box::new(WaitSetParameterValuesState::new(SEND_REBOOT)),
    );
    states.insert(SEND_REBOOT, Box::new(SendRebootState::new(WAIT_REBOOT_RESPONSE)));
    states.insert(
        WAIT_REBOOT_RESPONSE,
        Box::new(WaitRebootResponseState::new(WAIT_INFORM_M_REBOOT)),
    );
    states.insert(
        WAIT_INFORM_M_REBOOT,
        Box::new(WaitInformMRebootState::new(ERROR, WAIT_REBOOT_DELAY, timers.reboot_inform_timeout)),
    );
    states.insert(
        WAIT_REBOOT_DELAY,
        Box::new(WaitRebootDelayState::new(DISCONNECTED, timers.post_reboot_settle)),
    );
    states.insert(ERROR, Box::new(ErrorState));

    states
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_model::EnodebDataModel;
    use crate::desired_config::NoopPostprocessor;
    use crate::stats::StatsManager;
    use crate::timer::TokioEventLoop;

    fn test_ctx<'a>(
        model: &'a dyn DataModel,
        device_cfg: &'a mut DeviceConfigStore,
        desired_cfg: &'a mut Option<DesiredConfigStore>,
        operator_cfg: &'a OperatorConfig,
        postprocessor: &'a dyn ConfigPostprocessor,
        stats: &'a StatsManager,
        event_loop: &'a dyn EventLoop,
        command_tx: mpsc::Sender<MachineCommand>,
    ) -> StateContext<'a> {
        StateContext {
            device_id: "enb-1",
            model,
            device_cfg,
            desired_cfg,
            operator_cfg,
            postprocessor,
            stats,
            event_loop,
            command_tx,
        }
    }

    #[test]
    fn disconnected_reads_inform_then_sends_response() {
        let model = EnodebDataModel::new();
        let mut device_cfg = DeviceConfigStore::new();
        let mut desired_cfg = None;
        let operator_cfg = OperatorConfig { plmns: vec![] };
        let postprocessor = NoopPostprocessor;
        let stats = StatsManager::new();
        let event_loop = TokioEventLoop;
        let (tx, _rx) = mpsc::channel(8);
        let mut ctx = test_ctx(
            &model,
            &mut device_cfg,
            &mut desired_cfg,
            &operator_cfg,
            &postprocessor,
            &stats,
            &event_loop,
            tx,
        );

        let mut state = DisconnectedState::new(DISCONNECTED, WAIT_EMPTY_MESSAGE);
        let read = state
            .read_msg(
                &mut ctx,
                CwmpMessage::Inform {
                    device_id: crate::tr069::messages::DeviceIdStruct {
                        manufacturer: "Baicells".into(),
                        oui: "ABCDEF".into(),
                        product_class: "eNB".into(),
                        serial_number: "1234".into(),
                    },
                    events: vec![EventStruct {
                        event_code: "0 BOOTSTRAP".into(),
                        command_key: String::new(),
                    }],
                    parameter_list: vec![],
                },
            )
            .unwrap();
        assert!(matches!(read, AcsReadMsgResult::Handled(None)));

        let sent = state.get_msg(&mut ctx).unwrap();
        assert_eq!(sent.next_state, Some(WAIT_EMPTY_MESSAGE));
        assert!(matches!(
            sent.msg,
            CwmpMessage::InformResponse { max_envelopes: 1 }
        ));
    }

    #[test]
    fn wait_empty_message_rejects_non_dummy_input() {
        let model = EnodebDataModel::new();
        let mut device_cfg = DeviceConfigStore::new();
        let mut desired_cfg = None;
        let operator_cfg = OperatorConfig { plmns: vec![] };
        let postprocessor = NoopPostprocessor;
        let stats = StatsManager::new();
        let event_loop = TokioEventLoop;
        let (tx, _rx) = mpsc::channel(8);
        let mut ctx = test_ctx(
            &model,
            &mut device_cfg,
            &mut desired_cfg,
            &operator_cfg,
            &postprocessor,
            &stats,
            &event_loop,
            tx,
        );

        let mut state = WaitEmptyMessageState::new(SEND_GET_TRANSIENT_PARAMS);
        let result = state.read_msg(&mut ctx, CwmpMessage::RebootResponse).unwrap();
        assert!(matches!(result, AcsReadMsgResult::NotHandled));

        let result = state.read_msg(&mut ctx, CwmpMessage::DummyInput).unwrap();
        assert!(matches!(result, AcsReadMsgResult::Handled(Some(SEND_GET_TRANSIENT_PARAMS))));
    }

    #[test]
    fn radio_stop_edge_clears_stats_exactly_once() {
        let model = EnodebDataModel::new();
        let mut device_cfg = DeviceConfigStore::new();
        device_cfg.set_parameter(ParameterName::RfTxStatus, NativeValue::Bool(true));
        let mut desired_cfg = None;
        let operator_cfg = OperatorConfig { plmns: vec![] };
        let postprocessor = NoopPostprocessor;
        let stats = StatsManager::new();
        let event_loop = TokioEventLoop;
        let (tx, _rx) = mpsc::channel(8);
        let mut ctx = test_ctx(
            &model,
            &mut device_cfg,
            &mut desired_cfg,
            &operator_cfg,
            &postprocessor,
            &stats,
            &event_loop,
            tx,
        );

        let mut state = WaitGetTransientParametersState::new(LadderTargets {
            get_params: GET_PARAMETERS,
            get_obj_params: GET_OBJECT_PARAMETERS,
            delete_obj: DELETE_OBJECTS,
            add_obj: ADD_OBJECTS,
            set_params: SET_PARAMETER_VALUES,
            skip: DISCONNECTED,
        });

        let rf_tx_path = model.get_parameter(ParameterName::RfTxStatus).unwrap().path;
        state
            .read_msg(
                &mut ctx,
                CwmpMessage::GetParameterValuesResponse {
                    parameter_list: vec![ParameterValueStruct {
                        name: rf_tx_path,
                        value: "0".to_string(),
                        value_type: "xsd:boolean".to_string(),
                    }],
                },
            )
            .unwrap();

        assert_eq!(stats.clear_count(), 1);
    }

    #[test]
    fn check_optional_params_self_loops_then_transitions() {
        let model = EnodebDataModel::new();
        let mut device_cfg = DeviceConfigStore::new();
        let mut desired_cfg = None;
        let operator_cfg = OperatorConfig { plmns: vec![] };
        let postprocessor = NoopPostprocessor;
        let stats = StatsManager::new();
        let event_loop = TokioEventLoop;
        let (tx, _rx) = mpsc::channel(8);

        // Fresh model: every scalar starts at `Presence::Unknown`, giving a
        // multi-candidate discovery sequence to drive through.
        let mut ctx = test_ctx(
            &model,
            &mut device_cfg,
            &mut desired_cfg,
            &operator_cfg,
            &postprocessor,
            &stats,
            &event_loop,
            tx,
        );

        let mut state = CheckOptionalParamsState::new(SEND_GET_TRANSIENT_PARAMS);
        state.enter(&mut ctx).unwrap();
        assert!(state.current_candidate.is_some());

        // Respond with a Fault for the first candidate: marks absent, more
        // candidates remain, so the dispatcher should self-loop.
        let result = state.read_msg(&mut ctx, CwmpMessage::Fault {
            fault_code: FaultCode::InvalidParameterName,
            fault_string: "not found".to_string(),
            parameter_faults: vec![],
        }).unwrap();
        assert!(matches!(result, AcsReadMsgResult::Handled(None)));
    }
}
