//! Plan aggregator: reads every room's controls and readiness into a
//! per-device cleaning plan.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use tidyhub_domain::command::Command;
use tidyhub_domain::entity::{AttributeValue, EntitySnapshot};
use tidyhub_domain::id::EntityId;
use tidyhub_domain::plan::{
    CleaningPlan, ControlSignals, DevicePlan, RoomSummary, SIGNAL_UNAVAILABLE, Selection,
    UNKNOWN_REASON, decide,
};

use crate::ports::{DeviceDirectory, StateStore};
use crate::services::dispatcher::resolve_strategy;
use crate::services::entity_cache::{EntityCache, RoomRecord};
use crate::services::readiness_evaluator::STATUS_REASON;

/// Entity the plan readout is published under.
pub const PLAN_ENTITY: &str = "sensor.tidyhub_cleaning_plan";

pub struct PlanAggregator<'a, S, D> {
    store: &'a S,
    devices: &'a D,
    debug: bool,
}

impl<'a, S, D> PlanAggregator<'a, S, D>
where
    S: StateStore,
    D: DeviceDirectory,
{
    pub fn new(store: &'a S, devices: &'a D, debug: bool) -> Self {
        Self {
            store,
            devices,
            debug,
        }
    }

    /// Build the plan for `selection` from the current signal values.
    ///
    /// A room whose controls are not all registered is left out.
    pub fn build(&self, cache: &EntityCache, selection: &Selection) -> CleaningPlan {
        let mut plan = CleaningPlan::default();
        for record in cache.records() {
            if let Some(summary) = self.summarize(cache, record, selection) {
                plan.add_room(&record.config.device, summary, &record.config.segments);
            }
        }

        if self.debug {
            for (device, job) in &mut plan.devices {
                job.debug_command = if job.segments.is_empty() {
                    Some(Command::start(device))
                } else {
                    resolve_strategy(self.devices, device)
                        .command(device, &job.segment_list())
                        .ok()
                };
            }
        }
        plan
    }

    fn summarize(
        &self,
        cache: &EntityCache,
        record: &RoomRecord,
        selection: &Selection,
    ) -> Option<RoomSummary> {
        let controls = cache.controls(&record.key);
        let (Some(enable), Some(override_toggle), Some(readiness)) =
            (controls.enable, controls.override_toggle, controls.readiness)
        else {
            tracing::warn!(room = %record.identity.slug, "room controls not registered, leaving room out of plan");
            return None;
        };

        let signals = self.signals(&enable, &override_toggle, &readiness);
        let decision = decide(&signals, &record.config.location, selection);
        Some(RoomSummary {
            name: record.identity.name.clone(),
            slug: record.identity.slug.clone(),
            location: record.config.location.clone(),
            will_clean: decision.will_clean,
            enabled: signals.enabled,
            overridden: signals.overridden,
            ready: signals.ready,
            reason: decision.display_reason(),
            reasons: decision.reasons,
            readiness_reason: signals.readiness_reason,
            enable_control: enable,
            override_control: override_toggle,
        })
    }

    fn signals(&self, enable: &EntityId, override_toggle: &EntityId, readiness: &EntityId) -> ControlSignals {
        let is_on = |id: &EntityId| self.store.get(id).is_some_and(|s| s.state.is_on());
        let readiness_snapshot = self.store.get(readiness);
        let readiness_reason = match &readiness_snapshot {
            Some(snapshot) => snapshot
                .get_attribute(STATUS_REASON)
                .and_then(AttributeValue::as_str)
                .unwrap_or(UNKNOWN_REASON)
                .to_string(),
            None => SIGNAL_UNAVAILABLE.to_string(),
        };
        ControlSignals {
            enabled: is_on(enable),
            overridden: is_on(override_toggle),
            ready: readiness_snapshot.is_some_and(|s| s.state.is_on()),
            readiness_reason,
        }
    }
}

/// Plan as exposed to operators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanReadout {
    /// e.g. `2 Rooms Scheduled`
    pub summary: String,
    pub total_cleaning: usize,
    pub devices: BTreeMap<EntityId, DeviceReadout>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceReadout {
    pub count: usize,
    #[serde(flatten)]
    pub job: DevicePlan,
}

impl From<CleaningPlan> for PlanReadout {
    fn from(plan: CleaningPlan) -> Self {
        Self {
            summary: plan.summary(),
            total_cleaning: plan.scheduled_count(),
            devices: plan
                .devices
                .into_iter()
                .map(|(device, job)| {
                    (
                        device,
                        DeviceReadout {
                            count: job.scheduled_count(),
                            job,
                        },
                    )
                })
                .collect(),
        }
    }
}

impl PlanReadout {
    /// Snapshot of the plan readout entity.
    ///
    /// # Errors
    ///
    /// Returns the serialization error if the plan cannot be encoded.
    pub fn to_snapshot(&self) -> Result<EntitySnapshot, serde_json::Error> {
        let devices = serde_json::to_value(&self.devices)?;
        let total = i64::try_from(self.total_cleaning).unwrap_or(i64::MAX);
        Ok(EntitySnapshot::new(PLAN_ENTITY, self.summary.as_str())
            .with_attribute("plan", AttributeValue::Json(devices))
            .with_attribute("total_cleaning", total))
    }
}
