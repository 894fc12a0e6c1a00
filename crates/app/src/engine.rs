//! Engine: the single control loop tying the services together.
//!
//! The loop consumes three inputs: state-bus changes, cooldown timers fired
//! by the readiness evaluator, and a shutdown signal. Operator commands
//! (`clean_all`, `clean_location`, `stop_cleaning`, `reset_all_controls`)
//! are plain async methods and may run concurrently with the loop; no lock
//! is held across an await point.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{broadcast, mpsc};

use tidyhub_domain::command::Command;
use tidyhub_domain::entity::{AttributeValue, EntitySnapshot, effective_device_class};
use tidyhub_domain::error::{ActuationError, NotFoundError, TargetFailure, TidyHubError, ValidationError};
use tidyhub_domain::event::StateChange;
use tidyhub_domain::id::{EntityId, LocationId, SegmentId};
use tidyhub_domain::plan::{CleaningPlan, Selection};
use tidyhub_domain::readiness::{BARRIER_CLASS, OCCUPANCY_CLASS};
use tidyhub_domain::room::{ControlKind, RoomConfig, RoomKey, validate_rooms};
use tidyhub_domain::tracking::DEFAULT_SEGMENT_ATTRIBUTE;

use crate::clock::Clock;
use crate::ports::{CommandInvoker, ControlStore, DeviceDirectory, LocationDirectory, StateStore};
use crate::retry::{BatchReport, RetryPolicy};
use crate::services::plan_aggregator::{PLAN_ENTITY, PlanReadout};
use crate::services::readiness_evaluator::STATUS_REASON;
use crate::services::toggle_reset::DEFAULT_MIN_SEGMENT_SECS;
use crate::services::{
    CleaningDispatcher, CooldownElapsed, EntityCache, PlanAggregator, ReadinessEvaluator,
    RoomIdentityResolver, SegmentMonitor, ToggleResetController,
};

/// Device state that `stop_cleaning` acts on.
const CLEANING_STATE: &str = "cleaning";

/// Global defaults applied to every room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub cooldown_secs: u64,
    pub min_segment_secs: u64,
    pub segment_attribute: String,
    pub debug: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            cooldown_secs: 0,
            min_segment_secs: DEFAULT_MIN_SEGMENT_SECS,
            segment_attribute: DEFAULT_SEGMENT_ATTRIBUTE.to_string(),
            debug: false,
        }
    }
}

impl EngineSettings {
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptySegmentAttribute`] for a blank attribute name.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.segment_attribute.trim().is_empty() {
            return Err(ValidationError::EmptySegmentAttribute);
        }
        Ok(())
    }
}

/// The capabilities the engine is built on.
#[derive(Debug, Clone)]
pub struct EnginePorts<S, L, D, C> {
    pub store: S,
    pub locations: L,
    pub devices: D,
    pub invoker: C,
}

/// Readiness of one room as exposed to operators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomReadiness {
    pub slug: String,
    pub name: String,
    pub location: LocationId,
    pub device: EntityId,
    pub segments: Vec<SegmentId>,
    pub ready: bool,
    pub reason: String,
    pub attributes: BTreeMap<String, serde_json::Value>,
}

pub struct Engine<S, L, D, C> {
    store: S,
    devices: D,
    invoker: C,
    settings: EngineSettings,
    cache: EntityCache,
    evaluator: ReadinessEvaluator<S, L, D>,
    monitor: SegmentMonitor,
    resets: ToggleResetController<C>,
    dispatcher: CleaningDispatcher<C, D>,
    bulk: RetryPolicy,
    timers: Mutex<Option<mpsc::UnboundedReceiver<CooldownElapsed>>>,
}

impl<S, L, D, C> Engine<S, L, D, C>
where
    S: StateStore + Clone,
    L: LocationDirectory + Clone,
    D: DeviceDirectory + Clone,
    C: CommandInvoker + Clone + 'static,
{
    /// Validate the rooms, resolve their identities, restore their controls
    /// and build every service.
    ///
    /// Nothing is evaluated until [`run`](Self::run) or
    /// [`evaluate_all`](Self::evaluate_all) is called.
    ///
    /// # Errors
    ///
    /// Returns [`TidyHubError::Validation`] for an invalid room list or
    /// settings; nothing is started in that case.
    pub fn new(
        ports: EnginePorts<S, L, D, C>,
        controls: &impl ControlStore,
        settings: EngineSettings,
        rooms: Vec<RoomConfig>,
    ) -> Result<Self, TidyHubError> {
        validate_rooms(&rooms)?;
        settings.validate()?;

        let EnginePorts {
            store,
            locations,
            devices,
            invoker,
        } = ports;

        let identities =
            RoomIdentityResolver::new(&store, &locations, &devices).resolve_all(&rooms);
        let cache = EntityCache::new(rooms.into_iter().zip(identities));
        for record in cache.records() {
            let slug = &record.identity.slug;
            for kind in [ControlKind::Enable, ControlKind::Override] {
                let id = kind.default_entity(slug);
                let value = controls.restore(&id, false);
                tracing::debug!(room = %slug, control = %id, value, "restored control");
                cache.register_control(slug, kind, id);
            }
            cache.register_control(
                slug,
                ControlKind::Readiness,
                ControlKind::Readiness.default_entity(slug),
            );
        }

        let clock = Clock::new();
        let (timers_tx, timers_rx) = mpsc::unbounded_channel();
        let evaluator = ReadinessEvaluator::new(
            (store.clone(), locations, devices.clone()),
            clock,
            settings.cooldown_secs,
            &cache,
            timers_tx,
        );
        let monitor = SegmentMonitor::new(cache.devices(), clock);
        let resets = ToggleResetController::new(
            invoker.clone(),
            RetryPolicy::fixed(Duration::from_secs(1)),
            settings.min_segment_secs,
        );
        let dispatcher = CleaningDispatcher::new(
            invoker.clone(),
            devices.clone(),
            RetryPolicy::doubling(Duration::from_secs(1)),
        );

        tracing::info!(
            rooms = cache.records().len(),
            devices = cache.devices().len(),
            "engine ready"
        );

        Ok(Self {
            store,
            devices,
            invoker,
            settings,
            cache,
            evaluator,
            monitor,
            resets,
            dispatcher,
            bulk: RetryPolicy::fixed(Duration::from_secs(1)),
            timers: Mutex::new(Some(timers_rx)),
        })
    }

    #[must_use]
    pub fn cache(&self) -> &EntityCache {
        &self.cache
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Drive the engine until `shutdown` resolves or the state bus closes.
    ///
    /// Every room is evaluated once before the first change is read.
    /// Teardown cancels all timers and in-flight tasks before returning.
    pub async fn run(
        &self,
        mut changes: broadcast::Receiver<StateChange>,
        shutdown: impl Future<Output = ()>,
    ) {
        let taken = self
            .timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(mut timers) = taken else {
            tracing::warn!("engine loop is already running");
            return;
        };

        self.evaluate_all();
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("shutdown requested");
                    break;
                }
                received = changes.recv() => match received {
                    Ok(change) => self.handle_change(&change),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "state bus lagged, re-evaluating every room");
                        self.evaluate_all();
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("state bus closed");
                        break;
                    }
                },
                Some(fired) = timers.recv() => {
                    if self.evaluator.on_timer(&fired) {
                        self.evaluate_room(&fired.room);
                    }
                }
            }
        }

        self.shutdown();
        *self.timers.lock().unwrap_or_else(PoisonError::into_inner) = Some(timers);
    }

    /// Cancel every cooldown timer and in-flight completion task.
    pub fn shutdown(&self) {
        self.evaluator.cancel_all();
        self.monitor.cancel_all();
        tracing::info!("engine stopped");
    }

    /// Re-evaluate every room, then republish the plan.
    pub fn evaluate_all(&self) {
        for record in self.cache.records() {
            self.evaluator.evaluate(record, &self.cache);
        }
        self.publish_plan();
    }

    fn evaluate_room(&self, key: &RoomKey) {
        if let Some(record) = self.cache.record(key) {
            self.evaluator.evaluate(record, &self.cache);
        }
    }

    /// React to one state-bus change.
    pub fn handle_change(&self, change: &StateChange) {
        let entity_id = &change.entity_id;
        if entity_id.as_str() == PLAN_ENTITY {
            return;
        }

        let mut rooms: Vec<RoomKey> = Vec::new();
        let mut refresh_plan = false;
        let is_device = self.cache.is_device(entity_id);

        if is_device {
            if let Some(snapshot) = &change.new_state {
                self.observe_device(snapshot);
            }
            rooms.extend(self.cache.rooms_on_device(entity_id).map(|r| r.key.clone()));
        }

        let owner = self.cache.control_owner(entity_id);
        if let Some((key, kind)) = &owner {
            refresh_plan = true;
            if *kind != ControlKind::Readiness {
                rooms.push(key.clone());
            }
        }

        rooms.extend(self.evaluator.rooms_watching(entity_id));

        if rooms.is_empty() && !is_device && owner.is_none() && self.is_new_sensor(change) {
            tracing::debug!(entity = %entity_id, "new sensor seen, re-evaluating every room");
            rooms.extend(self.cache.records().iter().map(|r| r.key.clone()));
        }

        rooms.sort();
        rooms.dedup();
        for key in &rooms {
            self.evaluate_room(key);
        }
        if refresh_plan {
            self.publish_plan();
        }
    }

    fn is_new_sensor(&self, change: &StateChange) -> bool {
        let record = self.devices.entity(&change.entity_id);
        matches!(
            effective_device_class(change.new_state.as_ref(), record.as_ref()),
            Some(OCCUPANCY_CLASS | BARRIER_CLASS)
        )
    }

    fn observe_device(&self, snapshot: &EntitySnapshot) {
        let attribute = self
            .cache
            .segment_attribute(&snapshot.entity_id, &self.settings.segment_attribute);
        self.monitor.observe(snapshot, attribute, |completion| {
            let controls: Vec<EntityId> = self
                .cache
                .rooms_for_segment(&completion.device, completion.segment)
                .into_iter()
                .filter_map(|record| self.cache.controls(&record.key).enable)
                .collect();
            self.resets.handle(completion, controls)
        });
    }

    /// Point a room's control at the entity id it registered under.
    ///
    /// Returns `false` when no room has that slug.
    pub fn register_control(&self, slug: &str, kind: ControlKind, entity_id: EntityId) -> bool {
        if !self.cache.register_control(slug, kind, entity_id) {
            return false;
        }
        if let Some(record) = self.cache.by_slug(slug) {
            self.evaluator.evaluate(record, &self.cache);
        }
        self.publish_plan();
        true
    }

    /// The plan for `selection`, from the current signal values.
    #[must_use]
    pub fn plan(&self, selection: &Selection) -> CleaningPlan {
        PlanAggregator::new(&self.store, &self.devices, self.settings.debug)
            .build(&self.cache, selection)
    }

    /// The scheduled plan as exposed to operators.
    #[must_use]
    pub fn readout(&self) -> PlanReadout {
        PlanReadout::from(self.plan(&Selection::Scheduled))
    }

    /// Write the plan readout entity.
    pub fn publish_plan(&self) {
        match self.readout().to_snapshot() {
            Ok(snapshot) => self.store.publish(snapshot),
            Err(err) => tracing::warn!(error = %err, "failed to encode cleaning plan"),
        }
    }

    /// Readiness of every room, in configuration order.
    #[must_use]
    pub fn readiness(&self) -> Vec<RoomReadiness> {
        self.cache
            .records()
            .iter()
            .map(|record| {
                let reason = self.evaluator.reason(&record.key);
                let signal = self
                    .cache
                    .controls(&record.key)
                    .readiness
                    .and_then(|id| self.store.get(&id));
                let attributes = signal
                    .as_ref()
                    .map(|s| {
                        s.attributes
                            .iter()
                            .map(|(k, v)| (k.clone(), v.to_json()))
                            .collect()
                    })
                    .unwrap_or_default();
                let label = signal
                    .as_ref()
                    .and_then(|s| s.get_attribute(STATUS_REASON))
                    .and_then(AttributeValue::as_str)
                    .map_or_else(|| reason.label().to_string(), str::to_string);
                RoomReadiness {
                    slug: record.identity.slug.clone(),
                    name: record.identity.name.clone(),
                    location: record.config.location.clone(),
                    device: record.config.device.clone(),
                    segments: record.config.segments.clone(),
                    ready: reason.is_ready(),
                    reason: label,
                    attributes,
                }
            })
            .collect()
    }

    /// Clean every enabled, ready and not overridden room.
    pub async fn clean_all(&self) -> BatchReport {
        self.start_cleaning(&Selection::Scheduled).await
    }

    /// Clean every room in `location`, whatever its toggles say.
    ///
    /// # Errors
    ///
    /// Returns [`TidyHubError::Validation`] for an empty location id, or
    /// [`TidyHubError::NotFound`] when no room is configured there.
    pub async fn clean_location(&self, location: &LocationId) -> Result<BatchReport, TidyHubError> {
        if location.is_empty() {
            return Err(ValidationError::EmptyLocation.into());
        }
        if self.cache.rooms_in_location(location).is_empty() {
            return Err(NotFoundError {
                entity: "Location",
                id: location.to_string(),
            }
            .into());
        }
        Ok(self
            .start_cleaning(&Selection::Locations(vec![location.clone()]))
            .await)
    }

    #[tracing::instrument(skip(self))]
    async fn start_cleaning(&self, selection: &Selection) -> BatchReport {
        let plan = self.plan(selection);
        let mut report = BatchReport::default();
        for (device, job) in &plan.devices {
            if job.segments.is_empty() {
                tracing::debug!(%device, "nothing to clean");
                continue;
            }
            match self.dispatcher.dispatch(device, &job.segment_list()).await {
                Ok(command) => report.dispatched.push(command),
                Err(err) => report.failures.push(TargetFailure {
                    target: device.to_string(),
                    error: into_actuation(err),
                }),
            }
        }
        if report.attempted() == 0 {
            tracing::info!("no rooms to clean");
        }
        report.log_failures("start cleaning");
        report
    }

    /// Send every device that is currently cleaning back to its base.
    #[tracing::instrument(skip(self))]
    pub async fn stop_cleaning(&self) -> BatchReport {
        let commands: Vec<Command> = self
            .cache
            .devices()
            .into_iter()
            .filter(|device| {
                self.store
                    .get(device)
                    .is_some_and(|s| s.state.as_str() == CLEANING_STATE)
            })
            .map(Command::return_to_base)
            .collect();
        let report = self.bulk.invoke_all(&self.invoker, commands).await;
        report.log_failures("stop cleaning");
        report
    }

    /// Turn every room's "wants cleaning" toggle back on.
    #[tracing::instrument(skip(self))]
    pub async fn reset_all_controls(&self) -> BatchReport {
        let commands: Vec<Command> = self
            .cache
            .records()
            .iter()
            .filter_map(|record| {
                let enable = self.cache.controls(&record.key).enable;
                if enable.is_none() {
                    tracing::warn!(room = %record.identity.slug, "enable control not registered");
                }
                enable
            })
            .map(|id| Command::turn_on(&id))
            .collect();
        let report = self.bulk.invoke_all(&self.invoker, commands).await;
        report.log_failures("reset controls");
        report
    }
}

fn into_actuation(err: TidyHubError) -> ActuationError {
    match err {
        TidyHubError::Actuation(inner) => inner,
        TidyHubError::Validation(inner) => ActuationError::Fault(inner.to_string()),
        TidyHubError::NotFound(inner) => ActuationError::Fault(inner.to_string()),
        TidyHubError::Batch(inner) => ActuationError::Fault(inner.to_string()),
    }
}
