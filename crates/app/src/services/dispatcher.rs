//! Cleaning dispatcher: turns a device job into the device's command.

use tidyhub_domain::command::{CleaningStrategy, Command};
use tidyhub_domain::error::TidyHubError;
use tidyhub_domain::id::{EntityId, SegmentId};

use crate::ports::{CommandInvoker, DeviceDirectory};
use crate::retry::RetryPolicy;
use crate::services::lookup;

/// Pick the cleaning strategy for a device from its manufacturer.
/// Unknown devices get a full clean.
pub fn resolve_strategy<D: DeviceDirectory>(devices: &D, device: &EntityId) -> CleaningStrategy {
    let manufacturer = lookup::manufacturer(devices, device);
    CleaningStrategy::for_manufacturer(manufacturer.as_deref())
}

pub struct CleaningDispatcher<C, D> {
    invoker: C,
    devices: D,
    policy: RetryPolicy,
}

impl<C, D> CleaningDispatcher<C, D>
where
    C: CommandInvoker,
    D: DeviceDirectory,
{
    pub fn new(invoker: C, devices: D, policy: RetryPolicy) -> Self {
        Self {
            invoker,
            devices,
            policy,
        }
    }

    /// The command that would clean `segments` on `device`.
    ///
    /// # Errors
    ///
    /// Returns [`TidyHubError::Validation`] when `segments` is empty.
    pub fn command(&self, device: &EntityId, segments: &[SegmentId]) -> Result<Command, TidyHubError> {
        let strategy = resolve_strategy(&self.devices, device);
        Ok(strategy.command(device, segments)?)
    }

    /// Build and send the cleaning command, retrying transient failures.
    ///
    /// # Errors
    ///
    /// Returns [`TidyHubError::Validation`] for an empty segment list, or
    /// [`TidyHubError::Actuation`] once retries are exhausted or the device
    /// rejects the action.
    #[tracing::instrument(skip(self, segments), fields(segment_count = segments.len()))]
    pub async fn dispatch(&self, device: &EntityId, segments: &[SegmentId]) -> Result<Command, TidyHubError> {
        let command = self.command(device, segments)?;
        tracing::info!(service = %command.service(), ?segments, "starting clean");
        self.policy.invoke(&self.invoker, &command).await?;
        Ok(command)
    }
}
