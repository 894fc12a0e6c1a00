//! Toggle reset controller: turns off "wants cleaning" after a genuine pass.

use tidyhub_domain::command::Command;
use tidyhub_domain::id::EntityId;
use tidyhub_domain::tracking::SegmentCompletion;

use crate::ports::CommandInvoker;
use crate::retry::RetryPolicy;
use crate::task::TaskHandle;

/// Passes shorter than this are treated as noise.
pub const DEFAULT_MIN_SEGMENT_SECS: u64 = 180;

pub struct ToggleResetController<C> {
    invoker: C,
    policy: RetryPolicy,
    min_duration_secs: u64,
}

impl<C> ToggleResetController<C>
where
    C: CommandInvoker + Clone + 'static,
{
    pub fn new(invoker: C, policy: RetryPolicy, min_duration_secs: u64) -> Self {
        Self {
            invoker,
            policy,
            min_duration_secs,
        }
    }

    /// Whether the pass lasted long enough to count as a real clean.
    #[must_use]
    pub fn is_genuine(&self, completion: &SegmentCompletion) -> bool {
        completion.duration_secs() >= self.min_duration_secs
    }

    /// Start resetting `controls` for a completed pass.
    ///
    /// Returns `None` when the pass is too short or no room maps to it.
    pub fn handle(&self, completion: &SegmentCompletion, controls: Vec<EntityId>) -> Option<TaskHandle> {
        if !self.is_genuine(completion) {
            tracing::info!(
                device = %completion.device,
                segment = %completion.segment,
                duration_secs = completion.duration_secs(),
                min_secs = self.min_duration_secs,
                "segment pass too short, keeping toggles"
            );
            return None;
        }
        if controls.is_empty() {
            tracing::debug!(
                device = %completion.device,
                segment = %completion.segment,
                "no room mapped to segment"
            );
            return None;
        }

        let invoker = self.invoker.clone();
        let policy = self.policy;
        let commands: Vec<Command> = controls.iter().map(Command::turn_off).collect();
        let segment = completion.segment;
        Some(TaskHandle::spawn(async move {
            let report = policy.invoke_all(&invoker, commands).await;
            for command in &report.dispatched {
                tracing::info!(control = ?command.target(), %segment, "reset wants-cleaning toggle");
            }
            report.log_failures("reset toggles");
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SpyInvoker;
    use std::sync::Arc;
    use tidyhub_domain::error::ActuationError;
    use tidyhub_domain::id::SegmentId;
    use tidyhub_domain::time::{now, secs};

    fn completion(duration: u64) -> SegmentCompletion {
        let finished_at = now();
        SegmentCompletion {
            device: EntityId::new("vacuum.robot"),
            segment: SegmentId::new(1),
            started_at: finished_at - secs(duration),
            finished_at,
        }
    }

    fn controls() -> Vec<EntityId> {
        vec![
            EntityId::new("switch.tidyhub_clean_kitchen"),
            EntityId::new("switch.tidyhub_clean_dining"),
        ]
    }

    #[tokio::test]
    async fn should_discard_pass_shorter_than_minimum() {
        let invoker = Arc::new(SpyInvoker::default());
        let controller = ToggleResetController::new(Arc::clone(&invoker), RetryPolicy::default(), 180);

        assert!(controller.handle(&completion(50), controls()).is_none());
        assert_eq!(invoker.attempts(), 0);
    }

    #[tokio::test]
    async fn should_turn_off_every_mapped_toggle_after_genuine_pass() {
        let invoker = Arc::new(SpyInvoker::default());
        let controller = ToggleResetController::new(Arc::clone(&invoker), RetryPolicy::default(), 180);

        let task = controller.handle(&completion(200), controls()).unwrap();
        task.join().await;

        let calls = invoker.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| c.service() == "switch.turn_off"));
    }

    #[tokio::test(start_paused = true)]
    async fn should_reset_other_toggles_when_one_fails() {
        let invoker = Arc::new(SpyInvoker::default());
        invoker.fail_target("switch.tidyhub_clean_kitchen", ActuationError::Timeout);
        let controller = ToggleResetController::new(Arc::clone(&invoker), RetryPolicy::default(), 180);

        controller.handle(&completion(300), controls()).unwrap().join().await;

        assert_eq!(invoker.attempts(), 4);
        assert_eq!(
            invoker.successes(),
            vec![Command::turn_off(&EntityId::new("switch.tidyhub_clean_dining"))]
        );
    }

    #[tokio::test]
    async fn should_skip_when_no_room_maps_to_segment() {
        let invoker = Arc::new(SpyInvoker::default());
        let controller = ToggleResetController::new(Arc::clone(&invoker), RetryPolicy::default(), 0);
        assert!(controller.handle(&completion(500), Vec::new()).is_none());
    }
}
