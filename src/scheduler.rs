use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use time::OffsetDateTime;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

use crate::report::Diagnostics;

pub const TASK_NAME: &str = "translate_products_batch";
pub const TICK_INTERVAL: Duration = Duration::from_secs(120);

/// Recurring-task registry the batch job is driven by.
pub trait Scheduler: Send + Sync {
    fn register_recurring(&self, task: &str, interval: Duration);
    fn deregister(&self, task: &str);
    fn is_registered(&self, task: &str) -> bool;
}

/// Arms the batch task unless it is already registered. `force` re-arms it
/// regardless, which is how an operator restarts a drained job.
pub fn arm_schedule(scheduler: &dyn Scheduler, diagnostics: &Diagnostics, force: bool) -> bool {
    if scheduler.is_registered(TASK_NAME) && !force {
        debug!("{} already scheduled", TASK_NAME);
        return false;
    }
    scheduler.register_recurring(TASK_NAME, TICK_INTERVAL);
    diagnostics.record_schedule(OffsetDateTime::now_utc());
    info!("scheduled {} every {}s", TASK_NAME, TICK_INTERVAL.as_secs());
    true
}

/// In-process scheduler: a registration table plus a driver loop.
#[derive(Debug, Default)]
pub struct LocalScheduler {
    tasks: Mutex<HashMap<String, Duration>>,
}

impl LocalScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interval_of(&self, task: &str) -> Option<Duration> {
        self.lock().get(task).copied()
    }

    /// Runs `tick` on the task's interval until the task is deregistered.
    /// Ticks never overlap; a tick that overruns delays the next one.
    /// Returns the number of ticks run.
    pub async fn drive<F, Fut>(&self, task: &str, mut tick: F) -> usize
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        let Some(period) = self.interval_of(task) else {
            return 0;
        };
        let mut timer = interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut ticks = 0;
        loop {
            timer.tick().await;
            if !self.is_registered(task) {
                break;
            }
            tick().await;
            ticks += 1;
        }
        debug!("{} deregistered after {} ticks", task, ticks);
        ticks
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Duration>> {
        self.tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Scheduler for LocalScheduler {
    fn register_recurring(&self, task: &str, interval: Duration) {
        self.lock().insert(task.to_string(), interval);
    }

    fn deregister(&self, task: &str) {
        self.lock().remove(task);
    }

    fn is_registered(&self, task: &str) -> bool {
        self.lock().contains_key(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn arming_is_skipped_unless_forced() {
        let scheduler = LocalScheduler::new();
        let diagnostics = Diagnostics::in_memory();

        assert!(arm_schedule(&scheduler, &diagnostics, false));
        assert_eq!(scheduler.interval_of(TASK_NAME), Some(TICK_INTERVAL));
        assert!(diagnostics.snapshot().last_schedule.is_some());

        assert!(!arm_schedule(&scheduler, &diagnostics, false));
        assert!(arm_schedule(&scheduler, &diagnostics, true));
    }

    #[tokio::test]
    async fn drive_stops_once_deregistered() {
        let scheduler = LocalScheduler::new();
        scheduler.register_recurring("job", Duration::from_millis(1));
        let count = Cell::new(0);

        let ticks = scheduler
            .drive("job", || {
                count.set(count.get() + 1);
                if count.get() == 3 {
                    scheduler.deregister("job");
                }
                async {}
            })
            .await;

        assert_eq!(ticks, 3);
        assert_eq!(count.get(), 3);
        assert!(!scheduler.is_registered("job"));
    }

    #[tokio::test]
    async fn drive_without_registration_is_a_no_op() {
        let scheduler = LocalScheduler::new();
        let ticks = scheduler.drive("missing", || async {}).await;
        assert_eq!(ticks, 0);
    }
}
