use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::logging::{log, obj, v_num, v_str, Domain, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Active,
}

/// Cloneable stop switch, so the failure path can halt the cadence from
/// inside a tick.
#[derive(Clone)]
pub struct SchedulerHandle {
    active: Arc<AtomicBool>,
}

impl SchedulerHandle {
    pub fn stop(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// Drives the periodic refresh: one immediate tick, then one per period,
/// until stopped.
///
/// Ticks are spawned rather than awaited: a slow fetch never delays the
/// cadence, overlapping ticks are tolerated, and whichever tick resolves
/// last wins the rendered view model. `stop()` cancels only the timer;
/// an already-dispatched tick still runs to completion.
pub struct RefreshScheduler {
    period: Duration,
    active: Arc<AtomicBool>,
    timer: Option<JoinHandle<()>>,
}

impl RefreshScheduler {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            active: Arc::new(AtomicBool::new(false)),
            timer: None,
        }
    }

    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            active: self.active.clone(),
        }
    }

    pub fn state(&self) -> SchedulerState {
        if self.active.load(Ordering::SeqCst) && self.timer.is_some() {
            SchedulerState::Active
        } else {
            SchedulerState::Idle
        }
    }

    /// Starting while Active cancels the prior timer first; there is never
    /// more than one cadence firing.
    pub fn start<F, Fut>(&mut self, mut tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.stop();
        self.active.store(true, Ordering::SeqCst);
        log(
            Level::Info,
            Domain::Sched,
            "started",
            obj(&[("period_secs", v_num(self.period.as_secs_f64()))]),
        );

        let active = self.active.clone();
        let period = self.period;
        self.timer = Some(tokio::spawn(async move {
            let mut timer = interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                timer.tick().await;
                if !active.load(Ordering::SeqCst) {
                    break;
                }
                tokio::spawn(tick());
            }
        }));
    }

    /// Safe to call when already Idle.
    pub fn stop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(timer) = self.timer.take() {
            timer.abort();
            log(
                Level::Info,
                Domain::Sched,
                "stopped",
                obj(&[("msg", v_str("refresh timer cancelled"))]),
            );
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    fn counting_tick(count: Arc<AtomicU32>) -> impl FnMut() -> std::pin::Pin<Box<dyn Future<Output = ()> + Send>> + Send {
        move || {
            let count = count.clone();
            Box::pin(async move {
                count.fetch_add(1, Ordering::SeqCst);
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_fires_immediately() {
        let mut sched = RefreshScheduler::new(Duration::from_secs(30));
        let count = Arc::new(AtomicU32::new(0));
        sched.start(counting_tick(count.clone()));

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(sched.state(), SchedulerState::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_follow_the_period() {
        let mut sched = RefreshScheduler::new(Duration::from_secs(30));
        let count = Arc::new(AtomicU32::new(0));
        sched.start(counting_tick(count.clone()));

        tokio::time::sleep(Duration::from_secs(61)).await;
        // t=0, t=30, t=60
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_keeps_a_single_cadence() {
        let mut sched = RefreshScheduler::new(Duration::from_secs(30));
        let first = Arc::new(AtomicU32::new(0));
        let second = Arc::new(AtomicU32::new(0));

        sched.start(counting_tick(first.clone()));
        tokio::time::sleep(Duration::from_millis(5)).await;

        sched.start(counting_tick(second.clone()));
        tokio::time::sleep(Duration::from_secs(61)).await;

        assert_eq!(first.load(Ordering::SeqCst), 1, "old timer must not keep firing");
        assert_eq!(second.load(Ordering::SeqCst), 3, "exactly one active cadence");
        assert_eq!(sched.state(), SchedulerState::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_prevents_further_ticks() {
        let mut sched = RefreshScheduler::new(Duration::from_secs(30));
        let count = Arc::new(AtomicU32::new(0));
        sched.start(counting_tick(count.clone()));

        tokio::time::sleep(Duration::from_millis(5)).await;
        sched.stop();
        tokio::time::sleep(Duration::from_secs(120)).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(sched.state(), SchedulerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_when_idle_is_a_noop() {
        let mut sched = RefreshScheduler::new(Duration::from_secs(30));
        assert_eq!(sched.state(), SchedulerState::Idle);
        sched.stop();
        assert_eq!(sched.state(), SchedulerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_does_not_cancel_inflight_tick() {
        let mut sched = RefreshScheduler::new(Duration::from_secs(30));
        let count = Arc::new(AtomicU32::new(0));
        let slow = count.clone();
        sched.start(move || {
            let count = slow.clone();
            async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                count.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(5)).await;
        sched.stop();
        assert_eq!(count.load(Ordering::SeqCst), 0, "tick still in flight");

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1, "dispatched tick completes after stop");
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_stop_halts_cadence_between_ticks() {
        let mut sched = RefreshScheduler::new(Duration::from_secs(30));
        let count = Arc::new(AtomicU32::new(0));
        sched.start(counting_tick(count.clone()));
        let handle = sched.handle();

        tokio::time::sleep(Duration::from_millis(5)).await;
        handle.stop();
        tokio::time::sleep(Duration::from_secs(120)).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(sched.state(), SchedulerState::Idle);
        assert!(!handle.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_handle_stop() {
        let mut sched = RefreshScheduler::new(Duration::from_secs(30));
        let count = Arc::new(AtomicU32::new(0));
        sched.start(counting_tick(count.clone()));
        sched.handle().stop();
        tokio::time::sleep(Duration::from_secs(31)).await;

        let after = count.load(Ordering::SeqCst);
        sched.start(counting_tick(count.clone()));
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), after + 1);
        assert_eq!(sched.state(), SchedulerState::Active);
    }
}
