use crate::renderer::ScoreBucket;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Default delay between two displayed values.
pub const DEFAULT_TICK: Duration = Duration::from_millis(15);

/// Target of the animated score.
pub trait ScoreDisplay: Send + 'static {
    /// Push one displayed value. `bucket` is set on the final value only.
    fn show_score(&mut self, value: u8, bucket: Option<ScoreBucket>);
}

/// Values shown while counting up from 0 to a target.
///
/// The step is fixed when the sequence is created (2 above 50, else 1) and
/// the last value is clamped to the target, so the sequence never
/// overshoots. Once exhausted it stays exhausted.
#[derive(Debug, Clone)]
pub struct AnimationSteps {
    next: Option<u8>,
    target: u8,
    step: u8,
}

impl AnimationSteps {
    pub fn new(target: u8) -> Self {
        let target = target.min(100);
        let step = if target > 50 { 2 } else { 1 };
        Self {
            next: Some(0),
            target,
            step,
        }
    }

    pub fn step(&self) -> u8 {
        self.step
    }

    pub fn target(&self) -> u8 {
        self.target
    }
}

impl Iterator for AnimationSteps {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        let value = self.next?;
        self.next = if value >= self.target {
            None
        } else {
            Some(value.saturating_add(self.step).min(self.target))
        };
        Some(value)
    }
}

/// Owns at most one running score animation.
///
/// Starting a new animation aborts the previous one first; dropping the
/// animator aborts whatever is still running. Must be used from within a
/// current-thread tokio runtime: `JoinHandle::abort` only stops the task
/// before its next write there. On a multi-thread runtime a tick already
/// being polled on another worker can still push one more value.
pub struct ScoreAnimator {
    tick: Duration,
    task: Option<JoinHandle<()>>,
}

impl ScoreAnimator {
    pub fn new(tick: Duration) -> Self {
        Self { tick, task: None }
    }

    /// Count the display up to `target`; `settled_bucket` is applied with the
    /// final value.
    pub fn start<D: ScoreDisplay>(
        &mut self,
        target: u8,
        settled_bucket: ScoreBucket,
        mut display: D,
    ) {
        self.cancel();

        let tick = self.tick;
        log::debug!("Animating score to {} ({:?})", target, settled_bucket);

        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(tick);
            let mut steps = AnimationSteps::new(target).peekable();

            while let Some(value) = steps.next() {
                ticker.tick().await;
                let last = steps.peek().is_none();
                display.show_score(value, last.then_some(settled_bucket));
            }
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            if !task.is_finished() {
                log::debug!("Cancelling running score animation");
            }
            task.abort();
        }
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Wait for the current animation, if any, to reach its target.
    pub async fn finished(&mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Default for ScoreAnimator {
    fn default() -> Self {
        Self::new(DEFAULT_TICK)
    }
}

impl Drop for ScoreAnimator {
    fn drop(&mut self) {
        self.cancel();
    }
}
