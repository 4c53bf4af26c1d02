//! FrameClock: a manually advanced timer and stepper factory.
//!
//! Hosts without their own animation loop call [`FrameClock::advance`] once
//! per rendered frame (and run their executor afterwards). Steppers move
//! their property linearly from 0 to `amount` over `duration`; a stepper
//! without a duration completes on the next advance.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

use futures::channel::oneshot;
use futures::future::{self, FutureExt, LocalBoxFuture};

use crate::error::BehaviorError;
use crate::host::{FrameStepper, StepTarget, StepperFactory, StepperSpec, Timer};

#[derive(Default)]
pub struct FrameClock {
    state: RefCell<ClockState>,
}

#[derive(Default)]
struct ClockState {
    now: Duration,
    timers: Vec<PendingTimer>,
    steppers: Vec<Weak<StepperSlot>>,
}

struct PendingTimer {
    due: Duration,
    wake: oneshot::Sender<()>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed since the clock was created.
    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    pub fn pending_timers(&self) -> usize {
        self.state.borrow().timers.len()
    }

    /// Steppers that are neither finished nor destroyed.
    pub fn active_steppers(&self) -> usize {
        self.state
            .borrow()
            .steppers
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|slot| slot.is_running())
            .count()
    }

    /// Move the clock forward: fire due timers, then step every live stepper.
    pub fn advance(&self, dt: Duration) {
        let (due, slots) = {
            let mut st = self.state.borrow_mut();
            st.now += dt;
            let now = st.now;
            let (due, pending): (Vec<_>, Vec<_>) =
                st.timers.drain(..).partition(|t| t.due <= now);
            st.timers = pending;
            st.steppers.retain(|slot| slot.strong_count() > 0);
            let slots: Vec<Rc<StepperSlot>> =
                st.steppers.iter().filter_map(Weak::upgrade).collect();
            (due, slots)
        };
        // Callbacks may drop steppers or register timers; no borrow is held here.
        for timer in due {
            let _ = timer.wake.send(());
        }
        for slot in slots {
            slot.advance(dt);
        }
    }
}

impl Timer for FrameClock {
    fn delay(&self, after: Duration) -> LocalBoxFuture<'static, ()> {
        let (wake, fired) = oneshot::channel();
        let mut st = self.state.borrow_mut();
        let due = st.now + after;
        st.timers.push(PendingTimer { due, wake });
        async move {
            let _ = fired.await;
        }
        .boxed_local()
    }
}

impl StepperFactory for FrameClock {
    fn create(
        &self,
        spec: StepperSpec,
        target: Rc<dyn StepTarget>,
    ) -> Result<Box<dyn FrameStepper>, BehaviorError> {
        if spec.amount == 0 {
            return Err(BehaviorError::EmptyStepper);
        }
        let (done, finished) = oneshot::channel();
        let slot = Rc::new(StepperSlot {
            spec,
            target,
            elapsed: Cell::new(Duration::ZERO),
            reported: Cell::new(0.0),
            done: RefCell::new(Some(done)),
            finished: RefCell::new(Some(finished)),
            destroyed: Cell::new(false),
        });
        self.state
            .borrow_mut()
            .steppers
            .push(Rc::downgrade(&slot));
        Ok(Box::new(ClockStepper { slot }))
    }
}

struct StepperSlot {
    spec: StepperSpec,
    target: Rc<dyn StepTarget>,
    elapsed: Cell<Duration>,
    reported: Cell<f64>,
    done: RefCell<Option<oneshot::Sender<()>>>,
    finished: RefCell<Option<oneshot::Receiver<()>>>,
    destroyed: Cell<bool>,
}

impl StepperSlot {
    fn is_running(&self) -> bool {
        !self.destroyed.get() && self.done.borrow().is_some()
    }

    fn advance(&self, dt: Duration) {
        if !self.is_running() {
            return;
        }
        let amount = self.spec.amount as f64;
        let (progress, complete) = match self.spec.duration {
            Some(total) if !total.is_zero() => {
                let elapsed = (self.elapsed.get() + dt).min(total);
                self.elapsed.set(elapsed);
                (
                    amount * elapsed.as_nanos() as f64 / total.as_nanos() as f64,
                    elapsed >= total,
                )
            }
            _ => (amount, true),
        };
        let delta = progress - self.reported.get();
        if delta > 0.0 && (complete || delta >= f64::from(self.spec.rate_limit)) {
            self.reported.set(progress);
            self.target.adjust_property(self.spec.property, delta);
        }
        // The target may have destroyed this stepper while handling the step.
        if complete && !self.destroyed.get() {
            if let Some(done) = self.done.borrow_mut().take() {
                let _ = done.send(());
            }
        }
    }
}

struct ClockStepper {
    slot: Rc<StepperSlot>,
}

impl FrameStepper for ClockStepper {
    fn finished(&mut self) -> LocalBoxFuture<'static, ()> {
        match self.slot.finished.borrow_mut().take() {
            Some(finished) => async move {
                let _ = finished.await;
            }
            .boxed_local(),
            None => future::pending().boxed_local(),
        }
    }
}

impl Drop for ClockStepper {
    fn drop(&mut self) {
        self.slot.destroyed.set(true);
        self.slot.done.borrow_mut().take();
    }
}
