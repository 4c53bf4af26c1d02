//! One run of an animation on one controller, repetitions included.
//!
//! A job lives in a task spawned on the host executor. It checks for
//! cancellation at every suspension point (`maybe_break`); soft stops are
//! honored only at cycle boundaries, hard stops resolve the job directly
//! from the controller and abort its task.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::{Rc, Weak};

use futures::channel::oneshot;
use futures::future::{AbortHandle, Abortable, FutureExt, Shared};

use crate::controller::{AnimatableController, ControllerInner};
use crate::host::{FrameStepper, Host, StepTarget, StepperSpec, INDEX_PROPERTY};

#[derive(Clone)]
pub(crate) struct Job {
    inner: Rc<JobInner>,
}

struct JobInner {
    controller: RefCell<Weak<ControllerInner>>,
    image_id: String,
    animation_id: String,
    stepper: RefCell<Option<Box<dyn FrameStepper>>>,
    /// Whether at least one cycle ran to completion.
    completed_a_cycle: Cell<bool>,
    resolver: RefCell<Option<oneshot::Sender<bool>>>,
    completion: Shared<oneshot::Receiver<bool>>,
    abort: RefCell<Option<AbortHandle>>,
}

impl Job {
    pub(crate) fn new(controller: &Rc<ControllerInner>, image_id: &str, animation_id: &str) -> Self {
        let (resolver, completion) = oneshot::channel();
        Self {
            inner: Rc::new(JobInner {
                controller: RefCell::new(Rc::downgrade(controller)),
                image_id: image_id.to_string(),
                animation_id: animation_id.to_string(),
                stepper: RefCell::new(None),
                completed_a_cycle: Cell::new(false),
                resolver: RefCell::new(Some(resolver)),
                completion: completion.shared(),
                abort: RefCell::new(None),
            }),
        }
    }

    pub(crate) fn same(&self, other: &Job) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.inner.resolver.borrow().is_none()
    }

    /// Spawn the run and return its result: `true` when every cycle ran or a
    /// stop was honored after at least one cycle, `false` when cancelled.
    pub(crate) fn go(&self, host: &Host) -> impl Future<Output = bool> + 'static {
        let (handle, registration) = AbortHandle::new_pair();
        *self.inner.abort.borrow_mut() = Some(handle);
        let job = self.clone();
        let task = Abortable::new(job.run(host.clone()), registration).map(|_| ());
        if let Err(err) = host.spawn(task) {
            log::error!(
                "job {}/{}: {err}",
                self.inner.image_id,
                self.inner.animation_id
            );
            self.resolve(false);
        }
        let completion = self.inner.completion.clone();
        async move { completion.await.unwrap_or(false) }
    }

    async fn run(self, host: Host) {
        loop {
            if self.maybe_break() {
                return;
            }
            let Some(controller) = self.live_controller() else {
                return;
            };
            let frame_count =
                controller.set_current(&self.inner.image_id, &self.inner.animation_id);
            if frame_count == 0 {
                log::debug!(
                    "job {}/{}: nothing to animate",
                    self.inner.image_id,
                    self.inner.animation_id
                );
                drop(controller);
                return self.resolve(true);
            }
            controller.reset_playhead();
            let pre_delay = controller.pre_cycle_delay();
            drop(controller);

            if let Some(delay) = pre_delay {
                host.delay(delay).await;
                if self.maybe_break() {
                    return;
                }
            }

            let Some(controller) = self.live_controller() else {
                return;
            };
            let spec = StepperSpec {
                property: INDEX_PROPERTY,
                amount: frame_count,
                rate_limit: controller.rate_limit(),
                duration: controller.duration(),
            };
            drop(controller);
            let target: Rc<dyn StepTarget> = Rc::new(JobTarget {
                job: Rc::downgrade(&self.inner),
            });
            let mut stepper = match host.create_stepper(spec, target) {
                Ok(stepper) => stepper,
                Err(err) => {
                    log::error!(
                        "job {}/{}: {err}",
                        self.inner.image_id,
                        self.inner.animation_id
                    );
                    return self.resolve(false);
                }
            };
            let finished = stepper.finished();
            *self.inner.stepper.borrow_mut() = Some(stepper);
            finished.await;

            let stepper = self.inner.stepper.borrow_mut().take();
            drop(stepper);
            self.inner.completed_a_cycle.set(true);
            if self.maybe_break() {
                return;
            }

            let Some(controller) = self.live_controller() else {
                return;
            };
            let next = controller.next_cycle_delay();
            drop(controller);
            match next {
                None => return self.resolve(true),
                Some(delay) => host.delay(delay).await,
            }
        }
    }

    /// Cancellation check run at every suspension boundary. Returns `true`
    /// when the job was resolved and the run must end.
    fn maybe_break(&self) -> bool {
        let Some(controller) = self.live_controller() else {
            return true;
        };
        if !controller.stop_requested() {
            return false;
        }
        drop(controller);
        self.resolve(self.inner.completed_a_cycle.get());
        true
    }

    /// A soft stop was requested. Honored immediately unless a stepper is
    /// mid-cycle, in which case the end of the cycle honors it.
    pub(crate) fn poke(&self) {
        if self.inner.stepper.borrow().is_none() {
            self.maybe_break();
        }
    }

    /// The owning controller, if this job is still its current job. A stale
    /// job resolves itself `false`.
    fn live_controller(&self) -> Option<AnimatableController> {
        let controller = self.inner.controller.borrow().upgrade();
        let controller = controller.map(AnimatableController::from_inner);
        match controller {
            Some(controller) if !controller.is_torn_down() && controller.is_current(self) => {
                Some(controller)
            }
            _ => {
                self.resolve(false);
                None
            }
        }
    }

    /// Resolve and destroy. Only the first call has any effect.
    pub(crate) fn resolve(&self, result: bool) {
        let Some(resolver) = self.inner.resolver.borrow_mut().take() else {
            return;
        };
        let controller = self.inner.controller.replace(Weak::new()).upgrade();
        let stepper = self.inner.stepper.borrow_mut().take();
        drop(stepper);
        let abort = self.inner.abort.borrow_mut().take();
        if let Some(abort) = abort {
            abort.abort();
        }
        if let Some(controller) = controller {
            AnimatableController::from_inner(controller).release_job(self);
        }
        let _ = resolver.send(result);
    }
}

/// What a job's stepper drives. Calls reaching a stale job are dropped.
struct JobTarget {
    job: Weak<JobInner>,
}

impl JobTarget {
    fn controller(&self) -> Option<AnimatableController> {
        let job = Job {
            inner: self.job.upgrade()?,
        };
        if job.is_destroyed() {
            return None;
        }
        job.live_controller()
    }
}

impl StepTarget for JobTarget {
    fn set_property(&self, property: &str, value: usize) {
        if property != INDEX_PROPERTY {
            return;
        }
        if let Some(controller) = self.controller() {
            controller.set_playhead(value);
        }
    }

    fn adjust_property(&self, property: &str, delta: f64) {
        if property != INDEX_PROPERTY {
            return;
        }
        if let Some(controller) = self.controller() {
            controller.set_dindex(delta);
        }
    }
}
