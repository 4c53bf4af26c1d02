//! Per-element animation controller.
//!
//! A controller owns at most one [`Job`] at a time, the frame list of the
//! current run, the repetition policy and the end behavior. Stops come in
//! two flavors: hard stops resolve the running job immediately, soft stops
//! register a single pending request that the job honors at its next cycle
//! boundary.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use futures::channel::oneshot;
use futures::future::{self, FutureExt, Shared};
use serde_json::Value as JsonValue;

use crate::element::VisualElement;
use crate::error::BehaviorError;
use crate::frame::Frame;
use crate::host::Host;
use crate::ids::ControllerId;
use crate::job::Job;
use crate::outcome::{EndBehavior, Outcome, OutcomeFuture};
use crate::registry::{AnimationRegistry, Resolution};
use crate::repetition::RepetitionPolicy;

/// Pending soft stop. Every soft stop issued while one is pending joins it.
struct StopRequest {
    resolver: Option<oneshot::Sender<bool>>,
    signal: Shared<oneshot::Receiver<bool>>,
}

impl StopRequest {
    fn new() -> Self {
        let (resolver, signal) = oneshot::channel();
        Self {
            resolver: Some(resolver),
            signal: signal.shared(),
        }
    }

    fn resolve(mut self, result: bool) {
        if let Some(resolver) = self.resolver.take() {
            let _ = resolver.send(result);
        }
    }
}

struct ControllerState {
    element: Option<Rc<dyn VisualElement>>,
    registry: Option<Rc<AnimationRegistry>>,
    repetition: RepetitionPolicy,
    /// Frames of the current run; `None` when resolution yielded nothing.
    frames: Option<Vec<Frame>>,
    index: usize,
    accumulator: f64,
    current_job: Option<Job>,
    duration: Option<Duration>,
    rate_limit: f32,
    end_behavior: EndBehavior,
    should_stop: Option<StopRequest>,
    debug: bool,
    torn_down: bool,
}

pub(crate) struct ControllerInner {
    id: ControllerId,
    host: Host,
    state: RefCell<ControllerState>,
}

#[derive(Clone)]
pub struct AnimatableController {
    inner: Rc<ControllerInner>,
}

impl AnimatableController {
    pub fn new(
        host: Host,
        element: Option<Rc<dyn VisualElement>>,
        registry: Rc<AnimationRegistry>,
    ) -> Self {
        let config = host.config().clone();
        Self {
            inner: Rc::new(ControllerInner {
                id: ControllerId::next(),
                host,
                state: RefCell::new(ControllerState {
                    element,
                    registry: Some(registry),
                    repetition: RepetitionPolicy::None,
                    frames: None,
                    index: 0,
                    accumulator: 0.0,
                    current_job: None,
                    duration: None,
                    rate_limit: config.rate_limit,
                    end_behavior: EndBehavior::None,
                    should_stop: None,
                    debug: config.debug,
                    torn_down: false,
                }),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Rc<ControllerInner>) -> Self {
        Self { inner }
    }

    pub fn id(&self) -> ControllerId {
        self.inner.id
    }

    pub fn host(&self) -> &Host {
        &self.inner.host
    }

    /// Run `image_id/animation_id` until it completes or is stopped, then
    /// apply the end behavior. Fails if a job is already live.
    pub fn start(&self, image_id: &str, animation_id: &str) -> Result<OutcomeFuture, BehaviorError> {
        let job = {
            let mut st = self.inner.state.borrow_mut();
            if st.torn_down {
                return Err(BehaviorError::TornDown { id: self.id() });
            }
            if st.current_job.is_some() {
                return Err(BehaviorError::AlreadyWorking { id: self.id() });
            }
            let job = Job::new(&self.inner, image_id, animation_id);
            st.current_job = Some(job.clone());
            job
        };
        log::debug!("controller {}: start {image_id}/{animation_id}", self.id());
        let done = job.go(&self.inner.host);
        let controller = self.clone();
        Ok(async move {
            let result = done.await;
            controller.do_the_finish(result)
        }
        .boxed_local())
    }

    pub fn stop(&self, soft: bool) -> OutcomeFuture {
        self.interrupt(soft)
    }

    /// Stop the current job. A hard stop settles before this returns with the
    /// job's plain result, leaving the end behavior to the `start` future; a
    /// soft stop settles once the job reaches a cycle boundary.
    pub fn interrupt(&self, soft: bool) -> OutcomeFuture {
        let job = self.inner.state.borrow().current_job.clone();
        let Some(job) = job else {
            return future::ready(self.do_the_finish(true)).boxed_local();
        };

        if !soft {
            let pending = {
                let mut st = self.inner.state.borrow_mut();
                st.current_job = None;
                st.should_stop.take()
            };
            log::debug!("controller {}: hard stop", self.id());
            if let Some(pending) = pending {
                pending.resolve(false);
            }
            job.resolve(false);
            return future::ready(Outcome::Done(false)).boxed_local();
        }

        let signal = self
            .inner
            .state
            .borrow_mut()
            .should_stop
            .get_or_insert_with(StopRequest::new)
            .signal
            .clone();
        log::debug!("controller {}: soft stop requested", self.id());
        job.poke();
        let controller = self.clone();
        async move {
            let result = signal.await.unwrap_or(false);
            controller.do_the_finish(result)
        }
        .boxed_local()
    }

    /// Apply the end behavior to a settled result.
    pub fn do_the_finish(&self, result: bool) -> Outcome {
        let end_behavior = self.inner.state.borrow().end_behavior.clone();
        if end_behavior.hides() {
            self.hide();
        }
        match end_behavior.switch_to() {
            Some(state) => Outcome::SwitchTo {
                state: state.to_string(),
                result,
            },
            None => Outcome::Done(result),
        }
    }

    pub fn is_working(&self) -> bool {
        self.inner.state.borrow().current_job.is_some()
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.state.borrow().torn_down
    }

    /// Display frame `index` of the current run. Indices outside the frame
    /// list are ignored.
    pub fn set_index(&self, index: usize) {
        let (frame, debug) = {
            let mut st = self.inner.state.borrow_mut();
            let frame = st.frames.as_ref().and_then(|frames| frames.get(index)).cloned();
            if frame.is_some() {
                st.index = index;
            }
            (frame, st.debug)
        };
        match frame {
            Some(frame) => {
                if debug {
                    log::debug!("controller {}: index {index}", self.id());
                }
                self.set_image(&frame);
            }
            None if debug => {
                log::debug!("controller {}: index {index} out of range", self.id());
            }
            None => {}
        }
    }

    /// Move the playhead by a fractional amount; the floor is displayed.
    pub fn set_dindex(&self, delta: f64) {
        let (previous, next) = {
            let mut st = self.inner.state.borrow_mut();
            let previous = st.accumulator.max(0.0).floor();
            st.accumulator += delta;
            (previous, st.accumulator.max(0.0).floor())
        };
        if next != previous {
            self.set_index(next as usize);
        }
    }

    /// Jump the playhead to an absolute frame.
    pub(crate) fn set_playhead(&self, index: usize) {
        self.inner.state.borrow_mut().accumulator = index as f64;
        self.set_index(index);
    }

    /// Rewind to the first frame at the top of a cycle.
    pub(crate) fn reset_playhead(&self) {
        {
            let mut st = self.inner.state.borrow_mut();
            st.accumulator = 0.0;
            st.index = 0;
        }
        self.set_index(0);
    }

    /// Resolve `image_id/animation_id` into the frame list of the next run.
    /// Returns the number of frames, 0 when there is nothing to animate.
    pub fn set_current(&self, image_id: &str, animation_id: &str) -> usize {
        let registry = self.inner.state.borrow().registry.clone();
        let resolution = registry
            .map(|registry| registry.resolve(image_id, animation_id))
            .unwrap_or(Resolution::UnknownImage);
        let frames = match resolution {
            Resolution::UnknownImage => {
                log::warn!("controller {}: unknown image {image_id}", self.id());
                self.hide();
                None
            }
            Resolution::UnknownAnimation => {
                log::warn!(
                    "controller {}: unknown animation {animation_id} for {image_id}",
                    self.id()
                );
                None
            }
            Resolution::Frames(frames) => frames
                .into_iter()
                .collect::<Option<Vec<Frame>>>()
                .filter(|frames| !frames.is_empty()),
        };
        let count = frames.as_ref().map_or(0, Vec::len);
        let mut st = self.inner.state.borrow_mut();
        st.frames = frames;
        st.index = 0;
        st.accumulator = 0.0;
        count
    }

    /// Hand `frame` to the element and show it.
    pub fn set_image(&self, frame: &Frame) {
        let element = self.inner.state.borrow().element.clone();
        let Some(element) = element else {
            log::debug!("controller {}: no element to display on", self.id());
            return;
        };
        if !element.accepts_images() {
            log::error!(
                "controller {}: element {} cannot display images",
                self.id(),
                element.id()
            );
            element.hide();
            return;
        }
        element.on_remote_loaded(frame.content());
        element.show();
    }

    /// Display one frame without running a job.
    pub fn set_static_image(&self, image_id: &str, animation_id: &str, index: usize) {
        if self.set_current(image_id, animation_id) > 0 {
            self.set_index(index);
        }
    }

    /// Hard-stop, then replace the repetition policy.
    pub fn set_repetition(&self, descriptor: Option<&JsonValue>) -> Result<(), BehaviorError> {
        let policy = RepetitionPolicy::from_descriptor(descriptor)?;
        drop(self.interrupt(false));
        self.inner.state.borrow_mut().repetition = policy;
        Ok(())
    }

    /// Hard-stop, then replace the cycle duration.
    pub fn set_duration(&self, duration: Option<Duration>) {
        drop(self.interrupt(false));
        self.inner.state.borrow_mut().duration = duration;
    }

    pub fn set_end_behavior(&self, end_behavior: EndBehavior) {
        self.inner.state.borrow_mut().end_behavior = end_behavior;
    }

    pub fn set_debug(&self, debug: bool) {
        self.inner.state.borrow_mut().debug = debug;
    }

    /// Whether `image_id/animation_id` has nothing to play: unknown, empty,
    /// or containing a missing frame.
    pub fn is_empty_animation(&self, image_id: &str, animation_id: &str) -> bool {
        let registry = self.inner.state.borrow().registry.clone();
        match registry.map(|registry| registry.resolve(image_id, animation_id)) {
            Some(Resolution::Frames(frames)) => {
                frames.is_empty() || frames.iter().any(Option::is_none)
            }
            _ => true,
        }
    }

    pub fn current_index(&self) -> usize {
        self.inner.state.borrow().index
    }

    pub fn frame_count(&self) -> usize {
        self.inner.state.borrow().frames.as_ref().map_or(0, Vec::len)
    }

    pub fn duration(&self) -> Option<Duration> {
        self.inner.state.borrow().duration
    }

    pub fn rate_limit(&self) -> f32 {
        self.inner.state.borrow().rate_limit
    }

    /// Stop hard, then drop the repetition policy, frames, registry and
    /// element. Safe mid-animation; further starts fail.
    pub fn tear_down(&self) {
        drop(self.interrupt(false));
        let mut st = self.inner.state.borrow_mut();
        st.torn_down = true;
        st.repetition = RepetitionPolicy::None;
        st.frames = None;
        st.registry = None;
        st.element = None;
    }

    fn hide(&self) {
        let element = self.inner.state.borrow().element.clone();
        if let Some(element) = element {
            element.hide();
        }
    }

    pub(crate) fn is_current(&self, job: &Job) -> bool {
        self.inner
            .state
            .borrow()
            .current_job
            .as_ref()
            .is_some_and(|current| current.same(job))
    }

    pub(crate) fn stop_requested(&self) -> bool {
        self.inner.state.borrow().should_stop.is_some()
    }

    /// Pause before a cycle, when the policy delays first.
    pub(crate) fn pre_cycle_delay(&self) -> Option<Duration> {
        let st = self.inner.state.borrow();
        if st.repetition.should_delay_first() {
            st.repetition.next_repetition_in()
        } else {
            None
        }
    }

    /// Count a finished cycle. `None` when the run is over, otherwise the
    /// pause before the next cycle (zero when the pause precedes cycles).
    pub(crate) fn next_cycle_delay(&self) -> Option<Duration> {
        let mut st = self.inner.state.borrow_mut();
        st.repetition.decrement();
        if !st.repetition.should_repeat() {
            return None;
        }
        if st.repetition.should_delay_first() {
            Some(Duration::ZERO)
        } else {
            st.repetition.next_repetition_in()
        }
    }

    /// Forget `job` if it is still current; a pending soft stop is then
    /// satisfied.
    pub(crate) fn release_job(&self, job: &Job) {
        let pending = {
            let mut st = self.inner.state.borrow_mut();
            if !st.current_job.as_ref().is_some_and(|current| current.same(job)) {
                return;
            }
            st.current_job = None;
            st.should_stop.take()
        };
        if let Some(pending) = pending {
            pending.resolve(true);
        }
    }
}

impl fmt::Debug for AnimatableController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimatableController")
            .field("id", &self.id())
            .field("working", &self.is_working())
            .field("frames", &self.frame_count())
            .finish_non_exhaustive()
    }
}
