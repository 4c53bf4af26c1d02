//! Named-state switching with last-writer-wins semantics.
//!
//! `switch_to` interrupts the state being left and, once it settles, starts
//! the requested state. Every request takes a fresh token; a request whose
//! token is no longer the latest when the previous state settles resolves
//! `Done(false)` without touching any state. A finished state that asks for
//! a follow-up (`Outcome::SwitchTo`) triggers a new switch, spawned on the
//! host executor, and its caller receives the plain result.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use futures::future::{self, FutureExt, TryFutureExt};
use indexmap::IndexMap;

use crate::animation::Animatable;
use crate::error::BehaviorError;
use crate::host::Host;
use crate::outcome::{Outcome, UnitFuture};

struct SwitcherInner {
    host: Host,
    states: RefCell<IndexMap<String, Rc<dyn Animatable>>>,
    current: RefCell<Option<String>>,
    target: RefCell<Option<String>>,
    last_switch: Cell<u64>,
    torn_down: Cell<bool>,
}

#[derive(Clone)]
pub struct StateSwitcher {
    inner: Rc<SwitcherInner>,
}

impl StateSwitcher {
    pub fn new(host: Host) -> Self {
        Self {
            inner: Rc::new(SwitcherInner {
                host,
                states: RefCell::new(IndexMap::new()),
                current: RefCell::new(None),
                target: RefCell::new(None),
                last_switch: Cell::new(0),
                torn_down: Cell::new(false),
            }),
        }
    }

    /// Register `state` under `name`, replacing any previous entry.
    pub fn add_state(&self, name: impl Into<String>, state: impl Animatable + 'static) {
        self.inner
            .states
            .borrow_mut()
            .insert(name.into(), Rc::new(state));
    }

    pub fn current_state(&self) -> Option<String> {
        self.inner.current.borrow().clone()
    }

    pub fn target_state(&self) -> Option<String> {
        self.inner.target.borrow().clone()
    }

    /// State names in declaration order.
    pub fn state_names(&self) -> Vec<String> {
        self.inner.states.borrow().keys().cloned().collect()
    }

    pub fn switch_to(&self, name: &str) -> UnitFuture {
        if self.inner.current.borrow().as_deref() == Some(name) {
            return future::ready(Ok(Outcome::Done(true))).boxed_local();
        }
        let previous = self.inner.current.replace(Some(name.to_string()));
        *self.inner.target.borrow_mut() = Some(name.to_string());
        let token = self.bump();
        log::debug!("switcher: {previous:?} => {name}");

        let leaving = previous
            .and_then(|previous| self.state(&previous))
            .map(|state| state.interrupt());
        let switcher = self.clone();
        let name = name.to_string();
        async move {
            if let Some(leaving) = leaving {
                leaving.await?;
            }
            switcher.switch_to_phase2(&name, token).await
        }
        .boxed_local()
    }

    async fn switch_to_phase2(&self, name: &str, token: u64) -> Result<Outcome, BehaviorError> {
        if self.superseded(name, token) {
            return Ok(Outcome::Done(false));
        }
        let Some(state) = self.state(name) else {
            log::warn!("switcher did not recognize state {name}, cannot start");
            return Ok(Outcome::Done(false));
        };
        // Re-entered before an earlier exit settled: join that stop first.
        if state.is_working() {
            log::debug!("switcher: waiting for {name} to settle before restarting it");
            state.interrupt().await?;
            if self.superseded(name, token) {
                return Ok(Outcome::Done(false));
            }
        }
        let outcome = state.start().await?;
        Ok(self.on_phase2_done(outcome, token))
    }

    fn superseded(&self, name: &str, token: u64) -> bool {
        let superseded = self.inner.current.borrow().as_deref() != Some(name)
            || self.inner.last_switch.get() != token;
        if superseded {
            log::debug!("switcher: switch to {name} superseded");
        }
        superseded
    }

    fn on_phase2_done(&self, outcome: Outcome, token: u64) -> Outcome {
        let Outcome::SwitchTo { state, result } = outcome else {
            return outcome;
        };
        if self.inner.last_switch.get() == token && !self.inner.torn_down.get() {
            let next = self.switch_to(&state);
            let spawned = self.inner.host.spawn(async move {
                if let Err(err) = next.await {
                    log::error!("switcher: chained switch failed: {err}");
                }
            });
            if let Err(err) = spawned {
                log::error!("switcher: cannot chain to {state}: {err}");
            }
        }
        Outcome::Done(result)
    }

    /// Return to idle, invalidating in-flight switches, and run `leave` on
    /// the state that was current.
    fn leave(&self, leave: impl FnOnce(&dyn Animatable) -> UnitFuture) -> UnitFuture {
        let previous = self.inner.current.borrow_mut().take();
        self.inner.target.borrow_mut().take();
        self.bump();
        match previous.and_then(|previous| self.state(&previous)) {
            Some(state) => leave(state.as_ref()),
            None => future::ready(Ok(Outcome::Done(true))).boxed_local(),
        }
    }

    fn state(&self, name: &str) -> Option<Rc<dyn Animatable>> {
        self.inner.states.borrow().get(name).cloned()
    }

    fn bump(&self) -> u64 {
        let token = self.inner.last_switch.get() + 1;
        self.inner.last_switch.set(token);
        token
    }
}

impl Animatable for StateSwitcher {
    /// Restart the current state, if any.
    fn start(&self) -> UnitFuture {
        let current = self.current_state();
        let Some(state) = current.and_then(|current| self.state(&current)) else {
            return future::ready(Ok(Outcome::Done(false))).boxed_local();
        };
        let token = self.inner.last_switch.get();
        let switcher = self.clone();
        state
            .start()
            .map_ok(move |outcome| switcher.on_phase2_done(outcome, token))
            .boxed_local()
    }

    fn stop(&self) -> UnitFuture {
        self.leave(|state| state.stop())
    }

    fn interrupt(&self) -> UnitFuture {
        self.leave(|state| state.interrupt())
    }

    fn switch_to(&self, state: &str) -> UnitFuture {
        StateSwitcher::switch_to(self, state)
    }

    fn is_working(&self) -> bool {
        let current = self.current_state();
        current
            .and_then(|current| self.state(&current))
            .is_some_and(|state| state.is_working())
    }

    fn tear_down(&self) {
        self.inner.torn_down.set(true);
        self.inner.current.borrow_mut().take();
        self.inner.target.borrow_mut().take();
        self.bump();
        let states: Vec<Rc<dyn Animatable>> = self.inner.states.borrow().values().cloned().collect();
        for state in states {
            state.tear_down();
        }
    }

    fn is_torn_down(&self) -> bool {
        self.inner.torn_down.get()
    }
}

impl fmt::Debug for StateSwitcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSwitcher")
            .field("states", &self.state_names())
            .field("current", &self.current_state())
            .field("last_switch", &self.inner.last_switch.get())
            .finish_non_exhaustive()
    }
}
