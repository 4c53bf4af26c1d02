//! Host collaborators: executor, timer and frame steppers.
//!
//! Everything runs on one cooperative scheduler driven by the host. The core
//! never blocks and never spawns threads; it spawns local tasks on the host's
//! executor and suspends on the timer and on stepper completion signals.

use std::fmt;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use futures::future::LocalBoxFuture;
use futures::task::{LocalSpawn, LocalSpawnExt};

use crate::config::Config;
use crate::error::BehaviorError;

/// Property every frame stepper animates.
pub const INDEX_PROPERTY: &str = "index";

/// Event-loop timer.
pub trait Timer {
    /// Future resolving once `after` has elapsed on the host clock.
    fn delay(&self, after: Duration) -> LocalBoxFuture<'static, ()>;
}

/// Receiver of the values a stepper produces.
pub trait StepTarget {
    /// Set `property` to an absolute value.
    fn set_property(&self, property: &str, value: usize);
    /// Move `property` by a (possibly fractional) amount.
    fn adjust_property(&self, property: &str, delta: f64);
}

/// What a stepper animates: `property` goes from 0 to `amount` over
/// `duration`, reported in steps of at least `rate_limit`.
#[derive(Clone, Debug, PartialEq)]
pub struct StepperSpec {
    pub property: &'static str,
    pub amount: usize,
    pub rate_limit: f32,
    pub duration: Option<Duration>,
}

/// A running stepper. Dropping it destroys it: no further calls reach the
/// target and the completion signal never fires.
pub trait FrameStepper {
    /// Completion signal. Resolves once, when the stepper reached `amount`.
    fn finished(&mut self) -> LocalBoxFuture<'static, ()>;
}

pub trait StepperFactory {
    fn create(
        &self,
        spec: StepperSpec,
        target: Rc<dyn StepTarget>,
    ) -> Result<Box<dyn FrameStepper>, BehaviorError>;
}

/// Bundle of collaborators shared by controllers, switchers and groups.
#[derive(Clone)]
pub struct Host {
    spawner: Rc<dyn LocalSpawn>,
    timer: Rc<dyn Timer>,
    steppers: Rc<dyn StepperFactory>,
    config: Config,
}

impl Host {
    pub fn new(
        spawner: Rc<dyn LocalSpawn>,
        timer: Rc<dyn Timer>,
        steppers: Rc<dyn StepperFactory>,
    ) -> Self {
        Self {
            spawner,
            timer,
            steppers,
            config: Config::default(),
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn spawn(&self, task: impl Future<Output = ()> + 'static) -> Result<(), BehaviorError> {
        self.spawner
            .spawn_local(task)
            .map_err(|err| BehaviorError::Spawn {
                reason: err.to_string(),
            })
    }

    /// Suspend for `after`. Zero-length delays complete without involving
    /// the timer.
    pub async fn delay(&self, after: Duration) {
        if after.is_zero() {
            return;
        }
        self.timer.delay(after).await;
    }

    pub fn create_stepper(
        &self,
        spec: StepperSpec,
        target: Rc<dyn StepTarget>,
    ) -> Result<Box<dyn FrameStepper>, BehaviorError> {
        if spec.amount == 0 {
            return Err(BehaviorError::EmptyStepper);
        }
        self.steppers.create(spec, target)
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
