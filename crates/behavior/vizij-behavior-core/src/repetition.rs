//! Repetition policies: whether, and when, an animation cycle runs again.
//!
//! Descriptor forms (the `repeat` field of a behavior descriptor):
//! - absent, `null` or `false`: never repeat
//! - `true`: repeat forever, no delay
//! - a number `n`: `n` cycles in total, no delay between them
//! - `{ "count": n, "delay": ms | [min, max], "post"?: bool }`: `n` cycles,
//!   waiting `delay` before every cycle (or after every cycle when `post`)
//!
//! The remaining count is decremented after each completed cycle, before the
//! repeat check.

use std::time::Duration;

use rand::Rng;
use serde_json::Value as JsonValue;

use crate::error::BehaviorError;

/// Delay between cycles, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Delay {
    Fixed(u64),
    /// Uniformly sampled integer in `[min, max)`.
    Range { min: u64, max: u64 },
}

impl Delay {
    fn sample(&self) -> u64 {
        match *self {
            Delay::Fixed(ms) => ms,
            Delay::Range { min, max } if min >= max => min,
            Delay::Range { min, max } => rand::rng().random_range(min..max),
        }
    }
}

/// Remaining cycles; fractional counts behave like the decrement-then-compare
/// rule says they should (`2.5` plays twice).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Count {
    Unbounded,
    Remaining(f64),
}

impl Count {
    fn decrement(&mut self) {
        if let Count::Remaining(n) = self {
            *n -= 1.0;
        }
    }

    fn at_least_one(&self) -> bool {
        match *self {
            Count::Unbounded => true,
            Count::Remaining(n) => n >= 1.0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum RepetitionPolicy {
    #[default]
    None,
    CountLimited {
        count: Count,
    },
    DelayedCountLimited {
        count: Count,
        delay: Delay,
        delay_first: bool,
    },
}

impl RepetitionPolicy {
    /// Build a policy from the `repeat` field of a descriptor.
    pub fn from_descriptor(desc: Option<&JsonValue>) -> Result<Self, BehaviorError> {
        let Some(desc) = desc else {
            return Ok(RepetitionPolicy::None);
        };
        match desc {
            JsonValue::Null | JsonValue::Bool(false) => Ok(RepetitionPolicy::None),
            JsonValue::Bool(true) => Ok(RepetitionPolicy::CountLimited {
                count: Count::Unbounded,
            }),
            JsonValue::Number(n) => match n.as_f64() {
                Some(n) => Ok(RepetitionPolicy::CountLimited {
                    count: Count::Remaining(n),
                }),
                None => Err(invalid(desc)),
            },
            JsonValue::Object(map) => {
                let count = map
                    .get("count")
                    .and_then(JsonValue::as_f64)
                    .ok_or_else(|| invalid(desc))?;
                let delay = map
                    .get("delay")
                    .and_then(parse_delay)
                    .ok_or_else(|| invalid(desc))?;
                let post = map.get("post").map(truthy).unwrap_or(false);
                Ok(RepetitionPolicy::DelayedCountLimited {
                    count: Count::Remaining(count),
                    delay,
                    delay_first: !post,
                })
            }
            _ => Err(invalid(desc)),
        }
    }

    pub fn should_delay_first(&self) -> bool {
        match self {
            RepetitionPolicy::DelayedCountLimited { delay_first, .. } => *delay_first,
            _ => false,
        }
    }

    pub fn should_repeat(&self) -> bool {
        match self {
            RepetitionPolicy::None => false,
            RepetitionPolicy::CountLimited { count }
            | RepetitionPolicy::DelayedCountLimited { count, .. } => count.at_least_one(),
        }
    }

    /// Pause before the next cycle; `None` means never.
    pub fn next_repetition_in(&self) -> Option<Duration> {
        match self {
            RepetitionPolicy::None => None,
            RepetitionPolicy::CountLimited { .. } => Some(Duration::ZERO),
            RepetitionPolicy::DelayedCountLimited { delay, .. } => {
                Some(Duration::from_millis(delay.sample()))
            }
        }
    }

    pub fn decrement(&mut self) {
        match self {
            RepetitionPolicy::None => {}
            RepetitionPolicy::CountLimited { count }
            | RepetitionPolicy::DelayedCountLimited { count, .. } => count.decrement(),
        }
    }
}

fn invalid(desc: &JsonValue) -> BehaviorError {
    log::error!("problematic repetition descriptor {desc}");
    BehaviorError::InvalidRepetition {
        descriptor: desc.to_string(),
    }
}

fn millis(v: &JsonValue) -> Option<u64> {
    let ms = v.as_f64()?;
    (ms.is_finite() && ms >= 0.0).then_some(ms as u64)
}

fn parse_delay(v: &JsonValue) -> Option<Delay> {
    if v.is_number() {
        return millis(v).map(Delay::Fixed);
    }
    let range = v.as_array()?;
    let (min, max) = (millis(range.first()?)?, millis(range.get(1)?)?);
    (min <= max).then_some(Delay::Range { min, max })
}

fn truthy(v: &JsonValue) -> bool {
    match v {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        JsonValue::String(s) => !s.is_empty(),
        _ => true,
    }
}
