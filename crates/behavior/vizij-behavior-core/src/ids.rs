//! Identifiers for controllers.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ControllerId(pub u32);

static NEXT_CONTROLLER: AtomicU32 = AtomicU32::new(1);

impl ControllerId {
    /// Allocate the next process-wide id. Ids are opaque and only used for
    /// diagnostics.
    #[inline]
    pub fn next() -> Self {
        ControllerId(NEXT_CONTROLLER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
