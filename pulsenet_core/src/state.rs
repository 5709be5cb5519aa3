use serde::{Deserialize, Serialize};

/// Fixed-length refractory window, counted in processed cycles.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefractoryState {
    pub active: bool,
    pub counter: u32,
}

impl RefractoryState {
    #[inline]
    pub fn enter(&mut self) {
        self.active = true;
        self.counter = 0;
    }

    /// Advance one cycle. Returns `true` on the cycle the window closes.
    #[inline]
    pub fn advance(&mut self, events: u32) -> bool {
        if !self.active {
            return false;
        }
        self.counter += 1;
        if self.counter >= events {
            self.active = false;
            return true;
        }
        false
    }
}
