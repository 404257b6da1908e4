// Cooperative stop request shared between the engine and its modules

use std::cell::Cell;
use std::rc::Rc;

/// Handle used to ask the engine's run loop to stop after the current tick
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    requested: Rc<Cell<bool>>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the run loop to stop
    pub fn request(&self) {
        self.requested.set(true);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.get()
    }
}
