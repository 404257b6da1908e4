// Reusable actions

use super::{Action, ActionStatus, Entity};
use anyhow::Result;

/// Action backed by a closure
pub struct FnAction<F> {
    name: String,
    update: F,
}

impl<F> FnAction<F>
where
    F: FnMut(&mut Entity) -> Result<ActionStatus>,
{
    pub fn new(name: impl Into<String>, update: F) -> Self {
        Self {
            name: name.into(),
            update,
        }
    }
}

impl<F> Action for FnAction<F>
where
    F: FnMut(&mut Entity) -> Result<ActionStatus>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn update(&mut self, entity: &mut Entity) -> Result<ActionStatus> {
        (self.update)(entity)
    }
}

/// Removes itself after a fixed number of ticks, optionally running a
/// callback on the entity when it expires
pub struct Countdown {
    remaining: u32,
    on_expire: Option<Box<dyn FnMut(&mut Entity)>>,
}

impl Countdown {
    pub fn new(ticks: u32) -> Self {
        Self {
            remaining: ticks,
            on_expire: None,
        }
    }

    /// Run `callback` on the owning entity when the countdown expires
    pub fn on_expire(mut self, callback: impl FnMut(&mut Entity) + 'static) -> Self {
        self.on_expire = Some(Box::new(callback));
        self
    }

    /// Countdown that kills its entity when it expires
    pub fn lifetime(ticks: u32) -> Self {
        Self::new(ticks).on_expire(Entity::kill)
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}

impl Action for Countdown {
    fn name(&self) -> &str {
        "countdown"
    }

    fn update(&mut self, entity: &mut Entity) -> Result<ActionStatus> {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            return Ok(ActionStatus::Continue);
        }
        if let Some(callback) = self.on_expire.as_mut() {
            callback(entity);
        }
        Ok(ActionStatus::Remove)
    }
}
