// Action contract: per-entity behavior run once per tick

use super::Entity;
use anyhow::Result;

/// What an action wants after an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStatus {
    /// Keep running next tick
    Continue,
    /// Detach and destroy this action
    Remove,
}

/// Behavior attached to an entity
///
/// `init` runs when the action is attached, `update` once per tick and
/// `destroy` exactly once, when the action is removed or its entity is destroyed.
/// An error from `update` or `destroy` is logged by the entity and the action
/// is removed; it never aborts the rest of the tree's update.
pub trait Action {
    /// Name used in log messages
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn init(&mut self, _entity: &mut Entity) -> Result<()> {
        Ok(())
    }

    fn update(&mut self, entity: &mut Entity) -> Result<ActionStatus>;

    fn destroy(&mut self, _entity: &mut Entity) -> Result<()> {
        Ok(())
    }
}
