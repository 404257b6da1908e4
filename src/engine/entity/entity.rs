// Hierarchical entity: ordered actions plus ordered, owned children

use super::{Action, ActionStatus, EntityError};
use bitflags::bitflags;
use log::{debug, warn};

bitflags! {
    /// Per-entity properties
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EntityFlags: u8 {
        /// The parent destroys and detaches this entity on its next update
        const DEAD = 1 << 0;
        /// Cleared to skip this entity and its subtree during updates
        const UPDATE_ENABLED = 1 << 1;
    }
}

impl Default for EntityFlags {
    fn default() -> Self {
        EntityFlags::UPDATE_ENABLED
    }
}

/// Node of the entity tree
///
/// An entity exclusively owns its children; insertion order is traversal order.
/// Dropping an entity destroys its remaining actions and children.
#[derive(Default)]
pub struct Entity {
    name: Option<String>,
    flags: EntityFlags,
    actions: Vec<Box<dyn Action>>,
    children: Vec<Entity>,
    /// Set by `destroy`, including while this entity's actions are updating
    destroyed: bool,
}

impl Entity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an entity with a name used in logs and `find_child`
    pub fn named(name: impl Into<String>) -> Self {
        let mut entity = Self::default();
        entity.name = Some(name.into());
        entity
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }

    pub fn flags(&self) -> EntityFlags {
        self.flags
    }

    /// Mark this entity for removal by its parent
    pub fn kill(&mut self) {
        self.flags |= EntityFlags::DEAD;
    }

    pub fn is_dead(&self) -> bool {
        self.flags.contains(EntityFlags::DEAD)
    }

    pub fn set_update_enabled(&mut self, enabled: bool) {
        self.flags.set(EntityFlags::UPDATE_ENABLED, enabled);
    }

    pub fn is_update_enabled(&self) -> bool {
        self.flags.contains(EntityFlags::UPDATE_ENABLED)
    }

    /// Append an action and run its `init` against this entity
    ///
    /// If `init` fails the action is destroyed and not attached.
    pub fn attach_action<A: Action + 'static>(&mut self, action: A) -> Result<(), EntityError> {
        self.attach_boxed(Box::new(action))
    }

    pub fn attach_boxed(&mut self, mut action: Box<dyn Action>) -> Result<(), EntityError> {
        if let Err(source) = action.init(self) {
            let name = action.name().to_string();
            warn!("Action '{}' failed to init on '{}': {:#}", name, self.label(), source);
            self.destroy_action(action.as_mut());
            return Err(EntityError::ActionInit { action: name, source });
        }
        self.actions.push(action);
        Ok(())
    }

    /// Number of attached actions
    ///
    /// While this entity's actions are updating, only actions attached during
    /// the pass are counted.
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Names of the attached actions, in attachment order
    pub fn action_names(&self) -> Vec<&str> {
        self.actions.iter().map(|action| action.name()).collect()
    }

    /// Append a child and return its index
    pub fn add_child(&mut self, child: Entity) -> usize {
        self.children.push(child);
        self.children.len() - 1
    }

    /// Detach a child without destroying it
    pub fn remove_child(&mut self, index: usize) -> Result<Entity, EntityError> {
        self.check_index(index)?;
        Ok(self.children.remove(index))
    }

    /// Detach a child and destroy its subtree
    pub fn destroy_child(&mut self, index: usize) -> Result<(), EntityError> {
        let mut child = self.remove_child(index)?;
        child.destroy();
        Ok(())
    }

    /// Destroy every child
    pub fn clear_children(&mut self) {
        for mut child in self.children.drain(..) {
            child.destroy();
        }
    }

    pub fn child(&self, index: usize) -> Option<&Entity> {
        self.children.get(index)
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut Entity> {
        self.children.get_mut(index)
    }

    pub fn children(&self) -> &[Entity] {
        &self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// First direct child with the given name
    pub fn find_child(&self, name: &str) -> Option<&Entity> {
        self.children.iter().find(|child| child.name() == Some(name))
    }

    /// Entities below this one, at any depth
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }

    /// Run one tick over this subtree
    ///
    /// This entity's actions run first, in attachment order, then each child in
    /// insertion order (depth-first, pre-order). Dead children are destroyed and
    /// detached before and after the child pass, even when this entity is
    /// disabled. Disabled or dead entities are otherwise skipped along with
    /// their subtree.
    pub fn update(&mut self) {
        self.reap_dead_children();
        if self.is_dead() || !self.is_update_enabled() {
            return;
        }

        self.update_actions();
        if self.destroyed {
            return;
        }

        self.reap_dead_children();
        for child in &mut self.children {
            child.update();
        }
        self.reap_dead_children();
    }

    /// Destroy every action in attachment order, then every child
    ///
    /// The entity is marked dead so its parent detaches it on its next update.
    pub fn destroy(&mut self) {
        self.destroyed = true;
        let had_content = !self.actions.is_empty() || !self.children.is_empty();

        self.destroy_actions();
        self.clear_children();
        self.kill();

        if had_content {
            debug!("Entity '{}' destroyed", self.label());
        }
    }

    fn update_actions(&mut self) {
        let mut actions = std::mem::take(&mut self.actions);

        actions.retain_mut(|action| {
            // An earlier action destroyed the entity; the rest are destroyed below
            if self.destroyed {
                return true;
            }
            self.update_action(&mut **action)
        });

        if self.destroyed {
            for mut action in actions {
                self.destroy_action(action.as_mut());
            }
            self.destroy_actions();
            return;
        }

        // Actions attached during the pass go after the existing ones
        let added = std::mem::replace(&mut self.actions, actions);
        self.actions.extend(added);
    }

    /// Update one action, returning whether it stays attached
    fn update_action(&mut self, action: &mut dyn Action) -> bool {
        match action.update(self) {
            Ok(ActionStatus::Continue) => true,
            Ok(ActionStatus::Remove) => {
                self.destroy_action(action);
                false
            }
            Err(err) => {
                warn!(
                    "Action '{}' failed on '{}', removing it: {:#}",
                    action.name(),
                    self.label(),
                    err
                );
                self.destroy_action(action);
                false
            }
        }
    }

    /// Destroy attached actions in order. Actions may attach further actions
    /// while being destroyed.
    fn destroy_actions(&mut self) {
        while !self.actions.is_empty() {
            let actions = std::mem::take(&mut self.actions);
            for mut action in actions {
                self.destroy_action(action.as_mut());
            }
        }
    }

    fn destroy_action(&mut self, action: &mut dyn Action) {
        if let Err(err) = action.destroy(self) {
            warn!(
                "Action '{}' failed to destroy on '{}': {:#}",
                action.name(),
                self.label(),
                err
            );
        }
    }

    fn reap_dead_children(&mut self) {
        if !self.children.iter().any(Entity::is_dead) {
            return;
        }
        let (dead, alive): (Vec<Entity>, Vec<Entity>) =
            std::mem::take(&mut self.children)
                .into_iter()
                .partition(Entity::is_dead);
        self.children = alive;
        for mut child in dead {
            child.destroy();
        }
    }

    fn check_index(&self, index: usize) -> Result<(), EntityError> {
        if index < self.children.len() {
            Ok(())
        } else {
            Err(EntityError::ChildIndexOutOfBounds {
                index,
                len: self.children.len(),
            })
        }
    }
}

impl Drop for Entity {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("actions", &self.action_names())
            .field("children", &self.children)
            .finish()
    }
}
