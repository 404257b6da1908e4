// Entity tree and the actions that drive it
//
// ## Architecture
//
// - `entity`: the tree node, owning its children and attached actions
// - `action`: the per-tick behavior contract
// - `actions`: reusable actions (closures, countdowns)
//
// ## Usage Example
//
// ```rust
// use tickwork::engine::entity::{ActionStatus, Entity, FnAction};
//
// let mut root = Entity::named("root");
// let mut ship = Entity::named("ship");
// ship.attach_action(FnAction::new("drift", |_ship: &mut Entity| {
//     Ok(ActionStatus::Continue)
// }))?;
// root.add_child(ship);
//
// // Once per tick
// root.update();
// ```

mod action;
mod actions;
#[allow(clippy::module_inception)]
mod entity;

pub use action::{Action, ActionStatus};
pub use actions::{Countdown, FnAction};
pub use entity::{Entity, EntityFlags};

/// Entity tree errors
#[derive(Debug, thiserror::Error)]
pub enum EntityError {
    #[error("Action '{action}' failed to initialize: {source}")]
    ActionInit {
        action: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Child index {index} out of bounds for {len} children")]
    ChildIndexOutOfBounds { index: usize, len: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use std::cell::RefCell;
    use std::rc::Rc;

    type CallLog = Rc<RefCell<Vec<String>>>;

    /// Action that records its calls and removes itself on a chosen tick
    struct Recorder {
        label: &'static str,
        log: CallLog,
        ticks: u32,
        remove_on: Option<u32>,
        fail_update_on: Option<u32>,
        fail_destroy: bool,
    }

    impl Recorder {
        fn new(label: &'static str, log: &CallLog) -> Self {
            Self {
                label,
                log: Rc::clone(log),
                ticks: 0,
                remove_on: None,
                fail_update_on: None,
                fail_destroy: false,
            }
        }

        fn remove_on(mut self, tick: u32) -> Self {
            self.remove_on = Some(tick);
            self
        }

        fn fail_update_on(mut self, tick: u32) -> Self {
            self.fail_update_on = Some(tick);
            self
        }

        fn fail_destroy(mut self) -> Self {
            self.fail_destroy = true;
            self
        }
    }

    impl Action for Recorder {
        fn name(&self) -> &str {
            self.label
        }

        fn init(&mut self, _entity: &mut Entity) -> Result<()> {
            self.log.borrow_mut().push(format!("init:{}", self.label));
            Ok(())
        }

        fn update(&mut self, _entity: &mut Entity) -> Result<ActionStatus> {
            self.ticks += 1;
            self.log.borrow_mut().push(format!("update:{}", self.label));
            if self.fail_update_on == Some(self.ticks) {
                return Err(anyhow!("{} blew up", self.label));
            }
            if self.remove_on == Some(self.ticks) {
                return Ok(ActionStatus::Remove);
            }
            Ok(ActionStatus::Continue)
        }

        fn destroy(&mut self, _entity: &mut Entity) -> Result<()> {
            self.log.borrow_mut().push(format!("destroy:{}", self.label));
            if self.fail_destroy {
                return Err(anyhow!("{} refused to die", self.label));
            }
            Ok(())
        }
    }

    struct FailingInit {
        log: CallLog,
    }

    impl Action for FailingInit {
        fn init(&mut self, _entity: &mut Entity) -> Result<()> {
            Err(anyhow!("no"))
        }

        fn update(&mut self, _entity: &mut Entity) -> Result<ActionStatus> {
            self.log.borrow_mut().push("update:failing".to_string());
            Ok(ActionStatus::Continue)
        }

        fn destroy(&mut self, _entity: &mut Entity) -> Result<()> {
            self.log.borrow_mut().push("destroy:failing".to_string());
            Ok(())
        }
    }

    fn take(log: &CallLog) -> Vec<String> {
        std::mem::take(&mut *log.borrow_mut())
    }

    fn count(log: &CallLog, entry: &str) -> usize {
        log.borrow().iter().filter(|e| e.as_str() == entry).count()
    }

    #[test]
    fn test_attach_runs_init_immediately() {
        let log = CallLog::default();
        let mut entity = Entity::new();
        entity.attach_action(Recorder::new("a", &log)).unwrap();
        assert_eq!(take(&log), vec!["init:a"]);
        assert_eq!(entity.action_count(), 1);
    }

    #[test]
    fn test_removed_action_is_detached_and_destroyed_once() {
        let log = CallLog::default();
        let mut entity = Entity::named("E");
        entity
            .attach_action(Recorder::new("A", &log).remove_on(2))
            .unwrap();
        entity.attach_action(Recorder::new("B", &log)).unwrap();
        entity.attach_action(Recorder::new("C", &log)).unwrap();
        take(&log);

        entity.update();
        assert_eq!(entity.action_names(), vec!["A", "B", "C"]);

        entity.update();
        assert_eq!(entity.action_names(), vec!["B", "C"]);
        assert_eq!(count(&log, "destroy:A"), 1);

        entity.update();
        assert_eq!(count(&log, "update:A"), 2);
        assert_eq!(count(&log, "destroy:A"), 1);
    }

    #[test]
    fn test_update_is_preorder() {
        let log = CallLog::default();
        let mut root = Entity::named("root");
        root.attach_action(Recorder::new("root", &log)).unwrap();

        let mut left = Entity::named("left");
        left.attach_action(Recorder::new("left", &log)).unwrap();
        let mut left_leaf = Entity::named("left-leaf");
        left_leaf.attach_action(Recorder::new("left-leaf", &log)).unwrap();
        left.add_child(left_leaf);

        let mut right = Entity::named("right");
        right.attach_action(Recorder::new("right", &log)).unwrap();

        root.add_child(left);
        root.add_child(right);
        take(&log);

        root.update();

        assert_eq!(
            take(&log),
            vec![
                "update:root",
                "update:left",
                "update:left-leaf",
                "update:right"
            ]
        );
    }

    #[test]
    fn test_failing_action_is_contained() {
        let log = CallLog::default();
        let mut root = Entity::new();
        root.attach_action(Recorder::new("bad", &log).fail_update_on(1))
            .unwrap();
        root.attach_action(Recorder::new("good", &log)).unwrap();
        let mut child = Entity::new();
        child.attach_action(Recorder::new("child", &log)).unwrap();
        root.add_child(child);
        take(&log);

        root.update();

        assert_eq!(
            take(&log),
            vec!["update:bad", "destroy:bad", "update:good", "update:child"]
        );
        assert_eq!(root.action_names(), vec!["good"]);
    }

    #[test]
    fn test_failing_destroy_still_removes() {
        let log = CallLog::default();
        let mut entity = Entity::new();
        entity
            .attach_action(Recorder::new("stubborn", &log).remove_on(1).fail_destroy())
            .unwrap();

        entity.update();

        assert_eq!(entity.action_count(), 0);
        assert_eq!(count(&log, "destroy:stubborn"), 1);
    }

    #[test]
    fn test_failed_init_is_not_attached() {
        let log = CallLog::default();
        let mut entity = Entity::new();

        let result = entity.attach_action(FailingInit {
            log: Rc::clone(&log),
        });

        assert!(matches!(result, Err(EntityError::ActionInit { .. })));
        assert_eq!(entity.action_count(), 0);
        assert_eq!(take(&log), vec!["destroy:failing"]);

        entity.update();
        assert!(take(&log).is_empty());
    }

    #[test]
    fn test_destroy_subtree_destroys_every_action_once() {
        let log = CallLog::default();
        let mut root = Entity::named("root");
        let mut branch = Entity::named("branch");
        branch.attach_action(Recorder::new("b1", &log)).unwrap();
        branch.attach_action(Recorder::new("b2", &log)).unwrap();
        for label in ["l1", "l2"] {
            let mut leaf = Entity::named(label);
            leaf.attach_action(Recorder::new(label, &log)).unwrap();
            branch.add_child(leaf);
        }
        root.add_child(branch);
        take(&log);

        root.destroy_child(0).unwrap();

        assert_eq!(
            take(&log),
            vec!["destroy:b1", "destroy:b2", "destroy:l1", "destroy:l2"]
        );
        assert_eq!(root.child_count(), 0);
        assert_eq!(root.descendant_count(), 0);

        // Nothing left to destroy when the root goes away
        drop(root);
        assert!(take(&log).is_empty());
    }

    #[test]
    fn test_destroyed_entity_is_detached_on_next_update() {
        let log = CallLog::default();
        let mut root = Entity::new();
        let mut child = Entity::named("child");
        child.attach_action(Recorder::new("c", &log)).unwrap();
        root.add_child(child);
        take(&log);

        root.child_mut(0).unwrap().destroy();
        assert_eq!(take(&log), vec!["destroy:c"]);

        root.update();
        assert_eq!(root.child_count(), 0);
        assert!(take(&log).is_empty());
    }

    #[test]
    fn test_destroyed_child_of_disabled_parent_is_detached() {
        let log = CallLog::default();
        let mut root = Entity::new();
        let mut child = Entity::named("child");
        child.attach_action(Recorder::new("c", &log)).unwrap();
        root.add_child(child);
        root.set_update_enabled(false);
        take(&log);

        root.child_mut(0).unwrap().destroy();
        root.update();

        assert_eq!(take(&log), vec!["destroy:c"]);
        assert_eq!(root.child_count(), 0);
        assert_eq!(root.descendant_count(), 0);
    }

    #[test]
    fn test_destroy_from_inside_action_update() {
        let log = CallLog::default();
        let mut root = Entity::named("root");
        let self_destruct = Rc::clone(&log);
        root.attach_action(FnAction::new("self-destruct", move |entity: &mut Entity| {
            self_destruct.borrow_mut().push("update:self-destruct".to_string());
            entity.destroy();
            Ok(ActionStatus::Continue)
        }))
        .unwrap();
        root.attach_action(Recorder::new("bystander", &log)).unwrap();
        let mut child = Entity::new();
        child.attach_action(Recorder::new("child", &log)).unwrap();
        root.add_child(child);
        take(&log);

        root.update();

        assert_eq!(
            take(&log),
            vec!["update:self-destruct", "destroy:child", "destroy:bystander"]
        );
        assert_eq!(root.action_count(), 0);
        assert_eq!(root.child_count(), 0);
        assert!(root.is_dead());

        root.update();
        drop(root);
        assert!(take(&log).is_empty());
    }

    #[test]
    fn test_dead_child_is_not_updated() {
        let log = CallLog::default();
        let mut root = Entity::new();
        let mut child = Entity::named("doomed");
        child.attach_action(Recorder::new("d", &log)).unwrap();
        root.add_child(child);
        take(&log);

        root.update();
        assert_eq!(take(&log), vec!["update:d"]);

        root.child_mut(0).unwrap().kill();
        root.update();

        assert_eq!(take(&log), vec!["destroy:d"]);
        assert!(root.find_child("doomed").is_none());
    }

    #[test]
    fn test_disabled_subtree_is_skipped() {
        let log = CallLog::default();
        let mut root = Entity::new();
        let mut child = Entity::named("sleeper");
        child.attach_action(Recorder::new("s", &log)).unwrap();
        let mut grandchild = Entity::new();
        grandchild.attach_action(Recorder::new("g", &log)).unwrap();
        child.add_child(grandchild);
        root.add_child(child);
        take(&log);

        root.child_mut(0).unwrap().set_update_enabled(false);
        root.update();
        assert!(take(&log).is_empty());

        root.child_mut(0).unwrap().set_update_enabled(true);
        root.update();
        assert_eq!(take(&log), vec!["update:s", "update:g"]);
    }

    #[test]
    fn test_action_attached_during_update_runs_next_tick() {
        let log = CallLog::default();
        let mut entity = Entity::new();
        let spawn_log = Rc::clone(&log);
        entity
            .attach_action(FnAction::new("spawner", move |entity: &mut Entity| {
                entity.attach_action(Recorder::new("spawned", &spawn_log))?;
                Ok(ActionStatus::Remove)
            }))
            .unwrap();

        entity.update();
        assert_eq!(take(&log), vec!["init:spawned"]);
        assert_eq!(entity.action_names(), vec!["spawned"]);

        entity.update();
        assert_eq!(take(&log), vec!["update:spawned"]);
    }

    #[test]
    fn test_remove_child_detaches_without_destroying() {
        let log = CallLog::default();
        let mut root = Entity::new();
        let mut child = Entity::named("moved");
        child.attach_action(Recorder::new("m", &log)).unwrap();
        root.add_child(child);
        take(&log);

        let mut detached = root.remove_child(0).unwrap();
        assert!(take(&log).is_empty());
        assert_eq!(root.child_count(), 0);

        let mut other = Entity::new();
        detached.update();
        other.add_child(detached);
        assert_eq!(take(&log), vec!["update:m"]);

        assert!(matches!(
            root.remove_child(3),
            Err(EntityError::ChildIndexOutOfBounds { index: 3, len: 0 })
        ));
    }

    #[test]
    fn test_drop_destroys_remaining_actions() {
        let log = CallLog::default();
        {
            let mut entity = Entity::new();
            entity.attach_action(Recorder::new("x", &log)).unwrap();
            let mut child = Entity::new();
            child.attach_action(Recorder::new("y", &log)).unwrap();
            entity.add_child(child);
        }
        assert_eq!(take(&log), vec!["init:x", "init:y", "destroy:x", "destroy:y"]);
    }
}
