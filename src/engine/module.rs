// Module lifecycle contract

use anyhow::Result;

/// A named subsystem driven by the engine
///
/// The engine calls `init` once in registration order, `update` once per tick
/// while running, and `destroy` once in reverse registration order. `update`
/// is never called before `init` succeeds or after `destroy`.
pub trait Module {
    /// Unique name within the engine's registry
    fn name(&self) -> &str;

    /// Names of modules that must be registered before this one
    fn dependencies(&self) -> &[&str] {
        &[]
    }

    fn init(&mut self) -> Result<()>;

    fn update(&mut self) -> Result<()>;

    fn destroy(&mut self) -> Result<()>;
}

/// Where a registered module is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    Uninitialized,
    Running,
    Destroyed,
}
