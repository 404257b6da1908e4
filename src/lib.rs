//! Module lifecycle and entity/action engine core with swappable render backends
//!
//! An [`Engine`](engine::Engine) owns a registry of [`Module`](engine::Module)s,
//! initializes them in registration order, ticks them once per frame and
//! destroys them in reverse order. The graphics module walks an
//! [`Entity`](engine::entity::Entity) tree each tick and drives the window's
//! [`Renderer`](engine::renderer::Renderer).

pub mod config;
pub mod core;
pub mod engine;

pub use config::{EngineConfig, RendererConfig, WindowConfig};
pub use engine::{Engine, EngineError, Module};
