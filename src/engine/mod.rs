// Engine core: module lifecycle, entity tree, windows and render backends

pub mod entity;
pub mod frame_clock;
pub mod graphics;
pub mod module;
pub mod platform;
pub mod renderer;
pub mod signal;
pub mod system;
pub mod window;

pub use graphics::{GraphicsModule, GRAPHICS_MODULE};
pub use module::{Module, ModuleState};
pub use signal::StopSignal;
pub use system::{Engine, EngineError, EngineState};
