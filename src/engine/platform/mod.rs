// Platform layer: process-wide windowing runtime, native surfaces and drawing contexts
//
// The engine core never talks to a windowing toolkit or GPU API directly. Everything
// it needs goes through three narrow traits:
//
// - `Platform`: process-wide runtime with an explicit init/terminate lifecycle
// - `NativeSurface`: one on-screen surface created by the platform
// - `GraphicsContext`: a drawing context acquired from a surface
//
// `HeadlessPlatform` keeps everything in memory for tests and tooling,
// `DesktopPlatform` drives winit and wgpu.

mod desktop;
mod headless;

pub use desktop::DesktopPlatform;
pub use headless::{HeadlessPlatform, HeadlessSurfaceStats};

use crate::core::Color;
use bitflags::bitflags;
use glam::UVec2;
use std::cell::RefCell;
use std::rc::Rc;

bitflags! {
    /// Hints consulted when a native surface is created
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WindowFlags: u32 {
        const SHOWN = 1 << 0;
        const HIDDEN = 1 << 1;
        const RESIZABLE = 1 << 2;
        /// Surface must be able to host an OpenGL-style context
        const OPENGL = 1 << 3;
        /// Request a core profile rather than the compatibility profile
        const CORE_PROFILE = 1 << 4;
        /// The windowing toolkit owns the drawing context
        const TOOLKIT_CONTEXT = 1 << 5;
    }
}

/// Parameters for creating a native surface
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceRequest {
    pub title: String,
    pub size: UVec2,
    pub flags: WindowFlags,
}

/// Which family of drawing context a renderer wants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextApi {
    /// Immediate-mode, compatibility profile context
    FixedFunction,
    /// Versioned core profile context
    Core { major: u8, minor: u8 },
    /// Context created and managed by the windowing toolkit itself
    Toolkit,
}

/// Parameters for acquiring a drawing context from a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextRequest {
    pub api: ContextApi,
    pub vsync: bool,
}

/// Platform layer errors
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("Platform {0} is not initialized")]
    NotInitialized(String),

    #[error("Platform {0} is already initialized")]
    AlreadyInitialized(String),

    #[error("Failed to create surface '{title}': {reason}")]
    SurfaceCreation { title: String, reason: String },

    #[error("Failed to create {api:?} context: {reason}")]
    ContextCreation { api: ContextApi, reason: String },

    #[error("Platform backend error: {0}")]
    Backend(String),
}

/// Process-wide windowing runtime
///
/// Owned by the engine root, which calls `init` before any module starts and
/// `terminate` after every module has been destroyed.
pub trait Platform {
    /// Human-readable backend name for logging
    fn name(&self) -> &str;

    /// Start the underlying runtime. Fails if it is already running.
    fn init(&mut self) -> Result<(), PlatformError>;

    /// Stop the underlying runtime. Calling this while stopped is a no-op.
    fn terminate(&mut self);

    fn is_initialized(&self) -> bool;

    /// Drain pending OS events, updating surface open/size state
    fn poll_events(&mut self);

    /// Create a native surface
    fn create_surface(
        &mut self,
        request: &SurfaceRequest,
    ) -> Result<Box<dyn NativeSurface>, PlatformError>;
}

/// Shared handle to the process-wide platform
pub type SharedPlatform = Rc<RefCell<dyn Platform>>;

/// A live on-screen surface
pub trait NativeSurface {
    /// Whether the surface is still open (no close requested)
    fn is_open(&self) -> bool;

    /// Current drawable size in pixels
    fn size(&self) -> UVec2;

    /// Flags the surface was created with
    fn flags(&self) -> WindowFlags;

    /// Acquire a drawing context bound to this surface
    fn create_context(
        &mut self,
        request: ContextRequest,
    ) -> Result<Box<dyn GraphicsContext>, PlatformError>;

    /// Release the native surface. Further calls are no-ops.
    fn close(&mut self);
}

/// A drawing context acquired from a native surface
pub trait GraphicsContext {
    fn api(&self) -> ContextApi;

    /// Bind the context to the calling thread
    fn make_current(&mut self) -> Result<(), PlatformError>;

    /// Resize the drawable area
    fn set_viewport(&mut self, size: UVec2);

    /// Clear the back buffer
    fn clear(&mut self, color: Color) -> Result<(), PlatformError>;

    /// Present the back buffer
    fn present(&mut self) -> Result<(), PlatformError>;

    /// Release the context. Must be safe to call more than once.
    fn release(&mut self);
}

/// Wrap a platform in the shared handle the engine and modules use
pub fn shared<P: Platform + 'static>(platform: P) -> SharedPlatform {
    Rc::new(RefCell::new(platform))
}
