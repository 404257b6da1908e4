// Rendering backends
//
// A `Renderer` is bound to exactly one `Window` for its lifetime. The backend is
// picked once, when the window is constructed, and never swapped afterwards.

mod legacy;
mod modern;
mod toolkit;

pub use legacy::LegacyRenderer;
pub use modern::ModernRenderer;
pub use toolkit::ToolkitRenderer;

use crate::config::RendererConfig;
use crate::engine::platform::{ContextRequest, GraphicsContext, PlatformError, WindowFlags};
use crate::engine::window::Window;
use glam::UVec2;
use log::{debug, info};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

/// Available rendering backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RendererBackend {
    /// Fixed-function pipeline on a compatibility context
    #[default]
    LegacyFixedFunction,
    /// Versioned core-profile context
    ModernContext,
    /// Context owned by the windowing toolkit
    ToolkitIntegrated,
}

impl RendererBackend {
    pub const ALL: [RendererBackend; 3] = [
        RendererBackend::LegacyFixedFunction,
        RendererBackend::ModernContext,
        RendererBackend::ToolkitIntegrated,
    ];

    /// Build a renderer of this backend
    pub fn create(self, config: &RendererConfig) -> SharedRenderer {
        match self {
            RendererBackend::LegacyFixedFunction => {
                Rc::new(RefCell::new(LegacyRenderer::new(config)))
            }
            RendererBackend::ModernContext => Rc::new(RefCell::new(ModernRenderer::new(config))),
            RendererBackend::ToolkitIntegrated => {
                Rc::new(RefCell::new(ToolkitRenderer::new(config)))
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RendererBackend::LegacyFixedFunction => "legacy",
            RendererBackend::ModernContext => "modern",
            RendererBackend::ToolkitIntegrated => "toolkit",
        }
    }
}

impl fmt::Display for RendererBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RendererBackend {
    type Err = RendererError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" | "fixed" | "fixed-function" => Ok(RendererBackend::LegacyFixedFunction),
            "modern" | "core" => Ok(RendererBackend::ModernContext),
            "toolkit" | "native" => Ok(RendererBackend::ToolkitIntegrated),
            other => Err(RendererError::UnknownBackend(other.to_string())),
        }
    }
}

/// Renderer errors
#[derive(Debug, thiserror::Error)]
pub enum RendererError {
    #[error("Failed to initialize {backend} renderer: {source}")]
    Init {
        backend: RendererBackend,
        #[source]
        source: PlatformError,
    },

    #[error("The {0} renderer has not been initialized")]
    NotInitialized(RendererBackend),

    #[error("The {0} renderer was used after being destroyed")]
    UseAfterDestroy(RendererBackend),

    #[error("The {0} renderer is already initialized")]
    AlreadyInitialized(RendererBackend),

    #[error("Window has no native surface")]
    WindowNotCreated,

    #[error("The {backend} renderer is not bound to window '{window}'")]
    WrongWindow {
        backend: RendererBackend,
        window: String,
    },

    #[error("Unknown renderer backend: {0}")]
    UnknownBackend(String),

    #[error("Context error: {0}")]
    Context(#[from] PlatformError),
}

/// Drawing backend bound to a window
///
/// Call order for one window: `window_flags` (read before the native surface
/// exists), `init`, then `render` + `swap_buffers` once per tick, then `destroy`.
pub trait Renderer {
    fn backend(&self) -> RendererBackend;

    /// Window creation hints this backend needs
    fn window_flags(&self) -> WindowFlags;

    /// Acquire a drawing context from the window's native surface
    fn init(&mut self, window: &mut Window) -> Result<(), RendererError>;

    /// Draw the current frame
    fn render(&mut self) -> Result<(), RendererError>;

    /// Present the finished frame
    fn swap_buffers(&mut self, window: &Window) -> Result<(), RendererError>;

    /// Release the context. Safe to call repeatedly and after a failed `init`.
    fn destroy(&mut self);

    fn is_initialized(&self) -> bool;
}

/// Renderer shared between the window that invokes it and the module that owns it
pub type SharedRenderer = Rc<RefCell<dyn Renderer>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContextState {
    Uninitialized,
    Ready,
    Destroyed,
}

/// Context bookkeeping shared by every built-in backend
struct BackendContext {
    backend: RendererBackend,
    context: Option<Box<dyn GraphicsContext>>,
    state: ContextState,
    viewport: UVec2,
    bound_window: Option<u64>,
}

impl BackendContext {
    fn new(backend: RendererBackend) -> Self {
        Self {
            backend,
            context: None,
            state: ContextState::Uninitialized,
            viewport: UVec2::ZERO,
            bound_window: None,
        }
    }

    /// Acquire a context from the window. On failure anything acquired is released.
    fn acquire(
        &mut self,
        window: &mut Window,
        request: ContextRequest,
        make_current: bool,
    ) -> Result<(), RendererError> {
        match self.state {
            ContextState::Ready => return Err(RendererError::AlreadyInitialized(self.backend)),
            ContextState::Destroyed => return Err(RendererError::UseAfterDestroy(self.backend)),
            ContextState::Uninitialized => {}
        }

        let backend = self.backend;
        let window_id = window.id();
        let surface = window
            .surface_mut()
            .map_err(|_| RendererError::WindowNotCreated)?;
        let size = surface.size();
        let mut context = surface
            .create_context(request)
            .map_err(|source| RendererError::Init { backend, source })?;

        if make_current {
            if let Err(source) = context.make_current() {
                context.release();
                return Err(RendererError::Init { backend, source });
            }
        }
        context.set_viewport(size);

        info!(
            "{} renderer initialized with {}x{} viewport ({:?})",
            backend,
            size.x,
            size.y,
            context.api()
        );
        self.viewport = size;
        self.context = Some(context);
        self.bound_window = Some(window_id);
        self.state = ContextState::Ready;
        Ok(())
    }

    fn context_mut(&mut self) -> Result<&mut dyn GraphicsContext, RendererError> {
        match self.state {
            ContextState::Uninitialized => Err(RendererError::NotInitialized(self.backend)),
            ContextState::Destroyed => Err(RendererError::UseAfterDestroy(self.backend)),
            ContextState::Ready => match self.context.as_deref_mut() {
                Some(context) => Ok(context),
                None => Err(RendererError::NotInitialized(self.backend)),
            },
        }
    }

    /// Check the window before presenting to it
    fn check_window(&self, window: &Window) -> Result<(), RendererError> {
        if !window.is_created() {
            return Err(RendererError::WindowNotCreated);
        }
        match self.bound_window {
            Some(id) if id != window.id() => Err(RendererError::WrongWindow {
                backend: self.backend,
                window: window.title().to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Follow the window's drawable size
    fn sync_viewport(&mut self, size: UVec2) {
        if size != self.viewport && size.x > 0 && size.y > 0 {
            if let Some(context) = self.context.as_deref_mut() {
                context.set_viewport(size);
                debug!("{} viewport resized to {}x{}", self.backend, size.x, size.y);
            }
            self.viewport = size;
        }
    }

    fn release(&mut self) {
        self.bound_window = None;
        if let Some(mut context) = self.context.take() {
            context.release();
            info!("{} renderer destroyed", self.backend);
        }
        // Destroying a never-initialized renderer leaves it reusable
        if self.state == ContextState::Ready {
            self.state = ContextState::Destroyed;
        }
    }

    fn is_ready(&self) -> bool {
        self.state == ContextState::Ready
    }
}
