// Window: owner of a native surface, drawing delegated to its renderer

mod module;

pub use module::{WindowModule, WINDOW_MODULE};

use crate::config::WindowConfig;
use crate::engine::platform::{NativeSurface, Platform, PlatformError, SurfaceRequest, WindowFlags};
use crate::engine::renderer::{RendererBackend, RendererError, SharedRenderer};
use glam::UVec2;
use log::{info, warn};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_WINDOW_ID: AtomicU64 = AtomicU64::new(1);

/// Window errors
#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    #[error("Window '{0}' has already been created")]
    AlreadyCreated(String),

    #[error("Window '{0}' has not been created")]
    NotCreated(String),

    #[error("Window '{0}' was used after being destroyed")]
    UseAfterDestroy(String),

    #[error("Failed to create native surface: {0}")]
    Surface(#[from] PlatformError),

    #[error("Renderer failed to initialize: {0}")]
    RendererInit(#[source] RendererError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SurfaceState {
    Pending,
    Created,
    Destroyed,
}

/// On-screen window
///
/// Construction only records the requested size and title. The native surface
/// exists between `create` and `destroy`.
pub struct Window {
    id: u64,
    title: String,
    size: UVec2,
    flags: WindowFlags,
    renderer: SharedRenderer,
    surface: Option<Box<dyn NativeSurface>>,
    state: SurfaceState,
}

/// Window shared between the window module and the modules that draw into it
pub type SharedWindow = Rc<RefCell<Window>>;

impl Window {
    /// Create a window description bound to `renderer`
    pub fn new(width: u32, height: u32, title: impl Into<String>, renderer: SharedRenderer) -> Self {
        Self {
            id: NEXT_WINDOW_ID.fetch_add(1, Ordering::Relaxed),
            title: title.into(),
            size: UVec2::new(width, height),
            flags: WindowFlags::SHOWN,
            renderer,
            surface: None,
            state: SurfaceState::Pending,
        }
    }

    /// Create a window from configuration
    pub fn from_config(config: &WindowConfig, renderer: SharedRenderer) -> Self {
        let mut window = Self::new(config.width, config.height, config.title.clone(), renderer);
        if config.resizable {
            window.flags |= WindowFlags::RESIZABLE;
        }
        if !config.visible {
            window.flags.remove(WindowFlags::SHOWN);
            window.flags |= WindowFlags::HIDDEN;
        }
        window
    }

    /// Wrap into the shared handle used by modules
    pub fn into_shared(self) -> SharedWindow {
        Rc::new(RefCell::new(self))
    }

    /// Process-unique identity, used by renderers to check their binding
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Size requested at construction
    pub fn original_size(&self) -> UVec2 {
        self.size
    }

    /// Live drawable size, or the requested size while no surface exists
    pub fn size(&self) -> UVec2 {
        self.surface
            .as_ref()
            .map_or(self.size, |surface| surface.size())
    }

    pub fn renderer(&self) -> SharedRenderer {
        Rc::clone(&self.renderer)
    }

    pub fn backend(&self) -> RendererBackend {
        self.renderer.borrow().backend()
    }

    /// Flags the native surface was (or will be) created with
    pub fn flags(&self) -> WindowFlags {
        match &self.surface {
            Some(surface) => surface.flags(),
            None => self.flags | self.renderer.borrow().window_flags(),
        }
    }

    /// Create the native surface and initialize the renderer on it
    ///
    /// The renderer's window flags are read before the surface exists. If the
    /// renderer fails to initialize the surface is released again, along with
    /// any context the renderer acquired from it.
    pub fn create(&mut self, platform: &mut dyn Platform) -> Result<(), WindowError> {
        match self.state {
            SurfaceState::Created => return Err(WindowError::AlreadyCreated(self.title.clone())),
            SurfaceState::Destroyed => {
                return Err(WindowError::UseAfterDestroy(self.title.clone()))
            }
            SurfaceState::Pending => {}
        }

        let renderer = Rc::clone(&self.renderer);
        let flags = self.flags | renderer.borrow().window_flags();
        let request = SurfaceRequest {
            title: self.title.clone(),
            size: self.size,
            flags,
        };
        self.surface = Some(platform.create_surface(&request)?);
        self.state = SurfaceState::Created;

        let result = renderer.borrow_mut().init(self);
        if let Err(err) = result {
            warn!("Renderer init failed for window '{}': {}", self.title, err);
            // A renderer already bound elsewhere acquired nothing from this window
            if matches!(err, RendererError::Init { .. }) {
                renderer.borrow_mut().destroy();
            }
            if let Some(mut surface) = self.surface.take() {
                surface.close();
            }
            self.state = SurfaceState::Pending;
            return Err(WindowError::RendererInit(err));
        }

        info!(
            "Window '{}' created at {}x{} with {} renderer",
            self.title,
            self.size.x,
            self.size.y,
            self.backend()
        );
        Ok(())
    }

    /// Whether the native surface is live and has not been closed
    pub fn is_open(&self) -> bool {
        self.state == SurfaceState::Created
            && self.surface.as_ref().map_or(false, |surface| surface.is_open())
    }

    /// Whether `create` succeeded and `destroy` has not run yet
    pub fn is_created(&self) -> bool {
        self.state == SurfaceState::Created
    }

    pub fn is_destroyed(&self) -> bool {
        self.state == SurfaceState::Destroyed
    }

    /// Native surface access for renderers
    pub fn surface_mut(&mut self) -> Result<&mut dyn NativeSurface, WindowError> {
        match self.state {
            SurfaceState::Destroyed => Err(WindowError::UseAfterDestroy(self.title.clone())),
            _ => match self.surface.as_deref_mut() {
                Some(surface) => Ok(surface),
                None => Err(WindowError::NotCreated(self.title.clone())),
            },
        }
    }

    /// Destroy the renderer's context, then the native surface
    ///
    /// The renderer is only destroyed if it was initialized on this window.
    /// Calling this again is a no-op.
    pub fn destroy(&mut self) {
        if self.state == SurfaceState::Destroyed {
            return;
        }
        if self.state == SurfaceState::Created {
            self.renderer.borrow_mut().destroy();
        }
        if let Some(mut surface) = self.surface.take() {
            surface.close();
            info!("Window '{}' destroyed", self.title);
        }
        self.state = SurfaceState::Destroyed;
    }
}
