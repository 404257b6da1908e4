// Core-profile backend

use super::{BackendContext, Renderer, RendererBackend, RendererError};
use crate::config::RendererConfig;
use crate::core::Color;
use crate::engine::platform::{ContextApi, ContextRequest, WindowFlags};
use crate::engine::window::Window;
use log::trace;

/// Renderer on a versioned core-profile context
///
/// Keeps the viewport in step with the window size and counts presented frames.
pub struct ModernRenderer {
    target: BackendContext,
    clear_color: Color,
    vsync: bool,
    version: (u8, u8),
    frames: u64,
}

impl ModernRenderer {
    pub fn new(config: &RendererConfig) -> Self {
        Self {
            target: BackendContext::new(RendererBackend::ModernContext),
            clear_color: config.clear_color,
            vsync: config.vsync,
            version: config.core_version,
            frames: 0,
        }
    }

    /// Requested core profile version as (major, minor)
    pub fn version(&self) -> (u8, u8) {
        self.version
    }

    /// Number of frames presented so far
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Renderer for ModernRenderer {
    fn backend(&self) -> RendererBackend {
        RendererBackend::ModernContext
    }

    fn window_flags(&self) -> WindowFlags {
        WindowFlags::OPENGL | WindowFlags::CORE_PROFILE
    }

    fn init(&mut self, window: &mut Window) -> Result<(), RendererError> {
        let (major, minor) = self.version;
        let request = ContextRequest {
            api: ContextApi::Core { major, minor },
            vsync: self.vsync,
        };
        self.target.acquire(window, request, true)
    }

    fn render(&mut self) -> Result<(), RendererError> {
        let color = self.clear_color;
        self.target.context_mut()?.clear(color)?;
        Ok(())
    }

    fn swap_buffers(&mut self, window: &Window) -> Result<(), RendererError> {
        self.target.check_window(window)?;
        self.target.context_mut()?.present()?;
        self.frames += 1;
        self.target.sync_viewport(window.size());
        trace!("Presented frame {}", self.frames);
        Ok(())
    }

    fn destroy(&mut self) {
        self.target.release();
    }

    fn is_initialized(&self) -> bool {
        self.target.is_ready()
    }
}
