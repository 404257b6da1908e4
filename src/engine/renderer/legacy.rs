// Fixed-function backend: clears the frame to a configured color

use super::{BackendContext, Renderer, RendererBackend, RendererError};
use crate::config::RendererConfig;
use crate::core::Color;
use crate::engine::platform::{ContextApi, ContextRequest, WindowFlags};
use crate::engine::window::Window;

/// Renderer on a compatibility-profile context
///
/// `render` only clears to the configured color. Anything else drawn on top
/// comes from entity actions.
pub struct LegacyRenderer {
    target: BackendContext,
    clear_color: Color,
    vsync: bool,
}

impl LegacyRenderer {
    pub fn new(config: &RendererConfig) -> Self {
        Self {
            target: BackendContext::new(RendererBackend::LegacyFixedFunction),
            clear_color: config.clear_color,
            vsync: config.vsync,
        }
    }

    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    pub fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }
}

impl Renderer for LegacyRenderer {
    fn backend(&self) -> RendererBackend {
        RendererBackend::LegacyFixedFunction
    }

    fn window_flags(&self) -> WindowFlags {
        WindowFlags::OPENGL
    }

    fn init(&mut self, window: &mut Window) -> Result<(), RendererError> {
        let request = ContextRequest {
            api: ContextApi::FixedFunction,
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
        self.target.sync_viewport(window.size());
        self.target.context_mut()?.present()?;
        Ok(())
    }

    fn destroy(&mut self) {
        self.target.release();
    }

    fn is_initialized(&self) -> bool {
        self.target.is_ready()
    }
}
