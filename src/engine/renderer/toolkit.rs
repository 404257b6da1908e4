// Backend whose context is created and owned by the windowing toolkit

use super::{BackendContext, Renderer, RendererBackend, RendererError};
use crate::config::RendererConfig;
use crate::core::Color;
use crate::engine::platform::{ContextApi, ContextRequest, WindowFlags};
use crate::engine::window::Window;

/// Renderer that draws through the toolkit's own context
///
/// The toolkit decides which thread the context lives on, so this backend never
/// makes it current itself.
pub struct ToolkitRenderer {
    target: BackendContext,
    clear_color: Color,
    vsync: bool,
}

impl ToolkitRenderer {
    pub fn new(config: &RendererConfig) -> Self {
        Self {
            target: BackendContext::new(RendererBackend::ToolkitIntegrated),
            clear_color: config.clear_color,
            vsync: config.vsync,
        }
    }
}

impl Renderer for ToolkitRenderer {
    fn backend(&self) -> RendererBackend {
        RendererBackend::ToolkitIntegrated
    }

    fn window_flags(&self) -> WindowFlags {
        WindowFlags::TOOLKIT_CONTEXT
    }

    fn init(&mut self, window: &mut Window) -> Result<(), RendererError> {
        let request = ContextRequest {
            api: ContextApi::Toolkit,
            vsync: self.vsync,
        };
        self.target.acquire(window, request, false)
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
