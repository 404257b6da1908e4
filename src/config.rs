// Engine, window and renderer configuration

use crate::core::Color;
use crate::engine::renderer::RendererBackend;
use log::warn;

/// Environment variable selecting the renderer backend
pub const RENDERER_ENV: &str = "TICKWORK_RENDERER";

/// Environment variable capping the frame rate (0 disables the cap)
pub const FPS_ENV: &str = "TICKWORK_FPS";

/// Window creation settings
#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub resizable: bool,
    pub visible: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "tickwork".to_string(),
            resizable: true,
            visible: true,
        }
    }
}

/// Renderer settings shared by every backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererConfig {
    pub backend: RendererBackend,
    pub clear_color: Color,
    pub vsync: bool,
    /// Context version requested by the modern backend
    pub core_version: (u8, u8),
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            backend: RendererBackend::default(),
            clear_color: Color::default(),
            vsync: true,
            core_version: (3, 3),
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub window: WindowConfig,
    pub renderer: RendererConfig,
    /// Frame rate cap for `Engine::run`, uncapped when `None`
    pub target_fps: Option<u32>,
    /// Stop `Engine::run` after this many ticks
    pub max_ticks: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            renderer: RendererConfig::default(),
            target_fps: Some(60),
            max_ticks: None,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `TICKWORK_RENDERER` and `TICKWORK_FPS`
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(
            std::env::var(RENDERER_ENV).ok().as_deref(),
            std::env::var(FPS_ENV).ok().as_deref(),
        );
        config
    }

    pub fn with_window(mut self, width: u32, height: u32, title: impl Into<String>) -> Self {
        self.window.width = width;
        self.window.height = height;
        self.window.title = title.into();
        self
    }

    pub fn with_backend(mut self, backend: RendererBackend) -> Self {
        self.renderer.backend = backend;
        self
    }

    pub fn with_clear_color(mut self, color: Color) -> Self {
        self.renderer.clear_color = color;
        self
    }

    pub fn with_target_fps(mut self, fps: Option<u32>) -> Self {
        self.target_fps = fps;
        self
    }

    pub fn with_max_ticks(mut self, ticks: Option<u64>) -> Self {
        self.max_ticks = ticks;
        self
    }

    fn apply_overrides(&mut self, backend: Option<&str>, fps: Option<&str>) {
        if let Some(value) = backend {
            match value.parse::<RendererBackend>() {
                Ok(backend) => self.renderer.backend = backend,
                Err(err) => warn!("Ignoring {}: {}", RENDERER_ENV, err),
            }
        }

        if let Some(value) = fps {
            match value.trim().parse::<u32>() {
                Ok(0) => self.target_fps = None,
                Ok(fps) => self.target_fps = Some(fps),
                Err(err) => warn!("Ignoring {}='{}': {}", FPS_ENV, value, err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.renderer.backend, RendererBackend::LegacyFixedFunction);
        assert_eq!(config.renderer.core_version, (3, 3));
        assert_eq!(config.target_fps, Some(60));
        assert_eq!(config.max_ticks, None);
    }

    #[test]
    fn test_builders() {
        let config = EngineConfig::new()
            .with_window(1280, 720, "Demo")
            .with_backend(RendererBackend::ModernContext)
            .with_clear_color(Color::BLACK)
            .with_target_fps(None)
            .with_max_ticks(Some(10));

        assert_eq!(config.window.title, "Demo");
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.renderer.backend, RendererBackend::ModernContext);
        assert_eq!(config.renderer.clear_color, Color::BLACK);
        assert_eq!(config.target_fps, None);
        assert_eq!(config.max_ticks, Some(10));
    }

    #[test]
    fn test_overrides() {
        let mut config = EngineConfig::default();
        config.apply_overrides(Some("toolkit"), Some("144"));
        assert_eq!(config.renderer.backend, RendererBackend::ToolkitIntegrated);
        assert_eq!(config.target_fps, Some(144));

        config.apply_overrides(None, Some("0"));
        assert_eq!(config.target_fps, None);
    }

    #[test]
    fn test_bad_overrides_are_ignored() {
        let mut config = EngineConfig::default();
        config.apply_overrides(Some("vulkan"), Some("fast"));
        assert_eq!(config.renderer.backend, RendererBackend::LegacyFixedFunction);
        assert_eq!(config.target_fps, Some(60));
    }
}
