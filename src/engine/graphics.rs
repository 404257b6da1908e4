// Graphics module: drives the entity tree and draws one frame per tick

use crate::engine::entity::Entity;
use crate::engine::module::Module;
use crate::engine::renderer::SharedRenderer;
use crate::engine::window::{SharedWindow, WINDOW_MODULE};
use anyhow::{bail, Result};
use log::{info, trace};

/// Registered name of the graphics module
pub const GRAPHICS_MODULE: &str = "graphics";

/// Owns the root entity and the renderer of a window
///
/// Each tick updates the entity tree, then renders and presents a frame. The
/// window module must be registered first so the window exists at `init` and
/// outlives the renderer at `destroy`.
pub struct GraphicsModule {
    window: SharedWindow,
    renderer: SharedRenderer,
    root: Entity,
    frames: u64,
}

impl GraphicsModule {
    pub fn new(window: SharedWindow) -> Self {
        Self::with_root(window, Entity::named("root"))
    }

    /// Start from an existing entity tree
    pub fn with_root(window: SharedWindow, root: Entity) -> Self {
        let renderer = window.borrow().renderer();
        Self {
            window,
            renderer,
            root,
            frames: 0,
        }
    }

    pub fn root(&self) -> &Entity {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Entity {
        &mut self.root
    }

    pub fn renderer(&self) -> SharedRenderer {
        SharedRenderer::clone(&self.renderer)
    }

    /// Frames presented so far
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Module for GraphicsModule {
    fn name(&self) -> &str {
        GRAPHICS_MODULE
    }

    fn dependencies(&self) -> &[&str] {
        &[WINDOW_MODULE]
    }

    fn init(&mut self) -> Result<()> {
        let window = self.window.borrow();
        if !window.is_created() {
            bail!("window '{}' has not been created", window.title());
        }
        if !self.renderer.borrow().is_initialized() {
            bail!("{} renderer is not initialized", window.backend());
        }
        info!(
            "Graphics ready on '{}' ({} backend, {} entities)",
            window.title(),
            window.backend(),
            self.root.descendant_count() + 1
        );
        Ok(())
    }

    fn update(&mut self) -> Result<()> {
        self.root.update();

        let window = self.window.borrow();
        if !window.is_open() {
            trace!("Window '{}' closed, skipping frame", window.title());
            return Ok(());
        }

        let mut renderer = self.renderer.borrow_mut();
        renderer.render()?;
        renderer.swap_buffers(&window)?;
        self.frames += 1;
        Ok(())
    }

    fn destroy(&mut self) -> Result<()> {
        self.root.destroy();
        self.renderer.borrow_mut().destroy();
        info!("Graphics destroyed after {} frames", self.frames);
        Ok(())
    }
}
