// Module that owns the window's lifecycle and pumps platform events

use super::SharedWindow;
use crate::engine::module::Module;
use crate::engine::platform::SharedPlatform;
use crate::engine::signal::StopSignal;
use anyhow::Result;
use log::info;

/// Registered name of the window module
pub const WINDOW_MODULE: &str = "window";

/// Creates the window on init, polls events every tick and requests a stop
/// once the window has been closed
pub struct WindowModule {
    window: SharedWindow,
    platform: SharedPlatform,
    stop: StopSignal,
}

impl WindowModule {
    pub fn new(window: SharedWindow, platform: SharedPlatform, stop: StopSignal) -> Self {
        Self {
            window,
            platform,
            stop,
        }
    }

    pub fn window(&self) -> SharedWindow {
        SharedWindow::clone(&self.window)
    }
}

impl Module for WindowModule {
    fn name(&self) -> &str {
        WINDOW_MODULE
    }

    fn init(&mut self) -> Result<()> {
        let mut platform = self.platform.borrow_mut();
        self.window.borrow_mut().create(&mut *platform)?;
        Ok(())
    }

    fn update(&mut self) -> Result<()> {
        self.platform.borrow_mut().poll_events();

        if !self.window.borrow().is_open() && !self.stop.is_requested() {
            info!("Window '{}' closed, requesting stop", self.window.borrow().title());
            self.stop.request();
        }
        Ok(())
    }

    fn destroy(&mut self) -> Result<()> {
        self.window.borrow_mut().destroy();
        Ok(())
    }
}
