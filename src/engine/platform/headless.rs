// In-memory platform for tests and headless tooling
//
// Surfaces and contexts record what the engine asks of them so lifecycle
// ordering can be observed without a display or GPU.

use super::{
    ContextApi, ContextRequest, GraphicsContext, NativeSurface, Platform, PlatformError,
    SurfaceRequest, WindowFlags,
};
use crate::core::Color;
use glam::UVec2;
use log::{debug, trace};
use std::cell::RefCell;
use std::rc::Rc;

/// Everything recorded about one headless surface
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessSurfaceStats {
    pub title: String,
    pub size: UVec2,
    pub flags: WindowFlags,
    pub open: bool,
    pub closed: bool,
    pub context_api: Option<ContextApi>,
    pub contexts_created: u32,
    pub context_released: bool,
    pub make_current_calls: u32,
    pub clears: u32,
    pub last_clear: Option<Color>,
    pub presents: u32,
    pub viewport: Option<UVec2>,
}

impl HeadlessSurfaceStats {
    fn new(request: &SurfaceRequest) -> Self {
        Self {
            title: request.title.clone(),
            size: request.size,
            flags: request.flags,
            open: true,
            closed: false,
            context_api: None,
            contexts_created: 0,
            context_released: false,
            make_current_calls: 0,
            clears: 0,
            last_clear: None,
            presents: 0,
            viewport: None,
        }
    }
}

type SurfaceLog = Rc<RefCell<Vec<HeadlessSurfaceStats>>>;

/// Platform that never touches the OS
#[derive(Debug, Default)]
pub struct HeadlessPlatform {
    initialized: bool,
    init_count: u32,
    terminate_count: u32,
    poll_count: u64,
    fail_surface_creation: bool,
    fail_context_creation: bool,
    surfaces: SurfaceLog,
}

impl HeadlessPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next surface creations fail
    pub fn fail_surface_creation(&mut self, fail: bool) {
        self.fail_surface_creation = fail;
    }

    /// Make context creation on surfaces created from now on fail
    pub fn fail_context_creation(&mut self, fail: bool) {
        self.fail_context_creation = fail;
    }

    /// Simulate the user closing a surface. The change is visible immediately.
    pub fn request_close(&mut self, index: usize) {
        if let Some(stats) = self.surfaces.borrow_mut().get_mut(index) {
            stats.open = false;
        }
    }

    /// Simulate the OS resizing a surface
    pub fn resize(&mut self, index: usize, size: UVec2) {
        if let Some(stats) = self.surfaces.borrow_mut().get_mut(index) {
            stats.size = size;
        }
    }

    /// Snapshot of a surface's recorded activity
    pub fn surface(&self, index: usize) -> Option<HeadlessSurfaceStats> {
        self.surfaces.borrow().get(index).cloned()
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.borrow().len()
    }

    pub fn init_count(&self) -> u32 {
        self.init_count
    }

    pub fn terminate_count(&self) -> u32 {
        self.terminate_count
    }

    pub fn poll_count(&self) -> u64 {
        self.poll_count
    }
}

impl Platform for HeadlessPlatform {
    fn name(&self) -> &str {
        "headless"
    }

    fn init(&mut self) -> Result<(), PlatformError> {
        if self.initialized {
            return Err(PlatformError::AlreadyInitialized(self.name().to_string()));
        }
        self.initialized = true;
        self.init_count += 1;
        debug!("Headless platform initialized");
        Ok(())
    }

    fn terminate(&mut self) {
        if self.initialized {
            self.initialized = false;
            self.terminate_count += 1;
            debug!("Headless platform terminated");
        }
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn poll_events(&mut self) {
        self.poll_count += 1;
    }

    fn create_surface(
        &mut self,
        request: &SurfaceRequest,
    ) -> Result<Box<dyn NativeSurface>, PlatformError> {
        if !self.initialized {
            return Err(PlatformError::NotInitialized(self.name().to_string()));
        }
        if self.fail_surface_creation {
            return Err(PlatformError::SurfaceCreation {
                title: request.title.clone(),
                reason: "surface creation disabled".to_string(),
            });
        }

        let mut surfaces = self.surfaces.borrow_mut();
        let index = surfaces.len();
        surfaces.push(HeadlessSurfaceStats::new(request));

        Ok(Box::new(HeadlessSurface {
            index,
            log: Rc::clone(&self.surfaces),
            fail_context_creation: self.fail_context_creation,
        }))
    }
}

struct HeadlessSurface {
    index: usize,
    log: SurfaceLog,
    fail_context_creation: bool,
}

impl HeadlessSurface {
    fn with_stats<R>(&self, f: impl FnOnce(&mut HeadlessSurfaceStats) -> R) -> R {
        f(&mut self.log.borrow_mut()[self.index])
    }
}

impl NativeSurface for HeadlessSurface {
    fn is_open(&self) -> bool {
        self.with_stats(|s| s.open && !s.closed)
    }

    fn size(&self) -> UVec2 {
        self.with_stats(|s| s.size)
    }

    fn flags(&self) -> WindowFlags {
        self.with_stats(|s| s.flags)
    }

    fn create_context(
        &mut self,
        request: ContextRequest,
    ) -> Result<Box<dyn GraphicsContext>, PlatformError> {
        if self.fail_context_creation {
            return Err(PlatformError::ContextCreation {
                api: request.api,
                reason: "context creation disabled".to_string(),
            });
        }
        self.with_stats(|s| {
            s.context_api = Some(request.api);
            s.contexts_created += 1;
            s.context_released = false;
        });
        Ok(Box::new(HeadlessContext {
            index: self.index,
            log: Rc::clone(&self.log),
            api: request.api,
            released: false,
        }))
    }

    fn close(&mut self) {
        self.with_stats(|s| s.closed = true);
    }
}

struct HeadlessContext {
    index: usize,
    log: SurfaceLog,
    api: ContextApi,
    released: bool,
}

impl HeadlessContext {
    fn record(&self, f: impl FnOnce(&mut HeadlessSurfaceStats)) -> Result<(), PlatformError> {
        if self.released {
            return Err(PlatformError::Backend("context already released".to_string()));
        }
        f(&mut self.log.borrow_mut()[self.index]);
        Ok(())
    }
}

impl GraphicsContext for HeadlessContext {
    fn api(&self) -> ContextApi {
        self.api
    }

    fn make_current(&mut self) -> Result<(), PlatformError> {
        self.record(|s| s.make_current_calls += 1)
    }

    fn set_viewport(&mut self, size: UVec2) {
        if let Err(err) = self.record(|s| s.viewport = Some(size)) {
            trace!("Viewport change ignored: {}", err);
        }
    }

    fn clear(&mut self, color: Color) -> Result<(), PlatformError> {
        self.record(|s| {
            s.clears += 1;
            s.last_clear = Some(color);
        })
    }

    fn present(&mut self) -> Result<(), PlatformError> {
        self.record(|s| s.presents += 1)
    }

    fn release(&mut self) {
        if !self.released {
            self.log.borrow_mut()[self.index].context_released = true;
            self.released = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(title: &str) -> SurfaceRequest {
        SurfaceRequest {
            title: title.to_string(),
            size: UVec2::new(320, 240),
            flags: WindowFlags::SHOWN,
        }
    }

    #[test]
    fn test_surface_requires_init() {
        let mut platform = HeadlessPlatform::new();
        assert!(matches!(
            platform.create_surface(&request("a")),
            Err(PlatformError::NotInitialized(_))
        ));
    }

    #[test]
    fn test_double_init_rejected() {
        let mut platform = HeadlessPlatform::new();
        platform.init().unwrap();
        assert!(platform.init().is_err());
        platform.terminate();
        platform.terminate();
        assert_eq!(platform.terminate_count(), 1);
    }

    #[test]
    fn test_context_activity_is_recorded() {
        let mut platform = HeadlessPlatform::new();
        platform.init().unwrap();
        let mut surface = platform.create_surface(&request("main")).unwrap();
        let mut context = surface
            .create_context(ContextRequest {
                api: ContextApi::FixedFunction,
                vsync: true,
            })
            .unwrap();

        context.clear(Color::MAGENTA).unwrap();
        context.present().unwrap();
        context.release();
        context.release();

        let stats = platform.surface(0).unwrap();
        assert_eq!(stats.clears, 1);
        assert_eq!(stats.presents, 1);
        assert_eq!(stats.last_clear, Some(Color::MAGENTA));
        assert!(stats.context_released);
        assert!(context.present().is_err());

        context.set_viewport(UVec2::new(64, 64));
        assert_eq!(platform.surface(0).unwrap().viewport, None);
    }

    #[test]
    fn test_request_close() {
        let mut platform = HeadlessPlatform::new();
        platform.init().unwrap();
        let surface = platform.create_surface(&request("main")).unwrap();
        assert!(surface.is_open());

        platform.request_close(0);
        assert!(!surface.is_open());
    }

    #[test]
    fn test_context_failure_injection() {
        let mut platform = HeadlessPlatform::new();
        platform.init().unwrap();
        platform.fail_context_creation(true);
        let mut surface = platform.create_surface(&request("main")).unwrap();
        let result = surface.create_context(ContextRequest {
            api: ContextApi::Toolkit,
            vsync: false,
        });
        assert!(matches!(result, Err(PlatformError::ContextCreation { .. })));
    }
}
