// Desktop platform backed by winit windows and wgpu surfaces

use super::{
    ContextApi, ContextRequest, GraphicsContext, NativeSurface, Platform, PlatformError,
    SurfaceRequest, WindowFlags,
};
use crate::core::Color;
use glam::UVec2;
use log::{debug, info, trace, warn};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;
use winit::event::{Event, WindowEvent};
use winit::event_loop::EventLoop;
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{WindowBuilder, WindowId};

/// Per-window state updated by the event pump
#[derive(Debug, Clone, Copy)]
struct WindowState {
    open: bool,
    size: UVec2,
}

type WindowStates = Rc<RefCell<HashMap<WindowId, WindowState>>>;

/// Platform driving a winit event loop
///
/// The loop is pumped once per `poll_events` call instead of taking over the
/// thread, so the engine keeps control of its own frame loop.
pub struct DesktopPlatform {
    event_loop: Option<EventLoop<()>>,
    windows: WindowStates,
}

impl DesktopPlatform {
    pub fn new() -> Self {
        Self {
            event_loop: None,
            windows: Rc::new(RefCell::new(HashMap::new())),
        }
    }
}

impl Default for DesktopPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for DesktopPlatform {
    fn name(&self) -> &str {
        "winit"
    }

    fn init(&mut self) -> Result<(), PlatformError> {
        if self.event_loop.is_some() {
            return Err(PlatformError::AlreadyInitialized(self.name().to_string()));
        }
        let event_loop =
            EventLoop::new().map_err(|e| PlatformError::Backend(format!("Event loop error: {}", e)))?;
        self.event_loop = Some(event_loop);
        info!("winit event loop created");
        Ok(())
    }

    fn terminate(&mut self) {
        if self.event_loop.take().is_some() {
            self.windows.borrow_mut().clear();
            info!("winit event loop dropped");
        }
    }

    fn is_initialized(&self) -> bool {
        self.event_loop.is_some()
    }

    fn poll_events(&mut self) {
        let Some(event_loop) = self.event_loop.as_mut() else {
            return;
        };
        let windows = Rc::clone(&self.windows);

        let status = event_loop.pump_events(Some(Duration::ZERO), move |event, _| {
            if let Event::WindowEvent { window_id, event } = event {
                let mut windows = windows.borrow_mut();
                let Some(state) = windows.get_mut(&window_id) else {
                    return;
                };
                match event {
                    WindowEvent::CloseRequested => {
                        info!("Close requested for window {:?}", window_id);
                        state.open = false;
                    }
                    WindowEvent::Resized(size) => {
                        debug!("Window {:?} resized to {:?}", window_id, size);
                        state.size = UVec2::new(size.width, size.height);
                    }
                    _ => {}
                }
            }
        });

        if let PumpStatus::Exit(code) = status {
            warn!("winit event loop exited with code {}", code);
            for state in self.windows.borrow_mut().values_mut() {
                state.open = false;
            }
        }
    }

    fn create_surface(
        &mut self,
        request: &SurfaceRequest,
    ) -> Result<Box<dyn NativeSurface>, PlatformError> {
        let event_loop = self
            .event_loop
            .as_ref()
            .ok_or_else(|| PlatformError::NotInitialized(self.name().to_string()))?;

        let window = WindowBuilder::new()
            .with_title(request.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(request.size.x, request.size.y))
            .with_resizable(request.flags.contains(WindowFlags::RESIZABLE))
            .with_visible(!request.flags.contains(WindowFlags::HIDDEN))
            .build(event_loop)
            .map_err(|e| PlatformError::SurfaceCreation {
                title: request.title.clone(),
                reason: e.to_string(),
            })?;

        let size = window.inner_size();
        let id = window.id();
        self.windows.borrow_mut().insert(
            id,
            WindowState {
                open: true,
                size: UVec2::new(size.width, size.height),
            },
        );

        Ok(Box::new(DesktopSurface {
            window: Some(Arc::new(window)),
            id,
            flags: request.flags,
            windows: Rc::clone(&self.windows),
        }))
    }
}

struct DesktopSurface {
    window: Option<Arc<winit::window::Window>>,
    id: WindowId,
    flags: WindowFlags,
    windows: WindowStates,
}

impl NativeSurface for DesktopSurface {
    fn is_open(&self) -> bool {
        self.window.is_some()
            && self
                .windows
                .borrow()
                .get(&self.id)
                .map_or(false, |state| state.open)
    }

    fn size(&self) -> UVec2 {
        self.windows
            .borrow()
            .get(&self.id)
            .map_or(UVec2::ZERO, |state| state.size)
    }

    fn flags(&self) -> WindowFlags {
        self.flags
    }

    fn create_context(
        &mut self,
        request: ContextRequest,
    ) -> Result<Box<dyn GraphicsContext>, PlatformError> {
        let window = self.window.clone().ok_or_else(|| PlatformError::ContextCreation {
            api: request.api,
            reason: "surface already closed".to_string(),
        })?;
        let context = pollster::block_on(WgpuContext::new(window, request))?;
        Ok(Box::new(context))
    }

    fn close(&mut self) {
        if self.window.take().is_some() {
            self.windows.borrow_mut().remove(&self.id);
        }
    }
}

/// GPU objects held while a context is alive
struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    frame: Option<wgpu::SurfaceTexture>,
}

/// Drawing context implemented on a wgpu surface
struct WgpuContext {
    api: ContextApi,
    state: Option<GpuState>,
}

impl WgpuContext {
    async fn new(
        window: Arc<winit::window::Window>,
        request: ContextRequest,
    ) -> Result<Self, PlatformError> {
        let context_error = |reason: String| PlatformError::ContextCreation {
            api: request.api,
            reason,
        };
        let size = window.inner_size();

        let backends = match request.api {
            ContextApi::FixedFunction => wgpu::Backends::GL,
            ContextApi::Core { .. } => wgpu::Backends::PRIMARY,
            ContextApi::Toolkit => wgpu::Backends::all(),
        };
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .map_err(|e| context_error(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| context_error("Failed to find suitable GPU adapter".to_string()))?;

        info!(
            "Using GPU: {} ({:?})",
            adapter.get_info().name,
            adapter.get_info().backend
        );

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Main Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                        .using_resolution(adapter.limits()),
                },
                None,
            )
            .await
            .map_err(|e| context_error(e.to_string()))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| context_error("Surface reports no formats".to_string()))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if request.vsync {
                wgpu::PresentMode::Fifo
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            api: request.api,
            state: Some(GpuState {
                surface,
                device,
                queue,
                config,
                frame: None,
            }),
        })
    }

    fn state_mut(&mut self) -> Result<&mut GpuState, PlatformError> {
        self.state
            .as_mut()
            .ok_or_else(|| PlatformError::Backend("context already released".to_string()))
    }
}

impl GraphicsContext for WgpuContext {
    fn api(&self) -> ContextApi {
        self.api
    }

    fn make_current(&mut self) -> Result<(), PlatformError> {
        // wgpu devices are not bound to a thread
        self.state_mut().map(|_| ())
    }

    fn set_viewport(&mut self, size: UVec2) {
        let state = match self.state_mut() {
            Ok(state) => state,
            Err(err) => {
                trace!("Viewport change ignored: {}", err);
                return;
            }
        };
        if size.x == 0 || size.y == 0 {
            return;
        }
        if state.config.width != size.x || state.config.height != size.y {
            state.config.width = size.x;
            state.config.height = size.y;
            state.surface.configure(&state.device, &state.config);
            debug!("Surface reconfigured to {}x{}", size.x, size.y);
        }
    }

    fn clear(&mut self, color: Color) -> Result<(), PlatformError> {
        let state = self.state_mut()?;
        let frame = match state.frame.take() {
            Some(frame) => frame,
            None => match state.surface.get_current_texture() {
                Ok(frame) => frame,
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    state.surface.configure(&state.device, &state.config);
                    debug!("Surface lost or outdated, reconfigured and skipped frame");
                    return Ok(());
                }
                Err(wgpu::SurfaceError::Timeout) => {
                    warn!("Surface timed out, skipping frame");
                    return Ok(());
                }
                Err(e) => return Err(PlatformError::Backend(e.to_string())),
            },
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = state
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Clear Encoder"),
            });
        {
            let _render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(color.into()),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }
        state.queue.submit(std::iter::once(encoder.finish()));
        state.frame = Some(frame);
        Ok(())
    }

    fn present(&mut self) -> Result<(), PlatformError> {
        let state = self.state_mut()?;
        match state.frame.take() {
            Some(frame) => frame.present(),
            None => trace!("present() without a rendered frame"),
        }
        Ok(())
    }

    fn release(&mut self) {
        if self.state.take().is_some() {
            debug!("wgpu context released");
        }
    }
}
