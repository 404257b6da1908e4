// Engine root: module registry, lifecycle ordering and the frame loop

use super::frame_clock::FrameClock;
use super::module::{Module, ModuleState};
use super::platform::{PlatformError, SharedPlatform};
use super::signal::StopSignal;
use crate::config::EngineConfig;
use log::{debug, error, info, warn};

/// How often the run loop reports its frame rate
const FPS_LOG_INTERVAL: u64 = 300;

/// Engine errors
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("A module named '{0}' is already registered")]
    DuplicateModule(String),

    #[error("Module '{name}' failed to initialize: {source}")]
    ModuleInit {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Module '{name}' failed to update: {source}")]
    ModuleUpdate {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Module '{module}' depends on '{dependency}', which must be registered before it")]
    MissingDependency { module: String, dependency: String },

    #[error("No module named '{0}' is registered")]
    ModuleNotFound(String),

    #[error("Engine is already initialized")]
    AlreadyInitialized,

    #[error("Engine has not been initialized")]
    NotInitialized,

    #[error("Engine has been terminated")]
    Terminated,

    #[error("Modules cannot be registered or removed once the engine has started")]
    RegistryLocked,

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

/// Engine lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Accepting registrations, nothing initialized yet
    Idle,
    /// Platform and every module initialized
    Running,
    /// Torn down, either by `terminate` or a failed `init`
    Terminated,
}

struct ModuleSlot {
    module: Box<dyn Module>,
    state: ModuleState,
}

impl ModuleSlot {
    fn name(&self) -> &str {
        self.module.name()
    }
}

/// Owns the module registry, the platform lifecycle and the frame loop
///
/// Modules initialize and update in registration order and are destroyed in
/// reverse order, so a module must be registered after anything it depends on.
pub struct Engine {
    platform: SharedPlatform,
    modules: Vec<ModuleSlot>,
    state: EngineState,
    stop: StopSignal,
    tick_count: u64,
    target_fps: Option<u32>,
    max_ticks: Option<u64>,
}

impl Engine {
    /// Create an engine driving `platform`
    pub fn new(platform: SharedPlatform) -> Self {
        Self {
            platform,
            modules: Vec::new(),
            state: EngineState::Idle,
            stop: StopSignal::new(),
            tick_count: 0,
            target_fps: None,
            max_ticks: None,
        }
    }

    /// Create an engine with frame pacing and tick limits from configuration
    pub fn with_config(platform: SharedPlatform, config: &EngineConfig) -> Self {
        let mut engine = Self::new(platform);
        engine.target_fps = config.target_fps;
        engine.max_ticks = config.max_ticks;
        engine
    }

    /// Register a module. Names must be unique.
    pub fn register_module(&mut self, module: Box<dyn Module>) -> Result<usize, EngineError> {
        if self.state != EngineState::Idle {
            return Err(EngineError::RegistryLocked);
        }
        let name = module.name();
        if self.module_exists(name) {
            return Err(EngineError::DuplicateModule(name.to_string()));
        }

        debug!("Registered module '{}'", name);
        self.modules.push(ModuleSlot {
            module,
            state: ModuleState::Uninitialized,
        });
        Ok(self.modules.len() - 1)
    }

    /// Remove a module that has not been initialized yet
    pub fn remove_module(&mut self, name: &str) -> Result<Box<dyn Module>, EngineError> {
        if self.state != EngineState::Idle {
            return Err(EngineError::RegistryLocked);
        }
        let index = self
            .index_of(name)
            .ok_or_else(|| EngineError::ModuleNotFound(name.to_string()))?;
        debug!("Removed module '{}'", name);
        Ok(self.modules.remove(index).module)
    }

    pub fn module_exists(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Position of a module in registration order
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.modules.iter().position(|slot| slot.name() == name)
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Registered module names, in registration order
    pub fn module_names(&self) -> Vec<&str> {
        self.modules.iter().map(|slot| slot.name()).collect()
    }

    pub fn module(&self, name: &str) -> Option<&dyn Module> {
        self.modules
            .iter()
            .find(|slot| slot.name() == name)
            .map(|slot| slot.module.as_ref())
    }

    pub fn module_mut(&mut self, name: &str) -> Option<&mut (dyn Module + 'static)> {
        self.modules
            .iter_mut()
            .find(|slot| slot.name() == name)
            .map(|slot| slot.module.as_mut())
    }

    pub fn module_state(&self, name: &str) -> Option<ModuleState> {
        self.modules
            .iter()
            .find(|slot| slot.name() == name)
            .map(|slot| slot.state)
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == EngineState::Running
    }

    /// Handle modules use to ask the run loop to stop
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn request_stop(&self) {
        self.stop.request();
    }

    /// The platform this engine initializes and terminates
    pub fn platform(&self) -> SharedPlatform {
        SharedPlatform::clone(&self.platform)
    }

    /// Ticks completed since `init`
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Start the platform, then every module in registration order
    ///
    /// If a module fails, the modules already initialized are destroyed in
    /// reverse order, the platform is terminated and the engine cannot be
    /// started again.
    pub fn init(&mut self) -> Result<(), EngineError> {
        match self.state {
            EngineState::Running => return Err(EngineError::AlreadyInitialized),
            EngineState::Terminated => return Err(EngineError::Terminated),
            EngineState::Idle => {}
        }
        self.check_dependencies()?;

        self.platform.borrow_mut().init()?;
        info!(
            "Platform '{}' initialized, starting {} modules",
            self.platform.borrow().name(),
            self.modules.len()
        );

        for index in 0..self.modules.len() {
            let slot = &mut self.modules[index];
            match slot.module.init() {
                Ok(()) => {
                    slot.state = ModuleState::Running;
                    info!("Module '{}' initialized", slot.name());
                }
                Err(source) => {
                    let name = slot.name().to_string();
                    slot.state = ModuleState::Destroyed;
                    error!("Module '{}' failed to initialize: {:#}", name, source);

                    self.rollback(index);
                    self.platform.borrow_mut().terminate();
                    self.state = EngineState::Terminated;
                    return Err(EngineError::ModuleInit { name, source });
                }
            }
        }

        self.state = EngineState::Running;
        self.tick_count = 0;
        Ok(())
    }

    /// Update every running module once, in registration order
    pub fn tick(&mut self) -> Result<(), EngineError> {
        match self.state {
            EngineState::Idle => return Err(EngineError::NotInitialized),
            EngineState::Terminated => return Err(EngineError::Terminated),
            EngineState::Running => {}
        }

        for slot in self
            .modules
            .iter_mut()
            .filter(|slot| slot.state == ModuleState::Running)
        {
            if let Err(source) = slot.module.update() {
                return Err(EngineError::ModuleUpdate {
                    name: slot.name().to_string(),
                    source,
                });
            }
        }

        self.tick_count += 1;
        Ok(())
    }

    /// Destroy every module in reverse registration order, then the platform
    ///
    /// Destroy failures are logged and do not stop the teardown. Calling this
    /// on an engine that is not running does nothing.
    pub fn terminate(&mut self) {
        if self.state != EngineState::Running {
            return;
        }

        for slot in self.modules.iter_mut().rev() {
            if slot.state != ModuleState::Running {
                continue;
            }
            slot.state = ModuleState::Destroyed;
            match slot.module.destroy() {
                Ok(()) => info!("Module '{}' destroyed", slot.name()),
                Err(err) => error!("Module '{}' failed to destroy: {:#}", slot.name(), err),
            }
        }

        self.platform.borrow_mut().terminate();
        self.state = EngineState::Terminated;
        info!("Engine terminated after {} ticks", self.tick_count);
    }

    /// Initialize if needed, tick until a stop is requested or the tick limit
    /// is reached, then terminate
    pub fn run(&mut self) -> Result<(), EngineError> {
        if self.state == EngineState::Idle {
            self.init()?;
        }

        let mut clock = FrameClock::new(self.target_fps);
        let result = loop {
            if self.stop.is_requested() {
                info!("Stop requested after {} ticks", self.tick_count);
                break Ok(());
            }
            if self.max_ticks.map_or(false, |max| self.tick_count >= max) {
                info!("Tick limit of {} reached", self.tick_count);
                break Ok(());
            }

            clock.begin_frame();
            if let Err(err) = self.tick() {
                error!("{}", err);
                break Err(err);
            }
            clock.end_frame();

            if clock.frame_count() % FPS_LOG_INTERVAL == 0 {
                debug!(
                    "{:.1} FPS over {} frames, last frame {:.2} ms",
                    clock.fps(),
                    clock.frame_count(),
                    clock.delta_secs() * 1000.0
                );
            }
        };
        info!(
            "Run loop finished after {:.1}s",
            clock.elapsed().as_secs_f32()
        );

        self.terminate();
        result
    }

    /// Every dependency must name a module registered earlier
    fn check_dependencies(&self) -> Result<(), EngineError> {
        for (index, slot) in self.modules.iter().enumerate() {
            for dependency in slot.module.dependencies() {
                let registered_before = self.modules[..index]
                    .iter()
                    .any(|earlier| earlier.name() == *dependency);
                if !registered_before {
                    return Err(EngineError::MissingDependency {
                        module: slot.name().to_string(),
                        dependency: dependency.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Destroy modules `[0, failed)` in reverse order after a failed init
    fn rollback(&mut self, failed: usize) {
        for slot in self.modules[..failed].iter_mut().rev() {
            if slot.state != ModuleState::Running {
                continue;
            }
            slot.state = ModuleState::Destroyed;
            match slot.module.destroy() {
                Ok(()) => info!("Rolled back module '{}'", slot.name()),
                Err(err) => warn!("Rollback of module '{}' failed: {:#}", slot.name(), err),
            }
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if self.state == EngineState::Running {
            warn!("Engine dropped while running, terminating");
            self.terminate();
        }
    }
}
