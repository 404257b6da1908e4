use anyhow::Result;
use log::info;
use tickwork::config::EngineConfig;
use tickwork::core::Color;
use tickwork::engine::entity::{ActionStatus, Countdown, Entity, FnAction};
use tickwork::engine::platform::{self, DesktopPlatform};
use tickwork::engine::window::{Window, WindowModule};
use tickwork::engine::{Engine, GraphicsModule};

/// Demo scene: a pulse that logs every second and a child that lives for five
fn build_scene() -> Result<Entity> {
    let mut root = Entity::named("scene");

    let mut ticks: u64 = 0;
    root.attach_action(FnAction::new("pulse", move |entity: &mut Entity| {
        ticks += 1;
        if ticks % 60 == 0 {
            info!(
                "Tick {}: '{}' has {} children",
                ticks,
                entity.name().unwrap_or_default(),
                entity.child_count()
            );
        }
        Ok(ActionStatus::Continue)
    }))?;

    let mut ephemeral = Entity::named("ephemeral");
    ephemeral.attach_action(Countdown::lifetime(300))?;
    root.add_child(ephemeral);

    Ok(root)
}

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let config = EngineConfig::from_env()
        .with_window(1280, 720, "tickwork")
        .with_clear_color(Color::rgb(0.1, 0.1, 0.15));
    info!(
        "Starting tickwork with the {} renderer...",
        config.renderer.backend
    );

    let platform = platform::shared(DesktopPlatform::new());
    let mut engine = Engine::with_config(platform.clone(), &config);

    let renderer = config.renderer.backend.create(&config.renderer);
    let window = Window::from_config(&config.window, renderer).into_shared();

    engine.register_module(Box::new(WindowModule::new(
        window.clone(),
        platform,
        engine.stop_signal(),
    )))?;
    engine.register_module(Box::new(GraphicsModule::with_root(
        window,
        build_scene()?,
    )))?;

    engine.run()?;

    info!("Shutdown complete");
    Ok(())
}
