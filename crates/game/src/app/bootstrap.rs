use engine::{AppError, LoopConfig, Scene};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::gameplay::{self, DungeonLevel, LevelError};

#[derive(Debug, Error)]
pub(crate) enum StartupError {
    #[error("level load failed: {0}")]
    Level(#[from] LevelError),
    #[error(transparent)]
    App(#[from] AppError),
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
}

pub(crate) fn build_app() -> Result<AppWiring, StartupError> {
    init_tracing();
    info!("=== Dungeon Startup ===");

    let level = DungeonLevel::from_env()?;
    info!(
        level = level.name(),
        width = level.grid().width(),
        height = level.grid().height(),
        "level_selected"
    );

    Ok(AppWiring {
        config: LoopConfig::default(),
        scene: gameplay::build_scene(level),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
