pub mod asset;
pub mod renderer;
pub mod scene;
pub mod settings;

pub use asset::{Assets, Handle};
pub use renderer::{Renderer, RenderError};
pub use settings::RenderSettings;

/// Routes `log` output through env_logger, honouring `RUST_LOG`. Safe to
/// call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}
