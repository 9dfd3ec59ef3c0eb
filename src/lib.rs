pub mod asset;
pub mod error;
pub mod renderer;
pub mod settings;

pub use error::RenderError;
pub use renderer::{Device, RecordingDevice, RenderPass, RenderQueue, RenderStyle, Renderer};
pub use settings::RenderSettings;

pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}
