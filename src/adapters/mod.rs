// Adapters - External system implementations

pub mod http_generation;
pub mod http_render;
pub mod project_file;
pub mod simulated_media;
pub mod timers;
pub mod toml_config;

// Re-export adapters
pub use http_generation::HttpGenerationAdapter;
pub use http_render::HttpRenderAdapter;
pub use project_file::{ProjectFileAdapter, ProjectFormat};
pub use simulated_media::{SimulatedMedia, SimulatedMediaFactory};
pub use timers::{ManualScheduler, TokioIntervalScheduler, TokioSleeper, VirtualSleeper};
pub use toml_config::{AppConfig, TomlConfigAdapter};
