// Application layer - Use case interactors

pub mod container;
pub mod queue_interactor;
pub mod render_interactor;
pub mod timeline_interactor;

// Re-export interactors
pub use container::{AppContainer, DefaultAppContainer};
pub use queue_interactor::{DispatchReport, GenerationQueue, QueueSettings, QueueState};
pub use render_interactor::{RenderJobController, RenderSettings, RetryPolicy};
pub use timeline_interactor::{
    RealtimePlaybackDriver, TimelineSession, TimelineSettings, TimelineState, VirtualPlaybackDriver,
};
