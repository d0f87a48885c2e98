use std::sync::Arc;

use crate::adapters::{AppConfig, HttpGenerationAdapter, HttpRenderAdapter, TokioSleeper};
use crate::app::{
    queue_interactor::{GenerationQueue, QueueSettings},
    render_interactor::{RenderJobController, RenderSettings},
    timeline_interactor::TimelineSettings,
};
use crate::domain::errors::DomainError;
use crate::domain::model::QueueItem;
use crate::ports::{GenerationPort, RenderServicePort, Sleeper};

/// Wiring of ports to interactors
pub trait AppContainer: Send + Sync {
    fn config(&self) -> &AppConfig;
    fn render_service(&self) -> Arc<dyn RenderServicePort>;
    fn generation_service(&self) -> Arc<dyn GenerationPort>;
    fn sleeper(&self) -> Arc<dyn Sleeper>;

    fn timeline_settings(&self) -> TimelineSettings {
        TimelineSettings::from(&self.config().playback)
    }

    fn render_settings(&self) -> Result<RenderSettings, DomainError> {
        RenderSettings::from_config(self.config())
    }

    fn render_controller(&self) -> Result<RenderJobController, DomainError> {
        Ok(RenderJobController::new(
            self.render_service(),
            self.sleeper(),
            self.render_settings()?,
        ))
    }

    fn generation_queue(&self, items: Vec<QueueItem>) -> GenerationQueue {
        GenerationQueue::new(
            self.generation_service(),
            self.sleeper(),
            QueueSettings::from(&self.config().generation),
            items,
        )
    }
}

/// Production wiring: HTTP services and tokio sleeps
pub struct DefaultAppContainer {
    config: AppConfig,
    render_service: Arc<HttpRenderAdapter>,
    generation_service: Arc<HttpGenerationAdapter>,
    sleeper: Arc<TokioSleeper>,
}

impl DefaultAppContainer {
    pub fn new(config: AppConfig) -> Result<Self, DomainError> {
        let render_service = Arc::new(HttpRenderAdapter::new(
            &config.render.base_url,
            config.render.request_timeout(),
        )?);
        let generation_service = Arc::new(HttpGenerationAdapter::new(
            &config.generation.base_url,
            config.generation.request_timeout(),
        )?);

        Ok(Self {
            config,
            render_service,
            generation_service,
            sleeper: Arc::new(TokioSleeper),
        })
    }
}

impl AppContainer for DefaultAppContainer {
    fn config(&self) -> &AppConfig {
        &self.config
    }

    fn render_service(&self) -> Arc<dyn RenderServicePort> {
        Arc::clone(&self.render_service) as Arc<dyn RenderServicePort>
    }

    fn generation_service(&self) -> Arc<dyn GenerationPort> {
        Arc::clone(&self.generation_service) as Arc<dyn GenerationPort>
    }

    fn sleeper(&self) -> Arc<dyn Sleeper> {
        Arc::clone(&self.sleeper) as Arc<dyn Sleeper>
    }
}
