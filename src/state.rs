use std::sync::Arc;

use crate::pipeline::Pipeline;
use crate::settings::Settings;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    pub fn new(settings: Settings, pipeline: Arc<Pipeline>) -> Self {
        Self {
            settings: Arc::new(settings),
            pipeline,
        }
    }
}
