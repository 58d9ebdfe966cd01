use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::messaging::{MemoryBroker, MessageBroker, PubSubClient};
use crate::settings::{Settings, Transport};
use crate::storage::{BlobStore, CloudStorageClient, MemoryBlobStore};
use crate::translate::{TranslateClient, Translator};
use crate::vision::{TextDetector, VisionClient};

/// The external services every stage is built from
#[derive(Clone)]
pub struct Capabilities {
    pub detector: Arc<dyn TextDetector>,
    pub translator: Arc<dyn Translator>,
    pub store: Arc<dyn BlobStore>,
    pub broker: Arc<dyn MessageBroker>,
    /// Set for the local transport so subscriptions can be attached in-process
    pub local_broker: Option<Arc<MemoryBroker>>,
}

/// Factory for creating capability clients
pub struct CapabilityFactory;

impl CapabilityFactory {
    /// Create the capability set selected by `settings.transport`
    pub fn create(settings: &Settings) -> Result<Capabilities> {
        info!("Initializing capabilities for {} transport", settings.transport);

        let detector: Arc<dyn TextDetector> = Arc::new(VisionClient::new(
            &settings.vision_endpoint,
            &settings.translate_api_key,
        ));
        let translator: Arc<dyn Translator> = Arc::new(TranslateClient::new(
            &settings.translate_endpoint,
            &settings.translate_api_key,
        ));

        match settings.transport {
            Transport::Http => Ok(Capabilities {
                detector,
                translator,
                store: Arc::new(CloudStorageClient::new(
                    &settings.storage_endpoint,
                    &settings.access_token,
                )),
                broker: Arc::new(PubSubClient::new(
                    &settings.pubsub_endpoint,
                    &settings.project_id,
                    &settings.access_token,
                )),
                local_broker: None,
            }),
            Transport::Local => {
                let broker = Arc::new(MemoryBroker::new());
                Ok(Capabilities {
                    detector,
                    translator,
                    store: Arc::new(MemoryBlobStore::new()),
                    broker: broker.clone(),
                    local_broker: Some(broker),
                })
            }
        }
    }
}
