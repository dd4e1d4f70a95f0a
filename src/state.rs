use std::sync::Arc;

use reqwest::Client;

use crate::config::AppConfig;
use crate::services::image_search_service::{ImageResolver, ImageSearchService};
use crate::services::itinerary_generation_service::ItineraryGenerator;
use crate::services::model_backend::{gemini_chain, ItineraryBackend};
use crate::services::usage_tracker::UsageTracker;

/// Shared per-process state handed to every handler through `web::Data`.
pub struct AppState {
    pub generator: ItineraryGenerator,
    pub usage: Arc<UsageTracker>,
    pub environment: String,
}

impl AppState {
    pub fn new(
        backends: Vec<Arc<dyn ItineraryBackend>>,
        images: Arc<dyn ImageResolver>,
        usage: Arc<UsageTracker>,
        environment: &str,
    ) -> Self {
        Self {
            generator: ItineraryGenerator::new(backends, images),
            usage,
            environment: environment.to_string(),
        }
    }

    /// Wires the Gemini chain and the Custom Search resolver from config.
    pub fn from_config(config: &AppConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.http_timeout).build()?;
        let usage = Arc::new(UsageTracker::new(&config.usage_file, config.daily_limit));

        let backends = gemini_chain(
            &client,
            &config.gemini_base_url,
            &config.gemini_api_key,
            &config.model_fallback_order,
        );
        let images = Arc::new(ImageSearchService::new(
            client,
            &config.image_search_url,
            &config.google_api_key,
            &config.search_engine_id,
            usage.clone(),
        ));

        Ok(Self::new(backends, images, usage, &config.environment))
    }
}
