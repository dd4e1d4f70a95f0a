use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::Client;

use crate::error::SearchError;
use crate::models::image::{ImageResult, ImageSearchItem, ImageSearchResponse};
use crate::services::usage_tracker::UsageTracker;

const RESULTS_PER_SEARCH: u8 = 5;
const DIRECT_IMAGE_FORMATS: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

/// Finds an image for a place name. "No result" is `None`, never an error.
#[async_trait]
pub trait ImageResolver: Send + Sync {
    async fn find_image(&self, place_name: &str) -> Option<ImageResult>;
}

/// Google Custom Search image lookups, gated by the daily quota.
pub struct ImageSearchService {
    client: Client,
    search_url: String,
    api_key: String,
    search_engine_id: String,
    usage: Arc<UsageTracker>,
}

impl ImageSearchService {
    pub fn new(
        client: Client,
        search_url: &str,
        api_key: &str,
        search_engine_id: &str,
        usage: Arc<UsageTracker>,
    ) -> Self {
        Self {
            client,
            search_url: search_url.to_string(),
            api_key: api_key.to_string(),
            search_engine_id: search_engine_id.to_string(),
            usage,
        }
    }

    fn build_query(place_name: &str) -> String {
        format!("scenic travel photo of {}", place_name)
    }

    async fn search(&self, place_name: &str) -> Result<Option<ImageResult>, SearchError> {
        let Ok(reservation) = self.usage.check_and_reserve().await else {
            return Ok(None);
        };

        let query = Self::build_query(place_name);
        let num = RESULTS_PER_SEARCH.to_string();
        let params = [
            ("key", self.api_key.as_str()),
            ("cx", self.search_engine_id.as_str()),
            ("q", query.as_str()),
            ("searchType", "image"),
            ("num", num.as_str()),
            ("imgSize", "huge"),
            ("safe", "high"),
        ];

        debug!("Image search: '{}'", query);
        let response = self
            .client
            .get(&self.search_url)
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        // The call went through, so it counts whatever the results look like.
        reservation.commit().await;

        let body: ImageSearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Decode(e.to_string()))?;

        Ok(pick_direct_image(body.items.unwrap_or_default()))
    }
}

/// First item whose declared file format is a plain image file.
fn pick_direct_image(items: Vec<ImageSearchItem>) -> Option<ImageResult> {
    let found = items.into_iter().find_map(|item| {
        let format = item.file_format.as_deref()?.to_lowercase();
        if !DIRECT_IMAGE_FORMATS.contains(&format.as_str()) {
            return None;
        }
        let url = item.link?;
        Some(ImageResult {
            url,
            description: item.title.unwrap_or_default(),
        })
    });

    match &found {
        Some(image) => info!("Found direct image link: {}", image.url),
        None => info!("No direct image file found in search results."),
    }
    found
}

#[async_trait]
impl ImageResolver for ImageSearchService {
    async fn find_image(&self, place_name: &str) -> Option<ImageResult> {
        let place_name = place_name.trim();
        if place_name.is_empty() {
            return None;
        }

        match self.search(place_name).await {
            Ok(result) => result,
            Err(e) => {
                error!("Error fetching images from Google Search: {}", e);
                None
            }
        }
    }
}
