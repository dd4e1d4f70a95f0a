use std::sync::Arc;

use log::{error, info, warn};

use crate::error::GenerationError;
use crate::services::image_search_service::ImageResolver;
use crate::services::itinerary_formatting::{clean_up, substitute_images};
use crate::services::model_backend::ItineraryBackend;

const USER_REQUEST_MARKER: &str = "{{USER_REQUEST}}";

const PROMPT_TEMPLATE: &str = r#"
    You are **SufferBuddy**, an expert AI travel guide for India. 
    You create clean, practical, attractive, and highly detailed travel itineraries in **simple English**.
    You must include **hotel prices, food prices, timings, must-try dishes, transport costs, and nearby famous places**.
    Do NOT use empty bullet points, avoid unnecessary newlines, and keep formatting clean.

    # 1. USER ANALYSIS
    Study the user's request and detect:
    - Travel style (solo, family, friends, couple, business, backpacker)
    - Budget level (luxury, mid-range, budget) — infer if not mentioned
    - Trip duration
    - Special interests (adventure, food, temples, beaches, nightlife, culture, photography)
    All suggestions must match the user's travel style and interests.

    # 2. ITINERARY FORMAT

    ## Title
    A catchy Level-1 Markdown heading.

    ## Introduction
    A short friendly paragraph that sets the tone of the trip.

    ## Trip Style
    A single sentence such as:
    **Trip Style:** Perfect for a family adventure with comfort and safety.

    ## Main Map
    A Google Maps link to the main destination:
    [View on Google Maps](https://www.google.com/maps/search/?api=1&query=[Main Destination])

    # 3. DAILY PLAN FORMAT (Repeat for each day)

    ## Day X: [Short Theme]
    One simple line describing the day’s theme.

    ### [Location Name]
    - A short description of the location.
    - Add: [IMAGE: {{Location name for image search}}]

    ### Local Guide
    - **Transport:** Mention common options + approx cost (Auto: ₹150–200, Cab: ₹300–500).
    - **Stay:** Recommend 1 luxury + 1 budget hotel with approx per-night prices.
    - **Food:** Suggest breakfast/lunch/dinner spots with must-try dishes and approx price per person.
    - **Activities:** List 2–4 activities with:
        - Entry fees (₹)
        - Best timings
        - Approx duration
    - **Nearby Places:** List 1–2 close famous places with short notes.

    # 4. END SECTION — TRAVEL HUB

    ## How to Reach [Main Destination]
    Provide the following links:
    - **Flights:** [Search Flights](https://www.google.com/flights?q=flights+to+[Main Destination])
    - **Trains:** [Train Availability](https://www.irctc.co.in/nget/train-search)
    - **Buses:** [Bus Tickets](https://www.redbus.in/buses/[main-destination]-bus-tickets)

    # 5. RULES
    - Use simple English only.
    - Keep formatting clean and readable.
    - Do not use empty lists or empty points.
    - Add prices wherever possible (food, hotels, activities, transport).

    ----------------------------------------------------------
    **User Request:** "{{USER_REQUEST}}"
    ----------------------------------------------------------

    # Begin the itinerary below:
    "#;

/// Fills the instruction template with the user's request, verbatim.
pub fn build_prompt(user_request: &str) -> String {
    PROMPT_TEMPLATE.replacen(USER_REQUEST_MARKER, user_request, 1)
}

/// Walks the model fallback chain and post-processes the first success.
pub struct ItineraryGenerator {
    backends: Vec<Arc<dyn ItineraryBackend>>,
    images: Arc<dyn ImageResolver>,
}

impl ItineraryGenerator {
    pub fn new(backends: Vec<Arc<dyn ItineraryBackend>>, images: Arc<dyn ImageResolver>) -> Self {
        Self { backends, images }
    }

    pub fn backend_names(&self) -> Vec<String> {
        self.backends.iter().map(|b| b.name().to_string()).collect()
    }

    pub async fn generate_itinerary(&self, user_request: &str) -> Result<String, GenerationError> {
        if self.backends.is_empty() {
            return Err(GenerationError::NoBackends);
        }

        let prompt = build_prompt(user_request);
        let mut last_error = None;

        for backend in &self.backends {
            info!("Attempting to use model: {}", backend.name());
            match backend.generate(&prompt).await {
                Ok(text) => {
                    let itinerary = self.enhance(&text).await;
                    info!(
                        "Successfully generated and enhanced content with {}",
                        backend.name()
                    );
                    return Ok(itinerary);
                }
                Err(e) => {
                    warn!("Error with model {}: {}", backend.name(), e);
                    last_error = Some(e.to_string());
                }
            }
        }

        error!("All models failed to generate a response.");
        Err(GenerationError::AllBackendsFailed { last_error })
    }

    async fn enhance(&self, text: &str) -> String {
        let with_images = substitute_images(text, self.images.as_ref()).await;
        clean_up(&with_images)
    }
}
