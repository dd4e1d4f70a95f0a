use actix_web::{error::InternalError, web, HttpResponse, Responder};
use log::{error, info};

use crate::error::GenerationError;
use crate::models::itinerary::{ErrorResponse, GenerateItineraryRequest, GenerateItineraryResponse};
use crate::state::AppState;

const MISSING_PROMPT: &str = "Prompt is missing";
const ALL_MODELS_FAILED: &str =
    "Failed to generate itinerary. All models are currently busy or an error occurred.";

/*
    /api/generate-itinerary
*/
pub async fn generate(
    state: web::Data<AppState>,
    input: web::Json<GenerateItineraryRequest>,
) -> impl Responder {
    let Some(prompt) = input.prompt() else {
        return HttpResponse::BadRequest().json(ErrorResponse::new(MISSING_PROMPT));
    };
    info!("Generating itinerary for a {} byte request", prompt.len());

    match state.generator.generate_itinerary(prompt).await {
        Ok(itinerary) => HttpResponse::Ok().json(GenerateItineraryResponse { itinerary }),
        Err(err) => {
            error!("Itinerary generation failed: {}", err);
            service_unavailable(&err)
        }
    }
}

fn service_unavailable(err: &GenerationError) -> HttpResponse {
    HttpResponse::ServiceUnavailable()
        .json(ErrorResponse::new(ALL_MODELS_FAILED).with_details(err.details()))
}

/// Unreadable or non-JSON bodies get the same 400 as a missing prompt.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let detail = err.to_string();
        let response = HttpResponse::BadRequest()
            .json(ErrorResponse::new(MISSING_PROMPT).with_details(Some(detail)));
        InternalError::from_response(err, response).into()
    })
}
