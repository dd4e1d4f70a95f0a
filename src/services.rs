pub mod image_search_service;
pub mod itinerary_formatting;
pub mod itinerary_generation_service;
pub mod model_backend;
pub mod usage_tracker;
