use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;
use std::collections::HashMap;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthStatus {
    status: String,
    services: HashMap<String, ServiceStatus>,
    environment: String,
    version: String,
}

#[derive(Serialize, Clone)]
struct ServiceStatus {
    status: String,
    details: Option<String>,
}

pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let mut health = HealthStatus {
        status: "ok".to_string(),
        services: HashMap::new(),
        environment: state.environment.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let quota_result = check_image_quota(&state).await;
    health
        .services
        .insert("image_quota".to_string(), quota_result.clone());

    let backends_result = check_model_backends(&state);
    health
        .services
        .insert("model_backends".to_string(), backends_result.clone());

    if quota_result.status != "ok" || backends_result.status != "ok" {
        health.status = "degraded".to_string();
    }

    HttpResponse::Ok().json(health)
}

async fn check_image_quota(state: &AppState) -> ServiceStatus {
    let usage = state.usage.current().await;
    let limit = state.usage.daily_limit();
    let details = Some(format!(
        "{}/{} image searches used on {}",
        usage.count, limit, usage.date
    ));

    if usage.count >= limit {
        ServiceStatus {
            status: "exhausted".to_string(),
            details,
        }
    } else {
        ServiceStatus {
            status: "ok".to_string(),
            details,
        }
    }
}

fn check_model_backends(state: &AppState) -> ServiceStatus {
    let names = state.generator.backend_names();
    if names.is_empty() {
        return ServiceStatus {
            status: "error".to_string(),
            details: Some("No model backends configured".to_string()),
        };
    }

    ServiceStatus {
        status: "ok".to_string(),
        details: Some(format!("Fallback order: {}", names.join(" -> "))),
    }
}
