use actix_web::{middleware::Logger, web, App};
use actix_cors::Cors;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sufferbuddy_api::{config::AppConfig, routes, state::AppState};

pub struct TestApp {
    pub models: MockServer,
    pub search: MockServer,
    pub usage_dir: TempDir,
    pub config: AppConfig,
    pub state: web::Data<AppState>,
}

impl TestApp {
    pub async fn new(model_order: &str, daily_limit: u32) -> Self {
        let models = MockServer::start().await;
        let search = MockServer::start().await;
        let usage_dir = tempfile::tempdir().expect("temp dir");

        let usage_file = usage_dir.path().join("api_usage.json");
        let vars = vec![
            ("GEMINI_API_KEY", "test-gemini-key".to_string()),
            ("GOOGLE_API_KEY", "test-google-key".to_string()),
            ("SEARCH_ENGINE_ID", "test-engine".to_string()),
            ("GEMINI_API_BASE_URL", models.uri()),
            ("IMAGE_SEARCH_URL", format!("{}/customsearch/v1", search.uri())),
            ("MODEL_FALLBACK_ORDER", model_order.to_string()),
            ("DAILY_LIMIT", daily_limit.to_string()),
            ("USAGE_FILE", usage_file.display().to_string()),
            ("RUST_ENV", "test".to_string()),
        ];
        let config = AppConfig::from_lookup(|key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.clone())
        })
        .expect("test config");
        let state = web::Data::new(AppState::from_config(&config).expect("test state"));

        Self {
            models,
            search,
            usage_dir,
            config,
            state,
        }
    }

    pub fn create_app(&self) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .app_data(self.state.clone())
            .configure(routes::configure)
    }

    pub async fn seed_usage(&self, date: &str, count: u32) {
        let record = json!({"date": date, "count": count});
        tokio::fs::write(&self.config.usage_file, record.to_string())
            .await
            .expect("write usage file");
    }

    pub async fn stored_usage(&self) -> Value {
        let raw = tokio::fs::read_to_string(&self.config.usage_file)
            .await
            .expect("read usage file");
        serde_json::from_str(&raw).expect("usage json")
    }

    pub async fn mount_model_text(&self, model: &str, text: &str) {
        Mock::given(method("POST"))
            .and(path(model_path(model)))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text(text)))
            .mount(&self.models)
            .await;
    }

    pub async fn mount_model_error(&self, model: &str, status: u16, body: &str) {
        Mock::given(method("POST"))
            .and(path(model_path(model)))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.models)
            .await;
    }

    pub async fn mount_image(&self, place: &str, link: &str, file_format: &str) {
        Mock::given(method("GET"))
            .and(path("/customsearch/v1"))
            .and(query_param("q", format!("scenic travel photo of {}", place)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    {"link": format!("{}.html", link), "title": "Travel blog"},
                    {"link": link, "title": format!("{} photo", place), "fileFormat": file_format}
                ]
            })))
            .mount(&self.search)
            .await;
    }
}

pub fn model_path(model: &str) -> String {
    format!("/v1beta/models/{}:generateContent", model)
}

pub fn gemini_text(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

pub fn today() -> String {
    chrono::Local::now().date_naive().format("%Y-%m-%d").to_string()
}
