use crate::application::use_cases::prompt_builder::build_test_case_prompt;
use crate::application::use_cases::test_case_generator::save_run_log;
use crate::application::TestCaseGenerationUseCase;
use crate::domain::story::StoryInput;
use crate::infrastructure::config::ServerSettings;
use actix_cors::Cors;
use actix_web::{dev::Server, get, post, web, App, HttpResponse, HttpServer, Responder};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use validator::Validate;

const LANDING_PAGE: &str = include_str!("landing.html");

pub struct HttpState {
    pub generator: Arc<TestCaseGenerationUseCase>,
    /// Set when every generation should also be written as a numbered run log.
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl ErrorResponse {
    fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

#[get("/")]
async fn index() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(LANDING_PAGE)
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
    })
}

#[post("/generate-test-cases")]
async fn generate_test_cases(
    data: web::Data<HttpState>,
    req: web::Json<StoryInput>,
) -> impl Responder {
    let story = req.into_inner();
    if let Err(errors) = story.validate() {
        warn!(error = %errors, "Rejected test case request");
        return HttpResponse::BadRequest().json(ErrorResponse::new(errors.to_string()));
    }

    info!(jira_id = %story.jira_id, "Generating test cases");

    match data.generator.execute(&story).await {
        Ok(generated) => {
            if let Some(dir) = &data.output_dir {
                let prompt = build_test_case_prompt(&story);
                if let Err(err) = save_run_log(dir, &prompt, &generated) {
                    error!(error = %err, jira_id = %story.jira_id, "Failed to save run log");
                }
            }
            HttpResponse::Ok().json(generated)
        }
        Err(e) => {
            error!(error = %e, jira_id = %story.jira_id, "Test case generation failed");
            HttpResponse::InternalServerError().json(ErrorResponse::new(format!(
                "Error generating test cases: {}",
                e
            )))
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(index)
        .service(health)
        .service(generate_test_cases);
}

pub fn start_server(settings: &ServerSettings, state: HttpState) -> std::io::Result<Server> {
    let state = web::Data::new(state);

    let server = HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((settings.host.as_str(), settings.port))?
    .run();

    info!(host = %settings.host, port = settings.port, "HTTP server listening");
    Ok(server)
}
