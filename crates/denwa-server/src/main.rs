use anyhow::Context;
use axum::{extract::State, middleware, routing::get, Json, Router};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod adapters;
mod application;
mod auth;
mod config;
mod models;
mod routes;

use adapters::memory::InMemoryCallRepository;
use adapters::{PgCallRepository, RetellGateway};
use application::{CallDefaults, CallService, PhoneNumberService};
use config::{AppConfig, CallStore};
use denwa::{CallProvider, CallRepository};

/// Application services over the configured store and provider
pub type AppCallService = CallService<dyn CallRepository, dyn CallProvider>;
pub type AppPhoneNumberService = PhoneNumberService<dyn CallProvider>;

/// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub call_service: Arc<AppCallService>,
    pub phone_numbers: Arc<AppPhoneNumberService>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        repo: Arc<dyn CallRepository>,
        provider: Arc<dyn CallProvider>,
        config: AppConfig,
    ) -> Self {
        let defaults = CallDefaults {
            agent_id: config.provider.default_agent_id.clone(),
            from_number: config.provider.default_from_number.clone(),
            to_number: config.provider.default_to_number.clone(),
        };

        Self {
            call_service: Arc::new(CallService::new(
                repo,
                provider.clone(),
                defaults,
                config.webhook.orphan_retention,
            )),
            phone_numbers: Arc::new(PhoneNumberService::new(
                provider,
                config.provider.default_agent_id.clone(),
            )),
            config: Arc::new(config),
        }
    }
}

#[derive(Serialize)]
struct HealthCheck {
    status: String,
    message: String,
    version: String,
}

async fn health_check() -> Json<HealthCheck> {
    Json(HealthCheck {
        status: "ok".to_string(),
        message: "Denwa API is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
struct ConfigCheck {
    retell_api_key: String,
    retell_api_base_url: String,
    agent_id: Option<String>,
    from_number: Option<String>,
    default_to_number: Option<String>,
    webhook_url: String,
    webhook_signature_check: bool,
    api_auth: bool,
    orphan_retention_secs: u64,
}

/// Show which settings are loaded; secrets are masked
async fn config_check(State(state): State<AppState>) -> Json<ConfigCheck> {
    let config = &state.config;
    Json(ConfigCheck {
        retell_api_key: mask(&config.provider.api_key),
        retell_api_base_url: config.provider.api_base_url.clone(),
        agent_id: config.provider.default_agent_id.clone(),
        from_number: config.provider.default_from_number.clone(),
        default_to_number: config.provider.default_to_number.clone(),
        webhook_url: format!("{}/webhook/retell", config.webhook.public_base_url),
        webhook_signature_check: config.webhook.signing_key.is_some(),
        api_auth: config.api_key.is_some(),
        orphan_retention_secs: config.webhook.orphan_retention.as_secs(),
    })
}

fn mask(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    format!("{}...", visible)
}

/// Build the HTTP application
pub fn app(state: AppState) -> Router {
    // Protected routes (require authentication)
    let protected_routes = Router::new()
        .merge(routes::call::router())
        .merge(routes::web_call::router())
        .merge(routes::phone_number::router())
        .route("/config/check", get(config_check))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    // OpenAPI documentation
    let openapi = routes::swagger::ApiDoc::openapi();

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .route("/health", get(health_check))
        // Signed by the provider instead of the API key
        .merge(routes::webhook::router())
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[shuttle_runtime::main]
async fn main(
    #[shuttle_shared_db::Postgres] pool: PgPool,
    #[shuttle_runtime::Secrets] secrets: shuttle_runtime::SecretStore,
) -> shuttle_axum::ShuttleAxum {
    let config = AppConfig::from_lookup(|key| secrets.get(key)).context("Invalid configuration")?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .try_init();

    tracing::info!("📞 Denwa API initializing...");

    if config.api_key.is_some() {
        tracing::info!("🔐 API key authentication enabled");
    } else {
        tracing::warn!("⚠️  No DENWA_API_KEY set - authentication disabled");
    }
    if config.webhook.signing_key.is_none() {
        tracing::warn!("⚠️  Webhook signature verification disabled");
    }

    let repo: Arc<dyn CallRepository> = match config.store {
        CallStore::Postgres => {
            sqlx::migrate!()
                .run(&pool)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("✅ Database migrations completed");
            Arc::new(PgCallRepository::new(pool))
        }
        CallStore::Memory => {
            tracing::warn!("⚠️  CALL_STORE=memory - call records are lost on restart");
            Arc::new(InMemoryCallRepository::new())
        }
    };

    let gateway =
        RetellGateway::new(&config.provider).context("Failed to build Retell HTTP client")?;
    tracing::info!(
        "☎️  Retell gateway ready ({})",
        config.provider.api_base_url
    );
    tracing::info!(
        "🔔 Webhook URL: {}/webhook/retell",
        config.webhook.public_base_url
    );

    let state = AppState::new(repo, Arc::new(gateway), config);
    let router = app(state);

    tracing::info!("📚 Swagger UI: /swagger-ui");
    tracing::info!("✅ Denwa API ready");

    Ok(router.into())
}
