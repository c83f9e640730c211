//! HTTP server core implementation
//!
//! Wires the full service together: provider-backed function executors into
//! the registry, the Ollama gateway, the call log sink, the orchestrator,
//! and the actix-web app around them.

use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer as ActixHttpServer};
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;

use crate::config::{Config, ServerConfig};
use crate::core::functions::{CurrencyFunction, NewsFunction, WeatherFunction};
use crate::core::gateway::{ModelGateway, OllamaGateway};
use crate::core::orchestrator::Orchestrator;
use crate::core::registry::FunctionRegistry;
use crate::server::routes;
use crate::server::state::AppState;
use crate::storage::{CallLogStore, MemoryCallLog, SqliteCallLog};
use crate::utils::error::{Result, ServiceError};

/// HTTP server
pub struct HttpServer {
    /// Server configuration
    config: ServerConfig,
    /// Application state
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server
    pub async fn new(config: &Config) -> Result<Self> {
        info!("Creating HTTP server");

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.server.timeout))
            .build()?;

        let mut registry = FunctionRegistry::new();
        registry.register(Arc::new(WeatherFunction::new(
            client.clone(),
            config.providers.openweather_api_key.clone(),
        )));
        registry.register(Arc::new(NewsFunction::new(
            client.clone(),
            config.providers.newsapi_key.clone(),
        )));
        registry.register(Arc::new(CurrencyFunction::new(client.clone())));
        let registry = Arc::new(registry);
        info!(functions = registry.len(), "function registry built");

        let gateway: Arc<dyn ModelGateway> =
            Arc::new(OllamaGateway::new(client, &config.model));

        let call_log: Arc<dyn CallLogStore> = if config.storage.database.enabled {
            Arc::new(SqliteCallLog::new(&config.storage.database).await?)
        } else {
            warn!("call log database disabled; records kept in memory only");
            Arc::new(MemoryCallLog::new())
        };

        let orchestrator = Arc::new(Orchestrator::new(
            gateway,
            Arc::clone(&registry),
            call_log,
            config.orchestrator.clone(),
        ));

        let state = AppState::new(config.clone(), registry, orchestrator);

        Ok(Self {
            config: config.server.clone(),
            state,
        })
    }

    /// Create the Actix-web application
    fn create_app(
        state: web::Data<AppState>,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        let cors_config = &state.config.server.cors;
        let mut cors = Cors::default();

        if cors_config.enabled {
            if cors_config.allowed_origins.is_empty() {
                cors = cors.allow_any_origin();
            } else {
                for origin in &cors_config.allowed_origins {
                    cors = cors.allowed_origin(origin);
                }
            }
            cors = cors
                .allow_any_method()
                .allow_any_header()
                .max_age(cors_config.max_age as usize);
        }

        App::new()
            .app_data(state)
            .wrap(cors)
            .wrap(TracingLogger::default())
            .wrap(Logger::default())
            .configure(routes::chat::configure_routes)
            .configure(routes::health::configure_routes)
    }

    /// Start the HTTP server
    pub async fn start(self) -> Result<()> {
        let bind_addr = self.config.address();
        info!("Starting HTTP server on {}", bind_addr);

        let state = web::Data::new(self.state);
        let workers = self.config.workers;

        let mut server = ActixHttpServer::new(move || Self::create_app(state.clone()))
            .bind(&bind_addr)
            .map_err(|e| {
                ServiceError::Config(format!("Failed to bind to {}: {}", bind_addr, e))
            })?;

        if let Some(workers) = workers {
            server = server.workers(workers);
        }

        info!("HTTP server listening on {}", bind_addr);
        server.run().await?;

        info!("HTTP server stopped");
        Ok(())
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}
