//! Application state - shared across all handlers.

use std::sync::Arc;

use yatube_core::ports::{
    GroupRepository, PasswordService, PostRepository, RenderError, TemplateRenderer,
    TokenService, UserRepository,
};
use yatube_infra::{Argon2PasswordService, InMemoryStore, JwtTokenService, TeraRenderer};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<dyn PostRepository>,
    pub groups: Arc<dyn GroupRepository>,
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub renderer: Arc<dyn TemplateRenderer>,
    pub posts_per_page: usize,
    pub secure_cookies: bool,
    /// Which storage backend is live, reported by the health check.
    pub storage: &'static str,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    ///
    /// Fails only when the page templates do not compile.
    pub async fn new(config: &AppConfig) -> Result<Self, RenderError> {
        let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::from_env());
        let renderer: Arc<dyn TemplateRenderer> = Arc::new(load_templates(config)?);
        let state = Self {
            passwords: Arc::new(Argon2PasswordService::from_env()),
            ..Self::in_memory(Arc::new(InMemoryStore::new()), tokens, renderer, config)
        };

        #[cfg(feature = "postgres")]
        {
            if let Some(db_config) = &config.database {
                use yatube_infra::{
                    PostgresGroupRepository, PostgresPostRepository, PostgresUserRepository,
                };

                match yatube_infra::database::connect(db_config).await {
                    Ok(conn) => {
                        tracing::info!("Application state initialized (postgres)");
                        return Ok(Self {
                            posts: Arc::new(PostgresPostRepository::new(conn.clone())),
                            groups: Arc::new(PostgresGroupRepository::new(conn.clone())),
                            users: Arc::new(PostgresUserRepository::new(conn)),
                            storage: "postgres",
                            ..state
                        });
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to connect to database: {}. Using in-memory fallback.",
                            e
                        );
                    }
                }
            } else {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            }
        }

        #[cfg(not(feature = "postgres"))]
        tracing::info!("Running without postgres feature - using in-memory repositories");

        tracing::info!("Application state initialized (memory)");
        Ok(state)
    }

    /// State backed entirely by one in-memory store.
    pub fn in_memory(
        store: Arc<InMemoryStore>,
        tokens: Arc<dyn TokenService>,
        renderer: Arc<dyn TemplateRenderer>,
        config: &AppConfig,
    ) -> Self {
        Self {
            posts: store.clone(),
            groups: store.clone(),
            users: store,
            tokens,
            passwords: Arc::new(Argon2PasswordService::new()),
            renderer,
            posts_per_page: config.posts_per_page,
            secure_cookies: config.secure_cookies,
            storage: "memory",
        }
    }
}

fn load_templates(config: &AppConfig) -> Result<TeraRenderer, RenderError> {
    match &config.templates_dir {
        Some(dir) => TeraRenderer::from_dir(dir),
        None => TeraRenderer::embedded(),
    }
}
