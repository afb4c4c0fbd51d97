/// Configuration for the blog database.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[cfg(feature = "postgres")]
mod pool {
    use std::time::Duration;

    use sea_orm::{ConnectOptions, Database, DbConn, DbErr};

    use super::DatabaseConfig;

    /// Open the connection pool.
    pub async fn connect(config: &DatabaseConfig) -> Result<DbConn, DbErr> {
        tracing::info!("Connecting to database...");

        let opts = ConnectOptions::new(&config.url)
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .sqlx_logging(true)
            .to_owned();

        let conn = Database::connect(opts).await?;
        tracing::info!("Database connected (pool: {})", config.max_connections);

        Ok(conn)
    }
}

#[cfg(feature = "postgres")]
pub use pool::connect;
