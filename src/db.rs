use crate::error::ApiError;
use crate::config::{Credentials, DatabaseConfig};
use crate::models::emotion::{Emotion, DEFAULT_EMOTIONS};
use crate::models::user::{RegisterUserRequest, User, UserStatus};
use deadpool_postgres::{Config, Object, Pool, PoolConfig, Runtime, Timeouts};
use postgres_native_tls::MakeTlsConnector;
use native_tls::TlsConnector;
use tokio_postgres::Row;
use tracing::{debug, error, info, warn};

/// Connection provider for the `emopop` database.
///
/// Holds a bounded deadpool pool built from credentials that were resolved
/// once at startup. Building the pool does not open a connection; an
/// unreachable database, or credentials that could not be resolved, show up
/// as `ApiError::Database` when a connection is requested.
#[derive(Clone)]
pub struct Database {
    pool: Pool,
    credential_error: Option<String>,
}

impl Database {
    pub fn connect(config: &DatabaseConfig) -> Result<Self, ApiError> {
        info!(
            "Creating PostgreSQL connection pool for {}@{}:{}/{} (password from {:?})",
            config.username, config.host, config.port, config.database, config.credential_source
        );

        let credential_error = match &config.credentials {
            Credentials::Password(_) => None,
            Credentials::Unavailable(reason) => {
                warn!("Database credentials unavailable, data endpoints will fail: {}", reason);
                Some(reason.clone())
            }
        };

        let pool = Self::create_pool(config)?;

        Ok(Database { pool, credential_error })
    }

    fn create_pool(config: &DatabaseConfig) -> Result<Pool, ApiError> {
        let mut pg_config = Config::new();

        pg_config.host = Some(config.host.clone());
        pg_config.port = Some(config.port);
        pg_config.dbname = Some(config.database.clone());
        pg_config.user = Some(config.username.clone());
        pg_config.password = config.credentials.password().map(str::to_string);
        pg_config.options = Some(config.connection_options());
        pg_config.connect_timeout = Some(config.connection_timeout);

        pg_config.ssl_mode = Some(match config.ssl_mode.as_str() {
            "require" => deadpool_postgres::SslMode::Require,
            "prefer" => deadpool_postgres::SslMode::Prefer,
            _ => deadpool_postgres::SslMode::Disable,
        });

        pg_config.manager = Some(deadpool_postgres::ManagerConfig {
            recycling_method: deadpool_postgres::RecyclingMethod::Fast,
        });

        let mut pool_config = PoolConfig::new(config.max_connections as usize);
        pool_config.timeouts = Timeouts {
            wait: Some(config.connection_timeout),
            create: Some(config.connection_timeout),
            recycle: Some(config.connection_timeout),
        };
        pg_config.pool = Some(pool_config);

        let tls_connector = TlsConnector::builder()
            .build()
            .map_err(|e| {
                error!("Failed to create TLS connector: {}", e);
                ApiError::database(format!("TLS connector creation failed: {}", e))
            })?;
        let tls = MakeTlsConnector::new(tls_connector);

        pg_config.create_pool(Some(Runtime::Tokio1), tls)
            .map_err(|e| {
                error!("Failed to create connection pool: {}", e);
                ApiError::database(format!("Connection pool creation failed: {}", e))
            })
    }

    async fn get_connection(&self) -> Result<Object, ApiError> {
        if let Some(ref reason) = self.credential_error {
            return Err(ApiError::database(format!("Database credentials unavailable: {}", reason)));
        }

        self.pool.get().await.map_err(ApiError::from)
    }

    pub async fn health_check(&self) -> Result<(), ApiError> {
        let client = self.get_connection().await?;

        client.execute("SELECT 1", &[])
            .await
            .map_err(|e| {
                error!("Database health check failed: {}", e);
                ApiError::database(format!("Health check failed: {}", e))
            })?;

        debug!("Database health check successful");
        Ok(())
    }

    /// Creates the `users` and `emotions` tables when missing.
    pub async fn migrate(&self) -> Result<(), ApiError> {
        info!("Running database migrations");

        let client = self.get_connection().await?;

        let users_table = r#"
            CREATE TABLE IF NOT EXISTS users (
                id UUID PRIMARY KEY,
                name VARCHAR(100) NOT NULL UNIQUE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
        "#;

        client.execute(users_table, &[])
            .await
            .map_err(|e| {
                error!("Failed to create users table: {}", e);
                ApiError::database(format!("Users table creation failed: {}", e))
            })?;

        let emotions_table = r#"
            CREATE TABLE IF NOT EXISTS emotions (
                id SERIAL PRIMARY KEY,
                name VARCHAR(50) NOT NULL UNIQUE,
                emoji VARCHAR(16) NOT NULL,
                color VARCHAR(7) NOT NULL,
                description TEXT
            )
        "#;

        client.execute(emotions_table, &[])
            .await
            .map_err(|e| {
                error!("Failed to create emotions table: {}", e);
                ApiError::database(format!("Emotions table creation failed: {}", e))
            })?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Inserts the reference emotions, but only into an empty table.
    /// The count and the inserts share one transaction, so a failed seed
    /// leaves the table empty and the next start tries again.
    pub async fn seed_emotions(&self) -> Result<(), ApiError> {
        let mut client = self.get_connection().await?;
        let tx = client.transaction()
            .await
            .map_err(ApiError::from)?;

        let row = tx.query_one("SELECT COUNT(*) FROM emotions", &[])
            .await
            .map_err(ApiError::from)?;
        let count: i64 = row.get(0);

        if count > 0 {
            info!("Emotions table already contains {} entries, skipping seed", count);
            return Ok(());
        }

        let insert_query = r#"
            INSERT INTO emotions (name, emoji, color, description)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO NOTHING
        "#;

        for (name, emoji, color, description) in DEFAULT_EMOTIONS {
            tx.execute(insert_query, &[&name, &emoji, &color, &description])
                .await
                .map_err(ApiError::from)?;

            debug!("Seeded emotion: {} {}", emoji, name);
        }

        tx.commit()
            .await
            .map_err(ApiError::from)?;

        info!("Seeded {} emotions", DEFAULT_EMOTIONS.len());
        Ok(())
    }

    /// Looks up the user by name and inserts it when absent.
    ///
    /// The insert relies on the `UNIQUE (name)` constraint, so concurrent
    /// requests for the same name still produce a single row.
    pub async fn find_or_create_user(&self, request: RegisterUserRequest) -> Result<UserStatus, ApiError> {
        request.validate().map_err(ApiError::validation)?;

        let user = request.into_user();
        let client = self.get_connection().await?;

        let insert_query = r#"
            INSERT INTO users (id, name, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO NOTHING
            RETURNING id, name, created_at
        "#;

        let inserted = client.query_opt(insert_query, &[&user.id, &user.name, &user.created_at])
            .await
            .map_err(ApiError::from)?;

        if let Some(row) = inserted {
            let created_user = user_from_row(&row);
            info!("Created user with id: {}", created_user.id);
            return Ok(UserStatus { created: true, user: created_user });
        }

        let row = client.query_one("SELECT id, name, created_at FROM users WHERE name = $1", &[&user.name])
            .await
            .map_err(ApiError::from)?;

        let existing_user = user_from_row(&row);
        debug!("User {} already exists with id: {}", existing_user.name, existing_user.id);
        Ok(UserStatus { created: false, user: existing_user })
    }

    pub async fn get_all_emotions(&self) -> Result<Vec<Emotion>, ApiError> {
        let client = self.get_connection().await?;
        let query = "SELECT id, name, emoji, color, description FROM emotions ORDER BY id";

        let rows = client.query(query, &[])
            .await
            .map_err(ApiError::from)?;

        Ok(rows.iter().map(emotion_from_row).collect())
    }
}

fn user_from_row(row: &Row) -> User {
    User {
        id: row.get(0),
        name: row.get(1),
        created_at: row.get(2),
    }
}

fn emotion_from_row(row: &Row) -> Emotion {
    Emotion {
        id: row.get(0),
        name: row.get(1),
        emoji: row.get(2),
        color: row.get(3),
        description: row.get(4),
    }
}

/// Settings aimed at a port nothing listens on.
#[cfg(test)]
pub(crate) fn unreachable_config() -> DatabaseConfig {
    use crate::config::CredentialSource;
    use std::time::Duration;

    DatabaseConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        database: "emopop".to_string(),
        username: "postgres".to_string(),
        credentials: Credentials::Password("postgres".to_string()),
        credential_source: CredentialSource::Environment,
        ssl_mode: "disable".to_string(),
        max_connections: 2,
        connection_timeout: Duration::from_secs(1),
        statement_timeout: Duration::from_millis(500),
    }
}

#[cfg(test)]
pub(crate) fn unreachable_database() -> Database {
    Database::connect(&unreachable_config()).expect("pool creation does not connect")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check_fails_when_database_unreachable() {
        let db = unreachable_database();

        let result = db.health_check().await;
        assert!(matches!(result, Err(ApiError::Database(_))));
    }

    #[tokio::test]
    async fn test_load_emotions_fails_when_database_unreachable() {
        let db = unreachable_database();

        let result = db.get_all_emotions().await;
        assert!(matches!(result, Err(ApiError::Database(_))));
    }

    #[tokio::test]
    async fn test_invalid_user_rejected_before_connecting() {
        let db = unreachable_database();

        let result = db
            .find_or_create_user(RegisterUserRequest { name: "   ".to_string() })
            .await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn test_valid_user_fails_with_database_error_when_unreachable() {
        let db = unreachable_database();

        let result = db
            .find_or_create_user(RegisterUserRequest { name: "alice".to_string() })
            .await;
        assert!(matches!(result, Err(ApiError::Database(_))));
    }

    #[tokio::test]
    async fn test_unavailable_credentials_surface_as_database_error() {
        let mut config = unreachable_config();
        config.credentials = Credentials::Unavailable("credentials file data/pg_password is empty".to_string());
        let db = Database::connect(&config).expect("pool still builds");

        let result = db.get_all_emotions().await;
        match result {
            Err(ApiError::Database(message)) => assert!(message.contains("credentials unavailable")),
            other => panic!("expected database error, got {:?}", other.map(|rows| rows.len())),
        }

        assert!(matches!(db.seed_emotions().await, Err(ApiError::Database(_))));
    }
}
