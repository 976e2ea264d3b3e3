use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Context, Result};

/// Origins the browser client is served from.
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://emo.riskspace.net"];

/// Local credentials file consulted when `DB_PASSWORD` is not set.
pub const DEFAULT_PASSWORD_FILE: &str = "data/pg_password";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub request_timeout: Duration,
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub credentials: Credentials,
    pub credential_source: CredentialSource,
    pub ssl_mode: String,
    pub max_connections: u32,
    pub connection_timeout: Duration,
    pub statement_timeout: Duration,
}

/// Where the database password came from. Chosen once while the
/// configuration is loaded, never per connection.
#[derive(Debug, Clone, PartialEq)]
pub enum CredentialSource {
    Environment,
    File(PathBuf),
}

/// Outcome of credential resolution. A failure is kept here and reported by
/// the connection provider on first use, so the process still starts.
#[derive(Clone, PartialEq)]
pub enum Credentials {
    Password(String),
    Unavailable(String),
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    /// `from_env` passes the process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = lookup("PORT")
            .unwrap_or_else(|| "5000".to_string())
            .parse::<u16>()
            .context("PORT must be a valid port number")?;

        let request_timeout_secs = lookup("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_string())
            .parse::<u64>()
            .context("REQUEST_TIMEOUT_SECS must be a valid number of seconds")?;

        let database = DatabaseConfig::from_lookup(&lookup)?;
        let cors = CorsConfig::from_lookup(&lookup);

        let config = Config {
            port,
            database,
            cors,
            request_timeout: Duration::from_secs(request_timeout_secs),
        };

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("PORT must be greater than 0");
        }

        if self.request_timeout.as_secs() == 0 {
            anyhow::bail!("Request timeout must be greater than 0");
        }

        self.database.validate()?;
        self.cors.validate()?;

        Ok(())
    }
}

impl DatabaseConfig {
    pub fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("DATABASE_HOST").unwrap_or_else(|| "localhost".to_string());

        let port = lookup("DATABASE_PORT")
            .unwrap_or_else(|| "5432".to_string())
            .parse::<u16>()
            .context("DATABASE_PORT must be a valid port number")?;

        let database = lookup("DATABASE_NAME").unwrap_or_else(|| "emopop".to_string());

        let username = lookup("DATABASE_USERNAME").unwrap_or_else(|| "postgres".to_string());

        let credential_source = CredentialSource::select(lookup);
        let credentials = match credential_source.resolve(lookup) {
            Ok(password) => Credentials::Password(password),
            Err(e) => Credentials::Unavailable(format!("{:#}", e)),
        };

        let ssl_mode = lookup("DATABASE_SSL_MODE").unwrap_or_else(|| "disable".to_string());

        let max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u32>()
            .context("DATABASE_MAX_CONNECTIONS must be a valid number")?;

        let connection_timeout_secs = lookup("DATABASE_CONNECTION_TIMEOUT")
            .unwrap_or_else(|| "5".to_string())
            .parse::<u64>()
            .context("DATABASE_CONNECTION_TIMEOUT must be a valid number of seconds")?;

        let statement_timeout_ms = lookup("DATABASE_STATEMENT_TIMEOUT_MS")
            .unwrap_or_else(|| "5000".to_string())
            .parse::<u64>()
            .context("DATABASE_STATEMENT_TIMEOUT_MS must be a valid number of milliseconds")?;

        Ok(DatabaseConfig {
            host,
            port,
            database,
            username,
            credentials,
            credential_source,
            ssl_mode,
            max_connections,
            connection_timeout: Duration::from_secs(connection_timeout_secs),
            statement_timeout: Duration::from_millis(statement_timeout_ms),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            anyhow::bail!("Database host cannot be empty");
        }

        if self.port == 0 {
            anyhow::bail!("Database port must be greater than 0");
        }

        if self.database.trim().is_empty() {
            anyhow::bail!("Database name cannot be empty");
        }

        if self.username.trim().is_empty() {
            anyhow::bail!("Database username cannot be empty");
        }

        match self.ssl_mode.as_str() {
            "disable" | "prefer" | "require" => {}
            _ => anyhow::bail!("Invalid SSL mode. Must be one of: disable, prefer, require"),
        }

        if self.max_connections == 0 {
            anyhow::bail!("Max connections must be greater than 0");
        }

        if self.connection_timeout.as_secs() == 0 {
            anyhow::bail!("Connection timeout must be greater than 0");
        }

        if self.statement_timeout.as_millis() == 0 {
            anyhow::bail!("Statement timeout must be greater than 0");
        }

        Ok(())
    }

    /// Server-side options sent with every new connection.
    pub fn connection_options(&self) -> String {
        format!("-c statement_timeout={}", self.statement_timeout.as_millis())
    }
}

// Keeps the password out of log lines that print the config.
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("credentials", &self.credentials)
            .field("credential_source", &self.credential_source)
            .field("ssl_mode", &self.ssl_mode)
            .field("max_connections", &self.max_connections)
            .field("connection_timeout", &self.connection_timeout)
            .field("statement_timeout", &self.statement_timeout)
            .finish()
    }
}

impl Credentials {
    pub fn password(&self) -> Option<&str> {
        match self {
            Credentials::Password(password) => Some(password),
            Credentials::Unavailable(_) => None,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Password(_) => f.write_str("Password(<redacted>)"),
            Credentials::Unavailable(reason) => f.debug_tuple("Unavailable").field(reason).finish(),
        }
    }
}

impl CredentialSource {
    /// `DB_PASSWORD` wins when present, even if empty; otherwise the local credentials file.
    pub fn select<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if lookup("DB_PASSWORD").is_some() {
            CredentialSource::Environment
        } else {
            let path = lookup("DB_PASSWORD_FILE").unwrap_or_else(|| DEFAULT_PASSWORD_FILE.to_string());
            CredentialSource::File(PathBuf::from(path))
        }
    }

    pub fn resolve<F>(&self, lookup: &F) -> Result<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        match self {
            CredentialSource::Environment => {
                lookup("DB_PASSWORD").context("DB_PASSWORD environment variable is required")
            }
            CredentialSource::File(path) => read_password_file(path),
        }
    }
}

fn read_password_file(path: &Path) -> Result<String> {
    let contents = fs::read_to_string(path).with_context(|| {
        format!(
            "DB_PASSWORD is not set and the credentials file {} could not be read",
            path.display()
        )
    })?;

    let password = contents.trim();
    if password.is_empty() {
        anyhow::bail!("credentials file {} is empty", path.display());
    }

    Ok(password.to_string())
}

impl CorsConfig {
    pub fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let allowed_origins = match lookup("CORS_ALLOWED_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            None => DEFAULT_ALLOWED_ORIGINS.iter().map(|origin| origin.to_string()).collect(),
        };

        CorsConfig { allowed_origins }
    }

    pub fn validate(&self) -> Result<()> {
        if self.allowed_origins.is_empty() {
            anyhow::bail!("At least one CORS origin must be allowed");
        }

        for origin in &self.allowed_origins {
            if !origin.starts_with("http://") && !origin.starts_with("https://") {
                anyhow::bail!("Invalid CORS origin '{}': must start with http:// or https://", origin);
            }
        }

        Ok(())
    }
}
