//! Configuration module
//!
//! Settings for the HTTP server, the artifact store, the job ledger and the
//! renderer pool. Everything is read from the environment (after loading a
//! `.env` file when present) with typed defaults.

use std::env;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_ARTIFACT_PREFIX, DEFAULT_LEDGER_PARTITION_KEY, DEFAULT_MAX_UPLOAD_SIZE_MB,
    DEFAULT_PRESIGN_TTL_SECONDS, DEFAULT_RENDER_TIMEOUT_SECONDS,
};
use crate::storage_types::{LedgerBackend, RenderPoolMode, StorageBackend, StoreFailurePolicy};

const SERVER_PORT: u16 = 4000;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const LEDGER_RETRY_ATTEMPTS: u32 = 3;
const LEDGER_RETRY_BASE_DELAY_MS: u64 = 100;
const RENDER_POOL_MAX_IDLE: usize = 2;
const MIN_LINK_SECRET_LEN: usize = 32;

fn generate_link_secret() -> String {
    hex::encode(rand::random::<[u8; 32]>())
}

/// Server-level settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    /// `json` for machine-readable logs, anything else for the compact format.
    pub log_format: String,
}

/// Artifact store settings
#[derive(Clone, Debug)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: PathBuf,
    pub local_storage_base_url: String,
    pub artifact_prefix: String,
    pub presign_ttl_seconds: u64,
    pub store_failure_policy: StoreFailurePolicy,
    pub local_fallback_path: PathBuf,
    /// HMAC key for local download links. Generated per process when
    /// `LINK_SIGNING_SECRET` is unset, so links then die with a restart.
    pub link_signing_secret: String,
}

/// Job ledger settings
#[derive(Clone, Debug)]
pub struct LedgerSettings {
    pub backend: LedgerBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub partition_key: String,
    pub retry_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub dead_letter_path: PathBuf,
}

/// Renderer pool settings
#[derive(Clone, Debug)]
pub struct RendererSettings {
    pub chrome_path: Option<PathBuf>,
    pub timeout_seconds: u64,
    pub pool_mode: RenderPoolMode,
    /// 0 disables admission control.
    pub max_concurrent: usize,
    pub sandbox: bool,
}

/// Conversion service configuration
#[derive(Clone, Debug)]
pub struct ConverterConfig {
    pub base: BaseConfig,
    pub storage: StorageSettings,
    pub ledger: LedgerSettings,
    pub renderer: RendererSettings,
    pub max_upload_size_bytes: usize,
}

impl Default for ConverterConfig {
    /// Development defaults: local artifacts, in-memory ledger, one-shot renderer.
    fn default() -> Self {
        ConverterConfig {
            base: BaseConfig {
                server_port: SERVER_PORT,
                cors_origins: vec!["*".to_string()],
                environment: "development".to_string(),
                log_format: "compact".to_string(),
            },
            storage: StorageSettings {
                backend: StorageBackend::Local,
                s3_bucket: None,
                s3_region: None,
                s3_endpoint: None,
                aws_region: None,
                local_storage_path: PathBuf::from("data/artifacts"),
                local_storage_base_url: format!("http://localhost:{}/files", SERVER_PORT),
                artifact_prefix: DEFAULT_ARTIFACT_PREFIX.to_string(),
                presign_ttl_seconds: DEFAULT_PRESIGN_TTL_SECONDS,
                store_failure_policy: StoreFailurePolicy::Fail,
                local_fallback_path: PathBuf::from("data/fallback"),
                link_signing_secret: generate_link_secret(),
            },
            ledger: LedgerSettings {
                backend: LedgerBackend::Memory,
                database_url: None,
                db_max_connections: MAX_CONNECTIONS,
                db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
                partition_key: DEFAULT_LEDGER_PARTITION_KEY.to_string(),
                retry_attempts: LEDGER_RETRY_ATTEMPTS,
                retry_base_delay_ms: LEDGER_RETRY_BASE_DELAY_MS,
                dead_letter_path: PathBuf::from("data/ledger-dead-letter.jsonl"),
            },
            renderer: RendererSettings {
                chrome_path: None,
                timeout_seconds: DEFAULT_RENDER_TIMEOUT_SECONDS,
                pool_mode: RenderPoolMode::OneShot,
                max_concurrent: 0,
                sandbox: true,
            },
            max_upload_size_bytes: DEFAULT_MAX_UPLOAD_SIZE_MB * 1024 * 1024,
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<ConverterConfig>);

impl Config {
    fn inner(&self) -> &ConverterConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_env(&self.inner().base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = ConverterConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn log_format(&self) -> &str {
        &self.inner().base.log_format
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.inner().max_upload_size_bytes
    }

    pub fn storage(&self) -> &StorageSettings {
        &self.inner().storage
    }

    pub fn ledger(&self) -> &LedgerSettings {
        &self.inner().ledger
    }

    pub fn renderer(&self) -> &RendererSettings {
        &self.inner().renderer
    }
}

impl From<ConverterConfig> for Config {
    fn from(config: ConverterConfig) -> Self {
        Config(Box::new(config))
    }
}

fn is_production_env(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .to_lowercase()
        .parse()
        .unwrap_or(default)
}

impl ConverterConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let defaults = ConverterConfig::default();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| defaults.base.environment.clone());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        if is_production_env(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let server_port: u16 = env::var("PORT")
            .unwrap_or_else(|_| SERVER_PORT.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

        let base = BaseConfig {
            server_port,
            cors_origins,
            environment,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| defaults.base.log_format.clone())
                .to_lowercase(),
        };

        let storage = StorageSettings {
            backend: match env::var("STORAGE_BACKEND") {
                Ok(s) => s.parse()?,
                Err(_) => defaults.storage.backend,
            },
            s3_bucket: env::var("S3_BUCKET").ok().filter(|s| !s.is_empty()),
            s3_region: env::var("S3_REGION").ok().filter(|s| !s.is_empty()),
            s3_endpoint: env::var("S3_ENDPOINT").ok().filter(|s| !s.is_empty()),
            aws_region: env::var("AWS_REGION").ok().filter(|s| !s.is_empty()),
            local_storage_path: env::var("LOCAL_STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage.local_storage_path),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}/files", server_port)),
            artifact_prefix: env::var("ARTIFACT_PREFIX")
                .unwrap_or(defaults.storage.artifact_prefix)
                .trim_matches('/')
                .to_string(),
            presign_ttl_seconds: env::var("PRESIGN_TTL_SECONDS")
                .unwrap_or_else(|_| DEFAULT_PRESIGN_TTL_SECONDS.to_string())
                .parse()
                .unwrap_or(DEFAULT_PRESIGN_TTL_SECONDS),
            store_failure_policy: match env::var("STORE_FAILURE_POLICY") {
                Ok(s) => s.parse()?,
                Err(_) => StoreFailurePolicy::default(),
            },
            local_fallback_path: env::var("LOCAL_FALLBACK_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage.local_fallback_path),
            link_signing_secret: env::var("LINK_SIGNING_SECRET")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.storage.link_signing_secret),
        };

        let ledger = LedgerSettings {
            backend: match env::var("LEDGER_BACKEND") {
                Ok(s) => s.parse()?,
                Err(_) if env::var("DATABASE_URL").is_ok() => LedgerBackend::Postgres,
                Err(_) => defaults.ledger.backend,
            },
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            partition_key: env::var("LEDGER_PARTITION_KEY")
                .unwrap_or(defaults.ledger.partition_key),
            retry_attempts: env::var("LEDGER_RETRY_ATTEMPTS")
                .unwrap_or_else(|_| LEDGER_RETRY_ATTEMPTS.to_string())
                .parse()
                .unwrap_or(LEDGER_RETRY_ATTEMPTS),
            retry_base_delay_ms: env::var("LEDGER_RETRY_BASE_DELAY_MS")
                .unwrap_or_else(|_| LEDGER_RETRY_BASE_DELAY_MS.to_string())
                .parse()
                .unwrap_or(LEDGER_RETRY_BASE_DELAY_MS),
            dead_letter_path: env::var("LEDGER_DEAD_LETTER_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ledger.dead_letter_path),
        };

        let pool_mode = match env::var("RENDER_POOL_MODE")
            .unwrap_or_else(|_| "oneshot".to_string())
            .to_lowercase()
            .as_str()
        {
            "oneshot" | "one-shot" => RenderPoolMode::OneShot,
            "pooled" => RenderPoolMode::Pooled {
                max_idle: env::var("RENDER_POOL_MAX_IDLE")
                    .unwrap_or_else(|_| RENDER_POOL_MAX_IDLE.to_string())
                    .parse()
                    .unwrap_or(RENDER_POOL_MAX_IDLE),
            },
            other => return Err(anyhow::anyhow!("Invalid RENDER_POOL_MODE: {}", other)),
        };

        let renderer = RendererSettings {
            chrome_path: env::var("CHROME_PATH")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            timeout_seconds: env::var("RENDER_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| DEFAULT_RENDER_TIMEOUT_SECONDS.to_string())
                .parse()
                .unwrap_or(DEFAULT_RENDER_TIMEOUT_SECONDS),
            pool_mode,
            max_concurrent: env::var("RENDER_MAX_CONCURRENT")
                .unwrap_or_else(|_| "0".to_string())
                .parse()
                .unwrap_or(0),
            sandbox: env_flag("RENDER_SANDBOX", true),
        };

        let max_upload_size_mb = env::var("MAX_UPLOAD_SIZE_MB")
            .unwrap_or_else(|_| DEFAULT_MAX_UPLOAD_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(DEFAULT_MAX_UPLOAD_SIZE_MB);

        let config = ConverterConfig {
            base,
            storage,
            ledger,
            renderer,
            max_upload_size_bytes: max_upload_size_mb * 1024 * 1024,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.ledger.backend == LedgerBackend::Postgres {
            let url = self.ledger.database_url.as_deref().ok_or_else(|| {
                anyhow::anyhow!("DATABASE_URL must be set when using the postgres ledger")
            })?;
            if !(url.starts_with("postgresql://") || url.starts_with("postgres://")) {
                return Err(anyhow::anyhow!(
                    "DATABASE_URL must be a valid PostgreSQL connection string"
                ));
            }
        }

        if self.ledger.partition_key.trim().is_empty() {
            return Err(anyhow::anyhow!("LEDGER_PARTITION_KEY must not be empty"));
        }

        match self.storage.backend {
            StorageBackend::S3 => {
                if self.storage.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.storage.s3_region.is_none() && self.storage.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.storage.local_storage_base_url.is_empty() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        if self.storage.artifact_prefix.is_empty() || self.storage.artifact_prefix.contains("..")
        {
            return Err(anyhow::anyhow!(
                "ARTIFACT_PREFIX must be a non-empty relative path"
            ));
        }

        if self.storage.link_signing_secret.len() < MIN_LINK_SECRET_LEN {
            return Err(anyhow::anyhow!(
                "LINK_SIGNING_SECRET must be at least {} characters long",
                MIN_LINK_SECRET_LEN
            ));
        }

        if self.storage.presign_ttl_seconds == 0 {
            return Err(anyhow::anyhow!("PRESIGN_TTL_SECONDS must be greater than 0"));
        }

        if self.renderer.timeout_seconds == 0 {
            return Err(anyhow::anyhow!(
                "RENDER_TIMEOUT_SECONDS must be greater than 0"
            ));
        }

        if let RenderPoolMode::Pooled { max_idle: 0 } = self.renderer.pool_mode {
            return Err(anyhow::anyhow!(
                "RENDER_POOL_MAX_IDLE must be at least 1 in pooled mode"
            ));
        }

        if self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than 0"));
        }

        Ok(())
    }
}
