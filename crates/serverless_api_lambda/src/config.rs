use thiserror::Error;

pub const DEFAULT_STAGE: &str = "dev";
pub const DEFAULT_SERVICE_NAME: &str = "serverless-api";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_SIGNED_URL_EXPIRY_SECS: u64 = 3600;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be configured")]
    Missing(&'static str),
    #[error("{name} must be a positive integer, got {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Process configuration, read once at cold start and passed by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub stage: String,
    pub environment: String,
    pub service_name: String,
    pub log_level: String,
    pub items_table: Option<String>,
    pub bucket_name: Option<String>,
    pub bucket_region: Option<String>,
    pub signed_url_expiry_secs: u64,
    pub s3_local_endpoint: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            stage: DEFAULT_STAGE.to_string(),
            environment: DEFAULT_STAGE.to_string(),
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            items_table: None,
            bucket_name: None,
            bucket_region: None,
            signed_url_expiry_secs: DEFAULT_SIGNED_URL_EXPIRY_SECS,
            s3_local_endpoint: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source. Blank values count
    /// as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let stage = read("STAGE").unwrap_or_else(|| DEFAULT_STAGE.to_string());
        let signed_url_expiry_secs = match read("SIGNED_URL_EXPIRY") {
            None => DEFAULT_SIGNED_URL_EXPIRY_SECS,
            Some(value) => match value.parse::<u64>() {
                Ok(seconds) if seconds > 0 => seconds,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "SIGNED_URL_EXPIRY",
                        value,
                    })
                }
            },
        };

        Ok(Self {
            environment: read("ENVIRONMENT").unwrap_or_else(|| stage.clone()),
            stage,
            service_name: read("SERVICE_NAME").unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),
            log_level: read("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            items_table: read("ITEMS_TABLE"),
            bucket_name: read("BUCKET_NAME"),
            bucket_region: read("BUCKET_REGION").or_else(|| read("AWS_REGION")),
            signed_url_expiry_secs,
            s3_local_endpoint: read("S3_LOCAL_ENDPOINT"),
        })
    }

    pub fn require_items_table(&self) -> Result<&str, ConfigError> {
        self.items_table
            .as_deref()
            .ok_or(ConfigError::Missing("ITEMS_TABLE"))
    }

    pub fn require_bucket(&self) -> Result<&str, ConfigError> {
        self.bucket_name
            .as_deref()
            .ok_or(ConfigError::Missing("BUCKET_NAME"))
    }
}
