use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub cep: CepConfig,
    pub pricing: PricingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection
    pub connection_timeout: u64,
    pub enable_query_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
    pub default_page_size: i64,
    pub max_page_size: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CepConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

/// Charge rules applied when a delivery is created for an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    pub urgent_surcharge_rate: Decimal,
    pub discount_threshold: Decimal,
    pub discount_rate: Decimal,
    pub heavy_cargo_threshold_kg: Decimal,
    pub heavy_cargo_fee: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            urgent_surcharge_rate: Decimal::new(20, 2),
            discount_threshold: Decimal::new(500, 0),
            discount_rate: Decimal::new(10, 2),
            heavy_cargo_threshold_kg: Decimal::new(50, 0),
            heavy_cargo_fee: Decimal::new(15, 0),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Some(port) = env::var("RAPSEGLOG_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_ENABLE_QUERY_LOGGING") {
            self.database.enable_query_logging = v.parse().unwrap_or(self.database.enable_query_logging);
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }
        if let Ok(v) = env::var("API_DEFAULT_PAGE_SIZE") {
            self.api.default_page_size = v.parse().unwrap_or(self.api.default_page_size);
        }
        if let Ok(v) = env::var("API_MAX_PAGE_SIZE") {
            self.api.max_page_size = v.parse().unwrap_or(self.api.max_page_size);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Postal-code service overrides
        if let Ok(v) = env::var("CEP_BASE_URL") {
            self.cep.base_url = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("CEP_TIMEOUT_SECS") {
            self.cep.timeout_secs = v.parse().unwrap_or(self.cep.timeout_secs);
        }

        // Pricing overrides
        if let Ok(v) = env::var("PRICING_URGENT_SURCHARGE_RATE") {
            self.pricing.urgent_surcharge_rate = v.parse().unwrap_or(self.pricing.urgent_surcharge_rate);
        }
        if let Ok(v) = env::var("PRICING_DISCOUNT_THRESHOLD") {
            self.pricing.discount_threshold = v.parse().unwrap_or(self.pricing.discount_threshold);
        }
        if let Ok(v) = env::var("PRICING_DISCOUNT_RATE") {
            self.pricing.discount_rate = v.parse().unwrap_or(self.pricing.discount_rate);
        }
        if let Ok(v) = env::var("PRICING_HEAVY_CARGO_THRESHOLD_KG") {
            self.pricing.heavy_cargo_threshold_kg = v.parse().unwrap_or(self.pricing.heavy_cargo_threshold_kg);
        }
        if let Ok(v) = env::var("PRICING_HEAVY_CARGO_FEE") {
            self.pricing.heavy_cargo_fee = v.parse().unwrap_or(self.pricing.heavy_cargo_fee);
        }

        // Logging overrides
        if let Ok(v) = env::var("LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Ok(v) = env::var("LOG_JSON") {
            self.logging.json = v.parse().unwrap_or(self.logging.json);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
                enable_query_logging: true,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 1024 * 1024, // 1MB
                default_page_size: 100,
                max_page_size: 1000,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["*".to_string()],
            },
            cep: CepConfig {
                base_url: "https://viacep.com.br".to_string(),
                timeout_secs: 10,
            },
            pricing: PricingConfig::default(),
            logging: LoggingConfig {
                level: "rapseglog_api=debug,tower_http=debug,info".to_string(),
                json: false,
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 10,
                enable_query_logging: true,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 512 * 1024,
                default_page_size: 100,
                max_page_size: 500,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
            cep: CepConfig {
                base_url: "https://viacep.com.br".to_string(),
                timeout_secs: 5,
            },
            pricing: PricingConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                json: true,
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
                enable_query_logging: false,
            },
            api: ApiConfig {
                enable_request_logging: false,
                max_request_size_bytes: 256 * 1024,
                default_page_size: 50,
                max_page_size: 100,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
            cep: CepConfig {
                base_url: "https://viacep.com.br".to_string(),
                timeout_secs: 5,
            },
            pricing: PricingConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                json: true,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
