use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub features: FeatureConfig,
    pub store: StoreConfig,
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
pub struct ApiConfig {
    pub enable_rate_limiting: bool,
    /// DRF-style rate string, e.g. "100/hour"
    pub rate_limit: String,
    /// Number of reverse proxies in front of the service; 0 trusts only the socket peer
    pub num_proxies: usize,
    pub rate_limit_max_entries: usize,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub jwt_issuer: Option<String>,
    pub jwt_expiry_hours: u64,
    pub session_cookie_name: String,
    pub csrf_cookie_name: String,
    pub require_studio_write_access: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    pub enable_other_course_settings: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StoreBackend {
    Memory,
    Postgres { url: String, max_connections: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
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
        if let Ok(v) = env::var("HOST") {
            self.server.host = v;
        }
        if let Some(v) = env::var("PROGRAMS_API_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_RATE_LIMITING") {
            self.api.enable_rate_limiting = v.parse().unwrap_or(self.api.enable_rate_limiting);
        }
        if let Ok(v) = env::var("API_RATE_LIMIT") {
            self.api.rate_limit = v;
        }
        if let Ok(v) = env::var("API_NUM_PROXIES") {
            self.api.num_proxies = v.parse().unwrap_or(self.api.num_proxies);
        }
        if let Ok(v) = env::var("API_RATE_LIMIT_MAX_ENTRIES") {
            self.api.rate_limit_max_entries = v.parse().unwrap_or(self.api.rate_limit_max_entries);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SECURITY_JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_ISSUER") {
            self.security.jwt_issuer = Some(v).filter(|s| !s.is_empty());
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_SESSION_COOKIE_NAME") {
            self.security.session_cookie_name = v;
        }
        if let Ok(v) = env::var("SECURITY_CSRF_COOKIE_NAME") {
            self.security.csrf_cookie_name = v;
        }
        if let Ok(v) = env::var("SECURITY_REQUIRE_STUDIO_WRITE_ACCESS") {
            self.security.require_studio_write_access =
                v.parse().unwrap_or(self.security.require_studio_write_access);
        }

        // Feature overrides
        if let Ok(v) = env::var("FEATURE_ENABLE_OTHER_COURSE_SETTINGS") {
            self.features.enable_other_course_settings =
                v.parse().unwrap_or(self.features.enable_other_course_settings);
        }

        // Store overrides
        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok());
        match env::var("COURSE_STORE").as_deref() {
            Ok("postgres") => {
                if let Ok(url) = env::var("DATABASE_URL") {
                    self.store.backend = StoreBackend::Postgres {
                        url,
                        max_connections: max_connections.unwrap_or(10),
                    };
                }
            }
            Ok("memory") => self.store.backend = StoreBackend::Memory,
            _ => {}
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            api: ApiConfig {
                enable_rate_limiting: true,
                rate_limit: "100/hour".to_string(),
                num_proxies: 0,
                rate_limit_max_entries: 10_000,
                enable_request_logging: true,
                max_request_size_bytes: 1024 * 1024, // 1MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                jwt_secret: "development-secret".to_string(),
                jwt_issuer: None,
                jwt_expiry_hours: 24 * 7, // 1 week
                session_cookie_name: "sessionid".to_string(),
                csrf_cookie_name: "csrftoken".to_string(),
                require_studio_write_access: true,
            },
            features: FeatureConfig {
                enable_other_course_settings: true,
            },
            store: StoreConfig {
                backend: StoreBackend::Memory,
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
            api: ApiConfig {
                enable_rate_limiting: true,
                rate_limit: "100/hour".to_string(),
                num_proxies: 1,
                rate_limit_max_entries: 50_000,
                enable_request_logging: true,
                max_request_size_bytes: 256 * 1024,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://studio.staging.example.com".to_string()],
                jwt_secret: String::new(),
                jwt_issuer: None,
                jwt_expiry_hours: 24,
                session_cookie_name: "sessionid".to_string(),
                csrf_cookie_name: "csrftoken".to_string(),
                require_studio_write_access: true,
            },
            features: FeatureConfig {
                enable_other_course_settings: true,
            },
            store: StoreConfig {
                backend: StoreBackend::Memory,
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
            api: ApiConfig {
                enable_rate_limiting: true,
                rate_limit: "100/hour".to_string(),
                num_proxies: 1,
                rate_limit_max_entries: 100_000,
                enable_request_logging: false,
                max_request_size_bytes: 64 * 1024,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://studio.example.com".to_string()],
                jwt_secret: String::new(),
                jwt_issuer: None,
                jwt_expiry_hours: 1,
                session_cookie_name: "sessionid".to_string(),
                csrf_cookie_name: "csrftoken".to_string(),
                require_studio_write_access: true,
            },
            features: FeatureConfig {
                enable_other_course_settings: true,
            },
            store: StoreConfig {
                backend: StoreBackend::Memory,
            },
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.api.rate_limit, "100/hour");
        assert_eq!(config.api.num_proxies, 0);
        assert!(!config.security.jwt_secret.is_empty());
        assert!(matches!(config.store.backend, StoreBackend::Memory));
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(config.api.enable_rate_limiting);
        assert!(config.security.jwt_secret.is_empty());
        assert!(config.security.require_studio_write_access);
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
    }
}
