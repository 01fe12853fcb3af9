use std::env;
use std::path::PathBuf;

use crate::store::TableNames;

pub const DEFAULT_ALLOWED_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://localhost:3001"];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    DynamoDb,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub store_backend: StoreBackend,
    pub aws_region: String,
    pub dynamodb_endpoint: Option<String>,
    pub tables: TableNames,
    pub memory_seed_path: Option<PathBuf>,
    pub allowed_origins: Vec<String>,
    pub fetch_concurrency: usize,
    pub scan_follow_pages: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = TableNames::default();

        let port = match var("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
                reason: "expected a port number",
            })?,
            None => 8080,
        };

        let store_backend = match var("STORE_BACKEND").as_deref().map(str::trim) {
            None | Some("dynamodb") => StoreBackend::DynamoDb,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "STORE_BACKEND",
                    value: other.to_string(),
                    reason: "expected 'dynamodb' or 'memory'",
                })
            }
        };

        let fetch_concurrency = match var("FETCH_CONCURRENCY") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n >= 1 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "FETCH_CONCURRENCY",
                        value: raw,
                        reason: "expected an integer >= 1",
                    })
                }
            },
            None => 1,
        };

        let scan_follow_pages = match var("SCAN_FOLLOW_PAGES") {
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "SCAN_FOLLOW_PAGES",
                        value: raw,
                        reason: "expected true or false",
                    })
                }
            },
            None => true,
        };

        let allowed_origins = match var("ALLOWED_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect(),
            None => DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            store_backend,
            aws_region: var("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            dynamodb_endpoint: var("DYNAMODB_ENDPOINT"),
            tables: TableNames {
                business_profile: var("BUSINESS_PROFILE_TABLE").unwrap_or(defaults.business_profile),
                user_profile: var("USER_PROFILE_TABLE").unwrap_or(defaults.user_profile),
                album: var("ALBUM_TABLE").unwrap_or(defaults.album),
                reviews: var("REVIEWS_TABLE").unwrap_or(defaults.reviews),
            },
            memory_seed_path: var("MEMORY_SEED_PATH").map(PathBuf::from),
            allowed_origins,
            fetch_concurrency,
            scan_follow_pages,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_match_deployed_service() {
        let cfg = config(&[]).unwrap();

        assert_eq!(cfg.bind_address(), "127.0.0.1:8080");
        assert_eq!(cfg.store_backend, StoreBackend::DynamoDb);
        assert_eq!(cfg.aws_region, "us-east-1");
        assert_eq!(cfg.tables, TableNames::default());
        assert_eq!(
            cfg.allowed_origins,
            vec!["http://localhost:3000", "http://localhost:3001"]
        );
        assert_eq!(cfg.fetch_concurrency, 1);
        assert!(cfg.scan_follow_pages);
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = config(&[
            ("PORT", "9000"),
            ("STORE_BACKEND", "memory"),
            ("MEMORY_SEED_PATH", "fixtures/seed.json"),
            ("REVIEWS_TABLE", "Reviews-test"),
            ("ALLOWED_ORIGINS", "https://app.example, https://admin.example"),
            ("FETCH_CONCURRENCY", "8"),
            ("SCAN_FOLLOW_PAGES", "false"),
        ])
        .unwrap();

        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.store_backend, StoreBackend::Memory);
        assert_eq!(cfg.memory_seed_path, Some(PathBuf::from("fixtures/seed.json")));
        assert_eq!(cfg.tables.reviews, "Reviews-test");
        assert_eq!(cfg.tables.album, TableNames::default().album);
        assert_eq!(
            cfg.allowed_origins,
            vec!["https://app.example", "https://admin.example"]
        );
        assert_eq!(cfg.fetch_concurrency, 8);
        assert!(!cfg.scan_follow_pages);
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = config(&[("FETCH_CONCURRENCY", "0")]).unwrap_err();
        assert!(err.to_string().starts_with("FETCH_CONCURRENCY"));

        let err = config(&[("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));

        assert!(config(&[("STORE_BACKEND", "postgres")]).is_err());
    }
}
