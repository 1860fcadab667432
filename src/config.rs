//! Process settings, read once at startup from the environment (and `.env` via dotenvy in the binary).

use crate::error::ConfigError;
use std::fmt;
use std::net::SocketAddr;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Which store backs the API, with the credentials it needs.
#[derive(Clone)]
pub enum StoreSettings {
    /// Supabase-style PostgREST endpoint; the REST base is `{url}/rest/v1`.
    Postgrest { url: String, key: String },
    /// Direct PostgreSQL connection.
    Postgres { database_url: String, max_connections: u32 },
}

impl fmt::Debug for StoreSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreSettings::Postgrest { url, .. } => f
                .debug_struct("Postgrest")
                .field("url", url)
                .field("key", &"<redacted>")
                .finish(),
            StoreSettings::Postgres { max_connections, .. } => f
                .debug_struct("Postgres")
                .field("database_url", &"<redacted>")
                .field("max_connections", max_connections)
                .finish(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub store: StoreSettings,
    pub bind_addr: SocketAddr,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let backend = get("STORE_BACKEND").unwrap_or_else(|| "postgrest".into());
        let store = match backend.to_lowercase().as_str() {
            "postgrest" | "supabase" => StoreSettings::Postgrest {
                url: require("SUPABASE_URL")?.trim_end_matches('/').to_string(),
                key: require("SUPABASE_KEY")?,
            },
            "postgres" => {
                let max_connections = match get("DATABASE_MAX_CONNECTIONS") {
                    Some(v) => v.parse::<u32>().ok().filter(|n| *n > 0).ok_or(ConfigError::Invalid {
                        var: "DATABASE_MAX_CONNECTIONS",
                        value: v,
                    })?,
                    None => DEFAULT_MAX_CONNECTIONS,
                };
                StoreSettings::Postgres {
                    database_url: require("DATABASE_URL")?,
                    max_connections,
                }
            }
            _ => {
                return Err(ConfigError::Invalid {
                    var: "STORE_BACKEND",
                    value: backend,
                })
            }
        };

        let raw_addr = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let bind_addr = raw_addr.parse().map_err(|_| ConfigError::Invalid {
            var: "BIND_ADDR",
            value: raw_addr.clone(),
        })?;

        Ok(Settings { store, bind_addr })
    }
}
