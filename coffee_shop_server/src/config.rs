use std::{env, time::Duration};

use log::*;

const DEFAULT_CSA_HOST: &str = "127.0.0.1";
const DEFAULT_CSA_PORT: u16 = 5000;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/coffee_shop.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_AUTH0_DOMAIN: &str = "coffeeclub.us.auth0.com";
const DEFAULT_API_AUDIENCE: &str = "drinks";
const DEFAULT_JWKS_REFRESH_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    /// If true, every drink is deleted on start-up and the menu is seeded with a single drink. **DANGER**
    pub reset_database: bool,
    pub auth: AuthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_CSA_HOST.to_string(),
            port: DEFAULT_CSA_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            reset_database: false,
            auth: AuthConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("CSA_HOST").ok().unwrap_or_else(|| DEFAULT_CSA_HOST.into());
        let port = env::var("CSA_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for CSA_PORT. {e} Using the default, {DEFAULT_CSA_PORT}, instead."
                    );
                    DEFAULT_CSA_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_CSA_PORT);
        let database_url = env::var("CSA_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ CSA_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.into()
        });
        let max_connections = env::var("CSA_DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| {
                s.parse::<u32>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for CSA_DB_MAX_CONNECTIONS. {e}"))
                    .ok()
            })
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);
        let reset_database = env::var("CSA_RESET_DATABASE").map(|s| &s == "1" || &s == "true").unwrap_or(false);
        if reset_database {
            warn!("🚨️ CSA_RESET_DATABASE is set. All drinks will be deleted when the server starts. 🚨️");
        }
        let auth = AuthConfig::from_env_or_default();
        Self { host, port, database_url, max_connections, reset_database, auth }
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
/// Identity provider settings. Access tokens are issued by Auth0; this server only verifies them.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The Auth0 tenant domain, e.g. `my-shop.us.auth0.com`. Tokens must be issued by `https://<domain>/`.
    pub domain: String,
    /// The API identifier that tokens must be issued for (the `aud` claim).
    pub audience: String,
    /// The minimum time between two fetches of the signing key set.
    pub jwks_refresh_interval: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            domain: DEFAULT_AUTH0_DOMAIN.to_string(),
            audience: DEFAULT_API_AUDIENCE.to_string(),
            jwks_refresh_interval: DEFAULT_JWKS_REFRESH_INTERVAL,
        }
    }
}

impl AuthConfig {
    pub fn from_env_or_default() -> Self {
        let domain = env::var("CSA_AUTH0_DOMAIN").ok().unwrap_or_else(|| {
            warn!("🪛️ CSA_AUTH0_DOMAIN is not set. Using the default, {DEFAULT_AUTH0_DOMAIN}.");
            DEFAULT_AUTH0_DOMAIN.into()
        });
        let audience = env::var("CSA_API_AUDIENCE").ok().unwrap_or_else(|| {
            info!("🪛️ CSA_API_AUDIENCE is not set. Using the default, {DEFAULT_API_AUDIENCE}.");
            DEFAULT_API_AUDIENCE.into()
        });
        let jwks_refresh_interval = env::var("CSA_JWKS_REFRESH_INTERVAL")
            .map_err(|_| {
                info!(
                    "🪛️ CSA_JWKS_REFRESH_INTERVAL is not set. Using the default value of {}s.",
                    DEFAULT_JWKS_REFRESH_INTERVAL.as_secs()
                )
            })
            .and_then(|s| {
                s.parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|e| warn!("🪛️ Invalid configuration value for CSA_JWKS_REFRESH_INTERVAL. {e}"))
            })
            .ok()
            .unwrap_or(DEFAULT_JWKS_REFRESH_INTERVAL);
        Self { domain: normalize_domain(&domain), audience, jwks_refresh_interval }
    }

    /// The expected value of the `iss` claim
    pub fn issuer(&self) -> String {
        format!("https://{}/", self.domain)
    }

    /// Where the identity provider publishes its public signing keys
    pub fn jwks_url(&self) -> String {
        format!("https://{}/.well-known/jwks.json", self.domain)
    }
}

/// Accepts `https://tenant.auth0.com/` as well as the bare `tenant.auth0.com`.
fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_start_matches("https://").trim_start_matches("http://").trim_end_matches('/').to_string()
}
