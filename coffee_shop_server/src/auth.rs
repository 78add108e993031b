//! Bearer token verification.
//!
//! Access tokens are RS256-signed JWTs issued by Auth0. They are verified against the public keys that Auth0 publishes
//! at `https://<domain>/.well-known/jwks.json`. The key set is fetched on first use and shared by every worker. It is
//! only fetched again when a token names a key id we have not seen, and then at most once per refresh interval. A
//! failed fetch does not count, so the next request that needs the keys tries again.
use std::{
    collections::HashMap,
    fmt::Debug,
    time::{Duration, Instant},
};

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use futures::future::{ready, Ready};
use jwt_compact::{alg::Rsa, AlgorithmExt, TimeOptions, UntrustedToken, ValidationError};
use log::*;
use rsa::{BigUint, RsaPublicKey};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

//-------------------------------------------------  Claims  -----------------------------------------------------------
/// The `aud` claim can be a single string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Self::One(a) => a == audience,
            Self::Many(list) => list.iter().any(|a| a == audience),
        }
    }
}

/// The custom claims we care about in an Auth0 access token. `exp` is handled by `jwt_compact` itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
}

/// A caller whose token has been verified, together with the permissions it was granted.
///
/// The permission guard stores this in the request extensions, so handlers behind the guard can take it as an
/// argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedUser {
    pub subject: String,
    pub permissions: Vec<String>,
}

impl AuthorizedUser {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

impl TryFrom<AccessClaims> for AuthorizedUser {
    type Error = AuthError;

    fn try_from(claims: AccessClaims) -> Result<Self, Self::Error> {
        let permissions = claims.permissions.ok_or(AuthError::PermissionsClaimMissing)?;
        let subject = claims.sub.unwrap_or_else(|| "anonymous".to_string());
        Ok(Self { subject, permissions })
    }
}

impl FromRequest for AuthorizedUser {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user = req.extensions().get::<AuthorizedUser>().cloned().ok_or_else(|| {
            warn!("🔐️ No authorized user found in request extensions. Is the route missing a permission guard?");
            ServerError::Unspecified("No authorized user found in request".to_string())
        });
        ready(user)
    }
}

//-------------------------------------------------  Header  -----------------------------------------------------------
/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn extract_bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::AuthHeaderMissing)?;
    let parts = header.split_whitespace().collect::<Vec<_>>();
    match parts.as_slice() {
        [scheme, token] if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        [scheme, ..] if !scheme.eq_ignore_ascii_case("bearer") => {
            Err(AuthError::AuthHeaderMalformed("Authorization header must start with \"Bearer\".".into()))
        },
        [] | [_] => Err(AuthError::AuthHeaderMalformed("Token not found.".into())),
        _ => Err(AuthError::AuthHeaderMalformed("Authorization header must be bearer token.".into())),
    }
}

/// Fails with [`AuthError::PermissionNotFound`] unless `permission` was granted.
pub fn check_permission(user: &AuthorizedUser, permission: &str) -> Result<(), AuthError> {
    if user.has_permission(permission) {
        Ok(())
    } else {
        Err(AuthError::PermissionNotFound(permission.to_string()))
    }
}

//-------------------------------------------------  KeySet  -----------------------------------------------------------
/// RSA verification keys, indexed by key id (`kid`).
#[derive(Clone, Default)]
pub struct KeySet {
    keys: HashMap<String, RsaPublicKey>,
}

impl Debug for KeySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.keys.keys()).finish()
    }
}

#[derive(Deserialize)]
struct JwksDocument {
    keys: Vec<JsonWebKey>,
}

#[derive(Deserialize)]
struct JsonWebKey {
    kty: String,
    kid: Option<String>,
    n: Option<String>,
    e: Option<String>,
    #[serde(rename = "use")]
    usage: Option<String>,
}

impl KeySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<S: Into<String>>(&mut self, kid: S, key: RsaPublicKey) {
        self.keys.insert(kid.into(), key);
    }

    pub fn get(&self, kid: &str) -> Option<&RsaPublicKey> {
        self.keys.get(kid)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Parses a JSON Web Key Set document. Keys that are not RSA signing keys, or that have no key id, are skipped.
    pub fn from_jwks_json(json: &str) -> Result<Self, AuthError> {
        let doc = serde_json::from_str::<JwksDocument>(json)
            .map_err(|e| AuthError::KeySetUnavailable(format!("Invalid key set document. {e}")))?;
        let mut set = Self::new();
        for jwk in doc.keys {
            if jwk.kty != "RSA" || jwk.usage.as_deref().is_some_and(|u| u != "sig") {
                trace!("🔐️ Skipping {} key {:?}", jwk.kty, jwk.kid);
                continue;
            }
            let (Some(kid), Some(n), Some(e)) = (jwk.kid, jwk.n, jwk.e) else {
                debug!("🔐️ Skipping incomplete RSA key in key set");
                continue;
            };
            match rsa_key_from_components(&n, &e) {
                Ok(key) => set.insert(kid, key),
                Err(err) => warn!("🔐️ Ignoring signing key {kid}. {err}"),
            }
        }
        Ok(set)
    }
}

fn rsa_key_from_components(n: &str, e: &str) -> Result<RsaPublicKey, String> {
    let decode = |s: &str| {
        base64::decode_config(s.trim_end_matches('='), base64::URL_SAFE_NO_PAD).map_err(|e| format!("{e}"))
    };
    let n = BigUint::from_bytes_be(&decode(n)?);
    let e = BigUint::from_bytes_be(&decode(e)?);
    RsaPublicKey::new(n, e).map_err(|e| format!("Invalid RSA key. {e}"))
}

//-------------------------------------------------  KeyStore  ---------------------------------------------------------
const JWKS_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

struct CachedKeys {
    keys: KeySet,
    /// When the key set was last fetched successfully. Failed fetches leave this alone.
    last_fetch: Option<Instant>,
}

/// A process-wide cache of the identity provider's signing keys.
pub struct KeyStore {
    jwks_url: Option<String>,
    client: reqwest::Client,
    refresh_interval: Duration,
    cache: RwLock<CachedKeys>,
    // Held for the duration of a fetch, so only one request talks to the provider at a time
    refresh_lock: Mutex<()>,
}

impl KeyStore {
    /// A key store that fetches keys from `jwks_url` when needed.
    pub fn remote<S: Into<String>>(jwks_url: S, refresh_interval: Duration) -> Self {
        let client = reqwest::Client::builder().timeout(JWKS_FETCH_TIMEOUT).build().unwrap_or_else(|e| {
            warn!("🔐️ Could not configure the key set client. Using the defaults. {e}");
            reqwest::Client::new()
        });
        Self {
            jwks_url: Some(jwks_url.into()),
            client,
            refresh_interval,
            cache: RwLock::new(CachedKeys { keys: KeySet::new(), last_fetch: None }),
            refresh_lock: Mutex::new(()),
        }
    }

    /// A key store that only ever knows the given keys.
    pub fn fixed(keys: KeySet) -> Self {
        Self {
            jwks_url: None,
            client: reqwest::Client::new(),
            refresh_interval: Duration::MAX,
            cache: RwLock::new(CachedKeys { keys, last_fetch: Some(Instant::now()) }),
            refresh_lock: Mutex::new(()),
        }
    }

    pub async fn key_for(&self, kid: &str) -> Result<RsaPublicKey, AuthError> {
        if let Some(key) = self.cached_key(kid).await? {
            return Ok(key);
        }
        let _refreshing = self.refresh_lock.lock().await;
        // Another request may have refreshed the keys while we waited
        if let Some(key) = self.cached_key(kid).await? {
            return Ok(key);
        }
        self.refresh().await?;
        self.cache.read().await.keys.get(kid).cloned().ok_or(AuthError::KeyNotFound)
    }

    /// `Ok(None)` means the key is unknown and a refresh is due.
    async fn cached_key(&self, kid: &str) -> Result<Option<RsaPublicKey>, AuthError> {
        let cache = self.cache.read().await;
        if let Some(key) = cache.keys.get(kid) {
            return Ok(Some(key.clone()));
        }
        if !self.refresh_due(&cache) {
            debug!("🔐️ Unknown signing key {kid}");
            return Err(AuthError::KeyNotFound);
        }
        Ok(None)
    }

    fn refresh_due(&self, cache: &CachedKeys) -> bool {
        self.jwks_url.is_some() && cache.last_fetch.map(|t| t.elapsed() >= self.refresh_interval).unwrap_or(true)
    }

    async fn refresh(&self) -> Result<(), AuthError> {
        let Some(url) = &self.jwks_url else {
            return Ok(());
        };
        debug!("🔐️ Fetching signing keys from {url}");
        match self.fetch(url).await {
            Ok(keys) => {
                info!("🔐️ Loaded {} signing keys: {keys:?}", keys.len());
                let mut cache = self.cache.write().await;
                cache.keys = keys;
                cache.last_fetch = Some(Instant::now());
                Ok(())
            },
            Err(e) => {
                warn!("🔐️ Could not refresh the signing keys. {e:?}");
                Err(e)
            },
        }
    }

    async fn fetch(&self, url: &str) -> Result<KeySet, AuthError> {
        let body = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|e| AuthError::KeySetUnavailable(e.to_string()))?
            .text()
            .await
            .map_err(|e| AuthError::KeySetUnavailable(e.to_string()))?;
        KeySet::from_jwks_json(&body)
    }
}

//-------------------------------------------------  TokenAuthority  ---------------------------------------------------
/// Verifies access tokens and checks their permissions. A single instance is shared by every worker.
pub struct TokenAuthority {
    issuer: String,
    audience: String,
    keys: KeyStore,
}

impl Debug for TokenAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TokenAuthority (iss: {}, aud: {})", self.issuer, self.audience)
    }
}

impl TokenAuthority {
    pub fn new(config: &AuthConfig) -> Self {
        let keys = KeyStore::remote(config.jwks_url(), config.jwks_refresh_interval);
        Self { issuer: config.issuer(), audience: config.audience.clone(), keys }
    }

    pub fn with_keys<S1: Into<String>, S2: Into<String>>(issuer: S1, audience: S2, keys: KeyStore) -> Self {
        Self { issuer: issuer.into(), audience: audience.into(), keys }
    }

    /// Runs the full pipeline for a request: header, token, permissions claim and the required permission.
    pub async fn authorize(&self, auth_header: Option<&str>, permission: &str) -> Result<AuthorizedUser, AuthError> {
        let token = extract_bearer_token(auth_header)?;
        let claims = self.verify_token(token).await?;
        let user = AuthorizedUser::try_from(claims)?;
        check_permission(&user, permission)?;
        trace!("🔐️ {} holds {permission}", user.subject);
        Ok(user)
    }

    /// Checks the token's signature, expiry, issuer and audience, and returns its claims.
    pub async fn verify_token(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let untrusted = UntrustedToken::new(token).map_err(|e| AuthError::MalformedToken(e.to_string()))?;
        let kid = untrusted
            .header()
            .key_id
            .clone()
            .ok_or_else(|| AuthError::MalformedToken("The token header has no key id.".into()))?;
        let key = self.keys.key_for(&kid).await?;
        let token = Rsa::rs256()
            .validator::<AccessClaims>(&key)
            .validate(&untrusted)
            .map_err(|e| AuthError::InvalidSignature(e.to_string()))?;
        let (_, claims) = token.into_parts();
        claims.validate_expiration(&TimeOptions::default()).map_err(|e| match e {
            ValidationError::Expired => AuthError::TokenExpired,
            e => AuthError::InvalidClaims(e.to_string()),
        })?;
        let claims = claims.custom;
        if claims.iss.as_deref() != Some(self.issuer.as_str()) {
            debug!("🔐️ Token issuer {:?} does not match {}", claims.iss, self.issuer);
            return Err(AuthError::InvalidClaims("Unexpected issuer.".into()));
        }
        if !claims.aud.as_ref().is_some_and(|aud| aud.contains(&self.audience)) {
            debug!("🔐️ Token audience {:?} does not include {}", claims.aud, self.audience);
            return Err(AuthError::InvalidClaims("Unexpected audience.".into()));
        }
        Ok(claims)
    }
}
