// =============================================================================
// Coinbase Advanced Trade REST Client: candles and product tickers
// =============================================================================
//
// Market-data endpoints are public.  When a CDP API key is configured every
// request additionally carries a short-lived ES256 JWT:
//
//   Authorization: Bearer <jwt>
//   header: { alg: ES256, typ: JWT, kid: <key name>, nonce: <random> }
//   claims: { sub: <key name>, iss: "cdp", nbf: now, exp: now + 120,
//             uri: "<METHOD> <host><path>" }
//
// A fresh token is built for each request; the `uri` claim binds it to that
// request's method, host and path (no query string).
//
// SECURITY: The private key is never logged or serialized.
// =============================================================================

use anyhow::{Context, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use p256::pkcs8::DecodePrivateKey;
use p256::SecretKey;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::env;
use crate::market_data::{Candle, CandleSeries, DataError, Granularity, PriceSource, Ticker};

const DEFAULT_BASE_URL: &str = "https://api.coinbase.com";
const PRODUCTS_PATH: &str = "/api/v3/brokerage/products";

/// Lifetime of a request token.
const JWT_TTL_SECS: i64 = 120;
const JWT_ISSUER: &str = "cdp";

/// The candles endpoint returns at most this many candles per request.
pub const MAX_CANDLES_PER_REQUEST: i64 = 350;

#[derive(Clone)]
struct Credentials {
    key_name: String,
    signing_key: SigningKey,
}

#[derive(Serialize)]
struct JwtHeader<'a> {
    alg: &'static str,
    typ: &'static str,
    kid: &'a str,
    nonce: String,
}

/// Claims carried by a request token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub iss: String,
    pub nbf: i64,
    pub exp: i64,
    pub uri: String,
}

/// Parse a P-256 private key from PEM, SEC1 (`EC PRIVATE KEY`) or PKCS#8.
///
/// Keys pasted into `.env` files often carry literal `\n` sequences; those are
/// turned back into newlines first.
fn parse_signing_key(pem: &str) -> Result<SigningKey> {
    let pem = pem.trim().replace("\\n", "\n");
    let secret = SecretKey::from_sec1_pem(&pem)
        .ok()
        .or_else(|| SecretKey::from_pkcs8_pem(&pem).ok())
        .context("private key is not a PEM-encoded P-256 EC key")?;
    Ok(SigningKey::from(secret))
}

/// Host part of a base URL, as used in the `uri` claim.
fn host_of(base_url: &str) -> &str {
    base_url
        .trim_start_matches("https://")
        .trim_start_matches("http://")
}

/// Coinbase REST client with optional ES256 JWT request authentication.
#[derive(Clone)]
pub struct CoinbaseClient {
    credentials: Option<Credentials>,
    base_url: String,
    client: reqwest::Client,
}

impl CoinbaseClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Unauthenticated client for the public market-data endpoints.
    pub fn public() -> Result<Self> {
        Self::build(None)
    }

    /// Client that authenticates every request with the CDP key `key_name`
    /// and its PEM-encoded EC private key.
    pub fn new(key_name: impl Into<String>, private_key_pem: &str) -> Result<Self> {
        let signing_key = parse_signing_key(private_key_pem)?;
        Self::build(Some(Credentials {
            key_name: key_name.into(),
            signing_key,
        }))
    }

    /// Authenticated client when `COINBASE_KEY_NAME` and `COINBASE_PRIVATE_KEY`
    /// are both set, public otherwise.
    pub fn from_env() -> Result<Self> {
        match (
            env::get_optional("COINBASE_KEY_NAME"),
            env::get_optional("COINBASE_PRIVATE_KEY"),
        ) {
            (Some(name), Some(pem)) => {
                Self::new(name, &pem).context("invalid COINBASE_PRIVATE_KEY")
            }
            (Some(_), None) | (None, Some(_)) => {
                warn!("only one of COINBASE_KEY_NAME / COINBASE_PRIVATE_KEY is set; using public endpoints");
                Self::public()
            }
            (None, None) => Self::public(),
        }
    }

    fn build(credentials: Option<Credentials>) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(default_headers)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("failed to build reqwest client")?;

        debug!(
            base_url = DEFAULT_BASE_URL,
            signed = credentials.is_some(),
            "CoinbaseClient initialised"
        );

        Ok(Self {
            credentials,
            base_url: DEFAULT_BASE_URL.to_string(),
            client,
        })
    }

    /// Point the client at another host (sandbox, local mock).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn is_signed(&self) -> bool {
        self.credentials.is_some()
    }

    // -------------------------------------------------------------------------
    // Request tokens
    // -------------------------------------------------------------------------

    /// Build a signed ES256 JWT for `method path` valid from `now` for
    /// [`JWT_TTL_SECS`]. `None` for a public client.
    pub fn build_jwt(&self, method: &str, path: &str, now: DateTime<Utc>) -> Result<Option<String>> {
        let Some(creds) = &self.credentials else {
            return Ok(None);
        };

        let header = JwtHeader {
            alg: "ES256",
            typ: "JWT",
            kid: &creds.key_name,
            nonce: rand::random::<u64>().to_string(),
        };
        let nbf = now.timestamp();
        let claims = JwtClaims {
            sub: creds.key_name.clone(),
            iss: JWT_ISSUER.to_string(),
            nbf,
            exp: nbf + JWT_TTL_SECS,
            uri: format!("{} {}{}", method, host_of(&self.base_url), path),
        };

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?)
        );
        let signature: Signature = creds.signing_key.sign(signing_input.as_bytes());
        Ok(Some(format!(
            "{signing_input}.{}",
            URL_SAFE_NO_PAD.encode(signature.to_bytes())
        )))
    }

    fn auth_headers(&self, method: &str, path: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(jwt) = self.build_jwt(method, path, Utc::now())? {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {jwt}")).context("JWT is not a valid header value")?,
            );
        }
        Ok(headers)
    }

    // -------------------------------------------------------------------------
    // Requests
    // -------------------------------------------------------------------------

    /// GET `path` (with an optional query string) and return the JSON body.
    #[instrument(skip(self), name = "coinbase::get")]
    async fn get_json(&self, path: &str, query: &str) -> Result<serde_json::Value> {
        let url = if query.is_empty() {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}{}?{}", self.base_url, path, query)
        };

        let resp = self
            .client
            .get(&url)
            .headers(self.auth_headers("GET", path)?)
            .send()
            .await
            .with_context(|| format!("GET {path} request failed"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Coinbase GET {} returned {}: {}", path, status, body.trim());
        }

        resp.json()
            .await
            .with_context(|| format!("failed to parse {path} response"))
    }

    /// GET /api/v3/brokerage/products/{id}/candles for one request window.
    #[instrument(skip(self), name = "coinbase::get_candles")]
    async fn get_candles(
        &self,
        symbol: &str,
        start: i64,
        end: i64,
        granularity: Granularity,
    ) -> Result<serde_json::Value> {
        let path = format!("{PRODUCTS_PATH}/{symbol}/candles");
        let query = format!(
            "start={start}&end={end}&granularity={}",
            granularity.as_api_str()
        );
        self.get_json(&path, &query).await
    }

    /// GET /api/v3/brokerage/products/{id}.
    #[instrument(skip(self), name = "coinbase::get_product")]
    pub async fn get_product(&self, symbol: &str) -> Result<serde_json::Value> {
        self.get_json(&format!("{PRODUCTS_PATH}/{symbol}"), "").await
    }
}

// -----------------------------------------------------------------------------
// Response parsing
// -----------------------------------------------------------------------------

/// Split `[start, end]` (UNIX seconds) into request windows of at most
/// [`MAX_CANDLES_PER_REQUEST`] candles.
pub fn request_windows(start: i64, end: i64, granularity: Granularity) -> Vec<(i64, i64)> {
    let span = MAX_CANDLES_PER_REQUEST * granularity.seconds();
    let mut windows = Vec::new();
    let mut from = start;
    while from < end {
        let to = (from + span).min(end);
        windows.push((from, to));
        from = to;
    }
    windows
}

/// Parse a JSON value that may be either a string or a number into `f64`.
fn parse_str_f64(val: &serde_json::Value) -> Result<f64> {
    if let Some(s) = val.as_str() {
        s.parse::<f64>()
            .with_context(|| format!("failed to parse '{s}' as f64"))
    } else if let Some(n) = val.as_f64() {
        Ok(n)
    } else {
        anyhow::bail!("expected string or number, got: {val}")
    }
}

/// Parse a candles response body (`{"candles": [...]}`, newest first).
pub fn parse_candles(body: &serde_json::Value) -> Result<Vec<Candle>> {
    let raw = body["candles"]
        .as_array()
        .context("candles response missing 'candles' array")?;

    let mut candles = Vec::with_capacity(raw.len());
    for entry in raw {
        let start_secs = parse_str_f64(&entry["start"]).context("candle 'start'")? as i64;
        let start = Utc
            .timestamp_opt(start_secs, 0)
            .single()
            .with_context(|| format!("candle start {start_secs} out of range"))?;
        candles.push(Candle {
            start,
            open: parse_str_f64(&entry["open"]).context("candle 'open'")?,
            high: parse_str_f64(&entry["high"]).context("candle 'high'")?,
            low: parse_str_f64(&entry["low"]).context("candle 'low'")?,
            close: parse_str_f64(&entry["close"]).context("candle 'close'")?,
            volume: parse_str_f64(&entry["volume"]).context("candle 'volume'")?,
        });
    }
    Ok(candles)
}

/// Parse a product response body into a [`Ticker`].
pub fn parse_ticker(symbol: &str, body: &serde_json::Value) -> Result<Ticker> {
    let price = parse_str_f64(&body["price"]).context("product 'price'")?;
    let volume_24h = parse_str_f64(&body["volume_24h"]).unwrap_or(0.0);
    let price_change_24h_pct = parse_str_f64(&body["price_percentage_change_24h"]).unwrap_or(0.0);
    Ok(Ticker {
        symbol: body["product_id"].as_str().unwrap_or(symbol).to_string(),
        price,
        volume_24h,
        price_change_24h_pct,
    })
}

// -----------------------------------------------------------------------------
// PriceSource
// -----------------------------------------------------------------------------

impl PriceSource for CoinbaseClient {
    async fn fetch_candles(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        granularity: Granularity,
    ) -> Result<CandleSeries, DataError> {
        let mut candles = Vec::new();
        for (from, to) in request_windows(start.timestamp(), end.timestamp(), granularity) {
            let body = self
                .get_candles(symbol, from, to, granularity)
                .await
                .map_err(|e| DataError::unavailable(symbol, format!("{e:#}")))?;
            let page = parse_candles(&body).map_err(|e| DataError::malformed(symbol, format!("{e:#}")))?;
            candles.extend(page);
        }

        let series = CandleSeries::from_candles(symbol, candles);
        series
            .validate()
            .map_err(|e| DataError::malformed(symbol, e))?;
        debug!(symbol, granularity = %granularity, count = series.len(), "candles fetched");
        Ok(series)
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, DataError> {
        let body = self
            .get_product(symbol)
            .await
            .map_err(|e| DataError::unavailable(symbol, format!("{e:#}")))?;
        let ticker = parse_ticker(symbol, &body).map_err(|e| DataError::malformed(symbol, format!("{e:#}")))?;
        debug!(symbol, price = ticker.price, "ticker fetched");
        Ok(ticker)
    }
}

impl std::fmt::Debug for CoinbaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoinbaseClient")
            .field("key_name", &self.credentials.as_ref().map(|c| c.key_name.as_str()))
            .field("private_key", &self.credentials.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}
