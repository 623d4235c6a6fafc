//! Google Sheets API client.
//!
//! Authenticates as a service account with the OAuth2 JWT bearer grant and
//! exposes the three `values` calls the sheet backend needs. Access tokens
//! are cached until shortly before they expire.

use crate::core::{now, Error, Result, Timestamp};
use crate::store::config::SheetConfig;
use chrono::Duration as ChronoDuration;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// Default Sheets API base URL.
pub const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com";
/// Default OAuth2 token endpoint.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
/// Read/write access to spreadsheets.
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN_SECS: i64 = 60;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Service account key, as downloaded from the cloud console.
///
/// Unknown fields are ignored. The private key is never serialized.
#[derive(Clone, Serialize, Deserialize)]
pub struct ServiceAccountKey {
    /// Account identity, used as the JWT issuer
    pub client_email: String,
    /// PEM-encoded RSA private key
    #[serde(skip_serializing)]
    pub private_key: String,
    /// Key id, sent as the JWT `kid`
    #[serde(default)]
    pub private_key_id: Option<String>,
    /// Token endpoint
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountKey {
    /// Parse a key from its JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let key: Self = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("service account key is not valid JSON: {}", e)))?;
        if key.client_email.trim().is_empty() {
            return Err(Error::Config("service account key has no client_email".to_string()));
        }
        if key.private_key.trim().is_empty() {
            return Err(Error::Config("service account key has no private_key".to_string()));
        }
        Ok(key)
    }
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

struct CachedToken {
    value: String,
    expires_at: Timestamp,
}

/// Service account token source.
pub struct ServiceAccountAuth {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    client: Client,
    timeout: Duration,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    /// Create a token source. Fails if the private key is not a usable RSA key.
    pub fn new(key: ServiceAccountKey, client: Client, timeout: Duration) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| Error::Config(format!("service account private key is unusable: {}", e)))?;
        Ok(Self {
            key,
            encoding_key,
            client,
            timeout,
            cached: Mutex::new(None),
        })
    }

    /// Account identity.
    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// Signed JWT assertion issued at `at`.
    pub fn assertion(&self, at: Timestamp) -> Result<String> {
        let iat = at.timestamp();
        let claims = Claims {
            iss: self.key.client_email.clone(),
            scope: SHEETS_SCOPE.to_string(),
            aud: self.key.token_uri.clone(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();
        Ok(encode(&header, &claims, &self.encoding_key)?)
    }

    /// A valid access token, exchanging a fresh assertion when needed.
    pub async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        let at = now();
        if let Some(token) = cached.as_ref() {
            if token.expires_at - ChronoDuration::seconds(REFRESH_MARGIN_SECS) > at {
                return Ok(token.value.clone());
            }
        }

        let assertion = self.assertion(at)?;
        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .timeout(self.timeout)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::Auth(format!("token exchange returned HTTP {}: {}", status, body)));
        }

        let token: TokenResponse = serde_json::from_str(&body)?;
        let lifetime = token.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS);
        debug!(client_email = %self.key.client_email, lifetime, "Obtained access token");
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: at + ChronoDuration::seconds(lifetime),
        });
        Ok(token.access_token)
    }
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueUpdate<'a> {
    range: &'a str,
    major_dimension: &'a str,
    values: &'a [Vec<String>],
}

/// Render a cell as the text shown in the sheet.
fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Client for one spreadsheet.
pub struct SheetsClient {
    api_base: Url,
    spreadsheet_id: String,
    worksheet: Option<String>,
    client: Client,
    auth: ServiceAccountAuth,
    timeout: Duration,
}

impl SheetsClient {
    /// Create a client from the sheet configuration.
    pub fn new(config: &SheetConfig) -> Result<Self> {
        if config.spreadsheet_id.trim().is_empty() {
            return Err(Error::Config("spreadsheet id is empty".to_string()));
        }
        let api_base = Url::parse(&config.api_base)
            .map_err(|e| Error::Config(format!("invalid Sheets API base {:?}: {}", config.api_base, e)))?;
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder().build()?;
        let auth = ServiceAccountAuth::new(config.credentials.clone(), client.clone(), timeout)?;

        Ok(Self {
            api_base,
            spreadsheet_id: config.spreadsheet_id.trim().to_string(),
            worksheet: config.worksheet.clone(),
            client,
            auth,
            timeout,
        })
    }

    /// Get the token source.
    pub fn auth(&self) -> &ServiceAccountAuth {
        &self.auth
    }

    /// A1 range on the configured worksheet (the first sheet when unset).
    pub fn range(&self, cells: &str) -> String {
        match &self.worksheet {
            Some(name) => format!("'{}'!{}", name.replace('\'', "''"), cells),
            None => cells.to_string(),
        }
    }

    fn values_url(&self, range: &str, action: Option<&str>) -> Result<Url> {
        let last = match action {
            Some(action) => format!("{}:{}", range, action),
            None => range.to_string(),
        };
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("Sheets API base {} cannot hold a path", self.api_base)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", last.as_str()]);
        Ok(url)
    }

    async fn check(response: reqwest::Response, call: &str) -> Result<String> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::Store(format!("Sheets {} returned HTTP {}: {}", call, status, body)));
        }
        Ok(body)
    }

    /// Read a range as rows of cell text. Trailing empty cells are omitted
    /// by the API, so rows can be ragged.
    pub async fn get_values(&self, range: &str) -> Result<Vec<Vec<String>>> {
        let token = self.auth.access_token().await?;
        let response = self
            .client
            .get(self.values_url(range, None)?)
            .bearer_auth(token)
            .query(&[("majorDimension", "ROWS")])
            .timeout(self.timeout)
            .send()
            .await?;
        let body = Self::check(response, "values.get").await?;
        let range: ValueRange = serde_json::from_str(&body)?;
        Ok(range
            .values
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect())
    }

    /// Overwrite a range with raw (unparsed) values.
    pub async fn update_values(&self, range: &str, values: &[Vec<String>]) -> Result<()> {
        let token = self.auth.access_token().await?;
        let body = ValueUpdate {
            range,
            major_dimension: "ROWS",
            values,
        };
        let response = self
            .client
            .put(self.values_url(range, None)?)
            .bearer_auth(token)
            .query(&[("valueInputOption", "RAW")])
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await?;
        Self::check(response, "values.update").await?;
        debug!(range, rows = values.len(), "Updated sheet values");
        Ok(())
    }

    /// Blank every cell in a range.
    pub async fn clear_values(&self, range: &str) -> Result<()> {
        let token = self.auth.access_token().await?;
        let response = self
            .client
            .post(self.values_url(range, Some("clear"))?)
            .bearer_auth(token)
            .json(&serde_json::json!({}))
            .timeout(self.timeout)
            .send()
            .await?;
        Self::check(response, "values.clear").await?;
        debug!(range, "Cleared sheet values");
        Ok(())
    }
}
