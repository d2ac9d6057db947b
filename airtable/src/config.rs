//! Client configuration

use crate::error::AirtableError;
use reqwest::Url;

/// Default Airtable REST endpoint
pub const DEFAULT_API_URL: &str = "https://api.airtable.com/v0";

/// Environment variable holding the base id
pub const BASE_ID_VAR: &str = "AIRTABLE_BASE_ID";
/// Environment variable holding the table name
pub const TABLE_NAME_VAR: &str = "AIRTABLE_TABLE_NAME";
/// Environment variable holding the personal access token
pub const TOKEN_VAR: &str = "AIRTABLE_PAT";
/// Optional environment variable overriding [`DEFAULT_API_URL`]
pub const API_URL_VAR: &str = "AIRTABLE_API_URL";

/// Connection settings for one Airtable table
///
/// Built once per session and never mutated afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct AirtableConfig {
    api_url: String,
    base_id: String,
    table_name: String,
    token: String,
}

impl AirtableConfig {
    /// Create a configuration for the public Airtable API
    #[must_use]
    pub fn new(
        base_id: impl Into<String>,
        table_name: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            base_id: base_id.into(),
            table_name: table_name.into(),
            token: token.into(),
        }
    }

    /// Read the configuration from the environment
    ///
    /// # Errors
    ///
    /// Returns [`AirtableError::MissingConfig`] naming the first unset variable.
    pub fn from_env() -> Result<Self, AirtableError> {
        let var = |name: &'static str| {
            std::env::var(name)
                .ok()
                .filter(|value| !value.is_empty())
                .ok_or(AirtableError::MissingConfig(name))
        };

        let config = Self::new(var(BASE_ID_VAR)?, var(TABLE_NAME_VAR)?, var(TOKEN_VAR)?);

        Ok(match var(API_URL_VAR) {
            Ok(api_url) => config.with_api_url(api_url),
            Err(_) => config,
        })
    }

    /// Point the client at another endpoint (proxies, test servers)
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// The API root
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// The bearer token
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The table endpoint: `<api_url>/<base_id>/<table_name>`
    ///
    /// Base id and table name are percent-encoded as path segments.
    ///
    /// # Errors
    ///
    /// Returns [`AirtableError::InvalidUrl`] if the API URL does not parse
    /// or cannot carry a path.
    pub fn table_url(&self) -> Result<Url, AirtableError> {
        let mut url = Url::parse(&self.api_url)
            .map_err(|e| AirtableError::InvalidUrl(format!("{}: {e}", self.api_url)))?;

        url.path_segments_mut()
            .map_err(|()| AirtableError::InvalidUrl(self.api_url.clone()))?
            .pop_if_empty()
            .push(&self.base_id)
            .push(&self.table_name);

        Ok(url)
    }
}

impl std::fmt::Debug for AirtableConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AirtableConfig")
            .field("api_url", &self.api_url)
            .field("base_id", &self.base_id)
            .field("table_name", &self.table_name)
            .field("token", &"<redacted>")
            .finish()
    }
}
