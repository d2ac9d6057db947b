//! Airtable API client implementation

use crate::{
    config::AirtableConfig,
    error::AirtableError,
    query::ListQuery,
    records::{Record, RecordPage, WriteRequest},
};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::{Serialize, de::DeserializeOwned};

/// Airtable client bound to one table
///
/// Holds no state besides the connection pool; every call is independent.
#[derive(Clone, Debug)]
pub struct AirtableClient {
    client: Client,
    config: AirtableConfig,
}

impl AirtableClient {
    /// Create a client from an explicit configuration
    #[must_use]
    pub fn new(config: AirtableConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Create a client configured from the environment
    ///
    /// # Errors
    ///
    /// Returns `AirtableError::MissingConfig` if a required variable is unset
    pub fn from_env() -> Result<Self, AirtableError> {
        Ok(Self::new(AirtableConfig::from_env()?))
    }

    /// The configuration this client was built with
    #[must_use]
    pub const fn config(&self) -> &AirtableConfig {
        &self.config
    }

    /// Full URL of a list request
    ///
    /// # Errors
    ///
    /// Returns `AirtableError::InvalidUrl` if the configured API URL is unusable
    pub fn list_url(&self, query: &ListQuery) -> Result<Url, AirtableError> {
        let mut url = self.config.table_url()?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query.to_pairs() {
                pairs.append_pair(key, &value);
            }
        }
        Ok(url)
    }

    /// List every record matching `query`, following pagination offsets
    ///
    /// # Errors
    ///
    /// Returns `Network` when no response arrives, `Server`/`Http` for non-2xx
    /// statuses and `Decode` for unreadable bodies
    #[tracing::instrument(skip(self), name = "airtable_list")]
    pub async fn list<F>(&self, query: &ListQuery) -> Result<Vec<Record<F>>, AirtableError>
    where
        F: DeserializeOwned,
    {
        let base = self.list_url(query)?;
        let mut records = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let mut url = base.clone();
            if let Some(offset) = &offset {
                url.query_pairs_mut().append_pair("offset", offset);
            }

            // GET carries only the bearer token, no content type
            let request = self.client.get(url).bearer_auth(self.config.token());
            let page: RecordPage<F> = Self::decode(Self::execute(request).await?).await?;

            records.extend(page.records);
            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        tracing::debug!(count = records.len(), "Listed records");
        Ok(records)
    }

    /// Create one record
    ///
    /// # Errors
    ///
    /// Same categories as [`list`](Self::list); an empty response is a `Decode` error
    #[tracing::instrument(skip(self, fields), name = "airtable_create")]
    pub async fn create<F, R>(&self, fields: &F) -> Result<Record<R>, AirtableError>
    where
        F: Serialize,
        R: DeserializeOwned,
    {
        self.write(Method::POST, None, fields).await
    }

    /// Update one record by id, sending only the given fields
    ///
    /// # Errors
    ///
    /// Same categories as [`create`](Self::create)
    #[tracing::instrument(skip(self, fields), name = "airtable_update")]
    pub async fn update<F, R>(&self, id: &str, fields: &F) -> Result<Record<R>, AirtableError>
    where
        F: Serialize,
        R: DeserializeOwned,
    {
        self.write(Method::PATCH, Some(id), fields).await
    }

    async fn write<F, R>(
        &self,
        method: Method,
        id: Option<&str>,
        fields: &F,
    ) -> Result<Record<R>, AirtableError>
    where
        F: Serialize,
        R: DeserializeOwned,
    {
        let request = self
            .client
            .request(method, self.config.table_url()?)
            .bearer_auth(self.config.token())
            .json(&WriteRequest::new(id, fields));

        let page: RecordPage<R> = Self::decode(Self::execute(request).await?).await?;

        page.records
            .into_iter()
            .next()
            .ok_or_else(|| AirtableError::Decode("response contained no records".to_string()))
    }

    async fn execute(request: RequestBuilder) -> Result<Response, AirtableError> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!(error = %e, "Airtable request failed without a response");
            AirtableError::Network(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), "Airtable request rejected");
        Err(AirtableError::from_status(status.as_u16(), body))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, AirtableError> {
        response.json::<T>().await.map_err(|e| {
            if e.is_decode() {
                AirtableError::Decode(e.to_string())
            } else {
                AirtableError::Network(e.to_string())
            }
        })
    }
}
