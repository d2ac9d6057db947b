//! # Airtable Client
//!
//! Minimal client for the Airtable REST API: list (sorted, filtered,
//! paginated), create one record, update one record.
//!
//! ## Example
//!
//! ```no_run
//! use tabletodo_airtable::{AirtableClient, ListQuery, Record, SortDirection};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct Fields {
//!     title: String,
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Reads AIRTABLE_BASE_ID, AIRTABLE_TABLE_NAME and AIRTABLE_PAT
//! let client = AirtableClient::from_env()?;
//!
//! let query = ListQuery::default().sorted_by("createdTime", SortDirection::Desc);
//! let records: Vec<Record<Fields>> = client.list(&query).await?;
//!
//! for record in records {
//!     println!("{}: {}", record.id, record.fields.title);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! Failures keep their category: [`AirtableError::Network`] when no response
//! arrived, [`AirtableError::Server`] for 5xx, [`AirtableError::Http`] for any
//! other non-2xx status.

pub mod client;
pub mod config;
pub mod error;
pub mod query;
pub mod records;

// Re-export main types for convenience
pub use client::AirtableClient;
pub use config::AirtableConfig;
pub use error::AirtableError;
pub use query::{ListQuery, SortDirection, string_literal};
pub use records::Record;
