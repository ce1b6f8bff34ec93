//! Supabase (PostgREST) source store client.

use std::fmt;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{AssemblyRecord, ComponentRecord, SourceStore};
use crate::error::{Error, Result};
use crate::util::{compact_text, is_http_url, normalize_text_option};

const ASSEMBLIES_TABLE: &str = "bom_assemblies";
const COMPONENTS_TABLE: &str = "bom_components";

/// Blocking client for the BOM tables exposed through Supabase's REST API
#[derive(Clone)]
pub struct SupabaseSource {
    rest_url: String,
    api_key: String,
    client: Client,
}

impl fmt::Debug for SupabaseSource {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SupabaseSource")
            .field("rest_url", &self.rest_url)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl SupabaseSource {
    pub fn new(url: &str, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let rest_url = normalize_rest_url(url)?;
        let api_key = normalize_text_option(Some(api_key.into())).ok_or_else(|| {
            Error::InvalidInput("Supabase API key must not be empty".to_string())
        })?;

        Ok(Self {
            rest_url,
            api_key,
            client: Client::builder().timeout(timeout).build()?,
        })
    }

    /// Base REST endpoint, e.g. `https://project.supabase.co/rest/v1`
    pub fn rest_url(&self) -> &str {
        &self.rest_url
    }

    fn table_request(&self, table: &str) -> RequestBuilder {
        self.client
            .get(format!("{}/{table}", self.rest_url))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
    }

    fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Vec<T>> {
        let response = request.send()?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(Error::Source(parse_api_error(status, &body)));
        }
        // PostgREST answers `null` rather than `[]` for some empty selections
        let rows: Option<Vec<T>> = response.json()?;
        Ok(rows.unwrap_or_default())
    }
}

impl SourceStore for SupabaseSource {
    fn list_assemblies(&self) -> Result<Vec<AssemblyRecord>> {
        let request = self
            .table_request(ASSEMBLIES_TABLE)
            .query(&[("select", "*"), ("order", "bom_level")]);
        let assemblies: Vec<AssemblyRecord> = self.fetch(request)?;
        tracing::debug!("Fetched {} assemblies from source", assemblies.len());
        Ok(assemblies)
    }

    fn list_components(&self, assembly_id: &str) -> Result<Vec<ComponentRecord>> {
        let filter = format!("eq.{assembly_id}");
        let request = self
            .table_request(COMPONENTS_TABLE)
            .query(&[("select", "*"), ("assembly_id", filter.as_str())]);
        self.fetch(request)
    }
}

/// Accepts a project URL (`https://x.supabase.co`) or a REST URL
/// (`https://x.supabase.co/rest/v1`) and returns the REST URL.
pub fn normalize_rest_url(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("Supabase URL must not be empty".to_string()));
    }
    if !is_http_url(trimmed) {
        return Err(Error::InvalidInput(
            "Supabase URL must include http:// or https://".to_string(),
        ));
    }

    if trimmed.ends_with("/rest/v1") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}/rest/v1"))
    }
}

#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    message: Option<String>,
    hint: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<PostgrestErrorBody>(body) {
        if let Some(message) = payload.message {
            return match payload.hint {
                Some(hint) => format!("{} ({}; hint: {})", message.trim(), status.as_u16(), hint),
                None => format!("{} ({})", message.trim(), status.as_u16()),
            };
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}
