// # 1cloud.ru DNS Client
//
// Thin client for the three 1cloud.ru DNS API calls the hook needs:
//
// - List zones: GET `/Dns`
// - Create TXT record: POST `/dns/recordtxt`
// - Delete record: DELETE `/dns/{zoneID}/{recordID}`
//
// Every call is a single synchronous step in the hook pipeline: no retries,
// no backoff, no caching. Any transport or decode failure is propagated and
// aborts the whole invocation.
//
// ## Security
//
// The API token never appears in logs; the Debug implementation redacts it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use acme_hook_core::{Error, Result};

/// 1cloud.ru API base URL
const ONECLOUD_API_BASE: &str = "https://api.1cloud.ru";

/// Fixed HTTP timeout for API requests (10 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

const PROVIDER: &str = "1cloud";

/// A hosted zone as returned by `GET /Dns`.
///
/// The API reports many more fields (linked records, delegation state);
/// only the id and the name are consumed.
#[derive(Debug, Clone, Deserialize)]
pub struct Zone {
    /// Numeric zone id
    #[serde(rename = "ID")]
    pub id: u64,
    /// Zone name as registered with the provider
    #[serde(rename = "Name")]
    pub name: String,
}

/// Request body for `POST /dns/recordtxt`.
///
/// The API takes the numeric fields as JSON strings; the constructor keeps
/// that quirk out of the callers.
#[derive(Debug, Clone, Serialize)]
pub struct CreateTxtRecord {
    #[serde(rename = "DomainId")]
    domain_id: String,
    #[serde(rename = "HostName")]
    host_name: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "TTL")]
    ttl: String,
    #[serde(rename = "Text")]
    text: String,
}

impl CreateTxtRecord {
    /// Build a TXT record request for a zone.
    pub fn new(zone_id: u64, host: &str, name: &str, ttl: u32, text: &str) -> Self {
        Self {
            domain_id: zone_id.to_string(),
            host_name: host.to_string(),
            name: name.to_string(),
            ttl: ttl.to_string(),
            text: text.to_string(),
        }
    }
}

/// Created-record response for `POST /dns/recordtxt`.
///
/// The API echoes the full record; a missing id deserializes to 0 and is
/// treated as "no usable id in the response".
#[derive(Debug, Deserialize)]
struct TxtRecordResponse {
    #[serde(rename = "ID", default)]
    id: u64,
}

/// Client for the 1cloud.ru DNS API.
///
/// One instance per hook invocation; the underlying `reqwest::Client` is
/// built once with the fixed request timeout.
pub struct OneCloudClient {
    /// 1cloud.ru API token. Never logged.
    api_token: String,
    base_url: String,
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for OneCloudClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OneCloudClient")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl OneCloudClient {
    /// Create a client for the production API.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an empty token.
    pub fn new(api_token: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_token, ONECLOUD_API_BASE)
    }

    /// Create a client against an explicit base URL (used by tests).
    pub fn with_base_url(api_token: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("1cloud API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_token,
            base_url: base_url.into(),
            client,
        })
    }

    /// Fetch the full zone list.
    ///
    /// The API returns a bare JSON array of zone objects.
    pub async fn list_zones(&self) -> Result<Vec<Zone>> {
        let url = format!("{}/Dns", self.base_url);
        tracing::debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| Error::http(format!("zone list request failed: {e}")))?;

        let response = check_status(response, "zone list")?;

        response
            .json()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("failed to decode zone list: {e}")))
    }

    /// Resolve a zone name to its numeric id via a linear scan of the
    /// zone list. Exact name match only.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the zone list has no such name.
    pub async fn resolve_zone_id(&self, name: &str) -> Result<u64> {
        let zones = self.list_zones().await?;
        zone_id_by_name(&zones, name)
    }

    /// Create a TXT record, returning the provider-assigned record id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the response carries no usable id.
    pub async fn create_txt_record(&self, req: &CreateTxtRecord) -> Result<u64> {
        let url = format!("{}/dns/recordtxt", self.base_url);
        tracing::debug!("POST {url} (host {}, name {})", req.host_name, req.name);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .json(req)
            .send()
            .await
            .map_err(|e| Error::http(format!("create record request failed: {e}")))?;

        let response = check_status(response, "create record")?;

        let record: TxtRecordResponse = response
            .json()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("failed to decode created record: {e}")))?;

        if record.id == 0 {
            return Err(Error::not_found("create response contained no record id"));
        }

        tracing::debug!("created TXT record {}", record.id);
        Ok(record.id)
    }

    /// Delete a record by zone id and record id. Success iff the response
    /// status is OK; the response body is not consumed.
    pub async fn delete_txt_record(&self, zone_id: u64, record_id: u64) -> Result<()> {
        let url = format!("{}/dns/{zone_id}/{record_id}", self.base_url);
        tracing::debug!("DELETE {url}");

        let response = self
            .client
            .delete(&url)
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| Error::http(format!("delete record request failed: {e}")))?;

        check_delete_status(response.status())?;

        tracing::debug!("deleted record {record_id} in zone {zone_id}");
        Ok(())
    }
}

/// Exact-name scan of a zone list.
fn zone_id_by_name(zones: &[Zone], name: &str) -> Result<u64> {
    zones
        .iter()
        .find(|z| z.name == name)
        .map(|z| z.id)
        .ok_or_else(|| Error::not_found(format!("zone {name:?} not in provider zone list")))
}

/// Map a non-success status to the hook error taxonomy.
fn check_status(response: reqwest::Response, step: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    Err(status_error(status, step))
}

/// The delete endpoint signals success with 200 only; any other status,
/// 2xx included, is an error carrying that status.
fn check_delete_status(status: reqwest::StatusCode) -> Result<()> {
    if status == reqwest::StatusCode::OK {
        Ok(())
    } else {
        Err(status_error(status, "delete record"))
    }
}

fn status_error(status: reqwest::StatusCode, step: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(format!("{step}: provider rejected the API token ({status})")),
        404 => Error::not_found(format!("{step}: {status}")),
        _ => Error::provider(PROVIDER, format!("{step}: status {status}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_token_is_config_error() {
        assert!(matches!(
            OneCloudClient::new(""),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_api_token_not_exposed_in_debug() {
        let client = OneCloudClient::new("secret_token_12345").unwrap();
        let debug_str = format!("{client:?}");
        assert!(!debug_str.contains("secret_token_12345"));
        assert!(debug_str.contains("OneCloudClient"));
    }

    #[test]
    fn test_create_payload_wire_format() {
        // the API expects string-typed DomainId and TTL
        let req = CreateTxtRecord::new(25017, "@", "_acme-challenge", 30, "token-value");
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "DomainId": "25017",
                "HostName": "@",
                "Name": "_acme-challenge",
                "TTL": "30",
                "Text": "token-value",
            })
        );
    }

    #[test]
    fn test_zone_list_tolerates_extra_fields() {
        let body = r#"[
            {"ID": 101, "Name": "example.com", "State": "Active", "IsDelegate": true,
             "LinkedRecords": [{"ID": 9, "TypeRecord": "TXT"}]},
            {"ID": 102, "Name": "example.org"}
        ]"#;

        let zones: Vec<Zone> = serde_json::from_str(body).unwrap();
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].id, 101);
        assert_eq!(zones[0].name, "example.com");
    }

    #[test]
    fn test_delete_requires_status_ok_exactly() {
        use reqwest::StatusCode;

        assert!(check_delete_status(StatusCode::OK).is_ok());
        // other 2xx statuses do not count as success for delete
        assert!(matches!(
            check_delete_status(StatusCode::NO_CONTENT),
            Err(Error::Provider { .. })
        ));
        assert!(matches!(
            check_delete_status(StatusCode::FORBIDDEN),
            Err(Error::Authentication(_))
        ));
        assert!(matches!(
            check_delete_status(StatusCode::NOT_FOUND),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_zone_resolution_exact_match_only() {
        let zones = vec![
            Zone {
                id: 101,
                name: "example.com".to_string(),
            },
            Zone {
                id: 102,
                name: "sub.example.com".to_string(),
            },
        ];

        assert_eq!(zone_id_by_name(&zones, "example.com").unwrap(), 101);
        assert!(matches!(
            zone_id_by_name(&zones, "example.org"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_missing_record_id_deserializes_to_zero() {
        let record: TxtRecordResponse =
            serde_json::from_str(r#"{"TypeRecord": "TXT", "Text": "abc"}"#).unwrap();
        assert_eq!(record.id, 0);
    }
}
