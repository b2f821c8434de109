//! HTTP client for the hosted record service.
//!
//! Uses reqwest with project-id / public-key header auth. Every call is a
//! JSON POST under `{base_url}/records/{table}/...` or
//! `{base_url}/functions/{name}/invoke`, answered with the envelope
//! `{ success, message, data }` (reads) or
//! `{ success, message, results: [{ success, message, data }] }` (writes).

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ListQuery, RecordGateway, RecordKind};
use crate::error::CrmError;
use crate::types::{Config, Fields, RecordId};

/// Response envelope shared by every record service endpoint.
#[derive(Debug, Default, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    results: Option<Vec<RecordResult>>,
}

/// Per-record outcome of a create/update/delete.
#[derive(Debug, Clone, Default, Deserialize)]
struct RecordResult {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

pub struct RemoteGateway {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
    public_key: String,
}

impl RemoteGateway {
    pub fn new(config: &Config) -> Result<Self, CrmError> {
        let parsed = url::Url::parse(&config.base_url).map_err(|e| {
            CrmError::Configuration(format!("Invalid baseUrl '{}': {}", config.base_url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CrmError::Configuration(format!(
                "baseUrl must be http(s), got '{}'",
                parsed.scheme()
            )));
        }
        if config.project_id.trim().is_empty() {
            return Err(CrmError::Configuration("projectId is not set".to_string()));
        }
        let public_key = config
            .public_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| CrmError::Configuration("publicKey is not set".to_string()))?;

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            public_key,
        })
    }

    fn records_url(&self, kind: RecordKind, action: &str) -> String {
        format!("{}/records/{}/{}", self.base_url, kind.table(), action)
    }

    async fn post(&self, url: &str, body: &Value) -> Result<Envelope, CrmError> {
        let resp = self
            .client
            .post(url)
            .header("X-Project-Id", &self.project_id)
            .header("X-Public-Key", &self.public_key)
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| CrmError::Network(format!("Record service request failed: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(CrmError::Remote(format!("HTTP {}: {}", status, text)));
        }

        resp.json::<Envelope>()
            .await
            .map_err(|e| CrmError::Parse(format!("Record service envelope: {}", e)))
    }
}

fn rejected(envelope: &Envelope) -> CrmError {
    CrmError::Remote(
        envelope
            .message
            .clone()
            .unwrap_or_else(|| "request was not successful".to_string()),
    )
}

/// First successful record of a write, logging any per-record failures.
fn first_success(
    kind: RecordKind,
    action: &'static str,
    results: Option<Vec<RecordResult>>,
) -> Option<Value> {
    let results = results?;
    let (ok, failed): (Vec<_>, Vec<_>) = results.into_iter().partition(|r| r.success);
    if !failed.is_empty() {
        log::error!(
            "Failed to {} {} {} record(s)",
            action,
            failed.len(),
            kind
        );
        for record in &failed {
            if let Some(ref message) = record.message {
                log::error!("  {}", message);
            }
        }
    }
    ok.into_iter().find_map(|r| r.data)
}

/// Deletes fail as a whole if any record failed.
fn check_all_succeeded(
    kind: RecordKind,
    results: Option<Vec<RecordResult>>,
) -> Result<(), CrmError> {
    let failed: Vec<RecordResult> = results
        .unwrap_or_default()
        .into_iter()
        .filter(|r| !r.success)
        .collect();
    if failed.is_empty() {
        return Ok(());
    }
    let message = failed
        .iter()
        .filter_map(|r| r.message.clone())
        .collect::<Vec<_>>()
        .join("; ");
    Err(CrmError::PartialFailure {
        kind,
        action: "delete",
        failed: failed.len(),
        message,
    })
}

fn data_as_list(data: Option<Value>) -> Vec<Value> {
    match data {
        Some(Value::Array(items)) => items,
        Some(Value::Null) | None => Vec::new(),
        Some(other) => vec![other],
    }
}

#[async_trait]
impl RecordGateway for RemoteGateway {
    fn backend_tag(&self) -> &'static str {
        "remote"
    }

    async fn list(&self, kind: RecordKind, query: &ListQuery) -> Result<Vec<Value>, CrmError> {
        let envelope = self
            .post(&self.records_url(kind, "fetch"), &query.to_params())
            .await?;
        if !envelope.success {
            return Err(rejected(&envelope));
        }
        Ok(data_as_list(envelope.data))
    }

    async fn get_by_id(&self, kind: RecordKind, id: RecordId) -> Result<Value, CrmError> {
        let mut body = ListQuery::all(kind).to_params();
        body["id"] = json!(id);
        let envelope = self.post(&self.records_url(kind, "get"), &body).await?;
        if !envelope.success {
            if let Some(ref message) = envelope.message {
                log::error!("Fetching {} {} failed: {}", kind, id, message);
            }
            return Err(CrmError::NotFound { kind, id });
        }
        match envelope.data {
            Some(Value::Null) | None => Err(CrmError::NotFound { kind, id }),
            Some(data) => Ok(data),
        }
    }

    async fn create(&self, kind: RecordKind, fields: Fields) -> Result<Option<Value>, CrmError> {
        let body = json!({ "records": [fields] });
        let envelope = self.post(&self.records_url(kind, "create"), &body).await?;
        if !envelope.success {
            return Err(rejected(&envelope));
        }
        Ok(first_success(kind, "create", envelope.results))
    }

    async fn update(
        &self,
        kind: RecordKind,
        id: RecordId,
        mut fields: Fields,
    ) -> Result<Option<Value>, CrmError> {
        fields.insert("Id".to_string(), json!(id));
        let body = json!({ "records": [fields] });
        let envelope = self.post(&self.records_url(kind, "update"), &body).await?;
        if !envelope.success {
            return Err(rejected(&envelope));
        }
        Ok(first_success(kind, "update", envelope.results))
    }

    async fn delete(&self, kind: RecordKind, id: RecordId) -> Result<(), CrmError> {
        let body = json!({ "RecordIds": [id] });
        let envelope = self.post(&self.records_url(kind, "delete"), &body).await?;
        if !envelope.success {
            return Err(rejected(&envelope));
        }
        check_all_succeeded(kind, envelope.results)
    }

    async fn invoke_function(&self, name: &str, payload: Value) -> Result<Value, CrmError> {
        let url = format!("{}/functions/{}/invoke", self.base_url, name);
        let envelope = self.post(&url, &json!({ "body": payload })).await?;
        if !envelope.success {
            return Err(rejected(&envelope));
        }
        Ok(envelope.data.unwrap_or(Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            base_url: "https://records.example.com/v1/".into(),
            project_id: "proj-1".into(),
            public_key: Some("pk-1".into()),
            ..Default::default()
        }
    }

    fn result(success: bool, data: Option<Value>, message: Option<&str>) -> RecordResult {
        RecordResult {
            success,
            message: message.map(str::to_string),
            data,
        }
    }

    #[test]
    fn test_new_normalizes_base_url() {
        let gw = RemoteGateway::new(&config()).unwrap();
        assert_eq!(
            gw.records_url(RecordKind::Deal, "update"),
            "https://records.example.com/v1/records/deal_c/update"
        );
    }

    #[test]
    fn test_new_requires_credentials() {
        let mut c = config();
        c.public_key = None;
        assert!(matches!(
            RemoteGateway::new(&c),
            Err(CrmError::Configuration(_))
        ));

        let mut c = config();
        c.project_id = " ".into();
        assert!(RemoteGateway::new(&c).is_err());

        let mut c = config();
        c.base_url = "ftp://records.example.com".into();
        assert!(RemoteGateway::new(&c).is_err());
    }

    #[test]
    fn test_first_success_picks_successful_record() {
        let results = vec![
            result(false, None, Some("duplicate email")),
            result(true, Some(json!({ "Id": 5 })), None),
        ];
        let data = first_success(RecordKind::Contact, "create", Some(results));
        assert_eq!(data, Some(json!({ "Id": 5 })));
        assert_eq!(first_success(RecordKind::Contact, "create", None), None);
    }

    #[test]
    fn test_delete_fails_on_any_failed_record() {
        assert!(check_all_succeeded(RecordKind::Deal, Some(vec![result(true, None, None)])).is_ok());
        assert!(check_all_succeeded(RecordKind::Deal, None).is_ok());

        let err = check_all_succeeded(
            RecordKind::Deal,
            Some(vec![result(false, None, Some("locked"))]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("locked"));
    }

    #[test]
    fn test_envelope_tolerates_missing_fields() {
        let envelope: Envelope = serde_json::from_value(json!({ "success": true })).unwrap();
        assert!(envelope.success);
        assert!(data_as_list(envelope.data).is_empty());
    }
}
