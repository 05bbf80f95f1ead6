use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use time::OffsetDateTime;

use crate::dao::{
    models::{NewRegistrationEntity, RegistrationRecord},
    registration_store::RegistrationStore,
    storage::StorageResult,
};

use super::{
    config::SheetConfig,
    error::{SheetDaoError, SheetResult},
};

const ACTION_REGISTER: &str = "register";
const ACTION_UPDATE_STATUS: &str = "updateStatus";
const ACTION_UPDATE_DOMAIN: &str = "updateDomain";
const ACTION_CHECK_IN: &str = "eventCheckIn";
const ACTION_SEND_CERTIFICATE: &str = "sendCertificate";
const ACTION_LIST: &str = "list";

/// Reply envelope returned by every POST action of the script.
#[derive(Debug, Deserialize)]
struct ActionReply {
    result: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    id: Option<String>,
}

/// [`RegistrationStore`] backed by the spreadsheet script web app.
#[derive(Clone)]
pub struct SheetRegistrationStore {
    client: Client,
    script_url: Arc<str>,
}

impl SheetRegistrationStore {
    /// Build the HTTP client for the configured script.
    pub fn connect(config: SheetConfig) -> SheetResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|source| SheetDaoError::ClientBuilder { source })?;

        Ok(Self {
            client,
            script_url: Arc::from(config.script_url),
        })
    }

    async fn post_action(&self, action: &str, payload: Value) -> SheetResult<ActionReply> {
        let response = self
            .client
            .post(self.script_url.as_ref())
            .json(&payload)
            .send()
            .await
            .map_err(|source| SheetDaoError::RequestSend {
                action: action.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(SheetDaoError::RequestStatus {
                action: action.to_string(),
                status: response.status(),
            });
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|source| SheetDaoError::DecodeResponse {
                action: action.to_string(),
                source,
            })?;

        parse_action_reply(action, body)
    }

    async fn fetch_rows(&self) -> SheetResult<Vec<RegistrationRecord>> {
        // Cache buster: the script deployment sits behind an aggressive CDN.
        let cache_buster = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        let response = self
            .client
            .get(self.script_url.as_ref())
            .query(&[("t", cache_buster.to_string())])
            .send()
            .await
            .map_err(|source| SheetDaoError::RequestSend {
                action: ACTION_LIST.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(SheetDaoError::RequestStatus {
                action: ACTION_LIST.to_string(),
                status: response.status(),
            });
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|source| SheetDaoError::DecodeResponse {
                action: ACTION_LIST.to_string(),
                source,
            })?;

        parse_rows(body)
    }
}

/// Interpret the `{result, message, id}` envelope of a POST action.
fn parse_action_reply(action: &str, body: Value) -> SheetResult<ActionReply> {
    let reply: ActionReply =
        serde_json::from_value(body).map_err(|err| SheetDaoError::UnexpectedPayload {
            action: action.to_string(),
            detail: err.to_string(),
        })?;

    if reply.result == "success" {
        Ok(reply)
    } else {
        Err(SheetDaoError::ScriptError {
            action: action.to_string(),
            message: reply
                .message
                .unwrap_or_else(|| format!("result `{}`", reply.result)),
        })
    }
}

/// Interpret the bulk read payload: an array of header-keyed rows, or `{error}`.
fn parse_rows(body: Value) -> SheetResult<Vec<RegistrationRecord>> {
    match body {
        Value::Array(rows) => rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| {
                serde_json::from_value(row).map_err(|err| SheetDaoError::UnexpectedPayload {
                    action: ACTION_LIST.to_string(),
                    detail: format!("row {}: {err}", index + 2),
                })
            })
            .collect(),
        Value::Object(map) => match map.get("error") {
            Some(error) => Err(SheetDaoError::ScriptError {
                action: ACTION_LIST.to_string(),
                message: error.as_str().unwrap_or("unknown error").to_string(),
            }),
            None => Err(SheetDaoError::UnexpectedPayload {
                action: ACTION_LIST.to_string(),
                detail: "expected an array of rows".into(),
            }),
        },
        other => Err(SheetDaoError::UnexpectedPayload {
            action: ACTION_LIST.to_string(),
            detail: format!("expected an array of rows, got {other}"),
        }),
    }
}

impl RegistrationStore for SheetRegistrationStore {
    fn register(
        &self,
        registration: NewRegistrationEntity,
    ) -> BoxFuture<'static, StorageResult<String>> {
        let store = self.clone();
        Box::pin(async move {
            let mut payload = serde_json::to_value(&registration).map_err(|err| {
                SheetDaoError::UnexpectedPayload {
                    action: ACTION_REGISTER.to_string(),
                    detail: err.to_string(),
                }
            })?;
            if let Value::Object(map) = &mut payload {
                map.insert("action".into(), Value::from(ACTION_REGISTER));
            }

            let reply = store.post_action(ACTION_REGISTER, payload).await?;
            reply.id.ok_or_else(|| {
                SheetDaoError::UnexpectedPayload {
                    action: ACTION_REGISTER.to_string(),
                    detail: "missing registration id".into(),
                }
                .into()
            })
        })
    }

    fn update_status(&self, id: String, status: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let payload = json!({ "action": ACTION_UPDATE_STATUS, "id": id, "status": status });
            store.post_action(ACTION_UPDATE_STATUS, payload).await?;
            Ok(())
        })
    }

    fn update_domain(&self, id: String, domain: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let payload = json!({ "action": ACTION_UPDATE_DOMAIN, "id": id, "domain": domain });
            store.post_action(ACTION_UPDATE_DOMAIN, payload).await?;
            Ok(())
        })
    }

    fn event_check_in(
        &self,
        id: String,
        timestamp: String,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let payload = json!({ "action": ACTION_CHECK_IN, "id": id, "timestamp": timestamp });
            store.post_action(ACTION_CHECK_IN, payload).await?;
            Ok(())
        })
    }

    fn send_certificate(&self, id: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let payload = json!({ "action": ACTION_SEND_CERTIFICATE, "id": id });
            store.post_action(ACTION_SEND_CERTIFICATE, payload).await?;
            Ok(())
        })
    }

    fn list_registrations(&self) -> BoxFuture<'static, StorageResult<Vec<RegistrationRecord>>> {
        let store = self.clone();
        Box::pin(async move { store.fetch_rows().await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.fetch_rows().await?;
            Ok(())
        })
    }
}
