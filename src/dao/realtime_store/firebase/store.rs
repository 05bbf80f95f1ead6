use std::{sync::Arc, time::Duration};

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder, StatusCode, header::IF_MATCH};
use serde_json::Value;
use tokio::{
    sync::watch,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, warn};

use crate::dao::{realtime_store::RealtimeStore, storage::StorageResult};

use super::{
    config::FirebaseConfig,
    error::{FirebaseDaoError, FirebaseResult},
};

const ETAG_REQUEST_HEADER: &str = "X-Firebase-ETag";

/// [`RealtimeStore`] speaking the realtime database REST protocol.
///
/// Subscriptions are served by one polling task per path, shared by every
/// receiver of that path and stopped once the last receiver is dropped.
#[derive(Clone)]
pub struct FirebaseRealtimeStore {
    client: Client,
    base_url: Arc<str>,
    auth_token: Option<Arc<str>>,
    poll_interval: Duration,
    pollers: Arc<DashMap<String, watch::Sender<Option<Value>>>>,
}

impl FirebaseRealtimeStore {
    /// Build the HTTP client for the configured database.
    pub fn connect(config: FirebaseConfig) -> FirebaseResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| FirebaseDaoError::ClientBuilder { source })?;

        Ok(Self {
            client,
            base_url: Arc::from(config.base_url.trim_end_matches('/')),
            auth_token: config.auth_token.map(Arc::from),
            poll_interval: config.poll_interval,
            pollers: Arc::new(DashMap::new()),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}.json", self.base_url, path.trim_matches('/'));
        let builder = self.client.request(method, url);
        match &self.auth_token {
            Some(token) => builder.query(&[("auth", token.as_ref())]),
            None => builder,
        }
    }

    async fn get_value(&self, path: &str) -> FirebaseResult<Option<Value>> {
        let response = self
            .request(Method::GET, path)
            .send()
            .await
            .map_err(|source| FirebaseDaoError::RequestSend {
                path: path.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(FirebaseDaoError::RequestStatus {
                path: path.to_string(),
                status: response.status(),
            });
        }

        let value = response
            .json::<Value>()
            .await
            .map_err(|source| FirebaseDaoError::DecodeResponse {
                path: path.to_string(),
                source,
            })?;
        Ok(Some(value).filter(|value| !value.is_null()))
    }

    async fn get_with_etag(&self, path: &str) -> FirebaseResult<(Option<Value>, String)> {
        let response = self
            .request(Method::GET, path)
            .header(ETAG_REQUEST_HEADER, "true")
            .send()
            .await
            .map_err(|source| FirebaseDaoError::RequestSend {
                path: path.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(FirebaseDaoError::RequestStatus {
                path: path.to_string(),
                status: response.status(),
            });
        }

        let etag = response
            .headers()
            .get(reqwest::header::ETAG)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| FirebaseDaoError::MissingEtag {
                path: path.to_string(),
            })?;

        let value = response
            .json::<Value>()
            .await
            .map_err(|source| FirebaseDaoError::DecodeResponse {
                path: path.to_string(),
                source,
            })?;
        Ok((Some(value).filter(|value| !value.is_null()), etag))
    }

    /// Write (PUT) or delete (DELETE) a node, optionally guarded by an ETag.
    ///
    /// Returns `false` when the guard no longer matches.
    async fn put_value(
        &self,
        path: &str,
        value: Option<Value>,
        etag: Option<&str>,
    ) -> FirebaseResult<bool> {
        let mut builder = match &value {
            Some(value) => self.request(Method::PUT, path).json(value),
            None => self.request(Method::DELETE, path),
        };
        if let Some(etag) = etag {
            builder = builder.header(IF_MATCH, etag);
        }

        let response = builder
            .send()
            .await
            .map_err(|source| FirebaseDaoError::RequestSend {
                path: path.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::PRECONDITION_FAILED if etag.is_some() => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(FirebaseDaoError::RequestStatus {
                path: path.to_string(),
                status,
            }),
        }
    }

    fn spawn_poller(&self, path: String, sender: watch::Sender<Option<Value>>) {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval(store.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                // Removal and subscription both hold the map shard, so nobody
                // can attach to a sender whose poller is gone.
                if store
                    .pollers
                    .remove_if(&path, |_, current| current.receiver_count() == 0)
                    .is_some()
                {
                    break;
                }

                match store.get_value(&path).await {
                    Ok(next) => {
                        sender.send_if_modified(|slot| {
                            if *slot != next {
                                *slot = next;
                                true
                            } else {
                                false
                            }
                        });
                    }
                    Err(err) => warn!(path = %path, error = %err, "realtime poll failed"),
                }
            }

            debug!(path = %path, "realtime poller stopped");
        });
    }
}

impl RealtimeStore for FirebaseRealtimeStore {
    fn read(&self, path: &str) -> BoxFuture<'static, StorageResult<Option<Value>>> {
        let store = self.clone();
        let path = path.to_string();
        Box::pin(async move { store.get_value(&path).await.map_err(Into::into) })
    }

    fn write(&self, path: &str, value: Option<Value>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let path = path.to_string();
        Box::pin(async move {
            store.put_value(&path, value, None).await?;
            Ok(())
        })
    }

    fn compare_and_swap(
        &self,
        path: &str,
        expected: Option<Value>,
        value: Option<Value>,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        let path = path.to_string();
        Box::pin(async move {
            let (current, etag) = store.get_with_etag(&path).await?;
            if current != expected {
                return Ok(false);
            }
            Ok(store.put_value(&path, value, Some(&etag)).await?)
        })
    }

    fn subscribe(&self, path: &str) -> watch::Receiver<Option<Value>> {
        let key = path.trim_matches('/').to_string();
        match self.pollers.entry(key.clone()) {
            Entry::Occupied(existing) => existing.get().subscribe(),
            Entry::Vacant(vacant) => {
                let (sender, receiver) = watch::channel(None);
                vacant.insert(sender.clone());
                self.spawn_poller(key, sender);
                receiver
            }
        }
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let response = store
                .request(Method::GET, "")
                .query(&[("shallow", "true")])
                .send()
                .await
                .map_err(|source| FirebaseDaoError::RequestSend {
                    path: "/".into(),
                    source,
                })?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(FirebaseDaoError::RequestStatus {
                    path: "/".into(),
                    status: response.status(),
                }
                .into())
            }
        })
    }
}
