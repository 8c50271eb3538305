use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};

use crate::{
    api::{
        wire::{
            DeleteRequest, FetchOneResponse, FetchRequest, FetchResponse, MutationRequest,
            MutationResponse, RecordResult,
        },
        EntityKind, Error, Query, Record, RecordId, RecordStore,
    },
    StoreConfig,
};

/// [`RecordStore`] talking to the remote table service
///
/// Transient failures are retried with exponential backoff, rejected records
/// are not.
pub struct HttpRecordStore {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
}

fn transport(err: impl std::fmt::Display) -> Error {
    Error::Store(format!("talking to the record store: {err}"))
}

impl HttpRecordStore {
    pub fn new(config: &StoreConfig) -> HttpRecordStore {
        let retry_policy =
            ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(reqwest::Client::new())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();
        HttpRecordStore {
            client,
            base_url: String::from(config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
        }
    }

    fn url(&self, kind: EntityKind, path: &str) -> String {
        format!("{}/tables/{}/{}", self.base_url, kind.table(), path)
    }

    async fn parse<R>(resp: reqwest::Response) -> Result<R, Error>
    where
        R: serde::de::DeserializeOwned,
    {
        let status = resp.status();
        let body = resp.bytes().await.map_err(transport)?;
        if !status.is_success() {
            return Err(Error::parse(&body).unwrap_or_else(|_| {
                Error::Store(format!(
                    "unexpected status {status}: {}",
                    String::from_utf8_lossy(&body)
                ))
            }));
        }
        serde_json::from_slice(&body)
            .map_err(|e| Error::Store(format!("parsing record store response: {e}")))
    }

    async fn post<B, R>(&self, kind: EntityKind, path: &str, body: &B) -> Result<R, Error>
    where
        B: serde::Serialize,
        R: serde::de::DeserializeOwned,
    {
        let url = self.url(kind, path);
        tracing::debug!(%url, "posting to record store");
        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        Self::parse(resp).await
    }

    /// The outcome of the single record a write was about
    async fn mutate(
        &self,
        kind: EntityKind,
        path: &str,
        body: &impl serde::Serialize,
    ) -> Result<Option<RecordResult>, Error> {
        let resp: MutationResponse = self.post(kind, path, body).await?;
        if !resp.success {
            return Err(Error::Store(
                resp.message
                    .unwrap_or_else(|| format!("{path} on {kind} was refused")),
            ));
        }
        match resp.results.unwrap_or_default().into_iter().next() {
            Some(r) if !r.success => Err(r.into_error()),
            r => Ok(r),
        }
    }
}

#[async_trait::async_trait]
impl RecordStore for HttpRecordStore {
    async fn fetch_one(&self, kind: EntityKind, id: RecordId) -> Result<Record, Error> {
        let url = self.url(kind, &format!("records/{id}"));
        tracing::debug!(%url, "fetching record");
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(transport)?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            // Proxies and routers answer 404 without the store's error body
            let body = resp.bytes().await.map_err(transport)?;
            return Err(Error::parse(&body).unwrap_or(Error::NotFound { kind, id }));
        }
        let resp: FetchOneResponse = Self::parse(resp).await?;
        if !resp.success {
            return Err(Error::Store(
                resp.message
                    .unwrap_or_else(|| format!("fetching {kind} record {id} failed")),
            ));
        }
        resp.data.ok_or(Error::NotFound { kind, id })
    }

    async fn fetch_many(&self, kind: EntityKind, query: &Query) -> Result<Vec<Record>, Error> {
        let resp: FetchResponse = self
            .post(kind, "fetch", &FetchRequest::new(kind, query))
            .await?;
        if !resp.success {
            return Err(Error::Store(
                resp.message
                    .unwrap_or_else(|| format!("fetching {kind} records failed")),
            ));
        }
        Ok(resp.data.unwrap_or_default())
    }

    async fn create_one(&self, kind: EntityKind, fields: Record) -> Result<Record, Error> {
        let req = MutationRequest {
            records: vec![fields],
        };
        self.mutate(kind, "create", &req)
            .await?
            .and_then(|r| r.data)
            .ok_or_else(|| Error::Store(format!("store did not return the created {kind} record")))
    }

    async fn update_one(
        &self,
        kind: EntityKind,
        id: RecordId,
        mut fields: Record,
    ) -> Result<Record, Error> {
        fields.set("Id", id.0);
        let req = MutationRequest {
            records: vec![fields],
        };
        // Some deployments answer updates without the record, fetch it then
        match self.mutate(kind, "update", &req).await?.and_then(|r| r.data) {
            Some(record) => Ok(record),
            None => self.fetch_one(kind, id).await,
        }
    }

    async fn delete_one(&self, kind: EntityKind, id: RecordId) -> Result<bool, Error> {
        let req = DeleteRequest {
            record_ids: vec![id],
        };
        Ok(self.mutate(kind, "delete", &req).await?.is_some())
    }
}
