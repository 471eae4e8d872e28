use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;

use super::{EntityLink, NewReceipt, ReceiptStore, RecordId, StoreError, WriteOutcome};
use crate::config::Credentials;

const RECEIPTS: &str = "receipts";
const ENTITIES: &str = "entities";
const ENTITY_RECEIPT: &str = "entity_receipt";

/// No row echo on writes. Without a `resolution=` directive a duplicate key
/// comes back as 409, which keeps created and already-present rows apart.
const PREFER_RETURN_MINIMAL: &str = "return=minimal";

#[derive(Debug, Deserialize)]
struct IdRow {
    id: RecordId,
}

/// PostgREST client for the receipts tables.
///
/// Every request carries the service key twice, as the `apikey` header and as
/// a bearer token. The shared `reqwest::Client` supplies the request timeout.
pub struct RestStore {
    client: reqwest::Client,
    rest_root: Url,
    service_key: SecretString,
}

impl RestStore {
    pub fn new(client: reqwest::Client, credentials: Credentials) -> Result<Self, StoreError> {
        let mut base = credentials.base_url;
        // Url::join replaces the last path segment unless the path ends with '/'
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let rest_root = base.join("rest/v1/")?;

        Ok(Self {
            client,
            rest_root,
            service_key: credentials.service_key,
        })
    }

    fn endpoint(&self, table: &str, query: &[(&str, &str)]) -> Result<Url, StoreError> {
        let mut url = self.rest_root.join(table)?;
        url.query_pairs_mut().extend_pairs(query);
        Ok(url)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let key = self.service_key.expose_secret();
        request.header("apikey", key).bearer_auth(key)
    }

    async fn upsert<T: Serialize + Sync + ?Sized>(
        &self,
        table: &str,
        on_conflict: &str,
        body: &T,
    ) -> Result<WriteOutcome, StoreError> {
        let url = self.endpoint(table, &[("on_conflict", on_conflict)])?;
        let response = self
            .authed(self.client.post(url))
            .header("Prefer", PREFER_RETURN_MINIMAL)
            .json(body)
            .send()
            .await?;

        match response.status() {
            StatusCode::CREATED => Ok(WriteOutcome::Created),
            StatusCode::CONFLICT => Ok(WriteOutcome::Conflict),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(StoreError::UnexpectedStatus {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }

    async fn find_id(
        &self,
        table: &str,
        column: &str,
        value: &str,
    ) -> Result<Option<RecordId>, StoreError> {
        let filter = format!("eq.{value}");
        let url = self.endpoint(table, &[("select", "id"), (column, &filter)])?;
        let response = self.authed(self.client.get(url)).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        let rows: Vec<IdRow> = response.json().await?;
        Ok(rows.into_iter().next().map(|row| row.id))
    }
}

#[async_trait]
impl ReceiptStore for RestStore {
    async fn insert_receipt(&self, receipt: &NewReceipt) -> Result<WriteOutcome, StoreError> {
        self.upsert(RECEIPTS, "hash", receipt).await
    }

    async fn find_receipt_id(&self, hash: &str) -> Result<Option<RecordId>, StoreError> {
        self.find_id(RECEIPTS, "hash", hash).await
    }

    async fn find_entity_id(&self, slug: &str) -> Result<Option<RecordId>, StoreError> {
        self.find_id(ENTITIES, "slug", slug).await
    }

    async fn insert_link(&self, link: &EntityLink) -> Result<WriteOutcome, StoreError> {
        self.upsert(ENTITY_RECEIPT, "entity_id,receipt_id", link)
            .await
    }
}
