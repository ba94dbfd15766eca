use std::time::Duration;

use serde_json::{Value, json};

use crate::environment::CmrEnvironment;
use crate::error::{Result, SyncError};
use crate::kind::ResourceKind;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const ASSOCIATION_PAGE_SIZE: &str = "2000";

/// Low-level client for the catalog's search and ingest endpoints.
///
/// Each operation is a single HTTPS call with a fixed per-call timeout.
/// Reads that can race a recent write report "not visible yet" as
/// `Ok(None)` so the caller can drive them through a [`RetryPolicy`];
/// ingest writes are fatal on any non-success status.
///
/// [`RetryPolicy`]: crate::retry::RetryPolicy
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
    kind: ResourceKind,
}

impl CatalogClient {
    pub fn new(environment: CmrEnvironment, kind: ResourceKind) -> Result<Self> {
        Self::with_base_url(environment.base_url(), kind)
    }

    /// Points the client at an arbitrary base URL, for tests against a
    /// mock server.
    pub fn with_base_url(base_url: &str, kind: ResourceKind) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            kind,
        })
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Looks up the concept id assigned to `(provider, native_id)`.
    ///
    /// Zero hits means the record does not exist or is not yet visible.
    /// More than one hit is a consistency violation automated logic must
    /// not attempt to repair.
    pub async fn find_by_native_id(
        &self,
        provider: &str,
        native_id: &str,
    ) -> Result<Option<String>> {
        let url = format!("{}/search/{}.json", self.base_url, self.kind.path_segment());
        let resp = self
            .http
            .get(&url)
            .query(&[("provider", provider), ("native_id", native_id)])
            .send()
            .await?;
        let body: Value = resp.json().await?;

        let hits = body.get("hits").and_then(Value::as_u64).unwrap_or(0);
        match hits {
            0 => Ok(None),
            1 => Ok(body
                .get("items")
                .and_then(Value::as_array)
                .and_then(|items| items.first())
                .and_then(|item| item.get("concept_id"))
                .and_then(Value::as_str)
                .map(str::to_string)),
            hits => Err(SyncError::ambiguous_record(provider, native_id, hits)),
        }
    }

    /// Fetches the stored UMM document for a concept id.
    ///
    /// A missing or malformed body is reported as `None`: during a
    /// creation race the record may not be fully visible yet.
    pub async fn fetch_profile(&self, concept_id: &str) -> Result<Option<Value>> {
        let url = format!(
            "{}/search/{}.umm_json",
            self.base_url,
            self.kind.path_segment()
        );
        let resp = self
            .http
            .get(&url)
            .query(&[("concept_id", concept_id), ("pretty", "true")])
            .send()
            .await?;
        let body: Value = match resp.json().await {
            Ok(body) => body,
            Err(err) => {
                tracing::debug!(concept_id, %err, "record body not parseable yet");
                return Ok(None);
            }
        };
        Ok(body
            .get("items")
            .and_then(Value::as_array)
            .and_then(|items| items.first())
            .and_then(|item| item.get("umm"))
            .cloned())
    }

    /// Creates or updates the record behind `(provider, native_id)`.
    ///
    /// The ingest endpoint is idempotent by native id, so the same call
    /// serves both the create and the update path.
    pub async fn put_profile(
        &self,
        provider: &str,
        native_id: &str,
        profile: &Value,
        token: &str,
    ) -> Result<()> {
        let url = self.ingest_url(provider, native_id);
        tracing::debug!(%url, "ingest write");
        let resp = self
            .http
            .put(&url)
            .header("Content-Type", self.kind.umm_content_type())
            .header("Authorization", token)
            .json(profile)
            .send()
            .await?;
        check_write(resp).await
    }

    /// Deletes the record behind `(provider, native_id)`. Not part of the
    /// reconcile flow; exposed for operational cleanup.
    pub async fn delete_profile(&self, provider: &str, native_id: &str, token: &str) -> Result<()> {
        let url = self.ingest_url(provider, native_id);
        tracing::info!(%url, "ingest delete");
        let resp = self
            .http
            .delete(&url)
            .header("Authorization", token)
            .send()
            .await?;
        check_write(resp).await
    }

    /// Concept ids of every collection currently associated with this
    /// record, sorted and deduplicated.
    ///
    /// A non-success response yields `None`; association sync treats that
    /// as "state unknown" and leaves the remote side untouched.
    pub async fn list_associations(
        &self,
        concept_id: &str,
        token: &str,
    ) -> Result<Option<Vec<String>>> {
        let url = format!("{}/search/collections.umm_json", self.base_url);
        let resp = self
            .http
            .get(&url)
            .header("Authorization", token)
            .query(&[
                (self.kind.association_param(), concept_id),
                ("page_size", ASSOCIATION_PAGE_SIZE),
            ])
            .send()
            .await?;
        if !resp.status().is_success() {
            tracing::warn!(concept_id, status = %resp.status(), "association search failed");
            return Ok(None);
        }
        let body: Value = resp.json().await?;
        let mut ids: Vec<String> = body
            .get("items")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.get("meta")?.get("concept-id")?.as_str())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        ids.sort();
        ids.dedup();
        Ok(Some(ids))
    }

    /// Issues one association add. Returns the HTTP status and body so the
    /// caller can report a per-item failure without aborting the batch.
    pub async fn add_association(
        &self,
        concept_id: &str,
        assoc_id: &str,
        token: &str,
    ) -> Result<(u16, String)> {
        self.association_write(reqwest::Method::POST, concept_id, assoc_id, token)
            .await
    }

    /// Issues one association removal. Same soft-failure contract as
    /// [`add_association`](Self::add_association).
    pub async fn remove_association(
        &self,
        concept_id: &str,
        assoc_id: &str,
        token: &str,
    ) -> Result<(u16, String)> {
        self.association_write(reqwest::Method::DELETE, concept_id, assoc_id, token)
            .await
    }

    async fn association_write(
        &self,
        method: reqwest::Method,
        concept_id: &str,
        assoc_id: &str,
        token: &str,
    ) -> Result<(u16, String)> {
        let url = format!(
            "{}/search/{}/{}/associations",
            self.base_url,
            self.kind.path_segment(),
            concept_id
        );
        let payload = json!([{ "concept_id": assoc_id }]);
        let resp = self
            .http
            .request(method, &url)
            .header("Content-Type", "application/json")
            .header("Authorization", token)
            .json(&payload)
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Ok((status, body))
    }

    fn ingest_url(&self, provider: &str, native_id: &str) -> String {
        format!(
            "{}/ingest/providers/{}/{}/{}",
            self.base_url,
            provider,
            self.kind.path_segment(),
            native_id
        )
    }
}

async fn check_write(resp: reqwest::Response) -> Result<()> {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    if !status.is_success() {
        return Err(SyncError::write_failed(status.as_u16(), body));
    }
    tracing::debug!(%status, %body, "ingest response");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer, kind: ResourceKind) -> CatalogClient {
        CatalogClient::with_base_url(&server.uri(), kind).unwrap()
    }

    #[tokio::test]
    async fn test_find_by_native_id_zero_hits() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/services.json"))
            .and(query_param("provider", "POCLOUD"))
            .and(query_param("native_id", "pocloud_my_tool"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "hits": 0, "items": []
            })))
            .mount(&server)
            .await;

        let client = client(&server, ResourceKind::Service).await;
        let found = client
            .find_by_native_id("POCLOUD", "pocloud_my_tool")
            .await
            .unwrap();
        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn test_find_by_native_id_one_hit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/tools.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "hits": 1, "items": [{"concept_id": "TL1200000-POCLOUD"}]
            })))
            .mount(&server)
            .await;

        let client = client(&server, ResourceKind::Tool).await;
        let found = client
            .find_by_native_id("POCLOUD", "pocloud_my_tool")
            .await
            .unwrap();
        assert_eq!(found.as_deref(), Some("TL1200000-POCLOUD"));
    }

    #[tokio::test]
    async fn test_find_by_native_id_multiple_hits_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/services.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "hits": 2,
                "items": [
                    {"concept_id": "S100-POCLOUD"},
                    {"concept_id": "S200-POCLOUD"}
                ]
            })))
            .mount(&server)
            .await;

        let client = client(&server, ResourceKind::Service).await;
        let err = client
            .find_by_native_id("POCLOUD", "pocloud_my_tool")
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::AmbiguousRecord { hits: 2, .. }));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_fetch_profile_extracts_umm() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/services.umm_json"))
            .and(query_param("concept_id", "S100-POCLOUD"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"umm": {"Name": "My Tool", "Version": "1.0"}}]
            })))
            .mount(&server)
            .await;

        let client = client(&server, ResourceKind::Service).await;
        let umm = client.fetch_profile("S100-POCLOUD").await.unwrap();
        assert_eq!(umm, Some(json!({"Name": "My Tool", "Version": "1.0"})));
    }

    #[tokio::test]
    async fn test_fetch_profile_missing_record_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/services.umm_json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .mount(&server)
            .await;

        let client = client(&server, ResourceKind::Service).await;
        assert_eq!(client.fetch_profile("S100-POCLOUD").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_fetch_profile_malformed_body_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/services.umm_json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not ready</html>"))
            .mount(&server)
            .await;

        let client = client(&server, ResourceKind::Service).await;
        assert_eq!(client.fetch_profile("S100-POCLOUD").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_profile_success() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/ingest/providers/POCLOUD/services/pocloud_my_tool"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"concept-id": "S100-POCLOUD"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server, ResourceKind::Service).await;
        client
            .put_profile(
                "POCLOUD",
                "pocloud_my_tool",
                &json!({"Name": "My Tool"}),
                "token",
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_put_profile_non_success_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/ingest/providers/POCLOUD/tools/pocloud_my_tool"))
            .respond_with(ResponseTemplate::new(422).set_body_string("invalid UMM-T"))
            .mount(&server)
            .await;

        let client = client(&server, ResourceKind::Tool).await;
        let err = client
            .put_profile(
                "POCLOUD",
                "pocloud_my_tool",
                &json!({"Name": "My Tool"}),
                "token",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::WriteFailed { status: 422, .. }));
    }

    #[tokio::test]
    async fn test_delete_profile_non_success_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/ingest/providers/POCLOUD/services/pocloud_my_tool"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such record"))
            .mount(&server)
            .await;

        let client = client(&server, ResourceKind::Service).await;
        let err = client
            .delete_profile("POCLOUD", "pocloud_my_tool", "token")
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::WriteFailed { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_list_associations_sorted_and_deduplicated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/collections.umm_json"))
            .and(query_param("service_concept_id", "S100-POCLOUD"))
            .and(query_param("page_size", "2000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    {"meta": {"concept-id": "C300-POCLOUD"}},
                    {"meta": {"concept-id": "C100-POCLOUD"}},
                    {"meta": {"concept-id": "C300-POCLOUD"}}
                ]
            })))
            .mount(&server)
            .await;

        let client = client(&server, ResourceKind::Service).await;
        let ids = client
            .list_associations("S100-POCLOUD", "token")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ids, vec!["C100-POCLOUD", "C300-POCLOUD"]);
    }

    #[tokio::test]
    async fn test_list_associations_failure_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/collections.umm_json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = client(&server, ResourceKind::Tool).await;
        let ids = client.list_associations("TL100-POCLOUD", "token").await.unwrap();
        assert_eq!(ids, None);
    }

    #[tokio::test]
    async fn test_association_write_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search/tools/TL100-POCLOUD/associations"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad collection"))
            .mount(&server)
            .await;

        let client = client(&server, ResourceKind::Tool).await;
        let (status, body) = client
            .add_association("TL100-POCLOUD", "C100-POCLOUD", "token")
            .await
            .unwrap();
        assert_eq!(status, 400);
        assert_eq!(body, "bad collection");
    }
}
