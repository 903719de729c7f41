use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::folders::Tree;
use crate::sync::{RemoteSyncGateway, Result, SyncError};

/// REST path of the per-user folders table.
pub const FOLDERS_ENDPOINT: &str = "/rest/v1/folders";

#[derive(Debug, Deserialize)]
struct FolderRow {
    #[serde(default)]
    data: Value,
}

/// Client for a PostgREST-style folders table: one row per user holding the
/// whole tree in its `data` column.
pub struct RestSyncClient {
    client: Client,
    base_url: String,
    api_key: String,
    token: Option<String>,
}

impl RestSyncClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            token: None,
        }
    }

    /// Authenticate requests with a session's access token.
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    fn url(&self) -> String {
        format!("{}{}", self.base_url, FOLDERS_ENDPOINT)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header("apikey", &self.api_key);
        match &self.token {
            Some(token) => builder.header("Authorization", format!("Bearer {}", token)),
            None => builder,
        }
    }

    /// Body of a successful response; a status error otherwise.
    async fn body(response: Response) -> Result<String> {
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(SyncError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }
}

#[async_trait]
impl RemoteSyncGateway for RestSyncClient {
    async fn fetch_remote_tree(&self, user_id: &str) -> Result<Tree> {
        let request = self.client.get(self.url()).query(&[
            ("user_id", format!("eq.{}", user_id)),
            ("select", "*".to_string()),
        ]);
        let text = Self::body(self.authorize(request).send().await?).await?;
        if text.trim().is_empty() {
            return Ok(Tree::default());
        }
        let rows: Vec<FolderRow> = serde_json::from_str(&text)?;
        debug!("fetched {} remote row(s)", rows.len());
        Ok(rows
            .into_iter()
            .next()
            .map(|row| Tree::from_value(row.data))
            .unwrap_or_default())
    }

    async fn push_tree(&self, user_id: &str, tree: &Tree) -> Result<()> {
        let request = self
            .client
            .post(self.url())
            .query(&[("on_conflict", "user_id")])
            .header("Prefer", "resolution=merge-duplicates")
            .json(&json!({ "user_id": user_id, "data": tree.to_value() }));
        Self::body(self.authorize(request).send().await?).await?;
        debug!("pushed {} node(s) for {}", tree.node_count(), user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::folders::{Chat, Folder};
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> RestSyncClient {
        RestSyncClient::new(&server.uri(), "anon-key").with_token("session-token")
    }

    #[tokio::test]
    async fn fetch_reads_first_row() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(FOLDERS_ENDPOINT))
            .and(query_param("user_id", "eq.u1"))
            .and(query_param("select", "*"))
            .and(header("apikey", "anon-key"))
            .and(header("Authorization", "Bearer session-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"user_id": "u1", "data": {"folders": [
                    {"name": "Work", "icon": "💼", "chats": [{"title": "t", "url": "https://x/1"}], "folders": []}
                ]}}
            ])))
            .mount(&server)
            .await;

        let tree = client(&server).fetch_remote_tree("u1").await.unwrap();
        assert_eq!(tree.folders.len(), 1);
        assert_eq!(tree.folders[0].name, "Work");
        assert_eq!(tree.folders[0].chats[0].title, "t");
    }

    #[tokio::test]
    async fn fetch_without_rows_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(FOLDERS_ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        assert!(client(&server).fetch_remote_tree("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn push_upserts_by_user() {
        let server = MockServer::start().await;
        let mut folder = Folder::new("Home");
        folder.chats.push(Chat::new("c", "https://x/2"));
        let tree = Tree::new(vec![folder]);

        Mock::given(method("POST"))
            .and(path(FOLDERS_ENDPOINT))
            .and(query_param("on_conflict", "user_id"))
            .and(header("Prefer", "resolution=merge-duplicates"))
            .and(header("apikey", "anon-key"))
            .and(body_json(json!({"user_id": "u1", "data": tree.to_value()})))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).push_tree("u1", &tree).await.unwrap();
    }

    #[tokio::test]
    async fn error_status_carries_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(FOLDERS_ENDPOINT))
            .respond_with(ResponseTemplate::new(401).set_body_string("JWT expired"))
            .mount(&server)
            .await;

        match client(&server).fetch_remote_tree("u1").await {
            Err(SyncError::Status { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "JWT expired");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn malformed_rows_are_a_json_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(FOLDERS_ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"oops\": 1}"))
            .mount(&server)
            .await;
        assert!(matches!(
            client(&server).fetch_remote_tree("u1").await,
            Err(SyncError::Json(_))
        ));
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let client = RestSyncClient::new("https://db.example.co/", "k");
        assert_eq!(client.url(), "https://db.example.co/rest/v1/folders");
    }
}
