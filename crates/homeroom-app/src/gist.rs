// GitHub Gist backed chat log.
//
// The whole log is one JSON file inside a fixed gist. Loads and saves are
// whole-file reads and overwrites; concurrent writers simply race and the
// last PATCH wins.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use homeroom_core::chat::{keep_recent, ChatEntry};
use homeroom_core::config::Config;
use homeroom_core::history::TIMESTAMP_FORMAT;
use reqwest::StatusCode;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::store::ChatLogStore;

const LOAD_TIMEOUT: Duration = Duration::from_secs(10);
const WRITE_TIMEOUT: Duration = Duration::from_secs(15);
const ACCEPT: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = "homeroom";

pub struct GistStore {
    http: reqwest::Client,
    gist_url: String,
    token: String,
    filename: String,
    max_history: usize,
}

impl GistStore {
    pub fn new(
        api_base: &str,
        gist_id: &str,
        token: &str,
        filename: &str,
        max_history: usize,
    ) -> Self {
        GistStore {
            http: reqwest::Client::new(),
            gist_url: format!("{}/gists/{}", api_base.trim_end_matches('/'), gist_id),
            token: token.to_string(),
            filename: filename.to_string(),
            max_history,
        }
    }

    /// `None` unless both the GitHub token and gist id are configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        let token = config.credentials.github_token()?;
        let gist_id = config.credentials.gist_id()?;
        Some(GistStore::new(
            &config.storage.gist_api_base,
            gist_id,
            token,
            &config.storage.gist_filename,
            config.storage.max_chat_history,
        ))
    }

    fn with_headers(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", ACCEPT)
            .header("User-Agent", USER_AGENT)
    }

    async fn fetch(&self) -> anyhow::Result<Option<Value>> {
        let response = self
            .with_headers(self.http.get(&self.gist_url))
            .timeout(LOAD_TIMEOUT)
            .send()
            .await
            .context("gist GET failed")?;
        let status = response.status();
        if status != StatusCode::OK {
            warn!(status = status.as_u16(), "gist GET returned non-200");
            return Ok(None);
        }
        let gist = response.json().await.context("gist GET body is not JSON")?;
        Ok(Some(gist))
    }

    async fn patch(&self, body: &Value) -> anyhow::Result<bool> {
        let response = self
            .with_headers(self.http.patch(&self.gist_url))
            .timeout(WRITE_TIMEOUT)
            .json(body)
            .send()
            .await
            .context("gist PATCH failed")?;
        let status = response.status();
        debug!(status = status.as_u16(), "gist PATCH");
        Ok(status == StatusCode::OK)
    }

    async fn try_load(&self) -> anyhow::Result<Vec<ChatEntry>> {
        let Some(gist) = self.fetch().await? else {
            return Ok(Vec::new());
        };

        match find_log_content(&gist, &self.filename) {
            Some(content) => {
                let mut entries: Vec<ChatEntry> =
                    serde_json::from_str(content).context("chat log is not a list of entries")?;
                keep_recent(&mut entries, self.max_history);
                info!(n = entries.len(), "loaded chat log from gist");
                Ok(entries)
            }
            None => {
                info!("gist has no chat log file; creating {}", self.filename);
                let body = json!({
                    "description": "Chat History Storage",
                    "files": { self.filename.clone(): { "content": "[]" } },
                });
                if !self.patch(&body).await? {
                    warn!("failed to create initial chat log file");
                }
                Ok(Vec::new())
            }
        }
    }

    async fn try_save(&self, history: &[ChatEntry]) -> anyhow::Result<bool> {
        let start = history.len().saturating_sub(self.max_history);
        let to_save = &history[start..];

        let Some(gist) = self.fetch().await? else {
            return Ok(false);
        };

        let content = serde_json::to_string_pretty(to_save).context("serialize chat log")?;
        let mut files = Map::new();
        files.insert(self.filename.clone(), json!({ "content": content }));
        // Carry the gist's other files through unchanged.
        if let Some(current) = gist.get("files").and_then(Value::as_object) {
            for (name, info) in current {
                if name == &self.filename {
                    continue;
                }
                if let Some(content) = info.get("content") {
                    files.insert(name.clone(), json!({ "content": content }));
                }
            }
        }

        let body = json!({
            "description": format!(
                "Chat History - Last updated: {}",
                chrono::Local::now().format(TIMESTAMP_FORMAT)
            ),
            "files": files,
        });
        self.patch(&body).await
    }
}

#[async_trait]
impl ChatLogStore for GistStore {
    async fn load(&self) -> Vec<ChatEntry> {
        match self.try_load().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("loading chat log failed: {e:#}");
                Vec::new()
            }
        }
    }

    async fn save(&self, history: &[ChatEntry]) -> bool {
        if history.is_empty() {
            return false;
        }
        match self.try_save(history).await {
            Ok(saved) => saved,
            Err(e) => {
                warn!("saving chat log failed: {e:#}");
                false
            }
        }
    }
}

/// Content of the chat log file: the file named `filename` if present,
/// otherwise the first `.json` file.
fn find_log_content<'a>(gist: &'a Value, filename: &str) -> Option<&'a str> {
    let files = gist.get("files")?.as_object()?;
    let info = files
        .get(filename)
        .or_else(|| {
            files
                .iter()
                .find(|(name, _)| name.ends_with(".json"))
                .map(|(_, info)| info)
        })?;
    Some(info.get("content").and_then(Value::as_str).unwrap_or("[]"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use homeroom_llm::test_support::{request_body, serve_sequence, MockResponse};
    use std::net::SocketAddr;

    fn store(addr: SocketAddr, max: usize) -> GistStore {
        GistStore::new(
            &format!("http://{addr}"),
            "abc123",
            "ghp_test",
            "chat_history.json",
            max,
        )
    }

    fn entry(i: usize) -> ChatEntry {
        ChatEntry {
            timestamp: format!("2025-01-01 00:00:{i:02}"),
            original: format!("msg {i}"),
            english: format!("en {i}"),
            myanmar: format!("my {i}"),
        }
    }

    fn gist_with(files: Value) -> String {
        json!({ "id": "abc123", "files": files }).to_string()
    }

    #[test]
    fn find_log_content_prefers_named_file() {
        let gist = json!({ "files": {
            "a.json": { "content": "[1]" },
            "chat_history.json": { "content": "[2]" },
        }});
        assert_eq!(find_log_content(&gist, "chat_history.json"), Some("[2]"));

        let gist = json!({ "files": {
            "notes.txt": { "content": "x" },
            "other.json": { "content": "[3]" },
        }});
        assert_eq!(find_log_content(&gist, "chat_history.json"), Some("[3]"));

        let gist = json!({ "files": { "notes.txt": { "content": "x" } } });
        assert_eq!(find_log_content(&gist, "chat_history.json"), None);
    }

    #[tokio::test]
    async fn load_returns_last_entries_and_sends_github_headers() {
        let entries: Vec<ChatEntry> = (0..5).map(entry).collect();
        let content = serde_json::to_string(&entries).unwrap();
        let body = gist_with(json!({ "chat_history.json": { "content": content } }));
        let (addr, server) = serve_sequence(vec![MockResponse::json("200 OK", &body)]).await;

        let loaded = store(addr, 3).load().await;
        assert_eq!(loaded, entries[2..].to_vec());

        let requests = server.await.unwrap();
        let lower = requests[0].to_lowercase();
        assert!(requests[0].starts_with("GET /gists/abc123 "));
        assert!(lower.contains("authorization: token ghp_test"));
        assert!(lower.contains("accept: application/vnd.github.v3+json"));
    }

    #[tokio::test]
    async fn load_creates_initial_file_when_missing() {
        let body = gist_with(json!({ "readme.md": { "content": "hi" } }));
        let (addr, server) = serve_sequence(vec![
            MockResponse::json("200 OK", &body),
            MockResponse::json("200 OK", "{}"),
        ])
        .await;

        assert!(store(addr, 100).load().await.is_empty());

        let requests = server.await.unwrap();
        assert!(requests[1].starts_with("PATCH /gists/abc123 "));
        let sent: Value = serde_json::from_str(request_body(&requests[1])).unwrap();
        assert_eq!(sent["description"], "Chat History Storage");
        assert_eq!(sent["files"]["chat_history.json"]["content"], "[]");
    }

    #[tokio::test]
    async fn load_non_200_is_empty() {
        let (addr, _server) =
            serve_sequence(vec![MockResponse::json("404 Not Found", "{}")]).await;
        assert!(store(addr, 100).load().await.is_empty());
    }

    #[tokio::test]
    async fn load_bad_content_is_empty() {
        let body = gist_with(json!({ "chat_history.json": { "content": "not json" } }));
        let (addr, _server) = serve_sequence(vec![MockResponse::json("200 OK", &body)]).await;
        assert!(store(addr, 100).load().await.is_empty());
    }

    #[tokio::test]
    async fn load_unreachable_is_empty() {
        let s = GistStore::new("http://127.0.0.1:1", "id", "t", "chat_history.json", 100);
        assert!(s.load().await.is_empty());
    }

    #[tokio::test]
    async fn save_empty_history_is_false_without_requests() {
        let s = GistStore::new("http://127.0.0.1:1", "id", "t", "chat_history.json", 100);
        assert!(!s.save(&[]).await);
    }

    #[tokio::test]
    async fn save_trims_and_preserves_other_files() {
        let current = gist_with(json!({
            "chat_history.json": { "content": "[]" },
            "notes.md": { "filename": "notes.md", "content": "keep me" },
        }));
        let (addr, server) = serve_sequence(vec![
            MockResponse::json("200 OK", &current),
            MockResponse::json("200 OK", "{}"),
        ])
        .await;

        let mut history: Vec<ChatEntry> = (0..4).map(entry).collect();
        history[3].myanmar = "မင်္ဂလာပါ".to_string();
        assert!(store(addr, 2).save(&history).await);

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("GET "));
        assert!(requests[1].starts_with("PATCH "));
        let sent: Value = serde_json::from_str(request_body(&requests[1])).unwrap();
        assert!(sent["description"]
            .as_str()
            .unwrap()
            .starts_with("Chat History - Last updated: "));
        assert_eq!(sent["files"]["notes.md"]["content"], "keep me");

        let saved_text = sent["files"]["chat_history.json"]["content"].as_str().unwrap();
        assert!(saved_text.contains("မင်္ဂလာပါ"));
        assert!(saved_text.contains("\n  {"));
        let saved: Vec<ChatEntry> = serde_json::from_str(saved_text).unwrap();
        assert_eq!(saved, history[2..].to_vec());
    }

    #[tokio::test]
    async fn save_fails_when_get_fails() {
        let (addr, server) =
            serve_sequence(vec![MockResponse::json("401 Unauthorized", "{}")]).await;
        assert!(!store(addr, 100).save(&[entry(1)]).await);
        assert_eq!(server.await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn save_reports_patch_failure() {
        let current = gist_with(json!({ "chat_history.json": { "content": "[]" } }));
        let (addr, _server) = serve_sequence(vec![
            MockResponse::json("200 OK", &current),
            MockResponse::json("422 Unprocessable Entity", "{}"),
        ])
        .await;
        assert!(!store(addr, 100).save(&[entry(1)]).await);
    }

    #[test]
    fn from_config_requires_token_and_id() {
        use homeroom_core::config::*;
        use homeroom_core::credentials::CredentialsConfig;
        let mut config = Config {
            practice: PracticeConfig::default(),
            llm: LlmConfig::default(),
            translate: TranslateConfig::default(),
            storage: StorageConfig::default(),
            profiles: vec![],
            credentials: CredentialsConfig {
                github_token: Some("t".into()),
                ..Default::default()
            },
        };
        assert!(GistStore::from_config(&config).is_none());
        config.credentials.github_gist_id = Some("id".into());
        let store = GistStore::from_config(&config).unwrap();
        assert_eq!(store.gist_url, "https://api.github.com/gists/id");
    }
}
