//! Bluesky XRPC client: session creation and feed-post record submission.
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use tracing::{debug, info};

use crate::compose::Announcement;

pub const DEFAULT_PDS_URL: &str = "https://bsky.social";
const POST_COLLECTION: &str = "app.bsky.feed.post";

/// Deterministic record URI returned by [`SimulatedPublisher`].
pub const PLACEHOLDER_RECORD_URI: &str = "at://did:plc:sampledid/samplekey";

/// Submits announcements to the social platform. One authenticated session
/// per run, reused for every submission.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn authenticate(&mut self, identifier: &str, secret: &str) -> Result<()>;

    /// Submit one announcement; returns the platform record URI.
    async fn publish(&self, announcement: &Announcement) -> Result<String>;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Session {
    access_jwt: String,
    handle: String,
    did: String,
}

#[derive(Deserialize)]
struct CreateRecordResponse {
    uri: String,
}

pub struct BskyClient {
    http: Client,
    base_url: Url,
    session: Option<Session>,
}

impl fmt::Debug for BskyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BskyClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl BskyClient {
    pub fn new(pds_url: &str) -> Result<Self> {
        let base_url = Url::parse(pds_url).context("invalid PDS URL")?;
        Ok(Self::with_base_url(base_url))
    }

    pub fn with_base_url(base_url: Url) -> Self {
        let http = Client::builder()
            .user_agent("bsky-announce/0.1")
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url,
            session: None,
        }
    }

    fn endpoint(&self, method: &str) -> Result<Url> {
        self.base_url
            .join(&format!("xrpc/{method}"))
            .with_context(|| format!("invalid XRPC endpoint for {method}"))
    }

    async fn execute(&self, method: &str, bearer: Option<&str>, body: &Value) -> Result<Value> {
        let endpoint = self.endpoint(method)?;
        debug!(url=%endpoint, "sending XRPC request");
        let mut request = self.http.post(endpoint).json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .with_context(|| format!("failed to reach PDS for {method}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("{method} failed with {status}: {body}"));
        }

        response
            .json()
            .await
            .with_context(|| format!("invalid {method} response"))
    }
}

#[async_trait]
impl Publisher for BskyClient {
    async fn authenticate(&mut self, identifier: &str, secret: &str) -> Result<()> {
        let body = json!({
            "identifier": identifier,
            "password": secret,
        });
        let payload = self
            .execute("com.atproto.server.createSession", None, &body)
            .await?;
        let session: Session =
            serde_json::from_value(payload).context("invalid createSession response")?;
        info!(handle=%session.handle, did=%session.did, "authenticated with PDS");
        self.session = Some(session);
        Ok(())
    }

    async fn publish(&self, announcement: &Announcement) -> Result<String> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| anyhow!("publish called before authenticate"))?;

        let record = build_post_record(announcement, &Utc::now().to_rfc3339());
        let body = build_create_record_request(&session.did, record);
        let payload = self
            .execute(
                "com.atproto.repo.createRecord",
                Some(&session.access_jwt),
                &body,
            )
            .await?;
        let created: CreateRecordResponse =
            serde_json::from_value(payload).context("invalid createRecord response")?;
        Ok(created.uri)
    }
}

/// No-network publisher used by dry runs and tests; every submission yields
/// the same placeholder URI.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedPublisher;

#[async_trait]
impl Publisher for SimulatedPublisher {
    async fn authenticate(&mut self, _identifier: &str, _secret: &str) -> Result<()> {
        Ok(())
    }

    async fn publish(&self, _announcement: &Announcement) -> Result<String> {
        Ok(PLACEHOLDER_RECORD_URI.to_string())
    }
}

/// Feed-post record with a single richtext link facet over the title bytes.
pub fn build_post_record(announcement: &Announcement, created_at: &str) -> Value {
    json!({
        "$type": POST_COLLECTION,
        "createdAt": created_at,
        "text": announcement.text,
        "facets": [
            {
                "index": {
                    "byteStart": announcement.link.byte_start,
                    "byteEnd": announcement.link.byte_end,
                },
                "features": [
                    {
                        "$type": "app.bsky.richtext.facet#link",
                        "uri": announcement.link.uri,
                    }
                ],
            }
        ],
    })
}

pub fn build_create_record_request(did: &str, record: Value) -> Value {
    json!({
        "repo": did,
        "collection": POST_COLLECTION,
        "record": record,
    })
}
