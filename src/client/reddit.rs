// File: ./src/client/reddit.rs
//! `SourceFeed` over Reddit's OAuth API (script-app password grant).
use crate::client::http::{HttpClient, HttpResponse};
use crate::config::RedditConfig;
use crate::error::FeedError;
use crate::feed::{Reply, SourceFeed};
use crate::model::SourcePost;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Reason reported for a post that `/api/info` no longer returns at all.
pub const MISSING_POST_REASON: &str = "deleted";

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct Listing<T> {
    data: ListingData<T>,
}

#[derive(Deserialize)]
struct ListingData<T> {
    #[serde(default = "Vec::new")]
    children: Vec<Thing<T>>,
}

#[derive(Deserialize)]
struct Thing<T> {
    kind: String,
    data: T,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct LinkData {
    id: String,
    author: String,
    title: String,
    selftext: String,
    url: String,
    permalink: String,
    link_flair_text: Option<String>,
    removed_by_category: Option<String>,
}

// "more" stubs share the listing with real comments, hence the defaults.
#[derive(Deserialize, Default)]
#[serde(default)]
struct CommentData {
    id: String,
    author: String,
    body: String,
}

#[derive(Deserialize)]
struct ApiEnvelope {
    json: ApiErrors,
}

#[derive(Deserialize)]
struct ApiErrors {
    #[serde(default)]
    errors: Vec<serde_json::Value>,
}

impl From<LinkData> for SourcePost {
    fn from(d: LinkData) -> Self {
        SourcePost {
            id: d.id,
            author: d.author,
            title: d.title,
            body: d.selftext,
            url: d.url,
            permalink: d.permalink,
            flair: d.link_flair_text.filter(|f| !f.is_empty()),
        }
    }
}

fn check(response: HttpResponse) -> Result<String, FeedError> {
    if response.is_success() {
        Ok(response.body)
    } else {
        Err(FeedError::Status {
            status: response.status.as_u16(),
            body: response.body,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RedditFeed {
    http: HttpClient,
    api_base: String,
    subreddit: String,
    bearer: String,
}

impl RedditFeed {
    /// Obtains a bearer token with the account's username and password.
    ///
    /// Accounts with two-factor authentication enabled cannot use this grant.
    pub async fn connect(
        http: HttpClient,
        config: &RedditConfig,
        subreddit: &str,
    ) -> Result<Self, FeedError> {
        log::info!("Trying to access reddit...");
        let basic = STANDARD.encode(format!("{}:{}", config.client_id, config.client_secret));
        let response = http
            .post_form(
                &config.auth_url,
                &format!("Basic {}", basic),
                &[
                    ("grant_type", "password"),
                    ("username", config.username.as_str()),
                    ("password", config.password.as_str()),
                ],
            )
            .await?;
        let status = response.status;
        let token: TokenResponse = serde_json::from_str(&response.body)?;
        let access_token = match token.access_token {
            Some(t) if status.is_success() => t,
            _ => {
                return Err(FeedError::Auth(format!(
                    "{} ({})",
                    token.error.unwrap_or_else(|| "no access token".into()),
                    status
                )));
            }
        };
        log::info!("Authenticated as /u/{}", config.username);
        Ok(Self::with_token(
            http,
            &config.api_base,
            subreddit,
            &access_token,
        ))
    }

    pub fn with_token(http: HttpClient, api_base: &str, subreddit: &str, token: &str) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            subreddit: subreddit.to_string(),
            bearer: format!("bearer {}", token),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<T, FeedError> {
        let url = format!("{}{}", self.api_base, path_and_query);
        let body = check(self.http.get(&url, &self.bearer).await?)?;
        Ok(serde_json::from_str(&body)?)
    }

    /// POSTs a form to one of the `/api/*` endpoints and surfaces reported errors.
    async fn post_api(&self, path: &str, fields: &[(&str, &str)]) -> Result<(), FeedError> {
        let url = format!("{}{}", self.api_base, path);
        let body = check(self.http.post_form(&url, &self.bearer, fields).await?)?;
        let envelope: ApiEnvelope = serde_json::from_str(&body)?;
        if envelope.json.errors.is_empty() {
            Ok(())
        } else {
            Err(FeedError::Rejected(
                serde_json::Value::Array(envelope.json.errors).to_string(),
            ))
        }
    }
}

impl SourceFeed for RedditFeed {
    async fn list_recent(&self, limit: usize) -> Result<Vec<SourcePost>, FeedError> {
        let listing: Listing<LinkData> = self
            .get_json(&format!(
                "/r/{}/new?limit={}&raw_json=1",
                urlencoding::encode(&self.subreddit),
                limit
            ))
            .await?;
        Ok(listing
            .data
            .children
            .into_iter()
            .filter(|t| t.kind == "t3")
            .map(|t| SourcePost::from(t.data))
            .collect())
    }

    async fn post_has_reply_from(
        &self,
        post: &SourcePost,
        identity: &str,
    ) -> Result<Option<Reply>, FeedError> {
        // First listing is the post itself, second its comment tree.
        let (_, comments): (serde_json::Value, Listing<CommentData>) = self
            .get_json(&format!(
                "/comments/{}?raw_json=1",
                urlencoding::encode(&post.id)
            ))
            .await?;
        Ok(comments
            .data
            .children
            .into_iter()
            .filter(|t| t.kind == "t1")
            .find(|t| t.data.author == identity)
            .map(|t| Reply {
                id: t.data.id,
                post_id: post.id.clone(),
                author: t.data.author,
                body: t.data.body,
            }))
    }

    async fn submit_reply(&self, post: &SourcePost, text: &str) -> Result<(), FeedError> {
        let thing_id = format!("t3_{}", post.id);
        self.post_api(
            "/api/comment",
            &[("api_type", "json"), ("thing_id", thing_id.as_str()), ("text", text)],
        )
        .await
    }

    async fn edit_reply(&self, reply: &Reply, text: &str) -> Result<(), FeedError> {
        let thing_id = format!("t1_{}", reply.id);
        self.post_api(
            "/api/editusertext",
            &[("api_type", "json"), ("thing_id", thing_id.as_str()), ("text", text)],
        )
        .await
    }

    async fn get_removal_status(&self, external_id: &str) -> Result<Option<String>, FeedError> {
        let listing: Listing<LinkData> = self
            .get_json(&format!(
                "/api/info?id=t3_{}&raw_json=1",
                urlencoding::encode(external_id)
            ))
            .await?;
        match listing.data.children.into_iter().find(|t| t.kind == "t3") {
            Some(thing) => Ok(thing.data.removed_by_category),
            None => Ok(Some(MISSING_POST_REASON.to_string())),
        }
    }
}
