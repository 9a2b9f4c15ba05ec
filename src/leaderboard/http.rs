use std::fmt;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use tracing::{debug, warn};

use super::{
    parse_leaderboard, parse_receipt, Leaderboard, LeaderboardPage, ScoreSubmission,
    SubmissionReceipt,
};
use crate::{Error, Result};

pub const TOKEN_ENV: &str = "MARSSPACE_TOKEN";

/// Access token for the MarsSpace API, held in memory for the lifetime of the client
#[derive(Clone, Default)]
pub struct AuthSession {
    token: Option<String>,
}

impl AuthSession {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
        }
    }

    /// Explicit token first, then the environment
    pub fn resolve(explicit: Option<String>) -> Self {
        let session = Self::new(explicit);
        if session.is_authenticated() {
            return session;
        }
        Self::new(std::env::var(TOKEN_ENV).ok())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// The MarsSpace REST backend
#[derive(Debug)]
pub struct HttpLeaderboard {
    base_url: String,
    auth: AuthSession,
    client: Client,
}

impl HttpLeaderboard {
    pub fn new(base_url: &str, auth: AuthSession, timeout: Duration) -> Result<Self> {
        let base_url = normalize_base_url(base_url)?;
        if !auth.is_authenticated() {
            warn!("no access token configured, submissions will likely be rejected");
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url,
            auth,
            client,
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(Error::Config(format!(
            "server url must start with http:// or https://, got `{raw}`"
        )));
    }
    Ok(trimmed.to_string())
}

fn read_body(response: Response) -> Result<String> {
    let status = response.status();
    let body = response.text()?;
    if !status.is_success() {
        return Err(Error::HttpStatus { status, body });
    }
    Ok(body)
}

impl Leaderboard for HttpLeaderboard {
    fn submit(&self, submission: &ScoreSubmission) -> Result<SubmissionReceipt> {
        let url = self.endpoint("typing/");
        debug!(%url, ?submission, "submitting score");
        let response = self
            .auth
            .apply(self.client.post(&url))
            .json(submission)
            .send()?;
        parse_receipt(&read_body(response)?)
    }

    fn fetch(&self) -> Result<LeaderboardPage> {
        let url = self.endpoint("leaderboard/");
        debug!(%url, "fetching leaderboard");
        let response = self.auth.apply(self.client.get(&url)).send()?;
        parse_leaderboard(&read_body(response)?)
    }

    fn name(&self) -> &'static str {
        "marsspace"
    }
}
