use std::time::Duration;

use anyhow::Context as _;
use tracing::debug;

use crate::{
    error::{RenderError, RenderResult},
    model::UserIdentity,
    settings::Settings,
};

#[derive(serde::Deserialize)]
struct MeResponse {
    user: UserIdentity,
}

/// Identity and patch-feed lookups. Both are fetched fresh per render call;
/// tokens and patches can change between calls.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    api_base: String,
    patchnotes_url: String,
}

impl ApiClient {
    pub fn new(settings: &Settings) -> RenderResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(settings.user_agent.clone())
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            patchnotes_url: settings.patchnotes_url.clone(),
        })
    }

    /// Resolves the identity behind a session token.
    pub async fn fetch_identity(&self, token: &str) -> RenderResult<UserIdentity> {
        let url = format!("{}/users/me", self.api_base);
        let resp: MeResponse = self
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .context("identity request failed")?
            .error_for_status()
            .context("identity request rejected")?
            .json()
            .await
            .context("identity response did not parse")?;
        debug!(username = %resp.user.username, "resolved identity");
        Ok(resp.user)
    }

    /// The most recent patch identifier: the first key of the feed object.
    pub async fn fetch_last_patch(&self) -> RenderResult<String> {
        let notes: serde_json::Value = self
            .http
            .get(&self.patchnotes_url)
            .send()
            .await
            .context("patch-notes request failed")?
            .error_for_status()
            .context("patch-notes request rejected")?
            .json()
            .await
            .context("patch-notes response did not parse")?;

        notes
            .as_object()
            .and_then(|o| o.keys().next())
            .map(String::from)
            .ok_or_else(|| RenderError::validation("patch-notes feed has no entries"))
    }
}
