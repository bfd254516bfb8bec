use super::query::{
    contributions_query, issues_query, ContributionWindow, ContributionsData, GraphQlResponse,
    IssuePage, IssuesData,
};
use crate::error::{ContribError, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;

/// The two remote queries the collectors need.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    async fn contributions(
        &self,
        username: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        max: u32,
    ) -> Result<ContributionWindow>;

    async fn issues(
        &self,
        owner: &str,
        repo: &str,
        username: &str,
        before: Option<&str>,
    ) -> Result<IssuePage>;
}

#[derive(Debug, Clone)]
pub struct GraphQlClient {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl GraphQlClient {
    pub fn new(endpoint: impl Into<String>, token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("contribstat/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token,
        })
    }

    async fn post<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "query": query, "variables": variables }));

        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ContribError::Api(format!("HTTP {status}: {}", body.trim())));
        }

        let parsed: GraphQlResponse<T> = response.json().await?;
        if !parsed.errors.is_empty() {
            let messages: Vec<_> = parsed.errors.into_iter().map(|e| e.message).collect();
            return Err(ContribError::Api(messages.join("; ")));
        }
        parsed
            .data
            .ok_or_else(|| ContribError::Api("response carried no data".to_string()))
    }
}

#[async_trait]
impl GitHubApi for GraphQlClient {
    async fn contributions(
        &self,
        username: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        max: u32,
    ) -> Result<ContributionWindow> {
        let data: ContributionsData = self
            .post(
                contributions_query(),
                json!({
                    "username": username,
                    "from": from.to_rfc3339_opts(SecondsFormat::Millis, true),
                    "to": to.to_rfc3339_opts(SecondsFormat::Millis, true),
                    "max": max,
                }),
            )
            .await?;

        let user = data
            .user
            .ok_or_else(|| ContribError::Api(format!("user '{username}' not found")))?;
        Ok(user.into())
    }

    async fn issues(
        &self,
        owner: &str,
        repo: &str,
        username: &str,
        before: Option<&str>,
    ) -> Result<IssuePage> {
        let data: IssuesData = self
            .post(
                &issues_query(),
                json!({
                    "owner": owner,
                    "repo": repo,
                    "username": username,
                    "to": before,
                }),
            )
            .await?;

        let repository = data
            .repository
            .ok_or_else(|| ContribError::Api(format!("repository '{owner}/{repo}' not found")))?;
        Ok(repository.issues.into())
    }
}
