// src/client.rs

use crate::cli::TokenKind;
use crate::error::{Error, Result};
use crate::model::{Commit, Event, Project};
use chrono::{DateTime, FixedOffset};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

const PER_PAGE: u32 = 100;

/// Authenticated read access to one GitLab instance. All list operations
/// are exhaustive: they follow the `x-next-page` header until the remote
/// runs out of pages.
pub struct InstanceClient {
    instance: String,
    token: String,
    kind: TokenKind,
    http: Client,
    user: Option<User>,
}

#[derive(Debug, Clone, Deserialize)]
struct User {
    username: String,
    name: String,
    #[serde(default)]
    commit_email: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RemoteEvent {
    id: u64,
    project_id: u64,
    action_name: String,
    #[serde(default)]
    target_type: Option<String>,
    created_at: DateTime<FixedOffset>,
}

#[derive(Debug, Deserialize)]
struct RemoteProject {
    id: u64,
    created_at: DateTime<FixedOffset>,
    path_with_namespace: String,
    #[serde(default)]
    forked_from_project: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RemoteCommit {
    id: String,
    committed_date: DateTime<FixedOffset>,
}

impl InstanceClient {
    pub fn new(instance: &str, token: &str, kind: TokenKind) -> Result<Self> {
        if token.trim().is_empty() {
            return Err(Error::Authentication {
                instance: instance.to_string(),
                reason: "no token supplied".to_string(),
            });
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            instance: instance.trim_end_matches('/').to_string(),
            token: token.to_string(),
            kind,
            http,
            user: None,
        })
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Resolves the token against `/user` and remembers the identity; every
    /// other operation requires this to have succeeded.
    pub fn authenticate(&mut self) -> Result<()> {
        let resp = self.request("user", &[]).send()?;
        if resp.status() == StatusCode::UNAUTHORIZED || resp.status() == StatusCode::FORBIDDEN {
            return Err(Error::Authentication {
                instance: self.instance.clone(),
                reason: format!("remote rejected token ({})", resp.status()),
            });
        }
        let user: User = resp.error_for_status()?.json()?;
        info!(
            instance = %self.instance,
            username = %user.username,
            "authenticated as {} ({})",
            user.name,
            user.username
        );
        self.user = Some(user);
        Ok(())
    }

    fn user(&self) -> Result<&User> {
        self.user.as_ref().ok_or_else(|| Error::Authentication {
            instance: self.instance.clone(),
            reason: "not authenticated".to_string(),
        })
    }

    /// Email the remote attributes the user's commits to.
    fn commit_email(&self) -> Result<&str> {
        let user = self.user()?;
        user.commit_email
            .as_deref()
            .or(user.email.as_deref())
            .ok_or_else(|| Error::Authentication {
                instance: self.instance.clone(),
                reason: "user has no commit email".to_string(),
            })
    }

    fn request(&self, path: &str, query: &[(&str, &str)]) -> RequestBuilder {
        let req = self
            .http
            .get(format!("{}/api/v4/{}", self.instance, path))
            .query(query);
        match self.kind {
            TokenKind::Private => req.header("PRIVATE-TOKEN", &self.token),
            TokenKind::Oauth => req.bearer_auth(&self.token),
        }
    }

    fn get_paged<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<Vec<T>> {
        let mut out = Vec::new();
        let mut page = 1u32;
        loop {
            let per_page = PER_PAGE.to_string();
            let page_str = page.to_string();
            let resp = self
                .request(path, query)
                .query(&[("per_page", per_page.as_str()), ("page", page_str.as_str())])
                .send()?
                .error_for_status()?;
            let next = next_page(resp.headers());
            let batch: Vec<T> = resp.json()?;
            let exhausted = batch.is_empty();
            out.extend(batch);
            match next {
                Some(n) if !exhausted => page = n,
                _ => break,
            }
        }
        Ok(out)
    }

    /// All events representing project creations and merge acceptances,
    /// ascending per query; creations first, then acceptances.
    pub fn list_events(&self) -> Result<Vec<Event>> {
        self.user()?;
        let mut raw: Vec<RemoteEvent> =
            self.get_paged("events", &[("action", "created"), ("sort", "asc")])?;
        raw.extend(self.get_paged::<RemoteEvent>("events", &[("action", "merged"), ("sort", "asc")])?);
        info!(instance = %self.instance, "found {} events", raw.len());
        Ok(raw
            .into_iter()
            .map(|e| Event {
                id: e.id,
                project_id: e.project_id,
                action_name: e.action_name,
                target_type: e.target_type,
                created_at: e.created_at,
                instance: self.instance.clone(),
            })
            .collect())
    }

    /// All projects the identity is a member of, minus forks that do not
    /// live in the identity's own namespace (attributing upstream history
    /// to a fork would inflate the timeline).
    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let username = self.user()?.username.clone();
        let raw: Vec<RemoteProject> =
            self.get_paged("projects", &[("membership", "true"), ("sort", "asc")])?;
        let total = raw.len();
        let projects: Vec<Project> = raw
            .into_iter()
            .filter(|p| {
                let keep = keep_project(
                    p.forked_from_project.is_some(),
                    &p.path_with_namespace,
                    &username,
                );
                if !keep {
                    debug!(instance = %self.instance, project = %p.path_with_namespace, "skipping fork");
                }
                keep
            })
            .map(|p| Project {
                id: p.id,
                created_at: p.created_at,
                instance: self.instance.clone(),
            })
            .collect();
        info!(
            instance = %self.instance,
            "found {} projects ({} after fork filtering)",
            total,
            projects.len()
        );
        Ok(projects)
    }

    /// Commits authored by the identity across the given projects. A remote
    /// error on one project yields an empty set for that project only; one
    /// archived or inaccessible project must not block the rest.
    pub fn list_commits(&self, projects: &[Project]) -> Result<Vec<Commit>> {
        let email = self.commit_email()?.to_string();
        let mut out = Vec::new();
        for project in projects {
            let path = format!("projects/{}/repository/commits", project.id);
            let raw: Vec<RemoteCommit> = match self.get_paged(&path, &[("author", email.as_str())]) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(
                        instance = %self.instance,
                        project_id = project.id,
                        "commit listing failed, treating project as empty: {e}"
                    );
                    continue;
                }
            };
            let found = raw.len();
            let kept = raw
                .into_iter()
                .filter(|c| committed_after(&c.committed_date, &project.created_at))
                .map(|c| Commit {
                    id: c.id,
                    project_id: project.id,
                    committed_date: c.committed_date,
                    instance: self.instance.clone(),
                });
            let before = out.len();
            out.extend(kept);
            debug!(
                instance = %self.instance,
                project_id = project.id,
                "found {} commits, kept {}",
                found,
                out.len() - before
            );
        }
        info!(
            instance = %self.instance,
            "found {} commits by {} in {} projects",
            out.len(),
            email,
            projects.len()
        );
        Ok(out)
    }
}

/// Next page number according to the GitLab pagination headers. The last
/// page carries an empty `x-next-page` value.
fn next_page(headers: &HeaderMap) -> Option<u32> {
    headers
        .get("x-next-page")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
}

/// Forked projects only count when the identity's own namespace appears in
/// the fork's path.
fn keep_project(is_fork: bool, path_with_namespace: &str, username: &str) -> bool {
    !is_fork || path_with_namespace.contains(username)
}

/// Commits dated at or before project creation are noise from instance
/// migrations or fork ancestry.
fn committed_after(committed: &DateTime<FixedOffset>, project_created: &DateTime<FixedOffset>) -> bool {
    committed > project_created
}
