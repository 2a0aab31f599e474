// src/pipeline.rs

use crate::cache::{CacheKind, ExportCache};
use crate::cli::TokenKind;
use crate::client::InstanceClient;
use crate::error::Result;
use crate::model::{Commit, Contribution, Counts, Event, Project};
use crate::replay::Replayer;
use crate::timeline::{dedupe_commits, merge, normalize};
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// One instance/token pair. Opaque to the pipeline beyond being handed to
/// the client; where the token came from is the caller's business.
#[derive(Debug, Clone)]
pub struct Credential {
    pub instance: String,
    pub token: String,
    pub kind: TokenKind,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub credentials: Vec<Credential>,
    pub cache_dir: PathBuf,
    pub repo_path: PathBuf,
    pub author_name: String,
    pub author_email: String,
}

/// The sequence-out half of the upstream contract: the merged timeline plus
/// its tallies and the number of commits replayed.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub contributions: Vec<Contribution>,
    pub counts: Counts,
    pub commits_written: usize,
}

/// Drives one end-to-end run: cache check, conditional fetch with cache
/// write-back, dedup, normalize, merge, replay.
///
/// Each kind resumes all-or-nothing from its snapshot. Instances are only
/// contacted when at least one kind is missing; per-kind fetches fan out
/// across instances in parallel and are concatenated in configured order
/// before anything downstream starts.
pub fn run(config: &RunConfig) -> Result<RunSummary> {
    let cache = ExportCache::new(&config.cache_dir);
    let cached_events = cache.load::<Event>(CacheKind::Events);
    let cached_projects = cache.load::<Project>(CacheKind::Projects);
    let cached_commits = cache.load::<Commit>(CacheKind::Commits);

    let need_fetch =
        cached_events.is_none() || cached_projects.is_none() || cached_commits.is_none();
    let clients = if need_fetch {
        let mut clients = config
            .credentials
            .iter()
            .map(|c| InstanceClient::new(&c.instance, &c.token, c.kind))
            .collect::<Result<Vec<_>>>()?;
        clients
            .par_iter_mut()
            .try_for_each(|client| client.authenticate())?;
        clients
    } else {
        Vec::new()
    };

    let events = match cached_events {
        Some(events) => events,
        None => {
            let per_instance: Vec<Vec<Event>> = clients
                .par_iter()
                .map(|client| client.list_events())
                .collect::<Result<_>>()?;
            let events: Vec<Event> = per_instance.into_iter().flatten().collect();
            cache.save(CacheKind::Events, &events)?;
            events
        }
    };

    let projects = match cached_projects {
        Some(projects) => projects,
        None => {
            let per_instance: Vec<Vec<Project>> = clients
                .par_iter()
                .map(|client| client.list_projects())
                .collect::<Result<_>>()?;
            let projects: Vec<Project> = per_instance.into_iter().flatten().collect();
            cache.save(CacheKind::Projects, &projects)?;
            projects
        }
    };

    let commits = match cached_commits {
        Some(commits) => commits,
        None => {
            // Commit fetch per instance is scoped to that instance's own
            // projects; project ids are only unique per instance.
            let per_instance: Vec<Vec<Commit>> = clients
                .par_iter()
                .map(|client| {
                    let scoped: Vec<Project> = projects
                        .iter()
                        .filter(|p| p.instance == client.instance())
                        .cloned()
                        .collect();
                    client.list_commits(&scoped)
                })
                .collect::<Result<_>>()?;
            let commits: Vec<Commit> = per_instance.into_iter().flatten().collect();
            cache.save(CacheKind::Commits, &commits)?;
            commits
        }
    };

    let commits = dedupe_commits(commits);
    let (contributions, counts) = normalize(&events, &commits)?;
    let contributions = merge(contributions);
    info!(
        "normalized {} contributions from {} events and {} commits",
        contributions.len(),
        events.len(),
        commits.len()
    );

    let mut replayer = Replayer::new(&config.repo_path, &config.author_name, &config.author_email);
    replayer.init_repo()?;
    let commits_written = replayer.replay(&contributions)?;

    Ok(RunSummary {
        contributions,
        counts,
        commits_written,
    })
}
