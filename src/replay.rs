// src/replay.rs

use crate::error::{Error, Result};
use crate::model::Contribution;
use git2::{ErrorCode, Oid, Repository, Signature, Time};
use indicatif::ProgressBar;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Materializes the merged timeline as a fresh local repository: one empty,
/// backdated commit per contribution. The replayer never reorders; it trusts
/// the merger to have sorted its input.
pub struct Replayer {
    path: PathBuf,
    author_name: String,
    author_email: String,
    repo: Option<Repository>,
}

impl Replayer {
    pub fn new(path: impl Into<PathBuf>, author_name: &str, author_email: &str) -> Self {
        Self {
            path: path.into(),
            author_name: author_name.to_string(),
            author_email: author_email.to_string(),
            repo: None,
        }
    }

    /// Destroys any previous repository at the target path and initializes
    /// an empty one. Repeat runs must not accumulate stale history.
    pub fn init_repo(&mut self) -> Result<()> {
        if self.path.exists() {
            info!("deleting existing repository at {}", self.path.display());
            fs::remove_dir_all(&self.path)?;
        }
        let repo = Repository::init(&self.path)?;
        info!("created new repository at {}", self.path.display());
        self.repo = Some(repo);
        Ok(())
    }

    /// Writes one commit per contribution, in input order. Returns the
    /// number of commits written.
    pub fn replay(&self, contributions: &[Contribution]) -> Result<usize> {
        let bar = ProgressBar::new(contributions.len() as u64);
        bar.set_message("Replaying contributions");
        for contribution in contributions {
            let oid = self.create_commit(contribution)?;
            debug!("created commit {oid} for contribution at {}", contribution.date);
            bar.inc(1);
        }
        bar.finish_with_message("Replay complete");
        Ok(contributions.len())
    }

    /// One empty commit (no tree delta, an activity marker) whose author and
    /// committer timestamps are the contribution's date, original UTC offset
    /// preserved.
    fn create_commit(&self, contribution: &Contribution) -> Result<Oid> {
        let repo = self.repo.as_ref().ok_or(Error::NoRepository)?;

        let message = format!(
            "{}\n\nDate: {}\n(Project ID: {}, Instance: {})",
            contribution.message,
            contribution.date.to_rfc3339(),
            contribution.project_id,
            contribution.instance,
        );

        let when = Time::new(
            contribution.date.timestamp(),
            contribution.date.offset().local_minus_utc() / 60,
        );
        let signature = Signature::new(&self.author_name, &self.author_email, &when)?;

        let tree_id = repo.index()?.write_tree()?;
        let tree = repo.find_tree(tree_id)?;

        let parent = match repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        let oid = repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            &message,
            &tree,
            &parents,
        )?;
        Ok(oid)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
