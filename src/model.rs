// src/model.rs

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A user event as exported from one instance (project created, merge
/// request opened/accepted, issue opened).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: u64,
    pub project_id: u64,
    pub action_name: String,
    /// Only meaningful when `action_name` is "opened".
    #[serde(default)]
    pub target_type: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub instance: String,
}

/// A project the user is a member of. Only used to bound commit queries:
/// commits dated before project creation stem from instance migrations or
/// forks and are excluded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub created_at: DateTime<FixedOffset>,
    pub instance: String,
}

/// A commit authored by the user. `id` is the content hash, which makes it
/// the natural dedup key across fetch batches and pagination overlaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub id: String,
    pub project_id: u64,
    pub committed_date: DateTime<FixedOffset>,
    pub instance: String,
}

/// The closed set of contribution kinds. Adding a kind here forces every
/// match over it to be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionKind {
    Project,
    MergeRequest,
    Issue,
    Commit,
}

/// One normalized unit of activity. Erases the heterogeneity of the raw
/// sources; the merger and replayer operate on nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    #[serde(rename = "contribution_type")]
    pub kind: ContributionKind,
    pub message: String,
    pub project_id: u64,
    pub date: DateTime<FixedOffset>,
    pub instance: String,
}

/// Per-category tallies over the contribution set. Reporting only, never
/// control flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub projects: ProjectCounts,
    pub merge_requests: MergeRequestCounts,
    pub issues: IssueCounts,
    pub commits: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCounts {
    pub created: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRequestCounts {
    pub opened: u64,
    pub accepted: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCounts {
    pub opened: u64,
}

impl Counts {
    pub fn total(&self) -> u64 {
        self.projects.created
            + self.merge_requests.opened
            + self.merge_requests.accepted
            + self.issues.opened
            + self.commits
    }
}
