// src/timeline.rs
//
// The pure middle of the pipeline: dedup raw commits, normalize raw records
// into contributions, merge everything into one ascending timeline.

use crate::error::{Error, Result};
use crate::model::{Commit, Contribution, ContributionKind, Counts, Event};
use std::collections::HashSet;

/// Drops repeated commit ids, keeping the first occurrence. Pagination
/// overlap and repeated fetches across runs can both resurface the same
/// content hash; identical ids are the same commit.
pub fn dedupe_commits(commits: Vec<Commit>) -> Vec<Commit> {
    let mut seen = HashSet::with_capacity(commits.len());
    commits
        .into_iter()
        .filter(|c| seen.insert(c.id.clone()))
        .collect()
}

/// Converts events and commits into the uniform contribution shape and
/// tallies per-category counts. The rule table is closed: an event outside
/// it is a hard error, because silently dropping activity would under-report
/// without any signal.
pub fn normalize(events: &[Event], commits: &[Commit]) -> Result<(Vec<Contribution>, Counts)> {
    let mut contributions = Vec::with_capacity(events.len() + commits.len());
    let mut counts = Counts::default();

    for event in events {
        let (kind, message) = match event.action_name.as_str() {
            "created" => {
                counts.projects.created += 1;
                (ContributionKind::Project, "Created project")
            }
            "opened" => match event.target_type.as_deref() {
                Some("MergeRequest") => {
                    counts.merge_requests.opened += 1;
                    (ContributionKind::MergeRequest, "Opened merge request")
                }
                Some("Issue") => {
                    counts.issues.opened += 1;
                    (ContributionKind::Issue, "Opened issue")
                }
                _ => {
                    return Err(Error::UnknownContributionKind {
                        id: event.id,
                        action: event.action_name.clone(),
                        target: event.target_type.clone(),
                    })
                }
            },
            "accepted" => {
                counts.merge_requests.accepted += 1;
                (ContributionKind::MergeRequest, "Accepted merge request")
            }
            _ => {
                return Err(Error::UnknownContributionKind {
                    id: event.id,
                    action: event.action_name.clone(),
                    target: event.target_type.clone(),
                })
            }
        };
        contributions.push(Contribution {
            kind,
            message: message.to_string(),
            project_id: event.project_id,
            date: event.created_at,
            instance: event.instance.clone(),
        });
    }

    for commit in commits {
        counts.commits += 1;
        contributions.push(Contribution {
            kind: ContributionKind::Commit,
            message: "Committed to project".to_string(),
            project_id: commit.project_id,
            date: commit.committed_date,
            instance: commit.instance.clone(),
        });
    }

    Ok((contributions, counts))
}

/// Sorts contributions ascending by date. The sort is stable on purpose:
/// equal instants keep input order (events before commits, instances in
/// configured order), which keeps replayed histories reproducible.
pub fn merge(mut contributions: Vec<Contribution>) -> Vec<Contribution> {
    contributions.sort_by_key(|c| c.date);
    contributions
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset};

    fn ts(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn event(id: u64, action: &str, target: Option<&str>, date: &str) -> Event {
        Event {
            id,
            project_id: 5,
            action_name: action.to_string(),
            target_type: target.map(str::to_string),
            created_at: ts(date),
            instance: "https://a.example.com".to_string(),
        }
    }

    fn commit(id: &str, date: &str) -> Commit {
        Commit {
            id: id.to_string(),
            project_id: 5,
            committed_date: ts(date),
            instance: "https://a.example.com".to_string(),
        }
    }

    #[test]
    fn dedupe_keeps_one_entry_per_id_in_first_seen_order() {
        let commits = vec![
            commit("aaa", "2024-01-01T00:00:00Z"),
            commit("bbb", "2024-01-02T00:00:00Z"),
            commit("aaa", "2024-01-03T00:00:00Z"),
            commit("ccc", "2024-01-04T00:00:00Z"),
        ];
        let deduped = dedupe_commits(commits);
        let ids: Vec<&str> = deduped.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["aaa", "bbb", "ccc"]);
        // first occurrence wins
        assert_eq!(deduped[0].committed_date, ts("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn dedupe_is_idempotent() {
        let commits = vec![
            commit("aaa", "2024-01-01T00:00:00Z"),
            commit("aaa", "2024-01-02T00:00:00Z"),
            commit("bbb", "2024-01-03T00:00:00Z"),
        ];
        let once = dedupe_commits(commits);
        let twice = dedupe_commits(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn normalize_maps_every_known_shape() {
        let events = vec![
            event(1, "created", None, "2024-01-01T00:00:00Z"),
            event(2, "opened", Some("MergeRequest"), "2024-01-02T00:00:00Z"),
            event(3, "opened", Some("Issue"), "2024-01-03T00:00:00Z"),
            event(4, "accepted", None, "2024-01-04T00:00:00Z"),
        ];
        let commits = vec![commit("aaa", "2024-01-05T00:00:00Z")];

        let (contributions, counts) = normalize(&events, &commits).unwrap();

        let kinds: Vec<ContributionKind> = contributions.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ContributionKind::Project,
                ContributionKind::MergeRequest,
                ContributionKind::Issue,
                ContributionKind::MergeRequest,
                ContributionKind::Commit,
            ]
        );
        let messages: Vec<&str> = contributions.iter().map(|c| c.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Created project",
                "Opened merge request",
                "Opened issue",
                "Accepted merge request",
                "Committed to project",
            ]
        );
        assert_eq!(counts.projects.created, 1);
        assert_eq!(counts.merge_requests.opened, 1);
        assert_eq!(counts.merge_requests.accepted, 1);
        assert_eq!(counts.issues.opened, 1);
        assert_eq!(counts.commits, 1);
    }

    #[test]
    fn counts_total_matches_contribution_len() {
        let events = vec![
            event(1, "created", None, "2024-01-01T00:00:00Z"),
            event(2, "opened", Some("Issue"), "2024-01-02T00:00:00Z"),
            event(3, "accepted", None, "2024-01-03T00:00:00Z"),
        ];
        let commits = vec![
            commit("aaa", "2024-01-04T00:00:00Z"),
            commit("bbb", "2024-01-05T00:00:00Z"),
        ];
        let (contributions, counts) = normalize(&events, &commits).unwrap();
        assert_eq!(counts.total(), contributions.len() as u64);
    }

    #[test]
    fn unknown_action_is_a_hard_error() {
        let events = vec![event(9, "left", None, "2024-01-01T00:00:00Z")];
        let err = normalize(&events, &[]).unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownContributionKind { id: 9, .. }
        ));
    }

    #[test]
    fn unknown_open_target_is_a_hard_error() {
        let events = vec![event(9, "opened", Some("Milestone"), "2024-01-01T00:00:00Z")];
        let err = normalize(&events, &[]).unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownContributionKind { id: 9, .. }
        ));
    }

    #[test]
    fn merge_orders_by_date_ascending() {
        let (contributions, _) = normalize(
            &[
                event(1, "created", None, "2024-03-01T00:00:00Z"),
                event(2, "accepted", None, "2024-01-01T00:00:00Z"),
            ],
            &[commit("aaa", "2024-02-01T00:00:00Z")],
        )
        .unwrap();
        let merged = merge(contributions);
        let dates: Vec<_> = merged.iter().map(|c| c.date).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);
    }

    #[test]
    fn merge_is_stable_for_equal_instants() {
        // Same instant everywhere: events keep their input order and stay
        // ahead of the commit, which normalize appended last.
        let (contributions, _) = normalize(
            &[
                event(1, "created", None, "2024-01-01T00:00:00Z"),
                event(2, "opened", Some("Issue"), "2024-01-01T00:00:00Z"),
            ],
            &[commit("aaa", "2024-01-01T00:00:00Z")],
        )
        .unwrap();
        let merged = merge(contributions);
        assert_eq!(merged[0].kind, ContributionKind::Project);
        assert_eq!(merged[1].kind, ContributionKind::Issue);
        assert_eq!(merged[2].kind, ContributionKind::Commit);
    }

    #[test]
    fn merge_compares_instants_across_offsets() {
        // 10:00+02:00 is the instant 08:00Z, so it sorts between 07:00Z
        // and 09:00Z despite its larger local time.
        let (contributions, _) = normalize(
            &[event(1, "created", None, "2024-01-01T10:00:00+02:00")],
            &[
                commit("aaa", "2024-01-01T09:00:00Z"),
                commit("bbb", "2024-01-01T07:00:00Z"),
            ],
        )
        .unwrap();
        let merged = merge(contributions);
        assert_eq!(merged[0].date, ts("2024-01-01T07:00:00Z"));
        assert_eq!(merged[1].date, ts("2024-01-01T10:00:00+02:00"));
        assert_eq!(merged[2].date, ts("2024-01-01T09:00:00Z"));
    }
}
