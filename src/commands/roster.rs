//! Batch setup and teardown of numbered team/repository pairs.
//!
//! Entry `i` of a roster gets a team named `i` and a repository named `i`,
//! and the user at position `i` becomes a member of that team.

use crate::admin::{Admin, Operation};
use crate::commands::{GlobalArgs, Session};
use crate::display;
use crate::error::{AssignmeError, Result};
use crate::github::Permission;
use crate::snapshot::TeamSnapshot;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub step: String,
    pub ok: bool,
    pub detail: String,
}

struct Runner<'a> {
    admin: Admin<'a>,
    reports: Vec<StepReport>,
}

impl<'a> Runner<'a> {
    fn new(admin: Admin<'a>) -> Self {
        Self {
            admin,
            reports: Vec::new(),
        }
    }

    async fn step(&mut self, index: usize, op: Operation) -> bool {
        let step = op.label();
        let (ok, detail) = match self.admin.run(&op).await {
            Ok(outcome) => (true, outcome.status.to_string()),
            Err(e) => {
                display::warn(&format!("{step} failed: {e}"));
                (false, e.to_string())
            }
        };
        self.reports.push(StepReport {
            index,
            step,
            ok,
            detail,
        });
        ok
    }
}

pub fn setup_operations(org: &str, users: &[String], permission: Permission) -> Vec<Operation> {
    let mut ops = Vec::with_capacity(users.len() * 5 + 1);
    for i in 0..users.len() {
        ops.push(Operation::CreateTeam {
            org: org.to_string(),
            name: i.to_string(),
        });
        ops.push(Operation::CreateRepo {
            org: org.to_string(),
            name: i.to_string(),
        });
    }
    ops.push(Operation::ListTeams {
        org: org.to_string(),
    });
    for (i, user) in users.iter().enumerate() {
        let name = i.to_string();
        ops.push(Operation::AddRepoToTeam {
            org: org.to_string(),
            repo: name.clone(),
            team: name.clone(),
        });
        ops.push(Operation::AddUserToTeam {
            org: org.to_string(),
            user: user.clone(),
            team: name.clone(),
        });
        ops.push(Operation::SetRepoPermission {
            org: org.to_string(),
            repo: name.clone(),
            team: name,
            permission,
        });
    }
    ops
}

/// Steps for pair `index` once the listing has been refreshed. `ids` is
/// `None` when the refresh failed; only the repository is deleted then.
/// A team missing from `ids` keeps its team-scoped steps out of the list.
fn teardown_steps(
    org: &str,
    index: usize,
    users: &[String],
    ids: Option<&HashMap<String, u64>>,
) -> Vec<Operation> {
    let name = index.to_string();
    let mut ops = Vec::new();
    if let Some(ids) = ids {
        match ids.get(&name) {
            Some(&id) => {
                if let Some(op) = teardown_memberships(org, index, users) {
                    ops.push(op);
                }
                ops.push(Operation::RemoveRepoFromTeam {
                    org: org.to_string(),
                    repo: name.clone(),
                    team: name.clone(),
                });
                ops.push(Operation::DeleteTeam { id });
            }
            None => display::warn(&format!("Team {name} is not in the snapshot, skipped")),
        }
    }
    ops.push(Operation::DeleteRepo {
        org: org.to_string(),
        name,
    });
    ops
}

/// Sends `ops` in order. A failed refresh stops the run, since no team
/// after it could be resolved.
async fn run_setup(admin: Admin<'_>, ops: Vec<Operation>) -> Vec<StepReport> {
    let mut runner = Runner::new(admin);
    for op in ops {
        let index = roster_index(&op);
        let refresh = matches!(op, Operation::ListTeams { .. });
        if !runner.step(index, op).await && refresh {
            break;
        }
    }
    runner.reports
}

async fn run_teardown(
    admin: Admin<'_>,
    org: &str,
    count: usize,
    users: &[String],
) -> Result<Vec<StepReport>> {
    let mut runner = Runner::new(admin);

    let refreshed = runner
        .step(
            0,
            Operation::ListTeams {
                org: org.to_string(),
            },
        )
        .await;
    let ids = if refreshed {
        Some(TeamSnapshot::load(runner.admin.snapshot())?.ids())
    } else {
        None
    };

    for i in 0..count {
        for op in teardown_steps(org, i, users, ids.as_ref()) {
            runner.step(i, op).await;
        }
    }
    Ok(runner.reports)
}

pub async fn setup(args: &GlobalArgs, users: &[String], permission: Permission) -> Result<()> {
    let session = Session::open(args)?;
    let ops = setup_operations(&session.org, users, permission);

    if args.dry_run {
        return show_plan(args, &ops);
    }

    let client = session.client(args)?;
    client.warn_if_rate_limited(ops.len() as u64).await.ok();

    let reports = run_setup(Admin::new(&client, &session.snapshot), ops).await;

    client.check_rate_limit_if_verbose().await;
    finish(args, &reports)
}

pub async fn teardown(args: &GlobalArgs, count: usize, users: &[String]) -> Result<()> {
    let session = Session::open(args)?;
    let org = session.org.as_str();

    if args.dry_run {
        // Planned against the current snapshot; the run refreshes it first.
        let ids = match TeamSnapshot::load(&session.snapshot) {
            Ok(snapshot) => snapshot.ids(),
            Err(e) => {
                display::warn(&e.to_string());
                HashMap::new()
            }
        };
        let mut ops = vec![Operation::ListTeams {
            org: org.to_string(),
        }];
        for i in 0..count {
            ops.extend(teardown_steps(org, i, users, Some(&ids)));
        }
        return show_plan(args, &ops);
    }

    let client = session.client(args)?;
    let reports = run_teardown(Admin::new(&client, &session.snapshot), org, count, users).await?;

    client.check_rate_limit_if_verbose().await;
    finish(args, &reports)
}

fn teardown_memberships(org: &str, index: usize, users: &[String]) -> Option<Operation> {
    users.get(index).map(|user| Operation::RemoveUserFromTeam {
        org: org.to_string(),
        user: user.clone(),
        team: index.to_string(),
    })
}

fn roster_index(op: &Operation) -> usize {
    let name = match op {
        Operation::CreateTeam { name, .. } | Operation::CreateRepo { name, .. } => name,
        Operation::AddRepoToTeam { team, .. }
        | Operation::AddUserToTeam { team, .. }
        | Operation::SetRepoPermission { team, .. } => team,
        _ => return 0,
    };
    name.parse().unwrap_or(0)
}

fn show_plan(args: &GlobalArgs, ops: &[Operation]) -> Result<()> {
    display::output(args.json, &ops, |ops| {
        display::section_header("Planned operations");
        for op in ops.iter() {
            println!("  {} {}", "→".yellow(), op.label());
        }
    });
    Ok(())
}

/// Prints the report; any failed step makes the whole run an error.
fn finish(args: &GlobalArgs, reports: &[StepReport]) -> Result<()> {
    display::output(args.json, &reports, |reports| {
        render_report(reports);
    });
    check_reports(reports)
}

fn check_reports(reports: &[StepReport]) -> Result<()> {
    let failed = reports.iter().filter(|r| !r.ok).count();
    if failed > 0 {
        return Err(AssignmeError::StepsFailed {
            failed,
            total: reports.len(),
        });
    }
    Ok(())
}

fn render_report(reports: &[StepReport]) {
    if reports.is_empty() {
        display::warn("Nothing was done.");
        return;
    }

    display::section_header("Roster");

    let mut table = display::new_table(&["#", "Step", "Result"]);
    for r in reports {
        let result = if r.ok {
            format!("ok ({})", r.detail)
        } else {
            r.detail.clone()
        };
        table.add_row(vec![r.index.to_string(), r.step.clone(), result]);
    }
    println!("{table}");

    if reports.iter().all(|r| r.ok) {
        display::success(&format!("{} step(s) completed.", reports.len()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::{Credential, GithubClient};
    use serde_json::json;
    use std::path::PathBuf;
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GithubClient {
        GithubClient::with_base_uri(&Credential::new("ghp_test"), &server.uri(), false).unwrap()
    }

    fn temp_snapshot() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("team.json");
        (dir, path)
    }

    fn steps(reports: &[StepReport]) -> Vec<&str> {
        reports.iter().map(|r| r.step.as_str()).collect()
    }

    async fn sent(server: &MockServer) -> Vec<String> {
        server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| format!("{} {}", r.method, r.url.path()))
            .collect()
    }

    fn users() -> Vec<String> {
        vec!["theferrit32".to_string(), "shorsher".to_string()]
    }

    #[test]
    fn setup_creates_before_refreshing_and_assigning() {
        let ops = setup_operations("assignme", &users(), Permission::Pull);
        assert_eq!(ops.len(), 2 * 2 + 1 + 2 * 3);
        let refresh = ops
            .iter()
            .position(|op| matches!(op, Operation::ListTeams { .. }))
            .unwrap();
        assert_eq!(refresh, 4);
        assert!(ops[..refresh]
            .iter()
            .all(|op| matches!(op, Operation::CreateTeam { .. } | Operation::CreateRepo { .. })));
        assert_eq!(
            ops[refresh + 2],
            Operation::AddUserToTeam {
                org: "assignme".to_string(),
                user: "theferrit32".to_string(),
                team: "0".to_string(),
            }
        );
    }

    #[test]
    fn setup_applies_requested_permission() {
        let ops = setup_operations("assignme", &users(), Permission::Push);
        let levels: Vec<Permission> = ops
            .iter()
            .filter_map(|op| match op {
                Operation::SetRepoPermission { permission, .. } => Some(*permission),
                _ => None,
            })
            .collect();
        assert_eq!(levels, vec![Permission::Push, Permission::Push]);
    }

    #[test]
    fn roster_index_follows_team_name() {
        let ops = setup_operations("assignme", &users(), Permission::Pull);
        let indexes: Vec<usize> = ops.iter().map(roster_index).collect();
        assert_eq!(indexes, vec![0, 0, 1, 1, 0, 0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn teardown_only_removes_known_users() {
        assert!(teardown_memberships("assignme", 5, &users()).is_none());
        assert_eq!(
            teardown_memberships("assignme", 1, &users()),
            Some(Operation::RemoveUserFromTeam {
                org: "assignme".to_string(),
                user: "shorsher".to_string(),
                team: "1".to_string(),
            })
        );
    }

    #[test]
    fn teardown_steps_skip_unknown_team() {
        let ids = HashMap::from([("0".to_string(), 111)]);
        let known = teardown_steps("assignme", 0, &users(), Some(&ids));
        assert_eq!(
            known.iter().map(Operation::label).collect::<Vec<_>>(),
            [
                "remove user theferrit32 from team 0",
                "remove repo 0 from team 0",
                "delete team 111",
                "delete repo 0",
            ]
        );

        let unknown = teardown_steps("assignme", 1, &users(), Some(&ids));
        assert_eq!(
            unknown,
            vec![Operation::DeleteRepo {
                org: "assignme".to_string(),
                name: "1".to_string(),
            }]
        );

        let unrefreshed = teardown_steps("assignme", 0, &users(), None);
        assert_eq!(unrefreshed.len(), 1);
    }

    #[test]
    fn failed_steps_make_the_run_fail() {
        let report = |ok| StepReport {
            index: 0,
            step: "create repo 0".to_string(),
            ok,
            detail: String::new(),
        };
        assert!(check_reports(&[report(true), report(true)]).is_ok());
        assert!(matches!(
            check_reports(&[report(true), report(false), report(false)]),
            Err(AssignmeError::StepsFailed {
                failed: 2,
                total: 3
            })
        ));
    }

    #[tokio::test]
    async fn setup_sends_steps_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orgs/assignme/teams"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 5 })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/orgs/assignme/repos"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 1 })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/orgs/assignme/teams"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"[{"name":"0","id":5}]"#))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path_regex("^/teams/5/"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let (_dir, snapshot) = temp_snapshot();
        let client = client_for(&server);
        let ops = setup_operations("assignme", &["octocat".to_string()], Permission::Push);
        let reports = run_setup(Admin::new(&client, &snapshot), ops).await;

        assert!(reports.iter().all(|r| r.ok));
        assert_eq!(
            sent(&server).await,
            [
                "POST /orgs/assignme/teams",
                "POST /orgs/assignme/repos",
                "GET /orgs/assignme/teams",
                "PUT /teams/5/repos/assignme/0",
                "PUT /teams/5/memberships/octocat",
                "PUT /teams/5/repos/assignme/0",
            ]
        );
    }

    #[tokio::test]
    async fn setup_stops_after_failed_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 5 })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/orgs/assignme/teams"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({ "message": "Server Error" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;

        let (_dir, snapshot) = temp_snapshot();
        let client = client_for(&server);
        let ops = setup_operations("assignme", &users(), Permission::Pull);
        let reports = run_setup(Admin::new(&client, &snapshot), ops).await;

        assert_eq!(reports.len(), 5);
        assert_eq!(reports[4].step, "refresh team listing");
        assert!(!reports[4].ok);
        assert!(matches!(
            check_reports(&reports),
            Err(AssignmeError::StepsFailed {
                failed: 1,
                total: 5
            })
        ));
        assert!(!snapshot.exists());
    }

    #[tokio::test]
    async fn teardown_skips_team_missing_from_listing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orgs/assignme/teams"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"[{"name":"0","id":111}]"#),
            )
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let (_dir, snapshot) = temp_snapshot();
        let client = client_for(&server);
        let reports = run_teardown(
            Admin::new(&client, &snapshot),
            "assignme",
            2,
            &["octocat".to_string()],
        )
        .await
        .unwrap();

        assert!(reports.iter().all(|r| r.ok));
        assert_eq!(
            steps(&reports),
            [
                "refresh team listing",
                "remove user octocat from team 0",
                "remove repo 0 from team 0",
                "delete team 111",
                "delete repo 0",
                "delete repo 1",
            ]
        );
        assert_eq!(
            sent(&server).await,
            [
                "GET /orgs/assignme/teams",
                "DELETE /teams/111/memberships/octocat",
                "DELETE /teams/111/repos/assignme/0",
                "DELETE /teams/111",
                "DELETE /repos/assignme/0",
                "DELETE /repos/assignme/1",
            ]
        );
    }

    #[tokio::test]
    async fn teardown_without_listing_only_deletes_repos() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orgs/assignme/teams"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "message": "Bad credentials" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path_regex("^/teams/"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/repos/assignme/0"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let (_dir, snapshot) = temp_snapshot();
        let client = client_for(&server);
        let reports = run_teardown(Admin::new(&client, &snapshot), "assignme", 1, &users())
            .await
            .unwrap();

        assert_eq!(steps(&reports), ["refresh team listing", "delete repo 0"]);
        assert!(!reports[0].ok);
        assert!(reports[1].ok);
    }
}
