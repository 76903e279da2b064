//! The organization administration operations.
//!
//! Each [`Operation`] maps to exactly one REST call. Team-scoped operations
//! take a team *name* and resolve it through the local team snapshot before
//! anything is sent.

use crate::error::Result;
use crate::github::{ApiRequest, GithubClient, Permission};
use crate::snapshot::{require_team_id, TeamSnapshot};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum Operation {
    CreateRepo {
        org: String,
        name: String,
    },
    DeleteRepo {
        org: String,
        name: String,
    },
    CreateTeam {
        org: String,
        name: String,
    },
    DeleteTeam {
        id: u64,
    },
    ListTeams {
        org: String,
    },
    AddRepoToTeam {
        org: String,
        repo: String,
        team: String,
    },
    RemoveRepoFromTeam {
        org: String,
        repo: String,
        team: String,
    },
    AddUserToTeam {
        org: String,
        user: String,
        team: String,
    },
    RemoveUserFromTeam {
        org: String,
        user: String,
        team: String,
    },
    SetRepoPermission {
        org: String,
        repo: String,
        team: String,
        permission: Permission,
    },
}

impl Operation {
    /// Builds the request for this operation. Reads the snapshot for
    /// team-scoped operations; sends nothing.
    pub fn plan(&self, snapshot: &Path) -> Result<ApiRequest> {
        let request = match self {
            Operation::CreateRepo { org, name } => ApiRequest::create_repo(org, name),
            Operation::DeleteRepo { org, name } => ApiRequest::delete_repo(org, name),
            Operation::CreateTeam { org, name } => ApiRequest::create_team(org, name),
            Operation::DeleteTeam { id } => ApiRequest::delete_team(*id),
            Operation::ListTeams { org } => ApiRequest::list_teams(org),
            Operation::AddRepoToTeam { org, repo, team } => {
                ApiRequest::add_team_repo(require_team_id(snapshot, team, org)?, org, repo)
            }
            Operation::RemoveRepoFromTeam { org, repo, team } => {
                ApiRequest::remove_team_repo(require_team_id(snapshot, team, org)?, org, repo)
            }
            Operation::AddUserToTeam { org, user, team } => {
                ApiRequest::add_team_member(require_team_id(snapshot, team, org)?, user)
            }
            Operation::RemoveUserFromTeam { org, user, team } => {
                ApiRequest::remove_team_member(require_team_id(snapshot, team, org)?, user)
            }
            Operation::SetRepoPermission {
                org,
                repo,
                team,
                permission,
            } => ApiRequest::set_team_repo_permission(
                require_team_id(snapshot, team, org)?,
                org,
                repo,
                *permission,
            ),
        };
        Ok(request)
    }

    /// Neutral description of the step, for plans and batch reports.
    pub fn label(&self) -> String {
        match self {
            Operation::CreateRepo { name, .. } => format!("create repo {name}"),
            Operation::DeleteRepo { name, .. } => format!("delete repo {name}"),
            Operation::CreateTeam { name, .. } => format!("create team {name}"),
            Operation::DeleteTeam { id } => format!("delete team {id}"),
            Operation::ListTeams { .. } => "refresh team listing".to_string(),
            Operation::AddRepoToTeam { repo, team, .. } => {
                format!("add repo {repo} to team {team}")
            }
            Operation::RemoveRepoFromTeam { repo, team, .. } => {
                format!("remove repo {repo} from team {team}")
            }
            Operation::AddUserToTeam { user, team, .. } => {
                format!("add user {user} to team {team}")
            }
            Operation::RemoveUserFromTeam { user, team, .. } => {
                format!("remove user {user} from team {team}")
            }
            Operation::SetRepoPermission {
                repo,
                team,
                permission,
                ..
            } => format!("set {permission} permission on repo {repo} for team {team}"),
        }
    }

    pub fn success_message(&self) -> String {
        match self {
            Operation::CreateRepo { org, name } => format!("Created repository {org}/{name}"),
            Operation::DeleteRepo { org, name } => format!("Deleted repository {org}/{name}"),
            Operation::CreateTeam { org, name } => format!("Created team {name} in {org}"),
            Operation::DeleteTeam { id } => format!("Deleted team {id}"),
            Operation::ListTeams { org } => format!("Fetched team listing for {org}"),
            Operation::AddRepoToTeam { org, repo, team } => {
                format!("Added repository {repo} to team {team} in {org}")
            }
            Operation::RemoveRepoFromTeam { org, repo, team } => {
                format!("Removed repository {repo} from team {team} in {org}")
            }
            Operation::AddUserToTeam { user, team, .. } => {
                format!("Added {user} to team {team}")
            }
            Operation::RemoveUserFromTeam { user, team, .. } => {
                format!("Removed {user} from team {team}")
            }
            Operation::SetRepoPermission {
                repo,
                team,
                permission,
                ..
            } => format!("Updated permission of team {team} on repository {repo} to {permission}"),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Outcome {
    pub message: String,
    pub request: ApiRequest,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<u64>,
    #[serde(skip)]
    pub body: String,
}

#[derive(Debug, Deserialize)]
struct CreatedTeam {
    id: u64,
}

pub struct Admin<'a> {
    client: &'a GithubClient,
    snapshot: PathBuf,
}

impl<'a> Admin<'a> {
    pub fn new(client: &'a GithubClient, snapshot: impl Into<PathBuf>) -> Self {
        Self {
            client,
            snapshot: snapshot.into(),
        }
    }

    pub fn snapshot(&self) -> &Path {
        &self.snapshot
    }

    /// Plans and sends `op`. A non-2xx response is an error. A successful
    /// team listing replaces the snapshot with the raw response body.
    pub async fn run(&self, op: &Operation) -> Result<Outcome> {
        let request = op.plan(&self.snapshot)?;
        let response = self.client.send(&request).await?.into_result()?;

        let team_id = match op {
            Operation::ListTeams { .. } => {
                TeamSnapshot::write_raw(&self.snapshot, &response.body)?;
                None
            }
            Operation::CreateTeam { .. } => match response.json::<CreatedTeam>() {
                Ok(team) => Some(team.id),
                Err(e) => {
                    warn!(error = %e, "team created but its id could not be read from the response");
                    None
                }
            },
            _ => None,
        };

        let message = op.success_message();
        info!(status = response.status, "{message}");
        Ok(Outcome {
            message,
            request,
            status: response.status,
            team_id,
            body: response.body,
        })
    }
}
