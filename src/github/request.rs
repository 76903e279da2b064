use clap::ValueEnum;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;

pub const API_BASE: &str = "https://api.github.com";
pub const USER_AGENT: &str = "AssignMe";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

/// Access tier granted to a team on a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Pull,
    Push,
    Admin,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Permission::Pull => "pull",
            Permission::Push => "push",
            Permission::Admin => "admin",
        };
        f.write_str(s)
    }
}

/// A single REST call, described but not yet sent. Paths are relative to
/// [`API_BASE`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiRequest {
    pub verb: Verb,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl ApiRequest {
    fn new(verb: Verb, path: String) -> Self {
        Self {
            verb,
            path,
            body: None,
        }
    }

    fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn create_repo(org: &str, name: &str) -> Self {
        Self::new(Verb::Post, format!("/orgs/{org}/repos")).with_body(json!({
            "name": name,
            "auto_init": true,
            "visibility": "public",
            "gitignore_template": "nanoc",
        }))
    }

    pub fn delete_repo(org: &str, name: &str) -> Self {
        Self::new(Verb::Delete, format!("/repos/{org}/{name}"))
    }

    pub fn create_team(org: &str, name: &str) -> Self {
        Self::new(Verb::Post, format!("/orgs/{org}/teams")).with_body(json!({ "name": name }))
    }

    pub fn delete_team(team_id: u64) -> Self {
        Self::new(Verb::Delete, format!("/teams/{team_id}"))
    }

    pub fn list_teams(org: &str) -> Self {
        Self::new(Verb::Get, format!("/orgs/{org}/teams?per_page=100"))
    }

    pub fn add_team_repo(team_id: u64, org: &str, repo: &str) -> Self {
        Self::new(Verb::Put, format!("/teams/{team_id}/repos/{org}/{repo}"))
    }

    pub fn remove_team_repo(team_id: u64, org: &str, repo: &str) -> Self {
        Self::new(Verb::Delete, format!("/teams/{team_id}/repos/{org}/{repo}"))
    }

    pub fn add_team_member(team_id: u64, user: &str) -> Self {
        Self::new(Verb::Put, format!("/teams/{team_id}/memberships/{user}"))
    }

    pub fn remove_team_member(team_id: u64, user: &str) -> Self {
        Self::new(Verb::Delete, format!("/teams/{team_id}/memberships/{user}"))
    }

    pub fn set_team_repo_permission(
        team_id: u64,
        org: &str,
        repo: &str,
        permission: Permission,
    ) -> Self {
        Self::add_team_repo(team_id, org, repo).with_body(json!({ "permission": permission }))
    }

    pub fn url(&self) -> String {
        format!("{API_BASE}{}", self.path)
    }
}
