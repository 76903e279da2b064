//! Local cache of an organization's team listing.
//!
//! The API addresses teams by numeric id, so team-scoped operations resolve
//! names through the last listing fetched with `fetch-teams`. The file holds
//! the raw response body and is only replaced wholesale; nothing invalidates it.

use crate::error::{AssignmeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamEntry {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TeamSnapshot {
    teams: Vec<TeamEntry>,
}

impl TeamSnapshot {
    pub fn parse(raw: &str) -> std::result::Result<Self, serde_json::Error> {
        let teams: Vec<TeamEntry> = serde_json::from_str(raw)?;
        Ok(Self { teams })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| AssignmeError::SnapshotRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw).map_err(|source| AssignmeError::SnapshotParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overwrites the snapshot with `body` exactly as received.
    pub fn write_raw(path: &Path, body: &str) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, body)?;
        debug!(path = %path.display(), bytes = body.len(), "team snapshot written");
        Ok(())
    }

    pub fn teams(&self) -> &[TeamEntry] {
        &self.teams
    }

    /// Id of the first team whose name matches exactly.
    pub fn team_id(&self, name: &str) -> Option<u64> {
        self.teams.iter().find(|t| t.name == name).map(|t| t.id)
    }

    pub fn ids(&self) -> HashMap<String, u64> {
        let mut ids = HashMap::with_capacity(self.teams.len());
        for team in &self.teams {
            ids.entry(team.name.clone()).or_insert(team.id);
        }
        ids
    }
}

/// Resolves `team` through the snapshot at `path`. The organization is not
/// part of the snapshot, so `_org` only documents the caller's intent.
pub fn lookup_team_id(path: &Path, team: &str, _org: &str) -> Result<Option<u64>> {
    Ok(TeamSnapshot::load(path)?.team_id(team))
}

/// Like [`lookup_team_id`], but an unknown team is an error.
pub fn require_team_id(path: &Path, team: &str, org: &str) -> Result<u64> {
    lookup_team_id(path, team, org)?.ok_or_else(|| AssignmeError::TeamNotFound {
        team: team.to_string(),
        snapshot: PathBuf::from(path),
    })
}
