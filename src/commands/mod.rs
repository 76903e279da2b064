pub mod auth;
pub mod roster;
pub mod teams;

use crate::admin::{Admin, Operation};
use crate::config::{load_config, Config};
use crate::display;
use crate::error::Result;
use crate::github::{Credential, GithubClient};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Output results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Show verbose output (request log, rate limits)
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Print the request that would be sent instead of sending it
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Organization to administer (defaults to `defaults.org` in the config)
    #[arg(long, global = true)]
    pub org: Option<String>,

    /// Team snapshot file used to resolve team names to ids
    #[arg(long, global = true, value_name = "PATH")]
    pub snapshot: Option<PathBuf>,

    /// Read the GitHub token from this file
    #[arg(long, global = true, value_name = "PATH")]
    pub token_file: Option<PathBuf>,

    /// GitHub API base URL, for GitHub Enterprise Server
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,
}

/// Everything a command needs after config and flags are merged.
pub struct Session {
    pub config: Config,
    pub org: String,
    pub snapshot: PathBuf,
}

impl Session {
    pub fn open(args: &GlobalArgs) -> Result<Self> {
        let config = load_config()?;
        let org = config.org(args.org.as_deref())?;
        let snapshot = config.snapshot_path(args.snapshot.as_deref());
        Ok(Self {
            config,
            org,
            snapshot,
        })
    }

    pub fn client(&self, args: &GlobalArgs) -> Result<GithubClient> {
        let credential = self.config.credential(args.token_file.as_deref())?;
        client_for(args, &credential)
    }
}

/// Builds a client against `--api-url` when given, else api.github.com.
pub fn client_for(args: &GlobalArgs, credential: &Credential) -> Result<GithubClient> {
    match args.api_url.as_deref() {
        Some(url) => GithubClient::with_base_uri(credential, url, args.verbose),
        None => GithubClient::new(credential, args.verbose),
    }
}

/// Runs a single operation, or only plans it under `--dry-run`.
pub async fn execute(args: &GlobalArgs, session: &Session, op: Operation) -> Result<()> {
    if args.dry_run {
        let request = op.plan(&session.snapshot)?;
        display::output(args.json, &request, |req| {
            display::planned(&req.verb.to_string(), &req.url());
            if let Some(body) = &req.body {
                println!("{body}");
            }
        });
        return Ok(());
    }

    let client = session.client(args)?;
    let admin = Admin::new(&client, &session.snapshot);
    let outcome = admin.run(&op).await?;

    display::output(args.json, &outcome, |o| match o.team_id {
        Some(id) => display::success(&format!("{} (id {id})", o.message)),
        None => display::success(&o.message),
    });

    client.check_rate_limit_if_verbose().await;

    Ok(())
}
