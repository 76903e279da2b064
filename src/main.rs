mod admin;
mod commands;
mod config;
mod display;
mod error;
mod github;
mod snapshot;

use admin::Operation;
use clap::{Parser, Subcommand};
use commands::{GlobalArgs, Session};
use github::Permission;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "assignme",
    version,
    about = "Administer repositories, teams and memberships of a GitHub organization"
)]
pub struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate with a GitHub personal access token
    Auth {
        /// Token to use (if omitted, prompts interactively)
        #[arg(long)]
        token: Option<String>,
    },
    /// Create a repository in the organization
    CreateRepo {
        /// Repository name
        name: String,
    },
    /// Delete a repository of the organization
    DeleteRepo {
        /// Repository name
        name: String,
    },
    /// Create a team in the organization
    CreateTeam {
        /// Team name
        name: String,
    },
    /// Delete a team, by name (via the snapshot) or by id
    DeleteTeam {
        /// Team name
        #[arg(required_unless_present = "id", conflicts_with = "id")]
        name: Option<String>,
        /// Numeric team id
        #[arg(long)]
        id: Option<u64>,
    },
    /// Fetch the organization's teams and overwrite the team snapshot
    #[command(visible_alias = "teams")]
    FetchTeams,
    /// Give a team access to a repository
    AddRepo {
        /// Repository name
        repo: String,
        /// Team name
        team: String,
    },
    /// Remove a repository from a team
    RemoveRepo {
        /// Repository name
        repo: String,
        /// Team name
        team: String,
    },
    /// Add a user to a team
    AddUser {
        /// GitHub username
        user: String,
        /// Team name
        team: String,
    },
    /// Remove a user from a team
    RemoveUser {
        /// GitHub username
        user: String,
        /// Team name
        team: String,
    },
    /// Set the permission a team has on a repository
    SetPermission {
        /// Repository name
        repo: String,
        /// Team name
        team: String,
        /// Permission level
        #[arg(value_enum)]
        level: Permission,
    },
    /// Create team/repository pairs 0..n and assign one user to each
    Setup {
        /// Users to assign, in team order
        #[arg(long, required = true, value_delimiter = ',')]
        users: Vec<String>,
        /// Permission each team gets on its repository
        #[arg(long, value_enum, default_value = "pull")]
        permission: Permission,
    },
    /// Detach, then delete team/repository pairs 0..count
    Teardown {
        /// Number of pairs to remove
        #[arg(long, default_value = "6")]
        count: usize,
        /// Users to remove from their teams first, in team order
        #[arg(long, value_delimiter = ',')]
        users: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    if let Err(e) = run(&cli).await {
        display::error(&e.to_string());
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("ASSIGNME_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

async fn run(cli: &Cli) -> error::Result<()> {
    let args = &cli.global;

    match &cli.command {
        Commands::Auth { token } => commands::auth::run(args, token).await,
        Commands::FetchTeams => commands::teams::run(args).await,
        Commands::Setup { users, permission } => {
            commands::roster::setup(args, users, *permission).await
        }
        Commands::Teardown { count, users } => {
            commands::roster::teardown(args, *count, users).await
        }
        Commands::DeleteTeam { name, id } => {
            let session = Session::open(args)?;
            let id = match (id, name) {
                (Some(id), _) => *id,
                (None, Some(name)) => {
                    snapshot::require_team_id(&session.snapshot, name, &session.org)?
                }
                (None, None) => unreachable!("clap requires a team name or --id"),
            };
            commands::execute(args, &session, Operation::DeleteTeam { id }).await
        }
        command => {
            let session = Session::open(args)?;
            match single_operation(command, &session.org) {
                Some(op) => commands::execute(args, &session, op).await,
                None => unreachable!("every remaining command maps to one operation"),
            }
        }
    }
}

fn single_operation(command: &Commands, org: &str) -> Option<Operation> {
    let org = org.to_string();
    let op = match command {
        Commands::CreateRepo { name } => Operation::CreateRepo {
            org,
            name: name.clone(),
        },
        Commands::DeleteRepo { name } => Operation::DeleteRepo {
            org,
            name: name.clone(),
        },
        Commands::CreateTeam { name } => Operation::CreateTeam {
            org,
            name: name.clone(),
        },
        Commands::AddRepo { repo, team } => Operation::AddRepoToTeam {
            org,
            repo: repo.clone(),
            team: team.clone(),
        },
        Commands::RemoveRepo { repo, team } => Operation::RemoveRepoFromTeam {
            org,
            repo: repo.clone(),
            team: team.clone(),
        },
        Commands::AddUser { user, team } => Operation::AddUserToTeam {
            org,
            user: user.clone(),
            team: team.clone(),
        },
        Commands::RemoveUser { user, team } => Operation::RemoveUserFromTeam {
            org,
            user: user.clone(),
            team: team.clone(),
        },
        Commands::SetPermission { repo, team, level } => Operation::SetRepoPermission {
            org,
            repo: repo.clone(),
            team: team.clone(),
            permission: *level,
        },
        _ => return None,
    };
    Some(op)
}
