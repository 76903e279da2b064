use crate::admin::{Admin, Operation};
use crate::commands::{execute, GlobalArgs, Session};
use crate::display;
use crate::error::Result;
use crate::snapshot::{TeamEntry, TeamSnapshot};

/// Refreshes the team snapshot and shows what it now contains.
pub async fn run(args: &GlobalArgs) -> Result<()> {
    let session = Session::open(args)?;
    let op = Operation::ListTeams {
        org: session.org.clone(),
    };

    if args.dry_run {
        return execute(args, &session, op).await;
    }

    let client = session.client(args)?;
    let admin = Admin::new(&client, &session.snapshot);
    let outcome = admin.run(&op).await?;

    let snapshot = TeamSnapshot::parse(&outcome.body)?;

    display::output(args.json, &snapshot.teams(), |teams| {
        render_teams_table(&session.org, teams);
        display::success(&format!(
            "{} (saved to {})",
            outcome.message,
            admin.snapshot().display()
        ));
    });

    client.check_rate_limit_if_verbose().await;

    Ok(())
}

fn render_teams_table(org: &str, teams: &[TeamEntry]) {
    if teams.is_empty() {
        display::warn(&format!("No teams found in {org}."));
        return;
    }

    display::section_header(&format!("Teams in {org}"));

    let mut table = display::new_table(&["Name", "ID", "Slug", "Description"]);

    for team in teams {
        table.add_row(vec![
            team.name.clone(),
            team.id.to_string(),
            team.slug.clone().unwrap_or_else(|| "-".to_string()),
            team.description
                .clone()
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }

    println!("{table}");
    println!("\n{} team(s) found.", teams.len());
}
