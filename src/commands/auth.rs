use crate::commands::{client_for, GlobalArgs};
use crate::config::{load_config, save_config};
use crate::display;
use crate::error::Result;
use crate::github::Credential;

pub async fn run(args: &GlobalArgs, token: &Option<String>) -> Result<()> {
    let token = match token {
        Some(t) => t.clone(),
        None => {
            eprintln!("Enter your GitHub personal access token:");
            rpassword::read_password()?
        }
    };

    let credential = Credential::new(&token);

    let client = client_for(args, &credential)?;
    let user = client.validate_token().await?;

    let mut config = load_config()?;
    config.auth.token = Some(credential.expose().to_string());
    save_config(&config)?;

    display::success(&format!(
        "Authenticated as {} ({})",
        user.login,
        user.name.as_deref().unwrap_or("no name set")
    ));

    Ok(())
}
