//! Sign-in, sign-out and identity commands

use colored::Colorize;
use dialoguer::{Input, Password, theme::ColorfulTheme};

use crate::cli::{CommandContext, OutputFormat};
use crate::client::models::{LoginRequest, RegisterRequest, User};
use crate::config::DataSource;
use crate::error::Result;
use crate::models::UserDisplay;
use crate::output::{self, table};

/// Sign in, prompting for anything not given on the command line
pub async fn login(
    ctx: &CommandContext,
    username: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let request = LoginRequest {
        username: username_or_prompt(username)?,
        password: password_or_prompt(password, false)?,
    };

    let auth = ctx.client.login(&request).await?;
    log::info!("Signed in as {}", auth.user.username);
    signed_in(ctx.format, &auth.user, "Signed in")
}

/// Create an account and sign in
pub async fn register(
    ctx: &CommandContext,
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let request = RegisterRequest {
        username: username_or_prompt(username)?,
        password: password_or_prompt(password, true)?,
        email,
    };

    let auth = ctx.client.register(&request).await?;
    signed_in(ctx.format, &auth.user, "Account created; signed in")
}

/// Sign out; the local credential goes even if the server cannot be reached
pub async fn logout(ctx: &CommandContext) -> Result<()> {
    let was_signed_in = ctx.tokens.has().await;
    ctx.client.logout().await?;

    match ctx.format {
        OutputFormat::Json => output::print_json(&serde_json::json!({
            "signed_out": true,
            "had_credential": was_signed_in,
        })),
        _ => {
            if was_signed_in {
                println!("{} Signed out", "✓".green());
            } else {
                println!("{} Not signed in", "○".dimmed());
            }
            Ok(())
        }
    }
}

/// Show the signed-in user
pub async fn whoami(ctx: &CommandContext) -> Result<()> {
    let user = ctx.client.current_user().await?;
    let display = UserDisplay::from(&user);

    match ctx.format {
        OutputFormat::Pretty => {
            println!(
                "{}",
                table::format_details(&[
                    ("User", display.username),
                    ("ID", display.id),
                    ("Email", display.email),
                    ("Role", display.role),
                ])
            );
            if ctx.source == DataSource::Fixture {
                println!("{}", "Fixture data source; nothing was sent to a server".dimmed());
            }
            Ok(())
        }
        format => output::print(&vec![display], format),
    }
}

fn signed_in(format: OutputFormat, user: &User, headline: &str) -> Result<()> {
    match format {
        OutputFormat::Json => output::print_json(&UserDisplay::from(user)),
        _ => {
            println!("{} {} as {}", "✓".green(), headline, user.username.bold());
            Ok(())
        }
    }
}

fn username_or_prompt(username: Option<String>) -> Result<String> {
    match username {
        Some(name) => Ok(name),
        None => Ok(Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt("Username")
            .interact_text()?),
    }
}

fn password_or_prompt(password: Option<String>, confirm: bool) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }

    let theme = ColorfulTheme::default();
    let mut prompt = Password::with_theme(&theme).with_prompt("Password");
    if confirm {
        prompt = prompt.with_confirmation("Confirm password", "Passwords do not match");
    }
    Ok(prompt.interact()?)
}
