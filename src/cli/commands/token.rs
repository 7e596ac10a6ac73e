use anyhow::Context;
use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::auth::JwtSessionProvider;
use crate::cli::{utils::output_success, OutputFormat};
use crate::config;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Issue access and refresh tokens for a principal")]
    Issue {
        #[arg(long, help = "Principal (profile) id")]
        user: Uuid,
    },
}

pub async fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TokenCommands::Issue { user } => {
            let provider = JwtSessionProvider::new(&config::config().security)
                .context("cannot sign tokens; is JWT_SECRET set?")?;
            let issued = provider.issue(user)?;

            output_success(
                output_format,
                &format!("Issued session for {}", user),
                Some(json!({
                    "access_token": issued.access_token,
                    "refresh_token": issued.refresh_token,
                    "cookies": issued.set_cookies,
                })),
            )
        }
    }
}
