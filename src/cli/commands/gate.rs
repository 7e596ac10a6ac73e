use chrono::{DateTime, Utc};
use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::cli::{utils::output_success, OutputFormat};
use crate::config;
use crate::database::{Organization, Role, SubscriptionStatus};
use crate::gate::{canonical_path, decide, GatePolicy, Principal};

#[derive(Subcommand)]
pub enum GateCommands {
    #[command(about = "Show the gate's decision for a path")]
    Check {
        #[arg(long, help = "Request path, e.g. /programs/12")]
        path: String,
        #[arg(long, help = "Principal role (client, trainer, super_admin); omit for anonymous")]
        role: Option<Role>,
        #[arg(long, help = "Subscription status of the principal's organization")]
        org_status: Option<SubscriptionStatus>,
        #[arg(long, help = "Trial end, RFC 3339")]
        trial_ends_at: Option<DateTime<Utc>>,
        #[arg(long, help = "Evaluation time, RFC 3339 (defaults to now)")]
        now: Option<DateTime<Utc>>,
    },
}

pub async fn handle(cmd: GateCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        GateCommands::Check {
            path,
            role,
            org_status,
            trial_ends_at,
            now,
        } => {
            let policy = GatePolicy::from_config(&config::config().gate);
            let path = canonical_path(&path);
            let organization_id = Uuid::new_v4();

            let principal = role.map(|role| Principal {
                id: Uuid::new_v4(),
                role,
                organization_id: Some(organization_id),
            });
            let organization = org_status.map(|subscription_status| Organization {
                id: organization_id,
                subscription_status,
                trial_ends_at,
            });

            let decision = decide(
                &policy,
                &path,
                principal.as_ref(),
                organization.as_ref(),
                now.unwrap_or_else(Utc::now),
            );

            output_success(
                output_format,
                &format!("{:?}", decision),
                Some(json!({
                    "path": path,
                    "class": policy.classify(&path),
                    "decision": decision,
                    "location": decision.location(&policy),
                })),
            )
        }
    }
}
