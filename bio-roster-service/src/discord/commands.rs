//! Slash command parsing and execution for the roster bot

use crate::config::BioPolicy;
use crate::roster;
use crate::sync::{BiographySubmission, SubmitOutcome, SyncEngine};
use bio_roster_types::RosterEntry;

pub const BIO: &str = "bio";
pub const LIST_MEMBERS: &str = "list-members";
pub const DESCRIPTION_OPTION: &str = "description";

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    /// Add or update the caller's biography: `/bio description:<text>`
    Bio(String),
    /// Show every registered biography: `/list-members`
    ListMembers,
}

/// Parse a slash command from its name and `description` option
pub fn parse(name: &str, description: Option<&str>) -> Option<Command> {
    match name {
        BIO => {
            let result = description.map(|d| Command::Bio(d.trim().to_string()));
            if result.is_none() {
                log::warn!("[DISCORD] '{}' invoked without a {} option", BIO, DESCRIPTION_OPTION);
            }
            result
        }
        LIST_MEMBERS => Some(Command::ListMembers),
        _ => {
            log::debug!("[DISCORD] Unknown command '{}'", name);
            None
        }
    }
}

/// The member who invoked a command.
#[derive(Debug, Clone)]
pub struct Invoker {
    pub member_id: String,
    pub username: String,
    pub discriminator: Option<String>,
    pub roles: Vec<u64>,
}

impl Invoker {
    fn display_name(&self) -> String {
        bio_roster_types::display_name(&self.username, self.discriminator.as_deref())
    }
}

/// Exactly one of these is sent back for every command.
#[derive(Debug, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    /// First page of the roster plus the total member count.
    Roster { entries: Vec<RosterEntry>, total: usize },
}

pub struct CommandContext<'a> {
    pub engine: &'a SyncEngine,
    pub policy: &'a BioPolicy,
    pub page_size: usize,
}

/// Whether the invoker holds the role the policy requires
pub fn is_authorized(policy: &BioPolicy, roles: &[u64]) -> bool {
    match policy.required_role {
        Some(role) => roles.contains(&role),
        None => true,
    }
}

/// Message shown when a member without the required role submits a biography
pub fn permission_denied_message(policy: &BioPolicy) -> String {
    match policy.required_role {
        Some(role) => format!(
            "⛔ Only members with the <@&{}> role can add a biography to the list.",
            role
        ),
        None => "⛔ You can't add a biography to the list.".to_string(),
    }
}

/// Execute a command and return the reply
pub async fn execute(cmd: Command, invoker: &Invoker, ctx: &CommandContext<'_>) -> Reply {
    match cmd {
        Command::Bio(biography) => submit(biography, invoker, ctx).await,
        Command::ListMembers => list_members(ctx).await,
    }
}

async fn submit(biography: String, invoker: &Invoker, ctx: &CommandContext<'_>) -> Reply {
    if !is_authorized(ctx.policy, &invoker.roles) {
        log::info!(
            "[DISCORD] {} ({}) lacks the role to submit a biography",
            invoker.display_name(),
            invoker.member_id
        );
        return Reply::Text(permission_denied_message(ctx.policy));
    }

    let submission = BiographySubmission {
        member_id: invoker.member_id.clone(),
        username: invoker.username.clone(),
        discriminator: invoker.discriminator.clone(),
        biography,
    };

    let name = invoker.display_name();
    match ctx.engine.submit_biography(submission).await {
        Ok(SubmitOutcome::Created) => Reply::Text(format!(
            "✅ Added {} into the biography list of members.",
            name
        )),
        Ok(SubmitOutcome::Updated) => Reply::Text(format!("✅ Updated {} biography.", name)),
        Err(e) => {
            log::error!("[DISCORD] Biography submission for {} failed: {}", name, e);
            Reply::Text(format!("❌ Something went wrong: {}.", e))
        }
    }
}

async fn list_members(ctx: &CommandContext<'_>) -> Reply {
    let records = match ctx.engine.roster().await {
        Ok(records) => records,
        Err(e) => return Reply::Text(format!("❌ Something went wrong: {}.", e)),
    };

    let entries = roster::render(&records);
    let total = entries.len();
    match roster::pages(&entries, ctx.page_size).first() {
        Some(first) => Reply::Roster {
            entries: first.to_vec(),
            total,
        },
        None => Reply::Text("No members registered yet.".to_string()),
    }
}
