//! Discord front end: slash command registration and interaction handling.

pub mod commands;
pub mod mirror;

use crate::config::{BioPolicy, DiscordConfig};
use crate::sync::SyncEngine;
use commands::{CommandContext, Invoker, Reply};
use serenity::all::{
    Client, Command as SlashCommand, CommandInteraction, CommandOptionType, Context, CreateCommand,
    CreateCommandOption, CreateEmbed, EditInteractionResponse, EventHandler, GatewayIntents,
    GuildId, Interaction, Ready,
};
use std::sync::Arc;
use tokio::sync::oneshot;

const EMBED_COLOUR: u32 = 0x0099ff;

struct RosterHandler {
    engine: Arc<SyncEngine>,
    policy: BioPolicy,
    page_size: usize,
    guild_id: Option<u64>,
}

/// Slash command definitions registered on startup
fn command_definitions(policy: &BioPolicy) -> Vec<CreateCommand> {
    let max_length = u16::try_from(policy.max_length).unwrap_or(u16::MAX);
    let bio_description = match policy.required_role {
        Some(_) => format!(
            "Add or update your biography in the list. Members with the required role only, max {} chars",
            policy.max_length
        ),
        None => format!(
            "Add or update your biography in the list. Max {} chars",
            policy.max_length
        ),
    };

    vec![
        CreateCommand::new(commands::BIO)
            .description(bio_description)
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    commands::DESCRIPTION_OPTION,
                    "Your own biography.",
                )
                .required(true)
                .max_length(max_length),
            ),
        CreateCommand::new(commands::LIST_MEMBERS)
            .description("Show the biography of all the registered members."),
    ]
}

fn invoker_from(command: &CommandInteraction) -> Invoker {
    let user = &command.user;
    Invoker {
        member_id: user.id.to_string(),
        username: user.name.clone(),
        discriminator: user.discriminator.map(|d| format!("{:04}", d.get())),
        roles: command
            .member
            .as_ref()
            .map(|m| m.roles.iter().map(|r| r.get()).collect())
            .unwrap_or_default(),
    }
}

fn response_for(reply: Reply) -> EditInteractionResponse {
    match reply {
        Reply::Text(text) => EditInteractionResponse::new().content(text),
        Reply::Roster { entries, total } => {
            let embeds: Vec<CreateEmbed> = entries
                .iter()
                .map(|entry| {
                    let embed = CreateEmbed::new()
                        .colour(EMBED_COLOUR)
                        .title(entry.label.clone());
                    if entry.text.is_empty() {
                        embed
                    } else {
                        embed.description(entry.text.clone())
                    }
                })
                .collect();
            let message = EditInteractionResponse::new().embeds(embeds);
            if total > entries.len() {
                message.content(format!("Showing {} of {} members.", entries.len(), total))
            } else {
                message
            }
        }
    }
}

#[serenity::async_trait]
impl EventHandler for RosterHandler {
    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Command(command) = interaction else {
            return;
        };

        let description = command
            .data
            .options
            .iter()
            .find(|o| o.name == commands::DESCRIPTION_OPTION)
            .and_then(|o| o.value.as_str());

        let Some(cmd) = commands::parse(&command.data.name, description) else {
            return;
        };

        let invoker = invoker_from(&command);
        log::info!(
            "[DISCORD] /{} from {} ({})",
            command.data.name,
            invoker.username,
            invoker.member_id
        );

        // Writes and re-listings can outlast the 3 second acknowledgement window.
        if let Err(e) = command.defer(&ctx.http).await {
            log::error!("[DISCORD] Failed to acknowledge /{}: {}", command.data.name, e);
            return;
        }

        let command_ctx = CommandContext {
            engine: &self.engine,
            policy: &self.policy,
            page_size: self.page_size,
        };

        let reply = commands::execute(cmd, &invoker, &command_ctx).await;
        if let Err(e) = command.edit_response(&ctx.http, response_for(reply)).await {
            log::error!("[DISCORD] Failed to reply to /{}: {}", command.data.name, e);
        }
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        log::info!("[DISCORD] Bot connected as {}", ready.user.name);

        let definitions = command_definitions(&self.policy);
        let result = match self.guild_id {
            Some(guild_id) => GuildId::new(guild_id).set_commands(&ctx.http, definitions).await,
            None => SlashCommand::set_global_commands(&ctx.http, definitions).await,
        };
        match result {
            Ok(registered) => log::info!(
                "[DISCORD] Registered {} slash commands{}",
                registered.len(),
                self.guild_id
                    .map(|g| format!(" on guild {}", g))
                    .unwrap_or_default()
            ),
            Err(e) => log::error!("[DISCORD] Failed to register slash commands: {}", e),
        }
    }
}

/// Run the Discord bot until the shutdown signal fires
pub async fn start_discord_listener(
    config: DiscordConfig,
    engine: Arc<SyncEngine>,
    policy: BioPolicy,
    page_size: usize,
    mut shutdown_rx: oneshot::Receiver<()>,
) -> Result<(), String> {
    log::info!("[DISCORD] Starting listener");

    let handler = RosterHandler {
        engine,
        policy,
        page_size,
        guild_id: config.guild_id,
    };

    let mut client = Client::builder(&config.token, GatewayIntents::GUILDS)
        .event_handler(handler)
        .await
        .map_err(|e| format!("Failed to create Discord client: {}", e))?;

    let shard_manager = client.shard_manager.clone();

    tokio::select! {
        _ = &mut shutdown_rx => {
            log::info!("[DISCORD] Received shutdown signal");
            shard_manager.shutdown_all().await;
        }
        result = client.start() => {
            if let Err(e) = result {
                let error = format!("Discord client error: {}", e);
                log::error!("[DISCORD] {}", error);
                return Err(error);
            }
            log::info!("[DISCORD] Listener stopped");
        }
    }

    Ok(())
}
