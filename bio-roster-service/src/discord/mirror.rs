//! Mirrors the roster into a fixed channel message.

use crate::config::MirrorTarget;
use crate::roster::RosterMirror;
use async_trait::async_trait;
use serenity::all::{ChannelId, EditMessage, Http, MessageId};
use std::sync::Arc;

/// Discord rejects message content above this many characters.
pub const MESSAGE_LIMIT: usize = 2000;

pub struct DiscordMirror {
    http: Arc<Http>,
    target: MirrorTarget,
}

impl DiscordMirror {
    pub fn new(http: Arc<Http>, target: MirrorTarget) -> Self {
        Self { http, target }
    }
}

#[async_trait]
impl RosterMirror for DiscordMirror {
    async fn publish(&self, text: &str) -> Result<(), String> {
        let content = fit_message(text, MESSAGE_LIMIT);
        ChannelId::new(self.target.channel_id)
            .edit_message(
                &self.http,
                MessageId::new(self.target.message_id),
                EditMessage::new().content(content),
            )
            .await
            .map_err(|e| format!("Failed to edit roster message: {}", e))?;
        log::info!(
            "[DISCORD] Updated roster message {} in channel {}",
            self.target.message_id,
            self.target.channel_id
        );
        Ok(())
    }
}

/// Keep whole lines up to `max_len` characters; a single over-long line is cut.
pub fn fit_message(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }

    let mut fitted = String::new();
    let mut used = 0;
    for line in text.split_inclusive('\n') {
        let len = line.chars().count();
        if used + len > max_len {
            if fitted.is_empty() {
                fitted = line.chars().take(max_len).collect();
            }
            break;
        }
        fitted.push_str(line);
        used += len;
    }

    log::warn!(
        "[DISCORD] Roster text is {} characters, truncated to {}",
        text.chars().count(),
        fitted.chars().count()
    );
    fitted
}
