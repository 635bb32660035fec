//! Roster rendering: member records → display entries → embed pages or a
//! mirrored text block.

use async_trait::async_trait;
use bio_roster_types::{MemberRecord, RosterEntry};

/// A fixed message that mirrors the whole roster as a text block.
#[async_trait]
pub trait RosterMirror: Send + Sync {
    async fn publish(&self, text: &str) -> Result<(), String>;
}

pub fn render(records: &[MemberRecord]) -> Vec<RosterEntry> {
    records
        .iter()
        .map(|record| RosterEntry {
            member_id: record.member_id.clone(),
            label: record.display_name(),
            text: record.biography.clone(),
        })
        .collect()
}

/// Split entries into pages of at most `page_size` for embedded display.
pub fn pages(entries: &[RosterEntry], page_size: usize) -> Vec<&[RosterEntry]> {
    entries.chunks(page_size.max(1)).collect()
}

/// Discord user mention.
pub fn mention(member_id: &str) -> String {
    format!("<@{}>", member_id)
}

pub fn text_line(entry: &RosterEntry) -> String {
    format!("{} - {}\n", mention(&entry.member_id), entry.text)
}

/// One line per entry, for mirroring into a fixed message.
pub fn text_block(entries: &[RosterEntry]) -> String {
    entries.iter().map(text_line).collect()
}
