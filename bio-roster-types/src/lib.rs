//! Shared types for the biography roster service and its RPC clients.

use serde::{Deserialize, Serialize};

// =====================================================
// Domain Types
// =====================================================

/// One registered member's biography row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub member_id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<String>,
    pub biography: String,
    /// Page id of the row in the remote store; `None` until the row exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_ref: Option<String>,
}

impl MemberRecord {
    pub fn new(
        member_id: impl Into<String>,
        username: impl Into<String>,
        discriminator: Option<String>,
        biography: impl Into<String>,
    ) -> Self {
        Self {
            member_id: member_id.into(),
            username: username.into(),
            discriminator: discriminator.filter(|d| is_legacy_discriminator(d)),
            biography: biography.into(),
            storage_ref: None,
        }
    }

    pub fn with_storage_ref(mut self, storage_ref: impl Into<String>) -> Self {
        self.storage_ref = Some(storage_ref.into());
        self
    }

    pub fn display_name(&self) -> String {
        display_name(&self.username, self.discriminator.as_deref())
    }
}

/// `username#1234` for legacy accounts, plain `username` otherwise.
pub fn display_name(username: &str, discriminator: Option<&str>) -> String {
    match discriminator {
        Some(disc) if is_legacy_discriminator(disc) => format!("{}#{}", username, disc),
        _ => username.to_string(),
    }
}

/// Discord reports `0` for accounts migrated to unique usernames.
fn is_legacy_discriminator(disc: &str) -> bool {
    !disc.is_empty() && disc.chars().any(|c| c != '0')
}

/// Display projection of a [`MemberRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub member_id: String,
    pub label: String,
    pub text: String,
}

// =====================================================
// RPC Response Types
// =====================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct RpcResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> RpcResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

// =====================================================
// Service Status
// =====================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub running: bool,
    pub uptime_secs: u64,
    pub cache_initialized: bool,
    pub member_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refreshed_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_legacy_discriminator() {
        let record = MemberRecord::new("1", "alice", Some("0420".to_string()), "hi");
        assert_eq!(record.display_name(), "alice#0420");
    }

    #[test]
    fn test_display_name_without_discriminator() {
        assert_eq!(MemberRecord::new("1", "bob", None, "").display_name(), "bob");
        assert_eq!(
            MemberRecord::new("1", "bob", Some("0".to_string()), "").display_name(),
            "bob"
        );
        assert_eq!(
            MemberRecord::new("1", "bob", Some(String::new()), "").display_name(),
            "bob"
        );
    }

    #[test]
    fn test_free_display_name() {
        assert_eq!(display_name("carol", Some("0007")), "carol#0007");
        assert_eq!(display_name("carol", Some("0000")), "carol");
        assert_eq!(display_name("carol", None), "carol");
    }

    #[test]
    fn test_rpc_response_skips_empty_fields() {
        let json = serde_json::to_value(RpcResponse::ok(3)).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true, "data": 3 }));

        let json = serde_json::to_value(RpcResponse::<u8>::err("boom")).unwrap();
        assert_eq!(json, serde_json::json!({ "success": false, "error": "boom" }));
    }
}
