use crate::error::ConfigError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_NOTION_API_URL: &str = "https://api.notion.com/v1";

/// Columns of the remote table the service reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    MemberId,
    Username,
    Discriminator,
    Biography,
}

impl Field {
    pub const ALL: [Field; 4] = [
        Field::MemberId,
        Field::Username,
        Field::Discriminator,
        Field::Biography,
    ];

    fn env_key(&self) -> &'static str {
        match self {
            Field::MemberId => "MEMBER_ID",
            Field::Username => "USERNAME",
            Field::Discriminator => "DISCRIMINATOR",
            Field::Biography => "BIOGRAPHY",
        }
    }
}

/// Opaque property id (used for per-field retrieval) and property name
/// (used in create/update payloads and sorts) of one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub id: String,
    pub name: String,
}

impl FieldSpec {
    fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}

/// Semantic column → store-specific identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMap {
    member_id: FieldSpec,
    username: FieldSpec,
    discriminator: FieldSpec,
    biography: FieldSpec,
}

impl FieldMap {
    pub fn new(
        member_id: FieldSpec,
        username: FieldSpec,
        discriminator: FieldSpec,
        biography: FieldSpec,
    ) -> Self {
        Self {
            member_id,
            username,
            discriminator,
            biography,
        }
    }

    pub fn get(&self, field: Field) -> &FieldSpec {
        match field {
            Field::MemberId => &self.member_id,
            Field::Username => &self.username,
            Field::Discriminator => &self.discriminator,
            Field::Biography => &self.biography,
        }
    }

    fn get_mut(&mut self, field: Field) -> &mut FieldSpec {
        match field {
            Field::MemberId => &mut self.member_id,
            Field::Username => &mut self.username,
            Field::Discriminator => &mut self.discriminator,
            Field::Biography => &mut self.biography,
        }
    }
}

impl Default for FieldMap {
    fn default() -> Self {
        Self::new(
            FieldSpec::new("title", "ID"),
            FieldSpec::new("Vl%3CE", "username"),
            FieldSpec::new("fG~f", "usernameFourDigits"),
            FieldSpec::new("qCLL", "bioDescription"),
        )
    }
}

/// Who may submit a biography and how long it may be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BioPolicy {
    pub max_length: usize,
    pub required_role: Option<u64>,
}

impl Default for BioPolicy {
    fn default() -> Self {
        Self {
            max_length: 200,
            required_role: None,
        }
    }
}

/// Fixed channel message that mirrors the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MirrorTarget {
    pub channel_id: u64,
    pub message_id: u64,
}

#[derive(Clone)]
pub struct DiscordConfig {
    pub token: String,
    pub guild_id: Option<u64>,
    pub mirror: Option<MirrorTarget>,
}

#[derive(Clone)]
pub struct NotionConfig {
    pub access_token: String,
    pub database_id: String,
    pub api_url: String,
    pub timeout: Duration,
    pub max_in_flight_rows: usize,
    pub fields: FieldMap,
}

#[derive(Clone)]
pub struct Config {
    pub discord: DiscordConfig,
    pub notion: NotionConfig,
    pub policy: BioPolicy,
    pub roster_page_size: usize,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut fields = FieldMap::default();
        for field in Field::ALL {
            let spec = fields.get_mut(field);
            if let Some(id) = optional(&lookup, &format!("NOTION_{}_PROPERTY_ID", field.env_key())) {
                spec.id = id;
            }
            if let Some(name) =
                optional(&lookup, &format!("NOTION_{}_PROPERTY_NAME", field.env_key()))
            {
                spec.name = name;
            }
        }

        let mirror = match (
            parse::<u64, _>(&lookup, "ROSTER_CHANNEL_ID")?,
            parse::<u64, _>(&lookup, "ROSTER_MESSAGE_ID")?,
        ) {
            (Some(channel_id), Some(message_id)) => Some(MirrorTarget {
                channel_id,
                message_id,
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("ROSTER_MESSAGE_ID".to_string())),
            (None, Some(_)) => return Err(ConfigError::Missing("ROSTER_CHANNEL_ID".to_string())),
        };

        let max_in_flight_rows = parse(&lookup, "NOTION_MAX_IN_FLIGHT_ROWS")?.unwrap_or(4);
        let roster_page_size = parse(&lookup, "ROSTER_PAGE_SIZE")?.unwrap_or(10);
        ensure_positive("NOTION_MAX_IN_FLIGHT_ROWS", max_in_flight_rows)?;
        ensure_positive("ROSTER_PAGE_SIZE", roster_page_size)?;

        Ok(Self {
            discord: DiscordConfig {
                token: required(&lookup, "DISCORD_TOKEN")?,
                guild_id: parse(&lookup, "DISCORD_GUILD_ID")?,
                mirror,
            },
            notion: NotionConfig {
                access_token: required(&lookup, "NOTION_ACCESS_TOKEN")?,
                database_id: required(&lookup, "NOTION_DATABASE_ID")?,
                api_url: optional(&lookup, "NOTION_API_URL")
                    .unwrap_or_else(|| DEFAULT_NOTION_API_URL.to_string()),
                timeout: Duration::from_secs(parse(&lookup, "NOTION_TIMEOUT_SECS")?.unwrap_or(15)),
                max_in_flight_rows,
                fields,
            },
            policy: BioPolicy {
                max_length: parse(&lookup, "BIO_MAX_LENGTH")?.unwrap_or(200),
                required_role: parse(&lookup, "BIO_REQUIRED_ROLE_ID")?,
            },
            roster_page_size,
            port: parse(&lookup, "PORT")?.unwrap_or(3000),
        })
    }
}

fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required<F>(lookup: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, key).ok_or_else(|| ConfigError::Missing(key.to_string()))
}

fn parse<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional(lookup, key)
        .map(|raw| {
            raw.parse::<T>().map_err(|e| ConfigError::Invalid {
                key: key.to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

fn ensure_positive(key: &str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid {
            key: key.to_string(),
            value: "0".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(())
}
