// ABOUTME: Serde data models for Bedrock Server Manager requests and responses
// ABOUTME: Payloads validate at construction; responses parse tolerantly with optional fields

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl Token {
    pub(crate) fn from_login_response(value: Value) -> Result<Self> {
        let token: Token = serde_json::from_value(value)
            .map_err(|_| Error::auth("Login response missing or invalid access_token."))?;
        if token.access_token.is_empty() {
            return Err(Error::auth("Login response missing or invalid access_token."));
        }
        Ok(token)
    }
}


// --- Response models ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
    #[serde(default)]
    pub task_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BaseApiResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallServerResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub server_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskStatusResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub result: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackupRestoreResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
    #[serde(default)]
    pub redirect_url: Option<String>,
    #[serde(default)]
    pub backups: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentListResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub files: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingItem {
    pub key: String,
    pub value: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub settings: Option<Map<String, Value>>,
    #[serde(default)]
    pub setting: Option<SettingItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralApiResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
    #[serde(default)]
    pub servers: Option<Vec<Map<String, Value>>>,
    #[serde(default)]
    pub info: Option<Map<String, Value>>,
    #[serde(default)]
    pub players: Option<Vec<Value>>,
    #[serde(default)]
    pub files_deleted: Option<u64>,
    #[serde(default)]
    pub files_kept: Option<u64>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginInfo {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginApiResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub plugins: Option<BTreeMap<String, PluginInfo>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub identity_type: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}


// --- Enumerated request fields ---

macro_rules! string_enum {
    ($name:ident, $what:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                let lower = s.trim().to_lowercase();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == lower)
                    .ok_or_else(|| {
                        let allowed: Vec<&str> = $name::ALL.iter().map(|v| v.as_str()).collect();
                        Error::InvalidArgument(format!(
                            "Invalid {} '{}'. Allowed: {}",
                            $what,
                            s,
                            allowed.join(", ")
                        ))
                    })
            }
        }
    };
}

string_enum!(BackupListType, "backup type", {
    World => "world",
    Properties => "properties",
    Allowlist => "allowlist",
    Permissions => "permissions",
});

string_enum!(BackupAction, "backup type", {
    World => "world",
    Config => "config",
    All => "all",
});

string_enum!(RestoreType, "restore type", {
    World => "world",
    Properties => "properties",
    Allowlist => "allowlist",
    Permissions => "permissions",
    All => "all",
});

string_enum!(PermissionLevel, "permission level", {
    Visitor => "visitor",
    Member => "member",
    Operator => "operator",
});


// --- Request payloads ---

const MAX_SERVER_NAME_LEN: usize = 50;

pub const EDITABLE_SERVER_PROPERTIES: &[&str] = &[
    "server-name",
    "level-name",
    "gamemode",
    "difficulty",
    "allow-cheats",
    "max-players",
    "server-port",
    "server-portv6",
    "enable-lan-visibility",
    "allow-list",
    "default-player-permission-level",
    "view-distance",
    "tick-distance",
    "level-seed",
    "online-mode",
    "texturepack-required",
];

fn require_non_empty(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidArgument(format!("{} cannot be empty.", what)));
    }
    Ok(())
}

pub(crate) fn validate_server_name(name: &str) -> Result<()> {
    require_non_empty(name, "Server name")?;
    if name.chars().count() > MAX_SERVER_NAME_LEN {
        return Err(Error::InvalidArgument(format!(
            "Server name must be at most {} characters.",
            MAX_SERVER_NAME_LEN
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstallServerPayload {
    pub server_name: String,
    pub server_version: String,
    pub overwrite: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_zip_path: Option<String>,
}

impl InstallServerPayload {
    pub fn new(server_name: impl Into<String>, server_version: impl Into<String>) -> Result<Self> {
        let server_name = server_name.into();
        let server_version = server_version.into();
        validate_server_name(&server_name)?;
        require_non_empty(&server_version, "Server version")?;

        Ok(InstallServerPayload {
            server_name,
            server_version,
            overwrite: false,
            server_zip_path: None,
        })
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandPayload {
    pub command: String,
}

impl CommandPayload {
    pub fn new(command: impl Into<String>) -> Result<Self> {
        let command = command.into();
        require_non_empty(&command, "Command")?;
        Ok(CommandPayload { command })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertiesPayload {
    pub properties: Map<String, Value>,
}

impl PropertiesPayload {
    pub fn new(properties: Map<String, Value>) -> Result<Self> {
        if properties.is_empty() {
            return Err(Error::InvalidArgument("No properties to update.".into()));
        }
        if let Some(key) = properties
            .keys()
            .find(|k| !EDITABLE_SERVER_PROPERTIES.contains(&k.as_str()))
        {
            return Err(Error::InvalidArgument(format!(
                "Property '{}' cannot be updated. Allowed: {}",
                key,
                EDITABLE_SERVER_PROPERTIES.join(", ")
            )));
        }
        Ok(PropertiesPayload { properties })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllowlistAddPayload {
    pub players: Vec<String>,
    #[serde(rename = "ignoresPlayerLimit")]
    pub ignores_player_limit: bool,
}

impl AllowlistAddPayload {
    pub fn new(players: Vec<String>, ignores_player_limit: bool) -> Result<Self> {
        if players.is_empty() || players.iter().any(|p| p.trim().is_empty()) {
            return Err(Error::InvalidArgument("Player names cannot be empty.".into()));
        }
        Ok(AllowlistAddPayload {
            players,
            ignores_player_limit,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllowlistRemovePayload {
    pub players: Vec<String>,
}

impl AllowlistRemovePayload {
    pub fn new(players: Vec<String>) -> Result<Self> {
        if players.is_empty() || players.iter().any(|p| p.trim().is_empty()) {
            return Err(Error::InvalidArgument("Player names cannot be empty.".into()));
        }
        Ok(AllowlistRemovePayload { players })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerPermission {
    pub xuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub permission_level: PermissionLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PermissionsSetPayload {
    pub permissions: Vec<PlayerPermission>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServiceUpdatePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoupdate: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autostart: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PruneDownloadsPayload {
    pub directory: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep: Option<u32>,
}

impl PruneDownloadsPayload {
    pub fn new(directory: impl Into<String>, keep: Option<u32>) -> Result<Self> {
        let directory = directory.into();
        require_non_empty(&directory, "Directory")?;
        Ok(PruneDownloadsPayload { directory, keep })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddPlayersPayload {
    pub players: Vec<String>,
}

impl AddPlayersPayload {
    /// Each entry must look like `PlayerName:XUID`.
    pub fn new(players: Vec<String>) -> Result<Self> {
        if players.is_empty() {
            return Err(Error::InvalidArgument("No players given.".into()));
        }
        for entry in &players {
            match entry.split_once(':') {
                Some((name, xuid)) if !name.trim().is_empty() && !xuid.trim().is_empty() => {}
                _ => {
                    return Err(Error::InvalidArgument(format!(
                        "Invalid player entry '{}'. Expected PlayerName:XUID",
                        entry
                    )))
                }
            }
        }
        Ok(AddPlayersPayload { players })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerEventPayload {
    pub event_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Map<String, Value>>,
}

impl TriggerEventPayload {
    pub fn new(event_name: impl Into<String>, payload: Option<Map<String, Value>>) -> Result<Self> {
        let event_name = event_name.into();
        require_non_empty(&event_name, "Event name")?;
        Ok(TriggerEventPayload {
            event_name,
            payload,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginStatusSetPayload {
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestoreTypePayload {
    pub restore_type: RestoreType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestoreActionPayload {
    pub restore_type: RestoreType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_file: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackupActionPayload {
    pub backup_type: BackupAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_to_backup: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileNamePayload {
    pub filename: String,
}

impl FileNamePayload {
    pub fn new(filename: impl Into<String>) -> Result<Self> {
        let filename = filename.into();
        require_non_empty(&filename, "Filename")?;
        Ok(FileNamePayload { filename })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThemeUpdate {
    pub theme: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileUpdate {
    pub full_name: String,
    pub email: String,
}

#[derive(Clone, PartialEq, Serialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

impl fmt::Debug for ChangePasswordRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangePasswordRequest")
            .field("current_password", &"<redacted>")
            .field("new_password", &"<redacted>")
            .finish()
    }
}
