// ABOUTME: Async client library for the Bedrock Server Manager HTTP API
// ABOUTME: Re-exports the client, error taxonomy and data models for external use

pub mod account;
pub mod api;
pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod manager;
pub mod model;
pub mod plugins;
pub mod response;
pub mod server;
pub mod util;

pub use api::{ApiClient, Base, ClientConfig, Credentials, LoginEndpoint, Request};
pub use error::{ApiErrorInfo, Error, ErrorKind, Result};
pub use model::{
    ActionResponse, AddPlayersPayload, AllowlistAddPayload, AllowlistRemovePayload,
    BackupAction, BackupActionPayload, BackupListType, BackupRestoreResponse, BaseApiResponse,
    ChangePasswordRequest, CommandPayload, ContentListResponse, FileNamePayload,
    GeneralApiResponse, InstallServerPayload, InstallServerResponse, PermissionLevel,
    PermissionsSetPayload, PlayerPermission, PluginApiResponse, PluginInfo,
    PluginStatusSetPayload, ProfileUpdate, PropertiesPayload, PruneDownloadsPayload,
    RestoreActionPayload, RestoreType, RestoreTypePayload, ServiceUpdatePayload, SettingItem,
    SettingsResponse, TaskStatusResponse, ThemeUpdate, Token, TriggerEventPayload, User,
};
pub use response::{no_content, NO_CONTENT_MESSAGE, PARSING_ISSUE_MESSAGE, PARSING_ISSUE_STATUS};
