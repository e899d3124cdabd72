// ABOUTME: Per-server endpoints: lifecycle actions, console commands, status and configuration
// ABOUTME: Every path is scoped under /server/{name} so 404s classify as server-not-found

use crate::api::{ApiClient, Request};
use crate::model::{
    validate_server_name, ActionResponse, AllowlistAddPayload, AllowlistRemovePayload,
    CommandPayload, GeneralApiResponse, PermissionsSetPayload, PropertiesPayload,
    ServiceUpdatePayload,
};
use crate::Result;
use tracing::{debug, info};

/// Builds `/server/{name}/{action}` after checking the name.
pub(crate) fn server_path(server_name: &str, action: &str) -> Result<String> {
    validate_server_name(server_name)?;
    Ok(format!("/server/{}/{}", server_name, action.trim_start_matches('/')))
}

impl ApiClient {
    async fn server_action(&self, server_name: &str, action: &str) -> Result<ActionResponse> {
        let path = server_path(server_name, action)?;
        info!(server = %server_name, action = %action, "Requesting server action");
        self.request_as(Request::post(path)).await
    }

    async fn server_query(&self, server_name: &str, resource: &str) -> Result<GeneralApiResponse> {
        let path = server_path(server_name, resource)?;
        debug!(server = %server_name, resource = %resource, "Fetching server resource");
        self.request_as(Request::get(path)).await
    }

    pub async fn start_server(&self, server_name: &str) -> Result<ActionResponse> {
        self.server_action(server_name, "start").await
    }

    pub async fn stop_server(&self, server_name: &str) -> Result<ActionResponse> {
        self.server_action(server_name, "stop").await
    }

    pub async fn restart_server(&self, server_name: &str) -> Result<ActionResponse> {
        self.server_action(server_name, "restart").await
    }

    pub async fn update_server(&self, server_name: &str) -> Result<ActionResponse> {
        self.server_action(server_name, "update").await
    }

    pub async fn delete_server(&self, server_name: &str) -> Result<ActionResponse> {
        let path = server_path(server_name, "delete")?;
        info!(server = %server_name, "Requesting server deletion");
        self.request_as(Request::delete(path)).await
    }

    pub async fn send_server_command(
        &self,
        server_name: &str,
        command: &CommandPayload,
    ) -> Result<ActionResponse> {
        let path = server_path(server_name, "send_command")?;
        info!(server = %server_name, command = %command.command, "Sending console command");
        self.request_as(Request::post(path).json(serde_json::to_value(command)?))
            .await
    }

    pub async fn get_server_running_status(&self, server_name: &str) -> Result<GeneralApiResponse> {
        self.server_query(server_name, "status").await
    }

    pub async fn get_server_process_info(&self, server_name: &str) -> Result<GeneralApiResponse> {
        self.server_query(server_name, "process_info").await
    }

    pub async fn get_server_version(&self, server_name: &str) -> Result<GeneralApiResponse> {
        self.server_query(server_name, "version").await
    }

    pub async fn get_server_validate(&self, server_name: &str) -> Result<GeneralApiResponse> {
        self.server_query(server_name, "validate").await
    }

    pub async fn get_server_config_status(&self, server_name: &str) -> Result<GeneralApiResponse> {
        self.server_query(server_name, "config_status").await
    }

    pub async fn get_server_allowlist(&self, server_name: &str) -> Result<GeneralApiResponse> {
        self.server_query(server_name, "allowlist/get").await
    }

    pub async fn add_server_allowlist(
        &self,
        server_name: &str,
        payload: &AllowlistAddPayload,
    ) -> Result<ActionResponse> {
        let path = server_path(server_name, "allowlist/add")?;
        info!(
            server = %server_name,
            players = ?payload.players,
            ignores_player_limit = payload.ignores_player_limit,
            "Adding players to allowlist"
        );
        self.request_as(Request::post(path).json(serde_json::to_value(payload)?))
            .await
    }

    pub async fn remove_server_allowlist_players(
        &self,
        server_name: &str,
        payload: &AllowlistRemovePayload,
    ) -> Result<ActionResponse> {
        let path = server_path(server_name, "allowlist/remove")?;
        info!(server = %server_name, players = ?payload.players, "Removing players from allowlist");
        self.request_as(Request::delete(path).json(serde_json::to_value(payload)?))
            .await
    }

    pub async fn get_server_permissions(&self, server_name: &str) -> Result<GeneralApiResponse> {
        self.server_query(server_name, "permissions/get").await
    }

    pub async fn set_server_permissions(
        &self,
        server_name: &str,
        payload: &PermissionsSetPayload,
    ) -> Result<ActionResponse> {
        let path = server_path(server_name, "permissions/set")?;
        info!(server = %server_name, count = payload.permissions.len(), "Setting player permissions");
        self.request_as(Request::put(path).json(serde_json::to_value(payload)?))
            .await
    }

    pub async fn get_server_properties(&self, server_name: &str) -> Result<GeneralApiResponse> {
        self.server_query(server_name, "properties/get").await
    }

    pub async fn update_server_properties(
        &self,
        server_name: &str,
        payload: &PropertiesPayload,
    ) -> Result<ActionResponse> {
        let path = server_path(server_name, "properties/set")?;
        info!(
            server = %server_name,
            keys = ?payload.properties.keys().collect::<Vec<_>>(),
            "Updating server properties"
        );
        self.request_as(Request::post(path).json(serde_json::to_value(payload)?))
            .await
    }

    pub async fn configure_server_os_service(
        &self,
        server_name: &str,
        payload: &ServiceUpdatePayload,
    ) -> Result<ActionResponse> {
        let path = server_path(server_name, "service/update")?;
        info!(
            server = %server_name,
            autoupdate = ?payload.autoupdate,
            autostart = ?payload.autostart,
            "Configuring OS service"
        );
        self.request_as(Request::post(path).json(serde_json::to_value(payload)?))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_path() {
        assert_eq!(server_path("alpha", "start").unwrap(), "/server/alpha/start");
        assert_eq!(
            server_path("alpha", "/allowlist/get").unwrap(),
            "/server/alpha/allowlist/get"
        );
    }

    #[test]
    fn test_server_path_rejects_empty_name() {
        let err = server_path("", "start").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidArgument);
        assert!(server_path("   ", "start").is_err());
    }
}
