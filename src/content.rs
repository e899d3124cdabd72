// ABOUTME: Backup, restore and content endpoints for worlds and addons
// ABOUTME: Covers listing, triggering and pruning backups plus world/addon installs

use crate::api::{ApiClient, Request};
use crate::model::{
    ActionResponse, BackupActionPayload, BackupListType, BackupRestoreResponse,
    ContentListResponse, FileNamePayload, RestoreActionPayload, RestoreType, RestoreTypePayload,
};
use crate::server::server_path;
use crate::Result;
use tracing::{debug, info};

impl ApiClient {
    pub async fn list_server_backups(
        &self,
        server_name: &str,
        backup_type: BackupListType,
    ) -> Result<BackupRestoreResponse> {
        let path = server_path(server_name, &format!("backup/list/{}", backup_type))?;
        debug!(server = %server_name, backup_type = %backup_type, "Listing backups");
        self.request_as(Request::get(path)).await
    }

    pub async fn restore_select_backup_type(
        &self,
        server_name: &str,
        payload: &RestoreTypePayload,
    ) -> Result<BackupRestoreResponse> {
        let path = server_path(server_name, "restore/select_backup_type")?;
        info!(server = %server_name, restore_type = %payload.restore_type, "Selecting restore type");
        self.request_as(Request::post(path).json(serde_json::to_value(payload)?))
            .await
    }

    pub async fn get_content_worlds(&self) -> Result<ContentListResponse> {
        debug!("Listing world archives");
        self.request_as(Request::get("/content/worlds")).await
    }

    pub async fn get_content_addons(&self) -> Result<ContentListResponse> {
        debug!("Listing addon archives");
        self.request_as(Request::get("/content/addons")).await
    }

    pub async fn trigger_server_backup(
        &self,
        server_name: &str,
        payload: &BackupActionPayload,
    ) -> Result<BackupRestoreResponse> {
        let path = server_path(server_name, "backup/action")?;
        info!(
            server = %server_name,
            backup_type = %payload.backup_type,
            file = ?payload.file_to_backup,
            "Triggering backup"
        );
        self.request_as(Request::post(path).json(serde_json::to_value(payload)?))
            .await
    }

    pub async fn export_server_world(&self, server_name: &str) -> Result<ActionResponse> {
        let path = server_path(server_name, "world/export")?;
        info!(server = %server_name, "Exporting world");
        self.request_as(Request::post(path)).await
    }

    pub async fn reset_server_world(&self, server_name: &str) -> Result<ActionResponse> {
        let path = server_path(server_name, "world/reset")?;
        info!(server = %server_name, "Resetting world");
        self.request_as(Request::delete(path)).await
    }

    /// Retention is decided by the manager's own settings.
    pub async fn prune_server_backups(&self, server_name: &str) -> Result<BackupRestoreResponse> {
        let path = server_path(server_name, "backups/prune")?;
        info!(server = %server_name, "Pruning backups");
        self.request_as(Request::post(path)).await
    }

    pub async fn restore_server_backup(
        &self,
        server_name: &str,
        payload: &RestoreActionPayload,
    ) -> Result<BackupRestoreResponse> {
        let path = server_path(server_name, "restore/action")?;
        info!(
            server = %server_name,
            restore_type = %payload.restore_type,
            backup_file = ?payload.backup_file,
            "Restoring backup"
        );
        self.request_as(Request::post(path).json(serde_json::to_value(payload)?))
            .await
    }

    pub async fn restore_server_latest_all(&self, server_name: &str) -> Result<BackupRestoreResponse> {
        let payload = RestoreActionPayload {
            restore_type: RestoreType::All,
            backup_file: None,
        };
        self.restore_server_backup(server_name, &payload).await
    }

    pub async fn install_server_world(
        &self,
        server_name: &str,
        payload: &FileNamePayload,
    ) -> Result<ActionResponse> {
        let path = server_path(server_name, "world/install")?;
        info!(server = %server_name, file = %payload.filename, "Installing world");
        self.request_as(Request::post(path).json(serde_json::to_value(payload)?))
            .await
    }

    pub async fn install_server_addon(
        &self,
        server_name: &str,
        payload: &FileNamePayload,
    ) -> Result<ActionResponse> {
        let path = server_path(server_name, "addon/install")?;
        info!(server = %server_name, file = %payload.filename, "Installing addon");
        self.request_as(Request::post(path).json(serde_json::to_value(payload)?))
            .await
    }
}
