// ABOUTME: Manager-wide endpoints: info, server listing, players, settings, downloads, installs
// ABOUTME: Also fetches the panorama image as raw bytes outside the JSON pipeline

use crate::api::{ApiClient, Base, Request};
use crate::model::{
    ActionResponse, AddPlayersPayload, GeneralApiResponse, InstallServerPayload,
    InstallServerResponse, PruneDownloadsPayload, SettingsResponse, TaskStatusResponse,
};
use crate::response::{error_from_response, RawResponse};
use crate::{Error, Result};
use reqwest::header::ACCEPT;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

impl ApiClient {
    pub async fn get_info(&self) -> Result<GeneralApiResponse> {
        debug!("Fetching manager info");
        self.request_as(Request::get("/info").unauthenticated()).await
    }

    pub async fn get_servers(&self) -> Result<GeneralApiResponse> {
        debug!("Fetching server details");
        self.request_as(Request::get("/servers")).await
    }

    /// Sorted names of every server the manager knows about.
    pub async fn get_server_names(&self) -> Result<Vec<String>> {
        let response = self.get_servers().await?;
        let mut names: Vec<String> = response
            .servers
            .unwrap_or_default()
            .iter()
            .filter_map(|server| server.get("name").and_then(Value::as_str))
            .map(str::to_string)
            .collect();
        names.sort();
        Ok(names)
    }

    pub async fn scan_players(&self) -> Result<ActionResponse> {
        info!("Triggering player scan from server logs");
        self.request_as(Request::post("/players/scan")).await
    }

    pub async fn get_players(&self) -> Result<GeneralApiResponse> {
        debug!("Fetching global player list");
        self.request_as(Request::get("/players/get")).await
    }

    pub async fn add_players(&self, payload: &AddPlayersPayload) -> Result<ActionResponse> {
        info!(count = payload.players.len(), "Adding players to global list");
        self.request_as(Request::post("/players/add").json(serde_json::to_value(payload)?))
            .await
    }

    pub async fn get_all_settings(&self) -> Result<SettingsResponse> {
        debug!("Fetching global settings");
        self.request_as(Request::get("/settings")).await
    }

    pub async fn set_setting(&self, key: &str, value: Value) -> Result<SettingsResponse> {
        if key.trim().is_empty() {
            return Err(Error::InvalidArgument("Setting key cannot be empty.".into()));
        }
        info!(key = %key, "Setting global setting");
        self.request_as(Request::post("/settings").json(json!({ "key": key, "value": value })))
            .await
    }

    pub async fn reload_settings(&self) -> Result<ActionResponse> {
        info!("Reloading global settings from disk");
        self.request_as(Request::post("/settings/reload")).await
    }

    pub async fn prune_downloads(&self, payload: &PruneDownloadsPayload) -> Result<GeneralApiResponse> {
        info!(directory = %payload.directory, keep = ?payload.keep, "Pruning download cache");
        self.request_as(Request::post("/downloads/prune").json(serde_json::to_value(payload)?))
            .await
    }

    pub async fn install_new_server(
        &self,
        payload: &InstallServerPayload,
    ) -> Result<InstallServerResponse> {
        info!(
            server = %payload.server_name,
            version = %payload.server_version,
            overwrite = payload.overwrite,
            "Requesting server installation"
        );
        self.request_as(Request::post("/server/install").json(serde_json::to_value(payload)?))
            .await
    }

    pub async fn get_task_status(&self, task_id: &str) -> Result<TaskStatusResponse> {
        if task_id.trim().is_empty() {
            return Err(Error::InvalidArgument("Task ID cannot be empty.".into()));
        }
        debug!(task_id = %task_id, "Fetching background task status");
        self.request_as(Request::get(format!("/tasks/status/{}", task_id)))
            .await
    }

    /// Fetches the panorama background image. Binary assets live under the
    /// server root, so a custom API base path does not apply. Non-2xx
    /// responses go through the normal error classification.
    pub async fn get_panorama_image(&self) -> Result<Vec<u8>> {
        let url = self.url("/api/panorama", Base::Root);
        info!("Fetching panorama image");

        let response = self
            .http()?
            .get(&url)
            .header(ACCEPT, "image/jpeg, */*")
            .timeout(self.timeout())
            .send()
            .await
            .map_err(|e| self.connectivity_error(e, &url))?;
        debug!(url = %url, status = %response.status(), "Received panorama response");

        if !response.status().is_success() {
            let raw = RawResponse::read(response).await;
            return Err(error_from_response(&raw, "/api/panorama"));
        }

        let bytes = response.bytes().await.map_err(|source| {
            warn!(url = %url, error = %source, "Failed to read panorama image body");
            Error::Connectivity {
                message: format!("Failed to read panorama image body from {}", url),
                target: self.target().to_string(),
                source,
            }
        })?;
        Ok(bytes.to_vec())
    }
}
