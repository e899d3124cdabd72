// ABOUTME: Plugin management endpoints
// ABOUTME: Lists, toggles and reloads plugins and fires custom plugin events

use crate::api::{ApiClient, Request};
use crate::model::{PluginApiResponse, PluginStatusSetPayload, TriggerEventPayload};
use crate::{Error, Result};
use tracing::{debug, info};

impl ApiClient {
    pub async fn get_plugin_statuses(&self) -> Result<PluginApiResponse> {
        debug!("Fetching plugin statuses");
        self.request_as(Request::get("/plugins")).await
    }

    pub async fn set_plugin_status(
        &self,
        plugin_name: &str,
        payload: &PluginStatusSetPayload,
    ) -> Result<PluginApiResponse> {
        if plugin_name.trim().is_empty() {
            return Err(Error::InvalidArgument("Plugin name cannot be empty.".into()));
        }
        info!(plugin = %plugin_name, enabled = payload.enabled, "Setting plugin status");
        self.request_as(
            Request::post(format!("/plugins/{}", plugin_name)).json(serde_json::to_value(payload)?),
        )
        .await
    }

    pub async fn reload_plugins(&self) -> Result<PluginApiResponse> {
        info!("Reloading plugins");
        self.request_as(Request::put("/plugins/reload")).await
    }

    pub async fn trigger_plugin_event(&self, payload: &TriggerEventPayload) -> Result<PluginApiResponse> {
        info!(event = %payload.event_name, "Triggering plugin event");
        self.request_as(Request::post("/plugins/trigger_event").json(serde_json::to_value(payload)?))
            .await
    }
}
