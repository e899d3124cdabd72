// ABOUTME: Endpoints for the logged-in user's own account

use crate::api::{ApiClient, Request};
use crate::model::{BaseApiResponse, ChangePasswordRequest, ProfileUpdate, ThemeUpdate, User};
use crate::Result;
use tracing::{debug, info};

impl ApiClient {
    pub async fn get_account_details(&self) -> Result<User> {
        debug!("Fetching account details");
        self.request_as(Request::get("/account")).await
    }

    pub async fn update_theme(&self, payload: &ThemeUpdate) -> Result<BaseApiResponse> {
        info!(theme = %payload.theme, "Updating theme");
        self.request_as(Request::post("/account/theme").json(serde_json::to_value(payload)?))
            .await
    }

    pub async fn update_profile(&self, payload: &ProfileUpdate) -> Result<BaseApiResponse> {
        info!("Updating profile");
        self.request_as(Request::post("/account/profile").json(serde_json::to_value(payload)?))
            .await
    }

    pub async fn change_password(&self, payload: &ChangePasswordRequest) -> Result<BaseApiResponse> {
        info!("Changing password");
        self.request_as(
            Request::post("/account/change-password").json(serde_json::to_value(payload)?),
        )
        .await
    }
}
