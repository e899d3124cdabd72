// ABOUTME: Integration tests for the request orchestrator against wiremock servers
// ABOUTME: Covers login, token reuse, the single 401 retry, error taxonomy and transport failures

use bsm_client::{
    no_content, ApiClient, ClientConfig, ErrorKind, LoginEndpoint, Request, PARSING_ISSUE_STATUS,
};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn token_client(server: &MockServer, token: &str) -> ApiClient {
    ApiClient::new(ClientConfig::new(server.uri()).with_token(token)).unwrap()
}

fn credentials_client(server: &MockServer) -> ApiClient {
    ApiClient::new(ClientConfig::new(server.uri()).with_credentials("admin", "secret")).unwrap()
}

async fn mount_login(server: &MockServer, token: &str, calls: u64) {
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": token,
            "token_type": "bearer"
        })))
        .expect(calls)
        .mount(server)
        .await;
}

fn servers_body() -> serde_json::Value {
    json!({"status": "success", "servers": [{"name": "alpha", "status": "RUNNING"}]})
}

mod authentication {
    use super::*;

    #[tokio::test]
    async fn test_login_stores_token_and_sends_bearer() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/token"))
            .and(body_string_contains("username=admin"))
            .and(body_string_contains("password=secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "abc",
                "token_type": "bearer"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/servers"))
            .and(header("Authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(servers_body()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = credentials_client(&mock_server);
        let token = client.authenticate().await.unwrap();
        assert_eq!(token.access_token, "abc");
        assert_eq!(client.token().await.as_deref(), Some("abc"));

        let servers = client.get_servers().await.unwrap();
        assert_eq!(servers.servers.unwrap()[0]["name"], "alpha");
    }

    #[tokio::test]
    async fn test_lazy_login_happens_once_across_requests() {
        let mock_server = MockServer::start().await;
        mount_login(&mock_server, "abc", 1).await;

        Mock::given(method("GET"))
            .and(path("/api/servers"))
            .and(header("Authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(servers_body()))
            .expect(2)
            .mount(&mock_server)
            .await;

        let client = credentials_client(&mock_server);
        client.get_servers().await.unwrap();
        client.get_servers().await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_login() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": "abc", "token_type": "bearer"}))
                    .set_delay(Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/servers"))
            .and(header("Authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(servers_body()))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/players/get"))
            .and(header("Authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"players": []})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = credentials_client(&mock_server);
        let (servers, players) = tokio::join!(client.get_servers(), client.get_players());
        assert!(servers.is_ok());
        assert!(players.is_ok());
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/token"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"detail": "Incorrect username or password"})),
            )
            .mount(&mock_server)
            .await;

        let client = credentials_client(&mock_server);
        let err = client.authenticate().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Auth);
        assert_eq!(err.message(), "Incorrect username or password");
        assert!(client.token().await.is_none());
    }

    #[tokio::test]
    async fn test_login_server_error_is_wrapped_as_auth() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/token"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "db down"})))
            .mount(&mock_server)
            .await;

        let client = credentials_client(&mock_server);
        let err = client.get_servers().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Auth);
        assert_eq!(err.message(), "API error during login: db down");
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn test_login_response_without_token() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
            .mount(&mock_server)
            .await;

        let client = credentials_client(&mock_server);
        let err = client.authenticate().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Auth);
        assert_eq!(err.message(), "Login response missing or invalid access_token.");
    }

    #[tokio::test]
    async fn test_legacy_json_login() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/login"))
            .and(body_json(json!({"username": "admin", "password": "secret"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "legacy",
                "token_type": "bearer"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = ApiClient::new(
            ClientConfig::new(mock_server.uri())
                .with_credentials("admin", "secret")
                .with_login_endpoint(LoginEndpoint::LegacyJson),
        )
        .unwrap();
        client.authenticate().await.unwrap();
        assert_eq!(client.token().await.as_deref(), Some("legacy"));
    }

    #[tokio::test]
    async fn test_logout_clears_token() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/logout"))
            .and(header("Authorization", "Bearer test_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = token_client(&mock_server, "test_token");
        client.logout().await.unwrap();
        assert!(client.token().await.is_none());
    }

    #[tokio::test]
    async fn test_rejected_logout_still_clears_token() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/logout"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "expired"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = token_client(&mock_server, "stale");
        let err = client.logout().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Auth);
        assert!(client.token().await.is_none());
    }
}

mod reauthentication {
    use super::*;

    #[tokio::test]
    async fn test_401_then_200_retries_exactly_once() {
        let mock_server = MockServer::start().await;
        mount_login(&mock_server, "fresh", 1).await;

        Mock::given(method("GET"))
            .and(path("/api/servers"))
            .and(header("Authorization", "Bearer stale"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "expired"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/servers"))
            .and(header("Authorization", "Bearer fresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(servers_body()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = ApiClient::new(
            ClientConfig::new(mock_server.uri())
                .with_token("stale")
                .with_credentials("admin", "secret"),
        )
        .unwrap();

        client.get_servers().await.unwrap();
        assert_eq!(client.token().await.as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_second_401_is_terminal() {
        let mock_server = MockServer::start().await;
        mount_login(&mock_server, "fresh", 1).await;

        Mock::given(method("GET"))
            .and(path("/api/servers"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Not authenticated"})))
            .expect(2)
            .mount(&mock_server)
            .await;

        let client = ApiClient::new(
            ClientConfig::new(mock_server.uri())
                .with_token("stale")
                .with_credentials("admin", "secret"),
        )
        .unwrap();

        let err = client.get_servers().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Auth);
        assert_eq!(err.message(), "Not authenticated");
        assert_eq!(err.status(), Some(401));
    }

    #[tokio::test]
    async fn test_rejected_token_without_credentials() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/servers"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "expired"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = token_client(&mock_server, "stale");
        let err = client.get_servers().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Auth);
        assert_eq!(err.message(), "Authentication required but no token is available.");
        assert!(client.token().await.is_none());
    }

    #[tokio::test]
    async fn test_unauthenticated_401_is_not_retried() {
        let mock_server = MockServer::start().await;
        mount_login(&mock_server, "unused", 0).await;

        Mock::given(method("GET"))
            .and(path("/api/info"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "nope"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = credentials_client(&mock_server);
        let err = client.get_info().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Auth);
    }
}

mod responses {
    use super::*;

    #[tokio::test]
    async fn test_status_code_taxonomy() {
        let mock_server = MockServer::start().await;
        let cases = [
            (400, ErrorKind::InvalidInput),
            (403, ErrorKind::Auth),
            (404, ErrorKind::NotFound),
            (409, ErrorKind::Api),
            (422, ErrorKind::InvalidInput),
            (500, ErrorKind::ServerSide),
            (501, ErrorKind::OperationFailed),
            (503, ErrorKind::ServerSide),
        ];

        for (status, _) in &cases {
            Mock::given(method("GET"))
                .and(path(format!("/api/probe/{}", status)))
                .respond_with(
                    ResponseTemplate::new(*status).set_body_json(json!({"detail": "probe failure"})),
                )
                .mount(&mock_server)
                .await;
        }

        let client = token_client(&mock_server, "test_token");
        for (status, kind) in cases {
            let err = client
                .request(Request::get(format!("/probe/{}", status)))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), kind, "status {}", status);
            assert_eq!(err.status(), Some(status));
            assert_eq!(err.message(), "probe failure");
        }
    }

    #[tokio::test]
    async fn test_server_scoped_404() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/server/ghost/status"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "server not found"})))
            .mount(&mock_server)
            .await;

        let client = token_client(&mock_server, "test_token");
        let err = client.get_server_running_status("ghost").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ServerNotFound);
        assert_eq!(err.message(), "server not found");
        assert_eq!(err.data(), Some(&json!({"detail": "server not found"})));
    }

    #[tokio::test]
    async fn test_not_running_message_overrides_server_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/server/x/send_command"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({"message": "Server 'x' is not running."})),
            )
            .mount(&mock_server)
            .await;

        let client = token_client(&mock_server, "test_token");
        let command = bsm_client::CommandPayload::new("list").unwrap();
        let err = client.send_server_command("x", &command).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ServerNotRunning);
    }

    #[tokio::test]
    async fn test_success_coded_not_running() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/server/x/stop"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "error",
                "message": "Server 'x' is not running"
            })))
            .mount(&mock_server)
            .await;

        let client = token_client(&mock_server, "test_token");
        let err = client.stop_server("x").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ServerNotRunning);
        assert_eq!(err.message(), "Server 'x' is not running");
    }

    #[tokio::test]
    async fn test_success_coded_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/server/x/backup/action"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "error",
                "message": "Backup failed: disk full"
            })))
            .mount(&mock_server)
            .await;

        let client = token_client(&mock_server, "test_token");
        let payload = bsm_client::BackupActionPayload {
            backup_type: bsm_client::BackupAction::World,
            file_to_backup: None,
        };
        let err = client.trigger_server_backup("x", &payload).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.message(), "Backup failed: disk full");
        assert_eq!(err.status(), Some(200));
    }

    #[tokio::test]
    async fn test_no_content() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/server/x/start"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&mock_server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/api/server/x/delete"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let client = token_client(&mock_server, "test_token");
        let value = client.request(Request::post("/server/x/start")).await.unwrap();
        assert_eq!(value, no_content());

        let resp = client.delete_server("x").await.unwrap();
        assert_eq!(resp.status, "success");
        assert_eq!(resp.message.as_deref(), Some(bsm_client::NO_CONTENT_MESSAGE));
    }

    #[tokio::test]
    async fn test_degraded_success_keeps_raw_text() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/server/x/restart"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Restarting..."))
            .mount(&mock_server)
            .await;

        let client = token_client(&mock_server, "test_token");
        let value = client.request(Request::post("/server/x/restart")).await.unwrap();
        assert_eq!(value["status"], PARSING_ISSUE_STATUS);
        assert_eq!(value["raw_response"], "Restarting...");
    }

    #[tokio::test]
    async fn test_plain_text_error_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/settings"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad gateway from proxy"))
            .mount(&mock_server)
            .await;

        let client = token_client(&mock_server, "test_token");
        let err = client.get_all_settings().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ServerSide);
        assert_eq!(err.message(), "Bad gateway from proxy");
    }
}

mod transport {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_host() {
        let client =
            ApiClient::new(ClientConfig::new("http://127.0.0.1:1").with_token("t")).unwrap();
        let err = client.get_servers().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connectivity);
        assert!(err.message().contains("127.0.0.1:1"), "{}", err.message());
    }

    #[tokio::test]
    async fn test_unreachable_host_during_login_is_auth() {
        let client = ApiClient::new(
            ClientConfig::new("http://127.0.0.1:1").with_credentials("admin", "secret"),
        )
        .unwrap();
        let err = client.get_servers().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Auth);
        assert!(err.message().starts_with("API error during login:"));
    }

    #[tokio::test]
    async fn test_timeout() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/servers"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(servers_body())
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;

        let client = ApiClient::new(
            ClientConfig::new(mock_server.uri())
                .with_token("t")
                .with_timeout(Duration::from_millis(200)),
        )
        .unwrap();
        let err = client.get_servers().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connectivity);
        assert!(err.message().starts_with("Request timed out for"));
    }

    #[tokio::test]
    async fn test_closed_owned_client() {
        let mock_server = MockServer::start().await;
        let client = token_client(&mock_server, "t");
        client.close();

        let err = client.get_servers().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Closed);
    }

    #[tokio::test]
    async fn test_external_client_survives_close() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/servers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(servers_body()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = ApiClient::new(
            ClientConfig::new(mock_server.uri())
                .with_token("t")
                .with_http_client(reqwest::Client::new()),
        )
        .unwrap();
        client.close();
        client.get_servers().await.unwrap();
    }

    #[tokio::test]
    async fn test_custom_base_path() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/servers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(servers_body()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = ApiClient::new(
            ClientConfig::new(mock_server.uri())
                .with_token("t")
                .with_base_path("/v2/"),
        )
        .unwrap();
        client.get_servers().await.unwrap();
    }
}
