// ABOUTME: Executes parsed CLI commands against the API client
// ABOUTME: Renders results with terminal colors and polls background tasks with a spinner

use crate::api::ApiClient;
use crate::auth::{base_config, client_config, resolve_credentials, SessionArgs};
use crate::cli::{
    AddonCommand, AllowlistCommand, AuthCommand, BackupCommand, Cli, Commands, ContentCommand,
    DownloadsCommand, PermissionsCommand, PlayerCommand, PluginCommand, ServerCommand,
    SettingsCommand, SystemCommand, WorldCommand,
};
use crate::config::{config_path, StoredConfig};
use crate::model::{
    ActionResponse, AddPlayersPayload, AllowlistAddPayload, AllowlistRemovePayload,
    BackupActionPayload, CommandPayload, FileNamePayload, GeneralApiResponse,
    InstallServerPayload, PermissionsSetPayload, PlayerPermission, PluginStatusSetPayload,
    PropertiesPayload, PruneDownloadsPayload, RestoreActionPayload, RestoreType,
    TriggerEventPayload,
};
use crate::response::PARSING_ISSUE_STATUS;
use crate::util::coerce_value;
use crate::{ApiErrorInfo, Error, Result};
use crossterm::style::Stylize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Map, Value};
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

const TASK_POLL_INTERVAL: Duration = Duration::from_secs(2);

pub async fn run(cli: Cli) -> Result<()> {
    let path = config_path(cli.config.clone())?;
    let mut stored = StoredConfig::load(&path)?;
    let args = cli.session_args();
    debug!(config = %path.display(), "Loaded CLI config");

    if let Commands::Auth(cmd) = &cli.command {
        return run_auth(cmd, &args, &mut stored, &path).await;
    }

    let client = ApiClient::new(client_config(&args, &stored)?)?;
    let result = dispatch(&client, cli.command).await;
    client.close();
    result
}

async fn run_auth(
    cmd: &AuthCommand,
    args: &SessionArgs,
    stored: &mut StoredConfig,
    path: &Path,
) -> Result<()> {
    match cmd {
        AuthCommand::Login => {
            let credentials = resolve_credentials(args, stored)?;
            let config = base_config(args, stored)
                .with_credentials(credentials.username.clone(), credentials.password);
            let client = ApiClient::new(config)?;
            let token = client.authenticate().await;
            client.close();
            let token = token?;

            if let Some(base_url) = &args.base_url {
                stored.base_url = Some(base_url.clone());
            }
            stored.username = Some(credentials.username);
            stored.jwt_token = Some(token.access_token);
            stored.save(path)?;
            success("Login successful.");
        }
        AuthCommand::Logout => {
            if stored.jwt_token.is_some() || args.token.is_some() {
                let remote = match client_config(args, stored).and_then(ApiClient::new) {
                    Ok(client) => {
                        let result = client.logout().await;
                        client.close();
                        result.map(|_| ())
                    }
                    Err(e) => Err(e),
                };
                if let Err(e) = remote {
                    warning(format!("Remote logout failed: {}", e));
                }
            }
            stored.jwt_token = None;
            stored.save(path)?;
            success("Logged out.");
        }
    }
    Ok(())
}

async fn dispatch(client: &ApiClient, command: Commands) -> Result<()> {
    match command {
        Commands::Auth(_) => Ok(()),
        Commands::Server(cmd) => run_server(client, cmd).await,
        Commands::Backup(cmd) => run_backup(client, cmd).await,
        Commands::World(cmd) => run_world(client, cmd).await,
        Commands::Addon(AddonCommand::Install { target, file }) => {
            let resp = client
                .install_server_addon(&target.server, &FileNamePayload::new(file)?)
                .await?;
            report(&resp, "Addon installed.");
            Ok(())
        }
        Commands::Content(cmd) => {
            let resp = match cmd {
                ContentCommand::Worlds => client.get_content_worlds().await?,
                ContentCommand::Addons => client.get_content_addons().await?,
            };
            let files = resp.files.unwrap_or_default();
            if files.is_empty() {
                warning("No content files found.");
            }
            for file in files {
                println!("- {}", file);
            }
            Ok(())
        }
        Commands::Player(cmd) => run_player(client, cmd).await,
        Commands::Allowlist(cmd) => run_allowlist(client, cmd).await,
        Commands::Permissions(cmd) => run_permissions(client, cmd).await,
        Commands::Settings(cmd) => run_settings(client, cmd).await,
        Commands::Plugin(cmd) => run_plugin(client, cmd).await,
        Commands::System(cmd) => run_system(client, cmd).await,
        Commands::Downloads(DownloadsCommand::Prune { directory, keep }) => {
            let payload = PruneDownloadsPayload::new(directory, keep)?;
            let resp = client.prune_downloads(&payload).await?;
            success(format!(
                "Pruned download cache: {} deleted, {} kept.",
                resp.files_deleted.unwrap_or(0),
                resp.files_kept.unwrap_or(0)
            ));
            Ok(())
        }
    }
}

async fn run_server(client: &ApiClient, cmd: ServerCommand) -> Result<()> {
    match cmd {
        ServerCommand::List => {
            let resp = client.get_servers().await?;
            let servers = resp.servers.unwrap_or_default();
            if servers.is_empty() {
                warning("No servers found.");
            }
            for server in servers {
                println!(
                    "- {}: {} ({})",
                    field(&server, "name"),
                    field(&server, "status"),
                    field(&server, "version")
                );
            }
        }
        ServerCommand::Status(target) => {
            let status = client.get_server_running_status(&target.server).await?;
            let version = client.get_server_version(&target.server).await?;
            heading(format!("Server: {}", target.server));
            print_data("Running", &status.data, "running");
            print_data("Version", &version.data, "version");
        }
        ServerCommand::Start(target) => {
            let resp = client.start_server(&target.server).await?;
            report(&resp, &format!("Server '{}' started.", target.server));
        }
        ServerCommand::Stop(target) => {
            let resp = client.stop_server(&target.server).await?;
            report(&resp, &format!("Stop signal sent to server '{}'.", target.server));
        }
        ServerCommand::Restart(target) => {
            let resp = client.restart_server(&target.server).await?;
            report(&resp, &format!("Restart signal sent to server '{}'.", target.server));
        }
        ServerCommand::Update(target) => {
            let resp = client.update_server(&target.server).await?;
            report(&resp, "Update check complete.");
        }
        ServerCommand::Delete { target, yes } => {
            if !yes
                && !confirm(&format!(
                    "Permanently delete server '{}' including worlds and backups?",
                    target.server
                ))?
            {
                warning("Aborted.");
                return Ok(());
            }
            let resp = client.delete_server(&target.server).await?;
            report(&resp, &format!("Server '{}' deleted.", target.server));
        }
        ServerCommand::Install {
            name,
            version,
            overwrite,
            no_wait,
        } => {
            let payload = InstallServerPayload::new(name, version)?.overwrite(overwrite);
            let resp = client.install_new_server(&payload).await?;
            if resp.status == "confirm_needed" {
                warning(format!(
                    "Server '{}' already exists. Re-run with --overwrite to replace it.",
                    payload.server_name
                ));
                return Ok(());
            }
            match resp.task_id {
                Some(task_id) if !no_wait => wait_for_task(client, &task_id).await?,
                Some(task_id) => success(format!("Install queued as task {}.", task_id)),
                None => success(resp.message.unwrap_or_else(|| "Server installed.".into())),
            }
        }
        ServerCommand::SendCommand { target, command } => {
            let payload = CommandPayload::new(command.join(" "))?;
            let resp = client.send_server_command(&target.server, &payload).await?;
            report(&resp, "Command sent.");
            if let Some(details) = resp.details {
                print_json(&details);
            }
        }
        ServerCommand::Properties(target) => {
            let resp = client.get_server_properties(&target.server).await?;
            for (key, value) in resp.properties.unwrap_or_default() {
                println!("{} = {}", key, render(&value));
            }
        }
        ServerCommand::SetProperty { target, properties } => {
            let map: Map<String, Value> = properties
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect();
            let resp = client
                .update_server_properties(&target.server, &PropertiesPayload::new(map)?)
                .await?;
            report(&resp, "Properties updated.");
        }
    }
    Ok(())
}

async fn run_backup(client: &ApiClient, cmd: BackupCommand) -> Result<()> {
    match cmd {
        BackupCommand::List {
            target,
            backup_type,
        } => {
            let resp = client.list_server_backups(&target.server, backup_type).await?;
            match resp.backups {
                Some(Value::Array(files)) if !files.is_empty() => {
                    for file in files {
                        println!("- {}", render(&file));
                    }
                }
                Some(Value::Object(groups)) => {
                    for (group, files) in groups {
                        heading(group);
                        print_json(&files);
                    }
                }
                _ => warning("No backups found."),
            }
        }
        BackupCommand::Create {
            target,
            backup_type,
            file,
        } => {
            let payload = BackupActionPayload {
                backup_type,
                file_to_backup: file,
            };
            let resp = client.trigger_server_backup(&target.server, &payload).await?;
            success(resp.message.unwrap_or_else(|| "Backup completed.".into()));
        }
        BackupCommand::Restore {
            target,
            restore_type,
            file,
        } => {
            let resp = match (restore_type, file) {
                (RestoreType::All, None) => client.restore_server_latest_all(&target.server).await?,
                (restore_type, file) => {
                    if restore_type != RestoreType::All && file.is_none() {
                        return Err(Error::InvalidArgument(
                            "--file is required unless restoring the latest of everything with --type all.".into(),
                        ));
                    }
                    let payload = RestoreActionPayload {
                        restore_type,
                        backup_file: file,
                    };
                    client.restore_server_backup(&target.server, &payload).await?
                }
            };
            success(resp.message.unwrap_or_else(|| "Restore completed.".into()));
        }
        BackupCommand::Prune(target) => {
            let resp = client.prune_server_backups(&target.server).await?;
            success(resp.message.unwrap_or_else(|| "Backups pruned.".into()));
        }
    }
    Ok(())
}

async fn run_world(client: &ApiClient, cmd: WorldCommand) -> Result<()> {
    match cmd {
        WorldCommand::Export(target) => {
            let resp = client.export_server_world(&target.server).await?;
            report(&resp, "World exported.");
        }
        WorldCommand::Reset { target, yes } => {
            if !yes && !confirm(&format!("Reset the world of server '{}'?", target.server))? {
                warning("Aborted.");
                return Ok(());
            }
            let resp = client.reset_server_world(&target.server).await?;
            report(&resp, "World reset.");
        }
        WorldCommand::Install { target, file } => {
            let resp = client
                .install_server_world(&target.server, &FileNamePayload::new(file)?)
                .await?;
            report(&resp, "World installed.");
        }
    }
    Ok(())
}

async fn run_player(client: &ApiClient, cmd: PlayerCommand) -> Result<()> {
    match cmd {
        PlayerCommand::Scan => {
            let resp = client.scan_players().await?;
            report(&resp, "Player scan complete.");
        }
        PlayerCommand::List => {
            let resp = client.get_players().await?;
            let players = resp.players.unwrap_or_default();
            if players.is_empty() {
                warning("No players found.");
            }
            for player in players {
                println!("- {} ({})", field_of(&player, "name"), field_of(&player, "xuid"));
            }
        }
        PlayerCommand::Add { players } => {
            let resp = client.add_players(&AddPlayersPayload::new(players)?).await?;
            report(&resp, "Players added.");
        }
    }
    Ok(())
}

async fn run_allowlist(client: &ApiClient, cmd: AllowlistCommand) -> Result<()> {
    match cmd {
        AllowlistCommand::List(target) => {
            let resp = client.get_server_allowlist(&target.server).await?;
            let players = resp.players.unwrap_or_default();
            if players.is_empty() {
                warning("Allowlist is empty.");
            }
            for player in players {
                println!(
                    "- {} (ignores limit: {})",
                    field_of(&player, "name"),
                    field_of(&player, "ignoresPlayerLimit")
                );
            }
        }
        AllowlistCommand::Add {
            target,
            players,
            ignore_limit,
        } => {
            let payload = AllowlistAddPayload::new(players, ignore_limit)?;
            let resp = client.add_server_allowlist(&target.server, &payload).await?;
            report(&resp, "Players added to allowlist.");
        }
        AllowlistCommand::Remove { target, players } => {
            let payload = AllowlistRemovePayload::new(players)?;
            let resp = client
                .remove_server_allowlist_players(&target.server, &payload)
                .await?;
            report(&resp, "Players removed from allowlist.");
        }
    }
    Ok(())
}

async fn run_permissions(client: &ApiClient, cmd: PermissionsCommand) -> Result<()> {
    match cmd {
        PermissionsCommand::List(target) => {
            let resp = client.get_server_permissions(&target.server).await?;
            match resp.data.as_ref().and_then(|d| d.get("permissions")) {
                Some(Value::Array(entries)) if !entries.is_empty() => {
                    for entry in entries {
                        println!(
                            "- {} ({}): {}",
                            field_of(entry, "name"),
                            field_of(entry, "xuid"),
                            field_of(entry, "permission_level")
                        );
                    }
                }
                _ => warning("No permissions set."),
            }
        }
        PermissionsCommand::Set {
            target,
            xuid,
            level,
            name,
        } => {
            let payload = PermissionsSetPayload {
                permissions: vec![PlayerPermission {
                    xuid,
                    name,
                    permission_level: level,
                }],
            };
            let resp = client.set_server_permissions(&target.server, &payload).await?;
            report(&resp, "Permissions updated.");
        }
    }
    Ok(())
}

async fn run_settings(client: &ApiClient, cmd: SettingsCommand) -> Result<()> {
    match cmd {
        SettingsCommand::List => {
            let resp = client.get_all_settings().await?;
            print_json(&Value::Object(resp.settings.unwrap_or_default()));
        }
        SettingsCommand::Set { key, value } => {
            let resp = client.set_setting(&key, coerce_value(&value)).await?;
            success(resp.message.unwrap_or_else(|| format!("Setting '{}' updated.", key)));
        }
        SettingsCommand::Reload => {
            let resp = client.reload_settings().await?;
            report(&resp, "Settings reloaded.");
        }
    }
    Ok(())
}

async fn run_plugin(client: &ApiClient, cmd: PluginCommand) -> Result<()> {
    match cmd {
        PluginCommand::List => {
            let plugins = client.get_plugin_statuses().await?.plugins.unwrap_or_default();
            if plugins.is_empty() {
                warning("No plugins found.");
            }
            for (name, info) in plugins {
                let state = if info.enabled {
                    "enabled".green()
                } else {
                    "disabled".red()
                };
                println!(
                    "- {} (v{}): {}",
                    name,
                    info.version.as_deref().unwrap_or("?"),
                    state
                );
            }
        }
        PluginCommand::Enable { name } => {
            client
                .set_plugin_status(&name, &PluginStatusSetPayload { enabled: true })
                .await?;
            success(format!("Plugin '{}' enabled. Reload plugins to apply.", name));
        }
        PluginCommand::Disable { name } => {
            client
                .set_plugin_status(&name, &PluginStatusSetPayload { enabled: false })
                .await?;
            success(format!("Plugin '{}' disabled. Reload plugins to apply.", name));
        }
        PluginCommand::Reload => {
            client.reload_plugins().await?;
            success("Plugins reloaded.");
        }
        PluginCommand::TriggerEvent { event, payload } => {
            let payload = match payload {
                Some(raw) => match serde_json::from_str::<Value>(&raw)? {
                    Value::Object(map) => Some(map),
                    _ => {
                        return Err(Error::InvalidArgument(
                            "Event payload must be a JSON object.".into(),
                        ))
                    }
                },
                None => None,
            };
            client
                .trigger_plugin_event(&TriggerEventPayload::new(event.clone(), payload)?)
                .await?;
            success(format!("Event '{}' triggered.", event));
        }
    }
    Ok(())
}

async fn run_system(client: &ApiClient, cmd: SystemCommand) -> Result<()> {
    match cmd {
        SystemCommand::Info => {
            let resp = client.get_info().await?;
            let info = resp.info.or(resp.data).unwrap_or_default();
            for (key, value) in info {
                println!("{:<16}: {}", key, render(&value));
            }
        }
        SystemCommand::Monitor { target, interval } => monitor(client, &target.server, interval).await?,
    }
    Ok(())
}

async fn monitor(client: &ApiClient, server: &str, interval: u64) -> Result<()> {
    println!(
        "{}",
        format!("Monitoring server '{}'. Press Ctrl+C to exit.", server).cyan()
    );
    let mut ticker = tokio::time::interval(Duration::from_secs(interval));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = ticker.tick() => {}
        }

        let resp = client.get_server_process_info(server).await?;
        println!(
            "{}",
            format!(
                "--- {} @ {} ---",
                server,
                chrono::Local::now().format("%H:%M:%S")
            )
            .magenta()
            .bold()
        );
        print_process_info(&resp);
    }

    success("Monitoring stopped.");
    Ok(())
}

fn print_process_info(resp: &GeneralApiResponse) {
    let info = resp
        .data
        .as_ref()
        .and_then(|d| d.get("process_info"))
        .filter(|v| !v.is_null());
    let Some(info) = info else {
        warning("Server process not found (is it running?).");
        return;
    };

    let number = |key: &str| info.get(key).and_then(Value::as_f64).unwrap_or(0.0);
    println!("  {:<15}: {}", "PID", field_of(info, "pid").cyan());
    println!("  {:<15}: {}", "CPU Usage", format!("{:.1}%", number("cpu_percent")).green());
    println!("  {:<15}: {}", "Memory Usage", format!("{:.1} MB", number("memory_mb")).green());
    println!("  {:<15}: {}", "Uptime", field_of(info, "uptime"));
}

async fn wait_for_task(client: &ApiClient, task_id: &str) -> Result<()> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message(format!("Waiting for task {}", task_id));

    loop {
        let status = match client.get_task_status(task_id).await {
            Ok(status) => status,
            Err(e) => {
                spinner.abandon();
                return Err(e);
            }
        };
        let message = status.message.unwrap_or_default();

        match status.status.as_str() {
            "success" => {
                spinner.finish_and_clear();
                success(format!("Task finished: {}", message));
                return Ok(());
            }
            "error" => {
                spinner.abandon();
                return Err(Error::OperationFailed(ApiErrorInfo::new(message)));
            }
            other => {
                debug!(task_id = %task_id, status = %other, "Task still running");
                if !message.is_empty() {
                    spinner.set_message(message);
                }
            }
        }

        tokio::time::sleep(TASK_POLL_INTERVAL).await;
    }
}

fn report(resp: &ActionResponse, fallback: &str) {
    let message = resp.message.clone().unwrap_or_else(|| fallback.to_string());
    if resp.status == PARSING_ISSUE_STATUS {
        warning(format!("{} (unexpected response format)", fallback));
    } else {
        success(message);
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt.yellow().bold());
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn success(msg: impl Into<String>) {
    println!("{}", msg.into().green());
}

fn warning(msg: impl Into<String>) {
    eprintln!("{}", msg.into().yellow());
}

fn heading(msg: impl Into<String>) {
    println!("{}", msg.into().bold());
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "N/A".into(),
        other => other.to_string(),
    }
}

fn field(map: &Map<String, Value>, key: &str) -> String {
    map.get(key).map(render).unwrap_or_else(|| "N/A".into())
}

fn field_of(value: &Value, key: &str) -> String {
    value.get(key).map(render).unwrap_or_else(|| "N/A".into())
}

fn print_data(label: &str, data: &Option<Map<String, Value>>, key: &str) {
    let value = data
        .as_ref()
        .and_then(|d| d.get(key))
        .map(render)
        .unwrap_or_else(|| "N/A".into());
    println!("  {:<10}: {}", label, value);
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(_) => println!("{}", value),
    }
}
