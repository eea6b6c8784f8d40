use leadflow_core::config::{AppConfig, LoadOptions, LogFormat};
use serde_json::json;

/// Render the effective configuration. Secret values are redacted; only
/// their presence is reported.
pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return json!({
                "command": "config",
                "status": "error",
                "message": format!("configuration issue: {error}"),
            })
            .to_string();
        }
    };

    let format = match config.logging.format {
        LogFormat::Compact => "compact",
        LogFormat::Pretty => "pretty",
        LogFormat::Json => "json",
    };

    let sla: serde_json::Map<String, serde_json::Value> = config
        .sla
        .entries
        .iter()
        .map(|(status, entry)| {
            (
                status.clone(),
                json!({
                    "max_minutes": entry.max_minutes,
                    "warning_minutes": entry.warning_minutes,
                }),
            )
        })
        .collect();

    let payload = json!({
        "command": "config",
        "status": "ok",
        "config": {
            "database": {
                "url": config.database.url,
                "max_connections": config.database.max_connections,
                "timeout_secs": config.database.timeout_secs,
            },
            "server": {
                "bind_address": config.server.bind_address,
                "port": config.server.port,
                "health_check_port": config.server.health_check_port,
                "graceful_shutdown_secs": config.server.graceful_shutdown_secs,
            },
            "sla": sla,
            "assignment": {
                "auto_assign_to": config.assignment.auto_assign_to,
            },
            "quotes": {
                "enabled": config.quotes.enabled,
                "base_url": config.quotes.base_url,
                "api_key": if config.quotes.api_key.is_some() { "<redacted>" } else { "<unset>" },
                "timeout_secs": config.quotes.timeout_secs,
            },
            "logging": {
                "level": config.logging.level,
                "format": format,
            },
        },
    });

    serde_json::to_string_pretty(&payload).unwrap_or_else(|error| {
        json!({
            "command": "config",
            "status": "error",
            "message": format!("serialization failed: {error}"),
        })
        .to_string()
    })
}
