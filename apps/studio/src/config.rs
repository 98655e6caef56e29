use std::{fs, time::Duration};

use client_core::ContainerConfig;
use toml::{Table, Value};

const SETTINGS_FILE: &str = "studio.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub service_url: String,
    pub log_filter: String,
    pub search_debounce_ms: u64,
    pub event_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            service_url: "http://127.0.0.1:8080/api".into(),
            log_filter: "info".into(),
            search_debounce_ms: 200,
            event_capacity: 256,
        }
    }
}

impl Settings {
    pub fn container_config(&self) -> ContainerConfig {
        ContainerConfig {
            search_debounce: Duration::from_millis(self.search_debounce_ms),
            event_capacity: self.event_capacity,
            ..ContainerConfig::default()
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();
    if let Ok(raw) = fs::read_to_string(SETTINGS_FILE) {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

/// Unknown keys and unparsable files are ignored.
fn apply_file(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = raw.parse::<Table>() else {
        return;
    };

    if let Some(Value::String(v)) = file_cfg.get("service_url") {
        settings.service_url = v.clone();
    }
    if let Some(Value::String(v)) = file_cfg.get("log_filter") {
        settings.log_filter = v.clone();
    }
    if let Some(v) = file_cfg.get("search_debounce_ms").and_then(as_u64) {
        settings.search_debounce_ms = v;
    }
    if let Some(v) = file_cfg.get("event_capacity").and_then(as_u64) {
        settings.event_capacity = usize::try_from(v).unwrap_or(settings.event_capacity);
    }
}

fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Integer(v) => u64::try_from(*v).ok(),
        Value::String(v) => v.parse().ok(),
        _ => None,
    }
}

/// Plain names first, `STUDIO__*` wins over them.
fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("STUDIO_SERVICE_URL") {
        settings.service_url = v;
    }
    if let Some(v) = lookup("STUDIO__SERVICE_URL") {
        settings.service_url = v;
    }

    if let Some(v) = lookup("STUDIO__LOG_FILTER") {
        settings.log_filter = v;
    }

    if let Some(v) = lookup("STUDIO__SEARCH_DEBOUNCE_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.search_debounce_ms = parsed;
        }
    }

    if let Some(v) = lookup("STUDIO__EVENT_CAPACITY") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.event_capacity = parsed;
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
