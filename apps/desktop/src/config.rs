use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

pub const SETTINGS_FILE: &str = "capsule.toml";
const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub data_dir: PathBuf,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.into(),
            data_dir: default_data_dir(),
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn token_store_path(&self) -> PathBuf {
        self.data_dir.join("storage.json")
    }

    /// Command-line flags win over file and environment.
    pub fn apply_overrides(
        &mut self,
        server_url: Option<String>,
        data_dir: Option<PathBuf>,
        log_filter: Option<String>,
    ) {
        if let Some(v) = server_url {
            self.server_url = normalize_server_url(&v);
        }
        if let Some(v) = data_dir {
            self.data_dir = v;
        }
        if let Some(v) = log_filter {
            self.log_filter = v;
        }
    }

    fn apply_file(&mut self, raw: &str) {
        let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) else {
            return;
        };
        if let Some(v) = file_cfg.get("server_url") {
            self.server_url = normalize_server_url(v);
        }
        if let Some(v) = file_cfg.get("data_dir") {
            self.data_dir = PathBuf::from(v);
        }
        if let Some(v) = file_cfg.get("log_filter") {
            self.log_filter = v.clone();
        }
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("CAPSULE_SERVER_URL") {
            self.server_url = normalize_server_url(&v);
        }
        if let Some(v) = var("APP__SERVER_URL") {
            self.server_url = normalize_server_url(&v);
        }

        if let Some(v) = var("CAPSULE_DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
        if let Some(v) = var("APP__DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }

        if let Some(v) = var("APP__LOG_FILTER") {
            self.log_filter = v;
        }
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

fn load_settings_from(path: &Path, var: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();
    if let Ok(raw) = fs::read_to_string(path) {
        settings.apply_file(&raw);
    }
    settings.apply_env(var);
    settings
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("capsule_console")
}

pub fn normalize_server_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return DEFAULT_SERVER_URL.to_string();
    }

    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    };
    with_scheme.trim_end_matches('/').to_string()
}
