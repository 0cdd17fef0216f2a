// src/config.rs
//
// Runtime configuration, read from the process environment.
//
// VARIABLES:
// - MOVIEHUB_BACKEND            local (default) | memory | firebase
// - MOVIEHUB_DATA_DIR           local backend directory (default: <data dir>/moviehub)
// - MOVIEHUB_HTTP_TIMEOUT_SECS  HTTP client timeout for hosted backends (default 30)
// - FIREBASE_PROJECT_ID, FIREBASE_API_KEY, FIREBASE_STORAGE_BUCKET
// - FIREBASE_FIRESTORE_ROOT, FIREBASE_STORAGE_ROOT  optional emulator roots

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, AppResult};
use crate::integrations::FirebaseSettings;

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// SQLite documents and filesystem blobs under the data directory
    #[default]
    Local,
    /// Process-local stores, gone on exit
    Memory,
    /// Firestore + Firebase Storage
    Firebase,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Local => "local",
            Backend::Memory => "memory",
            Backend::Firebase => "firebase",
        }
    }
}

impl FromStr for Backend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "sqlite" => Ok(Self::Local),
            "memory" => Ok(Self::Memory),
            "firebase" => Ok(Self::Firebase),
            other => Err(AppError::Config(format!(
                "Unknown backend '{}' (expected local, memory or firebase)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub backend: Backend,
    pub data_dir: PathBuf,
    pub http_timeout: Duration,
    /// Present only for the firebase backend
    pub firebase: Option<FirebaseSettings>,
}

impl AppConfig {
    /// Load `.env` if present, then read the environment.
    pub fn load() -> AppResult<Self> {
        match dotenvy::dotenv() {
            Ok(path) => log::debug!("Loaded environment from {}", path.display()),
            Err(dotenvy::Error::Io(_)) => {}
            Err(e) => return Err(AppError::Config(format!("Invalid .env file: {}", e))),
        }

        Self::from_env()
    }

    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let backend = match get("MOVIEHUB_BACKEND") {
            Some(raw) => raw.parse()?,
            None => Backend::default(),
        };

        let data_dir = match get("MOVIEHUB_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };

        let http_timeout = match get("MOVIEHUB_HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|_| {
                    AppError::Config(format!(
                        "MOVIEHUB_HTTP_TIMEOUT_SECS must be a whole number of seconds, got '{}'",
                        raw
                    ))
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        let firebase = if backend == Backend::Firebase {
            let require = |name: &str| {
                get(name).ok_or_else(|| {
                    AppError::Config(format!("{} is required for the firebase backend", name))
                })
            };

            let mut settings = FirebaseSettings::new(
                require("FIREBASE_PROJECT_ID")?,
                require("FIREBASE_API_KEY")?,
                require("FIREBASE_STORAGE_BUCKET")?,
            );
            settings.timeout = http_timeout;
            if let Some(root) = get("FIREBASE_FIRESTORE_ROOT") {
                settings.firestore_root = root;
            }
            if let Some(root) = get("FIREBASE_STORAGE_ROOT") {
                settings.storage_root = root;
            }
            Some(settings)
        } else {
            None
        };

        Ok(Self {
            backend,
            data_dir,
            http_timeout,
            firebase,
        })
    }

    pub fn blob_dir(&self) -> PathBuf {
        self.data_dir.join("posters")
    }
}

fn default_data_dir() -> AppResult<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join("moviehub"))
        .ok_or_else(|| {
            AppError::Config("No user data directory; set MOVIEHUB_DATA_DIR".to_string())
        })
}
