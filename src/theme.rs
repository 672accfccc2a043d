//! Process-wide light/dark preference, independent of any wizard session.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub const fn from_dark(dark: bool) -> Self {
        if dark {
            Self::Dark
        } else {
            Self::Light
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => f.write_str("light"),
            Self::Dark => f.write_str("dark"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ThemeError {
    #[error("failed to access theme file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("theme file {path} is malformed: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Storage for an explicit user choice. `None` means the user never chose.
pub trait ThemePersistence: fmt::Debug + Send + Sync {
    fn load(&self) -> Result<Option<Theme>, ThemeError>;
    fn save(&self, theme: Theme) -> Result<(), ThemeError>;
}

#[derive(Debug, Default)]
pub struct InMemoryThemePersistence {
    stored: Mutex<Option<Theme>>,
}

impl InMemoryThemePersistence {
    pub fn with_choice(theme: Theme) -> Self {
        Self {
            stored: Mutex::new(Some(theme)),
        }
    }

    pub fn stored(&self) -> Option<Theme> {
        *self.stored.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ThemePersistence for InMemoryThemePersistence {
    fn load(&self) -> Result<Option<Theme>, ThemeError> {
        Ok(self.stored())
    }

    fn save(&self, theme: Theme) -> Result<(), ThemeError> {
        *self.stored.lock().unwrap_or_else(PoisonError::into_inner) = Some(theme);
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ThemeFile {
    theme: Theme,
}

/// `{"theme": "dark"}` stored at a fixed path. A missing file means no
/// explicit choice.
#[derive(Debug, Clone)]
pub struct JsonFileThemePersistence {
    path: PathBuf,
}

impl JsonFileThemePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> ThemeError {
        ThemeError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ThemePersistence for JsonFileThemePersistence {
    fn load(&self) -> Result<Option<Theme>, ThemeError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.io_error(err)),
        };
        let file: ThemeFile = serde_json::from_str(&raw).map_err(|source| ThemeError::Decode {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(file.theme))
    }

    fn save(&self, theme: Theme) -> Result<(), ThemeError> {
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }
        let body = serde_json::to_string_pretty(&ThemeFile { theme }).map_err(|source| {
            ThemeError::Decode {
                path: self.path.clone(),
                source,
            }
        })?;
        fs::write(&self.path, body).map_err(|err| self.io_error(err))
    }
}

/// Current theme plus change notification. Explicit choices are persisted
/// and win over later system preference changes.
#[derive(Debug)]
pub struct ThemeStore {
    persistence: Arc<dyn ThemePersistence>,
    explicit: AtomicBool,
    sender: watch::Sender<Theme>,
}

impl ThemeStore {
    /// Persisted choice if any, else the system preference.
    pub fn init(
        persistence: Arc<dyn ThemePersistence>,
        system_is_dark: bool,
    ) -> Result<Self, ThemeError> {
        let persisted = persistence.load()?;
        let initial = persisted.unwrap_or(Theme::from_dark(system_is_dark));
        debug!(theme = %initial, explicit = persisted.is_some(), "theme initialised");

        let (sender, _) = watch::channel(initial);
        Ok(Self {
            persistence,
            explicit: AtomicBool::new(persisted.is_some()),
            sender,
        })
    }

    pub fn current(&self) -> Theme {
        *self.sender.borrow()
    }

    pub fn is_explicit(&self) -> bool {
        self.explicit.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> watch::Receiver<Theme> {
        self.sender.subscribe()
    }

    pub fn toggle(&self) -> Result<Theme, ThemeError> {
        self.set(self.current().toggled())
    }

    pub fn set(&self, theme: Theme) -> Result<Theme, ThemeError> {
        self.persistence.save(theme)?;
        self.explicit.store(true, Ordering::SeqCst);
        self.sender.send_replace(theme);
        info!(theme = %theme, "theme preference saved");
        Ok(theme)
    }

    /// Follows the system preference unless the user chose explicitly.
    /// Returns whether the change was applied.
    pub fn system_changed(&self, dark: bool) -> bool {
        if self.is_explicit() {
            debug!("ignoring system theme change, explicit choice stored");
            return false;
        }
        self.sender.send_replace(Theme::from_dark(dark));
        true
    }
}
