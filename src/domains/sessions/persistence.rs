use super::entity::SavedSession;
use crate::errors::CockpitError;
use std::path::{Path, PathBuf};

/// Wholesale save/load of the session file. There is no schema versioning; a
/// malformed or absent file reads as no prior session.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn at_default_location() -> Self {
        let path = dirs::config_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("cockpit")
            .join("session.json");
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, session: &SavedSession) -> Result<(), CockpitError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|err| CockpitError::io("create_dir", parent.display(), err))?;
        }
        let json = serde_json::to_string(session)
            .map_err(|err| CockpitError::PersistenceError {
                message: err.to_string(),
            })?;
        std::fs::write(&self.path, json)
            .map_err(|err| CockpitError::io("write", self.path.display(), err))
    }

    pub fn load(&self) -> Option<SavedSession> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str::<SavedSession>(&raw) {
            Ok(session) if !session.tabs.is_empty() => Some(session),
            Ok(_) => None,
            Err(err) => {
                log::warn!(
                    "Ignoring malformed session file {}: {err}",
                    self.path.display()
                );
                None
            }
        }
    }
}
