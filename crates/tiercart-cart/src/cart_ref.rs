//! The persisted reference to the current remote cart.
//!
//! The slot holds at most one cart id. It is read once at startup, written
//! when a cart is created and cleared when the backend reports the cart
//! gone or the user clears the cart.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::CartRefError;

pub trait CartRefStore {
    /// Returns the stored cart id, if any.
    ///
    /// # Errors
    ///
    /// Returns [`CartRefError`] if the slot exists but cannot be read.
    fn load(&self) -> Result<Option<String>, CartRefError>;

    /// # Errors
    ///
    /// Returns [`CartRefError`] if the slot cannot be written.
    fn save(&self, cart_id: &str) -> Result<(), CartRefError>;

    /// # Errors
    ///
    /// Returns [`CartRefError`] if an existing slot cannot be removed.
    fn clear(&self) -> Result<(), CartRefError>;
}

/// In-process slot for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryCartRef {
    slot: Mutex<Option<String>>,
}

impl MemoryCartRef {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_cart_id(cart_id: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(cart_id.into())),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        // A poisoned slot still holds a valid Option.
        self.slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl CartRefStore for MemoryCartRef {
    fn load(&self) -> Result<Option<String>, CartRefError> {
        Ok(self.lock().clone())
    }

    fn save(&self, cart_id: &str) -> Result<(), CartRefError> {
        *self.lock() = Some(cart_id.to_owned());
        Ok(())
    }

    fn clear(&self) -> Result<(), CartRefError> {
        *self.lock() = None;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CartRefFile {
    cart_id: String,
}

/// JSON file slot: `{ "cart_id": "..." }`.
///
/// A missing file is an empty slot. A file that does not parse is treated as
/// empty and logged.
#[derive(Debug, Clone)]
pub struct FileCartRef {
    path: PathBuf,
}

impl FileCartRef {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> CartRefError {
        CartRefError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl CartRefStore for FileCartRef {
    fn load(&self) -> Result<Option<String>, CartRefError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        match serde_json::from_str::<CartRefFile>(&content) {
            Ok(file) if !file.cart_id.trim().is_empty() => Ok(Some(file.cart_id)),
            Ok(_) => Ok(None),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "cart reference file is corrupt, treating as empty"
                );
                Ok(None)
            }
        }
    }

    fn save(&self, cart_id: &str) -> Result<(), CartRefError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let body = serde_json::to_string_pretty(&CartRefFile {
            cart_id: cart_id.to_owned(),
        })?;
        std::fs::write(&self.path, body).map_err(|e| self.io_error(e))
    }

    fn clear(&self) -> Result<(), CartRefError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}
