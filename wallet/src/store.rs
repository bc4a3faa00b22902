//! # On-Disk Wallet State
//!
//! The wallet keeps two files in its data directory:
//!
//! - `dev.key` — the hex-encoded 32-byte seed of the development
//!   identity. Generated on first use; the same seed always signs in as
//!   the same principal.
//! - `session.json` — the persisted session, so `login` once carries
//!   across invocations until the delegation expires.
//!
//! Both files are written with owner-only permissions on Unix. The seed
//! is a development credential, but there is no reason to leave it
//! world-readable either.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::rngs::OsRng;
use rand::RngCore;

use zenith_client::identity::{Identity, SessionStore, StoreError};

/// File name of the development identity seed inside the data directory.
pub const KEY_FILE: &str = "dev.key";

/// File name of the persisted session inside the data directory.
pub const SESSION_FILE: &str = "session.json";

// ---------------------------------------------------------------------------
// Session store
// ---------------------------------------------------------------------------

/// Session store backed by a JSON file in the wallet data directory.
///
/// A missing file reads as "no session"; corruption reads as an error so
/// the session manager can clear it and fall back to a fresh login.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(data_dir: &Path) -> Self {
        FileSessionStore {
            path: data_dir.join(SESSION_FILE),
        }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Identity>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::new(format!(
                    "reading {}: {e}",
                    self.path.display()
                )))
            }
        };

        let identity = serde_json::from_str(&raw).map_err(|e| {
            StoreError::new(format!("parsing {}: {e}", self.path.display()))
        })?;
        Ok(Some(identity))
    }

    fn save(&self, identity: &Identity) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                StoreError::new(format!("creating {}: {e}", parent.display()))
            })?;
        }

        let body = serde_json::to_string_pretty(identity)
            .map_err(|e| StoreError::new(format!("encoding session: {e}")))?;
        fs::write(&self.path, body).map_err(|e| {
            StoreError::new(format!("writing {}: {e}", self.path.display()))
        })?;
        restrict_permissions(&self.path).map_err(|e| StoreError::new(e.to_string()))
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::new(format!(
                "removing {}: {e}",
                self.path.display()
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Development seed
// ---------------------------------------------------------------------------

/// Loads the development identity seed, generating and persisting a fresh
/// one on first use.
pub fn load_or_create_seed(data_dir: &Path) -> Result<[u8; 32]> {
    fs::create_dir_all(data_dir)
        .with_context(|| format!("creating data directory {}", data_dir.display()))?;

    let key_path = data_dir.join(KEY_FILE);
    if key_path.exists() {
        return read_seed(&key_path);
    }

    let mut seed = [0u8; 32];
    OsRng.fill_bytes(&mut seed);
    fs::write(&key_path, hex::encode(seed))
        .with_context(|| format!("writing key file {}", key_path.display()))?;
    restrict_permissions(&key_path)?;

    tracing::info!(path = %key_path.display(), "generated development identity key");
    Ok(seed)
}

fn read_seed(key_path: &Path) -> Result<[u8; 32]> {
    let raw = fs::read_to_string(key_path)
        .with_context(|| format!("reading key file {}", key_path.display()))?;
    let bytes = hex::decode(raw.trim())
        .with_context(|| format!("decoding key file {}", key_path.display()))?;
    bytes.as_slice().try_into().map_err(|_| {
        anyhow::anyhow!(
            "key file {} holds {} bytes, expected 32",
            key_path.display(),
            bytes.len()
        )
    })
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .with_context(|| format!("restricting permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
