//! Process-wide context (C8): working directory, external tool paths,
//! and the TOML config file that supplies the latter.
//!
//! Built once at startup and handed to adapters by shared borrow —
//! spec.md §9 is explicit that this should not be a global singleton.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::instrument;

use crate::error::{RefinerError, Result};

#[derive(Debug, Deserialize)]
struct ToolsSection {
    oracle_path: PathBuf,
    modcpm_path: PathBuf,
    ikc_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    tools: ToolsSection,
}

/// Read-only, startup-built context passed by reference to every
/// adapter that needs a filesystem path.
#[derive(Debug)]
pub struct Context {
    pub working_dir: PathBuf,
    pub transient: bool,
    pub oracle_path: PathBuf,
    pub modcpm_path: PathBuf,
    pub ikc_path: PathBuf,
}

impl Context {
    /// Loads tool paths from the first config file found on the search
    /// path (`./refiner.toml`, `$HOME/.config/connectivity-refiner/config.toml`,
    /// a bundled default next to the executable), then builds the
    /// context around `working_dir`.
    ///
    /// `config_override`, if given, is tried before the standard search path.
    #[instrument]
    pub fn load(
        working_dir: PathBuf,
        transient: bool,
        config_override: Option<&Path>,
    ) -> Result<Context> {
        let config = Self::find_config(config_override)?;

        if transient && working_dir.exists() {
            return Err(RefinerError::Config(format!(
                "working directory {} already exists under transient mode",
                working_dir.display()
            )));
        }

        Ok(Context {
            working_dir,
            transient,
            oracle_path: config.tools.oracle_path,
            modcpm_path: config.tools.modcpm_path,
            ikc_path: config.tools.ikc_path,
        })
    }

    fn find_config(config_override: Option<&Path>) -> Result<ConfigFile> {
        let mut candidates: Vec<PathBuf> = Vec::new();
        if let Some(p) = config_override {
            candidates.push(p.to_path_buf());
        }
        candidates.push(PathBuf::from("refiner.toml"));
        if let Some(home) = std::env::var_os("HOME") {
            candidates.push(
                PathBuf::from(home)
                    .join(".config")
                    .join("connectivity-refiner")
                    .join("config.toml"),
            );
        }
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                candidates.push(dir.join("default_config.toml"));
            }
        }

        for path in &candidates {
            if path.exists() {
                let text = std::fs::read_to_string(path).map_err(|source| RefinerError::Io {
                    path: path.clone(),
                    source,
                })?;
                return toml::from_str(&text)
                    .map_err(|e| RefinerError::Config(format!("{}: {e}", path.display())));
            }
        }

        Err(RefinerError::Config(format!(
            "config file not found in any of: {}",
            candidates
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )))
    }

    /// Lazily creates the working directory on first use.
    pub fn ensure_working_dir(&self) -> Result<()> {
        if !self.working_dir.exists() {
            std::fs::create_dir_all(&self.working_dir).map_err(|source| RefinerError::Io {
                path: self.working_dir.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Content-addressed path for files related to a subgraph: the
    /// first 10 hex characters of the SHA-256 digest of its index,
    /// plus `suffix`. Collisions within a run indicate a bug, since
    /// indices are unique by construction.
    pub fn request_graph_related_path(&self, index: &str, suffix: &str) -> Result<PathBuf> {
        self.ensure_working_dir()?;
        let mut hasher = Sha256::new();
        hasher.update(index.as_bytes());
        let digest = hasher.finalize();
        let hash = hex_prefix(&digest, 10);
        Ok(self.working_dir.join(format!("{hash}.{suffix}")))
    }

    /// A working-subdirectory path not tied to a particular subgraph
    /// (e.g. a clusterer's per-cluster scratch directory).
    pub fn request_subpath(&self, suffix: &str) -> Result<PathBuf> {
        self.ensure_working_dir()?;
        Ok(self.working_dir.join(suffix))
    }
}

/// Guard that deletes the working directory on drop, in transient mode.
/// The Rust analogue of the original's `atexit.register(shutil.rmtree)`.
pub struct TransientGuard {
    path: Option<PathBuf>,
}

impl TransientGuard {
    pub fn new(ctx: &Context) -> TransientGuard {
        TransientGuard {
            path: ctx.transient.then(|| ctx.working_dir.clone()),
        }
    }
}

impl Drop for TransientGuard {
    fn drop(&mut self) {
        if let Some(path) = &self.path {
            let _ = std::fs::remove_dir_all(path);
        }
    }
}

fn hex_prefix(bytes: &[u8], n: usize) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect::<String>()[..n].to_string()
}
