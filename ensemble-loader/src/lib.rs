//! Worker discovery for `ensemble-loader`.
//!
//! `discover(dir)` scans a modules directory and turns each candidate file into
//! a named worker unit. Entries are visited in file-name order:
//!
//! - `<name>.yaml` / `<name>.yml` — a [`Manifest`] describing the command.
//! - any other executable regular file — run directly, named by its stem.
//! - hidden files, directories and everything else are skipped.
//!
//! Name collisions are not resolved here: the registry rejects the duplicate
//! and the load phase stops.

use std::fs;
use std::path::{Path, PathBuf};

use ensemble_core::{CommandUnit, SharedUnit, WorkerName};
use thiserror::Error;

pub mod catalog;
pub mod manifest;

pub use catalog::Catalog;
pub use manifest::Manifest;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Where a discovered unit came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitSource {
    /// Built by a factory registered in a [`Catalog`].
    Catalog,
    Manifest(PathBuf),
    Executable(PathBuf),
}

impl UnitSource {
    pub fn kind(&self) -> &'static str {
        match self {
            UnitSource::Catalog => "catalog",
            UnitSource::Manifest(_) => "manifest",
            UnitSource::Executable(_) => "executable",
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            UnitSource::Catalog => None,
            UnitSource::Manifest(path) | UnitSource::Executable(path) => Some(path),
        }
    }
}

/// A named unit ready to be registered.
#[derive(Debug, Clone)]
pub struct DiscoveredUnit {
    pub name: WorkerName,
    pub unit: SharedUnit,
    pub source: UnitSource,
}

impl DiscoveredUnit {
    pub fn into_pair(self) -> (WorkerName, SharedUnit) {
        (self.name, self.unit)
    }
}

/// Errors from worker discovery.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("modules directory not found or not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid worker manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> LoadError {
    LoadError::Io {
        path: path.into(),
        source,
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Discover every worker unit in `dir`.
///
/// Paths in the returned units are absolute, so workers behave the same no
/// matter where the supervisor was started from.
pub fn discover(dir: &Path) -> Result<Vec<DiscoveredUnit>, LoadError> {
    if !dir.is_dir() {
        return Err(LoadError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }
    let root = fs::canonicalize(dir).map_err(|e| io_err(dir, e))?;

    let mut entries: Vec<_> = fs::read_dir(&root)
        .map_err(|e| io_err(&root, e))?
        .filter_map(|e| e.ok())
        .collect();
    entries.sort_by_key(|e| e.file_name());

    let mut units = Vec::new();
    for entry in entries {
        let path = entry.path();
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if file_name.starts_with('.') {
            continue;
        }
        let file_type = entry.file_type().map_err(|e| io_err(&path, e))?;
        // Symlinks are followed; a dangling one is skipped like any non-file.
        let is_file = file_type.is_file() || (file_type.is_symlink() && path.is_file());
        if !is_file {
            tracing::debug!(path = %path.display(), "skipping non-file entry");
            continue;
        }

        let Some(stem) = path.file_stem().and_then(|s| s.to_str()).map(str::to_owned) else {
            tracing::debug!(path = %path.display(), "skipping entry without a UTF-8 name");
            continue;
        };

        if is_manifest(&path) {
            units.push(load_manifest(&root, &path, stem)?);
        } else if is_executable(&path)? {
            units.push(DiscoveredUnit {
                name: WorkerName::from(stem),
                unit: CommandUnit::new(&path).shared(),
                source: UnitSource::Executable(path),
            });
        } else {
            tracing::debug!(path = %path.display(), "skipping non-executable file");
        }
    }

    tracing::info!(dir = %root.display(), count = units.len(), "worker discovery finished");
    Ok(units)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn is_manifest(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
        .unwrap_or(false)
}

fn load_manifest(root: &Path, path: &Path, stem: String) -> Result<DiscoveredUnit, LoadError> {
    let contents = fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let manifest = Manifest::parse(&contents).map_err(|source| LoadError::Manifest {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(DiscoveredUnit {
        name: WorkerName::from(stem),
        unit: manifest.into_unit(root).shared(),
        source: UnitSource::Manifest(path.to_path_buf()),
    })
}

#[cfg(unix)]
fn is_executable(path: &Path) -> Result<bool, LoadError> {
    use std::os::unix::fs::PermissionsExt;
    let meta = fs::metadata(path).map_err(|e| io_err(path, e))?;
    Ok(meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> Result<bool, LoadError> {
    Ok(path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("exe"))
        .unwrap_or(false))
}
