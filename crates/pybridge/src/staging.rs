//! Materializing host files into the runtime's virtual filesystem.
//!
//! Traversal is decoupled from the side-effecting writes: [`plan_tree`]
//! yields `(host path, virtual path)` pairs lazily, and the `materialize_*`
//! functions consume such plans against a [`Runtime`]. This keeps the walk
//! logic unit-testable without a live interpreter.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::Error;
use crate::runtime::Runtime;

/// Extension of source files staged by [`materialize_tree`].
pub const STAGED_EXTENSION: &str = "py";

/// One planned transfer from the host into the virtual filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingEntry {
    /// Source file on the host.
    pub host_path: PathBuf,
    /// Destination in the virtual filesystem (absolute, `/`-separated).
    pub virtual_path: String,
}

/// Plan the recursive staging of `host_dir` under `virtual_dir`.
///
/// Hidden entries (names beginning with `.`) are pruned together with their
/// subtrees; only files with the staged extension are yielded. Entries the
/// walker cannot read come through as `Err` so callers can decide to skip
/// them without aborting the traversal.
pub fn plan_tree(
    host_dir: &Path,
    virtual_dir: &str,
) -> impl Iterator<Item = walkdir::Result<StagingEntry>> + use<> {
    let root = host_dir.to_path_buf();
    let virtual_dir = virtual_dir.trim_end_matches('/').to_string();

    WalkDir::new(host_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden_name(&entry.file_name().to_string_lossy()))
        .filter_map(move |entry| match entry {
            Ok(entry) => {
                if !entry.file_type().is_file() {
                    return None;
                }
                let has_staged_ext = entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext == STAGED_EXTENSION);
                if !has_staged_ext {
                    return None;
                }
                Some(Ok(entry_for(&root, &virtual_dir, entry.path())))
            }
            Err(err) => Some(Err(err)),
        })
}

fn is_hidden_name(name: &str) -> bool {
    name.starts_with('.')
}

fn entry_for(root: &Path, virtual_dir: &str, host_path: &Path) -> StagingEntry {
    let relative = host_path.strip_prefix(root).unwrap_or(host_path);
    let mut virtual_path = virtual_dir.to_string();
    for component in relative.components() {
        virtual_path.push('/');
        virtual_path.push_str(&component.as_os_str().to_string_lossy());
    }
    StagingEntry {
        host_path: host_path.to_path_buf(),
        virtual_path,
    }
}

/// Recursively stage the source files of `host_dir` under `virtual_dir`.
///
/// The destination root is created first; failure to create it is fatal.
/// Per-entry failures (unreadable host file, write rejected by the runtime)
/// are logged and skipped, and the walk continues. Returns the number of
/// files successfully written; zero is a warning, not a failure.
///
/// # Errors
///
/// Returns [`Error::Materialization`] only if the destination root cannot
/// be created.
pub async fn materialize_tree(
    runtime: &dyn Runtime,
    host_dir: &Path,
    virtual_dir: &str,
) -> Result<usize, Error> {
    runtime
        .make_directories(virtual_dir)
        .await
        .map_err(|source| Error::Materialization {
            path: virtual_dir.to_string(),
            source,
        })?;

    let mut staged = 0usize;
    for planned in plan_tree(host_dir, virtual_dir) {
        let entry = match planned {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable host entry");
                continue;
            }
        };
        if transfer(runtime, &entry).await {
            staged += 1;
        }
    }

    if staged == 0 {
        tracing::warn!(
            host_dir = %host_dir.display(),
            "no source files staged; host tree is empty or misconfigured"
        );
    } else {
        tracing::debug!(count = staged, host_dir = %host_dir.display(), "staged package tree");
    }
    Ok(staged)
}

/// Stage the files of a single host folder (non-recursive, all files).
///
/// Used for configuration folders, where every file matters regardless of
/// extension. Hidden entries and subdirectories are skipped. Same error
/// policy as [`materialize_tree`].
///
/// # Errors
///
/// Returns [`Error::Materialization`] if the destination root cannot be
/// created, or [`Error::Io`] if the host folder itself cannot be listed.
pub async fn materialize_folder(
    runtime: &dyn Runtime,
    host_dir: &Path,
    virtual_dir: &str,
) -> Result<usize, Error> {
    runtime
        .make_directories(virtual_dir)
        .await
        .map_err(|source| Error::Materialization {
            path: virtual_dir.to_string(),
            source,
        })?;

    let virtual_dir = virtual_dir.trim_end_matches('/');
    let mut staged = 0usize;
    let mut entries: Vec<_> = std::fs::read_dir(host_dir)?.filter_map(Result::ok).collect();
    entries.sort_by_key(std::fs::DirEntry::file_name);

    for dir_entry in entries {
        let name = dir_entry.file_name().to_string_lossy().into_owned();
        if is_hidden_name(&name) || !dir_entry.path().is_file() {
            continue;
        }
        let entry = StagingEntry {
            host_path: dir_entry.path(),
            virtual_path: format!("{virtual_dir}/{name}"),
        };
        if transfer(runtime, &entry).await {
            staged += 1;
        }
    }

    if staged == 0 {
        tracing::warn!(host_dir = %host_dir.display(), "no configuration files staged");
    }
    Ok(staged)
}

/// Transfer one file, creating intermediate virtual directories as needed.
/// Returns whether the write succeeded; failures are logged, not raised.
async fn transfer(runtime: &dyn Runtime, entry: &StagingEntry) -> bool {
    let content = match std::fs::read_to_string(&entry.host_path) {
        Ok(content) => content,
        Err(err) => {
            tracing::warn!(
                path = %entry.host_path.display(),
                error = %err,
                "skipping unreadable host file"
            );
            return false;
        }
    };

    if let Some((parent, _)) = entry.virtual_path.rsplit_once('/') {
        if !parent.is_empty() {
            if let Err(err) = runtime.make_directories(parent).await {
                tracing::warn!(path = parent, error = %err, "skipping entry: cannot create virtual directory");
                return false;
            }
        }
    }

    match runtime.write_text_file(&entry.virtual_path, &content).await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(path = %entry.virtual_path, error = %err, "skipping entry: virtual write failed");
            false
        }
    }
}
