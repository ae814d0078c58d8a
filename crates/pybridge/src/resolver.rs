//! Locating the shell package on the host filesystem.
//!
//! Host package layouts vary between "the package directory directly" and
//! "a wrapper directory containing an identically-named inner package", a
//! common packaging artifact. The resolver collapses that ambiguity once,
//! centrally, and derives the import name that every later stage uses.

use std::path::{Path, PathBuf};

use crate::error::Error;

/// A package located on the host, ready for staging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    /// Host directory holding the package sources.
    pub host_dir: PathBuf,
    /// Import name derived from the final path segment of `host_dir`,
    /// normalized to a valid Python module identifier.
    pub import_name: String,
}

/// Locate the shell package.
///
/// If `candidate` is supplied and exists, it wins: when it contains a
/// subdirectory named after its own (identifier-normalized) basename, that
/// inner directory is the package (one level of self-nesting collapsed);
/// otherwise the candidate itself is. Without a usable candidate, each
/// fallback is tried in order and the first existing directory that looks
/// like a Python package is returned.
///
/// # Errors
///
/// Returns [`Error::PackageNotFound`] naming every attempted location if
/// nothing qualifies.
pub fn locate(candidate: Option<&Path>, fallbacks: &[PathBuf]) -> Result<ResolvedPackage, Error> {
    let mut attempted = Vec::new();

    if let Some(candidate) = candidate {
        if candidate.is_dir() {
            let import_name = import_name_for(candidate);
            let inner = candidate.join(&import_name);
            if inner.is_dir() {
                tracing::debug!(
                    outer = %candidate.display(),
                    inner = %inner.display(),
                    "collapsed self-nested package directory"
                );
                return Ok(ResolvedPackage {
                    import_name: import_name_for(&inner),
                    host_dir: inner,
                });
            }
            return Ok(ResolvedPackage {
                host_dir: candidate.to_path_buf(),
                import_name,
            });
        }
        attempted.push(candidate.to_path_buf());
    }

    for fallback in fallbacks {
        if fallback.is_dir() && looks_like_package(fallback) {
            tracing::debug!(path = %fallback.display(), "resolved package from fallback");
            return Ok(ResolvedPackage {
                import_name: import_name_for(fallback),
                host_dir: fallback.clone(),
            });
        }
        attempted.push(fallback.clone());
    }

    Err(Error::PackageNotFound { attempted })
}

/// Import name for a host directory: its basename normalized to a valid
/// module identifier (hyphens and other invalid characters become
/// underscores; a leading digit is prefixed).
#[must_use]
pub fn import_name_for(path: &Path) -> String {
    let base = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    normalize_identifier(&base)
}

fn normalize_identifier(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if out.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Whether a directory plausibly holds a Python package: it has an
/// initializer file, or at least one source file at its top level.
fn looks_like_package(dir: &Path) -> bool {
    if dir.join("__init__.py").is_file() {
        return true;
    }
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .any(|entry| entry.path().extension().is_some_and(|ext| ext == "py"))
        })
        .unwrap_or(false)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn candidate_without_nesting_is_returned_directly() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("myshell");
        std::fs::create_dir(&pkg).unwrap();
        std::fs::write(pkg.join("a.py"), "").unwrap();

        let resolved = locate(Some(pkg.as_path()), &[]).unwrap();
        assert_eq!(resolved.host_dir, pkg);
        assert_eq!(resolved.import_name, "myshell");
    }

    #[test]
    fn self_nested_candidate_collapses_one_level() {
        let dir = tempfile::tempdir().unwrap();
        let outer = dir.path().join("proj");
        let inner = outer.join("proj");
        std::fs::create_dir_all(&inner).unwrap();
        std::fs::write(inner.join("a.py"), "").unwrap();

        let resolved = locate(Some(outer.as_path()), &[]).unwrap();
        assert_eq!(resolved.host_dir, inner);
        assert_eq!(resolved.import_name, "proj");
    }

    #[test]
    fn hyphenated_wrapper_maps_to_underscored_inner_package() {
        let dir = tempfile::tempdir().unwrap();
        let outer = dir.path().join("chuk-virtual-shell");
        let inner = outer.join("chuk_virtual_shell");
        std::fs::create_dir_all(&inner).unwrap();

        let resolved = locate(Some(outer.as_path()), &[]).unwrap();
        assert_eq!(resolved.host_dir, inner);
        assert_eq!(resolved.import_name, "chuk_virtual_shell");
    }

    #[test]
    fn missing_candidate_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let fallback = dir.path().join("shell_pkg");
        std::fs::create_dir(&fallback).unwrap();
        std::fs::write(fallback.join("__init__.py"), "").unwrap();

        let missing = dir.path().join("nope");
        let resolved = locate(Some(missing.as_path()), std::slice::from_ref(&fallback)).unwrap();
        assert_eq!(resolved.host_dir, fallback);
        assert_eq!(resolved.import_name, "shell_pkg");
    }

    #[test]
    fn fallback_must_look_like_a_package() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty");
        std::fs::create_dir(&empty).unwrap();

        let err = locate(None, std::slice::from_ref(&empty)).unwrap_err();
        match err {
            Error::PackageNotFound { attempted } => assert_eq!(attempted, vec![empty]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn failure_lists_every_attempted_location() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("a");
        let fallback_one = dir.path().join("b");
        let fallback_two = dir.path().join("c");

        let err = locate(
            Some(missing.as_path()),
            &[fallback_one.clone(), fallback_two.clone()],
        )
        .unwrap_err();
        match err {
            Error::PackageNotFound { attempted } => {
                assert_eq!(attempted, vec![missing, fallback_one, fallback_two]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn identifier_normalization() {
        assert_eq!(normalize_identifier("chuk-virtual-shell"), "chuk_virtual_shell");
        assert_eq!(normalize_identifier("my shell.pkg"), "my_shell_pkg");
        assert_eq!(normalize_identifier("3rdparty"), "_3rdparty");
    }
}
