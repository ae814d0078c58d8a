//! Interface to the embedded Python runtime.
//!
//! The runtime itself (a Pyodide-style interpreter hosted in WebAssembly) is
//! constructed and initialized outside this crate. Everything the bridge needs
//! from it is captured by the [`Runtime`] trait: a handful of virtual
//! filesystem primitives, host module registration, environment injection,
//! and source execution.
//!
//! [`InMemoryRuntime`] is a faithful in-process double used by tests and
//! examples: it backs the virtual filesystem with hash maps and records every
//! `execute` call, so the staging pipeline can be exercised end to end without
//! a live interpreter.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

/// Result type for runtime boundary operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors reported by the embedded runtime.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The virtual path is malformed (e.g. not absolute).
    #[error("invalid virtual path: {0}")]
    InvalidPath(String),

    /// The virtual path does not exist.
    #[error("virtual path not found: {0}")]
    NotFound(String),

    /// The virtual path exists but is not the expected kind of entry.
    #[error("not a directory: {0}")]
    NotDirectory(String),

    /// Executing injected source failed; carries the runtime's diagnostic.
    #[error("execution failed: {0}")]
    Execution(String),
}

/// Host-side terminal capabilities installed into the runtime.
///
/// The runtime's blocking input primitive is bridged to [`read_line`]: the
/// interpreter suspends at the point it requests input and resumes once a
/// full line is available. [`write_line`] is its synchronous counterpart.
///
/// [`read_line`]: HostIo::read_line
/// [`write_line`]: HostIo::write_line
#[async_trait]
pub trait HostIo: Send + Sync {
    /// Read one full line of input from the host.
    ///
    /// The prompt is accepted for interface compatibility but implementations
    /// may ignore it; the shell running inside the runtime prints its own
    /// prompt before requesting input.
    ///
    /// # Errors
    ///
    /// Returns an error if the host input source fails.
    async fn read_line(&self, prompt: &str) -> std::io::Result<String>;

    /// Write one line of output to the host.
    fn write_line(&self, text: &str);
}

/// The embedded runtime as seen by the bridge.
///
/// All paths are absolute paths into the runtime's private filesystem,
/// using `/` separators regardless of the host platform.
#[async_trait]
pub trait Runtime: Send + Sync {
    /// Write a text file into the virtual filesystem, overwriting any
    /// existing file at that path. The parent directory must exist.
    async fn write_text_file(&self, path: &str, content: &str) -> RuntimeResult<()>;

    /// Create a directory and all missing ancestors. Idempotent.
    async fn make_directories(&self, path: &str) -> RuntimeResult<()>;

    /// Install a host capability set as a named module importable from
    /// Python code inside the runtime.
    async fn register_host_module(&self, name: &str, io: Arc<dyn HostIo>) -> RuntimeResult<()>;

    /// Set an environment variable visible to code running in the runtime.
    ///
    /// This is an explicit, structured call rather than injected source so
    /// that values never pass through string interpolation.
    async fn set_env(&self, name: &str, value: &str) -> RuntimeResult<()>;

    /// Execute Python source inside the runtime.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Execution`] with the runtime's own diagnostic
    /// if the source raises.
    async fn execute(&self, source: &str) -> RuntimeResult<()>;
}

/// In-memory runtime double for tests and examples.
///
/// Stores the virtual filesystem in `HashMap`/`HashSet` and records executed
/// source, injected environment variables, and registered host modules.
/// Thread-safe via `RwLock`.
#[derive(Default)]
pub struct InMemoryRuntime {
    /// File contents: path -> text.
    files: RwLock<HashMap<String, String>>,
    /// Directory markers.
    directories: RwLock<HashSet<String>>,
    /// Environment variables set on the runtime.
    env: RwLock<HashMap<String, String>>,
    /// Registered host modules by name.
    modules: RwLock<HashMap<String, Arc<dyn HostIo>>>,
    /// Source passed to `execute`, in call order.
    executed: RwLock<Vec<String>>,
    /// When set, `execute` fails for source containing this needle.
    fail_needle: RwLock<Option<String>>,
}

impl std::fmt::Debug for InMemoryRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRuntime").finish_non_exhaustive()
    }
}

impl InMemoryRuntime {
    /// Create an empty runtime with just the root directory.
    #[must_use]
    pub fn new() -> Self {
        let mut dirs = HashSet::new();
        dirs.insert("/".to_string());
        Self {
            directories: RwLock::new(dirs),
            ..Self::default()
        }
    }

    /// Make subsequent `execute` calls fail when the source contains
    /// `needle`. Used to simulate runtime-side failures such as a broken
    /// import after staging.
    pub async fn fail_when_source_contains(&self, needle: impl Into<String>) {
        *self.fail_needle.write().await = Some(needle.into());
    }

    /// Read a staged file back out of the virtual filesystem.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::NotFound`] if no file exists at `path`.
    pub async fn read_back(&self, path: &str) -> RuntimeResult<String> {
        let path = Self::normalize(path)?;
        self.files
            .read()
            .await
            .get(&path)
            .cloned()
            .ok_or(RuntimeError::NotFound(path))
    }

    /// Whether a directory exists in the virtual filesystem.
    pub async fn dir_exists(&self, path: &str) -> bool {
        match Self::normalize(path) {
            Ok(path) => self.directories.read().await.contains(&path),
            Err(_) => false,
        }
    }

    /// Paths of all staged files, sorted.
    pub async fn file_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.files.read().await.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// The value of an environment variable set on the runtime, if any.
    pub async fn env_var(&self, name: &str) -> Option<String> {
        self.env.read().await.get(name).cloned()
    }

    /// Whether a host module was registered under `name`.
    pub async fn has_module(&self, name: &str) -> bool {
        self.modules.read().await.contains_key(name)
    }

    /// Source executed so far, in call order.
    pub async fn executed(&self) -> Vec<String> {
        self.executed.read().await.clone()
    }

    /// Normalize an absolute virtual path, resolving `.` and `..`.
    fn normalize(path: &str) -> RuntimeResult<String> {
        if !path.starts_with('/') {
            return Err(RuntimeError::InvalidPath(format!(
                "path must be absolute: {path}"
            )));
        }

        let mut components: Vec<&str> = Vec::new();
        for component in path.split('/') {
            match component {
                "" | "." => continue,
                ".." => {
                    if components.pop().is_none() {
                        return Err(RuntimeError::InvalidPath("path escapes root".to_string()));
                    }
                }
                c => components.push(c),
            }
        }

        if components.is_empty() {
            Ok("/".to_string())
        } else {
            Ok(format!("/{}", components.join("/")))
        }
    }

    /// Parent directory of a normalized path (`None` for the root).
    fn parent(path: &str) -> Option<String> {
        if path == "/" {
            return None;
        }
        match path.rfind('/') {
            Some(0) => Some("/".to_string()),
            Some(idx) => Some(path[..idx].to_string()),
            None => None,
        }
    }
}

#[async_trait]
impl Runtime for InMemoryRuntime {
    async fn write_text_file(&self, path: &str, content: &str) -> RuntimeResult<()> {
        let path = Self::normalize(path)?;

        if let Some(parent) = Self::parent(&path) {
            let dirs = self.directories.read().await;
            if !dirs.contains(&parent) {
                return Err(RuntimeError::NotFound(format!(
                    "parent directory: {parent}"
                )));
            }
        }

        {
            let dirs = self.directories.read().await;
            if dirs.contains(&path) {
                return Err(RuntimeError::NotDirectory(path));
            }
        }

        self.files.write().await.insert(path, content.to_string());
        Ok(())
    }

    async fn make_directories(&self, path: &str) -> RuntimeResult<()> {
        let path = Self::normalize(path)?;

        {
            let files = self.files.read().await;
            if files.contains_key(&path) {
                return Err(RuntimeError::NotDirectory(path));
            }
        }

        let mut dirs = self.directories.write().await;
        let mut current = String::new();
        for component in path.split('/').filter(|c| !c.is_empty()) {
            current.push('/');
            current.push_str(component);
            dirs.insert(current.clone());
        }
        Ok(())
    }

    async fn register_host_module(&self, name: &str, io: Arc<dyn HostIo>) -> RuntimeResult<()> {
        self.modules.write().await.insert(name.to_string(), io);
        Ok(())
    }

    async fn set_env(&self, name: &str, value: &str) -> RuntimeResult<()> {
        self.env
            .write()
            .await
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    async fn execute(&self, source: &str) -> RuntimeResult<()> {
        self.executed.write().await.push(source.to_string());
        if let Some(needle) = self.fail_needle.read().await.as_deref() {
            if source.contains(needle) {
                return Err(RuntimeError::Execution(format!(
                    "injected failure: source contains {needle:?}"
                )));
            }
        }
        Ok(())
    }
}

/// Queue-fed [`HostIo`] double for tests and examples.
///
/// `read_line` pops pre-scripted lines; once exhausted it reports EOF.
/// Output written via `write_line` is recorded for assertions.
#[derive(Debug, Default)]
pub struct ScriptedIo {
    lines: std::sync::Mutex<VecDeque<String>>,
    written: std::sync::Mutex<Vec<String>>,
}

impl ScriptedIo {
    /// Create a scripted source that will yield `lines` in order.
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: std::sync::Mutex::new(lines.into_iter().map(Into::into).collect()),
            written: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Lines written so far via `write_line`.
    #[must_use]
    pub fn written(&self) -> Vec<String> {
        self.written.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl HostIo for ScriptedIo {
    async fn read_line(&self, _prompt: &str) -> std::io::Result<String> {
        let line = self.lines.lock().ok().and_then(|mut lines| lines.pop_front());
        line.ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "scripted input exhausted")
        })
    }

    fn write_line(&self, text: &str) {
        if let Ok(mut written) = self.written.lock() {
            written.push(text.to_string());
        }
    }
}
