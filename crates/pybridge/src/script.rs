//! Bootstrap script selection, placeholder substitution, and staging.

use std::path::PathBuf;

use crate::error::Error;
use crate::runtime::Runtime;

/// Which built-in bootstrap script to stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptVariant {
    /// Minimal synchronous prompt loop; works in constrained environments.
    Basic,
    /// Async input via the registered host module, with sandbox-config
    /// discovery and richer diagnostics.
    #[default]
    Enhanced,
}

impl ScriptVariant {
    /// File name of this variant's script body.
    #[must_use]
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Basic => "pyodide_basic_main.py",
            Self::Enhanced => "pyodide_enhanced_main.py",
        }
    }
}

/// How to find the bootstrap script on the host.
#[derive(Debug, Clone)]
pub struct ScriptOptions {
    /// Explicit script path; wins over the variant when it exists. A
    /// missing custom path falls through to the variant lookup.
    pub custom_path: Option<PathBuf>,
    /// Built-in variant to use when no custom path applies.
    pub variant: ScriptVariant,
    /// Ordered host directories probed for the variant's file name.
    pub search_dirs: Vec<PathBuf>,
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self {
            custom_path: None,
            variant: ScriptVariant::default(),
            search_dirs: vec![PathBuf::from("scripts"), PathBuf::from(".")],
        }
    }
}

/// Values substituted into script placeholders.
///
/// The key table is fixed; see [`substitute`].
#[derive(Debug, Clone)]
pub struct Placeholders {
    /// Value for the `${defaultSandbox}` token: the resolved sandbox
    /// identity, or the literal default when none is configured.
    pub default_sandbox: String,
}

impl Placeholders {
    fn resolve(&self, key: &str) -> Option<&str> {
        match key {
            "defaultSandbox" => Some(&self.default_sandbox),
            _ => None,
        }
    }
}

/// Select the bootstrap script body per the configured options.
///
/// # Errors
///
/// Returns [`Error::ScriptNotFound`] naming every attempted path if no
/// location yields a script.
pub fn select_script(options: &ScriptOptions) -> Result<String, Error> {
    let mut attempted = Vec::new();

    if let Some(custom) = &options.custom_path {
        if custom.is_file() {
            tracing::debug!(path = %custom.display(), "using custom bootstrap script");
            return Ok(std::fs::read_to_string(custom)?);
        }
        attempted.push(custom.clone());
    }

    let file_name = options.variant.file_name();
    for dir in &options.search_dirs {
        let candidate = dir.join(file_name);
        if candidate.is_file() {
            tracing::debug!(path = %candidate.display(), "using bootstrap script");
            return Ok(std::fs::read_to_string(candidate)?);
        }
        attempted.push(candidate);
    }

    Err(Error::ScriptNotFound { attempted })
}

/// Substitute `${key}` tokens against the fixed key table.
///
/// Unknown tokens are left untouched in the output; a permissive policy
/// carried over from the original host, where script bodies routinely
/// contain shell-style `${...}` text that is not meant for us.
#[must_use]
pub fn substitute(body: &str, keys: &Placeholders) -> String {
    let mut out = String::with_capacity(body.len());
    let mut rest = body;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let token = &after[..end];
                match keys.resolve(token) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("${");
                        out.push_str(token);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                // Unterminated token: emit verbatim and stop scanning.
                out.push_str("${");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Write the resolved script body into the runtime as the entry point.
///
/// # Errors
///
/// Returns [`Error::Materialization`] if the runtime rejects the write.
pub async fn stage_script(
    runtime: &dyn Runtime,
    body: &str,
    dest_path: &str,
) -> Result<(), Error> {
    runtime
        .write_text_file(dest_path, body)
        .await
        .map_err(|source| Error::Materialization {
            path: dest_path.to_string(),
            source,
        })
}
