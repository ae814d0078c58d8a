//! Session configuration.
//!
//! The original host kept the active sandbox name and package location in
//! process-wide mutable state. Here everything a session needs travels in a
//! [`SessionConfig`] passed by reference through the pipeline; environment
//! variables are consulted once, at construction.

use std::path::PathBuf;

use crate::script::ScriptOptions;

/// Sandbox profile applied when none is configured.
pub const DEFAULT_SANDBOX: &str = "ai_sandbox";

/// Default name of the shell package staged into the runtime.
pub const DEFAULT_PACKAGE_NAME: &str = "chuk_virtual_shell";

/// Environment variable overriding the shell package location on the host.
pub const PACKAGE_PATH_ENV: &str = "CHUK_VIRTUAL_SHELL_PATH";

/// Environment variable overriding the configuration folder on the host.
pub const CONFIG_DIR_ENV: &str = "CHUK_VIRTUAL_SHELL_CONFIG";

/// Environment variable naming the sandbox profile; also exported into the
/// runtime so the bootstrap script sees the same identity.
pub const SANDBOX_ENV: &str = "PYODIDE_SANDBOX";

/// Everything one shell session needs, resolved up front.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Candidate host path of the shell package (`--python-path`).
    pub package_path: Option<PathBuf>,
    /// Host folder of sandbox configuration files (`--config-path`).
    pub config_dir: Option<PathBuf>,
    /// Active sandbox identity (`--sandbox`); `None` means the runtime-side
    /// default applies.
    pub sandbox: Option<String>,
    /// Package name used to derive fallback locations.
    pub package_name: String,
    /// Extra fallback location appended after the derived ones;
    /// [`SessionConfig::from_env`] captures [`PACKAGE_PATH_ENV`] here.
    pub fallback_package_path: Option<PathBuf>,
    /// Bootstrap script selection.
    pub script: ScriptOptions,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            package_path: None,
            config_dir: None,
            sandbox: None,
            package_name: DEFAULT_PACKAGE_NAME.to_string(),
            fallback_package_path: None,
            script: ScriptOptions::default(),
        }
    }
}

impl SessionConfig {
    /// Build a configuration from the process environment.
    ///
    /// Reads [`PACKAGE_PATH_ENV`], [`CONFIG_DIR_ENV`] and [`SANDBOX_ENV`];
    /// unset or empty variables leave the corresponding field at its
    /// default. Callers layering CLI flags on top should overwrite fields
    /// after this.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(path) = non_empty_var(PACKAGE_PATH_ENV) {
            config.package_path = Some(PathBuf::from(&path));
            config.fallback_package_path = Some(PathBuf::from(path));
        }
        if let Some(path) = non_empty_var(CONFIG_DIR_ENV) {
            config.config_dir = Some(PathBuf::from(path));
        }
        config.sandbox = non_empty_var(SANDBOX_ENV);
        config
    }

    /// Fallback locations for the shell package, probed in order when the
    /// candidate path is unset or missing: the inner package of an adjacent
    /// sibling checkout, a plain sibling directory, an installed-dependency
    /// location, and finally [`SessionConfig::fallback_package_path`] if
    /// set. Derived from struct state only; the environment is not
    /// consulted here.
    #[must_use]
    pub fn package_fallbacks(&self) -> Vec<PathBuf> {
        let name = &self.package_name;
        let checkout = name.replace('_', "-");
        let mut fallbacks = vec![
            PathBuf::from(format!("../{checkout}/{name}")),
            PathBuf::from(name),
            PathBuf::from(format!("site-packages/{name}")),
        ];
        if let Some(path) = &self.fallback_package_path {
            fallbacks.push(path.clone());
        }
        fallbacks
    }

    /// The sandbox value substituted into the bootstrap script: the
    /// configured identity, or the literal [`DEFAULT_SANDBOX`].
    #[must_use]
    pub fn default_sandbox_value(&self) -> String {
        self.sandbox
            .clone()
            .unwrap_or_else(|| DEFAULT_SANDBOX.to_string())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn fallbacks_follow_the_documented_order() {
        let config = SessionConfig::default();
        let fallbacks = config.package_fallbacks();
        assert_eq!(
            fallbacks[0],
            PathBuf::from("../chuk-virtual-shell/chuk_virtual_shell")
        );
        assert_eq!(fallbacks[1], PathBuf::from("chuk_virtual_shell"));
        assert_eq!(
            fallbacks[2],
            PathBuf::from("site-packages/chuk_virtual_shell")
        );
    }

    #[test]
    fn fallback_list_comes_from_struct_state_only() {
        let mut config = SessionConfig::default();
        assert_eq!(config.package_fallbacks().len(), 3);

        config.fallback_package_path = Some(PathBuf::from("/opt/shell_pkg"));
        let fallbacks = config.package_fallbacks();
        assert_eq!(fallbacks.len(), 4);
        assert_eq!(fallbacks[3], PathBuf::from("/opt/shell_pkg"));
    }

    #[test]
    fn sandbox_value_defaults_to_literal() {
        let mut config = SessionConfig::default();
        assert_eq!(config.default_sandbox_value(), DEFAULT_SANDBOX);

        config.sandbox = Some("strict".to_string());
        assert_eq!(config.default_sandbox_value(), "strict");
    }
}
