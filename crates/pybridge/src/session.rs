//! Session orchestration.
//!
//! One session per process lifetime, sequenced as a strict pipeline with no
//! retries: resolve the package, stage it, stage configuration, record the
//! sandbox identity, install the host I/O module, stage the bootstrap
//! script, and hand control to its entry point. Any stage failure aborts
//! the remainder and propagates to the caller.

use std::sync::Arc;

use crate::config::{SANDBOX_ENV, SessionConfig};
use crate::error::Error;
use crate::resolver::{self, ResolvedPackage};
use crate::runtime::{HostIo, Runtime};
use crate::script::{self, Placeholders};
use crate::staging;

/// Name under which the host I/O capabilities are importable inside the
/// runtime (`import host_io`).
pub const HOST_IO_MODULE: &str = "host_io";

/// Virtual path of the staged bootstrap script.
pub const ENTRY_POINT_PATH: &str = "/pyodide_main.py";

/// Virtual directory holding staged configuration files.
pub const CONFIG_VIRTUAL_DIR: &str = "/sandbox_config";

/// Fixed source fragments executed in the runtime. Only the resolved import
/// name is ever interpolated into executed source, and the resolver
/// guarantees it is a plain identifier.
const SEARCH_PATH_SETUP: &str = "import sys\nif \"/\" not in sys.path:\n    sys.path.insert(0, \"/\")\n";
const ENTRY_INVOCATION: &str = "import pyodide_main\npyodide_main.pyodide_main()\n";

/// What a completed staging pipeline produced.
#[derive(Debug, Clone)]
pub struct SessionReport {
    /// The package that was resolved and staged.
    pub package: ResolvedPackage,
    /// Source files transferred into the package tree.
    pub package_files: usize,
    /// Configuration files transferred (zero when no folder is configured).
    pub config_files: usize,
}

/// Run one shell session end to end.
///
/// # Errors
///
/// Propagates the first stage failure unchanged: [`Error::PackageNotFound`],
/// [`Error::Materialization`], [`Error::ScriptNotFound`], or
/// [`Error::RuntimeExecution`] with the runtime's diagnostic attached.
pub async fn run_session(
    runtime: &dyn Runtime,
    io: Arc<dyn HostIo>,
    config: &SessionConfig,
) -> Result<SessionReport, Error> {
    let package = resolver::locate(config.package_path.as_deref(), &config.package_fallbacks())?;
    tracing::debug!(
        host_dir = %package.host_dir.display(),
        import_name = %package.import_name,
        "resolved shell package"
    );

    let package_root = format!("/{}", package.import_name);
    let package_files = staging::materialize_tree(runtime, &package.host_dir, &package_root).await?;
    tracing::debug!(count = package_files, "package tree staged");

    let config_files = match &config.config_dir {
        Some(dir) => staging::materialize_folder(runtime, dir, CONFIG_VIRTUAL_DIR).await?,
        None => 0,
    };

    if let Some(sandbox) = &config.sandbox {
        runtime
            .set_env(SANDBOX_ENV, sandbox)
            .await
            .map_err(Error::RuntimeExecution)?;
        tracing::debug!(sandbox, "sandbox identity recorded");
    }

    runtime
        .register_host_module(HOST_IO_MODULE, io)
        .await
        .map_err(Error::RuntimeExecution)?;

    let body = script::select_script(&config.script)?;
    let body = script::substitute(
        &body,
        &Placeholders {
            default_sandbox: config.default_sandbox_value(),
        },
    );
    script::stage_script(runtime, &body, ENTRY_POINT_PATH).await?;

    runtime
        .execute(SEARCH_PATH_SETUP)
        .await
        .map_err(Error::RuntimeExecution)?;

    // Import-check the staged package before handing off; a failure here
    // carries the runtime's own diagnostic.
    runtime
        .execute(&format!("import {}\n", package.import_name))
        .await
        .map_err(Error::RuntimeExecution)?;

    tracing::debug!("invoking bootstrap entry point");
    runtime
        .execute(ENTRY_INVOCATION)
        .await
        .map_err(Error::RuntimeExecution)?;

    Ok(SessionReport {
        package,
        package_files,
        config_files,
    })
}
