//! # pybridge
//!
//! Host bridge for running a virtual Python shell inside an embedded,
//! Pyodide-style runtime: a sandboxed interpreter hosted in the same
//! process, with its own isolated filesystem and execution context.
//!
//! The bridge does three things:
//!
//! - **Resolution** — finds the shell package on the host filesystem,
//!   collapsing the common "wrapper directory containing an identically
//!   named inner package" layout, and derives the import name everything
//!   downstream uses.
//! - **Materialization** — stages the package tree and configuration
//!   folder into the runtime's virtual filesystem, then stages a bootstrap
//!   script with its placeholders resolved.
//! - **I/O bridging** — captures host terminal input in raw mode with
//!   single-line editing and feeds it to the runtime's blocking input
//!   primitive, one suspended read at a time.
//!
//! The runtime itself is an external collaborator behind the [`Runtime`]
//! trait; [`InMemoryRuntime`] is a full in-process double, so the whole
//! pipeline is testable without a live interpreter.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pybridge::{InMemoryRuntime, SessionConfig, TerminalIo, run_session};
//!
//! # async fn run() -> Result<(), pybridge::Error> {
//! let runtime = InMemoryRuntime::new(); // or any `Runtime` implementation
//! let config = SessionConfig::from_env();
//! let report = run_session(&runtime, Arc::new(TerminalIo::new()), &config).await?;
//! println!("staged {} files", report.package_files);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

mod config;
mod error;
mod resolver;
mod runtime;
mod script;
mod session;
mod staging;
mod terminal;

pub use config::{
    CONFIG_DIR_ENV, DEFAULT_PACKAGE_NAME, DEFAULT_SANDBOX, PACKAGE_PATH_ENV, SANDBOX_ENV,
    SessionConfig,
};
pub use error::Error;
pub use resolver::{ResolvedPackage, import_name_for, locate};
pub use runtime::{
    HostIo, InMemoryRuntime, Runtime, RuntimeError, RuntimeResult, ScriptedIo,
};
pub use script::{Placeholders, ScriptOptions, ScriptVariant, select_script, substitute};
pub use session::{
    CONFIG_VIRTUAL_DIR, ENTRY_POINT_PATH, HOST_IO_MODULE, SessionReport, run_session,
};
pub use staging::{
    STAGED_EXTENSION, StagingEntry, materialize_folder, materialize_tree, plan_tree,
};
pub use terminal::TerminalIo;
