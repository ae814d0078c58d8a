//! Stage a demo shell package into the in-memory runtime double and run the
//! full session pipeline, printing what was materialized.
//!
//! ```bash
//! cargo run --example in_memory_session
//! ```

use std::sync::Arc;

use anyhow::Context;
use pybridge::{InMemoryRuntime, ScriptOptions, ScriptedIo, SessionConfig, run_session};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("pybridge=debug")
        .with_target(false)
        .init();

    // Build a small self-nested host package, the layout the resolver is
    // there to untangle.
    let host = tempfile::tempdir()?;
    let outer = host.path().join("demo-shell");
    let inner = outer.join("demo_shell");
    std::fs::create_dir_all(inner.join("commands"))?;
    std::fs::write(inner.join("__init__.py"), "")?;
    std::fs::write(
        inner.join("shell_interpreter.py"),
        "class ShellInterpreter:\n    pass\n",
    )?;
    std::fs::write(inner.join("commands").join("ls.py"), "def run():\n    pass\n")?;

    let runtime = InMemoryRuntime::new();
    let config = SessionConfig {
        package_path: Some(outer),
        sandbox: Some("ai_sandbox".to_string()),
        script: ScriptOptions {
            search_dirs: vec![
                std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scripts"),
            ],
            ..ScriptOptions::default()
        },
        ..SessionConfig::default()
    };

    let report = run_session(&runtime, Arc::new(ScriptedIo::new(["help", "exit"])), &config)
        .await
        .context("session pipeline failed")?;

    println!(
        "staged package '{}' ({} files) from {}",
        report.package.import_name,
        report.package_files,
        report.package.host_dir.display()
    );
    println!("virtual filesystem now holds:");
    for path in runtime.file_paths().await {
        println!("  {path}");
    }
    println!("executed in the runtime:");
    for source in runtime.executed().await {
        println!("  {}", source.lines().next().unwrap_or_default());
    }

    Ok(())
}
