//! End-to-end staging pipeline tests against the in-memory runtime.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::PathBuf;
use std::sync::Arc;

use pybridge::{
    ENTRY_POINT_PATH, Error, HOST_IO_MODULE, InMemoryRuntime, SANDBOX_ENV, ScriptOptions,
    ScriptVariant, ScriptedIo, SessionConfig, run_session,
};

fn bundled_scripts_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scripts")
}

/// A self-nested host package: `proj/proj/a.py` plus a hidden cache tree.
fn self_nested_package(root: &std::path::Path) -> PathBuf {
    let outer = root.join("proj");
    let inner = outer.join("proj");
    std::fs::create_dir_all(&inner).unwrap();
    std::fs::write(inner.join("a.py"), "VALUE = 42\n").unwrap();
    let cache = inner.join(".cache");
    std::fs::create_dir(&cache).unwrap();
    std::fs::write(cache.join("x.py"), "ignored").unwrap();
    outer
}

fn config_for(outer: PathBuf, variant: ScriptVariant) -> SessionConfig {
    SessionConfig {
        package_path: Some(outer),
        script: ScriptOptions {
            custom_path: None,
            variant,
            search_dirs: vec![bundled_scripts_dir()],
        },
        ..SessionConfig::default()
    }
}

#[tokio::test]
async fn self_nested_package_stages_exactly_the_visible_sources() {
    let host = tempfile::tempdir().unwrap();
    let outer = self_nested_package(host.path());

    let runtime = InMemoryRuntime::new();
    let config = config_for(outer.clone(), ScriptVariant::Enhanced);
    let report = run_session(&runtime, Arc::new(ScriptedIo::new(["exit"])), &config)
        .await
        .unwrap();

    assert_eq!(report.package.host_dir, outer.join("proj"));
    assert_eq!(report.package.import_name, "proj");
    assert_eq!(report.package_files, 1);

    assert_eq!(runtime.read_back("/proj/a.py").await.unwrap(), "VALUE = 42\n");
    assert!(runtime.read_back("/proj/.cache/x.py").await.is_err());
    assert!(runtime.has_module(HOST_IO_MODULE).await);
}

#[tokio::test]
async fn pipeline_runs_in_order_and_imports_through_the_resolved_name() {
    let host = tempfile::tempdir().unwrap();
    let outer = self_nested_package(host.path());

    let runtime = InMemoryRuntime::new();
    let config = config_for(outer, ScriptVariant::Basic);
    run_session(&runtime, Arc::new(ScriptedIo::new(["exit"])), &config)
        .await
        .unwrap();

    let executed = runtime.executed().await;
    assert_eq!(executed.len(), 3);
    assert!(executed[0].contains("sys.path"));
    assert_eq!(executed[1], "import proj\n");
    assert!(executed[2].contains("pyodide_main()"));
}

#[tokio::test]
async fn sandbox_identity_is_exported_and_substituted() {
    let host = tempfile::tempdir().unwrap();
    let outer = self_nested_package(host.path());

    let runtime = InMemoryRuntime::new();
    let mut config = config_for(outer, ScriptVariant::Enhanced);
    config.sandbox = Some("strict".to_string());
    run_session(&runtime, Arc::new(ScriptedIo::new(["exit"])), &config)
        .await
        .unwrap();

    assert_eq!(
        runtime.env_var(SANDBOX_ENV).await.as_deref(),
        Some("strict")
    );
    let entry = runtime.read_back(ENTRY_POINT_PATH).await.unwrap();
    assert!(entry.contains("DEFAULT_SANDBOX = \"strict\""));
}

#[tokio::test]
async fn without_identity_the_literal_default_is_substituted() {
    let host = tempfile::tempdir().unwrap();
    let outer = self_nested_package(host.path());

    let runtime = InMemoryRuntime::new();
    let config = config_for(outer, ScriptVariant::Enhanced);
    run_session(&runtime, Arc::new(ScriptedIo::new(["exit"])), &config)
        .await
        .unwrap();

    assert!(runtime.env_var(SANDBOX_ENV).await.is_none());
    let entry = runtime.read_back(ENTRY_POINT_PATH).await.unwrap();
    assert!(entry.contains("DEFAULT_SANDBOX = \"ai_sandbox\""));
}

#[tokio::test]
async fn configuration_folder_is_staged_flat() {
    let host = tempfile::tempdir().unwrap();
    let outer = self_nested_package(host.path());
    let config_dir = host.path().join("config");
    std::fs::create_dir(&config_dir).unwrap();
    std::fs::write(config_dir.join("ai_sandbox.yaml"), "profile: ai\n").unwrap();

    let runtime = InMemoryRuntime::new();
    let mut config = config_for(outer, ScriptVariant::Enhanced);
    config.config_dir = Some(config_dir);
    let report = run_session(&runtime, Arc::new(ScriptedIo::new(["exit"])), &config)
        .await
        .unwrap();

    assert_eq!(report.config_files, 1);
    assert_eq!(
        runtime
            .read_back("/sandbox_config/ai_sandbox.yaml")
            .await
            .unwrap(),
        "profile: ai\n"
    );
}

#[tokio::test]
async fn import_failure_aborts_before_entry_invocation() {
    let host = tempfile::tempdir().unwrap();
    let outer = self_nested_package(host.path());

    let runtime = InMemoryRuntime::new();
    runtime.fail_when_source_contains("import proj").await;

    let config = config_for(outer, ScriptVariant::Enhanced);
    let err = run_session(&runtime, Arc::new(ScriptedIo::new(["exit"])), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::RuntimeExecution(_)));

    let executed = runtime.executed().await;
    assert!(!executed.iter().any(|source| source.contains("pyodide_main()")));
}

#[tokio::test]
async fn unresolvable_package_aborts_before_any_materialization() {
    let runtime = InMemoryRuntime::new();
    let config = SessionConfig {
        package_name: "definitely_not_here_xyzzy".to_string(),
        ..SessionConfig::default()
    };

    let err = run_session(&runtime, Arc::new(ScriptedIo::new(["exit"])), &config)
        .await
        .unwrap_err();
    match err {
        Error::PackageNotFound { attempted } => assert!(!attempted.is_empty()),
        other => panic!("unexpected error: {other}"),
    }
    assert!(runtime.file_paths().await.is_empty());
}
