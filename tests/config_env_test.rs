//! Environment overrides through the binary's config path.
//!
//! Kept as the only test in this file: it sets process-wide variables.

use tempfile::TempDir;

use gator::{registered_commands, Command, Config, Database, State};

#[tokio::test]
async fn test_env_overrides_apply_for_the_run_only() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        "[database]\npath = \"/home/u/gator.db\"\n\n[logging]\nlevel = \"info\"\n",
    )
    .unwrap();
    let scratch = dir.path().join("scratch.db");

    std::env::set_var("GATOR_DATABASE_PATH", &scratch);
    std::env::set_var("GATOR_LOG_LEVEL", "");
    let config = Config::load_or_default(&config_path).unwrap();
    std::env::set_var("GATOR_LOG_LEVEL", "trace");
    let traced = Config::load_or_default(&config_path).unwrap();
    std::env::remove_var("GATOR_DATABASE_PATH");
    std::env::remove_var("GATOR_LOG_LEVEL");

    assert_eq!(config.database.path, scratch.to_string_lossy());
    // Empty values leave the file's setting alone
    assert_eq!(config.logging.level, "info");
    assert_eq!(traced.logging.level, "trace");

    let db = Database::open(&config.database.path).await.unwrap();
    let state = State::new(db, traced, config_path.clone());
    registered_commands()
        .run(&state, &Command::new("register", ["alice"]))
        .await
        .unwrap();
    state.db.pool().close().await;

    let saved = Config::load(&config_path).unwrap();
    assert_eq!(saved.current_user_name.as_deref(), Some("alice"));
    assert_eq!(saved.database.path, "/home/u/gator.db");
    assert_eq!(saved.logging.level, "info");
    assert!(!std::fs::read_to_string(&config_path)
        .unwrap()
        .contains("user_agent"));
}
