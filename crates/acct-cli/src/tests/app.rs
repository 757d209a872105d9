use crate::{CliError, Commands, execute, layout_from_config, render, render_error};

use acct_config::Config;
use acct_core::{SwapEngine, SwapError};

use std::fs;
use std::path::Path;
use std::time::Duration;

use googletest::assert_that;
use googletest::prelude::{contains_substring, eq};
use serde_json::json;
use tempfile::TempDir;

const POLL: Duration = Duration::from_secs(60);

fn config_rooted_at(home: &Path) -> Config {
    let mut config = Config::default();
    let path = |rel: &str| home.join(rel).to_string_lossy().into_owned();
    config.paths.credential_file = path(".claude/.credentials.json");
    config.paths.config_file = path(".claude/.claude.json");
    config.paths.fallback_config_file = path(".claude.json");
    config.paths.backup_dir = path(".claude-swap-backup");
    config
}

fn login(home: &Path, access_token: &str, email: &str) {
    fs::create_dir_all(home.join(".claude")).unwrap();
    fs::write(
        home.join(".claude/.credentials.json"),
        json!({ "claudeAiOauth": { "accessToken": access_token } }).to_string(),
    )
    .unwrap();
    fs::write(
        home.join(".claude/.claude.json"),
        json!({ "oauthAccount": { "emailAddress": email }, "theme": "dark" }).to_string(),
    )
    .unwrap();
}

fn engine_for(home: &Path) -> SwapEngine {
    SwapEngine::new(layout_from_config(&config_rooted_at(home)).unwrap())
}

#[test]
fn given_absolute_paths_when_layout_from_config_then_used_verbatim() {
    let temp = TempDir::new().unwrap();

    let layout = layout_from_config(&config_rooted_at(temp.path())).unwrap();

    assert_that!(
        layout.credential_file,
        eq(&temp.path().join(".claude/.credentials.json"))
    );
    assert_that!(
        layout.registry_file(),
        eq(&temp.path().join(".claude-swap-backup/sequence.json"))
    );
}

#[tokio::test]
async fn given_logged_in_user_when_save_then_account_number_in_output() {
    let temp = TempDir::new().unwrap();
    login(temp.path(), "opaque-token-for-first-user", "first@example.com");
    let engine = engine_for(temp.path());

    let value = execute(&engine, &Commands::Save, POLL).await.unwrap();

    assert_eq!(value["account"], json!(1));
    assert_eq!(value["warnings"], json!([]));
}

#[tokio::test]
async fn given_two_saved_accounts_when_switch_and_list_then_reflects_live_account() {
    let temp = TempDir::new().unwrap();
    let engine = engine_for(temp.path());
    login(temp.path(), "opaque-token-for-first-user", "first@example.com");
    execute(&engine, &Commands::Save, POLL).await.unwrap();
    login(temp.path(), "opaque-token-for-second-user", "second@example.com");
    execute(&engine, &Commands::Save, POLL).await.unwrap();

    let switched = execute(&engine, &Commands::Switch { account: 1 }, POLL)
        .await
        .unwrap();
    let listed = execute(&engine, &Commands::List, POLL).await.unwrap();

    assert_eq!(switched["switch"]["account"], json!(1));
    assert_eq!(switched["switch"]["previous_account"], json!(2));
    assert_eq!(listed["accounts"][0]["is_active"], json!(true));
    assert_eq!(listed["accounts"][1]["is_active"], json!(false));
    assert_eq!(listed["accounts"][1]["email"], json!("second@example.com"));
}

#[tokio::test]
async fn given_unknown_account_when_switch_then_swap_error_with_hint() {
    let temp = TempDir::new().unwrap();
    let engine = engine_for(temp.path());

    let error = execute(&engine, &Commands::Switch { account: 4 }, POLL)
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        CliError::Swap(SwapError::AccountNotFound { account: 4, .. })
    ));
    let rendered = render_error(&error);
    assert_that!(rendered, contains_substring("Error: Account-4 not found"));
    assert_that!(rendered, contains_substring("Hint: Run `acct list`"));
}

#[tokio::test]
async fn given_empty_home_when_status_then_nothing_live() {
    let temp = TempDir::new().unwrap();
    let engine = engine_for(temp.path());

    let value = execute(&engine, &Commands::Status, POLL).await.unwrap();

    assert_eq!(value["live_account"], json!(null));
    assert_eq!(value["account_count"], json!(0));
    assert_eq!(value["pointer_stale"], json!(false));
}

#[test]
fn given_value_when_render_then_compact_or_pretty() {
    let value = json!({ "account": 2 });

    assert_eq!(render(&value, false).unwrap(), r#"{"account":2}"#);
    assert_that!(render(&value, true).unwrap(), contains_substring("\n  \"account\": 2"));
}

#[test]
fn given_config_error_when_render_error_then_config_hint() {
    let error = CliError::from(acct_config::ConfigError::NoHomeDir);

    let rendered = render_error(&error);

    assert_that!(rendered, contains_substring("Error: Home directory not found"));
    assert_that!(rendered, contains_substring("config.toml"));
}
