//! CLI binary tests
//!
//! Input validation and exit codes, without touching the network.

use std::process::Command;

fn ktuvit() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ktuvit"));
    cmd.env_remove("KTUVIT_LOGIN_COOKIE")
        .env("RUST_LOG", "off")
        .args(["--config", "/nonexistent/ktuvit/config.toml", "--json"]);
    cmd
}

#[test]
fn test_invalid_imdb_id_exit_code() {
    let out = ktuvit().args(["resolve", "nm123"]).output().unwrap();
    assert_eq!(out.status.code(), Some(2));

    let stderr = String::from_utf8_lossy(&out.stderr);
    let json: serde_json::Value = serde_json::from_str(&stderr).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], 2);
}

#[test]
fn test_missing_cookie_exit_code() {
    let out = ktuvit().args(["subtitles", "tt0944947"]).output().unwrap();
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("login cookie"));
}

#[test]
fn test_season_without_episode_is_usage_error() {
    let out = ktuvit()
        .args(["subtitles", "tt0944947", "-s", "1"])
        .output()
        .unwrap();
    assert!(!out.status.success());
}
