use std::time::Duration;

use super::*;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.browser.debug_port, 9222);
    assert!(!config.browser.headless);
    assert!(config.browser.launch);
    assert_eq!(config.logging.level, "info");
    assert!(config.report.open_in_browser);
}

#[test]
fn test_fetch_config_default() {
    let fetch = FetchConfig::default();
    assert_eq!(fetch.load_timeout(), Duration::from_secs(30));
    assert_eq!(fetch.result_timeout(), Duration::from_secs(20));
    assert_eq!(fetch.auth_redirect_markers, vec!["login"]);
    assert_eq!(fetch.error_url_markers, vec!["error"]);
    assert_eq!(fetch.channel_capacity, 256);
}

#[test]
fn test_default_dirs_live_under_casetrail() {
    let config = Config::default();
    assert!(config.browser.profile_dir.ends_with(".casetrail/browser-profile"));
    assert!(config.logging.log_dir.ends_with(".casetrail/logs"));
}

#[test]
fn test_config_serialization() {
    let config = Config::default();
    let text = toml::to_string(&config).unwrap();
    assert!(text.contains("debug_port = 9222"));
    assert!(text.contains("[fetch]"));
}
