use swatch::settings::Settings;
use tempfile::tempdir;

#[test]
fn missing_file_gives_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("swatch.json");
    let s = Settings::load(path.to_str().unwrap()).unwrap();
    assert_eq!(s, Settings::default());
    assert_eq!(s.poll_interval_ms, 10);
    assert_eq!(s.store_path, "swatch_store.json");
}

#[test]
fn partial_file_fills_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("swatch.json");
    std::fs::write(&path, r#"{"debug_logging": true, "default_tags": ["work"]}"#).unwrap();
    let s = Settings::load(path.to_str().unwrap()).unwrap();
    assert!(s.debug_logging);
    assert_eq!(s.default_tags, vec!["work".to_string()]);
    assert_eq!(s.poll_interval_ms, 10);
    assert!(s.log_file.is_none());
}

#[test]
fn invalid_file_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("swatch.json");
    std::fs::write(&path, "{ nope").unwrap();
    assert!(Settings::load(path.to_str().unwrap()).is_err());
}

#[test]
fn save_then_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("swatch.json");
    let path = path.to_str().unwrap();
    let mut s = Settings::default();
    s.poll_interval_ms = 25;
    s.store_path = "elsewhere.json".into();
    s.save(path).unwrap();
    assert_eq!(Settings::load(path).unwrap(), s);
}

#[test]
fn explicit_tags_win_over_defaults() {
    let mut s = Settings::default();
    s.default_tags = vec!["default-tag".into()];
    s.poll_interval_ms = 40;

    let cfg = s.stopwatch_config("a", Vec::new());
    assert_eq!(cfg.name, "a");
    assert_eq!(cfg.tags, vec!["default-tag".to_string()]);
    assert_eq!(cfg.poll_interval_ms, 40);

    let cfg = s.stopwatch_config("a", vec!["given".into()]);
    assert_eq!(cfg.tags, vec!["given".to_string()]);
}
