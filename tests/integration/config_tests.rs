use dupsweep::config::Config;
use figment::providers::{Format, Serialized, Toml};
use figment::Figment;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_config_load_defaults() {
    let figment = Figment::from(Serialized::defaults(Config::default()));
    let config = Config::from_figment(figment).unwrap();
    assert_eq!(config.chunk_size, 8192);
    assert_eq!(config.io_threads, 4);
    assert_eq!(config.show_threshold_minutes, 1440);
    assert_eq!(config.delete_threshold_minutes, 60);
    assert_eq!(config.cache_dir, None);
    assert!(!config.trash);
}

#[test]
fn test_config_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
chunk_size = 1048576
io_threads = 2
cache_dir = "/srv/dupsweep-cache"
trash = true
"#,
    )
    .unwrap();

    let figment =
        Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(&config_path));
    let config = Config::from_figment(figment).unwrap();

    assert_eq!(config.chunk_size, 1_048_576);
    assert_eq!(config.io_threads, 2);
    assert_eq!(config.show_threshold_minutes, 1440);
    assert_eq!(config.cache_dir, Some(PathBuf::from("/srv/dupsweep-cache")));
    assert!(config.trash);
}

#[test]
fn test_environment_overrides_file() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "delete_threshold_minutes = 5\nio_threads = 3\n").unwrap();

    std::env::set_var("DUPSWEEP_DELETE_THRESHOLD_MINUTES", "15");
    let config = Config::from_figment(Config::figment(Some(&config_path)));
    std::env::remove_var("DUPSWEEP_DELETE_THRESHOLD_MINUTES");

    let config = config.unwrap();
    assert_eq!(config.delete_threshold_minutes, 15);
    assert_eq!(config.show_threshold_minutes, 1440);
    assert_eq!(config.io_threads, 3);
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let temp_dir = tempdir().unwrap();
    let err = Config::load(Some(&temp_dir.path().join("absent.toml"))).unwrap_err();
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn test_empty_explicit_file_gives_defaults() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "").unwrap();

    let config = Config::load(Some(&config_path)).unwrap();
    assert_eq!(config.chunk_size, 8192);
    assert!(!config.trash);
}

#[test]
fn test_invalid_toml_is_an_error() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "chunk_size = [not valid").unwrap();

    let figment =
        Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(&config_path));
    assert!(Config::from_figment(figment).is_err());
    assert!(Config::load(Some(&config_path)).is_err());
}

#[test]
fn test_bad_value_does_not_drop_trash_setting() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "trash = true\nio_threads = \"eight\"\n").unwrap();

    // Either the whole file applies or loading fails; never a silent `trash = false`.
    assert!(Config::load(Some(&config_path)).is_err());
}
