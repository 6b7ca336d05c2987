use super::*;

#[test]
fn default_config_is_valid() {
    let cfg = ConvertConfig::default();
    assert_eq!(cfg.output_suffix, ".yaml");
    assert!(cfg.sync);
    assert_eq!(cfg.validate(), Ok(()));
}

#[test]
fn output_path_appends_suffix() {
    let cfg = ConvertConfig::default();
    let out = cfg.output_path(Path::new("/tmp/data/app-cache.db"));
    assert_eq!(out, PathBuf::from("/tmp/data/app-cache.db.yaml"));
}

#[test]
fn output_path_keeps_existing_extension() {
    let cfg = ConvertConfig::with_suffix(".txt");
    let out = cfg.output_path(Path::new("store.mms"));
    assert_eq!(out, PathBuf::from("store.mms.txt"));
}

#[test]
fn output_path_without_extension() {
    let cfg = ConvertConfig::default();
    assert_eq!(
        cfg.output_path(Path::new("cache")),
        PathBuf::from("cache.yaml")
    );
}

#[test]
fn empty_suffix_is_rejected() {
    let cfg = ConvertConfig::with_suffix("");
    assert_eq!(cfg.validate(), Err(ConfigError::EmptySuffix));
}

#[test]
fn suffix_with_separator_is_rejected() {
    let cfg = ConvertConfig::with_suffix("/../evil.yaml");
    assert!(matches!(
        cfg.validate(),
        Err(ConfigError::SuffixHasSeparator(_))
    ));

    let cfg = ConvertConfig::with_suffix("\\x.yaml");
    assert!(cfg.validate().is_err());
}

#[test]
fn append_to_path_extends_last_component() {
    assert_eq!(
        append_to_path(Path::new("dir/cache.db"), ".lock"),
        PathBuf::from("dir/cache.db.lock")
    );
    assert_eq!(
        append_to_path(Path::new("cache.db.yaml"), ".tmp"),
        PathBuf::from("cache.db.yaml.tmp")
    );
}
