//! Preference store persistence

use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

use toolbelt::ErrorKind;
use toolbelt::prefs::{
    PrefSpec, PrefValue, PreferenceSchema, PreferenceStore, PrefsError, SerialNumbering,
};

fn serial_store() -> PreferenceStore {
    PreferenceStore::new(PreferenceSchema::serial_numbering())
}

#[test]
fn test_missing_file_loads_declared_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let store = serial_store();

    let set = store.load(&temp_dir.path().join("absent.toml")).unwrap();

    assert_eq!(set.get("increment"), Some(&PrefValue::Int(1)));
    assert_eq!(set.get("station"), Some(&PrefValue::Int(0)));
    assert_eq!(set.get("service"), Some(&PrefValue::Null));
    assert_eq!(set.iter().count(), 3);
}

#[test]
fn test_save_then_load_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("prefs.toml");
    let store = serial_store();

    let defaults = store.schema().defaults();
    store.save(&defaults, &path).unwrap();

    assert_eq!(store.load(&path).unwrap(), defaults);
    // Null values are omitted from the file.
    assert_eq!(fs::read_to_string(&path).unwrap(), "increment = 1\nstation = 0\n");
}

#[test]
fn test_save_then_load_edited_set() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested/prefs.toml");
    let store = serial_store();

    let mut set = store.load(&path).unwrap();
    set.set("increment", PrefValue::Int(4)).unwrap();
    set.set_from_str("station", "3").unwrap();
    set.set("service", PrefValue::Str("http://serials.test/next".into()))
        .unwrap();
    store.save(&set, &path).unwrap();

    let loaded = store.load(&path).unwrap();
    assert_eq!(loaded, set);
    assert_eq!(loaded.get_str("service"), Some("http://serials.test/next"));

    set.set_from_str("service", "null").unwrap();
    store.save(&set, &path).unwrap();
    assert_eq!(store.load(&path).unwrap().get("service"), Some(&PrefValue::Null));
}

#[test]
fn test_one_line_per_saved_value() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("prefs.toml");
    let store = serial_store();

    let mut set = store.load(&path).unwrap();
    set.set("service", PrefValue::Str("line one\nline two\r\n\"quoted\"".into()))
        .unwrap();
    store.save(&set, &path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let non_null = set.iter().filter(|(_, value)| !value.is_null()).count();
    assert_eq!(text.lines().count(), non_null);
    assert!(text.lines().all(|line| line.contains(" = ")));
    assert_eq!(store.load(&path).unwrap(), set);
}

#[test]
fn test_unknown_keys_ignored_and_missing_keys_defaulted() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("prefs.toml");
    fs::write(&path, "legacy_mode = true\nstation = 2\n").unwrap();

    let set = serial_store().load(&path).unwrap();

    assert_eq!(set.get_int("station"), Some(2));
    assert_eq!(set.get_int("increment"), Some(1));
    assert!(set.get("legacy_mode").is_none());
}

#[test]
fn test_malformed_file_is_corrupt_store() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("prefs.toml");
    fs::write(&path, "station = = 2\n").unwrap();

    let err = serial_store().load(&path).unwrap_err();

    assert!(matches!(err, PrefsError::CorruptStore { .. }));
    assert_eq!(err.kind(), ErrorKind::CorruptStore);
}

#[test]
fn test_custom_schema() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ui.toml");
    let schema = PreferenceSchema::new([
        PrefSpec::string("theme", Some("light")),
        PrefSpec::integer("font_size", Some(12)),
    ])
    .unwrap();
    let store = PreferenceStore::new(schema);

    let mut set = store.load(&path).unwrap();
    set.set_from_str("theme", "dark").unwrap();
    assert!(matches!(
        set.set_from_str("font_size", "large"),
        Err(PrefsError::InvalidArgument(_))
    ));
    assert!(matches!(
        set.set("colour", PrefValue::Int(1)),
        Err(PrefsError::InvalidArgument(_))
    ));

    store.save(&set, &path).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "font_size = 12\ntheme = \"dark\"\n");
    assert!(Arc::ptr_eq(store.load(&path).unwrap().schema(), store.schema()));
}

#[test]
fn test_two_stations_share_serial_space() {
    let temp_dir = TempDir::new().unwrap();
    let store = serial_store();
    let mut numbering = Vec::new();

    for station in 0..2 {
        let path = temp_dir.path().join(format!("station{station}.toml"));
        let mut set = store.load(&path).unwrap();
        set.set("increment", PrefValue::Int(2)).unwrap();
        set.set("station", PrefValue::Int(station)).unwrap();
        store.save(&set, &path).unwrap();

        numbering.push(SerialNumbering::from_set(&store.load(&path).unwrap()).unwrap());
    }

    assert_eq!(numbering[0].next_after(10).unwrap(), 12);
    assert_eq!(numbering[1].next_after(10).unwrap(), 11);
    assert_eq!(numbering[1].next_after(11).unwrap(), 13);
}
