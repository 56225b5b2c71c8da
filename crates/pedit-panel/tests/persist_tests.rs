use pedit_panel::{
    restore_selection, EditorConfig, InputSettings, JsonFileStore, NumericBounds, PersistedState,
    SelectionState, StateStore,
};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn test_missing_file_restores_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("absent.json"));
    assert!(store.load().unwrap().is_none());
    assert_eq!(
        restore_selection(&store, NumericBounds::default()),
        SelectionState::default()
    );
}

#[test]
fn test_corrupt_file_restores_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "{ not json").unwrap();
    let store = JsonFileStore::new(&path);
    assert!(store.load().is_err());

    let defaults = NumericBounds::new(0.0, 1.0, 0.05);
    let state = restore_selection(&store, defaults);
    assert_eq!(state.input, InputSettings::Number(defaults));
}

#[test]
fn test_saved_document_shape() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("nested").join("state.json"));
    let state = SelectionState {
        selected_node: "camera".into(),
        selected_parameter_name: "mode".into(),
        input: InputSettings::Select {
            options: vec!["auto".into(), "manual".into()],
        },
    };
    store.save(&PersistedState::from(&state)).unwrap();

    let text = std::fs::read_to_string(store.path()).unwrap();
    let document: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(
        document,
        json!({"settings": {
            "selectedNode": "camera",
            "selectedParameterName": "mode",
            "inputType": "select",
            "selectOptions": ["auto", "manual"]
        }})
    );
    assert_eq!(restore_selection(&store, NumericBounds::default()), state);
}

#[test]
fn test_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pedit.toml");
    std::fs::write(
        &path,
        "quiet_interval_ms = 250\noutcome_channel_capacity = 8\n\n[default_bounds]\nmin = -1.0\nmax = 1.0\nstep = 0.01\n",
    )
    .unwrap();

    let config = EditorConfig::load(&path).unwrap();
    assert_eq!(config.quiet_interval_ms, 250);
    assert_eq!(config.outcome_channel_capacity, 8);
    assert_eq!(config.default_bounds, NumericBounds::new(-1.0, 1.0, 0.01));
    assert!(EditorConfig::load(dir.path().join("missing.toml")).is_err());
}
