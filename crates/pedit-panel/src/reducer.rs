//! Settings action reducer
//!
//! Applies a settings-tree edit to a [`SelectionState`] by assigning the new
//! value into the state's flat record at the action's path. Paths that do not
//! name a known field, and values of the wrong type, leave the state alone.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::settings::{NumericBounds, SelectionState, SettingsRecord};

/// Field holding the number of select options
pub const SELECT_OPTIONS_AMOUNT: &str = "selectOptionsAmount";

/// Prefix of the per-option fields, followed by the option index
pub const SELECT_OPTION_PREFIX: &str = "selectOption";

/// Upper limit on the number of select options
pub const MAX_SELECT_OPTIONS: usize = 64;

/// An edit made in the settings tree
///
/// The first path element names the tree node and is not part of the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsAction {
    /// Tree node followed by field key
    pub path: Vec<String>,
    /// New field value
    pub value: JsonValue,
}

impl SettingsAction {
    /// Create action
    #[must_use]
    pub fn update<I, S>(path: I, value: JsonValue) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into_iter().map(Into::into).collect(),
            value,
        }
    }
}

/// Apply an action, filling absent numeric bounds from the built-in defaults
#[must_use]
pub fn reduce(state: &SelectionState, action: &SettingsAction) -> SelectionState {
    reduce_with_defaults(state, action, NumericBounds::default())
}

/// Apply an action to a state
///
/// Returns an unchanged copy when the path is unknown or the value does not
/// fit the field.
#[must_use]
pub fn reduce_with_defaults(
    state: &SelectionState,
    action: &SettingsAction,
    defaults: NumericBounds,
) -> SelectionState {
    let Some(field_path) = action.path.get(1..).filter(|p| !p.is_empty()) else {
        tracing::debug!("Ignoring settings action with short path {:?}", action.path);
        return state.clone();
    };

    let record = state.to_record();
    let Some((path, value)) = translate(field_path, &action.value, &record) else {
        tracing::debug!("Ignoring settings action for unknown field {:?}", action.path);
        return state.clone();
    };

    let mut document = match serde_json::to_value(&record) {
        Ok(document) => document,
        Err(e) => {
            tracing::warn!("Failed to serialize selection state: {}", e);
            return state.clone();
        }
    };
    if !assign(&mut document, &path, value) {
        tracing::debug!("Settings action path {:?} does not exist", action.path);
        return state.clone();
    }

    match serde_json::from_value::<SettingsRecord>(document) {
        Ok(updated) => SelectionState::from_record(&updated, defaults),
        Err(e) => {
            tracing::warn!("Ignoring ill-typed value for {:?}: {}", action.path, e);
            state.clone()
        }
    }
}

/// Map a tree field path onto a record path and value
fn translate(
    path: &[String],
    value: &JsonValue,
    record: &SettingsRecord,
) -> Option<(Vec<String>, JsonValue)> {
    let (head, rest) = path.split_first()?;

    if head == SELECT_OPTIONS_AMOUNT && rest.is_empty() {
        let amount = usize::try_from(value.as_u64()?).ok()?.min(MAX_SELECT_OPTIONS);
        let mut options = record.select_options.clone().unwrap_or_default();
        options.resize(amount, String::new());
        return Some((vec!["selectOptions".into()], JsonValue::from(options)));
    }

    if let Some(index) = head.strip_prefix(SELECT_OPTION_PREFIX) {
        if rest.is_empty() && !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) {
            return Some((vec!["selectOptions".into(), index.to_string()], value.clone()));
        }
    }

    if SettingsRecord::FIELDS.contains(&head.as_str()) {
        return Some((path.to_vec(), value.clone()));
    }
    None
}

/// Set `new_value` at `path`
///
/// Object keys are created only at the last step; array indices must exist,
/// except that one past the end appends.
fn assign(target: &mut JsonValue, path: &[String], new_value: JsonValue) -> bool {
    let Some((key, rest)) = path.split_first() else {
        *target = new_value;
        return true;
    };
    match target {
        JsonValue::Object(map) => {
            if rest.is_empty() {
                map.insert(key.clone(), new_value);
                true
            } else {
                map.get_mut(key)
                    .is_some_and(|child| assign(child, rest, new_value))
            }
        }
        JsonValue::Array(items) => {
            let Ok(index) = key.parse::<usize>() else {
                return false;
            };
            if let Some(child) = items.get_mut(index) {
                assign(child, rest, new_value)
            } else if index == items.len() && rest.is_empty() {
                items.push(new_value);
                true
            } else {
                false
            }
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{InputSettings, InputType};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn numeric_state() -> SelectionState {
        SelectionState {
            selected_node: "camera".into(),
            selected_parameter_name: "gain".into(),
            input: InputSettings::Number(NumericBounds::default()),
        }
    }

    #[test]
    fn reduce_sets_known_field() {
        let next = reduce(
            &numeric_state(),
            &SettingsAction::update(["dataSource", "min"], json!(0)),
        );
        assert_eq!(next.input.bounds().map(|b| b.min), Some(0.0));
        assert_eq!(next.selected_parameter_name, "gain");
    }

    #[test]
    fn reduce_unknown_path_is_noop() {
        let state = numeric_state();
        for path in [
            vec!["dataSource", "colour"],
            vec!["dataSource"],
            vec![],
            vec!["dataSource", "min", "deeper"],
        ] {
            assert_eq!(reduce(&state, &SettingsAction::update(path, json!(1))), state);
        }
    }

    #[test]
    fn reduce_ill_typed_value_is_noop() {
        let state = numeric_state();
        let next = reduce(
            &state,
            &SettingsAction::update(["dataSource", "min"], json!("low")),
        );
        assert_eq!(next, state);
        let next = reduce(
            &state,
            &SettingsAction::update(["dataSource", "inputType"], json!("dial")),
        );
        assert_eq!(next, state);
    }

    #[test]
    fn reduce_switches_input_type() {
        let next = reduce(
            &numeric_state(),
            &SettingsAction::update(["dataSource", "inputType"], json!("select")),
        );
        assert_eq!(next.input_type(), InputType::Select);
        assert_eq!(next.input.select_options(), Some(&[][..]));
        assert!(next.input.bounds().is_none());
    }

    #[test]
    fn reduce_resizes_and_sets_select_options() {
        let state = SelectionState {
            input: InputSettings::Select { options: vec!["a".into()] },
            ..numeric_state()
        };
        let grown = reduce(
            &state,
            &SettingsAction::update(["dataSource", SELECT_OPTIONS_AMOUNT], json!(3)),
        );
        assert_eq!(
            grown.input.select_options(),
            Some(&["a".to_string(), String::new(), String::new()][..])
        );

        let named = reduce(
            &grown,
            &SettingsAction::update(["dataSource", "selectOption2"], json!("high")),
        );
        assert_eq!(named.input.select_options().map(|o| o[2].as_str()), Some("high"));

        let shrunk = reduce(
            &named,
            &SettingsAction::update(["dataSource", SELECT_OPTIONS_AMOUNT], json!(1)),
        );
        assert_eq!(shrunk.input.select_options(), Some(&["a".to_string()][..]));
    }

    #[test]
    fn reduce_select_option_outside_list_is_noop() {
        let state = SelectionState {
            input: InputSettings::Select { options: vec![] },
            ..numeric_state()
        };
        let next = reduce(
            &state,
            &SettingsAction::update(["dataSource", "selectOption5"], json!("x")),
        );
        assert_eq!(next, state);
        let next = reduce(
            &numeric_state(),
            &SettingsAction::update(["dataSource", "selectOption0"], json!("x")),
        );
        assert_eq!(next, numeric_state());
    }

    #[test]
    fn reduce_is_idempotent() {
        let action = SettingsAction::update(["dataSource", "step"], json!(0.5));
        let once = reduce(&numeric_state(), &action);
        assert_eq!(reduce(&once, &action), once);
    }
}
