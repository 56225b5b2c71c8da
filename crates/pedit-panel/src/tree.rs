//! Settings tree builder
//!
//! [`build_settings_tree`] projects the selection and the registry into the
//! declarative field tree a host renders. It is a pure function: equal inputs
//! give equal trees.

use indexmap::IndexMap;
use pedit_core::{ParameterRegistry, ParameterType};
use serde::Serialize;

use crate::reducer::{SELECT_OPTIONS_AMOUNT, SELECT_OPTION_PREFIX};
use crate::settings::{InputType, SelectionState};

/// Key of the only top-level node
pub const DATA_SOURCE: &str = "dataSource";

/// Widget a field is edited with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldInput {
    /// Choice among `options`
    Select,
    /// Number entry
    Number,
    /// Text entry
    String,
}

/// One choice of a select field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    /// Shown text
    pub label: String,
    /// Value written when chosen
    pub value: String,
}

impl SelectOption {
    /// Option whose label is its value
    #[inline]
    #[must_use]
    pub fn plain(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }
}

/// Current value of a field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Text or select value
    Text(String),
    /// Numeric value
    Number(f64),
}

/// An editable field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsField {
    /// Field label
    pub label: String,
    /// Widget kind
    pub input: FieldInput,
    /// Current value
    pub value: FieldValue,
    /// Choices of a select field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<SelectOption>>,
    /// Shown but not editable
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
    /// Hint shown while the value is empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl SettingsField {
    /// Select field
    #[must_use]
    pub fn select(label: &str, value: impl Into<String>, options: Vec<SelectOption>) -> Self {
        Self::new(label, FieldInput::Select, FieldValue::Text(value.into())).with_options(options)
    }

    /// Number field
    #[must_use]
    pub fn number(label: &str, value: f64) -> Self {
        Self::new(label, FieldInput::Number, FieldValue::Number(value))
    }

    /// Free text field
    #[must_use]
    pub fn text(label: &str, value: impl Into<String>) -> Self {
        Self::new(label, FieldInput::String, FieldValue::Text(value.into()))
    }

    fn new(label: &str, input: FieldInput, value: FieldValue) -> Self {
        Self {
            label: label.to_string(),
            input,
            value,
            options: None,
            disabled: false,
            placeholder: None,
        }
    }

    /// With select options
    #[inline]
    #[must_use]
    pub fn with_options(mut self, options: Vec<SelectOption>) -> Self {
        self.options = Some(options);
        self
    }

    /// With disabled flag
    #[inline]
    #[must_use]
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// With placeholder text
    #[inline]
    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }
}

/// A group of fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingsNode {
    /// Group label
    pub label: String,
    /// Icon name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Fields by key, in display order
    pub fields: IndexMap<String, SettingsField>,
}

/// Declarative settings tree
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ConfigTree {
    /// Groups by key, in display order
    pub nodes: IndexMap<String, SettingsNode>,
}

impl ConfigTree {
    /// Field at `[node, field]`
    #[must_use]
    pub fn field(&self, node: &str, field: &str) -> Option<&SettingsField> {
        self.nodes.get(node)?.fields.get(field)
    }

    /// Field of the data source node
    #[inline]
    #[must_use]
    pub fn data_source_field(&self, field: &str) -> Option<&SettingsField> {
        self.field(DATA_SOURCE, field)
    }

    /// Field keys of the data source node, in display order
    #[must_use]
    pub fn data_source_keys(&self) -> Vec<&str> {
        self.nodes
            .get(DATA_SOURCE)
            .map(|n| n.fields.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

/// Input types offered for a parameter kind; none when nothing is selected
#[must_use]
pub fn input_type_options(kind: Option<ParameterType>) -> &'static [InputType] {
    match kind {
        Some(kind) => InputType::allowed_for(kind),
        None => &[],
    }
}

/// Build the settings tree for a selection
#[must_use]
pub fn build_settings_tree(state: &SelectionState, registry: &ParameterRegistry) -> ConfigTree {
    let mut fields = IndexMap::new();

    let node_options = registry.node_names().map(SelectOption::plain).collect();
    fields.insert(
        "selectedNode".to_string(),
        SettingsField::select("Node", state.selected_node.clone(), node_options),
    );

    let parameter_options: Vec<_> = registry
        .parameter_names(&state.selected_node)
        .map(SelectOption::plain)
        .collect();
    let no_parameters = parameter_options.is_empty();
    fields.insert(
        "selectedParameterName".to_string(),
        SettingsField::select(
            "Parameter",
            state.selected_parameter_name.clone(),
            parameter_options,
        )
        .with_disabled(no_parameters),
    );

    let kind = registry
        .find(&state.selected_node, &state.selected_parameter_name)
        .map(|p| p.value.kind());
    let input_options: Vec<_> = input_type_options(kind)
        .iter()
        .map(|t| SelectOption {
            label: t.label().to_string(),
            value: t.as_str().to_string(),
        })
        .collect();
    let no_inputs = input_options.is_empty();
    fields.insert(
        "inputType".to_string(),
        SettingsField::select("Input type", state.input_type().as_str(), input_options)
            .with_disabled(no_inputs),
    );

    if let Some(bounds) = state.input.bounds() {
        fields.insert("min".to_string(), SettingsField::number("Min", bounds.min));
        fields.insert("max".to_string(), SettingsField::number("Max", bounds.max));
        fields.insert("step".to_string(), SettingsField::number("Step", bounds.step));
    }

    if let Some(options) = state.input.select_options() {
        #[allow(clippy::cast_precision_loss)]
        let amount = options.len() as f64;
        fields.insert(
            SELECT_OPTIONS_AMOUNT.to_string(),
            SettingsField::number("Number of options", amount),
        );
        for (i, option) in options.iter().enumerate() {
            fields.insert(
                format!("{SELECT_OPTION_PREFIX}{i}"),
                SettingsField::text(&format!("Option {}", i + 1), option.clone())
                    .with_placeholder("value"),
            );
        }
    }

    let mut nodes = IndexMap::new();
    nodes.insert(
        DATA_SOURCE.to_string(),
        SettingsNode {
            label: "Parameter".to_string(),
            icon: Some("Settings".to_string()),
            fields,
        },
    );
    ConfigTree { nodes }
}
