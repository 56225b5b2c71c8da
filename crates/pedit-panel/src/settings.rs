//! Selection state and its persisted record
//!
//! [`SelectionState`] is the typed form used everywhere in the editor.
//! [`SettingsRecord`] is the flat, all-optional shape it is stored as and
//! that the action reducer assigns into.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use pedit_core::ParameterType;
use serde::{Deserialize, Serialize};

use crate::types::SelectionPhase;

/// How the selected parameter is edited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    /// Numeric field with bounds
    Number,
    /// Slider over the bounds
    Slider,
    /// Checkbox
    Boolean,
    /// Choice among configured options
    Select,
    /// Free text
    Text,
    /// Comma-separated numbers
    NumberArray,
    /// Comma-separated booleans
    BooleanArray,
    /// Comma-separated strings
    StringArray,
}

impl InputType {
    /// Every input type, in selector order
    pub const ALL: [Self; 8] = [
        Self::Boolean,
        Self::Text,
        Self::Select,
        Self::Number,
        Self::Slider,
        Self::NumberArray,
        Self::BooleanArray,
        Self::StringArray,
    ];

    /// Wire identifier
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Slider => "slider",
            Self::Boolean => "boolean",
            Self::Select => "select",
            Self::Text => "text",
            Self::NumberArray => "number_array",
            Self::BooleanArray => "boolean_array",
            Self::StringArray => "string_array",
        }
    }

    /// Label shown in the input type selector
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Number => "Number",
            Self::Slider => "Slider",
            Self::Boolean => "Boolean",
            Self::Select => "Select",
            Self::Text => "Text",
            Self::NumberArray => "Number Array",
            Self::BooleanArray => "Boolean Array",
            Self::StringArray => "String Array",
        }
    }

    /// Check if this input carries numeric bounds
    #[inline]
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Number | Self::Slider)
    }

    /// Input types that fit a parameter kind
    ///
    /// Byte arrays edit as number arrays.
    #[must_use]
    pub fn allowed_for(kind: ParameterType) -> &'static [Self] {
        match kind {
            ParameterType::Bool => &[Self::Boolean],
            ParameterType::String => &[Self::Text, Self::Select],
            ParameterType::Integer | ParameterType::Double => &[Self::Number, Self::Slider],
            ParameterType::ByteArray | ParameterType::IntegerArray | ParameterType::DoubleArray => {
                &[Self::NumberArray]
            }
            ParameterType::BoolArray => &[Self::BooleanArray],
            ParameterType::StringArray => &[Self::StringArray],
        }
    }

    /// Check if this input type fits a parameter kind
    #[inline]
    #[must_use]
    pub fn accepts(self, kind: ParameterType) -> bool {
        Self::allowed_for(kind).contains(&self)
    }
}

impl Display for InputType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputType {
    type Err = UnknownInputType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownInputType(s.to_string()))
    }
}

/// Text that names no input type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown input type: {0:?}")]
pub struct UnknownInputType(pub String);

/// Range and increment of numeric inputs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumericBounds {
    /// Lowest accepted value
    pub min: f64,
    /// Highest accepted value
    pub max: f64,
    /// Increment of the control
    pub step: f64,
}

impl NumericBounds {
    /// Create bounds
    #[inline]
    #[must_use]
    pub fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    /// Check if a value lies within `[min, max]`
    #[inline]
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl Default for NumericBounds {
    fn default() -> Self {
        Self {
            min: -100.0,
            max: 100.0,
            step: 0.1,
        }
    }
}

/// Input configuration, one variant per input type
#[derive(Debug, Clone, PartialEq)]
pub enum InputSettings {
    /// Numeric field
    Number(NumericBounds),
    /// Slider
    Slider(NumericBounds),
    /// Checkbox
    Boolean,
    /// Choice list
    Select {
        /// Offered values, blank entries included
        options: Vec<String>,
    },
    /// Free text
    Text,
    /// Number array text
    NumberArray,
    /// Boolean array text
    BooleanArray,
    /// String array text
    StringArray,
}

impl InputSettings {
    /// Discriminant of this configuration
    #[must_use]
    pub fn input_type(&self) -> InputType {
        match self {
            Self::Number(_) => InputType::Number,
            Self::Slider(_) => InputType::Slider,
            Self::Boolean => InputType::Boolean,
            Self::Select { .. } => InputType::Select,
            Self::Text => InputType::Text,
            Self::NumberArray => InputType::NumberArray,
            Self::BooleanArray => InputType::BooleanArray,
            Self::StringArray => InputType::StringArray,
        }
    }

    /// Bounds of a numeric input
    #[inline]
    #[must_use]
    pub fn bounds(&self) -> Option<&NumericBounds> {
        match self {
            Self::Number(bounds) | Self::Slider(bounds) => Some(bounds),
            _ => None,
        }
    }

    /// Options of a select input
    #[inline]
    #[must_use]
    pub fn select_options(&self) -> Option<&[String]> {
        match self {
            Self::Select { options } => Some(options),
            _ => None,
        }
    }

    /// Configuration for `input_type`, carrying over what `previous` already has
    ///
    /// Switching between number and slider keeps the bounds; other switches
    /// into a numeric input start from `defaults`.
    #[must_use]
    pub fn switch_to(input_type: InputType, previous: &Self, defaults: NumericBounds) -> Self {
        let bounds = previous.bounds().copied().unwrap_or(defaults);
        match input_type {
            InputType::Number => Self::Number(bounds),
            InputType::Slider => Self::Slider(bounds),
            InputType::Boolean => Self::Boolean,
            InputType::Select => Self::Select {
                options: previous.select_options().map(<[String]>::to_vec).unwrap_or_default(),
            },
            InputType::Text => Self::Text,
            InputType::NumberArray => Self::NumberArray,
            InputType::BooleanArray => Self::BooleanArray,
            InputType::StringArray => Self::StringArray,
        }
    }
}

impl Default for InputSettings {
    fn default() -> Self {
        Self::Number(NumericBounds::default())
    }
}

/// What is selected in the editor and how it is edited
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    /// Empty when no node is selected
    pub selected_node: String,
    /// Empty, or a parameter of `selected_node`
    pub selected_parameter_name: String,
    /// Input type and its settings
    pub input: InputSettings,
}

impl SelectionState {
    /// Phase derived from which names are set
    #[must_use]
    pub fn phase(&self) -> SelectionPhase {
        if self.selected_node.is_empty() {
            SelectionPhase::NoNodeSelected
        } else if self.selected_parameter_name.is_empty() {
            SelectionPhase::NodeSelectedNoParameter
        } else {
            SelectionPhase::ParameterSelected
        }
    }

    /// Current input type
    #[inline]
    #[must_use]
    pub fn input_type(&self) -> InputType {
        self.input.input_type()
    }

    /// Flat record form; bounds only for numeric inputs, options only for select
    #[must_use]
    pub fn to_record(&self) -> SettingsRecord {
        let bounds = self.input.bounds();
        SettingsRecord {
            selected_node: Some(self.selected_node.clone()),
            selected_parameter_name: Some(self.selected_parameter_name.clone()),
            input_type: Some(self.input_type()),
            min: bounds.map(|b| b.min),
            max: bounds.map(|b| b.max),
            step: bounds.map(|b| b.step),
            select_options: self.input.select_options().map(<[String]>::to_vec),
        }
    }

    /// Build from a record, filling absent fields
    ///
    /// Presence is checked per field, so an explicit `0` bound is kept.
    #[must_use]
    pub fn from_record(record: &SettingsRecord, defaults: NumericBounds) -> Self {
        let bounds = NumericBounds {
            min: record.min.unwrap_or(defaults.min),
            max: record.max.unwrap_or(defaults.max),
            step: record.step.unwrap_or(defaults.step),
        };
        let input = match record.input_type.unwrap_or(InputType::Number) {
            InputType::Number => InputSettings::Number(bounds),
            InputType::Slider => InputSettings::Slider(bounds),
            InputType::Boolean => InputSettings::Boolean,
            InputType::Select => InputSettings::Select {
                options: record.select_options.clone().unwrap_or_default(),
            },
            InputType::Text => InputSettings::Text,
            InputType::NumberArray => InputSettings::NumberArray,
            InputType::BooleanArray => InputSettings::BooleanArray,
            InputType::StringArray => InputSettings::StringArray,
        };
        Self {
            selected_node: record.selected_node.clone().unwrap_or_default(),
            selected_parameter_name: record.selected_parameter_name.clone().unwrap_or_default(),
            input,
        }
    }
}

/// Flat persisted shape of [`SelectionState`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRecord {
    /// Selected node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_node: Option<String>,
    /// Selected parameter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_parameter_name: Option<String>,
    /// Input type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<InputType>,
    /// Numeric lower bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Numeric upper bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Numeric increment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    /// Options of a select input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select_options: Option<Vec<String>>,
}

impl SettingsRecord {
    /// Serialized field names
    pub const FIELDS: [&'static str; 7] = [
        "selectedNode",
        "selectedParameterName",
        "inputType",
        "min",
        "max",
        "step",
        "selectOptions",
    ];
}
