//! Editor view
//!
//! Decides what the host shows below the settings tree: a prompt, or an
//! editor widget for the selected parameter filled with the displayed value.

use pedit_core::{ParameterAddress, ParameterType, ParameterValue};

use crate::selection::SelectionMachine;
use crate::settings::{InputSettings, InputType, NumericBounds};
use crate::types::SelectionPhase;

/// What the editor area shows
#[derive(Debug, Clone, PartialEq)]
pub enum EditorView {
    /// No node selected
    SelectNodePrompt,
    /// Node selected, parameter not
    SelectParameterPrompt,
    /// Selected node has no parameters
    NoParameters {
        /// Selected node
        node: String,
    },
    /// Selected parameter is not in the registry
    ParameterNotFound {
        /// Selected parameter
        address: ParameterAddress,
    },
    /// Editor for the selected parameter
    Editor(EditorWidget),
    /// Input type does not fit the parameter's kind
    Invalid {
        /// Selected parameter
        address: ParameterAddress,
        /// Chosen input type
        input_type: InputType,
        /// Declared kind of the parameter
        kind: ParameterType,
    },
}

/// Editor widget for one parameter
#[derive(Debug, Clone, PartialEq)]
pub struct EditorWidget {
    /// Edited parameter
    pub address: ParameterAddress,
    /// Widget to render
    pub control: Control,
    /// Text to show; the pending text while an edit is unconfirmed
    pub text: String,
    /// An edit is waiting to be confirmed
    pub pending: bool,
}

/// Widget kind and its current value
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    /// Numeric field
    Number {
        /// Displayed value
        value: f64,
        /// Range and increment
        bounds: NumericBounds,
    },
    /// Slider
    Slider {
        /// Displayed value
        value: f64,
        /// Range and increment
        bounds: NumericBounds,
    },
    /// Checkbox
    Checkbox {
        /// Displayed state
        checked: bool,
    },
    /// Free text
    Text {
        /// Displayed text
        value: String,
    },
    /// Choice list
    Select {
        /// Displayed choice
        value: String,
        /// Offered values
        options: Vec<String>,
    },
    /// Comma-separated array text
    ArrayText {
        /// Declared array kind
        kind: ParameterType,
    },
}

impl EditorView {
    /// Build the view for a machine's current state
    #[must_use]
    pub fn of(machine: &SelectionMachine) -> Self {
        let state = machine.state();
        match machine.phase() {
            SelectionPhase::NoNodeSelected => return Self::SelectNodePrompt,
            SelectionPhase::NodeSelectedNoParameter => {
                return if machine.available_parameters().is_empty() {
                    Self::NoParameters {
                        node: state.selected_node.clone(),
                    }
                } else {
                    Self::SelectParameterPrompt
                };
            }
            SelectionPhase::ParameterSelected => {}
        }

        let address = ParameterAddress::new(
            state.selected_node.clone(),
            state.selected_parameter_name.clone(),
        );
        let (Some(value), Some(text)) = (machine.displayed_value(), machine.displayed_text())
        else {
            return Self::ParameterNotFound { address };
        };

        match control_for(&state.input, value) {
            Some(control) => Self::Editor(EditorWidget {
                address,
                control,
                text,
                pending: machine.pending().is_some(),
            }),
            None => Self::Invalid {
                address,
                input_type: state.input_type(),
                kind: value.kind(),
            },
        }
    }

    /// Check if an editor widget is shown
    #[inline]
    #[must_use]
    pub fn is_editor(&self) -> bool {
        matches!(self, Self::Editor(_))
    }
}

/// Widget for an input configuration, `None` when it does not fit the value
fn control_for(input: &InputSettings, value: &ParameterValue) -> Option<Control> {
    if !input.input_type().accepts(value.kind()) {
        return None;
    }
    let control = match input {
        InputSettings::Number(bounds) => Control::Number {
            value: value.as_f64()?,
            bounds: *bounds,
        },
        InputSettings::Slider(bounds) => Control::Slider {
            value: value.as_f64()?,
            bounds: *bounds,
        },
        InputSettings::Boolean => Control::Checkbox {
            checked: value.as_bool()?,
        },
        InputSettings::Text => Control::Text {
            value: value.as_str()?.to_string(),
        },
        InputSettings::Select { options } => Control::Select {
            value: value.as_str()?.to_string(),
            options: options.clone(),
        },
        InputSettings::NumberArray | InputSettings::BooleanArray | InputSettings::StringArray => {
            Control::ArrayText { kind: value.kind() }
        }
    };
    Some(control)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pedit_core::Snapshot;
    use serde_json::json;

    fn machine() -> SelectionMachine {
        let mut machine = SelectionMachine::new(NumericBounds::default());
        machine.refresh_data(
            &Snapshot::default()
                .with("camera.gain", json!(2.5))
                .with("camera.mode", json!("auto"))
                .with("camera.flags", json!([true, false])),
        );
        machine
    }

    #[test]
    fn view_prompts_follow_phase() {
        let mut machine = machine();
        assert_eq!(EditorView::of(&machine), EditorView::SelectNodePrompt);
        machine.select_node("camera");
        assert_eq!(EditorView::of(&machine), EditorView::SelectParameterPrompt);
        machine.select_node("lidar");
        assert_eq!(
            EditorView::of(&machine),
            EditorView::NoParameters { node: "lidar".into() }
        );
    }

    #[test]
    fn view_numeric_editor_shows_pending_value() {
        let mut machine = machine();
        machine.select_node("camera");
        machine.select_parameter("gain").unwrap();
        machine.set_input_type(InputType::Slider);
        machine.edit("3.7").unwrap();

        let EditorView::Editor(widget) = EditorView::of(&machine) else {
            panic!("expected editor");
        };
        assert_eq!(
            widget.control,
            Control::Slider {
                value: 3.7,
                bounds: NumericBounds::default()
            }
        );
        assert_eq!(widget.text, "3.7");
        assert!(widget.pending);
    }

    #[test]
    fn view_mismatched_input_is_invalid() {
        let mut machine = machine();
        machine.select_node("camera");
        machine.select_parameter("mode").unwrap();
        assert_eq!(
            EditorView::of(&machine),
            EditorView::Invalid {
                address: ParameterAddress::new("camera", "mode"),
                input_type: InputType::Number,
                kind: ParameterType::String,
            }
        );
        machine.set_input_type(InputType::Text);
        assert!(EditorView::of(&machine).is_editor());
    }

    #[test]
    fn view_array_editor_uses_display_text() {
        let mut machine = machine();
        machine.select_node("camera");
        machine.select_parameter("flags").unwrap();
        machine.set_input_type(InputType::BooleanArray);
        let EditorView::Editor(widget) = EditorView::of(&machine) else {
            panic!("expected editor");
        };
        assert_eq!(widget.control, Control::ArrayText { kind: ParameterType::BoolArray });
        assert_eq!(widget.text, "[true, false]");
        assert!(!widget.pending);
    }
}
