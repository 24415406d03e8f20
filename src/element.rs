//! UI elements and the JSON protocol spoken over the WebSocket.

use serde::{Deserialize, Serialize};

/// JSON Protocol: Messages from client to server
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "click")]
    Click { id: String },
    #[serde(rename = "change")]
    Change { id: String, value: serde_json::Value },
}

/// JSON Protocol: Messages from server to client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "init")]
    Init { elements: Vec<UiElement> },
    #[serde(rename = "update")]
    Update { id: String, element: UiElement },
}

impl ServerMessage {
    pub fn update(element: UiElement) -> Self {
        ServerMessage::Update {
            id: element.id().to_string(),
            element,
        }
    }
}

/// Labelled tick drawn under a range slider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mark {
    pub value: i64,
    pub label: String,
}

/// UI Element types that can be created in Rust and rendered in HTML.
///
/// Each element has an `id` for identification and element-specific properties.
/// Elements do not contain geometry or styling information - that is handled by HTML/CSS.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum UiElement {
    /// A clickable button.
    ///
    /// # HTML Element
    /// Renders as `<ui-button id="...">text</ui-button>`
    #[serde(rename = "button")]
    Button {
        id: String,
        text: String,
        disabled: bool,
    },

    /// Read-only text display, optionally carrying a CSS class.
    ///
    /// # HTML Element
    /// Renders as `<ui-text id="...">text</ui-text>`
    #[serde(rename = "text")]
    Text {
        id: String,
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        class: Option<String>,
    },

    /// Checkbox input.
    ///
    /// # HTML Element
    /// Renders as `<ui-checkbox id="...">label</ui-checkbox>`
    #[serde(rename = "checkbox")]
    Checkbox {
        id: String,
        label: String,
        checked: bool,
    },

    /// A group of mutually exclusive radio buttons. `value` is `None` when no
    /// option is selected.
    ///
    /// # HTML Element
    /// Renders as `<ui-radio-group id="..."></ui-radio-group>`
    #[serde(rename = "radio-group")]
    RadioGroup {
        id: String,
        options: Vec<String>,
        value: Option<String>,
    },

    /// Multi-select dropdown.
    ///
    /// # HTML Element
    /// Renders as `<ui-multi-select id="..."></ui-multi-select>`
    #[serde(rename = "multi-select")]
    MultiSelect {
        id: String,
        options: Vec<String>,
        value: Vec<String>,
    },

    /// Two-thumb slider selecting an inclusive `[low, high]` pair.
    ///
    /// # HTML Element
    /// Renders as `<ui-range-slider id="..."></ui-range-slider>`
    #[serde(rename = "range-slider")]
    RangeSlider {
        id: String,
        min: i64,
        max: i64,
        step: i64,
        value: [i64; 2],
        marks: Vec<Mark>,
    },

    /// Container shown only while `open`.
    ///
    /// # HTML Element
    /// Renders as `<ui-collapse id="...">children</ui-collapse>`
    #[serde(rename = "collapse")]
    Collapse { id: String, open: bool },
}

impl UiElement {
    pub fn id(&self) -> &str {
        match self {
            UiElement::Button { id, .. }
            | UiElement::Text { id, .. }
            | UiElement::Checkbox { id, .. }
            | UiElement::RadioGroup { id, .. }
            | UiElement::MultiSelect { id, .. }
            | UiElement::RangeSlider { id, .. }
            | UiElement::Collapse { id, .. } => id,
        }
    }
}
