//! Maps menu state onto UI elements and client messages back onto events.
//!
//! Element ids are derived from typed [`ElementId`]s and never parsed: a
//! [`View`] builds the routing table for a catalog once, and every incoming
//! message is looked up in it.

use crate::element::{ClientMessage, Mark, UiElement};
use crate::menu::{Audience, Event, FilterMenu, SelectorKey, SelectorState, Update};
use crate::presets::{ALL_PRESET, Catalog, Range, Variable, VariableKind};
use serde_json::Value;
use std::{collections::HashMap, fmt::Write};
use thiserror::Error;

const HIGHLIGHT_CLASS: &str = "text-info";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewError {
    #[error("no element with id '{0}'")]
    UnknownElement(String),
    #[error("element '{0}' does not accept that event")]
    NotInteractive(String),
    #[error("element '{id}' expects {expected}")]
    BadPayload { id: String, expected: &'static str },
}

/// The sub-elements making up one variable's filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Part {
    /// Button carrying the variable name, opens its collapse.
    Toggle,
    Collapse,
    /// Preset radio group.
    Preset,
    /// Multi-select or range slider.
    Control,
    /// Footer label with the variable name.
    Name,
    /// Footer label with the summary.
    Summary,
}

impl Part {
    const ALL: [Part; 6] = [
        Part::Toggle,
        Part::Collapse,
        Part::Preset,
        Part::Control,
        Part::Name,
        Part::Summary,
    ];

    fn suffix(self, kind: VariableKind) -> &'static str {
        match (self, kind) {
            (Part::Toggle, _) => "toggle",
            (Part::Collapse, _) => "collapse",
            (Part::Preset, _) => "preset",
            (Part::Control, VariableKind::Discrete) => "values",
            (Part::Control, VariableKind::Continuous) => "range",
            (Part::Name, _) => "name",
            (Part::Summary, _) => "summary",
        }
    }
}

/// Typed identity of every element on the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementId {
    PanelButton(Audience),
    Panel(Audience),
    NotAudienceA,
    Variable { key: SelectorKey, part: Part },
}

impl ElementId {
    fn for_update(update: &Update) -> ElementId {
        let variable = |key: &SelectorKey, part| ElementId::Variable {
            key: key.clone(),
            part,
        };
        match update {
            Update::PanelOpen { audience, .. } => ElementId::Panel(*audience),
            Update::PanelButtonDisabled { audience, .. } => ElementId::PanelButton(*audience),
            Update::NotAudienceA(_) => ElementId::NotAudienceA,
            Update::VariableOpen { key, .. } => variable(key, Part::Collapse),
            Update::Preset { key, .. } => variable(key, Part::Preset),
            Update::Values { key, .. } | Update::Options { key, .. } | Update::Range { key, .. } => {
                variable(key, Part::Control)
            }
            Update::Summary { key, .. } => variable(key, Part::Summary),
        }
    }
}

/// Element ids and routing for one catalog. Shared by every session.
#[derive(Debug, Clone)]
pub struct View {
    indices: HashMap<String, usize>,
    order: Vec<ElementId>,
    routes: HashMap<String, ElementId>,
}

impl View {
    pub fn new(catalog: &Catalog) -> Self {
        let indices: HashMap<String, usize> = catalog
            .variables()
            .iter()
            .enumerate()
            .map(|(i, v)| (v.name().to_string(), i))
            .collect();

        let mut order = Vec::new();
        for audience in Audience::BOTH {
            order.push(ElementId::PanelButton(audience));
            if audience == Audience::B {
                order.push(ElementId::NotAudienceA);
            }
            order.push(ElementId::Panel(audience));
            for variable in catalog.variables() {
                let key = SelectorKey::new(audience, variable.kind(), variable.name());
                for part in Part::ALL {
                    order.push(ElementId::Variable {
                        key: key.clone(),
                        part,
                    });
                }
            }
        }

        let mut view = Self {
            indices,
            order,
            routes: HashMap::new(),
        };
        view.routes = view
            .order
            .iter()
            .map(|target| (view.id(target), target.clone()))
            .collect();
        view
    }

    /// DOM id of an element.
    pub fn id(&self, target: &ElementId) -> String {
        match target {
            ElementId::PanelButton(audience) => format!("{audience}-open"),
            ElementId::Panel(audience) => format!("{audience}-panel"),
            ElementId::NotAudienceA => "B-not-a".to_string(),
            ElementId::Variable { key, part } => {
                let index = self.indices.get(&key.variable).copied().unwrap_or(usize::MAX);
                format!(
                    "{}-{}-{}-{}",
                    key.audience,
                    key.kind.code(),
                    index,
                    part.suffix(key.kind)
                )
            }
        }
    }

    pub fn lookup(&self, id: &str) -> Option<&ElementId> {
        self.routes.get(id)
    }

    /// Translates a client message into the menu event it stands for.
    pub fn event_for(&self, message: &ClientMessage) -> Result<Event, ViewError> {
        let (ClientMessage::Click { id } | ClientMessage::Change { id, .. }) = message;
        let target = self
            .lookup(id)
            .ok_or_else(|| ViewError::UnknownElement(id.clone()))?;
        let bad_payload = |expected| ViewError::BadPayload {
            id: id.clone(),
            expected,
        };

        match (message, target) {
            (ClientMessage::Click { .. }, ElementId::PanelButton(audience)) => {
                Ok(Event::TogglePanel(*audience))
            }
            (ClientMessage::Click { .. }, ElementId::Variable { key, part: Part::Toggle }) => {
                Ok(Event::ToggleVariable(key.clone()))
            }
            (ClientMessage::Change { value, .. }, ElementId::NotAudienceA) => value
                .as_bool()
                .map(Event::SetNotAudienceA)
                .ok_or_else(|| bad_payload("a boolean")),
            (ClientMessage::Change { value, .. }, ElementId::Variable { key, part: Part::Preset }) => {
                value
                    .as_str()
                    .map(|preset| Event::ChoosePreset {
                        key: key.clone(),
                        preset: preset.to_string(),
                    })
                    .ok_or_else(|| bad_payload("a preset name"))
            }
            (ClientMessage::Change { value, .. }, ElementId::Variable { key, part: Part::Control }) => {
                match key.kind {
                    VariableKind::Discrete => parse_values(value)
                        .map(|values| Event::SetValues {
                            key: key.clone(),
                            values,
                        })
                        .ok_or_else(|| bad_payload("an array of strings")),
                    VariableKind::Continuous => parse_range(value)
                        .map(|range| Event::SetRange {
                            key: key.clone(),
                            range,
                        })
                        .ok_or_else(|| bad_payload("a [low, high] pair of numbers")),
                }
            }
            _ => Err(ViewError::NotInteractive(id.clone())),
        }
    }

    /// Every element of the page, for the `init` message.
    pub fn elements(&self, menu: &FilterMenu) -> Vec<UiElement> {
        self.order
            .iter()
            .filter_map(|target| self.render(menu, target))
            .collect()
    }

    /// Elements touched by a batch of updates, each rendered once in first-touched order.
    pub fn render_updates(&self, menu: &FilterMenu, updates: &[Update]) -> Vec<UiElement> {
        let mut touched: Vec<ElementId> = Vec::with_capacity(updates.len());
        for target in updates.iter().map(ElementId::for_update) {
            if !touched.contains(&target) {
                touched.push(target);
            }
        }
        touched
            .iter()
            .filter_map(|target| self.render(menu, target))
            .collect()
    }

    /// Current state of one element.
    pub fn render(&self, menu: &FilterMenu, target: &ElementId) -> Option<UiElement> {
        let id = self.id(target);
        let element = match target {
            ElementId::PanelButton(audience) => UiElement::Button {
                id,
                text: audience.label().to_string(),
                disabled: menu.panel(*audience).open_disabled,
            },
            ElementId::Panel(audience) => UiElement::Collapse {
                id,
                open: menu.panel(*audience).open,
            },
            ElementId::NotAudienceA => UiElement::Checkbox {
                id,
                label: "Not Audience A".to_string(),
                checked: menu.not_audience_a(),
            },
            ElementId::Variable { key, part } => {
                let state = menu.variable(key)?;
                let variable = menu.catalog().get(&key.variable)?;
                match part {
                    Part::Toggle => UiElement::Button {
                        id,
                        text: key.variable.clone(),
                        disabled: false,
                    },
                    Part::Collapse => UiElement::Collapse {
                        id,
                        open: state.open,
                    },
                    Part::Preset => UiElement::RadioGroup {
                        id,
                        options: preset_names(variable),
                        value: state.selector.preset().map(str::to_string),
                    },
                    Part::Control => render_control(id, variable, &state.selector)?,
                    Part::Name => UiElement::Text {
                        id,
                        text: format!("{}:", key.variable),
                        class: Some(audience_class(key.audience).to_string()),
                    },
                    Part::Summary => UiElement::Text {
                        id,
                        text: state.summary.clone(),
                        class: (state.summary != ALL_PRESET).then(|| HIGHLIGHT_CLASS.to_string()),
                    },
                }
            }
        };
        Some(element)
    }

    /// HTML body laying out both audience cards.
    pub fn layout_html(&self, catalog: &Catalog) -> String {
        let mut html = String::from("<div class=\"filter-menus\">\n");
        for audience in Audience::BOTH {
            let keys: Vec<SelectorKey> = catalog
                .variables()
                .iter()
                .map(|v| SelectorKey::new(audience, v.kind(), v.name()))
                .collect();
            let var_id = |key: &SelectorKey, part| {
                self.id(&ElementId::Variable {
                    key: key.clone(),
                    part,
                })
            };
            let control_tag = |key: &SelectorKey| match key.kind {
                VariableKind::Discrete => "ui-multi-select",
                VariableKind::Continuous => "ui-range-slider",
            };

            let _ = writeln!(html, "  <section class=\"card {}\">", audience_class(audience));
            let _ = writeln!(html, "    <header class=\"card-header\">");
            let _ = writeln!(
                html,
                "      <ui-button id=\"{}\"></ui-button>",
                self.id(&ElementId::PanelButton(audience))
            );
            if audience == Audience::B {
                let _ = writeln!(
                    html,
                    "      <ui-checkbox id=\"{}\"></ui-checkbox>",
                    self.id(&ElementId::NotAudienceA)
                );
            }
            let _ = writeln!(html, "    </header>");
            let _ = writeln!(
                html,
                "    <ui-collapse id=\"{}\" class=\"card-body\">",
                self.id(&ElementId::Panel(audience))
            );
            for key in &keys {
                let tag = control_tag(key);
                let _ = writeln!(html, "      <div class=\"filter\">");
                let _ = writeln!(
                    html,
                    "        <ui-button id=\"{}\" class=\"link\"></ui-button>",
                    var_id(key, Part::Toggle)
                );
                let _ = writeln!(
                    html,
                    "        <ui-collapse id=\"{}\">",
                    var_id(key, Part::Collapse)
                );
                let _ = writeln!(
                    html,
                    "          <ui-radio-group id=\"{}\"></ui-radio-group>",
                    var_id(key, Part::Preset)
                );
                let _ = writeln!(
                    html,
                    "          <{tag} id=\"{}\"></{tag}>",
                    var_id(key, Part::Control)
                );
                let _ = writeln!(html, "        </ui-collapse>");
                let _ = writeln!(html, "      </div>");
            }
            let _ = writeln!(html, "    </ui-collapse>");
            let _ = writeln!(html, "    <footer class=\"card-footer\">");
            for key in &keys {
                let _ = writeln!(
                    html,
                    "      <span class=\"summary-line\"><ui-text id=\"{}\"></ui-text> <ui-text id=\"{}\"></ui-text></span>",
                    var_id(key, Part::Name),
                    var_id(key, Part::Summary)
                );
            }
            let _ = writeln!(html, "    </footer>");
            let _ = writeln!(html, "  </section>");
        }
        html.push_str("</div>\n");
        html
    }
}

fn audience_class(audience: Audience) -> &'static str {
    match audience {
        Audience::A => "text-primary",
        Audience::B => "text-secondary",
    }
}

fn preset_names(variable: &Variable) -> Vec<String> {
    let names = match variable {
        Variable::Discrete(v) => v.presets.names(),
        Variable::Continuous(v) => v.presets.names(),
    };
    names.into_iter().map(str::to_string).collect()
}

fn render_control(id: String, variable: &Variable, selector: &SelectorState) -> Option<UiElement> {
    match (variable, selector) {
        (Variable::Discrete(_), SelectorState::Discrete { selector, options }) => {
            Some(UiElement::MultiSelect {
                id,
                options: options.as_slice().to_vec(),
                value: selector.value().as_slice().to_vec(),
            })
        }
        (Variable::Continuous(v), SelectorState::Continuous { selector }) => {
            let bounds = v.bounds();
            let value = *selector.value();
            Some(UiElement::RangeSlider {
                id,
                min: bounds.min,
                max: bounds.max,
                step: v.step(),
                value: value.into(),
                marks: [bounds.min, bounds.max]
                    .into_iter()
                    .map(|value| Mark {
                        value,
                        label: v.mark_label(value),
                    })
                    .collect(),
            })
        }
        _ => None,
    }
}

fn parse_values(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

fn parse_range(value: &Value) -> Option<Range> {
    let [low, high] = value.as_array()?.as_slice() else {
        return None;
    };
    let low = low.as_f64()?.round() as i64;
    let high = high.as_f64()?.round() as i64;
    Some(Range::new(low, high))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn setup() -> (View, FilterMenu) {
        let catalog = Arc::new(Catalog::demo());
        (View::new(&catalog), FilterMenu::new(catalog))
    }

    fn change(id: &str, value: Value) -> ClientMessage {
        ClientMessage::Change {
            id: id.to_string(),
            value,
        }
    }

    fn market_a() -> SelectorKey {
        SelectorKey::new(Audience::A, VariableKind::Discrete, "Market")
    }

    #[test]
    fn test_ids_are_derived_from_keys() {
        let (view, _) = setup();
        assert_eq!(view.id(&ElementId::PanelButton(Audience::A)), "A-open");
        assert_eq!(view.id(&ElementId::Panel(Audience::B)), "B-panel");
        assert_eq!(view.id(&ElementId::NotAudienceA), "B-not-a");
        assert_eq!(
            view.id(&ElementId::Variable { key: market_a(), part: Part::Control }),
            "A-D-0-values"
        );
        let age_b = SelectorKey::new(Audience::B, VariableKind::Continuous, "Age");
        assert_eq!(
            view.id(&ElementId::Variable { key: age_b.clone(), part: Part::Control }),
            "B-R-1-range"
        );
        assert_eq!(
            view.lookup("B-R-1-summary"),
            Some(&ElementId::Variable { key: age_b, part: Part::Summary })
        );
    }

    #[test]
    fn test_messages_route_to_events() {
        let (view, _) = setup();
        let click = ClientMessage::Click { id: "B-open".to_string() };
        assert_eq!(view.event_for(&click), Ok(Event::TogglePanel(Audience::B)));

        let click = ClientMessage::Click { id: "A-D-0-toggle".to_string() };
        assert_eq!(view.event_for(&click), Ok(Event::ToggleVariable(market_a())));

        assert_eq!(
            view.event_for(&change("A-D-0-preset", json!("Europe"))),
            Ok(Event::ChoosePreset { key: market_a(), preset: "Europe".to_string() })
        );
        assert_eq!(
            view.event_for(&change("A-D-0-values", json!(["Germany", "UK"]))),
            Ok(Event::SetValues {
                key: market_a(),
                values: vec!["Germany".to_string(), "UK".to_string()],
            })
        );
        assert_eq!(
            view.event_for(&change("A-R-1-range", json!([2.0, 24.6]))),
            Ok(Event::SetRange {
                key: SelectorKey::new(Audience::A, VariableKind::Continuous, "Age"),
                range: Range::new(2, 25),
            })
        );
        assert_eq!(
            view.event_for(&change("B-not-a", json!(true))),
            Ok(Event::SetNotAudienceA(true))
        );
    }

    #[test]
    fn test_bad_messages_are_rejected() {
        let (view, _) = setup();
        assert_eq!(
            view.event_for(&ClientMessage::Click { id: "nope".to_string() }),
            Err(ViewError::UnknownElement("nope".to_string()))
        );
        assert_eq!(
            view.event_for(&ClientMessage::Click { id: "A-D-0-summary".to_string() }),
            Err(ViewError::NotInteractive("A-D-0-summary".to_string()))
        );
        assert!(matches!(
            view.event_for(&change("A-R-1-range", json!([1, 2, 3]))),
            Err(ViewError::BadPayload { .. })
        ));
        assert!(matches!(
            view.event_for(&change("A-D-0-values", json!(["UK", 3]))),
            Err(ViewError::BadPayload { .. })
        ));
        assert!(matches!(
            view.event_for(&change("B-not-a", json!("yes"))),
            Err(ViewError::BadPayload { .. })
        ));
    }

    #[test]
    fn test_initial_elements() {
        let (view, menu) = setup();
        let elements = view.elements(&menu);
        // Two panel buttons, two panels, the checkbox, six parts per variable per audience.
        assert_eq!(elements.len(), 5 + 2 * 2 * 6);

        let slider = elements.iter().find(|e| e.id() == "A-R-1-range").unwrap();
        assert_eq!(
            slider,
            &UiElement::RangeSlider {
                id: "A-R-1-range".to_string(),
                min: 1,
                max: 100,
                step: 1,
                value: [1, 100],
                marks: vec![
                    Mark { value: 1, label: "1".to_string() },
                    Mark { value: 100, label: "100".to_string() },
                ],
            }
        );

        let radio = elements.iter().find(|e| e.id() == "B-D-0-preset").unwrap();
        assert_eq!(
            radio,
            &UiElement::RadioGroup {
                id: "B-D-0-preset".to_string(),
                options: ["All", "Europe", "North America", "Asia"].map(String::from).to_vec(),
                value: Some("All".to_string()),
            }
        );

        let summary = elements.iter().find(|e| e.id() == "A-D-0-summary").unwrap();
        assert_eq!(
            summary,
            &UiElement::Text {
                id: "A-D-0-summary".to_string(),
                text: "All".to_string(),
                class: None,
            }
        );
    }

    #[test]
    fn test_updates_render_each_element_once() {
        let (view, mut menu) = setup();
        let updates = menu
            .handle(Event::ChoosePreset { key: market_a(), preset: "Asia".to_string() })
            .unwrap();
        let elements = view.render_updates(&menu, &updates);
        let ids: Vec<&str> = elements.iter().map(UiElement::id).collect();
        assert_eq!(ids, ["A-D-0-values", "A-D-0-preset", "A-D-0-summary"]);
        assert_eq!(
            elements[0],
            UiElement::MultiSelect {
                id: "A-D-0-values".to_string(),
                options: vec!["India".to_string(), "China".to_string()],
                value: vec!["India".to_string(), "China".to_string()],
            }
        );
        assert_eq!(
            elements[2],
            UiElement::Text {
                id: "A-D-0-summary".to_string(),
                text: "Asia".to_string(),
                class: Some("text-info".to_string()),
            }
        );
    }

    #[test]
    fn test_mirror_renders_disabled_button() {
        let (view, mut menu) = setup();
        let updates = menu.handle(Event::SetNotAudienceA(true)).unwrap();
        let elements = view.render_updates(&menu, &updates);
        assert!(elements.contains(&UiElement::Button {
            id: "B-open".to_string(),
            text: "Audience B".to_string(),
            disabled: true,
        }));
        assert!(elements.contains(&UiElement::Text {
            id: "B-D-0-summary".to_string(),
            text: "NOT All".to_string(),
            class: Some("text-info".to_string()),
        }));
    }

    #[test]
    fn test_layout_mentions_every_element() {
        let catalog = Catalog::demo();
        let view = View::new(&catalog);
        let html = view.layout_html(&catalog);
        for id in view.routes.keys() {
            assert!(html.contains(&format!("id=\"{id}\"")), "layout is missing {id}");
        }
        assert!(html.contains("<ui-range-slider id=\"A-R-1-range\">"));
        assert!(html.contains("<ui-multi-select id=\"B-D-0-values\">"));
    }
}
