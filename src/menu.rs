//! The two-audience filter menu of one session.
//!
//! [`FilterMenu`] owns every selector of both audiences, keyed by
//! [`SelectorKey`], plus the panel gates and the "Not Audience A" flag. Each
//! [`Event`] is applied synchronously and answered with the list of
//! [`Update`]s the UI has to render.

use crate::presets::{Catalog, Range, ValueSet, Variable, VariableKind};
use crate::selection::{SelectionError, Selector};
use crate::summary::{negate, summarize};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, sync::Arc};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Audience {
    A,
    B,
}

impl Audience {
    pub const BOTH: [Audience; 2] = [Audience::A, Audience::B];

    pub fn label(self) -> &'static str {
        match self {
            Audience::A => "Audience A",
            Audience::B => "Audience B",
        }
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Audience::A => f.write_str("A"),
            Audience::B => f.write_str("B"),
        }
    }
}

/// Identifies one selector: which audience, which kind of control, which variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectorKey {
    pub audience: Audience,
    pub kind: VariableKind,
    pub variable: String,
}

impl SelectorKey {
    pub fn new(audience: Audience, kind: VariableKind, variable: impl Into<String>) -> Self {
        Self {
            audience,
            kind,
            variable: variable.into(),
        }
    }

    /// The same variable in the other audience.
    pub fn with_audience(&self, audience: Audience) -> Self {
        Self {
            audience,
            ..self.clone()
        }
    }
}

impl fmt::Display for SelectorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.audience, self.kind.code(), self.variable)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MenuError {
    #[error("no selector {0}")]
    UnknownSelector(SelectorKey),
    #[error("selector {0} does not take that kind of value")]
    KindMismatch(SelectorKey),
    #[error("selector {key}: {source}")]
    Selection {
        key: SelectorKey,
        #[source]
        source: SelectionError,
    },
}

/// Something the user did.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Header button of an audience panel.
    TogglePanel(Audience),
    /// Button carrying a variable's name inside a panel.
    ToggleVariable(SelectorKey),
    ChoosePreset { key: SelectorKey, preset: String },
    SetValues { key: SelectorKey, values: Vec<String> },
    SetRange { key: SelectorKey, range: Range },
    /// The "Not Audience A" checkbox in Audience B's header.
    SetNotAudienceA(bool),
}

/// One on-screen element whose state changed.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    PanelOpen { audience: Audience, open: bool },
    PanelButtonDisabled { audience: Audience, disabled: bool },
    NotAudienceA(bool),
    VariableOpen { key: SelectorKey, open: bool },
    Preset { key: SelectorKey, preset: Option<String> },
    Values { key: SelectorKey, values: ValueSet },
    Options { key: SelectorKey, options: ValueSet },
    Range { key: SelectorKey, range: Range },
    Summary { key: SelectorKey, text: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectorState {
    Discrete {
        selector: Selector<ValueSet>,
        options: ValueSet,
    },
    Continuous {
        selector: Selector<Range>,
    },
}

impl SelectorState {
    pub fn preset(&self) -> Option<&str> {
        match self {
            SelectorState::Discrete { selector, .. } => selector.preset(),
            SelectorState::Continuous { selector } => selector.preset(),
        }
    }
}

/// Everything shown for one variable of one audience.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableState {
    pub selector: SelectorState,
    pub open: bool,
    pub summary: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanelState {
    pub open: bool,
    pub open_disabled: bool,
}

/// Per-session filter state for both audiences.
#[derive(Debug, Clone)]
pub struct FilterMenu {
    catalog: Arc<Catalog>,
    variables: HashMap<SelectorKey, VariableState>,
    panels: HashMap<Audience, PanelState>,
    not_audience_a: bool,
}

impl FilterMenu {
    /// Mounts the menu with every selector on the `"All"` preset and all panels closed.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let mut variables = HashMap::new();
        for audience in Audience::BOTH {
            for variable in catalog.variables() {
                let key = SelectorKey::new(audience, variable.kind(), variable.name());
                let (selector, summary) = match variable {
                    Variable::Discrete(v) => {
                        let selector = Selector::new(&v.presets);
                        let summary = summarize(Some(selector.value()), &v.presets);
                        let options = v.universe().clone();
                        (SelectorState::Discrete { selector, options }, summary)
                    }
                    Variable::Continuous(v) => {
                        let selector = Selector::new(&v.presets);
                        let summary = summarize(Some(selector.value()), &v.presets);
                        (SelectorState::Continuous { selector }, summary)
                    }
                };
                variables.insert(
                    key,
                    VariableState {
                        selector,
                        open: false,
                        summary,
                    },
                );
            }
        }

        let panels = Audience::BOTH
            .into_iter()
            .map(|audience| (audience, PanelState::default()))
            .collect();

        Self {
            catalog,
            variables,
            panels,
            not_audience_a: false,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn not_audience_a(&self) -> bool {
        self.not_audience_a
    }

    pub fn panel(&self, audience: Audience) -> PanelState {
        self.panels.get(&audience).copied().unwrap_or_default()
    }

    pub fn variable(&self, key: &SelectorKey) -> Option<&VariableState> {
        self.variables.get(key)
    }

    /// Keys of one audience, in catalog order.
    pub fn keys(&self, audience: Audience) -> Vec<SelectorKey> {
        self.catalog
            .variables()
            .iter()
            .map(|v| SelectorKey::new(audience, v.kind(), v.name()))
            .collect()
    }

    /// Applies one event and returns the elements it changed.
    pub fn handle(&mut self, event: Event) -> Result<Vec<Update>, MenuError> {
        debug!(?event, "applying event");
        match event {
            Event::TogglePanel(audience) => Ok(self.toggle_panel(audience)),
            Event::ToggleVariable(key) => self.toggle_variable(key),
            Event::ChoosePreset { key, preset } => self.choose_preset(key, &preset),
            Event::SetValues { key, values } => self.set_values(key, values),
            Event::SetRange { key, range } => self.set_range(key, range),
            Event::SetNotAudienceA(checked) => Ok(self.set_not_audience_a(checked)),
        }
    }

    /// Updates that re-send a selector's controls as they currently stand.
    ///
    /// Used to pull the browser back in line after a rejected event.
    pub fn refresh(&self, key: &SelectorKey) -> Vec<Update> {
        let Some(state) = self.variables.get(key) else {
            return Vec::new();
        };
        let mut updates = vec![Update::Preset {
            key: key.clone(),
            preset: state.selector.preset().map(str::to_string),
        }];
        match &state.selector {
            SelectorState::Discrete { selector, options } => {
                updates.push(Update::Options {
                    key: key.clone(),
                    options: options.clone(),
                });
                updates.push(Update::Values {
                    key: key.clone(),
                    values: selector.value().clone(),
                });
            }
            SelectorState::Continuous { selector } => updates.push(Update::Range {
                key: key.clone(),
                range: *selector.value(),
            }),
        }
        updates
    }

    fn toggle_panel(&mut self, audience: Audience) -> Vec<Update> {
        let panel = self.panels.entry(audience).or_default();
        if panel.open_disabled {
            debug!(%audience, "panel button is disabled, ignoring click");
            return Vec::new();
        }
        panel.open = !panel.open;
        vec![Update::PanelOpen {
            audience,
            open: panel.open,
        }]
    }

    fn toggle_variable(&mut self, key: SelectorKey) -> Result<Vec<Update>, MenuError> {
        let state = self
            .variables
            .get_mut(&key)
            .ok_or_else(|| MenuError::UnknownSelector(key.clone()))?;
        state.open = !state.open;
        let open = state.open;
        Ok(vec![Update::VariableOpen { key, open }])
    }

    fn choose_preset(&mut self, key: SelectorKey, preset: &str) -> Result<Vec<Update>, MenuError> {
        let catalog = Arc::clone(&self.catalog);
        let variable = catalog
            .get(&key.variable)
            .ok_or_else(|| MenuError::UnknownSelector(key.clone()))?;
        let state = self
            .variables
            .get_mut(&key)
            .ok_or_else(|| MenuError::UnknownSelector(key.clone()))?;
        let selection_error = |source| MenuError::Selection {
            key: key.clone(),
            source,
        };

        let mut updates = Vec::new();
        match (variable, &mut state.selector) {
            (Variable::Discrete(v), SelectorState::Discrete { selector, options }) => {
                let values = selector
                    .choose_preset(&v.presets, preset)
                    .map_err(selection_error)?
                    .clone();
                *options = values.clone();
                updates.push(Update::Values {
                    key: key.clone(),
                    values: values.clone(),
                });
                updates.push(Update::Options {
                    key: key.clone(),
                    options: values,
                });
            }
            (Variable::Continuous(v), SelectorState::Continuous { selector }) => {
                let range = *selector
                    .choose_preset(&v.presets, preset)
                    .map_err(selection_error)?;
                updates.push(Update::Range {
                    key: key.clone(),
                    range,
                });
            }
            _ => return Err(MenuError::KindMismatch(key)),
        }
        updates.push(Update::Preset {
            key: key.clone(),
            preset: Some(preset.to_string()),
        });
        updates.extend(self.recompute_summary(&key));
        Ok(updates)
    }

    fn set_values(&mut self, key: SelectorKey, values: Vec<String>) -> Result<Vec<Update>, MenuError> {
        let catalog = Arc::clone(&self.catalog);
        let Some(Variable::Discrete(variable)) = catalog.get(&key.variable) else {
            return Err(self.lookup_error(key));
        };
        let Some(VariableState {
            selector: SelectorState::Discrete { selector, .. },
            ..
        }) = self.variables.get_mut(&key)
        else {
            return Err(self.lookup_error(key));
        };

        let submitted = values.len();
        let values = variable
            .normalize(values)
            .map_err(|source| MenuError::Selection {
                key: key.clone(),
                source,
            })?;
        let deduplicated = values.len() != submitted;

        let preset = selector
            .set_value(&variable.presets, values.clone())
            .map(str::to_string);

        let mut updates = Vec::new();
        if deduplicated {
            updates.push(Update::Values {
                key: key.clone(),
                values,
            });
        }
        updates.push(Update::Preset {
            key: key.clone(),
            preset,
        });
        updates.extend(self.recompute_summary(&key));
        Ok(updates)
    }

    fn set_range(&mut self, key: SelectorKey, range: Range) -> Result<Vec<Update>, MenuError> {
        let catalog = Arc::clone(&self.catalog);
        let Some(Variable::Continuous(variable)) = catalog.get(&key.variable) else {
            return Err(self.lookup_error(key));
        };
        let Some(VariableState {
            selector: SelectorState::Continuous { selector },
            ..
        }) = self.variables.get_mut(&key)
        else {
            return Err(self.lookup_error(key));
        };

        let clamped = variable.clamp(range).map_err(|source| MenuError::Selection {
            key: key.clone(),
            source,
        })?;
        let preset = selector
            .set_value(&variable.presets, clamped)
            .map(str::to_string);

        let mut updates = Vec::new();
        if clamped != range {
            updates.push(Update::Range {
                key: key.clone(),
                range: clamped,
            });
        }
        updates.push(Update::Preset {
            key: key.clone(),
            preset,
        });
        updates.extend(self.recompute_summary(&key));
        Ok(updates)
    }

    fn set_not_audience_a(&mut self, checked: bool) -> Vec<Update> {
        self.not_audience_a = checked;
        let panel = self.panels.entry(Audience::B).or_default();
        panel.open = false;
        panel.open_disabled = checked;

        let mut updates = vec![
            Update::NotAudienceA(checked),
            Update::PanelOpen {
                audience: Audience::B,
                open: false,
            },
            Update::PanelButtonDisabled {
                audience: Audience::B,
                disabled: checked,
            },
        ];
        for key in self.keys(Audience::B) {
            let text = if checked {
                let mirrored = key.with_audience(Audience::A);
                self.variables
                    .get(&mirrored)
                    .map(|state| negate(&state.summary))
            } else {
                self.own_summary(&key)
            };
            if let Some(text) = text {
                updates.extend(self.set_summary(&key, text));
            }
        }
        updates
    }

    /// Re-derives a selector's summary and applies the cross-audience rule.
    fn recompute_summary(&mut self, key: &SelectorKey) -> Vec<Update> {
        let Some(text) = self.own_summary(key) else {
            return Vec::new();
        };
        match key.audience {
            Audience::A => {
                let negated = negate(&text);
                let mut updates = self.set_summary(key, text);
                if self.not_audience_a {
                    let mirrored = key.with_audience(Audience::B);
                    updates.extend(self.set_summary(&mirrored, negated));
                }
                updates
            }
            Audience::B if self.not_audience_a => {
                debug!(%key, "audience B mirrors audience A, keeping its summary");
                Vec::new()
            }
            Audience::B => self.set_summary(key, text),
        }
    }

    /// Summary derived from the selector's own value, ignoring mirroring.
    fn own_summary(&self, key: &SelectorKey) -> Option<String> {
        let state = self.variables.get(key)?;
        let summary = match (self.catalog.get(&key.variable)?, &state.selector) {
            (Variable::Discrete(v), SelectorState::Discrete { selector, .. }) => {
                summarize(Some(selector.value()), &v.presets)
            }
            (Variable::Continuous(v), SelectorState::Continuous { selector }) => {
                summarize(Some(selector.value()), &v.presets)
            }
            _ => return None,
        };
        Some(summary)
    }

    fn set_summary(&mut self, key: &SelectorKey, text: String) -> Vec<Update> {
        match self.variables.get_mut(key) {
            Some(state) => {
                state.summary = text.clone();
                vec![Update::Summary {
                    key: key.clone(),
                    text,
                }]
            }
            None => Vec::new(),
        }
    }

    fn lookup_error(&self, key: SelectorKey) -> MenuError {
        if self.variables.contains_key(&key) {
            MenuError::KindMismatch(key)
        } else {
            MenuError::UnknownSelector(key)
        }
    }
}
