//! Preset mappings and the variable catalog.
//!
//! A [`Catalog`] is loaded once from a JSON blob of the form
//!
//! ```json
//! {
//!     "Market": { "All": ["UK", "Germany"], "Europe": ["UK", "Germany"] },
//!     "Age":    { "All": [1, 100], "Bottom 25%": [1, 25] }
//! }
//! ```
//!
//! Arrays of strings make a discrete variable, arrays of two integers a
//! continuous one. Key order is kept, so the first matching preset wins when a
//! value is resolved back to a name.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{fmt, path::Path};
use thiserror::Error;

/// Name of the reserved, unconstrained preset every variable must define.
pub const ALL_PRESET: &str = "All";

/// Global max above which a range slider moves in steps of 1000.
const COARSE_STEP_THRESHOLD: i64 = 100_000;

/// Errors raised while loading a preset blob. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading presets: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing presets: {0}")]
    Json(#[from] serde_json::Error),
    #[error("preset blob must be a JSON object of variables")]
    NotAnObject,
    #[error("preset blob defines no variables")]
    NoVariables,
    #[error("variable '{variable}' must map preset names to values")]
    NotAMapping { variable: String },
    #[error("variable '{variable}' does not define the 'All' preset")]
    MissingAll { variable: String },
    #[error("variable '{variable}', preset '{preset}': {reason}")]
    InvalidValue {
        variable: String,
        preset: String,
        reason: String,
    },
    #[error("variable '{variable}' mixes discrete and continuous presets")]
    MixedKinds { variable: String },
    #[error("variable '{variable}', preset '{preset}': min {min} is greater than max {max}")]
    InvertedRange {
        variable: String,
        preset: String,
        min: i64,
        max: i64,
    },
    #[error("variable '{variable}', preset '{preset}' lies outside the 'All' range")]
    OutOfBounds { variable: String, preset: String },
    #[error("variable '{variable}', preset '{preset}' uses '{value}' which 'All' does not contain")]
    UnknownValue {
        variable: String,
        preset: String,
        value: String,
    },
}

/// Whether a variable is filtered by a set of values or by a numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableKind {
    Discrete,
    Continuous,
}

impl VariableKind {
    /// Short code used in element ids (`D` for dropdown, `R` for range slider).
    pub fn code(self) -> &'static str {
        match self {
            VariableKind::Discrete => "D",
            VariableKind::Continuous => "R",
        }
    }
}

/// A value a preset can stand for.
pub trait PresetValue: Clone + fmt::Debug + PartialEq {
    /// Match rule used to resolve a value back to a preset name.
    fn matches(&self, other: &Self) -> bool;

    /// True when the value constrains nothing worth describing.
    fn is_empty(&self) -> bool;

    /// Human-readable rendering used when no preset matches.
    fn describe(&self) -> String;
}

/// Selected values of a discrete variable, in the order they were supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueSet(Vec<String>);

impl ValueSet {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(values.into_iter().map(Into::into).collect())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, value: &str) -> bool {
        self.0.iter().any(|v| v == value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    fn sorted(&self) -> Vec<&str> {
        let mut sorted: Vec<&str> = self.0.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        sorted
    }
}

impl PresetValue for ValueSet {
    fn matches(&self, other: &Self) -> bool {
        self.sorted() == other.sorted()
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn describe(&self) -> String {
        self.0.join(", ")
    }
}

/// Inclusive `[min, max]` pair of a continuous variable.
///
/// Serialized as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i64; 2]", into = "[i64; 2]")]
pub struct Range {
    pub min: i64,
    pub max: i64,
}

impl Range {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    pub fn is_inverted(&self) -> bool {
        self.min > self.max
    }

    pub fn contains(&self, other: &Range) -> bool {
        self.min <= other.min && other.max <= self.max
    }

    /// Clamps both bounds into `bounds`.
    pub fn clamp_to(&self, bounds: &Range) -> Range {
        Range {
            min: self.min.clamp(bounds.min, bounds.max),
            max: self.max.clamp(bounds.min, bounds.max),
        }
    }
}

impl From<[i64; 2]> for Range {
    fn from([min, max]: [i64; 2]) -> Self {
        Self { min, max }
    }
}

impl From<Range> for [i64; 2] {
    fn from(range: Range) -> Self {
        [range.min, range.max]
    }
}

impl PresetValue for Range {
    fn matches(&self, other: &Self) -> bool {
        self == other
    }

    fn is_empty(&self) -> bool {
        false
    }

    fn describe(&self) -> String {
        format!(
            "{} - {}",
            crate::summary::thousands(self.min),
            crate::summary::thousands(self.max)
        )
    }
}

/// Ordered preset name to value mapping for one variable.
///
/// Always holds an [`ALL_PRESET`] entry.
#[derive(Debug, Clone, PartialEq)]
pub struct PresetMapping<V> {
    entries: Vec<(String, V)>,
    all: usize,
}

impl<V: PresetValue> PresetMapping<V> {
    /// Builds a mapping, refusing one without an `"All"` entry.
    pub fn new(variable: &str, entries: Vec<(String, V)>) -> Result<Self, ConfigError> {
        let all = entries
            .iter()
            .position(|(name, _)| name == ALL_PRESET)
            .ok_or_else(|| ConfigError::MissingAll {
                variable: variable.to_string(),
            })?;
        Ok(Self { entries, all })
    }

    pub fn get(&self, name: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, value)| value)
    }

    /// The unconstrained value.
    pub fn all(&self) -> &V {
        &self.entries[self.all].1
    }

    /// First preset, in blob order, whose value matches `value`.
    pub fn resolve(&self, value: &V) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, candidate)| candidate.matches(value))
            .map(|(name, _)| name.as_str())
    }

    /// Preset names with `"All"` first, the rest in blob order.
    pub fn names(&self) -> Vec<&str> {
        std::iter::once(ALL_PRESET)
            .chain(
                self.entries
                    .iter()
                    .map(|(name, _)| name.as_str())
                    .filter(|name| *name != ALL_PRESET),
            )
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// A discrete variable: its value universe is the `"All"` set.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteVariable {
    pub name: String,
    pub presets: PresetMapping<ValueSet>,
}

impl DiscreteVariable {
    pub fn universe(&self) -> &ValueSet {
        self.presets.all()
    }
}

/// A continuous variable: its global range is the `"All"` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuousVariable {
    pub name: String,
    pub presets: PresetMapping<Range>,
}

impl ContinuousVariable {
    pub fn bounds(&self) -> Range {
        *self.presets.all()
    }

    pub fn step(&self) -> i64 {
        if self.bounds().max > COARSE_STEP_THRESHOLD {
            1000
        } else {
            1
        }
    }

    /// Label drawn under a slider end, with a `$` for income-style variables.
    pub fn mark_label(&self, value: i64) -> String {
        if self.name.starts_with(['I', 'i']) {
            format!("${}", crate::summary::thousands(value))
        } else {
            value.to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Variable {
    Discrete(DiscreteVariable),
    Continuous(ContinuousVariable),
}

impl Variable {
    pub fn name(&self) -> &str {
        match self {
            Variable::Discrete(v) => &v.name,
            Variable::Continuous(v) => &v.name,
        }
    }

    pub fn kind(&self) -> VariableKind {
        match self {
            Variable::Discrete(_) => VariableKind::Discrete,
            Variable::Continuous(_) => VariableKind::Continuous,
        }
    }
}

/// Every filterable variable, in blob order.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    variables: Vec<Variable>,
}

impl Catalog {
    /// The bundled demo presets (`Market` and `Age`).
    pub fn demo() -> Self {
        Self::from_json(include_str!("../presets/demo.json"))
            .unwrap_or_else(|e| panic!("bundled demo presets are invalid: {e}"))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let root: Value = serde_json::from_str(text)?;
        Self::from_value(root)
    }

    pub fn from_value(root: Value) -> Result<Self, ConfigError> {
        let Value::Object(root) = root else {
            return Err(ConfigError::NotAnObject);
        };
        if root.is_empty() {
            return Err(ConfigError::NoVariables);
        }
        let variables = root
            .into_iter()
            .map(|(name, presets)| parse_variable(name, presets))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { variables })
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name() == name)
    }

    /// Position of a variable, used as its stable index in element ids.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|v| v.name() == name)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

enum ParsedValue {
    Discrete(ValueSet),
    Continuous(Range),
}

fn parse_variable(name: String, presets: Value) -> Result<Variable, ConfigError> {
    let Value::Object(presets) = presets else {
        return Err(ConfigError::NotAMapping { variable: name });
    };

    let kind = match presets.get(ALL_PRESET) {
        Some(all) => parse_value(&name, ALL_PRESET, all)?,
        None => return Err(ConfigError::MissingAll { variable: name }),
    };

    match kind {
        ParsedValue::Discrete(_) => parse_discrete(name, presets).map(Variable::Discrete),
        ParsedValue::Continuous(_) => parse_continuous(name, presets).map(Variable::Continuous),
    }
}

fn parse_discrete(
    name: String,
    presets: Map<String, Value>,
) -> Result<DiscreteVariable, ConfigError> {
    let mut entries = Vec::with_capacity(presets.len());
    for (preset, value) in &presets {
        match parse_value(&name, preset, value)? {
            ParsedValue::Discrete(values) => entries.push((preset.clone(), values)),
            ParsedValue::Continuous(_) => return Err(ConfigError::MixedKinds { variable: name }),
        }
    }
    let presets = PresetMapping::new(&name, entries)?;

    let universe = presets.all();
    for (preset, values) in presets.iter() {
        if let Some(unknown) = values.iter().find(|v| !universe.contains(v)) {
            return Err(ConfigError::UnknownValue {
                variable: name.clone(),
                preset: preset.to_string(),
                value: unknown.clone(),
            });
        }
    }
    Ok(DiscreteVariable { name, presets })
}

fn parse_continuous(
    name: String,
    presets: Map<String, Value>,
) -> Result<ContinuousVariable, ConfigError> {
    let mut entries = Vec::with_capacity(presets.len());
    for (preset, value) in &presets {
        match parse_value(&name, preset, value)? {
            ParsedValue::Continuous(range) => {
                if range.is_inverted() {
                    return Err(ConfigError::InvertedRange {
                        variable: name,
                        preset: preset.clone(),
                        min: range.min,
                        max: range.max,
                    });
                }
                entries.push((preset.clone(), range));
            }
            ParsedValue::Discrete(_) => return Err(ConfigError::MixedKinds { variable: name }),
        }
    }
    let presets = PresetMapping::new(&name, entries)?;

    let bounds = *presets.all();
    if let Some((preset, _)) = presets.iter().find(|(_, range)| !bounds.contains(range)) {
        return Err(ConfigError::OutOfBounds {
            variable: name.clone(),
            preset: preset.to_string(),
        });
    }
    Ok(ContinuousVariable { name, presets })
}

fn parse_value(variable: &str, preset: &str, value: &Value) -> Result<ParsedValue, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidValue {
        variable: variable.to_string(),
        preset: preset.to_string(),
        reason: reason.to_string(),
    };

    let Value::Array(items) = value else {
        return Err(invalid("expected an array"));
    };

    if items.iter().all(Value::is_string) {
        let values = items.iter().filter_map(Value::as_str);
        return Ok(ParsedValue::Discrete(ValueSet::new(values)));
    }

    if items.iter().all(Value::is_number) {
        let [min, max] = items.as_slice() else {
            return Err(invalid("a numeric preset needs exactly two bounds"));
        };
        let (Some(min), Some(max)) = (min.as_i64(), max.as_i64()) else {
            return Err(invalid("range bounds must be integers"));
        };
        return Ok(ParsedValue::Continuous(Range::new(min, max)));
    }

    Err(invalid("expected strings or two integers"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_demo_catalog_loads() {
        let catalog = Catalog::demo();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.variables()[0].name(), "Market");
        assert_eq!(catalog.variables()[0].kind(), VariableKind::Discrete);
        assert_eq!(catalog.variables()[1].name(), "Age");
        assert_eq!(catalog.variables()[1].kind(), VariableKind::Continuous);
        assert_eq!(catalog.index_of("Age"), Some(1));
    }

    #[test]
    fn test_blob_order_is_kept() {
        let catalog = Catalog::from_value(json!({
            "Zeta": { "All": ["z"] },
            "Alpha": { "All": ["a"] }
        }))
        .unwrap();
        let names: Vec<_> = catalog.variables().iter().map(Variable::name).collect();
        assert_eq!(names, ["Zeta", "Alpha"]);
    }

    #[test]
    fn test_missing_all_is_rejected() {
        let err = Catalog::from_value(json!({
            "Market": { "Europe": ["UK"] }
        }))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingAll { variable } if variable == "Market"));
    }

    #[test]
    fn test_empty_blob_is_rejected() {
        assert!(matches!(
            Catalog::from_value(json!({})),
            Err(ConfigError::NoVariables)
        ));
        assert!(matches!(
            Catalog::from_value(json!([1, 2])),
            Err(ConfigError::NotAnObject)
        ));
    }

    #[test]
    fn test_mixed_kinds_are_rejected() {
        let err = Catalog::from_value(json!({
            "Age": { "All": [1, 100], "Young": ["kids"] }
        }))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MixedKinds { .. }));
    }

    #[test]
    fn test_bad_ranges_are_rejected() {
        let inverted = Catalog::from_value(json!({
            "Age": { "All": [1, 100], "Odd": [50, 10] }
        }));
        assert!(matches!(inverted, Err(ConfigError::InvertedRange { min: 50, max: 10, .. })));

        let outside = Catalog::from_value(json!({
            "Age": { "All": [1, 100], "Old": [90, 120] }
        }));
        assert!(matches!(outside, Err(ConfigError::OutOfBounds { preset, .. }) if preset == "Old"));

        let fractional = Catalog::from_value(json!({
            "Age": { "All": [1.5, 100] }
        }));
        assert!(matches!(fractional, Err(ConfigError::InvalidValue { .. })));

        let triple = Catalog::from_value(json!({
            "Age": { "All": [1, 50, 100] }
        }));
        assert!(matches!(triple, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_discrete_preset_outside_universe_is_rejected() {
        let err = Catalog::from_value(json!({
            "Market": { "All": ["UK"], "Europe": ["UK", "France"] }
        }))
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownValue { value, .. } if value == "France"));
    }

    #[test]
    fn test_resolve_prefers_first_match() {
        let mapping = PresetMapping::new(
            "Market",
            vec![
                ("All".to_string(), ValueSet::new(["UK", "Germany", "Canada"])),
                ("Europe".to_string(), ValueSet::new(["UK", "Germany"])),
                ("Old World".to_string(), ValueSet::new(["Germany", "UK"])),
            ],
        )
        .unwrap();
        assert_eq!(mapping.resolve(&ValueSet::new(["Germany", "UK"])), Some("Europe"));
        assert_eq!(mapping.resolve(&ValueSet::new(["UK"])), None);
    }

    #[test]
    fn test_names_put_all_first() {
        let mapping = PresetMapping::new(
            "Age",
            vec![
                ("Young".to_string(), Range::new(1, 25)),
                ("All".to_string(), Range::new(1, 100)),
            ],
        )
        .unwrap();
        assert_eq!(mapping.names(), ["All", "Young"]);
        assert_eq!(*mapping.all(), Range::new(1, 100));
    }

    #[test]
    fn test_slider_step_and_marks() {
        let Variable::Continuous(income) = Catalog::from_value(json!({
            "Income": { "All": [0, 250000] }
        }))
        .unwrap()
        .variables()[0]
            .clone()
        else {
            panic!("expected a continuous variable");
        };
        assert_eq!(income.step(), 1000);
        assert_eq!(income.mark_label(250000), "$250,000");

        let Variable::Continuous(age) = Catalog::demo().variables()[1].clone() else {
            panic!("expected a continuous variable");
        };
        assert_eq!(age.step(), 1);
        assert_eq!(age.mark_label(100), "100");
    }

    #[test]
    fn test_range_serializes_as_pair() {
        let range = Range::new(1, 25);
        assert_eq!(serde_json::to_value(range).unwrap(), json!([1, 25]));
        let back: Range = serde_json::from_value(json!([2, 30])).unwrap();
        assert_eq!(back, Range::new(2, 30));
    }
}
