//! Preset/value synchronization for a single selector.
//!
//! A selector pairs a preset radio group with a value control. Exactly one of
//! the two drives each change: choosing a preset overwrites the value, and
//! editing the value re-resolves the preset (or clears it for a custom
//! selection).

use crate::presets::{ContinuousVariable, DiscreteVariable, PresetMapping, PresetValue, Range, ValueSet};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("unknown preset '{0}'")]
    UnknownPreset(String),
    #[error("'{0}' is not one of the variable's values")]
    UnknownValue(String),
    #[error("range {min} - {max} is inverted")]
    InvertedRange { min: i64, max: i64 },
}

/// Current `(preset, value)` pair of one selector.
///
/// `preset` is `Some` exactly when `value` matches a preset.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector<V> {
    preset: Option<String>,
    value: V,
}

impl<V: PresetValue> Selector<V> {
    /// A selector sitting on the `"All"` preset.
    pub fn new(presets: &PresetMapping<V>) -> Self {
        let value = presets.all().clone();
        Self {
            preset: presets.resolve(&value).map(str::to_string),
            value,
        }
    }

    pub fn preset(&self) -> Option<&str> {
        self.preset.as_deref()
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    /// The radio group changed: the preset's value becomes the selection.
    pub fn choose_preset(
        &mut self,
        presets: &PresetMapping<V>,
        name: &str,
    ) -> Result<&V, SelectionError> {
        let value = presets
            .get(name)
            .ok_or_else(|| SelectionError::UnknownPreset(name.to_string()))?;
        self.value = value.clone();
        self.preset = Some(name.to_string());
        Ok(&self.value)
    }

    /// The value control changed: resolve which preset, if any, it now matches.
    pub fn set_value(&mut self, presets: &PresetMapping<V>, value: V) -> Option<&str> {
        self.preset = presets.resolve(&value).map(str::to_string);
        self.value = value;
        self.preset.as_deref()
    }
}

impl DiscreteVariable {
    /// Drops duplicates and rejects values outside the `"All"` set.
    pub fn normalize<I, S>(&self, values: I) -> Result<ValueSet, SelectionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let universe = self.universe();
        let mut kept: Vec<String> = Vec::new();
        for value in values {
            let value = value.into();
            if !universe.contains(&value) {
                return Err(SelectionError::UnknownValue(value));
            }
            if !kept.contains(&value) {
                kept.push(value);
            }
        }
        Ok(ValueSet::new(kept))
    }
}

impl ContinuousVariable {
    /// Rejects inverted pairs and clamps the rest into the global range.
    pub fn clamp(&self, range: Range) -> Result<Range, SelectionError> {
        if range.is_inverted() {
            return Err(SelectionError::InvertedRange {
                min: range.min,
                max: range.max,
            });
        }
        Ok(range.clamp_to(&self.bounds()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::{Catalog, Variable};

    fn market() -> DiscreteVariable {
        match Catalog::demo().variables()[0].clone() {
            Variable::Discrete(v) => v,
            other => panic!("expected Market to be discrete, got {other:?}"),
        }
    }

    fn age() -> ContinuousVariable {
        match Catalog::demo().variables()[1].clone() {
            Variable::Continuous(v) => v,
            other => panic!("expected Age to be continuous, got {other:?}"),
        }
    }

    #[test]
    fn test_new_selector_sits_on_all() {
        let market = market();
        let selector = Selector::new(&market.presets);
        assert_eq!(selector.preset(), Some("All"));
        assert_eq!(selector.value(), market.universe());
    }

    #[test]
    fn test_discrete_presets_round_trip() {
        let market = market();
        let mut selector = Selector::new(&market.presets);
        for (name, expected) in market.presets.iter() {
            let value = selector.choose_preset(&market.presets, name).unwrap().clone();
            assert_eq!(&value, expected);
            assert_eq!(selector.set_value(&market.presets, value), Some(name));
        }
    }

    #[test]
    fn test_continuous_presets_round_trip() {
        let age = age();
        let mut selector = Selector::new(&age.presets);
        for (name, expected) in age.presets.iter() {
            let value = *selector.choose_preset(&age.presets, name).unwrap();
            assert_eq!(&value, expected);
            assert_eq!(selector.set_value(&age.presets, value), Some(name));
        }
    }

    #[test]
    fn test_value_order_does_not_matter_for_discrete_match() {
        let market = market();
        let mut selector = Selector::new(&market.presets);
        let values = market.normalize(["Germany", "UK"]).unwrap();
        assert_eq!(selector.set_value(&market.presets, values), Some("Europe"));
        assert_eq!(selector.value().as_slice(), ["Germany", "UK"]);
    }

    #[test]
    fn test_custom_values_clear_the_preset() {
        let market = market();
        let mut selector = Selector::new(&market.presets);
        let values = market.normalize(["UK", "India"]).unwrap();
        assert_eq!(selector.set_value(&market.presets, values), None);
        assert_eq!(selector.preset(), None);

        assert_eq!(selector.set_value(&market.presets, ValueSet::default()), None);
    }

    #[test]
    fn test_range_resolution() {
        let age = age();
        let mut selector = Selector::new(&age.presets);
        assert_eq!(selector.set_value(&age.presets, Range::new(1, 25)), Some("Bottom 25%"));
        assert_eq!(selector.set_value(&age.presets, Range::new(2, 25)), None);
        assert_eq!(*selector.value(), Range::new(2, 25));
    }

    #[test]
    fn test_unknown_preset_leaves_state_alone() {
        let age = age();
        let mut selector = Selector::new(&age.presets);
        let err = selector.choose_preset(&age.presets, "Middle").unwrap_err();
        assert_eq!(err, SelectionError::UnknownPreset("Middle".to_string()));
        assert_eq!(selector.preset(), Some("All"));
        assert_eq!(*selector.value(), Range::new(1, 100));
    }

    #[test]
    fn test_normalize_drops_duplicates_and_rejects_strangers() {
        let market = market();
        let values = market.normalize(["UK", "UK", "USA"]).unwrap();
        assert_eq!(values.as_slice(), ["UK", "USA"]);
        assert_eq!(
            market.normalize(["UK", "Mars"]),
            Err(SelectionError::UnknownValue("Mars".to_string()))
        );
    }

    #[test]
    fn test_clamp() {
        let age = age();
        assert_eq!(age.clamp(Range::new(-5, 140)), Ok(Range::new(1, 100)));
        assert_eq!(age.clamp(Range::new(10, 20)), Ok(Range::new(10, 20)));
        assert_eq!(
            age.clamp(Range::new(60, 40)),
            Err(SelectionError::InvertedRange { min: 60, max: 40 })
        );
    }
}
