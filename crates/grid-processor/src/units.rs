//! Declarative unit corrections applied to raw source fields.

use cmip_common::Field;
use tracing::debug;

/// When a rule fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitCondition {
    Always,
    /// The field's recorded unit label is a Celsius spelling.
    RecordedCelsius,
}

/// What a rule does to the field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnitEffect {
    /// Multiply every value.
    Scale(f32),
    /// Add a constant and relabel the unit.
    Offset { add: f32, units: &'static str },
}

/// One row of the unit correction table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitRule {
    pub variable: &'static str,
    pub condition: UnitCondition,
    pub effect: UnitEffect,
}

/// The complete rule table; variables not listed pass through unchanged.
pub const UNIT_RULES: &[UnitRule] = &[
    // Volumetric percent to fraction.
    UnitRule {
        variable: "mrsos",
        condition: UnitCondition::Always,
        effect: UnitEffect::Scale(1e-2),
    },
    UnitRule {
        variable: "tos",
        condition: UnitCondition::RecordedCelsius,
        effect: UnitEffect::Offset {
            add: 273.15,
            units: "K",
        },
    },
];

/// True for the usual spellings of degrees Celsius.
pub fn is_celsius(units: &str) -> bool {
    matches!(
        units.trim(),
        "degC" | "deg_C" | "degree_C" | "degrees_C" | "C" | "°C" | "celsius" | "Celsius"
    )
}

/// Applies [`UnitRule`]s to fields in place.
#[derive(Debug, Clone, Copy)]
pub struct UnitNormalizer {
    rules: &'static [UnitRule],
}

impl Default for UnitNormalizer {
    fn default() -> Self {
        Self { rules: UNIT_RULES }
    }
}

impl UnitNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize `field` for source variable `variable`.
    ///
    /// Missing values stay missing. Returns the number of rules applied.
    pub fn normalize(&self, variable: &str, field: &mut Field) -> usize {
        let mut applied = 0;
        for rule in self.rules.iter().filter(|r| r.variable == variable) {
            let fires = match rule.condition {
                UnitCondition::Always => true,
                UnitCondition::RecordedCelsius => is_celsius(&field.units),
            };
            if !fires {
                continue;
            }

            match rule.effect {
                UnitEffect::Scale(factor) => {
                    field.data.iter_mut().for_each(|v| *v *= factor);
                }
                UnitEffect::Offset { add, units } => {
                    field.data.iter_mut().for_each(|v| *v += add);
                    field.units = units.to_string();
                }
            }
            applied += 1;

            debug!(variable = variable, effect = ?rule.effect, "Applied unit rule");
        }
        applied
    }
}
