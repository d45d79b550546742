//! Comparator expressions
//!
//! A mapping expression of the shape `property sign value[%]` is evaluated
//! directly against live token/actor properties instead of the effect set.
//! The synthetic `hp` property (and its `hp++`/`hp--` recent-delta
//! variants) resolves through the configurable system-specific path.
//! Unresolvable properties default to zero/falsy rather than erroring.

use std::sync::LazyLock;

use regex::Regex;

use effigy_types::Settings;

use crate::host::{HpDelta, PropertyValue, TokenState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Eq,
    Gt,
    Lt,
    Ge,
    Le,
    Ne,
}

impl Sign {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "=" => Some(Self::Eq),
            ">" => Some(Self::Gt),
            "<" => Some(Self::Lt),
            ">=" => Some(Self::Ge),
            "<=" => Some(Self::Le),
            "<>" => Some(Self::Ne),
            _ => None,
        }
    }
}

/// Right-hand literal of a comparator
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Number(f64),
    Bool(bool),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparator {
    pub property: String,
    pub sign: Sign,
    pub rhs: Operand,

    /// Normalize the left side as `(value / max) * 100` before comparing
    pub percent: bool,
}

static COMPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([\w.+-]+)\s*(<=|>=|<>|=|<|>)\s*(.+?)\s*$").unwrap()
});

impl Comparator {
    /// Try to read an expression as a single comparator. Returns None for
    /// anything else (including full boolean expressions), which callers
    /// treat as non-matching rather than an error.
    pub fn parse(expression: &str) -> Option<Self> {
        // Logical operators mean this is a boolean expression instead
        if expression.contains("&&")
            || expression.contains("||")
            || expression.contains("\\(")
            || expression.contains("\\!")
        {
            return None;
        }

        let caps = COMPARATOR_RE.captures(expression)?;
        let property = caps[1].to_string();
        let sign = Sign::from_str(&caps[2])?;
        let raw = &caps[3];

        let (raw, percent) = match raw.strip_suffix('%') {
            Some(prefix) if prefix.trim_end().parse::<f64>().is_ok() => {
                (prefix.trim_end(), true)
            }
            _ => (raw, false),
        };

        let rhs = if let Ok(n) = raw.parse::<f64>() {
            Operand::Number(n)
        } else if raw == "true" || raw == "false" {
            Operand::Bool(raw == "true")
        } else if (raw.starts_with('"') && raw.ends_with('"') && raw.len() >= 2)
            || (raw.starts_with('\'') && raw.ends_with('\'') && raw.len() >= 2)
        {
            Operand::Text(raw[1..raw.len() - 1].to_string())
        } else {
            return None;
        };

        Some(Self {
            property,
            sign,
            rhs,
            percent,
        })
    }

    /// Evaluate against live token properties
    pub fn matches(&self, token: &dyn TokenState, settings: &Settings) -> bool {
        let (path, required_delta, synthetic_hp) = match self.property.as_str() {
            "hp" => (settings.hp_path.clone(), None, true),
            "hp++" => (settings.hp_path.clone(), Some(HpDelta::Gain), true),
            "hp--" => (settings.hp_path.clone(), Some(HpDelta::Loss), true),
            other => (other.to_string(), None, false),
        };

        if let Some(delta) = required_delta {
            if token.hp_delta() != Some(delta) {
                return false;
            }
        }

        let value = resolve_scalar(token, &path, synthetic_hp);

        match &self.rhs {
            Operand::Number(rhs) => {
                let mut lhs = value.as_number().unwrap_or(0.0);
                if self.percent {
                    let max = token
                        .resolve_property(&format!("{path}.max"))
                        .and_then(|v| v.as_number())
                        .unwrap_or(0.0);
                    lhs = if max > 0.0 { lhs / max * 100.0 } else { 0.0 };
                }
                compare_numbers(lhs, self.sign, *rhs)
            }
            Operand::Bool(rhs) => match self.sign {
                Sign::Eq => value.is_truthy() == *rhs,
                Sign::Ne => value.is_truthy() != *rhs,
                _ => false,
            },
            Operand::Text(rhs) => {
                let lhs = match &value {
                    PropertyValue::Text(s) => s.clone(),
                    other => other.display(),
                };
                match self.sign {
                    Sign::Eq => lhs == *rhs,
                    Sign::Ne => lhs != *rhs,
                    _ => false,
                }
            }
        }
    }
}

/// Resolve a property path to a scalar. Synthetic hp paths always address
/// the `.value` leaf; generic paths try the path itself first and fall
/// back to `.value` for object-valued properties.
fn resolve_scalar(token: &dyn TokenState, path: &str, synthetic_hp: bool) -> PropertyValue {
    let resolved = if synthetic_hp {
        token.resolve_property(&format!("{path}.value"))
    } else {
        token
            .resolve_property(path)
            .or_else(|| token.resolve_property(&format!("{path}.value")))
    };
    resolved.unwrap_or(PropertyValue::Number(0.0))
}

fn compare_numbers(lhs: f64, sign: Sign, rhs: f64) -> bool {
    match sign {
        Sign::Eq => lhs == rhs,
        Sign::Gt => lhs > rhs,
        Sign::Lt => lhs < rhs,
        Sign::Ge => lhs >= rhs,
        Sign::Le => lhs <= rhs,
        Sign::Ne => lhs != rhs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockToken;

    fn hp_token(value: f64, max: f64) -> MockToken {
        MockToken::new("t1")
            .with_property("attributes.hp.value", PropertyValue::Number(value))
            .with_property("attributes.hp.max", PropertyValue::Number(max))
    }

    #[test]
    fn test_parse_signs() {
        for (text, sign) in [
            ("hp=10", Sign::Eq),
            ("hp>10", Sign::Gt),
            ("hp<10", Sign::Lt),
            ("hp>=10", Sign::Ge),
            ("hp<=10", Sign::Le),
            ("hp<>10", Sign::Ne),
        ] {
            let cmp = Comparator::parse(text).unwrap();
            assert_eq!(cmp.sign, sign, "{text}");
            assert_eq!(cmp.rhs, Operand::Number(10.0));
        }
    }

    #[test]
    fn test_parse_rejects_boolean_expressions_and_plain_names() {
        assert!(Comparator::parse("A && B").is_none());
        assert!(Comparator::parse("Poisoned").is_none());
        assert!(Comparator::parse("\\!Dead").is_none());
    }

    #[test]
    fn test_percent_suffix() {
        let cmp = Comparator::parse("hp<=50%").unwrap();
        assert!(cmp.percent);
        assert_eq!(cmp.rhs, Operand::Number(50.0));
    }

    #[test]
    fn test_hp_percent_threshold() {
        let settings = Settings::default();
        let cmp = Comparator::parse("hp<=50%").unwrap();

        assert!(cmp.matches(&hp_token(40.0, 100.0), &settings));
        assert!(!cmp.matches(&hp_token(60.0, 100.0), &settings));
    }

    #[test]
    fn test_hp_delta_variants() {
        let settings = Settings::default();
        let cmp = Comparator::parse("hp--<=50%").unwrap();

        let mut token = hp_token(40.0, 100.0);
        // No recent loss: does not match even though the threshold holds
        assert!(!cmp.matches(&token, &settings));

        token.hp_delta = Some(HpDelta::Loss);
        assert!(cmp.matches(&token, &settings));

        token.hp_delta = Some(HpDelta::Gain);
        assert!(!cmp.matches(&token, &settings));
    }

    #[test]
    fn test_string_and_bool_operands() {
        let settings = Settings::default();
        let token = MockToken::new("t1")
            .with_property("name", PropertyValue::Text("Grog".into()))
            .with_property("flags.raging", PropertyValue::Bool(true));

        assert!(Comparator::parse("name=\"Grog\"")
            .unwrap()
            .matches(&token, &settings));
        assert!(Comparator::parse("name<>'Vex'")
            .unwrap()
            .matches(&token, &settings));
        assert!(Comparator::parse("flags.raging=true")
            .unwrap()
            .matches(&token, &settings));
        assert!(!Comparator::parse("flags.raging=false")
            .unwrap()
            .matches(&token, &settings));
    }

    #[test]
    fn test_unresolvable_property_defaults_to_zero() {
        let settings = Settings::default();
        let token = MockToken::new("t1");

        assert!(Comparator::parse("missing.path=0")
            .unwrap()
            .matches(&token, &settings));
        assert!(!Comparator::parse("missing.path>0")
            .unwrap()
            .matches(&token, &settings));
    }

    #[test]
    fn test_object_valued_property_falls_back_to_value_leaf() {
        let settings = Settings::default();
        let token =
            MockToken::new("t1").with_property("attributes.ac.value", PropertyValue::Number(17.0));

        assert!(Comparator::parse("attributes.ac>=17")
            .unwrap()
            .matches(&token, &settings));
    }
}
