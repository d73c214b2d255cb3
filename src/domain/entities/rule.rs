//! Dynamic redirect rules: ordered conditional overrides of a link's destination.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One row of a link's dynamic redirect table.
///
/// A rule matches when **all** of its conditions match (logical AND). Across
/// rules, the first match wins (logical OR with ordering). A rule with no
/// conditions matches unconditionally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub variables: Vec<Condition>,
    pub destination: String,
}

/// Membership operator for set-valued conditions (country, device).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetOperator {
    Is,
    IsNot,
}

/// Comparison operator for scalar/range conditions (date, time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeOperator {
    Before,
    After,
    On,
    Between,
    NotBetween,
}

/// Device category derived from the user agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Desktop,
    Mobile,
    Tablet,
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Desktop => "desktop",
            Self::Mobile => "mobile",
            Self::Tablet => "tablet",
        };
        f.write_str(s)
    }
}

/// A single condition inside a rule.
///
/// Date and time values are kept as strings (`YYYY-MM-DD`, `HH:MM`) and parsed
/// at evaluation time; a value that fails to parse makes the condition false
/// rather than failing the request. Unrecognized condition types deserialize
/// to [`Condition::Unknown`], which never matches — a stored rule written by a
/// newer version degrades to "cannot match" instead of breaking redirects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    Country {
        operator: SetOperator,
        #[serde(default)]
        values: Vec<String>,
    },
    Device {
        operator: SetOperator,
        #[serde(default)]
        values: Vec<DeviceClass>,
    },
    Date {
        operator: RangeOperator,
        #[serde(default)]
        values: Vec<String>,
    },
    Time {
        operator: RangeOperator,
        #[serde(default)]
        values: Vec<String>,
    },
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_round_trips_through_json() {
        let rule = Rule {
            variables: vec![
                Condition::Country {
                    operator: SetOperator::Is,
                    values: vec!["NL".to_string(), "BE".to_string()],
                },
                Condition::Time {
                    operator: RangeOperator::Between,
                    values: vec!["22:00".to_string(), "06:00".to_string()],
                },
            ],
            destination: "https://example.com/nl".to_string(),
        };

        let json = serde_json::to_value(&rule).unwrap();
        let back: Rule = serde_json::from_value(json).unwrap();
        assert_eq!(back, rule);
    }

    #[test]
    fn test_unknown_condition_tag_deserializes_to_unknown() {
        let json = serde_json::json!({
            "variables": [{ "type": "browser_language", "operator": "is", "values": ["nl"] }],
            "destination": "https://example.com/x"
        });

        let rule: Rule = serde_json::from_value(json).unwrap();
        assert_eq!(rule.variables, vec![Condition::Unknown]);
    }

    #[test]
    fn test_missing_values_default_to_empty() {
        let json = serde_json::json!({
            "variables": [{ "type": "country", "operator": "is" }],
            "destination": "https://example.com/x"
        });

        let rule: Rule = serde_json::from_value(json).unwrap();
        assert_eq!(
            rule.variables,
            vec![Condition::Country {
                operator: SetOperator::Is,
                values: vec![],
            }]
        );
    }
}
