//! Rule matcher: picks the destination of the first rule whose conditions all hold.
//!
//! Pure computation over an already-resolved [`RuleContext`] — no clock reads,
//! no I/O. Calling it twice with the same inputs yields the same output.

use chrono::{NaiveDate, NaiveTime, Timelike};

use crate::domain::entities::rule::{Condition, DeviceClass, RangeOperator, Rule, SetOperator};

/// Request facts the matcher evaluates conditions against.
///
/// `country` is `None` when no geolocation service is configured or the
/// lookup failed; every country condition then evaluates false — a rule must
/// never match on missing data.
#[derive(Debug, Clone)]
pub struct RuleContext {
    pub country: Option<String>,
    pub device: DeviceClass,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

/// Returns the destination of the first rule whose conditions all match,
/// or `None` when no rule qualifies (the caller falls back to the static
/// destination).
pub fn resolve_destination<'a>(rules: &'a [Rule], ctx: &RuleContext) -> Option<&'a str> {
    rules
        .iter()
        .find(|rule| rule_matches(rule, ctx))
        .map(|rule| rule.destination.as_str())
}

fn rule_matches(rule: &Rule, ctx: &RuleContext) -> bool {
    rule.variables.iter().all(|cond| condition_matches(cond, ctx))
}

fn condition_matches(cond: &Condition, ctx: &RuleContext) -> bool {
    match cond {
        Condition::Country { operator, values } => {
            let Some(country) = ctx.country.as_deref() else {
                return false;
            };
            let member = values.iter().any(|v| v.eq_ignore_ascii_case(country));
            match operator {
                SetOperator::Is => member,
                SetOperator::IsNot => !member,
            }
        }
        Condition::Device { operator, values } => {
            let member = values.contains(&ctx.device);
            match operator {
                SetOperator::Is => member,
                SetOperator::IsNot => !member,
            }
        }
        Condition::Date { operator, values } => date_matches(*operator, values, ctx.date),
        Condition::Time { operator, values } => time_matches(*operator, values, ctx.time),
        Condition::Unknown => false,
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M").ok()
}

fn date_matches(operator: RangeOperator, values: &[String], current: NaiveDate) -> bool {
    match operator {
        RangeOperator::Before | RangeOperator::After | RangeOperator::On => {
            let Some(value) = values.first().and_then(|v| parse_date(v)) else {
                return false;
            };
            match operator {
                RangeOperator::Before => current < value,
                RangeOperator::After => current > value,
                RangeOperator::On => current == value,
                _ => unreachable!(),
            }
        }
        RangeOperator::Between | RangeOperator::NotBetween => {
            let (Some(start), Some(end)) = (
                values.first().and_then(|v| parse_date(v)),
                values.get(1).and_then(|v| parse_date(v)),
            ) else {
                return false;
            };
            let between = current >= start && current <= end;
            if operator == RangeOperator::Between {
                between
            } else {
                !between
            }
        }
    }
}

fn time_matches(operator: RangeOperator, values: &[String], current: NaiveTime) -> bool {
    // Conditions carry minute precision; drop seconds so "on 14:30" matches
    // the whole minute.
    let current = current
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(current);

    match operator {
        RangeOperator::Before | RangeOperator::After | RangeOperator::On => {
            let Some(value) = values.first().and_then(|v| parse_time(v)) else {
                return false;
            };
            match operator {
                RangeOperator::Before => current < value,
                RangeOperator::After => current > value,
                RangeOperator::On => current == value,
                _ => unreachable!(),
            }
        }
        RangeOperator::Between | RangeOperator::NotBetween => {
            let (Some(start), Some(end)) = (
                values.first().and_then(|v| parse_time(v)),
                values.get(1).and_then(|v| parse_time(v)),
            ) else {
                return false;
            };
            // A range with start > end crosses midnight: 22:00-06:00 means
            // late evening OR early morning.
            let between = if start <= end {
                current >= start && current <= end
            } else {
                current >= start || current <= end
            };
            if operator == RangeOperator::Between {
                between
            } else {
                !between
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(country: Option<&str>, device: DeviceClass, date: &str, time: &str) -> RuleContext {
        RuleContext {
            country: country.map(|c| c.to_string()),
            device,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            time: NaiveTime::parse_from_str(time, "%H:%M").unwrap(),
        }
    }

    fn device_rule(devices: &[DeviceClass], destination: &str) -> Rule {
        Rule {
            variables: vec![Condition::Device {
                operator: SetOperator::Is,
                values: devices.to_vec(),
            }],
            destination: destination.to_string(),
        }
    }

    #[test]
    fn test_empty_rule_list_never_matches() {
        let ctx = ctx(None, DeviceClass::Desktop, "2025-06-01", "12:00");
        assert_eq!(resolve_destination(&[], &ctx), None);
    }

    #[test]
    fn test_mobile_rule_matches_mobile_context() {
        let rules = vec![device_rule(
            &[DeviceClass::Mobile],
            "https://example.com/mobile",
        )];
        let mobile = ctx(None, DeviceClass::Mobile, "2025-06-01", "12:00");
        let desktop = ctx(None, DeviceClass::Desktop, "2025-06-01", "12:00");

        assert_eq!(
            resolve_destination(&rules, &mobile),
            Some("https://example.com/mobile")
        );
        assert_eq!(resolve_destination(&rules, &desktop), None);
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let rules = vec![
            device_rule(&[DeviceClass::Mobile], "https://example.com/first"),
            device_rule(&[DeviceClass::Mobile], "https://example.com/second"),
        ];
        let mobile = ctx(None, DeviceClass::Mobile, "2025-06-01", "12:00");

        assert_eq!(
            resolve_destination(&rules, &mobile),
            Some("https://example.com/first")
        );

        // Reordering two matching rules changes the outcome.
        let reordered = vec![rules[1].clone(), rules[0].clone()];
        assert_eq!(
            resolve_destination(&reordered, &mobile),
            Some("https://example.com/second")
        );
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let rules = vec![device_rule(&[DeviceClass::Tablet], "https://example.com/t")];
        let tablet = ctx(Some("DE"), DeviceClass::Tablet, "2025-06-01", "12:00");

        let first = resolve_destination(&rules, &tablet);
        let second = resolve_destination(&rules, &tablet);
        assert_eq!(first, second);
    }

    #[test]
    fn test_all_conditions_must_match() {
        let rules = vec![Rule {
            variables: vec![
                Condition::Device {
                    operator: SetOperator::Is,
                    values: vec![DeviceClass::Mobile],
                },
                Condition::Country {
                    operator: SetOperator::Is,
                    values: vec!["NL".to_string()],
                },
            ],
            destination: "https://example.com/nl-mobile".to_string(),
        }];

        let both = ctx(Some("NL"), DeviceClass::Mobile, "2025-06-01", "12:00");
        let device_only = ctx(Some("DE"), DeviceClass::Mobile, "2025-06-01", "12:00");

        assert!(resolve_destination(&rules, &both).is_some());
        assert!(resolve_destination(&rules, &device_only).is_none());
    }

    #[test]
    fn test_rule_with_no_conditions_matches_unconditionally() {
        let rules = vec![Rule {
            variables: vec![],
            destination: "https://example.com/always".to_string(),
        }];
        let any = ctx(None, DeviceClass::Desktop, "2025-06-01", "12:00");
        assert_eq!(
            resolve_destination(&rules, &any),
            Some("https://example.com/always")
        );
    }

    #[test]
    fn test_country_condition_with_unresolved_country_never_matches() {
        for operator in [SetOperator::Is, SetOperator::IsNot] {
            let rules = vec![Rule {
                variables: vec![Condition::Country {
                    operator,
                    values: vec!["NL".to_string()],
                }],
                destination: "https://example.com/geo".to_string(),
            }];
            let no_country = ctx(None, DeviceClass::Desktop, "2025-06-01", "12:00");
            assert_eq!(resolve_destination(&rules, &no_country), None);
        }
    }

    #[test]
    fn test_country_is_not_matches_other_countries() {
        let rules = vec![Rule {
            variables: vec![Condition::Country {
                operator: SetOperator::IsNot,
                values: vec!["US".to_string()],
            }],
            destination: "https://example.com/row".to_string(),
        }];

        let de = ctx(Some("DE"), DeviceClass::Desktop, "2025-06-01", "12:00");
        let us = ctx(Some("US"), DeviceClass::Desktop, "2025-06-01", "12:00");

        assert!(resolve_destination(&rules, &de).is_some());
        assert!(resolve_destination(&rules, &us).is_none());
    }

    #[test]
    fn test_country_comparison_is_case_insensitive() {
        let rules = vec![Rule {
            variables: vec![Condition::Country {
                operator: SetOperator::Is,
                values: vec!["nl".to_string()],
            }],
            destination: "https://example.com/nl".to_string(),
        }];
        let upper = ctx(Some("NL"), DeviceClass::Desktop, "2025-06-01", "12:00");
        assert!(resolve_destination(&rules, &upper).is_some());
    }

    #[test]
    fn test_date_operators() {
        let current = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();

        let cases = [
            (RangeOperator::Before, vec!["2025-07-01"], true),
            (RangeOperator::Before, vec!["2025-06-15"], false),
            (RangeOperator::After, vec!["2025-06-01"], true),
            (RangeOperator::After, vec!["2025-06-15"], false),
            (RangeOperator::On, vec!["2025-06-15"], true),
            (RangeOperator::On, vec!["2025-06-14"], false),
            (RangeOperator::Between, vec!["2025-06-01", "2025-06-30"], true),
            // Inclusive endpoints
            (RangeOperator::Between, vec!["2025-06-15", "2025-06-30"], true),
            (RangeOperator::Between, vec!["2025-07-01", "2025-07-31"], false),
            (
                RangeOperator::NotBetween,
                vec!["2025-07-01", "2025-07-31"],
                true,
            ),
            (
                RangeOperator::NotBetween,
                vec!["2025-06-01", "2025-06-30"],
                false,
            ),
        ];

        for (operator, values, expected) in cases {
            let values: Vec<String> = values.into_iter().map(String::from).collect();
            assert_eq!(
                date_matches(operator, &values, current),
                expected,
                "{operator:?} {values:?}"
            );
        }
    }

    #[test]
    fn test_time_between_wraps_midnight() {
        let values = vec!["22:00".to_string(), "06:00".to_string()];

        let late = NaiveTime::from_hms_opt(23, 30, 0).unwrap();
        let early = NaiveTime::from_hms_opt(4, 0, 0).unwrap();
        let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap();

        assert!(time_matches(RangeOperator::Between, &values, late));
        assert!(time_matches(RangeOperator::Between, &values, early));
        assert!(!time_matches(RangeOperator::Between, &values, noon));

        assert!(!time_matches(RangeOperator::NotBetween, &values, late));
        assert!(time_matches(RangeOperator::NotBetween, &values, noon));
    }

    #[test]
    fn test_time_between_plain_range() {
        let values = vec!["09:00".to_string(), "17:00".to_string()];

        let inside = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        let boundary = NaiveTime::from_hms_opt(17, 0, 0).unwrap();
        let outside = NaiveTime::from_hms_opt(18, 0, 0).unwrap();

        assert!(time_matches(RangeOperator::Between, &values, inside));
        assert!(time_matches(RangeOperator::Between, &values, boundary));
        assert!(!time_matches(RangeOperator::Between, &values, outside));
    }

    #[test]
    fn test_time_on_ignores_seconds() {
        let values = vec!["14:30".to_string()];
        let with_seconds = NaiveTime::from_hms_opt(14, 30, 45).unwrap();
        assert!(time_matches(RangeOperator::On, &values, with_seconds));
    }

    #[test]
    fn test_malformed_values_never_match() {
        let current_date = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let current_time = NaiveTime::from_hms_opt(12, 0, 0).unwrap();

        assert!(!date_matches(
            RangeOperator::On,
            &["not-a-date".to_string()],
            current_date
        ));
        assert!(!date_matches(RangeOperator::Between, &[], current_date));
        assert!(!time_matches(
            RangeOperator::Between,
            &["22:00".to_string()],
            current_time
        ));
    }

    #[test]
    fn test_rule_with_unknown_condition_cannot_match() {
        let rules = vec![Rule {
            variables: vec![Condition::Unknown],
            destination: "https://example.com/x".to_string(),
        }];
        let any = ctx(Some("NL"), DeviceClass::Mobile, "2025-06-01", "12:00");
        assert_eq!(resolve_destination(&rules, &any), None);
    }
}
