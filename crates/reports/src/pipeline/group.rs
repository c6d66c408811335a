//! Grouping, accumulation and ranking

use super::{FieldPath, Row};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serializer;
use serde_json::{Number, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{debug, warn};

/// Per-group reduction
#[derive(Debug, Clone)]
pub enum Accumulator {
    /// Exact decimal sum of the numbers at a path; anything else adds nothing
    Sum(FieldPath),
    /// Number of rows in the group
    Count,
    /// Value at a path in the group's first row, null when missing
    First(FieldPath),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Accumulated {
    Sum(Decimal),
    Count(u64),
    First(Value),
}

impl Accumulator {
    fn seed(&self, row: &Row) -> Accumulated {
        match self {
            Accumulator::Sum(_) => Accumulated::Sum(Decimal::ZERO),
            Accumulator::Count => Accumulated::Count(0),
            Accumulator::First(path) => {
                Accumulated::First(path.get(row).cloned().unwrap_or(Value::Null))
            }
        }
    }

    fn fold(&self, acc: &mut Accumulated, row: &Row) {
        match (self, acc) {
            (Accumulator::Sum(path), Accumulated::Sum(total)) => {
                if let Some(Value::Number(n)) = path.get(row) {
                    match decimal_from_number(n).and_then(|value| total.checked_add(value)) {
                        Some(sum) => *total = sum,
                        None => warn!(value = %n, "Number outside decimal range; left out of sum"),
                    }
                }
            }
            (Accumulator::Count, Accumulated::Count(count)) => *count += 1,
            _ => {}
        }
    }
}

/// One output group: the shared key plus each named accumulation
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub key: Value,
    values: Vec<(String, Accumulated)>,
}

impl Group {
    fn value(&self, name: &str) -> Option<&Accumulated> {
        self.values
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn sum(&self, name: &str) -> Decimal {
        match self.value(name) {
            Some(Accumulated::Sum(total)) => *total,
            _ => Decimal::ZERO,
        }
    }

    pub fn count(&self, name: &str) -> u64 {
        match self.value(name) {
            Some(Accumulated::Count(count)) => *count,
            _ => 0,
        }
    }

    pub fn first(&self, name: &str) -> Value {
        match self.value(name) {
            Some(Accumulated::First(value)) => value.clone(),
            _ => Value::Null,
        }
    }
}

/// Group rows by the value at a key path.
///
/// Groups come out in first-encounter order. A missing key groups under
/// null.
#[derive(Debug, Clone)]
pub struct GroupBy {
    key: FieldPath,
    accumulators: Vec<(String, Accumulator)>,
}

impl GroupBy {
    pub fn new(key: &str) -> Self {
        Self {
            key: FieldPath::parse(key),
            accumulators: Vec::new(),
        }
    }

    pub fn sum(self, name: &str, path: &str) -> Self {
        self.accumulate(name, Accumulator::Sum(FieldPath::parse(path)))
    }

    pub fn count(self, name: &str) -> Self {
        self.accumulate(name, Accumulator::Count)
    }

    pub fn first(self, name: &str, path: &str) -> Self {
        self.accumulate(name, Accumulator::First(FieldPath::parse(path)))
    }

    fn accumulate(mut self, name: &str, accumulator: Accumulator) -> Self {
        self.accumulators.push((name.to_string(), accumulator));
        self
    }

    pub fn apply(&self, rows: &[Row]) -> Vec<Group> {
        let mut groups: Vec<Group> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for row in rows {
            let key = self.key.get(row).cloned().unwrap_or(Value::Null);
            let slot = *index.entry(key.to_string()).or_insert_with(|| {
                groups.push(Group {
                    key,
                    values: self
                        .accumulators
                        .iter()
                        .map(|(name, acc)| (name.clone(), acc.seed(row)))
                        .collect(),
                });
                groups.len() - 1
            });

            let group = &mut groups[slot];
            for ((_, accumulator), (_, value)) in self.accumulators.iter().zip(group.values.iter_mut()) {
                accumulator.fold(value, row);
            }
        }

        debug!(stage = "group", rows = groups.len(), "Stage applied");
        groups
    }
}

/// Stable descending sort: equal items keep their incoming order.
pub fn sort_desc_by<T, K, F>(items: &mut [T], key: F)
where
    F: Fn(&T) -> K,
    K: PartialOrd,
{
    items.sort_by(|a, b| key(b).partial_cmp(&key(a)).unwrap_or(Ordering::Equal));
    debug!(stage = "sort", rows = items.len(), "Stage applied");
}

/// Exact decimal value of a JSON number, when representable
pub fn decimal_from_number(number: &Number) -> Option<Decimal> {
    if let Some(i) = number.as_i64() {
        return Some(Decimal::from(i));
    }
    if let Some(u) = number.as_u64() {
        return Some(Decimal::from(u));
    }
    let text = number.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// Serialize a decimal as a JSON number.
///
/// Whole values are written digit for digit. Values with a fraction go out
/// as the nearest `f64`.
pub fn serialize_decimal_number<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
    let value = value.normalize();
    if value.scale() == 0 {
        if let Some(i) = value.to_i128() {
            return serializer.serialize_i128(i);
        }
    }
    match value.to_f64() {
        Some(f) => serializer.serialize_f64(f),
        None => serializer.serialize_str(&value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use serde_json::json;

    fn rows(values: Vec<Value>) -> Vec<Row> {
        values
            .into_iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect()
    }

    #[test]
    fn test_group_count_and_first_in_encounter_order() {
        let input = rows(vec![
            json!({"sic": "2000", "desc": "Food"}),
            json!({"sic": "1000", "desc": "Metal Mining"}),
            json!({"sic": "2000", "desc": "Food, renamed"}),
            json!({"desc": "Unclassified"}),
        ]);

        let groups = GroupBy::new("sic")
            .count("count")
            .first("description", "desc")
            .apply(&input);

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].key, json!("2000"));
        assert_eq!(groups[0].count("count"), 2);
        assert_eq!(groups[0].first("description"), json!("Food"));
        assert_eq!(groups[1].key, json!("1000"));
        assert_eq!(groups[2].key, Value::Null);
    }

    #[test]
    fn test_group_sum_is_exact_and_skips_non_numbers() {
        let input = rows(vec![
            json!({"k": "a", "val": 0.1}),
            json!({"k": "a", "val": 0.2}),
            json!({"k": "a", "val": "12"}),
            json!({"k": "a"}),
            json!({"k": "b", "val": 9007199254740993u64}),
        ]);

        let groups = GroupBy::new("k").sum("total", "val").apply(&input);

        assert_eq!(groups[0].sum("total"), Decimal::from_str("0.3").unwrap());
        assert_eq!(groups[1].sum("total"), Decimal::from(9007199254740993u64));
    }

    #[test]
    fn test_sort_desc_is_stable() {
        let mut items = vec![("x", 2), ("y", 3), ("z", 2), ("w", 3)];
        sort_desc_by(&mut items, |item| item.1);
        assert_eq!(items, vec![("y", 3), ("w", 3), ("x", 2), ("z", 2)]);
    }

    #[test]
    fn test_serialize_decimal_number() {
        #[derive(Serialize)]
        struct Total {
            #[serde(serialize_with = "serialize_decimal_number")]
            total: Decimal,
        }

        let whole = Total { total: Decimal::from_str("150.00").unwrap() };
        assert_eq!(serde_json::to_value(&whole).unwrap(), json!({"total": 150}));

        let fraction = Total { total: Decimal::from_str("12.5").unwrap() };
        assert_eq!(serde_json::to_value(&fraction).unwrap(), json!({"total": 12.5}));
    }

    #[test]
    fn test_out_of_range_values_are_left_out() {
        let input = rows(vec![
            json!({"k": "a", "val": 7}),
            json!({"k": "a", "val": 1e40}),
        ]);

        let groups = GroupBy::new("k").sum("total", "val").apply(&input);

        assert_eq!(groups[0].sum("total"), Decimal::from(7));
    }

    #[test]
    fn test_large_whole_totals_are_written_exactly() {
        #[derive(Serialize)]
        struct Total {
            #[serde(serialize_with = "serialize_decimal_number")]
            total: Decimal,
        }

        let total = Total {
            total: Decimal::from_str("123456789012345678901234").unwrap(),
        };
        assert_eq!(
            serde_json::to_string(&total).unwrap(),
            r#"{"total":123456789012345678901234}"#
        );
    }
}
