use crate::{
    db::{
        key::CompositeKey,
        query::select::{Aggregate, COUNT_ALIAS},
        store::Record,
    },
    value::{Value, strict_order_cmp},
};
use std::{
    cmp::Ordering,
    collections::{HashMap, hash_map::Entry},
};

///
/// Partition rows by the key tuple and emit one summary row per partition.
///
/// Partitions appear in first-seen order. A summary row holds the key
/// columns verbatim, `$sum_/$avg_/$min_/$max_` for every other column that
/// is numeric in the partition's first member, and the member count under
/// `$$count`. Non-numeric non-key columns are dropped.
///
pub(crate) fn group(rows: Vec<Record>, keys: &[String]) -> Vec<Record> {
    let mut slots: HashMap<CompositeKey, usize> = HashMap::new();
    let mut partitions: Vec<Vec<Record>> = Vec::new();

    for row in rows {
        let key = CompositeKey::from_record(&row, keys.iter().map(String::as_str));
        match slots.entry(key) {
            Entry::Occupied(slot) => partitions[*slot.get()].push(row),
            Entry::Vacant(slot) => {
                slot.insert(partitions.len());
                partitions.push(vec![row]);
            }
        }
    }

    partitions
        .iter()
        .filter_map(|members| summarize(members, keys))
        .collect()
}

fn summarize(members: &[Record], keys: &[String]) -> Option<Record> {
    let first = members.first()?;
    let mut out = Record::new();

    for key in keys {
        out.set(key.as_str(), first.get(key).cloned().unwrap_or(Value::Null));
    }

    for (field, value) in first.iter() {
        if !value.is_numeric() || keys.iter().any(|key| key == field) {
            continue;
        }

        let mut acc = Accumulator::default();
        for member in members {
            if let Some(value) = member.get(field) {
                acc.push(value);
            }
        }

        out.set(Aggregate::Sum.field_name(field), acc.sum());
        out.set(Aggregate::Avg.field_name(field), acc.avg(members.len()));
        out.set(Aggregate::Min.field_name(field), acc.min.unwrap_or(Value::Null));
        out.set(Aggregate::Max.field_name(field), acc.max.unwrap_or(Value::Null));
    }

    out.set(
        COUNT_ALIAS,
        i64::try_from(members.len()).unwrap_or(i64::MAX),
    );

    Some(out)
}

///
/// Accumulator
///
/// Running numeric aggregates for one column of one partition.
/// `int_sum` stays exact until a float is seen or the sum overflows.
///

struct Accumulator {
    int_sum: Option<i64>,
    float_sum: f64,
    min: Option<Value>,
    max: Option<Value>,
}

impl Default for Accumulator {
    fn default() -> Self {
        Self {
            int_sum: Some(0),
            float_sum: 0.0,
            min: None,
            max: None,
        }
    }
}

impl Accumulator {
    // Nulls and non-numeric values are skipped.
    fn push(&mut self, value: &Value) {
        let Some(magnitude) = value.as_f64() else {
            return;
        };

        self.float_sum += magnitude;
        self.int_sum = match (self.int_sum, value) {
            (Some(sum), Value::Int(n)) => sum.checked_add(*n),
            _ => None,
        };

        if self
            .min
            .as_ref()
            .is_none_or(|min| strict_order_cmp(value, min) == Some(Ordering::Less))
        {
            self.min = Some(value.clone());
        }
        if self
            .max
            .as_ref()
            .is_none_or(|max| strict_order_cmp(value, max) == Some(Ordering::Greater))
        {
            self.max = Some(value.clone());
        }
    }

    fn sum(&self) -> Value {
        self.int_sum
            .map_or(Value::Float(self.float_sum), Value::Int)
    }

    #[allow(clippy::cast_precision_loss)]
    fn avg(&self, count: usize) -> Value {
        if count == 0 {
            return Value::Null;
        }

        Value::Float(self.float_sum / count as f64)
    }
}
