use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize};

/// Delimiter separating the assignment type from the rest of an assignment key.
pub const TYPE_DELIMITER: char = '_';

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_graded_fields: u64,
}

/// Grading record of one person. Missing (or `null`) parts of a record are
/// treated as zero / empty instead of failing the load.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PersonRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub statistics: Statistics,
    #[serde(default, deserialize_with = "null_as_default")]
    pub graded_assignments: IndexMap<String, u64>,
}

/// Person name -> record, in document order.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Dataset {
    people: IndexMap<String, PersonRecord>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Dataset {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn from_slice(raw: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(raw)
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&PersonRecord> {
        self.people.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PersonRecord)> {
        self.people.iter().map(|(name, record)| (name.as_str(), record))
    }

    /// Sum of `totalGradedFields` over every person, independent of any filter.
    pub fn team_total(&self) -> u64 {
        self.people
            .values()
            .map(|r| r.statistics.total_graded_fields)
            .fold(0u64, u64::saturating_add)
    }

    /// Distinct assignment types in first-seen order. Keys starting with the
    /// delimiter have no type and are not listed.
    pub fn assignment_types(&self) -> Vec<String> {
        self.people
            .values()
            .flat_map(|r| r.graded_assignments.keys())
            .map(|key| assignment_type(key))
            .filter(|t| !t.is_empty())
            .unique()
            .map(|t| t.to_string())
            .collect()
    }

    /// Summed assignment counts per type, in first-seen type order.
    pub fn type_totals(&self) -> Vec<(String, u64)> {
        let mut totals: IndexMap<&str, u64> = IndexMap::new();
        for record in self.people.values() {
            for (key, count) in record.graded_assignments.iter() {
                let t = assignment_type(key);
                if t.is_empty() {
                    continue;
                }
                let total = totals.entry(t).or_insert(0);
                *total = total.saturating_add(*count);
            }
        }
        totals
            .into_iter()
            .map(|(t, total)| (t.to_string(), total))
            .collect()
    }
}

impl FromIterator<(String, PersonRecord)> for Dataset {
    fn from_iter<I: IntoIterator<Item = (String, PersonRecord)>>(iter: I) -> Self {
        Self {
            people: iter.into_iter().collect(),
        }
    }
}

/// Type prefix of an assignment key: everything before the first underscore.
pub fn assignment_type(key: &str) -> &str {
    match key.split_once(TYPE_DELIMITER) {
        Some((prefix, _)) => prefix,
        None => key,
    }
}
