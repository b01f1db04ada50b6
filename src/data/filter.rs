use std::collections::BTreeMap;
use std::fmt;

use super::model::{Dataset, Record};

// ---------------------------------------------------------------------------
// Filter predicates: one optional selected value per selector
// ---------------------------------------------------------------------------

/// The three selectors offered by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterField {
    Year,
    Region,
    Mode,
}

impl FilterField {
    pub fn label(self) -> &'static str {
        match self {
            FilterField::Year => "Year",
            FilterField::Region => "Region",
            FilterField::Mode => "Vehicle type",
        }
    }

    /// Record's value for this selector, rendered the way selections are.
    fn value_of(self, rec: &Record) -> std::borrow::Cow<'_, str> {
        match self {
            FilterField::Year => rec.year.to_string().into(),
            FilterField::Region => rec.region.as_str().into(),
            FilterField::Mode => rec.mode.as_str().into(),
        }
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Active selections. A selector that is absent (or was set to an empty
/// value) does not constrain anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    selected: BTreeMap<FilterField, String>,
}

impl FilterState {
    /// Set or clear one selector. Blank values clear it.
    pub fn set(&mut self, field: FilterField, value: Option<String>) {
        match value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            Some(v) => {
                self.selected.insert(field, v);
            }
            None => {
                self.selected.remove(&field);
            }
        }
    }

    pub fn with(mut self, field: FilterField, value: impl Into<String>) -> Self {
        self.set(field, Some(value.into()));
        self
    }

    pub fn get(&self, field: FilterField) -> Option<&str> {
        self.selected.get(&field).map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Whether no selector is active.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Active selectors, in `FilterField` order.
    pub fn active(&self) -> impl Iterator<Item = (FilterField, &str)> {
        self.selected.iter().map(|(f, v)| (*f, v.as_str()))
    }

    /// AND across every active selector, equality per field.
    pub fn matches(&self, rec: &Record) -> bool {
        self.active()
            .all(|(field, wanted)| field.value_of(rec) == wanted)
    }
}

// ---------------------------------------------------------------------------
// FilteredView – indices of records passing the current filters
// ---------------------------------------------------------------------------

/// Positions into the owning [`Dataset`], in dataset order. Recomputed in
/// full on every filter change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredView {
    indices: Vec<usize>,
}

impl FilteredView {
    /// Return the records of `dataset` that pass all active filters.
    pub fn compute(dataset: &Dataset, filters: &FilterState) -> Self {
        let indices = dataset
            .records()
            .iter()
            .enumerate()
            .filter(|(_, rec)| filters.matches(rec))
            .map(|(i, _)| i)
            .collect();
        FilteredView { indices }
    }

    /// The unfiltered view.
    pub fn all(dataset: &Dataset) -> Self {
        FilteredView {
            indices: (0..dataset.len()).collect(),
        }
    }

    /// Resolve the view against the dataset it was computed from.
    pub fn records<'a>(&'a self, dataset: &'a Dataset) -> impl Iterator<Item = &'a Record> + Clone {
        let all = dataset.records();
        self.indices.iter().filter_map(move |&i| all.get(i))
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Filter an arbitrary record sequence, keeping order.
pub fn filter_records<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    filters: &FilterState,
) -> Vec<&'a Record> {
    records.into_iter().filter(|r| filters.matches(r)).collect()
}
