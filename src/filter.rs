use std::collections::{BTreeMap, BTreeSet};

use crate::models::{CleanedTable, Transaction};

/// Sentinel option meaning "no restriction".
pub const ALL: &str = "All";

/// A column the dashboard can be filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dimension {
    Month,
    Company,
}

impl Dimension {
    pub const EVERY: [Dimension; 2] = [Dimension::Month, Dimension::Company];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Month => "Month",
            Self::Company => "Company",
        }
    }

    pub fn value<'a>(&self, t: &'a Transaction) -> &'a str {
        match self {
            Self::Month => &t.month_year,
            Self::Company => &t.company_name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    All,
    Value(String),
}

impl Selection {
    /// `"All"` (or nothing) selects everything; any other text is an exact value.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None => Self::All,
            Some(s) if s == ALL => Self::All,
            Some(s) => Self::Value(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::All => ALL,
            Self::Value(v) => v,
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::All => true,
            Self::Value(v) => v == value,
        }
    }
}

/// The user's current choice for every dimension. Unset dimensions are `All`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selections {
    chosen: BTreeMap<Dimension, Selection>,
}

impl Selections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, dimension: Dimension, selection: Selection) -> Self {
        self.set(dimension, selection);
        self
    }

    pub fn set(&mut self, dimension: Dimension, selection: Selection) {
        self.chosen.insert(dimension, selection);
    }

    pub fn get(&self, dimension: Dimension) -> &Selection {
        static UNRESTRICTED: Selection = Selection::All;
        self.chosen.get(&dimension).unwrap_or(&UNRESTRICTED)
    }

    pub fn from_args(month: Option<&str>, company: Option<&str>) -> Self {
        Self::new()
            .with(Dimension::Month, Selection::parse(month))
            .with(Dimension::Company, Selection::parse(company))
    }

    pub fn is_unrestricted(&self) -> bool {
        self.chosen.values().all(|s| *s == Selection::All)
    }

    pub fn matches(&self, t: &Transaction) -> bool {
        self.chosen
            .iter()
            .all(|(dimension, selection)| selection.matches(dimension.value(t)))
    }

    /// Human-readable summary, e.g. "Month: 01/2025, Company: All".
    pub fn describe(&self) -> String {
        Dimension::EVERY
            .iter()
            .map(|d| format!("{}: {}", d.label(), self.get(*d).as_str()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Rows matching every restricting selection. The source is only borrowed.
pub fn filter<'a, I>(rows: I, selections: &Selections) -> Vec<&'a Transaction>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    rows.into_iter().filter(|t| selections.matches(t)).collect()
}

/// Choices offered for one dimension: `"All"` then the sorted distinct values.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOption {
    pub dimension: Dimension,
    pub values: Vec<String>,
}

impl FilterOption {
    /// Index of `selection` in `values`. Slot 0 is the sentinel, so a real
    /// value spelled "All" is looked up after it.
    pub fn position(&self, selection: &Selection) -> Option<usize> {
        match selection {
            Selection::All => Some(0),
            Selection::Value(v) => self
                .values
                .iter()
                .skip(1)
                .position(|x| x == v)
                .map(|i| i + 1),
        }
    }
}

pub fn filter_options(table: &CleanedTable) -> Vec<FilterOption> {
    Dimension::EVERY
        .iter()
        .map(|&dimension| {
            let distinct: BTreeSet<&str> = table.rows().map(|t| dimension.value(t)).collect();
            let mut values = Vec::with_capacity(distinct.len() + 1);
            values.push(ALL.to_string());
            values.extend(distinct.into_iter().map(str::to_string));
            FilterOption { dimension, values }
        })
        .collect()
}
