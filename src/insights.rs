//! Derived headline figures for the current view.
//!
//! Every figure here is guarded against empty input: averages over no
//! records and growth from a zero year come back as explicit variants,
//! never as NaN or infinity.

use std::collections::BTreeSet;
use std::fmt;

use num_format::{Locale, ToFormattedString};
use serde::Serialize;

use crate::data::aggregate::{Aggregate, AggregateEntry};
use crate::data::model::Record;

// ---------------------------------------------------------------------------
// Header statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HeaderStats {
    /// Sum of `sales_volume`.
    pub total_vehicles: f64,
    pub regions: usize,
    pub years: usize,
}

impl HeaderStats {
    pub fn compute<'a>(records: impl IntoIterator<Item = &'a Record>) -> Self {
        let mut total_vehicles = 0.0;
        let mut regions = BTreeSet::new();
        let mut years = BTreeSet::new();
        for rec in records {
            total_vehicles += rec.sales_volume;
            regions.insert(rec.region.as_str());
            years.insert(rec.year);
        }
        HeaderStats {
            total_vehicles,
            regions: regions.len(),
            years: years.len(),
        }
    }
}

// ---------------------------------------------------------------------------
// Growth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "percent", rename_all = "snake_case")]
pub enum Growth {
    /// Fewer than two years in view; reported as 0 %.
    SingleYear,
    /// The previous year summed to zero, so no ratio exists.
    FromZero,
    /// Rounded to one decimal.
    Percent(f64),
}

impl Growth {
    /// Year-over-year change between the last two years of `by_year`
    /// (ordered by year, not by insertion).
    pub fn from_by_year(by_year: &Aggregate) -> Growth {
        let sorted = by_year.sorted_by_key();
        let [.., previous, latest] = sorted.entries() else {
            return Growth::SingleYear;
        };
        if previous.value == 0.0 {
            return Growth::FromZero;
        }
        let pct = (latest.value - previous.value) / previous.value * 100.0;
        Growth::Percent(round_to(pct, 1))
    }

    /// Numeric value shown on the dashboard, `None` when undefined.
    pub fn percent(&self) -> Option<f64> {
        match self {
            Growth::SingleYear => Some(0.0),
            Growth::FromZero => None,
            Growth::Percent(v) => Some(*v),
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

// ---------------------------------------------------------------------------
// Insight set
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub top_mode: AggregateEntry,
    pub top_region: AggregateEntry,
    pub growth: Growth,
    /// `None` when no records are in view.
    pub avg_price: Option<f64>,
    pub avg_range: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Insights {
    InsufficientData,
    Summary(Summary),
}

/// Derive the insight set. Any empty grouping means there is nothing
/// meaningful to say, so no partial results are produced.
pub fn summarize<'a>(
    by_mode: &Aggregate,
    by_region: &Aggregate,
    by_year: &Aggregate,
    records: impl IntoIterator<Item = &'a Record>,
) -> Insights {
    let (Some(top_mode), Some(top_region)) = (by_mode.max_entry(), by_region.max_entry()) else {
        return Insights::InsufficientData;
    };
    if by_year.is_empty() {
        return Insights::InsufficientData;
    }

    let mut count = 0usize;
    let mut price_sum = 0.0;
    let mut range_sum = 0.0;
    for rec in records {
        count += 1;
        price_sum += rec.price;
        range_sum += rec.range_km;
    }
    let mean = |sum: f64| (count > 0).then(|| sum / count as f64);

    Insights::Summary(Summary {
        top_mode: top_mode.clone(),
        top_region: top_region.clone(),
        growth: Growth::from_by_year(by_year),
        avg_price: mean(price_sum),
        avg_range: mean(range_sum),
    })
}

impl Insights {
    /// Human-readable bullet lines for the insights panel and the report.
    pub fn lines(&self) -> Vec<String> {
        let summary = match self {
            Insights::InsufficientData => {
                return vec!["Not enough data to generate insights.".to_string()]
            }
            Insights::Summary(s) => s,
        };

        let growth = match summary.growth.percent() {
            Some(pct) => format!("The market shows {pct:.1}% growth over the last year."),
            None => "Growth over the last year is undefined (no sales the year before).".to_string(),
        };
        let or_na = |v: Option<f64>, fmt: &dyn Fn(f64) -> String| v.map_or("n/a".to_string(), fmt);

        vec![
            format!(
                "{} is the best-selling vehicle type with {} units.",
                summary.top_mode.key,
                format_thousands(summary.top_mode.value, 0)
            ),
            format!(
                "{} leads regional sales with {} units.",
                summary.top_region.key,
                format_thousands(summary.top_region.value, 0)
            ),
            growth,
            format!(
                "Average price: {}",
                or_na(summary.avg_price, &|v| format!("${}", format_thousands(v, 0)))
            ),
            format!(
                "Average range: {}",
                or_na(summary.avg_range, &|v| format!("{} km", format_thousands(v, 0)))
            ),
        ]
    }
}

impl fmt::Display for Insights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "- {line}")?;
        }
        Ok(())
    }
}

/// `1234567.891` with 2 decimals → `"1,234,567.89"`.
pub fn format_thousands(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };
    let grouped = match int_part.parse::<u128>() {
        Ok(n) => n.to_formatted_string(&Locale::en),
        Err(_) => int_part.to_string(),
    };

    let negative = value < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0');
    let sign = if negative { "-" } else { "" };
    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}
