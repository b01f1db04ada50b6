//! Declarative chart descriptions.
//!
//! The adapter turns aggregates (or raw records for the comparison panel)
//! into plain data: traces plus a small layout. Nothing here knows about
//! egui; the UI translates a [`ChartSpec`] into plot items, and the
//! `report` command serializes it as JSON.

pub mod adapter;

use std::fmt;

use serde::Serialize;

use crate::color::ChartColor;

// ---------------------------------------------------------------------------
// Panels and their render modes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Panel {
    /// Sales by vehicle mode.
    Category,
    /// Sales by region.
    Regional,
    /// Sales by year.
    Trend,
    /// Price against efficiency or range, per record.
    Comparison,
}

impl Panel {
    pub const ALL: [Panel; 4] = [
        Panel::Category,
        Panel::Regional,
        Panel::Trend,
        Panel::Comparison,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Panel::Category => "By vehicle type",
            Panel::Regional => "By region",
            Panel::Trend => "Yearly trend",
            Panel::Comparison => "Price comparison",
        }
    }

    /// The two render modes this panel offers; the first is the default.
    pub fn kinds(self) -> [ChartKind; 2] {
        match self {
            Panel::Category => [ChartKind::Pie, ChartKind::Bar],
            Panel::Regional => [ChartKind::Bar, ChartKind::HorizontalBar],
            Panel::Trend => [ChartKind::Line, ChartKind::Area],
            Panel::Comparison => [ChartKind::Scatter, ChartKind::Bubble],
        }
    }

    pub fn default_kind(self) -> ChartKind {
        self.kinds()[0]
    }

    pub fn supports(self, kind: ChartKind) -> bool {
        self.kinds().contains(&kind)
    }
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Pie,
    Bar,
    HorizontalBar,
    Line,
    Area,
    Scatter,
    Bubble,
}

impl ChartKind {
    pub fn label(self) -> &'static str {
        match self {
            ChartKind::Pie => "Pie",
            ChartKind::Bar => "Bar",
            ChartKind::HorizontalBar => "Horizontal",
            ChartKind::Line => "Line",
            ChartKind::Area => "Area",
            ChartKind::Scatter => "Scatter",
            ChartKind::Bubble => "Bubble",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Chart description
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub panel: Panel,
    pub kind: ChartKind,
    pub layout: Layout,
    pub body: ChartBody,
}

impl ChartSpec {
    /// Whether there is anything to draw (and therefore to export).
    pub fn has_plot(&self) -> bool {
        matches!(self.body, ChartBody::Traces(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartBody {
    Traces(Vec<Trace>),
    /// Shown instead of a plot when the view lacks the required data.
    Placeholder(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trace {
    Pie {
        labels: Vec<String>,
        values: Vec<f64>,
        colors: Vec<ChartColor>,
        /// Inner radius as a fraction of the outer radius.
        hole: f32,
    },
    Bar {
        categories: Vec<String>,
        values: Vec<f64>,
        colors: Vec<ChartColor>,
        orientation: Orientation,
        /// Print each bar's value on it.
        show_values: bool,
    },
    Line {
        x: Vec<f64>,
        y: Vec<f64>,
        color: ChartColor,
        width: f32,
        markers: bool,
        /// Fill down to y = 0.
        fill: bool,
    },
    Markers {
        points: Vec<Marker>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub x: f64,
    pub y: f64,
    /// Diameter in screen points.
    pub size: f32,
    pub color: ChartColor,
    /// Hover text, one line per entry.
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub x_title: String,
    pub y_title: String,
    pub show_legend: bool,
    /// Format the y axis as US dollars.
    pub y_currency: bool,
}
