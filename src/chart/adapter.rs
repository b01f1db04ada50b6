use crate::color::{self, ChartColor};
use crate::data::aggregate::Aggregate;
use crate::data::model::Record;
use crate::insights::format_thousands;

use super::{ChartBody, ChartKind, ChartSpec, Layout, Marker, Orientation, Panel, Trace};

const UNITS_SOLD: &str = "Units sold";
const PRICE_USD: &str = "Price (USD)";

pub const NO_DATA: &str = "No data for the current filters";
pub const NO_COMPARISON_DATA: &str = "Not enough data to show the comparison";

const SCATTER_DIAMETER: f32 = 8.0;
const BUBBLE_MIN_DIAMETER: f32 = 4.0;

/// Everything the four panels draw from, computed once per filter change.
#[derive(Debug, Clone, Copy)]
pub struct ChartInputs<'a> {
    pub by_mode: &'a Aggregate,
    pub by_region: &'a Aggregate,
    pub by_year: &'a Aggregate,
    /// The filtered records, for the comparison panel.
    pub records: &'a [&'a Record],
    /// Dataset-wide region list, so colours stay stable across filters.
    pub all_regions: &'a [String],
    /// Dataset-wide mode list, same purpose.
    pub all_modes: &'a [String],
}

/// Build the description for `panel`. A kind the panel does not offer is
/// replaced by the panel's default.
pub fn build(panel: Panel, kind: ChartKind, inputs: &ChartInputs<'_>) -> ChartSpec {
    let kind = if panel.supports(kind) {
        kind
    } else {
        log::warn!("{kind} is not available for {panel}, using {}", panel.default_kind());
        panel.default_kind()
    };

    match panel {
        Panel::Category => category_chart(inputs.by_mode, kind),
        Panel::Regional => regional_chart(inputs.by_region, kind),
        Panel::Trend => trend_chart(inputs.by_year, kind),
        Panel::Comparison => {
            comparison_chart(inputs.records, kind, inputs.all_regions, inputs.all_modes)
        }
    }
}

fn placeholder(panel: Panel, kind: ChartKind, layout: Layout, message: &str) -> ChartSpec {
    ChartSpec {
        panel,
        kind,
        layout,
        body: ChartBody::Placeholder(message.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Panel 1: sales by mode
// ---------------------------------------------------------------------------

pub fn category_chart(by_mode: &Aggregate, kind: ChartKind) -> ChartSpec {
    let layout = Layout {
        x_title: "Vehicle type (mode)".to_string(),
        y_title: UNITS_SOLD.to_string(),
        show_legend: kind != ChartKind::Bar,
        y_currency: false,
    };
    if by_mode.is_empty() {
        return placeholder(Panel::Category, kind, layout, NO_DATA);
    }

    let colors = color::categorical(by_mode.len());
    let trace = match kind {
        ChartKind::Bar => Trace::Bar {
            categories: by_mode.keys(),
            values: by_mode.values(),
            colors,
            orientation: Orientation::Vertical,
            show_values: true,
        },
        _ => Trace::Pie {
            labels: by_mode.keys(),
            values: by_mode.values(),
            colors,
            hole: 0.4,
        },
    };

    ChartSpec {
        panel: Panel::Category,
        kind,
        layout,
        body: ChartBody::Traces(vec![trace]),
    }
}

// ---------------------------------------------------------------------------
// Panel 2: sales by region
// ---------------------------------------------------------------------------

pub fn regional_chart(by_region: &Aggregate, kind: ChartKind) -> ChartSpec {
    let (orientation, x_title, y_title) = match kind {
        ChartKind::HorizontalBar => (Orientation::Horizontal, UNITS_SOLD, "Region"),
        _ => (Orientation::Vertical, "Region", UNITS_SOLD),
    };
    let layout = Layout {
        x_title: x_title.to_string(),
        y_title: y_title.to_string(),
        show_legend: false,
        y_currency: false,
    };
    if by_region.is_empty() {
        return placeholder(Panel::Regional, kind, layout, NO_DATA);
    }

    let trace = Trace::Bar {
        categories: by_region.keys(),
        values: by_region.values(),
        colors: color::categorical(by_region.len()),
        orientation,
        show_values: orientation == Orientation::Vertical,
    };

    ChartSpec {
        panel: Panel::Regional,
        kind,
        layout,
        body: ChartBody::Traces(vec![trace]),
    }
}

// ---------------------------------------------------------------------------
// Panel 3: sales by year
// ---------------------------------------------------------------------------

pub fn trend_chart(by_year: &Aggregate, kind: ChartKind) -> ChartSpec {
    let layout = Layout {
        x_title: "Year".to_string(),
        y_title: UNITS_SOLD.to_string(),
        show_legend: false,
        y_currency: false,
    };
    // Group keys are year strings; anything unparsable would have been
    // dropped at ingestion as year 0.
    let points: Vec<(f64, f64)> = by_year
        .sorted_by_key()
        .entries()
        .iter()
        .filter_map(|e| e.key.parse::<f64>().ok().map(|year| (year, e.value)))
        .collect();
    if points.is_empty() {
        return placeholder(Panel::Trend, kind, layout, NO_DATA);
    }

    let area = kind == ChartKind::Area;
    let trace = Trace::Line {
        x: points.iter().map(|p| p.0).collect(),
        y: points.iter().map(|p| p.1).collect(),
        color: ChartColor::from_hex(color::PRIMARY_HEX),
        width: if area { 3.0 } else { 4.0 },
        markers: !area,
        fill: area,
    };

    ChartSpec {
        panel: Panel::Trend,
        kind,
        layout,
        body: ChartBody::Traces(vec![trace]),
    }
}

// ---------------------------------------------------------------------------
// Panel 4: price comparison over raw records
// ---------------------------------------------------------------------------

/// Records usable in the comparison: all three plotted metrics positive.
pub fn comparable(rec: &Record) -> bool {
    rec.efficiency > 0.0 && rec.price > 0.0 && rec.range_km > 0.0
}

pub fn comparison_chart(
    records: &[&Record],
    kind: ChartKind,
    all_regions: &[String],
    all_modes: &[String],
) -> ChartSpec {
    let bubble = kind == ChartKind::Bubble;
    let layout = Layout {
        x_title: if bubble { "Range (km)" } else { "Efficiency (km/kWh)" }.to_string(),
        y_title: PRICE_USD.to_string(),
        show_legend: false,
        y_currency: true,
    };

    let valid: Vec<&Record> = records.iter().copied().filter(|r| comparable(r)).collect();
    if valid.is_empty() {
        return placeholder(Panel::Comparison, kind, layout, NO_COMPARISON_DATA);
    }

    let points = if bubble {
        let palette = color::categorical(all_modes.len());
        valid
            .iter()
            .map(|r| Marker {
                x: r.range_km,
                y: r.price,
                size: bubble_diameter(r.sales_volume),
                color: color::color_for_key(&r.mode, all_modes, &palette),
                label: format!(
                    "{} - {}\nRange: {} km\nPrice: ${}\nSales: {}",
                    r.mode,
                    r.region,
                    format_thousands(r.range_km, 0),
                    format_thousands(r.price, 0),
                    format_thousands(r.sales_volume, 0)
                ),
            })
            .collect()
    } else {
        let palette = color::categorical(all_regions.len());
        valid
            .iter()
            .map(|r| Marker {
                x: r.efficiency,
                y: r.price,
                size: SCATTER_DIAMETER,
                color: color::color_for_key(&r.region, all_regions, &palette),
                label: format!(
                    "{} - {} ({})\nEfficiency: {:.2} km/kWh\nPrice: ${}",
                    r.mode,
                    r.region,
                    r.year,
                    r.efficiency,
                    format_thousands(r.price, 0)
                ),
            })
            .collect()
    };

    ChartSpec {
        panel: Panel::Comparison,
        kind,
        layout,
        body: ChartBody::Traces(vec![Trace::Markers { points }]),
    }
}

/// Marker diameter grows with the square root of sales, never below the
/// minimum so small sellers stay visible.
pub fn bubble_diameter(sales_volume: f64) -> f32 {
    (sales_volume.max(0.0).sqrt() as f32).max(BUBBLE_MIN_DIAMETER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::aggregate::AggregateEntry;

    fn agg(entries: &[(&str, f64)]) -> Aggregate {
        entries
            .iter()
            .map(|(k, v)| AggregateEntry::new(*k, *v))
            .collect::<Vec<_>>()
            .into()
    }

    fn rec(region: &str, mode: &str, price: f64, range_km: f64, efficiency: f64) -> Record {
        Record {
            year: 2021,
            region: region.into(),
            mode: mode.into(),
            sales_volume: 400.0,
            price,
            range_km,
            efficiency,
            ..Default::default()
        }
    }

    fn traces(spec: &ChartSpec) -> &[Trace] {
        match &spec.body {
            ChartBody::Traces(t) => t,
            ChartBody::Placeholder(msg) => panic!("unexpected placeholder: {msg}"),
        }
    }

    #[test]
    fn category_pie_and_bar() {
        let by_mode = agg(&[("SUV", 15.0), ("Sedan", 3.0)]);

        let pie = category_chart(&by_mode, ChartKind::Pie);
        assert!(pie.layout.show_legend);
        match &traces(&pie)[0] {
            Trace::Pie { labels, values, colors, hole } => {
                assert_eq!(labels, &["SUV", "Sedan"]);
                assert_eq!(values, &[15.0, 3.0]);
                assert_eq!(colors.len(), 2);
                assert_eq!(*hole, 0.4);
            }
            other => panic!("expected pie, got {other:?}"),
        }

        let bar = category_chart(&by_mode, ChartKind::Bar);
        assert!(!bar.layout.show_legend);
        assert!(matches!(
            &traces(&bar)[0],
            Trace::Bar { orientation: Orientation::Vertical, show_values: true, .. }
        ));
    }

    #[test]
    fn regional_horizontal_bar() {
        let spec = regional_chart(&agg(&[("Europe", 9.0)]), ChartKind::HorizontalBar);
        assert!(matches!(
            &traces(&spec)[0],
            Trace::Bar { orientation: Orientation::Horizontal, .. }
        ));
        assert_eq!(spec.layout.y_title, "Region");
    }

    #[test]
    fn trend_is_sorted_by_year() {
        let spec = trend_chart(&agg(&[("2022", 3.0), ("2020", 1.0), ("2021", 2.0)]), ChartKind::Line);
        match &traces(&spec)[0] {
            Trace::Line { x, y, markers, fill, .. } => {
                assert_eq!(x, &[2020.0, 2021.0, 2022.0]);
                assert_eq!(y, &[1.0, 2.0, 3.0]);
                assert!(*markers);
                assert!(!*fill);
            }
            other => panic!("expected line, got {other:?}"),
        }

        let area = trend_chart(&agg(&[("2020", 1.0)]), ChartKind::Area);
        assert!(matches!(&traces(&area)[0], Trace::Line { fill: true, markers: false, .. }));
    }

    #[test]
    fn empty_aggregates_render_placeholders() {
        let empty = Aggregate::default();
        for spec in [
            category_chart(&empty, ChartKind::Pie),
            regional_chart(&empty, ChartKind::Bar),
            trend_chart(&empty, ChartKind::Line),
        ] {
            assert_eq!(spec.body, ChartBody::Placeholder(NO_DATA.to_string()));
            assert!(!spec.has_plot());
        }
    }

    #[test]
    fn comparison_skips_incomplete_records() {
        let records = [
            rec("Europe", "SUV", 40_000.0, 300.0, 5.0),
            rec("Europe", "SUV", 0.0, 300.0, 5.0),
            rec("Asia", "Van", 35_000.0, 0.0, 5.0),
        ];
        let refs: Vec<&Record> = records.iter().collect();
        let regions = vec!["Asia".to_string(), "Europe".to_string()];
        let modes = vec!["SUV".to_string(), "Van".to_string()];

        let spec = comparison_chart(&refs, ChartKind::Scatter, &regions, &modes);
        let Trace::Markers { points } = &traces(&spec)[0] else {
            panic!("expected markers");
        };
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].x, 5.0);
        assert_eq!(points[0].size, SCATTER_DIAMETER);
        assert_eq!(points[0].color, color::categorical(2)[1]);
        assert!(spec.layout.y_currency);
    }

    #[test]
    fn bubble_sizes_follow_sales() {
        let records = [rec("Europe", "SUV", 40_000.0, 300.0, 5.0)];
        let refs: Vec<&Record> = records.iter().collect();
        let modes = vec!["SUV".to_string()];
        let spec = comparison_chart(&refs, ChartKind::Bubble, &[], &modes);
        let Trace::Markers { points } = &traces(&spec)[0] else {
            panic!("expected markers");
        };
        assert_eq!(points[0].x, 300.0);
        assert_eq!(points[0].size, 20.0);
        assert_eq!(bubble_diameter(4.0), BUBBLE_MIN_DIAMETER);
    }

    #[test]
    fn comparison_without_valid_records_is_a_placeholder() {
        let spec = comparison_chart(&[], ChartKind::Scatter, &[], &[]);
        assert_eq!(spec.body, ChartBody::Placeholder(NO_COMPARISON_DATA.to_string()));
    }

    #[test]
    fn unsupported_kind_falls_back_to_default() {
        let empty = Aggregate::default();
        let inputs = ChartInputs {
            by_mode: &empty,
            by_region: &empty,
            by_year: &empty,
            records: &[],
            all_regions: &[],
            all_modes: &[],
        };
        assert_eq!(build(Panel::Trend, ChartKind::Pie, &inputs).kind, ChartKind::Line);
    }

    #[test]
    fn specs_serialize_to_json() {
        let spec = category_chart(&agg(&[("SUV", 1.0)]), ChartKind::Pie);
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["panel"], "category");
        assert_eq!(json["body"]["traces"][0]["type"], "pie");
        assert_eq!(json["body"]["traces"][0]["colors"][0], "#2E86AB");
    }
}
