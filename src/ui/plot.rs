use std::f32::consts::TAU;
use std::ops::RangeInclusive;

use eframe::egui::{
    self, epaint::Mesh, Align2, Color32, FontId, Pos2, Rect, RichText, Sense, Shape, Stroke, Ui,
};
use egui_plot::{
    Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoint, PlotPoints, Points, Text,
};

use ev_dashboard::chart::{ChartBody, ChartSpec, Marker, Orientation, Trace};
use ev_dashboard::color::ChartColor;
use ev_dashboard::insights::format_thousands;

fn color32(c: ChartColor) -> Color32 {
    Color32::from_rgb(c.r, c.g, c.b)
}

// ---------------------------------------------------------------------------
// Chart view (central panel)
// ---------------------------------------------------------------------------

/// Render one chart description. Returns the screen rect the chart covers,
/// or `None` when only a placeholder was shown.
pub fn chart_view(ui: &mut Ui, spec: &ChartSpec) -> Option<Rect> {
    let traces = match &spec.body {
        ChartBody::Traces(traces) => traces,
        ChartBody::Placeholder(message) => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading(RichText::new(message).weak());
            });
            return None;
        }
    };

    // A pie is never mixed with other traces.
    if let [Trace::Pie {
        labels,
        values,
        colors,
        hole,
    }] = traces.as_slice()
    {
        return Some(pie_chart(ui, labels, values, colors, *hole, spec.layout.show_legend));
    }

    Some(xy_plot(ui, spec, traces))
}

// ---------------------------------------------------------------------------
// Cartesian plots: bars, lines and markers
// ---------------------------------------------------------------------------

fn xy_plot(ui: &mut Ui, spec: &ChartSpec, traces: &[Trace]) -> Rect {
    let layout = &spec.layout;
    let categories = traces.iter().find_map(|t| match t {
        Trace::Bar {
            categories,
            orientation,
            ..
        } => Some((categories.clone(), *orientation)),
        _ => None,
    });
    let markers: Vec<Marker> = traces
        .iter()
        .filter_map(|t| match t {
            Trace::Markers { points } => Some(points.iter().cloned()),
            _ => None,
        })
        .flatten()
        .collect();

    let mut plot = Plot::new(("chart", spec.panel))
        .x_axis_label(layout.x_title.as_str())
        .y_axis_label(layout.y_title.as_str())
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);

    if layout.show_legend {
        plot = plot.legend(Legend::default());
    }

    match categories.clone() {
        Some((names, Orientation::Vertical)) => {
            plot = plot
                .x_axis_formatter(category_formatter(names))
                .y_axis_formatter(|mark: GridMark, _range: &RangeInclusive<f64>| {
                    format_thousands(mark.value, 0)
                });
        }
        Some((names, Orientation::Horizontal)) => {
            plot = plot
                .y_axis_formatter(category_formatter(names))
                .x_axis_formatter(|mark: GridMark, _range: &RangeInclusive<f64>| {
                    format_thousands(mark.value, 0)
                });
        }
        None if layout.y_currency => {
            plot = plot.y_axis_formatter(|mark: GridMark, _range: &RangeInclusive<f64>| {
                format!("${}", format_thousands(mark.value, 0))
            });
        }
        None => {
            plot = plot.y_axis_formatter(|mark: GridMark, _range: &RangeInclusive<f64>| {
                format_thousands(mark.value, 0)
            });
        }
    }

    if categories.is_some() {
        plot = plot.show_x(false).show_y(false);
    } else if !markers.is_empty() {
        let (x_title, y_title) = (layout.x_title.clone(), layout.y_title.clone());
        plot = plot.label_formatter(move |_name: &str, value: &PlotPoint| {
            match nearest_marker(&markers, value) {
                Some(marker) => marker.label.clone(),
                None => format!("{x_title}: {:.2}\n{y_title}: {:.2}", value.x, value.y),
            }
        });
    } else {
        plot = plot.label_formatter(|_name: &str, value: &PlotPoint| {
            format!("{:.0}: {}", value.x, format_thousands(value.y, 0))
        });
    }

    let response = plot.show(ui, |plot_ui| {
        for trace in traces {
            match trace {
                Trace::Bar {
                    categories,
                    values,
                    colors,
                    orientation,
                    show_values,
                } => {
                    let bars: Vec<Bar> = categories
                        .iter()
                        .zip(values)
                        .enumerate()
                        .map(|(i, (name, &value))| {
                            let color = colors.get(i).copied().map(color32).unwrap_or(Color32::GRAY);
                            Bar::new(i as f64, value)
                                .name(name)
                                .fill(color)
                                .width(0.6)
                        })
                        .collect();
                    let mut chart = BarChart::new(bars).name("Units sold");
                    if *orientation == Orientation::Horizontal {
                        chart = chart.horizontal();
                    }
                    plot_ui.bar_chart(chart);

                    if *show_values {
                        for (i, &value) in values.iter().enumerate() {
                            let (pos, anchor) = match orientation {
                                Orientation::Vertical => {
                                    (PlotPoint::new(i as f64, value), Align2::CENTER_BOTTOM)
                                }
                                Orientation::Horizontal => {
                                    (PlotPoint::new(value, i as f64), Align2::LEFT_CENTER)
                                }
                            };
                            plot_ui.text(
                                Text::new(pos, format_thousands(value, 0)).anchor(anchor),
                            );
                        }
                    }
                }
                Trace::Line {
                    x,
                    y,
                    color,
                    width,
                    markers,
                    fill,
                } => {
                    let points: Vec<[f64; 2]> =
                        x.iter().zip(y).map(|(&xi, &yi)| [xi, yi]).collect();
                    let mut line = Line::new(PlotPoints::from(points.clone()))
                        .color(color32(*color))
                        .width(*width);
                    if *fill {
                        line = line.fill(0.0);
                    }
                    plot_ui.line(line);
                    if *markers {
                        plot_ui.points(
                            Points::new(PlotPoints::from(points))
                                .radius(*width + 1.0)
                                .color(color32(*color)),
                        );
                    }
                }
                Trace::Markers { points } => {
                    for marker in points {
                        plot_ui.points(
                            Points::new(PlotPoints::from(vec![[marker.x, marker.y]]))
                                .radius(marker.size / 2.0)
                                .color(color32(marker.color).gamma_multiply(0.7))
                                .filled(true),
                        );
                    }
                }
                Trace::Pie { .. } => log::warn!("pie trace inside a cartesian plot ignored"),
            }
        }
    });

    response.response.rect
}

/// Axis labels for integer bar positions.
fn category_formatter(names: Vec<String>) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark: GridMark, _range: &RangeInclusive<f64>| {
        let idx = mark.value.round();
        if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        names.get(idx as usize).cloned().unwrap_or_default()
    }
}

/// The marker closest to the hovered point, if one is reasonably near.
fn nearest_marker<'a>(markers: &'a [Marker], at: &PlotPoint) -> Option<&'a Marker> {
    let (x_span, y_span) = markers.iter().fold((0.0f64, 0.0f64), |(xs, ys), m| {
        (xs.max(m.x.abs()), ys.max(m.y.abs()))
    });
    let x_span = x_span.max(f64::EPSILON);
    let y_span = y_span.max(f64::EPSILON);

    markers
        .iter()
        .map(|m| {
            let dx = (m.x - at.x) / x_span;
            let dy = (m.y - at.y) / y_span;
            (m, dx * dx + dy * dy)
        })
        .filter(|(_, d)| *d < 0.0004)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(m, _)| m)
}

// ---------------------------------------------------------------------------
// Donut chart, painted directly
// ---------------------------------------------------------------------------

const SEGMENT_STEP: f32 = TAU / 180.0;
const LEGEND_WIDTH: f32 = 170.0;

fn pie_chart(
    ui: &mut Ui,
    labels: &[String],
    values: &[f64],
    colors: &[ChartColor],
    hole: f32,
    show_legend: bool,
) -> Rect {
    let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::hover());
    let painter = ui.painter_at(rect);

    let pie_area = if show_legend {
        Rect::from_min_max(rect.min, egui::pos2(rect.max.x - LEGEND_WIDTH, rect.max.y))
    } else {
        rect
    };
    let center = pie_area.center();
    let outer = 0.45 * pie_area.width().min(pie_area.height());
    let inner = outer * hole.clamp(0.0, 0.95);

    let total: f64 = values.iter().filter(|v| **v > 0.0).sum();
    if total <= 0.0 {
        painter.text(
            center,
            Align2::CENTER_CENTER,
            "No sales in the current view",
            FontId::proportional(16.0),
            ui.visuals().weak_text_color(),
        );
        return rect;
    }

    let slice_color = |i: usize| colors.get(i).copied().map(color32).unwrap_or(Color32::GRAY);

    // Start at twelve o'clock, clockwise.
    let mut start = -TAU / 4.0;
    let mut slices = Vec::with_capacity(values.len());
    for (i, &value) in values.iter().enumerate() {
        let sweep = (value.max(0.0) / total) as f32 * TAU;
        if sweep > 0.0 {
            painter.add(Shape::mesh(annulus_segment(
                center,
                inner,
                outer,
                start,
                start + sweep,
                slice_color(i),
            )));

            let mid = start + sweep / 2.0;
            let label_radius = (inner + outer) / 2.0;
            let percent = value / total * 100.0;
            if percent >= 3.0 {
                painter.text(
                    center + label_radius * egui::vec2(mid.cos(), mid.sin()),
                    Align2::CENTER_CENTER,
                    format!("{percent:.1}%"),
                    FontId::proportional(13.0),
                    Color32::WHITE,
                );
            }
        }
        slices.push((start, start + sweep));
        start += sweep;
    }

    if show_legend {
        let mut y = rect.min.y + 20.0;
        let x = rect.max.x - LEGEND_WIDTH + 10.0;
        for (i, label) in labels.iter().enumerate() {
            painter.rect_filled(
                Rect::from_min_size(egui::pos2(x, y - 6.0), egui::vec2(12.0, 12.0)),
                2.0,
                slice_color(i),
            );
            painter.text(
                egui::pos2(x + 18.0, y),
                Align2::LEFT_CENTER,
                label,
                FontId::proportional(13.0),
                ui.visuals().text_color(),
            );
            y += 20.0;
        }
    }

    if let Some(pointer) = response.hover_pos() {
        let offset = pointer - center;
        let distance = offset.length();
        if distance >= inner && distance <= outer {
            // Normalize into the same [start, start + TAU) frame as the slices.
            let mut angle = offset.y.atan2(offset.x);
            while angle < -TAU / 4.0 {
                angle += TAU;
            }
            if let Some(i) = slices.iter().position(|&(a, b)| angle >= a && angle < b) {
                let value = values[i];
                let label = labels.get(i).map(String::as_str).unwrap_or("?");
                painter.add(Shape::mesh(annulus_segment(
                    center,
                    inner,
                    outer,
                    slices[i].0,
                    slices[i].1,
                    Color32::from_white_alpha(40),
                )));
                response.on_hover_text_at_pointer(format!(
                    "{label}\nSales: {}\n{:.1}%",
                    format_thousands(value, 0),
                    value / total * 100.0
                ));
            }
        }
    }

    painter.circle_stroke(center, outer, Stroke::new(1.0, ui.visuals().window_fill));
    rect
}

/// Triangle strip between two radii over `[from, to]` radians.
fn annulus_segment(
    center: Pos2,
    inner: f32,
    outer: f32,
    from: f32,
    to: f32,
    color: Color32,
) -> Mesh {
    let steps = (((to - from) / SEGMENT_STEP).ceil() as u32).max(1);
    let mut mesh = Mesh::default();
    for s in 0..=steps {
        let angle = from + (to - from) * s as f32 / steps as f32;
        let dir = egui::vec2(angle.cos(), angle.sin());
        mesh.colored_vertex(center + inner * dir, color);
        mesh.colored_vertex(center + outer * dir, color);
    }
    for s in 0..steps {
        let i = s * 2;
        mesh.add_triangle(i, i + 1, i + 2);
        mesh.add_triangle(i + 1, i + 3, i + 2);
    }
    mesh
}

