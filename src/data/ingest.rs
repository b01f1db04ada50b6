//! Raw row → [`Record`] normalization.
//!
//! Coercion is deliberately lenient: a numeric cell that cannot be read
//! becomes 0 instead of failing the row. Only the four required columns
//! can reject a row.

use super::model::{efficiency_from_energy, Field, RawRow, RawValue, Record};

/// Columns that must be present (truthy) for a row to be kept.
pub const REQUIRED_FIELDS: [Field; 4] = [
    Field::Year,
    Field::Region,
    Field::Mode,
    Field::SalesVolume,
];

// ---------------------------------------------------------------------------
// Coercion policy
// ---------------------------------------------------------------------------

/// Read a cell as `f64`, substituting 0.0 for anything unreadable or
/// non-finite.
pub fn parse_numeric_or_default(value: &RawValue) -> f64 {
    let parsed = match value {
        RawValue::Float(v) => *v,
        RawValue::Integer(i) => *i as f64,
        RawValue::Text(s) => return parse_str_or_default(s),
        RawValue::Bool(_) | RawValue::Null => 0.0,
    };
    if parsed.is_finite() {
        parsed
    } else {
        0.0
    }
}

/// Text flavour of [`parse_numeric_or_default`].
pub fn parse_str_or_default(s: &str) -> f64 {
    match s.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Read a cell as `i64`, truncating fractional values toward zero and
/// substituting 0 for anything unreadable.
pub fn parse_integer_or_default(value: &RawValue) -> i64 {
    match value {
        RawValue::Integer(i) => *i,
        RawValue::Float(v) if v.is_finite() => v.trunc() as i64,
        RawValue::Text(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|v| v.is_finite())
                        .map(|v| v.trunc() as i64)
                })
                .unwrap_or(0)
        }
        _ => 0,
    }
}

/// Trimmed text of a cell; missing or null cells give an empty string.
pub fn parse_text_or_default(value: Option<&RawValue>) -> String {
    match value {
        Some(RawValue::Null) | None => String::new(),
        Some(other) => other.to_string().trim().to_string(),
    }
}

// ---------------------------------------------------------------------------
// Row normalization
// ---------------------------------------------------------------------------

/// Normalize one raw row, or `None` when a required column is missing.
pub fn record_from_row(row: &RawRow) -> Option<Record> {
    let present = |field: Field| row.get(field.name()).is_some_and(RawValue::is_present);
    if !REQUIRED_FIELDS.iter().all(|&f| present(f)) {
        return None;
    }

    let cell = |field: Field| row.get(field.name());
    let number = |field: Field| cell(field).map_or(0.0, parse_numeric_or_default);
    let integer = |field: Field| cell(field).map_or(0, parse_integer_or_default);
    let text = |field: Field| parse_text_or_default(cell(field));

    let energy_efficiency = number(Field::EnergyEfficiency);

    Some(Record {
        year: integer(Field::Year),
        region: text(Field::Region),
        mode: text(Field::Mode),
        parameter: text(Field::Parameter),
        category: text(Field::Category),
        powertrain: text(Field::Powertrain),
        unit: text(Field::Unit),
        value: number(Field::Value),
        price: number(Field::Price),
        range_km: number(Field::RangeKm),
        charging_time: number(Field::ChargingTime),
        sales_volume: number(Field::SalesVolume),
        co2_saved: number(Field::Co2Saved),
        battery_capacity: number(Field::BatteryCapacity),
        energy_efficiency,
        weight_kg: number(Field::WeightKg),
        number_of_seats: integer(Field::NumberOfSeats),
        motor_power: number(Field::MotorPower),
        distance_traveled: number(Field::DistanceTraveled),
        efficiency: efficiency_from_energy(energy_efficiency),
    })
}

/// Result of normalizing a batch of rows.
#[derive(Debug, Clone, Default)]
pub struct Ingested {
    pub records: Vec<Record>,
    /// Rows rejected for a missing required column.
    pub dropped: usize,
}

/// Normalize every row, keeping source order.
pub fn ingest_rows<'a>(rows: impl IntoIterator<Item = &'a RawRow>) -> Ingested {
    let mut out = Ingested::default();
    for row in rows {
        match record_from_row(row) {
            Some(rec) => out.records.push(rec),
            None => out.dropped += 1,
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(&str, RawValue)]) -> RawRow {
        cells
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn base_row() -> RawRow {
        row(&[
            ("year", RawValue::Integer(2021)),
            ("region", RawValue::Text("  Europe ".into())),
            ("mode", RawValue::Text("SUV".into())),
            ("sales_volume", RawValue::Integer(1200)),
            ("price", RawValue::Float(45000.5)),
            ("energy_efficiency", RawValue::Integer(160)),
        ])
    }

    #[test]
    fn valid_row_is_normalized() {
        let rec = record_from_row(&base_row()).expect("row kept");
        assert_eq!(rec.year, 2021);
        assert_eq!(rec.region, "Europe");
        assert_eq!(rec.mode, "SUV");
        assert_eq!(rec.sales_volume, 1200.0);
        assert_eq!(rec.price, 45000.5);
        assert_eq!(rec.parameter, "");
        assert_eq!(rec.range_km, 0.0);
        assert_eq!(rec.number_of_seats, 0);
        assert_eq!(rec.efficiency, 1000.0 / 160.0);
    }

    #[test]
    fn rows_missing_a_required_field_are_dropped() {
        for field in REQUIRED_FIELDS {
            let mut missing = base_row();
            missing.remove(field.name());
            assert!(record_from_row(&missing).is_none(), "{field} absent");

            let mut empty = base_row();
            empty.insert(field.name().to_string(), RawValue::Text(String::new()));
            assert!(record_from_row(&empty).is_none(), "{field} empty");

            let mut null = base_row();
            null.insert(field.name().to_string(), RawValue::Null);
            assert!(record_from_row(&null).is_none(), "{field} null");
        }
    }

    #[test]
    fn whitespace_only_text_counts_as_missing() {
        for field in [Field::Region, Field::Mode] {
            let mut r = base_row();
            r.insert(field.name().to_string(), RawValue::Text("   ".into()));
            assert!(record_from_row(&r).is_none(), "{field} blank");
        }
        let rows = vec![base_row(), {
            let mut r = base_row();
            r.insert("region".into(), RawValue::Text("\t ".into()));
            r
        }];
        let out = ingest_rows(&rows);
        assert_eq!(out.records.len(), 1);
        assert!(out.records.iter().all(|rec| !rec.region.is_empty()));
    }

    #[test]
    fn zero_sales_counts_as_missing() {
        let mut r = base_row();
        r.insert("sales_volume".into(), RawValue::Float(0.0));
        assert!(record_from_row(&r).is_none());
    }

    #[test]
    fn efficiency_is_zero_without_positive_energy_figure() {
        let mut r = base_row();
        r.insert("energy_efficiency".into(), RawValue::Float(-5.0));
        assert_eq!(record_from_row(&r).unwrap().efficiency, 0.0);

        r.remove("energy_efficiency");
        assert_eq!(record_from_row(&r).unwrap().efficiency, 0.0);
    }

    #[test]
    fn unparsable_numbers_default_to_zero() {
        assert_eq!(parse_numeric_or_default(&RawValue::Text("n/a".into())), 0.0);
        assert_eq!(parse_numeric_or_default(&RawValue::Text(" 12.5 ".into())), 12.5);
        assert_eq!(parse_numeric_or_default(&RawValue::Float(f64::NAN)), 0.0);
        assert_eq!(parse_numeric_or_default(&RawValue::Float(f64::INFINITY)), 0.0);
        assert_eq!(parse_numeric_or_default(&RawValue::Bool(true)), 0.0);
        assert_eq!(parse_numeric_or_default(&RawValue::Null), 0.0);
    }

    #[test]
    fn integers_truncate_and_default() {
        assert_eq!(parse_integer_or_default(&RawValue::Float(5.9)), 5);
        assert_eq!(parse_integer_or_default(&RawValue::Text("2021.0".into())), 2021);
        assert_eq!(parse_integer_or_default(&RawValue::Text("four".into())), 0);
        assert_eq!(parse_integer_or_default(&RawValue::Null), 0);
    }

    #[test]
    fn text_sales_volume_keeps_row_but_reads_as_zero() {
        let mut r = base_row();
        r.insert("sales_volume".into(), RawValue::Text("lots".into()));
        let rec = record_from_row(&r).expect("truthy text keeps the row");
        assert_eq!(rec.sales_volume, 0.0);
    }

    #[test]
    fn ingest_counts_dropped_rows() {
        let mut bad = base_row();
        bad.remove("mode");
        let rows = vec![base_row(), bad, base_row()];
        let out = ingest_rows(&rows);
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.dropped, 1);
    }
}
