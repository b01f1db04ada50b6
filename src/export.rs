//! CSV and PNG export of the current view.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use image::imageops::{self, FilterType};
use image::RgbaImage;
use thiserror::Error;

use crate::data::model::Record;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("writing CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("encoding image: {0}")]
    Image(#[from] image::ImageError),
    #[error("captured image is empty or malformed ({width}x{height}, {bytes} bytes)")]
    BadCapture {
        width: u32,
        height: u32,
        bytes: usize,
    },
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Download header, in Spanish as the published dataset uses it.
pub const CSV_HEADER: [&str; 19] = [
    "Año",
    "Región",
    "Modo",
    "Parámetro",
    "Categoría",
    "Powertrain",
    "Unidad",
    "Valor",
    "Precio",
    "Autonomía_km",
    "Tiempo_Carga",
    "Volumen_Ventas",
    "CO2_Ahorrado",
    "Capacidad_Batería",
    "Eficiencia_Energética",
    "Peso_kg",
    "Número_Asientos",
    "Potencia_Motor",
    "Distancia_Recorrida",
];

/// One export row. Measured quantities get two decimals; counts and the
/// raw `value`/`sales_volume` columns are written as-is.
pub fn csv_row(rec: &Record) -> [String; 19] {
    let fixed = |v: f64| format!("{v:.2}");
    [
        rec.year.to_string(),
        rec.region.clone(),
        rec.mode.clone(),
        rec.parameter.clone(),
        rec.category.clone(),
        rec.powertrain.clone(),
        rec.unit.clone(),
        rec.value.to_string(),
        fixed(rec.price),
        fixed(rec.range_km),
        fixed(rec.charging_time),
        rec.sales_volume.to_string(),
        fixed(rec.co2_saved),
        fixed(rec.battery_capacity),
        fixed(rec.energy_efficiency),
        fixed(rec.weight_kg),
        rec.number_of_seats.to_string(),
        fixed(rec.motor_power),
        fixed(rec.distance_traveled),
    ]
}

/// Write the header plus one line per record. Fields are never quoted, so
/// a text value containing a comma shifts the columns of its row.
pub fn write_csv<'a, W: Write>(
    out: W,
    records: impl IntoIterator<Item = &'a Record>,
) -> Result<usize, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(out);

    writer.write_record(CSV_HEADER)?;
    let mut rows = 0;
    for rec in records {
        writer.write_record(csv_row(rec))?;
        rows += 1;
    }
    writer.flush().map_err(|source| ExportError::Io {
        path: "<csv writer>".to_string(),
        source,
    })?;
    Ok(rows)
}

/// [`write_csv`] into a file.
pub fn export_csv<'a>(
    path: &Path,
    records: impl IntoIterator<Item = &'a Record>,
) -> Result<usize, ExportError> {
    let file = File::create(path).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let rows = write_csv(file, records)?;
    log::info!("Exported {rows} rows to {}", path.display());
    Ok(rows)
}

// ---------------------------------------------------------------------------
// PNG
// ---------------------------------------------------------------------------

/// Resize an RGBA capture to `size` and save it as PNG.
pub fn export_png(
    path: &Path,
    rgba: Vec<u8>,
    width: u32,
    height: u32,
    size: (u32, u32),
) -> Result<(), ExportError> {
    let bytes = rgba.len();
    let capture = RgbaImage::from_raw(width, height, rgba)
        .filter(|_| width > 0 && height > 0)
        .ok_or(ExportError::BadCapture {
            width,
            height,
            bytes,
        })?;
    let scaled = imageops::resize(&capture, size.0, size.1, FilterType::Triangle);
    scaled.save(path)?;
    log::info!(
        "Exported {}x{} chart image to {}",
        size.0,
        size.1,
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(region: &str) -> Record {
        Record {
            year: 2021,
            region: region.into(),
            mode: "SUV".into(),
            value: 1500.0,
            price: 45_000.456,
            sales_volume: 1500.0,
            number_of_seats: 5,
            ..Default::default()
        }
    }

    fn export_to_string(records: &[Record]) -> String {
        let mut buf = Vec::new();
        let rows = write_csv(&mut buf, records).expect("csv written");
        assert_eq!(rows, records.len());
        String::from_utf8(buf).expect("utf-8")
    }

    #[test]
    fn header_has_nineteen_columns_and_one_line_per_record() {
        let text = export_to_string(&[rec("Europe"), rec("Asia"), rec("Africa")]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].split(',').count(), 19);
        assert_eq!(lines[0], CSV_HEADER.join(","));
    }

    #[test]
    fn numbers_are_formatted() {
        let text = export_to_string(&[rec("Europe")]);
        let row: Vec<&str> = text.lines().nth(1).unwrap().split(',').collect();
        assert_eq!(row[0], "2021");
        assert_eq!(row[7], "1500");
        assert_eq!(row[8], "45000.46");
        assert_eq!(row[9], "0.00");
        assert_eq!(row[11], "1500");
        assert_eq!(row[16], "5");
    }

    #[test]
    fn embedded_commas_are_not_quoted() {
        // Known gap: the row gains a column instead of being quoted.
        let text = export_to_string(&[rec("Europe, West")]);
        let row = text.lines().nth(1).unwrap();
        assert!(row.contains("Europe, West"));
        assert_eq!(row.split(',').count(), 20);
    }

    #[test]
    fn empty_view_exports_header_only() {
        let text = export_to_string(&[]);
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn png_is_resized_to_requested_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.png");
        let rgba = vec![200u8; 10 * 5 * 4];
        export_png(&path, rgba, 10, 5, (1200, 800)).expect("png written");

        let img = image::open(&path).expect("png readable");
        assert_eq!((img.width(), img.height()), (1200, 800));
    }

    #[test]
    fn malformed_capture_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = export_png(&dir.path().join("x.png"), vec![0; 3], 10, 10, (1200, 800));
        assert!(matches!(err, Err(ExportError::BadCapture { .. })));
    }
}
