use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use parquet::arrow::ArrowWriter;

use ev_dashboard::config::DEFAULT_DATA_PATH;
use ev_dashboard::data::model::{Field as Column, Record};
use ev_dashboard::data::sample;

/// Write the synthetic EV market dataset to disk.
#[derive(Parser, Debug)]
#[command(name = "generate_sample", version)]
struct Args {
    /// Output file; `.csv` or `.parquet`
    #[arg(default_value = DEFAULT_DATA_PATH)]
    path: PathBuf,
    /// Seed for reproducible output
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let dataset = sample::generate(Some(args.seed));
    let records = dataset.records();

    if let Some(dir) = args.path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let ext = args
        .path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "csv" => write_csv(&args.path, records)?,
        "parquet" | "pq" => write_parquet(&args.path, records)?,
        other => bail!("unsupported output extension: .{other}"),
    }

    println!(
        "Wrote {} records (seed {}) to {}",
        records.len(),
        args.seed,
        args.path.display()
    );
    Ok(())
}

fn write_csv(path: &Path, records: &[Record]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    for rec in records {
        writer.serialize(rec)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, records: &[Record]) -> Result<()> {
    let text = |get: fn(&Record) -> &str| -> ArrayRef {
        Arc::new(StringArray::from(records.iter().map(get).collect::<Vec<_>>()))
    };
    let float = |get: fn(&Record) -> f64| -> ArrayRef {
        Arc::new(Float64Array::from(records.iter().map(get).collect::<Vec<_>>()))
    };
    let int = |get: fn(&Record) -> i64| -> ArrayRef {
        Arc::new(Int64Array::from(records.iter().map(get).collect::<Vec<_>>()))
    };

    let columns: Vec<(Column, ArrayRef)> = vec![
        (Column::Year, int(|r| r.year)),
        (Column::Region, text(|r| r.region.as_str())),
        (Column::Mode, text(|r| r.mode.as_str())),
        (Column::Parameter, text(|r| r.parameter.as_str())),
        (Column::Category, text(|r| r.category.as_str())),
        (Column::Powertrain, text(|r| r.powertrain.as_str())),
        (Column::Unit, text(|r| r.unit.as_str())),
        (Column::Value, float(|r| r.value)),
        (Column::Price, float(|r| r.price)),
        (Column::RangeKm, float(|r| r.range_km)),
        (Column::ChargingTime, float(|r| r.charging_time)),
        (Column::SalesVolume, float(|r| r.sales_volume)),
        (Column::Co2Saved, float(|r| r.co2_saved)),
        (Column::BatteryCapacity, float(|r| r.battery_capacity)),
        (Column::EnergyEfficiency, float(|r| r.energy_efficiency)),
        (Column::WeightKg, float(|r| r.weight_kg)),
        (Column::NumberOfSeats, int(|r| r.number_of_seats)),
        (Column::MotorPower, float(|r| r.motor_power)),
        (Column::DistanceTraveled, float(|r| r.distance_traveled)),
    ];

    let schema = Arc::new(Schema::new(
        columns
            .iter()
            .map(|(col, array)| Field::new(col.name(), array.data_type().clone(), false))
            .collect::<Vec<_>>(),
    ));
    let batch = RecordBatch::try_new(
        schema.clone(),
        columns.into_iter().map(|(_, array)| array).collect(),
    )
    .context("building record batch")?;

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}
