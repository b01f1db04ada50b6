use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

// ---------------------------------------------------------------------------
// RawValue – a single untyped cell from the source table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell as produced by the loaders, before coercion
/// into a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl RawValue {
    /// Truthiness used for the required-field check: null, blank text,
    /// numeric zero, NaN and `false` are all treated as absent.
    pub fn is_present(&self) -> bool {
        match self {
            RawValue::Text(s) => !s.trim().is_empty(),
            RawValue::Integer(i) => *i != 0,
            RawValue::Float(f) => *f != 0.0 && !f.is_nan(),
            RawValue::Bool(b) => *b,
            RawValue::Null => false,
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Text(s) => write!(f, "{s}"),
            RawValue::Integer(i) => write!(f, "{i}"),
            RawValue::Float(v) => write!(f, "{v}"),
            RawValue::Bool(b) => write!(f, "{b}"),
            RawValue::Null => Ok(()),
        }
    }
}

/// One source row: column name → cell. Columns absent from the source are
/// simply missing from the map.
pub type RawRow = BTreeMap<String, RawValue>;

// ---------------------------------------------------------------------------
// Field – every column a record carries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Year,
    Region,
    Mode,
    Parameter,
    Category,
    Powertrain,
    Unit,
    Value,
    Price,
    RangeKm,
    ChargingTime,
    SalesVolume,
    Co2Saved,
    BatteryCapacity,
    EnergyEfficiency,
    WeightKg,
    NumberOfSeats,
    MotorPower,
    DistanceTraveled,
    /// Derived km/kWh, not present in the source table.
    Efficiency,
}

impl Field {
    /// Column name as it appears in the source table.
    pub fn name(self) -> &'static str {
        match self {
            Field::Year => "year",
            Field::Region => "region",
            Field::Mode => "mode",
            Field::Parameter => "parameter",
            Field::Category => "category",
            Field::Powertrain => "powertrain",
            Field::Unit => "unit",
            Field::Value => "value",
            Field::Price => "price",
            Field::RangeKm => "range_km",
            Field::ChargingTime => "charging_time",
            Field::SalesVolume => "sales_volume",
            Field::Co2Saved => "co2_saved",
            Field::BatteryCapacity => "battery_capacity",
            Field::EnergyEfficiency => "energy_efficiency",
            Field::WeightKg => "weight_kg",
            Field::NumberOfSeats => "number_of_seats",
            Field::MotorPower => "motor_power",
            Field::DistanceTraveled => "distance_traveled",
            Field::Efficiency => "efficiency",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Record – one normalized vehicle-market observation
// ---------------------------------------------------------------------------

/// Field order matches the input table so `csv::Writer::serialize` emits
/// a loadable header.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Record {
    pub year: i64,
    pub region: String,
    pub mode: String,
    pub parameter: String,
    pub category: String,
    pub powertrain: String,
    pub unit: String,
    pub value: f64,
    pub price: f64,
    pub range_km: f64,
    pub charging_time: f64,
    pub sales_volume: f64,
    pub co2_saved: f64,
    pub battery_capacity: f64,
    pub energy_efficiency: f64,
    pub weight_kg: f64,
    pub number_of_seats: i64,
    pub motor_power: f64,
    pub distance_traveled: f64,
    #[serde(skip)]
    pub efficiency: f64,
}

/// Wh/km → km/kWh; zero when the energy figure is not positive.
pub fn efficiency_from_energy(energy_efficiency: f64) -> f64 {
    if energy_efficiency > 0.0 {
        1000.0 / energy_efficiency
    } else {
        0.0
    }
}

impl Record {
    /// Text view of a field, or `None` when the value is falsy (empty text
    /// or numeric zero). Used as the grouping key.
    pub fn key(&self, field: Field) -> Option<String> {
        let text = |s: &str| (!s.is_empty()).then(|| s.to_string());
        let number = |v: f64| (v != 0.0 && !v.is_nan()).then(|| v.to_string());
        match field {
            Field::Year => (self.year != 0).then(|| self.year.to_string()),
            Field::NumberOfSeats => {
                (self.number_of_seats != 0).then(|| self.number_of_seats.to_string())
            }
            Field::Region => text(&self.region),
            Field::Mode => text(&self.mode),
            Field::Parameter => text(&self.parameter),
            Field::Category => text(&self.category),
            Field::Powertrain => text(&self.powertrain),
            Field::Unit => text(&self.unit),
            numeric => number(self.metric(numeric)),
        }
    }

    /// Numeric view of a field. Text fields go through the lenient
    /// coercion policy, so non-numeric labels read as 0.
    pub fn metric(&self, field: Field) -> f64 {
        use super::ingest::parse_str_or_default as coerce;
        match field {
            Field::Year => self.year as f64,
            Field::Region => coerce(&self.region),
            Field::Mode => coerce(&self.mode),
            Field::Parameter => coerce(&self.parameter),
            Field::Category => coerce(&self.category),
            Field::Powertrain => coerce(&self.powertrain),
            Field::Unit => coerce(&self.unit),
            Field::Value => self.value,
            Field::Price => self.price,
            Field::RangeKm => self.range_km,
            Field::ChargingTime => self.charging_time,
            Field::SalesVolume => self.sales_volume,
            Field::Co2Saved => self.co2_saved,
            Field::BatteryCapacity => self.battery_capacity,
            Field::EnergyEfficiency => self.energy_efficiency,
            Field::WeightKg => self.weight_kg,
            Field::NumberOfSeats => self.number_of_seats as f64,
            Field::MotorPower => self.motor_power,
            Field::DistanceTraveled => self.distance_traveled,
            Field::Efficiency => self.efficiency,
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// Where the records came from.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    File(PathBuf),
    Sample { seed: u64 },
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::File(path) => write!(f, "{}", path.display()),
            DataSource::Sample { seed } => write!(f, "sample data (seed {seed})"),
        }
    }
}

/// The values offered by the three filter selectors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOptions {
    pub years: Vec<i64>,
    pub regions: Vec<String>,
    pub modes: Vec<String>,
}

/// Immutable after load: nothing hands out `&mut` access to the records.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<Record>,
    source: DataSource,
    options: FilterOptions,
}

impl Dataset {
    /// Build the selector indices from the loaded records.
    pub fn new(records: Vec<Record>, source: DataSource) -> Self {
        let mut years = BTreeSet::new();
        let mut regions = BTreeSet::new();
        let mut modes = BTreeSet::new();
        for rec in &records {
            years.insert(rec.year);
            regions.insert(rec.region.clone());
            modes.insert(rec.mode.clone());
        }
        let options = FilterOptions {
            years: years.into_iter().collect(),
            regions: regions.into_iter().collect(),
            modes: modes.into_iter().collect(),
        };
        Dataset {
            records,
            source,
            options,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    pub fn filter_options(&self) -> &FilterOptions {
        &self.options
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
