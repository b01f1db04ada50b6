//! Data layer: core types, loading, filtering and aggregation.
//!
//! Architecture:
//! ```text
//!  .csv / .json / .parquet          (load failure)
//!        │                                │
//!        ▼                                ▼
//!   ┌──────────┐                    ┌──────────┐
//!   │  loader   │  file → RawRow    │  sample   │  synthetic rows
//!   └──────────┘                    └──────────┘
//!        │                                │
//!        ▼                                │
//!   ┌──────────┐                          │
//!   │  ingest   │  RawRow → Record        │
//!   └──────────┘                          │
//!        │                                │
//!        ▼                                ▼
//!   ┌──────────────────────────────────────────┐
//!   │ Dataset   Vec<Record>, selector options   │
//!   └──────────────────────────────────────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  year/region/mode predicates → FilteredView
//!   └──────────┘
//!        │
//!        ▼
//!   ┌───────────┐
//!   │ aggregate  │  group by key, sum metric → Aggregate
//!   └───────────┘
//! ```

pub mod aggregate;
pub mod filter;
pub mod ingest;
pub mod loader;
pub mod model;
pub mod sample;
