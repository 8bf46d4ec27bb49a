//! Data layer: core types, loading, and label grouping.
//!
//! Architecture:
//! ```text
//!  .parquet / .json / .csv
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → RawTable → FeatureSet / PredictionSet
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────────┐
//!   │  FeatureSet   │  feature columns, target, Labeling
//!   └──────────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  group sample rows by label
//!   └──────────┘
//! ```

pub mod loader;
pub mod model;
pub mod filter;
