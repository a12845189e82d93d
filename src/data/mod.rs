/// Data layer: table types, loading, writing and the per-session store.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  parse file → DataTable
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ DataTable │  named columns, rows of CellValue
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐      ┌────────┐
///   │  store   │ ───▶ │ writer │  dataset.csv + SHA-256 fingerprint
///   └──────────┘      └────────┘
/// ```

pub mod loader;
pub mod model;
pub mod store;
pub mod writer;
