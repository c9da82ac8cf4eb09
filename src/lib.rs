//! # Sheetsync - Row-to-Template Binding Engine
//!
//! Sheetsync populates a visual template with spreadsheet rows: it scans
//! a node tree for `#tag` slot markers, classifies each row value, and
//! produces one filled clone of the template per row. It provides:
//!
//! - **Binding**: tag extraction, value classification, and per-row
//!   application of text, images, colors, links, and component variants
//! - **Scene model**: an in-memory node arena with the clone, swap, and
//!   styling operations the binder drives
//! - **Ingestion**: XLSX workbooks and the Google Sheets REST API,
//!   normalized to the same headers/rows shape
//! - **Orchestration**: batch sync over all rows with a summary report
//!
//! ## Quick Start
//!
//! ```no_run
//! use sheetsync::{
//!     binding::HttpImageFetcher,
//!     ingest::xlsx::load_xlsx,
//!     scene::Scene,
//!     sync::sync_rows,
//! };
//!
//! # async fn demo() -> Result<(), sheetsync::SheetSyncError> {
//! let raw = std::fs::read_to_string("scene.json")?;
//! let mut scene: Scene = serde_json::from_str(&raw)?;
//! let template = scene.children(scene.root)[0];
//!
//! let data = load_xlsx(std::path::Path::new("rows.xlsx"), None)?;
//! let fetcher = HttpImageFetcher::new()?;
//!
//! let report = sync_rows(&mut scene, template, &data.rows, &fetcher).await?;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`binding`] | Tag extraction, classification, and row binding |
//! | [`scene`] | In-memory scene graph and node operations |
//! | [`sync`] | Batch orchestration and the sync report |
//! | [`ingest`] | XLSX and Google Sheets data sources |
//! | [`error`] | Error types |

pub mod binding;
pub mod error;
pub mod ingest;
pub mod scene;
pub mod sync;

// Re-exports for convenience
pub use binding::{HttpImageFetcher, ImageFetcher};
pub use error::SheetSyncError;
pub use scene::{NodeId, Scene};
pub use sync::{SyncReport, sync_rows};
