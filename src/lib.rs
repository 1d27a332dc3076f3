//! SanMar Inventory - style discovery and warehouse stock export
//!
//! Resolves a set of SanMar style codes (explicit list, file, scraped from a
//! listing page or found by product search), queries per-warehouse inventory through one of SanMar's two
//! SOAP services and writes the rows to CSV or XLSX.

pub mod config;
pub mod error;
pub mod export;
pub mod inventory;
pub mod models;
pub mod runner;
pub mod styles;
pub mod summary;

pub use config::Settings;
pub use error::{Result, RunError};
pub use inventory::{client_for, InventoryClient, InventoryReport, VariantFilter};
pub use models::{Backend, Credentials, Environment, InventoryRow, OutputFormat, StyleCode, StyleSet};
pub use runner::{run, ExportSummary, RunOptions, RunOutcome};
