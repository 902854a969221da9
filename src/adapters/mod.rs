//! External system integrations for sipkit.
//!
//! - [`catalog`] - Classification hierarchy that supplies the SIPs of a run
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate external sources. The
//! export core only sees the [`catalog::SipSource`] trait, so tests and
//! embedding applications can supply their own implementation.
//!
//! ```rust,no_run
//! use sipkit::adapters::catalog::{load_catalog, SipSource};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = load_catalog("catalog.json")?;
//! for sip in catalog.selected_sips() {
//!     println!("{} ({} files)", sip.name, sip.leaf_count());
//! }
//! # Ok(())
//! # }
//! ```

pub mod catalog;
