//! Domain model and pure logic for the PetKit litter-box exporter.
//!
//! Holds the vendor event and device types, the record classifier, the
//! weight-based pet resolver, and the traits that the HTTP client crate
//! implements. No network access happens here.

pub mod classifier;
pub mod device;
pub mod directory;
pub mod error;
pub mod fullness;
pub mod pets;
pub mod record;
pub mod types;
