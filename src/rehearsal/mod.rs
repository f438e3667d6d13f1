//! An offline stand-in for the drill site, used by `drillpace rehearse`
//! and the integration tests.

pub mod browser;
pub mod catalog;
pub mod dom;

pub use browser::{DrillResult, Handle, RehearsalBrowser};
pub use catalog::{Catalog, SampleActivity};

/// Credentials the practice site accepts.
pub const DEMO_USERNAME: &str = "estudiante";
pub const DEMO_PASSWORD: &str = "practica";
