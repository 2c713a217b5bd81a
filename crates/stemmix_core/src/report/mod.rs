//! Translation of render outcomes into persistence-layer status updates.

mod reporter;

pub use reporter::JobResultReporter;
