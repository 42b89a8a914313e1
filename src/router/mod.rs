//! C8 Data Router: cross-aggregator orchestration.

pub mod airports;
pub mod data_router;

pub use data_router::{DataRouter, PolicyDataMetadata, PolicyDataRequest, PolicyDataResponse};
