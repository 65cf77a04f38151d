//! Core of the pcap extractor datasource.
//!
//! Everything in here is transport-agnostic: the gRPC server and the cli only translate
//! between their wire types and the types defined in this crate.

pub mod arn;
#[cfg(feature = "aws")]
pub mod aws;
pub mod clients;
mod datasource;
pub mod error;
pub mod frame;
mod health;
pub mod query;
pub mod settings;
pub mod status;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod types;

pub use datasource::{Datasource, PRESIGNED_URL_TTL, REQUEST_FRAME, STATUS_FRAME};
pub use frame::{Field, Frame};
pub use health::{CheckHealthResult, HealthStatus};
pub use query::{Action, DataQuery, QueryModel};
pub use status::{ExecutionDescription, ExecutionStatus};
