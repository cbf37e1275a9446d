pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{http::ReqwestUpstreamClient, server::RelayServer};
pub use config::{CliArgs, RelayConfig};
pub use core::courses::CourseQueryHandler;
pub use domain::model::{CourseQuery, CourseSummary, CredentialContext, CredentialDefaults};
pub use utils::error::{RelayError, Result};
