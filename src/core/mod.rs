pub mod courses;
pub mod credentials;

pub use crate::domain::model::{CourseQuery, CourseSummary, CredentialContext, CredentialDefaults};
pub use crate::domain::ports::{ConfigProvider, UpstreamClient};
pub use crate::utils::error::Result;
