use crate::core::{
    credentials::{require_key, resolve_credentials},
    CourseQuery, CourseSummary, CredentialContext, CredentialDefaults, UpstreamClient,
};
use crate::utils::error::Result;
use crate::utils::logger::mask_key;
use axum::http::Method;
use serde_json::Value;

pub const COURSES_PATH: &str = "/api/v1/courses";

/// Only active enrollments, with the per-course student count included.
pub const COURSE_QUERY_PARAMS: &[(&str, &str)] = &[
    ("enrollment_state", "active"),
    ("include[]", "total_students"),
];

pub struct CourseQueryHandler<U: UpstreamClient> {
    client: U,
    defaults: CredentialDefaults,
}

impl<U: UpstreamClient> CourseQueryHandler<U> {
    pub fn new(client: U, defaults: CredentialDefaults) -> Self {
        Self { client, defaults }
    }

    pub fn defaults(&self) -> &CredentialDefaults {
        &self.defaults
    }

    /// resolve -> require key -> fetch & shape
    pub async fn handle(
        &self,
        method: &Method,
        body: &[u8],
        query: &CourseQuery,
    ) -> Result<Vec<CourseSummary>> {
        let result: Result<Vec<CourseSummary>> = async {
            let context = resolve_credentials(method, body, query, &self.defaults)?;
            require_key(&context)?;
            self.fetch_courses(&context).await
        }
        .await;

        if let Err(e) = &result {
            tracing::error!(
                "❌ Course request failed: {} (status: {}, category: {:?})",
                e,
                e.status_code(),
                e.category()
            );
        }

        result
    }

    pub async fn fetch_courses(&self, context: &CredentialContext) -> Result<Vec<CourseSummary>> {
        tracing::debug!(
            "Fetching courses from {}{} with key {}",
            context.api_base_url,
            COURSES_PATH,
            mask_key(&context.api_key)
        );

        let payload = self
            .client
            .get_json(
                &context.api_base_url,
                COURSES_PATH,
                &context.api_key,
                COURSE_QUERY_PARAMS,
            )
            .await?;

        Ok(shape_courses(payload))
    }
}

/// 將上游課程陣列轉換為 CourseSummary，保持原本順序
pub fn shape_courses(payload: Value) -> Vec<CourseSummary> {
    let records = match payload {
        Value::Array(records) => records,
        other => {
            tracing::warn!(
                "Upstream course payload is not an array (got {}), returning no courses",
                json_kind(&other)
            );
            return Vec::new();
        }
    };

    let total = records.len();
    let courses: Vec<CourseSummary> = records
        .iter()
        .filter_map(CourseSummary::from_record)
        .collect();

    tracing::info!(
        "Upstream returned {} courses, kept {}",
        total,
        courses.len()
    );

    courses
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
