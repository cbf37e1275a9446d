use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const NO_DESCRIPTION: &str = "No description available";

/// 單次請求使用的憑證，回應送出後即丟棄
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialContext {
    pub api_key: String,
    pub api_base_url: String,
}

impl std::fmt::Debug for CredentialContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialContext")
            .field("api_key", &crate::utils::logger::mask_key(&self.api_key))
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

/// Startup-resolved fallback credentials handed to the handler.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialDefaults {
    pub api_key: Option<String>,
    pub api_base_url: String,
}

impl std::fmt::Debug for CredentialDefaults {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialDefaults")
            .field(
                "api_key",
                &self.api_key.as_deref().map(crate::utils::logger::mask_key),
            )
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

/// `api_key` / `api_url` as sent in the query string or POST body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseQuery {
    pub api_key: Option<String>,
    pub api_url: Option<String>,
}

impl CourseQuery {
    /// 重複的參數只取第一個，其餘參數忽略
    pub fn from_query_string(raw: &str) -> Self {
        let mut query = Self::default();
        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            match key.as_ref() {
                "api_key" if query.api_key.is_none() => query.api_key = Some(value.into_owned()),
                "api_url" if query.api_url.is_none() => query.api_url = Some(value.into_owned()),
                _ => {}
            }
        }
        query
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseSummary {
    pub id: String,
    pub name: String,
    pub code: String,
    pub description: String,
    pub students: u64,
}

impl CourseSummary {
    /// Shapes one upstream course record. Returns `None` for records that
    /// have no usable name or are restricted by date.
    pub fn from_record(record: &Value) -> Option<Self> {
        let obj = record.as_object()?;

        let name = obj
            .get("name")
            .and_then(|v| v.as_str())
            .filter(|name| !name.is_empty())?;

        let restricted = obj
            .get("access_restricted_by_date")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if restricted {
            return None;
        }

        let id = match obj.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        let code = obj
            .get("course_code")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let description = if code.is_empty() {
            NO_DESCRIPTION.to_string()
        } else {
            code.clone()
        };

        let students = obj
            .get("total_students")
            .and_then(|v| v.as_u64())
            .unwrap_or(0);

        Some(Self {
            id,
            name: name.to_string(),
            code,
            description,
            students,
        })
    }
}
