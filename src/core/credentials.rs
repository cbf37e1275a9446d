use crate::core::{CourseQuery, CredentialContext, CredentialDefaults};
use crate::utils::error::{RelayError, Result};
use crate::utils::logger::mask_key;
use axum::http::Method;
use serde_json::Value;

/// 依請求決定實際使用的金鑰與上游位址
///
/// POST reads only the JSON body, GET reads only the query string. A missing
/// or empty `api_key` in the chosen source falls back to `defaults`.
pub fn resolve_credentials(
    method: &Method,
    body: &[u8],
    query: &CourseQuery,
    defaults: &CredentialDefaults,
) -> Result<CredentialContext> {
    let supplied = if *method == Method::POST {
        query_from_body(body)?
    } else if *method == Method::GET {
        query.clone()
    } else {
        CourseQuery::default()
    };

    let context = match non_empty(supplied.api_key) {
        Some(api_key) => {
            let api_base_url =
                non_empty(supplied.api_url).unwrap_or_else(|| defaults.api_base_url.clone());
            tracing::debug!(
                "Using {} api_key {} against {}",
                if *method == Method::POST { "body" } else { "query" },
                mask_key(&api_key),
                api_base_url
            );
            CredentialContext {
                api_key,
                api_base_url,
            }
        }
        None => {
            let api_key = defaults.api_key.clone().unwrap_or_default();
            tracing::debug!(
                "Using default api_key {} against {}",
                mask_key(&api_key),
                defaults.api_base_url
            );
            CredentialContext {
                api_key,
                api_base_url: defaults.api_base_url.clone(),
            }
        }
    };

    Ok(context)
}

pub fn require_key(context: &CredentialContext) -> Result<()> {
    if context.api_key.trim().is_empty() {
        return Err(RelayError::MissingCredential);
    }
    Ok(())
}

fn query_from_body(body: &[u8]) -> Result<CourseQuery> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CourseQuery::default());
    }

    let value: Value = serde_json::from_slice(body).map_err(|e| RelayError::InvalidRequest {
        message: format!("request body is not valid JSON: {}", e),
    })?;

    // 欄位型別不對時視同未提供
    let field = |name: &str| {
        value
            .get(name)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    };

    Ok(CourseQuery {
        api_key: field("api_key"),
        api_url: field("api_url"),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
