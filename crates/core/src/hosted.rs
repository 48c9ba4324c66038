//! Shared plumbing for the hosted backend's HTTP APIs.

use serde::Deserialize;

/// Error payload shapes returned by the hosted auth and record-store APIs.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.message
            .or(self.msg)
            .or(self.error_description)
            .or(self.error)
    }
}

/// Extracts a human-readable message from a failed response, falling back to the status text.
pub(crate) async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    let fallback = || {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    };
    match response.text().await {
        Ok(body) => serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::into_message)
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    fallback()
                } else {
                    body
                }
            }),
        Err(_) => fallback(),
    }
}

/// Attaches the project key headers every hosted call carries.
pub(crate) fn with_project_key(
    builder: reqwest::RequestBuilder,
    anon_key: &str,
    bearer: &str,
) -> reqwest::RequestBuilder {
    builder.header("apikey", anon_key).bearer_auth(bearer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_present_field_wins() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"msg":"Invalid login credentials","error":"invalid_grant"}"#)
                .unwrap();
        assert_eq!(body.into_message().as_deref(), Some("Invalid login credentials"));

        let body: ErrorBody = serde_json::from_str(r#"{"code":"42501"}"#).unwrap();
        assert!(body.into_message().is_none());
    }
}
