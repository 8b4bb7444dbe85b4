//! Client errors

use ha_core::HaError;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("Not signed in")]
    NotAuthenticated,

    /// Refresh failed; the stored session was cleared
    #[error("Session expired, sign in again")]
    SessionExpired,

    #[error("Request failed with status {status}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl ClientError {
    /// Build from a non-success response body (`{"error": .., "message": ..}`)
    pub fn from_response(status: u16, body: &Value) -> Self {
        let field = |name: &str| body.get(name).and_then(Value::as_str).map(str::to_string);
        ClientError::Api {
            status,
            code: field("error").unwrap_or_else(|| "unknown".to_string()),
            message: field("message").unwrap_or_else(|| format!("HTTP {status}")),
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

impl From<ClientError> for HaError {
    fn from(err: ClientError) -> Self {
        match &err {
            ClientError::NotAuthenticated | ClientError::SessionExpired => {
                HaError::unauthorized(err.to_string())
            }
            ClientError::Api { status, message, .. } => match status {
                400 | 422 => HaError::invalid(message.clone()),
                401 => HaError::unauthorized(message.clone()),
                403 => HaError::permission_denied(message.clone()),
                404 => HaError::not_found(message.clone()),
                409 => HaError::conflict(message.clone()),
                429 => HaError::locked(message.clone(), 0),
                _ => HaError::internal(err.to_string()),
            },
            ClientError::Transport(_) => HaError::internal(err.to_string()),
            ClientError::Decode(_) => HaError::serialization(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_response_body() {
        let err = ClientError::from_response(
            403,
            &json!({"error": "permission_denied", "message": "nope"}),
        );
        assert_eq!(
            err,
            ClientError::Api {
                status: 403,
                code: "permission_denied".into(),
                message: "nope".into()
            }
        );
        assert!(matches!(HaError::from(err), HaError::PermissionDenied { .. }));

        let bare = ClientError::from_response(502, &Value::Null);
        assert!(matches!(bare, ClientError::Api { ref code, .. } if code == "unknown"));
    }

    #[test]
    fn test_session_errors_are_unauthorized() {
        assert!(matches!(
            HaError::from(ClientError::SessionExpired),
            HaError::Unauthorized { .. }
        ));
    }
}
