//! HomeAsisstan Client
//!
//! Holds a member's access/refresh pair and attaches it to API calls. When an
//! access token has expired the server answers 401; the client refreshes once,
//! shared by every request that hit the same 401, and replays the request.
//!
//! The HTTP stack is abstracted behind [`ApiTransport`] so the session logic
//! runs the same against a real server or a test double.

#![allow(missing_docs)]

pub mod error;
pub mod session;
pub mod transport;

pub use error::ClientError;
pub use session::{SessionClient, ACTIVATE_PATH, HOUSE_PATH, LOGIN_PATH, LOGOUT_PATH, REFRESH_PATH};
pub use transport::{ApiRequest, ApiResponse, ApiTransport, Method};
