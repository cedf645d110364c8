//! Identity resolution hook for incoming sockets.
//!
//! The room engine doesn't know how players were authenticated; it only
//! needs `{user_name, room_code, is_host}` for each socket. The
//! [`IdentityResolver`] trait is the seam: [`SessionManager`] implements
//! it with issued tokens, and an embedding application can plug in its own
//! (signed cookies, an HTTP session store, ...).
//!
//! [`SessionManager`]: crate::SessionManager

use std::future::Future;

use bingo_transport::UpgradeRequest;

use crate::{SessionError, SessionIdentity};

/// Resolves the identity of a socket from the request it was opened with.
///
/// # Example
///
/// ```rust
/// use bingo_protocol::RoomCode;
/// use bingo_session::{IdentityResolver, SessionError, SessionIdentity};
/// use bingo_transport::UpgradeRequest;
///
/// /// Trusts `?name=..&room=..` blindly. Development only.
/// struct TrustingResolver;
///
/// impl IdentityResolver for TrustingResolver {
///     async fn resolve(
///         &self,
///         request: &UpgradeRequest,
///     ) -> Result<SessionIdentity, SessionError> {
///         let name = request.query_param("name").ok_or(SessionError::MissingIdentity)?;
///         let room = request.query_param("room").ok_or(SessionError::MissingIdentity)?;
///         Ok(SessionIdentity {
///             user_name: name.to_string(),
///             room_code: RoomCode::new(room),
///             is_host: request.query_param("host").is_some(),
///         })
///     }
/// }
/// ```
pub trait IdentityResolver: Send + Sync + 'static {
    /// Returns the identity bound to this request.
    ///
    /// # Errors
    /// - [`SessionError::MissingIdentity`]: no credentials presented
    /// - [`SessionError::UnknownToken`]: credentials not recognized
    fn resolve(
        &self,
        request: &UpgradeRequest,
    ) -> impl Future<Output = Result<SessionIdentity, SessionError>> + Send;
}
