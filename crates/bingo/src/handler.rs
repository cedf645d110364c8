//! Per-connection handler: admission, action dispatch, and event delivery.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Resolve the socket's identity → close with 4000 if there is none
//!   2. Join the room session → close with 4001/4002 if that fails
//!   3. Loop: decode actions and forward them to the room, while writing
//!      room events back to the socket
//!   4. On close (either side), leave the room

use std::sync::Arc;

use bingo_protocol::{
    ClientAction, CloseReason, Codec, ServerEvent, GENERIC_ERROR,
};
use bingo_room::{RoomError, RoomHandle};
use bingo_session::IdentityResolver;
use bingo_store::RoomStore;
use bingo_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::BingoError;

/// Drop guard that leaves the room when the handler exits.
///
/// This ensures cleanup happens on every exit path, including early
/// returns and panics. Since `Drop` is synchronous, we spawn a
/// fire-and-forget task for the actor round-trip.
struct LeaveGuard {
    handle: RoomHandle,
    conn_id: ConnectionId,
}

impl Drop for LeaveGuard {
    fn drop(&mut self) {
        let handle = self.handle.clone();
        let conn_id = self.conn_id;
        tokio::spawn(async move {
            match handle.leave(conn_id).await {
                Ok(outcome) if outcome.room_destroyed => {
                    tracing::info!(room = %handle.code(), %conn_id, "last player left");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(room = %handle.code(), %conn_id, error = %e, "leave failed");
                }
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<S, R, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<S, R, C>>,
) -> Result<(), BingoError>
where
    S: RoomStore,
    R: IdentityResolver,
    C: Codec,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, path = %conn.request().path, "handling new connection");

    // --- Step 1: Identity ---
    let identity = match state.resolver.resolve(conn.request()).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!(%conn_id, error = %e, "rejecting connection without session");
            reject(&conn, CloseReason::NoSession).await;
            return Err(e.into());
        }
    };

    // --- Step 2: Admission ---
    let (events_tx, mut events) = mpsc::unbounded_channel();
    // Weak, so the channel closes once the room drops its sender.
    let replies = events_tx.downgrade();

    let handle = match state
        .rooms
        .join(
            &identity.room_code,
            conn_id,
            &identity.user_name,
            identity.is_host,
            events_tx,
        )
        .await
    {
        Ok(handle) => handle,
        Err(e) => {
            let reason = match e {
                RoomError::NotFound(_) | RoomError::Store(_) => {
                    CloseReason::ResolutionFailed
                }
                _ => CloseReason::InternalError,
            };
            tracing::warn!(
                %conn_id,
                room = %identity.room_code,
                player = %identity.user_name,
                error = %e,
                code = reason.code(),
                "admission failed"
            );
            reject(&conn, reason).await;
            return Err(e.into());
        }
    };
    let _guard = LeaveGuard {
        handle: handle.clone(),
        conn_id,
    };

    // --- Step 3: Message loop ---
    loop {
        tokio::select! {
            inbound = conn.recv() => {
                let data = match inbound {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        tracing::info!(%conn_id, player = %identity.user_name, "connection closed cleanly");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%conn_id, error = %e, "recv error");
                        break;
                    }
                };
                dispatch(&handle, &state.codec, conn_id, &data, &replies).await;
            }
            outbound = events.recv() => {
                let Some(event) = outbound else {
                    // The room session stopped and dropped our sender.
                    tracing::info!(%conn_id, room = %identity.room_code, "room closed, closing connection");
                    let _ = conn.close().await;
                    break;
                };
                let bytes = state.codec.encode(&event)?;
                conn.send(&bytes).await?;
            }
        }
    }

    // _guard drops here → leave fires.
    Ok(())
}

/// Decodes one inbound message and runs it against the room. Never fails:
/// problems are reported to the client as `error` events.
async fn dispatch<C: Codec>(
    handle: &RoomHandle,
    codec: &C,
    conn_id: ConnectionId,
    data: &[u8],
    replies: &mpsc::WeakUnboundedSender<ServerEvent>,
) {
    let action: ClientAction = match codec.decode(data) {
        Ok(action) => action,
        Err(e) => {
            tracing::debug!(%conn_id, error = %e, "failed to decode action");
            reply(replies, GENERIC_ERROR);
            return;
        }
    };

    let name = action.name();
    match handle.act(conn_id, action).await {
        Ok(()) => {}
        Err(e) if e.is_rejection() => {
            tracing::debug!(%conn_id, action = name, reason = %e, "action rejected");
            reply(replies, &e.to_string());
        }
        Err(e) => {
            tracing::error!(%conn_id, room = %handle.code(), action = name, error = %e, "action failed");
            reply(replies, GENERIC_ERROR);
        }
    }
}

/// Queues an `error` event behind any events the room already sent.
fn reply(replies: &mpsc::WeakUnboundedSender<ServerEvent>, message: &str) {
    if let Some(tx) = replies.upgrade() {
        let _ = tx.send(ServerEvent::error(message));
    }
}

/// Closes a socket that failed admission with the given close code.
async fn reject(conn: &WebSocketConnection, reason: CloseReason) {
    if let Err(e) = conn.close_with(reason.code(), reason.reason()).await {
        tracing::debug!(conn_id = %conn.id(), error = %e, "close failed");
    }
}
