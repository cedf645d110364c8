//! Room actor: an isolated Tokio task that owns one room's session.
//!
//! Each room runs in its own task, communicating with connection handlers
//! through an mpsc channel. The actor is the only writer of the room's
//! turn and draw state, and it handles one command at a time, so every
//! precondition check and the write that depends on it happen without
//! interleaving. Mutations are computed on a copy, written to the store,
//! and only then adopted locally and broadcast.

use std::collections::{BTreeMap, HashMap};
use std::ops::ControlFlow;
use std::sync::Arc;

use bingo_protocol::{
    ClientAction, MarkedCell, RoomCode, RoomSnapshot, ServerEvent,
};
use bingo_store::{
    Player, PlayerFilter, PlayerUpdate, Room, RoomStore, RoomUpdate,
    StoreError,
};
use bingo_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::time::Instant;

use crate::board;
use crate::cleanup::{CleanupSchedule, CleanupStage};
use crate::{RoomConfig, RoomError, RoomPhase};

/// Announcement broadcast when the game starts.
const GAME_STARTED_MESSAGE: &str = "Game has started! Good luck!";

/// Announcement broadcast shortly before a finished room is torn down.
const ROOM_CLOSING_MESSAGE: &str = "Game completed! Room will close shortly.";

/// Channel sender for delivering events to one connection.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// The registry's session map, shared with actors so they can remove
/// their own entry when they stop.
pub(crate) type Sessions = Arc<Mutex<HashMap<RoomCode, RoomHandle>>>;

/// Commands sent to a room actor through its channel.
///
/// Every variant carries a reply channel: the caller sends a command and
/// waits for the outcome.
pub(crate) enum RoomCommand {
    /// Admit a connection as player `name`.
    Join {
        conn_id: ConnectionId,
        name: String,
        is_host: bool,
        sender: EventSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Remove a connection.
    Leave {
        conn_id: ConnectionId,
        reply: oneshot::Sender<LeaveOutcome>,
    },

    /// Run a client action on behalf of a connection.
    Action {
        conn_id: ConnectionId,
        action: ClientAction,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Request the current room info.
    Info { reply: oneshot::Sender<RoomInfo> },

    /// Delete the room's records and stop. Replies `true` if the room
    /// record was deleted by this call.
    Destroy { reply: oneshot::Sender<bool> },
}

/// What happened when a connection left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LeaveOutcome {
    /// The last connection left and the room was torn down.
    pub room_destroyed: bool,
}

/// A snapshot of session metadata.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub code: RoomCode,
    pub phase: RoomPhase,
    /// Open connections, counting every socket.
    pub connections: usize,
    pub current_turn_player: String,
    pub drawn_numbers: Vec<u8>,
    /// A post-win cleanup deadline is pending.
    pub cleanup_pending: bool,
}

/// Handle to a running room actor. Used to send commands to it.
///
/// Cheap to clone: it's an `mpsc::Sender` plus the room code.
#[derive(Clone, Debug)]
pub struct RoomHandle {
    code: RoomCode,
    /// Distinguishes this session from a later one for the same code.
    instance: u64,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Returns the room's code.
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub(crate) fn instance(&self) -> u64 {
        self.instance
    }

    /// Returns `true` once the actor has stopped accepting commands.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Admits a connection. On success the connection has already been
    /// sent its `game_init` event.
    pub async fn join(
        &self,
        conn_id: ConnectionId,
        name: impl Into<String>,
        is_host: bool,
        sender: EventSender,
    ) -> Result<(), RoomError> {
        let name = name.into();
        self.request(|reply| RoomCommand::Join {
            conn_id,
            name,
            is_host,
            sender,
            reply,
        })
        .await?
    }

    /// Removes a connection.
    pub async fn leave(
        &self,
        conn_id: ConnectionId,
    ) -> Result<LeaveOutcome, RoomError> {
        self.request(|reply| RoomCommand::Leave { conn_id, reply })
            .await
    }

    /// Runs a client action. Events it produces are delivered through the
    /// event senders; the result says whether it was accepted.
    pub async fn act(
        &self,
        conn_id: ConnectionId,
        action: ClientAction,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Action {
            conn_id,
            action,
            reply,
        })
        .await?
    }

    /// Requests the current room info.
    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        self.request(|reply| RoomCommand::Info { reply }).await
    }

    /// Tears the room down. Returns `true` if this call deleted the room.
    pub async fn destroy(&self) -> Result<bool, RoomError> {
        self.request(|reply| RoomCommand::Destroy { reply }).await
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }
}

/// One open connection in the room.
struct Member {
    name: String,
    is_host: bool,
    sender: EventSender,
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor<S: RoomStore> {
    code: RoomCode,
    instance: u64,
    phase: RoomPhase,
    config: RoomConfig,
    /// Last committed room record.
    room: Room,
    /// Open connections, ordered by id so broadcasts are deterministic.
    members: BTreeMap<ConnectionId, Member>,
    cleanup: CleanupSchedule,
    store: Arc<S>,
    sessions: Sessions,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl<S: RoomStore> RoomActor<S> {
    /// Runs the actor loop until the room is destroyed or every handle
    /// is dropped.
    async fn run(mut self) {
        tracing::info!(room = %self.code, phase = %self.phase, "room session started");

        loop {
            let schedule = self.cleanup;
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if self.handle_command(cmd).await.is_break() {
                        break;
                    }
                }
                stage = schedule.wait() => {
                    if self.handle_cleanup(stage).await.is_break() {
                        break;
                    }
                }
            }
        }

        // Refuse further commands before giving up the registry slot, so
        // a racing join sees a closed handle and starts over.
        self.receiver.close();
        self.release().await;
        tracing::info!(room = %self.code, "room session stopped");
    }

    async fn handle_command(&mut self, cmd: RoomCommand) -> ControlFlow<()> {
        match cmd {
            RoomCommand::Join {
                conn_id,
                name,
                is_host,
                sender,
                reply,
            } => {
                let result =
                    self.handle_join(conn_id, name, is_host, sender).await;
                let _ = reply.send(result);
            }
            RoomCommand::Leave { conn_id, reply } => {
                let outcome = self.handle_leave(conn_id).await;
                let _ = reply.send(outcome);
                if outcome.room_destroyed {
                    return ControlFlow::Break(());
                }
            }
            RoomCommand::Action {
                conn_id,
                action,
                reply,
            } => {
                let result = self.handle_action(conn_id, action).await;
                let _ = reply.send(result);
            }
            RoomCommand::Info { reply } => {
                let _ = reply.send(self.info());
            }
            RoomCommand::Destroy { reply } => {
                let deleted = self.destroy().await;
                let _ = reply.send(deleted);
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    async fn handle_cleanup(&mut self, stage: CleanupStage) -> ControlFlow<()> {
        match stage {
            CleanupStage::Notice => {
                tracing::info!(room = %self.code, "room closing");
                self.broadcast(&ServerEvent::RoomClosing {
                    message: ROOM_CLOSING_MESSAGE.to_string(),
                });
                self.cleanup.arm(
                    Instant::now() + self.config.closing_notice,
                    CleanupStage::Teardown,
                );
                ControlFlow::Continue(())
            }
            CleanupStage::Teardown => {
                self.destroy().await;
                ControlFlow::Break(())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------------

    async fn handle_join(
        &mut self,
        conn_id: ConnectionId,
        name: String,
        is_host: bool,
        sender: EventSender,
    ) -> Result<(), RoomError> {
        // Roster first: if the read fails, no record has been marked
        // connected on behalf of a socket that never joins.
        let mut players = self.store.list_players(&self.code, PlayerFilter::All).await?;
        let (player, created) = self
            .store
            .get_or_create_player(&self.code, &name, is_host)
            .await?;
        match players.iter_mut().find(|p| p.name == player.name) {
            Some(existing) => *existing = player.clone(),
            None => players.push(player.clone()),
        }

        let _ = sender.send(ServerEvent::GameInit {
            board: player.board.clone(),
            player_name: player.name.clone(),
            is_host: player.is_host,
            room_data: self.snapshot(&players),
        });
        self.members.insert(
            conn_id,
            Member {
                name: player.name.clone(),
                is_host: player.is_host,
                sender,
            },
        );

        tracing::info!(
            room = %self.code,
            player = %player.name,
            %conn_id,
            created,
            connections = self.members.len(),
            "player joined"
        );

        self.broadcast(&ServerEvent::PlayerJoined {
            player_name: player.name,
            is_host: player.is_host,
        });
        Ok(())
    }

    async fn handle_leave(&mut self, conn_id: ConnectionId) -> LeaveOutcome {
        let Some(member) = self.members.remove(&conn_id) else {
            return LeaveOutcome::default();
        };

        tracing::info!(
            room = %self.code,
            player = %member.name,
            %conn_id,
            connections = self.members.len(),
            "player left"
        );

        // Another socket still speaks for this player.
        if self.members.values().any(|m| m.name == member.name) {
            return LeaveOutcome::default();
        }

        if let Err(err) = self
            .store
            .update_player(&self.code, &member.name, PlayerUpdate::connected(false))
            .await
        {
            tracing::warn!(
                room = %self.code,
                player = %member.name,
                error = %err,
                "failed to mark player disconnected"
            );
        }

        if self.members.is_empty() {
            self.destroy().await;
            return LeaveOutcome {
                room_destroyed: true,
            };
        }

        if self.phase.is_started() && self.room.current_turn_player == member.name {
            if let Err(err) = self.pass_turn_from(&member.name).await {
                tracing::error!(
                    room = %self.code,
                    player = %member.name,
                    error = %err,
                    "failed to pass turn from departing player"
                );
            }
        }

        self.broadcast(&ServerEvent::PlayerLeft {
            player_name: member.name,
            current_turn_player: self.room.current_turn_player.clone(),
        });
        LeaveOutcome::default()
    }

    /// Hands the turn to whoever follows `name`, skipping `name` itself.
    async fn pass_turn_from(&mut self, name: &str) -> Result<(), RoomError> {
        let mut players = self.store.list_players(&self.code, PlayerFilter::All).await?;
        for player in players.iter_mut().filter(|p| p.name == name) {
            player.is_connected = false;
        }

        let mut next = self.room.clone();
        next.current_turn_player = next_turn(&players, name).unwrap_or_default();
        self.commit(next).await
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    async fn handle_action(
        &mut self,
        conn_id: ConnectionId,
        action: ClientAction,
    ) -> Result<(), RoomError> {
        let (name, is_host) = self
            .members
            .get(&conn_id)
            .map(|m| (m.name.clone(), m.is_host))
            .ok_or(RoomError::NotMember(conn_id))?;

        tracing::debug!(room = %self.code, player = %name, action = action.name(), "action");

        match action {
            ClientAction::StartGame => self.start_game(&name, is_host).await,
            ClientAction::PlayerReady => self.player_ready(&name).await,
            ClientAction::GenerateRandomBoard => {
                let board = board::random_board();
                self.store
                    .update_player(&self.code, &name, PlayerUpdate::board(board.clone()))
                    .await?;
                self.send_to(conn_id, ServerEvent::BoardGenerated { board });
                Ok(())
            }
            ClientAction::ClearBoard => self.clear_board(conn_id, &name).await,
            ClientAction::ManualFillCell { cell_index } => {
                let player = self.player(&name).await?;
                let (board, number) = board::fill_next(&player.board, cell_index)?;
                self.store
                    .update_player(&self.code, &name, PlayerUpdate::board(board.clone()))
                    .await?;
                self.send_to(
                    conn_id,
                    ServerEvent::CellFilled {
                        cell_index,
                        number,
                        board,
                    },
                );
                Ok(())
            }
            ClientAction::SelectNumber { number } => {
                self.select_number(&name, number).await
            }
            ClientAction::ClaimBingo { board_state } => {
                self.claim_bingo(conn_id, &name, &board_state).await
            }
            ClientAction::ChatMessage { message } => {
                self.broadcast(&ServerEvent::Chat {
                    message,
                    sender: name,
                });
                Ok(())
            }
        }
    }

    async fn start_game(&mut self, name: &str, is_host: bool) -> Result<(), RoomError> {
        if !is_host {
            tracing::debug!(room = %self.code, player = %name, "non-host start ignored");
            return Ok(());
        }
        if self.phase.is_started() {
            return Err(RoomError::AlreadyStarted);
        }

        let connected = self
            .store
            .list_players(&self.code, PlayerFilter::Connected)
            .await?;
        let not_ready: Vec<String> = connected
            .iter()
            .filter(|p| !p.is_ready)
            .map(|p| p.name.clone())
            .collect();
        if !not_ready.is_empty() {
            return Err(RoomError::NotAllReady(not_ready));
        }

        let mut next = self.room.clone();
        next.game_started = true;
        next.current_turn_player = connected
            .first()
            .map(|p| p.name.clone())
            .unwrap_or_default();
        self.commit(next).await?;
        self.advance(RoomPhase::InProgress);

        tracing::info!(
            room = %self.code,
            players = connected.len(),
            first_turn = %self.room.current_turn_player,
            "game started"
        );
        self.broadcast(&ServerEvent::GameStarted {
            message: GAME_STARTED_MESSAGE.to_string(),
            current_turn_player: self.room.current_turn_player.clone(),
        });
        Ok(())
    }

    async fn player_ready(&mut self, name: &str) -> Result<(), RoomError> {
        let player = self.player(name).await?;
        if !board::is_playable(&player.board) {
            return Err(RoomError::BoardIncomplete);
        }

        self.store
            .update_player(&self.code, name, PlayerUpdate::ready(true))
            .await?;
        self.broadcast_ready(name).await
    }

    /// A cleared board can't be ready, so a ready player drops back to
    /// unready and the room is told.
    async fn clear_board(&mut self, conn_id: ConnectionId, name: &str) -> Result<(), RoomError> {
        let was_ready = self.player(name).await?.is_ready;
        self.store
            .update_player(&self.code, name, PlayerUpdate::cleared())
            .await?;
        self.send_to(conn_id, ServerEvent::BoardCleared);
        if was_ready {
            self.broadcast_ready(name).await?;
        }
        Ok(())
    }

    async fn broadcast_ready(&self, name: &str) -> Result<(), RoomError> {
        let ready_status = self
            .store
            .list_players(&self.code, PlayerFilter::Connected)
            .await?
            .iter()
            .map(Player::ready_entry)
            .collect();

        self.broadcast(&ServerEvent::PlayerReadyUpdate {
            player_name: name.to_string(),
            ready_status,
        });
        Ok(())
    }

    async fn select_number(&mut self, name: &str, number: u32) -> Result<(), RoomError> {
        self.require_in_progress()?;
        if self.room.current_turn_player != name {
            return Err(RoomError::NotYourTurn(self.room.current_turn_player.clone()));
        }
        let max = self.config.max_number;
        let drawn = u8::try_from(number)
            .ok()
            .filter(|n| (1..=max).contains(n))
            .ok_or(RoomError::NumberOutOfRange { number, max })?;
        if self.room.is_drawn(drawn) {
            return Err(RoomError::AlreadyDrawn);
        }

        let players = self.store.list_players(&self.code, PlayerFilter::All).await?;
        let mut next = self.room.clone();
        next.drawn_numbers.push(drawn);
        next.current_number = Some(drawn);
        next.current_turn_player =
            next_turn(&players, name).unwrap_or_else(|| name.to_string());
        self.commit(next).await?;

        tracing::debug!(
            room = %self.code,
            player = %name,
            number = drawn,
            next_turn = %self.room.current_turn_player,
            "number called"
        );
        self.broadcast(&ServerEvent::NumberCalled {
            number: drawn,
            drawn_numbers: self.room.drawn_numbers.clone(),
            selected_by: name.to_string(),
            current_turn_player: self.room.current_turn_player.clone(),
        });
        Ok(())
    }

    async fn claim_bingo(
        &mut self,
        conn_id: ConnectionId,
        name: &str,
        board_state: &[MarkedCell],
    ) -> Result<(), RoomError> {
        self.require_in_progress()?;

        let room = self.store.get_room(&self.code).await?;
        let outcome =
            board::validate_claim(&room.drawn_numbers, board_state, self.config.lines_to_win);

        if !outcome.valid {
            tracing::debug!(room = %self.code, player = %name, lines = outcome.lines, "invalid bingo");
            self.send_to(
                conn_id,
                ServerEvent::InvalidBingo {
                    message: format!(
                        "Invalid BINGO! You need {} complete lines. You have {} lines.",
                        self.config.lines_to_win, outcome.lines
                    ),
                    lines: outcome.lines,
                },
            );
            return Ok(());
        }

        self.advance(RoomPhase::Finished);
        self.cleanup.arm(
            Instant::now() + self.config.win_grace,
            CleanupStage::Notice,
        );
        tracing::info!(room = %self.code, winner = %name, lines = outcome.lines, "bingo");
        self.broadcast(&ServerEvent::BingoWinner {
            winner: name.to_string(),
            lines: outcome.lines,
        });
        Ok(())
    }

    /// Moves to `target` if the phase order allows it.
    fn advance(&mut self, target: RoomPhase) -> bool {
        if !self.phase.can_transition_to(target) {
            tracing::warn!(room = %self.code, from = %self.phase, to = %target, "phase change refused");
            return false;
        }
        tracing::debug!(room = %self.code, from = %self.phase, to = %target, "phase change");
        self.phase = target;
        true
    }

    fn require_in_progress(&self) -> Result<(), RoomError> {
        match self.phase {
            RoomPhase::Lobby => Err(RoomError::NotStarted),
            RoomPhase::InProgress => Ok(()),
            RoomPhase::Finished | RoomPhase::Destroying => Err(RoomError::GameOver),
        }
    }

    // -----------------------------------------------------------------------
    // Store helpers
    // -----------------------------------------------------------------------

    /// Writes the fields that differ from the committed room, then adopts
    /// `next`. On failure nothing changes locally.
    async fn commit(&mut self, next: Room) -> Result<(), RoomError> {
        let update = RoomUpdate::diff(&self.room, &next);
        if !update.is_empty() {
            self.store.update_room(&self.code, update).await?;
        }
        self.room = next;
        Ok(())
    }

    async fn player(&self, name: &str) -> Result<Player, RoomError> {
        self.store
            .list_players(&self.code, PlayerFilter::All)
            .await?
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| {
                RoomError::Store(StoreError::PlayerNotFound {
                    room: self.code.clone(),
                    name: name.to_string(),
                })
            })
    }

    /// Deletes the room's players and record. Safe to race with other
    /// deleters: returns `true` only if this call removed the room.
    async fn destroy(&mut self) -> bool {
        if !self.advance(RoomPhase::Destroying) {
            return false;
        }
        self.cleanup.disarm();

        let players = match self.store.delete_all_players(&self.code).await {
            Ok(n) => n,
            Err(err) => {
                tracing::error!(room = %self.code, error = %err, "failed to delete players");
                0
            }
        };
        let deleted = match self.store.delete_room(&self.code).await {
            Ok(()) => true,
            Err(err) if err.is_not_found() => false,
            Err(err) => {
                tracing::error!(room = %self.code, error = %err, "failed to delete room");
                false
            }
        };

        tracing::info!(room = %self.code, players, deleted, "room destroyed");
        deleted
    }

    /// Removes this session from the registry, unless a newer session for
    /// the same code has already replaced it.
    async fn release(&self) {
        let mut sessions = self.sessions.lock().await;
        if sessions
            .get(&self.code)
            .is_some_and(|h| h.instance() == self.instance)
        {
            sessions.remove(&self.code);
        }
    }

    // -----------------------------------------------------------------------
    // Fan-out
    // -----------------------------------------------------------------------

    fn snapshot(&self, players: &[Player]) -> RoomSnapshot {
        RoomSnapshot {
            host_name: self.room.host_name.clone(),
            game_started: self.room.game_started,
            current_number: self.room.current_number,
            drawn_numbers: self.room.drawn_numbers.clone(),
            players: players.iter().map(Player::summary).collect(),
            current_turn_player: self.room.current_turn_player.clone(),
        }
    }

    /// Sends an event to every open connection. Connections whose handler
    /// has already gone are skipped.
    fn broadcast(&self, event: &ServerEvent) {
        for member in self.members.values() {
            let _ = member.sender.send(event.clone());
        }
    }

    fn send_to(&self, conn_id: ConnectionId, event: ServerEvent) {
        if let Some(member) = self.members.get(&conn_id) {
            let _ = member.sender.send(event);
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            code: self.code.clone(),
            phase: self.phase,
            connections: self.members.len(),
            current_turn_player: self.room.current_turn_player.clone(),
            drawn_numbers: self.room.drawn_numbers.clone(),
            cleanup_pending: self.cleanup.is_armed(),
        }
    }
}

/// The first connected player after `current` in join order, wrapping
/// around. `current` itself comes last, so a lone connected player keeps
/// the turn. Falls back to the first connected player if `current` isn't
/// listed.
pub(crate) fn next_turn(players: &[Player], current: &str) -> Option<String> {
    let start = players
        .iter()
        .position(|p| p.name == current)
        .map_or(0, |i| i + 1);

    players
        .iter()
        .cycle()
        .skip(start)
        .take(players.len())
        .find(|p| p.is_connected)
        .map(|p| p.name.clone())
}

/// Spawns a room actor for a stored room and returns a handle to it.
pub(crate) fn spawn_room<S: RoomStore>(
    room: Room,
    config: RoomConfig,
    store: Arc<S>,
    sessions: Sessions,
    instance: u64,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.command_buffer.max(1));
    let code = room.code.clone();

    let actor = RoomActor {
        code: code.clone(),
        instance,
        phase: RoomPhase::resume(room.game_started),
        config,
        room,
        members: BTreeMap::new(),
        cleanup: CleanupSchedule::default(),
        store,
        sessions,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        code,
        instance,
        sender: tx,
    }
}
