//! Connection handling and action dispatch.
//!
//! Every connection runs in its own task: a handshake seats the player in a
//! room, then the task races inbound records against the room traffic queued
//! for this player. Actions are applied to a copy of the session under the
//! room lock, persisted, committed, and only then broadcast.

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::core::{ErrorKind, GameId, GameSession, Phase, Placement, PlayerId};
use crate::protocol::{Action, Hello, ServerMessage};
use crate::registry::{ConnectionHandle, Room, RoomRegistry};
use crate::store::{SessionStore, StoreError};
use crate::transport::tcp::TcpTransport;
use crate::transport::Transport;

pub struct GameServer {
    config: ServerConfig,
    store: Arc<dyn SessionStore>,
    registry: RoomRegistry,
}

impl GameServer {
    pub fn new(config: ServerConfig, store: Arc<dyn SessionStore>) -> Self {
        let registry = RoomRegistry::new(Arc::clone(&store), config.turn_timeout, config.seed);
        Self {
            config,
            store,
            registry,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Accept TCP connections until the listener fails.
    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> anyhow::Result<()> {
        loop {
            let (stream, addr) = listener.accept().await?;
            debug!("accepted connection from {}", addr);
            let transport =
                TcpTransport::with_config(stream, self.config.send_timeout, self.config.max_record_len);
            let server = Arc::clone(&self);
            tokio::spawn(async move {
                if let Err(e) = server.handle_connection(transport).await {
                    warn!("connection from {} ended with an error: {}", addr, e);
                }
            });
        }
    }

    /// Drive one connection from handshake to disconnect.
    pub async fn handle_connection<T: Transport + 'static>(
        self: Arc<Self>,
        mut transport: T,
    ) -> anyhow::Result<()> {
        let Some(first) = transport.recv().await? else {
            return Ok(());
        };
        let hello = match Hello::parse(&first) {
            Ok(hello) => hello,
            Err(e) => {
                return reject(&mut transport, e.action(), &e.to_string(), ErrorKind::Protocol).await
            }
        };
        let player = hello.player_id();
        let game_id = match &hello {
            Hello::CreateGame { .. } => match self.store.create_session(player).await {
                Ok(id) => {
                    info!("game {}: created by player {}", id, player);
                    id
                }
                Err(e) => return reject(&mut transport, hello.name(), &e.to_string(), e.kind()).await,
            },
            Hello::JoinGame { game_id, .. } => *game_id,
        };
        let joined = match self.seat(game_id, player).await {
            Ok(joined) => joined,
            Err(e) => return reject(&mut transport, hello.name(), &e.to_string(), e.kind()).await,
        };

        let (handle, mut outbound) = ConnectionHandle::new();
        let connection = handle.id();
        let room = match self.registry.connect(game_id, player, handle).await {
            Ok(room) => room,
            Err(e) => return reject(&mut transport, hello.name(), &e.to_string(), e.kind()).await,
        };
        info!("game {}: player {} connected", game_id, player);

        let result = self
            .run_connection(&mut transport, &room, player, hello.name(), joined, &mut outbound)
            .await;

        if self.registry.release(&room, player, connection).await {
            info!("game {}: player {} disconnected", game_id, player);
            room.broadcast(ServerMessage::player_left(player), Some(player));
        }
        let _ = transport.close().await;
        result
    }

    async fn run_connection<T: Transport>(
        &self,
        transport: &mut T,
        room: &Room,
        player: PlayerId,
        hello: &str,
        joined: bool,
        outbound: &mut tokio::sync::mpsc::UnboundedReceiver<ServerMessage>,
    ) -> anyhow::Result<()> {
        let phase = room.lock().await.phase();
        transport
            .send_message(&ServerMessage::connected(hello, room.id(), player, phase))
            .await?;
        {
            let session = room.lock().await;
            if joined {
                room.broadcast(ServerMessage::player_joined(player), Some(player));
                room.broadcast_views(&session);
            } else if let Some(view) = session.view_for(player) {
                room.send_to(player, ServerMessage::game_state(view));
            }
        }

        loop {
            tokio::select! {
                inbound = transport.recv() => match inbound? {
                    Some(record) => {
                        if let Some(reply) = self.dispatch(room, player, &record).await {
                            transport.send_message(&reply).await?;
                        }
                    }
                    None => return Ok(()),
                },
                queued = outbound.recv() => match queued {
                    Some(msg) => transport.send_message(&msg).await?,
                    None => {
                        debug!("game {}: connection for player {} replaced", room.id(), player);
                        return Ok(());
                    }
                },
            }
        }
    }

    /// Make sure `player` holds a seat in `game_id`, taking the free second
    /// seat if needed. Returns whether the player newly joined.
    ///
    /// A rejected join closes the room again if nobody is connected to it.
    async fn seat(&self, game_id: GameId, player: PlayerId) -> Result<bool, StoreError> {
        loop {
            let room = self.registry.open(game_id).await?;
            let mut session = room.lock().await;
            // A room closed between open and lock must not be written to.
            if !self.registry.is_current(&room).await {
                continue;
            }
            if session.seat_of(player).is_some() {
                return Ok(false);
            }
            let result = match self.store.join_session(game_id, player).await {
                Ok(joined) => room.commit(&mut session, joined, false).await,
                Err(e) => Err(e),
            };
            drop(session);
            return match result {
                Ok(()) => {
                    info!("game {}: player {} joined", game_id, player);
                    Ok(true)
                }
                Err(e) => {
                    self.registry.close_if_idle(&room).await;
                    Err(e)
                }
            };
        }
    }

    /// Apply one inbound record. Returns the reply for the acting
    /// connection, if the action has one.
    async fn dispatch(&self, room: &Room, player: PlayerId, record: &str) -> Option<ServerMessage> {
        let action = match Action::parse(record) {
            Ok(action) => action,
            Err(e) => {
                debug!("game {}: player {} sent a bad record: {}", room.id(), player, e);
                return Some(ServerMessage::error(e.action(), e.to_string(), ErrorKind::Protocol));
            }
        };
        let name = action.name();
        let mut session = room.lock().await;

        if action == Action::GetState {
            return match session.view_for(player) {
                Some(view) => Some(ServerMessage::game_state(view)),
                None => Some(ServerMessage::error(name, "Player is not part of this game", ErrorKind::NotFound)),
            };
        }

        let mut next: GameSession = session.clone();
        let applied = match &action {
            Action::PlaceShip {
                x,
                y,
                size,
                orientation,
            } => next
                .place_ship(player, &Placement::new(*x, *y, *size, *orientation))
                .map(|_| Applied::Placed),
            Action::AutoPlace => {
                let mut rng = room.rng();
                next.auto_place(player, &mut *rng).map(|_| Applied::Placed)
            }
            Action::Ready => next.ready(player).map(Applied::Ready),
            Action::MakeMove { x, y } => next.make_move(player, *x, *y).map(Applied::Moved),
            Action::GetState => return None,
        };
        let applied = match applied {
            Ok(applied) => applied,
            Err(e) => {
                debug!("game {}: player {} {} rejected: {}", room.id(), player, name, e);
                return Some(ServerMessage::error(name, e.to_string(), e.kind()));
            }
        };

        let rearm = matches!(applied, Applied::Moved(_));
        if let Err(e) = room.commit(&mut session, next, rearm).await {
            warn!("game {}: failed to persist {}: {}", room.id(), name, e);
            return Some(ServerMessage::error(name, e.to_string(), e.kind()));
        }

        match applied {
            Applied::Placed => {
                let board = session
                    .seat_of(player)
                    .map(|seat| session.board(seat).rows())
                    .unwrap_or_default();
                Some(ServerMessage::board(name, board, session.phase()))
            }
            Applied::Ready(phase) => {
                room.broadcast(ServerMessage::player_ready("player_ready", player, phase), None);
                if phase == Phase::InProgress {
                    info!("game {}: both players ready, battle starts", room.id());
                    room.broadcast_views(&session);
                }
                Some(ServerMessage::player_ready(name, player, phase))
            }
            Applied::Moved(outcome) => {
                room.broadcast(ServerMessage::move_result(&outcome), None);
                if outcome.phase == Phase::Finished {
                    info!("game {}: player {} won", room.id(), player);
                    room.broadcast_views(&session);
                }
                None
            }
        }
    }
}

enum Applied {
    Placed,
    Ready(Phase),
    Moved(crate::core::MoveOutcome),
}

/// Report a failed handshake and close the connection.
async fn reject<T: Transport>(
    transport: &mut T,
    action: &str,
    message: &str,
    kind: ErrorKind,
) -> anyhow::Result<()> {
    info!("closing connection: {}", message);
    transport
        .send_message(&ServerMessage::error(action, message, kind))
        .await?;
    transport.close().await
}
