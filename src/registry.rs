//! Per-room connection registry and broadcast fabric.
//!
//! A [`Room`] owns the live copy of one session, the single lock that
//! serializes every mutation of it, and the bindings from player ids to
//! connection handles. The [`RoomRegistry`] opens rooms on first use and
//! tears them down once their last player disconnects.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard as StdMutexGuard};

use log::{debug, info, warn};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tokio::sync::{mpsc, watch, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio::time::Duration;

use crate::core::{GameId, GameSession, Phase, PlayerId};
use crate::protocol::ServerMessage;
use crate::store::{SessionStore, StoreError};
use crate::turn::TurnCoordinator;

static NEXT_CONNECTION: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of one transport connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

/// Sending side of a connection as held by a room.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    tx: mpsc::UnboundedSender<ServerMessage>,
}

impl ConnectionHandle {
    /// New handle plus the receiver the connection task drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = ConnectionId(NEXT_CONNECTION.fetch_add(1, Ordering::Relaxed));
        (Self { id, tx }, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

/// Who owns the running turn clock. A new epoch is published every time the
/// clock has to restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnTicket {
    pub owner: Option<PlayerId>,
    pub epoch: u64,
}

fn clock_owner(session: &GameSession) -> Option<PlayerId> {
    if session.phase() == Phase::InProgress {
        session.turn()
    } else {
        None
    }
}

fn lock_std<T>(mutex: &StdMutex<T>) -> StdMutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct Room {
    id: GameId,
    session: Mutex<GameSession>,
    bindings: StdMutex<HashMap<PlayerId, ConnectionHandle>>,
    turn: watch::Sender<TurnTicket>,
    clock: StdMutex<Option<JoinHandle<()>>>,
    rng: StdMutex<SmallRng>,
    store: Arc<dyn SessionStore>,
}

impl Room {
    fn new(session: GameSession, store: Arc<dyn SessionStore>, seed: Option<u64>) -> Self {
        let id = session.id();
        let rng = match seed {
            Some(s) => SmallRng::seed_from_u64(s ^ id),
            None => SmallRng::from_rng(&mut rand::rng()),
        };
        let (turn, _) = watch::channel(TurnTicket {
            owner: clock_owner(&session),
            epoch: 0,
        });
        Self {
            id,
            session: Mutex::new(session),
            bindings: StdMutex::new(HashMap::new()),
            turn,
            clock: StdMutex::new(None),
            rng: StdMutex::new(rng),
            store,
        }
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    /// Acquire the room lock. Every mutation of the session happens while
    /// this guard is held.
    pub async fn lock(&self) -> MutexGuard<'_, GameSession> {
        self.session.lock().await
    }

    /// Random source for automatic placement.
    pub fn rng(&self) -> StdMutexGuard<'_, SmallRng> {
        lock_std(&self.rng)
    }

    /// Persist `next` and make it the live session. Persistence happens
    /// first, so a failed save leaves `current` untouched. The turn clock is
    /// restarted when its owner changes or when `rearm` is set.
    pub async fn commit(
        &self,
        current: &mut GameSession,
        next: GameSession,
        rearm: bool,
    ) -> Result<(), StoreError> {
        self.store.save_session(&next).await?;
        let owner = clock_owner(&next);
        *current = next;
        let running = self.turn.borrow().owner;
        if rearm || owner != running {
            self.turn.send_modify(|ticket| {
                ticket.owner = owner;
                ticket.epoch += 1;
            });
        }
        Ok(())
    }

    pub fn turn_ticket(&self) -> TurnTicket {
        *self.turn.borrow()
    }

    pub fn subscribe_turns(&self) -> watch::Receiver<TurnTicket> {
        self.turn.subscribe()
    }

    fn start_clock(self: &Arc<Self>, limit: Duration) {
        let handle = TurnCoordinator::spawn(Arc::clone(self), limit);
        if let Some(old) = lock_std(&self.clock).replace(handle) {
            old.abort();
        }
    }

    fn stop_clock(&self) {
        if let Some(handle) = lock_std(&self.clock).take() {
            handle.abort();
        }
    }

    /// Bind `player` to `handle`, returning the binding it replaces.
    pub fn bind(&self, player: PlayerId, handle: ConnectionHandle) -> Option<ConnectionHandle> {
        lock_std(&self.bindings).insert(player, handle)
    }

    /// Remove `player`'s binding whatever connection holds it.
    pub fn unbind(&self, player: PlayerId) -> Option<ConnectionHandle> {
        lock_std(&self.bindings).remove(&player)
    }

    /// Remove `player`'s binding only if it still belongs to `connection`.
    /// A connection that was replaced by a reconnect releases nothing.
    pub fn release(&self, player: PlayerId, connection: ConnectionId) -> bool {
        let mut bindings = lock_std(&self.bindings);
        match bindings.get(&player) {
            Some(handle) if handle.id == connection => {
                bindings.remove(&player);
                true
            }
            _ => false,
        }
    }

    pub fn is_bound(&self, player: PlayerId) -> bool {
        lock_std(&self.bindings).contains_key(&player)
    }

    pub fn is_empty(&self) -> bool {
        lock_std(&self.bindings).is_empty()
    }

    pub fn connected_players(&self) -> Vec<PlayerId> {
        lock_std(&self.bindings).keys().copied().collect()
    }

    /// Best-effort delivery to one player. A handle whose connection is gone
    /// is pruned; the caller carries on either way.
    pub fn send_to(&self, player: PlayerId, msg: ServerMessage) -> bool {
        let Some(handle) = lock_std(&self.bindings).get(&player).cloned() else {
            debug!("game {}: player {} is not connected, dropping {}", self.id, player, msg.action);
            return false;
        };
        if handle.tx.send(msg).is_ok() {
            return true;
        }
        warn!("game {}: stale connection for player {}, pruning", self.id, player);
        self.release(player, handle.id);
        false
    }

    /// Best-effort delivery to every bound player except `exclude`.
    pub fn broadcast(&self, msg: ServerMessage, exclude: Option<PlayerId>) {
        for player in self.connected_players() {
            if Some(player) != exclude {
                self.send_to(player, msg.clone());
            }
        }
    }

    /// Send every bound player its own view of `session`.
    pub fn broadcast_views(&self, session: &GameSession) {
        for player in self.connected_players() {
            if let Some(view) = session.view_for(player) {
                self.send_to(player, ServerMessage::game_state(view));
            }
        }
    }
}

/// All live rooms of this process.
pub struct RoomRegistry {
    rooms: Mutex<HashMap<GameId, Arc<Room>>>,
    /// Bumped under the map lock every time a room is removed.
    teardowns: AtomicU64,
    store: Arc<dyn SessionStore>,
    turn_timeout: Duration,
    seed: Option<u64>,
}

impl RoomRegistry {
    pub fn new(store: Arc<dyn SessionStore>, turn_timeout: Duration, seed: Option<u64>) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            teardowns: AtomicU64::new(0),
            store,
            turn_timeout,
            seed,
        }
    }

    /// The live room for `game_id`, loading its session if no room is open.
    ///
    /// The store is read without holding the map lock. A load that raced
    /// with a room teardown may be older than what that room saved, so it is
    /// discarded and repeated.
    pub async fn open(&self, game_id: GameId) -> Result<Arc<Room>, StoreError> {
        loop {
            let seen = self.teardowns.load(Ordering::SeqCst);
            if let Some(room) = self.room(game_id).await {
                return Ok(room);
            }
            let session = self.store.load_session(game_id).await?;

            let mut rooms = self.rooms.lock().await;
            if let Some(room) = rooms.get(&game_id) {
                return Ok(Arc::clone(room));
            }
            if self.teardowns.load(Ordering::SeqCst) != seen {
                debug!("game {}: room closed during load, reloading", game_id);
                continue;
            }
            let room = Arc::new(Room::new(session, Arc::clone(&self.store), self.seed));
            room.start_clock(self.turn_timeout);
            rooms.insert(game_id, Arc::clone(&room));
            info!("game {}: room opened", game_id);
            return Ok(room);
        }
    }

    /// Whether `room` is still the registered room for its game.
    pub async fn is_current(&self, room: &Arc<Room>) -> bool {
        let rooms = self.rooms.lock().await;
        rooms.get(&room.id).is_some_and(|r| Arc::ptr_eq(r, room))
    }

    pub async fn room(&self, game_id: GameId) -> Option<Arc<Room>> {
        self.rooms.lock().await.get(&game_id).cloned()
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }

    /// Bind `player` to `handle` in the room for `game_id`, opening the room
    /// if needed. A previous binding for the same player is replaced and its
    /// handle dropped, which ends that connection's outbound stream.
    pub async fn connect(
        &self,
        game_id: GameId,
        player: PlayerId,
        handle: ConnectionHandle,
    ) -> Result<Arc<Room>, StoreError> {
        loop {
            let room = self.open(game_id).await?;
            // Binding under the map lock keeps teardown from closing the
            // room between the registration check and the bind.
            let rooms = self.rooms.lock().await;
            if !rooms.get(&game_id).is_some_and(|r| Arc::ptr_eq(r, &room)) {
                continue;
            }
            if let Some(old) = room.bind(player, handle.clone()) {
                info!(
                    "game {}: player {} reconnected, replacing connection {:?}",
                    game_id, player, old.id
                );
            }
            return Ok(room);
        }
    }

    /// Drop `player`'s binding and close the room if nobody is left.
    pub async fn disconnect(&self, game_id: GameId, player: PlayerId) {
        let Some(room) = self.room(game_id).await else {
            return;
        };
        if room.unbind(player).is_some() {
            debug!("game {}: player {} disconnected", game_id, player);
        }
        self.close_if_idle(&room).await;
    }

    /// Release the binding held by `connection`, closing the room if it was
    /// the last one. Returns whether the binding was still live.
    pub async fn release(&self, room: &Arc<Room>, player: PlayerId, connection: ConnectionId) -> bool {
        let released = room.release(player, connection);
        self.close_if_idle(room).await;
        released
    }

    pub async fn send_to(&self, game_id: GameId, player: PlayerId, msg: ServerMessage) -> bool {
        match self.room(game_id).await {
            Some(room) => room.send_to(player, msg),
            None => false,
        }
    }

    pub async fn broadcast(&self, game_id: GameId, msg: ServerMessage, exclude: Option<PlayerId>) {
        if let Some(room) = self.room(game_id).await {
            room.broadcast(msg, exclude);
        }
    }

    /// Tear `room` down if it has no bindings. Waits for the room lock first
    /// so an in-flight mutation always completes against a registered room.
    /// Must not be called while holding that lock.
    pub async fn close_if_idle(&self, room: &Arc<Room>) {
        if !room.is_empty() {
            return;
        }
        let _session = room.lock().await;
        let mut rooms = self.rooms.lock().await;
        if !room.is_empty() || !rooms.get(&room.id).is_some_and(|r| Arc::ptr_eq(r, room)) {
            return;
        }
        rooms.remove(&room.id);
        self.teardowns.fetch_add(1, Ordering::SeqCst);
        room.stop_clock();
        info!("game {}: last player left, room closed", room.id);
    }
}
