//! Per-room turn clock.
//!
//! One task per room waits on the current [`TurnTicket`]. While a player
//! owns the turn the task races the turn deadline against the next ticket;
//! if the deadline wins, the turn is handed to the other player and the room
//! is told about the timeout. Tickets are published under the room lock, so
//! a deadline that fires after a move already restarted the clock is
//! recognised as stale and ignored.

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

use crate::protocol::ServerMessage;
use crate::registry::{Room, TurnTicket};

pub struct TurnCoordinator;

impl TurnCoordinator {
    /// Start the clock task for `room`. The task runs until aborted.
    pub fn spawn(room: Arc<Room>, limit: Duration) -> JoinHandle<()> {
        tokio::spawn(run(room, limit))
    }
}

async fn run(room: Arc<Room>, limit: Duration) {
    let mut tickets = room.subscribe_turns();
    loop {
        let ticket = *tickets.borrow_and_update();
        if ticket.owner.is_none() {
            if tickets.changed().await.is_err() {
                break;
            }
            continue;
        }
        tokio::select! {
            changed = tickets.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = sleep(limit) => expire(&room, ticket).await,
        }
    }
    debug!("game {}: turn clock stopped", room.id());
}

/// Hand the turn over if `ticket` is still the running one.
async fn expire(room: &Room, ticket: TurnTicket) {
    let mut session = room.lock().await;
    if room.turn_ticket() != ticket {
        return;
    }
    let mut next = session.clone();
    let (timed_out, turn) = match next.expire_turn() {
        Ok(players) => players,
        Err(e) => {
            debug!("game {}: turn not expired: {}", room.id(), e);
            return;
        }
    };
    if let Err(e) = room.commit(&mut session, next, true).await {
        warn!("game {}: failed to persist turn timeout: {}", room.id(), e);
        return;
    }
    info!(
        "game {}: player {} timed out, turn passes to {}",
        room.id(),
        timed_out,
        turn
    );
    room.broadcast(ServerMessage::timeout(timed_out, turn, session.phase()), None);
}
