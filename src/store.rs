//! Session persistence.
//!
//! The server only needs four operations from its store: create, join,
//! load and save. Two implementations are provided: an in-process map and
//! a directory of bincode-encoded files.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;
use tokio::sync::Mutex;

use crate::core::{ActionError, ErrorKind, GameId, GameSession, PlayerId};

/// Errors returned by a [`SessionStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No session with this id.
    NotFound(GameId),
    /// Both seats of the session are taken.
    AlreadyFull(GameId),
    /// Reading or writing the backing storage failed.
    Io(String),
    /// Stored bytes could not be encoded or decoded.
    Codec(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound(_) | StoreError::AlreadyFull(_) => ErrorKind::NotFound,
            StoreError::Io(_) | StoreError::Codec(_) => ErrorKind::Storage,
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(id) => write!(f, "Game {} not found", id),
            StoreError::AlreadyFull(id) => write!(f, "Game {} already has two players", id),
            StoreError::Io(e) => write!(f, "Storage error: {}", e),
            StoreError::Codec(e) => write!(f, "Stored session is unreadable: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a session with `first_player` in the first seat.
    async fn create_session(&self, first_player: PlayerId) -> Result<GameId, StoreError>;

    /// Load a session, `NotFound` if it does not exist.
    async fn load_session(&self, id: GameId) -> Result<GameSession, StoreError>;

    /// Persist the current state of `session`.
    async fn save_session(&self, session: &GameSession) -> Result<(), StoreError>;

    /// Seat `second_player` in the session and persist the result.
    /// A player who already holds a seat gets the session back unchanged.
    async fn join_session(
        &self,
        id: GameId,
        second_player: PlayerId,
    ) -> Result<GameSession, StoreError> {
        let mut session = self.load_session(id).await?;
        let before = session.clone();
        match session.join(second_player) {
            Ok(_) => {}
            Err(ActionError::GameFull) => return Err(StoreError::AlreadyFull(id)),
            Err(e) => return Err(StoreError::Io(e.to_string())),
        }
        if session != before {
            self.save_session(&session).await?;
        }
        Ok(session)
    }
}

/// Sessions kept in process memory.
pub struct MemoryStore {
    sessions: Mutex<HashMap<GameId, GameSession>>,
    next_id: AtomicU64,
    board_size: usize,
}

impl MemoryStore {
    pub fn new(board_size: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            board_size,
        }
    }
}

#[async_trait::async_trait]
impl SessionStore for MemoryStore {
    async fn create_session(&self, first_player: PlayerId) -> Result<GameId, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let session = GameSession::new(id, first_player, self.board_size);
        self.sessions.lock().await.insert(id, session);
        Ok(id)
    }

    async fn load_session(&self, id: GameId) -> Result<GameSession, StoreError> {
        self.sessions
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn save_session(&self, session: &GameSession) -> Result<(), StoreError> {
        self.sessions
            .lock()
            .await
            .insert(session.id(), session.clone());
        Ok(())
    }
}

/// One bincode file per session inside a data directory.
pub struct FileStore {
    dir: PathBuf,
    next_id: AtomicU64,
    board_size: usize,
}

impl FileStore {
    /// Open (creating if needed) `dir`. New ids continue after the highest
    /// session already stored there.
    pub async fn open(dir: impl AsRef<Path>, board_size: usize) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        let mut highest = 0;
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if let Some(id) = entry.file_name().to_str().and_then(parse_file_name) {
                highest = highest.max(id);
            }
        }
        debug!("opened session store at {} (highest id {})", dir.display(), highest);
        Ok(Self {
            dir,
            next_id: AtomicU64::new(highest + 1),
            board_size,
        })
    }

    fn path_for(&self, id: GameId) -> PathBuf {
        self.dir.join(format!("game-{}.bin", id))
    }
}

fn parse_file_name(name: &str) -> Option<GameId> {
    name.strip_prefix("game-")?.strip_suffix(".bin")?.parse().ok()
}

#[async_trait::async_trait]
impl SessionStore for FileStore {
    async fn create_session(&self, first_player: PlayerId) -> Result<GameId, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let session = GameSession::new(id, first_player, self.board_size);
        self.save_session(&session).await?;
        Ok(id)
    }

    async fn load_session(&self, id: GameId) -> Result<GameSession, StoreError> {
        let bytes = match tokio::fs::read(self.path_for(id)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id))
            }
            Err(e) => return Err(e.into()),
        };
        bincode::deserialize(&bytes).map_err(|e| StoreError::Codec(e.to_string()))
    }

    async fn save_session(&self, session: &GameSession) -> Result<(), StoreError> {
        let bytes = bincode::serialize(session).map_err(|e| StoreError::Codec(e.to_string()))?;
        let path = self.path_for(session.id());
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}
