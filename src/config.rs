use std::path::PathBuf;

use tokio::time::Duration;

use crate::core::BOARD_SIZE;
use crate::transport::tcp::{DEFAULT_SEND_TIMEOUT, MAX_RECORD_LEN};

/// Default time a player has to make a move.
pub const DEFAULT_TURN_TIMEOUT: Duration = Duration::from_secs(30);

pub const MIN_BOARD_SIZE: usize = 4;
pub const MAX_BOARD_SIZE: usize = 26;

/// Runtime settings of the game server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub board_size: usize,
    pub turn_timeout: Duration,
    /// Directory for the file-backed session store; in-memory when unset.
    pub data_dir: Option<PathBuf>,
    /// Fixed seed for automatic ship placement.
    pub seed: Option<u64>,
    pub max_record_len: usize,
    pub send_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            board_size: BOARD_SIZE,
            turn_timeout: DEFAULT_TURN_TIMEOUT,
            data_dir: None,
            seed: None,
            max_record_len: MAX_RECORD_LEN,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&self.board_size) {
            return Err(anyhow::anyhow!(
                "board size {} is outside {}..={}",
                self.board_size,
                MIN_BOARD_SIZE,
                MAX_BOARD_SIZE
            ));
        }
        if self.turn_timeout.is_zero() {
            return Err(anyhow::anyhow!("turn timeout must be greater than zero"));
        }
        if self.max_record_len == 0 {
            return Err(anyhow::anyhow!("maximum record length must be greater than zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_board_size_and_timeout() {
        let small = ServerConfig {
            board_size: 3,
            ..ServerConfig::default()
        };
        assert!(small.validate().is_err());
        let instant = ServerConfig {
            turn_timeout: Duration::ZERO,
            ..ServerConfig::default()
        };
        assert!(instant.validate().is_err());
    }
}
