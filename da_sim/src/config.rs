//! Simulator configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use dilemma_arena::tournament::{EngineConfig, TournamentError, TournamentFormat};

/// Complete simulator configuration
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Tournaments to run concurrently
    pub tournaments: usize,
    /// Players per tournament
    pub players: usize,
    pub format: TournamentFormat,
    /// Rounds of play per match
    pub moves_per_match: u32,
    /// Print a JSON report per finished tournament to stdout
    pub json: bool,
    /// Engine settings, from `ARENA_*` variables
    pub engine: EngineConfig,
}

impl SimConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `tournaments_override` - Optional tournament count (from CLI args)
    /// * `players_override` - Optional roster size (from CLI args)
    /// * `format_override` - Optional format tag (from CLI args)
    /// * `moves_override` - Optional moves per match (from CLI args)
    /// * `json_flag` - JSON reports requested on the command line
    ///
    /// # Errors
    ///
    /// Returns error if the format tag is not a known format
    pub fn from_env(
        tournaments_override: Option<usize>,
        players_override: Option<usize>,
        format_override: Option<String>,
        moves_override: Option<u32>,
        json_flag: bool,
    ) -> Result<Self, ConfigError> {
        let format_tag = format_override
            .or_else(|| std::env::var("SIM_FORMAT").ok())
            .unwrap_or_else(|| "single_elimination".to_string());
        let format = format_tag
            .parse::<TournamentFormat>()
            .map_err(|e| ConfigError::Invalid {
                var: "SIM_FORMAT".to_string(),
                reason: e.to_string(),
            })?;

        Ok(SimConfig {
            tournaments: tournaments_override
                .unwrap_or_else(|| parse_env_or("SIM_TOURNAMENTS", 1)),
            players: players_override.unwrap_or_else(|| parse_env_or("SIM_PLAYERS", 8)),
            format,
            moves_per_match: moves_override.unwrap_or_else(|| parse_env_or("SIM_MOVES", 20)),
            json: json_flag || parse_env_or("SIM_JSON", false),
            engine: EngineConfig::from_env(),
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tournaments == 0 {
            return Err(ConfigError::Invalid {
                var: "SIM_TOURNAMENTS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.moves_per_match == 0 {
            return Err(ConfigError::Invalid {
                var: "SIM_MOVES".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.moves_per_match > self.engine.max_moves_per_match {
            return Err(ConfigError::Invalid {
                var: "SIM_MOVES".to_string(),
                reason: format!(
                    "Must be at most the engine move cap ({})",
                    self.engine.max_moves_per_match
                ),
            });
        }

        // Highest payoff per move is 5
        if u64::from(self.moves_per_match) * 5 > u64::from(self.engine.max_match_score) {
            return Err(ConfigError::Invalid {
                var: "SIM_MOVES".to_string(),
                reason: format!(
                    "Scores could exceed the engine maximum ({})",
                    self.engine.max_match_score
                ),
            });
        }

        self.engine.validate()?;

        if self.players < self.engine.min_players || self.players > self.engine.max_players {
            return Err(ConfigError::Invalid {
                var: "SIM_PLAYERS".to_string(),
                reason: format!(
                    "Must be between {} and {}",
                    self.engine.min_players, self.engine.max_players
                ),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },

    #[error("Invalid engine configuration: {0}")]
    Engine(#[from] TournamentError),
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SimConfig {
        SimConfig {
            tournaments: 2,
            players: 8,
            format: TournamentFormat::DoubleElimination,
            moves_per_match: 20,
            json: false,
            engine: EngineConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_unknown_format_rejected() {
        let err = SimConfig::from_env(None, None, Some("swiss".to_string()), None, false)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "SIM_FORMAT"));
    }

    #[test]
    fn test_overrides_win() {
        let config = SimConfig::from_env(
            Some(3),
            Some(16),
            Some("round-robin".to_string()),
            Some(12),
            true,
        )
        .unwrap();
        assert_eq!(config.tournaments, 3);
        assert_eq!(config.players, 16);
        assert_eq!(config.format, TournamentFormat::RoundRobin);
        assert_eq!(config.moves_per_match, 12);
        assert!(config.json);
    }

    #[test]
    fn test_roster_outside_engine_bounds() {
        let mut config = config();
        config.players = 2;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "SIM_PLAYERS"));
    }

    #[test]
    fn test_moves_beyond_score_cap() {
        let mut config = config();
        config.moves_per_match = 5_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_moves_beyond_engine_move_cap() {
        let mut config = config();
        config.engine.max_moves_per_match = 10;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "SIM_MOVES"));
    }

    #[test]
    fn test_invalid_engine_config() {
        let mut config = config();
        config.engine.mailbox_capacity = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Engine(_))));
    }
}
