//! Game configuration
//!
//! Static, data-driven setup handed to a scene at construction. Loaded from
//! JSON; every field has a default so partial files work.

use serde::{Deserialize, Serialize};

use crate::error::{BlastError, Result};
use crate::sim::GridOptions;

/// One tile family: match key, texture name and reward per destroyed tile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileTypeConfig {
    pub family: String,
    pub image: String,
    pub scores: u32,
}

impl TileTypeConfig {
    pub fn new(family: &str, image: &str, scores: u32) -> Self {
        Self {
            family: family.to_string(),
            image: image.to_string(),
            scores,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    // === Grid ===
    pub cols: usize,
    pub rows: usize,
    /// Grid size in pixels
    pub width: f32,
    pub height: f32,
    /// Visible buffer above row 0 for spawned tiles
    pub top_padding: f32,

    // === Rules ===
    pub steps: i32,
    pub max_scores: u32,
    pub shuffles: u32,
    pub bomb_boosters: u32,
    /// Scores spent to arm one bomb
    pub bomb_price: u32,
    pub min_batch_size: usize,
    /// Bomb blast radius in pixels
    pub circle_damage_radius: f32,

    // === Animation ===
    /// Seconds a destroyed tile takes to vanish (0 = immediately)
    pub destroy_duration: f32,
    /// Upper bound of the random delay before a destroy animation starts
    pub destroy_max_delay: f32,
    /// Seconds a queued tile waits before falling
    pub fall_delay: f32,

    /// RNG seed for generation and shuffles
    pub seed: u64,

    pub tile_types: Vec<TileTypeConfig>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            cols: 10,
            rows: 10,
            width: 550.0,
            height: 550.0,
            top_padding: 7.0,

            steps: 25,
            max_scores: 100,
            shuffles: 5,
            bomb_boosters: 5,
            bomb_price: 5,
            min_batch_size: 2,
            circle_damage_radius: 110.0,

            destroy_duration: crate::consts::DESTROY_DURATION,
            destroy_max_delay: crate::consts::DESTROY_MAX_DELAY,
            fall_delay: crate::consts::FALL_START_DELAY,

            seed: 0,

            tile_types: vec![
                TileTypeConfig::new("red", "tile-red", 1),
                TileTypeConfig::new("green", "tile-green", 1),
                TileTypeConfig::new("blue", "tile-blue", 1),
                TileTypeConfig::new("pink", "tile-pink", 1),
                TileTypeConfig::new("yellow", "tile-yellow", 1),
            ],
        }
    }
}

impl GameConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Fail fast on settings no game can start with
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(BlastError::InvalidConfig(msg));

        if self.cols == 0 || self.rows == 0 {
            return invalid(format!("grid is {}x{}", self.cols, self.rows));
        }
        if !(self.width > 0.0 && self.height > 0.0) {
            return invalid(format!("grid size is {}x{}", self.width, self.height));
        }
        if self.tile_types.is_empty() {
            return invalid("no tile types".to_string());
        }
        if self.steps <= 0 {
            return invalid(format!("steps is {}, the game would be lost before it starts", self.steps));
        }
        if self.max_scores == 0 {
            return invalid("max_scores is 0, the game would be won before it starts".to_string());
        }
        if self.min_batch_size == 0 {
            return invalid("min_batch_size must be at least 1".to_string());
        }
        if !(self.circle_damage_radius > 0.0) {
            return invalid(format!("circle_damage_radius is {}", self.circle_damage_radius));
        }
        if self.destroy_duration < 0.0 || self.destroy_max_delay < 0.0 || self.fall_delay < 0.0 {
            return invalid("animation timings must not be negative".to_string());
        }
        Ok(())
    }

    pub fn grid_options(&self) -> GridOptions {
        GridOptions {
            cols: self.cols,
            rows: self.rows,
            width: self.width,
            height: self.height,
            top_padding: self.top_padding,
        }
    }

    /// Texture names referenced by the tile families
    pub fn texture_names(&self) -> impl Iterator<Item = &str> {
        self.tile_types.iter().map(|t| t.image.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCategory;

    #[test]
    fn test_defaults_are_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tile_types.len(), 5);
        assert_eq!(config.grid_options().cols, 10);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = GameConfig::from_json(r#"{ "cols": 4, "rows": 6, "steps": 3 }"#).unwrap();
        assert_eq!(config.cols, 4);
        assert_eq!(config.rows, 6);
        assert_eq!(config.steps, 3);
        assert_eq!(config.max_scores, 100);
    }

    #[test]
    fn test_json_round_trip() {
        let config = GameConfig {
            seed: 42,
            ..Default::default()
        };
        let parsed = GameConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_invalid_configs() {
        let err = GameConfig::from_json(r#"{ "tile_types": [] }"#).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Config);

        let err = GameConfig::from_json(r#"{ "rows": 0 }"#).unwrap_err();
        assert!(matches!(err, BlastError::InvalidConfig(_)));

        let err = GameConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, BlastError::ConfigParse(_)));
    }

    #[test]
    fn test_game_decided_at_setup_is_rejected() {
        for json in [r#"{ "steps": 0 }"#, r#"{ "steps": -3 }"#, r#"{ "max_scores": 0 }"#] {
            let err = GameConfig::from_json(json).unwrap_err();
            assert!(matches!(err, BlastError::InvalidConfig(_)), "{json}");
        }

        let config = GameConfig {
            steps: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(GameConfig::from_json(r#"{ "steps": 1, "max_scores": 1 }"#).is_ok());
    }
}
