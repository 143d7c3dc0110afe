//! Power-ups that temporarily change the destroy strategy
//!
//! An armed booster installs its strategy as the destroy system's override.
//! The override lasts for exactly one accepted destroy, after which the
//! previous strategy is restored.

use serde::{Deserialize, Serialize};

use super::destroy::{DestroyStrategy, DestroySystem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoosterKind {
    /// Clears every occupied cell reachable inside a circle around the click
    Bomb,
}

#[derive(Debug, Clone)]
pub struct Boosters {
    bomb_radius: f32,
    bomb_price: u32,
    armed: Option<BoosterKind>,
}

impl Boosters {
    pub fn new(bomb_radius: f32, bomb_price: u32) -> Self {
        Self {
            bomb_radius,
            bomb_price,
            armed: None,
        }
    }

    /// Scores spent to arm a booster
    pub fn price(&self, kind: BoosterKind) -> u32 {
        match kind {
            BoosterKind::Bomb => self.bomb_price,
        }
    }

    pub fn strategy(&self, kind: BoosterKind) -> DestroyStrategy {
        match kind {
            BoosterKind::Bomb => DestroyStrategy::Circle {
                radius: self.bomb_radius,
            },
        }
    }

    pub fn armed(&self) -> Option<BoosterKind> {
        self.armed
    }

    /// Install the booster's strategy. Fails when a booster is already armed
    /// or the destroy system already carries an override.
    pub fn arm(&mut self, kind: BoosterKind, destroy: &mut DestroySystem) -> bool {
        if self.armed.is_some() {
            return false;
        }
        if !destroy.install_override(self.strategy(kind)) {
            return false;
        }
        self.armed = Some(kind);
        true
    }

    /// Called after an accepted destroy: disarm and restore the previous strategy
    pub fn consume(&mut self, destroy: &mut DestroySystem) -> Option<BoosterKind> {
        let kind = self.armed.take()?;
        destroy.restore();
        Some(kind)
    }
}
