use serde::{Deserialize, Serialize};

/// Discrete estimate of ambient lighting derived from one preview frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightingCondition {
    Normal,
    LowLight,
    Backlit,
}

impl LightingCondition {
    /// Whether the UI should suggest turning the flash on.
    pub fn suggests_flash(&self) -> bool {
        matches!(self, Self::LowLight | Self::Backlit)
    }
}
