//! Entity state: the current value an entity reports on the state bus.

use serde::{Deserialize, Serialize};

/// Discrete value of an entity.
///
/// Binary sensors and toggles use [`On`](Self::On)/[`Off`](Self::Off);
/// cleaning devices report free-form values such as `cleaning` or `docked`,
/// kept as [`Other`](Self::Other).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityState {
    On,
    Off,
    #[default]
    Unknown,
    Unavailable,
    Other(String),
}

impl EntityState {
    /// Whether the entity is reachable (anything but [`Unavailable`](Self::Unavailable)).
    #[must_use]
    pub fn is_available(&self) -> bool {
        !matches!(self, Self::Unavailable)
    }

    /// Whether the value is a real reading rather than a placeholder.
    #[must_use]
    pub fn is_reporting(&self) -> bool {
        !matches!(self, Self::Unavailable | Self::Unknown)
    }

    #[must_use]
    pub fn is_on(&self) -> bool {
        matches!(self, Self::On)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::On => "on",
            Self::Off => "off",
            Self::Unknown => "unknown",
            Self::Unavailable => "unavailable",
            Self::Other(value) => value,
        }
    }
}

impl From<&str> for EntityState {
    fn from(value: &str) -> Self {
        match value {
            "on" => Self::On,
            "off" => Self::Off,
            "unknown" => Self::Unknown,
            "unavailable" => Self::Unavailable,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for EntityState {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<bool> for EntityState {
    fn from(value: bool) -> Self {
        if value { Self::On } else { Self::Off }
    }
}

impl From<EntityState> for String {
    fn from(value: EntityState) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for EntityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
