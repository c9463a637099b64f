//! Camera constraints.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which camera to prefer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Rear camera, pointed at the shelf.
    #[default]
    Environment,
    /// Front camera.
    User,
}

impl fmt::Display for FacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Environment => write!(f, "environment"),
            Self::User => write!(f, "user"),
        }
    }
}

/// A frame size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Resolution {
    /// Creates a resolution.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Hints passed to a decode source when it starts.
///
/// Defaults match a phone held against a shelf: rear camera, 1280x720
/// preferred, nothing below 640x480, 30 fps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConstraints {
    /// Preferred camera.
    pub facing_mode: FacingMode,
    /// Preferred resolution.
    pub ideal: Resolution,
    /// Minimum acceptable resolution.
    pub min: Resolution,
    /// Preferred frame rate.
    pub frame_rate: u32,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            facing_mode: FacingMode::Environment,
            ideal: Resolution::new(1280, 720),
            min: Resolution::new(640, 480),
            frame_rate: 30,
        }
    }
}
