use crate::{
    Result,
    constants::{
        POSITION_CLOSED, POSITION_CLOSING, POSITION_OPEN, POSITION_OPENING, POSITION_STOPPED,
        SWITCH_DOOR, SWITCH_LIGHT, SWITCH_LOCK,
    },
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Door position as tracked by the driver.
///
/// The physical door moves through adjacent states only: it cannot jump from
/// `Closed` to `Open` without passing through `Opening`. The controller's
/// position sensor is ground truth, so an out-of-adjacency report is still
/// accepted as a correction; [`can_transition_to`](DoorPosition::can_transition_to)
/// exists so the driver can log that anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorPosition {
    /// No report received yet.
    Unknown,

    /// Fully open.
    Open,

    /// Fully closed.
    Closed,

    /// Travelling toward open.
    Opening,

    /// Travelling toward closed.
    Closing,

    /// Halted between the endpoints (fault, obstruction, or user stop).
    Stopped,
}

impl DoorPosition {
    /// Decode a position report byte from the controller.
    ///
    /// # Errors
    /// Returns `Error::InvalidPayload` for a byte outside the known codes.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            POSITION_OPENING => Ok(DoorPosition::Opening),
            POSITION_CLOSING => Ok(DoorPosition::Closing),
            POSITION_STOPPED => Ok(DoorPosition::Stopped),
            POSITION_OPEN => Ok(DoorPosition::Open),
            POSITION_CLOSED => Ok(DoorPosition::Closed),
            _ => Err(Error::InvalidPayload {
                kind: "PositionReport",
                reason: format!("unknown position code 0x{code:02X}"),
            }),
        }
    }

    /// Wire code for this position, `None` for `Unknown` (never on the wire).
    #[must_use]
    pub fn as_code(&self) -> Option<u8> {
        match self {
            DoorPosition::Unknown => None,
            DoorPosition::Opening => Some(POSITION_OPENING),
            DoorPosition::Closing => Some(POSITION_CLOSING),
            DoorPosition::Stopped => Some(POSITION_STOPPED),
            DoorPosition::Open => Some(POSITION_OPEN),
            DoorPosition::Closed => Some(POSITION_CLOSED),
        }
    }

    /// Check whether moving to `target` respects physical adjacency.
    ///
    /// Valid flows: Closed→Opening→Open, Open→Closing→Closed, any→Stopped,
    /// Stopped→{Opening, Closing}. Transitions out of `Unknown` and
    /// self-transitions (repeated reports) are always allowed.
    ///
    /// # Examples
    ///
    /// ```
    /// use garagelink_core::DoorPosition;
    ///
    /// assert!(DoorPosition::Closed.can_transition_to(&DoorPosition::Opening));
    /// assert!(!DoorPosition::Closed.can_transition_to(&DoorPosition::Open));
    /// ```
    #[must_use]
    pub fn can_transition_to(&self, target: &DoorPosition) -> bool {
        if self == target || matches!(self, DoorPosition::Unknown) {
            return true;
        }
        matches!(
            (self, target),
            // Moving toward open
            (DoorPosition::Closed, DoorPosition::Opening)
            | (DoorPosition::Opening, DoorPosition::Open)
            // Moving toward closed
            | (DoorPosition::Open, DoorPosition::Closing)
            | (DoorPosition::Closing, DoorPosition::Closed)
            // Any motion can halt
            | (_, DoorPosition::Stopped)
            // Halted door resumes in either direction
            | (DoorPosition::Stopped, DoorPosition::Opening | DoorPosition::Closing)
        )
    }

    /// Whether the doorway counts as open for the eye sensor.
    ///
    /// Policy: `Open` and `Opening` are open — the beam path is unsealed as
    /// soon as the door leaves the closed position. `Stopped` is not
    /// considered open; the controller reports it distinctly and the sensor
    /// follows the last confirmed endpoint instead of guessing mid-travel.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, DoorPosition::Open | DoorPosition::Opening)
    }

    /// Whether the door is currently travelling.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        matches!(self, DoorPosition::Opening | DoorPosition::Closing)
    }
}

impl fmt::Display for DoorPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DoorPosition::Unknown => "unknown",
            DoorPosition::Open => "open",
            DoorPosition::Closed => "closed",
            DoorPosition::Opening => "opening",
            DoorPosition::Closing => "closing",
            DoorPosition::Stopped => "stopped",
        };
        write!(f, "{s}")
    }
}

/// The three independent switches the controller exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchKind {
    /// Door actuator (open/close).
    Door,
    /// Worklight.
    Light,
    /// Travel lock (remotes disabled while engaged).
    Lock,
}

impl SwitchKind {
    /// All switches, in wire-id order.
    pub const ALL: [SwitchKind; 3] = [SwitchKind::Door, SwitchKind::Light, SwitchKind::Lock];

    /// Decode a switch identifier byte.
    ///
    /// # Errors
    /// Returns `Error::InvalidPayload` for an unassigned identifier.
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            SWITCH_DOOR => Ok(SwitchKind::Door),
            SWITCH_LIGHT => Ok(SwitchKind::Light),
            SWITCH_LOCK => Ok(SwitchKind::Lock),
            _ => Err(Error::InvalidPayload {
                kind: "SetSwitch",
                reason: format!("unknown switch id 0x{byte:02X}"),
            }),
        }
    }

    /// Wire identifier for this switch.
    #[must_use]
    pub fn as_byte(&self) -> u8 {
        match self {
            SwitchKind::Door => SWITCH_DOOR,
            SwitchKind::Light => SWITCH_LIGHT,
            SwitchKind::Lock => SWITCH_LOCK,
        }
    }

    /// Dense index for per-switch state tables.
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            SwitchKind::Door => 0,
            SwitchKind::Light => 1,
            SwitchKind::Lock => 2,
        }
    }

    /// Platform entity backed by this switch.
    #[must_use]
    pub fn entity_id(&self) -> EntityId {
        match self {
            SwitchKind::Door => EntityId::Door,
            SwitchKind::Light => EntityId::Light,
            SwitchKind::Lock => EntityId::Lock,
        }
    }
}

impl fmt::Display for SwitchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SwitchKind::Door => "door",
            SwitchKind::Light => "light",
            SwitchKind::Lock => "lock",
        };
        write!(f, "{s}")
    }
}

/// Identifier for an entity registered with the platform.
///
/// Three switches plus the door-position binary sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityId {
    Door,
    Light,
    Lock,
    EyeSensor,
}

impl EntityId {
    /// Stable string id used when reporting to the platform registry.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityId::Door => "door",
            EntityId::Light => "light",
            EntityId::Lock => "lock",
            EntityId::EyeSensor => "eye_sensor",
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
