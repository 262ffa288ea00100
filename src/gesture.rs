//! Gesture vocabulary shared by every component.
//!
//! Two families of types live here:
//!
//! * the **wire** types delivered by the gesture daemon ([`GestureType`],
//!   [`GestureDirection`], [`DeviceType`], [`GestureAttrs`] and the tagged
//!   [`GestureEvent`]), which include the `Unsupported` / `Unknown` values
//!   the daemon may send, and
//! * the **canonical** [`GestureKey`] used to index the binding table, which
//!   can only describe gestures that may actually be bound.
//!
//! Wire enums accept either their name (case-insensitive, e.g. `"swipe"`,
//! `"Touchpad"`) or the numeric value the gesture daemon uses for them.

use serde::de::{Error as DeError, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

//  Wire types

/// Gesture type as reported by the gesture daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GestureType {
    Unsupported,
    Swipe,
    Pinch,
    Tap,
}

/// Gesture direction as reported by the gesture daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GestureDirection {
    Unknown,
    Up,
    Down,
    Left,
    Right,
    In,
    Out,
}

/// Kind of input device a gesture originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum DeviceType {
    #[default]
    Unknown,
    Touchpad,
    Touchscreen,
}

/// Enums that travel over the wire as a name or as the daemon's ordinal.
trait WireEnum: Sized + Copy + 'static {
    const EXPECTING: &'static str;
    const VARIANTS: &'static [(&'static str, Self)];

    fn from_index(index: u64) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::VARIANTS.get(i))
            .map(|(_, v)| *v)
    }

    fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::VARIANTS
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| *v)
    }
}

impl WireEnum for GestureType {
    const EXPECTING: &'static str = "gesture type (unsupported, swipe, pinch, tap)";
    const VARIANTS: &'static [(&'static str, Self)] = &[
        ("unsupported", GestureType::Unsupported),
        ("swipe", GestureType::Swipe),
        ("pinch", GestureType::Pinch),
        ("tap", GestureType::Tap),
    ];
}

impl WireEnum for GestureDirection {
    const EXPECTING: &'static str = "gesture direction (unknown, up, down, left, right, in, out)";
    const VARIANTS: &'static [(&'static str, Self)] = &[
        ("unknown", GestureDirection::Unknown),
        ("up", GestureDirection::Up),
        ("down", GestureDirection::Down),
        ("left", GestureDirection::Left),
        ("right", GestureDirection::Right),
        ("in", GestureDirection::In),
        ("out", GestureDirection::Out),
    ];
}

impl WireEnum for DeviceType {
    const EXPECTING: &'static str = "device type (unknown, touchpad, touchscreen)";
    const VARIANTS: &'static [(&'static str, Self)] = &[
        ("unknown", DeviceType::Unknown),
        ("touchpad", DeviceType::Touchpad),
        ("touchscreen", DeviceType::Touchscreen),
    ];
}

struct WireEnumVisitor<T>(PhantomData<T>);

impl<'de, T: WireEnum> Visitor<'de> for WireEnumVisitor<T> {
    type Value = T;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} as a name or an integer", T::EXPECTING)
    }

    fn visit_u64<E>(self, n: u64) -> Result<T, E>
    where
        E: DeError,
    {
        T::from_index(n).ok_or_else(|| DeError::custom(format!("out of range: {}", n)))
    }

    fn visit_i64<E>(self, n: i64) -> Result<T, E>
    where
        E: DeError,
    {
        u64::try_from(n)
            .ok()
            .and_then(T::from_index)
            .ok_or_else(|| DeError::custom(format!("out of range: {}", n)))
    }

    fn visit_str<E>(self, s: &str) -> Result<T, E>
    where
        E: DeError,
    {
        T::from_name(s).ok_or_else(|| DeError::custom(format!("unknown value: {:?}", s)))
    }
}

macro_rules! deserialize_wire_enum {
    ($($ty:ty),*) => {
        $(
            impl<'de> Deserialize<'de> for $ty {
                fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
                where
                    D: Deserializer<'de>,
                {
                    deserializer.deserialize_any(WireEnumVisitor::<$ty>(PhantomData))
                }
            }
        )*
    };
}

deserialize_wire_enum!(GestureType, GestureDirection, DeviceType);

impl fmt::Display for GestureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GestureType::Unsupported => write!(f, "unsupported"),
            GestureType::Swipe => write!(f, "swipe"),
            GestureType::Pinch => write!(f, "pinch"),
            GestureType::Tap => write!(f, "tap"),
        }
    }
}

impl fmt::Display for GestureDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GestureDirection::Unknown => write!(f, "unknown"),
            GestureDirection::Up => write!(f, "up"),
            GestureDirection::Down => write!(f, "down"),
            GestureDirection::Left => write!(f, "left"),
            GestureDirection::Right => write!(f, "right"),
            GestureDirection::In => write!(f, "in"),
            GestureDirection::Out => write!(f, "out"),
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceType::Unknown => write!(f, "unknown"),
            DeviceType::Touchpad => write!(f, "touchpad"),
            DeviceType::Touchscreen => write!(f, "touchscreen"),
        }
    }
}

/// Attributes carried by every begin / update / end event.
///
/// `percentage` is device dependent.  It is expected to be in `0..=100` but
/// the daemon does not guarantee it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureAttrs {
    #[serde(rename = "type")]
    pub kind: GestureType,
    pub direction: GestureDirection,
    #[serde(default)]
    pub percentage: f64,
    pub fingers: u32,
    #[serde(default)]
    pub device: DeviceType,
    /// Event timestamp in milliseconds, as reported by the daemon.
    #[serde(default)]
    pub time: u64,
}

impl GestureAttrs {
    /// Canonical key for these attributes, if they describe a bindable
    /// gesture.
    pub fn key(&self) -> Option<GestureKey> {
        GestureKey::from_event(self.kind, self.direction, self.fingers)
    }
}

/// One event from the gesture daemon.
///
/// On the wire this is a single-key JSON object:
///
/// ```json
/// {"Begin":{"type":"Swipe","direction":"Left","percentage":0.0,"fingers":3,"device":"Touchpad","time":10}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GestureEvent {
    Begin(GestureAttrs),
    Update(GestureAttrs),
    End(GestureAttrs),
}

impl GestureEvent {
    pub fn attrs(&self) -> &GestureAttrs {
        match self {
            GestureEvent::Begin(a) | GestureEvent::Update(a) | GestureEvent::End(a) => a,
        }
    }
}

//  Canonical gesture keys

/// Gesture kinds that can carry a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GestureKind {
    Tap,
    Swipe,
    Pinch,
}

impl fmt::Display for GestureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GestureKind::Tap => write!(f, "tap"),
            GestureKind::Swipe => write!(f, "swipe"),
            GestureKind::Pinch => write!(f, "pinch"),
        }
    }
}

/// Directions that can appear in a binding key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    In,
    Out,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
            Direction::Left => write!(f, "left"),
            Direction::Right => write!(f, "right"),
            Direction::In => write!(f, "in"),
            Direction::Out => write!(f, "out"),
        }
    }
}

impl Direction {
    fn from_wire(direction: GestureDirection) -> Option<Self> {
        match direction {
            GestureDirection::Unknown => None,
            GestureDirection::Up => Some(Direction::Up),
            GestureDirection::Down => Some(Direction::Down),
            GestureDirection::Left => Some(Direction::Left),
            GestureDirection::Right => Some(Direction::Right),
            GestureDirection::In => Some(Direction::In),
            GestureDirection::Out => Some(Direction::Out),
        }
    }
}

/// Canonical identity of a bindable gesture: kind, direction, finger count.
///
/// Its string form is `tap-<fingers>` or `<kind>-<direction>-<fingers>`,
/// e.g. `tap-2`, `swipe-left-3`, `pinch-in-4`.  [`Display`](fmt::Display)
/// and [`FromStr`] are exact inverses for every valid key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GestureKey {
    kind: GestureKind,
    direction: Option<Direction>,
    fingers: u32,
}

impl GestureKey {
    pub fn tap(fingers: u32) -> Self {
        Self {
            kind: GestureKind::Tap,
            direction: None,
            fingers,
        }
    }

    pub fn swipe(direction: Direction, fingers: u32) -> Self {
        Self {
            kind: GestureKind::Swipe,
            direction: Some(direction),
            fingers,
        }
    }

    pub fn pinch(direction: Direction, fingers: u32) -> Self {
        Self {
            kind: GestureKind::Pinch,
            direction: Some(direction),
            fingers,
        }
    }

    /// Derive the key for a daemon event.
    ///
    /// Returns `None` for unsupported gesture types, for swipes and pinches
    /// with an unknown direction, and for a finger count of zero.  Taps
    /// ignore the reported direction.
    pub fn from_event(kind: GestureType, direction: GestureDirection, fingers: u32) -> Option<Self> {
        if fingers == 0 {
            return None;
        }
        match kind {
            GestureType::Tap => Some(Self::tap(fingers)),
            GestureType::Swipe => Direction::from_wire(direction).map(|d| Self::swipe(d, fingers)),
            GestureType::Pinch => Direction::from_wire(direction).map(|d| Self::pinch(d, fingers)),
            GestureType::Unsupported => None,
        }
    }

    pub fn kind(&self) -> GestureKind {
        self.kind
    }

    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    pub fn fingers(&self) -> u32 {
        self.fingers
    }
}

impl fmt::Display for GestureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Some(dir) => write!(f, "{}-{}-{}", self.kind, dir, self.fingers),
            None => write!(f, "{}-{}", self.kind, self.fingers),
        }
    }
}

/// Reasons a binding key string is not a valid [`GestureKey`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyParseError {
    #[error("expected 2 or 3 dash-separated fields, got {0}")]
    FieldCount(usize),
    #[error("unknown gesture kind {0:?}")]
    Kind(String),
    #[error("unknown direction {0:?}")]
    Direction(String),
    #[error("{0} gestures need a direction")]
    MissingDirection(GestureKind),
    #[error("tap gestures take no direction")]
    UnexpectedDirection,
    #[error("finger count must be a positive integer, got {0:?}")]
    Fingers(String),
}

fn parse_kind(s: &str) -> Result<GestureKind, KeyParseError> {
    match s {
        "tap" => Ok(GestureKind::Tap),
        "swipe" => Ok(GestureKind::Swipe),
        "pinch" => Ok(GestureKind::Pinch),
        _ => Err(KeyParseError::Kind(s.to_string())),
    }
}

fn parse_key_direction(s: &str) -> Result<Direction, KeyParseError> {
    match s {
        "up" => Ok(Direction::Up),
        "down" => Ok(Direction::Down),
        "left" => Ok(Direction::Left),
        "right" => Ok(Direction::Right),
        "in" => Ok(Direction::In),
        "out" => Ok(Direction::Out),
        _ => Err(KeyParseError::Direction(s.to_string())),
    }
}

fn parse_fingers(s: &str) -> Result<u32, KeyParseError> {
    // Only plain decimal digits, so "+3" or "03" cannot break the round trip.
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) || (s.len() > 1 && s.starts_with('0')) {
        return Err(KeyParseError::Fingers(s.to_string()));
    }
    match s.parse::<u32>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(KeyParseError::Fingers(s.to_string())),
    }
}

impl FromStr for GestureKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('-').collect();
        match parts.as_slice() {
            [kind, fingers] => {
                let kind = parse_kind(kind)?;
                if kind != GestureKind::Tap {
                    return Err(KeyParseError::MissingDirection(kind));
                }
                Ok(Self::tap(parse_fingers(fingers)?))
            }
            [kind, direction, fingers] => {
                let kind = parse_kind(kind)?;
                if kind == GestureKind::Tap {
                    return Err(KeyParseError::UnexpectedDirection);
                }
                Ok(Self {
                    kind,
                    direction: Some(parse_key_direction(direction)?),
                    fingers: parse_fingers(fingers)?,
                })
            }
            _ => Err(KeyParseError::FieldCount(parts.len())),
        }
    }
}
