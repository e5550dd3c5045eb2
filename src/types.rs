use crate::error::ValidationFailure;
use std::fmt;

macro_rules! define_id_type {
    ($(#[$doc:meta])* $name:ident, $repr:ty, $min:expr, $max:expr, $err:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name($repr);

        impl $name {
            /// Smallest accepted identifier.
            pub const MIN: $repr = $min;
            /// Largest accepted identifier.
            pub const MAX: $repr = $max;

            /// Creates a validated identifier.
            pub fn new(value: i64) -> std::result::Result<Self, ValidationFailure> {
                if !(i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
                    return Err(ValidationFailure::$err(value));
                }
                <$repr>::try_from(value)
                    .map(Self)
                    .map_err(|_| ValidationFailure::$err(value))
            }

            /// Returns the raw identifier.
            pub fn get(self) -> $repr {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<i64> for $name {
            type Error = ValidationFailure;

            fn try_from(value: i64) -> std::result::Result<Self, ValidationFailure> {
                Self::new(value)
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                i64::from(value.0)
            }
        }
    };
}

define_id_type!(
    /// Room identifier, `1..=5`.
    RoomId,
    u8,
    1,
    5,
    RoomOutOfRange
);
define_id_type!(
    /// Key (credential) identifier, `1..=10000`.
    KeyId,
    u16,
    1,
    10_000,
    KeyOutOfRange
);

impl KeyId {
    /// Returns whether this key may use `room`: the room id must divide the key id.
    pub fn fits(self, room: RoomId) -> bool {
        self.0 % u16::from(room.0) == 0
    }
}

/// Requested movement through a checkpoint.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    /// Entering the room.
    Entrance,
    /// Leaving the room.
    Exit,
}

impl Direction {
    /// Returns `true` for [`Direction::Entrance`].
    pub fn is_entrance(self) -> bool {
        matches!(self, Self::Entrance)
    }
}

impl From<bool> for Direction {
    /// `true` means entrance, `false` means exit.
    fn from(entrance: bool) -> Self {
        if entrance { Self::Entrance } else { Self::Exit }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Entrance => "entrance",
            Self::Exit => "exit",
        })
    }
}
