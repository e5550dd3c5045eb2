//! Room occupancy state and its persisted record form.

use crate::error::{Error, Result};
use crate::types::{KeyId, RoomId};
use std::collections::{BTreeMap, BTreeSet};

/// Which keys are currently inside which rooms.
///
/// A key is inside at most one room. Rooms without occupants are never
/// stored, so two states compare equal exactly when every room holds the same
/// keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccupancyState {
    rooms: BTreeMap<RoomId, BTreeSet<KeyId>>,
}

impl OccupancyState {
    /// Creates an empty building.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the room `key` is currently inside, if any.
    pub fn room_of(&self, key: KeyId) -> Option<RoomId> {
        self.rooms
            .iter()
            .find(|(_, keys)| keys.contains(&key))
            .map(|(room, _)| *room)
    }

    /// Returns whether `key` is inside `room`.
    pub fn contains(&self, room: RoomId, key: KeyId) -> bool {
        self.rooms.get(&room).is_some_and(|keys| keys.contains(&key))
    }

    /// Iterates the occupants of `room` in ascending order.
    pub fn occupants(&self, room: RoomId) -> impl Iterator<Item = KeyId> + '_ {
        self.rooms.get(&room).into_iter().flatten().copied()
    }

    /// Iterates occupied rooms with their keys, ascending by room id.
    pub fn rooms(&self) -> impl Iterator<Item = (RoomId, &BTreeSet<KeyId>)> {
        self.rooms.iter().map(|(room, keys)| (*room, keys))
    }

    /// Total number of keys inside any room.
    pub fn len(&self) -> usize {
        self.rooms.values().map(BTreeSet::len).sum()
    }

    /// Returns whether no key is inside any room.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Records `key` entering `room`.
    ///
    /// Fails if the key is already inside some room.
    pub fn enter(&mut self, room: RoomId, key: KeyId) -> Result<()> {
        if let Some(current) = self.room_of(key) {
            return Err(Error::InvariantViolation(format!(
                "key {key} is already inside room {current}"
            )));
        }
        self.rooms.entry(room).or_default().insert(key);
        Ok(())
    }

    /// Records `key` leaving `room`.
    ///
    /// Fails if the key is not inside that room.
    pub fn leave(&mut self, room: RoomId, key: KeyId) -> Result<()> {
        let Some(keys) = self.rooms.get_mut(&room) else {
            return Err(Error::InvariantViolation(format!(
                "key {key} is not inside room {room}"
            )));
        };
        if !keys.remove(&key) {
            return Err(Error::InvariantViolation(format!(
                "key {key} is not inside room {room}"
            )));
        }
        if keys.is_empty() {
            self.rooms.remove(&room);
        }
        Ok(())
    }
}

#[cfg(feature = "serde")]
pub use records::{OccupantRecord, RoomRecord};

#[cfg(feature = "serde")]
mod records {
    use super::OccupancyState;
    use crate::error::{Error, Result};
    use crate::types::{KeyId, RoomId};
    use std::collections::BTreeSet;

    /// One room entry of the persisted document.
    #[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct RoomRecord {
        /// Room identifier.
        pub room_id: i64,
        /// Keys inside the room.
        #[serde(default)]
        pub users: Vec<OccupantRecord>,
    }

    /// One occupant of a persisted room entry.
    #[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct OccupantRecord {
        /// Key identifier.
        pub key_id: i64,
    }

    impl OccupancyState {
        /// Rebuilds a state from persisted records, checking every invariant.
        ///
        /// Empty room records are accepted and dropped.
        pub fn from_records(records: Vec<RoomRecord>) -> Result<Self> {
            let mut state = Self::new();
            let mut seen_rooms = BTreeSet::new();
            for record in records {
                let room = RoomId::new(record.room_id)
                    .map_err(|err| Error::InvariantViolation(err.to_string()))?;
                if !seen_rooms.insert(room) {
                    return Err(Error::InvariantViolation(format!(
                        "room {room} is recorded more than once"
                    )));
                }
                for user in record.users {
                    let key = KeyId::new(user.key_id)
                        .map_err(|err| Error::InvariantViolation(err.to_string()))?;
                    if state.contains(room, key) {
                        continue;
                    }
                    state.enter(room, key)?;
                }
            }
            Ok(state)
        }

        /// Converts the state into its persisted form, rooms and keys ascending.
        pub fn to_records(&self) -> Vec<RoomRecord> {
            self.rooms()
                .map(|(room, keys)| RoomRecord {
                    room_id: room.into(),
                    users: keys
                        .iter()
                        .map(|key| OccupantRecord {
                            key_id: (*key).into(),
                        })
                        .collect(),
                })
                .collect()
        }
    }
}
