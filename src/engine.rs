use crate::error::{Result, ValidationFailure};
use crate::occupancy::OccupancyState;
use crate::types::{Direction, KeyId, RoomId};
use std::fmt;

/// Checkpoint request as received from a caller, before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessRequest {
    /// Requested room.
    pub room: i64,
    /// Entering or leaving.
    pub direction: Direction,
    /// Presented key.
    pub key: i64,
}

impl AccessRequest {
    /// Creates a request.
    pub fn new(room: i64, direction: Direction, key: i64) -> Self {
        Self {
            room,
            direction,
            key,
        }
    }
}

impl fmt::Display for AccessRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of key {} at room {}", self.direction, self.key, self.room)
    }
}

/// Access decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The door may open.
    Allow,
    /// The door stays closed.
    Deny,
}

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// An input rule failed; the state was never inspected.
    Invalid(ValidationFailure),
    /// Entrance while the key is already inside `room` (possibly the same one).
    AlreadyInside { room: RoomId },
    /// Exit from a room other than the one the key is inside.
    InOtherRoom { room: RoomId },
    /// Exit while the key is not inside any room.
    NotInside,
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(failure) => write!(f, "invalid request: {failure}"),
            Self::AlreadyInside { room } => write!(f, "key is already inside room {room}"),
            Self::InOtherRoom { room } => write!(f, "key is inside another room {room}"),
            Self::NotInside => f.write_str("key is not inside any room"),
        }
    }
}

/// Outcome of evaluating a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Allowed; carries the state after the single key movement.
    Allow(OccupancyState),
    /// Denied; the state is left as it was.
    Deny(Denial),
}

/// Verdict plus the room the key was found in, for tracing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// Room the key was inside before the request, if validation passed and it was inside one.
    pub current_room: Option<RoomId>,
    /// The verdict.
    pub verdict: Verdict,
}

impl Evaluation {
    fn deny(current_room: Option<RoomId>, denial: Denial) -> Self {
        Self {
            current_room,
            verdict: Verdict::Deny(denial),
        }
    }

    /// Returns the bare decision.
    pub fn decision(&self) -> Decision {
        match self.verdict {
            Verdict::Allow(_) => Decision::Allow,
            Verdict::Deny(_) => Decision::Deny,
        }
    }
}

/// Applies the input rules in order: room range, key range, divisibility.
pub fn validate(request: &AccessRequest) -> std::result::Result<(RoomId, KeyId), ValidationFailure> {
    let room = RoomId::new(request.room)?;
    let key = KeyId::new(request.key)?;
    if !key.fits(room) {
        return Err(ValidationFailure::NotDivisible { room, key });
    }
    Ok((room, key))
}

/// Decides `request` against `state` without touching any storage.
///
/// Errors only when `state` itself breaks an occupancy invariant.
pub fn evaluate(state: &OccupancyState, request: &AccessRequest) -> Result<Evaluation> {
    let (room, key) = match validate(request) {
        Ok(ids) => ids,
        Err(failure) => return Ok(Evaluation::deny(None, Denial::Invalid(failure))),
    };

    let current_room = state.room_of(key);
    let mut next = match (current_room, request.direction) {
        (Some(current), Direction::Entrance) => {
            return Ok(Evaluation::deny(
                current_room,
                Denial::AlreadyInside { room: current },
            ));
        }
        (Some(current), Direction::Exit) if current != room => {
            return Ok(Evaluation::deny(
                current_room,
                Denial::InOtherRoom { room: current },
            ));
        }
        (None, Direction::Exit) => {
            return Ok(Evaluation::deny(None, Denial::NotInside));
        }
        _ => state.clone(),
    };

    if request.direction.is_entrance() {
        next.enter(room, key)?;
    } else {
        next.leave(room, key)?;
    }

    Ok(Evaluation {
        current_room,
        verdict: Verdict::Allow(next),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(id: i64) -> RoomId {
        RoomId::new(id).unwrap()
    }

    fn key(id: i64) -> KeyId {
        KeyId::new(id).unwrap()
    }

    fn state_with(entries: &[(i64, i64)]) -> OccupancyState {
        let mut state = OccupancyState::new();
        for (r, k) in entries {
            state.enter(room(*r), key(*k)).unwrap();
        }
        state
    }

    fn request(r: i64, direction: Direction, k: i64) -> AccessRequest {
        AccessRequest::new(r, direction, k)
    }

    #[test]
    fn entrance_should_allow_when_key_outside() {
        let state = OccupancyState::new();
        let evaluation = evaluate(&state, &request(2, Direction::Entrance, 4)).unwrap();

        assert_eq!(evaluation.decision(), Decision::Allow);
        assert_eq!(evaluation.current_room, None);
        assert_eq!(evaluation.verdict, Verdict::Allow(state_with(&[(2, 4)])));
    }

    #[test]
    fn entrance_should_deny_when_inside_other_room() {
        let state = state_with(&[(2, 4)]);
        let evaluation = evaluate(&state, &request(4, Direction::Entrance, 4)).unwrap();

        assert_eq!(evaluation.current_room, Some(room(2)));
        assert_eq!(
            evaluation.verdict,
            Verdict::Deny(Denial::AlreadyInside { room: room(2) })
        );
    }

    #[test]
    fn entrance_should_deny_when_inside_same_room() {
        let state = state_with(&[(2, 4)]);
        let evaluation = evaluate(&state, &request(2, Direction::Entrance, 4)).unwrap();

        assert_eq!(
            evaluation.verdict,
            Verdict::Deny(Denial::AlreadyInside { room: room(2) })
        );
    }

    #[test]
    fn exit_should_allow_from_current_room() {
        let state = state_with(&[(2, 4), (3, 9)]);
        let evaluation = evaluate(&state, &request(2, Direction::Exit, 4)).unwrap();

        assert_eq!(evaluation.current_room, Some(room(2)));
        assert_eq!(evaluation.verdict, Verdict::Allow(state_with(&[(3, 9)])));
    }

    #[test]
    fn exit_should_deny_from_other_room() {
        let state = state_with(&[(2, 4)]);
        let evaluation = evaluate(&state, &request(4, Direction::Exit, 4)).unwrap();

        assert_eq!(
            evaluation.verdict,
            Verdict::Deny(Denial::InOtherRoom { room: room(2) })
        );
    }

    #[test]
    fn exit_should_deny_when_not_inside() {
        let state = state_with(&[(3, 9)]);
        let evaluation = evaluate(&state, &request(2, Direction::Exit, 4)).unwrap();

        assert_eq!(evaluation.current_room, None);
        assert_eq!(evaluation.verdict, Verdict::Deny(Denial::NotInside));
    }

    #[test]
    fn out_of_range_ids_should_deny_in_both_directions() {
        let state = state_with(&[(1, 7)]);
        for direction in [Direction::Entrance, Direction::Exit] {
            for (r, k) in [(0, 7), (6, 12), (-3, 6), (1, 0), (1, 10_001), (1, -7)] {
                let evaluation = evaluate(&state, &request(r, direction, k)).unwrap();
                assert!(
                    matches!(evaluation.verdict, Verdict::Deny(Denial::Invalid(_))),
                    "room {r} key {k} {direction}"
                );
                assert_eq!(evaluation.current_room, None);
            }
        }
    }

    #[test]
    fn room_rule_is_checked_before_key_rule() {
        let failure = validate(&request(9, Direction::Entrance, 0)).unwrap_err();
        assert_eq!(failure, ValidationFailure::RoomOutOfRange(9));
    }

    #[test]
    fn indivisible_key_should_deny_regardless_of_state() {
        // key 10 is inside room 5, but 10 % 3 != 0
        let state = state_with(&[(5, 10)]);
        for direction in [Direction::Entrance, Direction::Exit] {
            let evaluation = evaluate(&state, &request(3, direction, 10)).unwrap();
            assert_eq!(
                evaluation.verdict,
                Verdict::Deny(Denial::Invalid(ValidationFailure::NotDivisible {
                    room: room(3),
                    key: key(10),
                }))
            );
        }
    }

    #[test]
    fn allow_should_touch_only_the_requested_room() {
        let state = state_with(&[(1, 3), (5, 5), (2, 8)]);
        let evaluation = evaluate(&state, &request(2, Direction::Entrance, 2)).unwrap();

        let Verdict::Allow(next) = evaluation.verdict else {
            panic!("expected allow");
        };
        assert_eq!(next.len(), state.len() + 1);
        assert_eq!(next.occupants(room(1)).collect::<Vec<_>>(), vec![key(3)]);
        assert_eq!(next.occupants(room(5)).collect::<Vec<_>>(), vec![key(5)]);
        assert_eq!(
            next.occupants(room(2)).collect::<Vec<_>>(),
            vec![key(2), key(8)]
        );
    }

    #[test]
    fn denial_messages_name_the_room() {
        assert_eq!(
            Denial::AlreadyInside { room: room(2) }.to_string(),
            "key is already inside room 2"
        );
    }
}
