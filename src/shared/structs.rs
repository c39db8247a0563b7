/***************************************/
/*        3rd party libraries          */
/***************************************/
use chrono::{DateTime, Local};
use rand::Rng;
use serde::Deserialize;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Floor every car starts on and returns to once its work is drained.
pub const HOME_FLOOR: u8 = 1;

/***************************************/
/*       Public data structures        */
/***************************************/
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    // Signed one-floor step in this direction
    pub fn step(self) -> i16 {
        match self {
            Direction::Up => 1,
            Direction::Down => -1,
        }
    }

    /// True if `to` lies strictly beyond `from` when travelling in this direction.
    pub fn is_ahead(self, from: u8, to: u8) -> bool {
        match self {
            Direction::Up => to > from,
            Direction::Down => to < from,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StopAction {
    Loading,
    Unloading,
    Idle,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CarId {
    One,
    Two,
    Three,
    Four,
}

impl CarId {
    pub const ALL: [CarId; 4] = [CarId::One, CarId::Two, CarId::Three, CarId::Four];

    /// The first `count` car identifiers, or `None` if the fleet cannot be that large.
    pub fn fleet(count: usize) -> Option<&'static [CarId]> {
        if count == 0 || count > CarId::ALL.len() {
            return None;
        }
        Some(&CarId::ALL[..count])
    }

    pub fn number(self) -> u8 {
        match self {
            CarId::One => 1,
            CarId::Two => 2,
            CarId::Three => 3,
            CarId::Four => 4,
        }
    }
}

/**
 * Rejected floor values.
 *
 * Every operation that takes a floor validates it before touching any state,
 * so an `Err` always means nothing was mutated.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FloorError {
    OutOfBounds { floor: i16, n_floors: u8 },
    NoFloorBeyond { floor: u8, direction: Direction },
    InvalidDestination { pickup: u8, destination: u8, direction: Direction },
}

impl fmt::Display for FloorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FloorError::OutOfBounds { floor, n_floors } => {
                write!(f, "floor {} is outside 1..={}", floor, n_floors)
            }
            FloorError::NoFloorBeyond { floor, direction } => {
                write!(f, "there is no floor {} floor {}", beyond(*direction), floor)
            }
            FloorError::InvalidDestination { pickup, destination, direction } => write!(
                f,
                "destination floor {} is not {} pickup floor {}",
                destination,
                beyond(*direction),
                pickup
            ),
        }
    }
}

impl std::error::Error for FloorError {}

fn beyond(direction: Direction) -> &'static str {
    match direction {
        Direction::Up => "above",
        Direction::Down => "below",
    }
}

/// An inbound pickup call as produced by the request generator.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    pickup_floor: u8,
    direction: Direction,
    destination_floor: Option<u8>,
}

impl Request {
    pub fn new(
        pickup_floor: u8,
        direction: Direction,
        destination_floor: Option<u8>,
        n_floors: u8,
    ) -> Result<Request, FloorError> {
        validate_floor(pickup_floor as i16, n_floors)?;
        if !has_floor_beyond(pickup_floor, direction, n_floors) {
            return Err(FloorError::NoFloorBeyond {
                floor: pickup_floor,
                direction,
            });
        }
        if let Some(destination) = destination_floor {
            validate_destination(pickup_floor, destination, direction, n_floors)?;
        }

        Ok(Request {
            pickup_floor,
            direction,
            destination_floor,
        })
    }

    pub fn pickup_floor(&self) -> u8 {
        self.pickup_floor
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn destination_floor(&self) -> Option<u8> {
        self.destination_floor
    }
}

/**
 * A pickup or destination entry owned by a car.
 *
 * The `id` is shared between a passenger's pickup record and destination
 * record, which is how a car knows whether the passenger has boarded yet.
 */
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RequestRecord {
    pub id: Uuid,
    pub floor: u8,
    pub direction: Direction,
    pub assigned_at: DateTime<Local>,
}

impl RequestRecord {
    pub fn new(id: Uuid, floor: u8, direction: Direction) -> RequestRecord {
        RequestRecord {
            id,
            floor,
            direction,
            assigned_at: Local::now(),
        }
    }
}

pub type PickupRecord = RequestRecord;
pub type DestinationRecord = RequestRecord;

/***************************************/
/*             Public API              */
/***************************************/
pub fn validate_floor(floor: i16, n_floors: u8) -> Result<u8, FloorError> {
    if floor < HOME_FLOOR as i16 || floor > n_floors as i16 {
        return Err(FloorError::OutOfBounds { floor, n_floors });
    }
    Ok(floor as u8)
}

pub fn validate_destination(
    pickup: u8,
    destination: u8,
    direction: Direction,
    n_floors: u8,
) -> Result<(), FloorError> {
    validate_floor(destination as i16, n_floors)?;
    if !direction.is_ahead(pickup, destination) {
        return Err(FloorError::InvalidDestination {
            pickup,
            destination,
            direction,
        });
    }
    Ok(())
}

pub fn has_floor_beyond(floor: u8, direction: Direction, n_floors: u8) -> bool {
    match direction {
        Direction::Up => floor < n_floors,
        Direction::Down => floor > HOME_FLOOR,
    }
}

/// Draws a destination uniformly from the floors strictly beyond `pickup` in `direction`.
pub fn random_destination<R: Rng + ?Sized>(
    rng: &mut R,
    pickup: u8,
    direction: Direction,
    n_floors: u8,
) -> Option<u8> {
    if !has_floor_beyond(pickup, direction, n_floors) {
        return None;
    }
    match direction {
        Direction::Up => Some(rng.gen_range(pickup + 1..=n_floors)),
        Direction::Down => Some(rng.gen_range(HOME_FLOOR..pickup)),
    }
}
