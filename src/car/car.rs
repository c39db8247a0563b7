/***************************************/
/*        3rd party libraries          */
/***************************************/
use log::{debug, warn};
use rand::Rng;
use serde::Serialize;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, Builder, JoinHandle};
use std::time::Duration;
use uuid::Uuid;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::config::CarConfig;
use crate::shared::logger::print;
use crate::shared::structs::{has_floor_beyond, validate_destination, validate_floor};
use crate::shared::{
    random_destination, CarId, DestinationRecord, Direction, FloorError, PickupRecord,
    RequestRecord, StopAction, HOME_FLOOR,
};

/***************************************/
/*       Public data structures        */
/***************************************/

/// Outcome of a single `Car::advance` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Moved(u8),
    Stopped(u8),
}

/**
 * Physical and logical state of one car.
 *
 * A passenger is waiting while their pickup record exists and is aboard once
 * only the destination record with the same id is left.
 *
 * # Fields
 * - `floor`:           Floor the car is currently on (1-based).
 * - `direction`:       Direction of travel, kept while stopped or idle.
 * - `moving`:          True from assignment until the run loop has gone idle.
 * - `pickups`:         Waiting passengers, in assignment order.
 * - `destinations`:    Drop-off floors, in assignment order.
 */
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CarState {
    pub floor: u8,
    pub direction: Direction,
    pub moving: bool,
    pub pickups: Vec<PickupRecord>,
    pub destinations: Vec<DestinationRecord>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CarStatus {
    pub id: CarId,
    #[serde(flatten)]
    pub state: CarState,
}

pub struct Car {
    id: CarId,
    n_floors: u8,
    floor_travel_time: Duration,
    transition_time: Duration,
    state: Mutex<CarState>,
}

/***************************************/
/*             Public API              */
/***************************************/
impl Car {
    pub fn new(id: CarId, n_floors: u8, config: &CarConfig) -> Car {
        print(
            &format!("OnStart: {} is on floor {}", id, HOME_FLOOR),
            Some(id.colour()),
        );

        Car {
            id,
            n_floors,
            floor_travel_time: Duration::from_millis(config.floor_travel_time_ms),
            transition_time: Duration::from_millis(config.passenger_transition_time_ms),
            state: Mutex::new(CarState::new()),
        }
    }

    pub fn id(&self) -> CarId {
        self.id
    }

    pub fn status(&self) -> CarStatus {
        CarStatus {
            id: self.id,
            state: self.state().clone(),
        }
    }

    pub fn is_moving(&self) -> bool {
        self.state().moving
    }

    pub fn has_work(&self) -> bool {
        self.state().has_work()
    }

    #[cfg(test)]
    pub fn set_floor(&self, floor: u8) -> Result<(), FloorError> {
        let floor = validate_floor(floor as i16, self.n_floors)?;
        self.state().floor = floor;
        Ok(())
    }

    #[cfg(test)]
    pub fn add_pickup(&self, id: Uuid, floor: u8, direction: Direction) -> Result<(), FloorError> {
        self.validate_pickup(floor, direction)?;
        self.state().pickups.push(RequestRecord::new(id, floor, direction));
        Ok(())
    }

    #[cfg(test)]
    pub fn add_destination(
        &self,
        id: Uuid,
        floor: u8,
        direction: Direction,
    ) -> Result<(), FloorError> {
        validate_floor(floor as i16, self.n_floors)?;
        self.state().destinations.push(RequestRecord::new(id, floor, direction));
        Ok(())
    }

    /**
     * Records a passenger's pickup and destination in one step.
     *
     * Returns true if the car was idle, in which case it is now marked moving
     * and the caller must start its run loop with `Car::start`.
     */
    pub fn assign(
        &self,
        id: Uuid,
        pickup: u8,
        destination: u8,
        direction: Direction,
    ) -> Result<bool, FloorError> {
        self.validate_pickup(pickup, direction)?;
        validate_destination(pickup, destination, direction, self.n_floors)?;

        let mut state = self.state();
        let was_idle = !state.moving;
        state.pickups.push(RequestRecord::new(id, pickup, direction));
        state.destinations.push(RequestRecord::new(id, destination, direction));
        state.moving = true;
        Ok(was_idle)
    }

    /**
     * Moves one floor in the current direction, unless the current floor has
     * a pickup or boarded destination heading that way, in which case the car
     * stops here instead.
     */
    pub fn advance(&self) -> Result<Motion, FloorError> {
        let (floor, direction, stops) = {
            let state = self.state();
            (state.floor, state.direction, state.pending_stops())
        };

        if !stops.is_empty() {
            for action in stops {
                self.stop(action);
            }
            return Ok(Motion::Stopped(floor));
        }

        let next = validate_floor(floor as i16 + direction.step(), self.n_floors)?;
        self.state().moving = true;
        print(
            &format!("{} is on floor {} (moving {})", self.id, floor, direction),
            Some(self.id.colour()),
        );
        thread::sleep(self.floor_travel_time);
        self.state().floor = next;
        Ok(Motion::Moved(next))
    }

    pub fn stop(&self, action: StopAction) {
        self.announce(action);
        thread::sleep(self.transition_time);

        let mut state = self.state();
        match action {
            StopAction::Loading => {
                let boarded = state.load(&mut rand::thread_rng(), self.n_floors);
                drop(state);
                for (floor, destination) in boarded {
                    print(
                        &format!(
                            "Entered passengers on floor {} selected floor {} as their destination.",
                            floor, destination
                        ),
                        None,
                    );
                }
            }
            StopAction::Unloading => {
                let floor = state.floor;
                let unloaded = state.unload();
                drop(state);
                debug!("{} unloaded {} passenger(s) on floor {}", self.id, unloaded, floor);
            }
            StopAction::Idle => state.clear(),
        }
    }

    /**
     * Serves pickups and destinations SCAN-style until none are left, then
     * returns to the home floor and goes idle.
     *
     * Work assigned while the car is heading home is picked up again instead
     * of being cleared by the idle stop.
     */
    pub fn run(&self) {
        debug!("{} run loop started", self.id);
        loop {
            let next = {
                let mut state = self.state();
                let next = state.next_direction();
                if let Some(direction) = next {
                    state.direction = direction;
                    state.moving = true;
                }
                next
            };

            match next {
                Some(_) => {
                    if let Err(e) = self.advance() {
                        warn!("{} could not advance: {}", self.id, e);
                    }
                }
                None => {
                    if self.return_home() {
                        break;
                    }
                }
            }
        }
        debug!("{} run loop finished", self.id);
    }

    /// Spawns the run loop on its own thread.
    pub fn start(self: &Arc<Self>) -> io::Result<JoinHandle<()>> {
        let car = Arc::clone(self);
        Builder::new()
            .name(format!("car_{}", self.id.number()))
            .spawn(move || car.run())
    }

    /// Marks the car idle again without touching its records, for when no run loop could be started.
    pub fn abandon_run(&self) {
        self.state().moving = false;
    }

    fn return_home(&self) -> bool {
        loop {
            {
                let mut state = self.state();
                if state.next_direction().is_some() {
                    return false;
                }
                if state.floor <= HOME_FLOOR {
                    break;
                }
                state.direction = Direction::Down;
            }
            if let Err(e) = self.advance() {
                warn!("{} could not return home: {}", self.id, e);
                break;
            }
        }

        self.announce(StopAction::Idle);
        thread::sleep(self.transition_time);

        // Checked under the same lock as the clear, so a late assignment is never dropped
        let mut state = self.state();
        if state.next_direction().is_some() {
            return false;
        }
        state.clear();
        true
    }

    fn announce(&self, action: StopAction) {
        let floor = self.state().floor;
        print(
            &format!("{} is on floor {} (stopped). {}", self.id, floor, action),
            Some(self.id.colour()),
        );
    }

    fn validate_pickup(&self, floor: u8, direction: Direction) -> Result<(), FloorError> {
        validate_floor(floor as i16, self.n_floors)?;
        if !has_floor_beyond(floor, direction, self.n_floors) {
            return Err(FloorError::NoFloorBeyond { floor, direction });
        }
        Ok(())
    }

    fn state(&self) -> MutexGuard<'_, CarState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CarState {
    pub fn new() -> CarState {
        CarState {
            floor: HOME_FLOOR,
            direction: Direction::Up,
            moving: false,
            pickups: Vec::new(),
            destinations: Vec::new(),
        }
    }

    pub fn has_work(&self) -> bool {
        !self.pickups.is_empty() || !self.destinations.is_empty()
    }

    /// A passenger is aboard once no pickup with their id is outstanding.
    pub fn is_boarded(&self, id: Uuid) -> bool {
        !self.pickups.iter().any(|pickup| pickup.id == id)
    }

    /// Stop actions due on the current floor for the current direction, loading first.
    pub fn pending_stops(&self) -> Vec<StopAction> {
        let mut stops = Vec::new();
        if self.has_pickup_here(self.direction) {
            stops.push(StopAction::Loading);
        }
        if self.has_destination_here(self.direction) {
            stops.push(StopAction::Unloading);
        }
        stops
    }

    /**
     * SCAN direction choice: keep going while there is something to serve here
     * or ahead, otherwise turn around if there is work the other way.
     *
     * Destinations of passengers still waiting to board are not targets yet.
     */
    pub fn next_direction(&self) -> Option<Direction> {
        let current = self.direction;
        [current, current.opposite()]
            .into_iter()
            .find(|&direction| {
                self.has_pickup_here(direction)
                    || self.has_destination_here(direction)
                    || self.has_target_ahead(direction)
            })
    }

    fn has_pickup_here(&self, direction: Direction) -> bool {
        self.pickups
            .iter()
            .any(|pickup| pickup.floor == self.floor && pickup.direction == direction)
    }

    fn has_destination_here(&self, direction: Direction) -> bool {
        self.destinations.iter().any(|destination| {
            destination.floor == self.floor
                && destination.direction == direction
                && self.is_boarded(destination.id)
        })
    }

    fn has_target_ahead(&self, direction: Direction) -> bool {
        self.pickups
            .iter()
            .any(|pickup| direction.is_ahead(self.floor, pickup.floor))
            || self.destinations.iter().any(|destination| {
                direction.is_ahead(self.floor, destination.floor)
                    && self.is_boarded(destination.id)
            })
    }

    /**
     * Boards every pickup on the current floor in assignment order.
     *
     * Passengers whose destination was not fixed at dispatch choose one now.
     * Returns `(pickup floor, destination floor)` per boarded passenger.
     */
    pub fn load<R: Rng + ?Sized>(&mut self, rng: &mut R, n_floors: u8) -> Vec<(u8, u8)> {
        let floor = self.floor;
        let (mut boarding, waiting): (Vec<PickupRecord>, Vec<PickupRecord>) = self
            .pickups
            .drain(..)
            .partition(|pickup| pickup.floor == floor);
        self.pickups = waiting;
        boarding.sort_by_key(|pickup| pickup.assigned_at);

        let mut boarded = Vec::new();
        for pickup in boarding {
            let fixed = self
                .destinations
                .iter()
                .find(|destination| destination.id == pickup.id)
                .map(|destination| destination.floor);

            let destination = match fixed {
                Some(destination) => destination,
                None => match random_destination(rng, pickup.floor, pickup.direction, n_floors) {
                    Some(destination) => {
                        self.destinations.push(RequestRecord::new(
                            pickup.id,
                            destination,
                            pickup.direction,
                        ));
                        destination
                    }
                    None => {
                        let reason = FloorError::NoFloorBeyond {
                            floor: pickup.floor,
                            direction: pickup.direction,
                        };
                        warn!("Passenger {} cannot travel: {}", pickup.id, reason);
                        continue;
                    }
                },
            };
            boarded.push((pickup.floor, destination));
        }
        boarded
    }

    /// Drops off boarded passengers on the current floor. Returns how many left the car.
    pub fn unload(&mut self) -> usize {
        let floor = self.floor;
        let before = self.destinations.len();
        let pickups = &self.pickups;
        self.destinations.retain(|destination| {
            destination.floor != floor || pickups.iter().any(|pickup| pickup.id == destination.id)
        });
        before - self.destinations.len()
    }

    pub fn clear(&mut self) {
        self.pickups.clear();
        self.destinations.clear();
        self.moving = false;
    }
}

impl Default for CarState {
    fn default() -> Self {
        CarState::new()
    }
}
