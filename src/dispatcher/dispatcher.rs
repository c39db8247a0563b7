/***************************************/
/*        3rd party libraries          */
/***************************************/
use anyhow::{anyhow, Result};
use crossbeam_channel as cbc;
use log::{debug, error, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::Builder;
use std::time::Duration;
use uuid::Uuid;

/***************************************/
/*           Local modules             */
/***************************************/
use super::{RequestGenerator, RequestQueue};
use crate::car::{Car, CarStatus};
use crate::config::Config;
use crate::shared::logger::print;
use crate::shared::{random_destination, CarId, Direction, Request};

/***************************************/
/*       Public data structures        */
/***************************************/

/// What a dispatch tick did with the request at the head of the queue.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub number: usize,
    pub id: Uuid,
    pub car: CarId,
    pub request: Request,
    pub destination: u8,
}

#[derive(Serialize, Debug, Clone)]
pub struct FleetSnapshot {
    pub generated: usize,
    pub assigned: usize,
    pub pending: Vec<Request>,
    pub cars: Vec<CarStatus>,
}

/**
 * Owns the fleet and matches queued requests to cars.
 *
 * Every car is created once in `Dispatcher::new` and lives as long as the
 * dispatcher. Two background threads drive it after `start`: the request
 * generator filling the queue, and the dispatch tick draining it one request
 * per tick.
 *
 * # Fields
 * - `cars`:                Fleet keyed by id; iteration order is the tie-break order.
 * - `queue`:               Requests waiting for a car.
 * - `generator`:           Source of synthetic requests.
 * - `n_floors`:            Number of floors in the building.
 * - `request_count`:       Requests the generator will produce in total.
 * - `assigned_count`:      Requests handed to a car so far.
 * - `tick_interval`:       Period of the dispatch tick.
 * - `terminate_tx`:        Dropped by `shutdown` to stop the background threads.
 * - `terminate_rx`:        Cloned into each background thread.
 */
pub struct Dispatcher {
    cars: BTreeMap<CarId, Arc<Car>>,
    queue: RequestQueue,
    generator: RequestGenerator,
    n_floors: u8,
    request_count: usize,
    assigned_count: AtomicUsize,
    tick_interval: Duration,
    terminate_tx: Mutex<Option<cbc::Sender<()>>>,
    terminate_rx: cbc::Receiver<()>,
}

/***************************************/
/*             Public API              */
/***************************************/

/// Builds the fleet from `config` and starts the generator and dispatch tick.
pub fn start_simulation(config: &Config) -> Result<Arc<Dispatcher>> {
    let dispatcher = Arc::new(Dispatcher::new(config)?);
    dispatcher.start()?;
    Ok(dispatcher)
}

/**
 * Picks the car that should serve a call on `floor` heading `direction`.
 *
 * A moving car heading the same way that has not yet passed the floor wins,
 * then any idle car. Within each group the nearest car is chosen, and on equal
 * distance the lowest id, given `statuses` in id order.
 */
pub fn select_car(statuses: &[CarStatus], floor: u8, direction: Direction) -> Option<CarId> {
    let distance = |status: &CarStatus| (status.state.floor as i16 - floor as i16).abs();

    let nearest_moving = statuses
        .iter()
        .filter(|status| {
            status.state.moving
                && status.state.direction == direction
                && direction.is_ahead(status.state.floor, floor)
        })
        .min_by_key(|&status| distance(status));

    let nearest = match nearest_moving {
        Some(status) => Some(status),
        None => statuses
            .iter()
            .filter(|status| !status.state.moving)
            .min_by_key(|&status| distance(status)),
    };

    nearest.map(|status| status.id)
}

impl Dispatcher {
    pub fn new(config: &Config) -> Result<Dispatcher> {
        let simulation = &config.simulation;
        let fleet = CarId::fleet(simulation.car_count)
            .ok_or_else(|| anyhow!("Invalid car count {}", simulation.car_count))?;
        let request_count = simulation
            .request_count
            .ok_or_else(|| anyhow!("Request count has not been set"))?;

        let cars = fleet
            .iter()
            .map(|&id| (id, Arc::new(Car::new(id, simulation.n_floors, &config.car))))
            .collect();

        let (terminate_tx, terminate_rx) = cbc::unbounded::<()>();

        Ok(Dispatcher {
            cars,
            queue: RequestQueue::new(),
            generator: RequestGenerator::new(simulation.n_floors, &config.generator),
            n_floors: simulation.n_floors,
            request_count,
            assigned_count: AtomicUsize::new(0),
            tick_interval: Duration::from_millis(config.dispatcher.tick_interval_ms),
            terminate_tx: Mutex::new(Some(terminate_tx)),
            terminate_rx,
        })
    }

    pub fn start(self: &Arc<Self>) -> io::Result<()> {
        // Generator thread
        let generator = self.generator.clone();
        let queue = self.queue.clone();
        let count = self.request_count;
        let terminate_rx = self.terminate_rx.clone();
        Builder::new()
            .name("request_generator".into())
            .spawn(move || generator.run(&queue, count, &terminate_rx))?;

        // Dispatch tick thread
        let dispatcher = Arc::clone(self);
        let terminate_rx = self.terminate_rx.clone();
        let ticker = cbc::tick(self.tick_interval);
        Builder::new()
            .name("dispatch_tick".into())
            .spawn(move || loop {
                cbc::select! {
                    recv(ticker) -> _ => {
                        dispatcher.dispatch_tick();
                    }
                    recv(terminate_rx) -> _ => break,
                }
            })?;

        Ok(())
    }

    /// Stops the generator and dispatch tick. Running car loops finish on their own; stranded records are logged.
    pub fn shutdown(&self) {
        let sender = self
            .terminate_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(sender);

        for car in self.cars.values() {
            let status = car.status();
            if status.state.has_work() {
                warn!(
                    "{} still holds {} pickup(s) and {} destination(s) at shutdown",
                    status.id,
                    status.state.pickups.len(),
                    status.state.destinations.len()
                );
            }
        }
    }

    pub fn assign(&self, floor: u8, direction: Direction) -> Option<Arc<Car>> {
        let statuses: Vec<CarStatus> = self.cars.values().map(|car| car.status()).collect();
        let id = select_car(&statuses, floor, direction)?;
        self.cars.get(&id).cloned()
    }

    /**
     * Hands the request at the head of the queue to a car, if one qualifies.
     *
     * The request is only dequeued once the car has recorded it, so there is
     * never a moment where it is in neither place.
     */
    pub fn dispatch_tick(&self) -> Option<Assignment> {
        let request = self.queue.peek()?;
        let pickup = request.pickup_floor();
        let direction = request.direction();

        let car = match self.assign(pickup, direction) {
            Some(car) => car,
            None => {
                debug!(
                    "No car can take the {} request on floor {} yet",
                    direction, pickup
                );
                return None;
            }
        };

        let destination = request
            .destination_floor()
            .or_else(|| random_destination(&mut rand::thread_rng(), pickup, direction, self.n_floors));
        let destination = match destination {
            Some(destination) => destination,
            None => {
                warn!("Discarding {} request on floor {}: no floor to travel to", direction, pickup);
                self.queue.pop();
                return None;
            }
        };

        let id = Uuid::new_v4();
        let was_idle = match car.assign(id, pickup, destination, direction) {
            Ok(was_idle) => was_idle,
            Err(e) => {
                warn!("Discarding {} request on floor {}: {}", direction, pickup, e);
                self.queue.pop();
                return None;
            }
        };
        self.queue.pop();

        let number = self.assigned_count.fetch_add(1, Ordering::SeqCst) + 1;
        print(
            &format!(
                "({}/{}) `{}` request on floor {} received (destination: floor {}). Assigned to `{}`",
                number,
                self.request_count,
                direction,
                pickup,
                destination,
                car.id()
            ),
            None,
        );

        if was_idle {
            if let Err(e) = car.start() {
                error!("Failed to start run loop for {}: {}", car.id(), e);
                car.abandon_run();
            }
        }

        Some(Assignment {
            number,
            id,
            car: car.id(),
            request,
            destination,
        })
    }

    #[cfg(test)]
    pub fn enqueue(&self, request: Request) {
        self.queue.push(request);
    }

    #[cfg(test)]
    pub fn car(&self, id: CarId) -> Option<&Arc<Car>> {
        self.cars.get(&id)
    }

    #[cfg(test)]
    pub fn cars(&self) -> impl Iterator<Item = &Arc<Car>> {
        self.cars.values()
    }

    pub fn is_busy(&self) -> bool {
        self.cars.values().any(|car| car.is_moving())
    }

    pub fn pending_requests(&self) -> usize {
        self.queue.len()
    }

    pub fn assigned_count(&self) -> usize {
        self.assigned_count.load(Ordering::SeqCst)
    }

    /**
     * True once every request has been generated and delivered.
     *
     * Checked in this order because a car only starts moving by taking a
     * request off a non-empty queue. A car holding records without a run
     * loop still counts as unfinished.
     */
    pub fn is_finished(&self) -> bool {
        self.generator.generated() >= self.request_count
            && self.queue.is_empty()
            && !self.is_busy()
            && !self.cars.values().any(|car| car.has_work())
    }

    pub fn snapshot(&self) -> FleetSnapshot {
        FleetSnapshot {
            generated: self.generator.generated(),
            assigned: self.assigned_count(),
            pending: self.queue.to_vec(),
            cars: self.cars.values().map(|car| car.status()).collect(),
        }
    }
}
