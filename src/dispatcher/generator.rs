/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::debug;
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/***************************************/
/*           Local modules             */
/***************************************/
use super::RequestQueue;
use crate::config::GeneratorConfig;
use crate::shared::{random_destination, Direction, Request, HOME_FLOOR};

/**
 * Produces synthetic pickup calls at randomized intervals.
 *
 * # Fields
 * - `n_floors`:                Number of floors in the building.
 * - `min_interval`:            Shortest wait between two draws.
 * - `max_interval`:            Longest wait between two draws.
 * - `preassign_destination`:   Draw the drop-off floor up front instead of leaving it to the dispatcher.
 * - `generated`:               Requests pushed so far, shared between clones.
 */
#[derive(Clone, Debug)]
pub struct RequestGenerator {
    n_floors: u8,
    min_interval: Duration,
    max_interval: Duration,
    preassign_destination: bool,
    generated: Arc<AtomicUsize>,
}

impl RequestGenerator {
    pub fn new(n_floors: u8, config: &GeneratorConfig) -> RequestGenerator {
        RequestGenerator {
            n_floors,
            min_interval: Duration::from_millis(config.min_interval_ms),
            max_interval: Duration::from_millis(config.max_interval_ms),
            preassign_destination: config.preassign_destination,
            generated: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn generated(&self) -> usize {
        self.generated.load(Ordering::SeqCst)
    }

    /// One random call, or `None` when the draw cannot travel in its direction (up from the top, down from the bottom).
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Request> {
        let direction = if rng.gen_bool(0.5) {
            Direction::Up
        } else {
            Direction::Down
        };
        let floor = rng.gen_range(HOME_FLOOR..=self.n_floors);
        let destination = if self.preassign_destination {
            random_destination(rng, floor, direction, self.n_floors)
        } else {
            None
        };

        Request::new(floor, direction, destination, self.n_floors).ok()
    }

    pub fn next_interval<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.min_interval >= self.max_interval {
            return self.min_interval;
        }
        rng.gen_range(self.min_interval..=self.max_interval)
    }

    /// Pushes `count` requests into `queue`, stopping early if `terminate_rx` fires or closes.
    pub fn run(&self, queue: &RequestQueue, count: usize, terminate_rx: &cbc::Receiver<()>) {
        let mut rng = rand::thread_rng();

        while self.generated() < count {
            match self.draw(&mut rng) {
                Some(request) => {
                    queue.push(request);
                    let generated = self.generated.fetch_add(1, Ordering::SeqCst) + 1;
                    debug!(
                        "Queued request {}/{}: {} on floor {}",
                        generated,
                        count,
                        request.direction(),
                        request.pickup_floor()
                    );
                }
                None => debug!("Discarded a call that cannot travel from its floor"),
            }

            if self.generated() >= count {
                break;
            }

            cbc::select! {
                recv(terminate_rx) -> _ => break,
                recv(cbc::after(self.next_interval(&mut rng))) -> _ => {}
            }
        }
        debug!("Request generator finished after {} requests", self.generated());
    }
}
