/*
 * Unit tests for car module
 *
 * The unit tests follows the Arrange, Act, Assert pattern.
 * Cars are built with zero travel and transition time unless a test
 * needs to catch one in motion.
 *
 * Tests:
 *  - test_car_init
 *  - test_car_add_records
 *  - test_car_rejects_invalid_floors
 *  - test_car_assign_reports_idle
 *  - test_car_advance_moves_one_floor
 *  - test_car_advance_bounded
 *  - test_car_advance_bounded_below
 *  - test_car_advance_stops_for_pickup
 *  - test_car_loading_chooses_destination
 *  - test_car_unloading_waits_for_boarding
 *  - test_car_idle_stop_idempotent
 *  - test_car_single_passenger_scenario
 *  - test_car_run_serves_every_passenger
 *  - test_car_start_runs_on_own_thread
 *  - test_car_takes_work_while_returning_home
 *  - test_state_next_direction
 *  - test_state_pending_stops
 */

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod car_tests {
    use crate::car::car::{Car, CarState, Motion};
    use crate::config::CarConfig;
    use crate::shared::Direction::{Down, Up};
    use crate::shared::{CarId, FloorError, RequestRecord, StopAction};
    use crossbeam_channel as cbc;
    use std::sync::Arc;
    use std::time::Duration;
    use uuid::Uuid;

    fn setup_car() -> Car {
        // Default configuration
        let config = CarConfig {
            floor_travel_time_ms: 0,
            passenger_transition_time_ms: 0,
        };
        Car::new(CarId::One, 10, &config)
    }

    #[test]
    fn test_car_init() {
        // Arrange
        let car = setup_car();

        // Act
        let status = car.status();

        // Assert
        assert_eq!(status.id, CarId::One);
        assert_eq!(status.state, CarState::new());
        assert_eq!(status.state.floor, 1);
        assert_eq!(status.state.direction, Up);
        assert!(!car.is_moving());
    }

    #[test]
    fn test_car_add_records() {
        // Arrange
        let car = setup_car();
        let id = Uuid::new_v4();

        // Act
        car.add_pickup(id, 3, Up).unwrap();
        car.add_destination(id, 5, Up).unwrap();

        // Assert
        let state = car.status().state;
        assert_eq!(state.pickups.len(), 1);
        assert_eq!(state.pickups[0].floor, 3);
        assert_eq!(state.destinations.len(), 1);
        assert_eq!(state.destinations[0].floor, 5);
        assert_eq!(state.pickups[0].id, state.destinations[0].id);
    }

    #[test]
    fn test_car_rejects_invalid_floors() {
        // Arrange
        let car = setup_car();
        let before = car.status();

        // Act & Assert
        assert!(car.add_pickup(Uuid::new_v4(), 11, Down).is_err());
        assert!(car.add_pickup(Uuid::new_v4(), 10, Up).is_err());
        assert!(car.add_destination(Uuid::new_v4(), 0, Down).is_err());
        assert!(car.assign(Uuid::new_v4(), 4, 2, Up).is_err());
        assert_eq!(
            car.set_floor(12),
            Err(FloorError::OutOfBounds { floor: 12, n_floors: 10 })
        );

        // Nothing was mutated
        assert_eq!(car.status(), before);
    }

    #[test]
    fn test_car_assign_reports_idle() {
        // Arrange
        let car = setup_car();

        // Act
        let first = car.assign(Uuid::new_v4(), 3, 8, Up).unwrap();
        let second = car.assign(Uuid::new_v4(), 6, 2, Down).unwrap();

        // Assert
        assert!(first);
        assert!(!second);
        assert!(car.is_moving());
        assert_eq!(car.status().state.pickups.len(), 2);
        assert_eq!(car.status().state.destinations.len(), 2);
    }

    #[test]
    fn test_car_advance_moves_one_floor() {
        // Arrange
        let car = setup_car();

        // Act
        let motion = car.advance();

        // Assert
        assert_eq!(motion, Ok(Motion::Moved(2)));
        assert_eq!(car.status().state.floor, 2);
        assert!(car.is_moving());
    }

    #[test]
    fn test_car_advance_bounded() {
        // Arrange
        let car = setup_car();
        car.set_floor(10).unwrap();

        // Act
        let motion = car.advance();

        // Assert
        assert_eq!(motion, Err(FloorError::OutOfBounds { floor: 11, n_floors: 10 }));
        assert_eq!(car.status().state.floor, 10);
    }

    #[test]
    fn test_car_advance_bounded_below() {
        // Arrange: serve a downward passenger so the car ends home facing down
        let car = setup_car();
        car.set_floor(5).unwrap();
        car.assign(Uuid::new_v4(), 3, 1, Down).unwrap();
        car.run();
        assert_eq!(car.status().state.direction, Down);

        // Act
        let motion = car.advance();

        // Assert
        assert_eq!(motion, Err(FloorError::OutOfBounds { floor: 0, n_floors: 10 }));
        assert_eq!(car.status().state.floor, 1);
    }

    #[test]
    fn test_car_advance_stops_for_pickup() {
        // Arrange
        let car = setup_car();
        let id = Uuid::new_v4();
        car.add_pickup(id, 1, Up).unwrap();
        car.add_destination(id, 4, Up).unwrap();

        // Act
        let motion = car.advance();

        // Assert
        assert_eq!(motion, Ok(Motion::Stopped(1)));
        let state = car.status().state;
        assert_eq!(state.floor, 1);
        assert!(state.pickups.is_empty());
        assert_eq!(state.destinations.len(), 1);
        assert_eq!(state.destinations[0].floor, 4);
    }

    #[test]
    fn test_car_loading_chooses_destination() {
        // Arrange
        let car = setup_car();
        let id = Uuid::new_v4();
        car.add_pickup(id, 1, Up).unwrap();

        // Act
        car.stop(StopAction::Loading);

        // Assert
        let state = car.status().state;
        assert!(state.pickups.is_empty());
        assert_eq!(state.destinations.len(), 1);
        assert_eq!(state.destinations[0].id, id);
        assert!(state.destinations[0].floor > 1 && state.destinations[0].floor <= 10);
    }

    #[test]
    fn test_car_unloading_waits_for_boarding() {
        // Arrange
        let car = setup_car();
        let waiting = Uuid::new_v4();
        let aboard = Uuid::new_v4();
        car.add_pickup(waiting, 5, Up).unwrap();
        car.add_destination(waiting, 1, Up).unwrap();
        car.add_destination(aboard, 1, Down).unwrap();

        // Act
        car.stop(StopAction::Unloading);

        // Assert
        let state = car.status().state;
        assert_eq!(state.pickups.len(), 1);
        assert_eq!(state.destinations.len(), 1);
        assert_eq!(state.destinations[0].id, waiting);
    }

    #[test]
    fn test_car_idle_stop_idempotent() {
        // Arrange
        let car = setup_car();
        let before = car.status();

        // Act
        car.stop(StopAction::Idle);
        car.stop(StopAction::Idle);

        // Assert
        assert_eq!(car.status(), before);
    }

    #[test]
    fn test_car_single_passenger_scenario() {
        // Purpose: pickup on 3 going up with destination 8, then home and idle

        // Arrange
        let car = setup_car();
        let id = Uuid::new_v4();
        assert_eq!(car.assign(id, 3, 8, Up), Ok(true));

        // Act & Assert: 1 -> 2 -> 3, then load
        assert_eq!(car.advance(), Ok(Motion::Moved(2)));
        assert_eq!(car.advance(), Ok(Motion::Moved(3)));
        assert_eq!(car.advance(), Ok(Motion::Stopped(3)));

        let state = car.status().state;
        assert!(state.pickups.is_empty());
        assert_eq!(state.destinations.len(), 1);
        assert_eq!(state.destinations[0].floor, 8);

        // 3 -> 8, then unload
        for floor in 4..=8 {
            assert_eq!(car.advance(), Ok(Motion::Moved(floor)));
        }
        assert_eq!(car.advance(), Ok(Motion::Stopped(8)));
        assert!(car.status().state.destinations.is_empty());
        assert!(car.is_moving());

        // Nothing left, the run loop takes it home
        car.run();

        let state = car.status().state;
        assert_eq!(state.floor, 1);
        assert!(!state.moving);
        assert!(!state.has_work());
    }

    #[test]
    fn test_car_run_serves_every_passenger() {
        // Arrange
        let car = setup_car();
        car.assign(Uuid::new_v4(), 3, 8, Up).unwrap();
        car.assign(Uuid::new_v4(), 6, 2, Down).unwrap();
        car.assign(Uuid::new_v4(), 2, 10, Up).unwrap();
        car.assign(Uuid::new_v4(), 9, 4, Down).unwrap();

        // Act
        car.run();

        // Assert
        let state = car.status().state;
        assert_eq!(state.floor, 1);
        assert!(!state.moving);
        assert!(state.pickups.is_empty());
        assert!(state.destinations.is_empty());
    }

    #[test]
    fn test_car_start_runs_on_own_thread() {
        // Arrange
        let car = Arc::new(setup_car());
        car.set_floor(7).unwrap();
        let was_idle = car.assign(Uuid::new_v4(), 5, 1, Down).unwrap();

        // Act
        let handle = car.start().unwrap();
        assert_eq!(handle.thread().name(), Some("car_1"));
        handle.join().unwrap();

        // Assert
        assert!(was_idle);
        let state = car.status().state;
        assert_eq!(state.floor, 1);
        assert!(!state.moving);
        assert!(!state.has_work());
    }

    #[test]
    fn test_car_takes_work_while_returning_home() {
        // Arrange
        let config = CarConfig {
            floor_travel_time_ms: 20,
            passenger_transition_time_ms: 20,
        };
        let car = Arc::new(Car::new(CarId::One, 10, &config));
        assert_eq!(car.assign(Uuid::new_v4(), 2, 9, Up), Ok(true));
        let handle = car.start().unwrap();

        // Wait for the car to drop its passenger and head back down
        let ticker = cbc::tick(Duration::from_millis(1));
        let deadline = cbc::after(Duration::from_secs(5));
        loop {
            let state = car.status().state;
            if state.destinations.is_empty() && state.floor <= 8 {
                break;
            }
            cbc::select! {
                recv(ticker) -> _ => {}
                recv(deadline) -> _ => panic!("car never started returning home"),
            }
        }

        // Act
        let was_idle = car.assign(Uuid::new_v4(), 3, 1, Down);
        handle.join().unwrap();

        // Assert: the running loop took the request, no second loop needed
        assert_eq!(was_idle, Ok(false));
        let state = car.status().state;
        assert_eq!(state.floor, 1);
        assert!(!state.moving);
        assert!(!state.has_work());
    }

    #[test]
    fn test_state_next_direction() {
        // Arrange
        let mut state = CarState::new();
        state.floor = 5;
        let waiting = Uuid::new_v4();

        // Act & Assert: nothing to do
        assert_eq!(state.next_direction(), None);

        // Pickup behind the car turns it around
        state.pickups.push(RequestRecord::new(waiting, 2, Up));
        assert_eq!(state.next_direction(), Some(Down));

        // Destination of a waiting passenger is not a target
        state.destinations.push(RequestRecord::new(waiting, 9, Up));
        assert_eq!(state.next_direction(), Some(Down));

        // A boarded passenger above keeps an upward car going up
        state.direction = Up;
        state.destinations.push(RequestRecord::new(Uuid::new_v4(), 7, Up));
        assert_eq!(state.next_direction(), Some(Up));
    }

    #[test]
    fn test_state_pending_stops() {
        // Arrange
        let mut state = CarState::new();
        state.floor = 4;
        state.pickups.push(RequestRecord::new(Uuid::new_v4(), 4, Up));
        state.destinations.push(RequestRecord::new(Uuid::new_v4(), 4, Up));
        state.pickups.push(RequestRecord::new(Uuid::new_v4(), 4, Down));

        // Act & Assert
        assert_eq!(state.pending_stops(), vec![StopAction::Loading, StopAction::Unloading]);

        state.direction = Down;
        assert_eq!(state.pending_stops(), vec![StopAction::Loading]);

        // Loading boards everyone on the floor, unloading drops only the boarded
        let boarded = state.load(&mut rand::thread_rng(), 10);
        assert_eq!(boarded.len(), 2);
        assert!(state.pickups.is_empty());
        assert_eq!(state.unload(), 1);
        assert_eq!(state.destinations.len(), 2);
    }
}
