/***************************************/
/*        3rd party libraries          */
/***************************************/
use ansi_term::Colour;
use std::fmt;

/***************************************/
/*           Local modules             */
/***************************************/
use super::structs::{CarId, Direction, StopAction};

/***************************************/
/*           Lookup tables             */
/***************************************/
// Indexed by `CarId::number() - 1`
const CAR_TABLE: [(&str, Colour); 4] = [
    ("Car 1", Colour::Blue),
    ("Car 2", Colour::Yellow),
    ("Car 3", Colour::Red),
    ("Car 4", Colour::Green),
];

const DIRECTION_TABLE: [(Direction, &str); 2] = [(Direction::Up, "up"), (Direction::Down, "down")];

const STOP_ACTION_TABLE: [(StopAction, &str); 3] = [
    (StopAction::Loading, "Loading passengers"),
    (StopAction::Unloading, "Unloading passengers"),
    (StopAction::Idle, "Idle"),
];

/***************************************/
/*             Public API              */
/***************************************/
impl CarId {
    pub fn label(self) -> &'static str {
        CAR_TABLE[(self.number() - 1) as usize].0
    }

    pub fn colour(self) -> Colour {
        CAR_TABLE[(self.number() - 1) as usize].1
    }
}

impl Direction {
    pub fn label(self) -> &'static str {
        DIRECTION_TABLE
            .iter()
            .find(|(direction, _)| *direction == self)
            .map(|(_, label)| *label)
            .unwrap_or_default()
    }
}

impl StopAction {
    pub fn label(self) -> &'static str {
        STOP_ACTION_TABLE
            .iter()
            .find(|(action, _)| *action == self)
            .map(|(_, label)| *label)
            .unwrap_or_default()
    }
}

impl fmt::Display for CarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for StopAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
