pub mod display;
pub mod logger;
pub mod macros;
pub mod structs;

pub use structs::random_destination;
pub use structs::CarId;
pub use structs::DestinationRecord;
pub use structs::Direction;
pub use structs::FloorError;
pub use structs::PickupRecord;
pub use structs::Request;
pub use structs::RequestRecord;
pub use structs::StopAction;
pub use structs::HOME_FLOOR;
