pub mod dispatcher;
pub mod generator;
pub mod request_queue;

pub use dispatcher::start_simulation;
pub use generator::RequestGenerator;
pub use request_queue::RequestQueue;
