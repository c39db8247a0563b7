/***************************************/
/*        3rd party libraries          */
/***************************************/
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::Request;

/// FIFO of requests waiting for a car. Cloning shares the same queue.
#[derive(Clone, Default, Debug)]
pub struct RequestQueue {
    inner: Arc<Mutex<VecDeque<Request>>>,
}

impl RequestQueue {
    pub fn new() -> RequestQueue {
        RequestQueue::default()
    }

    pub fn push(&self, request: Request) {
        self.lock().push_back(request);
    }

    pub fn peek(&self) -> Option<Request> {
        self.lock().front().copied()
    }

    pub fn pop(&self) -> Option<Request> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn to_vec(&self) -> Vec<Request> {
        self.lock().iter().copied().collect()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Request>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
