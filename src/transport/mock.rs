//! Scripted transport for tests.

use super::{Transport, TransportError, TransportResponse};
use crate::request::RequestDescriptor;

use async_trait::async_trait;
use std::sync::Mutex;

type Responder = dyn Fn(&RequestDescriptor) -> Result<TransportResponse, TransportError> + Send + Sync;

/// Answers every request through a closure and records what it was asked.
pub(crate) struct MockTransport {
    responder: Box<Responder>,
    requests: Mutex<Vec<RequestDescriptor>>,
}

impl MockTransport {
    pub(crate) fn new<F>(responder: F) -> Self
    where
        F: Fn(&RequestDescriptor) -> Result<TransportResponse, TransportError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with the same response.
    pub(crate) fn replying(response: TransportResponse) -> Self {
        Self::new(move |_| Ok(response.clone()))
    }

    pub(crate) fn requests(&self) -> Vec<RequestDescriptor> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: &RequestDescriptor) -> Result<TransportResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        (self.responder)(request)
    }
}
