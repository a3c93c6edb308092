//! Hand-written source stubs with call counters.
//!
//! The generated mocks cover expectation-style tests; these stubs are for
//! tests that need shared call counters across concurrent tasks or sources
//! that stall.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::sleep;

use crate::discovery::Adaptor;
use crate::discovery::Indexer;
use crate::discovery::Response;
use crate::discovery::SearchRequest;
use crate::Result;
use crate::StorageError;

/// Source returning a canned response on every call.
pub struct StaticAdaptor {
    name: String,
    response: Mutex<Response>,
    fail: AtomicBool,
    creditable: AtomicBool,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StaticAdaptor {
    pub fn new(
        name: &str,
        response: Response,
    ) -> Self {
        Self {
            name: name.to_string(),
            response: Mutex::new(response),
            fail: AtomicBool::new(false),
            creditable: AtomicBool::new(true),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Source that fails every search
    pub fn failing(name: &str) -> Self {
        let adaptor = Self::new(name, Response::default());
        adaptor.fail.store(true, Ordering::SeqCst);
        adaptor
    }

    /// Adds a pause before every answer
    pub fn with_delay(
        mut self,
        delay: Duration,
    ) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_creditable(
        self,
        creditable: bool,
    ) -> Self {
        self.creditable.store(creditable, Ordering::SeqCst);
        self
    }

    pub fn set_response(
        &self,
        response: Response,
    ) {
        *self.response.lock() = response;
    }

    pub fn set_fail(
        &self,
        fail: bool,
    ) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_creditable(
        &self,
        creditable: bool,
    ) {
        self.creditable.store(creditable, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Adaptor for StaticAdaptor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(
        &self,
        _req: &SearchRequest,
    ) -> Result<Response> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(StorageError::DbError(format!("source '{}' is down", self.name)).into());
        }
        Ok(self.response.lock().clone())
    }

    fn creditable(&self) -> bool {
        self.creditable.load(Ordering::SeqCst)
    }
}

/// Indexer returning a canned response on every call.
pub struct StubIndexer {
    response: Mutex<Response>,
    fail: AtomicBool,
    creditable: AtomicBool,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_request: Mutex<Option<SearchRequest>>,
}

impl StubIndexer {
    pub fn new(response: Response) -> Self {
        Self {
            response: Mutex::new(response),
            fail: AtomicBool::new(false),
            creditable: AtomicBool::new(true),
            delay: None,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        let indexer = Self::new(Response::default());
        indexer.fail.store(true, Ordering::SeqCst);
        indexer
    }

    pub fn with_delay(
        mut self,
        delay: Duration,
    ) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_creditable(
        self,
        creditable: bool,
    ) -> Self {
        self.creditable.store(creditable, Ordering::SeqCst);
        self
    }

    pub fn set_response(
        &self,
        response: Response,
    ) {
        *self.response.lock() = response;
    }

    pub fn set_fail(
        &self,
        fail: bool,
    ) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_creditable(
        &self,
        creditable: bool,
    ) {
        self.creditable.store(creditable, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The request seen by the most recent search
    pub fn last_request(&self) -> Option<SearchRequest> {
        self.last_request.lock().clone()
    }
}

#[async_trait]
impl Indexer for StubIndexer {
    async fn search(
        &self,
        req: &SearchRequest,
    ) -> Result<Response> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock() = Some(req.clone());
        if let Some(delay) = self.delay {
            sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(StorageError::DbError("stub indexer is down".to_string()).into());
        }
        Ok(self.response.lock().clone())
    }

    fn creditable(&self) -> bool {
        self.creditable.load(Ordering::SeqCst)
    }
}
