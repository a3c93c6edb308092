use std::sync::Arc;

use async_trait::async_trait;

use crate::backend::RegistryBackend;
use crate::discovery::Adaptor;
use crate::discovery::Response;
use crate::discovery::SearchRequest;
use crate::Result;

/// Exposes a [`RegistryBackend`] to the discovery path as one source.
pub struct BackendAdaptor {
    backend: Arc<dyn RegistryBackend>,
}

impl BackendAdaptor {
    pub fn new(backend: Arc<dyn RegistryBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Adaptor for BackendAdaptor {
    fn name(&self) -> &str {
        self.backend.name()
    }

    async fn search(
        &self,
        req: &SearchRequest,
    ) -> Result<Response> {
        self.backend.search(req).await
    }

    fn creditable(&self) -> bool {
        self.backend.creditable()
    }
}
