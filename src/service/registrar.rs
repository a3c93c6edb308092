//! Writes service and instance records through the backend contract.

use std::sync::Arc;

use autometrics::autometrics;
use nanoid::nanoid;
use tracing::debug;
use tracing::info;

use crate::backend::RegistryBackend;
use crate::discovery::SearchRequest;
use crate::errors::Result;
use crate::errors::ServiceError;
use crate::errors::StorageError;
use crate::keyspace;
use crate::service::descriptor::registry_instance;
use crate::service::descriptor::registry_service;
use crate::service::descriptor::MicroService;
use crate::service::descriptor::MicroServiceInstance;
use crate::API_SLO;

/// Registration surface over one backend, scoped to a domain/project.
pub struct Registrar {
    backend: Arc<dyn RegistryBackend>,
    domain_project: String,
}

impl Registrar {
    pub fn new(
        backend: Arc<dyn RegistryBackend>,
        domain_project: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            domain_project: domain_project.into(),
        }
    }

    /// Writes a service record, generating an id when none is set.
    ///
    /// Creation is compare-and-swap guarded: re-registering an existing id
    /// keeps the stored record and returns the id unchanged.
    #[autometrics(objective = API_SLO)]
    pub async fn register_service(
        &self,
        service: &MicroService,
    ) -> Result<String> {
        let mut record = service.clone();
        if record.service_id.is_empty() {
            record.service_id = nanoid!();
        }

        let key = keyspace::service_key(&self.domain_project, &record.service_id);
        let body = bincode::serialize(&record).map_err(StorageError::from)?;
        let created = self
            .backend
            .compare_and_swap(key.as_bytes(), None, Some(&body))
            .await?;

        if created {
            info!(
                "registered service '{}' as [{}]",
                record.service_name, record.service_id
            );
        } else {
            debug!("service [{}] already registered", record.service_id);
        }
        Ok(record.service_id)
    }

    /// Writes an instance record under its owning service.
    #[autometrics(objective = API_SLO)]
    pub async fn register_instance(
        &self,
        instance: &MicroServiceInstance,
    ) -> Result<String> {
        let mut record = instance.clone();
        if record.instance_id.is_empty() {
            record.instance_id = nanoid!();
        }

        let service_key = keyspace::service_key(&self.domain_project, &record.service_id);
        if self.backend.get(service_key.as_bytes()).await?.is_none() {
            return Err(ServiceError::ServiceNotFound(record.service_id).into());
        }

        let key = keyspace::instance_key(
            &self.domain_project,
            &record.service_id,
            &record.instance_id,
        );
        let body = bincode::serialize(&record).map_err(StorageError::from)?;
        self.backend.put(key.as_bytes(), &body).await?;

        info!(
            "registered instance [{}/{}]",
            record.service_id, record.instance_id
        );
        Ok(record.instance_id)
    }

    /// Removes an instance record.
    pub async fn unregister_instance(
        &self,
        service_id: &str,
        instance_id: &str,
    ) -> Result<()> {
        let key = keyspace::instance_key(&self.domain_project, service_id, instance_id);
        if !self.backend.delete(key.as_bytes()).await? {
            return Err(ServiceError::InstanceNotFound(format!(
                "{}/{}",
                service_id, instance_id
            ))
            .into());
        }
        info!("unregistered instance [{}/{}]", service_id, instance_id);
        Ok(())
    }

    /// Renews an instance's lease by rewriting its record, so the renewal
    /// is observable as a revision bump.
    pub async fn heartbeat(
        &self,
        service_id: &str,
        instance_id: &str,
    ) -> Result<()> {
        let key = keyspace::instance_key(&self.domain_project, service_id, instance_id);
        match self.backend.get(key.as_bytes()).await? {
            Some(kv) => {
                self.backend.put(key.as_bytes(), &kv.value).await?;
                Ok(())
            }
            None => Err(ServiceError::InstanceNotFound(format!(
                "{}/{}",
                service_id, instance_id
            ))
            .into()),
        }
    }

    /// Registers the registry's own service and instance records under
    /// `service_name`.
    ///
    /// The service id is reused across restarts by looking the record up by
    /// name; the instance record is fresh every boot.
    pub async fn register_self(
        &self,
        service_name: &str,
    ) -> Result<(String, String)> {
        let mut service = registry_service();
        service.service_name = service_name.to_string();
        service.alias = service_name.to_string();
        if let Some(existing) = self.find_service_by_name(&service.service_name).await? {
            service.service_id = existing.service_id;
        }
        let service_id = self.register_service(&service).await?;

        let mut instance = registry_instance();
        instance.service_id = service_id.clone();
        let instance_id = self.register_instance(&instance).await?;

        info!(
            "self registration complete: service [{}] instance [{}]",
            service_id, instance_id
        );
        Ok((service_id, instance_id))
    }

    /// Scans the service range for a record with the given name.
    pub async fn find_service_by_name(
        &self,
        service_name: &str,
    ) -> Result<Option<MicroService>> {
        let req =
            SearchRequest::new(keyspace::service_root(&self.domain_project)).with_prefix();
        let resp = self.backend.search(&req).await?;

        for kv in resp.kvs {
            let service: MicroService =
                bincode::deserialize(&kv.value).map_err(StorageError::from)?;
            if service.service_name == service_name {
                return Ok(Some(service));
            }
        }
        Ok(None)
    }
}
