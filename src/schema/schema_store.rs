use std::collections::HashMap;
use std::sync::Arc;

use autometrics::autometrics;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::backend::RegistryBackend;
use crate::discovery::SearchRequest;
use crate::errors::Result;
use crate::errors::SchemaError;
use crate::errors::ServiceError;
use crate::errors::StorageError;
use crate::keyspace;
use crate::service::MicroService;
use crate::API_SLO;

/// One service's reference to a schema: the link from a schema id to the
/// shared content hash, plus the indexed summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRef {
    pub domain_project: String,
    pub service_id: String,
    pub schema_id: String,
    pub hash: String,
    pub summary: String,
}

/// Shared schema content, stored once per hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaContent {
    pub domain_project: String,
    pub hash: String,
    pub content: String,
}

/// One schema write: the reference fields and the content they point at.
///
/// Coupling the hash and the content in one value keeps a reference from
/// ever being written against content the store has not seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaPut {
    pub schema_id: String,
    pub hash: String,
    pub summary: String,
    pub content: String,
}

/// Schema metadata and content store, scoped to a domain/project.
///
/// References and summaries belong to one service; content is deduplicated
/// by hash and shared across services, so content writes are
/// create-if-absent and content deletion is refused while any reference
/// remains.
pub struct SchemaStore {
    backend: Arc<dyn RegistryBackend>,
    domain_project: String,
}

impl SchemaStore {
    pub fn new(
        backend: Arc<dyn RegistryBackend>,
        domain_project: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            domain_project: domain_project.into(),
        }
    }

    /// One schema reference with its summary, [`SchemaError::SchemaNotFound`]
    /// when the service holds no such schema.
    #[autometrics(objective = API_SLO)]
    pub async fn get_ref(
        &self,
        service_id: &str,
        schema_id: &str,
    ) -> Result<SchemaRef> {
        let key = keyspace::schema_ref_key(&self.domain_project, service_id, schema_id);
        let kv = match self.backend.get(key.as_bytes()).await? {
            Some(kv) => kv,
            None => return Err(SchemaError::SchemaNotFound.into()),
        };

        let summary = self
            .get_summary(service_id, schema_id)
            .await?
            .unwrap_or_default();

        Ok(SchemaRef {
            domain_project: self.domain_project.clone(),
            service_id: service_id.to_string(),
            schema_id: schema_id.to_string(),
            hash: String::from_utf8_lossy(&kv.value).into_owned(),
            summary,
        })
    }

    /// Every schema reference of one service, each paired with its summary.
    pub async fn list_ref(
        &self,
        service_id: &str,
    ) -> Result<Vec<SchemaRef>> {
        let req = SearchRequest::new(keyspace::schema_ref_prefix(
            &self.domain_project,
            service_id,
        ))
        .with_prefix();
        let resp = self.backend.search(&req).await?;
        let summaries = self.summary_map(service_id).await?;

        let mut refs = Vec::with_capacity(resp.kvs.len());
        for kv in resp.kvs {
            let (domain_project, service_id, schema_id) =
                match keyspace::parse_schema_ref_key(&kv.key) {
                    Some(parts) => parts,
                    None => {
                        warn!("skipping malformed schema ref key: {:?}", kv.key);
                        continue;
                    }
                };
            let summary = summaries.get(&schema_id).cloned().unwrap_or_default();
            refs.push(SchemaRef {
                domain_project,
                service_id,
                schema_id,
                hash: String::from_utf8_lossy(&kv.value).into_owned(),
                summary,
            });
        }
        Ok(refs)
    }

    /// The first reference pointing at a content hash, across every service
    /// of the domain/project.
    pub async fn exist_ref(
        &self,
        hash: &str,
    ) -> Result<Option<SchemaRef>> {
        let req = SearchRequest::new(keyspace::schema_ref_root(&self.domain_project))
            .with_prefix();
        let resp = self.backend.search(&req).await?;

        for kv in resp.kvs {
            if kv.value.as_ref() != hash.as_bytes() {
                continue;
            }
            if let Some((domain_project, service_id, schema_id)) =
                keyspace::parse_schema_ref_key(&kv.key)
            {
                let summary = self
                    .get_summary(&service_id, &schema_id)
                    .await?
                    .unwrap_or_default();
                return Ok(Some(SchemaRef {
                    domain_project,
                    service_id,
                    schema_id,
                    hash: hash.to_string(),
                    summary,
                }));
            }
        }
        Ok(None)
    }

    /// Removes one reference and its summary.
    pub async fn delete_ref(
        &self,
        service_id: &str,
        schema_id: &str,
    ) -> Result<()> {
        let ref_key = keyspace::schema_ref_key(&self.domain_project, service_id, schema_id);
        if !self.backend.delete(ref_key.as_bytes()).await? {
            return Err(SchemaError::SchemaNotFound.into());
        }

        let summary_key =
            keyspace::schema_summary_key(&self.domain_project, service_id, schema_id);
        self.backend.delete(summary_key.as_bytes()).await?;

        info!("deleted schema ref [{}/{}]", service_id, schema_id);
        Ok(())
    }

    /// Shared content by hash.
    #[autometrics(objective = API_SLO)]
    pub async fn get_content(
        &self,
        hash: &str,
    ) -> Result<SchemaContent> {
        let key = keyspace::schema_content_key(&self.domain_project, hash);
        match self.backend.get(key.as_bytes()).await? {
            Some(kv) => Ok(SchemaContent {
                domain_project: self.domain_project.clone(),
                hash: hash.to_string(),
                content: String::from_utf8_lossy(&kv.value).into_owned(),
            }),
            None => Err(SchemaError::SchemaContentNotFound.into()),
        }
    }

    /// Writes one schema: its reference, summary and shared content, and
    /// appends the schema id to the owning service's record when new.
    #[autometrics(objective = API_SLO)]
    pub async fn put_content(
        &self,
        service_id: &str,
        put: &SchemaPut,
    ) -> Result<()> {
        let mut service = match self.get_service(service_id).await? {
            Some(service) => service,
            None => return Err(ServiceError::ServiceNotFound(service_id.to_string()).into()),
        };

        self.write_ref(service_id, put).await?;
        self.put_shared_content(&put.hash, &put.content).await?;

        if !service.schemas.iter().any(|id| id == &put.schema_id) {
            service.schemas.push(put.schema_id.clone());
            self.put_service(&service).await?;
        }

        info!(
            "put schema [{}/{}] hash [{}]",
            service_id, put.schema_id, put.hash
        );
        Ok(())
    }

    /// Replaces a service's whole schema set.
    ///
    /// References absent from the new set are dropped together with their
    /// summaries; the shared content they pointed at stays until explicitly
    /// deleted.
    #[autometrics(objective = API_SLO)]
    pub async fn put_many_content(
        &self,
        service_id: &str,
        puts: &[SchemaPut],
    ) -> Result<()> {
        let mut service = match self.get_service(service_id).await? {
            Some(service) => service,
            None => return Err(ServiceError::ServiceNotFound(service_id.to_string()).into()),
        };

        let new_ids: Vec<String> = puts.iter().map(|p| p.schema_id.clone()).collect();

        for stale in service.schemas.iter().filter(|id| !new_ids.contains(id)) {
            let ref_key = keyspace::schema_ref_key(&self.domain_project, service_id, stale);
            self.backend.delete(ref_key.as_bytes()).await?;
            let summary_key =
                keyspace::schema_summary_key(&self.domain_project, service_id, stale);
            self.backend.delete(summary_key.as_bytes()).await?;
            debug!("dropped stale schema ref [{}/{}]", service_id, stale);
        }

        for put in puts {
            self.write_ref(service_id, put).await?;
            self.put_shared_content(&put.hash, &put.content).await?;
        }

        service.schemas = new_ids;
        self.put_service(&service).await?;

        info!(
            "replaced schema set of [{}] with {} schemas",
            service_id,
            puts.len()
        );
        Ok(())
    }

    /// Deletes shared content, refused while any reference still points at
    /// the hash.
    pub async fn delete_content(
        &self,
        hash: &str,
    ) -> Result<()> {
        if self.is_referenced(hash).await? {
            return Err(SchemaError::StillReferenced {
                hash: hash.to_string(),
            }
            .into());
        }

        let key = keyspace::schema_content_key(&self.domain_project, hash);
        if !self.backend.delete(key.as_bytes()).await? {
            return Err(SchemaError::SchemaContentNotFound.into());
        }

        info!("deleted schema content [{}]", hash);
        Ok(())
    }

    /// Every content hash stored for the domain/project.
    pub async fn list_hash(&self) -> Result<Vec<String>> {
        let req = SearchRequest::new(keyspace::schema_content_root(&self.domain_project))
            .with_prefix();
        let resp = self.backend.search(&req).await?;

        Ok(resp
            .kvs
            .iter()
            .filter_map(|kv| keyspace::parse_schema_content_key(&kv.key))
            .map(|(_, hash)| hash)
            .collect())
    }

    async fn write_ref(
        &self,
        service_id: &str,
        put: &SchemaPut,
    ) -> Result<()> {
        let ref_key =
            keyspace::schema_ref_key(&self.domain_project, service_id, &put.schema_id);
        self.backend
            .put(ref_key.as_bytes(), put.hash.as_bytes())
            .await?;

        let summary_key =
            keyspace::schema_summary_key(&self.domain_project, service_id, &put.schema_id);
        self.backend
            .put(summary_key.as_bytes(), put.summary.as_bytes())
            .await?;
        Ok(())
    }

    /// Content is shared by hash: the first write wins, later writers keep
    /// the stored bytes.
    async fn put_shared_content(
        &self,
        hash: &str,
        content: &str,
    ) -> Result<()> {
        let key = keyspace::schema_content_key(&self.domain_project, hash);
        let created = self
            .backend
            .compare_and_swap(key.as_bytes(), None, Some(content.as_bytes()))
            .await?;

        if created {
            debug!("stored schema content [{}]", hash);
        } else {
            debug!("schema content [{}] already present", hash);
        }
        Ok(())
    }

    async fn is_referenced(
        &self,
        hash: &str,
    ) -> Result<bool> {
        let req = SearchRequest::new(keyspace::schema_ref_root(&self.domain_project))
            .with_prefix();
        let resp = self.backend.search(&req).await?;
        Ok(resp.kvs.iter().any(|kv| kv.value.as_ref() == hash.as_bytes()))
    }

    async fn summary_map(
        &self,
        service_id: &str,
    ) -> Result<HashMap<String, String>> {
        let req = SearchRequest::new(keyspace::schema_summary_prefix(
            &self.domain_project,
            service_id,
        ))
        .with_prefix();
        let resp = self.backend.search(&req).await?;

        let mut summaries = HashMap::with_capacity(resp.kvs.len());
        for kv in resp.kvs {
            if let Some((_, _, schema_id)) = keyspace::parse_schema_summary_key(&kv.key) {
                summaries.insert(schema_id, String::from_utf8_lossy(&kv.value).into_owned());
            }
        }
        Ok(summaries)
    }

    async fn get_summary(
        &self,
        service_id: &str,
        schema_id: &str,
    ) -> Result<Option<String>> {
        let key = keyspace::schema_summary_key(&self.domain_project, service_id, schema_id);
        Ok(self
            .backend
            .get(key.as_bytes())
            .await?
            .map(|kv| String::from_utf8_lossy(&kv.value).into_owned()))
    }

    async fn get_service(
        &self,
        service_id: &str,
    ) -> Result<Option<MicroService>> {
        let key = keyspace::service_key(&self.domain_project, service_id);
        match self.backend.get(key.as_bytes()).await? {
            Some(kv) => {
                let service = bincode::deserialize(&kv.value).map_err(StorageError::from)?;
                Ok(Some(service))
            }
            None => Ok(None),
        }
    }

    async fn put_service(
        &self,
        service: &MicroService,
    ) -> Result<()> {
        let key = keyspace::service_key(&self.domain_project, &service.service_id);
        let body = bincode::serialize(service).map_err(StorageError::from)?;
        self.backend.put(key.as_bytes(), &body).await?;
        Ok(())
    }
}
