//! In-memory repositories and state builders shared by the API tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use entityinfo_api::AppState;
use entityinfo_core::{
    AttributeDefinition, AttributeRepository, AttributeSpec, AttributeType,
    CreateAttributeRequest, CreateManifestRequest, ImportManifestRequest, Manifest,
    ManifestDetail, ManifestRepository, NewWorkbenchEntry, Result, UpdateAttributeRequest,
    UpdateManifestRequest, WorkbenchEntry, WorkbenchRepository, WorkbenchResource,
};
use entityinfo_upstream::mock::{MockGraphStore, MockSearchIndex};

#[derive(Default)]
struct Tables {
    manifests: Vec<Manifest>,
    attributes: Vec<AttributeDefinition>,
    workbench: Vec<WorkbenchEntry>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// One shared in-memory store implementing every repository trait.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a manifest with `(name, type, value, optional)` attributes.
    pub fn seed_manifest(
        &self,
        project_code: &str,
        name: &str,
        attributes: &[(&str, AttributeType, Option<&str>, bool)],
    ) -> i64 {
        let mut t = self.tables.lock().unwrap();
        let id = t.next_id();
        t.manifests.push(Manifest {
            id,
            name: name.to_string(),
            project_code: project_code.to_string(),
        });
        for (attr_name, attr_type, value, optional) in attributes {
            let attr_id = t.next_id();
            t.attributes.push(AttributeDefinition {
                id: attr_id,
                manifest_id: id,
                name: attr_name.to_string(),
                attr_type: *attr_type,
                value: value.map(str::to_string),
                project_code: project_code.to_string(),
                optional: *optional,
            });
        }
        id
    }

    pub fn manifest_count(&self) -> usize {
        self.tables.lock().unwrap().manifests.len()
    }

    pub fn attribute_count(&self) -> usize {
        self.tables.lock().unwrap().attributes.len()
    }

    fn detail(t: &Tables, id: i64) -> Option<ManifestDetail> {
        let manifest = t.manifests.iter().find(|m| m.id == id)?.clone();
        let attributes = t
            .attributes
            .iter()
            .filter(|a| a.manifest_id == id)
            .cloned()
            .collect();
        Some(ManifestDetail {
            manifest,
            attributes,
        })
    }
}

#[async_trait]
impl ManifestRepository for MemoryStore {
    async fn list_by_project(&self, project_code: &str) -> Result<Vec<Manifest>> {
        let t = self.tables.lock().unwrap();
        Ok(t.manifests
            .iter()
            .filter(|m| m.project_code == project_code)
            .cloned()
            .collect())
    }

    async fn count_by_project(&self, project_code: &str) -> Result<i64> {
        Ok(self.list_by_project(project_code).await?.len() as i64)
    }

    async fn get(&self, id: i64) -> Result<Option<Manifest>> {
        let t = self.tables.lock().unwrap();
        Ok(t.manifests.iter().find(|m| m.id == id).cloned())
    }

    async fn get_detail(&self, id: i64) -> Result<Option<ManifestDetail>> {
        let t = self.tables.lock().unwrap();
        Ok(Self::detail(&t, id))
    }

    async fn get_by_name(&self, project_code: &str, name: &str) -> Result<Option<Manifest>> {
        let t = self.tables.lock().unwrap();
        Ok(t.manifests
            .iter()
            .find(|m| m.project_code == project_code && m.name == name)
            .cloned())
    }

    async fn create(&self, req: CreateManifestRequest) -> Result<Manifest> {
        let mut t = self.tables.lock().unwrap();
        let manifest = Manifest {
            id: t.next_id(),
            name: req.name,
            project_code: req.project_code,
        };
        t.manifests.push(manifest.clone());
        Ok(manifest)
    }

    async fn update(&self, id: i64, req: UpdateManifestRequest) -> Result<Option<Manifest>> {
        let mut t = self.tables.lock().unwrap();
        let Some(m) = t.manifests.iter_mut().find(|m| m.id == id) else {
            return Ok(None);
        };
        if let Some(name) = req.name {
            m.name = name;
        }
        if let Some(code) = req.project_code {
            m.project_code = code;
        }
        Ok(Some(m.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut t = self.tables.lock().unwrap();
        let before = t.manifests.len();
        t.manifests.retain(|m| m.id != id);
        t.attributes.retain(|a| a.manifest_id != id);
        Ok(t.manifests.len() < before)
    }

    async fn import(&self, req: ImportManifestRequest) -> Result<ManifestDetail> {
        let mut t = self.tables.lock().unwrap();
        let id = t.next_id();
        t.manifests.push(Manifest {
            id,
            name: req.name,
            project_code: req.project_code.clone(),
        });
        for AttributeSpec {
            name,
            attr_type,
            value,
            optional,
        } in req.attributes
        {
            let attr_id = t.next_id();
            t.attributes.push(AttributeDefinition {
                id: attr_id,
                manifest_id: id,
                name,
                attr_type,
                value,
                project_code: req.project_code.clone(),
                optional,
            });
        }
        Ok(Self::detail(&t, id).expect("just inserted"))
    }
}

#[async_trait]
impl AttributeRepository for MemoryStore {
    async fn list_for_manifest(&self, manifest_id: i64) -> Result<Vec<AttributeDefinition>> {
        let t = self.tables.lock().unwrap();
        Ok(t.attributes
            .iter()
            .filter(|a| a.manifest_id == manifest_id)
            .cloned()
            .collect())
    }

    async fn get(&self, id: i64) -> Result<Option<AttributeDefinition>> {
        let t = self.tables.lock().unwrap();
        Ok(t.attributes.iter().find(|a| a.id == id).cloned())
    }

    async fn create_bulk(
        &self,
        reqs: Vec<CreateAttributeRequest>,
    ) -> Result<Vec<AttributeDefinition>> {
        let mut t = self.tables.lock().unwrap();
        let mut created = Vec::new();
        for req in reqs {
            let def = AttributeDefinition {
                id: t.next_id(),
                manifest_id: req.manifest_id,
                name: req.name,
                attr_type: req.attr_type,
                value: req.value,
                project_code: req.project_code,
                optional: req.optional,
            };
            t.attributes.push(def.clone());
            created.push(def);
        }
        Ok(created)
    }

    async fn update(
        &self,
        id: i64,
        req: UpdateAttributeRequest,
    ) -> Result<Option<AttributeDefinition>> {
        let mut t = self.tables.lock().unwrap();
        let Some(a) = t.attributes.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        if let Some(name) = req.name {
            a.name = name;
        }
        if let Some(value) = req.value {
            a.value = Some(value);
        }
        if let Some(optional) = req.optional {
            a.optional = optional;
        }
        if let Some(code) = req.project_code {
            a.project_code = code;
        }
        if let Some(raw) = req.attr_type {
            a.attr_type = raw
                .parse()
                .map_err(|_| entityinfo_core::Error::InvalidInput("Invalid type".into()))?;
        }
        Ok(Some(a.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut t = self.tables.lock().unwrap();
        let before = t.attributes.len();
        t.attributes.retain(|a| a.id != id);
        Ok(t.attributes.len() < before)
    }
}

#[async_trait]
impl WorkbenchRepository for MemoryStore {
    async fn list_for_project(&self, geid: &str) -> Result<Vec<WorkbenchEntry>> {
        let t = self.tables.lock().unwrap();
        Ok(t.workbench.iter().filter(|w| w.geid == geid).cloned().collect())
    }

    async fn exists(&self, geid: &str, resource: WorkbenchResource) -> Result<bool> {
        let t = self.tables.lock().unwrap();
        Ok(t
            .workbench
            .iter()
            .any(|w| w.geid == geid && w.workbench_resource == resource.as_str()))
    }

    async fn create(&self, entry: NewWorkbenchEntry) -> Result<WorkbenchEntry> {
        let mut t = self.tables.lock().unwrap();
        let row = WorkbenchEntry {
            id: t.next_id(),
            geid: entry.geid,
            project_code: entry.project_code,
            workbench_resource: entry.resource.as_str().to_string(),
            deployed: entry.deployed,
            deployed_date: entry.deployed.then(Utc::now),
            deployed_by: entry.deployed_by,
        };
        t.workbench.push(row.clone());
        Ok(row)
    }

    async fn delete(&self, geid: &str, id: i64) -> Result<bool> {
        let mut t = self.tables.lock().unwrap();
        let before = t.workbench.len();
        t.workbench.retain(|w| !(w.geid == geid && w.id == id));
        Ok(t.workbench.len() < before)
    }
}

/// Handler state over the in-memory store and the mock collaborators.
pub fn test_state(store: &MemoryStore, graph: &MockGraphStore, index: &MockSearchIndex) -> AppState {
    AppState::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(graph.clone()),
        Arc::new(index.clone()),
    )
}

pub fn file_json(id: i64, geid: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "labels": ["File", "Greenroom"],
        "global_entity_id": geid,
        "name": format!("{geid}.txt"),
        "archived": false
    })
}

pub fn folder_json(id: i64, geid: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "labels": ["Folder"],
        "global_entity_id": geid,
        "name": geid,
        "archived": false
    })
}
