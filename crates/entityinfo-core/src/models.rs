//! Core data models for EntityInfo.
//!
//! These types are shared across all EntityInfo crates and represent
//! manifests, attribute definitions, graph-store nodes, and the per-file
//! outcomes of an attribute attachment.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::{Error, Result};

/// Prefix of the graph-node property that stores an attribute value.
pub const ATTRIBUTE_PROPERTY_PREFIX: &str = "attr_";

/// Submitted attribute name → value pairs. `None` is an explicit JSON `null`.
pub type SubmittedAttributes = BTreeMap<String, Option<String>>;

/// Submitted values typed by their definitions. `None` clears the property.
pub type TypedAttributes = BTreeMap<String, Option<AttributeValue>>;

/// Read a client's attribute object. Values must be strings or `null`.
pub fn parse_submitted_attributes(raw: &Map<String, JsonValue>) -> Result<SubmittedAttributes> {
    raw.iter()
        .map(|(name, value)| match value {
            JsonValue::String(s) => Ok((name.clone(), Some(s.clone()))),
            JsonValue::Null => Ok((name.clone(), None)),
            _ => Err(Error::InvalidInput(format!(
                "Invalid value for attribute {}",
                name
            ))),
        })
        .collect()
}

// =============================================================================
// MANIFEST TYPES
// =============================================================================

/// Kind of value an attribute definition accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    /// Free text, at most 100 characters.
    #[default]
    Text,
    /// Exactly one token of a comma-separated choice set.
    MultipleChoice,
}

impl AttributeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::MultipleChoice => "multiple_choice",
        }
    }
}

impl std::fmt::Display for AttributeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AttributeType {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "multiple_choice" => Ok(Self::MultipleChoice),
            _ => Err(format!("Invalid attribute type: {}", s)),
        }
    }
}

/// A named, project-scoped metadata schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub id: i64,
    pub name: String,
    pub project_code: String,
}

/// One named, typed field within a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub id: i64,
    pub manifest_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub attr_type: AttributeType,
    /// Default text, or the comma-separated choice set for `multiple_choice`.
    pub value: Option<String>,
    pub project_code: String,
    pub optional: bool,
}

impl AttributeDefinition {
    /// Tokens of a `multiple_choice` value set.
    pub fn choices(&self) -> impl Iterator<Item = &str> {
        self.value.as_deref().unwrap_or_default().split(',')
    }

    pub fn is_required(&self) -> bool {
        !self.optional
    }
}

/// A manifest together with its attribute definitions in creation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestDetail {
    #[serde(flatten)]
    pub manifest: Manifest,
    pub attributes: Vec<AttributeDefinition>,
}

impl ManifestDetail {
    pub fn attribute(&self, name: &str) -> Option<&AttributeDefinition> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Portable form used by the export endpoint.
    pub fn export(&self) -> ManifestExport {
        ManifestExport {
            name: self.manifest.name.clone(),
            project_code: self.manifest.project_code.clone(),
            attributes: self
                .attributes
                .iter()
                .map(|a| AttributeSpec {
                    name: a.name.clone(),
                    attr_type: a.attr_type,
                    value: a.value.clone(),
                    optional: a.optional,
                })
                .collect(),
        }
    }
}

/// Request for creating a manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateManifestRequest {
    pub name: String,
    pub project_code: String,
}

/// Partial manifest update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateManifestRequest {
    pub name: Option<String>,
    pub project_code: Option<String>,
}

/// An attribute definition without identity, as imported or exported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub attr_type: AttributeType,
    pub value: Option<String>,
    pub optional: bool,
}

impl AttributeSpec {
    /// Parse one loosely-typed attribute item, reporting the first missing field.
    pub fn from_json(item: &JsonValue) -> Result<Self> {
        let name = required_str(item, "name")?;
        let attr_type = required_type(item)?;
        let value = optional_value(item)?;
        let optional = required_bool(item, "optional")?;
        Ok(Self {
            name,
            attr_type,
            value,
            optional,
        })
    }
}

/// Manifest plus attributes to create in one step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportManifestRequest {
    pub name: String,
    pub project_code: String,
    #[serde(default)]
    pub attributes: Vec<AttributeSpec>,
}

/// Export form of a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestExport {
    pub name: String,
    pub project_code: String,
    pub attributes: Vec<AttributeSpec>,
}

/// Request for creating a standalone attribute definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAttributeRequest {
    pub manifest_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub attr_type: AttributeType,
    pub value: Option<String>,
    pub optional: bool,
    pub project_code: String,
}

impl CreateAttributeRequest {
    /// Parse one loosely-typed bulk item, reporting the first missing field.
    pub fn from_json(item: &JsonValue) -> Result<Self> {
        let manifest_id = item
            .get("manifest_id")
            .ok_or_else(|| missing_field("manifest_id"))?;
        let manifest_id = manifest_id
            .as_i64()
            .or_else(|| manifest_id.as_str().and_then(|s| s.parse().ok()))
            .ok_or_else(|| Error::InvalidInput("Invalid manifest_id".to_string()))?;
        let name = required_str(item, "name")?;
        let attr_type = required_type(item)?;
        let value = optional_value(item)?;
        let optional = required_bool(item, "optional")?;
        let project_code = required_str(item, "project_code")?;
        Ok(Self {
            manifest_id,
            name,
            attr_type,
            value,
            optional,
            project_code,
        })
    }
}

/// Partial attribute update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAttributeRequest {
    pub name: Option<String>,
    pub value: Option<String>,
    pub optional: Option<bool>,
    pub project_code: Option<String>,
    #[serde(rename = "type")]
    pub attr_type: Option<String>,
}

fn missing_field(field: &str) -> Error {
    Error::InvalidInput(format!("Missing required field {}", field))
}

fn required_str(item: &JsonValue, field: &str) -> Result<String> {
    let value = item.get(field).ok_or_else(|| missing_field(field))?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidInput(format!("Field {} must be a string", field)))
}

fn required_bool(item: &JsonValue, field: &str) -> Result<bool> {
    let value = item.get(field).ok_or_else(|| missing_field(field))?;
    value
        .as_bool()
        .ok_or_else(|| Error::InvalidInput(format!("Field {} must be a boolean", field)))
}

fn required_type(item: &JsonValue) -> Result<AttributeType> {
    let raw = required_str(item, "type")?;
    raw.parse()
        .map_err(|_| Error::InvalidInput("Invalid type".to_string()))
}

fn optional_value(item: &JsonValue) -> Result<Option<String>> {
    match item.get("value") {
        None => Err(missing_field("value")),
        Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(Error::InvalidInput(
            "Field value must be a string".to_string(),
        )),
    }
}

// =============================================================================
// ATTRIBUTE VALUES
// =============================================================================

/// A submitted attribute value, typed by its definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    Text(String),
    Choice(String),
}

impl AttributeValue {
    /// Type a raw value using its definition; undefined names are text.
    pub fn typed(definition: Option<&AttributeDefinition>, raw: &str) -> Self {
        match definition.map(|d| d.attr_type) {
            Some(AttributeType::MultipleChoice) => Self::Choice(raw.to_string()),
            _ => Self::Text(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(v) | Self::Choice(v) => v,
        }
    }

    /// Value stored on the graph node property.
    pub fn graph_value(&self) -> JsonValue {
        JsonValue::String(self.as_str().to_string())
    }

    /// Value sent to the search index; choices are single-element lists.
    pub fn index_value(&self) -> JsonValue {
        match self {
            Self::Text(v) => JsonValue::String(v.clone()),
            Self::Choice(v) => JsonValue::Array(vec![JsonValue::String(v.clone())]),
        }
    }
}

/// Graph property value for a possibly-unset attribute.
pub fn graph_value_of(value: Option<&AttributeValue>) -> JsonValue {
    value.map_or(JsonValue::Null, AttributeValue::graph_value)
}

/// Name of the graph property holding the named attribute.
pub fn attribute_property(name: &str) -> String {
    format!("{}{}", ATTRIBUTE_PROPERTY_PREFIX, name)
}

// =============================================================================
// GRAPH STORE TYPES
// =============================================================================

/// Node labels the service queries in the graph store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeLabel {
    File,
    Folder,
    TrashFile,
    User,
    Container,
}

impl NodeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "File",
            Self::Folder => "Folder",
            Self::TrashFile => "TrashFile",
            Self::User => "User",
            Self::Container => "Container",
        }
    }
}

impl std::fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle stage of a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    /// Files landing in the project (graph label `Greenroom`).
    #[default]
    Intake,
    /// Reviewed files (graph label `Core`, formerly `VRECore`).
    Curated,
}

impl Zone {
    /// Zone marker carried on graph nodes.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Intake => "Greenroom",
            Self::Curated => "Core",
        }
    }

    /// Zone name as clients send it.
    pub fn param_name(&self) -> &'static str {
        match self {
            Self::Intake => "greenroom",
            Self::Curated => "core",
        }
    }

    /// Derive the zone from a node's labels. Nodes without an intake marker are curated.
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Self {
        if labels.iter().any(|l| l.as_ref() == "Greenroom") {
            Self::Intake
        } else {
            Self::Curated
        }
    }
}

impl std::str::FromStr for Zone {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "greenroom" | "intake" => Ok(Self::Intake),
            "core" | "vrecore" | "curated" => Ok(Self::Curated),
            _ => Err("Invalid zone".to_string()),
        }
    }
}

/// A node as returned by the graph-store proxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: i64,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub global_entity_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_id: Option<i64>,
    /// Every other property, including `attr_*` values.
    #[serde(flatten)]
    pub properties: Map<String, JsonValue>,
}

impl GraphNode {
    pub fn has_label(&self, label: NodeLabel) -> bool {
        self.labels.iter().any(|l| l == label.as_str())
    }

    pub fn is_file(&self) -> bool {
        self.has_label(NodeLabel::File)
    }

    pub fn is_folder(&self) -> bool {
        self.has_label(NodeLabel::Folder)
    }

    /// True when the node carries every label of a `Zone:Kind` expression.
    pub fn matches_labels(&self, expr: &str) -> bool {
        expr.split(':')
            .filter(|part| !part.is_empty())
            .all(|part| self.labels.iter().any(|l| l == part))
    }

    /// A string property, looking at the named fields first.
    pub fn str_property(&self, key: &str) -> Option<&str> {
        match key {
            "global_entity_id" => Some(&self.global_entity_id),
            "name" => Some(&self.name),
            _ => self.properties.get(key).and_then(JsonValue::as_str),
        }
    }
}

/// Start and end filters of a relation query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationFilter {
    pub start_params: JsonValue,
    /// End-label → property filters, with optional `partial` and `startswith` key lists.
    pub end_params: Map<String, JsonValue>,
}

/// One page of nodes related to a start node, as the v2 relation API takes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationQuery {
    pub start_label: String,
    pub end_labels: Vec<String>,
    pub query: RelationFilter,
    pub order_by: String,
    pub order_type: String,
    pub skip: i64,
    pub limit: i64,
}

/// A page of related nodes and the unpaged total.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationPage {
    #[serde(default)]
    pub results: Vec<GraphNode>,
    #[serde(default)]
    pub total: i64,
}

/// An ownership edge addressed by property match on both ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnRelation {
    pub start_params: JsonValue,
    pub end_params: JsonValue,
}

/// The subset of a File node the attribute workflow reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileNode {
    pub id: i64,
    pub global_entity_id: String,
    pub name: String,
    pub zone: Zone,
    pub archived: bool,
    pub manifest_id: Option<i64>,
    /// Attribute name → stored value, read from `attr_*` properties.
    pub attribute_values: BTreeMap<String, String>,
}

impl FileNode {
    pub fn is_attached(&self) -> bool {
        self.manifest_id.is_some()
    }
}

impl From<GraphNode> for FileNode {
    fn from(node: GraphNode) -> Self {
        let attribute_values = node
            .properties
            .iter()
            .filter_map(|(key, value)| {
                let name = key.strip_prefix(ATTRIBUTE_PROPERTY_PREFIX)?;
                let value = match value {
                    JsonValue::String(s) => s.clone(),
                    JsonValue::Null => return None,
                    other => other.to_string(),
                };
                Some((name.to_string(), value))
            })
            .collect();
        Self {
            zone: Zone::from_labels(&node.labels),
            id: node.id,
            global_entity_id: node.global_entity_id,
            name: node.name,
            archived: node.archived,
            manifest_id: node.manifest_id,
            attribute_values,
        }
    }
}

// =============================================================================
// ATTACHMENT TYPES
// =============================================================================

/// Outcome of an attachment attempt on one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    Succeed,
    Terminated,
}

/// Why an attachment attempt was terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachErrorType {
    /// The file already carries a manifest.
    AttributesDuplicate,
    /// A graph-store or index write failed.
    InternalError,
}

/// Per-file record returned by the attach endpoint. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentResult {
    pub name: String,
    pub geid: String,
    pub operation_status: OperationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<AttachErrorType>,
    /// Graph node was patched but the index write failed.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub index_stale: bool,
}

impl AttachmentResult {
    pub fn succeed(file: &FileNode) -> Self {
        Self {
            name: file.name.clone(),
            geid: file.global_entity_id.clone(),
            operation_status: OperationStatus::Succeed,
            error_type: None,
            index_stale: false,
        }
    }

    pub fn terminated(file: &FileNode, error_type: AttachErrorType) -> Self {
        Self {
            name: file.name.clone(),
            geid: file.global_entity_id.clone(),
            operation_status: OperationStatus::Terminated,
            error_type: Some(error_type),
            index_stale: false,
        }
    }

    pub fn index_stale(file: &FileNode) -> Self {
        Self {
            index_stale: true,
            ..Self::terminated(file, AttachErrorType::InternalError)
        }
    }

    pub fn is_success(&self) -> bool {
        self.operation_status == OperationStatus::Succeed
    }
}

// =============================================================================
// SEARCH INDEX TYPES
// =============================================================================

/// One attribute entry of an index document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedAttribute {
    pub attribute_name: String,
    /// Manifest name.
    pub name: String,
    pub value: JsonValue,
}

/// Fields replaced on the index document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedFields {
    pub attributes: Vec<IndexedAttribute>,
    /// Seconds since the Unix epoch.
    pub time_lastmodified: f64,
}

/// Body of `PUT /entity/file` on the search index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileAttributesUpdate {
    pub global_entity_id: String,
    pub updated_fields: IndexedFields,
}

impl FileAttributesUpdate {
    /// Build the index document for a file, skipping names the manifest does not define.
    pub fn new(
        global_entity_id: &str,
        manifest: &ManifestDetail,
        values: &TypedAttributes,
        modified_at: DateTime<Utc>,
    ) -> Self {
        let attributes = values
            .iter()
            .filter(|(name, _)| manifest.attribute(name).is_some())
            .map(|(name, value)| IndexedAttribute {
                attribute_name: name.clone(),
                name: manifest.manifest.name.clone(),
                value: value
                    .as_ref()
                    .map_or(JsonValue::Null, AttributeValue::index_value),
            })
            .collect();
        Self {
            global_entity_id: global_entity_id.to_string(),
            updated_fields: IndexedFields {
                attributes,
                time_lastmodified: modified_at.timestamp_millis() as f64 / 1000.0,
            },
        }
    }
}

/// A manifest attribute with a file's current value, for the manifest query endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileManifestAttribute {
    pub id: i64,
    pub name: String,
    pub manifest_name: String,
    pub value: String,
    #[serde(rename = "type")]
    pub attr_type: AttributeType,
    pub optional: bool,
    pub manifest_id: i64,
}

impl FileManifestAttribute {
    pub fn for_file(manifest: &ManifestDetail, file: &FileNode) -> Vec<Self> {
        manifest
            .attributes
            .iter()
            .map(|a| Self {
                id: a.id,
                name: a.name.clone(),
                manifest_name: manifest.manifest.name.clone(),
                value: file
                    .attribute_values
                    .get(&a.name)
                    .cloned()
                    .unwrap_or_default(),
                attr_type: a.attr_type,
                optional: a.optional,
                manifest_id: manifest.manifest.id,
            })
            .collect()
    }
}

// =============================================================================
// FOLDER TYPES
// =============================================================================

/// Ordering weight the listing endpoint gives folders.
pub const FOLDER_LIST_PRIORITY: i64 = 10;

/// Request for registering one folder node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateFolderRequest {
    /// Generated when absent.
    #[serde(default)]
    pub global_entity_id: Option<String>,
    pub folder_name: String,
    pub folder_level: i64,
    #[serde(default)]
    pub folder_parent_geid: String,
    #[serde(default)]
    pub folder_parent_name: String,
    pub uploader: String,
    /// Empty for a top-level folder.
    #[serde(default)]
    pub folder_relative_path: String,
    #[serde(default)]
    pub zone: String,
    pub project_code: String,
    #[serde(default)]
    pub folder_tags: Vec<String>,
    #[serde(default)]
    pub extra_labels: Vec<String>,
    #[serde(default)]
    pub extra_attrs: Map<String, JsonValue>,
}

impl CreateFolderRequest {
    /// `folder_relative_path/folder_name`, or the bare name at the top level.
    pub fn display_path(&self) -> String {
        let parent = self.folder_relative_path.trim_end_matches('/');
        if parent.is_empty() {
            self.folder_name.clone()
        } else {
            format!("{}/{}", parent, self.folder_name)
        }
    }

    /// Top-level folders are linked to their project, not to a parent folder.
    pub fn is_top_level(&self) -> bool {
        self.folder_relative_path.is_empty()
    }

    pub fn is_trashbin_root(&self) -> bool {
        self.extra_attrs
            .get("is_trashbin_root")
            .and_then(JsonValue::as_bool)
            .unwrap_or(false)
    }

    /// Graph node properties. `extra_attrs` are merged last and may override.
    pub fn node_properties(&self, geid: &str) -> Map<String, JsonValue> {
        let mut node = Map::new();
        node.insert("global_entity_id".into(), geid.into());
        node.insert("name".into(), self.folder_name.clone().into());
        node.insert("folder_level".into(), self.folder_level.into());
        node.insert(
            "folder_relative_path".into(),
            self.folder_relative_path.clone().into(),
        );
        node.insert("project_code".into(), self.project_code.clone().into());
        node.insert("tags".into(), self.folder_tags.clone().into());
        node.insert("list_priority".into(), FOLDER_LIST_PRIORITY.into());
        node.insert("uploader".into(), self.uploader.clone().into());
        node.insert("archived".into(), false.into());
        node.insert("display_path".into(), self.display_path().into());
        for (key, value) in &self.extra_attrs {
            node.insert(key.clone(), value.clone());
        }
        node
    }

    /// Search-index entry for the folder.
    pub fn index_document(&self, geid: &str, zone: Zone, at: DateTime<Utc>) -> FolderIndexDocument {
        let seconds = at.timestamp_millis() as f64 / 1000.0;
        FolderIndexDocument {
            global_entity_id: geid.to_string(),
            zone: zone.param_name().to_string(),
            data_type: "Folder".to_string(),
            operator: self.uploader.clone(),
            file_size: 0,
            tags: self.folder_tags.clone(),
            archived: false,
            location: String::new(),
            time_lastmodified: seconds,
            process_pipeline: String::new(),
            uploader: self.uploader.clone(),
            file_name: self.folder_name.clone(),
            time_created: seconds,
            atlas_guid: String::new(),
            display_path: self.display_path(),
            dcm_id: None,
            project_code: self.project_code.clone(),
            priority: FOLDER_LIST_PRIORITY,
        }
    }
}

fn default_link_container() -> bool {
    true
}

/// Folders registered together in one zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchCreateFoldersRequest {
    pub payload: Vec<CreateFolderRequest>,
    pub zone: String,
    /// Link each folder to its project container instead of indexing it.
    #[serde(default = "default_link_container")]
    pub link_container: bool,
}

/// Body of `POST /entity/file` for a folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderIndexDocument {
    pub global_entity_id: String,
    pub zone: String,
    pub data_type: String,
    pub operator: String,
    pub file_size: i64,
    pub tags: Vec<String>,
    pub archived: bool,
    pub location: String,
    pub time_lastmodified: f64,
    pub process_pipeline: String,
    pub uploader: String,
    pub file_name: String,
    pub time_created: f64,
    pub atlas_guid: String,
    pub display_path: String,
    pub dcm_id: Option<String>,
    pub project_code: String,
    pub priority: i64,
}

// =============================================================================
// STATISTICS TYPES
// =============================================================================

/// File operations counted from the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    DataUpload,
    DataDownload,
    DataTransfer,
}

impl AuditAction {
    pub const ALL: [AuditAction; 3] = [Self::DataUpload, Self::DataDownload, Self::DataTransfer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DataUpload => "data_upload",
            Self::DataDownload => "data_download",
            Self::DataTransfer => "data_transfer",
        }
    }
}

/// Query string of the audit-log total lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditLogQuery {
    pub project_code: String,
    pub action: AuditAction,
    pub start_date: i64,
    pub end_date: i64,
    pub resource: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    pub page_size: i64,
}

impl AuditLogQuery {
    /// File operations of a project in `[start_date, end_date]`; only the total is read.
    pub fn file_operations(
        project_code: &str,
        action: AuditAction,
        start_date: i64,
        end_date: i64,
        operator: Option<&str>,
    ) -> Self {
        Self {
            project_code: project_code.to_string(),
            action,
            start_date,
            end_date,
            resource: "file".to_string(),
            operator: operator.map(str::to_string),
            page_size: 1,
        }
    }
}

/// Per-project file counts for a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileStatistics {
    pub uploaded: i64,
    pub downloaded: i64,
    /// Transfers from intake to curated.
    pub approved: i64,
    pub greenroom: i64,
    pub core: i64,
    pub project_info: GraphNode,
}

// =============================================================================
// WORKBENCH TYPES
// =============================================================================

/// Analysis tools a project can book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkbenchResource {
    Guacamole,
    Superset,
    Jupyterhub,
}

impl WorkbenchResource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guacamole => "guacamole",
            Self::Superset => "superset",
            Self::Jupyterhub => "jupyterhub",
        }
    }
}

impl std::fmt::Display for WorkbenchResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkbenchResource {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "guacamole" => Ok(Self::Guacamole),
            "superset" => Ok(Self::Superset),
            "jupyterhub" => Ok(Self::Jupyterhub),
            _ => Err("Invalid workbench resource".to_string()),
        }
    }
}

/// A workbench booking row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkbenchEntry {
    pub id: i64,
    pub geid: String,
    pub project_code: String,
    pub workbench_resource: String,
    pub deployed: bool,
    pub deployed_date: Option<DateTime<Utc>>,
    pub deployed_by: String,
}

/// Body of the workbench creation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkbenchRequest {
    pub workbench_resource: String,
    #[serde(default)]
    pub deployed: bool,
    #[serde(default)]
    pub deployed_by: String,
}

/// A validated booking ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorkbenchEntry {
    pub geid: String,
    pub project_code: String,
    pub resource: WorkbenchResource,
    pub deployed: bool,
    pub deployed_by: String,
}
