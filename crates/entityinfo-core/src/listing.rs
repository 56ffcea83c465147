//! Paged listing of the files and folders under a project, folder, or
//! collection.
//!
//! [`ListingParams`] is the client's query string. It turns into a
//! [`RelationQuery`] for the graph store's v2 relation API: the start node
//! is the container being listed, the end labels depend on the source
//! type and zone, and the client's filters are narrowed per end label to
//! the fields that label supports.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::{Error, Result};
use crate::models::{RelationFilter, RelationQuery};

/// Filter key that restricts a listing to one user's display path.
pub const PERMISSIONS_PATH_KEY: &str = "permissions_display_path";

/// What kind of container is being listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    Project,
    Folder,
    TrashFile,
    Collection,
}

impl SourceType {
    /// Graph label of the start node.
    pub fn start_label(&self) -> &'static str {
        match self {
            Self::Project | Self::TrashFile => "Container",
            Self::Folder => "Folder",
            Self::Collection => "VirtualFolder",
        }
    }
}

impl FromStr for SourceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Project" => Ok(Self::Project),
            "Folder" => Ok(Self::Folder),
            "TrashFile" => Ok(Self::TrashFile),
            "Collection" => Ok(Self::Collection),
            _ => Err(Error::InvalidInput("Invalid source_type".to_string())),
        }
    }
}

/// Zone filter of a listing. `All` lists both zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingZone {
    Greenroom,
    Core,
    All,
}

impl ListingZone {
    fn prefix(&self) -> &'static str {
        match self {
            Self::Greenroom => "Greenroom:",
            Self::Core => "Core:",
            Self::All => "",
        }
    }
}

impl FromStr for ListingZone {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Greenroom" => Ok(Self::Greenroom),
            "Core" => Ok(Self::Core),
            "All" => Ok(Self::All),
            _ => Err(Error::InvalidInput("Invalid zone".to_string())),
        }
    }
}

/// End labels to list for a source and zone.
pub fn end_labels(source: SourceType, zone: ListingZone) -> Vec<String> {
    let prefix = zone.prefix();
    let kinds: &[&str] = match source {
        SourceType::TrashFile if zone == ListingZone::All => {
            return ["Core:TrashFile", "Greenroom:TrashFile", "Core:Folder", "Greenroom:Folder"]
                .iter()
                .map(|l| l.to_string())
                .collect();
        }
        SourceType::TrashFile => &["TrashFile", "Folder"],
        SourceType::Folder => &["File", "Folder", "TrashFile"],
        SourceType::Project | SourceType::Collection => &["File", "Folder"],
    };
    kinds.iter().map(|k| format!("{}{}", prefix, k)).collect()
}

fn filterable_fields(kind: &str) -> &'static [&'static str] {
    match kind {
        "Folder" => &["name", "uploader", "folder_level", "archived"],
        "File" | "TrashFile" => &["name", "uploader", "archived"],
        _ => &[],
    }
}

fn push_key(filter: &mut Map<String, JsonValue>, list: &str, key: &str) {
    let entry = filter
        .entry(list.to_string())
        .or_insert_with(|| JsonValue::Array(Vec::new()));
    if let JsonValue::Array(keys) = entry {
        keys.push(key.into());
    }
}

/// Per-label end filters built from the client's query.
///
/// Keys a label does not support are dropped for that label. Keys listed in
/// `partial` match by substring. [`PERMISSIONS_PATH_KEY`] becomes a
/// `display_path` prefix match on every label except `Core:TrashFile`.
/// Listing the trash bin selects folders by `in_trashbin` instead of
/// `archived`.
pub fn end_filters(
    labels: &[String],
    query: &Map<String, JsonValue>,
    partial: &[String],
    source: SourceType,
) -> Map<String, JsonValue> {
    let mut filters = Map::new();
    for label in labels {
        let kind = label.rsplit(':').next().unwrap_or(label);
        let allowed = filterable_fields(kind);
        let mut filter = Map::new();

        for (key, value) in query {
            if allowed.contains(&key.as_str()) {
                filter.insert(key.clone(), value.clone());
                if partial.iter().any(|p| p == key) {
                    push_key(&mut filter, "partial", key);
                }
            } else if key == PERMISSIONS_PATH_KEY && label != "Core:TrashFile" {
                // Trailing slash keeps "user1" from matching "user11".
                let prefix = format!("{}/", value.as_str().unwrap_or_default());
                filter.insert("display_path".into(), prefix.into());
                filter.insert("startswith".into(), JsonValue::Array(vec!["display_path".into()]));
            }
        }

        if source == SourceType::TrashFile && kind == "Folder" {
            filter.insert("in_trashbin".into(), true.into());
            filter.remove("archived");
        }
        filters.insert(label.clone(), JsonValue::Object(filter));
    }
    filters
}

fn default_page_size() -> i64 {
    25
}

fn default_order_type() -> String {
    "asc".to_string()
}

fn default_order_by() -> String {
    "time_created".to_string()
}

/// Query string of the file listing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingParams {
    #[serde(default)]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    #[serde(default = "default_order_type")]
    pub order_type: String,
    #[serde(default = "default_order_by")]
    pub order_by: String,
    pub source_type: String,
    pub zone: String,
    /// JSON array of filter keys that match by substring.
    #[serde(default)]
    pub partial: String,
    /// JSON object of filters.
    #[serde(default)]
    pub query: String,
}

impl ListingParams {
    /// Validate the parameters and build the relation query for `geid`.
    pub fn relation_query(&self, geid: &str) -> Result<RelationQuery> {
        if !matches!(self.order_type.to_lowercase().as_str(), "asc" | "desc") {
            return Err(Error::InvalidInput("Invalid order_type".to_string()));
        }
        let valid_order_by = !self.order_by.is_empty()
            && self
                .order_by
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_order_by {
            return Err(Error::InvalidInput("Invalid order_by".to_string()));
        }
        if self.page < 0 {
            return Err(Error::InvalidInput("Invalid page".to_string()));
        }
        if self.page_size < 1 {
            return Err(Error::InvalidInput("Invalid page_size".to_string()));
        }

        let partial: Vec<String> = if self.partial.is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&self.partial)
                .map_err(|_| Error::InvalidInput("Invalid partial".to_string()))?
        };
        let query: Map<String, JsonValue> = if self.query.is_empty() {
            Map::new()
        } else {
            serde_json::from_str(&self.query)
                .map_err(|_| Error::InvalidInput("Invalid query".to_string()))?
        };

        let source: SourceType = self.source_type.parse()?;
        let zone: ListingZone = self.zone.parse()?;
        let labels = end_labels(source, zone);
        let end_params = end_filters(&labels, &query, &partial, source);

        Ok(RelationQuery {
            start_label: source.start_label().to_string(),
            end_labels: labels,
            query: RelationFilter {
                start_params: serde_json::json!({ "global_entity_id": geid }),
                end_params,
            },
            order_by: format!("list_priority ASC,end_node.{}", self.order_by),
            order_type: self.order_type.clone(),
            skip: self.page * self.page_size,
            limit: self.page_size,
        })
    }

    /// Pages needed for `total` results.
    pub fn num_of_pages(&self, total: i64) -> i64 {
        if self.page_size < 1 {
            return 0;
        }
        (total + self.page_size - 1) / self.page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(source_type: &str, zone: &str) -> ListingParams {
        ListingParams {
            page: 0,
            page_size: 25,
            order_type: "asc".to_string(),
            order_by: "time_created".to_string(),
            source_type: source_type.to_string(),
            zone: zone.to_string(),
            partial: String::new(),
            query: String::new(),
        }
    }

    #[test]
    fn test_end_labels() {
        assert_eq!(
            end_labels(SourceType::Project, ListingZone::Greenroom),
            vec!["Greenroom:File", "Greenroom:Folder"]
        );
        assert_eq!(
            end_labels(SourceType::Folder, ListingZone::Core),
            vec!["Core:File", "Core:Folder", "Core:TrashFile"]
        );
        assert_eq!(
            end_labels(SourceType::TrashFile, ListingZone::All),
            vec!["Core:TrashFile", "Greenroom:TrashFile", "Core:Folder", "Greenroom:Folder"]
        );
        assert_eq!(
            end_labels(SourceType::TrashFile, ListingZone::Core),
            vec!["Core:TrashFile", "Core:Folder"]
        );
        assert_eq!(end_labels(SourceType::Collection, ListingZone::All), vec!["File", "Folder"]);
    }

    #[test]
    fn test_end_filters_keep_supported_fields_per_label() {
        let labels = end_labels(SourceType::Project, ListingZone::Greenroom);
        let query = json!({"name": "scan", "folder_level": 1, "size": 10})
            .as_object()
            .cloned()
            .unwrap();
        let filters = end_filters(&labels, &query, &["name".to_string()], SourceType::Project);

        assert_eq!(filters["Greenroom:File"], json!({"name": "scan", "partial": ["name"]}));
        assert_eq!(
            filters["Greenroom:Folder"],
            json!({"name": "scan", "folder_level": 1, "partial": ["name"]})
        );
    }

    #[test]
    fn test_permissions_path_becomes_prefix_match() {
        let labels = end_labels(SourceType::TrashFile, ListingZone::All);
        let query = json!({"permissions_display_path": "alice"}).as_object().cloned().unwrap();
        let filters = end_filters(&labels, &query, &[], SourceType::TrashFile);

        assert_eq!(filters["Greenroom:TrashFile"]["display_path"], "alice/");
        assert_eq!(filters["Greenroom:TrashFile"]["startswith"], json!(["display_path"]));
        assert!(filters["Core:TrashFile"].get("display_path").is_none());
    }

    #[test]
    fn test_trash_listing_selects_folders_by_trashbin_flag() {
        let labels = end_labels(SourceType::TrashFile, ListingZone::Core);
        let query = json!({"archived": true}).as_object().cloned().unwrap();
        let filters = end_filters(&labels, &query, &[], SourceType::TrashFile);

        assert_eq!(filters["Core:Folder"], json!({"in_trashbin": true}));
        assert_eq!(filters["Core:TrashFile"], json!({"archived": true}));
    }

    #[test]
    fn test_relation_query_paging_and_order() {
        let mut p = params("Folder", "Greenroom");
        p.page = 2;
        p.page_size = 10;
        p.order_by = "name".to_string();
        p.query = r#"{"uploader":"alice"}"#.to_string();
        let q = p.relation_query("g-1").unwrap();

        assert_eq!(q.start_label, "Folder");
        assert_eq!(q.query.start_params, json!({"global_entity_id": "g-1"}));
        assert_eq!(q.order_by, "list_priority ASC,end_node.name");
        assert_eq!(q.skip, 20);
        assert_eq!(q.limit, 10);
        assert_eq!(q.query.end_params["Greenroom:File"], json!({"uploader": "alice"}));
    }

    #[test]
    fn test_relation_query_rejects_bad_parameters() {
        let cases = [
            ("order_type", "sideways", "Invalid order_type"),
            ("order_by", "name DESC; MATCH", "Invalid order_by"),
            ("source_type", "Dataset", "Invalid source_type"),
            ("zone", "vrecore", "Invalid zone"),
            ("query", "{not json", "Invalid query"),
            ("partial", "name", "Invalid partial"),
            ("page_size", "0", "Invalid page_size"),
        ];
        for (field, value, message) in cases {
            let mut p = params("Project", "All");
            match field {
                "order_type" => p.order_type = value.to_string(),
                "order_by" => p.order_by = value.to_string(),
                "source_type" => p.source_type = value.to_string(),
                "zone" => p.zone = value.to_string(),
                "query" => p.query = value.to_string(),
                "partial" => p.partial = value.to_string(),
                _ => p.page_size = value.parse().unwrap(),
            }
            match p.relation_query("g") {
                Err(Error::InvalidInput(msg)) => assert_eq!(msg, message, "{}", field),
                other => panic!("{}: expected InvalidInput, got {:?}", field, other),
            }
        }
    }

    #[test]
    fn test_order_type_is_case_insensitive() {
        let mut p = params("Project", "Core");
        p.order_type = "DESC".to_string();
        assert_eq!(p.relation_query("g").unwrap().order_type, "DESC");
    }

    #[test]
    fn test_num_of_pages() {
        let p = params("Project", "Core");
        assert_eq!(p.num_of_pages(0), 0);
        assert_eq!(p.num_of_pages(25), 1);
        assert_eq!(p.num_of_pages(26), 2);
    }
}
