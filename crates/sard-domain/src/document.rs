//! JSON:API document types.
//!
//! The [`Document`] envelope holds exactly one of `data` or `errors`;
//! the constructors make any other combination unrepresentable.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::query::PageMeta;

pub const JSONAPI_VERSION: &str = "1.0";

/// A bare `{type, id}` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

impl ResourceIdentifier {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }
}

/// Relationship linkage: a nullable single reference or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LinkageData {
    One(Option<ResourceIdentifier>),
    Many(Vec<ResourceIdentifier>),
}

impl LinkageData {
    /// Convert stored linkage into wire identifiers of the given
    /// target type.
    pub fn from_linkage(target: &str, linkage: &crate::entity::Linkage) -> Self {
        match linkage {
            crate::entity::Linkage::One(opt) => LinkageData::One(
                opt.as_ref()
                    .map(|id| ResourceIdentifier::new(target, id)),
            ),
            crate::entity::Linkage::Many(ids) => LinkageData::Many(
                ids.iter()
                    .map(|id| ResourceIdentifier::new(target, id))
                    .collect(),
            ),
        }
    }
}

/// `relationships[name]` value on a resource object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipObject {
    pub data: LinkageData,
}

/// A fully rendered resource.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceObject {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub relationships: IndexMap<String, RelationshipObject>,
}

/// Primary data: one resource, an ordered sequence, or bare linkage
/// (relationship-only documents).
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PrimaryData {
    One(ResourceObject),
    Many(Vec<ResourceObject>),
    Linkage(LinkageData),
}

/// `source` member of an error object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pointer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
}

impl ErrorSource {
    pub fn pointer(pointer: impl Into<String>) -> Self {
        Self {
            pointer: Some(pointer.into()),
            parameter: None,
        }
    }

    pub fn parameter(parameter: impl Into<String>) -> Self {
        Self {
            pointer: None,
            parameter: Some(parameter.into()),
        }
    }
}

/// One JSON:API error object.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorObject {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ErrorSource>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonApiObject {
    pub version: &'static str,
}

impl Default for JsonApiObject {
    fn default() -> Self {
        Self {
            version: JSONAPI_VERSION,
        }
    }
}

/// The top-level response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<PrimaryData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ErrorObject>>,
    pub meta: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub included: Vec<ResourceObject>,
    pub jsonapi: JsonApiObject,
}

impl Document {
    fn with_data(data: PrimaryData) -> Self {
        Self {
            data: Some(data),
            errors: None,
            meta: Map::new(),
            links: None,
            included: Vec::new(),
            jsonapi: JsonApiObject::default(),
        }
    }

    pub fn of_one(resource: ResourceObject) -> Self {
        Self::with_data(PrimaryData::One(resource))
    }

    pub fn of_many(resources: Vec<ResourceObject>) -> Self {
        Self::with_data(PrimaryData::Many(resources))
    }

    /// Relationship-only document: the data member is bare linkage.
    pub fn of_linkage(linkage: LinkageData) -> Self {
        Self::with_data(PrimaryData::Linkage(linkage))
    }

    pub fn of_errors(errors: Vec<ErrorObject>) -> Self {
        Self {
            data: None,
            errors: Some(errors),
            meta: Map::new(),
            links: None,
            included: Vec::new(),
            jsonapi: JsonApiObject::default(),
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }

    pub fn with_page_meta(mut self, page: PageMeta) -> Self {
        for (key, value) in page.to_map() {
            self.meta.insert(key, value);
        }
        self
    }

    pub fn with_included(mut self, included: Vec<ResourceObject>) -> Self {
        self.included = included;
        self
    }
}

// ---------------------------------------------------------------
// Incoming write payloads
// ---------------------------------------------------------------

/// `{data: {...}}` envelope for create/update requests.
#[derive(Debug, Clone, Deserialize)]
pub struct WriteDocument {
    pub data: WritePayload,
}

/// The `data` member of a write request.
#[derive(Debug, Clone, Deserialize)]
pub struct WritePayload {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub attributes: Option<Map<String, Value>>,
    #[serde(default)]
    pub relationships: Option<IndexMap<String, RelationshipObject>>,
}

/// `{data: {type,id} | [{type,id}] | null}` for relationship-change
/// endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct RelationshipDocument {
    pub data: LinkageData,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn data_and_errors_are_exclusive() {
        let doc = Document::of_one(ResourceObject {
            kind: "rescues".to_string(),
            id: "r1".to_string(),
            attributes: Map::new(),
            relationships: IndexMap::new(),
        });
        assert!(doc.data.is_some());
        assert!(doc.errors.is_none());

        let doc = Document::of_errors(vec![ErrorObject {
            status: "404".to_string(),
            code: None,
            title: "Not Found".to_string(),
            detail: None,
            source: None,
        }]);
        assert!(doc.data.is_none());
        assert!(doc.errors.is_some());
    }

    #[test]
    fn serialized_document_omits_absent_members() {
        let doc = Document::of_many(Vec::new());
        let value = serde_json::to_value(&doc).unwrap();
        let obj = value.as_object().unwrap();
        assert!(obj.contains_key("data"));
        assert!(!obj.contains_key("errors"));
        assert!(!obj.contains_key("included"));
        assert_eq!(value["jsonapi"]["version"], "1.0");
    }

    #[test]
    fn linkage_deserializes_all_shapes() {
        let one: LinkageData = serde_json::from_value(json!({"type": "rats", "id": "x"})).unwrap();
        assert!(matches!(one, LinkageData::One(Some(_))));

        let null: LinkageData = serde_json::from_value(json!(null)).unwrap();
        assert!(matches!(null, LinkageData::One(None)));

        let many: LinkageData =
            serde_json::from_value(json!([{"type": "rats", "id": "x"}])).unwrap();
        match many {
            LinkageData::Many(ids) => assert_eq!(ids.len(), 1),
            other => panic!("expected Many, got {other:?}"),
        }
    }

    #[test]
    fn write_document_parses_relationships() {
        let doc: WriteDocument = serde_json::from_value(json!({
            "data": {
                "type": "rescues",
                "attributes": {"client": "CMDR Jameson"},
                "relationships": {
                    "rats": {"data": [{"type": "rats", "id": "rat-1"}]}
                }
            }
        }))
        .unwrap();
        assert_eq!(doc.data.kind, "rescues");
        let rels = doc.data.relationships.unwrap();
        assert!(rels.contains_key("rats"));
    }

    #[test]
    fn page_meta_lands_in_meta() {
        let doc = Document::of_many(Vec::new()).with_page_meta(PageMeta {
            count: 1,
            limit: 25,
            offset: 0,
            total: 40,
        });
        assert_eq!(doc.meta["total"], json!(40));
        assert_eq!(doc.meta["limit"], json!(25));
    }
}
