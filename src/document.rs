//! Serialized diff documents.
//!
//! A diff tree written as YAML or JSON, nested the way an OpenAPI document is.
//! Schema nodes may `$ref` a modified component schema; the reference becomes
//! a shared node in the [`SchemaGraph`], and references may form cycles.
//!
//! ```yaml
//! paths:
//!   /pets:
//!     post:
//!       operation_id: createPet
//!       request_body:
//!         application/json:
//!           schema:
//!             $ref: "#/components/schemas/Pet"
//! components:
//!   schemas:
//!     Pet:
//!       properties:
//!         age:
//!           deprecated: { from: false, to: true }
//!           extensions:
//!             x-stability-level: stable
//!             x-sunset: "2026-12-31"
//! ```

use crate::diff::{
    CompositionKind, ContentDiff, DeprecatedTransition, DiffReport, Metadata, NodeId,
    OperationDiff, PathDiff, SchemaDiffNode, SchemaGraph,
};
use crate::error::DiffTreeError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

const COMPONENT_REF_PREFIX: &str = "#/components/schemas/";

/// Root of a diff document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiffDocument {
    /// Modified paths, then methods
    #[serde(default)]
    pub paths: BTreeMap<String, BTreeMap<String, OperationDocument>>,

    #[serde(default)]
    pub components: ComponentsDocument,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentsDocument {
    /// Modified shared schemas
    #[serde(default)]
    pub schemas: BTreeMap<String, SchemaNodeDocument>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperationDocument {
    #[serde(default, alias = "operationId")]
    pub operation_id: Option<String>,

    /// Media type -> schema difference
    #[serde(default, alias = "requestBody")]
    pub request_body: Option<BTreeMap<String, MediaTypeDocument>>,

    /// Status -> media type -> schema difference
    #[serde(default)]
    pub responses: BTreeMap<String, BTreeMap<String, MediaTypeDocument>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MediaTypeDocument {
    #[serde(default)]
    pub schema: Option<SchemaNodeDocument>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaNodeDocument {
    #[serde(default, rename = "$ref")]
    pub reference: Option<String>,

    #[serde(default)]
    pub properties: BTreeMap<String, SchemaNodeDocument>,

    #[serde(default, alias = "allOf")]
    pub all_of: Vec<SchemaNodeDocument>,

    #[serde(default, alias = "oneOf")]
    pub one_of: Vec<SchemaNodeDocument>,

    #[serde(default, alias = "anyOf")]
    pub any_of: Vec<SchemaNodeDocument>,

    #[serde(default)]
    pub deprecated: Option<DeprecatedTransition>,

    #[serde(default)]
    pub extensions: Metadata,
}

impl SchemaNodeDocument {
    fn branches(&self, kind: CompositionKind) -> &[SchemaNodeDocument] {
        match kind {
            CompositionKind::AllOf => &self.all_of,
            CompositionKind::OneOf => &self.one_of,
            CompositionKind::AnyOf => &self.any_of,
        }
    }

    fn has_content(&self) -> bool {
        !self.properties.is_empty()
            || !self.all_of.is_empty()
            || !self.one_of.is_empty()
            || !self.any_of.is_empty()
            || self.deprecated.is_some()
            || !self.extensions.is_empty()
    }
}

impl DiffDocument {
    pub fn from_yaml(yaml: &str) -> Result<Self, DiffTreeError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_json(json: &str) -> Result<Self, DiffTreeError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build the diff tree, resolving every `$ref`.
    pub fn into_report(self) -> Result<DiffReport, DiffTreeError> {
        let mut lowering = Lowering::default();

        for name in self.components.schemas.keys() {
            let id = lowering.graph.reserve();
            lowering.components.insert(name.clone(), id);
        }

        for (name, schema) in &self.components.schemas {
            let location = format!("components.schemas.{}", name);
            let node = match &schema.reference {
                // A component that is only an alias behaves like a single allOf branch.
                Some(reference) => {
                    if schema.has_content() {
                        return Err(DiffTreeError::RefWithSiblings { location });
                    }
                    let target = lowering.resolve(reference, &location)?;
                    SchemaDiffNode::new().with_branch(CompositionKind::AllOf, target)
                }
                None => lowering.build(schema, &location)?,
            };
            let id = lowering.components[name];
            lowering.graph.replace(id, node);
        }

        let mut paths = BTreeMap::new();
        for (path, operations) in &self.paths {
            let mut path_diff = PathDiff::default();
            for (method, operation) in operations {
                let location = format!("paths.{}.{}", path, method);
                let op = lowering.operation(operation, &location)?;
                path_diff.operations.insert(method.to_uppercase(), op);
            }
            paths.insert(path.clone(), path_diff);
        }

        Ok(DiffReport {
            graph: lowering.graph,
            paths,
            components: lowering.components,
        })
    }
}

/// Read a diff document from disk. `.json` files are parsed as JSON, anything else as YAML.
pub fn load_diff(path: &Path) -> Result<DiffReport, DiffTreeError> {
    let content = std::fs::read_to_string(path)?;
    let document = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => DiffDocument::from_json(&content)?,
        _ => DiffDocument::from_yaml(&content)?,
    };
    document.into_report()
}

#[derive(Default)]
struct Lowering {
    graph: SchemaGraph,
    components: BTreeMap<String, NodeId>,
}

impl Lowering {
    fn operation(
        &mut self,
        doc: &OperationDocument,
        location: &str,
    ) -> Result<OperationDiff, DiffTreeError> {
        let request_body = doc
            .request_body
            .as_ref()
            .map(|content| self.content(content, &format!("{}.request_body", location)))
            .transpose()?;

        let mut responses = BTreeMap::new();
        for (status, content) in &doc.responses {
            let loc = format!("{}.responses.{}", location, status);
            responses.insert(status.clone(), self.content(content, &loc)?);
        }

        Ok(OperationDiff {
            operation_id: doc.operation_id.clone(),
            request_body,
            responses,
        })
    }

    fn content(
        &mut self,
        doc: &BTreeMap<String, MediaTypeDocument>,
        location: &str,
    ) -> Result<ContentDiff, DiffTreeError> {
        let mut content = ContentDiff::default();
        for (media_type, media) in doc {
            let root = media
                .schema
                .as_ref()
                .map(|schema| self.lower(schema, &format!("{}.{}", location, media_type)))
                .transpose()?;
            content.media_types.insert(media_type.clone(), root);
        }
        Ok(content)
    }

    fn lower(&mut self, doc: &SchemaNodeDocument, location: &str) -> Result<NodeId, DiffTreeError> {
        if let Some(reference) = &doc.reference {
            if doc.has_content() {
                return Err(DiffTreeError::RefWithSiblings {
                    location: location.to_string(),
                });
            }
            return self.resolve(reference, location);
        }
        let node = self.build(doc, location)?;
        Ok(self.graph.push(node))
    }

    fn build(
        &mut self,
        doc: &SchemaNodeDocument,
        location: &str,
    ) -> Result<SchemaDiffNode, DiffTreeError> {
        let mut node = SchemaDiffNode {
            deprecated: doc.deprecated,
            metadata: doc.extensions.clone(),
            ..SchemaDiffNode::default()
        };

        for (name, child) in &doc.properties {
            let id = self.lower(child, &format!("{}.properties.{}", location, name))?;
            node.properties.insert(name.clone(), id);
        }

        for kind in CompositionKind::ALL {
            for (i, branch) in doc.branches(kind).iter().enumerate() {
                let id = self.lower(branch, &format!("{}.{}[{}]", location, kind.as_str(), i))?;
                node = node.with_branch(kind, id);
            }
        }

        Ok(node)
    }

    fn resolve(&self, reference: &str, location: &str) -> Result<NodeId, DiffTreeError> {
        let name = reference
            .strip_prefix(COMPONENT_REF_PREFIX)
            .unwrap_or(reference);
        self.components
            .get(name)
            .copied()
            .ok_or_else(|| DiffTreeError::UnresolvedRef {
                reference: reference.to_string(),
                location: location.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PET_DIFF: &str = r##"
paths:
  /pets:
    post:
      operation_id: createPet
      request_body:
        application/json:
          schema:
            $ref: "#/components/schemas/Pet"
        text/plain: {}
      responses:
        "201":
          application/json:
            schema:
              properties:
                id: {}
components:
  schemas:
    Pet:
      properties:
        age:
          deprecated: { from: false, to: true }
          extensions:
            x-stability-level: stable
            x-sunset: "2026-12-31"
      allOf:
        - $ref: Named
    Named:
      properties:
        name: {}
"##;

    #[test]
    fn test_lowering_resolves_refs() {
        let report = DiffDocument::from_yaml(PET_DIFF)
            .unwrap()
            .into_report()
            .unwrap();

        let pet = report.components["Pet"];
        let named = report.components["Named"];
        let pet_node = report.graph.node(pet);
        assert_eq!(pet_node.all_of, vec![named]);

        let age = report.graph.node(pet_node.properties["age"]);
        assert!(age.deprecated.unwrap().is_newly_deprecated());
        assert_eq!(age.metadata["x-sunset"], "2026-12-31");

        let op = &report.paths["/pets"].operations["POST"];
        assert_eq!(op.operation_id.as_deref(), Some("createPet"));
        let request = op.request_body.as_ref().unwrap();
        assert_eq!(request.media_types["application/json"], Some(pet));
        assert_eq!(request.media_types["text/plain"], None);
        assert_eq!(op.responses["201"].schema_roots().len(), 1);
    }

    #[test]
    fn test_cyclic_refs_are_allowed() {
        let yaml = r#"
components:
  schemas:
    Tree:
      properties:
        children:
          allOf:
            - $ref: Tree
"#;
        let report = DiffDocument::from_yaml(yaml).unwrap().into_report().unwrap();
        let tree = report.components["Tree"];
        let children = report.graph.node(tree).properties["children"];
        assert_eq!(report.graph.node(children).all_of, vec![tree]);
    }

    #[test]
    fn test_alias_component() {
        let yaml = r##"
components:
  schemas:
    Animal:
      $ref: "#/components/schemas/Pet"
    Pet: {}
"##;
        let report = DiffDocument::from_yaml(yaml).unwrap().into_report().unwrap();
        let animal = report.graph.node(report.components["Animal"]);
        assert_eq!(animal.all_of, vec![report.components["Pet"]]);
    }

    #[test]
    fn test_unresolved_ref() {
        let yaml = r##"
components:
  schemas:
    Pet:
      allOf:
        - $ref: "#/components/schemas/Missing"
"##;
        let err = DiffDocument::from_yaml(yaml).unwrap().into_report().unwrap_err();
        match err {
            DiffTreeError::UnresolvedRef {
                reference,
                location,
            } => {
                assert_eq!(reference, "#/components/schemas/Missing");
                assert_eq!(location, "components.schemas.Pet.allOf[0]");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_ref_with_siblings_rejected() {
        let yaml = r#"
components:
  schemas:
    Pet:
      properties:
        owner:
          $ref: Owner
          deprecated: { to: true }
    Owner: {}
"#;
        let err = DiffDocument::from_yaml(yaml).unwrap().into_report().unwrap_err();
        assert!(matches!(err, DiffTreeError::RefWithSiblings { .. }));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(DiffDocument::from_yaml("paths: {}\nwebhooks: {}\n").is_err());
    }

    #[test]
    fn test_json_and_file_loading() {
        let json = r#"{"components": {"schemas": {"Pet": {"properties": {"age": {"deprecated": {"to": true}}}}}}}"#;
        let report = DiffDocument::from_json(json).unwrap().into_report().unwrap();
        assert_eq!(report.components.len(), 1);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diff.json");
        std::fs::write(&path, json).unwrap();
        let report = load_diff(&path).unwrap();
        assert!(!report.is_empty());

        assert!(matches!(
            load_diff(&dir.path().join("missing.yaml")),
            Err(DiffTreeError::Io(_))
        ));
    }
}
