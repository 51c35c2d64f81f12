//! Save documents and the two-pass restore.
//!
//! A [`SaveDocument`] lists every live entity with its old identifier, old
//! UUID and the persisted form of each of its components. Restoring a
//! document creates fresh pending entities, attaches the components that
//! parse, and only then rewrites cross references through the old-to-new
//! identifier tables, so a reference may point at an entity that appears
//! later in the same document.
//!
//! Components that fail to parse are logged and skipped; the rest of the
//! entity and the rest of the document still load.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::component::{Component, Remap};
use crate::entity::EntityId;
use crate::world::World;
use crate::{EcsError, EcsResult};

/// Current save document layout.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Document types
// ---------------------------------------------------------------------------

/// One saved entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    #[serde(rename = "oldId")]
    pub old_id: u64,
    #[serde(rename = "oldUuid")]
    pub old_uuid: Uuid,
    /// `{kind-name: {...}}` entries, kept raw so one bad entry cannot fail
    /// the whole document.
    #[serde(default)]
    pub components: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveDocument {
    pub format_version: u32,
    #[serde(rename = "Entities")]
    pub entities: Vec<EntityRecord>,
    /// Maps whose items have already been created.
    #[serde(rename = "MapsLoaded", default)]
    pub maps_loaded: BTreeSet<String>,
}

impl Default for SaveDocument {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            entities: Vec::new(),
            maps_loaded: BTreeSet::new(),
        }
    }
}

impl SaveDocument {
    pub fn from_json(json: &str) -> EcsResult<Self> {
        serde_json::from_str(json).map_err(|e| EcsError::MalformedDocument {
            details: e.to_string(),
        })
    }

    pub fn from_value(value: serde_json::Value) -> EcsResult<Self> {
        serde_json::from_value(value).map_err(|e| EcsError::MalformedDocument {
            details: e.to_string(),
        })
    }

    pub fn to_json(&self) -> EcsResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| EcsError::MalformedDocument {
            details: e.to_string(),
        })
    }

    pub fn to_value(&self) -> EcsResult<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| EcsError::MalformedDocument {
            details: e.to_string(),
        })
    }

    /// Bring an older document up to [`FORMAT_VERSION`].
    ///
    /// No layout change has happened yet, so this only stamps the version.
    pub fn upgrade(mut self) -> Self {
        if self.format_version < FORMAT_VERSION {
            tracing::info!(
                from = self.format_version,
                to = FORMAT_VERSION,
                "upgrading save document"
            );
            self.format_version = FORMAT_VERSION;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Restore report
// ---------------------------------------------------------------------------

/// A component entry that could not be restored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedComponent {
    pub old_id: u64,
    pub component: String,
    pub reason: String,
}

/// Outcome of [`World::read_document`].
#[derive(Debug, Clone, Default)]
pub struct RestoreReport {
    /// New pending entities, in document order.
    pub entities: Vec<EntityId>,
    pub skipped: Vec<SkippedComponent>,
    pub remap: Remap,
}

// ---------------------------------------------------------------------------
// World save/restore impl
// ---------------------------------------------------------------------------

impl World {
    /// Serialize every live entity, in live order.
    pub fn save_document(&self) -> EcsResult<SaveDocument> {
        let mut entities = Vec::with_capacity(self.live_count());
        for entity in self.live_entities() {
            let Some(old_uuid) = self.uuid(entity) else {
                return Err(EcsError::StaleEntity { entity });
            };
            let components = self
                .components_of(entity)
                .iter()
                .map(Component::to_document)
                .collect::<EcsResult<Vec<_>>>()?;
            entities.push(EntityRecord {
                old_id: entity.to_raw(),
                old_uuid,
                components,
            });
        }
        Ok(SaveDocument {
            format_version: FORMAT_VERSION,
            entities,
            maps_loaded: self.populated_maps().clone(),
        })
    }

    /// Create pending entities for every record in `document`.
    ///
    /// The entities are not added to the world; the caller adds the batch
    /// once it is ready for the managers to observe it.
    pub fn read_document(&mut self, document: SaveDocument) -> RestoreReport {
        let document = document.upgrade();
        let mut report = RestoreReport::default();

        // 1. Create every entity and attach the components that parse.
        for record in &document.entities {
            let entity = self.create_entity();
            report.remap.ids.insert(record.old_id, entity);
            if let Some(uuid) = self.uuid(entity) {
                report.remap.uuids.insert(record.old_uuid, uuid);
            }

            for value in &record.components {
                match Component::from_document(value) {
                    Ok(component) => self.store.insert_component(entity, component),
                    Err(err) => {
                        let component = match &err {
                            EcsError::UnknownComponent { name, .. } => name.clone(),
                            EcsError::ComponentDeserializationError { component, .. } => {
                                component.clone()
                            }
                            _ => String::from("<malformed>"),
                        };
                        tracing::warn!(
                            old_id = record.old_id,
                            component = %component,
                            error = %err,
                            "skipping component during restore"
                        );
                        report.skipped.push(SkippedComponent {
                            old_id: record.old_id,
                            component,
                            reason: err.to_string(),
                        });
                    }
                }
            }
            report.entities.push(entity);
        }

        // 2. Rewrite references now that every old identifier is known.
        for &entity in &report.entities {
            self.store.remap_entity(entity, &report.remap);
        }

        self.set_populated_maps(document.maps_loaded);

        tracing::info!(
            entities = report.entities.len(),
            skipped = report.skipped.len(),
            "read save document"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Owner, Sprite};

    #[test]
    fn missing_envelope_is_malformed() {
        assert!(matches!(
            SaveDocument::from_json("[1, 2, 3]"),
            Err(EcsError::MalformedDocument { .. })
        ));
    }

    #[test]
    fn maps_loaded_defaults_to_empty() {
        let doc = SaveDocument::from_json(r#"{"format_version": 1, "Entities": []}"#).unwrap();
        assert!(doc.maps_loaded.is_empty());
    }

    #[test]
    fn old_documents_are_upgraded() {
        let doc = SaveDocument {
            format_version: 0,
            ..SaveDocument::default()
        };
        assert_eq!(doc.upgrade().format_version, FORMAT_VERSION);
    }

    #[test]
    fn save_skips_pending_entities() {
        let mut world = World::new();
        let live = world.create_entity();
        world.insert(live, Sprite::named("rover_north")).unwrap();
        world.add_to_world(live).unwrap();
        let _pending = world.create_entity();

        let doc = world.save_document().unwrap();
        assert_eq!(doc.entities.len(), 1);
        assert_eq!(doc.entities[0].old_id, live.to_raw());
        assert_eq!(doc.entities[0].old_uuid, world.uuid(live).unwrap());
        assert_eq!(
            doc.entities[0].components[0]["cassini::Sprite"]["name"],
            "rover_north"
        );
    }

    #[test]
    fn bad_component_is_skipped_rest_loads() {
        let json = serde_json::json!({
            "format_version": 1,
            "Entities": [{
                "oldId": 5,
                "oldUuid": Uuid::from_u128(5),
                "components": [
                    {"cassini::Widget": {}},
                    {"cassini::Sprite": {"name": "rover_east"}},
                    {"cassini::Actions": {"direction": "sideways"}}
                ]
            }]
        });
        let mut world = World::new();
        let report = world.read_document(SaveDocument::from_value(json).unwrap());
        assert_eq!(report.entities.len(), 1);
        let e = report.entities[0];
        assert_eq!(world.get::<Sprite>(e).map(|s| s.name.as_str()), Some("rover_east"));
        let skipped: Vec<_> = report.skipped.iter().map(|s| s.component.as_str()).collect();
        assert_eq!(skipped, vec!["cassini::Widget", "cassini::Actions"]);
        assert!(!world.is_live(e));
    }

    #[test]
    fn owner_uuid_is_remapped() {
        let mut world = World::new();
        let owner = world.create_entity();
        let mask = world.create_entity();
        let owner_uuid = world.uuid(owner).unwrap();
        world.insert(mask, Owner::new(owner_uuid, "map_mask")).unwrap();
        world.add_batch(&[owner, mask]).unwrap();
        let doc = world.save_document().unwrap();

        let mut restored = World::with_seed(99);
        let report = restored.read_document(doc);
        let new_owner_uuid = restored.uuid(report.entities[0]).unwrap();
        let remapped = restored.get::<Owner>(report.entities[1]).unwrap();
        assert_eq!(remapped.owner_uuid, new_owner_uuid);
        assert_eq!(remapped.owner_old_uuid, Some(owner_uuid));
    }
}
