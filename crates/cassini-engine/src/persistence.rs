//! Engine-level save, restore and state hashing.
//!
//! A restore always starts from an empty live set: every live entity is
//! removed, the document is read into fresh pending entities, the batch is
//! added to the world in one step and one zero-length tick runs so that every
//! system observes the restored state before the next real tick.
//!
//! # State hash
//!
//! [`Simulation::state_hash`] is a BLAKE3 hex digest of the live document
//! with entity ids and UUIDs replaced by each entity's position in the
//! document. Two simulations that differ only in how their entities happen
//! to be numbered hash identically:
//!
//! ```
//! use cassini_engine::prelude::*;
//!
//! let mut a = Simulation::new(SimConfig::default(), InMemoryMapSource::new());
//! let config = SimConfig { uuid_seed: 7, ..SimConfig::default() };
//! let mut b = Simulation::new(config, InMemoryMapSource::new());
//! a.new_game().unwrap();
//! b.new_game().unwrap();
//! assert_eq!(a.state_hash().unwrap(), b.state_hash().unwrap());
//! ```

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use cassini_ecs::components::actions::action_id;
use cassini_ecs::prelude::*;
use serde_json::Value;

use crate::error::EngineResult;
use crate::factory::{create_local_player, create_remote_player};
use crate::map::MapSource;
use crate::tick::Simulation;

/// Player ids of a new game: one local player followed by remote ones.
pub const LOCAL_PLAYER_ID: u32 = 1;
pub const REMOTE_PLAYER_IDS: [u32; 3] = [2, 3, 4];

const UUID_LEN: usize = 36;

impl<M: MapSource> Simulation<M> {
    /// Serialize every live entity.
    pub fn save_document(&self) -> EngineResult<SaveDocument> {
        Ok(self.world().save_document()?)
    }

    /// Replace the live world with the contents of `document`.
    ///
    /// Components that cannot be read are skipped and listed in the report;
    /// the rest of the document still loads.
    pub fn restore_document(&mut self, document: SaveDocument) -> EngineResult<RestoreReport> {
        // 1. Start from an empty live set.
        let removed = self.world_mut().remove_all_live();

        // 2. Two-pass read into pending entities.
        let report = self.world_mut().read_document(document);

        // 3. Managers observe the whole batch at once.
        self.world_mut().add_batch(&report.entities)?;

        // 4. One synchronous tick so systems see the restored state.
        self.tick_with_delta(0.0);

        tracing::info!(
            removed,
            restored = report.entities.len(),
            skipped = report.skipped.len(),
            "restored save document"
        );
        Ok(report)
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let json = self.save_document()?.to_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write save file {}", path.display()))
    }

    pub fn load_from_path(&mut self, path: impl AsRef<Path>) -> anyhow::Result<RestoreReport> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read save file {}", path.display()))?;
        let document = SaveDocument::from_json(&json)
            .with_context(|| format!("failed to parse save file {}", path.display()))?;
        self.restore_document(document)
            .with_context(|| format!("failed to restore save file {}", path.display()))
    }

    /// BLAKE3 hex digest of the live state, independent of entity numbering.
    pub fn state_hash(&self) -> EngineResult<String> {
        let canonical = canonical_document(&self.save_document()?)?;
        let bytes = serde_json::to_vec(&canonical).map_err(|e| EcsError::MalformedDocument {
            details: e.to_string(),
        })?;
        Ok(blake3::hash(&bytes).to_hex().to_string())
    }

    /// Clear the live world and start a game with one local and three
    /// remote players. Returns the players in id order.
    pub fn new_game(&mut self) -> EngineResult<Vec<EntityId>> {
        let world = self.world_mut();
        world.remove_all_live();
        world.clear_populated_maps();

        let config = self.config().clone();
        let world = self.world_mut();
        let mut players = vec![create_local_player(world, &config, LOCAL_PLAYER_ID)?];
        for id in REMOTE_PLAYER_IDS {
            players.push(create_remote_player(world, &config, id)?);
        }
        world.add_batch(&players)?;
        self.tick_with_delta(0.0);

        tracing::info!(players = players.len(), map = %config.default_map, "started new game");
        Ok(players)
    }
}

// ---------------------------------------------------------------------------
// Canonical form
// ---------------------------------------------------------------------------

/// `document` as JSON with every entity id and UUID replaced by the owning
/// entity's position in the document.
pub fn canonical_document(document: &SaveDocument) -> EngineResult<Value> {
    let ids: HashMap<u64, usize> = document
        .entities
        .iter()
        .enumerate()
        .map(|(i, record)| (record.old_id, i))
        .collect();
    let uuids: HashMap<String, usize> = document
        .entities
        .iter()
        .enumerate()
        .map(|(i, record)| (record.old_uuid.to_string(), i))
        .collect();

    let mut value = document.to_value()?;
    if let Some(entities) = value.get_mut("Entities").and_then(Value::as_array_mut) {
        for (i, entity) in entities.iter_mut().enumerate() {
            entity["oldId"] = Value::from(i);
            entity["oldUuid"] = Value::from(format!("#{i}"));
            if let Some(components) = entity.get_mut("components").and_then(Value::as_array_mut) {
                for component in components {
                    canonical_action_targets(component, &ids);
                }
            }
        }
    }
    canonical_uuids(&mut value, &uuids);
    Ok(value)
}

fn canonical_action_targets(component: &mut Value, ids: &HashMap<u64, usize>) {
    let Some(events) = component
        .pointer_mut("/cassini::Actions/events")
        .and_then(Value::as_array_mut)
    else {
        return;
    };
    for event in events {
        let is_item = event["id"]
            .as_i64()
            .is_some_and(|id| (action_id::GRAB as i64..=action_id::DELIVER as i64).contains(&id));
        if !is_item {
            continue;
        }
        let target = event["target"].as_u64().and_then(|t| ids.get(&t)).copied();
        if let Some(index) = target {
            event["target"] = Value::from(format!("#{index}"));
        }
    }
}

fn canonical_uuids(value: &mut Value, uuids: &HashMap<String, usize>) {
    match value {
        Value::String(s) => {
            if let Some(replaced) = replace_uuids(s, uuids) {
                *s = replaced;
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|v| canonical_uuids(v, uuids)),
        Value::Object(map) => map.values_mut().for_each(|v| canonical_uuids(v, uuids)),
        _ => {}
    }
}

/// `s` with every embedded known UUID replaced by `#index`, or `None` if it
/// contains none.
fn replace_uuids(s: &str, uuids: &HashMap<String, usize>) -> Option<String> {
    if s.len() < UUID_LEN {
        return None;
    }
    let mut out = String::with_capacity(s.len());
    let mut copied = 0;
    let mut i = 0;
    while i + UUID_LEN <= s.len() {
        let candidate = s.get(i..i + UUID_LEN);
        if let Some(index) = candidate.and_then(|c| uuids.get(c)) {
            out.push_str(&s[copied..i]);
            out.push_str(&format!("#{index}"));
            i += UUID_LEN;
            copied = i;
        } else {
            i += 1;
        }
    }
    if copied == 0 {
        return None;
    }
    out.push_str(&s[copied..]);
    Some(out)
}
