//! Component kinds, the [`Component`] sum type and the typed component store.
//!
//! The set of component kinds is closed. Each kind has a stable persisted
//! name (`cassini::<Kind>`), a variant in [`Component`], a table in
//! [`ComponentStore`] and a [`ComponentData`] impl that gives typed access to
//! that table. Adding a kind means adding one line to the `components!`
//! invocation below.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::components::{
    ActionQueue, Camera, Groups, InputState, Location, Owner, Property, Sprite, TileMap, Viewport,
};
use crate::entity::EntityId;
use crate::storage::ComponentTable;
use crate::{EcsError, EcsResult};

// ---------------------------------------------------------------------------
// Remap tables
// ---------------------------------------------------------------------------

/// Old-to-new identifier tables built while restoring a save document.
#[derive(Debug, Clone, Default)]
pub struct Remap {
    /// Raw old entity id (`oldId`) to the freshly created entity.
    pub ids: HashMap<u64, EntityId>,
    pub uuids: HashMap<Uuid, Uuid>,
}

// ---------------------------------------------------------------------------
// ComponentData
// ---------------------------------------------------------------------------

/// Typed access to the table that stores one component kind.
pub trait ComponentData: Clone + fmt::Debug + Sized + 'static {
    const KIND: ComponentKind;

    fn table(store: &ComponentStore) -> &ComponentTable<Self>;
    fn table_mut(store: &mut ComponentStore) -> &mut ComponentTable<Self>;
    fn into_component(self) -> Component;
}

macro_rules! components {
    ($($variant:ident($ty:ty) => $field:ident, $name:literal;)+) => {
        /// Discriminator of the closed component set.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum ComponentKind {
            $($variant),+
        }

        impl ComponentKind {
            pub const ALL: &'static [ComponentKind] = &[$(ComponentKind::$variant),+];

            /// Persisted kind name.
            pub fn name(self) -> &'static str {
                match self {
                    $(ComponentKind::$variant => $name),+
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(ComponentKind::$variant),)+
                    _ => None,
                }
            }
        }

        /// A component value of any kind.
        ///
        /// Serializes externally tagged by kind name:
        /// `{"cassini::Location": {...}}`.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub enum Component {
            $(
                #[serde(rename = $name)]
                $variant($ty),
            )+
        }

        impl Component {
            pub fn kind(&self) -> ComponentKind {
                match self {
                    $(Component::$variant(_) => ComponentKind::$variant),+
                }
            }
        }

        /// One [`ComponentTable`] per kind.
        #[derive(Debug, Default)]
        pub struct ComponentStore {
            $($field: ComponentTable<$ty>,)+
        }

        impl ComponentStore {
            /// Store `component` for `entity`, replacing any value of the same kind.
            pub fn insert_component(&mut self, entity: EntityId, component: Component) {
                match component {
                    $(Component::$variant(value) => {
                        self.$field.insert(entity, value);
                    })+
                }
            }

            pub fn remove_kind(&mut self, entity: EntityId, kind: ComponentKind) -> Option<Component> {
                match kind {
                    $(ComponentKind::$variant => self.$field.remove(entity).map(Component::$variant),)+
                }
            }

            pub fn has_kind(&self, entity: EntityId, kind: ComponentKind) -> bool {
                match kind {
                    $(ComponentKind::$variant => self.$field.contains(entity),)+
                }
            }

            /// Clones of every component attached to `entity`, in kind order.
            pub fn components_of(&self, entity: EntityId) -> Vec<Component> {
                let mut out = Vec::new();
                $(
                    if let Some(value) = self.$field.get(entity) {
                        out.push(Component::$variant(value.clone()));
                    }
                )+
                out
            }

            /// Drop every component attached to `entity`.
            pub fn clear_entity(&mut self, entity: EntityId) {
                $(self.$field.remove(entity);)+
            }
        }

        $(
            impl ComponentData for $ty {
                const KIND: ComponentKind = ComponentKind::$variant;

                fn table(store: &ComponentStore) -> &ComponentTable<Self> {
                    &store.$field
                }

                fn table_mut(store: &mut ComponentStore) -> &mut ComponentTable<Self> {
                    &mut store.$field
                }

                fn into_component(self) -> Component {
                    Component::$variant(self)
                }
            }
        )+
    };
}

components! {
    Location(Location) => locations, "cassini::Location";
    Sprite(Sprite) => sprites, "cassini::Sprite";
    Camera(Camera) => cameras, "cassini::Camera";
    Map(TileMap) => maps, "cassini::Map";
    Groups(Groups) => groups, "cassini::Groups";
    Owner(Owner) => owners, "cassini::Owner";
    Input(InputState) => inputs, "cassini::Input";
    Actions(ActionQueue) => actions, "cassini::Actions";
    Viewport(Viewport) => viewports, "cassini::Viewport";
    Property(Property) => properties, "cassini::Property";
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl ComponentStore {
    pub fn get<T: ComponentData>(&self, entity: EntityId) -> Option<&T> {
        T::table(self).get(entity)
    }

    pub fn get_mut<T: ComponentData>(&mut self, entity: EntityId) -> Option<&mut T> {
        T::table_mut(self).get_mut(entity)
    }

    pub fn insert<T: ComponentData>(&mut self, entity: EntityId, value: T) -> Option<T> {
        T::table_mut(self).insert(entity, value)
    }

    pub fn remove<T: ComponentData>(&mut self, entity: EntityId) -> Option<T> {
        T::table_mut(self).remove(entity)
    }

    pub fn has<T: ComponentData>(&self, entity: EntityId) -> bool {
        T::table(self).contains(entity)
    }

    /// Run the post-load fixup hooks on every component of `entity`.
    pub fn remap_entity(&mut self, entity: EntityId, remap: &Remap) {
        if let Some(owner) = self.get_mut::<Owner>(entity) {
            owner.remap_uuids(&remap.uuids);
        }
        if let Some(queue) = self.get_mut::<ActionQueue>(entity) {
            queue.remap_items(&remap.ids);
        }
    }
}

// ---------------------------------------------------------------------------
// Persisted form
// ---------------------------------------------------------------------------

impl Component {
    /// Serialize to the `{kind-name: {...}}` document form.
    pub fn to_document(&self) -> EcsResult<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| EcsError::ComponentSerializationError {
            component: self.kind().name().to_owned(),
            details: e.to_string(),
        })
    }

    /// Parse one `{kind-name: {...}}` entry.
    ///
    /// An unknown kind name yields [`EcsError::UnknownComponent`]; a known
    /// kind with bad fields yields [`EcsError::ComponentDeserializationError`].
    pub fn from_document(value: &serde_json::Value) -> EcsResult<Component> {
        let object = value.as_object().filter(|o| o.len() == 1).ok_or_else(|| {
            EcsError::MalformedComponent {
                details: format!("expected an object with exactly one kind key, got {value}"),
            }
        })?;
        let name = object.keys().next().map(String::as_str).unwrap_or_default();
        let kind = ComponentKind::from_name(name).ok_or_else(|| EcsError::UnknownComponent {
            name: name.to_owned(),
            registered: ComponentKind::ALL
                .iter()
                .map(|k| k.name())
                .collect::<Vec<_>>()
                .join(", "),
        })?;
        serde_json::from_value::<Component>(value.clone()).map_err(|e| {
            EcsError::ComponentDeserializationError {
                component: kind.name().to_owned(),
                details: e.to_string(),
            }
        })
    }
}
