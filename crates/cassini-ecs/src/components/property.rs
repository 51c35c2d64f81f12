//! Item metadata: type, colour, shape and the rest of the descriptive
//! properties a map tile can carry.
//!
//! Tile metadata arrives as untyped strings. Each field is parsed with an
//! explicit `Option` result and falls back to the field's default when the
//! value is missing or unparseable.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

macro_rules! named_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
        pub enum $name {
            #[default]
            Unknown,
            $($variant),+
        }

        impl $name {
            /// Parse the exact variant name (`"Unknown"` included).
            pub fn parse(value: &str) -> Option<Self> {
                match value {
                    "Unknown" => Some(Self::Unknown),
                    $(stringify!($variant) => Some(Self::$variant),)+
                    _ => None,
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    Self::Unknown => "Unknown",
                    $(Self::$variant => stringify!($variant),)+
                }
            }
        }
    };
}

named_enum!(
    /// Classification used by the type index.
    ItemType { Artifact, Base, Gem, Life, Mineral, Rock, Rover }
);

named_enum!(ItemColor {
    Black, Blue, Bronze, Brown, Copper, Flashy, Gold, Gray, Green, Multicolor,
    Orange, Pink, Purple, Red, Silver, Transparent, Violet, White, Yellow,
});

named_enum!(Intensity { Bright, Dim, Low, High });

named_enum!(ItemShape {
    Circular, Cylindrical, Flat, Globular, Irregular, Rectangular, Spherical, Symmetrical,
});

named_enum!(ItemSize { Small, Large, Medium });

named_enum!(Surface { Shiny, Reflective, Metallic });

named_enum!(ItemSound { TickTock, Exterminate, BarkBark, HissHiss });

// ---------------------------------------------------------------------------
// Tile property keys
// ---------------------------------------------------------------------------

pub const KEY_NAME: &str = "itemname";
pub const KEY_TAG: &str = "itemtag";
pub const KEY_TYPE: &str = "itemtype";
pub const KEY_COLOR: &str = "itemcolor";
pub const KEY_SHAPE: &str = "itemshape";
pub const KEY_SIZE: &str = "itemsize";
pub const KEY_SOUND: &str = "itemsound";
pub const KEY_MASS: &str = "itemmass";
pub const KEY_VOLUME: &str = "itemvolume";
pub const KEY_WORTH: &str = "itemworth";

pub const PLAYER_ID_UNKNOWN: u32 = 0;

// ---------------------------------------------------------------------------
// Property
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Property {
    #[serde(rename = "playerId")]
    pub player_id: u32,
    #[serde(rename = "tileId")]
    pub tile_id: u32,
    #[serde(rename = "itemname")]
    pub name: String,
    #[serde(rename = "itemtype")]
    pub item_type: ItemType,
    /// Unique lookup key; empty means "not tagged".
    #[serde(rename = "itemtag")]
    pub tag: String,
    #[serde(rename = "itemmass")]
    pub mass: f32,
    #[serde(rename = "itemvolume")]
    pub volume: f32,
    #[serde(rename = "itemworth")]
    pub worth: i32,
    #[serde(rename = "itemcolor")]
    pub color: ItemColor,
    #[serde(rename = "itemintensity")]
    pub intensity: Intensity,
    #[serde(rename = "itemshape")]
    pub shape: ItemShape,
    #[serde(rename = "itemsize")]
    pub size: ItemSize,
    #[serde(rename = "itemsound")]
    pub sound: ItemSound,
}

impl Default for Property {
    fn default() -> Self {
        Self {
            player_id: PLAYER_ID_UNKNOWN,
            tile_id: 0,
            name: "Unknown".to_owned(),
            item_type: ItemType::Unknown,
            tag: String::new(),
            mass: 0.0,
            volume: 0.0,
            worth: 0,
            color: ItemColor::Unknown,
            intensity: Intensity::Unknown,
            shape: ItemShape::Unknown,
            size: ItemSize::Unknown,
            sound: ItemSound::Unknown,
        }
    }
}

impl Property {
    /// Build a property from a tile's string properties.
    pub fn from_tile(tile_id: u32, props: &BTreeMap<String, String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| props.get(key).map(String::as_str);
        let parse_f32 = |key: &str| get(key).and_then(|v| v.trim().parse::<f32>().ok());

        Self {
            tile_id,
            name: get(KEY_NAME).map(str::to_owned).unwrap_or(defaults.name),
            tag: get(KEY_TAG).map(str::to_owned).unwrap_or(defaults.tag),
            item_type: get(KEY_TYPE).and_then(ItemType::parse).unwrap_or_default(),
            color: get(KEY_COLOR).and_then(ItemColor::parse).unwrap_or_default(),
            shape: get(KEY_SHAPE).and_then(ItemShape::parse).unwrap_or_default(),
            size: get(KEY_SIZE).and_then(ItemSize::parse).unwrap_or_default(),
            sound: get(KEY_SOUND).and_then(ItemSound::parse).unwrap_or_default(),
            mass: parse_f32(KEY_MASS).unwrap_or(defaults.mass),
            volume: parse_f32(KEY_VOLUME).unwrap_or(defaults.volume),
            worth: get(KEY_WORTH)
                .and_then(|v| v.trim().parse::<i32>().ok())
                .unwrap_or(defaults.worth),
            ..defaults
        }
    }

    pub fn is_tagged(&self) -> bool {
        !self.tag.is_empty()
    }
}
