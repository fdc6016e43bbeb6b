//! Level description and creature tuning loaded from external data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{CellCoord, Facing, TileFacets};

/// Declarative level layout supplied by level data files.
///
/// Rows are listed top row first, the way they read in a text editor. Each
/// character is looked up in `legend`; `.` and spaces denote empty cells.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelDescription {
    /// Human readable level name.
    pub name: String,
    /// Tile catalog with the facets of every tile identity.
    pub tiles: Vec<TileDefinition>,
    /// Tiles written by interventions.
    pub roles: TileRoles,
    /// Maps a single-character glyph to a tile name.
    pub legend: BTreeMap<String, String>,
    /// Structural layer rows, top row first.
    pub structural: Vec<String>,
    /// Detail layer rows, top row first. Missing rows are empty.
    #[serde(default)]
    pub detail: Vec<String>,
    /// Cell in which the creature spawns.
    pub spawn: CellCoord,
    /// Facing of the creature when it spawns.
    #[serde(default = "default_facing")]
    pub facing: Facing,
    /// Cells hosting one-shot checkpoints.
    #[serde(default)]
    pub checkpoints: Vec<CellCoord>,
}

fn default_facing() -> Facing {
    Facing::Right
}

/// Single entry of the tile catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileDefinition {
    /// Unique tile name referenced by the legend and roles.
    pub name: String,
    /// Classification flags of the tile.
    #[serde(default)]
    pub facets: TileFacets,
}

/// Names of the catalog tiles that interventions write into the grid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRoles {
    /// Cliff-edge decoration placed in the detail layer.
    pub top_detail: String,
    /// Marker written by `PlaceUmbrella`.
    pub umbrella: String,
    /// Tile written by `BuildRightStairs`.
    pub stairs_right: String,
    /// Tile written by `BuildLeftStairs`.
    pub stairs_left: String,
}

impl LevelDescription {
    /// Built-in 16x8 level: a walkway, a soft block, a pit of spikes and a portal.
    #[must_use]
    pub fn sample() -> Self {
        let legend = [
            ("#", "rock"),
            ("s", "soil"),
            ("^", "spikes"),
            ("P", "portal"),
            ("t", "grass"),
        ]
        .into_iter()
        .map(|(glyph, name)| (glyph.to_owned(), name.to_owned()))
        .collect();

        Self {
            name: "sample".to_owned(),
            tiles: vec![
                TileDefinition::new(
                    "rock",
                    TileFacets {
                        selectable: true,
                        structural: true,
                        ..TileFacets::default()
                    },
                ),
                TileDefinition::new(
                    "soil",
                    TileFacets {
                        selectable: true,
                        structural: true,
                        destructible: true,
                        ..TileFacets::default()
                    },
                ),
                TileDefinition::new(
                    "spikes",
                    TileFacets {
                        structural: true,
                        damaging: true,
                        ..TileFacets::default()
                    },
                ),
                TileDefinition::new(
                    "portal",
                    TileFacets {
                        portal: true,
                        ..TileFacets::default()
                    },
                ),
                TileDefinition::new(
                    "grass",
                    TileFacets {
                        top_detail: true,
                        ..TileFacets::default()
                    },
                ),
                TileDefinition::new(
                    "umbrella",
                    TileFacets {
                        selectable: true,
                        umbrella_marker: true,
                        ..TileFacets::default()
                    },
                ),
                TileDefinition::new(
                    "stairs-right",
                    TileFacets {
                        selectable: true,
                        structural: true,
                        demolishable: true,
                        ..TileFacets::default()
                    },
                ),
                TileDefinition::new(
                    "stairs-left",
                    TileFacets {
                        selectable: true,
                        structural: true,
                        demolishable: true,
                        ..TileFacets::default()
                    },
                ),
            ],
            roles: TileRoles {
                top_detail: "grass".to_owned(),
                umbrella: "umbrella".to_owned(),
                stairs_right: "stairs-right".to_owned(),
                stairs_left: "stairs-left".to_owned(),
            },
            legend,
            structural: [
                "................",
                "................",
                "................",
                "..............P.",
                "#####s#.....####",
                "#####s#.....####",
                "#####s#^^^^^####",
                "################",
            ]
            .into_iter()
            .map(str::to_owned)
            .collect(),
            detail: [
                "................",
                "................",
                "................",
                "ttttttt.....tttt",
            ]
            .into_iter()
            .map(str::to_owned)
            .collect(),
            spawn: CellCoord::new(1, 4),
            facing: Facing::Right,
            checkpoints: vec![CellCoord::new(12, 4)],
        }
    }
}

impl TileDefinition {
    /// Creates a catalog entry.
    #[must_use]
    pub fn new(name: &str, facets: TileFacets) -> Self {
        Self {
            name: name.to_owned(),
            facets,
        }
    }
}

/// Physical constants driving the creature state machine.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatureTuning {
    /// Horizontal walking speed in cells per second.
    pub walk_speed: f32,
    /// Upward velocity added while traversing a stair.
    pub climb_assist: f32,
    /// Downward acceleration while falling, in cells per second squared.
    pub gravity: f32,
    /// Vertical speed clamp while falling with protection.
    pub protected_fall_speed: f32,
    /// Horizontal drag coefficient while falling with protection.
    pub protected_drag: f32,
    /// Falls of at least this many cells kill an unprotected creature.
    pub deadly_height: f32,
    /// Feet below this height kill the creature.
    pub floor_height: f32,
}

impl Default for CreatureTuning {
    fn default() -> Self {
        Self {
            walk_speed: 1.0,
            climb_assist: 1.0,
            gravity: 20.0,
            protected_fall_speed: 1.5,
            protected_drag: 2.0,
            deadly_height: 2.1,
            floor_height: -1.0,
        }
    }
}
