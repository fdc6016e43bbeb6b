//! Tile catalog resolving tile identities to their classification facets.

use std::collections::BTreeMap;

use simple_lemmings_core::{StairsDirection, TileDefinition, TileFacets, TileId, TileRoles};

use crate::level::LevelError;

/// Tile identities written by interventions, resolved against the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoleTiles {
    /// Cliff-edge decoration placed in the detail layer.
    pub top_detail: TileId,
    /// Umbrella marker.
    pub umbrella: TileId,
    /// Stair rising to the right.
    pub stairs_right: TileId,
    /// Stair rising to the left.
    pub stairs_left: TileId,
}

impl RoleTiles {
    /// Tile written when building a stair in the provided direction.
    #[must_use]
    pub const fn stairs(&self, direction: StairsDirection) -> TileId {
        match direction {
            StairsDirection::Right => self.stairs_right,
            StairsDirection::Left => self.stairs_left,
        }
    }
}

/// Immutable catalog of every tile identity used by a level.
#[derive(Clone, Debug)]
pub struct TileCatalog {
    definitions: Vec<TileDefinition>,
    by_name: BTreeMap<String, TileId>,
    roles: RoleTiles,
}

impl TileCatalog {
    /// Builds the catalog, rejecting duplicate names and unresolved roles.
    pub fn new(definitions: &[TileDefinition], roles: &TileRoles) -> Result<Self, LevelError> {
        let mut by_name = BTreeMap::new();
        for (index, definition) in definitions.iter().enumerate() {
            let value = u16::try_from(index).map_err(|_| LevelError::TooManyTiles {
                count: definitions.len(),
            })?;
            if by_name
                .insert(definition.name.clone(), TileId::new(value))
                .is_some()
            {
                return Err(LevelError::DuplicateTile {
                    name: definition.name.clone(),
                });
            }
        }

        let resolve = |name: &String| {
            by_name
                .get(name)
                .copied()
                .ok_or_else(|| LevelError::UnknownTile { name: name.clone() })
        };
        let roles = RoleTiles {
            top_detail: resolve(&roles.top_detail)?,
            umbrella: resolve(&roles.umbrella)?,
            stairs_right: resolve(&roles.stairs_right)?,
            stairs_left: resolve(&roles.stairs_left)?,
        };

        Ok(Self {
            definitions: definitions.to_vec(),
            by_name,
            roles,
        })
    }

    /// Facets of the tile. Unknown identifiers classify as featureless.
    #[must_use]
    pub fn facets(&self, tile: TileId) -> TileFacets {
        self.definitions
            .get(usize::from(tile.get()))
            .map(|definition| definition.facets)
            .unwrap_or_default()
    }

    /// Name of the tile, if it belongs to the catalog.
    #[must_use]
    pub fn name(&self, tile: TileId) -> Option<&str> {
        self.definitions
            .get(usize::from(tile.get()))
            .map(|definition| definition.name.as_str())
    }

    /// Looks up a tile by name.
    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<TileId> {
        self.by_name.get(name).copied()
    }

    /// Tiles written by interventions.
    #[must_use]
    pub const fn roles(&self) -> &RoleTiles {
        &self.roles
    }

    /// Direction of the stair tile, judged by tile identity alone.
    #[must_use]
    pub fn stairs_direction(&self, tile: TileId) -> Option<StairsDirection> {
        if tile == self.roles.stairs_right {
            Some(StairsDirection::Right)
        } else if tile == self.roles.stairs_left {
            Some(StairsDirection::Left)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simple_lemmings_core::LevelDescription;

    #[test]
    fn catalog_resolves_roles_from_names() {
        let level = LevelDescription::sample();
        let catalog = TileCatalog::new(&level.tiles, &level.roles).expect("catalog");

        let stairs = catalog.roles().stairs(StairsDirection::Left);
        assert_eq!(catalog.name(stairs), Some("stairs-left"));
        assert_eq!(
            catalog.stairs_direction(stairs),
            Some(StairsDirection::Left)
        );
        assert!(catalog.facets(stairs).demolishable);
        assert_eq!(catalog.id_of("rock"), Some(TileId::new(0)));
    }

    #[test]
    fn unknown_identifiers_have_no_facets() {
        let level = LevelDescription::sample();
        let catalog = TileCatalog::new(&level.tiles, &level.roles).expect("catalog");
        assert_eq!(catalog.facets(TileId::new(999)), TileFacets::default());
        assert_eq!(catalog.name(TileId::new(999)), None);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut level = LevelDescription::sample();
        level.tiles.push(level.tiles[0].clone());
        let error = TileCatalog::new(&level.tiles, &level.roles).expect_err("duplicate");
        assert_eq!(
            error,
            LevelError::DuplicateTile {
                name: "rock".to_owned()
            }
        );
    }

    #[test]
    fn missing_role_tile_is_rejected() {
        let mut level = LevelDescription::sample();
        level.roles.umbrella = "parasol".to_owned();
        let error = TileCatalog::new(&level.tiles, &level.roles).expect_err("unknown role");
        assert_eq!(
            error,
            LevelError::UnknownTile {
                name: "parasol".to_owned()
            }
        );
    }
}
