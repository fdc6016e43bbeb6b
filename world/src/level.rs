//! Construction of validated level instances from level descriptions.

use simple_lemmings_core::{CellCoord, Facing, GridSize, LevelDescription, TileId};

use crate::{grid::GridState, tiles::TileCatalog};

/// Reasons a level description cannot be turned into a playable level.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LevelError {
    /// The structural layer has no rows or no columns.
    #[error("level layout is empty")]
    EmptyLayout,
    /// A row does not match the width of the first structural row.
    #[error("{layer} row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        /// Layer containing the row.
        layer: &'static str,
        /// Row index counted from the top of the text layout.
        row: usize,
        /// Width of the first structural row.
        expected: usize,
        /// Width of the offending row.
        found: usize,
    },
    /// The detail layer has more rows than the structural layer.
    #[error("detail layer has {found} rows but the level is {expected} rows high")]
    TooManyDetailRows {
        /// Height of the structural layer.
        expected: usize,
        /// Height of the detail layer.
        found: usize,
    },
    /// A glyph in the layout is missing from the legend.
    #[error("glyph {glyph:?} at row {row}, column {column} is not in the legend")]
    UnknownGlyph {
        /// Offending glyph.
        glyph: char,
        /// Row index counted from the top of the text layout.
        row: usize,
        /// Column index.
        column: usize,
    },
    /// The legend or roles reference a tile missing from the catalog.
    #[error("tile {name:?} is not defined in the catalog")]
    UnknownTile {
        /// Name that failed to resolve.
        name: String,
    },
    /// Two catalog entries share a name.
    #[error("tile {name:?} is defined more than once")]
    DuplicateTile {
        /// Repeated name.
        name: String,
    },
    /// The catalog exceeds the addressable tile identifier range.
    #[error("catalog defines {count} tiles, more than a level can address")]
    TooManyTiles {
        /// Number of catalog entries.
        count: usize,
    },
    /// A legend key is not exactly one character long.
    #[error("legend key {key:?} must be a single character")]
    InvalidGlyph {
        /// Offending key.
        key: String,
    },
    /// A level-defined cell lies outside the grid.
    #[error("{what} cell ({}, {}) lies outside the grid", cell.column(), cell.row())]
    CellOutOfBounds {
        /// What the cell was meant for.
        what: &'static str,
        /// Offending cell.
        cell: CellCoord,
    },
}

/// Validated, immutable level data from which world instances are reset.
#[derive(Clone, Debug)]
pub struct Level {
    name: String,
    catalog: TileCatalog,
    initial: GridState,
    spawn: CellCoord,
    facing: Facing,
    checkpoints: Vec<CellCoord>,
}

impl Level {
    /// Validates the description and builds the initial grid.
    pub fn from_description(description: &LevelDescription) -> Result<Self, LevelError> {
        let catalog = TileCatalog::new(&description.tiles, &description.roles)?;

        let mut legend: Vec<(char, TileId)> = Vec::with_capacity(description.legend.len());
        for (key, name) in &description.legend {
            let mut chars = key.chars();
            let (Some(glyph), None) = (chars.next(), chars.next()) else {
                return Err(LevelError::InvalidGlyph { key: key.clone() });
            };
            let tile = catalog
                .id_of(name)
                .ok_or_else(|| LevelError::UnknownTile { name: name.clone() })?;
            legend.push((glyph, tile));
        }

        let rows = description.structural.len();
        let columns = description
            .structural
            .first()
            .map_or(0, |row| row.chars().count());
        if rows == 0 || columns == 0 {
            return Err(LevelError::EmptyLayout);
        }
        if description.detail.len() > rows {
            return Err(LevelError::TooManyDetailRows {
                expected: rows,
                found: description.detail.len(),
            });
        }

        let size = GridSize::new(
            u32::try_from(columns).map_err(|_| LevelError::EmptyLayout)?,
            u32::try_from(rows).map_err(|_| LevelError::EmptyLayout)?,
        );
        let mut initial = GridState::new(size);
        let structural = parse_layer("structural", &description.structural, columns, &legend)?;
        let detail = parse_layer("detail", &description.detail, columns, &legend)?;
        for (text_row, cells) in structural.iter().enumerate() {
            write_row(
                &mut initial,
                rows,
                text_row,
                cells,
                GridState::set_structural,
            );
        }
        for (text_row, cells) in detail.iter().enumerate() {
            write_row(&mut initial, rows, text_row, cells, GridState::set_detail);
        }

        if !size.contains(description.spawn) {
            return Err(LevelError::CellOutOfBounds {
                what: "spawn",
                cell: description.spawn,
            });
        }
        if let Some(cell) = description
            .checkpoints
            .iter()
            .find(|cell| !size.contains(**cell))
        {
            return Err(LevelError::CellOutOfBounds {
                what: "checkpoint",
                cell: *cell,
            });
        }

        Ok(Self {
            name: description.name.clone(),
            catalog,
            initial,
            spawn: description.spawn,
            facing: description.facing,
            checkpoints: description.checkpoints.clone(),
        })
    }

    /// Human readable level name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tile catalog shared by every instance of the level.
    #[must_use]
    pub const fn catalog(&self) -> &TileCatalog {
        &self.catalog
    }

    /// Grid as authored, before any intervention.
    #[must_use]
    pub const fn initial_grid(&self) -> &GridState {
        &self.initial
    }

    /// Cell in which the creature spawns.
    #[must_use]
    pub const fn spawn(&self) -> CellCoord {
        self.spawn
    }

    /// Facing of the creature when it spawns.
    #[must_use]
    pub const fn facing(&self) -> Facing {
        self.facing
    }

    /// Cells hosting checkpoints.
    #[must_use]
    pub fn checkpoints(&self) -> &[CellCoord] {
        &self.checkpoints
    }
}

fn parse_layer(
    layer: &'static str,
    text: &[String],
    columns: usize,
    legend: &[(char, TileId)],
) -> Result<Vec<Vec<Option<TileId>>>, LevelError> {
    text.iter()
        .enumerate()
        .map(|(row, line)| {
            let found = line.chars().count();
            if found != columns {
                return Err(LevelError::RaggedRow {
                    layer,
                    row,
                    expected: columns,
                    found,
                });
            }
            line.chars()
                .enumerate()
                .map(|(column, glyph)| match glyph {
                    '.' | ' ' => Ok(None),
                    _ => legend
                        .iter()
                        .find(|(key, _)| *key == glyph)
                        .map(|(_, tile)| Some(*tile))
                        .ok_or(LevelError::UnknownGlyph { glyph, row, column }),
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .collect()
}

fn write_row(
    grid: &mut GridState,
    rows: usize,
    text_row: usize,
    cells: &[Option<TileId>],
    write: fn(&mut GridState, CellCoord, Option<TileId>) -> bool,
) {
    // Text is authored top row first; grid row zero is the bottom.
    let Some(row) = rows
        .checked_sub(text_row + 1)
        .and_then(|row| u32::try_from(row).ok())
    else {
        return;
    };
    for (column, tile) in cells.iter().enumerate() {
        if let Ok(column) = u32::try_from(column) {
            let _ = write(grid, CellCoord::new(column, row), *tile);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_level_builds_bottom_up() {
        let level = Level::from_description(&LevelDescription::sample()).expect("sample level");
        let grid = level.initial_grid();
        let catalog = level.catalog();

        assert_eq!(grid.size(), GridSize::new(16, 8));
        let bottom = grid.structural_at(CellCoord::new(0, 0)).expect("bedrock");
        assert_eq!(catalog.name(bottom), Some("rock"));
        let portal = grid.structural_at(CellCoord::new(14, 4)).expect("portal");
        assert!(catalog.facets(portal).portal);
        let grass = grid.detail_at(CellCoord::new(0, 4)).expect("grass");
        assert!(catalog.facets(grass).top_detail);
        assert_eq!(grid.structural_at(CellCoord::new(8, 3)), None);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let mut description = LevelDescription::sample();
        description.structural[2].push('#');
        let error = Level::from_description(&description).expect_err("ragged");
        assert_eq!(
            error,
            LevelError::RaggedRow {
                layer: "structural",
                row: 2,
                expected: 16,
                found: 17,
            }
        );
    }

    #[test]
    fn unknown_glyphs_are_rejected() {
        let mut description = LevelDescription::sample();
        description.structural[0] = "X...............".to_owned();
        let error = Level::from_description(&description).expect_err("glyph");
        assert_eq!(
            error,
            LevelError::UnknownGlyph {
                glyph: 'X',
                row: 0,
                column: 0,
            }
        );
    }

    #[test]
    fn spawn_outside_grid_is_rejected() {
        let mut description = LevelDescription::sample();
        description.spawn = CellCoord::new(16, 0);
        let error = Level::from_description(&description).expect_err("spawn");
        assert!(matches!(
            error,
            LevelError::CellOutOfBounds { what: "spawn", .. }
        ));
    }
}
