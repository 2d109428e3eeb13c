//! Masonry grid packing: greedy, single-pass placement of 1x1 / 2x1 /
//! 1x2 / 2x2 tiles into a fixed-width column grid with no gaps or
//! overlaps, preserving input order.

use serde::{Deserialize, Serialize};

use crate::db::AspectClass;

/// Grid span of one image, in columns x rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub width: u8,
    pub height: u8,
}

/// A tile together with where the packer put it. The position is only
/// needed by renderers that place cells explicitly; `pack` strips it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedTile {
    pub row: usize,
    pub col: usize,
    pub tile: Tile,
}

/// The span an aspect class asks for before any downgrade.
pub fn span_for(aspect: AspectClass) -> Tile {
    match aspect {
        AspectClass::Big => Tile { width: 2, height: 2 },
        AspectClass::Landscape => Tile { width: 2, height: 1 },
        AspectClass::Portrait => Tile { width: 1, height: 2 },
        AspectClass::Small => Tile { width: 1, height: 1 },
    }
}

/// Pack an ordered sequence into `columns` columns, returning the final
/// span per item (width possibly downgraded 2 -> 1). Deterministic: the
/// same input always yields the same output.
pub fn pack(aspects: &[AspectClass], columns: usize) -> Vec<Tile> {
    place(aspects, columns).into_iter().map(|p| p.tile).collect()
}

/// Full placement. Greedy and non-backtracking: each item is placed at
/// the cursor, possibly width-downgraded, and never revisited.
pub fn place(aspects: &[AspectClass], columns: usize) -> Vec<PlacedTile> {
    assert!(columns >= 2, "grid needs at least two columns");

    let mut grid: Vec<Vec<bool>> = Vec::new();
    let mut placed = Vec::with_capacity(aspects.len());
    let mut row = 0usize;
    let mut col = 0usize;

    for &aspect in aspects {
        let mut tile = span_for(aspect);
        ensure_rows(&mut grid, row + 2, columns);

        // A 2-wide tile needs the neighbour cell free and in bounds;
        // otherwise it shrinks to fit. Only the in-progress item is ever
        // adjusted, prior placements stay put.
        if tile.width == 2 && (col + 2 > columns || grid[row][col + 1]) {
            tile.width = 1;
        }

        grid[row][col] = true;
        if tile.width == 2 {
            grid[row][col + 1] = true;
        }
        if tile.height == 2 {
            grid[row + 1][col] = true;
            if tile.width == 2 {
                grid[row + 1][col + 1] = true;
            }
        }

        placed.push(PlacedTile { row, col, tile });

        let (next_row, next_col) = advance(&mut grid, row, columns);
        row = next_row;
        col = next_col;
    }

    placed
}

/// Find the next unoccupied cell: current row first, then the row below
/// if it still has room, else two rows down (a full row below means it
/// was filled by 2-row spans from the current row).
fn advance(grid: &mut Vec<Vec<bool>>, mut row: usize, columns: usize) -> (usize, usize) {
    loop {
        ensure_rows(grid, row + 1, columns);
        if let Some(col) = grid[row].iter().position(|&occupied| !occupied) {
            return (row, col);
        }
        ensure_rows(grid, row + 2, columns);
        if grid[row + 1].iter().any(|&occupied| !occupied) {
            row += 1;
        } else {
            row += 2;
        }
    }
}

fn ensure_rows(grid: &mut Vec<Vec<bool>>, rows: usize, columns: usize) {
    while grid.len() < rows {
        grid.push(vec![false; columns]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::AspectClass::{Big, Landscape, Portrait, Small};

    fn footprint(p: &PlacedTile) -> Vec<(usize, usize)> {
        let mut cells = Vec::new();
        for dr in 0..p.tile.height as usize {
            for dc in 0..p.tile.width as usize {
                cells.push((p.row + dr, p.col + dc));
            }
        }
        cells
    }

    fn assert_no_overlap(placed: &[PlacedTile], columns: usize) {
        let mut seen = std::collections::HashSet::new();
        for p in placed {
            for cell in footprint(p) {
                assert!(cell.1 < columns, "tile leaks past column {columns}: {p:?}");
                assert!(seen.insert(cell), "cell {cell:?} claimed twice: {p:?}");
            }
        }
    }

    #[test]
    fn spans_follow_aspect_classes() {
        assert_eq!(span_for(Big), Tile { width: 2, height: 2 });
        assert_eq!(span_for(Landscape), Tile { width: 2, height: 1 });
        assert_eq!(span_for(Portrait), Tile { width: 1, height: 2 });
        assert_eq!(span_for(Small), Tile { width: 1, height: 1 });
    }

    #[test]
    fn smalls_fill_rows_left_to_right() {
        let placed = place(&[Small; 6], 4);
        let positions: Vec<(usize, usize)> = placed.iter().map(|p| (p.row, p.col)).collect();
        assert_eq!(positions, vec![(0, 0), (0, 1), (0, 2), (0, 3), (1, 0), (1, 1)]);
    }

    #[test]
    fn wide_tile_at_last_column_downgrades() {
        // three smalls leave only column 3 of row 0
        let tiles = pack(&[Small, Small, Small, Landscape], 4);
        assert_eq!(tiles[3], Tile { width: 1, height: 1 });
    }

    #[test]
    fn wide_tile_blocked_from_the_right_downgrades() {
        // portrait at (0,1) spills into row 1; a big arriving at (1,0)
        // finds (1,1) occupied and shrinks to 1 wide
        let placed = place(&[Small, Portrait, Small, Small, Big], 4);
        let big = placed[4];
        assert_eq!((big.row, big.col), (1, 0));
        assert_eq!(big.tile, Tile { width: 1, height: 2 });
        assert_no_overlap(&placed, 4);
    }

    #[test]
    fn mixed_sequence_has_no_gaps_overlaps_or_leaks() {
        let input = [
            Big, Small, Landscape, Portrait, Small, Big, Landscape, Landscape, Small, Portrait,
            Small, Small, Big, Portrait, Landscape, Small,
        ];
        let placed = place(&input, 4);
        assert_eq!(placed.len(), input.len());
        assert_no_overlap(&placed, 4);

        // no gaps: free cells may only exist in the ragged last rows,
        // every row above the first free cell is completely filled
        let cells: std::collections::HashSet<(usize, usize)> =
            placed.iter().flat_map(|p| footprint(p)).collect();
        let max_row = cells.iter().map(|c| c.0).max().unwrap();
        let first_free_row = (0..=max_row)
            .find(|&row| (0..4).any(|col| !cells.contains(&(row, col))))
            .unwrap_or(max_row + 1);
        assert!(
            max_row <= first_free_row + 1,
            "hole at row {first_free_row} while row {max_row} is occupied"
        );
    }

    #[test]
    fn packing_is_deterministic() {
        let input = [Landscape, Big, Small, Portrait, Small, Big, Small, Landscape];
        assert_eq!(pack(&input, 4), pack(&input, 4));
        assert_eq!(place(&input, 4), place(&input, 4));
    }

    #[test]
    fn order_is_preserved() {
        let input = [Portrait, Small, Landscape];
        let tiles = pack(&input, 4);
        assert_eq!(tiles.len(), 3);
        assert_eq!(tiles[0].height, 2);
        assert_eq!(tiles[2].width, 2);
    }
}
