//! Coastline extraction
//!
//! A coastline pixel is a water pixel with land among its eight neighbours.
//! All coastline pixels are found before any pixel is recoloured, so the
//! result does not depend on scan order.

use crate::color_table::{ColorTable, BLACK, WHITE};
use crate::config::OutlineMode;
use crate::tilemap::Tilemap;

/// Interior water pixels touching land. The one-pixel border is skipped.
pub fn find_coastline(map: &Tilemap<u8>, table: &ColorTable) -> Vec<(usize, usize)> {
    let mut coast = Vec::new();
    if map.width < 3 || map.height < 3 {
        return coast;
    }

    for y in 1..map.height - 1 {
        for x in 1..map.width - 1 {
            if !table.is_water(*map.get(x, y)) {
                continue;
            }
            let touches_land = map
                .neighbors_8(x, y)
                .into_iter()
                .any(|(nx, ny)| table.is_land(*map.get(nx, ny)));
            if touches_land {
                coast.push((x, y));
            }
        }
    }

    coast
}

/// Apply an outline mode to a rendered map and return the number of
/// coastline pixels stamped.
pub fn apply_outline(map: &mut Tilemap<u8>, table: &ColorTable, mode: OutlineMode) -> usize {
    if mode == OutlineMode::None {
        return 0;
    }

    let coast = find_coastline(map, table);

    // a map that is already two-tone has been collapsed before
    let two_tone = map.iter().all(|(_, _, &c)| c == BLACK || c == WHITE);
    if mode == OutlineMode::BlackAndWhite && !two_tone {
        for (_, _, c) in map.iter_mut() {
            *c = if table.is_water(*c) { WHITE } else { BLACK };
        }
    }

    for &(x, y) in &coast {
        map.set(x, y, BLACK);
    }

    log::debug!("Outlined {} coastline pixels ({:?})", coast.len(), mode);
    coast.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color_table::{BACK, BLUE0};
    use crate::palette::STANDARD_PALETTE;

    fn island(table: &ColorTable) -> Tilemap<u8> {
        let water = table.layout().blue1();
        let land = table.layout().land0() + 3;
        let mut map = Tilemap::new_with(9, 7, water);
        for y in 2..5 {
            for x in 3..6 {
                map.set(x, y, land);
            }
        }
        map.set(0, 0, BACK);
        map
    }

    #[test]
    fn test_find_coastline_ring() {
        let table = ColorTable::standard(&STANDARD_PALETTE, 64);
        let map = island(&table);
        let coast = find_coastline(&map, &table);
        // the ring around a 3x3 island is 5x5 minus the island
        assert_eq!(coast.len(), 16);
        assert!(coast.contains(&(2, 1)) && coast.contains(&(6, 5)));
    }

    #[test]
    fn test_edges_keep_colours() {
        let table = ColorTable::standard(&STANDARD_PALETTE, 64);
        let mut map = island(&table);
        let before = map.clone();
        assert_eq!(apply_outline(&mut map, &table, OutlineMode::Edges), 16);
        assert_eq!(*map.get(2, 1), BLACK);
        assert_eq!(*map.get(4, 3), *before.get(4, 3));
        assert_eq!(*map.get(0, 6), *before.get(0, 6));
    }

    #[test]
    fn test_black_and_white() {
        let table = ColorTable::standard(&STANDARD_PALETTE, 64);
        let mut map = island(&table);
        apply_outline(&mut map, &table, OutlineMode::BlackAndWhite);
        assert!(map.iter().all(|(_, _, &c)| c == BLACK || c == WHITE));
        assert_eq!(*map.get(0, 0), BLACK);
        assert_eq!(*map.get(8, 0), WHITE);
        assert_eq!(*map.get(4, 3), BLACK);
    }

    #[test]
    fn test_outline_idempotent() {
        let table = ColorTable::standard(&STANDARD_PALETTE, 64);
        for mode in [OutlineMode::Edges, OutlineMode::BlackAndWhite] {
            let mut once = island(&table);
            apply_outline(&mut once, &table, mode);
            let mut twice = once.clone();
            apply_outline(&mut twice, &table, mode);
            assert_eq!(once, twice, "{:?}", mode);
        }
    }

    #[test]
    fn test_black_and_white_keeps_collapsed_map() {
        let table = ColorTable::standard(&STANDARD_PALETTE, 64);
        let mut map = island(&table);
        // snow on the island is ink on the first pass
        map.set(4, 3, WHITE);
        apply_outline(&mut map, &table, OutlineMode::BlackAndWhite);
        assert_eq!(*map.get(4, 3), BLACK);
        assert_eq!(map.iter().filter(|(_, _, &c)| c == WHITE).count(), 9 * 7 - 25 - 1);

        let collapsed = map.clone();
        assert_eq!(apply_outline(&mut map, &table, OutlineMode::BlackAndWhite), 0);
        assert_eq!(map, collapsed);
    }

    #[test]
    fn test_border_and_none() {
        let table = ColorTable::standard(&STANDARD_PALETTE, 64);
        let mut map = Tilemap::new_with(4, 4, BLUE0);
        map.set(0, 1, table.layout().land0());
        // the only water next to land on the border row is not interior
        let unchanged = map.clone();
        assert_eq!(apply_outline(&mut map, &table, OutlineMode::None), 0);
        assert_eq!(map, unchanged);
        assert_eq!(find_coastline(&map, &table), vec![(1, 1), (1, 2)]);
    }
}
