/// A 2D grid stored row-major; row 0 is the top of the map.
///
/// Unlike a world map this does not wrap: projected maps have hard edges
/// (and often background outside the globe).
#[derive(Clone, Debug, PartialEq)]
pub struct Tilemap<T> {
    pub width: usize,
    pub height: usize,
    data: Vec<T>,
}

impl<T: Clone + Default> Tilemap<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![T::default(); width * height],
        }
    }
}

impl<T: Clone> Tilemap<T> {
    pub fn new_with(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Build a map from rows of equal length.
    pub fn from_rows(width: usize, rows: Vec<Vec<T>>) -> Self {
        let height = rows.len();
        let mut data = Vec::with_capacity(width * height);
        for row in rows {
            debug_assert_eq!(row.len(), width);
            data.extend(row);
        }
        Self { width, height, data }
    }

    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height, "({}, {}) outside {}x{}", x, y, self.width, self.height);
        y * self.width + x
    }

    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[self.index(x, y)]
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut T {
        let idx = self.index(x, y);
        &mut self.data[idx]
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    /// Set a cell given signed coordinates. Returns false, leaving the map
    /// unchanged, when the cell is off the map.
    pub fn set_clipped(&mut self, x: i64, y: i64, value: T) -> bool {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.set(x as usize, y as usize, value);
            true
        } else {
            false
        }
    }

    /// One row as a slice.
    pub fn row(&self, y: usize) -> &[T] {
        let start = y * self.width;
        &self.data[start..start + self.width]
    }

    /// Get 8-connected neighbors, clipped at every edge.
    pub fn neighbors_8(&self, x: usize, y: usize) -> Vec<(usize, usize)> {
        let mut result = Vec::with_capacity(8);

        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let nx = x as i64 + dx;
                let ny = y as i64 + dy;
                if nx >= 0 && ny >= 0 && (nx as usize) < self.width && (ny as usize) < self.height {
                    result.push((nx as usize, ny as usize));
                }
            }
        }

        result
    }

    /// Iterate over all cells with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let width = self.width;
        self.data.iter().enumerate().map(move |(idx, val)| {
            let x = idx % width;
            let y = idx / width;
            (x, y, val)
        })
    }

    /// Iterate mutably over all cells with their coordinates.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, usize, &mut T)> {
        let width = self.width;
        self.data.iter_mut().enumerate().map(move |(idx, val)| {
            let x = idx % width;
            let y = idx / width;
            (x, y, val)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set() {
        let mut map = Tilemap::new_with(4, 3, 0u8);
        map.set(3, 2, 7);
        *map.get_mut(0, 1) = 5;
        assert_eq!(*map.get(3, 2), 7);
        assert_eq!(map.row(1), &[5, 0, 0, 0]);
    }

    #[test]
    fn test_set_clipped() {
        let mut map = Tilemap::new_with(2, 2, 0u8);
        assert!(!map.set_clipped(-1, 0, 1));
        assert!(!map.set_clipped(2, 0, 1));
        assert!(map.set_clipped(1, 1, 9));
        assert_eq!(map.iter().filter(|(_, _, &v)| v != 0).count(), 1);
        assert_eq!(*map.get(1, 1), 9);
    }

    #[test]
    fn test_neighbors_8() {
        let map: Tilemap<u8> = Tilemap::new(5, 5);
        assert_eq!(map.neighbors_8(2, 2).len(), 8);
        assert_eq!(map.neighbors_8(0, 0).len(), 3);
        assert_eq!(map.neighbors_8(4, 2).len(), 5);
    }

    #[test]
    fn test_from_rows_and_iter() {
        let map = Tilemap::from_rows(3, vec![vec![1, 2, 3], vec![4, 5, 6]]);
        assert_eq!(map.height, 2);
        let cells: Vec<_> = map.iter().map(|(x, y, &v)| (x, y, v)).collect();
        assert_eq!(cells[4], (1, 1, 5));
    }
}
