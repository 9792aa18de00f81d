use serde::{Deserialize, Serialize};

/// Row-major grid geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridShape {
    pub rows: usize,
    pub cols: usize,
}

impl GridShape {
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn index(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.cols).then(|| row * self.cols + col)
    }

    pub fn coords(&self, index: usize) -> Option<(usize, usize)> {
        (index < self.len()).then(|| (index / self.cols, index % self.cols))
    }

    /// Tiles touching `index` orthogonally or diagonally, in ascending index order.
    pub fn neighbors(&self, index: usize) -> Vec<usize> {
        let Some((row, col)) = self.coords(index) else {
            return Vec::new();
        };
        let mut neighbors = Vec::with_capacity(8);
        for d_row in -1isize..=1 {
            for d_col in -1isize..=1 {
                if d_row == 0 && d_col == 0 {
                    continue;
                }
                let (Some(r), Some(c)) = (
                    row.checked_add_signed(d_row),
                    col.checked_add_signed(d_col),
                ) else {
                    continue;
                };
                if let Some(neighbor) = self.index(r, c) {
                    neighbors.push(neighbor);
                }
            }
        }
        neighbors
    }
}
