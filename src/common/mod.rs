mod bound_box;
mod ray;

pub use bound_box::BoundBox;
use nalgebra::Vector3;
pub use ray::Ray;

use std::ops::Range;

// Order of growth: X, Y, Z
// X is the fastest moving axis
pub fn index_3d(x: usize, y: usize, z: usize, size: Vector3<usize>) -> usize {
    x + y * size.x + z * size.x * size.y
}

/// Voxel range covered by cell `i` out of `cells` along an axis of `len` voxels.
/// Cells have side `len / cells`; the last cell absorbs the remainder.
pub fn cell_range(len: usize, cells: usize, i: usize) -> Range<usize> {
    let side = len / cells;
    let start = i * side;
    let end = if i + 1 == cells { len } else { start + side };
    start..end
}

#[cfg(test)]
mod test {

    use nalgebra::vector;

    use super::*;

    #[test]
    fn index_3d_test() {
        let size = vector![3usize, 4, 5];

        assert_eq!(index_3d(2, 2, 2, size), 3 * 4 * 2 + 3 * 2 + 2);
        assert_eq!(index_3d(0, 0, 0, size), 0);
        assert_eq!(index_3d(2, 3, 4, size), 3 * 4 * 5 - 1);
    }

    #[test]
    fn cell_range_even() {
        assert_eq!(cell_range(32, 16, 0), 0..2);
        assert_eq!(cell_range(32, 16, 15), 30..32);
    }

    #[test]
    fn cell_range_remainder() {
        // 37 voxels over 16 cells; cell side 2, last cell takes 7
        assert_eq!(cell_range(37, 16, 0), 0..2);
        assert_eq!(cell_range(37, 16, 14), 28..30);
        assert_eq!(cell_range(37, 16, 15), 30..37);
    }
}
