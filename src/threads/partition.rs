use std::ops::Range;

use crate::error::{Error, Result};

/// A contiguous run of flat raster indices, `start..end`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WorkUnit {
    pub start: usize,
    pub end: usize,
}

impl WorkUnit {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Split `cells` into disjoint units covering every index exactly once.
///
/// Aims for `workers * multiplier` units of equal size; whatever doesn't
/// divide evenly goes to the last unit. With fewer cells than that every
/// unit is a single cell.
pub fn partition(cells: usize, workers: usize, multiplier: usize) -> Result<Vec<WorkUnit>> {
    if workers == 0 {
        return Err(Error::invalid_argument("cannot partition work for zero workers"));
    }
    if multiplier == 0 {
        return Err(Error::invalid_argument("batch multiplier must be at least 1"));
    }
    if cells == 0 {
        return Ok(vec![]);
    }

    let target = workers.saturating_mul(multiplier);
    let size = (cells / target).max(1);
    let count = (cells / size).min(target);

    let mut units: Vec<WorkUnit> = (0..count)
        .map(|n| WorkUnit::new(n * size, (n + 1) * size))
        .collect();
    if let Some(last) = units.last_mut() {
        last.end = cells;
    }
    Ok(units)
}

#[cfg(test)]
mod test {
    use super::*;

    fn check_cover(cells: usize, workers: usize, multiplier: usize) {
        let units = partition(cells, workers, multiplier).unwrap();
        let mut next = 0;
        for unit in &units {
            assert_eq!(unit.start, next, "gap or overlap in {:?}", units);
            assert!(!unit.is_empty());
            next = unit.end;
        }
        assert_eq!(next, cells);
        assert!(units.len() <= workers * multiplier);
        assert_eq!(units.iter().map(WorkUnit::len).sum::<usize>(), cells);
    }

    #[test]
    fn test_partition_covers() {
        for cells in [1, 2, 3, 7, 100, 3200, 3201] {
            for workers in [1, 2, 3, 6, 16] {
                for multiplier in [1, 2, 5] {
                    check_cover(cells, workers, multiplier);
                }
            }
        }
    }

    #[test]
    fn test_remainder_goes_last() {
        let units = partition(10, 3, 1).unwrap();
        assert_eq!(
            units,
            vec![WorkUnit::new(0, 3), WorkUnit::new(3, 6), WorkUnit::new(6, 10)]
        );
    }

    #[test]
    fn test_even_split() {
        let units = partition(3200, 4, 2).unwrap();
        assert_eq!(units.len(), 8);
        assert!(units.iter().all(|u| u.len() == 400));
    }

    #[test]
    fn test_fewer_cells_than_units() {
        let units = partition(5, 4, 2).unwrap();
        assert_eq!(units.len(), 5);
        assert!(units.iter().all(|u| u.len() == 1));

        let units = partition(3, 8, 1).unwrap();
        assert_eq!(units.len(), 3);
    }

    #[test]
    fn test_empty_raster() {
        assert!(partition(0, 4, 2).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_zero() {
        assert!(matches!(partition(10, 0, 2), Err(Error::InvalidArgument(_))));
        assert!(matches!(partition(10, 2, 0), Err(Error::InvalidArgument(_))));
    }
}
