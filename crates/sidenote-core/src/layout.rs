//! Numbering and collision avoidance.
//!
//! Notes are ordered by their natural top, numbered 1..N in that order, then
//! swept top to bottom with a running column bottom: each note starts no
//! higher than `spacing` below the previous one. Notes only ever move down.

use crate::host::SidenoteTree;
use crate::types::{Geometry, PassReport};

/// Where one note ends up after a pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Index into the geometry slice given to [`plan`].
    pub index: usize,
    /// 1-based sequence number.
    pub number: usize,
    /// Offset to apply, already zeroed below the jitter threshold.
    pub shift: f64,
}

/// Compute numbers and shifts for a set of note geometries.
///
/// Notes with missing or unusable geometry get no placement. The result is in
/// visual order; ties on `top` keep their input order.
pub fn plan(geometries: &[Option<Geometry>], spacing: f64, threshold: f64) -> Vec<Placement> {
    let mut ordered: Vec<(usize, Geometry)> = geometries
        .iter()
        .enumerate()
        .filter_map(|(index, geom)| geom.filter(Geometry::is_usable).map(|g| (index, g)))
        .collect();

    // Stable, so equal tops keep document order.
    ordered.sort_by(|a, b| a.1.top.total_cmp(&b.1.top));

    let mut column_bottom: Option<f64> = None;
    ordered
        .into_iter()
        .enumerate()
        .map(|(rank, (index, geom))| {
            let desired_top = geom.top;
            let min_top = column_bottom.map_or(desired_top, |bottom| bottom + spacing);
            let actual_top = desired_top.max(min_top);
            let shift = actual_top - desired_top;
            column_bottom = Some(Geometry::new(actual_top, geom.height).bottom());

            Placement {
                index,
                number: rank + 1,
                shift: if shift > threshold { shift } else { 0.0 },
            }
        })
        .collect()
}

/// Write placements back to the tree: numbers onto notes and their markers,
/// shifts onto notes.
pub fn apply<T: SidenoteTree>(
    tree: &mut T,
    notes: &[T::Element],
    placements: &[Placement],
) -> PassReport {
    let mut report = PassReport {
        skipped: notes.len() - placements.len(),
        ..PassReport::default()
    };

    for placement in placements {
        let note = &notes[placement.index];

        if let Err(e) = tree.set_number(note, placement.number) {
            tracing::warn!(number = placement.number, "failed to number sidenote: {}", e);
            report.skipped += 1;
            continue;
        }
        if let Some(marker) = tree.marker(note) {
            if let Err(e) = tree.set_number(&marker, placement.number) {
                tracing::warn!(number = placement.number, "failed to number marker: {}", e);
            }
        }
        report.numbered += 1;

        match tree.set_shift(note, placement.shift) {
            Ok(()) if placement.shift > 0.0 => report.shifted += 1,
            Ok(()) => {}
            Err(e) => tracing::warn!(number = placement.number, "failed to shift sidenote: {}", e),
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geoms(rects: &[(f64, f64)]) -> Vec<Option<Geometry>> {
        rects.iter().map(|&(t, h)| Some(Geometry::new(t, h))).collect()
    }

    fn run(rects: &[(f64, f64)]) -> Vec<Placement> {
        plan(&geoms(rects), 8.0, 0.5)
    }

    #[test]
    fn test_overlap_pushes_down() {
        let placements = run(&[(100.0, 50.0), (120.0, 30.0)]);
        assert_eq!(
            placements,
            vec![
                Placement { index: 0, number: 1, shift: 0.0 },
                Placement { index: 1, number: 2, shift: 38.0 },
            ]
        );
    }

    #[test]
    fn test_no_overlap_no_shift() {
        let placements = run(&[(0.0, 20.0), (100.0, 10.0)]);
        assert!(placements.iter().all(|p| p.shift == 0.0));
    }

    #[test]
    fn test_numbers_follow_visual_order() {
        let placements = run(&[(300.0, 10.0), (100.0, 10.0), (200.0, 10.0)]);
        let order: Vec<_> = placements.iter().map(|p| (p.index, p.number)).collect();
        assert_eq!(order, vec![(1, 1), (2, 2), (0, 3)]);
    }

    #[test]
    fn test_ties_keep_document_order() {
        let placements = run(&[(50.0, 10.0), (50.0, 10.0), (50.0, 10.0)]);
        let order: Vec<_> = placements.iter().map(|p| p.index).collect();
        assert_eq!(order, vec![0, 1, 2]);
        assert_eq!(placements[1].shift, 18.0);
        assert_eq!(placements[2].shift, 36.0);
    }

    #[test]
    fn test_chain_of_pushes() {
        let rects = [(0.0, 40.0), (10.0, 40.0), (20.0, 40.0), (200.0, 10.0)];
        let placements = run(&rects);

        let mut prev_bottom: Option<f64> = None;
        for p in &placements {
            let (top, height) = rects[p.index];
            let actual = top + p.shift;
            if let Some(bottom) = prev_bottom {
                assert!(actual >= bottom + 8.0);
            }
            assert!(p.shift >= 0.0);
            prev_bottom = Some(actual + height);
        }
        // The last note already clears the column.
        assert_eq!(placements[3].shift, 0.0);
    }

    #[test]
    fn test_shift_below_threshold_is_zeroed() {
        // Second note would need 0.4 units.
        let placements = run(&[(0.0, 10.0), (17.6, 10.0), (100.0, 10.0)]);
        assert_eq!(placements[1].shift, 0.0);
        assert_eq!(placements[2].shift, 0.0);
    }

    #[test]
    fn test_exactly_spaced_gets_no_shift() {
        let placements = run(&[(0.0, 10.0), (18.0, 10.0)]);
        assert_eq!(placements[1].shift, 0.0);
    }

    #[test]
    fn test_unusable_geometry_is_skipped() {
        let geometries = vec![
            Some(Geometry::new(0.0, 20.0)),
            None,
            Some(Geometry::new(f64::NAN, 10.0)),
            Some(Geometry::new(10.0, -5.0)),
            Some(Geometry::new(5.0, 10.0)),
        ];
        let placements = plan(&geometries, 8.0, 0.5);
        let indices: Vec<_> = placements.iter().map(|p| (p.index, p.number)).collect();
        assert_eq!(indices, vec![(0, 1), (4, 2)]);
        assert_eq!(placements[1].shift, 23.0);
    }

    #[test]
    fn test_empty() {
        assert!(plan(&[], 8.0, 0.5).is_empty());
    }
}
