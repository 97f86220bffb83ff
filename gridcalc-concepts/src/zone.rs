use serde::{Deserialize, Serialize};

use crate::{errors::FileIoError, IndexBox};

/// Geometry of one partition as it is written into a structured-grid plot file.
///
/// Cells are uniformly spaced by `dx` in every axis and cell `lo` starts at `origin`
/// offset by `lo * dx`. Grid coordinates are stored at the vertices of the cells.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneGeometry<const D: usize> {
    /// Cells owned by the partition
    pub cells: IndexBox<D>,
    /// Physical position of the lower corner of cell `[0; D]`
    pub origin: nalgebra::SVector<f64, D>,
    /// Uniform cell spacing
    pub dx: f64,
}

impl<const D: usize> ZoneGeometry<D> {
    /// Number of vertices in each axis, ie. the number of cells plus one.
    pub fn n_vertices(&self) -> [usize; D] {
        let dims = self.cells.dimensions();
        core::array::from_fn(|a| dims[a] + 1)
    }

    /// Physical coordinates of every vertex along the given axis.
    ///
    /// Vertices are ordered lexicographically with axis `0` varying fastest, which is the
    /// same order in which [IndexBox::cells] visits cells.
    ///
    /// ```
    /// # use gridcalc_concepts::*;
    /// let geometry = ZoneGeometry {
    ///     cells: IndexBox::new([2, 0], [3, 0])?,
    ///     origin: [0.0, 1.0].into(),
    ///     dx: 0.5,
    /// };
    /// assert_eq!(geometry.vertex_coordinates(0), vec![1.0, 1.5, 2.0, 1.0, 1.5, 2.0]);
    /// assert_eq!(geometry.vertex_coordinates(1), vec![1.0, 1.0, 1.0, 1.5, 1.5, 1.5]);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn vertex_coordinates(&self, axis: usize) -> Vec<f64> {
        if self.cells.is_empty() {
            return Vec::new();
        }
        let mut hi = self.cells.hi();
        hi.iter_mut().for_each(|h| *h += 1);
        IndexBox::new(self.cells.lo(), hi)
            .map(|vertices| {
                vertices
                    .cells()
                    .map(|v| self.origin[axis] + v[axis] as f64 * self.dx)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A named, cell-centred solution field of one zone.
///
/// Values are ordered like [IndexBox::cells] of the zone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolutionField {
    /// Name of the field, eg. `"Density"`
    pub name: String,
    /// One value per cell of the zone
    pub values: Vec<f64>,
}

/// Serializes geometry and macroscopic fields into a structured-grid plot file.
///
/// A file consists of one base node with cell and physical dimension `D`, one zone per
/// partition and one solution node per zone.
/// Calls are expected in the order
/// [open](ZoneWriter::open) → [write_zone_grid](ZoneWriter::write_zone_grid) →
/// [write_solution](ZoneWriter::write_solution) → [close](ZoneWriter::close).
/// Every call reports its status; an error at any stage means that the file for the current
/// step is abandoned.
pub trait ZoneWriter<const D: usize> {
    /// Opens (and truncates) the file at `path` and writes the base node.
    fn open(&mut self, path: &std::path::Path) -> Result<(), FileIoError>;

    /// Writes grid coordinates of the given zone.
    ///
    /// The zone number is globally unique in the file.
    fn write_zone_grid(&mut self, zone: usize, geometry: &ZoneGeometry<D>)
        -> Result<(), FileIoError>;

    /// Writes the named cell-centred fields of the given zone.
    fn write_solution(&mut self, zone: usize, fields: &[SolutionField]) -> Result<(), FileIoError>;

    /// Completes the file.
    fn close(&mut self) -> Result<(), FileIoError>;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn vertex_count_matches_coordinates() {
        let geometry = ZoneGeometry {
            cells: IndexBox::new([0, 0, 0], [3, 1, 2]).unwrap(),
            origin: [0.0; 3].into(),
            dx: 1.0,
        };
        let n_vertices: usize = geometry.n_vertices().iter().product();
        assert_eq!(n_vertices, 5 * 3 * 4);
        for axis in 0..3 {
            assert_eq!(geometry.vertex_coordinates(axis).len(), n_vertices);
        }
        let z = geometry.vertex_coordinates(2);
        assert_eq!(z[0], 0.0);
        assert_eq!(z[n_vertices - 1], 3.0);
    }
}
