//! Structured data set kinds: implicit-coordinate grids, rectilinear and
//! curvilinear grids, and vertex-only polydata.

use std::sync::Arc;

use crate::bridge_error::MeshBridgeError;
use crate::dataset::array::{AttributeSet, DataArray, ScalarValues};

/// Axis-aligned grid with implicit coordinates.
///
/// `extent` holds inclusive point-index bounds `[ilo, ihi, jlo, jhi, klo,
/// khi]` in the global index space; `origin` is the coordinate of global
/// index zero, so patch coordinates are `origin + index * spacing`.
#[derive(Clone, Debug, PartialEq)]
pub struct UniformGrid {
    extent: [i32; 6],
    origin: [f64; 3],
    spacing: [f64; 3],
    point_data: AttributeSet,
    cell_data: AttributeSet,
}

impl UniformGrid {
    pub fn new(
        extent: [i32; 6],
        origin: [f64; 3],
        spacing: [f64; 3],
    ) -> Result<Self, MeshBridgeError> {
        for axis in 0..3 {
            if extent[2 * axis + 1] < extent[2 * axis] {
                return Err(MeshBridgeError::MalformedDataSet(format!(
                    "uniform grid extent {extent:?} is inverted on axis {axis}"
                )));
            }
        }
        Ok(Self {
            extent,
            origin,
            spacing,
            point_data: AttributeSet::new(),
            cell_data: AttributeSet::new(),
        })
    }

    pub fn extent(&self) -> [i32; 6] {
        self.extent
    }

    pub fn origin(&self) -> [f64; 3] {
        self.origin
    }

    pub fn spacing(&self) -> [f64; 3] {
        self.spacing
    }

    /// Points per axis.
    pub fn dimensions(&self) -> [i32; 3] {
        [
            self.extent[1] - self.extent[0] + 1,
            self.extent[3] - self.extent[2] + 1,
            self.extent[5] - self.extent[4] + 1,
        ]
    }

    pub fn point_data(&self) -> &AttributeSet {
        &self.point_data
    }

    pub fn point_data_mut(&mut self) -> &mut AttributeSet {
        &mut self.point_data
    }

    pub fn cell_data(&self) -> &AttributeSet {
        &self.cell_data
    }

    pub fn cell_data_mut(&mut self) -> &mut AttributeSet {
        &mut self.cell_data
    }
}

/// Grid with one explicit coordinate array per axis.
#[derive(Clone, Debug, PartialEq)]
pub struct RectilinearGrid {
    coords: [Arc<DataArray>; 3],
    point_data: AttributeSet,
    cell_data: AttributeSet,
}

impl RectilinearGrid {
    /// A 2D grid passes `None` for `z`; a single plane at `z = 0` is stored.
    pub fn new(
        x: DataArray,
        y: DataArray,
        z: Option<DataArray>,
    ) -> Result<Self, MeshBridgeError> {
        let z = match z {
            Some(z) => z,
            None => DataArray::scalars("z", ScalarValues::F64(vec![0.0]))?,
        };
        for axis in [&x, &y, &z] {
            if axis.components() != 1 {
                return Err(MeshBridgeError::MalformedDataSet(format!(
                    "coordinate array `{}` must have one component, has {}",
                    axis.name(),
                    axis.components()
                )));
            }
            if axis.tuples() == 0 {
                return Err(MeshBridgeError::MalformedDataSet(format!(
                    "coordinate array `{}` is empty",
                    axis.name()
                )));
            }
        }
        Ok(Self {
            coords: [Arc::new(x), Arc::new(y), Arc::new(z)],
            point_data: AttributeSet::new(),
            cell_data: AttributeSet::new(),
        })
    }

    pub fn coordinates(&self) -> &[Arc<DataArray>; 3] {
        &self.coords
    }

    /// Points per axis.
    pub fn dimensions(&self) -> [i32; 3] {
        [
            self.coords[0].tuples() as i32,
            self.coords[1].tuples() as i32,
            self.coords[2].tuples() as i32,
        ]
    }

    pub fn point_data(&self) -> &AttributeSet {
        &self.point_data
    }

    pub fn point_data_mut(&mut self) -> &mut AttributeSet {
        &mut self.point_data
    }

    pub fn cell_data(&self) -> &AttributeSet {
        &self.cell_data
    }

    pub fn cell_data_mut(&mut self) -> &mut AttributeSet {
        &mut self.cell_data
    }
}

/// Curvilinear grid: logical dimensions plus one packed point array.
#[derive(Clone, Debug, PartialEq)]
pub struct StructuredGrid {
    dims: [i32; 3],
    points: Arc<DataArray>,
    point_data: AttributeSet,
    cell_data: AttributeSet,
}

impl StructuredGrid {
    pub fn new(dims: [i32; 3], points: DataArray) -> Result<Self, MeshBridgeError> {
        if dims.iter().any(|&d| d < 1) {
            return Err(MeshBridgeError::MalformedDataSet(format!(
                "curvilinear dimensions {dims:?} must all be at least 1"
            )));
        }
        if points.components() != 3 {
            return Err(MeshBridgeError::MalformedDataSet(format!(
                "point array `{}` must have three components, has {}",
                points.name(),
                points.components()
            )));
        }
        let expected = dims.iter().map(|&d| d as usize).product::<usize>();
        if points.tuples() != expected {
            return Err(MeshBridgeError::MalformedDataSet(format!(
                "dimensions {dims:?} call for {expected} points, array `{}` has {}",
                points.name(),
                points.tuples()
            )));
        }
        Ok(Self {
            dims,
            points: Arc::new(points),
            point_data: AttributeSet::new(),
            cell_data: AttributeSet::new(),
        })
    }

    pub fn dimensions(&self) -> [i32; 3] {
        self.dims
    }

    pub fn points(&self) -> &Arc<DataArray> {
        &self.points
    }

    pub fn point_data(&self) -> &AttributeSet {
        &self.point_data
    }

    pub fn point_data_mut(&mut self) -> &mut AttributeSet {
        &mut self.point_data
    }

    pub fn cell_data(&self) -> &AttributeSet {
        &self.cell_data
    }

    pub fn cell_data_mut(&mut self) -> &mut AttributeSet {
        &mut self.cell_data
    }
}

/// Polydata carrier. Only the vertex-cell form converts to a point mesh;
/// anything with line, polygon or strip cells is reported as unsupported
/// instead of silently dropped.
#[derive(Clone, Debug, PartialEq)]
pub struct PolyData {
    points: Option<Arc<DataArray>>,
    vertex_cells: usize,
    other_cells: usize,
    point_data: AttributeSet,
    cell_data: AttributeSet,
}

impl PolyData {
    pub fn new(
        points: Option<DataArray>,
        vertex_cells: usize,
        other_cells: usize,
    ) -> Result<Self, MeshBridgeError> {
        if let Some(points) = &points {
            if points.components() != 3 {
                return Err(MeshBridgeError::MalformedDataSet(format!(
                    "point array `{}` must have three components, has {}",
                    points.name(),
                    points.components()
                )));
            }
        }
        Ok(Self {
            points: points.map(Arc::new),
            vertex_cells,
            other_cells,
            point_data: AttributeSet::new(),
            cell_data: AttributeSet::new(),
        })
    }

    /// A cloud with one vertex cell per point.
    pub fn point_cloud(points: DataArray) -> Result<Self, MeshBridgeError> {
        let vertex_cells = points.tuples();
        Self::new(Some(points), vertex_cells, 0)
    }

    pub fn points(&self) -> Option<&Arc<DataArray>> {
        self.points.as_ref()
    }

    pub fn vertex_cells(&self) -> usize {
        self.vertex_cells
    }

    pub fn other_cells(&self) -> usize {
        self.other_cells
    }

    pub fn point_data(&self) -> &AttributeSet {
        &self.point_data
    }

    pub fn point_data_mut(&mut self) -> &mut AttributeSet {
        &mut self.point_data
    }

    pub fn cell_data(&self) -> &AttributeSet {
        &self.cell_data
    }

    pub fn cell_data_mut(&mut self) -> &mut AttributeSet {
        &mut self.cell_data
    }
}
