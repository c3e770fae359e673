//! Unstructured grids: explicit cells over a packed point array.

use std::sync::Arc;

use crate::bridge_error::MeshBridgeError;
use crate::dataset::array::{AttributeSet, DataArray};

/// Cell shapes a simulation can hand us.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CellKind {
    /// 0D vertex.
    Vertex,
    /// 1D segment/edge.
    Line,
    /// 1D chain of segments, variable length.
    PolyLine,
    /// 2D simplex (triangle).
    Triangle,
    /// 2D tensor-product cell (quad).
    Quad,
    /// 2D polygon with a variable vertex count.
    Polygon,
    /// 3D simplex (tet).
    Tetra,
    /// 3D pyramid.
    Pyramid,
    /// 3D wedge/prism.
    Wedge,
    /// 3D tensor-product cell (hex).
    Hexahedron,
    /// Generic polyhedron.
    Polyhedron,
    QuadraticEdge,
    QuadraticTriangle,
    QuadraticQuad,
    QuadraticTetra,
    QuadraticPyramid,
    QuadraticWedge,
    QuadraticHexahedron,
}

impl CellKind {
    /// Vertex count for fixed-size shapes; `None` for the variable-length
    /// kinds.
    pub fn vertex_count(self) -> Option<usize> {
        match self {
            CellKind::Vertex => Some(1),
            CellKind::Line => Some(2),
            CellKind::Triangle => Some(3),
            CellKind::Quad | CellKind::Tetra => Some(4),
            CellKind::Pyramid => Some(5),
            CellKind::Wedge => Some(6),
            CellKind::Hexahedron => Some(8),
            CellKind::QuadraticEdge => Some(3),
            CellKind::QuadraticTriangle => Some(6),
            CellKind::QuadraticQuad => Some(8),
            CellKind::QuadraticTetra => Some(10),
            CellKind::QuadraticPyramid => Some(13),
            CellKind::QuadraticWedge => Some(15),
            CellKind::QuadraticHexahedron => Some(20),
            CellKind::PolyLine | CellKind::Polygon | CellKind::Polyhedron => None,
        }
    }
}

/// Explicit-connectivity grid.
///
/// Cell `c` spans `connectivity[offsets[c]..offsets[c + 1]]`; `offsets` has
/// one more entry than `cell_kinds` and starts at zero.
#[derive(Clone, Debug, PartialEq)]
pub struct UnstructuredGrid {
    points: Arc<DataArray>,
    cell_kinds: Vec<CellKind>,
    offsets: Vec<usize>,
    connectivity: Vec<i64>,
    point_data: AttributeSet,
    cell_data: AttributeSet,
}

impl UnstructuredGrid {
    /// # Errors
    /// [`MeshBridgeError::MalformedDataSet`] when the offsets are not
    /// monotone over the connectivity, a fixed-size cell kind disagrees with
    /// its span, or a point id is out of range.
    pub fn new(
        points: DataArray,
        cell_kinds: Vec<CellKind>,
        offsets: Vec<usize>,
        connectivity: Vec<i64>,
    ) -> Result<Self, MeshBridgeError> {
        if points.components() != 3 {
            return Err(MeshBridgeError::MalformedDataSet(format!(
                "point array `{}` must have three components, has {}",
                points.name(),
                points.components()
            )));
        }
        if offsets.len() != cell_kinds.len() + 1 {
            return Err(MeshBridgeError::MalformedDataSet(format!(
                "{} cells need {} offsets, got {}",
                cell_kinds.len(),
                cell_kinds.len() + 1,
                offsets.len()
            )));
        }
        if offsets.first() != Some(&0) || *offsets.last().unwrap_or(&0) != connectivity.len() {
            return Err(MeshBridgeError::MalformedDataSet(
                "offsets must start at 0 and end at the connectivity length".into(),
            ));
        }
        for (cell, window) in offsets.windows(2).enumerate() {
            let span = window[1].checked_sub(window[0]).ok_or_else(|| {
                MeshBridgeError::MalformedDataSet(format!("offsets decrease at cell {cell}"))
            })?;
            if let Some(expected) = cell_kinds[cell].vertex_count() {
                if span != expected {
                    return Err(MeshBridgeError::MalformedDataSet(format!(
                        "cell {cell} is {:?} and needs {expected} points, spans {span}",
                        cell_kinds[cell]
                    )));
                }
            } else if span == 0 {
                return Err(MeshBridgeError::MalformedDataSet(format!(
                    "variable-length cell {cell} has no points"
                )));
            }
        }
        let npoints = points.tuples() as i64;
        if let Some(&bad) = connectivity.iter().find(|&&id| id < 0 || id >= npoints) {
            return Err(MeshBridgeError::MalformedDataSet(format!(
                "connectivity references point {bad}, grid has {npoints} points"
            )));
        }
        Ok(Self {
            points: Arc::new(points),
            cell_kinds,
            offsets,
            connectivity,
            point_data: AttributeSet::new(),
            cell_data: AttributeSet::new(),
        })
    }

    pub fn points(&self) -> &Arc<DataArray> {
        &self.points
    }

    pub fn connectivity(&self) -> &[i64] {
        &self.connectivity
    }

    pub fn cell_count(&self) -> usize {
        self.cell_kinds.len()
    }

    /// Iterate cells as `(kind, point ids)`.
    pub fn cells(&self) -> impl Iterator<Item = (CellKind, &[i64])> {
        self.cell_kinds
            .iter()
            .zip(self.offsets.windows(2))
            .map(|(&kind, window)| (kind, &self.connectivity[window[0]..window[1]]))
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
