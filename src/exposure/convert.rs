//! Native dataset to external mesh conversion.
//!
//! One converter call handles one leaf dataset. Coordinate and data
//! arrays are shared with the simulation whenever the element type has
//! a wire equivalent; anything else is copied element-wise into `f64`.

use std::sync::Arc;

use crate::bridge_error::MeshBridgeError;
use crate::dataset::{
    AttributeSet, CellKind, DataArray, DataSet, PolyData, RectilinearGrid,
    ScalarValues, StructuredGrid, UniformGrid, UnstructuredGrid,
};
use crate::external::{
    CurvilinearMeshData, ExternalMesh, PointMeshData, RectilinearMeshData,
    UnstructuredMeshData, VariableData, WireCellType,
};

/// Expose one array, zero-copy when the element type allows it.
pub fn variable_data(array: &Arc<DataArray>) -> VariableData {
    match array.values() {
        ScalarValues::I8(_)
        | ScalarValues::U8(_)
        | ScalarValues::I32(_)
        | ScalarValues::I64(_)
        | ScalarValues::F32(_)
        | ScalarValues::F64(_) => VariableData::shared(Arc::clone(array)),
        _ => VariableData::copied(
            array.components(),
            array.tuples(),
            array.values().to_f64_vec(),
        ),
    }
}

/// Map a native cell kind onto its wire code, `None` when the wire
/// format has no equivalent.
pub fn wire_cell_type(kind: CellKind) -> Option<WireCellType> {
    Some(match kind {
        CellKind::Vertex => WireCellType::Point,
        CellKind::Line => WireCellType::Beam,
        CellKind::Triangle => WireCellType::Tri,
        CellKind::Quad => WireCellType::Quad,
        CellKind::Tetra => WireCellType::Tet,
        CellKind::Pyramid => WireCellType::Pyramid,
        CellKind::Wedge => WireCellType::Wedge,
        CellKind::Hexahedron => WireCellType::Hex,
        CellKind::QuadraticEdge => WireCellType::QuadraticEdge,
        CellKind::QuadraticTriangle => WireCellType::QuadraticTri,
        CellKind::QuadraticQuad => WireCellType::QuadraticQuad,
        CellKind::QuadraticTetra => WireCellType::QuadraticTet,
        CellKind::QuadraticPyramid => WireCellType::QuadraticPyramid,
        CellKind::QuadraticWedge => WireCellType::QuadraticWedge,
        CellKind::QuadraticHexahedron => WireCellType::QuadraticHex,
        CellKind::PolyLine | CellKind::Polygon | CellKind::Polyhedron => return None,
    })
}

/// Ghost marker arrays must be integral scalars with at least one
/// tuple; anything else is quietly ignored.
fn ghost_array(attributes: &AttributeSet, name: &str) -> Option<VariableData> {
    let array = attributes.get(name)?;
    if array.components() == 1 && array.tuples() > 0 && array.values().is_integral() {
        Some(variable_data(array))
    } else {
        None
    }
}

/// Convert one leaf dataset into its engine representation. `mesh` is
/// only used for error context.
pub fn convert(
    mesh: &str,
    dataset: &DataSet,
    ghost_name: &str,
) -> Result<ExternalMesh, MeshBridgeError> {
    match dataset {
        DataSet::Uniform(grid) => Ok(convert_uniform(grid, ghost_name)),
        DataSet::Rectilinear(grid) => Ok(convert_rectilinear(grid, ghost_name)),
        DataSet::Structured(grid) => Ok(convert_curvilinear(grid, ghost_name)),
        DataSet::Poly(poly) => convert_points(mesh, poly),
        DataSet::Unstructured(grid) => Ok(convert_unstructured(grid, ghost_name)),
    }
}

/// Regular grids have no explicit coordinates; synthesize one axis
/// array per direction from extent, origin and spacing.
fn convert_uniform(grid: &UniformGrid, ghost_name: &str) -> ExternalMesh {
    let extent = grid.extent();
    let origin = grid.origin();
    let spacing = grid.spacing();
    let dims = grid.dimensions();

    let axis = |axis: usize| -> VariableData {
        let lo = extent[2 * axis];
        let samples: Vec<f32> = (0..dims[axis] as usize)
            .map(|i| (origin[axis] + (lo + i as i32) as f64 * spacing[axis]) as f32)
            .collect();
        let name = ["x", "y", "z"][axis];
        let array = DataArray::scalars(name, ScalarValues::F32(samples))
            .expect("axis coordinates are well formed");
        VariableData::shared(Arc::new(array))
    };

    ExternalMesh::Rectilinear(RectilinearMeshData {
        x: axis(0),
        y: axis(1),
        z: (dims[2] > 1).then(|| axis(2)),
        ghost_nodes: ghost_array(grid.point_data(), ghost_name),
        ghost_cells: ghost_array(grid.cell_data(), ghost_name),
    })
}

fn convert_rectilinear(grid: &RectilinearGrid, ghost_name: &str) -> ExternalMesh {
    let dims = grid.dimensions();
    let coords = grid.coordinates();
    ExternalMesh::Rectilinear(RectilinearMeshData {
        x: variable_data(&coords[0]),
        y: variable_data(&coords[1]),
        z: (dims[2] > 1).then(|| variable_data(&coords[2])),
        ghost_nodes: ghost_array(grid.point_data(), ghost_name),
        ghost_cells: ghost_array(grid.cell_data(), ghost_name),
    })
}

fn convert_curvilinear(grid: &StructuredGrid, ghost_name: &str) -> ExternalMesh {
    ExternalMesh::Curvilinear(CurvilinearMeshData {
        dims: grid.dimensions(),
        coords: variable_data(grid.points()),
        ghost_nodes: ghost_array(grid.point_data(), ghost_name),
        ghost_cells: ghost_array(grid.cell_data(), ghost_name),
    })
}

fn convert_points(mesh: &str, poly: &PolyData) -> Result<ExternalMesh, MeshBridgeError> {
    if poly.other_cells() > 0 {
        return Err(MeshBridgeError::UnsupportedDataSet {
            mesh: mesh.to_string(),
            kind: "polydata with non-vertex cells".to_string(),
        });
    }
    let points = poly
        .points()
        .ok_or_else(|| MeshBridgeError::MissingCoordinates {
            mesh: mesh.to_string(),
        })?;
    Ok(ExternalMesh::Point(PointMeshData {
        coords: variable_data(points),
    }))
}

fn convert_unstructured(grid: &UnstructuredGrid, ghost_name: &str) -> ExternalMesh {
    let mut connectivity =
        Vec::with_capacity(grid.connectivity().len() + 2 * grid.cell_count());
    for (kind, ids) in grid.cells() {
        match wire_cell_type(kind) {
            Some(code) => {
                connectivity.push(code.as_code());
                connectivity.push(ids.len() as i32);
                connectivity.extend(ids.iter().map(|&id| id as i32));
            }
            // No wire equivalent: degrade to a single point on the
            // cell's first vertex so cell-centered arrays stay aligned.
            None => {
                connectivity.push(WireCellType::Point.as_code());
                connectivity.push(1);
                connectivity.push(ids[0] as i32);
            }
        }
    }
    ExternalMesh::Unstructured(UnstructuredMeshData {
        coords: variable_data(grid.points()),
        cell_count: grid.cell_count(),
        connectivity,
        ghost_nodes: ghost_array(grid.point_data(), ghost_name),
        ghost_cells: ghost_array(grid.cell_data(), ghost_name),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const GHOST: &str = "ghost_type";

    fn shared_f64(data: &VariableData) -> Vec<f64> {
        assert!(data.is_zero_copy());
        data.to_f64_vec()
    }

    #[test]
    fn uniform_synthesizes_axis_coordinates() {
        let grid = UniformGrid::new([2, 4, 0, 1, 0, 0], [10.0, 0.0, 0.0], [0.5, 1.0, 1.0])
            .unwrap();
        let mesh = convert("m", &DataSet::Uniform(grid), GHOST).unwrap();
        let ExternalMesh::Rectilinear(r) = mesh else {
            panic!("expected rectilinear");
        };
        assert_eq!(shared_f64(&r.x), vec![11.0, 11.5, 12.0]);
        assert_eq!(shared_f64(&r.y), vec![0.0, 1.0]);
        assert!(r.z.is_none());
    }

    #[test]
    fn uniform_with_depth_gets_a_z_axis() {
        let grid = UniformGrid::new([0, 1, 0, 1, 0, 2], [0.0; 3], [1.0, 1.0, 2.0]).unwrap();
        let mesh = convert("m", &DataSet::Uniform(grid), GHOST).unwrap();
        let ExternalMesh::Rectilinear(r) = mesh else {
            panic!("expected rectilinear");
        };
        assert_eq!(shared_f64(&r.z.unwrap()), vec![0.0, 2.0, 4.0]);
    }

    #[test]
    fn rectilinear_shares_supported_and_copies_wide_types() {
        let x = DataArray::scalars("x", ScalarValues::F64(vec![0.0, 1.0, 2.0])).unwrap();
        let y = DataArray::scalars("y", ScalarValues::U16(vec![0, 5])).unwrap();
        let grid = RectilinearGrid::new(x, y, None).unwrap();
        let mesh = convert("m", &DataSet::Rectilinear(grid), GHOST).unwrap();
        let ExternalMesh::Rectilinear(r) = mesh else {
            panic!("expected rectilinear");
        };
        assert!(r.x.is_zero_copy());
        assert!(!r.y.is_zero_copy());
        assert_eq!(r.y.to_f64_vec(), vec![0.0, 5.0]);
        assert!(r.z.is_none());
    }

    #[test]
    fn curvilinear_carries_dims_and_packed_points() {
        let points = DataArray::new(
            "points",
            3,
            ScalarValues::F32(vec![0.0; 4 * 3]),
        )
        .unwrap();
        let grid = StructuredGrid::new([2, 2, 1], points).unwrap();
        let mesh = convert("m", &DataSet::Structured(grid), GHOST).unwrap();
        let ExternalMesh::Curvilinear(c) = mesh else {
            panic!("expected curvilinear");
        };
        assert_eq!(c.dims, [2, 2, 1]);
        assert_eq!(c.coords.components(), 3);
        assert_eq!(c.coords.tuples(), 4);
        assert!(c.coords.is_zero_copy());
    }

    #[test]
    fn point_mesh_requires_points() {
        let empty = PolyData::new(None, 0, 0).unwrap();
        let err = convert("cloud", &DataSet::Poly(empty), GHOST).unwrap_err();
        assert!(matches!(err, MeshBridgeError::MissingCoordinates { .. }));

        let points = DataArray::new("p", 3, ScalarValues::F64(vec![0.0; 6])).unwrap();
        let cloud = PolyData::point_cloud(points).unwrap();
        let mesh = convert("cloud", &DataSet::Poly(cloud), GHOST).unwrap();
        assert!(matches!(mesh, ExternalMesh::Point(_)));
    }

    #[test]
    fn polydata_with_other_cells_is_unsupported() {
        let points = DataArray::new("p", 3, ScalarValues::F64(vec![0.0; 6])).unwrap();
        let poly = PolyData::new(Some(points), 0, 3).unwrap();
        let err = convert("m", &DataSet::Poly(poly), GHOST).unwrap_err();
        assert!(matches!(err, MeshBridgeError::UnsupportedDataSet { .. }));
    }

    #[test]
    fn unstructured_rebuilds_connectivity_with_fallback() {
        let points = DataArray::new("p", 3, ScalarValues::F64(vec![0.0; 5 * 3])).unwrap();
        let grid = UnstructuredGrid::new(
            points,
            vec![CellKind::Triangle, CellKind::PolyLine],
            vec![0, 3, 5],
            vec![0, 1, 2, 3, 4],
        )
        .unwrap();
        let mesh = convert("m", &DataSet::Unstructured(grid), GHOST).unwrap();
        let ExternalMesh::Unstructured(u) = mesh else {
            panic!("expected unstructured");
        };
        assert_eq!(u.cell_count, 2);
        assert_eq!(u.connectivity, vec![2, 3, 0, 1, 2, 0, 1, 3]);
        let records = u.records().unwrap();
        assert_eq!(records[0].0, WireCellType::Tri);
        assert_eq!(records[1], (WireCellType::Point, &[3][..]));
    }

    #[test]
    fn ghost_markers_must_be_integral_scalars() {
        let mut grid = UniformGrid::new([0, 2, 0, 2, 0, 0], [0.0; 3], [1.0; 3]).unwrap();
        grid.cell_data_mut().insert(
            DataArray::scalars(GHOST, ScalarValues::U8(vec![0, 0, 1, 0])).unwrap(),
        );
        grid.point_data_mut().insert(
            DataArray::scalars(GHOST, ScalarValues::F32(vec![0.0; 9])).unwrap(),
        );
        let mesh = convert("m", &DataSet::Uniform(grid), GHOST).unwrap();
        let ExternalMesh::Rectilinear(r) = mesh else {
            panic!("expected rectilinear");
        };
        assert!(r.ghost_cells.is_some());
        assert!(r.ghost_nodes.is_none());
    }

    #[test]
    fn ghost_marker_with_many_components_is_ignored() {
        let mut grid = UniformGrid::new([0, 2, 0, 2, 0, 0], [0.0; 3], [1.0; 3]).unwrap();
        grid.cell_data_mut().insert(
            DataArray::new(GHOST, 2, ScalarValues::I32(vec![0; 8])).unwrap(),
        );
        let mesh = convert("m", &DataSet::Uniform(grid), GHOST).unwrap();
        let ExternalMesh::Rectilinear(r) = mesh else {
            panic!("expected rectilinear");
        };
        assert!(r.ghost_cells.is_none());
    }
}
