//! Canonical representations handed to the analysis engine.
//!
//! Everything in this module is produced by the exposure layer and consumed
//! by the engine coupling. The data-bearing types reference simulation
//! buffers where the element type allows it; the descriptor types are plain
//! serializable values.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dataset::{Association, DataArray};

/// Payload of an exposed array.
#[derive(Clone, Debug, PartialEq)]
pub enum VariableValues {
    /// The simulation's own buffer, shared without copying.
    Shared(Arc<DataArray>),
    /// Element-wise copy widened to `f64`.
    CopiedF64(Vec<f64>),
}

/// An array exposed to the engine, with its shape.
#[derive(Clone, Debug, PartialEq)]
pub struct VariableData {
    components: usize,
    tuples: usize,
    values: VariableValues,
}

impl VariableData {
    pub fn shared(array: Arc<DataArray>) -> Self {
        Self {
            components: array.components(),
            tuples: array.tuples(),
            values: VariableValues::Shared(array),
        }
    }

    pub fn copied(components: usize, tuples: usize, values: Vec<f64>) -> Self {
        debug_assert_eq!(components * tuples, values.len());
        Self {
            components,
            tuples,
            values: VariableValues::CopiedF64(values),
        }
    }

    pub fn components(&self) -> usize {
        self.components
    }

    pub fn tuples(&self) -> usize {
        self.tuples
    }

    pub fn values(&self) -> &VariableValues {
        &self.values
    }

    /// True when the engine reads the simulation's buffer directly.
    pub fn is_zero_copy(&self) -> bool {
        matches!(self.values, VariableValues::Shared(_))
    }

    /// Flatten to `f64` regardless of representation. Test and consumer
    /// convenience; the zero-copy path never calls this.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match &self.values {
            VariableValues::Shared(array) => array.values().to_f64_vec(),
            VariableValues::CopiedF64(values) => values.clone(),
        }
    }
}

/// Cell type codes of the engine's unstructured wire format.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum WireCellType {
    Point,
    Beam,
    Tri,
    Quad,
    Tet,
    Pyramid,
    Wedge,
    Hex,
    QuadraticEdge,
    QuadraticTri,
    QuadraticQuad,
    QuadraticTet,
    QuadraticPyramid,
    QuadraticWedge,
    QuadraticHex,
}

impl WireCellType {
    pub fn as_code(self) -> i32 {
        match self {
            WireCellType::Point => 0,
            WireCellType::Beam => 1,
            WireCellType::Tri => 2,
            WireCellType::Quad => 3,
            WireCellType::Tet => 4,
            WireCellType::Pyramid => 5,
            WireCellType::Wedge => 6,
            WireCellType::Hex => 7,
            WireCellType::QuadraticEdge => 8,
            WireCellType::QuadraticTri => 9,
            WireCellType::QuadraticQuad => 10,
            WireCellType::QuadraticTet => 11,
            WireCellType::QuadraticPyramid => 12,
            WireCellType::QuadraticWedge => 13,
            WireCellType::QuadraticHex => 14,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => WireCellType::Point,
            1 => WireCellType::Beam,
            2 => WireCellType::Tri,
            3 => WireCellType::Quad,
            4 => WireCellType::Tet,
            5 => WireCellType::Pyramid,
            6 => WireCellType::Wedge,
            7 => WireCellType::Hex,
            8 => WireCellType::QuadraticEdge,
            9 => WireCellType::QuadraticTri,
            10 => WireCellType::QuadraticQuad,
            11 => WireCellType::QuadraticTet,
            12 => WireCellType::QuadraticPyramid,
            13 => WireCellType::QuadraticWedge,
            14 => WireCellType::QuadraticHex,
            _ => return None,
        })
    }
}

/// Rectilinear mesh: one coordinate array per axis. `z` is absent for a
/// two-dimensional mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct RectilinearMeshData {
    pub x: VariableData,
    pub y: VariableData,
    pub z: Option<VariableData>,
    pub ghost_nodes: Option<VariableData>,
    pub ghost_cells: Option<VariableData>,
}

/// Curvilinear mesh: logical dimensions plus one packed coordinate array.
#[derive(Clone, Debug, PartialEq)]
pub struct CurvilinearMeshData {
    pub dims: [i32; 3],
    pub coords: VariableData,
    pub ghost_nodes: Option<VariableData>,
    pub ghost_cells: Option<VariableData>,
}

/// Point mesh: packed coordinates, no topology.
#[derive(Clone, Debug, PartialEq)]
pub struct PointMeshData {
    pub coords: VariableData,
}

/// Unstructured mesh. `connectivity` is a flat stream of records
/// `{cell type code, point count, point indices...}`, one per cell.
#[derive(Clone, Debug, PartialEq)]
pub struct UnstructuredMeshData {
    pub coords: VariableData,
    pub cell_count: usize,
    pub connectivity: Vec<i32>,
    pub ghost_nodes: Option<VariableData>,
    pub ghost_cells: Option<VariableData>,
}

impl UnstructuredMeshData {
    /// Walk the connectivity stream as `(type, point ids)` records.
    ///
    /// Returns `None` for a truncated or over-long stream, which the
    /// converter never produces.
    pub fn records(&self) -> Option<Vec<(WireCellType, &[i32])>> {
        let mut out = Vec::with_capacity(self.cell_count);
        let mut at = 0;
        while at < self.connectivity.len() {
            let kind = WireCellType::from_code(self.connectivity[at])?;
            let count = self.connectivity.get(at + 1).copied()? as usize;
            let ids = self.connectivity.get(at + 2..at + 2 + count)?;
            out.push((kind, ids));
            at += 2 + count;
        }
        (out.len() == self.cell_count).then_some(out)
    }
}

/// One mesh domain in engine form.
#[derive(Clone, Debug, PartialEq)]
pub enum ExternalMesh {
    Rectilinear(RectilinearMeshData),
    Curvilinear(CurvilinearMeshData),
    Point(PointMeshData),
    Unstructured(UnstructuredMeshData),
}

/// Advertised kind of a mesh.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum MeshType {
    Rectilinear,
    Curvilinear,
    Point,
    Unstructured,
    Amr,
}

/// Level grouping advertised for AMR meshes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AmrGrouping {
    pub level_count: usize,
    pub group_title: String,
    pub group_piece_name: String,
    /// Level of each patch, indexed by flat patch id.
    pub patch_levels: Vec<u32>,
}

/// Per-mesh descriptor in the simulation metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshMetadata {
    pub name: String,
    pub mesh_type: MeshType,
    pub topological_dim: i32,
    pub spatial_dim: i32,
    pub total_domains: usize,
    pub domain_title: Option<String>,
    pub domain_piece_name: Option<String>,
    pub amr: Option<AmrGrouping>,
}

/// Per-variable descriptor in the simulation metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VariableMetadata {
    /// External name the engine will ask for.
    pub name: String,
    pub mesh: String,
    pub association: Association,
}

/// Everything the engine learns about the current cycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationMetadata {
    pub time_step: i64,
    pub time: f64,
    pub meshes: Vec<MeshMetadata>,
    pub variables: Vec<VariableMetadata>,
}

/// Domains of one mesh owned by the calling rank.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DomainList {
    pub total_domains: usize,
    pub local_domain_ids: Vec<usize>,
}

/// Parent/child relations of one patch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatchNesting {
    pub patch: usize,
    pub level: usize,
    pub children: Vec<usize>,
    /// `[ilo, jlo, klo, ihi, jhi, khi]` in the patch's level index space.
    pub logical_extent: [i32; 6],
}

/// Reconstructed nesting of an overlapping AMR mesh, identical on every
/// rank. `patches` is indexed by flat patch id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DomainNesting {
    pub patch_count: usize,
    pub level_count: usize,
    pub topological_dim: i32,
    pub level_refinement_ratios: Vec<[i32; 3]>,
    pub patches: Vec<PatchNesting>,
}
