//! Native in-memory mesh model handed over by simulations.

pub mod array;
pub mod composite;
pub mod structured;
pub mod unstructured;

pub use array::{Association, AttributeSet, DataArray, ScalarValues};
pub use composite::{AmrBox, AmrLevel, DataObject, MultiBlock, OverlappingAmr};
pub use structured::{PolyData, RectilinearGrid, StructuredGrid, UniformGrid};
pub use unstructured::{CellKind, UnstructuredGrid};

/// One concrete mesh piece. Composite objects hold these as leaves.
#[derive(Clone, Debug, PartialEq)]
pub enum DataSet {
    Uniform(UniformGrid),
    Rectilinear(RectilinearGrid),
    Structured(StructuredGrid),
    Poly(PolyData),
    Unstructured(UnstructuredGrid),
}

impl DataSet {
    /// Kind label for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            DataSet::Uniform(_) => "uniform grid",
            DataSet::Rectilinear(_) => "rectilinear grid",
            DataSet::Structured(_) => "curvilinear grid",
            DataSet::Poly(_) => "polydata",
            DataSet::Unstructured(_) => "unstructured grid",
        }
    }

    pub fn point_data(&self) -> &AttributeSet {
        match self {
            DataSet::Uniform(g) => g.point_data(),
            DataSet::Rectilinear(g) => g.point_data(),
            DataSet::Structured(g) => g.point_data(),
            DataSet::Poly(g) => g.point_data(),
            DataSet::Unstructured(g) => g.point_data(),
        }
    }

    pub fn cell_data(&self) -> &AttributeSet {
        match self {
            DataSet::Uniform(g) => g.cell_data(),
            DataSet::Rectilinear(g) => g.cell_data(),
            DataSet::Structured(g) => g.cell_data(),
            DataSet::Poly(g) => g.cell_data(),
            DataSet::Unstructured(g) => g.cell_data(),
        }
    }

    pub fn attributes(&self, association: Association) -> &AttributeSet {
        match association {
            Association::Point => self.point_data(),
            Association::Cell => self.cell_data(),
        }
    }

    pub fn attributes_mut(&mut self, association: Association) -> &mut AttributeSet {
        match (self, association) {
            (DataSet::Uniform(g), Association::Point) => g.point_data_mut(),
            (DataSet::Uniform(g), Association::Cell) => g.cell_data_mut(),
            (DataSet::Rectilinear(g), Association::Point) => g.point_data_mut(),
            (DataSet::Rectilinear(g), Association::Cell) => g.cell_data_mut(),
            (DataSet::Structured(g), Association::Point) => g.point_data_mut(),
            (DataSet::Structured(g), Association::Cell) => g.cell_data_mut(),
            (DataSet::Poly(g), Association::Point) => g.point_data_mut(),
            (DataSet::Poly(g), Association::Cell) => g.cell_data_mut(),
            (DataSet::Unstructured(g), Association::Point) => g.point_data_mut(),
            (DataSet::Unstructured(g), Association::Cell) => g.cell_data_mut(),
        }
    }
}
