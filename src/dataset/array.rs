//! Typed attribute arrays and per-association collections.
//!
//! Array payloads sit behind `Arc` so a cached data set, an injected array
//! and a zero-copy exposure all reference one buffer.

use std::sync::Arc;

use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::bridge_error::MeshBridgeError;

/// Where an attribute array lives on a mesh.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum Association {
    /// One tuple per mesh point (node centering).
    Point,
    /// One tuple per mesh cell (zone centering).
    Cell,
}

impl Association {
    /// Lowercase label used in diagnostics and error messages.
    pub fn label(self) -> &'static str {
        match self {
            Association::Point => "point",
            Association::Cell => "cell",
        }
    }
}

/// Contiguous interleaved scalar storage, one variant per element type.
#[derive(Clone, Debug, PartialEq)]
pub enum ScalarValues {
    I8(Vec<i8>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    I32(Vec<i32>),
    U32(Vec<u32>),
    I64(Vec<i64>),
    U64(Vec<u64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl ScalarValues {
    /// Total number of scalar elements (tuples times components).
    pub fn len(&self) -> usize {
        match self {
            ScalarValues::I8(v) => v.len(),
            ScalarValues::U8(v) => v.len(),
            ScalarValues::I16(v) => v.len(),
            ScalarValues::U16(v) => v.len(),
            ScalarValues::I32(v) => v.len(),
            ScalarValues::U32(v) => v.len(),
            ScalarValues::I64(v) => v.len(),
            ScalarValues::U64(v) => v.len(),
            ScalarValues::F32(v) => v.len(),
            ScalarValues::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name of the element type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            ScalarValues::I8(_) => "i8",
            ScalarValues::U8(_) => "u8",
            ScalarValues::I16(_) => "i16",
            ScalarValues::U16(_) => "u16",
            ScalarValues::I32(_) => "i32",
            ScalarValues::U32(_) => "u32",
            ScalarValues::I64(_) => "i64",
            ScalarValues::U64(_) => "u64",
            ScalarValues::F32(_) => "f32",
            ScalarValues::F64(_) => "f64",
        }
    }

    /// True for the integer-valued variants.
    pub fn is_integral(&self) -> bool {
        !matches!(self, ScalarValues::F32(_) | ScalarValues::F64(_))
    }

    /// Element-wise conversion to `f64`. Values a double cannot represent
    /// exactly (large 64-bit integers) round; unrepresentable ones map to NaN.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        fn convert<T: ToPrimitive>(v: &[T]) -> Vec<f64> {
            v.iter().map(|x| x.to_f64().unwrap_or(f64::NAN)).collect()
        }
        match self {
            ScalarValues::I8(v) => convert(v),
            ScalarValues::U8(v) => convert(v),
            ScalarValues::I16(v) => convert(v),
            ScalarValues::U16(v) => convert(v),
            ScalarValues::I32(v) => convert(v),
            ScalarValues::U32(v) => convert(v),
            ScalarValues::I64(v) => convert(v),
            ScalarValues::U64(v) => convert(v),
            ScalarValues::F32(v) => convert(v),
            ScalarValues::F64(v) => v.clone(),
        }
    }

    /// Read one element as `f64`, if in bounds.
    pub fn get_f64(&self, index: usize) -> Option<f64> {
        match self {
            ScalarValues::I8(v) => v.get(index).and_then(|x| x.to_f64()),
            ScalarValues::U8(v) => v.get(index).and_then(|x| x.to_f64()),
            ScalarValues::I16(v) => v.get(index).and_then(|x| x.to_f64()),
            ScalarValues::U16(v) => v.get(index).and_then(|x| x.to_f64()),
            ScalarValues::I32(v) => v.get(index).and_then(|x| x.to_f64()),
            ScalarValues::U32(v) => v.get(index).and_then(|x| x.to_f64()),
            ScalarValues::I64(v) => v.get(index).and_then(|x| x.to_f64()),
            ScalarValues::U64(v) => v.get(index).and_then(|x| x.to_f64()),
            ScalarValues::F32(v) => v.get(index).and_then(|x| x.to_f64()),
            ScalarValues::F64(v) => v.get(index).copied(),
        }
    }
}

/// Named array with a fixed number of interleaved components.
#[derive(Clone, Debug, PartialEq)]
pub struct DataArray {
    name: String,
    components: usize,
    values: ScalarValues,
}

impl DataArray {
    /// Build an array, checking that the element count is a whole number of
    /// tuples.
    ///
    /// # Errors
    /// [`MeshBridgeError::InvalidArray`] when `components` is zero or does
    /// not divide the element count.
    pub fn new(
        name: impl Into<String>,
        components: usize,
        values: ScalarValues,
    ) -> Result<Self, MeshBridgeError> {
        let name = name.into();
        if components == 0 {
            return Err(MeshBridgeError::InvalidArray {
                name,
                detail: "component count must be nonzero".into(),
            });
        }
        if values.len() % components != 0 {
            return Err(MeshBridgeError::InvalidArray {
                detail: format!(
                    "{} elements do not divide into {components}-component tuples",
                    values.len()
                ),
                name,
            });
        }
        Ok(Self {
            name,
            components,
            values,
        })
    }

    /// Shorthand for the common single-component case.
    pub fn scalars(name: impl Into<String>, values: ScalarValues) -> Result<Self, MeshBridgeError> {
        Self::new(name, 1, values)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn components(&self) -> usize {
        self.components
    }

    pub fn tuples(&self) -> usize {
        self.values.len() / self.components
    }

    pub fn values(&self) -> &ScalarValues {
        &self.values
    }
}

/// Ordered collection of arrays for one association, with name lookup.
///
/// Insertion replaces an existing array of the same name, which is what the
/// on-demand injection path wants.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributeSet {
    arrays: Vec<Arc<DataArray>>,
}

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace by name.
    pub fn insert(&mut self, array: impl Into<Arc<DataArray>>) {
        let array = array.into();
        match self.arrays.iter_mut().find(|a| a.name() == array.name()) {
            Some(slot) => *slot = array,
            None => self.arrays.push(array),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<DataArray>> {
        self.arrays.iter().find(|a| a.name() == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.arrays.iter().map(|a| a.name())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<DataArray>> {
        self.arrays.iter()
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }
}
