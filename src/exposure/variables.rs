//! External variable naming.
//!
//! Point arrays keep their own names. A cell array that shares its name
//! with a point array on the same mesh gets a `cell_` prefix so both
//! stay addressable, and with several meshes every name carries a
//! `<mesh>/` qualifier. Parsing runs the same rules backwards.

use crate::bridge_error::MeshBridgeError;
use crate::dataset::Association;

pub const CELL_PREFIX: &str = "cell_";

/// Outcome of parsing an external name. `association` is `None` when
/// only probing the mesh's array lists can settle it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedVariable {
    pub mesh: String,
    pub array: String,
    pub association: Option<Association>,
}

/// External name of a point array.
pub fn point_variable_name(mesh: &str, array: &str, qualify: bool) -> String {
    if qualify {
        format!("{mesh}/{array}")
    } else {
        array.to_string()
    }
}

/// External name of a cell array. `collides` means a point array of the
/// same name exists on this mesh.
pub fn cell_variable_name(mesh: &str, array: &str, collides: bool, qualify: bool) -> String {
    match (collides, qualify) {
        (true, true) => format!("{mesh}/{CELL_PREFIX}{array}"),
        (true, false) => format!("{CELL_PREFIX}{array}"),
        (false, true) => format!("{mesh}/{array}"),
        (false, false) => array.to_string(),
    }
}

/// Map an external name back to its mesh and array name.
///
/// With several meshes the qualifier is mandatory; its absence is a
/// protocol violation, not a lookup miss. A single mesh keeps the whole
/// name, slashes included.
pub fn parse(external: &str, mesh_names: &[String]) -> Result<ParsedVariable, MeshBridgeError> {
    let (mesh, rest) = if mesh_names.len() > 1 {
        let (mesh, rest) = external
            .split_once('/')
            .ok_or_else(|| MeshBridgeError::AmbiguousVariable(external.to_string()))?;
        (mesh.to_string(), rest)
    } else {
        let mesh = mesh_names
            .first()
            .ok_or_else(|| MeshBridgeError::UnknownVariable(external.to_string()))?;
        (mesh.clone(), external)
    };
    Ok(match rest.strip_prefix(CELL_PREFIX) {
        Some(array) => ParsedVariable {
            mesh,
            array: array.to_string(),
            association: Some(Association::Cell),
        },
        None => ParsedVariable {
            mesh,
            array: rest.to_string(),
            association: None,
        },
    })
}
