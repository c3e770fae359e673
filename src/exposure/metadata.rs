//! Collective metadata pass.
//!
//! Every rank walks the provider's mesh list in the same order. Ranks
//! owning no domains for a mesh cannot sample its type, so the lowest
//! owning rank samples its first local dataset and broadcasts a small
//! integer schema. Provider failures are assumed uniform across ranks;
//! a rank-local failure desynchronizes the collective sequence.

use crate::bridge_error::MeshBridgeError;
use crate::comm::Communicator;
use crate::dataset::{Association, DataObject, DataSet};
use crate::exposure::cache::{MeshCache, MeshEntry};
use crate::exposure::{inject_ghost_arrays, variables, BridgeOptions};
use crate::external::{
    AmrGrouping, MeshMetadata, MeshType, SimulationMetadata, VariableMetadata,
};
use crate::source::DataSource;

const SCHEMA_LEN: usize = 5;
const TYPE_UNKNOWN: i32 = -1;
const TYPE_RECTILINEAR: i32 = 0;
const TYPE_CURVILINEAR: i32 = 1;
const TYPE_UNSTRUCTURED: i32 = 2;
const TYPE_POINT: i32 = 3;
const TYPE_AMR: i32 = 4;

/// Count of axes with more than one sample.
pub fn topological_dimension(dims: [i32; 3]) -> i32 {
    dims.iter().filter(|&&d| d > 1).count() as i32
}

/// Schema broadcast by the representative rank:
/// `[type, d0, d1, d2, ghost flag]`.
fn sample_schema(object: &DataObject, dataset: &DataSet, ghost_name: &str) -> [i32; SCHEMA_LEN] {
    let mut schema = [TYPE_UNKNOWN, 0, 0, 0, 0];
    match dataset {
        DataSet::Uniform(grid) => {
            let dims = grid.dimensions();
            schema[0] = if object.as_amr().is_some() {
                TYPE_AMR
            } else {
                TYPE_RECTILINEAR
            };
            schema[1] = dims[0];
            schema[2] = dims[1];
            schema[3] = dims[2];
            schema[4] = grid.cell_data().get(ghost_name).is_some() as i32;
        }
        DataSet::Rectilinear(grid) => {
            let dims = grid.dimensions();
            schema[0] = TYPE_RECTILINEAR;
            schema[1] = dims[0];
            schema[2] = dims[1];
            schema[3] = dims[2];
        }
        DataSet::Structured(grid) => {
            let dims = grid.dimensions();
            schema[0] = TYPE_CURVILINEAR;
            schema[1] = dims[0];
            schema[2] = dims[1];
            schema[3] = dims[2];
        }
        DataSet::Unstructured(_) => {
            schema[0] = TYPE_UNSTRUCTURED;
            schema[1] = 3;
            schema[2] = 3;
        }
        DataSet::Poly(poly) => {
            if poly.vertex_cells() > 0 {
                schema[0] = TYPE_POINT;
                schema[1] = 0;
                schema[2] = 3;
            }
        }
    }
    schema
}

/// `(mesh type, topological dim, spatial dim)` from a broadcast schema.
fn decode_schema(schema: &[i32; SCHEMA_LEN]) -> Option<(MeshType, i32, i32)> {
    let dims = [schema[1], schema[2], schema[3]];
    let grid_dim = topological_dimension(dims);
    match schema[0] {
        TYPE_RECTILINEAR => Some((MeshType::Rectilinear, grid_dim, grid_dim)),
        TYPE_CURVILINEAR => Some((MeshType::Curvilinear, grid_dim, grid_dim)),
        TYPE_UNSTRUCTURED => Some((MeshType::Unstructured, schema[1], schema[2])),
        TYPE_POINT => Some((MeshType::Point, schema[1], schema[2])),
        TYPE_AMR => Some((MeshType::Amr, grid_dim, grid_dim)),
        _ => None,
    }
}

fn array_names_or_empty<S: DataSource>(
    source: &mut S,
    mesh: &str,
    association: Association,
) -> Vec<String> {
    // Providers are allowed to fail this query; treat it as no arrays.
    source.array_names(mesh, association).unwrap_or_else(|err| {
        log::debug!("no {} arrays for `{mesh}`: {err}", association.label());
        Vec::new()
    })
}

/// Run the metadata pass over every mesh the provider names, filling
/// `cache` as a side effect. A mesh that cannot be described is logged
/// and left out; the pass keeps going.
pub fn build<S, C>(
    source: &mut S,
    comm: &C,
    options: &BridgeOptions,
    cache: &mut MeshCache,
) -> Result<SimulationMetadata, MeshBridgeError>
where
    S: DataSource,
    C: Communicator,
{
    let mesh_names = source.mesh_names()?;
    let qualify = mesh_names.len() > 1;
    let mut meshes = Vec::new();
    let mut variables_out = Vec::new();

    for mesh_name in &mesh_names {
        let mut object = match source.mesh(mesh_name, options.structure_only_metadata) {
            Ok(object) => object,
            Err(err) => {
                log::error!("skipping mesh `{mesh_name}`: fetch failed: {err}");
                continue;
            }
        };
        if let Err(err) = inject_ghost_arrays(source, mesh_name, &mut object) {
            log::error!("skipping mesh `{mesh_name}`: {err}");
            continue;
        }

        let mut entry = MeshEntry::new(object, options.structure_only_metadata, comm)?;
        let Some(representative) = entry.representative_rank() else {
            log::warn!("no rank owns domains of mesh `{mesh_name}`; not advertised");
            cache.insert(mesh_name.clone(), entry);
            continue;
        };

        let mut schema = [TYPE_UNKNOWN, 0, 0, 0, 0];
        if comm.rank() == representative {
            let leaves = entry.object().leaves();
            let (_, first) = leaves[0];
            schema = sample_schema(entry.object(), first, &options.ghost_array_name);
        }
        comm.broadcast_i32(representative, &mut schema)?;

        let Some((mesh_type, topological_dim, spatial_dim)) = decode_schema(&schema) else {
            log::error!("mesh `{mesh_name}` has an unsupported dataset kind; not advertised");
            cache.insert(mesh_name.clone(), entry);
            continue;
        };

        let mut metadata = MeshMetadata {
            name: mesh_name.clone(),
            mesh_type,
            topological_dim,
            spatial_dim,
            total_domains: entry.total_domains(),
            domain_title: None,
            domain_piece_name: None,
            amr: None,
        };

        if mesh_type == MeshType::Amr {
            let Some(amr) = entry.object().as_amr() else {
                log::error!("mesh `{mesh_name}` advertised as AMR but this rank holds no AMR object");
                cache.insert(mesh_name.clone(), entry);
                continue;
            };
            metadata.domain_title = Some("Patches".to_string());
            metadata.domain_piece_name = Some("patch".to_string());
            metadata.amr = Some(AmrGrouping {
                level_count: amr.level_count(),
                group_title: "Levels".to_string(),
                group_piece_name: "level".to_string(),
                patch_levels: (0..amr.total_patches())
                    .map(|flat| {
                        amr.level_and_patch(flat)
                            .map(|(level, _)| level as u32)
                            .unwrap_or_default()
                    })
                    .collect(),
            });
            entry.has_ghost_cells = schema[4] > 0;
        }

        cache.insert(mesh_name.clone(), entry);
        meshes.push(metadata);

        let point_names = array_names_or_empty(source, mesh_name, Association::Point);
        let cell_names = array_names_or_empty(source, mesh_name, Association::Cell);
        for array in &point_names {
            variables_out.push(VariableMetadata {
                name: variables::point_variable_name(mesh_name, array, qualify),
                mesh: mesh_name.clone(),
                association: Association::Point,
            });
        }
        for array in &cell_names {
            let collides = point_names.iter().any(|point| point == array);
            variables_out.push(VariableMetadata {
                name: variables::cell_variable_name(mesh_name, array, collides, qualify),
                mesh: mesh_name.clone(),
                association: Association::Cell,
            });
        }
    }

    Ok(SimulationMetadata {
        time_step: source.time_step(),
        time: source.time(),
        meshes,
        variables: variables_out,
    })
}
