//! GMSH `.msh` (version 4 ASCII) mesh reader.
//!
//! Reads the `$Nodes`/`$Elements` sections of a single-entity-block GMSH 4.x
//! file into a [`spine_core::mesh::Mesh`]. GMSH groups nodes/elements by
//! `(entity_dim, entity_tag)` blocks; this reader flattens every block of a
//! matching element type into one mesh, mirroring the single-element-type
//! Non-goal the rest of this crate already carries.

use crate::error::{IoError, Result};
use nalgebra::Vector3;
use spine_core::elements::ElementType;
use spine_core::mesh::Mesh;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// GMSH element-type codes for the families this workspace supports
/// (GMSH reference manual §9, "Element types").
fn element_type_for_gmsh_code(code: u32) -> Result<(ElementType, usize)> {
    match code {
        2 => Ok((ElementType::Tri3 { plane_strain: false }, 3)),
        3 => Ok((ElementType::Quad4 { plane_strain: false }, 4)),
        4 => Ok((ElementType::Tet4, 4)),
        5 => Ok((ElementType::Hex8, 8)),
        other => Err(IoError::UnsupportedElementType(format!("gmsh type {other}"))),
    }
}

pub struct GmshModel {
    pub mesh: Mesh,
    pub tag_to_index: HashMap<usize, usize>,
}

pub fn read_msh(path: impl AsRef<Path>) -> Result<GmshModel> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|e| IoError::Read {
        path: path.display().to_string(),
        source: e,
    })?;
    read_msh_str(&raw)
}

pub fn read_msh_str(raw: &str) -> Result<GmshModel> {
    let lines: Vec<&str> = raw.lines().collect();
    let mut tag_to_index: HashMap<usize, usize> = HashMap::new();
    let mut coords: Vec<Vector3<f64>> = Vec::new();
    let mut element_type: Option<ElementType> = None;
    let mut connectivity: Vec<Vec<usize>> = Vec::new();

    let mut i = 0usize;
    while i < lines.len() {
        let line = lines[i].trim();
        if line == "$Nodes" {
            i += 1;
            let header: Vec<usize> = split_ints(lines[i]);
            let n_blocks = header[0];
            let total_nodes = header[1];
            coords.reserve(total_nodes);
            i += 1;
            for _ in 0..n_blocks {
                let block_header: Vec<i64> = split_ints_signed(lines[i]);
                let n_in_block = block_header[3] as usize;
                i += 1;
                let tags: Vec<usize> = (0..n_in_block)
                    .map(|k| split_ints(lines[i + k])[0])
                    .collect();
                i += n_in_block;
                for k in 0..n_in_block {
                    let xyz = split_floats(lines[i + k]);
                    let tag = tags[k];
                    tag_to_index.insert(tag, coords.len());
                    coords.push(Vector3::new(xyz[0], xyz[1], xyz[2]));
                }
                i += n_in_block;
            }
        } else if line == "$Elements" {
            i += 1;
            let header: Vec<usize> = split_ints(lines[i]);
            let n_blocks = header[0];
            i += 1;
            for _ in 0..n_blocks {
                let block_header: Vec<i64> = split_ints_signed(lines[i]);
                let elem_type_code = block_header[2] as u32;
                let n_in_block = block_header[3] as usize;
                i += 1;

                let (this_type, npe) = element_type_for_gmsh_code(elem_type_code)?;
                if let Some(existing) = element_type {
                    if existing == this_type {
                        // fine, same family
                    } else {
                        i += n_in_block;
                        continue;
                    }
                } else {
                    element_type = Some(this_type);
                }

                for k in 0..n_in_block {
                    let row = split_ints(lines[i + k]);
                    let node_tags = &row[1..1 + npe];
                    let conn: Vec<usize> = node_tags
                        .iter()
                        .map(|&t| {
                            tag_to_index.get(&t).copied().ok_or_else(|| IoError::MalformedCard {
                                keyword: "Elements".to_string(),
                                message: format!("unknown node tag {t}"),
                            })
                        })
                        .collect::<Result<_>>()?;
                    connectivity.push(conn);
                }
                i += n_in_block;
            }
        } else {
            i += 1;
        }
    }

    let element_type = element_type.ok_or_else(|| IoError::MalformedCard {
        keyword: "Elements".to_string(),
        message: "file contains no elements of a supported type".to_string(),
    })?;

    let mesh = Mesh::new(element_type, coords, connectivity, None)?;
    Ok(GmshModel { mesh, tag_to_index })
}

fn split_ints(line: &str) -> Vec<usize> {
    line.split_whitespace().filter_map(|t| t.parse::<usize>().ok()).collect()
}

fn split_ints_signed(line: &str) -> Vec<i64> {
    line.split_whitespace().filter_map(|t| t.parse::<i64>().ok()).collect()
}

fn split_floats(line: &str) -> Vec<f64> {
    line.split_whitespace().filter_map(|t| t.parse::<f64>().ok()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MSH: &str = "\
$MeshFormat
4.1 0 8
$EndMeshFormat
$Nodes
1 4 1 4
3 1 0 4
1
2
3
4
0.0 0.0 0.0
1.0 0.0 0.0
0.0 1.0 0.0
0.0 0.0 1.0
$EndNodes
$Elements
1 1 1 1
3 1 4 1
1 1 2 3 4
$EndElements
";

    #[test]
    fn reads_single_tet_msh() {
        let model = read_msh_str(MSH).unwrap();
        assert_eq!(model.mesh.n_nodes, 4);
        assert_eq!(model.mesh.n_elements, 1);
        assert_eq!(model.mesh.element_type, ElementType::Tet4);
    }
}
