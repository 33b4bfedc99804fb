//! Abaqus/CalculiX `.inp` keyword-deck reader.
//!
//! Turns the generic [`spine_inp::Deck`] tokenization into a
//! [`spine_core::mesh::Mesh`] plus the boundary conditions and concentrated
//! loads carried by `*BOUNDARY`/`*CLOAD` cards, following the same keyword
//! surface CalculiX itself accepts for `*NODE`/`*ELEMENT`.

use crate::error::{IoError, Result};
use spine_core::elements::ElementType;
use spine_core::mesh::Mesh;
use spine_inp::{Card, Deck};
use std::collections::HashMap;
use std::path::Path;

/// A parsed deck: the assembled mesh plus the node-label remapping needed
/// to resolve `*NSET`/result-file cross references back to Abaqus labels.
pub struct AbaqusModel {
    pub mesh: Mesh,
    pub label_to_index: HashMap<usize, usize>,
}

fn element_type_for_keyword(type_value: &str) -> Result<ElementType> {
    let upper = type_value.to_ascii_uppercase();
    match upper.as_str() {
        "C3D8" | "C3D8R" | "C3D8I" => Ok(ElementType::Hex8),
        "C3D4" => Ok(ElementType::Tet4),
        "CPS4" | "CPS4R" => Ok(ElementType::Quad4 { plane_strain: false }),
        "CPE4" | "CPE4R" => Ok(ElementType::Quad4 { plane_strain: true }),
        "CPS3" => Ok(ElementType::Tri3 { plane_strain: false }),
        "CPE3" => Ok(ElementType::Tri3 { plane_strain: true }),
        other => Err(IoError::UnsupportedElementType(other.to_string())),
    }
}

fn parse_data_row(line: &str) -> Vec<f64> {
    line.split(',')
        .map(|tok| tok.trim().parse::<f64>().unwrap_or(f64::NAN))
        .collect()
}

/// Reads an Abaqus/CalculiX deck from disk.
pub fn read_inp(path: impl AsRef<Path>) -> Result<AbaqusModel> {
    let path = path.as_ref();
    let deck = Deck::parse_file(path).map_err(IoError::Deck)?;
    build_model(&deck)
}

pub fn read_inp_str(raw: &str) -> Result<AbaqusModel> {
    let deck = Deck::parse_str(raw).map_err(IoError::Deck)?;
    build_model(&deck)
}

fn build_model(deck: &Deck) -> Result<AbaqusModel> {
    let mut labels: Vec<usize> = Vec::new();
    let mut label_to_index: HashMap<usize, usize> = HashMap::new();
    let mut coords: Vec<nalgebra::Vector3<f64>> = Vec::new();

    let mut element_type: Option<ElementType> = None;
    let mut connectivity: Vec<Vec<usize>> = Vec::new();

    for card in &deck.cards {
        match card.keyword.to_ascii_uppercase().as_str() {
            "NODE" => {
                for line in &card.data_lines {
                    let row = parse_data_row(line);
                    if row.len() < 4 {
                        return Err(IoError::MalformedCard {
                            keyword: "NODE".to_string(),
                            message: format!("expected label,x,y,z, got `{line}`"),
                        });
                    }
                    let label = row[0] as usize;
                    label_to_index.insert(label, labels.len());
                    labels.push(label);
                    coords.push(nalgebra::Vector3::new(row[1], row[2], row[3]));
                }
            }
            "ELEMENT" => {
                let type_value = card.param("TYPE").ok_or_else(|| IoError::MalformedCard {
                    keyword: "ELEMENT".to_string(),
                    message: "missing TYPE=".to_string(),
                })?;
                let this_type = element_type_for_keyword(type_value)?;
                if let Some(existing) = element_type {
                    if existing != this_type {
                        return Err(IoError::MalformedCard {
                            keyword: "ELEMENT".to_string(),
                            message: "mixed element types in a single deck are not supported"
                                .to_string(),
                        });
                    }
                }
                element_type = Some(this_type);

                for line in &card.data_lines {
                    let row = parse_data_row(line);
                    // First token is the element label, the rest are node labels.
                    let conn: Vec<usize> = row[1..]
                        .iter()
                        .map(|&label| {
                            label_to_index.get(&(label as usize)).copied().ok_or_else(|| {
                                IoError::MalformedCard {
                                    keyword: "ELEMENT".to_string(),
                                    message: format!("unknown node label {label}"),
                                }
                            })
                        })
                        .collect::<Result<_>>()?;
                    connectivity.push(conn);
                }
            }
            other => log::trace!("ignoring unrecognized keyword *{other}"),
        }
    }

    let element_type = element_type.ok_or_else(|| IoError::MalformedCard {
        keyword: "ELEMENT".to_string(),
        message: "deck contains no *ELEMENT card".to_string(),
    })?;

    let mut mesh = Mesh::new(element_type, coords, connectivity, None)?;

    for card in &deck.cards {
        match card.keyword.to_ascii_uppercase().as_str() {
            "BOUNDARY" => apply_boundary(card, &label_to_index, &mut mesh)?,
            "CLOAD" => apply_cload(card, &label_to_index, &mut mesh)?,
            _ => {}
        }
    }

    Ok(AbaqusModel { mesh, label_to_index })
}

fn apply_boundary(
    card: &Card,
    label_to_index: &HashMap<usize, usize>,
    mesh: &mut Mesh,
) -> Result<()> {
    for line in &card.data_lines {
        let row = parse_data_row(line);
        if row.len() < 2 {
            continue;
        }
        let node = label_to_index
            .get(&(row[0] as usize))
            .copied()
            .ok_or_else(|| IoError::MalformedCard {
                keyword: "BOUNDARY".to_string(),
                message: format!("unknown node label {}", row[0]),
            })?;
        let first_dof = row[1] as usize;
        let last_dof = if row.len() >= 3 { row[2] as usize } else { first_dof };
        let value = if row.len() >= 4 { row[3] } else { 0.0 };
        for dof in first_dof..=last_dof {
            if dof == 0 || dof > 3 {
                continue;
            }
            mesh.fix_dofs(node, &[dof - 1], value);
        }
    }
    Ok(())
}

fn apply_cload(
    card: &Card,
    label_to_index: &HashMap<usize, usize>,
    mesh: &mut Mesh,
) -> Result<()> {
    for line in &card.data_lines {
        let row = parse_data_row(line);
        if row.len() < 3 {
            continue;
        }
        let node = label_to_index
            .get(&(row[0] as usize))
            .copied()
            .ok_or_else(|| IoError::MalformedCard {
                keyword: "CLOAD".to_string(),
                message: format!("unknown node label {}", row[0]),
            })?;
        let dof = row[1] as usize;
        if dof == 0 || dof > 3 {
            continue;
        }
        mesh.f_ext[node][dof - 1] += row[2];
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DECK: &str = "\
*NODE
1, 0.0, 0.0, 0.0
2, 1.0, 0.0, 0.0
3, 0.0, 1.0, 0.0
4, 0.0, 0.0, 1.0
*ELEMENT, TYPE=C3D4
1, 1, 2, 3, 4
*BOUNDARY
1, 1, 3
*CLOAD
2, 1, 1000.0
";

    #[test]
    fn reads_single_tet_deck() {
        let model = read_inp_str(DECK).unwrap();
        assert_eq!(model.mesh.n_nodes, 4);
        assert_eq!(model.mesh.n_elements, 1);
        assert_eq!(model.mesh.element_type, ElementType::Tet4);
        assert!(model.mesh.fixed[0].iter().all(|&b| b));
        assert_eq!(model.mesh.f_ext[1][0], 1000.0);
    }

    #[test]
    fn rejects_unknown_element_type() {
        let bad = DECK.replace("C3D4", "CQUUX");
        assert!(read_inp_str(&bad).is_err());
    }
}
