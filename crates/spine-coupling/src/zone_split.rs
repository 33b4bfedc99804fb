//! Zone splitter: partitions a mesh into an FEM sub-mesh and a PD particle
//! set across a shared node interface (spec.md §3 `ZoneSplit`, §4.10).

use nalgebra::Vector3;
use std::collections::HashMap;

pub struct FemSubMesh {
    pub nodes: Vec<Vector3<f64>>,
    pub connectivity: Vec<Vec<usize>>,
    /// local node index -> global node index.
    pub local_to_global: Vec<usize>,
    pub global_to_local: HashMap<usize, usize>,
}

pub struct PdParticleSet {
    pub positions: Vec<Vector3<f64>>,
    pub volumes: Vec<f64>,
    pub local_to_global: Vec<usize>,
    pub global_to_local: HashMap<usize, usize>,
}

pub struct InterfaceSet {
    /// Global node indices shared by both zones.
    pub global_indices: Vec<usize>,
    pub fem_local: Vec<usize>,
    pub pd_local: Vec<usize>,
}

pub struct ZoneSplit {
    pub fem: FemSubMesh,
    pub pd: PdParticleSet,
    pub interface: InterfaceSet,
}

/// `pd_element_mask[e] == true` routes element `e`'s contribution to the PD
/// zone; `false` keeps it in the FEM sub-mesh. Every node touched by both a
/// kept FEM element and a PD element becomes an interface node — per
/// spec.md §4.10, particles at the interface coincide exactly with FEM node
/// positions (no interpolation).
pub fn split(
    nodes: &[Vector3<f64>],
    connectivity: &[Vec<usize>],
    reference_volume: &[f64],
    pd_element_mask: &[bool],
) -> ZoneSplit {
    let mut fem_nodes_global: Vec<usize> = Vec::new();
    let mut fem_global_to_local: HashMap<usize, usize> = HashMap::new();
    let mut fem_connectivity: Vec<Vec<usize>> = Vec::new();

    let mut pd_volume_by_node: HashMap<usize, f64> = HashMap::new();

    let mut fem_touch: std::collections::HashSet<usize> = std::collections::HashSet::new();
    let mut pd_touch: std::collections::HashSet<usize> = std::collections::HashSet::new();

    for (e, conn) in connectivity.iter().enumerate() {
        if pd_element_mask[e] {
            let npe = conn.len() as f64;
            let v_per_node = reference_volume[e] / npe;
            for &g in conn {
                *pd_volume_by_node.entry(g).or_insert(0.0) += v_per_node;
                pd_touch.insert(g);
            }
        } else {
            let local_conn: Vec<usize> = conn
                .iter()
                .map(|&g| {
                    *fem_global_to_local.entry(g).or_insert_with(|| {
                        fem_nodes_global.push(g);
                        fem_nodes_global.len() - 1
                    })
                })
                .collect();
            fem_connectivity.push(local_conn);
            for &g in conn {
                fem_touch.insert(g);
            }
        }
    }

    let fem_node_coords: Vec<Vector3<f64>> = fem_nodes_global.iter().map(|&g| nodes[g]).collect();

    let mut pd_global: Vec<usize> = pd_volume_by_node.keys().copied().collect();
    pd_global.sort_unstable();
    let mut pd_global_to_local: HashMap<usize, usize> = HashMap::new();
    let mut pd_positions = Vec::with_capacity(pd_global.len());
    let mut pd_volumes = Vec::with_capacity(pd_global.len());
    for (local, &g) in pd_global.iter().enumerate() {
        pd_global_to_local.insert(g, local);
        pd_positions.push(nodes[g]);
        pd_volumes.push(pd_volume_by_node[&g]);
    }

    let mut interface_global: Vec<usize> = fem_touch.intersection(&pd_touch).copied().collect();
    interface_global.sort_unstable();
    let fem_local: Vec<usize> = interface_global.iter().map(|g| fem_global_to_local[g]).collect();
    let pd_local: Vec<usize> = interface_global.iter().map(|g| pd_global_to_local[g]).collect();

    ZoneSplit {
        fem: FemSubMesh {
            nodes: fem_node_coords,
            connectivity: fem_connectivity,
            local_to_global: fem_nodes_global,
            global_to_local: fem_global_to_local,
        },
        pd: PdParticleSet {
            positions: pd_positions,
            volumes: pd_volumes,
            local_to_global: pd_global,
            global_to_local: pd_global_to_local,
        },
        interface: InterfaceSet { global_indices: interface_global, fem_local, pd_local },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_of_two_quads() -> (Vec<Vector3<f64>>, Vec<Vec<usize>>, Vec<f64>) {
        // Two QUAD4 elements sharing an edge: nodes 0..3 left quad, 2,3,4,5 right quad.
        let nodes = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(2.0, 0.0, 0.0),
            Vector3::new(2.0, 1.0, 0.0),
        ];
        let conn = vec![vec![0, 1, 2, 3], vec![1, 4, 5, 2]];
        let volumes = vec![1.0, 1.0];
        (nodes, conn, volumes)
    }

    #[test]
    fn shared_edge_nodes_become_the_interface() {
        let (nodes, conn, volumes) = line_of_two_quads();
        let split_result = split(&nodes, &conn, &volumes, &[false, true]);
        assert_eq!(split_result.fem.connectivity.len(), 1);
        assert_eq!(split_result.pd.positions.len(), 4);
        assert_eq!(split_result.interface.global_indices, vec![1, 2]);
    }

    #[test]
    fn pd_particle_volume_is_distributed_evenly_across_element_nodes() {
        let (nodes, conn, volumes) = line_of_two_quads();
        let split_result = split(&nodes, &conn, &volumes, &[false, true]);
        for &v in &split_result.pd.volumes {
            assert!((v - 0.25).abs() < 1e-12);
        }
    }
}
