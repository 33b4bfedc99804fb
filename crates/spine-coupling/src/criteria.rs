//! Switching criteria: decide which FEM elements should be re-homed into
//! the PD zone, plus the buffer-layer dilation around them
//! (spec.md §4.10 "Switching criteria").

use nalgebra::Matrix3;
use spine_core::mesh::Mesh;
use std::collections::HashSet;

fn von_mises(sigma: &Matrix3<f64>) -> f64 {
    let (sxx, syy, szz) = (sigma[(0, 0)], sigma[(1, 1)], sigma[(2, 2)]);
    let (sxy, syz, sxz) = (sigma[(0, 1)], sigma[(1, 2)], sigma[(0, 2)]);
    let term1 = 0.5 * ((sxx - syy).powi(2) + (syy - szz).powi(2) + (szz - sxx).powi(2));
    let term2 = 3.0 * (sxy.powi(2) + syz.powi(2) + sxz.powi(2));
    (term1 + term2).sqrt()
}

fn max_principal(eps: &Matrix3<f64>) -> f64 {
    let sym = nalgebra::linalg::SymmetricEigen::new(*eps);
    sym.eigenvalues.max()
}

/// Marks element `e` for switching when any of its Gauss points exceeds
/// `threshold` von Mises stress.
pub fn von_mises_threshold(mesh: &Mesh, threshold: f64) -> Vec<bool> {
    let n_gauss = mesh.element_type.n_gauss();
    (0..mesh.n_elements)
        .map(|e| (0..n_gauss).any(|g| von_mises(&mesh.gauss[e * n_gauss + g].sigma) > threshold))
        .collect()
}

/// Marks element `e` for switching when any Gauss point's largest
/// principal strain exceeds `threshold`.
pub fn max_principal_strain_threshold(mesh: &Mesh, threshold: f64) -> Vec<bool> {
    let n_gauss = mesh.element_type.n_gauss();
    (0..mesh.n_elements)
        .map(|e| (0..n_gauss).any(|g| max_principal(&mesh.gauss[e * n_gauss + g].eps) > threshold))
        .collect()
}

/// OR-combines two element masks produced by independent criteria.
pub fn combine(a: &[bool], b: &[bool]) -> Vec<bool> {
    a.iter().zip(b).map(|(&x, &y)| x || y).collect()
}

/// Grows `seed_mask` by `layers` rounds of node-sharing adjacency (two
/// elements are adjacent when they share at least one node), so the PD
/// zone always carries a buffer ring around the criterion-triggered
/// elements.
pub fn dilate(seed_mask: &[bool], connectivity: &[Vec<usize>], layers: usize) -> Vec<bool> {
    let mut mask = seed_mask.to_vec();
    for _ in 0..layers {
        let frontier: Vec<usize> = (0..mask.len()).filter(|&e| mask[e]).collect();
        let mut frontier_nodes: HashSet<usize> = HashSet::new();
        for &e in &frontier {
            frontier_nodes.extend(connectivity[e].iter().copied());
        }
        for (e, conn) in connectivity.iter().enumerate() {
            if !mask[e] && conn.iter().any(|n| frontier_nodes.contains(n)) {
                mask[e] = true;
            }
        }
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;
    use spine_core::elements::ElementType;

    fn two_quad_mesh() -> Mesh {
        let nodes = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(2.0, 0.0, 0.0),
            Vector3::new(2.0, 1.0, 0.0),
        ];
        let conn = vec![vec![0, 1, 2, 3], vec![1, 4, 5, 2]];
        Mesh::new(ElementType::Quad4 { plane_strain: false }, nodes, conn, None).unwrap()
    }

    #[test]
    fn von_mises_threshold_flags_only_stressed_elements() {
        let mut mesh = two_quad_mesh();
        mesh.gauss[0].sigma = Matrix3::from_diagonal(&nalgebra::Vector3::new(100.0, 0.0, 0.0));
        let mask = von_mises_threshold(&mesh, 50.0);
        assert!(mask[0]);
        assert!(!mask[1]);
    }

    #[test]
    fn dilate_grows_the_mask_by_one_layer_of_shared_nodes() {
        let mesh = two_quad_mesh();
        let seed = vec![true, false];
        let grown = dilate(&seed, &mesh.connectivity, 1);
        assert!(grown[0] && grown[1]);
    }

    #[test]
    fn dilate_is_a_no_op_with_zero_layers() {
        let mesh = two_quad_mesh();
        let seed = vec![true, false];
        let grown = dilate(&seed, &mesh.connectivity, 0);
        assert_eq!(grown, seed);
    }
}
