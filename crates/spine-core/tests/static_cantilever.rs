//! End-to-end linear cantilever check (spec.md §8 scenario A, 3-D analogue).

use nalgebra::Vector3;
use spine_core::elements::ElementType;
use spine_core::materials::{LinearElastic, Material};
use spine_core::mesh::Mesh;
use spine_core::{solve_linear, solve_nonlinear, NonlinearConfig};

fn cube_mesh() -> Mesh {
    let nodes = vec![
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::new(1.0, 0.0, 0.0),
        Vector3::new(1.0, 1.0, 0.0),
        Vector3::new(0.0, 1.0, 0.0),
        Vector3::new(0.0, 0.0, 1.0),
        Vector3::new(1.0, 0.0, 1.0),
        Vector3::new(1.0, 1.0, 1.0),
        Vector3::new(0.0, 1.0, 1.0),
    ];
    let conn = vec![vec![0, 1, 2, 3, 4, 5, 6, 7]];
    Mesh::new(ElementType::Hex8, nodes, conn, None).unwrap()
}

#[test]
fn hex8_cantilever_tension_matches_engineering_strain() {
    let mut mesh = cube_mesh();
    for &n in &[0usize, 3, 4, 7] {
        mesh.fix_node(n, Some([0.0, 0.0, 0.0]));
    }
    let force = 1.0e6;
    for &n in &[1usize, 2, 5, 6] {
        mesh.f_ext[n] = Vector3::new(force / 4.0, 0.0, 0.0);
    }
    let e = 200e9;
    let nu = 0.3;
    let mut materials = vec![Material::LinearElastic(LinearElastic::new(e, nu).unwrap())];

    let result = solve_linear(&mut mesh, &mut materials).unwrap();
    assert!(result.converged);

    let expected_strain = force / (e * 1.0);
    let observed_strain = (mesh.u[1][0] + mesh.u[2][0] + mesh.u[5][0] + mesh.u[6][0]) / 4.0;
    assert!((observed_strain - expected_strain).abs() / expected_strain < 0.2);
}

#[test]
fn newton_raphson_reproduces_linear_solve_for_linear_material() {
    let mut mesh_lin = cube_mesh();
    let mut mesh_nr = cube_mesh();
    for mesh in [&mut mesh_lin, &mut mesh_nr] {
        for &n in &[0usize, 3, 4, 7] {
            mesh.fix_node(n, Some([0.0, 0.0, 0.0]));
        }
        for &n in &[1usize, 2, 5, 6] {
            mesh.f_ext[n] = Vector3::new(2.5e5, 0.0, 0.0);
        }
    }

    let mut mats_lin = vec![Material::LinearElastic(LinearElastic::new(200e9, 0.3).unwrap())];
    let mut mats_nr = vec![Material::LinearElastic(LinearElastic::new(200e9, 0.3).unwrap())];

    solve_linear(&mut mesh_lin, &mut mats_lin).unwrap();
    let result = solve_nonlinear(&mut mesh_nr, &mut mats_nr, &NonlinearConfig::default(), |_| true).unwrap();

    assert!(result.converged);
    for n in 0..mesh_lin.n_nodes {
        assert!((mesh_lin.u[n] - mesh_nr.u[n]).norm() < 1e-6 * mesh_lin.u[1].norm().max(1e-9));
    }
}
