///! VTK/VTU writer for ParaView visualization.
///!
///! Converts a solved [`spine_core::mesh::Mesh`] into VTK formats.
///! Supports both legacy VTK format (.vtk) and XML VTU format (.vtu), plus
///! a PVD collection file for a series of time steps.
///!
///! ## Usage
///!
///! ```rust,no_run
///! use spine_io::vtk_writer::VtkWriter;
///! use spine_core::mesh::Mesh;
///! use spine_core::elements::ElementType;
///!
///! let mesh = Mesh::new(ElementType::Tet4, vec![], vec![], None)?;
///! let writer = VtkWriter::new(&mesh);
///! writer.write_vtk("output.vtk")?;
///! # Ok::<(), Box<dyn std::error::Error>>(())
///! ```

use spine_core::mesh::Mesh;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VtkFormat {
    Ascii,
    Binary,
}

#[derive(Debug, Clone, Copy)]
#[allow(dead_code)]
enum VtkCellType {
    Triangle = 5,
    Quad = 9,
    Tetra = 10,
    Hexahedron = 12,
}

fn vtk_cell_type(npe: usize, dim: usize) -> VtkCellType {
    match (npe, dim) {
        (3, 2) => VtkCellType::Triangle,
        (4, 2) => VtkCellType::Quad,
        (4, 3) => VtkCellType::Tetra,
        (8, 3) => VtkCellType::Hexahedron,
        _ => VtkCellType::Tetra,
    }
}

/// Writes a single mesh state. `format` only affects `write_vtu`; legacy
/// `.vtk` is always ASCII, matching the rest of this workspace's
/// human-readable-by-default output conventions.
pub struct VtkWriter<'a> {
    mesh: &'a Mesh,
}

impl<'a> VtkWriter<'a> {
    pub fn new(mesh: &'a Mesh) -> Self {
        Self { mesh }
    }

    pub fn write_vtk<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut file = File::create(path)?;
        writeln!(file, "# vtk DataFile Version 3.0")?;
        writeln!(file, "spine-sim mesh export")?;
        writeln!(file, "ASCII")?;
        writeln!(file, "DATASET UNSTRUCTURED_GRID")?;
        self.write_points(&mut file)?;
        self.write_cells(&mut file)?;
        self.write_point_data(&mut file)?;
        Ok(())
    }

    pub fn write_vtu<P: AsRef<Path>>(&self, path: P, _format: VtkFormat) -> io::Result<()> {
        let mut file = File::create(path)?;
        let npe = self.mesh.element_type.n_nodes();
        let dim = self.mesh.element_type.dim();

        writeln!(file, "<?xml version=\"1.0\"?>")?;
        writeln!(file, "<VTKFile type=\"UnstructuredGrid\" version=\"1.0\" byte_order=\"LittleEndian\">")?;
        writeln!(file, "  <UnstructuredGrid>")?;
        writeln!(
            file,
            "    <Piece NumberOfPoints=\"{}\" NumberOfCells=\"{}\">",
            self.mesh.n_nodes, self.mesh.n_elements
        )?;

        writeln!(file, "      <Points>")?;
        writeln!(file, "        <DataArray type=\"Float64\" NumberOfComponents=\"3\" format=\"ascii\">")?;
        for p in &self.mesh.x_ref {
            writeln!(file, "          {} {} {}", p.x, p.y, p.z)?;
        }
        writeln!(file, "        </DataArray>")?;
        writeln!(file, "      </Points>")?;

        writeln!(file, "      <Cells>")?;
        writeln!(file, "        <DataArray type=\"Int64\" Name=\"connectivity\" format=\"ascii\">")?;
        for conn in &self.mesh.connectivity {
            let row: Vec<String> = conn.iter().map(|n| n.to_string()).collect();
            writeln!(file, "          {}", row.join(" "))?;
        }
        writeln!(file, "        </DataArray>")?;
        writeln!(file, "        <DataArray type=\"Int64\" Name=\"offsets\" format=\"ascii\">")?;
        for e in 1..=self.mesh.n_elements {
            writeln!(file, "          {}", e * npe)?;
        }
        writeln!(file, "        </DataArray>")?;
        writeln!(file, "        <DataArray type=\"UInt8\" Name=\"types\" format=\"ascii\">")?;
        let cell_type = vtk_cell_type(npe, dim) as i32;
        for _ in 0..self.mesh.n_elements {
            writeln!(file, "          {cell_type}")?;
        }
        writeln!(file, "        </DataArray>")?;
        writeln!(file, "      </Cells>")?;

        writeln!(file, "      <PointData Vectors=\"displacement\">")?;
        writeln!(file, "        <DataArray type=\"Float64\" Name=\"displacement\" NumberOfComponents=\"3\" format=\"ascii\">")?;
        for u in &self.mesh.u {
            writeln!(file, "          {} {} {}", u.x, u.y, u.z)?;
        }
        writeln!(file, "        </DataArray>")?;
        writeln!(file, "      </PointData>")?;

        writeln!(file, "    </Piece>")?;
        writeln!(file, "  </UnstructuredGrid>")?;
        writeln!(file, "</VTKFile>")?;
        Ok(())
    }

    fn write_points(&self, file: &mut File) -> io::Result<()> {
        writeln!(file, "POINTS {} float", self.mesh.n_nodes)?;
        for p in &self.mesh.x_ref {
            writeln!(file, "{} {} {}", p.x, p.y, p.z)?;
        }
        Ok(())
    }

    fn write_cells(&self, file: &mut File) -> io::Result<()> {
        let npe = self.mesh.element_type.n_nodes();
        let dim = self.mesh.element_type.dim();
        let total_size = self.mesh.n_elements * (npe + 1);
        writeln!(file, "CELLS {} {}", self.mesh.n_elements, total_size)?;
        for conn in &self.mesh.connectivity {
            let row: Vec<String> = conn.iter().map(|n| n.to_string()).collect();
            writeln!(file, "{} {}", conn.len(), row.join(" "))?;
        }
        writeln!(file, "CELL_TYPES {}", self.mesh.n_elements)?;
        let cell_type = vtk_cell_type(npe, dim) as i32;
        for _ in 0..self.mesh.n_elements {
            writeln!(file, "{cell_type}")?;
        }
        Ok(())
    }

    fn write_point_data(&self, file: &mut File) -> io::Result<()> {
        writeln!(file, "POINT_DATA {}", self.mesh.n_nodes)?;
        writeln!(file, "VECTORS displacement float")?;
        for u in &self.mesh.u {
            writeln!(file, "{} {} {}", u.x, u.y, u.z)?;
        }
        Ok(())
    }
}

/// Writes a `.pvd` collection referencing one `.vtu` per time step, the
/// way ParaView expects a transient series to be indexed.
pub fn write_pvd<P: AsRef<Path>>(path: P, entries: &[(f64, String)]) -> io::Result<()> {
    let mut file = File::create(path)?;
    writeln!(file, "<?xml version=\"1.0\"?>")?;
    writeln!(file, "<VTKFile type=\"Collection\" version=\"0.1\">")?;
    writeln!(file, "  <Collection>")?;
    for (time, vtu_path) in entries {
        writeln!(file, "    <DataSet timestep=\"{time}\" file=\"{vtu_path}\"/>")?;
    }
    writeln!(file, "  </Collection>")?;
    writeln!(file, "</VTKFile>")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use spine_core::elements::ElementType;
    use tempfile::tempdir;

    fn unit_tet() -> Mesh {
        use nalgebra::Vector3;
        let nodes = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
        ];
        Mesh::new(ElementType::Tet4, nodes, vec![vec![0, 1, 2, 3]], None).unwrap()
    }

    #[test]
    fn writes_legacy_vtk_without_error() {
        let mesh = unit_tet();
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.vtk");
        VtkWriter::new(&mesh).write_vtk(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn writes_vtu_without_error() {
        let mesh = unit_tet();
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.vtu");
        VtkWriter::new(&mesh).write_vtu(&path, VtkFormat::Ascii).unwrap();
        assert!(path.exists());
    }
}
