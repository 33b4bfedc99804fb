use std::path::Path;
use std::process::ExitCode;

use spine_core::elements::ElementType;
use spine_core::materials::{LinearElastic, Material};
use spine_core::mesh::Mesh;
use spine_core::solve_result::SolveResult;
use spine_core::static_solver::{solve_linear, solve_nonlinear, NonlinearConfig};
use spine_io::read_inp;

fn usage() {
    eprintln!("usage:");
    eprintln!("  spine-cli solve <input.inp> [--nonlinear] [--youngs E] [--poisson NU] [--json]");
    eprintln!("  spine-cli scenario <name> [--nonlinear] [--json]");
    eprintln!("  spine-cli --help");
    eprintln!("  spine-cli --version");
    eprintln!();
    eprintln!("scenarios:");
    eprintln!("  cantilever   single HEX8 element, one face fixed, tip load");
    eprintln!();
    eprintln!("examples:");
    eprintln!("  spine-cli solve model.inp");
    eprintln!("  spine-cli solve model.inp --nonlinear --youngs 2.1e11 --poisson 0.3");
    eprintln!("  spine-cli scenario cantilever --json");
}

fn print_summary(mesh: &Mesh, result: &SolveResult) {
    println!("element_type: {:?}", mesh.element_type);
    println!("n_nodes: {}", mesh.n_nodes);
    println!("n_elements: {}", mesh.n_elements);
    println!("converged: {}", result.converged);
    println!("iterations: {}", result.iterations);
    println!("residual: {:.6e}", result.residual);
    println!("relative_residual: {:.6e}", result.relative_residual);
    println!("elapsed_time: {:.6}", result.elapsed_time);
    println!("cancelled: {}", result.is_cancelled());
    if let Some(reason) = result.divergence_reason {
        println!("divergence_reason: {:?}", reason);
    }
}

fn print_json(result: &SolveResult) -> Result<(), String> {
    let text = serde_json::to_string_pretty(result).map_err(|err| format!("failed to serialize result: {err}"))?;
    println!("{text}");
    Ok(())
}

struct SolveArgs {
    nonlinear: bool,
    youngs: f64,
    poisson: f64,
    json: bool,
}

impl Default for SolveArgs {
    fn default() -> Self {
        Self { nonlinear: false, youngs: 210e9, poisson: 0.3, json: false }
    }
}

fn parse_solve_flags(rest: &[String]) -> Result<SolveArgs, String> {
    let mut parsed = SolveArgs::default();
    let mut i = 0;
    while i < rest.len() {
        match rest[i].as_str() {
            "--nonlinear" => parsed.nonlinear = true,
            "--json" => parsed.json = true,
            "--youngs" => {
                i += 1;
                let value = rest.get(i).ok_or("--youngs requires a value")?;
                parsed.youngs = value.parse().map_err(|_| format!("invalid --youngs value `{value}`"))?;
            }
            "--poisson" => {
                i += 1;
                let value = rest.get(i).ok_or("--poisson requires a value")?;
                parsed.poisson = value.parse().map_err(|_| format!("invalid --poisson value `{value}`"))?;
            }
            other => return Err(format!("unrecognized flag `{other}`")),
        }
        i += 1;
    }
    Ok(parsed)
}

fn run_solve(mesh: &mut Mesh, materials: &mut [Material], args: &SolveArgs) -> Result<SolveResult, String> {
    let start = std::time::Instant::now();
    let result = if args.nonlinear {
        let config = NonlinearConfig::default();
        solve_nonlinear(mesh, materials, &config, |progress| {
            log::debug!("newton iteration {}: residual {:.3e}", progress.iter, progress.residual);
            true
        })
        .map_err(|err| err.to_string())?
    } else {
        solve_linear(mesh, materials).map_err(|err| err.to_string())?
    };
    Ok(result.with_elapsed_time(start.elapsed().as_secs_f64()))
}

fn solve_deck(path: &Path, args: &SolveArgs) -> Result<(), String> {
    let model = read_inp(path).map_err(|err| format!("{}: {}", path.display(), err))?;
    let mut mesh = model.mesh;
    let mut materials = vec![Material::LinearElastic(
        LinearElastic::new(args.youngs, args.poisson).map_err(|err| err.to_string())?,
    )];

    let result = run_solve(&mut mesh, &mut materials, args)?;
    if args.json {
        print_json(&result)
    } else {
        print_summary(&mesh, &result);
        Ok(())
    }
}

/// A single HEX8 element clamped on its `x = 0` face with a tip load on
/// the opposite face, for exercising the solver without an input deck.
fn build_cantilever_scenario(args: &SolveArgs) -> Result<(Mesh, Vec<Material>), String> {
    use nalgebra::Vector3;

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
    let connectivity = vec![vec![0, 1, 2, 3, 4, 5, 6, 7]];
    let mut mesh = Mesh::new(ElementType::Hex8, nodes, connectivity, None).map_err(|err| err.to_string())?;

    for node in [0, 3, 4, 7] {
        mesh.fix_node(node, Some([0.0, 0.0, 0.0]));
    }
    for node in [1, 2, 5, 6] {
        mesh.f_ext[node] = Vector3::new(0.0, 0.0, -1.0e4);
    }

    let materials = vec![Material::LinearElastic(
        LinearElastic::new(args.youngs, args.poisson).map_err(|err| err.to_string())?,
    )];
    Ok((mesh, materials))
}

fn solve_scenario(name: &str, args: &SolveArgs) -> Result<(), String> {
    let (mut mesh, mut materials) = match name {
        "cantilever" => build_cantilever_scenario(args)?,
        other => return Err(format!("unknown scenario `{other}`")),
    };

    let result = run_solve(&mut mesh, &mut materials, args)?;
    if args.json {
        print_json(&result)
    } else {
        print_summary(&mesh, &result);
        Ok(())
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("help") | Some("-h") | Some("--help") => {
            usage();
            ExitCode::SUCCESS
        }
        Some("--version") | Some("-V") => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Some("solve") => {
            if args.len() < 3 {
                usage();
                return ExitCode::from(2);
            }
            let path = Path::new(&args[2]);
            let flags = match parse_solve_flags(&args[3..]) {
                Ok(flags) => flags,
                Err(err) => {
                    eprintln!("argument error: {err}");
                    return ExitCode::from(2);
                }
            };
            match solve_deck(path, &flags) {
                Ok(()) => ExitCode::SUCCESS,
                Err(err) => {
                    eprintln!("solve error: {err}");
                    ExitCode::from(1)
                }
            }
        }
        Some("scenario") => {
            if args.len() < 3 {
                usage();
                return ExitCode::from(2);
            }
            let name = &args[2];
            let flags = match parse_solve_flags(&args[3..]) {
                Ok(flags) => flags,
                Err(err) => {
                    eprintln!("argument error: {err}");
                    return ExitCode::from(2);
                }
            };
            match solve_scenario(name, &flags) {
                Ok(()) => ExitCode::SUCCESS,
                Err(err) => {
                    eprintln!("scenario error: {err}");
                    ExitCode::from(1)
                }
            }
        }
        _ => {
            usage();
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_dir(prefix: &str) -> PathBuf {
        let pid = std::process::id();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be valid")
            .as_nanos();
        std::env::temp_dir().join(format!("{prefix}_{pid}_{nanos}"))
    }

    #[test]
    fn parse_solve_flags_reads_overrides() {
        let rest = vec![
            "--nonlinear".to_string(),
            "--youngs".to_string(),
            "1.5e11".to_string(),
            "--poisson".to_string(),
            "0.25".to_string(),
            "--json".to_string(),
        ];
        let parsed = parse_solve_flags(&rest).expect("flags should parse");
        assert!(parsed.nonlinear);
        assert!(parsed.json);
        assert_eq!(parsed.youngs, 1.5e11);
        assert_eq!(parsed.poisson, 0.25);
    }

    #[test]
    fn parse_solve_flags_rejects_unknown_flag() {
        let rest = vec!["--bogus".to_string()];
        assert!(parse_solve_flags(&rest).is_err());
    }

    #[test]
    fn cantilever_scenario_solves() {
        let args = SolveArgs::default();
        let (mut mesh, mut materials) = build_cantilever_scenario(&args).expect("scenario should build");
        let result = run_solve(&mut mesh, &mut materials, &args).expect("solve should succeed");
        assert!(result.converged);
    }

    #[test]
    fn solve_deck_reads_a_minimal_inp_file() {
        let root = unique_temp_dir("spine_cli_solve_deck");
        fs::create_dir_all(&root).expect("create temp dir");
        let deck = root.join("beam.inp");
        fs::write(
            &deck,
            "*NODE\n\
             1,0,0,0\n\
             2,1,0,0\n\
             3,0,1,0\n\
             4,0,0,1\n\
             *ELEMENT,TYPE=C3D4\n\
             1,1,2,3,4\n\
             *BOUNDARY\n\
             1,1,3\n\
             3,1,3\n\
             4,1,3\n\
             *CLOAD\n\
             2,1,1000.0\n",
        )
        .expect("write deck");

        let args = SolveArgs::default();
        assert!(solve_deck(&deck, &args).is_ok());
    }

    #[test]
    fn unknown_scenario_name_is_an_error() {
        let args = SolveArgs::default();
        assert!(solve_scenario("not-a-real-scenario", &args).is_err());
    }
}
