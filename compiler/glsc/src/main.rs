//! glsc compiler CLI.
//!
//! Units arrive as JSON-serialized `CompilationUnit` files produced by the
//! host's parser; the CLI runs the build pipeline over them in sorted order
//! and reports the queued diagnostics at the end.

use std::path::{Path, PathBuf};

use glsc::{compile_unit, finish, BuildContext, BuildOptions, CompilationUnit};
use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    match args[1].as_str() {
        "build" => {
            if args.len() < 3 {
                eprintln!("Usage: glsc build <unit.json>... [options]");
                eprintln!();
                eprintln!("Options:");
                eprintln!("  --optimize     Brace elision and slot reuse");
                eprintln!("  --obfuscate    Rename identifiers");
                eprintln!("  -o <dir>       Write outputs into <dir> (default: stdout)");
                std::process::exit(1);
            }
            run_build(&args[2..]);
        }
        "check" => {
            if args.len() < 3 {
                eprintln!("Usage: glsc check <unit.json>...");
                std::process::exit(1);
            }
            run_check(&args[2..]);
        }
        "help" | "--help" | "-h" => {
            print_usage();
        }
        "version" | "--version" | "-v" => {
            println!("glsc {}", env!("CARGO_PKG_VERSION"));
        }
        command => {
            eprintln!("Unknown command: {command}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("GLSC_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_build(args: &[String]) {
    // Parse options, handling -o specially (needs lookahead)
    let mut options = BuildOptions::default();
    let mut out_dir: Option<PathBuf> = None;
    let mut inputs: Vec<PathBuf> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--optimize" => options.optimize = true,
            "--obfuscate" => options.obfuscate = true,
            "-o" if i + 1 < args.len() => {
                out_dir = Some(PathBuf::from(&args[i + 1]));
                i += 1;
            }
            flag if flag.starts_with('-') => {
                eprintln!("error: unknown option '{flag}'");
                std::process::exit(1);
            }
            path => inputs.push(PathBuf::from(path)),
        }
        i += 1;
    }

    let mut ctx = BuildContext::new(options);
    for path in sorted_inputs(inputs) {
        let mut unit = load_unit(&path);
        match compile_unit(&mut unit, &mut ctx) {
            Ok(source) => write_output(&path, &unit.file, &source, out_dir.as_deref()),
            // The abort is already queued with its code; report everything
            // gathered so far and stop.
            Err(_) => return report_and_exit(ctx),
        }
    }

    report_and_exit(ctx);
}

fn run_check(args: &[String]) {
    let inputs = args.iter().map(PathBuf::from).collect();
    let mut ctx = BuildContext::default();
    for path in sorted_inputs(inputs) {
        let mut unit = load_unit(&path);
        if compile_unit(&mut unit, &mut ctx).is_err() {
            return report_and_exit(ctx);
        }
    }

    report_and_exit(ctx);
}

/// Shared-name allocation is order dependent, so builds always consume
/// their inputs in sorted order regardless of how they were passed.
fn sorted_inputs(mut inputs: Vec<PathBuf>) -> Vec<PathBuf> {
    if inputs.is_empty() {
        eprintln!("error: no input units");
        std::process::exit(1);
    }
    inputs.sort();
    inputs
}

fn load_unit(path: &Path) -> CompilationUnit {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("{}: error: {err}", path.display());
            std::process::exit(1);
        }
    };
    match serde_json::from_str(&text) {
        Ok(unit) => unit,
        Err(err) => {
            eprintln!("{}: error: invalid unit: {err}", path.display());
            std::process::exit(1);
        }
    }
}

fn write_output(input: &Path, unit_file: &str, source: &str, out_dir: Option<&Path>) {
    let Some(dir) = out_dir else {
        print!("{source}");
        return;
    };
    if let Err(err) = std::fs::create_dir_all(dir) {
        eprintln!("error: cannot create {}: {err}", dir.display());
        std::process::exit(1);
    }
    let name = Path::new(unit_file)
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut stem = input.file_stem().map(ToOwned::to_owned).unwrap_or_default();
            stem.push(".glsl");
            PathBuf::from(stem)
        });
    let target = dir.join(name);
    if let Err(err) = std::fs::write(&target, source) {
        eprintln!("error: cannot write {}: {err}", target.display());
        std::process::exit(1);
    }
}

fn report_and_exit(ctx: BuildContext) {
    let queue = finish(ctx);
    for diagnostic in queue.iter() {
        eprintln!("{diagnostic}");
    }
    if queue.has_errors() {
        eprintln!(
            "error: build failed with {} error(s)",
            queue.error_count()
        );
        std::process::exit(1);
    }
}

fn print_usage() {
    println!("glsc shader compiler");
    println!();
    println!("Usage: glsc <command> [options]");
    println!();
    println!("Commands:");
    println!("  build <unit.json>...  Compile units and emit transformed GLSL");
    println!("  check <unit.json>...  Run analysis only (no output)");
    println!("  help                  Show this help message");
    println!("  version               Show version information");
    println!();
    println!("Build options:");
    println!("  --optimize            Brace elision and declaration slot reuse");
    println!("  --obfuscate           Rename identifiers (varyings consistently across units)");
    println!("  -o <dir>              Write outputs into <dir> (default: stdout)");
    println!();
    println!("Environment:");
    println!("  GLSC_LOG              Tracing filter (e.g. debug, glsc=trace)");
    println!();
    println!("Examples:");
    println!("  glsc build vertex.json fragment.json --obfuscate -o out/");
    println!("  glsc check fragment.json");
    println!("  GLSC_LOG=debug glsc build fragment.json --optimize");
}
