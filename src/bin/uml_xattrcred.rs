//! uml_xattrcred - store ownership and permissions as UML hostfs attributes

use uml_xattrcred::cli::args::{CliArgs, parse_args};
use uml_xattrcred::cli::output::{exit_status, failure_breakdown, format_summary, write_json};
use uml_xattrcred::services::attrs::memory::MemoryStore;
use uml_xattrcred::services::attrs::stat::SystemMetadata;
use uml_xattrcred::services::limits::{ProcessLimits, raise_descriptor_limit};
use uml_xattrcred::{WalkOptions, WalkReport, Walker};
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    // Help and version win wherever they appear, as long as they are not
    // the value of --max-depth.
    let flags = || {
        args[1..]
            .iter()
            .enumerate()
            .filter(|(i, _)| args[*i] != "--max-depth")
            .map(|(_, arg)| arg.as_str())
    };
    if flags().any(|arg| matches!(arg, "--help" | "-h")) {
        print_help();
        process::exit(1);
    }
    if flags().any(|arg| matches!(arg, "--version" | "-v")) {
        print_version();
        return;
    }

    let cli_args = match parse_args(&args) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {e}");
            print_usage();
            process::exit(1);
        }
    };

    // Diagnostics are the tool's output, so show info by default.
    // RUST_LOG still takes precedence, e.g. RUST_LOG=debug uml_xattrcred /srv/root
    let default_filter = if cli_args.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    process::exit(run(&cli_args));
}

fn run(args: &CliArgs) -> i32 {
    let limits = raise_descriptor_limit(&ProcessLimits);

    let opts = WalkOptions {
        max_depth: args.max_depth.or_else(|| limits.max_safe_depth()),
        // Only the JSON report lists diagnostics; the log already has them.
        discard_diagnostics: !args.json,
    };
    if let Some(depth) = opts.max_depth {
        log::debug!("Walking at most {depth} levels deep");
    }

    let root = Path::new(&args.path);
    let result = if args.dry_run {
        dry_run(root, opts)
    } else {
        uml_xattrcred::annotate_tree(root, &opts)
    };

    let status = exit_status(&result);
    match result {
        Ok(report) => finish(args, &report),
        Err(e) => {
            log::error!("{e}");
            log::error!("This shouldn't have happened. Aborting...");
        }
    }
    status
}

fn dry_run(root: &Path, opts: WalkOptions) -> uml_xattrcred::Result<WalkReport> {
    let mut walker = Walker::new(SystemMetadata, MemoryStore::new(), opts);
    walker.walk(root)?;
    let (store, report) = walker.into_parts();
    log::info!("Dry run: {} attributes would be written", store.write_count());
    Ok(report)
}

fn finish(args: &CliArgs, report: &WalkReport) {
    if args.json {
        if let Err(e) = write_json(std::io::stdout().lock(), report) {
            log::error!("Failed to write report: {e}");
        }
        return;
    }

    log::info!("{}", format_summary(report));
    for (kind, count) in failure_breakdown(report) {
        log::info!("  {kind:?}: {count}");
    }
}

fn print_usage() {
    eprintln!("Usage: uml_xattrcred <directory>");
}

fn print_help() {
    println!("Usage: uml_xattrcred <directory> [OPTIONS]");
    println!("Converts regular mode and ownership into extended attribute format");
    println!("used by UML (User-Mode Linux) hostfs.");
    println!("For details, check Documentation/virt/uml/user_mode_linux_howto_v2.rst");
    println!();
    println!("OPTIONS:");
    println!("    --max-depth <N>    Do not descend below depth N");
    println!("                       (default: derived from RLIMIT_NOFILE)");
    println!("    --dry-run          Query and encode everything, write nothing");
    println!("    --json             Print the run report as JSON on stdout");
    println!("    -q, --quiet        Only log failures");
    println!("    -h, --help         Show this help message");
    println!("    -v, --version      Show version information");
    println!();
    println!("Logging can be tuned with RUST_LOG (e.g. RUST_LOG=debug).");
}

fn print_version() {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const GIT_DATE: &str = env!("GIT_DATE");
    const BUILD_TARGET: &str = env!("BUILD_TARGET");

    println!("uml_xattrcred {VERSION}");
    println!("Commit: {GIT_HASH} ({GIT_DATE})");
    println!("Target: {BUILD_TARGET}");
}
