//! CLI argument parsing

#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub path: String,
    pub max_depth: Option<u16>,
    pub json: bool,
    pub quiet: bool,
    pub dry_run: bool,
}

/// Parse command line arguments (`args[0]` is the program name).
///
/// `--help` and `--version` are handled by the binary before parsing.
pub fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut cli_args = CliArgs::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--max-depth" => {
                i += 1;
                if i >= args.len() {
                    return Err("--max-depth requires a value".to_string());
                }
                cli_args.max_depth = Some(
                    args[i]
                        .parse()
                        .map_err(|_| "--max-depth must be a number".to_string())?,
                );
            }
            "--json" => {
                cli_args.json = true;
            }
            "--quiet" | "-q" => {
                cli_args.quiet = true;
            }
            "--dry-run" => {
                cli_args.dry_run = true;
            }
            arg if !arg.starts_with('-') || arg == "-" => {
                if cli_args.path.is_empty() {
                    cli_args.path = arg.to_string();
                } else {
                    return Err(format!("Unexpected argument: {arg}"));
                }
            }
            _ => return Err(format!("Unknown option: {}", args[i])),
        }
        i += 1;
    }

    if cli_args.path.is_empty() {
        return Err("Missing required argument: DIRECTORY".to_string());
    }

    Ok(cli_args)
}
