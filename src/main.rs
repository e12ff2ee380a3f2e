//! Replays a recorded annotation session and prints the resulting entry.
//!
//! ```text
//! entry-replay <config.json> <session.json> [--minimal] [--user-only]
//! ```
//!
//! The log level comes from the project configuration and can be overridden
//! with `RUST_LOG`.

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    use std::process::ExitCode;

    match cli::Args::parse(std::env::args().skip(1)) {
        Ok(args) => match cli::run(&args) {
            Ok(output) => {
                println!("{output}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                log::error!("Replay failed: {}", e);
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        },
        Err(usage) => {
            eprintln!("{usage}");
            ExitCode::from(2)
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::path::PathBuf;

    use entry_core::{ProjectConfig, ReplayError, Session, surface::NullSurface};

    const USAGE: &str = "Usage: entry-replay <config.json> <session.json> [--minimal] [--user-only]";

    /// Command line arguments.
    #[derive(Debug, PartialEq, Eq)]
    pub struct Args {
        pub config: PathBuf,
        pub session: PathBuf,
        pub minimal: bool,
        pub user_only: bool,
    }

    impl Args {
        pub fn parse(args: impl Iterator<Item = String>) -> Result<Self, String> {
            let mut paths = Vec::new();
            let mut minimal = false;
            let mut user_only = false;
            for arg in args {
                match arg.as_str() {
                    "--minimal" => minimal = true,
                    "--user-only" => user_only = true,
                    "-h" | "--help" => return Err(USAGE.to_string()),
                    flag if flag.starts_with("--") => {
                        return Err(format!("Unknown option '{flag}'\n{USAGE}"));
                    }
                    _ => paths.push(PathBuf::from(arg)),
                }
            }
            let [config, session]: [PathBuf; 2] = paths
                .try_into()
                .map_err(|_| USAGE.to_string())?;
            Ok(Self {
                config,
                session,
                minimal,
                user_only,
            })
        }
    }

    /// Load both files, replay the session and return the record as JSON.
    pub fn run(args: &Args) -> Result<String, ReplayError> {
        let config = ProjectConfig::load(&args.config)?;
        env_logger::Builder::new()
            .filter_level(config.log_level.to_level_filter())
            .parse_default_env()
            .init();
        log::info!("📂 Loaded project configuration from {:?}", args.config);

        let session = Session::load(&args.session)?;
        let entry = session.replay(&config, Box::new(NullSurface))?;
        let record = entry.serialize(args.minimal, args.user_only);
        Ok(record.to_json()?)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn parse(args: &[&str]) -> Result<Args, String> {
            Args::parse(args.iter().map(|s| s.to_string()))
        }

        #[test]
        fn test_parse_args() {
            let args = parse(&["cfg.json", "--user-only", "s.json"]).unwrap();
            assert_eq!(args.config, PathBuf::from("cfg.json"));
            assert_eq!(args.session, PathBuf::from("s.json"));
            assert!(args.user_only);
            assert!(!args.minimal);
        }

        #[test]
        fn test_parse_args_rejects_bad_input() {
            assert!(parse(&["only-one.json"]).is_err());
            assert!(parse(&["a", "b", "c"]).is_err());
            assert!(parse(&["a", "b", "--verbose"]).is_err());
        }
    }
}

// WASM builds use the library directly.
#[cfg(target_arch = "wasm32")]
fn main() {}
