use crate::config::types::{BridgeError, Result, USAGE};
use crate::config::BridgeConfig;
use crate::core::supervisor;
use crate::utils::env_translate::{inherited_environment, translate_environment};
use crate::utils::path_convert::PathConverter;
use anyhow::Context;
use clap::Parser;
use std::ffi::OsString;

/// The whole command line of the child is one argument; flags are not
/// interpreted so `--help` and friends reach the child untouched.
#[derive(Parser, Debug)]
#[command(
    name = "breakbridge",
    about = "Run a command in its own process group and relay interrupts to it",
    disable_help_flag = true,
    disable_version_flag = true
)]
struct Cli {
    /// Full command line of the child, quoted as one argument
    #[arg(allow_hyphen_values = true)]
    command_line: String,
}

/// Enforce the single-argument contract.
///
/// The count is checked on the raw arguments so clap's own tokens (`--`,
/// `--help`) can neither add nor remove one. The single argument is then
/// handed to clap behind `--`, where it is always a positional value.
pub fn parse_command_line<I, T>(args: I) -> Result<String>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    let [program, command_line] = args.as_slice() else {
        log::debug!("expected exactly one argument, got {}", args.len().saturating_sub(1));
        return Err(BridgeError::Usage);
    };

    let argv = [program.clone(), OsString::from("--"), command_line.clone()];
    Cli::try_parse_from(argv)
        .map(|cli| cli.command_line)
        .map_err(|e| {
            log::debug!("argument parsing failed: {}", e);
            BridgeError::Usage
        })
}

/// Full invocation: arguments, config, environment, child lifecycle.
pub fn execute<I, T>(args: I) -> Result<i32>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let command_line = parse_command_line(args)?;

    let config = BridgeConfig::load()?;
    let converter = PathConverter::new(&config);
    let env = translate_environment(&inherited_environment(), &converter)?;
    log::debug!(
        "Translated environment block: {} bytes, root {:?}",
        env.len(),
        config.root
    );

    supervisor::run(&command_line, env)
}

/// Text written to stderr when the bridge itself fails.
pub fn diagnostic(err: &BridgeError) -> String {
    match err {
        BridgeError::Usage => USAGE.to_string(),
        other => format!("breakbridge: {}", other),
    }
}

pub fn run() -> anyhow::Result<i32> {
    // Initialize logging; RUST_LOG controls verbosity
    env_logger::try_init().context("failed to initialize logging")?;

    match execute(std::env::args_os()) {
        Ok(code) => Ok(code),
        Err(e) => {
            log::debug!("bridge failed: {:?}", e);
            eprintln!("{}", diagnostic(&e));
            Ok(e.exit_status())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_argument_accepted() {
        assert_eq!(
            parse_command_line(["breakbridge", "app.exe --verbose"]).unwrap(),
            "app.exe --verbose"
        );
    }

    #[test]
    fn test_flag_like_argument_is_the_command_line() {
        assert_eq!(
            parse_command_line(["breakbridge", "--help"]).unwrap(),
            "--help"
        );
        assert_eq!(parse_command_line(["breakbridge", "-V"]).unwrap(), "-V");
    }

    #[test]
    fn test_wrong_argument_count_is_usage_error() {
        assert!(matches!(
            parse_command_line(["breakbridge"]),
            Err(BridgeError::Usage)
        ));
        assert!(matches!(
            parse_command_line(["breakbridge", "a", "b"]),
            Err(BridgeError::Usage)
        ));
    }

    #[test]
    fn test_double_dash_counts_as_an_argument() {
        assert!(matches!(
            parse_command_line(["breakbridge", "--", "/bin/true"]),
            Err(BridgeError::Usage)
        ));
        assert!(matches!(
            parse_command_line(["breakbridge", "/bin/true", "--"]),
            Err(BridgeError::Usage)
        ));
        assert!(matches!(
            parse_command_line(["breakbridge", "/bin/true", "--help"]),
            Err(BridgeError::Usage)
        ));
    }

    #[test]
    fn test_lone_double_dash_is_the_command_line() {
        assert_eq!(parse_command_line(["breakbridge", "--"]).unwrap(), "--");
        assert_eq!(
            parse_command_line(["breakbridge", "-- app.exe"]).unwrap(),
            "-- app.exe"
        );
    }

    #[test]
    fn test_diagnostic_format() {
        assert_eq!(diagnostic(&BridgeError::Usage), USAGE);
        assert_eq!(
            diagnostic(&BridgeError::Spawn("tool.exe: not found".to_string())),
            "breakbridge: failed to create process: tool.exe: not found"
        );
    }

    #[test]
    fn test_usage_error_spawns_nothing() {
        // no child: execute fails before touching config or environment
        assert!(matches!(
            execute(["breakbridge", "/bin/true", "extra"]),
            Err(BridgeError::Usage)
        ));
        assert!(matches!(
            execute(["breakbridge", "--", "/bin/true"]),
            Err(BridgeError::Usage)
        ));
    }
}
