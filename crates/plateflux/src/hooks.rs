use std::path::Path;
use std::process::Command;

use tracing::{info, warn};

/// Splits a hook command line on whitespace. No shell quoting is applied.
fn command_parts(command_line: &str) -> Option<(&str, Vec<&str>)> {
    let mut parts = command_line.split_whitespace();
    let program = parts.next()?;
    Some((program, parts.collect()))
}

/// Starts the plotting command with the output file as its last argument and returns
/// whether it started. The child is not waited on; a failure to start is logged.
pub fn spawn_plot_hook(command_line: &str, output: &Path) -> bool {
    let Some((program, args)) = command_parts(command_line) else {
        warn!("Plot command is empty, skipping");
        return false;
    };

    match Command::new(program).args(&args).arg(output).spawn() {
        Ok(child) => {
            info!(
                program,
                pid = child.id(),
                output = %output.display(),
                "Started plot command"
            );
            true
        }
        Err(err) => {
            warn!(program, error = %err, "Failed to start plot command");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_is_split_into_program_and_args() {
        assert_eq!(
            command_parts("  python3 plot.py --dpi 300 "),
            Some(("python3", vec!["plot.py", "--dpi", "300"]))
        );
        assert_eq!(command_parts("gnuplot"), Some(("gnuplot", vec![])));
        assert_eq!(command_parts("   "), None);
    }

    #[test]
    fn unstartable_commands_report_failure() {
        let output = Path::new("processed_run.csv");
        assert!(!spawn_plot_hook("plateflux-no-such-plot-program-xyz", output));
        assert!(!spawn_plot_hook("  ", output));
    }

    #[cfg(unix)]
    #[test]
    fn existing_program_is_started() {
        assert!(spawn_plot_hook("true", Path::new("processed_run.csv")));
    }
}
