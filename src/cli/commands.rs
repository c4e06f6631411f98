// ============================================================
// Layer 1 — Run Mode Dispatch
// ============================================================
// Turns the mode tokens of the command line into a validated
// `Invocation`. The first token picks the mode:
//
//   --help
//   --init    <dim> [outfile]
//   --nonstop <dim> <outfile> <steps> <increment> <nthreads>
//   <infile> <steps> [increment]
//   <infile> <outfile> <steps> [increment]
//
// The two resume shapes are told apart by whether the second
// token is all digits. An input file whose name is all digits
// therefore always reads as the first shape.
//
// Numbers are checked character by character before conversion:
// "100a" is rejected outright instead of being read as 100.

use std::path::PathBuf;

use crate::application::settings::RunSettings;
use crate::domain::error::DriverError;
use crate::domain::invocation::{Dimension, Invocation, Schedule};

pub const PROGRAM: &str = "graingrowth";

/// Validate the mode tokens (program name excluded).
pub fn dispatch(tokens: &[String], settings: &RunSettings) -> Result<Invocation, DriverError> {
    let Some(first) = tokens.first() else {
        return Err(bad_argument_list());
    };

    match first.as_str() {
        "--help"    => Ok(Invocation::Help),
        "--init"    => init(&tokens[1..], settings),
        "--nonstop" => nonstop(&tokens[1..]),
        _           => resume(tokens, settings),
    }
}

/// `--init <dim> [outfile]`
fn init(args: &[String], settings: &RunSettings) -> Result<Invocation, DriverError> {
    if !(1..=2).contains(&args.len()) {
        return Err(bad_argument_list());
    }

    let dimension = parse_dimension(&args[0])?;
    let output    = args
        .get(1)
        .cloned()
        .unwrap_or_else(|| settings.default_init_file.clone());

    Ok(Invocation::InitOnly {
        dimension,
        output: PathBuf::from(output),
        workers: settings.workers,
    })
}

/// `--nonstop <dim> <outfile> <steps> <increment> <nthreads>`
fn nonstop(args: &[String]) -> Result<Invocation, DriverError> {
    let [dim, outfile, steps, increment, nthreads] = args else {
        return Err(bad_argument_list());
    };

    let dimension = parse_dimension(dim)?;
    let steps     = parse_count(steps, "number of time steps")?;
    let increment = parse_count(increment, "output increment")?;
    let schedule  = Schedule::new(steps, increment)?;

    let workers = parse_count(nthreads, "nthreads")?;
    if workers == 0 {
        return Err(DriverError::usage("nthreads must be positive"));
    }
    let workers = usize::try_from(workers)
        .map_err(|_| DriverError::usage("nthreads is out of range"))?;

    Ok(Invocation::NonStop {
        dimension,
        output: PathBuf::from(outfile),
        schedule,
        workers,
    })
}

/// `<infile> <steps> [increment]` or `<infile> <outfile> <steps> [increment]`
fn resume(args: &[String], settings: &RunSettings) -> Result<Invocation, DriverError> {
    if !(2..=4).contains(&args.len()) {
        return Err(bad_argument_list());
    }

    let input = PathBuf::from(&args[0]);
    let (output, rest) = if is_count(&args[1]) {
        (input.clone(), &args[1..])
    } else {
        (PathBuf::from(&args[1]), &args[2..])
    };

    let (steps, increment) = match rest {
        [steps]            => (steps, None),
        [steps, increment] => (steps, Some(increment)),
        _                  => return Err(bad_argument_list()),
    };

    let steps     = parse_count(steps, "number of time steps")?;
    let increment = match increment {
        Some(token) => parse_count(token, "output increment")?,
        None        => steps,
    };

    Ok(Invocation::Resume {
        input,
        output,
        schedule: Schedule::new(steps, increment)?,
        workers: settings.workers,
    })
}

fn parse_dimension(token: &str) -> Result<Dimension, DriverError> {
    if !is_count(token) {
        return Err(DriverError::usage("initial grid must have integral dimension"));
    }
    // an absurdly long digit string is still just a bad dimension
    let value = token.parse::<u64>().unwrap_or(u64::MAX);
    Dimension::try_from(value)
}

/// Parse a token that must consist of decimal digits only
fn parse_count(token: &str, what: &str) -> Result<u64, DriverError> {
    if !is_count(token) {
        return Err(DriverError::usage(format!("{what} must have integral value")));
    }
    token
        .parse()
        .map_err(|_| DriverError::usage(format!("{what} is out of range")))
}

/// Non-empty and every character a decimal digit
fn is_count(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

fn bad_argument_list() -> DriverError {
    DriverError::usage("bad argument list")
}

/// One-line diagnostic for a usage error, pointing at `--help`
pub fn usage_hint(cause: &DriverError) -> String {
    format!("{PROGRAM}: {cause}.  Use \"{PROGRAM} --help\" to generate help message.")
}

/// The line printed to stderr for any failed run
pub fn diagnostic(cause: &DriverError) -> String {
    if cause.is_usage() {
        usage_hint(cause)
    } else {
        format!("{PROGRAM}: {cause}")
    }
}

/// Full help text
pub fn usage() -> String {
    let p = PROGRAM;
    format!(
        "\
{p}: grain growth by Potts Monte-Carlo, started from a Voronoi tessellation.

Valid command lines have the form:
    {p} [--config FILE] [--quiet] --help
    {p} [--config FILE] [--quiet] --init dimension [outfile]
    {p} [--config FILE] [--quiet] --nonstop dimension outfile steps increment nthreads
    {p} [--config FILE] [--quiet] infile [outfile] steps [increment]

Examples:
    {p} --init 2
        tessellates a 2-D grid and writes it to \"voronoi.dat\".
    {p} --init 3 voronoi.dat
        tessellates a 3-D grid and writes it to \"voronoi.dat\".
    {p} polycrystal.dat 1000
        reads \"polycrystal.dat\", runs 1000 time steps and writes
        \"polycrystal.1000.dat\".
    {p} polycrystal.dat 1000 100
        as above, writing a checkpoint every 100 steps:
        \"polycrystal.0100.dat\", \"polycrystal.0200.dat\", ... \"polycrystal.1000.dat\".
    {p} voronoi.dat polycrystal.dat 1000
        reads \"voronoi.dat\", runs 1000 time steps and writes
        \"polycrystal.1000.dat\".
    {p} polycrystal.1000.dat 2000 100
        continues from iteration 1000 up to iteration 2000, writing
        \"polycrystal.1100.dat\", ... \"polycrystal.2000.dat\".
    {p} --nonstop 3 polycrystal.0000.dat 1000 100 2
        tessellates a 3-D grid into \"polycrystal.0000.dat\", then runs
        1000 time steps on 2 threads with a checkpoint every 100 steps.

Options:
    --config FILE   JSON run settings (grid size, grains, temperature, workers)
    --quiet         do not log tessellation and checkpoint timings
    -V, --version   print version

Set RUST_LOG (e.g. RUST_LOG=graingrowth=debug) to change log verbosity."
    )
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    fn run(line: &str) -> Result<Invocation, DriverError> {
        dispatch(&args(line), &RunSettings::default())
    }

    fn usage_message(line: &str) -> String {
        match run(line) {
            Err(DriverError::Usage(msg)) => msg,
            other => panic!("expected usage error for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_command_line_is_rejected() {
        assert_eq!(usage_message(""), "bad argument list");
    }

    #[test]
    fn test_help() {
        assert_eq!(run("--help").unwrap(), Invocation::Help);
    }

    #[test]
    fn test_init_defaults_output_file() {
        assert_eq!(
            run("--init 2").unwrap(),
            Invocation::InitOnly {
                dimension: Dimension::Two,
                output:    PathBuf::from("voronoi.dat"),
                workers:   1,
            }
        );
        let inv = run("--init 3 grains.dat").unwrap();
        assert!(matches!(
            inv,
            Invocation::InitOnly { dimension: Dimension::Three, ref output, .. } if output == &PathBuf::from("grains.dat")
        ));
        assert_eq!(inv.total_steps(), 0);
    }

    #[test]
    fn test_init_uses_configured_defaults() {
        let settings = RunSettings {
            default_init_file: "seed.dat".into(),
            workers:           6,
            ..RunSettings::default()
        };
        let inv = dispatch(&args("--init 2"), &settings).unwrap();
        assert_eq!(inv.workers(), 6);
        assert!(matches!(inv, Invocation::InitOnly { ref output, .. } if output == &PathBuf::from("seed.dat")));
    }

    #[test]
    fn test_init_validates_dimension() {
        assert_eq!(usage_message("--init 2d"), "initial grid must have integral dimension");
        assert_eq!(usage_message("--init -2"), "initial grid must have integral dimension");
        assert_eq!(usage_message("--init 4"), "initial grid must be of dimension 2 or 3");
        assert_eq!(usage_message("--init 1"), "initial grid must be of dimension 2 or 3");
        assert_eq!(
            usage_message("--init 99999999999999999999999"),
            "initial grid must be of dimension 2 or 3"
        );
    }

    #[test]
    fn test_init_argument_count() {
        assert_eq!(usage_message("--init"), "bad argument list");
        assert_eq!(usage_message("--init 2 a.dat b.dat"), "bad argument list");
    }

    #[test]
    fn test_nonstop_full_form() {
        assert_eq!(
            run("--nonstop 3 polycrystal.0000.dat 1000 100 2").unwrap(),
            Invocation::NonStop {
                dimension: Dimension::Three,
                output:    PathBuf::from("polycrystal.0000.dat"),
                schedule:  Schedule::new(1000, 100).unwrap(),
                workers:   2,
            }
        );
    }

    #[test]
    fn test_nonstop_requires_exactly_five_arguments() {
        assert_eq!(usage_message("--nonstop 2 out.dat 100 10"), "bad argument list");
        assert_eq!(usage_message("--nonstop 2 out.dat 100 10 1 x"), "bad argument list");
    }

    #[test]
    fn test_nonstop_rejects_bad_dimension_first() {
        // the dimension is checked before anything else is looked at
        assert_eq!(
            usage_message("--nonstop 4 out.dat 100 10 2"),
            "initial grid must be of dimension 2 or 3"
        );
        assert_eq!(
            usage_message("--nonstop 4 out.dat abc 10 2"),
            "initial grid must be of dimension 2 or 3"
        );
    }

    #[test]
    fn test_nonstop_rejects_trailing_garbage() {
        assert_eq!(
            usage_message("--nonstop 2 out.dat 100x 10 2"),
            "number of time steps must have integral value"
        );
        assert_eq!(
            usage_message("--nonstop 2 out.dat 100 1e1 2"),
            "output increment must have integral value"
        );
        assert_eq!(
            usage_message("--nonstop 2 out.dat 100 10 2t"),
            "nthreads must have integral value"
        );
    }

    #[test]
    fn test_nonstop_increment_bounds_and_threads() {
        assert_eq!(
            usage_message("--nonstop 2 out.dat 100 200 2"),
            "output increment must be smaller than number of time steps"
        );
        assert_eq!(usage_message("--nonstop 2 out.dat 100 0 2"), "output increment must be positive");
        assert_eq!(usage_message("--nonstop 2 out.dat 100 10 0"), "nthreads must be positive");
    }

    #[test]
    fn test_resume_in_place() {
        assert_eq!(
            run("polycrystal.0000.dat 1000 100").unwrap(),
            Invocation::Resume {
                input:    PathBuf::from("polycrystal.0000.dat"),
                output:   PathBuf::from("polycrystal.0000.dat"),
                schedule: Schedule::new(1000, 100).unwrap(),
                workers:  1,
            }
        );
    }

    #[test]
    fn test_resume_increment_defaults_to_steps() {
        let inv = run("polycrystal.dat 1000").unwrap();
        assert!(matches!(
            inv,
            Invocation::Resume { schedule, .. } if schedule == Schedule::new(1000, 1000).unwrap()
        ));
    }

    #[test]
    fn test_resume_with_separate_output() {
        assert_eq!(
            run("voronoi.dat polycrystal.dat 1000 250").unwrap(),
            Invocation::Resume {
                input:    PathBuf::from("voronoi.dat"),
                output:   PathBuf::from("polycrystal.dat"),
                schedule: Schedule::new(1000, 250).unwrap(),
                workers:  1,
            }
        );
    }

    #[test]
    fn test_resume_shape_errors() {
        // second token not numeric, so a step count must follow
        assert_eq!(usage_message("in.dat out.dat"), "bad argument list");
        // numeric second token leaves room for one increment only
        assert_eq!(usage_message("in.dat 100 10 5"), "bad argument list");
        assert_eq!(usage_message("in.dat"), "bad argument list");
        assert_eq!(usage_message("a b c d e"), "bad argument list");
    }

    #[test]
    fn test_resume_validates_numbers() {
        assert_eq!(
            usage_message("in.dat out.dat 10o0"),
            "number of time steps must have integral value"
        );
        assert_eq!(
            usage_message("in.dat 100 5x"),
            "output increment must have integral value"
        );
        assert_eq!(
            usage_message("in.dat 100 500"),
            "output increment must be smaller than number of time steps"
        );
        assert_eq!(usage_message("in.dat 0"), "output increment must be positive");
    }

    #[test]
    fn test_all_digit_input_name_reads_as_first_shape() {
        // "0100" as a second token is a step count, not an output file
        let inv = run("seed 0100 50").unwrap();
        assert!(matches!(
            inv,
            Invocation::Resume { ref output, schedule, .. }
                if output == &PathBuf::from("seed") && schedule.total_steps() == 100
        ));
    }

    #[test]
    fn test_usage_hint_points_at_help() {
        let hint = usage_hint(&DriverError::usage("bad argument list"));
        assert_eq!(
            hint,
            "graingrowth: bad argument list.  Use \"graingrowth --help\" to generate help message."
        );
        assert!(usage().contains("--nonstop dimension outfile steps increment nthreads"));
    }

    #[test]
    fn test_diagnostic_covers_every_error_kind() {
        assert_eq!(
            diagnostic(&DriverError::input("could not open nothere.dat.")),
            "graingrowth: File input error: could not open nothere.dat."
        );
        assert_eq!(
            diagnostic(&DriverError::Kernel(anyhow::anyhow!("disk full"))),
            "graingrowth: kernel failure: disk full"
        );
        assert!(diagnostic(&DriverError::usage("bad argument list")).contains("--help"));
    }
}
