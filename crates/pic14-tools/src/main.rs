//! CLI entry point for the `pic14` assembler, disassembler and simulator.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use ihex as _;
use pic14_core::{Core, CoreConfig, Decoder, StopReason, TraceEvent, TraceSink};
use pic14_tools::{
    assemble, disassemble, format_event, format_registers, load_hex, register_names, save_hex,
    CliError, ProgramImage,
};
#[cfg(test)]
use tempfile as _;
use thiserror as _;
use tracing::debug;

const USAGE_TEXT: &str = "\
Usage: pic14 <command> [options]

Commands:
  asm <source> [-o <output>] [--inc <file>]   Assemble source to Intel HEX
  dis <image.hex>                             Disassemble a HEX image
  run <image.hex|source.asm> [--inc <file>] [--steps <n>] [--trace]
                                              Load and execute a program

Options:
  -o, --output <file>  Output file path (default: source stem + .hex)
  --inc <file>         Register-name definitions (NAME EQU H'hex')
  --steps <n>          Instruction limit for run (default: 100000)
  --trace              Print each retired instruction
  -h, --help           Show this help message

Examples:
  pic14 asm blink.asm --inc p16f1826.inc
  pic14 dis blink.hex
  pic14 run blink.asm --steps 500 --trace
";

const DEFAULT_STEPS: u32 = 100_000;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Asm(AsmArgs),
    Dis(DisArgs),
    Run(RunArgs),
}

#[derive(Debug, PartialEq, Eq)]
struct AsmArgs {
    input: PathBuf,
    output: Option<PathBuf>,
    include: Option<PathBuf>,
}

#[derive(Debug, PartialEq, Eq)]
struct DisArgs {
    input: PathBuf,
}

#[derive(Debug, PartialEq, Eq)]
struct RunArgs {
    input: PathBuf,
    include: Option<PathBuf>,
    steps: u32,
    trace: bool,
}

#[derive(Debug)]
enum ParseResult {
    Command(Command),
    Help,
}

fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let first = args.next().ok_or_else(|| "missing command".to_string())?;

    if first == "--help" || first == "-h" {
        return Ok(ParseResult::Help);
    }

    match &*first.to_string_lossy() {
        "asm" => parse_asm_args(args).map(|args| ParseResult::Command(Command::Asm(args))),
        "dis" => parse_dis_args(args).map(|args| ParseResult::Command(Command::Dis(args))),
        "run" => parse_run_args(args).map(|args| ParseResult::Command(Command::Run(args))),
        other => Err(format!("unknown command: {other}")),
    }
}

fn set_input(input: &mut Option<PathBuf>, arg: OsString) -> Result<(), String> {
    if arg.to_string_lossy().starts_with('-') {
        return Err(format!("unknown option: {}", arg.to_string_lossy()));
    }
    if input.is_some() {
        return Err("multiple input paths provided".to_string());
    }
    *input = Some(PathBuf::from(arg));
    Ok(())
}

fn flag_value(args: &mut impl Iterator<Item = OsString>, flag: &str) -> Result<OsString, String> {
    args.next()
        .ok_or_else(|| format!("missing value for {flag}"))
}

#[allow(clippy::while_let_on_iterator)]
fn parse_asm_args(mut args: impl Iterator<Item = OsString>) -> Result<AsmArgs, String> {
    let mut input = None;
    let mut output = None;
    let mut include = None;

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }
        if arg == "-o" || arg == "--output" {
            output = Some(PathBuf::from(flag_value(&mut args, "-o")?));
            continue;
        }
        if arg == "--inc" {
            include = Some(PathBuf::from(flag_value(&mut args, "--inc")?));
            continue;
        }
        set_input(&mut input, arg)?;
    }

    let input = input.ok_or_else(|| "missing input path".to_string())?;
    Ok(AsmArgs {
        input,
        output,
        include,
    })
}

fn parse_dis_args(args: impl Iterator<Item = OsString>) -> Result<DisArgs, String> {
    let mut input = None;

    for arg in args {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }
        set_input(&mut input, arg)?;
    }

    let input = input.ok_or_else(|| "missing input path".to_string())?;
    Ok(DisArgs { input })
}

#[allow(clippy::while_let_on_iterator)]
fn parse_run_args(mut args: impl Iterator<Item = OsString>) -> Result<RunArgs, String> {
    let mut input = None;
    let mut include = None;
    let mut steps = DEFAULT_STEPS;
    let mut trace = false;

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }
        if arg == "--trace" {
            trace = true;
            continue;
        }
        if arg == "--inc" {
            include = Some(PathBuf::from(flag_value(&mut args, "--inc")?));
            continue;
        }
        if arg == "--steps" {
            let value = flag_value(&mut args, "--steps")?;
            steps = value
                .to_string_lossy()
                .parse()
                .map_err(|_| format!("invalid step count: {}", value.to_string_lossy()))?;
            continue;
        }
        set_input(&mut input, arg)?;
    }

    let input = input.ok_or_else(|| "missing input path".to_string())?;
    Ok(RunArgs {
        input,
        include,
        steps,
        trace,
    })
}

fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("hex")
}

fn read_source(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn is_source(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("asm") || ext.eq_ignore_ascii_case("s"))
}

fn run_asm(args: &AsmArgs) -> Result<(), CliError> {
    let names = register_names(args.include.as_deref())?;
    let assembly = assemble(&read_source(&args.input)?, &names)?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));
    save_hex(&output, &assembly.image)?;

    println!(
        "Assembled {} ({} words) -> {}",
        args.input.display(),
        assembly.image.len(),
        output.display()
    );
    Ok(())
}

fn load_core(image: &ProgramImage, core: &mut Core) -> Result<(), CliError> {
    let limit = u32::try_from(core.config().program_words).unwrap_or(u32::MAX);
    let (program, extra) = image.partition(limit);
    program.load_into(core)?;
    for (address, word) in extra.iter() {
        println!("config {address:04X}: {word:04X}");
    }
    debug!(words = program.len(), config = extra.len(), "loaded image");
    Ok(())
}

fn run_dis(args: &DisArgs) -> Result<(), CliError> {
    let image = load_hex(&args.input)?;
    let mut core = Core::default();
    load_core(&image, &mut core)?;

    let limit = u32::try_from(core.config().program_words).unwrap_or(u32::MAX);
    for (base, words) in image.partition(limit).0.runs() {
        let (Ok(start), Ok(len)) = (u16::try_from(base), u16::try_from(words.len())) else {
            continue;
        };
        for row in disassemble(&core, start, len) {
            println!("{row}");
        }
    }
    Ok(())
}

struct PrintSink;

impl TraceSink for PrintSink {
    fn on_event(&mut self, event: TraceEvent) {
        if let Some(line) = format_event(&event) {
            println!("{line}");
        }
    }
}

const fn describe(stop: StopReason) -> &'static str {
    match stop {
        StopReason::StepLimit => "step limit",
        StopReason::HaltAddress => "halt address",
        StopReason::Sleeping => "sleep",
    }
}

fn run_run(args: &RunArgs) -> Result<(), CliError> {
    let names = register_names(args.include.as_deref())?;
    let image = if is_source(&args.input) {
        assemble(&read_source(&args.input)?, &names)?.image
    } else {
        load_hex(&args.input)?
    };

    let mut core = Core::new(Decoder::enhanced_midrange(), CoreConfig::default())?.with_names(names);
    load_core(&image, &mut core)?;

    let result = if args.trace {
        core.run_traced(args.steps, &mut PrintSink)
    } else {
        core.run(args.steps)
    };
    match result {
        Ok(outcome) => {
            println!(
                "Stopped at {} after {} steps ({} cycles)",
                describe(outcome.stop),
                outcome.steps,
                outcome.cycles
            );
            println!("{}", format_registers(&core.registers()));
            Ok(())
        }
        Err(fault) => {
            println!("{}", format_registers(&core.registers()));
            Err(fault.into())
        }
    }
}

fn main() {
    let result = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            Ok(())
        }
        Ok(ParseResult::Command(Command::Asm(args))) => run_asm(&args),
        Ok(ParseResult::Command(Command::Dis(args))) => run_dis(&args),
        Ok(ParseResult::Command(Command::Run(args))) => run_run(&args),
        Err(error) if error.starts_with("Usage:") => {
            println!("{error}");
            Ok(())
        }
        Err(error) => {
            eprintln!("{USAGE_TEXT}");
            Err(CliError::Usage(error))
        }
    };

    if let Err(error) = result {
        eprintln!("error: {error}");
        std::process::exit(error.exit_code());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::path::PathBuf;

    fn os(args: &[&str]) -> impl Iterator<Item = OsString> {
        args.iter()
            .map(OsString::from)
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn parses_asm_command() {
        let result = parse_asm_args(os(&["blink.asm", "-o", "out.hex", "--inc", "dev.inc"]))
            .expect("valid asm args should parse");
        assert_eq!(
            result,
            AsmArgs {
                input: PathBuf::from("blink.asm"),
                output: Some(PathBuf::from("out.hex")),
                include: Some(PathBuf::from("dev.inc")),
            }
        );
    }

    #[test]
    fn parses_run_command() {
        let result = parse_run_args(os(&["prog.hex", "--steps", "42", "--trace"]))
            .expect("valid run args should parse");
        assert_eq!(
            result,
            RunArgs {
                input: PathBuf::from("prog.hex"),
                include: None,
                steps: 42,
                trace: true,
            }
        );
    }

    #[test]
    fn run_defaults_step_limit() {
        let result = parse_run_args(os(&["prog.hex"])).expect("parses");
        assert_eq!(result.steps, DEFAULT_STEPS);
        assert!(!result.trace);
    }

    #[test]
    fn rejects_bad_step_count() {
        let error = parse_run_args(os(&["prog.hex", "--steps", "lots"])).expect_err("bad count");
        assert!(error.contains("invalid step count"));
    }

    #[test]
    fn parses_help_flag() {
        let result = parse_args(os(&["--help"])).expect("help should parse without error");
        assert!(matches!(result, ParseResult::Help));
    }

    #[test]
    fn rejects_unknown_command() {
        let error = parse_args(os(&["unknown"])).expect_err("unknown command should fail parse");
        assert!(error.contains("unknown command"));
    }

    #[test]
    fn dis_rejects_options() {
        let error = parse_dis_args(os(&["--trace"])).expect_err("dis takes no options");
        assert!(error.contains("unknown option"));
    }

    #[test]
    fn missing_flag_value() {
        let error = parse_asm_args(os(&["a.asm", "-o"])).expect_err("missing value");
        assert!(error.contains("missing value for -o"));
    }

    #[test]
    fn default_output_replaces_extension() {
        assert_eq!(
            default_output_path(Path::new("src/blink.asm")),
            PathBuf::from("src/blink.hex")
        );
        assert_eq!(default_output_path(Path::new("blink")), PathBuf::from("blink.hex"));
    }

    #[test]
    fn source_detection_by_extension() {
        assert!(is_source(Path::new("blink.asm")));
        assert!(is_source(Path::new("blink.S")));
        assert!(!is_source(Path::new("blink.hex")));
    }
}
