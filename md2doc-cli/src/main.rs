// Command-line interface for md2doc
//
// This binary converts Markdown reports into Word documents and offers a few
// inspection views over the intermediate stages.
//
// The conversion itself lives in md2doc-core; this crate only wires the
// configuration (md2doc-config), the command line and the logger together.
//
// Usage:
//  md2doc <input> [-o <output>]                 - Convert to .docx (default)
//  md2doc convert <input> [-o <output>]         - Same as above (explicit)
//  md2doc inspect <input> [<view>]              - Print a pipeline stage as JSON (defaults to "skeleton")
//  md2doc features                              - List supported Markdown features
//
// Extra Parameters:
//
// Settings can be overridden with --extra-<name> <value> or --extra-<name>=<value>.
// Names come from md2doc_config::overrides::SETTINGS and are layered over every config file.
// Example:
//  md2doc report.md --extra-numbering dotted --extra-captions=false

mod inspect;

use clap::{Arg, ArgAction, Command, ValueHint};
use md2doc_config::overrides::parse_flag;
use md2doc_config::{Loader, Md2docConfig, Override, SettingKind};
use md2doc_core::convert::default_output_path;
use md2doc_core::{CancelToken, Converter};
use std::fs;
use std::path::{Path, PathBuf};

const SUBCOMMANDS: &[&str] = &["convert", "inspect", "features", "help"];

/// Command-line arguments with the `--extra-*` settings taken out.
#[derive(Debug, Default, PartialEq)]
struct CommandLine {
    args: Vec<String>,
    overrides: Vec<Override>,
    ignored: Vec<String>,
}

/// Pull `--extra-<name> [value]` and `--extra-<name>=<value>` settings out of `args`.
///
/// Flags only take the next argument when it reads as a boolean, so a bare
/// `--extra-captions report.md` still leaves the input in place. Other settings
/// require a value. Unknown names are collected, along with any value after them.
fn split_overrides(args: &[String]) -> Result<CommandLine, String> {
    let mut line = CommandLine::default();
    let mut rest = args.iter().peekable();

    while let Some(arg) = rest.next() {
        let Some(spec) = arg
            .strip_prefix("--extra-")
            .or_else(|| arg.strip_prefix("--extras-"))
        else {
            line.args.push(arg.clone());
            continue;
        };

        let (name, inline) = match spec.split_once('=') {
            Some((name, value)) => (name, Some(value.to_string())),
            None => (spec, None),
        };

        let Some(setting) = md2doc_config::setting(name) else {
            if inline.is_none() {
                rest.next_if(|next| !next.starts_with('-'));
            }
            line.ignored.push(name.to_string());
            continue;
        };

        let raw = match inline {
            Some(value) => value,
            None if setting.kind == SettingKind::Flag => rest
                .next_if(|next| parse_flag(next).is_some())
                .cloned()
                .unwrap_or_else(|| "true".to_string()),
            None => rest
                .next_if(|next| !next.starts_with('-'))
                .cloned()
                .ok_or_else(|| format!("--extra-{name} needs a value"))?,
        };
        line.overrides.push(setting.read(&raw)?);
    }

    Ok(line)
}

fn input_arg(name: &'static str) -> Arg {
    Arg::new(name)
        .help("Path to the Markdown file")
        .required(true)
        .index(1)
        .value_hint(ValueHint::FilePath)
}

fn build_cli() -> Command {
    Command::new("md2doc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert Markdown reports into Word documents")
        .long_about(
            "md2doc turns a Markdown report into a .docx document with numbered headings,\n\
            captioned tables, rendered charts and embedded images.\n\n\
            Commands:\n  \
            - convert:  Markdown to .docx (default command)\n  \
            - inspect:  Print an intermediate stage as JSON\n  \
            - features: List the supported Markdown constructs\n\n\
            Extra Parameters:\n  \
            Use --extra-<name> [value] to override configuration.\n  \
            Boolean flags can omit the value (defaults to 'true').\n  \
            Keys: numbering, title, captions, group-digits, parallel, render-charts\n\n\
            Examples:\n  \
            md2doc report.md                          # Writes report.docx\n  \
            md2doc report.md -o out/annual.docx       # Explicit output path\n  \
            md2doc report.md --extra-numbering dotted # 1 / 1.1 / 1.1.1 headings\n  \
            md2doc inspect report.md tables           # Extracted tables as JSON",
        )
        .arg_required_else_help(true)
        .subcommand_required(false)
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Path to a md2doc.toml configuration file")
                .value_hint(ValueHint::FilePath)
                .global(true),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .help("Only log warnings and errors")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert a Markdown file to .docx (default command)")
                .long_about(
                    "Convert a Markdown report to a Word document.\n\n\
                    The output defaults to the input path with a .docx extension.\n\
                    Relative image paths resolve against the input file's directory.\n\
                    Content that cannot be resolved is replaced by a visible label\n\
                    and reported as a warning; the document is still written.\n\n\
                    Examples:\n  \
                    md2doc convert report.md\n  \
                    md2doc convert report.md -o build/report.docx\n  \
                    md2doc report.md                 # 'convert' is optional",
                )
                .arg(input_arg("input"))
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .help("Output file path (defaults to <input>.docx)")
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            Command::new("inspect")
                .about("Print an intermediate stage of the conversion as JSON")
                .long_about(
                    "View what md2doc extracts from a Markdown file.\n\n\
                    Views:\n  \
                    - headings: headings with their levels\n  \
                    - charts:   chart fence bodies\n  \
                    - tables:   table blocks and parsed cells\n  \
                    - images:   image references\n  \
                    - skeleton: the document skeleton with placeholders (default)\n\n\
                    Examples:\n  \
                    md2doc inspect report.md\n  \
                    md2doc inspect report.md charts",
                )
                .arg(input_arg("path"))
                .arg(
                    Arg::new("view")
                        .help("View to print. Defaults to 'skeleton'")
                        .required(false)
                        .value_parser(clap::builder::PossibleValuesParser::new(
                            inspect::AVAILABLE_VIEWS,
                        ))
                        .index(2)
                        .value_hint(ValueHint::Other),
                ),
        )
        .subcommand(Command::new("features").about("List supported Markdown features"))
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    // Settings are taken out before clap sees the arguments
    let line = split_overrides(&args).unwrap_or_else(|e| exit_with(&e));
    let cleaned_args = &line.args;

    let cli = build_cli();
    let matches = match cli.clone().try_get_matches_from(cleaned_args) {
        Ok(m) => m,
        Err(e) => {
            // A bare file argument means "convert"
            if cleaned_args.len() > 1
                && !cleaned_args[1].starts_with('-')
                && !SUBCOMMANDS.contains(&cleaned_args[1].as_str())
            {
                let mut new_args = vec![cleaned_args[0].clone(), "convert".to_string()];
                new_args.extend_from_slice(&cleaned_args[1..]);

                match cli.try_get_matches_from(&new_args) {
                    Ok(m) => m,
                    Err(e2) => e2.exit(),
                }
            } else {
                e.exit();
            }
        }
    };

    init_logging(matches.get_flag("quiet"));

    for name in &line.ignored {
        log::warn!("ignoring unknown parameter --extra-{name}");
    }
    let config = load_cli_config(
        matches.get_one::<String>("config").map(|s| s.as_str()),
        &line.overrides,
    );

    match matches.subcommand() {
        Some(("convert", sub_matches)) => {
            let Some(input) = sub_matches.get_one::<String>("input") else {
                exit_with("input is required");
            };
            let output = sub_matches.get_one::<String>("output").map(PathBuf::from);
            handle_convert_command(Path::new(input), output, &config);
        }
        Some(("inspect", sub_matches)) => {
            let Some(path) = sub_matches.get_one::<String>("path") else {
                exit_with("path is required");
            };
            let view = sub_matches
                .get_one::<String>("view")
                .map(|s| s.as_str())
                .unwrap_or(inspect::DEFAULT_VIEW);
            handle_inspect_command(path, view, &config);
        }
        Some(("features", _)) => handle_features_command(),
        _ => exit_with("Unknown subcommand. Use --help for usage information."),
    }
}

/// Logs go to stderr; `RUST_LOG` wins over the defaults.
fn init_logging(quiet: bool) {
    let default_filter = if quiet {
        "warn"
    } else {
        "warn,md2doc=info,md2doc_core=info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn exit_with(message: &str) -> ! {
    eprintln!("Error: {message}");
    std::process::exit(1);
}

/// Handle the convert command
fn handle_convert_command(input: &Path, output: Option<PathBuf>, config: &Md2docConfig) {
    let output = output.unwrap_or_else(|| default_output_path(input));
    let converter = Converter::new(config.convert_options());

    match converter.convert_file(input, &output, &CancelToken::new()) {
        Ok(report) => {
            println!(
                "Wrote {} ({} placeholders, {} values filled, {} warnings)",
                report.output.display(),
                report.placeholders,
                report.resolved,
                report.warnings.len()
            );
        }
        Err(err) => {
            eprintln!("Error: {}", err.cause_chain());
            std::process::exit(1);
        }
    }
}

/// Handle the inspect command
fn handle_inspect_command(path: &str, view: &str, config: &Md2docConfig) {
    let source = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{path}': {e}");
        std::process::exit(1);
    });

    let output = inspect::execute_view(&source, view, &config.template_options())
        .unwrap_or_else(|e| {
            eprintln!("Execution error: {e}");
            std::process::exit(1);
        });

    print!("{output}");
}

/// Handle the features command
fn handle_features_command() {
    println!("Supported Markdown:\n");
    println!("  # .. ######         Headings, numbered 一、/ 1、/ 1）/ 1.1.1.1、 or 1.2.3");
    println!("  | a | b |           Pipe tables; numeric cells get thousands separators");
    println!("  ```echarts          Chart blocks (ECharts-style options), rendered or tabulated");
    println!("  ```mermaid          Mermaid blocks, kept as source code");
    println!("  ![alt](url \"t\")     Images, local paths or http(s) URLs");
    println!("  ${{title}}            Document title token in any paragraph\n");
    println!("Build features:");
    for (name, enabled) in md2doc_core::features() {
        println!("  {name:<14} {}", if enabled { "on" } else { "off" });
    }
}

/// Defaults, then `./md2doc.toml`, then `--config`, then `--extra-*` settings.
fn load_cli_config(explicit_path: Option<&str>, overrides: &[Override]) -> Md2docConfig {
    let mut loader = Loader::new().with_local_file(".");
    if let Some(path) = explicit_path {
        loader = loader.with_file(path);
    }
    loader
        .with_overrides(overrides)
        .and_then(Loader::build)
        .unwrap_or_else(|err| {
            eprintln!("Failed to load configuration: {err}");
            std::process::exit(1);
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use md2doc_config::OverrideValue;
    use md2doc_core::NumberingStyle;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_split_overrides_without_settings() {
        let input = args(&["md2doc", "inspect", "report.md"]);
        let line = split_overrides(&input).unwrap();
        assert_eq!(line.args, input);
        assert!(line.overrides.is_empty());
    }

    #[test]
    fn test_split_overrides_with_values() {
        let line = split_overrides(&args(&[
            "md2doc",
            "report.md",
            "--extra-numbering",
            "Decimal",
            "--extra-title=年度报告",
            "-o",
            "out.docx",
        ]))
        .unwrap();
        assert_eq!(line.args, args(&["md2doc", "report.md", "-o", "out.docx"]));
        assert_eq!(
            line.overrides,
            vec![
                Override {
                    path: "numbering.style",
                    value: OverrideValue::Text("dotted".into()),
                },
                Override {
                    path: "template.title",
                    value: OverrideValue::Text("年度报告".into()),
                },
            ]
        );
    }

    #[test]
    fn test_bare_flag_leaves_following_input_alone() {
        let line = split_overrides(&args(&["md2doc", "--extras-captions", "report.md"])).unwrap();
        assert_eq!(line.args, args(&["md2doc", "report.md"]));
        assert_eq!(line.overrides[0].value, OverrideValue::Flag(true));

        let line = split_overrides(&args(&["md2doc", "report.md", "--extra-charts", "no"])).unwrap();
        assert_eq!(line.args, args(&["md2doc", "report.md"]));
        assert_eq!(line.overrides[0].path, "charts.render");
        assert_eq!(line.overrides[0].value, OverrideValue::Flag(false));
    }

    #[test]
    fn test_unknown_and_invalid_settings() {
        let line = split_overrides(&args(&["md2doc", "r.md", "--extra-colour", "red", "-q"])).unwrap();
        assert_eq!(line.args, args(&["md2doc", "r.md", "-q"]));
        assert_eq!(line.ignored, vec!["colour"]);

        assert!(split_overrides(&args(&["md2doc", "--extra-numbering", "roman"])).is_err());
        assert!(split_overrides(&args(&["md2doc", "--extra-title", "--quiet"])).is_err());
    }

    #[test]
    fn test_overrides_reach_the_config() {
        let line = split_overrides(&args(&[
            "md2doc",
            "--extra-numbering",
            "dotted",
            "--extra-thousands=off",
        ]))
        .unwrap();
        let config = Loader::new()
            .with_overrides(&line.overrides)
            .and_then(Loader::build)
            .unwrap();
        assert_eq!(config.numbering.style, NumberingStyle::Dotted);
        assert!(!config.template.group_digits);
    }

    #[test]
    fn test_cli_definition_is_valid() {
        build_cli().debug_assert();
    }
}
