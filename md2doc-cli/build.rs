use clap::{Arg, ArgAction, Command, ValueHint};
use clap_complete::{generate_to, shells::*};
use std::env;
use std::io::Error;

// Mirror of the views from src/inspect.rs
// We need to duplicate this here since build scripts can't access src/ modules
const AVAILABLE_VIEWS: &[&str] = &["headings", "charts", "tables", "images", "skeleton"];

fn input() -> Arg {
    Arg::new("input")
        .help("Path to the Markdown file")
        .required(true)
        .index(1)
        .value_hint(ValueHint::FilePath)
}

fn main() -> Result<(), Error> {
    let outdir = match env::var_os("OUT_DIR") {
        None => return Ok(()),
        Some(outdir) => outdir,
    };

    let mut cmd = Command::new("md2doc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert Markdown reports into Word documents")
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .value_hint(ValueHint::FilePath)
                .global(true),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("convert").arg(input()).arg(
                Arg::new("output")
                    .long("output")
                    .short('o')
                    .value_hint(ValueHint::FilePath),
            ),
        )
        .subcommand(
            Command::new("inspect").arg(input()).arg(
                Arg::new("view")
                    .index(2)
                    .value_parser(clap::builder::PossibleValuesParser::new(AVAILABLE_VIEWS))
                    .value_hint(ValueHint::Other),
            ),
        )
        .subcommand(Command::new("features"));

    generate_to(Bash, &mut cmd, "md2doc", &outdir)?;
    generate_to(Zsh, &mut cmd, "md2doc", &outdir)?;
    generate_to(Fish, &mut cmd, "md2doc", &outdir)?;

    println!("cargo:warning=Shell completions generated in {outdir:?}");

    Ok(())
}
