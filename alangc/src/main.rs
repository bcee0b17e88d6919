#[macro_use]
extern crate clap;

use clap::{App, Arg};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
enum IOErrorContext {
    ReadInput,
    WriteOutput,
}

#[derive(Debug)]
enum Error {
    Alang(alangc::Error),
    Assemble(alasm::AssembleError),
    Json(serde_json::Error),
    Io(std::io::Error, IOErrorContext, PathBuf),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err, context, path) => write!(
                f,
                "{} file \"{}\" failed: {}",
                match context {
                    IOErrorContext::ReadInput => "Reading input",
                    IOErrorContext::WriteOutput => "Writing output",
                },
                path.display(),
                err
            ),
            Error::Alang(err) => write!(f, "{}", err),
            Error::Assemble(err) => write!(f, "{}", err),
            Error::Json(err) => write!(f, "Serializing parse output failed: {}", err),
        }
    }
}

fn main() {
    // Parse command line arguments
    let matches = App::new(crate_name!())
        .version(crate_version!())
        .about("Compiles alang source files for the avm processor")
        .arg(
            Arg::with_name("INPUT")
                .help("Sets the alang source file to compile")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .value_name("DIR")
                .help("Sets the directory to write the outputs to"),
        )
        .get_matches();

    let input = matches.value_of("INPUT").unwrap();
    let output = matches.value_of("output").unwrap_or("output");

    if let Err(err) = alangc(input, output) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

fn alangc(input: &str, output: &str) -> Result<(), Error> {
    let input_path = Path::new(input);
    let source = fs::read_to_string(input_path)
        .map_err(|err| Error::Io(err, IOErrorContext::ReadInput, input_path.to_owned()))?;

    // Run all three stages before writing anything, so a failure leaves no
    // partial outputs behind.
    let mut blocks = alangc::parse_program(&source).map_err(Error::Alang)?;
    let parsed = serde_json::to_string_pretty(&blocks).map_err(Error::Json)?;

    let program = alangc::compile_blocks(&mut blocks).map_err(Error::Alang)?;
    let assembly = program.to_asm_string();

    let machine_code = alasm::assemble(&assembly).map_err(Error::Assemble)?;

    let output_dir = Path::new(output);
    fs::create_dir_all(output_dir)
        .map_err(|err| Error::Io(err, IOErrorContext::WriteOutput, output_dir.to_owned()))?;

    write_output(&output_dir.join("parsed.json"), &parsed)?;
    write_output(&output_dir.join("compiled.asm"), &assembly)?;
    write_output(&output_dir.join("machine_code"), &machine_code)?;
    Ok(())
}

fn write_output(path: &Path, contents: &str) -> Result<(), Error> {
    fs::write(path, contents)
        .map_err(|err| Error::Io(err, IOErrorContext::WriteOutput, path.to_owned()))
}
