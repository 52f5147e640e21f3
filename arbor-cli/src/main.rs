//! arbor - build XML documents with any xml-arbor adapter and print them.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use xml_arbor::{AdapterKind, BuildOptions, DefaultNodeFactory, Format, Style, XmlBuilder, XmlOutputter};

/// Build XML documents and write them back out
#[derive(Parser)]
#[command(name = "arbor")]
#[command(version)]
#[command(about = "Build XML documents with interchangeable adapters and reformat them", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a file and write it back under an output format
    #[command(visible_alias = "f")]
    Format {
        /// Input file
        file: PathBuf,

        /// Adapter used to read the input
        #[arg(short, long, default_value = "push")]
        adapter: AdapterKind,

        /// Output style
        #[arg(short, long, value_enum, default_value_t = StyleArg::Raw)]
        style: StyleArg,

        /// Spaces per level for pretty output
        #[arg(long, default_value = "2")]
        indent: usize,

        /// Write empty elements as start/end tag pairs
        #[arg(long)]
        expand_empty: bool,

        /// Keep entity references instead of inlining their text
        #[arg(long)]
        no_expand_entities: bool,

        /// Leave out the XML declaration
        #[arg(long)]
        omit_declaration: bool,

        /// Output encoding
        #[arg(short, long, default_value = "UTF-8")]
        encoding: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Read a file with every adapter and report whether the trees agree
    #[command(visible_alias = "c")]
    Compare {
        /// Input file
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StyleArg {
    Raw,
    Pretty,
    Compact,
}

impl From<StyleArg> for Style {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::Raw => Style::Raw,
            StyleArg::Pretty => Style::Pretty,
            StyleArg::Compact => Style::Compact,
        }
    }
}

fn main() -> std::process::ExitCode {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Format {
            file,
            adapter,
            style,
            indent,
            expand_empty,
            no_expand_entities,
            omit_declaration,
            encoding,
            output,
        } => {
            let format = match style {
                StyleArg::Raw => Format::raw(),
                StyleArg::Pretty => Format::pretty().with_indent(" ".repeat(indent)),
                StyleArg::Compact => Format::compact(),
            }
            .with_style(style.into())
            .with_expand_empty_elements(expand_empty)
            .with_omit_declaration(omit_declaration)
            .with_encoding(encoding);
            let options = BuildOptions::default().with_expand_entities(!no_expand_entities);
            run_format(&file, adapter, options, format, output.as_deref())
        }
        Commands::Compare { file } => run_compare(&file),
    };

    match result {
        Ok(true) => std::process::ExitCode::SUCCESS,
        Ok(false) => std::process::ExitCode::from(2),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::ExitCode::FAILURE
        }
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default: warnings only).
fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn run_format(
    path: &Path,
    adapter: AdapterKind,
    options: BuildOptions,
    format: Format,
    output_path: Option<&Path>,
) -> Result<bool, Box<dyn std::error::Error>> {
    let builder = XmlBuilder::with_options(DefaultNodeFactory, options);
    let document = builder.build_file_with(adapter, path)?;
    info!(file = %path.display(), %adapter, "read document");

    let output: Box<dyn Write> = match output_path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout()),
    };
    XmlOutputter::new(format).output_document(&document, output)?;
    Ok(true)
}

fn run_compare(path: &Path) -> Result<bool, Box<dyn std::error::Error>> {
    let builder = XmlBuilder::new(DefaultNodeFactory);
    let reference = builder.build_file_with(AdapterKind::Push, path)?;
    let raw = XmlOutputter::new(Format::raw());
    let expected = raw.document_to_string(&reference)?;

    let mut all_equal = true;
    for kind in AdapterKind::ALL {
        let outcome = match builder.build_file_with(kind, path) {
            Ok(document) if document.structurally_equal(&reference) => "identical".to_string(),
            Ok(document) => {
                all_equal = false;
                if raw.document_to_string(&document)? == expected {
                    "differs in structure only".to_string()
                } else {
                    "differs".to_string()
                }
            }
            Err(e) => {
                all_equal = false;
                format!("failed: {}", e)
            }
        };
        println!("{:<8} {}", kind.name(), outcome);
    }
    Ok(all_equal)
}
