use std::path::PathBuf;

use bundle2treemap::exporters::d3js;
use bundle2treemap::node::DataNode;
use bundle2treemap::source_map::create_symbol_map_from_source_map;
use bundle2treemap::{analyze, ui, Config, Error, SymbolMap, WasmNameDecoding};
use tracing_subscriber::EnvFilter;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

#[derive(clap::Parser, Debug)]
#[command(
    version,
    about = "Attribute each byte of minified JavaScript or a WebAssembly module to a named symbol. Investigate bundle bloat.",
    long_about = "Attribute each byte of minified JavaScript or a WebAssembly module to a named symbol. Investigate bundle bloat. \
                  .js files are split along their syntax tree, .wasm files along their sections and functions."
)]
#[command(flatten_help = true)]
pub struct Args {
    /// The .js and .wasm files to analyze.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Print JSON instead of human readable output.
    #[arg(long)]
    json: bool,

    /// Symbol map (`minified:original` per line) used to show original names.
    #[arg(long, value_name = "FILE")]
    symbols: Option<PathBuf>,

    /// Print the symbol map recovered from this source map for the single
    /// input file instead of a size report.
    #[arg(long, value_name = "MAP")]
    create_symbol_map_from_source_map: Option<PathBuf>,

    /// Print the source text of the given JavaScript symbol. Can be repeated.
    #[arg(long, value_name = "NAME")]
    dump: Vec<String>,

    /// Expand JavaScript nodes whose children hold more than this fraction
    /// (or percentage, if above 1) of the file.
    #[arg(long, value_name = "PERCENT")]
    expand_larger_than_percents: Option<f64>,

    /// Expand JavaScript nodes whose children hold more than this many bytes.
    #[arg(long, value_name = "BYTES")]
    expand_larger_than_bytes: Option<u64>,

    /// Decode wasm names one byte per character instead of as UTF-8.
    #[arg(long)]
    legacy_wasm_names: bool,

    /// Serve the treemap on localhost after printing the report.
    #[arg(long)]
    serve: bool,

    /// Maximum depth of the treemap.
    #[arg(long)]
    max_depth: Option<u64>,

    /// Log progress to stderr.
    #[arg(long, short)]
    verbose: bool,
}

impl Args {
    fn config(&self) -> Config {
        let mut config = Config {
            dump: self.dump.clone(),
            wasm_names: if self.legacy_wasm_names {
                WasmNameDecoding::Latin1
            } else {
                WasmNameDecoding::Utf8
            },
            ..Config::default()
        };
        if let Some(percent) = self.expand_larger_than_percents {
            config = config.with_expand_percent(percent);
        }
        if let Some(bytes) = self.expand_larger_than_bytes {
            config = config.with_expand_bytes(bytes);
        }
        config
    }
}

fn main() -> Result<()> {
    let args = <Args as clap::Parser>::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(source_map) = &args.create_symbol_map_from_source_map {
        let [generated] = args.files.as_slice() else {
            return Err(Error::SymbolMapInputCount(args.files.len()).into());
        };
        let symbol_map = create_symbol_map_from_source_map(source_map, generated)?;
        if args.json {
            println!("{}", serde_json::to_string(&symbol_map)?);
        } else {
            print!("{}", symbol_map.to_text());
        }
        return Ok(());
    }

    let symbols = match &args.symbols {
        Some(path) => SymbolMap::read(path)?,
        None => SymbolMap::new(),
    };
    let analysis = analyze(&args.files, &args.config())?;

    for dump in &analysis.dumps {
        // Keep stdout parseable when it carries JSON.
        if args.json {
            eprintln!("Contents of symbol {}:\n{}", dump.name, dump.text);
        } else {
            println!("Contents of symbol {}:\n{}", dump.name, dump.text);
        }
    }

    if args.json {
        println!("{}", analysis.report.to_json(&symbols)?);
    } else {
        print!("{}", analysis.report.render_text(&symbols));
    }

    if args.serve {
        let display_names = analysis.report.display_names(&symbols);
        let root = DataNode::from_records(analysis.report.records(), &display_names);
        let treemap_data = d3js::export(&root, args.max_depth.unwrap_or(u64::MAX));
        // Serve the UI (localhost web page).
        ui::serve(treemap_data)?;
    }

    Ok(())
}
