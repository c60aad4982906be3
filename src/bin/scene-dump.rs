use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, value_parser};

use scenegraph_io::graph::ObjectId;
use scenegraph_io::io::reader::{LoadedScene, SceneReader};
use scenegraph_io::state::registry::{FallbackPolicy, TypeRegistry};

#[derive(Parser, Debug)]
#[command(name = "scene-dump")]
#[command(about = "Prints the object tree and symbol table of a scene stream")]
struct CliArgs {
    /// Stream to inspect.
    file: PathBuf,

    #[arg(
        long,
        env = "SCENE_DUMP_FALLBACK",
        default_value = "strict",
        value_parser = value_parser!(FallbackArg),
        help = "How to treat unregistered subtypes: strict, ancestor or placeholder"
    )]
    fallback: FallbackArg,

    /// Also print one line per minted symbol.
    #[arg(long)]
    symbols: bool,
}

#[derive(Debug, Clone, Copy)]
struct FallbackArg(FallbackPolicy);

impl FromStr for FallbackArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(FallbackArg(FallbackPolicy::Strict)),
            "ancestor" => Ok(FallbackArg(FallbackPolicy::AncestorForm)),
            "placeholder" => Ok(FallbackArg(FallbackPolicy::Placeholder)),
            other => Err(format!("unknown fallback policy \"{}\"", other)),
        }
    }
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();

    let args = CliArgs::parse();
    log::trace!("Starting with args: {:?}", args);

    let file = File::open(&args.file)?;
    let mut rdr = BufReader::new(file);
    let registry = TypeRegistry::standard().with_fallback(args.fallback.0);
    let loaded = SceneReader::read_scene(&mut rdr, &registry)?;

    println!(
        "{}: version {}, {} records, {} back-references",
        args.file.display(),
        loaded.summary.header.version,
        loaded.summary.records,
        loaded.summary.back_references
    );
    print_tree(&loaded, loaded.root, 0);

    if args.symbols {
        println!();
        for entry in loaded.summary.symbols.entries() {
            println!(
                "#{:<4} {:>3} refs  {}",
                entry.identity.as_u32(),
                entry.reference_count,
                loaded.graph.object(entry.object).kind.kind_name()
            );
        }
    }
    Ok(())
}

fn print_tree(loaded: &LoadedScene, id: ObjectId, depth: usize) {
    let entry = loaded.graph.object(id);
    let name = entry.name.as_deref().unwrap_or("<unnamed>");
    let identity = loaded
        .summary
        .symbols
        .identity_of(id)
        .map(|identity| identity.as_u32())
        .unwrap_or(0);
    println!(
        "{:indent$}{} ({}) #{} refs={} caps={:?}",
        "",
        name,
        entry.kind.kind_name(),
        identity,
        loaded.summary.symbols.reference_count(id),
        entry.capabilities,
        indent = depth * 2
    );
    for &child in loaded.graph.children(id) {
        print_tree(loaded, child, depth + 1);
    }
}
