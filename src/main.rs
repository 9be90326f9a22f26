use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::fs;
use std::path::PathBuf;

use netmodel::model::Model;
use netmodel::parser;
use netmodel::runtime::Runtime;

/// Compiler from declarative XML network topologies to a discrete-event simulation
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the network model in XML format
    #[arg(short = 'i', long = "xml")]
    xml: PathBuf,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse command-line arguments
    let args = Args::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("Loading topology description from {:?}", args.xml);
    let document = fs::read_to_string(&args.xml)
        .wrap_err_with(|| format!("Failed to read model file '{}'", args.xml.display()))?;

    let description =
        parser::parse_model(&document).wrap_err("Failed to parse topology description")?;
    info!(
        "Parsed model \"{}\": {} nodes, {} connections, {} registrators",
        description.name,
        description.nodes.len(),
        description.connections.len(),
        description.registrators.len()
    );

    let mut model = Model::new(Runtime::new());
    model
        .build_from_description(&description)
        .wrap_err_with(|| format!("Failed to build model \"{}\"", description.name))?;

    info!("Model built, handing control to the scheduler");
    model.run();
    info!("Simulation finished at {}", model.runtime().now());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let args = Args::parse_from(["netmodel", "--xml", "topology.xml"]);
        assert_eq!(args.xml, PathBuf::from("topology.xml"));

        let args = Args::parse_from(["netmodel", "-i", "other.xml"]);
        assert_eq!(args.xml, PathBuf::from("other.xml"));
    }
}
