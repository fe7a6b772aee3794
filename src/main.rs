mod cache;
mod config;
mod dependencies;
mod error;
mod maven;
mod project;
mod properties;
mod util;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, Level};

use crate::cache::fs_artifact_cache::FsArtifactCache;
use crate::config::{default_cache_dir, default_config_path, NatConfig};
use crate::dependencies::fetcher::ArtifactFetcher;
use crate::dependencies::flatten::flatten;
use crate::dependencies::handlers::TypeHandlers;
use crate::dependencies::{fetch_dependencies, resolve, RootCoordinate};
use crate::maven::coordinates::Coordinate;
use crate::maven::remote_repo::RemoteMavenRepo;
use crate::project::read_project_root;
use crate::properties::PropertyEnvironment;

/// below the output folder, for packaged dependencies
const DEPENDENCIES_DIR: &str = "dependencies";

#[derive(Parser)]
#[command(name = "nat-deps", version, about = "Resolves and fetches the Maven dependencies of a project")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// -v for debug output, -vv for trace output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// configuration file [default: ~/.nat/config.json]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// artifact cache directory [default: ~/.nat/cache]
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// directory containing pom.xml / nat.lock
    #[arg(long, global = true, default_value = ".")]
    project_dir: PathBuf,

    /// resolve the dependencies of a published artifact (group:artifact:version[@type]) instead of the local project
    #[arg(long, global = true)]
    coordinate: Option<Coordinate>,

    /// re-read pom.xml even if nat.lock exists
    #[arg(long, global = true)]
    force: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve, download and place all dependencies
    Fetch {
        /// packaged dependencies go to <OUT_FOLDER>/dependencies
        #[arg(long, default_value = "NAT")]
        out_folder: PathBuf,

        /// type definition bundles are extracted below this directory
        #[arg(long, default_value = "node_modules")]
        types_dir: PathBuf,
    },
    /// Print the resolved dependency tree and the packages it flattens to, without downloading artifacts
    Tree,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .init();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let config = NatConfig::load(&config_path).await?;

    let cache_dir = match &cli.cache_dir {
        Some(dir) => dir.clone(),
        None => default_cache_dir()?,
    };

    let repo = RemoteMavenRepo::new(config.repo.url.clone(), config.repo.credentials())
        .with_context(|| format!("invalid repository URL {}", config.repo.url))?;
    let fetcher = ArtifactFetcher::new(Arc::new(repo), FsArtifactCache::new(cache_dir), config.repo.cache)
        .with_timeout(config.repo.timeout());

    let properties = PropertyEnvironment::discover(&cli.project_dir).await?;

    let root = match &cli.coordinate {
        Some(coordinate) => RootCoordinate::Remote(coordinate.clone()),
        None => RootCoordinate::Local(read_project_root(&cli.project_dir, cli.force).await?),
    };

    match cli.command {
        Command::Fetch { out_folder, types_dir } => {
            let handlers = TypeHandlers::new(
                cli.project_dir.join(types_dir),
                cli.project_dir.join(out_folder).join(DEPENDENCIES_DIR),
                config.type_bundle_names,
            );
            let summary = fetch_dependencies(&fetcher, &handlers, &properties, root, config.repo.concurrency).await?;

            for (coordinate, location) in &summary.placed {
                info!("{} -> {}", coordinate, location.display());
            }
            info!("fetched {} dependencies of {}", summary.dependencies.len(), summary.root);
        }
        Command::Tree => {
            let graph = resolve(&fetcher, &properties, root).await?;
            print_tree(&graph.root, 0);

            println!();
            for coordinate in flatten(&graph.root).values() {
                println!("{}", coordinate);
            }
        }
    }
    Ok(())
}

fn print_tree(coordinate: &Coordinate, depth: usize) {
    let unresolved = if coordinate.version.is_placeholder() { " (unresolved)" } else { "" };
    println!("{}{}{}", "  ".repeat(depth), coordinate, unresolved);
    for child in &coordinate.dependencies {
        print_tree(child, depth + 1);
    }
}
