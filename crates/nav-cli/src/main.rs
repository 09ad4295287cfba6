//! navgraph - scan navigation graphs from a scene file and query them.
//!
//! - `navgraph scan <scene>` - scan every graph and report node counts
//! - `navgraph nearest <scene>` - run nearest-node queries
//! - `navgraph update <scene>` - apply the scene's graph updates

mod scene;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use nav_core::{NavGraph, NodeConstraint, Vec3};
use nav_graphs::{GraphSet, StaticScene};

use crate::scene::{Query, SceneFile};

#[derive(Parser)]
#[command(name = "navgraph")]
#[command(about = "Spatial navigation graph scanner", version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan all graphs in a scene
    Scan {
        scene: PathBuf,

        /// Print the scan reports as JSON
        #[arg(long)]
        json: bool,
    },

    /// Find the nearest node to a position, or run the scene's queries
    Nearest {
        scene: PathBuf,

        /// Query position as `x,y,z`
        #[arg(long, value_parser = parse_vec3)]
        at: Option<Vec3>,

        /// Accept unwalkable nodes and ignore the distance limit
        #[arg(long)]
        any: bool,
    },

    /// Apply the scene's graph updates and report what changed
    Update {
        scene: PathBuf,

        /// Revert every update afterwards and check the graphs are restored
        #[arg(long)]
        revert: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    if cli.log_json {
        fmt().json().with_env_filter(filter).with_target(false).init();
    } else {
        fmt().with_env_filter(filter).with_target(false).init();
    }

    match cli.command {
        Commands::Scan { scene, json } => scan(&scene, json),
        Commands::Nearest { scene, at, any } => nearest(&scene, at, any),
        Commands::Update { scene, revert } => update(&scene, revert),
    }
}

fn parse_vec3(s: &str) -> Result<Vec3> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<f32>().with_context(|| format!("Invalid coordinate `{p}`")))
        .collect::<Result<Vec<_>>>()?;
    match parts.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => bail!("Expected three comma-separated coordinates, got `{s}`"),
    }
}

/// Loads a scene and scans it. Graphs that fail to scan are reported and left empty.
fn load_and_scan(path: &Path) -> Result<(SceneFile, GraphSet, StaticScene)> {
    let file = SceneFile::load(path)?;
    let mut set = file.graph_set();
    let physics = file.colliders.clone();

    let mut failed = 0;
    for (index, result) in set.scan_all(&physics).into_iter().enumerate() {
        if let Err(err) = result {
            eprintln!("graph {index}: scan failed: {err}");
            failed += 1;
        }
    }
    if failed == set.len() && !set.is_empty() {
        bail!("No graph in {} could be scanned", path.display());
    }
    Ok((file, set, physics))
}

fn walkable_count(graph: &dyn NavGraph) -> usize {
    (0..graph.node_count())
        .filter(|&i| graph.node(i).is_some_and(|n| n.walkable))
        .count()
}

fn scan(path: &Path, json: bool) -> Result<()> {
    let file = SceneFile::load(path)?;
    let mut set = file.graph_set();
    let results = set.scan_all(&file.colliders);

    if json {
        let reports: Vec<_> = results
            .iter()
            .map(|r| match r {
                Ok(report) => serde_json::to_value(report),
                Err(err) => Ok(serde_json::json!({ "error": err.to_string() })),
            })
            .collect::<Result<_, _>>()?;
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    println!("{:<4} {:<20} {:<8} {:>8} {:>8} {:>12}", "#", "NAME", "KIND", "NODES", "WALK", "CONNECTIONS");
    for (index, (graph, result)) in set.graphs().iter().zip(&results).enumerate() {
        let name = &graph.as_graph().base().name;
        let kind = format!("{:?}", graph.kind());
        match result {
            Ok(report) => println!(
                "{:<4} {:<20} {:<8} {:>8} {:>8} {:>12}",
                index, name, kind, report.nodes, report.walkable, report.connections
            ),
            Err(err) => println!("{index:<4} {name:<20} {kind:<8} error: {err}"),
        }
        if let Ok(report) = result {
            if report.identical_triangles > 0 || report.colinear_triangles > 0 {
                println!(
                    "     {} identical, {} colinear triangles",
                    report.identical_triangles, report.colinear_triangles
                );
            }
        }
    }
    Ok(())
}

fn nearest(path: &Path, at: Option<Vec3>, any: bool) -> Result<()> {
    let (file, set, _) = load_and_scan(path)?;

    let queries = match at {
        Some(position) => vec![Query {
            position,
            constraint: if any { NodeConstraint::none() } else { NodeConstraint::default() },
        }],
        None => file.queries,
    };
    if queries.is_empty() {
        bail!("No query position given and {} has no queries", path.display());
    }

    for query in &queries {
        let p = query.position;
        let info = set.get_nearest(p, &query.constraint);
        match info.node.and_then(|n| set.node(n).map(|data| (n, data))) {
            Some((node, data)) => {
                let c = info.clamped_position;
                println!(
                    "({:.3}, {:.3}, {:.3}) -> graph {} node {} at ({:.3}, {:.3}, {:.3}) walkable={} tag={} penalty={}",
                    p.x, p.y, p.z, node.graph, node.index, c.x, c.y, c.z, data.walkable, data.tag, data.penalty
                );
            }
            None => println!("({:.3}, {:.3}, {:.3}) -> no node", p.x, p.y, p.z),
        }
    }
    Ok(())
}

fn update(path: &Path, revert: bool) -> Result<()> {
    let (file, mut set, physics) = load_and_scan(path)?;
    if file.updates.is_empty() {
        bail!("{} has no updates", path.display());
    }

    let before: Vec<usize> = set.graphs().iter().map(|g| walkable_count(g.as_graph())).collect();

    let mut updates = file.updates;
    for (i, update) in updates.iter_mut().enumerate() {
        if revert {
            update.track_changed_nodes = true;
        }
        set.update_graphs(update, &physics);
        tracing::info!(update = i, changed = update.changed_nodes().count(), "Applied graph update");
    }

    for (index, graph) in set.graphs().iter().enumerate() {
        let after = walkable_count(graph.as_graph());
        println!("graph {index}: walkable {} -> {}", before[index], after);
    }

    if revert {
        let mut restored = 0;
        for update in updates.iter_mut().rev() {
            restored += set
                .revert_update(update)
                .context("Failed to revert graph update")?;
        }
        let after: Vec<usize> = set.graphs().iter().map(|g| walkable_count(g.as_graph())).collect();
        println!("reverted {restored} nodes");
        if after != before {
            bail!("Walkable counts differ after revert: {before:?} -> {after:?}");
        }
    }
    Ok(())
}
