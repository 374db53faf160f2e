//! level_ladder - generate concept-respecting level progressions
//!
//! Reads a level catalog (the bundled Lasers set by default) and prints
//! orderings, ready-set frontiers or tiers for a selection of it.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use level_ladder::error::SelectionConflict;
use level_ladder::render::{Renderer, ScriptRenderer};
use level_ladder::{
    Catalog, Error, LevelId, Progression, ProgressionGenerator, Selection, SelectionRequest, Selector,
    TieBreak,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "level_ladder")]
#[command(about = "Order puzzle levels so every concept is introduced before it is needed", long_about = None)]
#[command(version)]
struct Cli {
    /// Catalog JSON file (defaults to the bundled Lasers catalog)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Preference among levels that are ready at the same time
    #[arg(long, value_enum, default_value_t = TieBreakArg::Declaration, global = true)]
    tie_break: TieBreakArg,

    /// Seed for `--tie-break shuffled`
    #[arg(long, default_value_t = 0, global = true)]
    seed: u64,

    /// Level that must be in the selection (repeatable)
    #[arg(long = "include", global = true)]
    include: Vec<String>,

    /// Select enough levels to introduce and exercise every concept
    #[arg(long, global = true)]
    cover_all: bool,

    /// Add every grounded introducer of a missing concept, not just the shallowest
    #[arg(long, global = true)]
    all_introducers: bool,

    /// Upper bound on the selection size
    #[arg(long, global = true)]
    max_levels: Option<usize>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the selected levels with their concepts
    Levels,

    /// Print one valid progression
    Order,

    /// Print every valid progression
    Enumerate {
        /// Fail when more than this many exist
        #[arg(long, default_value_t = 100)]
        cap: usize,
    },

    /// Count valid progressions
    Count {
        #[arg(long, default_value_t = 1_000_000)]
        cap: usize,
    },

    /// Print the ready set at every position
    Frontier,

    /// Print levels grouped into ready rounds
    Tiers,

    /// Check a progression given as level ids
    Verify {
        #[arg(required = true)]
        levels: Vec<String>,
    },

    /// Print a playable script: engine source followed by level layouts
    Bundle {
        /// Engine source text to prepend
        #[arg(long)]
        engine: PathBuf,

        /// Write one standalone script per level into this directory instead
        #[arg(long)]
        split: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TieBreakArg {
    Declaration,
    Reverse,
    SmallerFirst,
    LargerFirst,
    Frontload,
    Backload,
    Shuffled,
}

impl TieBreakArg {
    fn resolve(self, seed: u64) -> TieBreak {
        match self {
            TieBreakArg::Declaration => TieBreak::Declaration,
            TieBreakArg::Reverse => TieBreak::ReverseDeclaration,
            TieBreakArg::SmallerFirst => TieBreak::SmallerFirst,
            TieBreakArg::LargerFirst => TieBreak::LargerFirst,
            TieBreakArg::Frontload => TieBreak::Frontload,
            TieBreakArg::Backload => TieBreak::Backload,
            TieBreakArg::Shuffled => TieBreak::Shuffled { seed },
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let catalog = match &cli.catalog {
        Some(path) => Catalog::load(path)?,
        None => Catalog::lasers()?,
    };
    tracing::info!(
        "Catalog {}: {} levels",
        catalog.name().unwrap_or("(unnamed)"),
        catalog.len()
    );

    let selection = select(&catalog, &cli)?;
    let generator = ProgressionGenerator::with_tie_break(&selection, cli.tie_break.resolve(cli.seed));

    match &cli.command {
        Commands::Levels => {
            if cli.json {
                let levels: Vec<_> = selection.levels().collect();
                print_json(&levels)?;
            } else {
                for level in selection.levels() {
                    println!("{}", level);
                }
            }
        }
        Commands::Order => {
            let progression = generator.generate()?;
            print_progression(&catalog, &progression, cli.json)?;
        }
        Commands::Enumerate { cap } => {
            let all = generator.enumerate(*cap)?;
            if cli.json {
                print_json(&all)?;
            } else {
                for progression in &all {
                    println!("{}", progression);
                }
            }
        }
        Commands::Count { cap } => {
            let count = generator.count(*cap)?;
            if cli.json {
                print_json(&count)?;
            } else {
                println!("{}", count);
            }
        }
        Commands::Frontier => {
            let frontier = generator.frontier()?;
            if cli.json {
                print_json(&frontier)?;
            } else {
                for (i, step) in frontier.steps.iter().enumerate() {
                    let ready: Vec<&str> = step.ready.iter().map(LevelId::as_str).collect();
                    println!("{:>3}. {}  [{}]", i + 1, step.chosen, ready.join(" | "));
                }
            }
        }
        Commands::Tiers => {
            let tiers = generator.tiers()?;
            if cli.json {
                print_json(&tiers)?;
            } else {
                for (i, tier) in tiers.0.iter().enumerate() {
                    let names: Vec<&str> = tier.iter().map(LevelId::as_str).collect();
                    println!("Tier {}: {}", i + 1, names.join(", "));
                }
            }
        }
        Commands::Verify { levels } => {
            let progression: Progression = levels.iter().map(|l| LevelId::from(l.as_str())).collect();
            progression.verify(&selection)?;
            println!("ok: {} levels", progression.len());
        }
        Commands::Bundle { engine, split } => {
            let engine_source = std::fs::read_to_string(engine)
                .with_context(|| format!("failed to read engine source {}", engine.display()))?;
            let progression = generator.generate()?;
            let renderer = ScriptRenderer::new(engine_source);
            match split {
                Some(dir) => {
                    std::fs::create_dir_all(dir)
                        .with_context(|| format!("failed to create {}", dir.display()))?;
                    let bundles = renderer.render_each(&catalog, &progression)?;
                    for (i, bundle) in bundles.iter().enumerate() {
                        let path = dir.join(format!("level_{:02}.txt", i + 1));
                        std::fs::write(&path, &bundle.text)
                            .with_context(|| format!("failed to write {}", path.display()))?;
                    }
                    println!("wrote {} levels to {}", bundles.len(), dir.display());
                }
                None => {
                    let bundle = renderer.render(&catalog, &progression)?;
                    print!("{}", bundle.text);
                }
            }
        }
    }

    Ok(())
}

/// Whole catalog unless a selection constraint was given
fn select<'c>(catalog: &'c Catalog, cli: &Cli) -> Result<Selection<'c>> {
    if cli.include.is_empty() && !cli.cover_all {
        let all = Selection::all(catalog);
        if let Some(limit) = cli.max_levels.filter(|&limit| all.len() > limit) {
            return Err(Error::UnsatisfiableSelection(SelectionConflict::ExceedsLimit {
                required: all.len(),
                limit,
            })
            .into());
        }
        return Ok(all);
    }
    let request = SelectionRequest {
        must_include: cli.include.iter().map(|id| LevelId::from(id.as_str())).collect(),
        cover_all_concepts: cli.cover_all,
        max_levels: cli.max_levels,
        all_introducers: cli.all_introducers,
    };
    Ok(Selector::new(catalog).select(&request)?)
}

fn print_progression(catalog: &Catalog, progression: &Progression, json: bool) -> Result<()> {
    if json {
        print_json(progression)
    } else {
        print!("{}", progression.report(catalog)?);
        Ok(())
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
