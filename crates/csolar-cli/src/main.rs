// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use csolar_core::aggregate::{DisplayFrame, MapExtent, YearCursor};
use csolar_core::config::AtlasConfig;
use csolar_core::Atlas;
use log::warn;
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Installation CSV (ISO-8859-1)
    #[arg(short, long, env = "CSOLAR_INSTALLATIONS")]
    installations: Option<PathBuf>,

    /// City/state coordinate lookup CSV (ISO-8859-1)
    #[arg(short, long, env = "CSOLAR_LOOKUP")]
    lookup: Option<PathBuf>,

    /// Settings file (defaults to settings.json in the config directory)
    #[arg(long, env = "CSOLAR_CONFIG")]
    config: Option<PathBuf>,

    /// Keep Alaska and Hawaii installations in frames and totals
    #[arg(long)]
    all_states: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show every installation connected by a given year
    Frame {
        /// Defaults to the last year in range
        #[arg(short, long)]
        year: Option<i32>,
        /// Print the frame as JSON for an external renderer
        #[arg(long)]
        json: bool,
    },
    /// One summary line per year
    Timeline,
    /// Step through years: f = forward, b = back, q = quit
    Browse,
    /// List installations with no coordinate match
    Unmatched,
    /// Show or write the settings file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective settings
    Show,
    /// Write the effective settings to the settings file
    Init,
}

fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let config = ConfigBuilder::new().set_time_level(LevelFilter::Off).build();
    TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto)
        .context("Failed to initialise logging")
}

fn effective_config(cli: &Cli, path: &Path) -> Result<AtlasConfig> {
    let config = AtlasConfig::load_from(path)
        .with_context(|| format!("Failed to load settings from {:?}", path))?;
    Ok(config.with_overrides(cli.installations.clone(), cli.lookup.clone(), cli.all_states))
}

fn print_frame(frame: &DisplayFrame) {
    println!("{}", frame.summary());
    for point in &frame.points {
        println!(
            "{:>9.4} {:>10.4}  log10(kW)={:.3}  {}",
            point.lat, point.lng, point.log_capacity_kw, point.label
        );
    }
}

fn warn_clipped(frame: &DisplayFrame) {
    let clipped = frame.outside(&MapExtent::contiguous_us());
    if clipped > 0 {
        warn!(
            "Points outside the contiguous-US map extent — year={} count={}",
            frame.year, clipped
        );
    }
}

fn browse(atlas: &Atlas) -> Result<()> {
    let mut cursor = YearCursor::new(atlas.year_range());
    let stdin = io::stdin();

    loop {
        let frame = atlas.frame(cursor.year())?;
        println!("{}", frame.summary());
        print!("[b]ack / [f]orward / [q]uit > ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        match line.trim() {
            "f" | "forward" => {
                cursor.forward();
            }
            "b" | "back" => {
                cursor.back();
            }
            "q" | "quit" => break,
            other => println!("Unknown command '{}'", other),
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let settings_path = cli.config.clone().unwrap_or_else(AtlasConfig::default_path);
    let config = effective_config(&cli, &settings_path)?;

    if let Commands::Config { action } = &cli.command {
        match action {
            ConfigAction::Show => println!("{}", serde_json::to_string_pretty(&config)?),
            ConfigAction::Init => {
                config.save_to(&settings_path)?;
                println!("Wrote {:?}", settings_path);
            }
        }
        return Ok(());
    }

    let atlas = Atlas::load(&config).context("Failed to load installation data")?;

    match &cli.command {
        Commands::Frame { year, json } => {
            let year = year.unwrap_or(atlas.year_range().last);
            let frame = atlas.frame(year)?;
            warn_clipped(&frame);
            if *json {
                println!("{}", serde_json::to_string_pretty(&frame)?);
            } else {
                print_frame(&frame);
            }
        }
        Commands::Timeline => {
            for frame in atlas.timeline()? {
                println!(
                    "{}  locations={:>5}  total_mw_ac={:>9.1}",
                    frame.year, frame.location_count, frame.total_capacity_mw
                );
            }
        }
        Commands::Browse => browse(&atlas)?,
        Commands::Unmatched => {
            let report = atlas.match_report();
            println!(
                "{} of {} installations have no coordinates",
                report.unmatched,
                report.matched + report.unmatched
            );
            for record in atlas.unmatched() {
                println!("{}", record);
            }
        }
        Commands::Config { .. } => {}
    }

    Ok(())
}
