//! 🚀 hubsim-cli — the front door, the bouncer, the maitre d' of hubsim.
//!
//! 🎬 *[narrator voice]* "It all started with a simple main() function..."
//! 📦 This binary crate is the thin CLI wrapper that parses flags, loads
//! config, sets up logging, and then lets the real code do the heavy
//! lifting. Like a manager. 🦆

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use comfy_table::Table;
use tracing::error;
use tracing_subscriber::EnvFilter;

use hubsim::{Mode, SimulationPlan, Source, Target};

/// 🔭 Simulate Hubble error logs against a local or staging Insight instance.
///
/// One invocation = one batch: build, normalize, replicate, submit, and (for
/// local targets) trigger processing. Nothing is retried and nothing is
/// recalled — submitted copies stay submitted, like sent texts.
#[derive(Debug, Parser)]
#[command(name = "hubsim", version, about, long_about = None)]
struct Cli {
    /// Which ingestion pipeline to feed: gcp or kinesis.
    #[arg(value_enum)]
    source: SourceArg,

    /// 🎯 Aim at staging instead of the local dev appserver.
    /// ⚠️ Staging is shared — your simulated errors WILL show up on the
    /// dashboard other people are looking at. Simulate responsibly.
    #[arg(short = 's', long)]
    staging: bool,

    /// 🆕 New mode: every copy gets a fresh random suffix on its
    /// distinguishing field, so each one lands as a brand-new error group.
    #[arg(short = 'n', long = "new", conflicts_with = "resurfaced")]
    new: bool,

    /// 🧟 Resurfaced mode: one extra copy aged back 90 days rides along.
    #[arg(short = 'r', long)]
    resurfaced: bool,

    /// 🕰️ Template stamp time (e.g. `2018-06-14T12:00:00`). Defaults to now.
    #[arg(short = 't', long = "time", value_parser = hubsim::batch::parse_time_flag)]
    time: Option<chrono::NaiveDateTime>,

    /// 🔢 How many copies to submit.
    #[arg(short = 'c', long = "count", default_value_t = 1)]
    count: usize,

    /// 📂 Raw log file to submit instead of the built-in default template.
    #[arg(short = 'f', long = "file")]
    file: Option<PathBuf>,

    /// 🏷️ Project to attribute the errors to, env suffix and all
    /// (e.g. `Cerberus-prod`).
    #[arg(short = 'p', long = "project")]
    project: Option<String>,

    /// 📡 Dress the default Kinesis template as collection-gateway traffic,
    /// with the real service hidden in the metadata where the normalizer
    /// expects to find it.
    #[arg(long)]
    client: bool,

    /// 🔧 Path to a TOML config file. Missing file = defaults + env vars.
    #[arg(long = "config", default_value = "hubsim.toml")]
    config: PathBuf,
}

/// 🎯 The positional source argument. Maps 1:1 onto [`Source`]; clap just
/// wants its own derive on it.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum SourceArg {
    Gcp,
    Kinesis,
}

impl From<SourceArg> for Source {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Gcp => Source::Gcp,
            SourceArg::Kinesis => Source::Kinesis,
        }
    }
}

impl Cli {
    fn mode(&self) -> Mode {
        // 🔒 clap already refused --new + --resurfaced at the door.
        if self.new {
            Mode::New
        } else if self.resurfaced {
            Mode::Resurfaced
        } else {
            Mode::Standard
        }
    }

    fn target(&self) -> Target {
        if self.staging { Target::Staging } else { Target::Local }
    }
}

/// 🚀 main() — where it all begins. The genesis. The big bang.
/// The "I pressed Enter and held my breath" moment.
///
/// 🔧 Steps:
/// 1. Init tracing (so we can see what goes wrong, and when)
/// 2. Parse args (clap does the yelling for us)
/// 3. Load config (the moment of truth)
/// 4. Run the thing (send it and pray 🙏)
/// 5. Handle errors (cry)
#[tokio::main]
async fn main() -> Result<()> {
    // 📡 Set up tracing — because println! debugging is a lifestyle choice
    // we're trying to move past, like flip phones and cargo shorts
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // 🔒 Check whether the config file exists before we get too emotionally
    // attached. No file is fine — defaults + env vars cover the common case.
    let config_path = cli.config.exists().then_some(cli.config.as_path());

    // 🔧 Load the config — this is the moment where we find out if the TOML
    // is valid or if someone put a tab where a space should be
    let app_config = match hubsim::load_config(config_path) {
        Ok(config) => config,
        Err(err) => {
            error!(
                "💀 Couldn't load the config from '{}': {err:#}. Take a look at \
                 the file, make sure it's correct.",
                cli.config.display()
            );
            std::process::exit(1);
        }
    };

    let plan = SimulationPlan {
        source: cli.source.into(),
        target: cli.target(),
        mode: cli.mode(),
        count: cli.count,
        time: cli.time,
        file: cli.file.clone(),
        project: cli.project.clone(),
        as_client: cli.client,
    };

    // 🚀 SEND IT. No take-backs. This is not a drill.
    let result = hubsim::run(app_config, plan).await;

    // 💀 Error handling: the part where we find out what went wrong
    // and print it in a way that's helpful at 3am
    match result {
        Ok(report) => {
            // 📊 The closing table: what was fired, where, and how much.
            let mut table = Table::new();
            table.set_header(vec!["source", "target", "mode", "copies", "trigger"]);
            table.add_row(vec![
                report.source.to_string(),
                report.target.to_string(),
                report.mode.to_string(),
                report.copies_submitted.to_string(),
                if report.trigger_fired { "fired".to_string() } else { "skipped".to_string() },
            ]);
            println!("{table}");
            // ✅ If we got here, everything worked. Pop the champagne. 🍾
            Ok(())
        }
        Err(err) => {
            error!("💀 error: {}", err);
            // -- 🧅 peel the onion of sadness, one tear-jerking layer at a time
            let mut the_vibes_are_giving_connection_issues = false;
            for cause in err.chain().skip(1) {
                error!("⚠️  cause: {}", cause);
                // -- 🕵️ sniff the cause like a truffle pig hunting for connection problems
                let cause_str = cause.to_string();
                if cause_str.contains("error sending request")
                    || cause_str.contains("connection refused")
                    || cause_str.contains("Connection refused")
                    || cause_str.contains("tcp connect error")
                    || cause_str.contains("dns error")
                {
                    the_vibes_are_giving_connection_issues = true;
                }
            }

            // -- 📡 if it smells like a connection problem, it's probably a
            // -- connection problem. Full wifi bars, nothing loads.
            if the_vibes_are_giving_connection_issues {
                error!(
                    "🔧 hint: looks like Insight isn't reachable. Double-check that \
                    the dev appserver is actually running (or pass -s for staging). \
                    Even servers need a nudge sometimes. ☕"
                );
            }

            // 🗑️ Exit with prejudice. Process exitus maximus.
            std::process::exit(1);
        }
    }
}
