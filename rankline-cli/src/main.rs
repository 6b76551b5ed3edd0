mod render;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;

use rankline_core::{
    CompletedSession, FileStorage, Format, Milestone, SystemClock, Tier, Tracker, TrackerConfig,
    TrackerStatus,
};

#[derive(Debug, Parser)]
#[command(name = "rankline", version)]
#[command(about = "Ranked ladder tracker: record results, follow pips, sessions and seasons")]
struct Args {
    /// Directory holding the tracker snapshot
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// JSON config file; missing fields use defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Read the existing snapshot but never write it
    #[arg(long, global = true)]
    no_save: bool,

    /// Print machine-readable JSON instead of the status block
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    action: Option<Action>,
}

#[derive(Debug, Clone, Subcommand)]
enum Action {
    /// Show the current rank and session summary
    Status,
    /// Record a win
    Win,
    /// Record a loss
    Loss,
    /// Move the active rank to an exact position
    Set {
        tier: Tier,
        division: Option<u8>,
        #[arg(default_value_t = 0)]
        pips: u8,
    },
    /// Update the Mythic percentile or leaderboard rank
    Mythic {
        #[arg(long, conflicts_with = "rank", required_unless_present = "rank")]
        percent: Option<f64>,
        #[arg(long)]
        rank: Option<u32>,
    },
    /// Switch the active format (bo1, bo3, limited)
    Format { format: Format },
    /// Pause the session clock
    Pause,
    /// Resume the session clock
    Resume,
    /// Start timing a game
    GameStart,
    /// Stop the game timer without recording a result
    GameEnd,
    /// Set a rank goal for this session
    Goal { tier: Tier, division: Option<u8> },
    /// Remove the session goal
    GoalClear,
    /// Attach a note to the session
    Note {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Archive the current session and start a new one
    NewSession,
    /// List recently completed sessions
    History,
    /// Collapse tiers below the current rank
    Collapse,
    /// Hide tiers below the current rank
    Hide,
    /// Show every tier again
    Expand,
    /// Toggle collapsing completed tiers automatically
    AutoCollapse,
    /// Toggle hiding completed tiers automatically
    AutoHide,
    /// Toggle the Mythic progress line
    MythicProgress,
    /// Reset season totals
    NewSeason {
        /// Season length in days
        #[arg(long)]
        days: Option<i64>,
    },
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    milestones: &'a [Milestone],
    notices: &'a [String],
    status: &'a TrackerStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    history: Option<&'a VecDeque<CompletedSession>>,
}

#[derive(Debug, Default)]
struct Outcome {
    milestones: Vec<Milestone>,
    notices: Vec<String>,
    show_history: bool,
}

impl Outcome {
    fn notice(message: impl Into<String>) -> Self {
        Self {
            notices: vec![message.into()],
            ..Self::default()
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = load_config(&args)?;
    log::debug!("using snapshot {}", config.state_file().display());
    let storage = FileStorage::new(config.state_file());
    let mut tracker = Tracker::open(config, SystemClock, storage);

    let action = args.action.clone().unwrap_or(Action::Status);
    let outcome = apply(&mut tracker, action)?;
    let status = tracker.status();

    if args.json {
        let report = Report {
            milestones: &outcome.milestones,
            notices: &outcome.notices,
            status: &status,
            history: outcome
                .show_history
                .then_some(&tracker.data().stats.session_history),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        render::print_milestones(&outcome.milestones);
        render::print_notices(&outcome.notices);
        if outcome.show_history {
            render::print_history(&tracker.data().stats.session_history);
        } else {
            render::print_status(&status, tracker.data());
        }
    }

    tracker.shutdown();
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn load_config(args: &Args) -> Result<TrackerConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            TrackerConfig::from_json(&raw)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => TrackerConfig::default(),
    };
    if args.no_save {
        config.save_enabled = false;
    }
    if let Some(dir) = &args.data_dir {
        if config.save_enabled {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating data directory {}", dir.display()))?;
        }
        config.data_dir.clone_from(dir);
    }
    Ok(config)
}

fn apply(tracker: &mut Tracker<SystemClock, FileStorage>, action: Action) -> Result<Outcome> {
    let outcome = match action {
        Action::Status => Outcome::default(),
        Action::Win => Outcome {
            milestones: tracker.record_win(),
            ..Outcome::default()
        },
        Action::Loss => Outcome {
            milestones: tracker.record_loss(),
            ..Outcome::default()
        },
        Action::Set {
            tier,
            division,
            pips,
        } => {
            tracker.set_position(tier, division, pips);
            Outcome::notice(format!("rank set to {}", tracker.data().current_rank()))
        }
        Action::Mythic { percent, rank } => {
            if !tracker.data().current_rank().is_mythic() {
                bail!("current rank is not Mythic; use `rankline set mythic` first");
            }
            if let Some(percent) = percent {
                tracker.set_mythic_percentage(percent);
            }
            if let Some(rank) = rank {
                tracker.set_mythic_rank(rank);
            }
            Outcome::default()
        }
        Action::Format { format } => {
            tracker.switch_format(format);
            Outcome::notice(format!("now tracking {format}"))
        }
        Action::Pause => {
            if tracker.pause() {
                Outcome::notice("session paused")
            } else {
                Outcome::notice("session is already paused")
            }
        }
        Action::Resume => {
            if tracker.resume() {
                Outcome::notice("session resumed")
            } else {
                Outcome::notice("session is not paused")
            }
        }
        Action::GameStart => {
            tracker.start_game();
            Outcome::notice("game timer started")
        }
        Action::GameEnd => match tracker.end_game() {
            Some(secs) => Outcome::notice(format!(
                "game lasted {}",
                render::format_duration(rankline_core::numbers::truncate_secs(secs))
            )),
            None => Outcome::notice("no game timer was running"),
        },
        Action::Goal { tier, division } => {
            tracker.set_goal(tier, division);
            Outcome::default()
        }
        Action::GoalClear => {
            tracker.clear_goal();
            Outcome::notice("goal cleared")
        }
        Action::Note { text } => {
            let note = text.join(" ");
            if note.trim().is_empty() {
                bail!("note text is empty");
            }
            tracker.add_note(note);
            Outcome::notice("note saved")
        }
        Action::NewSession => {
            tracker.new_session();
            Outcome::notice("new session started")
        }
        Action::History => Outcome {
            show_history: true,
            ..Outcome::default()
        },
        Action::Collapse => {
            tracker.collapse_completed_tiers();
            Outcome::default()
        }
        Action::Hide => {
            tracker.hide_completed_tiers();
            Outcome::default()
        }
        Action::Expand => {
            tracker.expand_all_tiers();
            Outcome::default()
        }
        Action::AutoCollapse => {
            let enabled = !tracker.data().auto_collapse_mode;
            tracker.set_auto_collapse(enabled);
            Outcome::notice(format!("auto-collapse {}", on_off(enabled)))
        }
        Action::AutoHide => {
            let enabled = !tracker.data().auto_hide_mode;
            tracker.set_auto_hide(enabled);
            Outcome::notice(format!("auto-hide {}", on_off(enabled)))
        }
        Action::MythicProgress => {
            tracker.toggle_mythic_progress();
            Outcome::notice(format!(
                "mythic progress {}",
                on_off(tracker.data().show_mythic_progress)
            ))
        }
        Action::NewSeason { days } => {
            if days.is_some_and(|days| days <= 0) {
                bail!("season length must be at least one day");
            }
            tracker.start_new_season(days);
            Outcome::notice("new season started")
        }
    };
    Ok(outcome)
}

const fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}
