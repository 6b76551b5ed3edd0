use colored::Colorize;
use std::collections::VecDeque;

use rankline_core::numbers::truncate_secs;
use rankline_core::{AppData, CompletedSession, Milestone, Tier, TierDisplay, TrackerStatus};

/// `1h 05m`, `3m 10s` or `45s`.
pub fn format_duration(secs: i64) -> String {
    let secs = secs.max(0);
    let (hours, minutes, seconds) = (secs / 3600, secs % 3600 / 60, secs % 60);
    if hours > 0 {
        format!("{hours}h {minutes:02}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}

fn win_rate_label(rate: f64) -> colored::ColoredString {
    let label = format!("{rate:.1}%");
    if rate >= 55.0 {
        label.green()
    } else if rate >= 45.0 {
        label.yellow()
    } else {
        label.red()
    }
}

fn form_label(form: &str) -> String {
    form.chars()
        .map(|c| {
            if c == 'W' {
                c.to_string().green().to_string()
            } else {
                c.to_string().red().to_string()
            }
        })
        .collect()
}

pub fn print_milestones(milestones: &[Milestone]) {
    for milestone in milestones {
        println!("{} {}", "★".bright_yellow(), milestone.to_string().bright_yellow().bold());
    }
}

pub fn print_notices(notices: &[String]) {
    for notice in notices {
        println!("{}", notice.dimmed());
    }
}

pub fn print_ladder(data: &AppData) {
    let current = data.current_rank().tier();
    let mut line = Vec::new();
    for tier in Tier::ALL {
        let name = tier.as_str();
        match data.tier_display(tier) {
            TierDisplay::Hidden => {}
            TierDisplay::Collapsed => line.push(format!("{name} ✓").dimmed().to_string()),
            TierDisplay::Expanded if tier == current => {
                line.push(format!("[{name}]").bright_cyan().bold().to_string());
            }
            TierDisplay::Expanded => line.push(name.to_string()),
        }
    }
    println!("{}", line.join("  "));
}

pub fn print_status(status: &TrackerStatus, data: &AppData) {
    println!();
    println!(
        "{} {}",
        status.format.to_string().cyan(),
        status.rank_label.bright_white().bold()
    );
    print_ladder(data);

    if status.rank.is_mythic() {
        if data.show_mythic_progress {
            match (status.rank.mythic_rank(), status.rank.mythic_percentage()) {
                (Some(rank), _) => println!("Mythic rank #{rank}"),
                (None, Some(percentage)) => println!("Mythic percentile {percentage:.1}%"),
                (None, None) => println!("Mythic position unknown"),
            }
        }
    } else {
        let next = status
            .next_tier
            .map_or_else(|| "-".to_string(), |tier| tier.to_string());
        print!("Bars to Mythic: {}  Next tier: {next}", status.bars_remaining_to_mythic);
        if status.boss_fight {
            print!("  {}", "BOSS FIGHT".bright_red().bold());
        }
        println!();
    }

    println!(
        "Session: {}-{} ({})  streak {}  form {}",
        status.session_wins,
        status.session_losses,
        win_rate_label(status.session_win_rate),
        streak_label(status),
        form_label(&status.recent_form)
    );

    let mut season = format!(
        "Season: {}-{} ({})",
        status.season_wins,
        status.season_losses,
        win_rate_label(status.season_win_rate)
    );
    if let Some(high) = status.season_high {
        season.push_str(&format!("  high {high}"));
    }
    if let Some(days) = status.days_left_in_season {
        season.push_str(&format!("  {days} days left"));
    }
    println!("{season}");

    let (since_real, since_active) = status.secs_since_last_result;
    let mut time = format!("Time: active {}", format_duration(status.active_session_secs));
    if status.paused {
        time.push_str(&format!("  {}", "PAUSED".yellow().bold()));
    }
    if since_real > 0 {
        time.push_str(&format!(
            "  since last result {} ({} active)",
            format_duration(since_real),
            format_duration(since_active)
        ));
    }
    if status.current_game_secs > 0.0 {
        time.push_str(&format!(
            "  game {}",
            format_duration(truncate_secs(status.current_game_secs))
        ));
    }
    if status.average_game_secs > 0.0 {
        time.push_str(&format!(
            "  avg game {}",
            format_duration(truncate_secs(status.average_game_secs))
        ));
    }
    println!("{time}");

    if let Some(goal) = status.goal {
        let state = if status.goal_reached {
            "reached".green()
        } else {
            "in progress".yellow()
        };
        println!("Goal: {goal} ({state})");
    }
}

fn streak_label(status: &TrackerStatus) -> String {
    if status.current_win_streak > 0 {
        format!("W{}", status.current_win_streak).green().to_string()
    } else if status.current_loss_streak > 0 {
        format!("L{}", status.current_loss_streak).red().to_string()
    } else {
        "-".to_string()
    }
}

pub fn print_history(history: &VecDeque<CompletedSession>) {
    println!("{}", "Recent sessions".bright_cyan().bold());
    if history.is_empty() {
        println!("  {}", "no completed sessions yet".dimmed());
        return;
    }
    for session in history.iter().rev() {
        let secs = (session.end_time - session.start_time).num_seconds();
        let progress = format!("{:+} bars", session.bar_progress);
        let progress = if session.bar_progress >= 0 {
            progress.green()
        } else {
            progress.red()
        };
        let end = session
            .end_rank
            .map_or_else(String::new, |rank| format!("  -> {rank}"));
        println!(
            "  {}  {:<15} {}-{} ({})  {}  {progress}{end}",
            session.date,
            session.format_type.as_str(),
            session.wins,
            session.losses,
            win_rate_label(session.win_rate()),
            format_duration(secs),
        );
    }
}
