use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};

use ironquest::app::{ProgressionService, WorkflowError, WorkoutReport};
use ironquest::config::Config;
use ironquest::engine::leveling;
use ironquest::engine::progression::Role;
use ironquest::engine::skill_tree::{SkillStatus, UnlockOutcome};
use ironquest::engine::xp;
use ironquest::identity::Identity;
use ironquest::session::workout::WorkoutDraft;
use ironquest::store::json_store::JsonStore;

#[derive(Parser)]
#[command(name = "ironquest", version, about = "Log lifts, earn XP, level up")]
struct Cli {
    /// User id (defaults to `user_id` in the config file)
    #[arg(short, long, global = true)]
    user: Option<String>,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding user records
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the user's record (and remember the user in the config file)
    Init {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: Option<String>,
    },

    /// Record a finished workout from a JSON file
    Log {
        file: PathBuf,
        /// Workout date, overriding the file (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Show level, XP, streaks and attributes
    Status,

    /// List skills and whether they can be unlocked
    Skills,

    /// Spend a skill point on a skill
    Unlock { skill_id: String },

    /// Change role, or suggest one from training goals
    Role {
        role: Option<Role>,
        #[arg(long, num_args = 1..)]
        recommend: Vec<String>,
    },

    /// Reset the weekly session counters
    Rollover,

    /// Recompute level, XP and streaks from the workout history
    Rebuild,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    let mut config = Config::load_from(&config_path)?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.to_string_lossy().to_string();
    }

    let log_level = if cli.verbose { "debug" } else { config.log_level.as_str() };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let store = JsonStore::with_base_dir(PathBuf::from(&config.data_dir))
        .with_context(|| format!("Failed to open data dir {}", config.data_dir))?;
    let service = ProgressionService::new(store, &config);

    let user_id = cli.user.clone().or_else(|| config.user_id.clone());

    let command = match cli.command {
        Commands::Init { email, name } => {
            let Some(user_id) = user_id else {
                bail!("pass --user to choose a user id");
            };
            return init_user(&service, &mut config, &config_path, user_id, email, name);
        }
        other => other,
    };

    let Some(user_id) = user_id else {
        bail!("no user selected: run `ironquest init --user <id> --email <email>` or pass --user");
    };

    match command {
        Commands::Init { .. } => Ok(()),
        Commands::Log { file, date } => log_workout(&service, &user_id, &file, date),
        Commands::Status => print_status(&service, &user_id),
        Commands::Skills => print_skills(&service, &user_id),
        Commands::Unlock { skill_id } => {
            match service.unlock_skill(&user_id, &skill_id, Utc::now())? {
                UnlockOutcome::Unlocked => println!("Unlocked {skill_id}."),
                UnlockOutcome::AlreadyUnlocked => println!("{skill_id} is already unlocked."),
            }
            Ok(())
        }
        Commands::Role { role, recommend } => {
            let role = match role {
                Some(role) => role,
                None if !recommend.is_empty() => {
                    let suggested = Role::recommend(&recommend);
                    println!("Suggested role: {suggested} ({})", suggested.tagline());
                    return Ok(());
                }
                None => bail!("name a role ({}) or pass --recommend <goal>...", role_names()),
            };
            let progression = service.choose_role(&user_id, role)?;
            println!("You are now a {}. {}", progression.role(), role.description());
            Ok(())
        }
        Commands::Rollover => {
            service.roll_over_week(&user_id)?;
            println!("Weekly counters reset.");
            Ok(())
        }
        Commands::Rebuild => {
            let record = service.rebuild_from_history(&user_id)?;
            println!(
                "Replayed {} sessions: level {}, {} XP, {} skill points.",
                record.history.len(),
                record.progression.level(),
                record.progression.xp(),
                record.progression.skill_points()
            );
            Ok(())
        }
    }
}

fn init_user(
    service: &ProgressionService<JsonStore>,
    config: &mut Config,
    config_path: &Path,
    user_id: String,
    email: String,
    name: Option<String>,
) -> Result<()> {
    let identity = Identity::new(user_id, email, name)?;
    let record = service.ensure_user(&identity)?;
    config.user_id = Some(identity.user_id);
    config.email = Some(identity.email);
    config.display_name = identity.display_name;
    config.save_to(config_path)?;
    println!(
        "{} is a level {} {}.",
        record.display_name.as_deref().unwrap_or(&record.user_id),
        record.progression.level(),
        record.progression.role()
    );
    Ok(())
}

fn role_names() -> String {
    Role::all()
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn log_workout(
    service: &ProgressionService<JsonStore>,
    user_id: &str,
    file: &Path,
    date: Option<NaiveDate>,
) -> Result<()> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read workout file {}", file.display()))?;
    let mut draft: WorkoutDraft = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse workout file {}", file.display()))?;
    if date.is_some() {
        draft.date = date;
    }

    for exercise in &draft.exercises {
        let per_set: Vec<String> = exercise
            .sets
            .iter()
            .map(|set| match xp::compute_set_xp(set) {
                Ok(xp) => format!("+{xp}"),
                Err(_) => "invalid".to_string(),
            })
            .collect();
        println!("{:<24} {}", exercise.label(), per_set.join(" "));
    }

    let today = Local::now().date_naive();
    match service.complete_workout(user_id, draft, today) {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(WorkflowError::PartiallyRecorded {
            report,
            rejected_index,
            source,
        }) => {
            print_report(&report);
            bail!("stopped at exercise {}: {source}", rejected_index + 1)
        }
        Err(e) => Err(e.into()),
    }
}

fn print_report(report: &WorkoutReport) {
    println!(
        "Workout on {}: +{} XP ({} sets)",
        report.session.date(),
        report.session.xp_gained(),
        report.session.set_count()
    );
    if report.level_ups > 0 {
        println!(
            "LEVEL UP! Now level {} (+{} skill point{})",
            report.progression.level(),
            report.level_ups,
            if report.level_ups == 1 { "" } else { "s" }
        );
    }
    println!(
        "Streak: {} day(s), {} session(s) this week",
        report.stats.current_streak, report.stats.sessions_this_week
    );
    for id in &report.new_achievements {
        println!("Achievement earned: {id}");
    }
    for id in &report.newly_eligible_skills {
        println!("Skill ready to unlock: {id}");
    }
}

fn print_status(service: &ProgressionService<JsonStore>, user_id: &str) -> Result<()> {
    let status = service.status(user_id)?;
    let p = &status.record.progression;
    let stats = &status.record.stats;
    println!(
        "{} the {}",
        status.record.display_name.as_deref().unwrap_or(&status.record.user_id),
        p.role()
    );
    println!(
        "Level {}  XP {} / {}  ({:.0}% to next level)",
        p.level(),
        p.xp(),
        leveling::cumulative_threshold(p.level().saturating_add(1)),
        status.progress_fraction * 100.0
    );
    println!("Skill points: {}", p.skill_points());
    println!(
        "Sessions: {} total, {} this week ({:.0} kg)",
        stats.total_sessions, stats.sessions_this_week, stats.weekly_volume_kg
    );
    println!(
        "Streak: {} current, {} longest",
        stats.current_streak, stats.longest_streak
    );
    for (name, value) in status.attributes.named() {
        println!("  {name:<12} {value:>3}");
    }
    if !status.achievements.is_empty() {
        let names: Vec<_> = status.achievements.iter().map(|a| a.name).collect();
        println!("Achievements: {}", names.join(", "));
    }
    Ok(())
}

fn print_skills(service: &ProgressionService<JsonStore>, user_id: &str) -> Result<()> {
    for state in service.evaluate_skills(user_id)? {
        let def = state.definition;
        let marker = match state.status {
            SkillStatus::Unlocked => "[x]",
            SkillStatus::Eligible => "[!]",
            SkillStatus::Locked => "[ ]",
        };
        let role = def.role_affinity.map(|r| r.as_str()).unwrap_or("Any");
        println!("{marker} {:<16} {:<14} {:<12} {}", def.id, def.name, role, def.criteria);
    }
    Ok(())
}
