use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cgpa;
mod config;
mod convert;
mod error;
mod export;
mod grade_scale;
mod ledger;
mod models;
mod planner;
mod report;
mod sgpa;

use config::AppConfig;
use error::EngineError;
use ledger::HistoryLedger;
use models::{
    Action, Actor, Country, CumulativeResult, Grade, HistoryEntry, Rating, SemesterResult, SubjectMarks,
};

#[derive(Parser)]
#[command(name = "calci")]
#[command(about = "SGPA/CGPA calculator with country conversion, target planning and a history ledger", long_about = None)]
struct Cli {
    /// Path to a TOML config file (defaults to ./calci.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory for the ledger and exported files
    #[arg(long, global = true)]
    results_dir: Option<PathBuf>,
    /// Skip writing CSV and markdown exports
    #[arg(long, global = true)]
    no_export: bool,
    #[command(flatten)]
    actor: ActorArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ActorArgs {
    #[arg(long, global = true)]
    student: Option<String>,
    #[arg(long, global = true)]
    hallticket: Option<String>,
    #[arg(long, global = true)]
    program: Option<String>,
}

impl From<ActorArgs> for Actor {
    fn from(args: ActorArgs) -> Self {
        Actor {
            student: args.student,
            hallticket: args.hallticket,
            program: args.program,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Look up the letter grade and grade point for a percentage
    Grade {
        percent: String,
    },
    /// Compute a semester SGPA from a CSV of subject marks and record it
    Semester {
        #[arg(long)]
        semester: u8,
        /// Columns: subject,credits,mid1,mid2,presentation,see
        #[arg(long)]
        csv: PathBuf,
    },
    /// Compute a credit-weighted CGPA and record it
    Cgpa {
        /// SGPA:CREDITS, repeatable
        #[arg(long = "pair")]
        pairs: Vec<String>,
        /// Seed semesters from recorded SGPAs for --hallticket
        #[arg(long)]
        from_history: bool,
    },
    /// Convert a 10-point CGPA to approximate foreign equivalents
    Convert {
        #[arg(long)]
        cgpa: f64,
        #[arg(long)]
        country: Option<String>,
    },
    /// Work out the SEE score needed for a target grade point
    Plan {
        /// Current CIE total out of 50
        #[arg(long)]
        cie: f64,
        /// Target grade point (10, 9, 8, 7, 6, 5 or 4)
        #[arg(long)]
        target: f64,
        /// NAME[:easy|moderate|hard], repeatable
        #[arg(long = "subject")]
        subjects: Vec<String>,
        /// Usefulness rating for this plan, 1 to 5
        #[arg(long)]
        rating: Option<u8>,
    },
    /// Rate the app from 1 to 5 stars
    Rate {
        #[arg(long)]
        rating: u8,
        #[arg(long, default_value = "")]
        feedback: String,
    },
    /// Show recorded history, ratings and exports
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Write a markdown summary report
        #[arg(long = "report")]
        report_out: Option<PathBuf>,
        /// Export every entry to CSV
        #[arg(long = "csv")]
        csv_out: Option<PathBuf>,
    },
    /// Irreversibly clear the history ledger
    Reset {
        /// Also delete exported CSV and markdown files
        #[arg(long)]
        purge_files: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(dir) = cli.results_dir {
        config.results_dir = dir;
    }
    if cli.no_export {
        config.export_files = false;
    }

    let history = HistoryLedger::new(config.history_path());
    let actor = Actor::from(cli.actor);
    info!(ledger = %history.path().display(), "calci starting");

    match cli.command {
        Commands::Grade { percent } => {
            let grade = record_grade(&history, actor, &percent)?;
            println!("{}% -> {} ({} grade points)", percent.trim(), grade.label, grade.points);
        }
        Commands::Semester { semester, csv } => {
            let subjects = export::read_subjects_csv(&csv)?;
            record_semester(&history, &config, actor, semester, &subjects)?;
        }
        Commands::Cgpa {
            pairs,
            from_history,
        } => {
            record_cgpa(&history, &config, actor, &pairs, from_history)?;
        }
        Commands::Convert { cgpa, country } => {
            let conversion = convert::convert(cgpa)?;
            let selected: Vec<Country> = match country {
                Some(name) => vec![name.parse()?],
                None => Country::ALL.to_vec(),
            };

            for country in &selected {
                if let Some(payload) = conversion.get(country) {
                    println!("- {country}: {payload}");
                }
            }
            if selected.contains(&Country::UnitedStates) {
                if let Some(models::CountryPayload::LinearScale { value, .. }) =
                    conversion.get(&Country::UnitedStates)
                {
                    println!("{}", convert::us_guidance(*value));
                }
            }

            history.append(HistoryEntry::new(actor, Action::CountryConversion { cgpa }, None))?;
        }
        Commands::Plan {
            cie,
            target,
            subjects,
            rating,
        } => {
            let requirement = planner::required_remaining(cie, target)?;
            let rating = rating.map(Rating::try_from).transpose()?;
            let parsed = subjects
                .iter()
                .map(|raw| planner::parse_plan_subject(raw))
                .collect::<Result<Vec<_>, _>>()?;
            let plan_items = planner::study_plan(&parsed);

            if requirement.required_remaining == 0.0 {
                println!("Grade point {target} is already secured with CIE {cie:.2}.");
            } else {
                println!(
                    "You need about {:.2}/50 in SEE to reach grade point {} (per subject).",
                    requirement.required_remaining, target
                );
            }
            for item in &plan_items {
                println!("{} ({:?})", item.subject, item.difficulty);
                for step in &item.steps {
                    println!("  - {step}");
                }
            }

            history.append(HistoryEntry::new(
                actor,
                Action::PlannerRun {
                    current_partial_score: requirement.current_partial_score,
                    target_grade_points: requirement.target_grade_points,
                    required_remaining: requirement.required_remaining,
                    plan_items,
                },
                rating,
            ))?;
        }
        Commands::Rate { rating, feedback } => {
            let rating = Rating::try_from(rating)?;
            history.append(HistoryEntry::new(
                actor,
                Action::AppRating { feedback },
                Some(rating),
            ))?;
            println!("Thank you, your {}-star rating has been saved.", rating.value());
        }
        Commands::History {
            limit,
            report_out,
            csv_out,
        } => {
            let entries = history.read_all()?;
            let summary = ledger::summarize(&entries);

            if entries.is_empty() {
                println!("No history entries yet.");
            } else {
                println!("{} entries in {}:", summary.entry_count, history.path().display());
                let skip = entries.len().saturating_sub(limit);
                for entry in entries.iter().skip(skip) {
                    let rating = entry
                        .rating
                        .map(|r| format!(" rated {}", r.value()))
                        .unwrap_or_default();
                    println!(
                        "- {} {} by {}{}",
                        entry.timestamp,
                        entry.action.kind(),
                        entry.actor.student.as_deref().unwrap_or("anonymous"),
                        rating
                    );
                }
            }
            match summary.average_rating {
                Some(average) => println!(
                    "Average rating: {average:.2} / 5 ({} ratings)",
                    summary.rating_count
                ),
                None => println!("No ratings recorded yet."),
            }

            if let Some(path) = report_out {
                std::fs::write(&path, report::build_history_report(&entries))?;
                println!("Report written to {}.", path.display());
            }
            if let Some(path) = csv_out {
                export::write_history_csv(&path, &entries)?;
                println!("History exported to {}.", path.display());
            }
        }
        Commands::Reset { purge_files } => {
            history.reset_all()?;
            println!("History reset.");
            if purge_files {
                let removed = export::purge_exports(&config.results_dir)?;
                println!("Deleted {} exported files.", removed.len());
            }
        }
    }

    Ok(())
}

fn record_grade(history: &HistoryLedger, actor: Actor, raw: &str) -> anyhow::Result<Grade> {
    let grade = grade_scale::lookup_raw(raw)?;
    let percent: f64 = raw.trim().parse()?;
    history.append(HistoryEntry::new(
        actor,
        Action::GradeLookup {
            percent,
            label: grade.label.to_string(),
            points: grade.points,
        },
        None,
    ))?;
    Ok(grade)
}

fn record_semester(
    history: &HistoryLedger,
    config: &AppConfig,
    actor: Actor,
    semester: u8,
    subjects: &[SubjectMarks],
) -> anyhow::Result<SemesterResult> {
    let result = sgpa::compute(semester, subjects)?;

    for subject in &result.subjects {
        println!(
            "- {} ({} credits): CIE {:.2} + SEE {:.2} = {:.2} -> {} ({})",
            subject.name,
            subject.credits,
            subject.continuous_assessment,
            subject.final_exam,
            subject.total_score,
            subject.grade.label,
            subject.grade.points
        );
    }

    let sgpa = result.sgpa.ok_or(EngineError::NoCredits).with_context(|| {
        format!("semester {semester} SGPA is undefined; nothing was saved")
    })?;
    println!("Semester {semester} SGPA: {sgpa:.3} over {} credits", result.total_credits);

    // A corrupt ledger must fail before any export lands on disk.
    history.read_all()?;

    let exports = if config.export_files {
        write_semester_exports(config, &actor, &result)?
    } else {
        Vec::new()
    };

    let entry = HistoryEntry::new(
        actor,
        Action::SemesterComputation {
            semester,
            sgpa,
            total_credits: result.total_credits,
            subject_count: result.subjects.len(),
            exports: exports.iter().map(|p| p.display().to_string()).collect(),
        },
        None,
    );
    if let Err(err) = history.append(entry) {
        discard_exports(&exports);
        return Err(err.into());
    }

    Ok(result)
}

fn write_semester_exports(
    config: &AppConfig,
    actor: &Actor,
    result: &SemesterResult,
) -> anyhow::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(&config.results_dir)?;
    let label = format!("Sem{}", result.semester);

    let csv_path = config
        .results_dir
        .join(export::export_file_name(actor.student.as_deref(), &label, "csv"));
    export::write_semester_csv(&csv_path, result)?;

    let report_path = config
        .results_dir
        .join(export::export_file_name(actor.student.as_deref(), &label, "md"));
    let markdown = report::build_semester_report(actor, result, &ledger::now_timestamp());
    if let Err(err) = std::fs::write(&report_path, markdown) {
        discard_exports(std::slice::from_ref(&csv_path));
        return Err(err.into());
    }

    println!("Saved {} and {}.", csv_path.display(), report_path.display());
    Ok(vec![csv_path, report_path])
}

fn record_cgpa(
    history: &HistoryLedger,
    config: &AppConfig,
    actor: Actor,
    pairs: &[String],
    from_history: bool,
) -> anyhow::Result<CumulativeResult> {
    // Read up front: seeds --from-history and surfaces a corrupt ledger before any export.
    let entries = history.read_all()?;

    let mut inputs = Vec::new();
    if from_history {
        let hallticket = actor
            .hallticket
            .as_deref()
            .context("--from-history needs --hallticket")?;
        inputs.extend(ledger::semester_credits_for(&entries, hallticket));
    }
    for raw in pairs {
        inputs.push(cgpa::parse_pair(raw)?);
    }

    let result = cgpa::compute(&inputs)?;
    for pair in &result.counted {
        match pair.semester {
            Some(semester) => println!("- Sem {semester}: SGPA {} over {} credits", pair.sgpa, pair.credits),
            None => println!("- SGPA {} over {} credits", pair.sgpa, pair.credits),
        }
    }
    println!("CGPA (10-point): {:.3} over {} credits", result.cgpa, result.total_credits);

    let mut exports = Vec::new();
    if config.export_files {
        std::fs::create_dir_all(&config.results_dir)?;
        let path = config
            .results_dir
            .join(export::export_file_name(actor.student.as_deref(), "CGPA", "csv"));
        export::write_cumulative_csv(&path, actor.student.as_deref(), &result)?;
        println!("Saved {}.", path.display());
        exports.push(path);
    }

    let entry = HistoryEntry::new(
        actor,
        Action::CgpaComputation {
            cgpa: result.cgpa,
            total_credits: result.total_credits,
            semesters_counted: result.counted.len(),
        },
        None,
    );
    if let Err(err) = history.append(entry) {
        discard_exports(&exports);
        return Err(err.into());
    }

    Ok(result)
}

fn discard_exports(paths: &[PathBuf]) {
    for path in paths {
        if let Err(err) = std::fs::remove_file(path) {
            warn!(path = %path.display(), %err, "failed to remove export");
        }
    }
}
