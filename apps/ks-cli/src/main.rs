use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use ks_store::{CaseRunStore, StoreResult};

#[derive(Parser)]
#[command(name = "ks-cli")]
#[command(about = "KinSketch CLI - case and run store inspection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List cases in a project
    Cases {
        /// Path to the project directory
        project_dir: PathBuf,
    },
    /// List runs for a case
    Runs {
        /// Path to the project directory
        project_dir: PathBuf,
        /// Case ID to list runs for
        case_id: String,
    },
    /// Set the display name of a case
    RenameCase {
        /// Path to the project directory
        project_dir: PathBuf,
        /// Case ID
        case_id: String,
        /// New display name
        name: String,
    },
    /// Relabel a case ID everywhere it appears
    RelabelCase {
        /// Path to the project directory
        project_dir: PathBuf,
        /// Current case ID
        case_id: String,
        /// New case ID
        new_id: String,
    },
    /// Delete all runs of a case (keeps the case)
    DeleteRuns {
        /// Path to the project directory
        project_dir: PathBuf,
        /// Case ID
        case_id: String,
    },
    /// Delete a case and all of its runs
    DeleteCase {
        /// Path to the project directory
        project_dir: PathBuf,
        /// Case ID
        case_id: String,
    },
    /// Show or set the active case
    Active {
        /// Path to the project directory
        project_dir: PathBuf,
        /// Case ID to activate (omit to show the current one)
        case_id: Option<String>,
    },
}

fn main() -> StoreResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Cases { project_dir } => cmd_cases(&project_dir),
        Commands::Runs {
            project_dir,
            case_id,
        } => cmd_runs(&project_dir, &case_id),
        Commands::RenameCase {
            project_dir,
            case_id,
            name,
        } => cmd_rename_case(&project_dir, &case_id, &name),
        Commands::RelabelCase {
            project_dir,
            case_id,
            new_id,
        } => cmd_relabel_case(&project_dir, &case_id, &new_id),
        Commands::DeleteRuns {
            project_dir,
            case_id,
        } => cmd_delete_runs(&project_dir, &case_id),
        Commands::DeleteCase {
            project_dir,
            case_id,
        } => cmd_delete_case(&project_dir, &case_id),
        Commands::Active {
            project_dir,
            case_id,
        } => cmd_active(&project_dir, case_id.as_deref()),
    }
}

fn cmd_cases(project_dir: &Path) -> StoreResult<()> {
    let store = CaseRunStore::new(project_dir)?;
    let cases = store.list_cases();

    if cases.is_empty() {
        println!("No cases found in project");
        return Ok(());
    }
    let active = store.active_case();
    println!("Cases (newest first):");
    for case in cases {
        let marker = if active.as_deref() == Some(case.case_id.as_str()) {
            "*"
        } else {
            " "
        };
        println!(
            "{} {}  {}  (updated {})",
            marker, case.case_id, case.name, case.updated_utc
        );
    }
    Ok(())
}

fn cmd_runs(project_dir: &Path, case_id: &str) -> StoreResult<()> {
    let store = CaseRunStore::new(project_dir)?;
    let runs = store.list_runs(case_id)?;

    if runs.is_empty() {
        println!("No runs found for case: {}", case_id);
        return Ok(());
    }
    println!("Runs for case '{}':", case_id);
    for run in runs {
        let success = match run.success {
            Some(true) => "ok",
            Some(false) => "fail",
            None => "?",
        };
        let steps = run
            .n_steps
            .map(|n| n.to_string())
            .unwrap_or_else(|| "?".to_string());
        let rate = run
            .success_rate
            .map(|r| format!("{:.1}%", r * 100.0))
            .unwrap_or_else(|| "?".to_string());
        println!("  {}  {}  steps={}  success={}", run.run_id, success, steps, rate);
    }
    Ok(())
}

fn cmd_rename_case(project_dir: &Path, case_id: &str, name: &str) -> StoreResult<()> {
    let store = CaseRunStore::new(project_dir)?;
    if store.update_case_name(case_id, name)? {
        println!("✓ Renamed case {} to '{}'", case_id, name);
    } else {
        println!("Case not found or name invalid: {}", case_id);
    }
    Ok(())
}

fn cmd_relabel_case(project_dir: &Path, case_id: &str, new_id: &str) -> StoreResult<()> {
    let store = CaseRunStore::new(project_dir)?;
    if store.rename_case_id(case_id, new_id)? {
        println!("✓ Relabeled case {} -> {}", case_id, new_id);
    } else {
        println!("Relabel failed: unknown id, invalid target, or target in use");
    }
    Ok(())
}

fn cmd_delete_runs(project_dir: &Path, case_id: &str) -> StoreResult<()> {
    let store = CaseRunStore::new(project_dir)?;
    if store.delete_case_runs(case_id)? {
        println!("✓ Deleted all runs for case {}", case_id);
    } else {
        println!("No runs to delete for case: {}", case_id);
    }
    Ok(())
}

fn cmd_delete_case(project_dir: &Path, case_id: &str) -> StoreResult<()> {
    let store = CaseRunStore::new(project_dir)?;
    if store.delete_case(case_id)? {
        println!("✓ Deleted case {}", case_id);
    } else {
        println!("Case not found: {}", case_id);
    }
    Ok(())
}

fn cmd_active(project_dir: &Path, case_id: Option<&str>) -> StoreResult<()> {
    let store = CaseRunStore::new(project_dir)?;
    match case_id {
        Some(id) => {
            if store.find_case(id).is_none() {
                println!("Case not found: {}", id);
                return Ok(());
            }
            store.set_active_case(Some(id))?;
            println!("✓ Active case: {}", id);
        }
        None => match store.active_case() {
            Some(id) => println!("Active case: {}", id),
            None => println!("No active case"),
        },
    }
    Ok(())
}
