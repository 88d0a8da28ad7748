//! CLI smoke entry point and operator probes.
//!
//! # Responsibility
//! - Verify `crewboard_core` linkage with deterministic output.
//! - `query "<sql>"` runs one diagnostic statement against the configured
//!   database and prints the report.
//! - `employee <@user>` and `project (--id <n> | <#forum>)` print one
//!   directory or project row.
//!
//! Configuration comes from the JSON file named by `CREWBOARD_CONFIG`, or
//! from the `CREWBOARD_*` environment variables when it is unset.

use crewboard_core::config::CoreConfig;
use crewboard_core::db::diagnostics::run_diagnostic_query;
use crewboard_core::model::ids::ProjectId;
use crewboard_core::model::selector::ProjectSelector;
use crewboard_core::repo::{EmployeeRepository, ProjectRepository, TaskRepository};
use crewboard_core::{init_logging, open_db, ChannelId, Selector, SqliteEntityStore, UserId};
use log::info;
use rusqlite::Connection;
use std::process::ExitCode;

const ENV_CONFIG_FILE: &str = "CREWBOARD_CONFIG";
const USAGE: &str =
    "usage: crewboard_cli [query \"<sql>\" | employee <@user> | project (--id <n> | <#forum>)]";

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = match args.first().map(String::as_str) {
        None => {
            println!("crewboard_core ping={}", crewboard_core::ping());
            println!("crewboard_core version={}", crewboard_core::core_version());
            return ExitCode::SUCCESS;
        }
        Some("query") if args.len() == 2 => run_query(&args[1]),
        Some("employee") if args.len() == 2 => show_employee(&args[1]),
        Some("project") if args.len() > 1 => show_project(&args[1..]),
        Some(_) => {
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn open_configured(command: &str) -> Result<Connection, String> {
    let config = match std::env::var(ENV_CONFIG_FILE) {
        Ok(path) if !path.trim().is_empty() => CoreConfig::load(path.trim()),
        _ => CoreConfig::from_env(),
    }
    .map_err(|err| format!("config error: {err}"))?;

    init_logging(&config.log_level, &config.log_dir)
        .map_err(|err| format!("logging error: {err}"))?;
    info!("event=cli_command module=cli status=start command={command}");

    open_db(&config.db_path).map_err(|err| format!("database error: {err}"))
}

fn run_query(sql: &str) -> Result<String, String> {
    let conn = open_configured("query")?;
    match run_diagnostic_query(&conn, sql) {
        Ok(report) => Ok(report.render()),
        Err(failure) => Err(failure.render()),
    }
}

fn show_employee(mention: &str) -> Result<String, String> {
    let user = UserId::parse_mention(mention).map_err(|err| err.to_string())?;
    let conn = open_configured("employee")?;
    let store = SqliteEntityStore::try_new(&conn).map_err(|err| err.to_string())?;

    let employee = store
        .find_employee(&Selector::External(user), true)
        .map_err(|err| err.to_string())?
        .ok_or_else(|| format!("{} is not a registered employee", user.mention()))?;
    Ok(format!(
        "{} id={} level={} active={} utc_offset={}",
        employee.label(),
        employee.id,
        employee.access_level,
        employee.is_active(),
        employee
            .utc_offset
            .map_or_else(|| "unset".to_string(), |offset| offset.to_string())
    ))
}

fn show_project(args: &[String]) -> Result<String, String> {
    let selector = parse_project_selector(args)?;
    let conn = open_configured("project")?;
    let store = SqliteEntityStore::try_new(&conn).map_err(|err| err.to_string())?;

    let project = store
        .find_project(&selector)
        .map_err(|err| err.to_string())?
        .ok_or_else(|| "project not found".to_string())?;
    let counters = store
        .task_counters(project.id)
        .map_err(|err| err.to_string())?;
    Ok(format!(
        "{} id={} forum={} main_thread={} tasks={} completed={}",
        project.name,
        project.id,
        project.forum_channel_id.mention(),
        project.main_thread.thread_id().mention(),
        counters.total,
        counters.completed
    ))
}

fn parse_project_selector(args: &[String]) -> Result<ProjectSelector, String> {
    let mut internal = None;
    let mut external = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--id" {
            let raw = iter.next().ok_or_else(|| USAGE.to_string())?;
            let id = raw
                .parse::<i64>()
                .map_err(|_| format!("invalid project id `{raw}`"))?;
            internal = Some(ProjectId(id));
        } else {
            external = Some(ChannelId::parse_mention(arg).map_err(|err| err.to_string())?);
        }
    }
    Selector::from_parts(internal, external).map_err(|err| err.to_string())
}
