//! `standup` - CLI for the team standup service
//!
//! Each subcommand opens the configured database, runs one operation and
//! prints the result as plain text or, with `--json`, as JSON.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use serde::Serialize;

use standup::cli::{
    BoardCommand, Cli, Command, ConfigCommand, ListCommand, MemberCommand, SubmitCommand,
};
use standup::{
    init_logging, Config, EntryView, Identity, Member, NewMember, SelfStatus, StandupService,
    Submission,
};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config_path = cli.config;
    match cli.command {
        Command::Member(member_cmd) => handle_member(&open_service(config_path)?, member_cmd),
        Command::Submit(submit_cmd) => handle_submit(&open_service(config_path)?, &submit_cmd),
        Command::Board(board_cmd) => handle_board(&open_service(config_path)?, &board_cmd),
        Command::List(list_cmd) => handle_list(&open_service(config_path)?, &list_cmd),
        Command::Regions(flag) => handle_regions(&open_service(config_path)?, flag.json),
        Command::Stats(flag) => handle_stats(&open_service(config_path)?, flag.json),
        Command::Reset(reset_cmd) => handle_reset(config_path, reset_cmd.yes),
        Command::Api => handle_api(&open_service(config_path)?),
        Command::Config(config_cmd) => handle_config(config_path, config_cmd),
    }
}

fn load_config(config_path: Option<PathBuf>) -> anyhow::Result<Config> {
    Config::load_from(config_path).context("failed to load configuration")
}

fn open_service(config_path: Option<PathBuf>) -> anyhow::Result<StandupService> {
    let config = load_config(config_path)?;
    StandupService::open(&config).with_context(|| {
        format!(
            "failed to open database {}",
            config.database_path().display()
        )
    })
}

fn handle_member(service: &StandupService, cmd: MemberCommand) -> anyhow::Result<()> {
    match cmd {
        MemberCommand::List { region, json } => {
            let members = service.list_members(region)?;
            if json {
                return print_json(&members);
            }
            if members.is_empty() {
                println!("No members.");
            }
            for member in &members {
                print_member(member);
            }
            Ok(())
        }
        MemberCommand::Add {
            name,
            region,
            role,
            credential,
        } => {
            let id = service.add_member(&NewMember::new(name, region).with_role(role))?;
            if let Some(credential) = credential {
                service.change_credential(id, &credential)?;
            }
            println!("Added member {id}.");
            Ok(())
        }
        MemberCommand::Login { id, credential } => {
            let member = service.authenticate(&Identity::new(id, credential))?;
            println!("Authenticated as {} ({}).", member.name, member.role);
            Ok(())
        }
        MemberCommand::Passwd { id, credential } => {
            service.change_credential(id, &credential)?;
            println!("Credential changed for member {id}.");
            Ok(())
        }
    }
}

fn handle_submit(service: &StandupService, cmd: &SubmitCommand) -> anyhow::Result<()> {
    let submission = Submission {
        member_id: cmd.member,
        date: cmd.date,
        yesterday: cmd.yesterday.clone(),
        today: cmd.today.clone(),
        blockers: cmd.blockers.clone(),
    };
    let outcome = service.submit(&submission)?;
    if cmd.json {
        return print_json(&outcome);
    }
    let verb = if outcome.created { "Created" } else { "Updated" };
    println!("{verb} standup {}.", outcome.id);
    Ok(())
}

fn handle_board(service: &StandupService, cmd: &BoardCommand) -> anyhow::Result<()> {
    let identity = cmd.viewer.identity();
    let board = service.board(identity.as_ref(), cmd.date, cmd.region)?;
    if cmd.json {
        return print_json(&board);
    }

    let suffix = if board.is_today { " (today)" } else { "" };
    println!("Standups for {}{suffix}", board.date);
    println!();

    match &board.self_status {
        Some(SelfStatus::Today { entry }) => {
            println!("Your update:");
            print_entry(entry);
        }
        Some(SelfStatus::PlanFromYesterday { entry }) => {
            println!("Your plan from yesterday:");
            print_entry(entry);
        }
        Some(SelfStatus::Empty) => println!("You have no update for this day."),
        None => {}
    }

    if board.team.is_empty() {
        println!("No team updates to show.");
    } else {
        println!("Team:");
        for entry in &board.team {
            print_entry(entry);
        }
    }
    Ok(())
}

fn handle_list(service: &StandupService, cmd: &ListCommand) -> anyhow::Result<()> {
    let entries = service.list_standups(&cmd.filter())?;
    if cmd.json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("No standups.");
    }
    for entry in &entries {
        print_entry(entry);
    }
    Ok(())
}

fn handle_regions(service: &StandupService, json: bool) -> anyhow::Result<()> {
    let regions = service.regions()?;
    if json {
        return print_json(&regions);
    }
    for region in regions {
        println!("{region}");
    }
    Ok(())
}

fn handle_stats(service: &StandupService, json: bool) -> anyhow::Result<()> {
    let stats = service.stats()?;
    if json {
        return print_json(&stats);
    }
    println!("standup stats");
    println!("-------------");
    println!("Database:      {}", service.storage().path().display());
    println!("Members:       {}", stats.total_members);
    println!("Standups:      {}", stats.total_standups);
    match (stats.oldest_date, stats.newest_date) {
        (Some(oldest), Some(newest)) => println!("Date range:    {oldest} .. {newest}"),
        _ => println!("Date range:    (none)"),
    }
    println!("Size:          {} bytes", stats.db_size_bytes);
    Ok(())
}

fn handle_reset(config_path: Option<PathBuf>, yes: bool) -> anyhow::Result<()> {
    if !yes {
        println!("This will delete every member and standup entry.");
        println!("Use --yes to confirm.");
        return Ok(());
    }
    let summary = open_service(config_path)?.reset()?;
    println!(
        "Removed {} members and {} standups.",
        summary.members_deleted, summary.standups_deleted
    );
    Ok(())
}

fn handle_api(service: &StandupService) -> anyhow::Result<()> {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    standup::api::serve(service, stdin.lock(), stdout.lock())?;
    Ok(())
}

fn handle_config(config_path: Option<PathBuf>, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = load_config(config_path)?;
            if json {
                return print_json(&config);
            }
            println!("Current Configuration");
            println!("=====================");
            println!();
            println!("[Storage]");
            println!("  Database path:      {}", config.database_path().display());
            println!("  Busy timeout (ms):  {}", config.storage.busy_timeout_ms);
            println!();
            println!("[Directory]");
            println!(
                "  Min credential:     {}",
                config.directory.min_credential_length
            );
            println!();
            println!("[Calendar]");
            println!("  UTC offset:         {}", config.utc_offset());
        }
        ConfigCommand::Path => {
            let path = config_path.unwrap_or_else(Config::default_config_path);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            if let Err(e) = Config::load_from(Some(path)) {
                bail!("configuration error: {e}");
            }
            println!("Configuration is valid.");
        }
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_member(member: &Member) {
    println!(
        "{:>4}  {:<24} {:<10} {}",
        member.id, member.name, member.region, member.role
    );
}

fn print_entry(entry: &EntryView) {
    let name = entry.member_name.as_deref().unwrap_or("(unknown member)");
    let region = entry.region.map_or_else(String::new, |r| format!(" [{r}]"));
    println!("  #{} {} on {}{region}", entry.entry.id, name, entry.entry.date);
    for (label, body) in [
        ("Yesterday", &entry.entry.yesterday),
        ("Today", &entry.entry.today),
        ("Blockers", &entry.entry.blockers),
    ] {
        if !body.is_empty() {
            println!("    {label:<10} {body}");
        }
    }
}
