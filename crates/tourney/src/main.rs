//! Tournament CLI
//!
//! Manage one tournament stored in a JSON snapshot: teams, matches, scores,
//! automatic scheduling and standings.

use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use tourney::{
    match_lines, ControllerRegistry, LoggingConfig, SchedulingStrategy, StandingsReport,
    TournamentService, TourneyConfig, DEFAULT_CONFIG_FILE,
};
use tourney_core::{Match, MatchStatus, MemoryStore, Sport, TeamId, Tournament, TournamentStore};

type Service = TournamentService<MemoryStore>;

fn print_usage() {
    println!("Tournament scheduler");
    println!();
    println!("Usage:");
    println!("  tourney [--config FILE] <command> [args]");
    println!();
    println!("Commands:");
    println!("  init <name> [--sport S] [--matches-per-team N]");
    println!("  publish | start | finish");
    println!("  auto <on|off>               - automatic match creation");
    println!("  cap <N|none>                - matches per team for automatic creation");
    println!("  teams                       - list teams with points and rank");
    println!("  teams add <name>...         - add teams");
    println!("  teams generate <count>      - add teams named \"Team N\"");
    println!("  teams remove <number>       - remove a team");
    println!("  matches                     - list matches");
    println!("  match <number> <number>     - create a match by hand");
    println!("  schedule [--no-status-update]");
    println!("  promote [--any-order]       - start every match that can start");
    println!("  score <ordering> <team>=<value>... [--status S]");
    println!("  status <ordering> <COMING|ONGOING|DONE>");
    println!("  standings [--save FILE]");
    println!();
    println!("Examples:");
    println!("  tourney init \"Spring Cup\" --sport petanque --matches-per-team 3");
    println!("  tourney score 2 1=13 4=9 --status done");
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Value following a `--flag` in the argument list
fn flag_value<'a>(args: &'a [String], names: &[&str]) -> Option<&'a str> {
    args.iter()
        .position(|a| names.contains(&a.as_str()))
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// First argument that is neither a flag nor the value of one
fn first_positional<'a>(args: &'a [String], value_flags: &[&str]) -> Option<&'a str> {
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
        } else if value_flags.contains(&arg.as_str()) {
            skip_next = true;
        } else if !arg.starts_with('-') {
            return Some(arg);
        }
    }
    None
}

fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|a| a == name)
}

fn current_tournament(store: &MemoryStore) -> Result<Tournament> {
    store
        .snapshot()
        .tournaments
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("no tournament in the data file, run `tourney init` first"))
}

fn match_by_ordering(
    store: &MemoryStore,
    tournament: &Tournament,
    ordering: &str,
) -> Result<Match> {
    let ordering: u32 = ordering
        .trim_start_matches('#')
        .parse()
        .with_context(|| format!("invalid match number: {}", ordering))?;
    store
        .matches(tournament.id)?
        .into_iter()
        .find(|m| m.ordering == ordering)
        .ok_or_else(|| anyhow!("no match #{}", ordering))
}

fn team_by_number(store: &MemoryStore, tournament: &Tournament, number: &str) -> Result<TeamId> {
    let number: u32 = number
        .parse()
        .with_context(|| format!("invalid team number: {}", number))?;
    store
        .teams(tournament.id)?
        .into_iter()
        .find(|t| t.number == number)
        .map(|t| t.id)
        .ok_or_else(|| anyhow!("no team #{}", number))
}

fn print_matches(store: &MemoryStore, tournament: &Tournament, matches: &[Match]) -> Result<()> {
    let teams = store.teams(tournament.id)?;
    for line in match_lines(matches, &teams) {
        println!("  {}", line);
    }
    Ok(())
}

fn report_scheduled(service: &Service, tournament: &Tournament, created: &[Match]) -> Result<()> {
    if !created.is_empty() {
        println!("{} match(es) created automatically:", created.len());
        print_matches(service.store(), tournament, created)?;
    }
    Ok(())
}

fn run_init(config: &TourneyConfig, args: &[String]) -> Result<()> {
    let value_flags = ["--sport", "-s", "--matches-per-team", "-m"];
    let Some(name) = first_positional(args, &value_flags) else {
        bail!("init requires a tournament name");
    };
    if config.data_file.exists() {
        bail!("{} already exists", config.data_file.display());
    }

    let sport = match flag_value(args, &["--sport", "-s"]) {
        Some(s) => s.parse::<Sport>().map_err(|e| anyhow!(e))?,
        None => Sport::Generic,
    };

    let service = TournamentService::new(MemoryStore::new(), ControllerRegistry::default());
    let tournament = service.create_tournament(name, sport)?;
    if let Some(cap) = flag_value(args, &["--matches-per-team", "-m"]) {
        let cap: u32 = cap.parse().context("invalid --matches-per-team")?;
        service.set_nb_team_matches(tournament.id, Some(cap))?;
        service.set_auto_match_creation(tournament.id, true)?;
    }

    service.store().save(&config.data_file)?;
    println!("Created {} ({}) in {}", tournament.name, sport, config.data_file.display());
    Ok(())
}

fn run_teams(service: &Service, tournament: &Tournament, args: &[String]) -> Result<()> {
    match args.first().map(String::as_str) {
        None => {
            println!("{:>3}  {:<24} {:>7} {:>6} {:>4}", "#", "Team", "Matches", "Points", "Rank");
            for row in service.team_overview(tournament.id)? {
                println!(
                    "{:>3}  {:<24} {:>7} {:>6} {:>4}",
                    row.team.number, row.team.name, row.match_count, row.points, row.rank
                );
            }
        }
        Some("add") => {
            if args.len() < 2 {
                bail!("teams add requires at least one name");
            }
            for name in &args[1..] {
                let team = service.add_team(tournament.id, name)?;
                println!("Added #{} {}", team.number, team.name);
            }
        }
        Some("generate") => {
            let count: u32 = args
                .get(1)
                .ok_or_else(|| anyhow!("teams generate requires a count"))?
                .parse()
                .context("invalid team count")?;
            let teams = service.add_teams(tournament.id, count)?;
            println!("Added {} teams", teams.len());
        }
        Some("remove") => {
            let number = args
                .get(1)
                .ok_or_else(|| anyhow!("teams remove requires a team number"))?;
            let team_id = team_by_number(service.store(), tournament, number)?;
            service.remove_team(team_id)?;
            println!("Removed team #{}", number);
        }
        Some(other) => bail!("unknown teams command: {}", other),
    }
    Ok(())
}

fn run_score(service: &Service, tournament: &Tournament, args: &[String]) -> Result<()> {
    let Some(ordering) = args.first() else {
        bail!("score requires a match number");
    };
    let m = match_by_ordering(service.store(), tournament, ordering)?;

    let new_status = match flag_value(args, &["--status"]) {
        Some(s) => Some(s.parse::<MatchStatus>().map_err(|e| anyhow!(e))?),
        None => None,
    };

    let mut scores = Vec::new();
    for entry in args[1..].iter().filter(|a| a.contains('=')) {
        let (number, value) = entry
            .split_once('=')
            .ok_or_else(|| anyhow!("expected <team>=<value>, got {}", entry))?;
        let team_id = team_by_number(service.store(), tournament, number)?;
        let value = if value.trim().is_empty() {
            None
        } else {
            Some(value.trim().parse::<i32>().with_context(|| format!("invalid score: {}", value))?)
        };
        scores.push((team_id, value));
    }

    let update = service.record_scores(m.id, &scores, new_status)?;
    println!("Match #{} is {}", update.updated.ordering, update.updated.status);
    report_scheduled(service, tournament, &update.scheduled)
}

fn run_command(
    service: &Service,
    tournament: &Tournament,
    command: &str,
    args: &[String],
) -> Result<()> {
    match command {
        "publish" => {
            service.publish(tournament.id)?;
            println!("{} is published", tournament.name);
        }
        "start" => {
            let created = service.start(tournament.id)?;
            println!("{} has started!", tournament.name);
            report_scheduled(service, tournament, &created)?;
        }
        "finish" => {
            service.finish(tournament.id)?;
            println!("{} is finished", tournament.name);
        }
        "auto" => {
            let enabled = match args.first().map(String::as_str) {
                Some("on") | Some("true") => true,
                Some("off") | Some("false") => false,
                _ => bail!("auto requires on or off"),
            };
            service.set_auto_match_creation(tournament.id, enabled)?;
        }
        "cap" => {
            let cap = match args.first().map(String::as_str) {
                Some("none") => None,
                Some(value) => Some(value.parse::<u32>().context("invalid cap")?),
                None => bail!("cap requires a number or none"),
            };
            service.set_nb_team_matches(tournament.id, cap)?;
        }
        "teams" => run_teams(service, tournament, args)?,
        "matches" => {
            let matches = service.store().matches(tournament.id)?;
            print_matches(service.store(), tournament, &matches)?;
        }
        "match" => {
            let teams = args
                .iter()
                .map(|n| team_by_number(service.store(), tournament, n))
                .collect::<Result<Vec<_>>>()?;
            let created = service.create_match(tournament.id, &teams, None)?;
            println!("Created match #{}", created.ordering);
        }
        "schedule" => {
            let update_statuses = !has_flag(args, "--no-status-update");
            let created = service.controller(tournament).create_next_matches(
                service.store(),
                tournament.id,
                update_statuses,
            )?;
            if created.is_empty() {
                println!("No match to create");
            }
            report_scheduled(service, tournament, &created)?;
        }
        "promote" => {
            let promoted = service.promote_matches(tournament.id, !has_flag(args, "--any-order"))?;
            println!("{} match(es) started", promoted.len());
            print_matches(service.store(), tournament, &promoted)?;
        }
        "score" => run_score(service, tournament, args)?,
        "status" => {
            let (Some(ordering), Some(status)) = (args.first(), args.get(1)) else {
                bail!("status requires a match number and a status");
            };
            let m = match_by_ordering(service.store(), tournament, ordering)?;
            let status = status.parse::<MatchStatus>().map_err(|e| anyhow!(e))?;
            let update = service.set_match_status(m.id, status)?;
            println!("Match #{} is {}", update.updated.ordering, update.updated.status);
            report_scheduled(service, tournament, &update.scheduled)?;
        }
        "standings" => {
            let overview = service.team_overview(tournament.id)?;
            let report = StandingsReport::new(tournament, &overview);
            report.print_report();
            if let Some(path) = flag_value(args, &["--save"]) {
                report.save(&PathBuf::from(path)).map_err(|e| anyhow!(e))?;
            }
        }
        other => {
            print_usage();
            bail!("unknown command: {}", other);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let mut args: Vec<String> = env::args().skip(1).collect();

    let mut config_path = PathBuf::from(DEFAULT_CONFIG_FILE);
    if let Some(i) = args.iter().position(|a| a == "--config" || a == "-c") {
        let path = args
            .get(i + 1)
            .cloned()
            .ok_or_else(|| anyhow!("--config requires a path"))?;
        config_path = PathBuf::from(path);
        args.drain(i..=i + 1);
    }

    let config = TourneyConfig::load_or_default(&config_path)?;
    init_tracing(&config.logging);

    let Some(command) = args.first().cloned() else {
        print_usage();
        return Ok(());
    };

    match command.as_str() {
        "help" | "--help" | "-h" => print_usage(),
        "init" => run_init(&config, &args[1..])?,
        _ => {
            let store = MemoryStore::load(&config.data_file)?;
            let registry = ControllerRegistry::standard(&config.scheduler);
            let service = TournamentService::new(store, registry)
                .with_update_statuses(config.scheduler.update_statuses);
            let tournament = current_tournament(service.store())?;

            run_command(&service, &tournament, &command, &args[1..])?;
            service.store().save(&config.data_file)?;
        }
    }

    Ok(())
}
