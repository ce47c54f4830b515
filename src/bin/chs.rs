use anyhow::anyhow;
use chess::Color;
use chs::{Client, Level, SessionEnd, STOCKFISH_PATH_ENV};
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use std::process::ExitCode;

const AFTER_HELP: &str = "\
Moves:
  Standard algebraic notation (e4, Nf3, exd5, O-O, e8=Q) or
  coordinate notation (e2e4, e7e8q).

Commands during a game:
  hint     ask the engine for a suggestion
  back     take back your last move and the reply
  resign   give up (also: quit, exit)

Environment:
  CHS_STOCKFISH_PATH   path to a Stockfish binary to use
  RUST_LOG             log filter, e.g. RUST_LOG=chs=debug";

fn cli() -> Command {
    Command::new("chs")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Play chess against the Stockfish engine in your terminal")
        .after_help(AFTER_HELP)
        .arg(
            Arg::new("level")
                .short('l')
                .long("level")
                .value_name("LEVEL")
                .help("Engine strength from 1 to 8 (out-of-range values are clamped)")
                .value_parser(clap::value_parser!(i64))
                .allow_negative_numbers(true)
                .default_value("1"),
        )
        .arg(
            Arg::new("play_black")
                .long("play-black")
                .help("Play with the black pieces")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("engine")
                .long("engine")
                .value_name("PATH")
                .help(format!("Stockfish binary to use (overrides {STOCKFISH_PATH_ENV} and PATH)"))
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("pgn")
                .long("pgn")
                .value_name("FILE")
                .help("Write the game to FILE as PGN when it ends")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .subcommand(Command::new("version").about("Print the version and exit"))
}

fn main() -> ExitCode {
    pretty_env_logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    let matches = cli().get_matches();

    if matches.subcommand_matches("version").is_some() {
        println!("chs {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let level = matches
        .get_one::<i64>("level")
        .copied()
        .map(Level::of_int)
        .unwrap_or_default();
    let play_as = if matches.get_flag("play_black") {
        Color::Black
    } else {
        Color::White
    };
    let engine_path = matches.get_one::<PathBuf>("engine").cloned();
    let pgn_path = matches.get_one::<PathBuf>("pgn").cloned();

    log::info!("Starting game at level {} as {:?}", level, play_as);
    let mut client = Client::new(level, play_as, engine_path)?;
    let end = client.run()?;
    log::debug!("Session ended: {:?}", end);

    if let Some(path) = pgn_path {
        std::fs::write(&path, client.pgn(end))
            .map_err(|e| anyhow!("Failed to write PGN to {}: {}", path.display(), e))?;
        println!("Game saved to {}", path.display());
    }

    if let SessionEnd::Finished(outcome) = end {
        log::info!("Game over: {}", outcome);
    }
    Ok(())
}
