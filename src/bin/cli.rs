use mantle_chess::board::Color;
use mantle_chess::error::SearchError;
use mantle_chess::game::Game;
use mantle_chess::moves::magic::MagicTables;
use mantle_chess::moves::magic::loader::load_magic_tables;
use mantle_chess::search::mate::find_forced_mate;
use mantle_chess::search::mcts::Mcts;
use std::io::{self, BufRead, Write};

#[cfg(feature = "cli")]
fn init_logging() {
    mantle_chess::logger::init_logging("logs/cli.log", "info");
}

#[cfg(not(feature = "cli"))]
fn init_logging() {}

fn main() {
    init_logging();

    let tables = load_magic_tables();
    let mut game = Game::new();

    println!("mantle-chess interactive console. Type `help` for commands.");

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l.trim().to_string(),
            Err(_) => break,
        };
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts[0] {
            "quit" | "exit" => break,
            "help" => print_help(),
            "new" => {
                game = Game::new();
                println!("started a new game");
            }
            "fen" => println!("{}", game.to_fen()),
            "position" if parts.len() > 1 => {
                let fen = parts[1..].join(" ");
                match Game::parse_fen(&fen) {
                    Ok(g) => {
                        game = g;
                        println!("position set");
                    }
                    Err(e) => println!("error: {e}"),
                }
            }
            "d" | "display" => print_board(&game),
            "legal" | "lm" => print_legal_moves(&game, &tables),
            "mcts" => run_mcts(&game, &tables, parts.get(1)),
            "mate" => run_mate(&game, &tables, parts.get(1)),
            "status" => println!("{:?}", game.status(&tables)),
            _ => apply_move(&mut game, &tables, parts[0]),
        }

        let _ = io::stdout().flush();
    }
}

fn print_help() {
    println!(
        "commands: <move> (e.g. e4, Nf3, O-O) | new | position <fen> | fen | \
         d / display | legal / lm | mcts <iterations> | mate <depth> | status | quit"
    );
}

fn print_board(game: &Game) {
    println!("{}", game.board());
    println!(
        "{} to move, fullmove {}",
        match game.side_to_move() {
            Color::White => "white",
            Color::Black => "black",
        },
        game.fullmove_number()
    );
}

fn print_legal_moves(game: &Game, tables: &MagicTables) {
    let moves = game.legal_moves(tables);
    if moves.is_empty() {
        println!("no legal moves");
        return;
    }
    let tokens: Vec<String> = moves.into_iter().map(|(_, san)| san).collect();
    println!("{}", tokens.join(" "));
}

fn apply_move(game: &mut Game, tables: &MagicTables, token: &str) {
    match game.apply_move_token(token, tables) {
        Ok(_) => {
            if game.is_terminated() {
                println!("{:?}", game.outcome());
            }
        }
        Err(e) => println!("error: {e}"),
    }
}

fn run_mcts(game: &Game, tables: &MagicTables, iterations_arg: Option<&&str>) {
    let iterations: u32 = iterations_arg.and_then(|s| s.parse().ok()).unwrap_or(1_000);

    match Mcts::new(game.board(), tables) {
        Ok(mut mcts) => match mcts.run(iterations) {
            Ok(stats) => {
                for stat in stats.iter().take(5) {
                    println!(
                        "{:?} visits={} value={:.3}",
                        stat.mv, stat.visits, stat.average_value
                    );
                }
            }
            Err(e) => report_search_error(e),
        },
        Err(e) => report_search_error(e),
    }
}

fn run_mate(game: &Game, tables: &MagicTables, depth_arg: Option<&&str>) {
    let depth: u32 = depth_arg.and_then(|s| s.parse().ok()).unwrap_or(4);

    match find_forced_mate(game.board(), tables, game.side_to_move(), depth) {
        Ok(lines) if lines.is_empty() => println!("no forced mate found within {depth} plies"),
        Ok(lines) => {
            for line in &lines {
                println!("mate in {}: {}", line.plies_to_mate(), line.tokens.join(", "));
            }
        }
        Err(e) => report_search_error(e),
    }
}

fn report_search_error(e: SearchError) {
    println!("error: {e}");
}
