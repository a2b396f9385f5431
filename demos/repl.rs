//! Interactive REPL over a single `Temporal` flow.
//!
//! Reads one line of Code-language source at a time from stdin, pushes it
//! into the flow and ticks `update`, then dumps the flow and any side
//! effects produced. `:dump` prints the flow without pushing anything;
//! `:reset` clears progress; `:quit`/`:q` exits.

use std::io::{self, BufRead, Write};

use verbflow::{Code, DefaultRegistry, Many, Temporal};

fn main() {
    simple_logger::SimpleLogger::new().init().unwrap();

    let registry = DefaultRegistry::new();
    let mut flow = Temporal::new(Many::empty());

    println!("verbflow repl — type Code-language source, or :dump / :reset / :quit");

    let stdin = io::stdin();
    loop {
        print!("> ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line {
            ":quit" | ":q" => break,
            ":dump" => {
                println!("{}", flow.dump(&registry));
                continue;
            }
            ":reset" => {
                flow.reset();
                println!("reset");
                continue;
            }
            _ => {}
        }

        let (parsed, warnings) = match Code::from(line).parse(&registry, true) {
            Ok(result) => result,
            Err(err) => {
                println!("{}", err.display_with_source(line));
                continue;
            }
        };
        for warning in &warnings {
            println!("warning: {} (byte {})", warning.message, warning.position);
        }

        match flow.push(parsed, &registry) {
            Ok(side_effects) if !side_effects.is_empty() => {
                let rendered = serde_json::to_string_pretty(&side_effects).unwrap_or_else(|_| format!("{side_effects:?}"));
                println!("=> {rendered}");
            }
            Ok(_) => {}
            Err(err) => {
                println!("link error: {err}");
                continue;
            }
        }

        match flow.update(1.0, &registry) {
            Ok((true, side_effects)) if !side_effects.is_empty() => {
                let rendered = serde_json::to_string_pretty(&side_effects).unwrap_or_else(|_| format!("{side_effects:?}"));
                println!("=> {rendered}");
            }
            Ok((true, _)) => {}
            Ok((false, _)) => println!("(flow did not complete this step)"),
            Err(err) => println!("flow error: {err}"),
        }
    }
}
