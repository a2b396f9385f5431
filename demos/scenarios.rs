//! Walks the same six acceptance scenarios `tests/scenarios.rs` verifies,
//! printing what each one parses and executes to.

use verbflow::{Code, DefaultRegistry, Many, Temporal};

fn main() {
    let registry = DefaultRegistry::new();

    section("WORD-OPERATOR ASSOCIATE");
    parse_and_show(&registry, "`plural` associate index::many", false);

    section("CHARGED CREATE OVER A POSITIONAL VERB LITERAL");
    parse_and_show(&registry, "Create!-1(Verb(?, ??))", false);

    section("CONSTANT FOLDING");
    println!("  unfolded:");
    parse_and_show(&registry, "-(2*8.75-14^2)", false);
    println!("  folded:");
    parse_and_show(&registry, "-(2*8.75-14^2)", true);

    section("WORD-OPERATOR CREATE WITH A FILTERED FUTURE TRAIT");
    parse_and_show(&registry, "? create Name(A::Text??)", false);

    section("TEMPORAL PUSH AND UPDATE");
    let mut flow = Temporal::new(Many::empty());
    for line in ["? create Thing(User)", "Thing(Universe)"] {
        let (parsed, _) = Code::from(line).parse(&registry, false).expect("parses");
        println!("  push \"{line}\"");
        let side_effects = flow.push(parsed, &registry).expect("links");
        if !side_effects.is_empty() {
            println!("    immediate side effects: {}", serde_json::to_string_pretty(&side_effects).unwrap());
        }
    }
    let (ok, side_effects) = flow.update(1.0, &registry).expect("updates");
    println!("  update(1.0) -> ok={ok}");
    println!("  side effects: {}", serde_json::to_string_pretty(&side_effects).unwrap());
    println!("  flow: {}", flow.dump(&registry));

    section("JSON ROUND-TRIP");
    let encoded = serde_json::to_string(flow.priority_stack()).unwrap();
    let decoded: Many = serde_json::from_str(&encoded).unwrap();
    println!("  round-trips: {}", decoded == *flow.priority_stack());
}

fn section(title: &str) {
    println!("\n--- {title} ---");
}

fn parse_and_show(registry: &DefaultRegistry, source: &str, optimize: bool) {
    println!("  \"{source}\" (optimize={optimize})");
    match Code::from(source).parse(registry, optimize) {
        Ok((many, warnings)) => {
            for warning in &warnings {
                println!("    warning: {} (byte {})", warning.message, warning.position);
            }
            println!("    -> {:?}", many);
        }
        Err(err) => println!("    -> error: {err}"),
    }
}
