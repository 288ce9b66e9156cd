//! babble — generate security technobabble from the command line.
//!
//! Usage: babble [-n <count>] [-s <seed>] [-r <rules.ron>] [--no-mutations]
//!               [-f | --format] [-p | --post]

use technobabble::{GenerateRequest, Generator, Mode};

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut num_sentences: Option<usize> = None;
    let mut seed: Option<u64> = None;
    let mut rules_path = "data/technobabble.ron".to_string();
    let mut mutations = true;
    let mut mode = Mode::Sentences;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                return;
            }
            "-n" | "--num-sentences" if i + 1 < args.len() => {
                i += 1;
                match args[i].parse() {
                    Ok(n) => num_sentences = Some(n),
                    Err(_) => {
                        eprintln!("Invalid sentence count: {}", args[i]);
                        std::process::exit(1);
                    }
                }
            }
            "-s" | "--seed" if i + 1 < args.len() => {
                i += 1;
                match args[i].parse() {
                    Ok(s) => seed = Some(s),
                    Err(_) => {
                        eprintln!("Invalid seed: {}", args[i]);
                        std::process::exit(1);
                    }
                }
            }
            "-r" | "--rules" if i + 1 < args.len() => {
                i += 1;
                rules_path = args[i].clone();
            }
            "--no-mutations" => mutations = false,
            "-f" | "--format" => mode = Mode::Format,
            "-p" | "--post" => mode = Mode::Post,
            other => {
                eprintln!("Unknown argument: {}", other);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let mut builder = Generator::builder().rules_path(&rules_path);
    if let Some(s) = seed {
        builder = builder.seed(s);
    }

    let mut generator = match builder.build() {
        Ok(g) => g,
        Err(e) => {
            eprintln!("ERROR: failed to load rules from '{}': {}", rules_path, e);
            std::process::exit(1);
        }
    };

    let output = generator.generate(&GenerateRequest {
        num_sentences,
        mutations,
        mode,
    });

    println!("{}", output);

    if let Some(s) = seed {
        eprintln!("\n[Seed: {}]", s);
    }
}

fn print_usage() {
    println!("Usage: babble [options]");
    println!();
    println!("Options:");
    println!("  -n, --num-sentences <n>  sentences to generate (default: random 4-10)");
    println!("  -s, --seed <n>           random seed for reproducibility");
    println!("  -r, --rules <path>       rule table file (default: data/technobabble.ron)");
    println!("      --no-mutations       disable sentence mutations");
    println!("  -f, --format             use format templates (threads, tutorials, reports)");
    println!("  -p, --post               use the hierarchical POST structure");
}
