//! Quickstart: load the shipped rule table and print one output per mode.
//!
//! Run with: cargo run --example quickstart

use technobabble::{GenerateRequest, Generator, Mode};

fn main() {
    let mut generator = Generator::builder()
        .seed(42)
        .rules_path("data/technobabble.ron")
        .build()
        .expect("failed to load data/technobabble.ron");

    println!("--- flat sentences ---");
    println!(
        "{}\n",
        generator.generate(&GenerateRequest {
            num_sentences: Some(5),
            mutations: true,
            mode: Mode::Sentences,
        })
    );

    println!("--- hierarchical post ---");
    println!(
        "{}\n",
        generator.generate(&GenerateRequest {
            num_sentences: None,
            mutations: true,
            mode: Mode::Post,
        })
    );

    println!("--- format template ---");
    println!(
        "{}\n",
        generator.generate(&GenerateRequest {
            num_sentences: None,
            mutations: false,
            mode: Mode::Format,
        })
    );

    println!("context memory after last generation: {:?}", generator.context());
}
