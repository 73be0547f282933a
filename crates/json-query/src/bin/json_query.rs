//! `json-query`: evaluate a JSONPath query against a document.
//!
//! Usage:
//!   json-query [--path] [--nodups] [--sort | --sort-desc] [--replace <json> | --remove] '<query>'
//!
//! The document is read from stdin.

use json_query::cli::{parse_args, run};
use std::io::{self, Read, Write};

fn main() {
    let invocation = match parse_args(std::env::args().skip(1)) {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let mut buf = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut buf) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    match run(&invocation, &buf) {
        Ok(result) => {
            let mut stdout = io::stdout();
            if let Err(e) = stdout
                .write_all(result.as_bytes())
                .and_then(|()| stdout.write_all(b"\n"))
            {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
