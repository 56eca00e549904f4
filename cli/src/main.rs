#![deny(clippy::all)]

use anyhow::Context;
use scripty::{Engine, Value};
use std::{fs, path::PathBuf, process};
use structopt::StructOpt;

/// Runs a scripty source file.
#[derive(Debug, StructOpt)]
#[structopt(name = "scripty")]
struct Opt {
    /// Path to the source file to run.
    #[structopt(parse(from_os_str))]
    source_path: PathBuf,

    /// Print the value of NAME (a top-level variable) after the script
    /// finishes, instead of the script's own result value.
    #[structopt(long = "print")]
    print_var: Option<String>,

    /// Parse the source file and print its AST instead of running it.
    #[structopt(long = "dump-ast")]
    dump_ast: bool,
}

fn read_file(path: &PathBuf) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read file {:?}", path))
}

fn run(opt: Opt) -> anyhow::Result<()> {
    let source = read_file(&opt.source_path)?;

    if opt.dump_ast {
        let ast = scripty::parser::parse(&source).map_err(|e| anyhow::anyhow!("{:#}", e))?;
        println!("{:#?}", ast);
        return Ok(());
    }

    let mut engine = Engine::new();
    scripty::defaults::install(&mut engine);

    let result = scripty::parse_and_run(&mut engine, &source).map_err(|e| anyhow::anyhow!("{:#}", e))?;

    match opt.print_var {
        Some(name) => match engine.get_variable(&name) {
            Some(value) => println!("{}", display_value(&value)),
            None => anyhow::bail!("no such variable: {}", name),
        },
        None => {
            if let Ok(value) = result.value() {
                println!("{}", display_value(&value));
            }
        }
    }
    Ok(())
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::UInt(u) => u.to_string(),
        Value::Size(s) => s.to_string(),
        Value::Char(c) => c.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Double(d) => d.to_string(),
        Value::Host(_) => format!("{:?}", value),
    }
}

fn main() {
    tracing_subscriber::fmt::init();

    let exit_code = match run(Opt::from_args()) {
        Ok(_) => 0,
        Err(err) => {
            eprintln!("{:#}", err);
            1
        }
    };
    process::exit(exit_code);
}
