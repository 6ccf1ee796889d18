use gridworld_pi::*;
use std::process::ExitCode;

const USAGE: &str = "usage: gridworld-pi [--json] [CONFIG]";

#[derive(Debug, Default, PartialEq)]
struct Args {
    config: Option<String>,
    json: bool,
}

fn parse_args(args: &[String]) -> std::result::Result<Args, String> {
    let mut parsed = Args::default();
    for arg in args {
        match arg.as_str() {
            "--json" => parsed.json = true,
            flag if flag.starts_with("--") => return Err(format!("unknown flag {flag}\n{USAGE}")),
            path if parsed.config.is_none() => parsed.config = Some(path.to_string()),
            extra => return Err(format!("unexpected argument {extra}\n{USAGE}")),
        }
    }
    Ok(parsed)
}

fn run(args: &Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => GridConfig::from_path(path)?,
        None => GridConfig::maze(),
    };

    let solution = config.solve()?;

    if args.json {
        println!("{}", solution.to_json()?);
    } else {
        println!(
            "Policy stable: {}, Number of iterations: {}",
            solution.stable, solution.iterations
        );
        println!(
            "\n{}",
            render_policy(&solution.objects, &solution.policy_grid()?)
        );
        println!(
            "\n{}",
            render_values(&solution.objects, &solution.value_grid()?)
        );
    }

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let args = match parse_args(&args) {
        Ok(args) => args,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
