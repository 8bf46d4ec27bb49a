use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use featureplot::{feature_scatterplot, prediction_heatmap, Config};

const USAGE: &str = "\
usage: featureplot [--config FILE] [--out FILE] scatter FEATURESET FEATURE...
       featureplot [--config FILE] [--out FILE] heatmap PREDICTIONSET

Writes the plotly figure JSON to FILE or stdout.
Environment: FEATUREPLOT_CONFIG, FEATUREPLOT_ENGINE, RUST_LOG";

#[derive(Debug, PartialEq)]
enum Command {
    Scatter { fset: PathBuf, features: Vec<String> },
    Heatmap { pset: PathBuf },
    Help,
}

#[derive(Debug, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    out: Option<PathBuf>,
    command: Command,
}

fn parse_args<I: Iterator<Item = String>>(mut args: I) -> Result<Args> {
    let mut config = None;
    let mut out = None;
    let mut positional = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config = Some(PathBuf::from(args.next().context("--config needs a path")?)),
            "--out" | "-o" => out = Some(PathBuf::from(args.next().context("--out needs a path")?)),
            "--help" | "-h" => {
                return Ok(Args {
                    config,
                    out,
                    command: Command::Help,
                })
            }
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let command = match positional.next().as_deref() {
        Some("scatter") => {
            let fset = positional.next().context("scatter needs a feature set path")?;
            let features: Vec<String> = positional.collect();
            Command::Scatter {
                fset: PathBuf::from(fset),
                features,
            }
        }
        Some("heatmap") => {
            let pset = positional.next().context("heatmap needs a prediction set path")?;
            Command::Heatmap {
                pset: PathBuf::from(pset),
            }
        }
        Some(other) => bail!("unknown command '{other}'\n\n{USAGE}"),
        None => bail!("{USAGE}"),
    };

    Ok(Args {
        config,
        out,
        command,
    })
}

fn main() -> Result<()> {
    env_logger::init();

    let args = parse_args(std::env::args().skip(1))?;
    if args.command == Command::Help {
        println!("{USAGE}");
        return Ok(());
    }
    let config = Config::load(args.config.as_deref())?;

    let payload = match &args.command {
        Command::Scatter { fset, features } => feature_scatterplot(fset, features.as_slice(), &config)?,
        Command::Heatmap { pset } => prediction_heatmap(pset, &config)?,
        Command::Help => return Ok(()),
    };

    match &args.out {
        Some(path) => {
            std::fs::write(path, &payload.document)
                .with_context(|| format!("writing {}", path.display()))?;
            log::info!("Wrote figure to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(payload.document.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn scatter_with_options() {
        let parsed = args(&["--out", "grid.json", "scatter", "fset.parquet", "amp", "std"]).unwrap();
        assert_eq!(parsed.out, Some(PathBuf::from("grid.json")));
        assert_eq!(
            parsed.command,
            Command::Scatter {
                fset: PathBuf::from("fset.parquet"),
                features: vec!["amp".into(), "std".into()],
            }
        );
    }

    #[test]
    fn heatmap_with_config() {
        let parsed = args(&["heatmap", "pred.csv", "--config", "fp.toml"]).unwrap();
        assert_eq!(parsed.config, Some(PathBuf::from("fp.toml")));
        assert_eq!(
            parsed.command,
            Command::Heatmap {
                pset: PathBuf::from("pred.csv")
            }
        );
    }

    #[test]
    fn help_is_a_command_not_an_error() {
        assert_eq!(args(&["--help"]).unwrap().command, Command::Help);
        assert_eq!(args(&["scatter", "-h"]).unwrap().command, Command::Help);
    }

    #[test]
    fn missing_or_unknown_command_fails() {
        assert!(args(&[]).is_err());
        assert!(args(&["plot3d", "x"]).is_err());
        assert!(args(&["scatter"]).is_err());
        assert!(args(&["--out"]).is_err());
    }
}
