use std::sync::Arc;

use clearpage::{convert, AppState, ConversionOptions, StrategyId};

const USAGE: &str = "usage: clearpage [--bypass] [--strategy <name>] [--json] [--no-images] [--no-cache] <url>";

// "auto" keeps the tiered logic in charge, same as not passing the flag.
fn parse_strategy(value: &str) -> Result<Option<StrategyId>, String> {
    if value.eq_ignore_ascii_case("auto") {
        return Ok(None);
    }
    StrategyId::parse_str(value)
        .map(Some)
        .ok_or_else(|| format!("unknown strategy '{}'", value))
}

fn parse_args() -> Result<(String, ConversionOptions), String> {
    let mut options = ConversionOptions::default();
    let mut url = None;

    let mut args = std::env::args().skip(1).peekable();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--bypass" => options.bypass = true,
            "--json" => options.json_format = true,
            "--no-images" => options.preserve_images = false,
            "--no-cache" => options.use_cache = false,
            "--strategy" => {
                let value = args.next().ok_or("--strategy needs a value")?;
                options.strategy = parse_strategy(&value)?;
            }
            other if other.starts_with("--strategy=") => {
                options.strategy = parse_strategy(&other["--strategy=".len()..])?;
            }
            "--help" | "-h" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("{}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            other if other.starts_with("--") => return Err(format!("unknown flag '{}'", other)),
            other => url = Some(other.to_string()),
        }
    }

    let url = url.ok_or(USAGE)?;
    Ok((url, options))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    let (url, options) = match parse_args() {
        Ok(parsed) => parsed,
        Err(message) => {
            eprintln!("{}", message);
            std::process::exit(2);
        }
    };

    let state = Arc::new(AppState::default());
    let result = convert(&state, &url, &options).await?;

    tracing::info!(
        "converted via {} in {}ms (cache: {})",
        result.strategy,
        result.elapsed_ms,
        result.from_cache
    );
    println!("{}", result.content);
    Ok(())
}
