use std::path::PathBuf;

use anyhow::{bail, Context};

use airwatch::models::{DaySelection, UpdateOutcome};
use airwatch::{App, Config};

const USAGE: &str = "usage: airwatch [--config <path>] <command>

commands:
  schedule [day]     print the release schedule
  update             compare the schedule with the catalog, flushing on a new season
  sync               store shows from the schedule that are not in the catalog
  catalog            list the stored shows
  latest <title>     show the latest episode and its magnet links
  released <title>   check whether a show appears in the latest releases
  shorten <magnet>   shorten a magnet link";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();

    // Check for --config flag
    let config_path = match args.iter().position(|a| a == "--config") {
        Some(i) if i + 1 < args.len() => {
            let path = PathBuf::from(args.remove(i + 1));
            args.remove(i);
            Some(path)
        }
        Some(_) => bail!("--config needs a path\n\n{}", USAGE),
        None => None,
    };

    let config = match &config_path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::load().context("failed to load config")?,
    };

    let Some(command) = args.first().cloned() else {
        bail!("{}", USAGE);
    };
    let rest = args[1..].join(" ");

    let mut app = App::new(&config)
        .await
        .with_context(|| format!("failed to open database at {}", config.db_path))?;

    let result = run(&mut app, &command, &rest).await;
    app.close().await?;
    result
}

async fn run(app: &mut App, command: &str, rest: &str) -> anyhow::Result<()> {
    match command {
        "schedule" => {
            let days = if rest.is_empty() {
                DaySelection::All
            } else {
                DaySelection::One(rest.to_string())
            };
            print!("{}", app.render_schedule(days).await?);
        }
        "update" => match app.update().await? {
            UpdateOutcome::Unchanged => println!("Schedule unchanged"),
            UpdateOutcome::MismatchFlushed => {
                println!("New season detected, shows and subscriptions flushed")
            }
        },
        "sync" => {
            let added = app.sync_catalog().await?;
            println!("Added {} shows", added);
        }
        "catalog" => {
            for show in app.catalog().await? {
                println!("[{}] {} - {} @ {} PST", show.id, show.airing_day, show.title, show.airing_time);
            }
        }
        "latest" => {
            let title = required(rest, "a show title")?;
            let episode = app.latest_episode(title).await?;
            println!("{} - {}", title, episode.label);
            println!("720p:  {}", episode.link_720p);
            println!("1080p: {}", episode.link_1080p);
        }
        "released" => {
            let title = required(rest, "a show title")?;
            if app.check_released(title).await? {
                println!("{} is out", title);
            } else {
                println!("{} has not been released yet", title);
            }
        }
        "shorten" => {
            let magnet = required(rest, "a magnet link")?;
            println!("{}", app.shorten_link(magnet).await?);
        }
        other => bail!("unknown command `{}`\n\n{}", other, USAGE),
    }
    Ok(())
}

fn required<'a>(value: &'a str, what: &str) -> anyhow::Result<&'a str> {
    if value.is_empty() {
        bail!("expected {}\n\n{}", what, USAGE);
    }
    Ok(value)
}
