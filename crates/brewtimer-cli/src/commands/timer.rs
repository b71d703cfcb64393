use std::path::PathBuf;

use brewtimer_core::timer::{self, TimerClient};
use brewtimer_core::{Config, Event, Recipe, TimerController, TimerError, TimerSettings};
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

#[derive(Args)]
pub struct RunArgs {
    /// Recipe file (.json or .toml)
    pub recipe: PathBuf,
    /// Override seconds per tick from config
    #[arg(long)]
    pub tick_secs: Option<u32>,
}

/// Brew live in the terminal, printing every event as a JSON line.
pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let recipe = Recipe::load(&args.recipe)?;
    let mut settings = Config::load_or_default().timer_settings();
    if let Some(tick_secs) = args.tick_secs {
        settings.tick_secs = tick_secs.max(1);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(session(recipe, settings))
}

async fn session(recipe: Recipe, settings: TimerSettings) -> Result<(), Box<dyn std::error::Error>> {
    info!(recipe = %recipe.name, stages = recipe.stages.len(), "starting brew");
    let (client, task) = timer::spawn(TimerController::new(recipe.stages, settings));
    let result = brew(&client).await;
    client.shutdown().await?;
    task.await?;
    result
}

async fn brew(client: &TimerClient) -> Result<(), Box<dyn std::error::Error>> {
    let mut events = client.subscribe();
    client.start().await?;
    eprintln!("controls: <enter> status, p pause/resume, s skip final wait, r reset, q quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    println!("{}", serde_json::to_string(&event)?);
                    if matches!(event, Event::Completed { .. }) {
                        return Ok(());
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event output fell behind"),
                Err(RecvError::Closed) => return Ok(()),
            },
            line = lines.next_line(), if stdin_open => match line? {
                Some(input) => {
                    if !handle_input(client, input.trim()).await? {
                        return Ok(());
                    }
                }
                None => stdin_open = false,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, stopping brew");
                return Ok(());
            }
        }
    }
}

/// Apply one keyboard command. Returns `false` to quit.
async fn handle_input(client: &TimerClient, input: &str) -> Result<bool, Box<dyn std::error::Error>> {
    match input {
        "q" => return Ok(false),
        "p" => {
            if !client.pause().await? {
                client.start().await?;
            }
        }
        "s" => match client.skip().await {
            Ok(()) => {}
            Err(TimerError::SkipNotAllowed) => eprintln!("skip is only available in the final wait"),
            Err(err) => return Err(err.into()),
        },
        "r" => {
            client.reset().await?;
            eprintln!("reset; press p to start again");
        }
        "" => println!("{}", serde_json::to_string(&client.snapshot().await?)?),
        other => eprintln!("unknown command: {other}"),
    }
    Ok(true)
}
