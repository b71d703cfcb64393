use std::path::{Path, PathBuf};

use brewtimer_core::progress::{
    current_stage_index, interpolated_water, overall_progress, stage_progress, target_flow_rate,
};
use brewtimer_core::{validate, Recipe};
use clap::Args;
use serde_json::json;

#[derive(Args)]
pub struct TimelineArgs {
    /// Recipe file (.json or .toml)
    pub recipe: PathBuf,
}

#[derive(Args)]
pub struct AtArgs {
    /// Recipe file (.json or .toml)
    pub recipe: PathBuf,
    /// Elapsed seconds to query
    #[arg(allow_hyphen_values = true)]
    pub t: f64,
}

fn load_valid(path: &Path) -> Result<Recipe, Box<dyn std::error::Error>> {
    let recipe = Recipe::load(path)?;
    validate(&recipe.stages)?;
    Ok(recipe)
}

/// Print the expanded timeline as JSON.
pub fn run_timeline(args: TimelineArgs) -> Result<(), Box<dyn std::error::Error>> {
    let recipe = load_valid(&args.recipe)?;
    let timeline = recipe.timeline();
    let out = json!({
        "name": recipe.name,
        "totalSecs": timeline.total_secs(),
        "brewWater": timeline.brew_water(),
        "untimedWater": timeline.untimed_water(),
        "totalWater": timeline.total_water(),
        "segments": timeline.segments(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

/// Print what the brew looks like at one instant.
pub fn run_at(args: AtArgs) -> Result<(), Box<dyn std::error::Error>> {
    let t = args.t;
    if !t.is_finite() {
        return Err(format!("elapsed time must be a finite number of seconds, got {t}").into());
    }
    let recipe = load_valid(&args.recipe)?;
    let timeline = recipe.timeline();
    let segments = timeline.segments();

    let Some(index) = current_stage_index(t, segments) else {
        return Err("recipe has no timed stages".into());
    };
    let segment = &segments[index];
    let label = timeline
        .stage(segment.original_index)
        .map(|s| s.label.as_str())
        .unwrap_or_default();
    let out = json!({
        "t": t,
        "stageIndex": index,
        "originalIndex": segment.original_index,
        "label": label,
        "kind": segment.kind,
        "stageProgress": stage_progress(index, t, segments),
        "water": interpolated_water(t, index, segments),
        "flowRate": target_flow_rate(segment),
        "overallProgress": overall_progress(t, segments),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
