use crate::config::{init_project_config, load_config, locate_config, to_yaml, Config, ConfigLocation};
use crate::model::{format_remaining, TimeUnit};
use crate::scheduler::Ticker;
use crate::timer::{CountdownPolicy, FocusTimer};
use crate::ui;
use anyhow::{anyhow, Context, Result};
use std::env;
use std::io::{stdout, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Instant;
use tracing::debug;

pub fn init() -> Result<()> {
    let cwd = env::current_dir()?;
    let location = init_project_config(&cwd)?;
    println!("Initialized config at {}", location.path.display());
    Ok(())
}

pub fn show_config(explicit: Option<PathBuf>) -> Result<()> {
    let (config, location) = load_current_config(explicit)?;
    println!(
        "# {} ({}{})",
        location.path.display(),
        location.scope.label(),
        if location.path.exists() { "" } else { ", not written yet" }
    );
    print!("{}", to_yaml(&config)?);
    Ok(())
}

pub fn countdown(
    explicit: Option<PathBuf>,
    text: String,
    duration: Option<u64>,
    unit: Option<TimeUnit>,
) -> Result<()> {
    let (config, _) = load_current_config(explicit)?;
    let mut timer = start_countdown(&config, text, duration, unit)?;
    let mut ticker = Ticker::new(config.tick_interval());
    let mut out = stdout();
    write_banner(&mut out, &timer, &config)?;
    run_to_completion(&mut timer, &mut ticker, &mut out)?;
    writeln!(out)?;
    writeln!(out, "Done.")?;
    Ok(())
}

pub fn tui(explicit: Option<PathBuf>) -> Result<()> {
    let (config, location) = load_current_config(explicit)?;
    ui::run(config, location)
}

fn start_countdown(
    config: &Config,
    text: String,
    duration: Option<u64>,
    unit: Option<TimeUnit>,
) -> Result<FocusTimer> {
    let mut timer = FocusTimer::new(config.timer_settings());
    timer.set_draft_text(text);
    if let Some(d) = duration {
        timer.set_draft_duration(d);
    }
    if let Some(u) = unit {
        timer.set_draft_unit(u);
    }
    timer.add_task().map_err(|err| anyhow!(err))?;
    timer.start_task().context("starting countdown")?;
    Ok(timer)
}

fn write_banner(out: &mut impl Write, timer: &FocusTimer, config: &Config) -> Result<()> {
    let task = timer
        .running_task()
        .ok_or_else(|| anyhow!("no task is running"))?;
    writeln!(out, "{} ({} total)", task.text, format_remaining(task.duration))?;
    if config.countdown_policy == CountdownPolicy::ResetToDefault
        && task.duration != timer.remaining_secs()
    {
        writeln!(
            out,
            "counting down the shared {} default (countdown_policy: reset-to-default)",
            format_remaining(timer.remaining_secs())
        )?;
    }
    Ok(())
}

fn run_to_completion(
    timer: &mut FocusTimer,
    ticker: &mut Ticker,
    out: &mut impl Write,
) -> Result<()> {
    ticker.sync(timer, Instant::now());
    write!(out, "\r{}  ", format_remaining(timer.remaining_secs()))?;
    out.flush()?;
    while ticker.is_armed() {
        let wait = ticker.time_until_due(Instant::now()).unwrap_or_default();
        thread::sleep(wait);
        if ticker.fire(timer, Instant::now()) {
            debug!(remaining = timer.remaining_secs(), "tick");
            write!(out, "\r{}  ", format_remaining(timer.remaining_secs()))?;
            out.flush()?;
        }
    }
    Ok(())
}

fn load_current_config(explicit: Option<PathBuf>) -> Result<(Config, ConfigLocation)> {
    let cwd = env::current_dir()?;
    let location = locate_config(&cwd, explicit)?;
    let config = load_config(&location)?;
    Ok((config, location))
}
