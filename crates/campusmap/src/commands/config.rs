use std::path::Path;

use colored::Colorize;

use crate::cli::ConfigCommands;
use crate::config::{Config, Settings};

pub fn run(command: ConfigCommands) -> anyhow::Result<()> {
    match command {
        ConfigCommands::Show => show(),
        ConfigCommands::Set { key, value } => set(&key, &value),
    }
}

fn show() -> anyhow::Result<()> {
    let path = Config::path()?;
    let config = Config::load_or_empty(&path)?;

    if path.exists() {
        println!("{} {}", "Config file:".bold(), path.display());
        let yaml = serde_yaml::to_string(&config)?;
        println!("{}", yaml.trim_end());
    } else {
        println!(
            "{} {} {}",
            "Config file:".bold(),
            path.display(),
            "(not created yet)".dimmed()
        );
    }

    println!();
    println!("{}", "Effective settings:".bold());
    for line in settings_lines(&Settings::resolve(&config, None, None)) {
        println!("  {line}");
    }
    Ok(())
}

fn set(key: &str, value: &str) -> anyhow::Result<()> {
    let path = Config::path()?;
    set_at(&path, key, value)?;
    println!(
        "{} {key} = {value} ({})",
        "Saved".green().bold(),
        path.display()
    );
    Ok(())
}

/// Refuses to touch a file it cannot parse, so no keys are lost.
fn set_at(path: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    let mut config = Config::load_or_empty(path)?;
    config.set(key, value)?;
    config.save_to(path)
}

fn settings_lines(settings: &Settings) -> Vec<String> {
    let map = settings
        .map_image
        .as_ref()
        .map_or_else(|| "(none, blank canvas)".to_string(), |p| p.display().to_string());
    vec![
        format!("server.url: {}", settings.server),
        format!("server.timeout_secs: {}", settings.timeout.as_secs()),
        format!("map.image: {map}"),
        format!("map.size: {}x{}", settings.map_size[0], settings.map_size[1]),
        format!("defaults.theme: {}", settings.theme),
    ]
}
