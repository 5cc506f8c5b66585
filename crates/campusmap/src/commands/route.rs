use std::fmt;

use anyhow::{Context, bail};
use colored::Colorize;

use crate::api::{CampusApi, HttpApi};
use crate::config::Settings;
use crate::directory::DirectoryStatus;
use crate::fetch::FetchEvent;
use crate::form::RouteOverlayForm;
use crate::model::Building;

pub fn run(
    settings: &Settings,
    start: Option<String>,
    end: Option<String>,
    quiet: bool,
) -> anyhow::Result<()> {
    let api = HttpApi::new(&settings.server, settings.timeout)?;
    let form = plan(&api, start, end)?;

    let Some(itinerary) = form.itinerary() else {
        if !quiet {
            println!("{}", "The server returned an empty route.".yellow());
        }
        return Ok(());
    };

    let mut lines = itinerary.lines().into_iter();
    if let Some(title) = lines.next() {
        println!("{}", title.bold());
    }
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

/// Load buildings, fill in missing endpoints interactively and fetch the route.
///
/// Runs the same form the map window uses, synchronously.
pub fn plan(
    api: &dyn CampusApi,
    start: Option<String>,
    end: Option<String>,
) -> anyhow::Result<RouteOverlayForm> {
    let mut form = RouteOverlayForm::new();
    form.apply(FetchEvent::Buildings(api.buildings()));
    if let DirectoryStatus::Failed(message) = form.directory().status() {
        bail!("Could not load buildings: {message}");
    }

    let start = match start {
        Some(start) => start,
        None => prompt(form.list_buildings(), "Starting building:")?,
    };
    let end = match end {
        Some(end) => end,
        None => prompt(form.list_buildings(), "Destination building:")?,
    };
    form.set_start(start);
    form.set_end(end);

    let Some((id, query)) = form.submit() else {
        bail!(
            "{}",
            form.state().notice.as_deref().unwrap_or("Route was rejected")
        );
    };
    let result = api.route(&query);
    form.apply(FetchEvent::Route { id, result });
    if let Some(notice) = &form.state().notice {
        bail!("{notice}");
    }
    Ok(form)
}

struct Choice<'a>(&'a Building);

impl fmt::Display for Choice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0.long_name, self.0.short_name)
    }
}

fn prompt(buildings: &[Building], message: &str) -> anyhow::Result<String> {
    if buildings.is_empty() {
        bail!("The server has no buildings to choose from");
    }
    let choices: Vec<Choice<'_>> = buildings.iter().map(Choice).collect();
    let choice = inquire::Select::new(message, choices)
        .with_page_size(15)
        .prompt()
        .context("No building selected")?;
    Ok(choice.0.short_name.clone())
}
