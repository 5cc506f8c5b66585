use anyhow::Context;
use colored::Colorize;

use crate::api::{CampusApi, HttpApi};
use crate::config::Settings;
use crate::model::Building;

pub fn run(settings: &Settings) -> anyhow::Result<()> {
    let api = HttpApi::new(&settings.server, settings.timeout)?;
    let buildings = api
        .buildings()
        .with_context(|| format!("Failed to fetch buildings from {}", settings.server))?;

    if buildings.is_empty() {
        println!("{}", "No buildings.".dimmed());
        return Ok(());
    }
    println!("{}", "Buildings:".bold());
    for building in &buildings {
        println!("{}", format_building(building));
    }
    Ok(())
}

fn format_building(building: &Building) -> String {
    format!(
        "\t{}: {}",
        building.short_name.cyan().bold(),
        building.long_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_building() {
        colored::control::set_override(false);
        let line = format_building(&Building::new("BAG", "Bagley Hall (East Entrance)"));
        assert_eq!(line, "\tBAG: Bagley Hall (East Entrance)");
    }
}
