use crate::model::Building;

/// Where the building list is in its one-shot load.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DirectoryStatus {
    #[default]
    Loading,
    Ready,
    Failed(String),
}

/// The selectable buildings, fetched once at startup and stored as served.
#[derive(Debug, Clone, Default)]
pub struct BuildingDirectory {
    buildings: Vec<Building>,
    status: DirectoryStatus,
}

impl BuildingDirectory {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    /// A directory that is already populated.
    #[cfg(test)]
    pub fn ready(buildings: Vec<Building>) -> Self {
        Self {
            buildings,
            status: DirectoryStatus::Ready,
        }
    }

    /// Empty until the fetch resolves.
    pub fn list_buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn status(&self) -> &DirectoryStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == DirectoryStatus::Loading
    }

    /// Store the fetched list as-is. Server order is preserved.
    pub fn loaded(&mut self, buildings: Vec<Building>) {
        tracing::info!(count = buildings.len(), "building directory loaded");
        self.buildings = buildings;
        self.status = DirectoryStatus::Ready;
    }

    pub fn failed(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(%message, "building directory failed to load");
        self.status = DirectoryStatus::Failed(message);
    }

    /// Back to `Loading` before a retry. Previously loaded buildings are kept.
    pub fn reloading(&mut self) {
        self.status = DirectoryStatus::Loading;
    }

    /// Dropdown entries: `(value, label)` = `(shortName, longName)`, one per building.
    pub fn options(&self) -> impl Iterator<Item = (&str, &str)> {
        self.buildings
            .iter()
            .map(|b| (b.short_name.as_str(), b.long_name.as_str()))
    }

    pub fn find(&self, short_name: &str) -> Option<&Building> {
        self.buildings.iter().find(|b| b.short_name == short_name)
    }

    pub fn contains(&self, short_name: &str) -> bool {
        self.find(short_name).is_some()
    }

    /// Display label for a selection value, falling back to the value itself.
    pub fn label_for<'a>(&'a self, short_name: &'a str) -> &'a str {
        self.find(short_name)
            .map(|b| b.long_name.as_str())
            .unwrap_or(short_name)
    }
}
