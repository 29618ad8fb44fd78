//! Single-choice menus for the existing tree's reference geometry.

use serde::{Deserialize, Serialize};

use crate::error::{MergeError, Result};

/// An ordered list of labels with at most one checked entry.
///
/// The first entry starts checked. An empty menu has nothing checked and
/// rejects every `check`.
///
/// # Examples
///
/// ```
/// use linkmerge::v1::ChoiceMenu;
///
/// let mut menu = ChoiceMenu::new(["Origin_global", "Origin_shoulder"]);
/// assert_eq!(menu.checked(), Some("Origin_global"));
/// menu.check("Origin_shoulder").unwrap();
/// assert_eq!(menu.checked(), Some("Origin_shoulder"));
/// assert!(menu.check("Origin_elbow").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceMenu {
    items: Vec<String>,
    checked: Option<usize>,
}

impl ChoiceMenu {
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items: Vec<String> = items.into_iter().map(Into::into).collect();
        let checked = if items.is_empty() { None } else { Some(0) };
        Self { items, checked }
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// The checked label. A deserialized index that points past the items
    /// counts as nothing checked.
    pub fn checked(&self) -> Option<&str> {
        self.checked
            .and_then(|i| self.items.get(i))
            .map(String::as_str)
    }

    pub fn is_checked(&self, label: &str) -> bool {
        self.checked() == Some(label)
    }

    /// Check `label` and uncheck everything else.
    pub fn check(&mut self, label: &str) -> Result<()> {
        let index = self
            .items
            .iter()
            .position(|item| item == label)
            .ok_or_else(|| MergeError::UnknownChoice {
                label: label.to_string(),
            })?;
        self.checked = Some(index);
        Ok(())
    }
}

/// Which reference-geometry menu an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceMenu {
    CoordinateSystem,
    Axis,
}

/// Coordinate-system and reference-axis menus offered for the existing tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceMenus {
    pub coordinate_systems: ChoiceMenu,
    pub axes: ChoiceMenu,
}

impl ReferenceMenus {
    pub fn new<I, J, S, T>(coordinate_systems: I, axes: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            coordinate_systems: ChoiceMenu::new(coordinate_systems),
            axes: ChoiceMenu::new(axes),
        }
    }

    pub fn menu_mut(&mut self, which: ReferenceMenu) -> &mut ChoiceMenu {
        match which {
            ReferenceMenu::CoordinateSystem => &mut self.coordinate_systems,
            ReferenceMenu::Axis => &mut self.axes,
        }
    }

    /// The currently checked entries.
    pub fn selection(&self) -> ReferenceGeometry {
        ReferenceGeometry {
            coordinate_system: self.coordinate_systems.checked().map(str::to_string),
            axis: self.axes.checked().map(str::to_string),
        }
    }
}

/// Checked reference geometry, as handed to the export step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceGeometry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinate_system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis: Option<String>,
}
