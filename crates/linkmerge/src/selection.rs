use serde::{Deserialize, Serialize};
use std::fmt;

use crate::observe::{Notifier, SubscriptionId};
use crate::types::Origin;

/// A property group whose data source is chosen as a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Mass and inertia tensor.
    MassInertia,
    /// Meshes and materials.
    Visual,
    /// Joint origin, axis and type.
    JointKinematics,
    /// Limits, dynamics, calibration and safety controller values.
    OtherJoint,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::MassInertia,
        Category::Visual,
        Category::JointKinematics,
        Category::OtherJoint,
    ];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::MassInertia => "mass_inertia",
            Category::Visual => "visual",
            Category::JointKinematics => "joint_kinematics",
            Category::OtherJoint => "other_joint",
        };
        f.write_str(s)
    }
}

/// The active origin for every category.
///
/// One field per category, so "no source" or "two sources" for a category
/// cannot be represented.
///
/// # JSON shape
///
/// ```json
/// {
///   "mass_inertia": "loaded",
///   "visual": "existing",
///   "joint_kinematics": "existing",
///   "other_joint": "existing"
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceMap {
    pub mass_inertia: Origin,
    pub visual: Origin,
    pub joint_kinematics: Origin,
    pub other_joint: Origin,
}

impl Default for SourceMap {
    fn default() -> Self {
        Self::uniform(Origin::Existing)
    }
}

impl SourceMap {
    /// Every category set to `origin`.
    pub fn uniform(origin: Origin) -> Self {
        Self {
            mass_inertia: origin,
            visual: origin,
            joint_kinematics: origin,
            other_joint: origin,
        }
    }

    pub fn get(&self, category: Category) -> Origin {
        match category {
            Category::MassInertia => self.mass_inertia,
            Category::Visual => self.visual,
            Category::JointKinematics => self.joint_kinematics,
            Category::OtherJoint => self.other_joint,
        }
    }

    fn slot(&mut self, category: Category) -> &mut Origin {
        match category {
            Category::MassInertia => &mut self.mass_inertia,
            Category::Visual => &mut self.visual,
            Category::JointKinematics => &mut self.joint_kinematics,
            Category::OtherJoint => &mut self.other_joint,
        }
    }

    /// Overwrite one category and return its previous origin.
    pub fn set(&mut self, category: Category, origin: Origin) -> Origin {
        std::mem::replace(self.slot(category), origin)
    }

    /// `(category, origin)` pairs in [`Category::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, Origin)> + '_ {
        Category::ALL.into_iter().map(|c| (c, self.get(c)))
    }
}

/// Emitted after every `select`, even when the origin did not change, so a
/// view can redraw its indicator from the event alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionChanged {
    pub category: Category,
    pub previous: Origin,
    pub current: Origin,
}

/// Per-category source choice with change notification.
///
/// Starts with every category on [`Origin::Existing`].
///
/// # Examples
///
/// ```
/// use linkmerge::v1::{Category, Origin, PropertySourceSelection};
///
/// let mut sel = PropertySourceSelection::new();
/// sel.select(Category::MassInertia, Origin::Loaded);
/// assert!(sel.is_active(Category::MassInertia, Origin::Loaded));
/// assert!(!sel.is_active(Category::MassInertia, Origin::Existing));
/// assert_eq!(sel.get(Category::Visual), Origin::Existing);
/// ```
#[derive(Debug, Default)]
pub struct PropertySourceSelection {
    sources: SourceMap,
    observers: Notifier<SelectionChanged>,
}

impl PropertySourceSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `origin` the only active source for `category`. Returns the
    /// origin that was active before.
    pub fn select(&mut self, category: Category, origin: Origin) -> Origin {
        let previous = self.sources.set(category, origin);
        tracing::debug!(%category, %previous, current = %origin, "property source selected");
        self.observers.notify(&SelectionChanged {
            category,
            previous,
            current: origin,
        });
        previous
    }

    pub fn get(&self, category: Category) -> Origin {
        self.sources.get(category)
    }

    pub fn is_active(&self, category: Category, origin: Origin) -> bool {
        self.sources.get(category) == origin
    }

    /// Copy of the current choices.
    pub fn snapshot(&self) -> SourceMap {
        self.sources
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&SelectionChanged) + 'static) -> SubscriptionId {
        self.observers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }
}
