//! User-facing captions for the two trees and the per-category source
//! buttons.

use serde::Serialize;

use crate::selection::Category;
use crate::types::{Origin, TreeSnapshot};

/// Width for tree headings.
pub const HEADING_WIDTH: usize = 40;
/// Width for source-button captions.
pub const BUTTON_WIDTH: usize = 20;

const ELLIPSIS: &str = "...";

/// Truncate `text` to `max_chars` characters, keeping the file extension.
///
/// Counts characters, not bytes. When the width cannot fit the ellipsis and
/// extension, the prefix shrinks to nothing rather than failing.
///
/// # Examples
///
/// ```
/// use linkmerge::v1::labels::shorten_label;
///
/// assert_eq!(shorten_label("arm.csv", 20), "arm.csv");
/// assert_eq!(
///     shorten_label("C:/robots/six_axis_arm_v2.csv", 20),
///     "C:/robots/six....csv",
/// );
/// ```
pub fn shorten_label(text: &str, max_chars: usize) -> String {
    let len = text.chars().count();
    if len <= max_chars {
        return text.to_string();
    }
    let extension = extension(text);
    let keep = max_chars
        .saturating_sub(ELLIPSIS.len())
        .saturating_sub(extension.chars().count());
    let prefix: String = text.chars().take(keep).collect();
    format!("{prefix}{ELLIPSIS}{extension}")
}

/// `.ext` of the last path component, or empty.
fn extension(text: &str) -> &str {
    let file = text.rsplit(['/', '\\']).next().unwrap_or(text);
    match file.rfind('.') {
        Some(0) | None => "",
        Some(dot) => &file[dot..],
    }
}

/// Heading prefix for each tree.
pub fn tree_heading(origin: Origin) -> &'static str {
    match origin {
        Origin::Existing => "Configuration from Assembly: ",
        Origin::Loaded => "Configuration from CSV: ",
    }
}

/// What a property group covers, as shown in tooltips.
pub fn category_description(category: Category) -> &'static str {
    match category {
        Category::MassInertia => "Mass and Inertia properties",
        Category::Visual => "Mesh and Material properties",
        Category::JointKinematics => "Joint Kinematic properties",
        Category::OtherJoint => "Limits, Dynamics, Calibration and Safety Controller values",
    }
}

/// Tooltip for the button that picks `source_label` for `category`.
pub fn source_tooltip(category: Category, source_label: &str) -> String {
    format!(
        "Use {} loaded from: {}",
        category_description(category),
        source_label
    )
}

/// A short caption plus the untruncated text for hovering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Caption {
    pub text: String,
    pub tooltip: String,
}

/// One row of source buttons: a category with a button per origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceRow {
    pub category: Category,
    pub existing: Caption,
    pub loaded: Caption,
}

/// Every caption the merge dialog shows, derived from the snapshots'
/// source labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionLabels {
    pub existing_heading: Caption,
    pub loaded_heading: Caption,
    pub sources: Vec<SourceRow>,
}

impl SessionLabels {
    pub fn for_snapshots(existing: &TreeSnapshot, loaded: &TreeSnapshot) -> Self {
        let heading = |snap: &TreeSnapshot| {
            let prefix = tree_heading(snap.origin());
            Caption {
                text: format!("{prefix}{}", shorten_label(snap.source_label(), HEADING_WIDTH)),
                tooltip: format!("{prefix}{}", snap.source_label()),
            }
        };
        let button = |category: Category, snap: &TreeSnapshot| Caption {
            text: shorten_label(snap.source_label(), BUTTON_WIDTH),
            tooltip: source_tooltip(category, snap.source_label()),
        };

        Self {
            existing_heading: heading(existing),
            loaded_heading: heading(loaded),
            sources: Category::ALL
                .into_iter()
                .map(|category| SourceRow {
                    category,
                    existing: button(category, existing),
                    loaded: button(category, loaded),
                })
                .collect(),
        }
    }
}
