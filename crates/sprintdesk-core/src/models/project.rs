use serde::{Deserialize, Serialize};

use crate::utils::ellipsize;

/// Maximum description length shown in project list cards
pub const DESCRIPTION_PREVIEW_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub tag: Option<Tag>,
}

impl Project {
    pub fn tag_name(&self) -> &str {
        self.tag.as_ref().map(|t| t.name.as_str()).unwrap_or("untagged")
    }

    /// Description cut to the list preview length, with an ellipsis when cut.
    pub fn description_preview(&self) -> String {
        ellipsize(&self.description, DESCRIPTION_PREVIEW_LEN)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    #[default]
    Pending,
    Accepted,
}

/// A project the current user belongs to without owning it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMembership {
    pub project: Project,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub status: MembershipStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub status: MembershipStatus,
}

/// Plain acknowledgement body returned by mutating endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}
