use serde::{Deserialize, Serialize};

/// Role a user can have in the certification workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Farmer,
    Certifier,
    Consumer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Farmer => "farmer",
            Role::Certifier => "certifier",
            Role::Consumer => "consumer",
        }
    }
}

/// An already-authenticated actor identity.
///
/// Callers pass this explicitly into every workflow call; there is no
/// ambient session state anywhere in the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub username: String,
    #[serde(rename = "userType")]
    pub role: Role,
}
