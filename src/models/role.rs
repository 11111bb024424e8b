use serde::{Deserialize, Serialize};

/// Departmental role of the acting officer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Sdao,
    Dc,
    Dfo,
    Dlc,
    Llmc,
    Sdc,
    Cabinet,
    Lrd,
    Admin,
}

impl Role {
    pub const ALL: [Role; 9] = [
        Role::Sdao,
        Role::Dc,
        Role::Dfo,
        Role::Dlc,
        Role::Llmc,
        Role::Sdc,
        Role::Cabinet,
        Role::Lrd,
        Role::Admin,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Role::Sdao => "SDAO",
            Role::Dc => "DC",
            Role::Dfo => "DFO",
            Role::Dlc => "DLC",
            Role::Llmc => "LLMC",
            Role::Sdc => "SDC",
            Role::Cabinet => "CABINET",
            Role::Lrd => "LRD",
            Role::Admin => "ADMIN",
        }
    }

    /// Case-insensitive parse of a role code as stored in the session.
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|r| r.code().eq_ignore_ascii_case(code))
    }
}
