//! Named port presets

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortPreset {
    Common,
    Web,
    Ftp,
    Mail,
    Database,
    Remote,
    AllCommon,
}

impl PortPreset {
    pub const ALL: [PortPreset; 7] = [
        PortPreset::Common,
        PortPreset::Web,
        PortPreset::Ftp,
        PortPreset::Mail,
        PortPreset::Database,
        PortPreset::Remote,
        PortPreset::AllCommon,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PortPreset::Common => "Common",
            PortPreset::Web => "Web",
            PortPreset::Ftp => "FTP",
            PortPreset::Mail => "Mail",
            PortPreset::Database => "Database",
            PortPreset::Remote => "Remote",
            PortPreset::AllCommon => "All Common (1-1024)",
        }
    }

    /// Ports in emission order
    pub fn ports(&self) -> Vec<u32> {
        match self {
            PortPreset::Common => vec![21, 22, 23, 25, 53, 80, 110, 143, 443, 993, 995],
            PortPreset::Web => vec![80, 443, 8080, 8443, 8000, 3000, 5000],
            PortPreset::Ftp => vec![20, 21, 989, 990],
            PortPreset::Mail => vec![25, 110, 143, 465, 587, 993, 995],
            PortPreset::Database => vec![1433, 1521, 3306, 5432, 6379, 27017],
            PortPreset::Remote => vec![22, 23, 3389, 5900, 5901],
            PortPreset::AllCommon => (1..=1024).collect(),
        }
    }
}

impl fmt::Display for PortPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PortPreset {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase();
        match key.as_str() {
            "common" => Ok(PortPreset::Common),
            "web" => Ok(PortPreset::Web),
            "ftp" => Ok(PortPreset::Ftp),
            "mail" => Ok(PortPreset::Mail),
            "database" | "db" => Ok(PortPreset::Database),
            "remote" => Ok(PortPreset::Remote),
            "all" | "all common" | "all-common" | "all common (1-1024)" => {
                Ok(PortPreset::AllCommon)
            }
            _ => Err(AppError::validation(format!(
                "Unknown port preset '{}'. Available: {}",
                s,
                PortPreset::ALL.iter().map(|p| p.name()).collect::<Vec<_>>().join(", ")
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_preset_is_exact() {
        assert_eq!(
            PortPreset::Common.ports(),
            vec![21, 22, 23, 25, 53, 80, 110, 143, 443, 993, 995]
        );
    }

    #[test]
    fn test_presets_are_stable() {
        assert_eq!(PortPreset::Web.ports(), vec![80, 443, 8080, 8443, 8000, 3000, 5000]);
        assert_eq!(PortPreset::Ftp.ports(), vec![20, 21, 989, 990]);
        assert_eq!(PortPreset::Mail.ports(), vec![25, 110, 143, 465, 587, 993, 995]);
        assert_eq!(PortPreset::Database.ports(), vec![1433, 1521, 3306, 5432, 6379, 27017]);
        assert_eq!(PortPreset::Remote.ports(), vec![22, 23, 3389, 5900, 5901]);

        let all = PortPreset::AllCommon.ports();
        assert_eq!(all.len(), 1024);
        assert_eq!(all.first(), Some(&1));
        assert_eq!(all.last(), Some(&1024));
    }

    #[test]
    fn test_names_resolve_case_insensitively() {
        assert_eq!("WEB".parse::<PortPreset>().unwrap(), PortPreset::Web);
        assert_eq!("ftp".parse::<PortPreset>().unwrap(), PortPreset::Ftp);
        assert_eq!("All Common".parse::<PortPreset>().unwrap(), PortPreset::AllCommon);
        assert_eq!("all".parse::<PortPreset>().unwrap(), PortPreset::AllCommon);
        assert!("games".parse::<PortPreset>().is_err());
    }
}
