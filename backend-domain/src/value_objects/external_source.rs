// External price source value object

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalSource {
    Scryfall,
    Tcgplayer,
    Cardmarket,
}

impl ExternalSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExternalSource::Scryfall => "scryfall",
            ExternalSource::Tcgplayer => "tcgplayer",
            ExternalSource::Cardmarket => "cardmarket",
        }
    }
}

impl FromStr for ExternalSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "scryfall" => Ok(ExternalSource::Scryfall),
            "tcgplayer" => Ok(ExternalSource::Tcgplayer),
            "cardmarket" => Ok(ExternalSource::Cardmarket),
            other => Err(format!("unknown external_source '{}'", other)),
        }
    }
}

impl fmt::Display for ExternalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
