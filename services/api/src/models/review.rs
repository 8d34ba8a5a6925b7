//! Review model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Housing situation of the reviewer during the job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Housing {
    NotHoused,
    Housed,
}

impl Housing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Housing::NotHoused => "not_housed",
            Housing::Housed => "housed",
        }
    }
}

impl FromStr for Housing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_housed" => Ok(Housing::NotHoused),
            "housed" => Ok(Housing::Housed),
            other => Err(format!("unknown housing value: {other}")),
        }
    }
}

impl fmt::Display for Housing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quality of the housing provided with the job, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HousingQuality {
    Top,
    Ok,
    Average,
    Bad,
    Squalid,
}

impl HousingQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            HousingQuality::Top => "top",
            HousingQuality::Ok => "ok",
            HousingQuality::Average => "average",
            HousingQuality::Bad => "bad",
            HousingQuality::Squalid => "squalid",
        }
    }
}

impl FromStr for HousingQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => Ok(HousingQuality::Top),
            "ok" => Ok(HousingQuality::Ok),
            "average" => Ok(HousingQuality::Average),
            "bad" => Ok(HousingQuality::Bad),
            "squalid" => Ok(HousingQuality::Squalid),
            other => Err(format!("unknown housing quality value: {other}")),
        }
    }
}

impl fmt::Display for HousingQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review entity
///
/// At most one review exists per (establishment, user) pair; a second
/// submission replaces the mutable fields in place, keeping `id` and
/// `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub establishment_id: Uuid,
    pub user_id: Uuid,
    pub score: Option<f64>,
    pub comment: String,
    pub role: Option<String>,
    pub contract: Option<String>,
    pub housing: Option<Housing>,
    pub housing_quality: Option<HousingQuality>,
    pub split_shift: bool,
    pub unpaid_overtime: bool,
    pub toxic_manager: bool,
    pub harassment: bool,
    pub recommend: bool,
    pub created_at: DateTime<Utc>,
}

/// Mutable review fields, as accepted on submission
#[derive(Debug, Clone, Default)]
pub struct ReviewFields {
    pub score: Option<f64>,
    pub comment: String,
    pub role: Option<String>,
    pub contract: Option<String>,
    pub housing: Option<Housing>,
    pub housing_quality: Option<HousingQuality>,
    pub split_shift: bool,
    pub unpaid_overtime: bool,
    pub toxic_manager: bool,
    pub harassment: bool,
    pub recommend: bool,
}

/// Review joined with its author's display pseudo
#[derive(Debug, Clone, Serialize)]
pub struct ReviewWithAuthor {
    #[serde(flatten)]
    pub review: Review,
    pub author_pseudo: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_housing_rejects_unknown_value() {
        assert!("hotel_room".parse::<Housing>().is_err());
        assert!(serde_json::from_str::<Housing>("\"hotel_room\"").is_err());
    }

    #[test]
    fn test_housing_snake_case_serde() {
        let parsed: Housing = serde_json::from_str("\"not_housed\"").unwrap();
        assert_eq!(parsed, Housing::NotHoused);
        assert_eq!(parsed.as_str(), "not_housed");
    }

    #[test]
    fn test_housing_quality_parse_matches_as_str() {
        for quality in [
            HousingQuality::Top,
            HousingQuality::Ok,
            HousingQuality::Average,
            HousingQuality::Bad,
            HousingQuality::Squalid,
        ] {
            assert_eq!(quality.as_str().parse::<HousingQuality>(), Ok(quality));
        }
    }
}
