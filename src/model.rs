// src/model.rs
//
// Small value types shared by the ledger, the tables and the retry pass.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Division {
    D1,
    D2,
    D3,
}

impl Division {
    pub const ALL: [Division; 3] = [Division::D1, Division::D2, Division::D3];

    pub fn as_str(&self) -> &'static str {
        match self { Division::D1 => "d1", Division::D2 => "d2", Division::D3 => "d3" }
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Division {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "d1" => Ok(Division::D1),
            "d2" => Ok(Division::D2),
            "d3" => Ok(Division::D3),
            other => Err(format!("Unknown division: {other} (expected d1, d2 or d3)")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Men,
    Women,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Men, Gender::Women];

    pub fn as_str(&self) -> &'static str {
        match self { Gender::Men => "men", Gender::Women => "women" }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "men" => Ok(Gender::Men),
            "women" => Ok(Gender::Women),
            other => Err(format!("Unknown gender: {other} (expected men or women)")),
        }
    }
}

/// One results table's coordinates: a game date plus division and gender.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Slot {
    pub date: NaiveDate,
    pub division: Division,
    pub gender: Gender,
}

impl Slot {
    pub fn new(date: NaiveDate, division: Division, gender: Gender) -> Self {
        Self { date, division, gender }
    }

    /// Same date and gender, other division.
    pub fn with_division(&self, division: Division) -> Self {
        Self { division, ..*self }
    }

    /// Every (division, gender) slot for a date, d1..d3 × men..women.
    pub fn all_for(date: NaiveDate) -> Vec<Slot> {
        let mut out = Vec::with_capacity(Division::ALL.len() * Gender::ALL.len());
        for division in Division::ALL {
            for gender in Gender::ALL {
                out.push(Slot::new(date, division, gender));
            }
        }
        out
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.division, self.gender, date_key(self.date))
    }
}

/// Ledger key for a date: ISO 8601 (`2025-01-12`).
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Accepts both `YYYY-MM-DD` and the scraper's `YYYY/MM/DD`.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y/%m/%d"))
        .map_err(|_| format!("Invalid date: {s} (expected YYYY/MM/DD or YYYY-MM-DD)"))
}
