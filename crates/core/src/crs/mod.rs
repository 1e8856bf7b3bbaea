//! Coordinate reference system metadata

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate reference system, identified by EPSG code and/or WKT
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CRS {
    wkt: Option<String>,
    epsg: Option<u32>,
}

impl CRS {
    pub fn from_epsg(code: u32) -> Self {
        Self { wkt: None, epsg: Some(code) }
    }

    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self { wkt: Some(wkt.into()), epsg: None }
    }

    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    pub fn wkt(&self) -> Option<&str> {
        self.wkt.as_deref()
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.epsg, &self.wkt) {
            (Some(code), _) => write!(f, "EPSG:{}", code),
            (None, Some(wkt)) => write!(f, "WKT:{}", wkt.chars().take(50).collect::<String>()),
            (None, None) => write!(f, "Unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(CRS::from_epsg(32630).to_string(), "EPSG:32630");
        assert!(CRS::from_wkt("PROJCS[\"UTM\"]").to_string().starts_with("WKT:"));
    }
}
