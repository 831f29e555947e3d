//
//  Copyright (C) 2022-2024  Chase Ruskin
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use crate::error::Error;
use crate::util::anyerror::Fault;
use serde_derive::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

/// A board configuration file describing the physical FPGA an ip targets.
///
/// The `[part]` table selects the device; the optional `[pins]` table maps
/// pin names to the design's port names for location constraints.
#[derive(Debug, PartialEq, Deserialize)]
pub struct Board {
    part: Part,
    pins: Option<BTreeMap<String, String>>,
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct Part {
    #[serde(rename = "FAMILY")]
    family: Option<String>,
    #[serde(rename = "DEVICE")]
    device: Option<String>,
}

impl Board {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Fault> {
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::from_str(&contents)?)
    }

    pub fn get_family(&self) -> Option<&String> {
        self.part.family.as_ref()
    }

    pub fn get_device(&self) -> Option<&String> {
        self.part.device.as_ref()
    }

    pub fn get_pins(&self) -> Option<&BTreeMap<String, String>> {
        self.pins.as_ref()
    }
}

impl FromStr for Board {
    type Err = toml::de::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s)
    }
}

/// Resolves the targeted FPGA part field, preferring the value taken from
/// the command line over the board file's entry.
pub fn resolve_part_field(
    cli: Option<String>,
    board: Option<&String>,
    key: &str,
) -> Result<String, Error> {
    match cli.or(board.map(|s| s.to_string())) {
        Some(value) => Ok(value),
        None => Err(Error::BoardMissingPartField(key.to_string())),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const B_1: &str = r#"
[part]
FAMILY = "Cyclone IV E"
DEVICE = "EP4CE6E22C8"

[pins]
PIN_23 = "clk"
PIN_88 = "led[0]"
"#;

    const B_2: &str = r#"
[part]
DEVICE = "EP4CE6E22C8"
"#;

    #[test]
    fn from_toml_string() {
        let board = Board::from_str(B_1).unwrap();
        assert_eq!(board.get_family(), Some(&String::from("Cyclone IV E")));
        assert_eq!(board.get_device(), Some(&String::from("EP4CE6E22C8")));
        assert_eq!(
            board.get_pins().unwrap().get("PIN_23"),
            Some(&String::from("clk"))
        );
    }

    #[test]
    fn missing_tables_are_partial() {
        let board = Board::from_str(B_2).unwrap();
        assert_eq!(board.get_family(), None);
        assert_eq!(board.get_pins(), None);
    }

    #[test]
    fn part_resolution_prefers_cli() {
        let board = Board::from_str(B_1).unwrap();
        // command-line value wins over the board file
        assert_eq!(
            resolve_part_field(Some(String::from("MAXII")), board.get_family(), "FAMILY").unwrap(),
            "MAXII"
        );
        // fall back to the board file
        assert_eq!(
            resolve_part_field(None, board.get_family(), "FAMILY").unwrap(),
            "Cyclone IV E"
        );
        // neither source present is fatal
        let board = Board::from_str(B_2).unwrap();
        assert_eq!(
            resolve_part_field(None, board.get_family(), "FAMILY"),
            Err(Error::BoardMissingPartField(String::from("FAMILY")))
        );
    }
}
