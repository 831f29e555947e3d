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
use crate::error::Hint;
use std::str::FromStr;

/// A top-level generic/parameter override captured from the command line.
///
/// The value is an opaque string; no type coercion happens on this side of
/// the vendor tool.
#[derive(Debug, PartialEq, Clone)]
pub struct Generic {
    key: String,
    value: String,
}

impl Generic {
    pub fn get_key(&self) -> &str {
        &self.key
    }

    pub fn get_value(&self) -> &str {
        &self.value
    }

    /// Formats the override for ghdl and modelsim-style simulators.
    pub fn to_simulator_flag(&self) -> String {
        format!("-g{}", self)
    }

    /// Formats the override as a verilator parameter definition.
    pub fn to_parameter_flag(&self) -> String {
        format!("-G{}", self)
    }

    /// Formats the override for the xsim elaboration step.
    pub fn to_elab_args(&self) -> [String; 2] {
        [String::from("-generic_top"), self.to_string()]
    }
}

impl FromStr for Generic {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // split on the first equal sign
        match s.split_once('=') {
            Some((key, value)) => Ok(Self {
                key: key.to_string(),
                value: value.to_string(),
            }),
            None => Err(Error::GenericMissingValue(
                s.to_string(),
                Hint::GenericSyntax,
            )),
        }
    }
}

impl std::fmt::Display for Generic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_splits_on_first_equal() {
        let g = Generic::from_str("WIDTH=8").unwrap();
        assert_eq!(g.get_key(), "WIDTH");
        assert_eq!(g.get_value(), "8");

        // values may themselves contain the delimiter
        let g = Generic::from_str("EXPR=a=b").unwrap();
        assert_eq!(g.get_key(), "EXPR");
        assert_eq!(g.get_value(), "a=b");

        // empty values are allowed and passed through untouched
        let g = Generic::from_str("EN_FAST=").unwrap();
        assert_eq!(g.get_value(), "");
    }

    #[test]
    fn parse_requires_equal_sign() {
        assert_eq!(
            Generic::from_str("WIDTH"),
            Err(Error::GenericMissingValue(
                String::from("WIDTH"),
                Hint::GenericSyntax
            ))
        );
    }

    #[test]
    fn round_trip_is_identity() {
        let token = "WIDTH=8";
        assert_eq!(Generic::from_str(token).unwrap().to_string(), token);
    }

    #[test]
    fn vendor_serializations() {
        let g = Generic::from_str("WIDTH=8").unwrap();
        assert_eq!(g.to_simulator_flag(), "-gWIDTH=8");
        assert_eq!(g.to_parameter_flag(), "-GWIDTH=8");
        assert_eq!(g.to_elab_args(), ["-generic_top", "WIDTH=8"]);
    }
}
