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
use crate::util::environment;
use std::path::Path;
use std::str::FromStr;

/// The role a blueprint rule plays in a build.
///
/// Tags other than the built-in HDL tags carry their text verbatim; no
/// normalization is performed and unrecognized tags are left for each target
/// to ignore.
#[derive(Debug, PartialEq, Clone)]
pub enum Fileset {
    Vhdl,
    Verilog,
    SystemVerilog,
    Auxiliary(String),
}

impl Fileset {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "VHDL" => Self::Vhdl,
            "VLOG" => Self::Verilog,
            "SYSV" => Self::SystemVerilog,
            _ => Self::Auxiliary(tag.to_string()),
        }
    }

    /// Checks if the fileset is one of the three built-in HDL filesets.
    pub fn is_builtin(&self) -> bool {
        match self {
            Self::Vhdl | Self::Verilog | Self::SystemVerilog => true,
            Self::Auxiliary(_) => false,
        }
    }
}

/// A single rule read from the blueprint file.
///
/// The order of rules within the blueprint is the compile order; a unit must
/// be compiled before anything that depends on it.
#[derive(Debug, PartialEq, Clone)]
pub struct Rule {
    fileset: Fileset,
    library: String,
    path: String,
}

impl Rule {
    /// Decodes a rule from a tab-separated blueprint line.
    ///
    /// Tabs beyond the second are folded into the path field.
    fn from_line(line: &str, lineno: usize) -> Result<Self, Error> {
        let mut fields = line.splitn(3, '\t');
        match (fields.next(), fields.next(), fields.next()) {
            (Some(fileset), Some(library), Some(path)) => Ok(Self {
                fileset: Fileset::from_tag(fileset),
                library: library.to_string(),
                path: path.to_string(),
            }),
            _ => Err(Error::BlueprintBadRule(lineno)),
        }
    }

    pub fn get_fileset(&self) -> &Fileset {
        &self.fileset
    }

    pub fn get_library(&self) -> &str {
        &self.library
    }

    pub fn get_path(&self) -> &str {
        &self.path
    }

    pub fn is_vhdl(&self) -> bool {
        self.fileset == Fileset::Vhdl
    }

    pub fn is_vlog(&self) -> bool {
        self.fileset == Fileset::Verilog
    }

    pub fn is_sysv(&self) -> bool {
        self.fileset == Fileset::SystemVerilog
    }

    pub fn is_builtin(&self) -> bool {
        self.fileset.is_builtin()
    }

    /// Checks if the rule belongs to the auxiliary fileset named `tag`.
    pub fn is_aux(&self, tag: &str) -> bool {
        match &self.fileset {
            Fileset::Auxiliary(t) => t == tag,
            _ => false,
        }
    }
}

/// The build manifest generated by orbit before a target runs.
///
/// Parsing is eager so that a malformed file is caught before any vendor
/// tool is spawned; iteration is restartable and preserves file order.
#[derive(Debug, PartialEq)]
pub struct Blueprint {
    rules: Vec<Rule>,
}

impl Blueprint {
    /// Loads the blueprint from the file listed in the `ORBIT_BLUEPRINT`
    /// environment variable.
    pub fn from_env() -> Result<Self, Fault> {
        let path = environment::require(environment::ORBIT_BLUEPRINT)?;
        Self::load(&path)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Fault> {
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::from_str(&contents)?)
    }

    pub fn rules(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn into_rules(self) -> Vec<Rule> {
        self.rules
    }
}

impl FromStr for Blueprint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut rules = Vec::new();
        for (i, line) in s.lines().enumerate() {
            rules.push(Rule::from_line(line.trim_end_matches('\r'), i + 1)?);
        }
        Ok(Self { rules: rules })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    const BP_1: &str = "VHDL\twork\tfoo.vhd\nVHDL\twork\tbar.vhd\nSYSV\twork\tfoo_tb.sv\n";

    #[test]
    fn parse_preserves_order() {
        let bp = Blueprint::from_str(BP_1).unwrap();
        let paths: Vec<&str> = bp.rules().map(|r| r.get_path()).collect();
        assert_eq!(paths, ["foo.vhd", "bar.vhd", "foo_tb.sv"]);
    }

    #[test]
    fn parse_classifies_tags() {
        let bp = Blueprint::from_str("VLOG\twork\tcpu.v\nXDCF\tcpu\tpins.xdc\n").unwrap();
        let rules = bp.into_rules();
        assert_eq!(rules[0].get_fileset(), &Fileset::Verilog);
        assert_eq!(rules[1].get_fileset(), &Fileset::Auxiliary(String::from("XDCF")));
        assert_eq!(rules[1].is_aux("XDCF"), true);
        assert_eq!(rules[1].is_aux("BDF"), false);
        assert_eq!(rules[1].is_builtin(), false);
    }

    #[test]
    fn parse_rejects_short_rule() {
        // missing the path field on line 2
        let result = Blueprint::from_str("VHDL\twork\tfoo.vhd\nVHDL\twork\n");
        assert_eq!(result.unwrap_err(), Error::BlueprintBadRule(2));
    }

    #[test]
    fn extra_tabs_fold_into_path() {
        let bp = Blueprint::from_str("VHDL\twork\tdir\twith\ttabs.vhd\n").unwrap();
        assert_eq!(bp.rules().next().unwrap().get_path(), "dir\twith\ttabs.vhd");
    }

    #[test]
    fn duplicates_are_legal() {
        let bp = Blueprint::from_str("VHDL\twork\tfoo.vhd\nVHDL\twork\tfoo.vhd\n").unwrap();
        assert_eq!(bp.rules().count(), 2);
    }

    #[test]
    fn load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(BP_1.as_bytes()).unwrap();
        let bp = Blueprint::load(file.path()).unwrap();
        assert_eq!(bp.rules().count(), 3);
    }
}
