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

use crate::util::anyerror::Fault;
use std::path::Path;
use std::path::PathBuf;

pub const TCL_FILE: &str = "orbit.tcl";
pub const DO_FILE: &str = "orbit.do";

/// A token within a generated tcl statement.
#[derive(Debug, PartialEq)]
pub enum Tok {
    /// Wrapped in double quotes on emission.
    Quote(String),
    /// Emitted verbatim (tcl syntax characters, variable references).
    Esc(String),
}

impl Tok {
    pub fn quote<S: std::fmt::Display>(s: S) -> Self {
        Self::Quote(s.to_string())
    }

    pub fn esc<S: std::fmt::Display>(s: S) -> Self {
        Self::Esc(s.to_string())
    }
}

/// An in-memory control script for a vendor tool.
///
/// Lines accumulate with the current indentation; the buffer is written to
/// disk exactly once by [`Tcl::save`]. The emitted text is never validated
/// here; the vendor tool's own parser is the only checker.
#[derive(Debug, PartialEq)]
pub struct Tcl {
    path: PathBuf,
    data: String,
    indent: usize,
}

impl Tcl {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            data: String::new(),
            indent: 0,
        }
    }

    /// Appends a statement where every token is double-quoted.
    pub fn push<S: AsRef<str>>(&mut self, tokens: &[S]) {
        let line = tokens
            .iter()
            .map(|t| format!("\"{}\"", t.as_ref()))
            .collect::<Vec<String>>()
            .join(" ");
        self.push_raw(&line);
    }

    /// Appends a statement mixing quoted and escaped tokens.
    pub fn push_mixed(&mut self, tokens: &[Tok]) {
        let line = tokens
            .iter()
            .map(|t| match t {
                Tok::Quote(s) => format!("\"{}\"", s),
                Tok::Esc(s) => s.to_string(),
            })
            .collect::<Vec<String>>()
            .join(" ");
        self.push_raw(&line);
    }

    /// Appends a line verbatim at the current indentation.
    pub fn push_raw(&mut self, line: &str) {
        self.data.push_str(&"  ".repeat(self.indent));
        self.data.push_str(line);
        self.data.push('\n');
    }

    /// Appends an empty line.
    pub fn blank(&mut self) {
        self.data.push('\n');
    }

    pub fn indent(&mut self) {
        self.indent += 1;
    }

    /// Backs out one indentation level, saturating at zero.
    pub fn dedent(&mut self) {
        if self.indent > 0 {
            self.indent -= 1;
        }
    }

    /// Flushes the entire buffer to disk in a single write.
    pub fn save(&self) -> Result<(), Fault> {
        std::fs::write(&self.path, &self.data)?;
        Ok(())
    }

    pub fn get_path(&self) -> &Path {
        &self.path
    }

    pub fn as_str(&self) -> &str {
        &self.data
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn quoted_statement() {
        let mut tcl = Tcl::new(TCL_FILE);
        tcl.push(&["config_webtalk", "-user", "off"]);
        assert_eq!(tcl.as_str(), "\"config_webtalk\" \"-user\" \"off\"\n");
    }

    #[test]
    fn mixed_statement() {
        let mut tcl = Tcl::new(TCL_FILE);
        tcl.push_mixed(&[
            Tok::quote("set_property"),
            Tok::quote("PROBES.FILE"),
            Tok::esc("{}"),
            Tok::esc("$device"),
        ]);
        assert_eq!(tcl.as_str(), "\"set_property\" \"PROBES.FILE\" {} $device\n");
    }

    #[test]
    fn indentation_tracks_blocks() {
        let mut tcl = Tcl::new(TCL_FILE);
        tcl.push_raw("if { $cond } {");
        tcl.indent();
        tcl.push(&["puts", "inside"]);
        tcl.dedent();
        tcl.push_raw("}");
        assert_eq!(tcl.as_str(), "if { $cond } {\n  \"puts\" \"inside\"\n}\n");
    }

    #[test]
    fn dedent_saturates_at_zero() {
        let mut tcl = Tcl::new(TCL_FILE);
        tcl.dedent();
        tcl.dedent();
        tcl.push_raw("project_close");
        assert_eq!(tcl.as_str(), "project_close\n");
    }

    #[test]
    fn save_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut tcl = Tcl::new(dir.path().join(DO_FILE));
        tcl.push_raw("add wave *");
        tcl.push_raw("run -all");
        tcl.push_raw("quit");
        tcl.save().unwrap();
        let contents = std::fs::read_to_string(tcl.get_path()).unwrap();
        assert_eq!(contents, "add wave *\nrun -all\nquit\n");
    }
}
