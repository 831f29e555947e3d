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
use std::path::Path;
use std::path::PathBuf;

// variables set by orbit before invoking a target
pub const ORBIT_BLUEPRINT: &str = "ORBIT_BLUEPRINT";
pub const ORBIT_IP_NAME: &str = "ORBIT_IP_NAME";
pub const ORBIT_IP_LIBRARY: &str = "ORBIT_IP_LIBRARY";
pub const ORBIT_TOP_NAME: &str = "ORBIT_TOP_NAME";
pub const ORBIT_TB_NAME: &str = "ORBIT_TB_NAME";
pub const ORBIT_MANIFEST_DIR: &str = "ORBIT_MANIFEST_DIR";
pub const ORBIT_TARGET_DIR: &str = "ORBIT_TARGET_DIR";
pub const ORBIT_OUT_DIR: &str = "ORBIT_OUT_DIR";

// optional vendor installation paths set through a profile's `[env]` table
pub const ORBIT_ENV_GHDL_PATH: &str = "ORBIT_ENV_GHDL_PATH";
pub const ORBIT_ENV_MODELSIM_PATH: &str = "ORBIT_ENV_MODELSIM_PATH";
pub const ORBIT_ENV_QUARTUS_PATH: &str = "ORBIT_ENV_QUARTUS_PATH";
pub const ORBIT_ENV_VIVADO_PATH: &str = "ORBIT_ENV_VIVADO_PATH";

/// Fetches the environment variable `key`.
///
/// An empty value is treated the same as an unset variable.
pub fn read(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(v) => match v.is_empty() {
            true => None,
            false => Some(v),
        },
        Err(_) => None,
    }
}

/// Fetches the environment variable `key`, failing if it is unset or empty.
pub fn require(key: &str) -> Result<String, Error> {
    read(key).ok_or(Error::EnvVarNotSet(key.to_string()))
}

/// Appends `dir` to the process's executable search path.
///
/// Only modifies PATH when the directory exists and is not already listed.
/// Returns `true` when PATH was updated.
pub fn add_path(dir: &Option<String>) -> bool {
    let dir = match dir {
        Some(d) => d,
        None => return false,
    };
    if Path::new(dir).exists() == false {
        return false;
    }
    let mut paths: Vec<PathBuf> = match std::env::var_os("PATH") {
        Some(v) => std::env::split_paths(&v).collect(),
        None => Vec::new(),
    };
    if paths.iter().find(|p| p.as_path() == Path::new(dir)).is_some() {
        return false;
    }
    paths.push(PathBuf::from(dir));
    match std::env::join_paths(paths) {
        Ok(joined) => {
            std::env::set_var("PATH", joined);
            true
        }
        Err(_) => false,
    }
}

/// Wraps the string `s` in double quote characters.
pub fn quote_str(s: &str) -> String {
    format!("\"{}\"", s)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn read_empty_is_unset() {
        std::env::set_var("ORBIT_TEST_EMPTY_VAR", "");
        assert_eq!(read("ORBIT_TEST_EMPTY_VAR"), None);

        std::env::set_var("ORBIT_TEST_SET_VAR", "gates");
        assert_eq!(read("ORBIT_TEST_SET_VAR"), Some(String::from("gates")));
    }

    #[test]
    fn require_missing_is_fatal() {
        assert_eq!(
            require("ORBIT_TEST_UNSET_VAR"),
            Err(Error::EnvVarNotSet(String::from("ORBIT_TEST_UNSET_VAR")))
        );
    }

    #[test]
    fn add_path_skips_missing_dir() {
        assert_eq!(
            add_path(&Some(String::from("/this/path/does/not/exist"))),
            false
        );
        assert_eq!(add_path(&None), false);
    }

    #[test]
    fn quoting() {
        assert_eq!(quote_str("work"), "\"work\"");
    }
}
