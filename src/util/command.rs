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
use std::process::ExitStatus;
use std::process::Stdio;

/// A vendor tool invocation under construction.
///
/// Arguments accumulate in order; spawning blocks until the child exits and
/// any failure is terminal for the remaining workflow.
#[derive(Debug, PartialEq)]
pub struct Command {
    program: String,
    args: Vec<String>,
}

impl Command {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
        }
    }

    /// Appends a single argument, skipping empty strings.
    pub fn arg<S: AsRef<str>>(mut self, arg: S) -> Self {
        if arg.as_ref().is_empty() == false {
            self.args.push(arg.as_ref().to_string());
        }
        self
    }

    /// Appends a series of arguments in order.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        args.into_iter().for_each(|a| {
            if a.as_ref().is_empty() == false {
                self.args.push(a.as_ref().to_string());
            }
        });
        self
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Spawns the child process and blocks until it completes.
    ///
    /// A non-zero exit code aborts the workflow by returning an error.
    pub fn spawn(&self, verbose: bool) -> Result<(), Fault> {
        if verbose == true {
            println!("info: running: {}", self.to_string());
        }
        let mut child = match std::process::Command::new(&self.program)
            .args(&self.args)
            .spawn()
        {
            Ok(c) => c,
            Err(e) => match e.kind() {
                std::io::ErrorKind::NotFound => {
                    return Err(Error::CommandNotFound(self.program.to_string()))?
                }
                _ => return Err(e)?,
            },
        };
        let status = child.wait()?;
        Self::check(&status)
    }

    /// Spawns the child process and captures its standard output.
    ///
    /// The child's exit status is checked the same way as [`Command::spawn`].
    pub fn output(&self, verbose: bool) -> Result<String, Fault> {
        if verbose == true {
            println!("info: running: {}", self.to_string());
        }
        let output = match std::process::Command::new(&self.program)
            .args(&self.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
        {
            Ok(o) => o,
            Err(e) => match e.kind() {
                std::io::ErrorKind::NotFound => {
                    return Err(Error::CommandNotFound(self.program.to_string()))?
                }
                _ => return Err(e)?,
            },
        };
        Self::check(&output.status)?;
        Ok(String::from_utf8(output.stdout)?)
    }

    fn check(status: &ExitStatus) -> Result<(), Fault> {
        match status.code() {
            Some(num) => {
                if num != 0 {
                    Err(Error::ChildProcErrorCode(num))?
                } else {
                    Ok(())
                }
            }
            None => Err(Error::ChildProcTerminated)?,
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}",
            self.program,
            self.args
                .iter()
                .fold(String::new(), |x, y| x + " \"" + y + "\"")
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn build_arg_list() {
        let cmd = Command::new("ghdl")
            .arg("-a")
            .arg("")
            .args(["--std=93", "--work=work"])
            .arg("top.vhd");
        // empty strings are dropped from the argument list
        assert_eq!(cmd.get_args(), ["-a", "--std=93", "--work=work", "top.vhd"]);
    }

    #[test]
    fn echo_quotes_args() {
        let cmd = Command::new("vsim").arg("-batch").arg("-do").arg("orbit.do");
        assert_eq!(cmd.to_string(), "vsim \"-batch\" \"-do\" \"orbit.do\"");
    }

    #[test]
    fn missing_program_is_fatal() {
        let cmd = Command::new("orbit-test-no-such-tool");
        let result = cmd.spawn(false);
        assert_eq!(
            result.unwrap_err().to_string(),
            Error::CommandNotFound(String::from("orbit-test-no-such-tool")).to_string()
        );
    }
}
