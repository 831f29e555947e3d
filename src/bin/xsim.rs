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

//! Target: `xsim`
//!
//! Runs hdl simulations with the xsim simulator packaged with vivado. The
//! compile, elaborate, and simulate stages are requested explicitly, where
//! a later stage implies the ones before it.
//!
//! Reference: <https://docs.xilinx.com/r/en-US/ug900-vivado-logic-simulation>

use cliproc::{cli, proc, stage::Memory};
use cliproc::{Arg, Cli, ExitCode, Help};
use colored::Colorize;
use std::env;
use std::path::Path;
use std::str::FromStr;

use orbit_targets::core::blueprint::Blueprint;
use orbit_targets::core::generic::Generic;
use orbit_targets::core::tcl::Tcl;
use orbit_targets::error::{Error, Hint};
use orbit_targets::util::anyerror::AnyError;
use orbit_targets::util::command::Command;
use orbit_targets::util::environment;
use orbit_targets::util::environment::quote_str;

fn main() -> ExitCode {
    Cli::default().parse(env::args()).go::<Xsim>()
}

const BATCH_FILE: &str = "batch.tcl";

#[derive(Debug, PartialEq)]
enum SimMode {
    /// Batch simulation on the command line with a full waveform dump.
    Cl,
    /// Live simulation inside the xsim gui.
    Gui,
    /// Reopen the waveform database from a previous run.
    Review,
}

impl FromStr for SimMode {
    type Err = AnyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_ref() {
            "cl" => Ok(Self::Cl),
            "gui" => Ok(Self::Gui),
            "review" => Ok(Self::Review),
            _ => Err(AnyError(String::from(
                "accepted values are 'cl', 'gui', or 'review'",
            ))),
        }
    }
}

#[derive(Debug, PartialEq)]
struct Xsim {
    compile: bool,
    elaborate: bool,
    simulate: Option<SimMode>,
    generics: Vec<Generic>,
}

impl cliproc::Command for Xsim {
    fn interpret(cli: &mut Cli<Memory>) -> cli::Result<Self> {
        cli.help(Help::with(HELP))?;
        Ok(Xsim {
            // Flags
            compile: cli.check(Arg::flag("compile").switch('c'))?,
            elaborate: cli.check(Arg::flag("elaborate").switch('e'))?,
            // Options
            simulate: cli.get(Arg::option("simulate").switch('s').value("mode"))?,
            generics: cli
                .get_all(Arg::option("generic").switch('g').value("key=value"))?
                .unwrap_or(Vec::new()),
        })
    }

    fn execute(self) -> proc::Result {
        environment::add_path(&environment::read(environment::ORBIT_ENV_VIVADO_PATH));

        if self.compile == false && self.elaborate == false && self.simulate.is_none() == true {
            println!("info: no toolflow performed");
            println!(
                "{}: use \"--compile\", \"--elaborate\", or \"--simulate\" to run a stage",
                "hint".green()
            );
            return Ok(());
        }

        let top_name = environment::read(environment::ORBIT_TOP_NAME);
        let tb_name = environment::read(environment::ORBIT_TB_NAME);

        // a later stage implies every stage before it
        let run_elaborate = self.elaborate == true || self.simulate.is_some() == true;

        let mut compile_order = Vec::new();
        let mut wave_configs = Vec::new();
        for rule in Blueprint::from_env()?.into_rules() {
            if rule.is_builtin() == true {
                compile_order.push(rule);
            } else if rule.is_aux("WCFG") == true {
                wave_configs.push(rule);
            }
        }

        println!("info: compiling hdl source code ...");
        for rule in &compile_order {
            println!("  -> {}", quote_str(rule.get_path()));
            if rule.is_vhdl() == true {
                Command::new("xvhdl")
                    .arg("--incr")
                    .args(["--work", rule.get_library()])
                    .arg(rule.get_path())
                    .spawn(false)?;
            } else if rule.is_vlog() == true {
                Command::new("xvlog")
                    .arg("--incr")
                    .args(["--work", rule.get_library()])
                    .arg(rule.get_path())
                    .spawn(false)?;
            } else if rule.is_sysv() == true {
                Command::new("xvlog")
                    .arg("--sv")
                    .arg("--incr")
                    .args(["--work", rule.get_library()])
                    .arg(rule.get_path())
                    .spawn(false)?;
            }
        }

        if run_elaborate == false {
            return Ok(());
        }

        let tb_name = match tb_name {
            Some(tb) => tb,
            None => {
                return Err(Error::TestbenchNotSetForTop(
                    top_name.unwrap_or(String::new()),
                ))?
            }
        };

        // a waveform configuration named after the testbench augments the gui
        let wave_config = wave_configs
            .iter()
            .find(|r| r.get_library().eq_ignore_ascii_case(&tb_name))
            .map(|r| r.get_path().to_string());

        println!(
            "info: elaborating testbench {} ...",
            quote_str(&tb_name)
        );
        Command::new("xelab")
            .args(["-debug", "typical"])
            .args(["-top", tb_name.as_str()])
            .args(["-snapshot", tb_name.as_str()])
            .args(self.generics.iter().flat_map(|g| g.to_elab_args()))
            .spawn(false)?;

        let mode = match self.simulate {
            Some(mode) => mode,
            None => return Ok(()),
        };

        match mode {
            SimMode::Cl => {
                let mut batch = Tcl::new(BATCH_FILE);
                match &wave_config {
                    Some(wf) => batch.push_raw(&format!("open_wave_config {}", quote_str(wf))),
                    None => batch.push_raw("log_wave -recursive *"),
                }
                batch.push_raw("run all");
                batch.push_raw("exit");
                batch.save()?;

                let log_file = format!("{}.log", tb_name);
                println!(
                    "info: entering simulation for testbench {} ...",
                    quote_str(&tb_name)
                );
                Command::new("xsim")
                    .arg(&tb_name)
                    .args(["--tclbatch", BATCH_FILE])
                    .args(["--log", log_file.as_str()])
                    .spawn(false)?;
                println!("info: simulation complete");

                // the simulator exits zero even when assertions fired
                let (errors, failures) = scan_log(&std::fs::read_to_string(&log_file)?);
                if errors > 0 || failures > 0 {
                    return Err(Error::SimFailed(errors, failures))?;
                }
            }
            SimMode::Gui => {
                println!(
                    "info: entering simulation for testbench {} ...",
                    quote_str(&tb_name)
                );
                let mut cmd = Command::new("xsim").arg(&tb_name).arg("--gui");
                if let Some(wf) = &wave_config {
                    cmd = cmd.args(["--view", wf]);
                }
                cmd.spawn(false)?;
            }
            SimMode::Review => {
                let wdb_file = format!("{}.wdb", tb_name);
                if Path::new(&wdb_file).exists() == false {
                    return Err(Error::WaveformDbNotFound(wdb_file, Hint::SimulateFirst))?;
                }
                println!("info: reviewing waveforms: {}", quote_str(&wdb_file));
                let mut cmd = Command::new("xsim").arg(&wdb_file).arg("--gui");
                if let Some(wf) = &wave_config {
                    cmd = cmd.args(["--view", wf]);
                }
                cmd.spawn(false)?;
            }
        }
        Ok(())
    }
}

/// Counts the error and failure report lines from an xsim log.
///
/// Lines echoed from the tcl batch script begin with '#' and are skipped so
/// the script's own text cannot trip the scan.
fn scan_log(contents: &str) -> (usize, usize) {
    let mut errors = 0;
    let mut failures = 0;
    for line in contents.lines() {
        if line.starts_with('#') == true {
            continue;
        }
        let line = line.to_ascii_lowercase();
        if line.starts_with("error: ") == true {
            errors += 1;
        } else if line.starts_with("failure: ") == true {
            failures += 1;
        }
    }
    (errors, failures)
}

const HELP: &str = r#"Run hdl simulations with the xsim simulator.

Usage:
    xsim [options]

Options:
    --compile, -c               compile the hdl source code
    --elaborate, -e             elaborate the design into a snapshot
    --simulate, -s <mode>       run the simulation: cl, gui, review
    --generic, -g <key=value>...  override top-level generics
"#;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn log_scan_counts_severities() {
        let log = "\
# run all
Time resolution is 1 ps
ERROR: [Simtcl 6-50] assertion tripped at 100 ns
Failure: testbench halted
# exit
INFO: [Common 17-206] Exiting xsim
";
        assert_eq!(scan_log(log), (1, 1));
    }

    #[test]
    fn log_scan_skips_echoed_tcl() {
        let log = "\
# ERROR: this line is an echo of the batch script
all checks passed
";
        assert_eq!(scan_log(log), (0, 0));
    }
}
