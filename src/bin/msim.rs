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

//! Target: `msim`
//!
//! Runs modelsim in batch or gui mode to perform hdl simulations.
//!
//! Reference: <https://www.microsemi.com/document-portal/doc_view/131617-modelsim-reference-manual>

use cliproc::{cli, proc, stage::Memory};
use cliproc::{Arg, Cli, ExitCode, Help};
use std::env;
use std::path::Path;

use orbit_targets::core::blueprint::Blueprint;
use orbit_targets::core::generic::Generic;
use orbit_targets::core::tcl::{Tcl, DO_FILE};
use orbit_targets::error::{Error, Hint};
use orbit_targets::util::command::Command;
use orbit_targets::util::environment;
use orbit_targets::util::environment::quote_str;

fn main() -> ExitCode {
    Cli::default().parse(env::args()).go::<Msim>()
}

const WAVEFORM_FILE: &str = "vsim.wlf";

#[derive(Debug, PartialEq)]
struct Msim {
    lint: bool,
    gui: bool,
    stop_at_sim: bool,
    top_config: Option<String>,
    generics: Vec<Generic>,
}

impl cliproc::Command for Msim {
    fn interpret(cli: &mut Cli<Memory>) -> cli::Result<Self> {
        cli.help(Help::with(HELP))?;
        Ok(Msim {
            // Flags
            lint: cli.check(Arg::flag("lint"))?,
            gui: cli.check(Arg::flag("gui"))?,
            stop_at_sim: cli.check(Arg::flag("stop-at-sim"))?,
            // Options
            top_config: cli.get(Arg::option("top-config").value("unit"))?,
            generics: cli
                .get_all(Arg::option("generic").switch('g').value("key=value"))?
                .unwrap_or(Vec::new()),
        })
    }

    fn execute(self) -> proc::Result {
        environment::add_path(&environment::read(environment::ORBIT_ENV_MODELSIM_PATH));

        let tb_name = environment::read(environment::ORBIT_TB_NAME);

        // split the blueprint into the compile order and an optional .do file
        let mut compile_order = Vec::new();
        let mut tb_do_file: Option<String> = None;
        for rule in Blueprint::from_env()?.into_rules() {
            if rule.is_builtin() == true {
                compile_order.push(rule);
            } else if rule.is_aux("DO") == true {
                tb_do_file = Some(rule.get_path().to_string());
            }
        }

        println!("info: compiling hdl source code ...");
        let mut libraries: Vec<String> = Vec::new();
        let mut work_lib = String::from("work");
        for rule in &compile_order {
            println!("  -> {}", quote_str(rule.get_path()));
            // create new libraries and their mappings on first encounter
            if libraries.iter().find(|l| l == &rule.get_library()).is_none() {
                Command::new("vlib").arg(rule.get_library()).spawn(false)?;
                Command::new("vmap")
                    .arg(rule.get_library())
                    .arg(rule.get_library())
                    .spawn(false)?;
                libraries.push(rule.get_library().to_string());
            }
            if rule.is_vhdl() == true {
                Command::new("vcom")
                    .arg("-work")
                    .arg(rule.get_library())
                    .arg(rule.get_path())
                    .spawn(false)?;
            } else if rule.is_vlog() == true {
                Command::new("vlog")
                    .arg("-work")
                    .arg(rule.get_library())
                    .arg(rule.get_path())
                    .spawn(false)?;
            } else if rule.is_sysv() == true {
                Command::new("vlog")
                    .arg("-sv")
                    .arg("-work")
                    .arg(rule.get_library())
                    .arg(rule.get_path())
                    .spawn(false)?;
            }
            // the last file to write a library determines the working library
            work_lib = rule.get_library().to_string();
        }

        if self.lint == true {
            println!("info: static analysis complete");
            return Ok(());
        }

        let tb_name = match tb_name {
            Some(tb) => tb,
            None => return Err(Error::TestbenchNotSet(Hint::LintGate))?,
        };

        // create a .do file to automate the modelsim session
        println!("info: generating .do file ...");
        let mut do_file = Tcl::new(DO_FILE);
        if self.gui == true {
            // bring in custom waveform/vsim commands when the ip provides them
            match tb_do_file {
                Some(path) if Path::new(&path).exists() == true => {
                    println!("info: importing commands from .do file: {}", path);
                    for line in std::fs::read_to_string(&path)?.lines() {
                        if line.trim().is_empty() == false {
                            do_file.push_raw(line);
                        }
                    }
                }
                _ => do_file.push_raw("add wave *"),
            }
        }
        if self.stop_at_sim == false {
            do_file.push_raw("run -all");
        }
        if self.gui == false {
            do_file.push_raw("quit");
        }
        do_file.save()?;

        let mode = match self.gui {
            true => "-gui",
            false => "-batch",
        };

        // a top-level configuration unit overrides the bench
        let sim_top = self.top_config.unwrap_or(tb_name);

        println!(
            "info: starting simulation for testbench {} ...",
            quote_str(&sim_top)
        );
        Command::new("vsim")
            .arg(mode)
            .args(["-onfinish", "stop"])
            .args(["-do", DO_FILE])
            .args(["-wlf", WAVEFORM_FILE])
            .args(["-work", work_lib.as_str()])
            .arg("+nowarn3116")
            .arg(&sim_top)
            .args(self.generics.iter().map(|g| g.to_simulator_flag()))
            .spawn(false)
    }
}

const HELP: &str = r#"Run hdl simulations with modelsim.

Usage:
    msim [options]

Options:
    --lint                      run static code analysis and exit
    --gui                       open the modelsim gui
    --stop-at-sim               stop after setting up the simulation
    --generic, -g <key=value>...  override top-level vhdl generics
    --top-config <unit>         define the top-level configuration unit
"#;
