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

//! Target: `xpro`
//!
//! Maintains a vivado project for the local ip. The project is created on
//! the first run and reopened afterwards, so gui state such as waveform
//! configurations survives between runs.
//!
//! Reference: <https://docs.xilinx.com/r/en-US/ug835-vivado-tcl-commands>

use cliproc::{cli, proc, stage::Memory};
use cliproc::{Arg, Cli, ExitCode, Help};
use std::env;
use std::path::Path;
use std::str::FromStr;

use orbit_targets::core::blueprint::Blueprint;
use orbit_targets::core::generic::Generic;
use orbit_targets::core::tcl::{Tcl, Tok, TCL_FILE};
use orbit_targets::util::anyerror::AnyError;
use orbit_targets::util::command::Command;
use orbit_targets::util::environment;

fn main() -> ExitCode {
    Cli::default().parse(env::args()).go::<Xpro>()
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum FlowStep {
    Synth,
    Impl,
    Bit,
}

impl FromStr for FlowStep {
    type Err = AnyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_ref() {
            "synth" => Ok(Self::Synth),
            "impl" => Ok(Self::Impl),
            "bit" => Ok(Self::Bit),
            _ => Err(AnyError(String::from(
                "accepted values are 'synth', 'impl', or 'bit'",
            ))),
        }
    }
}

#[derive(Debug, PartialEq)]
struct Xpro {
    part: Option<String>,
    run: Option<FlowStep>,
    no_gui: bool,
    interactive: bool,
    no_bat: bool,
    generics: Vec<Generic>,
}

impl cliproc::Command for Xpro {
    fn interpret(cli: &mut Cli<Memory>) -> cli::Result<Self> {
        cli.help(Help::with(HELP))?;
        Ok(Xpro {
            // Flags
            no_gui: cli.check(Arg::flag("no-gui"))?,
            interactive: cli.check(Arg::flag("interactive").switch('i'))?,
            no_bat: cli.check(Arg::flag("no-bat"))?,
            // Options
            part: cli.get(Arg::option("part").value("name"))?,
            run: cli.get(Arg::option("run").switch('r').value("step"))?,
            generics: cli
                .get_all(Arg::option("generic").switch('g').value("key=value"))?
                .unwrap_or(Vec::new()),
        })
    }

    fn execute(self) -> proc::Result {
        environment::add_path(&environment::read(environment::ORBIT_ENV_VIVADO_PATH));

        let project = environment::require(environment::ORBIT_IP_NAME)?;
        let top_unit = environment::read(environment::ORBIT_TOP_NAME);
        let xpr_file = format!("{}.xpr", project);

        let mut tcl = Tcl::new(TCL_FILE);
        tcl.push(&["config_webtalk", "-user", "off"]);

        // reuse the existing project so gui state carries across runs
        if Path::new(&xpr_file).exists() == true {
            println!("info: opening existing project: {}", xpr_file);
            tcl.push(&["open_project", &xpr_file]);
        } else {
            println!("info: creating new project: {}", xpr_file);
            if self.part.is_none() == true {
                println!("warning: no part selected; vivado will use its default part");
            }
            let mut stmt = vec![String::from("create_project")];
            if let Some(part) = &self.part {
                stmt.push(String::from("-part"));
                stmt.push(part.to_string());
            }
            stmt.push(project.to_string());
            stmt.push(String::from("."));
            tcl.push(&stmt);
        }
        // reopened projects must also pick up a part change
        if let Some(part) = &self.part {
            tcl.push_mixed(&[
                Tok::quote("set_property"),
                Tok::quote("part"),
                Tok::quote(part),
                Tok::esc("[current_project]"),
            ]);
        }
        tcl.push_mixed(&[
            Tok::quote("set_property"),
            Tok::quote("simulator_language"),
            Tok::quote("mixed"),
            Tok::esc("[current_project]"),
        ]);

        tcl.blank();
        tcl.push_raw("# Add source code files to the project");
        let mut vhdl_count = 0;
        let mut vlog_count = 0;
        for rule in Blueprint::from_env()?.into_rules() {
            if rule.is_builtin() == true {
                if rule.is_vhdl() == true {
                    vhdl_count += 1;
                } else {
                    vlog_count += 1;
                }
                // a file already in the project returns an empty object
                tcl.push_mixed(&[
                    Tok::esc("set file_obj [add_files -fileset sources_1"),
                    Tok::quote(rule.get_path()),
                    Tok::esc("]"),
                ]);
                tcl.push_raw("if { $file_obj != \"\" } {");
                tcl.indent();
                tcl.push_mixed(&[
                    Tok::quote("set_property"),
                    Tok::quote("library"),
                    Tok::quote(rule.get_library()),
                    Tok::esc("$file_obj"),
                ]);
                tcl.dedent();
                tcl.push_raw("}");
            } else if rule.is_aux("XDCF") == true {
                tcl.push(&["add_files", "-fileset", "constrs_1", rule.get_path()]);
            }
        }

        let target_language = match vlog_count >= vhdl_count {
            true => "verilog",
            false => "VHDL",
        };
        tcl.push_mixed(&[
            Tok::quote("set_property"),
            Tok::quote("target_language"),
            Tok::quote(target_language),
            Tok::esc("[current_project]"),
        ]);

        if let Some(top) = &top_unit {
            tcl.push_mixed(&[
                Tok::quote("set_property"),
                Tok::quote("top"),
                Tok::quote(top),
                Tok::esc("[current_fileset]"),
            ]);
        }
        tcl.push(&["update_compile_order", "-fileset", "sources_1"]);

        if self.generics.is_empty() == false {
            tcl.blank();
            tcl.push_raw("# Append generic overrides to the active fileset");
            tcl.push_raw("set original_generics [get_property generic [current_fileset]]");
            let overrides = self
                .generics
                .iter()
                .map(|g| g.to_string())
                .collect::<Vec<String>>()
                .join(" ");
            tcl.push_mixed(&[
                Tok::quote("set_property"),
                Tok::quote("generic"),
                Tok::quote(format!("$original_generics {}", overrides)),
                Tok::esc("[current_fileset]"),
            ]);
        }

        if let Some(step) = &self.run {
            tcl.blank();
            tcl.push_raw("# Launch the requested runs");
            tcl.push(&["launch_runs", "synth_1"]);
            tcl.push(&["wait_on_run", "synth_1"]);
            if step >= &FlowStep::Impl {
                if step >= &FlowStep::Bit {
                    tcl.push(&["launch_runs", "impl_1", "-to_step", "write_bitstream"]);
                } else {
                    tcl.push(&["launch_runs", "impl_1"]);
                }
                tcl.push(&["wait_on_run", "impl_1"]);
            }
        }

        tcl.blank();
        if self.no_gui == true {
            tcl.push(&["exit"]);
        } else {
            tcl.push(&["start_gui"]);
        }
        tcl.save()?;

        let program = match cfg!(target_os = "windows") == true && self.no_bat == false {
            true => "vivado.bat",
            false => "vivado",
        };
        let mode = match self.interactive {
            true => "tcl",
            false => "batch",
        };

        Command::new(program)
            .args(["-mode", mode, "-nojournal", "-nolog", "-source"])
            .arg(tcl.get_path().display().to_string())
            .spawn(false)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use cliproc::Command as _;
    use std::fs;

    #[test]
    fn part_applies_to_existing_project() {
        let dir = tempfile::tempdir().unwrap();
        let blueprint = dir.path().join("blueprint.tsv");
        fs::write(&blueprint, "").unwrap();
        // a project file already on disk takes the open_project branch
        fs::write(dir.path().join("demo.xpr"), "").unwrap();
        std::env::set_var(environment::ORBIT_BLUEPRINT, &blueprint);
        std::env::set_var(environment::ORBIT_IP_NAME, "demo");
        std::env::set_current_dir(dir.path()).unwrap();

        let command = Xpro {
            part: Some(String::from("xc7a35ticsg324-1L")),
            run: None,
            no_gui: true,
            interactive: false,
            no_bat: false,
            generics: Vec::new(),
        };
        // vivado is not installed here; the tcl script is written beforehand
        let _ = command.execute();

        let tcl = fs::read_to_string(TCL_FILE).unwrap();
        assert_eq!(tcl.contains("\"open_project\" \"demo.xpr\""), true);
        assert_eq!(
            tcl.contains("\"set_property\" \"part\" \"xc7a35ticsg324-1L\" [current_project]"),
            true
        );
    }
}

const HELP: &str = r#"Create and maintain a vivado project for the local ip.

Usage:
    xpro [options]

Options:
    --run, -r <step>            flow step to stop at: synth, impl, bit
    --part <name>               targeted fpga part number
    --generic, -g <key=value>...  override top-level generics
    --no-gui                    exit vivado instead of opening the gui
    --interactive, -i           keep the vivado tcl shell open afterward
    --no-bat                    do not use the .bat executable on windows
"#;
