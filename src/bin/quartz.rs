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

//! Target: `quartz`
//!
//! Creates a quartus project to execute any stage of the fpga toolchain
//! workflow. Top-level generics can be overridden through the generated tcl
//! script that quartus eventually calls.
//!
//! The target can auto-detect an intel fpga connected to the pc to program
//! with a .pof or .sof bitstream file.
//!
//! References:
//! - <https://www.intel.co.jp/content/dam/altera-www/global/ja_JP/pdfs/literature/an/an312.pdf>
//! - <https://community.intel.com/t5/Intel-Quartus-Prime-Software/Passing-parameter-generic-to-the-top-level-in-Quartus-tcl/td-p/239039>

use cliproc::{cli, proc, stage::Memory};
use cliproc::{Arg, Cli, ExitCode, Help};
use std::env;
use std::path::Path;

use orbit_targets::core::blueprint::Blueprint;
use orbit_targets::core::board;
use orbit_targets::core::board::Board;
use orbit_targets::core::generic::Generic;
use orbit_targets::core::tcl::{Tcl, TCL_FILE};
use orbit_targets::error::{Error, Hint};
use orbit_targets::util::command::Command;
use orbit_targets::util::environment;
use orbit_targets::util::environment::quote_str;

fn main() -> ExitCode {
    Cli::default().parse(env::args()).go::<Quartz>()
}

// supported part for generating .sdo and .vho files for timing simulation
const EDA_NETLIST_FAMILY: &str = "MAXII";
const EDA_NETLIST_DEVICE: &str = "EPM2210F324I5";

#[derive(Debug, PartialEq)]
struct Quartz {
    synth: bool,
    route: bool,
    sta: bool,
    bit: bool,
    eda_netlist: bool,
    compile: bool,
    open: bool,
    prog_sram: bool,
    prog_flash: bool,
    board: Option<String>,
    family: Option<String>,
    device: Option<String>,
    generics: Vec<Generic>,
}

/// The gated stages to run after project creation, where each stage implies
/// every stage before it.
#[derive(Debug, PartialEq, Default)]
struct Stages {
    synth: bool,
    fit: bool,
    sta: bool,
    asm: bool,
    eda_netlist: bool,
}

impl Quartz {
    fn stages(&self) -> Stages {
        let mut stages = Stages::default();
        if self.synth == true {
            stages.synth = true;
        }
        if self.route == true {
            stages.synth = true;
            stages.fit = true;
        }
        if self.sta == true {
            stages.synth = true;
            stages.fit = true;
            stages.sta = true;
        }
        if self.bit == true {
            stages.synth = true;
            stages.fit = true;
            stages.sta = true;
            stages.asm = true;
        }
        if self.eda_netlist == true {
            stages.synth = true;
            stages.fit = true;
            stages.sta = true;
            stages.asm = true;
            stages.eda_netlist = true;
        }
        stages
    }
}

impl cliproc::Command for Quartz {
    fn interpret(cli: &mut Cli<Memory>) -> cli::Result<Self> {
        cli.help(Help::with(HELP))?;
        Ok(Quartz {
            // Flags
            synth: cli.check(Arg::flag("synth"))?,
            route: cli.check(Arg::flag("route"))?,
            sta: cli.check(Arg::flag("sta"))?,
            bit: cli.check(Arg::flag("bit"))?,
            eda_netlist: cli.check(Arg::flag("eda-netlist"))?,
            compile: cli.check(Arg::flag("compile"))?,
            open: cli.check(Arg::flag("open"))?,
            prog_sram: cli.check(Arg::flag("prog-sram"))?,
            prog_flash: cli.check(Arg::flag("prog-flash"))?,
            // Options
            board: cli.get(Arg::option("board").value("name"))?,
            family: cli.get(Arg::option("family").value("name"))?,
            device: cli.get(Arg::option("device").value("name"))?,
            generics: cli
                .get_all(Arg::option("generic").switch('g').value("key=value"))?
                .unwrap_or(Vec::new()),
        })
    }

    fn execute(self) -> proc::Result {
        environment::add_path(&environment::read(environment::ORBIT_ENV_QUARTUS_PATH));

        // the quartus project resides in a folder with the same name as the ip
        let project = environment::require(environment::ORBIT_IP_NAME)?;
        let top_unit = environment::require(environment::ORBIT_TOP_NAME)?;

        let stages = match self.compile {
            // the full toolflow runs inside the generated tcl script instead
            true => Stages::default(),
            false => self.stages(),
        };

        // collect data from the blueprint
        let mut src_files = Vec::new();
        let mut bdf_files = Vec::new();
        let mut board_config: Option<Board> = None;
        for rule in Blueprint::from_env()?.into_rules() {
            if rule.is_builtin() == true {
                src_files.push(rule);
            } else if rule.is_aux("BDF") == true {
                bdf_files.push(rule.get_path().to_string());
            } else if rule.is_aux("BOARD") == true {
                // take the first board file unless one is named on the command-line
                let selected = match &self.board {
                    Some(name) => {
                        Path::new(rule.get_path()).file_stem()
                            == Some(std::ffi::OsStr::new(name.as_str()))
                    }
                    None => board_config.is_none(),
                };
                if selected == true {
                    board_config = Some(Board::load(rule.get_path())?);
                    println!("info: loaded board file: {}", rule.get_path());
                }
            }
        }

        // verify a matching board file was found when requested by name
        if board_config.is_none() == true && self.board.is_some() == true {
            return Err(Error::BoardNotInBlueprint(self.board.unwrap()))?;
        }

        let (family, device) = match stages.eda_netlist {
            true => (
                String::from(EDA_NETLIST_FAMILY),
                String::from(EDA_NETLIST_DEVICE),
            ),
            false => (
                board::resolve_part_field(
                    self.family,
                    board_config.as_ref().and_then(|b| b.get_family()),
                    "FAMILY",
                )?,
                board::resolve_part_field(
                    self.device,
                    board_config.as_ref().and_then(|b| b.get_device()),
                    "DEVICE",
                )?,
            ),
        };

        let has_pins = board_config
            .as_ref()
            .map(|b| b.get_pins().is_some())
            .unwrap_or(false);
        if has_pins == false {
            println!("warning: no pin assignments found due to missing `[pins]` table in board file");
        }

        // 1. write the tcl script for the quartus project

        let mut tcl = Tcl::new(TCL_FILE);
        project_settings(&mut tcl, &project, &family, &device);

        tcl.blank();
        tcl.push_raw("#### Application-specific settings ####");
        tcl.blank();

        tcl.push_raw("# Add source code files to the project");
        for src in &src_files {
            let assignment = if src.is_vhdl() == true {
                "VHDL_FILE"
            } else if src.is_vlog() == true {
                "VERILOG_FILE"
            } else {
                "SYSTEMVERILOG_FILE"
            };
            tcl.push_raw(&format!(
                "set_global_assignment -name {} {} -library {}",
                assignment,
                quote_str(src.get_path()),
                quote_str(src.get_library())
            ));
        }
        for bdf in &bdf_files {
            tcl.push_raw(&format!(
                "set_global_assignment -name BDF_FILE {}",
                quote_str(bdf)
            ));
        }

        tcl.push_raw("# Set the top level entity");
        tcl.push_raw(&format!(
            "set_global_assignment -name TOP_LEVEL_ENTITY {}",
            quote_str(&top_unit)
        ));

        if self.generics.is_empty() == false {
            tcl.push_raw("# Set generics for the top level entity");
            for generic in &self.generics {
                tcl.push_raw(&format!(
                    "set_parameter -name {} {}",
                    quote_str(generic.get_key()),
                    quote_str(generic.get_value())
                ));
            }
        }

        if let Some(pins) = board_config.as_ref().and_then(|b| b.get_pins()) {
            tcl.push_raw("# Set the pin assignments");
            for (pin, port) in pins {
                tcl.push_raw(&format!(
                    "set_location_assignment {} -to {}",
                    quote_str(pin),
                    quote_str(port)
                ));
            }
        }

        if self.compile == true {
            tcl.push_raw("execute_flow -compile");
        }

        // close the newly created project
        tcl.push_raw("project_close");
        tcl.save()?;

        // 2. run quartus with the generated tcl script

        Command::new("quartus_sh")
            .arg("-t")
            .arg(tcl.get_path().display().to_string())
            .spawn(false)?;

        // 3. perform the requested toolflow stages

        if stages.synth == true {
            Command::new("quartus_map").arg(&project).spawn(false)?;
        }
        if stages.fit == true {
            Command::new("quartus_fit").arg(&project).spawn(false)?;
        }
        if stages.sta == true {
            Command::new("quartus_sta").arg(&project).spawn(false)?;
        }
        if stages.asm == true {
            Command::new("quartus_asm").arg(&project).spawn(false)?;
        }
        if stages.eda_netlist == true {
            Command::new("quartus_eda")
                .arg(&project)
                .arg("--simulation")
                .spawn(false)?;
        }

        // 4. program the fpga board

        if self.prog_sram == true || self.prog_flash == true {
            // auto-detect the programming cable
            let out = Command::new("quartus_pgm").arg("-a").output(false)?;
            if out.starts_with("Error ") == true {
                return Err(Error::CableDetectFailed(out.trim().to_string()))?;
            }
            let cable = match out.split_whitespace().nth(1) {
                Some(name) => name.to_string(),
                None => return Err(Error::CableDetectFailed(out.trim().to_string()))?,
            };

            let prog = Command::new("quartus_pgm")
                .args(["-c", cable.as_str(), "-m", "jtag", "-o"]);
            // program with the temporary sram bitfile or the permanent flash bitfile
            if self.prog_sram == true {
                let sof_file = format!("{}.sof", project);
                if Path::new(&sof_file).exists() == false {
                    return Err(Error::BitstreamNotFound(sof_file, Hint::BitstreamFlow))?;
                }
                prog.arg(format!("p;{}", sof_file)).spawn(false)?;
            } else {
                let pof_file = format!("{}.pof", project);
                if Path::new(&pof_file).exists() == false {
                    return Err(Error::BitstreamNotFound(pof_file, Hint::BitstreamFlow))?;
                }
                prog.arg(format!("bpv;{}", pof_file)).spawn(false)?;
            }
        }

        // 5. open the project in the quartus gui

        if self.open == true {
            Command::new("quartus")
                .arg(format!("{}.qpf", project))
                .spawn(false)?;
        }
        Ok(())
    }
}

/// Writes the initial project configuration for a freshly created project.
fn project_settings(tcl: &mut Tcl, project: &str, family: &str, device: &str) {
    tcl.push_raw("# Quartus project tcl script automatically generated by orbit. DO NOT EDIT.");
    tcl.push_raw("load_package flow");
    tcl.blank();
    tcl.push_raw("#### General project settings ####");
    tcl.blank();
    tcl.push_raw("# Create the project and overwrite any settings or files that exist");
    tcl.push_raw(&format!(
        "project_new {0} -revision {0} -overwrite",
        quote_str(project)
    ));
    tcl.push_raw("# Set default configurations and device");
    tcl.push_raw("set_global_assignment -name NUM_PARALLEL_PROCESSORS \"ALL\"");
    tcl.push_raw("set_global_assignment -name VHDL_INPUT_VERSION VHDL_1993");
    tcl.push_raw("set_global_assignment -name VERILOG_INPUT_VERSION SYSTEMVERILOG_2005");
    tcl.push_raw("set_global_assignment -name EDA_SIMULATION_TOOL \"ModelSim-Altera (VHDL)\"");
    tcl.push_raw(
        "set_global_assignment -name EDA_OUTPUT_DATA_FORMAT \"VHDL\" -section_id EDA_SIMULATION",
    );
    tcl.push_raw(
        "set_global_assignment -name EDA_GENERATE_FUNCTIONAL_NETLIST OFF -section_id EDA_SIMULATION",
    );
    tcl.push_raw(&format!(
        "set_global_assignment -name FAMILY {}",
        quote_str(family)
    ));
    tcl.push_raw(&format!(
        "set_global_assignment -name DEVICE {}",
        quote_str(device)
    ));
    tcl.push_raw("# Use a single uncompressed image with memory initialization file");
    tcl.push_raw("set_global_assignment -name EXTERNAL_FLASH_FALLBACK_ADDRESS 00000000");
    tcl.push_raw("set_global_assignment -name USE_CONFIGURATION_DEVICE OFF");
    tcl.push_raw("set_global_assignment -name INTERNAL_FLASH_UPDATE_MODE \"SINGLE IMAGE WITH ERAM\"");
    tcl.push_raw("# Configure tri-state for unused pins");
    tcl.push_raw(
        "set_global_assignment -name RESERVE_ALL_UNUSED_PINS_WEAK_PULLUP \"AS INPUT TRI-STATED\"",
    );
}

const HELP: &str = r#"Create a quartus project to run any stage of the fpga toolchain.

Usage:
    quartz [options]

Options:
    --synth                     execute analysis and synthesis
    --route                     execute place and route
    --sta                       execute static timing analysis
    --bit                       generate a bitstream file
    --eda-netlist               generate an eda timing netlist
    --compile                   run the full toolflow inside quartus
    --open                      open the quartus project in the gui
    --board <name>              board configuration file name
    --prog-sram                 program the board with the temporary bitfile
    --prog-flash                program the board with the permanent bitfile
    --family <name>             targeted fpga family
    --device <name>             targeted fpga device
    --generic, -g <key=value>...  override top-level vhdl generics
"#;
