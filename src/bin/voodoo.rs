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

//! Target: `voodoo`
//!
//! Drives vivado in non-project batch mode to take a design from hdl
//! sources all the way to a programmed fpga. Each step of the flow implies
//! every step before it, so a single tcl script is regenerated on every run.
//!
//! Reference: <https://docs.xilinx.com/r/en-US/ug835-vivado-tcl-commands>

use cliproc::{cli, proc, stage::Memory};
use cliproc::{Arg, Cli, ExitCode, Help};
use std::env;
use std::str::FromStr;

use orbit_targets::core::blueprint::Blueprint;
use orbit_targets::core::generic::Generic;
use orbit_targets::core::tcl::{Tcl, Tok, TCL_FILE};
use orbit_targets::util::anyerror::AnyError;
use orbit_targets::util::command::Command;
use orbit_targets::util::environment;

fn main() -> ExitCode {
    Cli::default().parse(env::args()).go::<Voodoo>()
}

/// A stopping point in the backend flow. Ordering matters: running a later
/// step performs all earlier steps as well.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum FlowStep {
    Synth,
    Impl,
    Route,
    Bit,
    Pgm,
}

impl FromStr for FlowStep {
    type Err = AnyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_ref() {
            "synth" => Ok(Self::Synth),
            "impl" => Ok(Self::Impl),
            "route" => Ok(Self::Route),
            "bit" => Ok(Self::Bit),
            "pgm" => Ok(Self::Pgm),
            _ => Err(AnyError(String::from(
                "accepted values are 'synth', 'impl', 'route', 'bit', or 'pgm'",
            ))),
        }
    }
}

#[derive(Debug, PartialEq)]
struct Voodoo {
    part: String,
    run: FlowStep,
    no_bat: bool,
    generics: Vec<Generic>,
}

impl cliproc::Command for Voodoo {
    fn interpret(cli: &mut Cli<Memory>) -> cli::Result<Self> {
        cli.help(Help::with(HELP))?;
        Ok(Voodoo {
            // Flags
            no_bat: cli.check(Arg::flag("no-bat"))?,
            // Options
            part: cli.require(Arg::option("part").value("name"))?,
            run: cli.require(Arg::option("run").switch('r').value("step"))?,
            generics: cli
                .get_all(Arg::option("generic").switch('g').value("key=value"))?
                .unwrap_or(Vec::new()),
        })
    }

    fn execute(self) -> proc::Result {
        environment::add_path(&environment::read(environment::ORBIT_ENV_VIVADO_PATH));

        let top_unit = environment::require(environment::ORBIT_TOP_NAME)?;
        let bit_file = format!("{}.bit", top_unit);

        let mut tcl = Tcl::new(TCL_FILE);
        tcl.push(&["config_webtalk", "-user", "off"]);

        tcl.blank();
        tcl.push_raw("# Read hdl source code files");
        for rule in Blueprint::from_env()?.into_rules() {
            if rule.is_vhdl() == true {
                tcl.push(&["read_vhdl", "-library", rule.get_library(), rule.get_path()]);
            } else if rule.is_vlog() == true {
                tcl.push(&[
                    "read_verilog",
                    "-library",
                    rule.get_library(),
                    rule.get_path(),
                ]);
            } else if rule.is_sysv() == true {
                tcl.push(&[
                    "read_verilog",
                    "-sv",
                    "-library",
                    rule.get_library(),
                    rule.get_path(),
                ]);
            } else if rule.is_aux("XDCF") == true {
                tcl.push(&["read_xdc", rule.get_path()]);
            }
        }

        if self.run >= FlowStep::Synth {
            synthesize(&mut tcl, &top_unit, &self.part, &self.generics);
        }
        if self.run >= FlowStep::Impl {
            implement(&mut tcl);
        }
        if self.run >= FlowStep::Route {
            route(&mut tcl);
        }
        if self.run >= FlowStep::Bit {
            bitstream(&mut tcl, &top_unit, &bit_file);
        }
        if self.run >= FlowStep::Pgm {
            program_device(&mut tcl, &bit_file);
        }

        tcl.save()?;

        let program = match cfg!(target_os = "windows") == true && self.no_bat == false {
            true => "vivado.bat",
            false => "vivado",
        };

        Command::new(program)
            .args(["-mode", "batch", "-nojournal", "-nolog", "-source"])
            .arg(tcl.get_path().display().to_string())
            .spawn(false)
    }
}

fn synthesize(tcl: &mut Tcl, top: &str, part: &str, generics: &[Generic]) {
    tcl.blank();
    tcl.push_raw("# Synthesize the design");
    let mut stmt = vec![
        String::from("synth_design"),
        String::from("-top"),
        top.to_string(),
        String::from("-part"),
        part.to_string(),
    ];
    for generic in generics {
        stmt.push(String::from("-generic"));
        stmt.push(generic.to_string());
    }
    tcl.push(&stmt);
    tcl.push(&["write_checkpoint", "-force", "post_synth.dcp"]);
    tcl.push(&["report_timing_summary", "-file", "post_synth_timing_summary.rpt"]);
    tcl.push(&["report_utilization", "-file", "post_synth_util.rpt"]);
}

fn implement(tcl: &mut Tcl) {
    tcl.blank();
    tcl.push_raw("# Optimize and place the netlist");
    tcl.push(&["opt_design"]);
    tcl.push(&["place_design"]);
    tcl.push_raw("# Run physical optimization when setup timing is violated");
    tcl.push_raw("if {[get_property SLACK [get_timing_paths -max_paths 1 -nworst 1 -setup]] < 0} {");
    tcl.indent();
    tcl.push_raw("puts \"Found setup timing violations => running physical optimization\"");
    tcl.push(&["phys_opt_design"]);
    tcl.dedent();
    tcl.push_raw("}");
    tcl.push(&["write_checkpoint", "-force", "post_place.dcp"]);
    tcl.push(&["report_clock_utilization", "-file", "clock_util.rpt"]);
    tcl.push(&["report_utilization", "-file", "post_place_util.rpt"]);
    tcl.push(&["report_timing_summary", "-file", "post_place_timing_summary.rpt"]);
}

fn route(tcl: &mut Tcl) {
    tcl.blank();
    tcl.push_raw("# Route the design");
    tcl.push(&["route_design", "-directive", "Explore"]);
    tcl.push(&["write_checkpoint", "-force", "post_route.dcp"]);
    tcl.push(&["report_route_status", "-file", "post_route_status.rpt"]);
    tcl.push(&["report_timing_summary", "-file", "post_route_timing_summary.rpt"]);
    tcl.push(&["report_power", "-file", "post_route_power.rpt"]);
    tcl.push(&["report_drc", "-file", "post_impl_drc.rpt"]);
}

fn bitstream(tcl: &mut Tcl, top: &str, bit_file: &str) {
    tcl.blank();
    tcl.push_raw("# Generate the timing simulation netlist and bitstream");
    tcl.push(&[
        "write_verilog",
        "-force",
        &format!("cpu_impl_netlist_{}.v", top),
        "-mode",
        "timesim",
        "-sdf_anno",
        "true",
    ]);
    tcl.push(&["write_bitstream", "-force", bit_file]);
}

fn program_device(tcl: &mut Tcl, bit_file: &str) {
    tcl.blank();
    tcl.push_raw("# Program the first connected xilinx device");
    tcl.push(&["open_hw_manager"]);
    tcl.push(&["connect_hw_server", "-allow_non_jtag"]);
    tcl.push(&["open_hw_target"]);
    tcl.push_raw("set device [lindex [get_hw_devices \"xc*\"] 0]");
    tcl.push_mixed(&[
        Tok::quote("set_property"),
        Tok::quote("PROBES.FILE"),
        Tok::esc("{}"),
        Tok::esc("$device"),
    ]);
    tcl.push_mixed(&[
        Tok::quote("set_property"),
        Tok::quote("FULL_PROBES.FILE"),
        Tok::esc("{}"),
        Tok::esc("$device"),
    ]);
    tcl.push_mixed(&[
        Tok::quote("set_property"),
        Tok::quote("PROGRAM.FILE"),
        Tok::quote(bit_file),
        Tok::esc("$device"),
    ]);
    tcl.push_mixed(&[Tok::quote("current_hw_device"), Tok::esc("$device")]);
    tcl.push_mixed(&[
        Tok::quote("refresh_hw_device"),
        Tok::quote("-update_hw_probes"),
        Tok::quote("false"),
        Tok::esc("$device"),
    ]);
    tcl.push_mixed(&[Tok::quote("program_hw_devices"), Tok::esc("$device")]);
    tcl.push_raw("refresh_hw_device [lindex [get_hw_devices] 0]");
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn placement_writes_reports() {
        let mut tcl = Tcl::new(TCL_FILE);
        implement(&mut tcl);
        assert_eq!(tcl.as_str().contains("post_place_util.rpt"), true);
        assert_eq!(tcl.as_str().contains("post_place_timing_summary.rpt"), true);
    }

    #[test]
    fn routing_writes_drc_report() {
        let mut tcl = Tcl::new(TCL_FILE);
        route(&mut tcl);
        assert_eq!(tcl.as_str().contains("post_impl_drc.rpt"), true);
    }

    #[test]
    fn programming_refreshes_device_without_probes() {
        let mut tcl = Tcl::new(TCL_FILE);
        program_device(&mut tcl, "top.bit");
        assert_eq!(
            tcl.as_str().contains(
                "\"refresh_hw_device\" \"-update_hw_probes\" \"false\" $device"
            ),
            true
        );
        // programming still happens after the refresh
        let refresh = tcl.as_str().find("-update_hw_probes").unwrap();
        let program = tcl.as_str().find("program_hw_devices").unwrap();
        assert_eq!(refresh < program, true);
    }
}

const HELP: &str = r#"Run the vivado backend flow in non-project batch mode.

Usage:
    voodoo [options] --part <name> --run <step>

Options:
    --run, -r <step>            flow step to stop at: synth, impl, route, bit, pgm
    --part <name>               targeted fpga part number
    --generic, -g <key=value>...  override top-level generics
    --no-bat                    do not use the .bat executable on windows
"#;
