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

//! Target: `vsim`
//!
//! Runs verilog simulations with verilator.
//!
//! Reference: <https://verilator.org/guide/latest/>

use cliproc::{cli, proc, stage::Memory};
use cliproc::{Arg, Cli, ExitCode, Help};
use std::env;

use orbit_targets::core::blueprint::Blueprint;
use orbit_targets::core::generic::Generic;
use orbit_targets::error::{Error, Hint};
use orbit_targets::util::command::Command;
use orbit_targets::util::environment;
use orbit_targets::util::environment::quote_str;

fn main() -> ExitCode {
    Cli::default().parse(env::args()).go::<Vsim>()
}

#[derive(Debug, PartialEq)]
struct Vsim {
    lint: bool,
    strict: bool,
    generics: Vec<Generic>,
}

impl cliproc::Command for Vsim {
    fn interpret(cli: &mut Cli<Memory>) -> cli::Result<Self> {
        cli.help(Help::with(HELP))?;
        Ok(Vsim {
            // Flags
            lint: cli.check(Arg::flag("lint"))?,
            strict: cli.check(Arg::flag("strict"))?,
            // Options
            generics: cli
                .get_all(Arg::option("generic").switch('g').value("key=value"))?
                .unwrap_or(Vec::new()),
        })
    }

    fn execute(self) -> proc::Result {
        let tb_name = environment::read(environment::ORBIT_TB_NAME);

        // only the verilog-family filesets matter to verilator
        let rtl_order: Vec<_> = Blueprint::from_env()?
            .into_rules()
            .into_iter()
            .filter(|r| r.is_vlog() == true || r.is_sysv() == true)
            .collect();

        println!("info: analyzing source code ...");
        for rule in &rtl_order {
            println!("  -> {}", quote_str(rule.get_path()));
        }

        let mut veri_opts: Vec<String> = Vec::new();
        if self.strict == true {
            veri_opts.push(String::from("-Wall"));
        }

        // halt the workflow here when only providing lint
        if self.lint == true {
            Command::new("verilator")
                .arg("--lint-only")
                .args(&veri_opts)
                .args(self.generics.iter().map(|g| g.to_parameter_flag()))
                .args(rtl_order.iter().map(|r| r.get_path()))
                .spawn(false)?;
            println!("info: static analysis complete");
            return Ok(());
        }

        let tb_name = match tb_name {
            Some(tb) => tb,
            None => return Err(Error::TestbenchNotSet(Hint::LintGate))?,
        };

        // verilate and compile a self-contained simulation binary
        println!(
            "info: building simulation model for testbench {} ...",
            quote_str(&tb_name)
        );
        Command::new("verilator")
            .arg("--binary")
            .args(&veri_opts)
            .args(["--top-module", tb_name.as_str()])
            .args(self.generics.iter().map(|g| g.to_parameter_flag()))
            .args(rtl_order.iter().map(|r| r.get_path()))
            .spawn(false)?;

        println!(
            "info: entering simulation for testbench {} ...",
            quote_str(&tb_name)
        );
        Command::new(&format!("obj_dir/V{}", tb_name)).spawn(false)?;
        println!("info: simulation complete");
        Ok(())
    }
}

const HELP: &str = r#"Run verilog simulations with verilator.

Usage:
    vsim [options]

Options:
    --lint                      run static analysis and exit
    --strict                    enable all warnings
    --generic, -g <key=value>...  override top-level verilog parameters
"#;
