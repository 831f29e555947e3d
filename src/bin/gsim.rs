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

//! Target: `gsim`
//!
//! Analyzes and simulates a vhdl design with ghdl. Works with the ghdl
//! mcode backend.
//!
//! Reference: <https://github.com/ghdl/ghdl>

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
    Cli::default().parse(env::args()).go::<Gsim>()
}

#[derive(Debug, PartialEq)]
struct Gsim {
    lint: bool,
    relax: bool,
    std: String,
    exit_on: String,
    generics: Vec<Generic>,
}

impl cliproc::Command for Gsim {
    fn interpret(cli: &mut Cli<Memory>) -> cli::Result<Self> {
        cli.help(Help::with(HELP))?;
        Ok(Gsim {
            // Flags
            lint: cli.check(Arg::flag("lint"))?,
            relax: cli.check(Arg::flag("relax"))?,
            // Options
            std: cli
                .get(Arg::option("std").value("edition"))?
                .unwrap_or(String::from("93")),
            exit_on: cli
                .get(Arg::option("exit-on").value("level"))?
                .unwrap_or(String::from("error")),
            generics: cli
                .get_all(Arg::option("generic").switch('g').value("key=value"))?
                .unwrap_or(Vec::new()),
        })
    }

    fn execute(self) -> proc::Result {
        // make the ghdl binary visible if a vendor path is configured
        environment::add_path(&environment::read(environment::ORBIT_ENV_GHDL_PATH));

        let tb_name = environment::read(environment::ORBIT_TB_NAME);
        let library = environment::require(environment::ORBIT_IP_LIBRARY)?;

        let blueprint = Blueprint::from_env()?;

        let mut ghdl_opts = vec![
            String::from("--ieee=synopsys"),
            String::from("--syn-binding"),
            format!("--std={}", self.std),
        ];
        if self.relax == true {
            ghdl_opts.push(String::from("-frelaxed"));
        }

        // analyze units in blueprint order
        println!("info: analyzing hdl source code ...");
        for rule in blueprint.rules().filter(|r| r.is_vhdl()) {
            println!("  -> {}", quote_str(rule.get_path()));
            Command::new("ghdl")
                .arg("-a")
                .args(&ghdl_opts)
                .arg(format!("--work={}", rule.get_library()))
                .arg(rule.get_path())
                .spawn(false)?;
        }

        // halt the workflow here when only providing lint
        if self.lint == true {
            println!("info: static analysis complete");
            return Ok(());
        }

        let tb_name = match tb_name {
            Some(tb) => tb,
            None => return Err(Error::TestbenchNotSet(Hint::LintGate))?,
        };

        let vcd_file = format!("{}.vcd", tb_name);

        println!(
            "info: entering simulation for testbench {} ...",
            quote_str(&tb_name)
        );
        let status = Command::new("ghdl")
            .arg("-r")
            .args(&ghdl_opts)
            .arg(format!("--work={}", library))
            .arg(&tb_name)
            .arg(format!("--vcd={}", vcd_file))
            .arg(format!("--assert-level={}", self.exit_on))
            .args(self.generics.iter().map(|g| g.to_simulator_flag()))
            .spawn(false);

        // tell the user where the waveform dump landed before propagating
        println!("info: simulation complete");
        if let (Some(man_dir), Some(target_dir), Some(out_dir)) = (
            environment::read(environment::ORBIT_MANIFEST_DIR),
            environment::read(environment::ORBIT_TARGET_DIR),
            environment::read(environment::ORBIT_OUT_DIR),
        ) {
            println!(
                "info: vcd available at: {}",
                quote_str(&format!(
                    "{}/{}/{}/{}",
                    man_dir, target_dir, out_dir, vcd_file
                ))
            );
        }
        status
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use cliproc::Command as _;

    #[test]
    fn missing_testbench_is_fatal_before_any_tool_runs() {
        // an empty blueprint leaves nothing to analyze, so no process spawns
        let file = tempfile::NamedTempFile::new().unwrap();
        std::env::set_var(environment::ORBIT_BLUEPRINT, file.path());
        std::env::set_var(environment::ORBIT_IP_LIBRARY, "work");
        std::env::remove_var(environment::ORBIT_TB_NAME);

        let command = Gsim {
            lint: false,
            relax: false,
            std: String::from("93"),
            exit_on: String::from("error"),
            generics: Vec::new(),
        };
        let result = command.execute();
        assert_eq!(
            result.unwrap_err().to_string(),
            Error::TestbenchNotSet(Hint::LintGate).to_string()
        );
    }
}

const HELP: &str = r#"Analyze and simulate a vhdl design with ghdl.

Usage:
    gsim [options]

Options:
    --lint                      run static analysis and exit
    --generic, -g <key=value>...  override top-level vhdl generics
    --std <edition>             vhdl edition: 87, 93, 02, 08, 19 (default: 93)
    --relax                     enable relaxed semantic rules
    --exit-on <level>           severity level to exit on (default: error)
"#;
