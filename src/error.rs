use colored::Colorize;
use std::fmt::Display;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("environment variable {0:?} does not exist")]
    EnvVarNotSet(String),
    #[error("blueprint rule on line {0} does not have 3 tab-separated fields")]
    BlueprintBadRule(usize),
    #[error("generic {0:?} is missing a value{1}")]
    GenericMissingValue(String, Hint),
    #[error("cannot proceed any further without a testbench{0}")]
    TestbenchNotSet(Hint),
    #[error("no testbench specified to continue past compilation for top-level unit {0:?}")]
    TestbenchNotSetForTop(String),
    #[error("board file {0:?} is not found in blueprint")]
    BoardNotInBlueprint(String),
    #[error("fpga {0:?} must be specified in the board file's `[part]` table")]
    BoardMissingPartField(String),
    #[error("bitstream file {0:?} does not exist{1}")]
    BitstreamNotFound(String, Hint),
    #[error("no waveform database file {0:?} exists{1}")]
    WaveformDbNotFound(String, Hint),
    #[error("failed to detect a programming cable: {0}")]
    CableDetectFailed(String),
    #[error("simulation reported {0} errors and {1} failures")]
    SimFailed(usize, usize),
    #[error("command not found: {0:?}")]
    CommandNotFound(String),
    #[error("exited with error code: {0}")]
    ChildProcErrorCode(i32),
    #[error("terminated by signal")]
    ChildProcTerminated,
}

impl Error {
    pub fn lowerize(s: String) -> String {
        // get the first word
        let first_word = s.split_whitespace().into_iter().next().unwrap();
        // retain punctuation if the first word is all-caps and longer than 1 character
        if first_word.len() > 1
            && first_word
                .chars()
                .find(|c| c.is_ascii_lowercase() == true)
                .is_none()
        {
            s.to_string()
        } else {
            s.char_indices()
                .map(|(i, c)| if i == 0 { c.to_ascii_lowercase() } else { c })
                .collect()
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum Hint {
    LintGate,
    GenericSyntax,
    BitstreamFlow,
    SimulateFirst,
}

impl Display for Hint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            Self::LintGate => {
                "stop here using \"--lint\" to exit safely or set a testbench to run a simulation"
            }
            Self::GenericSyntax => "generics take the form <key>=<value>",
            Self::BitstreamFlow => "generate a bitstream with \"--bit\" before programming",
            Self::SimulateFirst => "run a simulation with \"--simulate cl\" to produce one",
        };
        write!(
            f,
            "\n\n{}: {}",
            "hint".green(),
            Error::lowerize(message.to_string())
        )
    }
}
