use std::fmt;
use std::io::Write;

use crate::error::{ChainedError, ChainedResult, ErrorCode};
use crate::logging::PluginLogger;
use crate::plugin::{CmdArgs, Plugin};

pub mod add;
pub mod del;
pub mod version;

pub use add::{parse_prev_result, AddReport, PrevResultError};

/// The chained plugin. It never changes the network, it only inspects the
/// previous result and hands the configuration on unchanged.
#[derive(Clone, Debug)]
pub struct ChainedPlugin {
    log: PluginLogger,
}

impl ChainedPlugin {
    pub fn new(log: PluginLogger) -> Self {
        ChainedPlugin { log }
    }
}

/// A problem found while handling a command that must not fail the
/// command itself.
#[derive(Debug)]
pub enum Diagnostic {
    /// stdin could not be decoded as a network configuration
    Decode(ChainedError),
    /// prevResult could not be turned into the current result version
    PrevResult(PrevResultError),
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Decode(e) => write!(f, "failed to decode network configuration: {}", e),
            Diagnostic::PrevResult(e) => write!(f, "failed to parse previous result: {}", e),
        }
    }
}

impl Plugin for ChainedPlugin {
    fn add(&self, args: &CmdArgs, out: &mut dyn Write) -> ChainedResult<()> {
        let report = self.pass_through(args, out);
        report.output.map_err(|e| {
            ChainedError::code_msg(
                ErrorCode::IoFailure,
                format!("failed to write result: {}", e),
            )
        })
    }

    fn del(&self, args: &CmdArgs) -> ChainedResult<()> {
        self.cmd_del(args);
        Ok(())
    }
}
