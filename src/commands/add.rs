//! Handles ADD: log the previous result and pass stdin through unchanged.
use std::fmt;
use std::io::{self, Write};

use super::{ChainedPlugin, Diagnostic};
use crate::error::ChainedError;
use crate::logging::to_json;
use crate::plugin::CmdArgs;
use crate::types::NetConf;
use crate::version;

/// Error from normalizing prevResult. Converting a parsed result to the
/// current version cannot fail, so only the first two stages have one.
#[derive(Debug)]
pub enum PrevResultError {
    Serialize(serde_json::Error),
    Parse(ChainedError),
}

impl fmt::Display for PrevResultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrevResultError::Serialize(e) => write!(f, "could not serialize prevResult: {}", e),
            PrevResultError::Parse(e) => write!(f, "could not parse prevResult: {}", e),
        }
    }
}

impl std::error::Error for PrevResultError {}

/// Parse the raw prevResult of `conf` with the config's cniVersion and store
/// it as a current version result in `conf.prev_result`. Nothing happens
/// when there is no prevResult.
pub fn parse_prev_result(conf: &mut NetConf) -> Result<(), PrevResultError> {
    let raw = match conf.raw_prev_result() {
        Some(raw) => raw,
        None => return Ok(()),
    };

    let data = serde_json::to_vec(raw).map_err(PrevResultError::Serialize)?;
    let res = version::new_result(&conf.cni_version, &data).map_err(PrevResultError::Parse)?;
    conf.prev_result = Some(res.into_current());
    Ok(())
}

/// Everything that happened during ADD. Only `output` decides whether the
/// command failed.
#[derive(Debug)]
pub struct AddReport {
    /// The decoded configuration with prev_result filled in when possible
    pub conf: NetConf,
    pub diagnostics: Vec<Diagnostic>,
    /// Result of writing stdin back to stdout
    pub output: io::Result<()>,
}

impl ChainedPlugin {
    /// Run ADD. Each step is attempted regardless of earlier failures, the
    /// failures are logged and collected in the report.
    pub fn pass_through(&self, args: &CmdArgs, out: &mut dyn Write) -> AddReport {
        let mut diagnostics = Vec::new();

        let (mut conf, decode_err) = NetConf::from_slice_lossy(&args.stdin_data);
        if let Some(err) = decode_err {
            self.report(&mut diagnostics, Diagnostic::Decode(err));
        }

        self.log
            .info(format_args!("cmdAdd with args {}", to_json(args)));

        if let Err(err) = parse_prev_result(&mut conf) {
            self.report(&mut diagnostics, Diagnostic::PrevResult(err));
        }

        match &conf.prev_result {
            Some(res) => {
                let res = to_json(res);
                self.log.info(format_args!("CNI previous result {}", res));
                self.log.info(format_args!("result returning {}", res));
            }
            None => self
                .log
                .debug(format_args!("no previous result, returning input as is")),
        }

        // The input already is a valid result for the next plugin, so it is
        // returned verbatim instead of the converted result.
        let output = out.write_all(&args.stdin_data).and_then(|_| out.flush());
        if let Err(err) = &output {
            self.log
                .error(format_args!("failed to write result: {}", err));
        }

        AddReport {
            conf,
            diagnostics,
            output,
        }
    }

    fn report(&self, diagnostics: &mut Vec<Diagnostic>, diag: Diagnostic) {
        self.log.error(format_args!("{}", diag));
        diagnostics.push(diag);
    }
}
