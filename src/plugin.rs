//! CNI plugin dispatch: read the invocation from the environment and stdin,
//! call the matching [`Plugin`] method and report failures the way the
//! container runtime expects them.
use std::fmt;
use std::io::{self, Read, Write};

use serde::Serializer;

use crate::error::{ChainedError, ChainedResult, ErrorCode, ErrorWrap};
use crate::logging::PluginLogger;
use crate::version::{self, SUPPORTED_VERSIONS};
use crate::wrap;

/// The CNI environment of a single invocation.
#[derive(clap::Args, Clone, Debug, Default)]
pub struct CniEnv {
    /// CNI command: ADD, CHECK, DEL, GC, STATUS or VERSION.
    #[clap(long = "cni-command", env = "CNI_COMMAND")]
    pub command: Option<String>,
    /// Container ID
    #[clap(long = "cni-containerid", env = "CNI_CONTAINERID")]
    pub container_id: Option<String>,
    /// Path to the network namespace of the container.
    #[clap(long = "cni-netns", env = "CNI_NETNS")]
    pub netns: Option<String>,
    /// Interface name inside the container.
    #[clap(long = "cni-ifname", env = "CNI_IFNAME")]
    pub ifname: Option<String>,
    /// Extra plugin arguments, KEY=VALUE pairs separated by semicolons.
    #[clap(long = "cni-args", env = "CNI_ARGS")]
    pub args: Option<String>,
    /// Plugin search path.
    #[clap(long = "cni-path", env = "CNI_PATH")]
    pub path: Option<String>,
}

/// Arguments handed to the plugin for one command.
#[derive(Clone, Debug, Default, Serialize)]
pub struct CmdArgs {
    #[serde(rename = "containerID")]
    pub container_id: String,
    #[serde(rename = "netns")]
    pub netns: String,
    #[serde(rename = "ifName")]
    pub ifname: String,
    #[serde(rename = "args")]
    pub args: String,
    #[serde(rename = "path")]
    pub path: String,
    /// Raw network configuration read from stdin.
    #[serde(rename = "stdinData", serialize_with = "serialize_lossy")]
    pub stdin_data: Vec<u8>,
}

fn serialize_lossy<S: Serializer>(data: &[u8], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&String::from_utf8_lossy(data))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Add,
    Check,
    Del,
    Gc,
    Status,
    Version,
}

impl Command {
    pub fn parse(cmd: &str) -> ChainedResult<Command> {
        match cmd {
            "ADD" => Ok(Command::Add),
            "CHECK" => Ok(Command::Check),
            "DEL" => Ok(Command::Del),
            "GC" => Ok(Command::Gc),
            "STATUS" => Ok(Command::Status),
            "VERSION" => Ok(Command::Version),
            unknown => Err(ChainedError::code_msg(
                ErrorCode::InvalidEnvironmentVariables,
                format!("unknown CNI_COMMAND: {}", unknown),
            )),
        }
    }

    /// Oldest config version that may use this command.
    fn min_version(&self) -> Option<&'static str> {
        match self {
            Command::Check => Some("0.4.0"),
            Command::Gc | Command::Status => Some("1.1.0"),
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::Add => "ADD",
            Command::Check => "CHECK",
            Command::Del => "DEL",
            Command::Gc => "GC",
            Command::Status => "STATUS",
            Command::Version => "VERSION",
        };
        f.write_str(name)
    }
}

/// Define the plugin functions
pub trait Plugin {
    /// attach the container, the plugin must write a result to `out`
    fn add(&self, args: &CmdArgs, out: &mut dyn Write) -> ChainedResult<()>;
    /// detach the container
    fn del(&self, args: &CmdArgs) -> ChainedResult<()>;

    fn check(&self, _args: &CmdArgs) -> ChainedResult<()> {
        Ok(())
    }

    fn gc(&self, _args: &CmdArgs) -> ChainedResult<()> {
        Ok(())
    }

    fn status(&self, _args: &CmdArgs) -> ChainedResult<()> {
        Ok(())
    }
}

pub struct PluginExec<P: Plugin> {
    plugin: P,
    about: String,
    log: PluginLogger,
}

impl<P: Plugin> PluginExec<P> {
    pub fn new(plugin: P, about: String, log: PluginLogger) -> Self {
        PluginExec { plugin, about, log }
    }

    /// Run the command for the process environment and exit with an error
    /// code on failure.
    pub fn exec(&self, env: &CniEnv) {
        let result = self.run(
            env,
            &mut io::stdin().lock(),
            &mut io::stdout().lock(),
            &mut io::stderr().lock(),
        );

        if let Err(err) = result {
            self.fail(&err);
            self.log.flush();
            std::process::exit(err.get_exit_code());
        }
        self.log.flush();
    }

    fn fail(&self, err: &ChainedError) {
        self.log.error(format_args!("plugin failed: {}", err));
        err.print_json(&mut io::stdout())
            .unwrap_or_else(|e| eprintln!("failed to write json error: {}: {}", e, err));
        eprintln!("{}", err);
    }

    /// Dispatch a single invocation. Only the VERSION command skips reading
    /// stdin, every other command reads it fully before the plugin is called.
    pub fn run(
        &self,
        env: &CniEnv,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> ChainedResult<()> {
        let command = match env.command.as_deref() {
            None | Some("") => return self.print_about(stderr),
            Some(cmd) => Command::parse(cmd)?,
        };

        if command == Command::Version {
            return wrap!(version::write_plugin_info(stdout), "failed to write version info");
        }

        let mut args = cmd_args(env, command)?;
        wrap!(stdin.read_to_end(&mut args.stdin_data), "failed to read stdin")?;

        self.check_version(command, &args.stdin_data)?;

        match command {
            Command::Add => self.plugin.add(&args, stdout),
            Command::Check => self.plugin.check(&args),
            Command::Del => self.plugin.del(&args),
            Command::Gc => self.plugin.gc(&args),
            Command::Status => self.plugin.status(&args),
            Command::Version => Ok(()),
        }
        .wrap(format!("{} failed", command))
    }

    fn print_about(&self, stderr: &mut dyn Write) -> ChainedResult<()> {
        if !self.about.is_empty() {
            writeln!(stderr, "{}", self.about)?;
        }
        writeln!(
            stderr,
            "CNI protocol versions supported: {}",
            SUPPORTED_VERSIONS.join(", ")
        )?;
        Ok(())
    }

    /// Reject configs with a version this plugin or the command does not
    /// support. A config that is not a json object is left for the plugin
    /// to deal with.
    fn check_version(&self, command: Command, data: &[u8]) -> ChainedResult<()> {
        let config_version = match version::config_version(data) {
            Some(v) => v,
            None => {
                self.log.debug(format_args!(
                    "could not read cniVersion from stdin, skipping version check"
                ));
                return Ok(());
            }
        };

        if !version::is_supported(&config_version) {
            return Err(ChainedError::code_msg(
                ErrorCode::IncompatibleCniVersion,
                format!(
                    "incompatible CNI versions; config is {:?}, plugin supports {:?}",
                    config_version, SUPPORTED_VERSIONS
                ),
            ));
        }

        if let Some(min) = command.min_version() {
            if !version::greater_than_or_equal_to(&config_version, min)? {
                return Err(ChainedError::code_msg(
                    ErrorCode::IncompatibleCniVersion,
                    format!("config version does not allow {}", command),
                ));
            }
        }
        Ok(())
    }
}

/// Build the command arguments from the environment, all variables the
/// command needs must be set and not empty.
fn cmd_args(env: &CniEnv, command: Command) -> ChainedResult<CmdArgs> {
    use Command::*;

    let attach = matches!(command, Add | Check | Del);
    let required = [
        ("CNI_CONTAINERID", &env.container_id, attach),
        ("CNI_NETNS", &env.netns, matches!(command, Add | Check)),
        ("CNI_IFNAME", &env.ifname, attach),
        ("CNI_PATH", &env.path, true),
    ];

    let missing: Vec<&str> = required
        .iter()
        .filter(|(_, value, needed)| *needed && value.as_deref().unwrap_or_default().is_empty())
        .map(|(name, _, _)| *name)
        .collect();
    if !missing.is_empty() {
        return Err(ChainedError::code_msg(
            ErrorCode::InvalidEnvironmentVariables,
            format!("required env variables [{}] missing", missing.join(",")),
        ));
    }

    let value = |v: &Option<String>| v.clone().unwrap_or_default();
    Ok(CmdArgs {
        container_id: value(&env.container_id),
        netns: value(&env.netns),
        ifname: value(&env.ifname),
        args: value(&env.args),
        path: value(&env.path),
        stdin_data: Vec::new(),
    })
}
