use clap::Parser;

use chained_cni::commands::{self, ChainedPlugin};
use chained_cni::error::{ChainedError, ErrorCode};
use chained_cni::logging::{LogOpts, LOG_INIT_EXIT_CODE};
use chained_cni::plugin::{CniEnv, PluginExec};

#[derive(Parser, Debug)]
#[clap(version = env!("CARGO_PKG_VERSION"), about = "Chained CNI example")]
struct Opts {
    #[clap(flatten)]
    log: LogOpts,
    #[clap(flatten)]
    cni: CniEnv,
}

fn main() {
    let opts = match Opts::try_parse() {
        Ok(opts) => opts,
        // --help and --version
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => {
            let err = ChainedError::code_msg(
                ErrorCode::InvalidEnvironmentVariables,
                format!("invalid plugin arguments: {}", err.kind()),
            );
            err.print_json(&mut std::io::stdout())
                .unwrap_or_else(|e| eprintln!("failed to write json error: {}: {}", e, err));
            std::process::exit(err.get_exit_code());
        }
    };

    let log = match opts.log.init() {
        Ok(log) => log,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(LOG_INIT_EXIT_CODE);
        }
    };
    log.debug(format_args!("starting {}", commands::version::build_info()));

    let plugin = ChainedPlugin::new(log.clone());
    PluginExec::new(plugin, commands::version::about(), log).exec(&opts.cni);
}
