use clap::Parser;
use fpsearch::cli::SubCommandExtend;
use fpsearch::config::{Opts, SubCommand};

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let opts = Opts::parse();
    match &opts.subcmd {
        SubCommand::Cache(cmd) => cmd.run(&opts),
        SubCommand::Search(cmd) => cmd.run(&opts),
        SubCommand::Evaluate(cmd) => cmd.run(&opts),
    }
}
