// Copyright 2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

mod cmd;

use crate::cmd::{clear_cmd, get_cmd, prune_cmd, put_cmd, stats_cmd};
use arcache::cache::DiskCache;
use arcache::cfg::Cfg;
use arcache::core::env::StdEnvGetter;
use arcache_base::logger::Logger;
use clap::{crate_description, crate_name, crate_version, Command};
use log::info;
use std::io::stdout;

fn cli() -> Command {
    Command::new(crate_name!())
        .version(crate_version!())
        .about(crate_description!())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(stats_cmd())
        .subcommand(get_cmd())
        .subcommand(put_cmd())
        .subcommand(prune_cmd())
        .subcommand(clear_cmd())
}

fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();

    Logger::init("INFO");
    let cfg = Cfg::from_env(StdEnvGetter::default());
    Logger::init(&cfg.log_level);
    info!("Configuration: \n {}", cfg);

    let cache = DiskCache::new(cfg.location(), cfg.settings.clone());
    cache.initialize();

    let mut out = stdout().lock();
    match matches.subcommand() {
        Some(("stats", args)) => cmd::stats(&cache, args, &mut out),
        Some(("get", args)) => cmd::get(&cache, args, &mut out),
        Some(("put", args)) => cmd::put(&cache, args, &mut out),
        Some(("prune", _)) => cmd::prune(&cache, &mut out),
        Some(("clear", _)) => cmd::clear(&cache, &mut out),
        _ => Ok(()),
    }
}
