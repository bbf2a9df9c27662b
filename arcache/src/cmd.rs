// Copyright 2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use anyhow::{Context, Error};
use arcache::cache::DiskCache;
use arcache::fetch::normalize_key;
use bytesize::ByteSize;
use clap::ArgAction::SetTrue;
use clap::{arg, Arg, ArgMatches, Command};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

pub(crate) fn stats_cmd() -> Command {
    Command::new("stats")
        .about("Show the number of cached entries and their size")
        .arg(
            Arg::new("json")
                .long("json")
                .action(SetTrue)
                .help("Print the statistics as JSON")
                .required(false),
        )
}

pub(crate) fn get_cmd() -> Command {
    Command::new("get")
        .about("Print a cached payload or save it to a file")
        .arg(arg!(<URL> "The URL the payload was downloaded from").required(true))
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Write the payload to FILE instead of stdout")
                .required(false),
        )
}

pub(crate) fn put_cmd() -> Command {
    Command::new("put")
        .about("Cache the content of a file under a URL")
        .arg(arg!(<URL> "The URL to cache the payload for").required(true))
        .arg(
            arg!(<FILE> "The file with the payload")
                .value_parser(clap::value_parser!(PathBuf))
                .required(true),
        )
}

pub(crate) fn prune_cmd() -> Command {
    Command::new("prune").about("Evict entries exceeding the configured limits")
}

pub(crate) fn clear_cmd() -> Command {
    Command::new("clear").about("Remove all cached entries")
}

pub(crate) fn stats(
    cache: &DiskCache,
    args: &ArgMatches,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let stats = cache.stats()?;
    if args.get_flag("json") {
        writeln!(out, "{}", serde_json::to_string_pretty(&stats)?)?;
    } else {
        writeln!(out, "Directory: {}", stats.directory.display())?;
        writeln!(out, "Entries:   {}", stats.entries)?;
        writeln!(out, "Size:      {}", ByteSize(stats.total_size))?;
    }
    Ok(())
}

pub(crate) fn get(
    cache: &DiskCache,
    args: &ArgMatches,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let url = args.get_one::<String>("URL").unwrap();
    let payload = cache
        .get(&normalize_key(url))?
        .ok_or_else(|| Error::msg(format!("'{}' is not cached", url)))?;

    match args.get_one::<PathBuf>("output") {
        Some(path) => {
            fs::write(path, &payload).with_context(|| format!("Failed to write {:?}", path))?;
        }
        None => out.write_all(&payload)?,
    }
    Ok(())
}

pub(crate) fn put(
    cache: &DiskCache,
    args: &ArgMatches,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let url = args.get_one::<String>("URL").unwrap();
    let path = args.get_one::<PathBuf>("FILE").unwrap();
    let payload = fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;

    if !cache.put(&normalize_key(url), &payload)? {
        return Err(Error::msg(format!("Failed to cache '{}'", url)));
    }
    writeln!(out, "Cached {} ({})", url, ByteSize(payload.len() as u64))?;
    Ok(())
}

pub(crate) fn prune(cache: &DiskCache, out: &mut impl Write) -> anyhow::Result<()> {
    let evicted = cache.enforce_limits()?;
    writeln!(out, "Evicted {} entries", evicted)?;
    Ok(())
}

pub(crate) fn clear(cache: &DiskCache, out: &mut impl Write) -> anyhow::Result<()> {
    let entries = cache.stats()?.entries;
    cache.clear()?;
    writeln!(out, "Removed {} entries", entries)?;
    Ok(())
}
