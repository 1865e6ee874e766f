// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! sat-discovery - run a discovery node from the command line
//!
//! Announces one service, registers interests and periodically prints the
//! nodes tracked so far. `SAT_DISCOVERY_*` environment variables override the
//! defaults; command-line flags override both.

use clap::Parser;
use colored::*;
use sat::discovery::{Discovery, DiscoveryConfig, Node};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Run a SAT discovery node
#[derive(Parser, Debug)]
#[command(name = "sat-discovery")]
#[command(version)]
#[command(about = "Announce a service over UDP multicast and watch discovered peers")]
struct Args {
    /// Service provided by this node
    #[arg(short, long, default_value = "sat-discovery")]
    service: String,

    /// Advertised service port (free-form, up to 6 characters)
    #[arg(short, long, default_value = "0")]
    port: String,

    /// Advertised address (default: primary IPv4 interface)
    #[arg(short, long)]
    address: Option<String>,

    /// Service to look for (repeatable)
    #[arg(short, long = "interest")]
    interests: Vec<String>,

    /// Track every announced service, not only interests
    #[arg(long)]
    all: bool,

    /// Multicast group
    #[arg(long)]
    group: Option<Ipv4Addr>,

    /// Multicast port
    #[arg(long)]
    group_port: Option<u16>,

    /// Interface to join the group on
    #[arg(long)]
    interface: Option<Ipv4Addr>,

    /// Node eviction timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Refresh interval in seconds
    #[arg(short = 'w', long, default_value = "2")]
    watch: u64,

    /// Exit after N seconds (0 = run until Ctrl+C)
    #[arg(long, default_value = "0")]
    duration: u64,

    /// Log level filter (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Quiet mode - compact output
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let args = Args::parse();

    let level = args.log_level.parse().unwrap_or(log::LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_millis()
        .init();

    if let Err(e) = run(&args) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn build_config(args: &Args) -> DiscoveryConfig {
    let mut config = DiscoveryConfig::new(args.service.as_str(), args.port.as_str()).from_env();
    if let Some(address) = &args.address {
        config = config.address(address.as_str());
    }
    if let Some(group) = args.group {
        config = config.multicast_group(group);
    }
    if let Some(port) = args.group_port {
        config = config.multicast_port(port);
    }
    if let Some(interface) = args.interface {
        config = config.interface(interface);
    }
    if let Some(ms) = args.timeout_ms {
        config = config.node_timeout(Duration::from_millis(ms));
    }
    if args.all {
        config = config.track_all_services(true);
    }
    config
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    let config = build_config(args);
    let group = config.multicast.group;
    let group_port = config.multicast.port;

    let mut discovery = Discovery::open(config)?;
    for interest in &args.interests {
        discovery.add_interest(interest)?;
    }
    discovery.start()?;

    if !args.quiet {
        eprintln!(
            "{} '{}' on {}:{} as {}",
            ">>>".green().bold(),
            discovery.service_name(),
            group,
            group_port,
            discovery.uuid().to_string().dimmed()
        );
        if !args.interests.is_empty() {
            eprintln!("    interests: {}", args.interests.join(", ").cyan());
        }
    }

    let started = Instant::now();
    let deadline = (args.duration > 0).then(|| Duration::from_secs(args.duration));
    let interval = Duration::from_secs(args.watch.max(1));
    let mut last_print = Instant::now();

    while running.load(Ordering::SeqCst) {
        if deadline.is_some_and(|d| started.elapsed() >= d) {
            break;
        }
        if last_print.elapsed() >= interval {
            print_nodes(&discovery, args.quiet);
            last_print = Instant::now();
        }
        std::thread::sleep(Duration::from_millis(100));
    }

    print_nodes(&discovery, args.quiet);
    discovery.stop()?;

    if !args.quiet {
        let stats = discovery.transport_metrics();
        eprintln!(
            "{} sent {} / received {} datagrams",
            "<<<".yellow().bold(),
            stats.packets_sent,
            stats.packets_received
        );
    }
    Ok(())
}

fn print_nodes(discovery: &Discovery, quiet: bool) {
    let nodes = discovery.nodes();
    if quiet {
        for node in &nodes {
            println!("{} {}:{}", node.service_name, node.address, node.port);
        }
        return;
    }

    println!("{} ({} nodes)", "Nodes".bold(), nodes.len());
    if nodes.is_empty() {
        println!("  {}", "none yet".dimmed());
        return;
    }
    for node in &nodes {
        print_node(node);
    }
}

fn print_node(node: &Node) {
    println!(
        "  {} {:>21}  {}  seen {} ms ago",
        format!("{:<24}", node.service_name).cyan(),
        format!("{}:{}", node.address, node.port),
        node.uuid.to_string().dimmed(),
        node.last_seen.elapsed().as_millis()
    );
}
