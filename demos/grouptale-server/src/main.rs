//! Standalone Grouptale server.
//!
//! Configuration comes from the environment, with `--flag value`
//! overrides on the command line. Stops cleanly on Ctrl-C.

use std::path::PathBuf;
use std::time::Duration;

use grouptale::prelude::*;

fn usage_and_exit() -> ! {
    eprintln!(
        "grouptale-server\n\n\
USAGE:\n  grouptale-server [--bind HOST:PORT] [--round-secs N] [--default-pack ID] [--root-node ID]\n                   [--tie-break first_voted|lexicographic] [--reap-grace-secs N] [--pet-state-dir PATH]\n\n\
ENV:\n  BIND             default 127.0.0.1:8080\n  ROUND_SECS       default 60\n  DEFAULT_PACK     default \"default\"\n  ROOT_NODE        default \"root\"\n  TIE_BREAK        default first_voted\n  REAP_GRACE_SECS  default 600, 0 keeps rooms forever\n  PET_STATE_DIR    optional; pet state is memory-only without it\n  RUST_LOG         default info,tower_http=info\n"
    );
    std::process::exit(2);
}

#[derive(Debug)]
struct Config {
    bind: String,
    rooms: RoomConfig,
    pet_state_dir: Option<PathBuf>,
}

fn parse_secs(v: &str) -> Duration {
    Duration::from_secs(v.parse().unwrap_or_else(|_| usage_and_exit()))
}

fn reap_grace(v: &str) -> Option<Duration> {
    Some(parse_secs(v)).filter(|d| !d.is_zero())
}

fn parse_args() -> Config {
    let mut rooms = RoomConfig::default();

    let mut bind =
        std::env::var("BIND").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    if let Ok(v) = std::env::var("ROUND_SECS") {
        rooms.round_duration = parse_secs(&v);
    }
    if let Ok(v) = std::env::var("DEFAULT_PACK") {
        rooms.default_pack_id = PackId::from(v);
    }
    if let Ok(v) = std::env::var("ROOT_NODE") {
        rooms.root_node = NodeId::from(v);
    }
    if let Ok(v) = std::env::var("TIE_BREAK") {
        rooms.tie_break = v.parse().unwrap_or_else(|_| usage_and_exit());
    }
    if let Ok(v) = std::env::var("REAP_GRACE_SECS") {
        rooms.reap_grace = reap_grace(&v);
    }
    let mut pet_state_dir: Option<PathBuf> =
        std::env::var("PET_STATE_DIR").ok().map(Into::into);

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        let mut value = || it.next().unwrap_or_else(|| usage_and_exit());
        match arg.as_str() {
            "--bind" => bind = value(),
            "--round-secs" => rooms.round_duration = parse_secs(&value()),
            "--default-pack" => rooms.default_pack_id = PackId::from(value()),
            "--root-node" => rooms.root_node = NodeId::from(value()),
            "--tie-break" => {
                rooms.tie_break =
                    value().parse().unwrap_or_else(|_| usage_and_exit());
            }
            "--reap-grace-secs" => rooms.reap_grace = reap_grace(&value()),
            "--pet-state-dir" => pet_state_dir = Some(value().into()),
            _ => usage_and_exit(),
        }
    }

    if rooms.round_duration.is_zero() {
        usage_and_exit();
    }

    Config {
        bind,
        rooms,
        pet_state_dir,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cfg = parse_args();

    tracing::info!(
        bind = %cfg.bind,
        round_secs = cfg.rooms.round_duration.as_secs(),
        tie_break = %cfg.rooms.tie_break,
        reap_grace_secs = cfg.rooms.reap_grace.map(|d| d.as_secs()),
        "starting grouptale-server"
    );

    let mut builder = GrouptaleServer::builder()
        .bind(&cfg.bind)
        .room_config(cfg.rooms);
    if let Some(dir) = cfg.pet_state_dir {
        builder = builder.pet_state_dir(dir);
    }
    let server = builder.build().await?;

    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await?;
    Ok(())
}
