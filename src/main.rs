//! Minimal CFDP entity daemon.
//!
//! Usage: `cfdpd <entity-id> [peer-id]`. The entity id must be non-zero;
//! when a peer id is given, one put request is queued toward that peer at
//! startup. Runs until ctrl-c, then shuts down sessions before the
//! inbound worker.

use std::process::ExitCode;

use cfdp_engine::entity::{EntityConfig, EntityContext};
use cfdp_engine::mib::TransmissionMode;

fn parse_id(arg: Option<String>) -> Option<u32> {
    arg.and_then(|value| value.parse::<u32>().ok())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let Some(entity_id) = parse_id(args.next()).filter(|id| *id != 0) else {
        eprintln!("usage: cfdpd <entity-id> [peer-id]");
        eprintln!("can't start entity, please select a non-zero id");
        return ExitCode::FAILURE;
    };

    let context = match EntityContext::init(EntityConfig::new(entity_id)).await {
        Ok(context) => context,
        Err(e) => {
            eprintln!("can't start entity {entity_id}: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(peer_id) = parse_id(args.next()) {
        if let Err(e) = context
            .put(
                peer_id,
                "pic.jpeg",
                "remote_pic1.jpeg",
                TransmissionMode::Acknowledged,
            )
            .await
        {
            eprintln!("put request toward {peer_id} failed: {e}");
        }
    }

    if tokio::signal::ctrl_c().await.is_err() {
        eprintln!("failed to listen for ctrl-c, shutting down");
    }
    context.shutdown().await;
    ExitCode::SUCCESS
}
