// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Cooperative cancellation.
//!
//! An [`Interrupt`] is a shared flag. Whoever wants ingest to stop raises it;
//! the merge engine polls it between every blocking pull.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_utils::atomic::AtomicCell;
use log::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicCell<bool>>);

impl Interrupt {
    pub fn new() -> Interrupt {
        Interrupt::default()
    }

    pub fn raise(&self) {
        self.0.store(true);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load()
    }
}

/// Raise `interrupt` when the process receives SIGINT or SIGTERM. The
/// signals are awaited on their own thread, so the caller's thread stays
/// synchronous.
pub fn install_signal_handler(interrupt: Interrupt) -> std::io::Result<JoinHandle<()>> {
    // Build the runtime here so that failures are reported to the caller.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            runtime.block_on(async move {
                #[cfg(unix)]
                {
                    use tokio::signal::unix::{signal, SignalKind};

                    let mut sigterm = match signal(SignalKind::terminate()) {
                        Ok(s) => s,
                        Err(e) => {
                            warn!("Couldn't register a SIGTERM handler: {e}");
                            return;
                        }
                    };
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {
                            info!("SIGINT received, stopping ingest");
                        }
                        _ = sigterm.recv() => {
                            info!("SIGTERM received, stopping ingest");
                        }
                    }
                }

                #[cfg(not(unix))]
                {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        warn!("Couldn't listen for ctrl-c: {e}");
                        return;
                    }
                    info!("ctrl-c received, stopping ingest");
                }

                interrupt.raise();
            })
        })
}
