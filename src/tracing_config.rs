//! Opt-in tracing for debugging a transform pass.
//!
//! Off by default; set `TDZ_LOG` (or `RUST_LOG`) to a filter to enable it:
//!
//! ```bash
//! # Flat lines
//! TDZ_LOG=debug tdz file.ts
//!
//! # Hierarchical tree via tracing-tree, easier to follow a deep walk
//! TDZ_LOG=tdz::walker=trace TDZ_LOG_FORMAT=tree tdz file.ts
//! ```
//!
//! All output goes to stderr so stdout stays the transformed source.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry};

/// `TDZ_LOG` takes precedence over `RUST_LOG` when both are set. Values use
/// the usual `RUST_LOG` syntax (e.g. `debug`, `tdz::binder=trace`).
fn build_filter() -> EnvFilter {
    if let Ok(val) = std::env::var("TDZ_LOG") {
        EnvFilter::builder().parse_lossy(val)
    } else {
        EnvFilter::from_default_env()
    }
}

/// Initialise the global tracing subscriber.
///
/// Does nothing when neither `TDZ_LOG` nor `RUST_LOG` is set, keeping
/// startup cost at zero for normal runs.
pub fn init_tracing() {
    if std::env::var("TDZ_LOG").is_err() && std::env::var("RUST_LOG").is_err() {
        return;
    }

    let filter = build_filter();
    let tree = std::env::var("TDZ_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("tree"))
        .unwrap_or(false);

    if tree {
        let tree_layer = tracing_tree::HierarchicalLayer::default()
            .with_indent_amount(2)
            .with_indent_lines(true)
            .with_targets(true);
        Registry::default().with(filter).with(tree_layer).init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
