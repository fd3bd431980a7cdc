//! Guest-side agent fetching instance configuration published through
//! the VMware guestinfo key-value store.

mod cli;
mod errors;
mod guestinfo;
mod host_info;

use anyhow::Result;
use slog::Drain;

fn main() -> Result<()> {
    // Setup logging.
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let log = slog::Logger::root(drain, slog::o!());
    let _guard = slog_scope::set_global_logger(log);

    let cfg = cli::parse_args(std::env::args())?;
    cfg.run()
}
