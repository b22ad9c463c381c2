//! POS Ledger CLI
//!
//! Interactive cashier, inventory and admin menus over a pair of flat
//! ledger files.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- [data-dir]
//! ```
//!
//! `inventory.txt` and `sales_history.txt` are read from and written to
//! `data-dir` (default: the current directory).
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity

use pos_ledger::{App, Console, LedgerFiles, Result, Store};
use std::env;
use std::io;
use std::process;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let data_dir = env::args().nth(1).unwrap_or_else(|| ".".to_string());
    // Dropped lines are already logged at warn level by the loader.
    let (store, _) = Store::open(LedgerFiles::in_dir(&data_dir))?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let console = Console::new(stdin.lock(), stdout.lock());

    App::new(store, console).run()
}
