use std::io::{self, BufRead};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use crossbeam_channel::{select, tick, unbounded};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use remu_player::page::{Command, PageShell, HELP};

const TICK_INTERVAL: Duration = Duration::from_millis(250);

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("remu_player=info".parse()?))
        .with_writer(io::stderr)
        .init();

    let mut page = PageShell::native();
    print!("{}", page.render());
    print!("{HELP}");

    // the reader thread only forwards lines, widgets are touched from this loop alone
    let (line_tx, lines) = unbounded::<String>();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line_tx.send(line).is_err() {
                break;
            }
        }
    });

    let ticker = tick(TICK_INTERVAL);
    loop {
        select! {
            recv(ticker) -> _ => {
                let out = page.tick();
                if !out.is_empty() {
                    print!("{out}");
                }
            }
            recv(lines) -> line => {
                let Ok(line) = line else {
                    debug!("stdin closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(Command::Quit) => break,
                    Ok(command) => print!("{}", page.execute(command)),
                    Err(error) => println!("{error}"),
                }
            }
        }
    }

    info!("shutting down");
    Ok(())
}
