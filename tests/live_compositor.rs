// Integration test: ensure a live compositor accepts the client session and
// drives the configure/redraw handshake.

#![cfg(feature = "live-tests")]

use anyhow::Result;
use tessera::{Session, TesseraConfig};

#[test]
fn test_live_session_establish_and_first_configure() -> Result<()> {
    let _ = env_logger::try_init();

    if std::env::var_os("WAYLAND_DISPLAY").is_none() {
        eprintln!("skipping: WAYLAND_DISPLAY not set");
        return Ok(());
    }

    let config = TesseraConfig::default();
    let mut session = Session::establish(&config)?;

    // A few dispatch batches are enough for the first configure to land
    for _ in 0..3 {
        session.dispatch_once()?;
        if session.state().shell().ready() {
            break;
        }
    }

    assert!(session.state().shell().acked_serial().is_some());
    Ok(())
}
