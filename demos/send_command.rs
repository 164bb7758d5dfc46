//! Example: Send a raw command and report how the panel answered.
//!
//! Usage: `cargo run --example send_command -- /dev/ttyUSB0 001`

use dsc_bridge::{DscError, PanelSession, SessionConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let port = args.next().unwrap_or_else(|| "/dev/ttyUSB0".to_string());
    let code = args.next().unwrap_or_else(|| "000".to_string());
    let payload = args.next().unwrap_or_default();

    let config = SessionConfig::builder().port(port).build();
    let panel = PanelSession::open(config).await?;

    match panel.send_command(&code, &payload).await {
        Ok(()) => println!("{code}{payload}: acknowledged"),
        Err(DscError::CommandRejected { reason, .. }) => println!("{code}{payload}: rejected ({reason})"),
        Err(DscError::CommandTimeout { .. }) => println!("{code}{payload}: no answer"),
        Err(e) => return Err(e.into()),
    }

    // Drain whatever the command triggered.
    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    while let Some(event) = panel.next_event(false).await {
        println!("  {:?}", event);
    }

    panel.close().await?;
    Ok(())
}
