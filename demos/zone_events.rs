//! Example: Open the panel and print zone changes as they arrive.

use dsc_bridge::{PanelEvent, PanelSession, SessionConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let port = std::env::args().nth(1).unwrap_or_else(|| "/dev/ttyUSB0".to_string());
    let config = SessionConfig::builder().port(port).baud_rate(9600).build();

    let panel = PanelSession::open(config).await?;
    let events = panel.event_stream();

    // Ask for everything once so the current state is printed first.
    panel.request_full_status().await?;

    println!("Listening for zone events (Ctrl+C to stop)...\n");

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Some(PanelEvent::Zone { state, id }) => {
                        println!("Zone {:>3}: {}", id, state);
                    }
                    Some(PanelEvent::Error(e)) if e.is_fatal() => {
                        println!("Panel disconnected: {}", e);
                        break;
                    }
                    Some(event) => {
                        println!("Event: {:?}", event);
                    }
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\nClosing...");
                break;
            }
        }
    }

    panel.close().await?;
    Ok(())
}
