//! MJPEG streaming server fed from stdin
//!
//! Run with: cargo run --example camera_server [BIND_ADDR]
//!
//! Pipe any MJPEG source into stdin, for example:
//!
//!   libcamera-vid -t 0 --codec mjpeg --width 640 --height 480 -o - \
//!     | cargo run --example camera_server
//!
//!   ffmpeg -f v4l2 -i /dev/video0 -c:v mjpeg -f mjpeg - \
//!     | cargo run --example camera_server 127.0.0.1:8000
//!
//! Then open http://localhost:8000/index.html in a browser.

use std::net::SocketAddr;

use tokio::io::AsyncReadExt;

use mjpeg_cast::{FrameBroadcaster, MjpegServer, ServerConfig};

/// Parse bind address from command line argument.
///
/// Accepts formats:
/// - "localhost" -> 127.0.0.1:8000
/// - "localhost:8080" -> 127.0.0.1:8080
/// - "0.0.0.0:8000" -> 0.0.0.0:8000
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    const DEFAULT_PORT: u16 = 8000;

    let normalized = arg.replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

fn print_usage() {
    eprintln!("Usage: camera_server [BIND_ADDR]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR    Address to bind to (default: 0.0.0.0:8000)");
    eprintln!();
    eprintln!("Feed MJPEG bytes on stdin, e.g.:");
    eprintln!("  libcamera-vid -t 0 --codec mjpeg -o - | camera_server");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let bind_addr = match args.get(1) {
        Some(addr_str) => match parse_bind_addr(addr_str) {
            Ok(addr) => addr,
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        },
        None => "0.0.0.0:8000".parse().unwrap(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mjpeg_cast=debug".parse()?)
                .add_directive("camera_server=debug".parse()?),
        )
        .init();

    let mut broadcaster = FrameBroadcaster::new();
    let config = ServerConfig {
        bind_addr,
        ..ServerConfig::default()
    };
    let server = MjpegServer::new(config, broadcaster.handle());

    println!("Serving MJPEG stream on http://{}/index.html", bind_addr);

    // Producer: relay stdin chunks into the broadcaster until EOF
    let producer = tokio::spawn(async move {
        let mut encoder = tokio::io::stdin();
        let mut chunk = vec![0u8; 16 * 1024];
        loop {
            match encoder.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => broadcaster.ingest(&chunk[..n]),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read encoder input");
                    break;
                }
            }
        }
        tracing::info!("Encoder input ended");
        broadcaster.close();
    });

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                eprintln!("Server error: {}", e);
            }
        }
        _ = producer => {
            println!("Encoder input ended, shutting down");
        }
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down...");
        }
    }

    Ok(())
}
