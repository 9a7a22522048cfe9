use std::time::Duration;
use vapix_rs::{
    AbsoluteMove, ContinuousMove, Direction, Media, Presets, Ptz, StreamKind, VapixCam,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        println!("Usage: {} <IP> <Username> <Password>", args[0]);
        return Ok(());
    }

    let ip = &args[1];
    let user = &args[2];
    let pass = &args[3];

    let cam = VapixCam::new(ip, user, pass).with_timeout(Duration::from_secs(5));

    println!("Stream: {}", cam.stream_url(StreamKind::Mjpeg)?);

    let position = cam.get_ptz().await?;
    println!(
        "Current position: pan={} tilt={} zoom={}",
        position.pan, position.tilt, position.zoom
    );

    // 1. Step movement
    println!("Stepping Left...");
    cam.move_direction(Direction::Left, Some(50)).await?;
    tokio::time::sleep(Duration::from_millis(500)).await;

    println!("Stepping Right...");
    cam.move_direction(Direction::Right, Some(50)).await?;
    tokio::time::sleep(Duration::from_millis(500)).await;

    // 2. Continuous movement
    println!("Starting continuous Up movement...");
    cam.continuous_move(ContinuousMove {
        tilt: Some(30),
        ..Default::default()
    })
    .await?;
    tokio::time::sleep(Duration::from_secs(1)).await;
    cam.stop_move().await?;

    // 3. Absolute zoom
    println!("Zooming in...");
    cam.absolute_move(AbsoluteMove {
        zoom: Some(5000),
        speed: Some(50),
        ..Default::default()
    })
    .await?;
    tokio::time::sleep(Duration::from_secs(1)).await;

    // 4. Presets
    println!("--- PRESETS ---");
    match cam.list_all_preset().await {
        Ok(presets) => {
            for preset in &presets {
                println!(" - {}: {}", preset.index, preset.name);
            }
            if let Some(first) = presets.first() {
                println!("Moving to preset {}...", first.name);
                cam.go_to_server_preset_name(&first.name, None).await?;
            }
        }
        Err(e) => eprintln!("Failed to list presets: {}", e),
    }

    cam.go_home_position(None).await?;
    println!("Done.");

    Ok(())
}
