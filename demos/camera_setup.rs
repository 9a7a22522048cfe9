use vapix_rs::{
    CameraConfig, ExposureMode, ExposureOptions, ImageSettings, IrCutFilter, JpegOptions, Media,
    ProfileOptions, SecurityGroup, StreamProfiles, SystemInfo, UserAccount, UserManagement,
    VapixCam, VapixError, VideoCodec,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        println!("Usage: {} <IP> <Username> <Password> [snapshot.jpg]", args[0]);
        return Ok(());
    }

    let config = CameraConfig::new(&args[1], &args[2], &args[3]);
    let cam = VapixCam::from_config(&config);

    println!("Model: {}", cam.get_type_camera().await?);
    println!("Device time: {}", cam.get_device_time().await?);

    println!("--- USER LIST ---");
    for user in cam.list_users().await? {
        println!(" - {}", user);
    }

    let operator = UserAccount::new("ptzoperator", "ChangeMe123", SecurityGroup::Ptz)
        .with_comment("created by camera_setup");
    match cam.create_user(&operator).await {
        Ok(reply) => println!("Created user: {}", reply),
        Err(VapixError::AlreadyExists(name)) => println!("User {} already exists", name),
        Err(e) => return Err(e.into()),
    }

    println!("--- STREAM PROFILES ---");
    for profile in cam.list_profiles().await? {
        println!(" - {}", profile);
    }
    let mobile = ProfileOptions {
        resolution: Some("640x360".to_string()),
        video_codec: Some(VideoCodec::H264),
        fps: Some(15),
        ..Default::default()
    };
    if let Err(e) = cam.create_profile("Mobile", &mobile).await {
        eprintln!("Profile not created: {}", e);
    }

    println!("Switching to automatic day/night...");
    cam.set_ir_cut_filter(Some(IrCutFilter::Auto), None).await?;
    cam.set_exposure(&ExposureOptions {
        mode: Some(ExposureMode::FlickerFree50),
        ..Default::default()
    })
    .await?;

    if let Some(path) = args.get(4) {
        let image = cam.get_jpeg(&JpegOptions::default()).await?;
        tokio::fs::write(path, &image).await?;
        println!("Saved {} bytes to {}", image.len(), path);
    }

    Ok(())
}
