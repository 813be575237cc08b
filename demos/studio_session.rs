//! Drive a full async studio session with the offline echo sink:
//! register assets, arrange layers, render, and "generate".

use mockstudio::{AssetKind, Studio};

fn solid_png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Mockstudio - Studio Session Example\n");

    // No endpoint configured, so the echo sink is used
    let studio = Studio::new(None).await?;

    studio
        .register_assets(vec![
            ("tote".into(), AssetKind::Product, solid_png(600, 700, [245, 240, 230, 255])),
            ("mark".into(), AssetKind::Logo, solid_png(120, 120, [30, 30, 30, 255])),
        ])
        .await?;
    studio.select_product(Some("tote")).await?;

    let layer = studio.add_layer("mark").await?;
    studio.begin_drag(layer, 300.0, 300.0).await?;
    studio.update_drag(300.0, 240.0, 600.0, 600.0).await?;
    studio.end_drag().await?;
    studio.adjust_scale(layer, 1.0).await?;

    for l in studio.layers().await? {
        println!(
            "layer {} -> {:.1}%, {:.1}% (scale {:.1})",
            l.id, l.x, l.y, l.scale
        );
    }

    let mockup = studio.generate(1, "screen-printed, soft shadows").await?;
    std::fs::write("mockup.png", &mockup.png_data)?;
    println!("wrote mockup.png ({} bytes)", mockup.png_data.len());

    println!("gallery now holds {} mockup(s)", studio.gallery().await?.len());
    studio.close().await?;
    Ok(())
}
