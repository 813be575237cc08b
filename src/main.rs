use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Deserialize;

use mockstudio::canvas::placement::{PlacedLayer, SCALE_MAX, SCALE_MIN};
use mockstudio::{rendering, AssetKind, MemoryRegistry, StudioConfig};

/// Headless mockup compositor: flatten a design file into a PNG.
#[derive(Parser)]
#[command(name = "mockstudio", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Rasterize a design file into a flattened PNG composite
    Compose {
        /// Path to the design JSON file
        design: PathBuf,
        /// Directory asset paths are resolved against (default: the design
        /// file's directory)
        #[arg(long)]
        assets_dir: Option<PathBuf>,
        /// Output PNG path
        #[arg(long, short)]
        out: PathBuf,
        /// Output preset index (see `mockstudio presets`)
        #[arg(long, default_value_t = 0)]
        preset: usize,
        /// Fail on overlay decode errors instead of skipping the layer
        #[arg(long)]
        strict: bool,
    },
    /// List the configured output presets
    Presets,
    /// Compose a design and push it through the remote generation endpoint
    #[cfg(feature = "remote")]
    Generate {
        design: PathBuf,
        #[arg(long)]
        assets_dir: Option<PathBuf>,
        #[arg(long, short)]
        out: PathBuf,
        #[arg(long, default_value_t = 0)]
        preset: usize,
        /// Generation endpoint URL
        #[arg(long)]
        endpoint: String,
        /// Free-form instruction for the generation service
        #[arg(long, default_value = "")]
        instruction: String,
    },
}

/// On-disk design description. Asset references are file paths relative to
/// the assets directory; they double as asset ids.
#[derive(Deserialize)]
struct DesignFile {
    product: String,
    #[serde(default)]
    layers: Vec<DesignLayer>,
}

#[derive(Deserialize)]
struct DesignLayer {
    asset: String,
    #[serde(default = "center")]
    x: f32,
    #[serde(default = "center")]
    y: f32,
    #[serde(default = "unit")]
    scale: f32,
    #[serde(default)]
    rotation: f32,
}

fn center() -> f32 {
    50.0
}

fn unit() -> f32 {
    1.0
}

fn load_design(
    design_path: &Path,
    assets_dir: Option<PathBuf>,
) -> anyhow::Result<(MemoryRegistry, String, Vec<PlacedLayer>)> {
    let raw = std::fs::read_to_string(design_path)
        .with_context(|| format!("reading design {}", design_path.display()))?;
    let design: DesignFile = serde_json::from_str(&raw)
        .with_context(|| format!("parsing design {}", design_path.display()))?;

    let dir = assets_dir.unwrap_or_else(|| {
        design_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    });

    let registry = MemoryRegistry::new();
    let product_bytes = std::fs::read(dir.join(&design.product))
        .with_context(|| format!("reading product image '{}'", design.product))?;
    registry
        .register_bytes(&design.product, AssetKind::Product, product_bytes)
        .with_context(|| format!("decoding product image '{}'", design.product))?;

    let mut layers = Vec::new();
    for (index, l) in design.layers.iter().enumerate() {
        // Overlay files are best-effort: a missing or broken file leaves a
        // dangling layer, which the rasterizer skips with a warning
        if let Ok(bytes) = std::fs::read(dir.join(&l.asset)) {
            let _ = registry.register_bytes(&l.asset, AssetKind::Logo, bytes);
        }
        layers.push(PlacedLayer {
            id: index as u64,
            asset_id: l.asset.clone(),
            x: l.x.clamp(0.0, 100.0),
            y: l.y.clamp(0.0, 100.0),
            scale: l.scale.clamp(SCALE_MIN, SCALE_MAX),
            rotation: l.rotation,
        });
    }
    Ok((registry, design.product, layers))
}

fn pick_preset(config: &StudioConfig, index: usize) -> anyhow::Result<&mockstudio::OutputPreset> {
    match config.presets.get(index) {
        Some(p) => Ok(p),
        None => bail!(
            "preset index {} out of range (0..{})",
            index,
            config.presets.len()
        ),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = StudioConfig::default();

    match cli.command {
        Cmd::Compose {
            design,
            assets_dir,
            out,
            preset,
            strict,
        } => {
            let preset = pick_preset(&config, preset)?.clone();
            let (registry, product, layers) = load_design(&design, assets_dir)?;
            let composite = rendering::render_with_registry(
                &registry,
                &product,
                &layers,
                preset.width,
                preset.height,
                strict,
            )?;
            for warning in &composite.warnings {
                eprintln!("warning: {:?}", warning);
            }
            std::fs::write(&out, &composite.png_data)
                .with_context(|| format!("writing {}", out.display()))?;
            println!(
                "composed {} layer(s) at {}x{} -> {}",
                layers.len(),
                composite.width,
                composite.height,
                out.display()
            );
        }
        Cmd::Presets => {
            for (i, p) in config.presets.iter().enumerate() {
                println!("{}: {} {}x{} ({})", i, p.aspect, p.width, p.height, p.tier);
            }
        }
        #[cfg(feature = "remote")]
        Cmd::Generate {
            design,
            assets_dir,
            out,
            preset,
            endpoint,
            instruction,
        } => {
            use mockstudio::{GenerationRequest, GenerationSink};

            let config = StudioConfig {
                endpoint: Some(endpoint),
                ..config
            };
            let preset = pick_preset(&config, preset)?.clone();
            let (registry, product, layers) = load_design(&design, assets_dir)?;
            let composite = rendering::render_with_registry(
                &registry,
                &product,
                &layers,
                preset.width,
                preset.height,
                false,
            )?;
            for warning in &composite.warnings {
                eprintln!("warning: {:?}", warning);
            }

            let sink = mockstudio::new_sink(&config)?;
            let generated = sink.generate(&GenerationRequest {
                png_data: composite.png_data,
                instruction,
                aspect: preset.aspect.clone(),
                tier: preset.tier.clone(),
            })?;
            std::fs::write(&out, &generated.png_data)
                .with_context(|| format!("writing {}", out.display()))?;
            println!("generated mockup -> {}", out.display());
        }
    }
    Ok(())
}
