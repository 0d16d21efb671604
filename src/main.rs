//! Tilescale CLI - Exact Tiled Raster Scaling
//!
//! This is a demonstration CLI for the tilescale library. It scales a
//! synthetic gradient image and reports the geometry and a checksum.

use std::sync::Arc;
use tilescale::prelude::*;

/// Demo run settings gathered from the command line.
struct DemoOptions {
    config: ScaleConfig,
    size: (i64, i64),
    source_tile: (i64, i64),
    sample_type: SampleType,
    bands: usize,
    roi: Option<Rect>,
    no_data: Option<f64>,
}

impl Default for DemoOptions {
    fn default() -> Self {
        Self {
            config: ScaleConfig::default(),
            size: (512, 512),
            source_tile: (128, 128),
            sample_type: SampleType::U8,
            bands: 1,
            roi: None,
            no_data: None,
        }
    }
}

fn main() {
    env_logger::init();

    println!("📐 Tilescale - Exact Tiled Raster Scaling v{}", tilescale::VERSION);
    println!();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        return;
    }

    let result = match args[1].as_str() {
        "bounds" => parse_options(&args[2..]).and_then(|options| show_bounds(&options)),
        "scale" => parse_options(&args[2..]).and_then(|options| run_scale(&options)),
        "help" | "--help" | "-h" => {
            print_usage(&args[0]);
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {}", args[1]);
            print_usage(&args[0]);
            Ok(())
        }
    };

    if let Err(message) = result {
        eprintln!("❌ {}", message);
        std::process::exit(1);
    }
}

fn print_usage(program: &str) {
    println!("Usage: {} <command> [options]", program);
    println!();
    println!("Commands:");
    println!("  bounds [options]  Show destination and computable bounds");
    println!("  scale [options]   Scale a synthetic gradient and print a checksum");
    println!("  help              Show this help message");
    println!();
    println!("Options:");
    println!("  --config <file>       Load a TOML scale configuration");
    println!("  --scale <sx>[,<sy>]   Scale factors (default: 1)");
    println!("  --translate <tx>,<ty> Translation in destination pixels");
    println!("  --interp <kernel>     nearest, bilinear or bicubic");
    println!("  --border <mode>       copy, reflect, wrap or a constant value");
    println!("  --size <WxH>          Source size (default: 512x512)");
    println!("  --tile <WxH>          Destination tile size");
    println!("  --type <type>         Sample type: u8, u16, i16, i32, f32, f64");
    println!("  --bands <n>           Number of bands (default: 1)");
    println!("  --roi <x,y,w,h>       Rectangular region of interest");
    println!("  --no-data <value>     Source value to exclude");
    println!("  --sequential          Compute tiles on one thread");
    println!();
    println!("Set RUST_LOG=debug for operator details.");
}

fn parse_options(args: &[String]) -> Result<DemoOptions, String> {
    let mut options = DemoOptions::default();

    // The config file is the base; flags override it wherever they appear.
    if let Some(pos) = args.iter().position(|a| a == "--config") {
        let path = args.get(pos + 1).ok_or("--config needs a file")?;
        options.config = ScaleConfig::from_file(path).map_err(|e| e.to_string())?;
    }

    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        if flag == "--sequential" {
            options.config.parallel = false;
            i += 1;
            continue;
        }
        let value = args
            .get(i + 1)
            .ok_or_else(|| format!("Missing value for {}", flag))?;
        match flag {
            "--config" => {}
            "--scale" => {
                let values = parse_list(value)?;
                let sx = values[0];
                let sy = values.get(1).copied().unwrap_or(sx);
                options.config = options.config.with_scale(sx, sy);
            }
            "--translate" => {
                let values = parse_list(value)?;
                let ty = values.get(1).copied().unwrap_or(0.0);
                options.config = options.config.with_translation(values[0], ty);
            }
            "--interp" => {
                let kind = value.parse::<InterpolationKind>().map_err(|e| e.to_string())?;
                options.config = options.config.with_interpolation(kind);
            }
            "--border" => {
                let border = match value.as_str() {
                    "copy" => BorderMode::Copy,
                    "reflect" => BorderMode::Reflect,
                    "wrap" => BorderMode::Wrap,
                    other => BorderMode::Constant(
                        other.parse().map_err(|_| format!("Unknown border mode: {}", other))?,
                    ),
                };
                options.config = options.config.with_border(border);
            }
            "--size" => options.size = parse_dimensions(value)?,
            "--tile" => {
                let (w, h) = parse_dimensions(value)?;
                options.config = options.config.with_tile_size(w, h);
            }
            "--type" => {
                options.sample_type = value.parse().map_err(|e: ConfigError| e.to_string())?;
            }
            "--bands" => {
                options.bands = value
                    .parse::<usize>()
                    .ok()
                    .filter(|&b| b > 0)
                    .ok_or_else(|| format!("Invalid band count: {}", value))?;
            }
            "--roi" => {
                let v = parse_list(value)?;
                if v.len() != 4 {
                    return Err(format!("ROI needs x,y,w,h: {}", value));
                }
                options.roi = Some(Rect::new(v[0] as i64, v[1] as i64, v[2] as i64, v[3] as i64));
            }
            "--no-data" => {
                options.no_data = Some(value.parse().map_err(|_| format!("Invalid no-data value: {}", value))?);
            }
            _ => return Err(format!("Unknown option: {}", flag)),
        }
        i += 2;
    }

    options.config.validate().map_err(|e| match e.suggested_fix() {
        Some(fix) => format!("{} ({})", e, fix),
        None => e.to_string(),
    })?;
    Ok(options)
}

fn parse_list(s: &str) -> Result<Vec<f64>, String> {
    let values: Result<Vec<f64>, _> = s.split(',').map(|v| v.trim().parse::<f64>()).collect();
    match values {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => Err(format!("Invalid number list: {}", s)),
    }
}

fn parse_dimensions(s: &str) -> Result<(i64, i64), String> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() == 2 {
        if let (Ok(w), Ok(h)) = (parts[0].parse(), parts[1].parse()) {
            return Ok((w, h));
        }
    }
    Err(format!("Invalid dimensions: {}", s))
}

/// A diagonal gradient with one offset per band.
fn gradient(options: &DemoOptions) -> Arc<dyn ImageSource> {
    let (width, height) = options.size;
    let rect = Rect::new(0, 0, width, height);
    let bands = options.bands;
    let value = move |x: i64, y: i64, b: usize| ((x + y) % 256 + 16 * b as i64) as f64;
    let raster = match options.sample_type {
        SampleType::U8 => Raster::from_fn(rect, bands, |x, y, b| u8::from_f64(value(x, y, b))),
        SampleType::U16 => Raster::from_fn(rect, bands, |x, y, b| u16::from_f64(value(x, y, b))),
        SampleType::I16 => Raster::from_fn(rect, bands, |x, y, b| i16::from_f64(value(x, y, b))),
        SampleType::I32 => Raster::from_fn(rect, bands, |x, y, b| i32::from_f64(value(x, y, b))),
        SampleType::F32 => Raster::from_fn(rect, bands, |x, y, b| f32::from_f64(value(x, y, b))),
        SampleType::F64 => Raster::from_fn(rect, bands, |x, y, b| value(x, y, b)),
    };
    let (tile_w, tile_h) = options.source_tile;
    Arc::new(MemoryImage::new(raster, tile_w, tile_h))
}

fn build_op(options: &DemoOptions) -> Result<ScaleOp, String> {
    let mut op = ScaleOp::new(gradient(options), &options.config).map_err(|e| e.to_string())?;
    if let Some(rect) = options.roi {
        op = op.with_roi(Arc::new(RectRoi::new(rect)));
    }
    if let Some(value) = options.no_data {
        op = op.with_no_data(NoDataRange::single(value));
    }
    Ok(op)
}

fn show_bounds(options: &DemoOptions) -> Result<(), String> {
    let op = build_op(options)?;
    let grid = op.tile_grid();
    println!("Transform:   {}", op.params());
    println!("Kernel:      {}", op.interpolation().kind());
    println!("Source:      {}", Rect::new(0, 0, options.size.0, options.size.1));
    println!("Bounds:      {}", op.bounds());
    println!("Computable:  {}", op.computable_bounds());
    println!(
        "Tiles:       {} of {}x{}",
        grid.tiles(op.bounds()).tile_count(),
        grid.tile_width,
        grid.tile_height
    );
    Ok(())
}

fn run_scale(options: &DemoOptions) -> Result<(), String> {
    let op = build_op(options)?.with_execution_options(
        options.config.execution_options().with_progress(|update| {
            if let ProgressUpdate::Completed {
                total_duration_ms,
                tiles_computed,
            } = update
            {
                println!("✅ Complete in {}ms ({} tiles)", total_duration_ms, tiles_computed);
            }
        }),
    );

    println!("⚙️  Scaling {}x{} {} source: {}", options.size.0, options.size.1, options.sample_type, op.params());
    let result = op.execute().map_err(|e| e.to_string())?;
    let image = result.image;

    let mut checksum = 0.0f64;
    for y in image.rect().y..image.rect().bottom() {
        for x in image.rect().x..image.rect().right() {
            for b in 0..image.bands() {
                checksum += image.get(x, y, b).unwrap_or(0.0);
            }
        }
    }

    println!("Bounds:    {}", image.rect());
    println!("Threads:   {}", result.stats.threads);
    println!("Checksum:  {}", checksum);
    Ok(())
}
