//! sqz CLI - progressive image codec command-line utility.
//!
//! Encodes raw or PNM pixels into byte-scalable SQZ streams and
//! decodes any prefix of a stream back to an image.

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::PathBuf;

use sqz_rs::{ColorMode, ScanOrder, SqzDecoder, SqzDescriptor, SqzEncoder};

/// Byte-scalable progressive image codec
#[derive(Parser)]
#[command(name = "sqz")]
#[command(author = "sqz-rs contributors")]
#[command(version)]
#[command(about = "Encode, decode and inspect SQZ streams", long_about = None)]
#[command(after_help = "EXAMPLES:
    sqz encode -i photo.ppm -o photo.sqz -m ycocg-r -l 5
    sqz encode -i pixels.raw -o tiny.sqz -w 512 -H 512 -b 4096
    sqz decode -i photo.sqz -o photo.ppm
    sqz decode -i photo.sqz -o preview.ppm --take 2048
    sqz info -i photo.sqz

Any prefix of a stream is itself a valid stream: --take re-serves the
same encode at a smaller byte budget without re-encoding.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode raw or PNM pixels to an SQZ stream
    ///
    /// PGM (P5) and PPM (P6) inputs are detected by magic; anything
    /// else is treated as raw packed pixels and needs explicit
    /// dimensions.
    #[command(visible_alias = "e")]
    Encode {
        /// Input file (PGM, PPM, or raw pixels)
        #[arg(short, long, help = "Path to the input image file")]
        input: PathBuf,

        /// Output SQZ file
        #[arg(short, long, help = "Path for the encoded output file")]
        output: PathBuf,

        /// Image width in pixels (raw input only)
        #[arg(short, long)]
        width: Option<u32>,

        /// Image height in pixels (raw input only)
        #[arg(short = 'H', long)]
        height: Option<u32>,

        /// Color mode
        #[arg(short = 'm', long, default_value = "ycocg-r", value_enum)]
        mode: Mode,

        /// Wavelet decomposition levels (clamped to the dimensions)
        #[arg(short, long, default_value = "5")]
        levels: u8,

        /// Spatial scan order
        #[arg(short, long, default_value = "snake", value_enum)]
        scan: Scan,

        /// Delay chroma by one extra schedule round
        #[arg(long)]
        subsampling: bool,

        /// Byte budget; 0 picks a budget large enough for lossless
        #[arg(short, long, default_value = "0")]
        budget: usize,
    },

    /// Decode an SQZ stream (or a prefix of one) to pixels
    #[command(visible_alias = "d")]
    Decode {
        /// Input SQZ file
        #[arg(short, long, help = "Path to the input stream")]
        input: PathBuf,

        /// Output file path
        #[arg(short, long, help = "Path for the decoded image")]
        output: PathBuf,

        /// Output format: pnm (PGM/PPM by plane count) or raw
        #[arg(short, long, default_value = "pnm", value_enum)]
        format: OutputFormat,

        /// Decode only the first N bytes of the stream
        #[arg(long)]
        take: Option<usize>,
    },

    /// Display stream header information
    #[command(visible_alias = "i")]
    Info {
        /// Input SQZ file
        #[arg(short, long, help = "Path to the stream to inspect")]
        input: PathBuf,
    },
}

#[derive(Clone, Debug, ValueEnum)]
enum Mode {
    /// Single-plane grayscale (reversible)
    Gray,
    /// Reversible YCoCg
    YcocgR,
    /// Fixed-point Oklab (lossy)
    Oklab,
    /// Log-companded L1 luminance (lossy)
    Logl1,
}

impl From<Mode> for ColorMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Gray => ColorMode::Grayscale,
            Mode::YcocgR => ColorMode::YCoCgR,
            Mode::Oklab => ColorMode::Oklab,
            Mode::Logl1 => ColorMode::Logl1,
        }
    }
}

#[derive(Clone, Debug, ValueEnum)]
enum Scan {
    Raster,
    Snake,
    Morton,
    Hilbert,
}

impl From<Scan> for ScanOrder {
    fn from(scan: Scan) -> Self {
        match scan {
            Scan::Raster => ScanOrder::Raster,
            Scan::Snake => ScanOrder::Snake,
            Scan::Morton => ScanOrder::Morton,
            Scan::Hilbert => ScanOrder::Hilbert,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Portable anymap (PGM for grayscale, PPM for color)
    Pnm,
    /// Raw packed pixel bytes
    Raw,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Encode {
            input,
            output,
            width,
            height,
            mode,
            levels,
            scan,
            subsampling,
            budget,
        } => encode_image(
            &input,
            &output,
            width,
            height,
            mode,
            levels,
            scan,
            subsampling,
            budget,
        ),
        Commands::Decode {
            input,
            output,
            format,
            take,
        } => decode_image(&input, &output, &format, take),
        Commands::Info { input } => show_info(&input),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[allow(clippy::too_many_arguments)]
fn encode_image(
    input: &PathBuf,
    output: &PathBuf,
    width: Option<u32>,
    height: Option<u32>,
    mode: Mode,
    levels: u8,
    scan: Scan,
    subsampling: bool,
    budget: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;

    let (pixels, w, h, components, mode) = if data.starts_with(b"P5") || data.starts_with(b"P6") {
        let (pixels, w, h, components) = read_pnm(&data)?;
        let mode = if components == 1 {
            ColorMode::Grayscale
        } else {
            ColorMode::from(mode)
        };
        (pixels, w, h, components, mode)
    } else {
        let w = width.ok_or("raw input requires --width")?;
        let h = height.ok_or("raw input requires --height")?;
        let mode = ColorMode::from(mode);
        let components = if mode == ColorMode::Grayscale { 1 } else { 3 };
        (data, w, h, components, mode)
    };

    if mode == ColorMode::Grayscale && components != 1 {
        return Err("grayscale mode needs single-component input".into());
    }
    if mode != ColorMode::Grayscale && components != 3 {
        return Err("color modes need RGB input".into());
    }

    let descriptor = SqzDescriptor {
        width: w,
        height: h,
        color_mode: mode,
        dwt_levels: levels,
        scan_order: ScanOrder::from(scan),
        subsampling,
    };

    let budget = if budget == 0 {
        // Two bytes per coefficient always reaches lossless.
        descriptor.pixel_buffer_size() * 2 + 64
    } else {
        budget
    };

    let mut stream = vec![0u8; budget];
    let mut encoder = SqzEncoder::new(&mut stream);
    encoder.set_descriptor(descriptor)?;
    let written = encoder.encode(&pixels)?;
    let effective = *encoder.descriptor().ok_or("descriptor missing")?;
    stream.truncate(written);
    fs::write(output, &stream)?;

    println!(
        "Encoded {}x{} ({:?}, {} levels, {:?} scan) to {:?}: {} bytes",
        w, h, effective.color_mode, effective.dwt_levels, effective.scan_order, output, written
    );
    Ok(())
}

fn decode_image(
    input: &PathBuf,
    output: &PathBuf,
    format: &OutputFormat,
    take: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;
    let data = match take {
        Some(take) => &data[..take.min(data.len())],
        None => &data[..],
    };

    let mut decoder = SqzDecoder::new(data);
    let size = decoder.destination_size()?;
    let mut pixels = vec![0u8; size];
    decoder.decode(&mut pixels)?;
    let descriptor = *decoder.descriptor().ok_or("descriptor missing")?;

    match format {
        OutputFormat::Raw => {
            fs::write(output, &pixels)?;
        }
        OutputFormat::Pnm => {
            write_pnm(
                output,
                &pixels,
                descriptor.width,
                descriptor.height,
                descriptor.plane_count() as u32,
            )?;
        }
    }

    println!(
        "Decoded {}x{} ({:?}) from {} bytes to {:?}",
        descriptor.width,
        descriptor.height,
        descriptor.color_mode,
        data.len(),
        output
    );
    Ok(())
}

fn show_info(input: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;

    println!("File: {:?}", input);
    println!("Size: {} bytes", data.len());

    let mut decoder = SqzDecoder::new(&data);
    decoder.read_header()?;
    let descriptor = decoder.descriptor().ok_or("descriptor missing")?;

    println!();
    println!("Format: SQZ progressive stream");
    println!("  Dimensions:  {}x{}", descriptor.width, descriptor.height);
    println!("  Color mode:  {:?}", descriptor.color_mode);
    println!("  Planes:      {}", descriptor.plane_count());
    println!("  DWT levels:  {}", descriptor.dwt_levels);
    println!("  Scan order:  {:?}", descriptor.scan_order);
    println!("  Subsampling: {}", if descriptor.subsampling { "yes" } else { "no" });
    println!("  Payload:     {} bytes", data.len().saturating_sub(6));
    Ok(())
}

// PNM helpers

fn read_pnm(data: &[u8]) -> Result<(Vec<u8>, u32, u32, u32), Box<dyn std::error::Error>> {
    let components = match &data[..2] {
        b"P5" => 1u32,
        b"P6" => 3u32,
        _ => return Err("unsupported PNM variant".into()),
    };

    let mut position = 2usize;
    let mut fields = [0u32; 3];
    for field in fields.iter_mut() {
        // Skip whitespace and `#` comment lines between tokens.
        loop {
            match data.get(position) {
                Some(b) if b.is_ascii_whitespace() => position += 1,
                Some(b'#') => {
                    while position < data.len() && data[position] != b'\n' {
                        position += 1;
                    }
                }
                Some(_) => break,
                None => return Err("truncated PNM header".into()),
            }
        }
        let mut value = 0u32;
        while let Some(b) = data.get(position) {
            if !b.is_ascii_digit() {
                break;
            }
            value = value * 10 + (b - b'0') as u32;
            position += 1;
        }
        *field = value;
    }
    let [width, height, maxval] = fields;
    if maxval != 255 {
        return Err("only 8-bit PNM is supported".into());
    }
    position += 1; // single whitespace after maxval

    let expected = (width * height * components) as usize;
    let pixels = data
        .get(position..position + expected)
        .ok_or("truncated PNM pixel data")?;
    Ok((pixels.to_vec(), width, height, components))
}

fn write_pnm(
    path: &PathBuf,
    pixels: &[u8],
    width: u32,
    height: u32,
    components: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    use std::io::Write;
    let mut file = fs::File::create(path)?;

    if components == 1 {
        writeln!(file, "P5")?;
    } else {
        writeln!(file, "P6")?;
    }
    writeln!(file, "{} {}", width, height)?;
    writeln!(file, "255")?;
    file.write_all(pixels)?;

    Ok(())
}
