//! Command-line front end for the `floatgroup` codec: compresses or
//! decompresses a file using a fixed, zeroed 32-byte header.

use std::fs;
use std::process::ExitCode;

use floatgroup::{BitsMode, BytesMode, CompressionOptions, DecompressionOptions, Method};

const USAGE: &str = "\
floatgroup-cli compress --streams <2|4> --chunk-size <bytes> [options] <input> <output>
floatgroup-cli decompress --streams <2|4> --chunk-size <bytes> --orig-size <bytes> [options] <input> <output>

options:
  --bits-mode <on|off>      cluster exponent bits before transposing (default off)
  --method <auto|huffman|zstd|fse>   compression method (compress only, default auto)
  --comp-threshold <0..1>   containment ratio (compress only, default 1.0)
  --threads <n>             worker thread count (default: number of CPUs)
  --zstd-level <1..22>      ZSTD level when a stream picks ZSTD (default 1)
";

fn main() -> ExitCode {
    simple_logger::SimpleLogger::new().init().expect("logger already initialized");

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            eprintln!("{USAGE}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let mut args = pico_args::Arguments::from_env();

    let command = args.subcommand().map_err(|error| error.to_string())?.ok_or("missing command (compress/decompress)")?;

    let streams = parse_streams(args.value_from_str("--streams").map_err(|error| error.to_string())?)?;
    let chunk_size: usize = args.value_from_str("--chunk-size").map_err(|error| error.to_string())?;
    let threads: usize = args.value_from_str("--threads").unwrap_or_else(|_| default_thread_count());
    let bits_mode = parse_bits_mode(args.opt_value_from_str("--bits-mode").map_err(|error| error.to_string())?);

    match command.as_str() {
        "compress" => {
            let method = parse_method(args.opt_value_from_str("--method").map_err(|error| error.to_string())?);
            let comp_threshold: f32 = args.opt_value_from_str("--comp-threshold").map_err(|error| error.to_string())?.unwrap_or(1.0);
            let zstd_level: i32 = args.opt_value_from_str("--zstd-level").map_err(|error| error.to_string())?.unwrap_or(1);

            let free: Vec<String> = args.free().map_err(|error| error.to_string())?;
            let [input_path, output_path] = take_two(free)?;

            let data = fs::read(&input_path).map_err(|error| error.to_string())?;
            let header = [0u8; floatgroup::container::HEADER_LEN];

            let options = CompressionOptions::new(streams, chunk_size)
                .with_bits_mode(bits_mode)
                .with_method(method)
                .with_comp_threshold(comp_threshold)
                .with_threads(threads)
                .with_zstd_level(zstd_level);

            let container = floatgroup::compress(&header, &data, &options).map_err(|error| error.to_string())?;
            fs::write(&output_path, container).map_err(|error| error.to_string())?;
            log::info!("compressed {} bytes from {input_path} into {output_path}", data.len());
            Ok(())
        }
        "decompress" => {
            let orig_size: usize = args.value_from_str("--orig-size").map_err(|error| error.to_string())?;

            let free: Vec<String> = args.free().map_err(|error| error.to_string())?;
            let [input_path, output_path] = take_two(free)?;

            let container = fs::read(&input_path).map_err(|error| error.to_string())?;
            let options = DecompressionOptions::new(streams, chunk_size, orig_size).with_bits_mode(bits_mode).with_threads(threads);

            let restored = floatgroup::decompress(&container, &options).map_err(|error| error.to_string())?;
            fs::write(&output_path, restored).map_err(|error| error.to_string())?;
            log::info!("decompressed {input_path} into {orig_size} bytes at {output_path}");
            Ok(())
        }
        other => Err(format!("unknown command {other:?}")),
    }
}

fn take_two(mut free: Vec<String>) -> Result<[String; 2], String> {
    if free.len() != 2 {
        return Err("expected exactly an <input> and an <output> path".to_string());
    }
    let output = free.pop().expect("checked len == 2");
    let input = free.pop().expect("checked len == 2");
    Ok([input, output])
}

fn parse_streams(raw: u8) -> Result<BytesMode, String> {
    match raw {
        2 => Ok(BytesMode::Split2),
        4 => Ok(BytesMode::Split4),
        other => Err(format!("--streams must be 2 or 4, got {other}")),
    }
}

fn parse_bits_mode(raw: Option<String>) -> BitsMode {
    match raw.as_deref() {
        Some("on") => BitsMode::ClusterExponent,
        _ => BitsMode::Disabled,
    }
}

fn parse_method(raw: Option<String>) -> Method {
    match raw.as_deref() {
        Some("huffman") => Method::Huffman,
        Some("zstd") => Method::Zstd,
        Some("fse") => Method::Fse,
        _ => Method::Auto,
    }
}

fn default_thread_count() -> usize {
    std::thread::available_parallelism().map(|count| count.get()).unwrap_or(1)
}
