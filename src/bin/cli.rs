//! wsdsp CLI Client
//!
//! Command-line interface for sending DSP requests to a wsdsp server.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args as ClapArgs, Parser, Subcommand};
use wsdsp::dsp::complex_from_bytes;
use wsdsp::network::Client;
use wsdsp::protocol::{Command, Message, SampleParams};

/// Number of output samples printed
const PREVIEW_SAMPLES: usize = 8;

/// wsdsp CLI
#[derive(Parser, Debug)]
#[command(name = "wsdsp-cli")]
#[command(about = "CLI for the wsdsp WebSocket DSP server")]
#[command(version)]
struct Args {
    /// Server URL
    #[arg(short, long, default_value = "ws://127.0.0.1:7681")]
    server: String,

    /// Seconds to wait for the response (0 waits forever)
    #[arg(short, long, default_value = "10")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Send data back unchanged
    Echo {
        #[command(flatten)]
        input: Input,
    },

    /// Forward FFT of the samples
    Fft {
        #[command(flatten)]
        input: Input,

        #[command(flatten)]
        samples: Samples,
    },

    /// FIR low-pass filter the samples
    Fir {
        #[command(flatten)]
        input: Input,

        #[command(flatten)]
        samples: Samples,
    },

    /// Run a chain of commands, e.g. `fir,fft`
    Pipeline {
        /// Comma separated command names (echo, fft, fir)
        #[arg(short, long, value_delimiter = ',')]
        chain: Vec<String>,

        #[command(flatten)]
        input: Input,

        #[command(flatten)]
        samples: Samples,
    },
}

#[derive(ClapArgs, Debug)]
struct Input {
    /// Inline request data
    #[arg(short, long, conflicts_with = "file")]
    data: Option<String>,

    /// Read request data from a file
    #[arg(short, long)]
    file: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
struct Samples {
    /// Sample rate in Hz
    #[arg(long, default_value = "48000")]
    sample_rate: u32,

    /// Bytes per input sample (1, 2 or 4)
    #[arg(long, default_value = "2")]
    sample_width: u32,
}

impl Samples {
    fn params(&self) -> SampleParams {
        SampleParams::new(self.sample_rate, self.sample_width)
    }
}

fn main() {
    let args = Args::parse();

    let (commands, input) = match build_request(args.command) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    let data = match read_input(&input) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    let timeout = (args.timeout > 0).then(|| Duration::from_secs(args.timeout));
    if let Err(e) = run(&args.server, timeout, commands, data) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(
    server: &str,
    timeout: Option<Duration>,
    commands: Vec<Command>,
    data: Vec<u8>,
) -> wsdsp::Result<()> {
    let mut client = Client::connect_with_timeout(server, timeout)?;
    let response = client.request(commands, data)?;
    print_response(&response);
    client.close()
}

fn build_request(command: Commands) -> Result<(Vec<Command>, Input), String> {
    match command {
        Commands::Echo { input } => Ok((vec![Command::echo()], input)),
        Commands::Fft { input, samples } => Ok((vec![Command::fft(samples.params())], input)),
        Commands::Fir { input, samples } => {
            Ok((vec![Command::fir_filter(samples.params())], input))
        }
        Commands::Pipeline {
            chain,
            input,
            samples,
        } => {
            let params = samples.params();
            let commands = chain
                .iter()
                .map(|name| match name.trim().to_ascii_lowercase().as_str() {
                    "echo" => Ok(Command::echo()),
                    "fft" => Ok(Command::fft(params)),
                    "fir" => Ok(Command::fir_filter(params)),
                    other => Err(format!("unknown command '{}'", other)),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok((commands, input))
        }
    }
}

fn read_input(input: &Input) -> Result<Vec<u8>, String> {
    match (&input.data, &input.file) {
        (Some(data), _) => Ok(data.as_bytes().to_vec()),
        (None, Some(path)) => {
            std::fs::read(path).map_err(|e| format!("cannot read {}: {}", path.display(), e))
        }
        (None, None) => Ok(Vec::new()),
    }
}

fn print_response(response: &Message) {
    println!("response {}: {} bytes", response.id, response.data.len());

    match complex_from_bytes(&response.data) {
        Some(samples) if !samples.is_empty() => {
            for (i, s) in samples.iter().take(PREVIEW_SAMPLES).enumerate() {
                println!("  [{}] {:>12.4} {:+12.4}i", i, s.re, s.im);
            }
            if samples.len() > PREVIEW_SAMPLES {
                println!("  ... {} more samples", samples.len() - PREVIEW_SAMPLES);
            }
        }
        _ => println!("{}", String::from_utf8_lossy(&response.data)),
    }
}
