use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::BufRead;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uart_linkcheck::metrics::init_metrics;
use uart_linkcheck::session::{Protocol, SessionConfig, SessionRunner, SessionSummary, StopSignal};
use uart_linkcheck::transport::{
    available_ports, LinkImpairments, PortConfig, SerialTransport, StopBitsSetting, Transport,
    VirtualLink,
};
use uart_linkcheck::verify::PatternCursor;

#[derive(Parser, Debug)]
#[command(author, version, about = "Exercise a serial link and verify what comes back")]
struct Cli {
    #[command(flatten)]
    link: LinkArgs,

    /// Print the final summary as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct LinkArgs {
    /// Serial port, e.g. COM3 or /dev/ttyUSB0
    #[arg(short, long, global = true)]
    port: Option<String>,

    #[arg(short, long, default_value_t = 115_200, global = true)]
    baud: u32,

    /// 1 or 2. Loopback defaults to 2, everything else to 1.
    #[arg(long, global = true, value_parser = clap::value_parser!(u8).range(1..=2))]
    stop_bits: Option<u8>,

    /// Read timeout in milliseconds
    #[arg(long, default_value_t = 1000, global = true)]
    timeout_ms: u64,

    /// Use an in-memory loopback instead of a serial port
    #[arg(long = "virtual", global = true)]
    virtual_link: bool,

    /// Per-byte bit-flip probability on the virtual link
    #[arg(long, default_value_t = 0.0, global = true)]
    corrupt_rate: f64,

    /// Per-byte drop probability on the virtual link
    #[arg(long, default_value_t = 0.0, global = true)]
    drop_rate: f64,

    /// Seed for frame payloads and virtual link faults
    #[arg(long, global = true)]
    seed: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send random frames as fast as the interval allows
    Send(FrameArgs),
    /// Send random frames and check each echo
    Loopback(FrameArgs),
    /// Check an incoming stream against a repeating pattern until Ctrl-C
    Verify(VerifyArgs),
    /// Send one byte value continuously until Enter is pressed
    Static(StaticArgs),
    /// List serial ports on this machine
    Ports,
}

#[derive(Args, Debug)]
struct FrameArgs {
    /// Bytes per frame
    #[arg(long = "bytes", default_value_t = 8)]
    frame_size: usize,

    /// Seconds between frames
    #[arg(long, default_value_t = 0.1)]
    interval: f64,

    /// Number of frames
    #[arg(long, default_value_t = 100)]
    count: u64,
}

#[derive(Args, Debug)]
struct VerifyArgs {
    /// Expected pattern as text
    #[arg(long, default_value = "AC", conflicts_with = "pattern_hex")]
    pattern: String,

    /// Expected pattern as hex, e.g. 4143
    #[arg(long)]
    pattern_hex: Option<String>,

    /// Maximum bytes per read
    #[arg(long, default_value_t = 1024)]
    chunk: usize,

    /// Don't print raw chunks next to mismatch positions
    #[arg(long)]
    no_raw: bool,

    /// Also send the pattern this many times, for a port wired back to itself
    #[arg(long)]
    companion: Option<u64>,

    /// Seconds between companion sends
    #[arg(long, default_value_t = 0.0)]
    interval: f64,
}

#[derive(Args, Debug)]
struct StaticArgs {
    /// Byte to send, decimal or 0x-prefixed hex
    #[arg(long, default_value = "0xAA", value_parser = parse_byte)]
    byte: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let (protocol, mut config) = match &cli.command {
        Command::Ports => return list_ports(),
        Command::Send(args) => (Protocol::ContinuousSend, frame_config(args)?),
        Command::Loopback(args) => (Protocol::Loopback, frame_config(args)?),
        Command::Verify(args) => (Protocol::StreamVerify, verify_config(args)?),
        Command::Static(args) => (
            Protocol::StaticSend,
            SessionConfig::default().with_static_byte(args.byte),
        ),
    };
    if let Some(seed) = cli.link.seed {
        config = config.with_seed(seed);
    }
    config.validate(protocol)?;
    if cli.link.virtual_link
        && protocol == Protocol::StreamVerify
        && config.companion_repeats.is_none()
    {
        warn!("Virtual link without --companion will never receive data");
    }

    init_metrics();
    let transport = open_transport(&cli.link, protocol)?;

    let stop = StopSignal::new();
    spawn_stop_listener(protocol, stop.clone());

    let outcome = tokio::task::spawn_blocking(move || {
        SessionRunner::new(transport, config).run(protocol, &stop)
    })
    .await
    .context("session thread panicked")?;

    match outcome {
        Ok(summary) => {
            if cli.json {
                print_json(&summary)?;
            }
            Ok(())
        }
        Err(err) => {
            if cli.json {
                if let Some(summary) = err.summary() {
                    print_json(summary)?;
                }
            }
            Err(err.into())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn frame_config(args: &FrameArgs) -> Result<SessionConfig> {
    Ok(SessionConfig::default()
        .with_frame_size(args.frame_size)
        .with_interval(seconds(args.interval, "--interval")?)
        .with_iterations(args.count))
}

fn verify_config(args: &VerifyArgs) -> Result<SessionConfig> {
    let pattern = match &args.pattern_hex {
        Some(raw) => PatternCursor::from_hex(raw)
            .with_context(|| format!("invalid --pattern-hex '{raw}'"))?
            .pattern()
            .to_vec(),
        None => args.pattern.as_bytes().to_vec(),
    };
    let mut config = SessionConfig::default()
        .with_pattern(pattern)
        .with_read_chunk_size(args.chunk)
        .with_show_raw(!args.no_raw)
        .with_interval(seconds(args.interval, "--interval")?);
    if let Some(repeats) = args.companion {
        config = config.with_companion(repeats);
    }
    Ok(config)
}

fn seconds(value: f64, flag: &str) -> Result<Duration> {
    Duration::try_from_secs_f64(value).with_context(|| format!("invalid {flag} '{value}'"))
}

fn parse_byte(input: &str) -> Result<u8, String> {
    if let Some(stripped) = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        u8::from_str_radix(stripped, 16).map_err(|_| format!("invalid hex value '{input}'"))
    } else {
        input
            .parse::<u8>()
            .map_err(|_| format!("invalid byte '{input}'"))
    }
}

fn open_transport(args: &LinkArgs, protocol: Protocol) -> Result<Box<dyn Transport>> {
    let timeout = Duration::from_millis(args.timeout_ms);

    if args.virtual_link {
        if protocol == Protocol::StaticSend {
            bail!("static send needs a real port; nothing drains a virtual link");
        }
        let impairments = LinkImpairments {
            corruption_rate: args.corrupt_rate.clamp(0.0, 1.0),
            drop_rate: args.drop_rate.clamp(0.0, 1.0),
            max_read_chunk: None,
        };
        let mut link = VirtualLink::new(timeout).with_impairments(impairments);
        if let Some(seed) = args.seed {
            link = link.with_seed(seed);
        }
        info!("Using virtual loopback link");
        return Ok(Box::new(link));
    }

    let Some(port) = &args.port else {
        bail!("--port is required unless --virtual is given");
    };
    let default_stop_bits = if protocol == Protocol::Loopback { 2 } else { 1 };
    let stop_bits = StopBitsSetting::from_count(args.stop_bits.unwrap_or(default_stop_bits))
        .context("stop bits must be 1 or 2")?;
    let config = PortConfig::new(port.as_str())
        .with_baud_rate(args.baud)
        .with_stop_bits(stop_bits)
        .with_read_timeout(timeout);

    let transport = SerialTransport::open(&config)?;
    println!("Opened {} at {} baud", port, args.baud);
    Ok(Box::new(transport))
}

/// Flip the stop signal on Ctrl-C, or on Enter for static send
fn spawn_stop_listener(protocol: Protocol, stop: StopSignal) {
    if protocol == Protocol::StaticSend {
        println!("Press Enter to stop sending...");
        let on_enter = stop.clone();
        // A plain thread so a pending stdin read never holds up process exit
        std::thread::spawn(move || {
            let mut line = String::new();
            let _ = std::io::stdin().lock().read_line(&mut line);
            on_enter.stop();
        });
    }

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, stopping session");
            stop.stop();
        }
    });
}

fn list_ports() -> Result<()> {
    let ports = available_ports()?;
    if ports.is_empty() {
        println!("No serial ports found");
    }
    for port in ports {
        println!("{}\t{:?}", port.port_name, port.port_type);
    }
    Ok(())
}

fn print_json(summary: &SessionSummary) -> Result<()> {
    println!("{}", serde_json::to_string(summary)?);
    Ok(())
}
