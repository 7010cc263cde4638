//! vtgrid - replay captured terminal output through the emulator
//!
//! Reads a byte stream (a `script` capture, the output of a program, ...)
//! from a file or stdin, interprets it on a virtual screen and prints the
//! final screen.
//!
//! # Quick Start
//!
//! ```text
//! vtgrid session.log             # styled replay of a capture
//! ls --color | vtgrid --plain    # plain text dump with status header
//! vtgrid -c 132 -r 50 top.log    # replay on a 132x50 screen
//! ```

use std::env;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::Context;
use tracing::{info, trace};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use vtgrid::config::{Config, LogConfig};
use vtgrid::core::session::{Host, Session};
use vtgrid::render;

/// Command line options; anything set here overrides the config file
#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    columns: Option<usize>,
    rows: Option<usize>,
    plain: bool,
    config: Option<PathBuf>,
    input: Option<PathBuf>,
}

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

const READ_CHUNK: usize = 4096;

fn print_version() {
    eprintln!("vtgrid {}", VERSION);
}

fn print_help() {
    eprintln!("vtgrid {} - replay terminal output on a virtual screen", VERSION);
    eprintln!();
    eprintln!("Usage: vtgrid [OPTIONS] [FILE]");
    eprintln!();
    eprintln!("Reads FILE, or stdin when omitted.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --columns <N>     Screen width (default 80)");
    eprintln!("  -r, --rows <N>        Screen height (default 24)");
    eprintln!("      --plain           Plain text dump instead of styled output");
    eprintln!("      --config <PATH>   Configuration file");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Configuration: ~/.vtgrid/config.toml");
    eprintln!("Logging: RUST_LOG overrides [log] level");
}

fn parse_number(flag: &str, value: Option<&String>) -> Result<usize, String> {
    let value = value.ok_or_else(|| format!("Missing argument for {}", flag))?;
    value
        .parse()
        .map_err(|_| format!("Invalid number for {}: {}", flag, value))
}

fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut cli = CliArgs::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "-c" | "--columns" => {
                i += 1;
                cli.columns = Some(parse_number(&args[i - 1], args.get(i))?);
            }
            "-r" | "--rows" => {
                i += 1;
                cli.rows = Some(parse_number(&args[i - 1], args.get(i))?);
            }
            "--plain" => cli.plain = true,
            "--config" => {
                i += 1;
                let path = args.get(i).ok_or("Missing argument for --config")?;
                cli.config = Some(PathBuf::from(path));
            }
            arg if arg.starts_with('-') && arg != "-" => {
                return Err(format!("Unknown argument: {}. Use -h for help.", arg));
            }
            arg => {
                if cli.input.is_some() {
                    return Err(format!("Unexpected argument: {}", arg));
                }
                if arg != "-" {
                    cli.input = Some(PathBuf::from(arg));
                }
            }
        }
        i += 1;
    }

    Ok(cli)
}

/// Incremental UTF-8 decoding across read boundaries
#[derive(Debug, Default)]
struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Decode as much as possible; an incomplete trailing sequence is kept
    /// for the next chunk and invalid bytes become U+FFFD
    fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let mut text = String::with_capacity(self.pending.len());
        let mut rest: &[u8] = &self.pending;

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    // valid_up_to guarantees this prefix is UTF-8
                    text.push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match e.error_len() {
                        Some(len) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }

        self.pending = rest.to_vec();
        text
    }

    /// Flush at end of input
    fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            char::REPLACEMENT_CHARACTER.to_string()
        }
    }
}

/// Host for offline replay: there is no child process, so replies and
/// resize requests are only logged
#[derive(Debug, Default)]
struct ReplayHost {
    replies: usize,
    bells: usize,
}

impl Host for ReplayHost {
    fn write(&mut self, reply: &str) {
        self.replies += 1;
        info!("Reply {:?}", reply);
    }

    fn resize(&mut self, columns: usize, rows: usize) {
        info!("Screen resized to {}x{}", columns, rows);
    }

    fn bell(&mut self) {
        self.bells += 1;
    }
}

fn init_logging(log: &LogConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&log.level))
        .with_context(|| format!("Invalid log level {:?}", log.level))?;

    match &log.file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .finish();
            let _ = tracing::subscriber::set_global_default(subscriber);
        }
        None => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .finish();
            let _ = tracing::subscriber::set_global_default(subscriber);
        }
    }
    Ok(())
}

fn replay<R: Read, H: Host>(mut input: R, session: &mut Session<H>) -> io::Result<()> {
    let mut decoder = Utf8Decoder::default();
    let mut buffer = vec![0u8; READ_CHUNK];

    loop {
        let n = match input.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        let text = decoder.decode(&buffer[..n]);
        let damage = session.feed(&text);
        trace!("Read {} bytes, damage {:?} cells", n, damage.len());
    }

    let tail = decoder.finish();
    if !tail.is_empty() {
        session.feed(&tail);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let cli = match parse_args(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };
    if let Some(columns) = cli.columns {
        config.terminal.columns = columns;
    }
    if let Some(rows) = cli.rows {
        config.terminal.rows = rows;
    }
    config.render.plain |= cli.plain;

    init_logging(&config.log)?;
    info!(
        "vtgrid {} starting, {}x{}",
        VERSION, config.terminal.columns, config.terminal.rows
    );

    let mut session = Session::new(
        config.terminal.columns,
        config.terminal.rows,
        ReplayHost::default(),
    )
    .context("Cannot create terminal")?;

    match &cli.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            replay(file, &mut session)
        }
        None => replay(io::stdin().lock(), &mut session),
    }
    .context("Failed to read input")?;

    info!(
        "Replay finished: {} replies, {} bells",
        session.host().replies,
        session.host().bells
    );

    let mut stdout = io::stdout().lock();
    if config.render.plain {
        stdout.write_all(render::dump(&session, config.render.show_cursor).as_bytes())?;
        stdout.flush()?;
    } else {
        render::paint(&mut stdout, &session, config.render.show_cursor)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vtgrid::core::session::NullHost;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("vtgrid")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_args() {
        let cli = parse_args(&args(&["-c", "132", "--rows", "50", "--plain", "cap.log"])).unwrap();
        assert_eq!(
            cli,
            CliArgs {
                columns: Some(132),
                rows: Some(50),
                plain: true,
                config: None,
                input: Some(PathBuf::from("cap.log")),
            }
        );
        assert_eq!(parse_args(&args(&["-"])).unwrap(), CliArgs::default());
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse_args(&args(&["--columns"])).is_err());
        assert!(parse_args(&args(&["-r", "many"])).is_err());
        assert!(parse_args(&args(&["--bogus"])).is_err());
        assert!(parse_args(&args(&["a.log", "b.log"])).is_err());
    }

    #[test]
    fn test_decoder_split_sequence() {
        let bytes = "aあb".as_bytes();
        let mut decoder = Utf8Decoder::default();
        assert_eq!(decoder.decode(&bytes[..2]), "a");
        assert_eq!(decoder.decode(&bytes[2..3]), "");
        assert_eq!(decoder.decode(&bytes[3..]), "あb");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_decoder_invalid_bytes() {
        let mut decoder = Utf8Decoder::default();
        assert_eq!(decoder.decode(b"a\xffb\xc3"), "a\u{fffd}b");
        assert_eq!(decoder.finish(), "\u{fffd}");
    }

    #[test]
    fn test_replay_in_small_chunks() {
        struct Trickle<'a>(&'a [u8]);
        impl Read for Trickle<'_> {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                let n = self.0.len().min(buf.len()).min(3);
                buf[..n].copy_from_slice(&self.0[..n]);
                self.0 = &self.0[n..];
                Ok(n)
            }
        }

        let mut session = Session::new(10, 3, NullHost).unwrap();
        let input = "\x1b[2;3H\x1b[1mé─x".as_bytes();
        replay(Trickle(input), &mut session).unwrap();
        assert_eq!(session.cell(1, 2).unwrap().character, Some('é'));
        assert_eq!(session.cell(1, 3).unwrap().character, Some('─'));
        assert!(session.cell(1, 4).unwrap().attrs.bold());
        assert_eq!(session.cursor(), (1, 5));
    }
}
