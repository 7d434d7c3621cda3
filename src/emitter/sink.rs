use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

const TCP_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("{0}")]
    InvalidSpec(&'static str),
    #[error("no address found for {0}")]
    Unresolved(String),
}

/// Destination for status lines: `stdout`, `file:<path>` or `tcp:<host>:<port>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sink {
    Stdout,
    File(PathBuf),
    Tcp { host: String, port: u16 },
}

impl FromStr for Sink {
    type Err = SinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "stdout" {
            return Ok(Sink::Stdout);
        }

        if let Some(path) = s.strip_prefix("file:") {
            if path.is_empty() {
                return Err(SinkError::InvalidSpec(
                    "file sink must be 'file:<path>' with a non-empty path",
                ));
            }
            return Ok(Sink::File(PathBuf::from(path)));
        }

        if let Some(rest) = s.strip_prefix("tcp:") {
            let (host, port) = rest
                .split_once(':')
                .ok_or(SinkError::InvalidSpec("tcp sink must be 'tcp:<host>:<port>'"))?;
            if host.is_empty() || host.contains(':') || port.contains(':') {
                return Err(SinkError::InvalidSpec(
                    "tcp host must be non-empty and must not contain ':'",
                ));
            }
            let port =
                parse_port(port).ok_or(SinkError::InvalidSpec("tcp port must be 1..65535"))?;
            return Ok(Sink::Tcp {
                host: host.to_string(),
                port,
            });
        }

        Err(SinkError::InvalidSpec(
            "outputs must be exactly 'stdout', 'file:<path>', or 'tcp:<host>:<port>'",
        ))
    }
}

fn parse_port(s: &str) -> Option<u16> {
    if s.is_empty() || s.len() > 5 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok().filter(|p| *p != 0)
}

impl fmt::Display for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sink::Stdout => write!(f, "stdout"),
            Sink::File(path) => write!(f, "file:{}", path.display()),
            Sink::Tcp { host, port } => write!(f, "tcp:{}:{}", host, port),
        }
    }
}

impl Sink {
    /// Writes `line` followed by a newline.
    pub fn emit(&self, line: &str) -> Result<(), SinkError> {
        match self {
            Sink::Stdout => {
                let mut stdout = io::stdout().lock();
                writeln!(stdout, "{}", line)?;
                stdout.flush()?;
            }
            Sink::File(path) => {
                let mut file = OpenOptions::new().create(true).append(true).open(path)?;
                writeln!(file, "{}", line)?;
                file.flush()?;
            }
            Sink::Tcp { host, port } => {
                let mut stream = connect(host, *port)?;
                stream.write_all(format!("{}\n", line).as_bytes())?;
            }
        }
        Ok(())
    }
}

fn connect(host: &str, port: u16) -> Result<TcpStream, SinkError> {
    let mut last_err = None;
    for addr in (host, port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, TCP_TIMEOUT) {
            Ok(stream) => {
                stream.set_write_timeout(Some(TCP_TIMEOUT))?;
                return Ok(stream);
            }
            Err(e) => last_err = Some(e),
        }
    }
    match last_err {
        Some(e) => Err(SinkError::Io(e)),
        None => Err(SinkError::Unresolved(format!("{}:{}", host, port))),
    }
}

/// Sends `line` to every sink. A failing sink is logged and skipped.
pub fn emit_to_all(sinks: &[Sink], line: &str) -> usize {
    let mut delivered = 0;
    for sink in sinks {
        match sink.emit(line) {
            Ok(()) => delivered += 1,
            Err(e) => log::error!("Sink failure for {}: {}", sink, e),
        }
    }
    delivered
}
