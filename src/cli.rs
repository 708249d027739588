use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;


pub static DEFAULT_PORT: u16 = 8050;

/// Serve the food desert facility-siting dashboard.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// Yaml config naming the data files
    #[arg(long, default_value = "config.yaml")]
    pub config: PathBuf,

    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// An IP address or a host name such as localhost
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,
}

impl Cli {
    /// Resolves the host and port to the address to listen on.  Host names are looked up, and
    /// the first address they resolve to is used.
    pub async fn listen_addr(&self) -> io::Result<SocketAddr> {
        let host = self.host.trim_start_matches('[').trim_end_matches(']');
        let mut addrs = tokio::net::lookup_host((host, self.port)).await?;
        addrs.next().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound,
                           format!("{} did not resolve to any address", self.host))
        })
    }
}
