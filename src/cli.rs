use clap::Parser;
use std::path::PathBuf;

use crate::config::AppConfig;

#[derive(Parser, Clone, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// YAML configuration file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// overrides server.host
    #[arg(long)]
    pub host: Option<String>,

    /// overrides server.port
    #[arg(long)]
    pub port: Option<u16>,
}

impl Args {
    pub fn apply(&self, cfg: &mut AppConfig) {
        if let Some(host) = &self.host {
            cfg.server.host = host.clone();
        }
        if let Some(port) = self.port {
            cfg.server.port = port;
        }
    }
}
