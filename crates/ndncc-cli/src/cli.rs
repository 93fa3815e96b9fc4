//! Command-line arguments.

use std::{fs, io, path::PathBuf, time::Duration};

use clap::{ArgAction, Parser, Subcommand};
use ndncc_client::ClientConfig;
use ndncc_core::{CommandStamper, DigestSigner, Ed25519Signer};
use ndncc_proto::{DecodeError, Name};
use thiserror::Error;

/// Startup failures before any command is sent.
#[derive(Debug, Error)]
pub enum SetupError {
    /// The key file could not be read.
    #[error("reading key {path}: {source}")]
    KeyRead {
        /// Key file.
        path: PathBuf,
        /// I/O error.
        #[source]
        source: io::Error,
    },

    /// The key file is not a 32-byte Ed25519 seed.
    #[error("key {path} is {len} bytes, expected 32")]
    KeyLength {
        /// Key file.
        path: PathBuf,
        /// Actual size.
        len: usize,
    },

    /// The key name does not parse.
    #[error("invalid key name: {0}")]
    KeyName(#[from] DecodeError),
}

#[derive(Debug, Parser)]
#[command(name = "ndncc", version, about = "Control a local NFD forwarder")]
pub struct Cli {
    /// Forwarder's Unix socket
    #[arg(long, default_value = "/run/nfd/nfd.sock")]
    pub socket: PathBuf,

    /// Ed25519 seed (32 raw bytes) for signing commands; digest signing if absent
    #[arg(long)]
    pub key: Option<PathBuf>,

    /// Name placed in the KeyLocator when signing with --key
    #[arg(long, default_value = "/localhost/operator/KEY/1")]
    pub key_name: String,

    /// Lifetime of command Interests, in milliseconds
    #[arg(long, default_value_t = 4000)]
    pub command_lifetime_ms: u64,

    /// More log output; repeat for trace level
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a face toward a remote URI
    AddFace {
        /// Remote URI; udp4:// and port 6363 are assumed when omitted
        uri: String,
    },
    /// Destroy a face
    RemoveFace {
        /// Face id
        face_id: u64,
    },
    /// Register a route toward a face
    AddRoute {
        /// Name prefix
        name: String,
        /// Face id
        face_id: u64,
    },
    /// Unregister a route from a face
    RemoveRoute {
        /// Name prefix
        name: String,
        /// Face id
        face_id: u64,
    },
    /// Print the id of the face with a remote URI
    QueryFaceId {
        /// Remote URI, as the forwarder reports it
        uri: String,
    },
    /// Connect to a nearby testbed hub and route toward it
    Autoconf {
        /// Hub discovery endpoint
        #[arg(long)]
        discovery_url: Option<String>,
        /// Fail when a route registration is refused
        #[arg(long)]
        require_routes: bool,
    },
    /// Print face events until interrupted
    Watch,
}

impl Cli {
    /// Client configuration with the command-line overrides applied.
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig {
            socket_path: self.socket.clone(),
            command_lifetime: Duration::from_millis(self.command_lifetime_ms),
            ..ClientConfig::default()
        };
        if let Command::Autoconf { discovery_url, require_routes } = &self.command {
            if let Some(url) = discovery_url {
                config.autoconf.discovery_url.clone_from(url);
            }
            config.autoconf.require_route_success = *require_routes;
        }
        config
    }

    /// Stamper signing with the configured key.
    pub fn stamper(&self) -> Result<CommandStamper, SetupError> {
        let Some(path) = &self.key else {
            return Ok(CommandStamper::new(DigestSigner));
        };

        let bytes = fs::read(path)
            .map_err(|source| SetupError::KeyRead { path: path.clone(), source })?;
        let seed: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| SetupError::KeyLength { path: path.clone(), len: bytes.len() })?;
        let key_name: Name = self.key_name.parse()?;

        Ok(CommandStamper::new(Ed25519Signer::from_seed(&seed, key_name)))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ndncc").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let cli = parse(&["watch"]);
        let config = cli.client_config();
        assert_eq!(config.socket_path, PathBuf::from("/run/nfd/nfd.sock"));
        assert_eq!(config.command_lifetime, Duration::from_secs(4));
        assert!(matches!(cli.command, Command::Watch));
    }

    #[test]
    fn route_arguments() {
        let cli = parse(&["add-route", "/ndn/edu", "300"]);
        assert!(matches!(
            cli.command,
            Command::AddRoute { ref name, face_id: 300 } if name == "/ndn/edu"
        ));
    }

    #[test]
    fn autoconf_overrides() {
        let cli = parse(&[
            "--socket",
            "/tmp/nfd.sock",
            "autoconf",
            "--discovery-url",
            "http://127.0.0.1:8080/",
            "--require-routes",
        ]);
        let config = cli.client_config();
        assert_eq!(config.socket_path, PathBuf::from("/tmp/nfd.sock"));
        assert_eq!(config.autoconf.discovery_url, "http://127.0.0.1:8080/");
        assert!(config.autoconf.require_route_success);
    }

    #[test]
    fn verbosity_flags_anywhere() {
        let cli = parse(&["-v", "watch", "-v"]);
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);

        let cli = parse(&["add-face", "--quiet", "192.0.2.1"]);
        assert_eq!(cli.verbose, 0);
        assert!(cli.quiet);
    }

    #[test]
    fn face_id_must_be_numeric() {
        assert!(Cli::try_parse_from(["ndncc", "remove-face", "abc"]).is_err());
    }

    #[test]
    fn seed_file_selects_ed25519() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[7u8; 32]).unwrap();

        let path = file.path().to_str().unwrap();
        let cli = parse(&["--key", path, "watch"]);
        assert!(cli.stamper().is_ok());
    }

    #[test]
    fn short_seed_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[7u8; 16]).unwrap();

        let path = file.path().to_str().unwrap();
        let cli = parse(&["--key", path, "watch"]);
        assert!(matches!(cli.stamper(), Err(SetupError::KeyLength { len: 16, .. })));
    }

    #[test]
    fn missing_key_file() {
        let cli = parse(&["--key", "/nonexistent/ndncc.key", "watch"]);
        assert!(matches!(cli.stamper(), Err(SetupError::KeyRead { .. })));
    }
}
