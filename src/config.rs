//! Node configuration loading. The wire format is four non-empty lines of
//! plain text, so unlike `gamecore::config::GameConfig`
//! (which defers to `serdeconv`'s TOML support) this is parsed by hand, the
//! way `RingNode.load_config` does it.

use crate::error::RingError;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;

/// Immutable node configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub right_neighbor: SocketAddr,
    pub nickname: String,
    pub token_hold_time: u64,
    pub is_token_originator: bool,
    pub local_bind_port: u16,
}

impl NodeConfig {
    /// Loads the 4-line config file and combines it with the local bind port
    /// supplied on the command line.
    pub fn load<P: AsRef<Path>>(path: P, local_bind_port: u16) -> Result<NodeConfig, RingError> {
        let contents = fs::read_to_string(path.as_ref()).map_err(|err| {
            RingError::Config(format!("could not open {}: {}", path.as_ref().display(), err))
        })?;

        let lines: Vec<&str> = contents.lines().map(str::trim).filter(|line| !line.is_empty()).collect();

        if lines.len() < 4 {
            return Err(RingError::Config(format!(
                "expected 4 non-empty lines, found {}",
                lines.len()
            )));
        }

        let right_neighbor = lines[0]
            .parse::<SocketAddr>()
            .map_err(|err| RingError::Config(format!("invalid right neighbor address {:?}: {}", lines[0], err)))?;

        let nickname = lines[1].to_string();

        let token_hold_time = lines[2]
            .parse::<u64>()
            .map_err(|err| RingError::Config(format!("invalid token hold time {:?}: {}", lines[2], err)))?;

        let is_token_originator = lines[3].eq_ignore_ascii_case("true");

        Ok(NodeConfig {
            right_neighbor,
            nickname,
            token_hold_time,
            is_token_originator,
            local_bind_port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(contents: &str) -> tempfile_path::TempFile {
        tempfile_path::TempFile::with_contents(contents)
    }

    mod tempfile_path {
        use std::fs;
        use std::io::Write;
        use std::path::PathBuf;

        /// Minimal self-cleaning temp file, avoiding a dependency on the
        /// `tempfile` crate for a single test helper.
        pub struct TempFile {
            path: PathBuf,
        }

        impl TempFile {
            pub fn with_contents(contents: &str) -> TempFile {
                let mut path = std::env::temp_dir();
                path.push(format!("ringnode-config-test-{:?}-{}", std::thread::current().id(), contents.len()));
                let mut file = fs::File::create(&path).unwrap();
                file.write_all(contents.as_bytes()).unwrap();
                TempFile { path }
            }

            pub fn path(&self) -> &std::path::Path {
                &self.path
            }
        }

        impl Drop for TempFile {
            fn drop(&mut self) {
                let _ = fs::remove_file(&self.path);
            }
        }
    }

    #[test]
    fn loads_a_well_formed_config() {
        let file = write_config("127.0.0.1:9001\nA\n1\ntrue\n");
        let config = NodeConfig::load(file.path(), 9000).unwrap();

        assert_eq!(config.right_neighbor, "127.0.0.1:9001".parse::<SocketAddr>().unwrap());
        assert_eq!(config.nickname, "A");
        assert_eq!(config.token_hold_time, 1);
        assert!(config.is_token_originator);
        assert_eq!(config.local_bind_port, 9000);
    }

    #[test]
    fn skips_blank_lines() {
        let file = write_config("127.0.0.1:9001\n\nA\n1\nfalse\n\n");
        let config = NodeConfig::load(file.path(), 9000).unwrap();
        assert_eq!(config.nickname, "A");
        assert!(!config.is_token_originator);
    }

    #[test]
    fn rejects_too_few_lines() {
        let file = write_config("127.0.0.1:9001\nA\n");
        assert!(NodeConfig::load(file.path(), 9000).is_err());
    }

    #[test]
    fn rejects_missing_file() {
        assert!(NodeConfig::load("/nonexistent/path/to/config", 9000).is_err());
    }
}
