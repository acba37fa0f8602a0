use std::net::{Ipv4Addr, SocketAddr};

use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Largest accepted upload body, in bytes.
    pub max_upload_bytes: usize,
    /// Answer CORS preflights for any origin (browser front ends).
    pub permissive_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8480)),
            max_upload_bytes: 25 * 1024 * 1024,
            permissive_cors: false,
        }
    }
}

/// The `[server]` table of a brandkit config file.
#[derive(Default, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    server: ServerConfig,
}

impl ServerConfig {
    /// Read the `[server]` table from a TOML document. Other tables are ignored.
    pub fn from_toml_str(s: &str) -> ServerResult<Self> {
        let doc: ConfigDocument =
            toml::from_str(s).map_err(|e| ServerError::Config(e.to_string()))?;
        Ok(doc.server)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:8480".parse::<SocketAddr>().unwrap());
        assert_eq!(c.max_upload_bytes, 25 * 1024 * 1024);
        assert!(!c.permissive_cors);
    }

    #[test]
    fn reads_server_table() {
        let c = ServerConfig::from_toml_str(
            r#"
            root = "/srv/brandkit"

            [server]
            bind_addr = "0.0.0.0:9000"
            "#,
        )
        .unwrap();
        assert_eq!(c.bind_addr, "0.0.0.0:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(c.max_upload_bytes, ServerConfig::default().max_upload_bytes);
    }

    #[test]
    fn missing_table_is_default() {
        assert_eq!(ServerConfig::from_toml_str("").unwrap(), ServerConfig::default());
        assert!(ServerConfig::from_toml_str("[server]\nbind_addr = 7").is_err());
    }
}
