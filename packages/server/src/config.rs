//! Listener settings read from the environment at startup.

/// Address and port the HTTP server binds to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to bind (`BIND_ADDR`).
    pub bind_addr: String,
    /// TCP port (`PORT`).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl ServerConfig {
    /// Reads `BIND_ADDR` and `PORT`, keeping defaults for anything unset
    /// or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] over an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind_addr = lookup("BIND_ADDR")
            .filter(|addr| !addr.trim().is_empty())
            .unwrap_or(defaults.bind_addr);

        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                log::warn!("Ignoring invalid PORT '{raw}', using {}", defaults.port);
                defaults.port
            }),
            None => defaults.port,
        };

        Self { bind_addr, port }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_unset() {
        let config = ServerConfig::from_lookup(|_| None);
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.port, 8000);
    }

    #[test]
    fn reads_overrides_and_ignores_garbage() {
        let config = ServerConfig::from_lookup(|key| match key {
            "BIND_ADDR" => Some("127.0.0.1".to_string()),
            "PORT" => Some("nope".to_string()),
            _ => None,
        });
        assert_eq!(config.bind_addr, "127.0.0.1");
        assert_eq!(config.port, 8000);

        let config = ServerConfig::from_lookup(|key| (key == "PORT").then(|| "9100".to_string()));
        assert_eq!(config.port, 9100);
    }
}
