use crate::room::RejoinPolicy;
use crate::session::DEFAULT_MAX_CHAT_LEN;
use huddle_core::IceServerConfig;
use huddle_core::utils::default_ice_servers;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Pushed to every client as its first message.
    pub ice_servers: Vec<IceServerConfig>,
    pub rejoin_policy: RejoinPolicy,
    pub max_chat_len: usize,
    /// Served under `/static` when set.
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            ice_servers: default_ice_servers(),
            rejoin_policy: RejoinPolicy::default(),
            max_chat_len: DEFAULT_MAX_CHAT_LEN,
            static_dir: None,
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `HUDDLE_*` and `TURN_*` variables. Values that
    /// fail to parse are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(addr) = parse_var::<SocketAddr>("HUDDLE_BIND") {
            config.bind_addr = addr;
        }
        if let Some(policy) = parse_var::<RejoinPolicy>("HUDDLE_REJOIN_POLICY") {
            config.rejoin_policy = policy;
        }
        if let Some(max) = parse_var::<usize>("HUDDLE_MAX_CHAT_LEN") {
            config.max_chat_len = max;
        }
        if let Ok(dir) = env::var("HUDDLE_STATIC_DIR") {
            config.static_dir = Some(PathBuf::from(dir));
        }
        if let Some(turn) = turn_from_env() {
            config.ice_servers.push(turn);
        }

        config
    }
}

fn parse_var<T>(name: &str) -> Option<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring {}={:?}: {}", name, raw, e);
            None
        }
    }
}

fn turn_from_env() -> Option<IceServerConfig> {
    let url = env::var("TURN_URL").ok()?;
    Some(IceServerConfig {
        urls: vec![url],
        username: env::var("TURN_USERNAME").ok(),
        credential: env::var("TURN_CREDENTIAL").ok(),
    })
}
