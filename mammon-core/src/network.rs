use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which chain a set of consensus parameters belongs to.
///
/// The difficulty estimator only uses this to pick its floor; the ports are
/// carried for tools that need to talk about a network by name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    pub fn is_testnet(&self) -> bool {
        matches!(self, Network::Testnet)
    }

    pub fn from_testnet_flag(testnet: bool) -> Self {
        if testnet {
            Network::Testnet
        } else {
            Network::Mainnet
        }
    }

    pub fn p2p_port(&self) -> u16 {
        match self {
            Network::Mainnet => 18080,
            Network::Testnet => 28080,
        }
    }

    pub fn rpc_port(&self) -> u16 {
        match self {
            Network::Mainnet => 18081,
            Network::Testnet => 28081,
        }
    }

    pub fn zmq_port(&self) -> u16 {
        match self {
            Network::Mainnet => 18082,
            Network::Testnet => 28082,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
        }
    }
}

impl FromStr for Network {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "main" => Ok(Network::Mainnet),
            "testnet" | "test" => Ok(Network::Testnet),
            other => Err(anyhow!("Unknown network '{}'", other)),
        }
    }
}
