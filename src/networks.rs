use crate::error::{FlowError, Result};

const MAINNET_BUFFER_SECONDS: u64 = 4 * 3_600;
const TESTNET_BUFFER_SECONDS: u64 = 3_600;

/// A network the protocol is deployed on, with the buffer it enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Network {
    pub chain_id: u64,
    pub slug: &'static str,
    pub name: &'static str,
    pub is_testnet: bool,
    pub buffer_time_seconds: u64,
}

const fn mainnet(chain_id: u64, slug: &'static str, name: &'static str) -> Network {
    Network {
        chain_id,
        slug,
        name,
        is_testnet: false,
        buffer_time_seconds: MAINNET_BUFFER_SECONDS,
    }
}

const fn testnet(chain_id: u64, slug: &'static str, name: &'static str) -> Network {
    Network {
        chain_id,
        slug,
        name,
        is_testnet: true,
        buffer_time_seconds: TESTNET_BUFFER_SECONDS,
    }
}

pub const NETWORKS: &[Network] = &[
    mainnet(1, "eth-mainnet", "Ethereum"),
    mainnet(10, "optimism-mainnet", "Optimism"),
    mainnet(56, "bsc-mainnet", "BNB Smart Chain"),
    mainnet(100, "xdai-mainnet", "Gnosis Chain"),
    mainnet(137, "polygon-mainnet", "Polygon"),
    mainnet(8453, "base-mainnet", "Base"),
    mainnet(42161, "arbitrum-one", "Arbitrum One"),
    mainnet(42220, "celo-mainnet", "Celo"),
    mainnet(43114, "avalanche-c", "Avalanche C"),
    testnet(43113, "avalanche-fuji", "Fuji (C-Chain)"),
    testnet(80002, "polygon-amoy", "Polygon Amoy"),
    testnet(84532, "base-sepolia", "Base Sepolia"),
    testnet(11155111, "eth-sepolia", "Sepolia"),
    testnet(11155420, "optimism-sepolia", "Optimism Sepolia"),
];

/// Look a network up by slug (case-insensitive) or decimal chain id.
pub fn find_network(slug_or_chain_id: &str) -> Result<&'static Network> {
    let key = slug_or_chain_id.trim();
    let chain_id = key.parse::<u64>().ok();

    NETWORKS
        .iter()
        .find(|n| Some(n.chain_id) == chain_id || n.slug.eq_ignore_ascii_case(key))
        .ok_or_else(|| FlowError::UnknownNetwork(key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_by_slug_and_chain_id() {
        assert_eq!(find_network("Polygon-Mainnet").unwrap().chain_id, 137);
        assert_eq!(find_network("8453").unwrap().slug, "base-mainnet");
    }

    #[test]
    fn buffer_times_follow_network_kind() {
        assert_eq!(find_network("eth-mainnet").unwrap().buffer_time_seconds, 14_400);
        assert_eq!(find_network("eth-sepolia").unwrap().buffer_time_seconds, 3_600);
    }

    #[test]
    fn unknown_network_is_an_error() {
        assert_eq!(
            find_network("goerli"),
            Err(FlowError::UnknownNetwork("goerli".to_string()))
        );
    }

    #[test]
    fn chain_ids_are_unique() {
        for (i, a) in NETWORKS.iter().enumerate() {
            assert!(NETWORKS[i + 1..].iter().all(|b| b.chain_id != a.chain_id));
        }
    }
}
