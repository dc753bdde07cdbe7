//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use crate::amount::Amount;
use crate::connection::Identity;
use crate::errors::{Result, SparkError};
use crate::ledger::Settlement;

#[derive(Debug, Clone)]
pub struct Config {
    /// Horizon endpoint for account lookup, fees and submission
    pub horizon_url: String,
    /// Network passphrase handed to the signer
    pub network_passphrase: String,
    /// Wallet bridge that connects and signs on the user's behalf
    pub wallet_bridge_url: String,
    /// Campaign goal in display units
    pub campaign_target: Amount,
    /// Where donations are paid to
    pub settlement: Settlement,
    /// Validity window of each transfer
    pub tx_timeout: Duration,
    /// Soroban RPC endpoint (e.g. https://soroban-testnet.stellar.org)
    pub rpc_url: String,
    /// Campaign contract to observe; the status poller is off without it
    pub contract_id: Option<String>,
    /// How often to refresh the observed campaign status
    pub poll_interval: Duration,
    /// Maximum number of events to fetch per RPC request
    pub events_per_page: u32,
    /// Ledger to start from when observing the contract
    pub start_ledger: u32,
    /// Port for the REST API server
    pub api_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str, default: &str| -> String {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let target_units: i64 = parse(&get("CAMPAIGN_TARGET", "1000"), "CAMPAIGN_TARGET")?;
        let campaign_target = Amount::from_units(target_units)
            .filter(|a| !a.is_zero() && target_units > 0)
            .ok_or_else(|| SparkError::Config("CAMPAIGN_TARGET must be positive".to_string()))?;

        let poll_secs: u64 = parse(&get("POLL_INTERVAL_SECS", "10"), "POLL_INTERVAL_SECS")?;
        if poll_secs == 0 {
            return Err(SparkError::Config("POLL_INTERVAL_SECS must be positive".to_string()));
        }

        Ok(Config {
            horizon_url: get("HORIZON_URL", "https://horizon-testnet.stellar.org"),
            network_passphrase: get("NETWORK_PASSPHRASE", "Test SDF Network ; September 2015"),
            wallet_bridge_url: get("WALLET_BRIDGE_URL", "http://127.0.0.1:3002"),
            campaign_target,
            settlement: optional("SETTLEMENT_ADDRESS")
                .map(|a| Settlement::ToAddress(Identity::new(a.trim())))
                .unwrap_or_default(),
            tx_timeout: Duration::from_secs(parse(&get("TX_TIMEOUT_SECS", "30"), "TX_TIMEOUT_SECS")?),
            rpc_url: get("RPC_URL", "https://soroban-testnet.stellar.org"),
            contract_id: optional("CONTRACT_ID"),
            poll_interval: Duration::from_secs(poll_secs),
            events_per_page: parse(&get("EVENTS_PER_PAGE", "100"), "EVENTS_PER_PAGE")?,
            start_ledger: parse(&get("START_LEDGER", "0"), "START_LEDGER")?,
            api_port: parse(&get("API_PORT", "3001"), "API_PORT")?,
        })
    }
}

fn parse<T: FromStr>(raw: &str, key: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| SparkError::Config(format!("Invalid {key}")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_match_testnet_campaign() {
        let c = config(&[]).unwrap();
        assert_eq!(c.campaign_target, Amount::from_units(1000).unwrap());
        assert_eq!(c.settlement, Settlement::ToPayer);
        assert_eq!(c.tx_timeout, Duration::from_secs(30));
        assert_eq!(c.poll_interval, Duration::from_secs(10));
        assert_eq!(c.api_port, 3001);
        assert!(c.contract_id.is_none());
        assert_eq!(c.horizon_url, "https://horizon-testnet.stellar.org");
    }

    #[test]
    fn settlement_address_is_injected() {
        let c = config(&[("SETTLEMENT_ADDRESS", "GCAMPAIGN"), ("CONTRACT_ID", "CABC")]).unwrap();
        assert_eq!(c.settlement, Settlement::ToAddress(Identity::new("GCAMPAIGN")));
        assert_eq!(c.contract_id.as_deref(), Some("CABC"));
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = config(&[("API_PORT", "http")]).unwrap_err();
        assert!(err.to_string().contains("API_PORT"));

        for target in ["0", "-5", "lots"] {
            let err = config(&[("CAMPAIGN_TARGET", target)]).unwrap_err();
            assert!(err.to_string().contains("CAMPAIGN_TARGET"), "{target}");
        }

        assert!(config(&[("POLL_INTERVAL_SECS", "0")]).is_err());
    }
}
