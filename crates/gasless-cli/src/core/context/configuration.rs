use std::fs;

use gasless_account::AccountConfiguration;
use gasless_common::monitoring::Configuration as MonitoringConfiguration;
use gasless_ton::keys::{KeyPair, PublicKey};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::context::environment::{JSONPath, Variables};
use crate::core::Error;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerbosityConfiguration {
    Debug,

    #[default]
    Info,
}

/// Keys of the account. The secret key is only required by the commands sending transfers.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct KeyConfiguration {
    /// Hex encoded ed25519 seed
    #[serde(default)]
    pub secret_key: Option<String>,

    #[serde(default)]
    pub public_key: Option<PublicKey>,
}

impl KeyConfiguration {
    pub fn key_pair(&self) -> Result<KeyPair, Error> {
        let secret_key = self
            .secret_key
            .as_deref()
            .ok_or(Error::Configuration("account.secret_key is required to sign transfers".to_string()))?;

        KeyPair::from_hex(secret_key).map_err(|e| Error::Configuration(e.to_string()))
    }

    /// Public key of the account, derived from the secret key when not given
    pub fn public_key(&self) -> Result<PublicKey, Error> {
        match (self.public_key, &self.secret_key) {
            (Some(public_key), _) => Ok(public_key),
            (None, Some(_)) => self.key_pair().map(|x| x.public_key()),
            (None, None) => Err(Error::Configuration("either account.public_key or account.secret_key must be set".to_string())),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub verbosity: VerbosityConfiguration,

    #[serde(default)]
    pub monitoring: Option<MonitoringConfiguration>,

    #[serde(default)]
    pub account: KeyConfiguration,

    #[serde(flatten)]
    pub gasless: AccountConfiguration,
}

impl Configuration {
    pub fn from_profile(profile: &Profile) -> Result<Self, Error> {
        let data = serde_json::to_string(&profile.0).map_err(|e| Error::Configuration(e.to_string()))?;

        serde_json::from_str(&data).map_err(|e| Error::Configuration(e.to_string()))
    }
}

/// Raw configuration, merged from the profile file, the environment and the arguments
#[derive(Clone, Debug, Deserialize)]
pub struct Profile(Map<String, Value>);

impl Profile {
    pub fn empty() -> Self {
        Self(Map::new())
    }

    pub fn from_file(path: &str) -> Result<Self, Error> {
        let data = fs::read(path).map_err(|e| Error::Configuration(format!("could not read profile {}: {}", path, e)))?;
        let variables: Map<String, Value> = serde_json::from_slice(&data).map_err(|e| Error::Configuration(e.to_string()))?;

        Ok(Self(variables))
    }

    pub fn merge(&mut self, profile: &Profile) {
        #[rustfmt::skip]
        fn merge_rec(profile: &mut Map<String, Value>, other: &Map<String, Value>) {
            for (k, v) in other {
                match (profile.get_mut(k), v) {
                    (Some(Value::Object(a_obj)), Value::Object(b_obj)) => { merge_rec(a_obj, b_obj); },
                    _ => { profile.insert(k.clone(), v.clone()); },
                }
            }
        }

        merge_rec(&mut self.0, &profile.0)
    }

    pub fn insert_variables(&mut self, variables: Variables) -> Result<(), Error> {
        for (key, value) in variables.into_iter() {
            self.insert_variable(key, value)?
        }

        Ok(())
    }

    pub fn insert_variable(&mut self, path: JSONPath, value: Value) -> Result<(), Error> {
        fn insert_rec(object: &mut Map<String, Value>, path: &[String], value: Value) -> Result<(), Error> {
            if path.len() == 1 {
                object.insert(path[0].to_string(), value);
                return Ok(());
            }

            let inner = object
                .entry(path[0].to_string())
                .or_insert(Value::Object(Map::new()))
                .as_object_mut()
                .ok_or(Error::Configuration(format!("could not merge variable {} in configuration", path[0])))?;

            insert_rec(inner, &path[1..], value)
        }

        insert_rec(&mut self.0, &path, value)
    }
}

#[cfg(test)]
mod tests {
    use gasless_ton::Coins;
    use serde_json::json;

    use super::*;

    const SEED: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";
    const PUBLIC_KEY: &str = "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a";

    fn profile(value: Value) -> Profile {
        match value {
            Value::Object(x) => Profile(x),
            _ => panic!("profile must be an object"),
        }
    }

    fn minimal() -> Profile {
        profile(json!({
            "ton": { "provider": "toncenter", "network": "testnet" },
            "tonapi": { "provider": "tonapi" },
            "paymaster_token": { "address": "EQCxE6mUtQJKFnGfaROTKOt1lZbDiiX1kCixRv7Nw2Id_sDs" },
            "wallet": { "code": "te6cckEBAQEAAgAAAEysuc0=" }
        }))
    }

    #[test]
    fn test_profile_merge() {
        let mut base = profile(json!({ "ton": { "network": "mainnet", "api_key": "a" }, "verbosity": "info" }));
        let other = profile(json!({ "ton": { "network": "testnet" }, "verbosity": "debug" }));

        base.merge(&other);

        assert_eq!(Value::Object(base.0), json!({ "ton": { "network": "testnet", "api_key": "a" }, "verbosity": "debug" }));
    }

    #[test]
    fn test_insert_variable_creates_intermediate_objects() {
        let mut profile = Profile::empty();

        profile
            .insert_variable(JSONPath::from_str("paymaster_token.address"), json!("EQCxE6mUtQJKFnGfaROTKOt1lZbDiiX1kCixRv7Nw2Id_sDs"))
            .unwrap();

        assert_eq!(Value::Object(profile.0), json!({ "paymaster_token": { "address": "EQCxE6mUtQJKFnGfaROTKOt1lZbDiiX1kCixRv7Nw2Id_sDs" } }));
    }

    #[test]
    fn test_insert_variable_into_scalar_fails() {
        let mut profile = profile(json!({ "ton": "toncenter" }));

        assert!(profile.insert_variable(JSONPath::from_str("ton.network"), json!("testnet")).is_err());
    }

    #[test]
    fn test_configuration_from_profile() {
        let mut profile = minimal();
        profile.insert_variable(JSONPath::from_str("transfer_max_fee"), json!(5_000_000)).unwrap();
        profile.insert_variable(JSONPath::from_str("account.secret_key"), json!(SEED)).unwrap();

        let configuration = Configuration::from_profile(&profile).unwrap();

        assert!(matches!(configuration.verbosity, VerbosityConfiguration::Info));
        assert!(configuration.monitoring.is_none());
        assert_eq!(configuration.gasless.paymaster.transfer_max_fee, Some(Coins::from_nano(5_000_000)));
        assert_eq!(configuration.account.public_key().unwrap().to_hex(), PUBLIC_KEY);
    }

    #[test]
    fn test_public_key_without_secret() {
        let mut profile = minimal();
        profile.insert_variable(JSONPath::from_str("account.public_key"), json!(PUBLIC_KEY)).unwrap();

        let configuration = Configuration::from_profile(&profile).unwrap();

        assert_eq!(configuration.account.public_key().unwrap().to_hex(), PUBLIC_KEY);
        assert!(configuration.account.key_pair().is_err());
    }

    #[test]
    fn test_missing_keys_are_reported() {
        let configuration = Configuration::from_profile(&minimal()).unwrap();

        assert!(configuration.account.public_key().is_err());
    }
}
