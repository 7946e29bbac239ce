use gasless_account::{GaslessAccount, ReadOnlyAccount};
use tracing::debug;

use crate::core::context::configuration::{Configuration, Profile};
use crate::core::context::environment::VariablesResolver;
use crate::core::Error;

pub mod configuration;
pub mod environment;

#[derive(Clone)]
pub struct Context {
    pub configuration: Configuration,
}

impl Context {
    pub fn new(configuration: Configuration) -> Context {
        Context { configuration }
    }

    /// Configuration merged from, by increasing precedence, the profile file, the `GASLESS_*`
    /// environment variables and the `--config name=value` arguments
    pub fn load(profile: Option<&str>, arguments: &[String]) -> Result<Self, Error> {
        let mut complete_profile = Profile::empty();

        let resolver = VariablesResolver::initialize()?;
        let environment = resolver.resolve_environment()?;
        let arguments = resolver.resolve_arguments(arguments)?;

        let profile_path = profile
            .or_else(|| arguments.get("profile").and_then(|x| x.as_str()))
            .or_else(|| environment.get("profile").and_then(|x| x.as_str()))
            .filter(|x| !x.is_empty())
            .map(str::to_string);

        match &profile_path {
            Some(path) => debug!("loading profile {}", path),
            None => debug!("no profile given, configuration is read from the environment and the arguments only"),
        }

        let profile = profile_path.as_deref().map(Profile::from_file).unwrap_or(Ok(Profile::empty()))?;

        complete_profile.merge(&profile);
        complete_profile.insert_variables(environment)?;
        complete_profile.insert_variables(arguments)?;

        Configuration::from_profile(&complete_profile).map(Self::new)
    }

    /// Account able to sign, requires the secret key
    pub fn signing_account(&self) -> Result<GaslessAccount, Error> {
        let key_pair = self.configuration.account.key_pair()?;

        Ok(GaslessAccount::new(key_pair, &self.configuration.gasless)?)
    }

    pub fn read_only_account(&self) -> Result<ReadOnlyAccount, Error> {
        let public_key = self.configuration.account.public_key()?;

        Ok(ReadOnlyAccount::new(public_key, &self.configuration.gasless)?)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use gasless_account::ReadAccount;
    use gasless_ton::{Coins, Network};
    use serde_json::json;

    use crate::core::context::Context;

    const SEED: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";

    fn write_profile(name: &str) -> String {
        let path = std::env::temp_dir().join(format!("gasless-{}-{}.json", name, std::process::id()));
        let profile = json!({
            "verbosity": "debug",
            "ton": { "provider": "toncenter", "network": "mainnet" },
            "tonapi": { "provider": "tonapi", "api_key": "secret" },
            "paymaster_token": { "address": "EQCxE6mUtQJKFnGfaROTKOt1lZbDiiX1kCixRv7Nw2Id_sDs" },
            "transfer_max_fee": "1000",
            "wallet": { "code": "te6cckEBAQEAAgAAAEysuc0=" }
        });
        fs::write(&path, profile.to_string()).unwrap();

        path.to_string_lossy().to_string()
    }

    #[test]
    fn arguments_take_precedence_over_profile() {
        // Given
        let path = write_profile("precedence");

        // When
        let context = Context::load(
            Some(&path),
            &[
                "ton_network=testnet".to_string(),
                "transfer_max_fee=5000000".to_string(),
                format!("account_secret_key='{}'", SEED),
            ],
        )
        .unwrap();
        fs::remove_file(&path).unwrap();

        // Then
        let configuration = &context.configuration;
        assert_eq!(configuration.gasless.network(), Network::Testnet);
        assert_eq!(configuration.gasless.paymaster.transfer_max_fee, Some(Coins::from_nano(5_000_000)));
        assert!(configuration.gasless.tonapi.is_some());
    }

    #[test]
    fn accounts_are_built_from_the_keys() {
        let path = write_profile("accounts");

        let context = Context::load(Some(&path), &[format!("account_secret_key='{}'", SEED)]).unwrap();
        fs::remove_file(&path).unwrap();

        let signing = context.signing_account().unwrap();
        let read_only = context.read_only_account().unwrap();
        assert_eq!(signing.address(), read_only.address());
    }

    #[test]
    fn signing_account_requires_the_secret_key() {
        let path = write_profile("public");

        let context = Context::load(
            Some(&path),
            &["account_public_key=d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a".to_string()],
        )
        .unwrap();
        fs::remove_file(&path).unwrap();

        assert!(context.read_only_account().is_ok());
        assert!(context.signing_account().is_err());
    }

    #[test]
    fn missing_profile_is_reported() {
        assert!(Context::load(Some("/nonexistent/gasless-profile.json"), &[]).is_err());
    }
}
