use std::collections::hash_map::IntoIter;
use std::collections::HashMap;
use std::ops::Deref;
use std::str::FromStr;

use lazy_static::lazy_static;
use serde_json::{Number, Value};

use crate::core::Error;

static CONFIGURATION_SPECIFICATION: &str = include_str!("../../../resources/configuration.json");

lazy_static! {
    static ref IS_STRING: regex::Regex = regex::Regex::new(r"^'[^']*'$").expect("invalid regex");
    static ref IS_NUMBER: regex::Regex = regex::Regex::new(r"^-?[0-9]+(\.[0-9]+)?$").expect("invalid regex");
    static ref IS_EMPTY_ARRAY: regex::Regex = regex::Regex::new(r"^\[\]$").expect("invalid regex");
    static ref IS_ARRAY: regex::Regex = regex::Regex::new(r"^\[.*\]$").expect("invalid regex");
}

/// Path of a field in the configuration, e.g. `tonapi.api_key`
#[derive(PartialEq, Eq, Hash, Clone, Debug)]
pub struct JSONPath(Vec<String>);

impl Deref for JSONPath {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl JSONPath {
    pub fn from_str(s: &str) -> Self {
        JSONPath(s.split('.').map(|x| x.to_lowercase()).collect())
    }
}

/// Maps variable names, `tonapi_api_key` for instance, to the configuration field they set
#[derive(Debug)]
pub struct VariablesResolver(HashMap<String, JSONPath>);

impl VariablesResolver {
    pub fn initialize() -> Result<Self, Error> {
        fn resolve_variables(path: &[String], value: Value) -> HashMap<String, JSONPath> {
            let mut variables = HashMap::new();
            match value {
                Value::Object(fields) => {
                    for (field, value) in fields {
                        variables.extend(resolve_variables(&[path, &[field]].concat(), value))
                    }
                },
                _ => {
                    variables.insert(path.join("_"), JSONPath(path.to_vec()));
                },
            }

            variables
        }

        let specification: Value = serde_json::from_str(CONFIGURATION_SPECIFICATION).map_err(|e| Error::Configuration(e.to_string()))?;

        let mut resolutions = HashMap::new();
        resolutions.insert("profile".to_string(), JSONPath::from_str("profile"));
        resolutions.extend(resolve_variables(&[], specification));

        Ok(Self(resolutions))
    }

    /// Variables set through `GASLESS_*` environment variables
    pub fn resolve_environment(&self) -> Result<Variables, Error> {
        let variables = envy::prefixed("GASLESS_")
            .from_env::<HashMap<String, String>>()
            .map_err(|e| Error::Configuration(e.to_string()))?;

        self.resolve_variables(variables)
    }

    /// Variables set through `--config name=value` arguments
    pub fn resolve_arguments(&self, arguments: &[String]) -> Result<Variables, Error> {
        let mut variables = HashMap::new();
        for argument in arguments {
            let Some((name, value)) = argument.split_once('=') else {
                return Err(Error::Configuration(format!("invalid argument {}, must be of the form 'name=value'", argument)));
            };

            variables.insert(name.trim().trim_start_matches("--").to_lowercase(), value.to_string());
        }

        self.resolve_variables(variables)
    }

    fn resolve_variables(&self, variables: HashMap<String, String>) -> Result<Variables, Error> {
        let mut resolved_variables = HashMap::new();
        for (name, value) in variables {
            if let Some(path) = self.0.get(&name) {
                resolved_variables.insert(path.clone(), Self::decode_value(&value)?);
            }
        }

        Ok(Variables(resolved_variables))
    }

    fn decode_value(value: &str) -> Result<Value, Error> {
        Ok(match value {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),

            value if IS_STRING.is_match(value) => Value::String(value[1..value.len() - 1].to_string()),
            value if IS_NUMBER.is_match(value) => Number::from_str(value)
                .map(Value::Number)
                .map_err(|e| Error::Configuration(e.to_string()))?,
            value if IS_EMPTY_ARRAY.is_match(value) => Value::Array(vec![]),
            value if IS_ARRAY.is_match(value) => {
                let mut elements = vec![];
                for value in value[1..value.len() - 1].split(',') {
                    elements.push(Self::decode_value(value)?)
                }

                Value::Array(elements)
            },

            value => Value::String(value.to_string()),
        })
    }
}

pub struct Variables(HashMap<JSONPath, Value>);

impl From<HashMap<JSONPath, Value>> for Variables {
    fn from(map: HashMap<JSONPath, Value>) -> Self {
        Variables(map)
    }
}

impl Variables {
    pub fn get(&self, s: &str) -> Option<&Value> {
        self.0.get(&JSONPath::from_str(s))
    }

    pub fn into_iter(self) -> IntoIter<JSONPath, Value> {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::{Number, Value};

    use super::{JSONPath, VariablesResolver};

    #[test]
    fn path_is_lowercased() {
        assert_eq!(JSONPath::from_str("TONAPI.API_KEY").0, vec!["tonapi".to_string(), "api_key".to_string()]);
        assert_eq!(JSONPath::from_str("profile").0, vec!["profile".to_string()]);
    }

    #[test]
    fn variables_follow_configuration_layout() {
        let resolver = VariablesResolver::initialize().unwrap();

        assert_eq!(resolver.0.get("tonapi_api_key"), Some(&JSONPath::from_str("tonapi.api_key")));
        assert_eq!(resolver.0.get("ton_api_key"), Some(&JSONPath::from_str("ton.api_key")));
        assert_eq!(resolver.0.get("account_secret_key"), Some(&JSONPath::from_str("account.secret_key")));
        assert_eq!(resolver.0.get("paymaster_token_address"), Some(&JSONPath::from_str("paymaster_token.address")));
        assert_eq!(resolver.0.get("transfer_max_fee"), Some(&JSONPath::from_str("transfer_max_fee")));
    }

    #[test]
    fn arguments_are_resolved() {
        let resolver = VariablesResolver::initialize().unwrap();

        let variables = resolver
            .resolve_arguments(&["ton_network=testnet".to_string(), "--transfer_max_fee=5000000".to_string(), "unknown=1".to_string()])
            .unwrap();

        assert_eq!(variables.get("ton.network"), Some(&Value::String("testnet".to_string())));
        assert_eq!(variables.get("transfer_max_fee"), Some(&Value::Number(Number::from(5_000_000))));
        assert_eq!(variables.into_iter().count(), 2);
    }

    #[test]
    fn malformed_argument_is_rejected() {
        let resolver = VariablesResolver::initialize().unwrap();

        assert!(resolver.resolve_arguments(&["ton_network".to_string()]).is_err());
    }

    #[test]
    fn values_are_decoded() {
        let cases = vec![
            ("number", "94", Value::Number(Number::from(94))),
            ("negative", "-239", Value::Number(Number::from(-239))),
            ("true", "true", Value::Bool(true)),
            ("string_1", "''", Value::String("".to_string())),
            ("string_2", "'1000'", Value::String("1000".to_string())),
            ("array_1", "[]", Value::Array(vec![])),
            (
                "array_2",
                "['https://a','https://b']",
                Value::Array(vec![Value::String("https://a".to_string()), Value::String("https://b".to_string())]),
            ),
            ("any", "EQCxE6mUtQJKFnGfaROTKOt1lZbDiiX1kCixRv7Nw2Id_sDs", Value::String("EQCxE6mUtQJKFnGfaROTKOt1lZbDiiX1kCixRv7Nw2Id_sDs".to_string())),
        ];

        let mut resolver = VariablesResolver(HashMap::new());
        for (case, _, _) in &cases {
            resolver.0.insert(case.to_string(), JSONPath::from_str(case));
        }

        for (case, value, expected) in cases {
            let result = resolver.resolve_variables(HashMap::from([(case.to_string(), value.to_string())])).unwrap();
            assert_eq!(result.get(case).unwrap().clone(), expected)
        }
    }
}
