//! Storage configuration from environment variables.
//!
//! Three forms are understood, tried in order; the first that yields at
//! least one store wins:
//!
//! | Form              | Example                                              |
//! |-------------------|------------------------------------------------------|
//! | per-property keys | `STORAGE_MAIN_DB_TYPE=mysql`, `STORAGE_MAIN_DB_HOST=…` |
//! | JSON array        | `STORAGE_CONFIG=[{"id":"main","type":"mysql",…}]`    |
//! | single store      | `DB_TYPE=mysql`, `DB_HOST=…`, `DB_NAME=…`            |

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{ConnectionSettings, StorageConfig, StorageType};

const KEY_PREFIX: &str = "STORAGE_";
const JSON_CONFIG_KEY: &str = "STORAGE_CONFIG";
const DEFAULT_STORAGE_ID: &str = "default";

/// Recognized property suffixes, longest first so that e.g. `_S3_OUTPUT_LOCATION`
/// is never mistaken for a shorter property.
const PROPERTIES: &[&str] = &[
    "s3_output_location",
    "key_file_path",
    "replica_set",
    "auth_source",
    "write_mode",
    "project_id",
    "dataset_id",
    "workgroup",
    "database",
    "password",
    "region",
    "host",
    "port",
    "user",
    "type",
    "uri",
];

#[derive(Default)]
struct PartialConfig {
    storage_type: Option<StorageType>,
    write_mode: bool,
    connection: ConnectionSettings,
}

impl PartialConfig {
    fn apply(&mut self, property: &str, value: &str) {
        let conn = &mut self.connection;
        match property {
            "type" => self.storage_type = Some(StorageType::parse(value)),
            "write_mode" => self.write_mode = parse_flag(value),
            "host" => conn.host = Some(value.to_string()),
            "port" => conn.port = parse_port(value),
            "user" => conn.user = Some(value.to_string()),
            "password" => conn.password = Some(value.to_string()),
            "database" => conn.database = Some(value.to_string()),
            "uri" => conn.uri = Some(value.to_string()),
            "auth_source" => conn.auth_source = Some(value.to_string()),
            "replica_set" => conn.replica_set = Some(value.to_string()),
            "region" => conn.region = Some(value.to_string()),
            "s3_output_location" => conn.s3_output_location = Some(value.to_string()),
            "workgroup" => conn.workgroup = Some(value.to_string()),
            "project_id" => conn.project_id = Some(value.to_string()),
            "dataset_id" => conn.dataset_id = Some(value.to_string()),
            "key_file_path" => conn.key_file_path = Some(value.to_string()),
            _ => {}
        }
    }

    fn finish(self, id: String) -> Option<StorageConfig> {
        match self.storage_type {
            Some(storage_type) if !self.connection.is_empty() => Some(
                StorageConfig::new(id, storage_type, self.connection)
                    .with_write_mode(self.write_mode),
            ),
            _ => {
                debug!("Dropping incomplete storage configuration {}", id);
                None
            }
        }
    }
}

/// Entry of the `STORAGE_CONFIG` JSON array.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStorageConfig {
    id: Option<String>,
    #[serde(rename = "type")]
    storage_type: Option<String>,
    #[serde(default)]
    write_mode: bool,
    connection: Option<ConnectionSettings>,
}

pub struct StorageConfigResolver;

impl StorageConfigResolver {
    /// Resolves store descriptors from the process environment.
    pub fn from_env() -> Vec<StorageConfig> {
        Self::resolve(std::env::vars())
    }

    /// Resolves store descriptors from arbitrary key/value pairs. The result is
    /// sorted by id.
    pub fn resolve<I, K, V>(vars: I) -> Vec<StorageConfig>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
            .collect();

        let configs = Self::from_storage_keys(&vars);
        if !configs.is_empty() {
            return configs;
        }

        if let Some(raw) = vars.get(JSON_CONFIG_KEY) {
            let configs = Self::from_json(raw);
            if !configs.is_empty() {
                return configs;
            }
        }

        Self::from_db_keys(&vars).into_iter().collect()
    }

    fn from_storage_keys(vars: &HashMap<String, String>) -> Vec<StorageConfig> {
        let mut partials: BTreeMap<String, PartialConfig> = BTreeMap::new();

        for (key, value) in vars {
            let Some((id, property)) = split_storage_key(key) else {
                continue;
            };
            partials.entry(id).or_default().apply(property, value);
        }

        partials
            .into_iter()
            .filter_map(|(id, partial)| partial.finish(id))
            .collect()
    }

    fn from_json(raw: &str) -> Vec<StorageConfig> {
        let entries: Vec<Value> = match serde_json::from_str(raw) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Ignoring {}: not a JSON array ({})", JSON_CONFIG_KEY, e);
                return Vec::new();
            }
        };

        let mut configs: BTreeMap<String, StorageConfig> = BTreeMap::new();
        for entry in entries {
            let raw: RawStorageConfig = match serde_json::from_value(entry) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("Skipping malformed {} entry: {}", JSON_CONFIG_KEY, e);
                    continue;
                }
            };
            let (Some(id), Some(storage_type), Some(connection)) =
                (raw.id, raw.storage_type, raw.connection)
            else {
                continue;
            };
            if connection.is_empty() {
                continue;
            }
            let config = StorageConfig::new(id.clone(), StorageType::parse(&storage_type), connection)
                .with_write_mode(raw.write_mode);
            configs.insert(id, config);
        }

        configs.into_values().collect()
    }

    fn from_db_keys(vars: &HashMap<String, String>) -> Option<StorageConfig> {
        let mut partial = PartialConfig::default();

        for (key, property) in [
            ("DB_TYPE", "type"),
            ("DB_WRITE_MODE", "write_mode"),
            ("DB_HOST", "host"),
            ("DB_PORT", "port"),
            ("DB_USER", "user"),
            ("DB_PASSWORD", "password"),
            ("DB_DATABASE", "database"),
            ("DB_NAME", "database"),
            ("DB_URI", "uri"),
        ] {
            if let Some(value) = vars.get(key) {
                partial.apply(property, value);
            }
        }

        let id = vars
            .get("DB_ID")
            .map(|id| normalize_id(id))
            .unwrap_or_else(|| DEFAULT_STORAGE_ID.to_string());
        partial.finish(id)
    }
}

/// Splits `STORAGE_<ID>_<PROPERTY>` into the normalized id and the property.
fn split_storage_key(key: &str) -> Option<(String, &'static str)> {
    let rest = key.strip_prefix(KEY_PREFIX)?.to_lowercase();

    PROPERTIES.iter().find_map(|property| {
        let id = rest.strip_suffix(property)?.strip_suffix('_')?;
        (!id.is_empty()).then(|| (normalize_id(id), *property))
    })
}

fn normalize_id(raw: &str) -> String {
    raw.to_lowercase().replace('_', "-")
}

/// Only the exact string `true` enables a flag.
fn parse_flag(value: &str) -> bool {
    value == "true"
}

fn parse_port(value: &str) -> Option<u16> {
    match value.trim().parse() {
        Ok(port) => Some(port),
        Err(_) => {
            warn!("Ignoring invalid port value {:?}", value);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(pairs: &[(&str, &str)]) -> Vec<StorageConfig> {
        StorageConfigResolver::resolve(pairs.iter().copied())
    }

    #[test]
    fn test_per_property_keys_build_one_config_per_id() {
        let configs = resolve(&[
            ("STORAGE_MAIN_TYPE", "MySQL"),
            ("STORAGE_MAIN_HOST", "db.internal"),
            ("STORAGE_MAIN_PORT", "3307"),
            ("STORAGE_MAIN_USER", "app"),
            ("STORAGE_MAIN_PASSWORD", "secret"),
            ("STORAGE_MAIN_DATABASE", "shop"),
            ("STORAGE_MAIN_WRITE_MODE", "true"),
            ("STORAGE_LAKE_TYPE", "athena"),
            ("STORAGE_LAKE_REGION", "eu-west-1"),
            ("STORAGE_LAKE_S3_OUTPUT_LOCATION", "s3://bucket/results/"),
            ("STORAGE_LAKE_WORKGROUP", "analytics"),
            ("PATH", "/usr/bin"),
        ]);

        assert_eq!(configs.len(), 2);

        let lake = &configs[0];
        assert_eq!(lake.id(), "lake");
        assert_eq!(lake.storage_type(), &StorageType::Athena);
        assert!(!lake.write_mode());
        assert_eq!(lake.connection().region.as_deref(), Some("eu-west-1"));
        assert_eq!(
            lake.connection().s3_output_location.as_deref(),
            Some("s3://bucket/results/")
        );
        assert_eq!(lake.connection().workgroup.as_deref(), Some("analytics"));

        let main = &configs[1];
        assert_eq!(main.id(), "main");
        assert_eq!(main.storage_type(), &StorageType::MySql);
        assert!(main.write_mode());
        assert_eq!(main.connection().host.as_deref(), Some("db.internal"));
        assert_eq!(main.connection().port, Some(3307));
        assert_eq!(main.connection().user.as_deref(), Some("app"));
        assert_eq!(main.connection().password.as_deref(), Some("secret"));
        assert_eq!(main.connection().database.as_deref(), Some("shop"));
    }

    #[test]
    fn test_id_is_lowercased_and_hyphenated() {
        let configs = resolve(&[
            ("STORAGE_ORDERS_DB_TYPE", "mongodb"),
            ("STORAGE_ORDERS_DB_URI", "mongodb://localhost:27017"),
        ]);

        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].id(), "orders-db");
        assert_eq!(
            configs[0].connection().uri.as_deref(),
            Some("mongodb://localhost:27017")
        );
    }

    #[test]
    fn test_incomplete_ids_are_dropped() {
        let configs = resolve(&[
            ("STORAGE_NOTYPE_HOST", "localhost"),
            ("STORAGE_NOCONN_TYPE", "mysql"),
            ("STORAGE_NOCONN_WRITE_MODE", "true"),
            ("STORAGE_OK_TYPE", "mysql"),
            ("STORAGE_OK_HOST", "localhost"),
        ]);

        let ids: Vec<&str> = configs.iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec!["ok"]);
    }

    #[test]
    fn test_unknown_properties_are_ignored() {
        let configs = resolve(&[
            ("STORAGE_MAIN_TYPE", "mysql"),
            ("STORAGE_MAIN_HOST", "localhost"),
            ("STORAGE_MAIN_TIMEOUT", "30"),
            ("STORAGE_ONLY_UNKNOWN_FLAVOR", "x"),
        ]);

        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].id(), "main");
    }

    #[test]
    fn test_write_mode_requires_literal_true() {
        let configs = resolve(&[
            ("STORAGE_A_TYPE", "mysql"),
            ("STORAGE_A_HOST", "h"),
            ("STORAGE_A_WRITE_MODE", "yes"),
            ("STORAGE_B_TYPE", "mysql"),
            ("STORAGE_B_HOST", "h"),
            ("STORAGE_B_WRITE_MODE", "TRUE"),
            ("STORAGE_C_TYPE", "mysql"),
            ("STORAGE_C_HOST", "h"),
            ("STORAGE_C_WRITE_MODE", " true "),
            ("STORAGE_D_TYPE", "mysql"),
            ("STORAGE_D_HOST", "h"),
            ("STORAGE_D_WRITE_MODE", "true"),
        ]);

        let write_modes: Vec<(&str, bool)> = configs.iter().map(|c| (c.id(), c.write_mode())).collect();
        assert_eq!(
            write_modes,
            vec![("a", false), ("b", false), ("c", false), ("d", true)]
        );
    }

    #[test]
    fn test_db_write_mode_requires_literal_true() {
        let configs = resolve(&[("DB_TYPE", "mysql"), ("DB_HOST", "h"), ("DB_WRITE_MODE", "True")]);

        assert_eq!(configs.len(), 1);
        assert!(!configs[0].write_mode());
    }

    #[test]
    fn test_invalid_port_alone_leaves_no_connection() {
        let configs = resolve(&[("STORAGE_A_TYPE", "mysql"), ("STORAGE_A_PORT", "abc")]);

        assert!(configs.is_empty());
    }

    #[test]
    fn test_invalid_port_is_dropped_from_connection() {
        let configs = resolve(&[
            ("STORAGE_A_TYPE", "mysql"),
            ("STORAGE_A_HOST", "h"),
            ("STORAGE_A_PORT", "abc"),
        ]);

        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].connection().port, None);
        assert!(!configs[0].connection().is_empty());
    }

    #[test]
    fn test_json_array_used_when_no_storage_keys() {
        let json = r#"[
            {"id": "docs", "type": "mongodb", "writeMode": true,
             "connection": {"host": "mongo", "port": 27017, "authSource": "admin"}},
            {"id": "broken", "type": "mysql"},
            "not an object"
        ]"#;
        let configs = resolve(&[("STORAGE_CONFIG", json)]);

        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].id(), "docs");
        assert_eq!(configs[0].storage_type(), &StorageType::MongoDb);
        assert!(configs[0].write_mode());
        assert_eq!(configs[0].connection().port, Some(27017));
        assert_eq!(configs[0].connection().auth_source.as_deref(), Some("admin"));
    }

    #[test]
    fn test_storage_keys_win_over_json() {
        let json = r#"[{"id": "docs", "type": "mongodb", "connection": {"host": "mongo"}}]"#;
        let configs = resolve(&[
            ("STORAGE_CONFIG", json),
            ("STORAGE_MAIN_TYPE", "mysql"),
            ("STORAGE_MAIN_HOST", "localhost"),
        ]);

        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].id(), "main");
    }

    #[test]
    fn test_invalid_json_falls_back_to_db_keys() {
        let configs = resolve(&[
            ("STORAGE_CONFIG", "{not json"),
            ("DB_TYPE", "mysql"),
            ("DB_HOST", "localhost"),
            ("DB_NAME", "app"),
            ("DB_WRITE_MODE", "true"),
        ]);

        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].id(), "default");
        assert_eq!(configs[0].connection().database.as_deref(), Some("app"));
        assert!(configs[0].write_mode());
    }

    #[test]
    fn test_db_keys_need_type() {
        assert!(resolve(&[("DB_HOST", "localhost")]).is_empty());
        assert!(resolve(&[]).is_empty());
    }

    #[test]
    fn test_db_id_override() {
        let configs = resolve(&[("DB_TYPE", "mysql"), ("DB_HOST", "h"), ("DB_ID", "Legacy_DB")]);
        assert_eq!(configs[0].id(), "legacy-db");
    }

    #[test]
    fn test_split_storage_key() {
        assert_eq!(
            split_storage_key("STORAGE_LAKE_S3_OUTPUT_LOCATION"),
            Some(("lake".to_string(), "s3_output_location"))
        );
        assert_eq!(
            split_storage_key("STORAGE_BQ_KEY_FILE_PATH"),
            Some(("bq".to_string(), "key_file_path"))
        );
        assert_eq!(split_storage_key("STORAGE_TYPE"), None);
        assert_eq!(split_storage_key("STORAGE_CONFIG"), None);
        assert_eq!(split_storage_key("OTHER_MAIN_TYPE"), None);
    }
}
