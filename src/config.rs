//! Query assembly settings.
//!
//! [`OrmConfig`] is read from the `[orm]` section of `config/config.toml`
//! (optional) and `LIFELINE__ORM__*` environment variables, e.g.
//! `LIFELINE__ORM__DIALECT=sqlite`.

use crate::error::OrmError;
use crate::relation::JoinKind;
use config::{Config, ConfigError, Environment, File};
use once_cell::sync::Lazy;
use sea_query::{MysqlQueryBuilder, PostgresQueryBuilder, SelectStatement, SqliteQueryBuilder, Values};
use serde::Deserialize;

const CONFIG_FILE: &str = "config/config.toml";
const ENV_PREFIX: &str = "LIFELINE";

/// SQL dialect statements are rendered for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Postgres,
    MySql,
    Sqlite,
}

impl Dialect {
    /// Render with placeholders, collecting bind values
    pub fn build(&self, statement: &SelectStatement) -> (String, Values) {
        match self {
            Dialect::Postgres => statement.build(PostgresQueryBuilder),
            Dialect::MySql => statement.build(MysqlQueryBuilder),
            Dialect::Sqlite => statement.build(SqliteQueryBuilder),
        }
    }

    /// Render with values inlined
    pub fn inline(&self, statement: &SelectStatement) -> String {
        match self {
            Dialect::Postgres => statement.to_string(PostgresQueryBuilder),
            Dialect::MySql => statement.to_string(MysqlQueryBuilder),
            Dialect::Sqlite => statement.to_string(SqliteQueryBuilder),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OrmConfig {
    #[serde(default)]
    pub dialect: Dialect,
    /// Join type for relations that don't set their own
    #[serde(default)]
    pub join_type: JoinKind,
    /// Log every assembled statement at debug level
    #[serde(default)]
    pub log_statements: bool,
}

static GLOBAL: Lazy<OrmConfig> = Lazy::new(|| match OrmConfig::load() {
    Ok(config) => config,
    Err(err) => {
        log::warn!("Using default ORM configuration: {}", err);
        OrmConfig::default()
    }
});

impl OrmConfig {
    /// Load the configuration from `config/config.toml`, falling back to env vars.
    pub fn load() -> Result<Self, OrmError> {
        let builder = Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

        let settings = match builder.build() {
            Ok(settings) => settings,
            Err(err) => {
                if std::path::Path::new(CONFIG_FILE).exists() {
                    log::warn!(
                        "Failed to load {}, falling back to environment: {}",
                        CONFIG_FILE,
                        err
                    );
                }
                Config::builder()
                    .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "Failed to load configuration from file and env: {}, then env-only error: {}",
                            err, env_err
                        ))
                    })?
            }
        };

        match settings.get::<OrmConfig>("orm") {
            Ok(config) => Ok(config),
            Err(ConfigError::NotFound(_)) => Ok(OrmConfig::default()),
            Err(err) => Err(err.into()),
        }
    }

    /// Process-wide configuration, loaded on first use
    pub fn global() -> &'static OrmConfig {
        &GLOBAL
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_join_type(mut self, join_type: JoinKind) -> Self {
        self.join_type = join_type;
        self
    }

    pub fn with_log_statements(mut self, enabled: bool) -> Self {
        self.log_statements = enabled;
        self
    }
}
