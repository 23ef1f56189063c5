//! Runtime site settings
//!
//! Database-backed configuration with in-memory caching. Settings are
//! loaded from the settings table on startup and cached for fast access;
//! writes go through [`Config::set_value`] so cache and table stay in sync.

use crate::orm::settings;
use chrono::Utc;
use dashmap::DashMap;
use sea_orm::{entity::*, query::*, sea_query::Expr, DatabaseConnection, DbErr};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Represents a typed setting value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SettingValue {
    String(String),
    Int(i64),
    Bool(bool),
}

impl SettingValue {
    /// Parse a string value based on the value_type
    pub fn parse(value: &str, value_type: &str) -> Option<Self> {
        match value_type {
            "string" => Some(SettingValue::String(value.to_string())),
            "int" => value.parse().ok().map(SettingValue::Int),
            "bool" => value.parse().ok().map(SettingValue::Bool),
            _ => None,
        }
    }

    pub fn to_string_value(&self) -> String {
        match self {
            SettingValue::String(s) => s.clone(),
            SettingValue::Int(i) => i.to_string(),
            SettingValue::Bool(b) => b.to_string(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            SettingValue::String(_) => "string",
            SettingValue::Int(_) => "int",
            SettingValue::Bool(_) => "bool",
        }
    }

    pub fn as_string(&self) -> Option<&String> {
        match self {
            SettingValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            SettingValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Settings manager with caching
pub struct Config {
    settings: DashMap<String, SettingValue>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            settings: DashMap::new(),
        }
    }

    /// Load all settings from the database
    pub async fn load_from_database(&self, db: &DatabaseConnection) -> Result<(), DbErr> {
        let db_settings = settings::Entity::find().all(db).await?;

        for setting in db_settings {
            if let Some(value) = SettingValue::parse(&setting.value, &setting.value_type) {
                self.settings.insert(setting.key, value);
            }
        }

        log::info!("Loaded {} settings from database", self.settings.len());

        Ok(())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.settings.get(key).and_then(|v| v.as_string().cloned())
    }

    pub fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|| default.to_string())
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.settings.get(key).and_then(|v| v.as_int())
    }

    pub fn get_int_or(&self, key: &str, default: i64) -> i64 {
        self.get_int(key).unwrap_or(default)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.settings.get(key).and_then(|v| v.as_bool())
    }

    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }

    /// Update a setting value (also updates the database row)
    pub async fn set_value(
        &self,
        db: &DatabaseConnection,
        key: &str,
        value: SettingValue,
    ) -> Result<(), DbErr> {
        let existing = settings::Entity::find_by_id(key.to_string()).one(db).await?;

        let value_str = value.to_string_value();
        let value_type = value.type_name().to_string();

        if existing.is_some() {
            settings::Entity::update_many()
                .col_expr(settings::Column::Value, Expr::value(value_str))
                .col_expr(settings::Column::ValueType, Expr::value(value_type))
                .col_expr(
                    settings::Column::UpdatedAt,
                    Expr::value(Utc::now().naive_utc()),
                )
                .filter(settings::Column::Key.eq(key))
                .exec(db)
                .await?;
        } else {
            let setting = settings::ActiveModel {
                key: Set(key.to_string()),
                value: Set(value_str),
                value_type: Set(value_type),
                updated_at: Set(Utc::now().naive_utc()),
            };
            setting.insert(db).await?;
        }

        self.settings.insert(key.to_string(), value);

        Ok(())
    }

    // Convenience methods for common settings

    /// Maximum comment/reply body length
    pub fn max_comment_length(&self) -> i64 {
        self.get_int_or("max_comment_length", 2000)
    }

    /// Default N for top-N listings when the caller supplies none
    pub fn top_default_limit(&self) -> i64 {
        self.get_int_or("top_default_limit", crate::engagement::ranking::DEFAULT_TOP_LIMIT)
    }

    /// Default page size for content listings
    pub fn per_page(&self) -> i64 {
        self.get_int_or("per_page", 20)
    }

    /// Check if registration is enabled
    pub fn registration_enabled(&self) -> bool {
        self.get_bool_or("registration_enabled", true)
    }
}

/// Create a new Arc-wrapped Config
pub fn create_config() -> Arc<Config> {
    Arc::new(Config::new())
}
