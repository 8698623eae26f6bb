use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Platform user scope. Serialized kebab-case in users files; sent to the
/// API under its display name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum UserScope {
    SimpleUser,
    #[default]
    BasicUser,
    AdvancedUser,
    CallCenterAgent,
    CallCenterSupervisor,
    OfficeManager,
    Reseller,
    SuperUser,
}

impl UserScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserScope::SimpleUser => "Simple User",
            UserScope::BasicUser => "Basic User",
            UserScope::AdvancedUser => "Advanced User",
            UserScope::CallCenterAgent => "Call Center Agent",
            UserScope::CallCenterSupervisor => "Call Center Supervisor",
            UserScope::OfficeManager => "Office Manager",
            UserScope::Reseller => "Reseller",
            UserScope::SuperUser => "Super User",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DispatchType {
    #[default]
    RingAll,
    CallPark,
}

impl DispatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchType::RingAll => "Ring All",
            DispatchType::CallPark => "Call Park",
        }
    }
}
