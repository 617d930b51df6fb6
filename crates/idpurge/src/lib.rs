pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod identity;
pub mod matcher;
pub mod report;
pub mod resolve;
pub mod safety;
pub mod scan;
pub mod store;
pub mod util;

pub use config::{AppSupportSettings, Config, Settings};
pub use context::{CancelToken, RunContext, RunMode};
pub use engine::PurgeEngine;
pub use error::{PurgeError, Result};
pub use identity::Identity;
pub use matcher::{Evaluator, MatchSource};
pub use report::{AuditLevel, AuditLog, Outcome, OutcomeKind, Report};
pub use resolve::Resolver;
pub use safety::{
    AppProbe, ConfirmReply, ConfirmRequest, ConfirmationSource, DenyAll, SafetyGate,
    ScriptedConfirmer, StaticProbe, SystemProbe, TerminalConfirmer,
};
pub use scan::{default_scanners, StoreScanner};
pub use store::{BrowserFamily, MatchDescriptor, StoreItem, StoreKind};
