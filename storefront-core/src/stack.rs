//! Consistency checks between the documented stack and its compose files.
//!
//! The README promises ports, credentials and file locations; this module
//! verifies each promise against what the compose files actually declare.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::Value;
use tracing::{debug, info};

use crate::config::DatabaseSettings;
use crate::error::{StoreError, StoreResult};

pub const FRONTEND_PORT: u16 = 5173;

/// One selectable backend: a compose file plus the app it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendStack {
    pub name: String,
    pub compose_file: PathBuf,
    pub entry_file: PathBuf,
    /// Host port the backend is documented to listen on.
    pub port: u16,
}

impl BackendStack {
    pub fn new(name: &str, compose_file: &str, entry_file: &str, port: u16) -> Self {
        BackendStack {
            name: name.to_string(),
            compose_file: PathBuf::from(compose_file),
            entry_file: PathBuf::from(entry_file),
            port,
        }
    }
}

/// Everything the stack documentation promises.
#[derive(Debug, Clone, PartialEq)]
pub struct StackContract {
    pub stacks: Vec<BackendStack>,
    pub frontend_port: u16,
    pub frontend_dirs: Vec<PathBuf>,
    pub database: DatabaseSettings,
}

impl StackContract {
    /// The documented hackathon layout.
    pub fn hackathon() -> Self {
        StackContract {
            stacks: vec![
                BackendStack::new("php", "docker-compose_php.yml", "boilerplate/php/index.php", 8000),
                BackendStack::new("python", "docker-compose_python.yml", "boilerplate/python/app.py", 8001),
                BackendStack::new("rust", "docker-compose_rust.yml", "storefront-server/src/main.rs", 8001),
            ],
            frontend_port: FRONTEND_PORT,
            frontend_dirs: vec![
                PathBuf::from("boilerplate/frontend/react"),
                PathBuf::from("boilerplate/frontend/vue"),
            ],
            database: DatabaseSettings::default(),
        }
    }

    pub fn stack(&self, name: &str) -> Option<&BackendStack> {
        self.stacks.iter().find(|s| s.name == name)
    }
}

/// A published port entry in any of the syntaxes Compose accepts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PortSpec {
    Number(u32),
    Short(String),
    Long {
        target: u32,
        #[serde(default)]
        published: Option<Value>,
    },
}

impl PortSpec {
    /// The fixed host port, if the entry publishes one. A bare container
    /// port gets an ephemeral host port and yields `None`.
    pub fn host_port(&self) -> Option<u16> {
        match self {
            PortSpec::Number(_) => None,
            PortSpec::Short(spec) => {
                let spec = spec.split('/').next().unwrap_or(spec);
                let parts: Vec<&str> = spec.split(':').collect();
                let host = match parts.as_slice() {
                    [host, _container] => host,
                    [_ip, host, _container] => host,
                    _ => return None,
                };
                host.parse().ok()
            }
            PortSpec::Long { published, .. } => match published {
                Some(Value::Number(n)) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
                Some(Value::String(s)) => s.parse().ok(),
                _ => None,
            },
        }
    }
}

/// `environment:` as either a map or a list of `KEY=VALUE` strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Environment {
    Map(BTreeMap<String, Option<Value>>),
    List(Vec<String>),
}

impl Default for Environment {
    fn default() -> Self {
        Environment::List(Vec::new())
    }
}

impl Environment {
    /// The declared value of `key`. Keys declared without a value pass
    /// through from the host and yield `None`.
    pub fn get(&self, key: &str) -> Option<String> {
        match self {
            Environment::Map(map) => match map.get(key)? {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                Some(Value::Bool(b)) => Some(b.to_string()),
                _ => None,
            },
            Environment::List(entries) => entries.iter().find_map(|entry| {
                let (k, v) = entry.split_once('=')?;
                (k == key).then(|| v.to_string())
            }),
        }
    }
}

/// `depends_on:` as a list of names or a map of name to condition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DependsOn {
    List(Vec<String>),
    Map(BTreeMap<String, Value>),
}

impl Default for DependsOn {
    fn default() -> Self {
        DependsOn::List(Vec::new())
    }
}

impl DependsOn {
    pub fn contains(&self, service: &str) -> bool {
        match self {
            DependsOn::List(names) => names.iter().any(|n| n == service),
            DependsOn::Map(map) => map.contains_key(service),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ComposeService {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub build: Option<Value>,
    #[serde(default)]
    pub ports: Vec<PortSpec>,
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub depends_on: DependsOn,
    #[serde(default)]
    pub volumes: Vec<Value>,
}

impl ComposeService {
    pub fn publishes(&self, port: u16) -> bool {
        self.ports.iter().any(|p| p.host_port() == Some(port))
    }

    fn is_database(&self) -> bool {
        self.image
            .as_deref()
            .map(|image| {
                let name = image.rsplit('/').next().unwrap_or(image);
                name.starts_with("mysql") || name.starts_with("mariadb")
            })
            .unwrap_or(false)
    }

    /// Build context path, from either `build: path` or `build: {context}`.
    fn build_context(&self) -> Option<&str> {
        match self.build.as_ref()? {
            Value::String(path) => Some(path),
            Value::Mapping(map) => map.get("context").and_then(Value::as_str),
            _ => None,
        }
    }
}

/// The subset of a compose file the checks look at.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ComposeFile {
    #[serde(default)]
    pub services: BTreeMap<String, ComposeService>,
}

impl ComposeFile {
    pub fn parse(yaml: &str) -> StoreResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: &Path) -> StoreResult<Self> {
        let yaml = fs::read_to_string(path).map_err(|e| StoreError::IoError { path: path.to_path_buf(), source: e })?;
        Self::parse(&yaml)
    }

    /// The MySQL/MariaDB service, falling back to a service named `db`.
    pub fn database_service(&self) -> Option<(&str, &ComposeService)> {
        self.services
            .iter()
            .find(|(_, s)| s.is_database())
            .or_else(|| self.services.get_key_value("db"))
            .map(|(name, service)| (name.as_str(), service))
    }

    pub fn services_publishing(&self, port: u16) -> Vec<&str> {
        self.services
            .iter()
            .filter(|(_, s)| s.publishes(port))
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// Which documented promise a finding concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    ComposeFile,
    EntryFile,
    BackendPort,
    DatabaseCredentials,
    AppCredentials,
    FrontendPort,
    FrontendLayout,
    StartupOrder,
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Check::ComposeFile => "compose-file",
            Check::EntryFile => "entry-file",
            Check::BackendPort => "backend-port",
            Check::DatabaseCredentials => "db-credentials",
            Check::AppCredentials => "app-credentials",
            Check::FrontendPort => "frontend-port",
            Check::FrontendLayout => "frontend-layout",
            Check::StartupOrder => "startup-order",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    pub check: Check,
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.severity, self.check, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackReport {
    pub stack: String,
    pub findings: Vec<Finding>,
}

impl StackReport {
    fn new(stack: &str) -> Self {
        StackReport { stack: stack.to_string(), findings: Vec::new() }
    }

    fn error(&mut self, check: Check, message: String) {
        self.findings.push(Finding { severity: Severity::Error, check, message });
    }

    fn warn(&mut self, check: Check, message: String) {
        self.findings.push(Finding { severity: Severity::Warning, check, message });
    }

    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.severity == Severity::Warning)
    }

    /// No errors. With `strict`, warnings fail too.
    pub fn passed(&self, strict: bool) -> bool {
        if strict {
            self.findings.is_empty()
        } else {
            self.errors().next().is_none()
        }
    }
}

/// Checks one backend stack under `root` against the contract.
pub fn check_stack(root: &Path, stack: &BackendStack, contract: &StackContract) -> StackReport {
    let mut report = StackReport::new(&stack.name);

    let entry_path = root.join(&stack.entry_file);
    if !entry_path.is_file() {
        report.error(Check::EntryFile, format!("entry file {} does not exist", stack.entry_file.display()));
    }

    let compose_path = root.join(&stack.compose_file);
    if !compose_path.is_file() {
        report.error(Check::ComposeFile, format!("compose file {} does not exist", stack.compose_file.display()));
        return report;
    }
    let compose = match ComposeFile::load(&compose_path) {
        Ok(compose) => compose,
        Err(e) => {
            report.error(Check::ComposeFile, format!("{}: {}", stack.compose_file.display(), e));
            return report;
        }
    };
    debug!(stack = %stack.name, services = compose.services.len(), "Compose file parsed");

    check_compose(&compose, stack, contract, &mut report);
    info!(stack = %stack.name, findings = report.findings.len(), "Stack checked");
    report
}

/// The compose-level checks, separated from file discovery.
pub fn check_compose(compose: &ComposeFile, stack: &BackendStack, contract: &StackContract, report: &mut StackReport) {
    let db = &contract.database;
    let database = compose.database_service();

    match database {
        Some((name, service)) => {
            let expected = [
                ("MYSQL_DATABASE", db.database.as_str()),
                ("MYSQL_USER", db.user.as_str()),
                ("MYSQL_PASSWORD", db.password.as_str()),
                ("MYSQL_ROOT_PASSWORD", db.root_password.as_str()),
            ];
            for (key, want) in expected {
                match service.environment.get(key) {
                    None => report.error(
                        Check::DatabaseCredentials,
                        format!("service '{}' does not declare {}", name, key),
                    ),
                    Some(got) if got != want => report.error(
                        Check::DatabaseCredentials,
                        format!("service '{}' declares {}={}, documented value is {}", name, key, got, want),
                    ),
                    Some(_) => {}
                }
            }
        }
        None => report.error(Check::DatabaseCredentials, "no database service found".to_string()),
    }
    let db_name = database.map(|(name, _)| name);

    let port = db.port.to_string();
    let app_expected = [
        ("DB_HOST", db.host.as_str()),
        ("DB_PORT", port.as_str()),
        ("DB_NAME", db.database.as_str()),
        ("DB_USER", db.user.as_str()),
        ("DB_PASSWORD", db.password.as_str()),
    ];
    for (name, service) in compose.services.iter().filter(|(n, _)| Some(n.as_str()) != db_name) {
        for (key, want) in app_expected {
            if let Some(got) = service.environment.get(key) {
                if got != want {
                    report.error(
                        Check::AppCredentials,
                        format!("service '{}' declares {}={}, documented value is {}", name, key, got, want),
                    );
                }
            }
        }
    }

    let backends = compose.services_publishing(stack.port);
    if backends.is_empty() {
        report.error(Check::BackendPort, format!("no service publishes documented port {}", stack.port));
    }
    if let Some(db_name) = db_name {
        for backend in &backends {
            if !compose.services[*backend].depends_on.contains(db_name) {
                report.warn(
                    Check::StartupOrder,
                    format!("service '{}' does not list '{}' in depends_on", backend, db_name),
                );
            }
        }
    }

    for (name, service) in &compose.services {
        let looks_frontend = ["frontend", "react", "vue"].iter().any(|hint| {
            name.contains(hint) || service.build_context().map(|c| c.contains(hint)).unwrap_or(false)
        });
        if looks_frontend && !service.publishes(contract.frontend_port) {
            report.error(
                Check::FrontendPort,
                format!("frontend service '{}' does not publish port {}", name, contract.frontend_port),
            );
        }
    }
}

/// Checks the frontend boilerplate directories. Frontends are optional, so
/// every finding is a warning.
pub fn check_frontends(root: &Path, contract: &StackContract) -> StackReport {
    let mut report = StackReport::new("frontend");
    for dir in &contract.frontend_dirs {
        let path = root.join(dir);
        if !path.is_dir() {
            report.warn(Check::FrontendLayout, format!("frontend directory {} does not exist", dir.display()));
        } else if !path.join("Dockerfile").is_file() {
            report.warn(Check::FrontendLayout, format!("{} has no Dockerfile", dir.display()));
        }
    }
    report
}
