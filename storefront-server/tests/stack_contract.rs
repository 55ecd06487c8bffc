use std::path::PathBuf;

use storefront_core::stack::{check_frontends, check_stack, ComposeFile, StackContract};

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("..")
}

#[test]
fn repository_compose_file_matches_documented_stack() {
    let contract = StackContract::hackathon();
    let stack = contract.stack("rust").expect("rust stack is part of the contract");

    let report = check_stack(&repo_root(), stack, &contract);
    assert!(report.passed(true), "{:#?}", report.findings);
}

#[test]
fn every_documented_stack_is_shipped() {
    let contract = StackContract::hackathon();
    for stack in &contract.stacks {
        let report = check_stack(&repo_root(), stack, &contract);
        assert!(report.passed(true), "{}: {:#?}", stack.name, report.findings);
    }
}

#[test]
fn frontend_boilerplate_is_complete() {
    let contract = StackContract::hackathon();
    let report = check_frontends(&repo_root(), &contract);
    assert!(report.findings.is_empty(), "{:#?}", report.findings);
}

#[test]
fn server_defaults_agree_with_compose_environment() {
    let compose = ComposeFile::load(&repo_root().join("docker-compose_rust.yml")).unwrap();
    let app = &compose.services["app"];
    let defaults = storefront_server::ServerConfig::default();

    assert_eq!(app.environment.get("STOREFRONT_PORT"), Some(defaults.port.to_string()));
    assert_eq!(app.environment.get("DB_HOST"), Some(defaults.database.host));
    assert_eq!(app.environment.get("DB_NAME"), Some(defaults.database.database));
    assert!(app.publishes(defaults.port));
}
