//! BDD tests for the credential resolution workflow.

use qodana_prep_common::{Environment, MemoryEnvironment, QODANA_TOKEN};
use qodana_prep_credential::{
    CachePolicy, Credential, CredentialError, CredentialResolver, CredentialSource,
    MemorySecretStore, Prompter, SecretStore, TokenValidator, TransportError,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::Cell;

const PROJECT_ID: &str = "demo-7c41d0";

/// How the stub validator should answer.
#[derive(Clone, Default)]
enum ServiceBehaviour {
    Accept(String),
    #[default]
    Reject,
    Unreachable,
}

struct StubValidator {
    behaviour: ServiceBehaviour,
    calls: Cell<usize>,
}

impl TokenValidator for StubValidator {
    fn validate(&self, _token: &str) -> Result<Option<String>, TransportError> {
        self.calls.set(self.calls.get() + 1);
        match &self.behaviour {
            ServiceBehaviour::Accept(name) => Ok(Some(name.clone())),
            ServiceBehaviour::Reject => Ok(None),
            ServiceBehaviour::Unreachable => Err(TransportError::Request {
                url: "https://qodana.example/api/v1/projects".to_owned(),
                reason: "connection refused".to_owned(),
            }),
        }
    }
}

/// Behaves like a CI runner: never attached to a terminal.
struct Headless;

impl Prompter for Headless {
    fn is_interactive(&self) -> bool {
        false
    }

    fn read_token(&self) -> std::io::Result<String> {
        Err(std::io::Error::other("not a terminal"))
    }
}

#[derive(Default)]
struct CredentialWorld {
    explicit: Option<String>,
    env: MemoryEnvironment,
    store: MemorySecretStore,
    behaviour: ServiceBehaviour,
    refresh: bool,
    calls: usize,
    result: Option<Result<Option<Credential>, CredentialError>>,
}

impl CredentialWorld {
    fn credential(&self) -> &Credential {
        match self.result.as_ref().expect("result set") {
            Ok(Some(credential)) => credential,
            other => panic!("expected a credential, got {other:?}"),
        }
    }

    fn error(&self) -> &CredentialError {
        match self.result.as_ref().expect("result set") {
            Err(err) => err,
            Ok(other) => panic!("expected an error, got {other:?}"),
        }
    }
}

#[fixture]
fn world() -> CredentialWorld {
    CredentialWorld::default()
}

#[given("a token \"{token}\" passed on the command line")]
fn given_explicit(world: &mut CredentialWorld, token: String) {
    world.explicit = Some(token);
}

#[given("the environment token is \"{token}\"")]
fn given_environment(world: &mut CredentialWorld, token: String) {
    world.env.set_var(QODANA_TOKEN, &token);
}

#[given("the secret store already holds \"{token}\"")]
fn given_cached(world: &mut CredentialWorld, token: String) {
    world.store.set(PROJECT_ID, &token).expect("seed store");
}

#[given("the validation service accepts tokens for project \"{name}\"")]
fn given_accepting(world: &mut CredentialWorld, name: String) {
    world.behaviour = ServiceBehaviour::Accept(name);
}

#[given("the validation service rejects every token")]
fn given_rejecting(world: &mut CredentialWorld) {
    world.behaviour = ServiceBehaviour::Reject;
}

#[given("the validation service is unreachable")]
fn given_unreachable(world: &mut CredentialWorld) {
    world.behaviour = ServiceBehaviour::Unreachable;
}

#[given("a refresh is requested")]
fn given_refresh(world: &mut CredentialWorld) {
    world.refresh = true;
}

#[when("the credential is validated")]
fn when_validated(world: &mut CredentialWorld) {
    let validator = StubValidator {
        behaviour: world.behaviour.clone(),
        calls: Cell::new(0),
    };
    let prompter = Headless;
    let result = {
        let resolver = CredentialResolver::new(&validator, &world.store, &world.env)
            .with_project_identity(PROJECT_ID)
            .with_cache_policy(CachePolicy::TrustCache)
            .with_default_sources(world.explicit.clone(), &prompter);
        let mut stderr = Vec::new();
        resolver.validate(world.refresh, &mut stderr)
    };
    world.calls = validator.calls.get();
    world.result = Some(result);
}

#[then("the credential comes from the command-line argument")]
fn then_from_argument(world: &mut CredentialWorld) {
    assert_eq!(
        world.credential().origin(),
        CredentialSource::ExplicitArgument
    );
}

#[then("the credential comes from the system keyring")]
fn then_from_keyring(world: &mut CredentialWorld) {
    assert_eq!(world.credential().origin(), CredentialSource::CachedSecret);
}

#[then("the linked project is \"{name}\"")]
fn then_linked(world: &mut CredentialWorld, name: String) {
    assert_eq!(world.credential().project_name(), Some(name.as_str()));
}

#[then("the secret store holds \"{token}\"")]
fn then_store_holds(world: &mut CredentialWorld, token: String) {
    let stored = world.store.get(PROJECT_ID).expect("store get");
    assert_eq!(stored.as_deref(), Some(token.as_str()));
}

#[then("the secret store is empty")]
fn then_store_empty(world: &mut CredentialWorld) {
    assert!(world.store.is_empty(), "secret store should stay empty");
}

#[then("resolution fails with an invalid token error")]
fn then_invalid(world: &mut CredentialWorld) {
    let err = world.error();
    assert!(
        matches!(err, CredentialError::InvalidCredential { .. }),
        "expected InvalidCredential, got {err:?}"
    );
    assert!(err.is_fatal());
}

#[then("resolution fails with a transport error")]
fn then_transport(world: &mut CredentialWorld) {
    let err = world.error();
    assert!(
        matches!(err, CredentialError::Transport(_)),
        "expected Transport, got {err:?}"
    );
    assert!(!err.is_fatal());
}

#[then("the validation service was called {count} times")]
fn then_call_count(world: &mut CredentialWorld, count: usize) {
    assert_eq!(world.calls, count);
}

#[then("no credential is returned")]
fn then_no_credential(world: &mut CredentialWorld) {
    let result = world.result.as_ref().expect("result set");
    assert!(matches!(result, Ok(None)), "expected Ok(None), got {result:?}");
}

#[scenario(
    path = "tests/features/credential_resolution.feature",
    name = "Explicit argument wins over the environment"
)]
fn scenario_explicit_wins(world: CredentialWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/credential_resolution.feature",
    name = "Rejected token is fatal and never cached"
)]
fn scenario_rejected(world: CredentialWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/credential_resolution.feature",
    name = "Cached token is trusted without refresh"
)]
fn scenario_cached_trusted(world: CredentialWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/credential_resolution.feature",
    name = "Cached token is revalidated on refresh"
)]
fn scenario_cached_refresh(world: CredentialWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/credential_resolution.feature",
    name = "Unreachable service is reported separately"
)]
fn scenario_unreachable(world: CredentialWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/credential_resolution.feature",
    name = "No token anywhere is tolerated"
)]
fn scenario_no_token(world: CredentialWorld) {
    let _ = world;
}
