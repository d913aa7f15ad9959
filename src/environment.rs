//! Execution environments, preprocessor conditions and compilation directives.
//!
//! A routine's execution context is the set of run-time environments in which
//! it is compiled. It is narrowed by the module itself, by every enclosing
//! `#If <condition> Then` region and by the routine's compilation directives.

use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single run-time environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    ThinClient,
    WebClient,
    MobileClient,
    ThickClientOrdinaryApplication,
    ThickClientManagedApplication,
    Server,
    ExternalConnection,
    MobileAppClient,
    MobileAppServer,
    MobileStandaloneServer,
}

impl Environment {
    pub const ALL: [Environment; 10] = [
        Environment::ThinClient,
        Environment::WebClient,
        Environment::MobileClient,
        Environment::ThickClientOrdinaryApplication,
        Environment::ThickClientManagedApplication,
        Environment::Server,
        Environment::ExternalConnection,
        Environment::MobileAppClient,
        Environment::MobileAppServer,
        Environment::MobileStandaloneServer,
    ];

    fn bit(self) -> u16 {
        1 << (self as u16)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::ThinClient => "thin client",
            Environment::WebClient => "web client",
            Environment::MobileClient => "mobile client",
            Environment::ThickClientOrdinaryApplication => "thick client (ordinary application)",
            Environment::ThickClientManagedApplication => "thick client (managed application)",
            Environment::Server => "server",
            Environment::ExternalConnection => "external connection",
            Environment::MobileAppClient => "mobile application client",
            Environment::MobileAppServer => "mobile application server",
            Environment::MobileStandaloneServer => "mobile standalone server",
        }
    }
}

/// Set of environments, stored as a bit mask.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Environments(u16);

impl Environments {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        Self::from_iter(Environment::ALL)
    }

    /// Every client-side environment.
    pub fn client() -> Self {
        Self::from_iter([
            Environment::ThinClient,
            Environment::WebClient,
            Environment::MobileClient,
            Environment::ThickClientOrdinaryApplication,
            Environment::ThickClientManagedApplication,
            Environment::MobileAppClient,
        ])
    }

    /// Every server-side environment.
    pub fn server() -> Self {
        Self::from_iter([
            Environment::Server,
            Environment::MobileAppServer,
            Environment::MobileStandaloneServer,
        ])
    }

    pub fn only(env: Environment) -> Self {
        Self(env.bit())
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn contains(&self, env: Environment) -> bool {
        self.0 & env.bit() != 0
    }

    /// `true` when every environment of `other` is also in `self`.
    pub fn contains_all(&self, other: Environments) -> bool {
        other.0 & !self.0 == 0
    }

    pub fn intersects(&self, other: Environments) -> bool {
        self.0 & other.0 != 0
    }

    #[must_use]
    pub fn union(self, other: Environments) -> Self {
        Self(self.0 | other.0)
    }

    #[must_use]
    pub fn intersection(self, other: Environments) -> Self {
        Self(self.0 & other.0)
    }

    #[must_use]
    pub fn difference(self, other: Environments) -> Self {
        Self(self.0 & !other.0)
    }

    #[must_use]
    pub fn complement(self) -> Self {
        Self::all().difference(self)
    }

    pub fn iter(&self) -> impl Iterator<Item = Environment> + '_ {
        Environment::ALL.into_iter().filter(|env| self.contains(*env))
    }
}

impl FromIterator<Environment> for Environments {
    fn from_iter<I: IntoIterator<Item = Environment>>(iter: I) -> Self {
        Self(iter.into_iter().fold(0, |mask, env| mask | env.bit()))
    }
}

impl fmt::Debug for Environments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for Environments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        write!(f, "{}", self.iter().map(|env| env.as_str()).join(", "))
    }
}

impl Serialize for Environments {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for Environments {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let envs = Vec::<Environment>::deserialize(deserializer)?;
        Ok(envs.into_iter().collect())
    }
}

// ============================================================================
// Preprocessor symbols and conditions
// ============================================================================

/// Preprocessor instruction symbol usable in `#If` conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbol {
    Client,
    AtClient,
    Server,
    AtServer,
    ThinClient,
    WebClient,
    MobileClient,
    ThickClientOrdinaryApplication,
    ThickClientManagedApplication,
    ExternalConnection,
    MobileAppClient,
    MobileAppServer,
    MobileStandaloneServer,
}

const SYMBOL_NAMES: &[(Symbol, &str, &str)] = &[
    (Symbol::Client, "Клиент", "Client"),
    (Symbol::AtClient, "НаКлиенте", "AtClient"),
    (Symbol::Server, "Сервер", "Server"),
    (Symbol::AtServer, "НаСервере", "AtServer"),
    (Symbol::ThinClient, "ТонкийКлиент", "ThinClient"),
    (Symbol::WebClient, "ВебКлиент", "WebClient"),
    (Symbol::MobileClient, "МобильныйКлиент", "MobileClient"),
    (
        Symbol::ThickClientOrdinaryApplication,
        "ТолстыйКлиентОбычноеПриложение",
        "ThickClientOrdinaryApplication",
    ),
    (
        Symbol::ThickClientManagedApplication,
        "ТолстыйКлиентУправляемоеПриложение",
        "ThickClientManagedApplication",
    ),
    (Symbol::ExternalConnection, "ВнешнееСоединение", "ExternalConnection"),
    (Symbol::MobileAppClient, "МобильноеПриложениеКлиент", "MobileAppClient"),
    (Symbol::MobileAppServer, "МобильноеПриложениеСервер", "MobileAppServer"),
    (
        Symbol::MobileStandaloneServer,
        "МобильныйАвтономныйСервер",
        "MobileStandaloneServer",
    ),
];

impl Symbol {
    /// Parse either spelling, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_lowercase();
        SYMBOL_NAMES
            .iter()
            .find(|(_, primary, alternate)| {
                primary.to_lowercase() == lower || alternate.to_lowercase() == lower
            })
            .map(|(symbol, _, _)| *symbol)
    }

    pub fn name(&self, variant: crate::project::ScriptVariant) -> &'static str {
        SYMBOL_NAMES
            .iter()
            .find(|(symbol, _, _)| symbol == self)
            .map(|(_, primary, alternate)| variant.pick(primary, alternate))
            .unwrap_or_default()
    }

    pub fn environments(&self) -> Environments {
        match self {
            Symbol::Client | Symbol::AtClient => Environments::client(),
            Symbol::Server | Symbol::AtServer => Environments::server(),
            Symbol::ThinClient => Environments::only(Environment::ThinClient),
            Symbol::WebClient => Environments::only(Environment::WebClient),
            Symbol::MobileClient => Environments::only(Environment::MobileClient),
            Symbol::ThickClientOrdinaryApplication => {
                Environments::only(Environment::ThickClientOrdinaryApplication)
            }
            Symbol::ThickClientManagedApplication => {
                Environments::only(Environment::ThickClientManagedApplication)
            }
            Symbol::ExternalConnection => Environments::only(Environment::ExternalConnection),
            Symbol::MobileAppClient => Environments::only(Environment::MobileAppClient),
            Symbol::MobileAppServer => Environments::only(Environment::MobileAppServer),
            Symbol::MobileStandaloneServer => {
                Environments::only(Environment::MobileStandaloneServer)
            }
        }
    }
}

/// Condition of a preprocessor `#If` region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "args", rename_all = "snake_case")]
pub enum Condition {
    Symbol(Symbol),
    Not(Box<Condition>),
    And(Vec<Condition>),
    Or(Vec<Condition>),
}

impl Condition {
    pub fn symbol(symbol: Symbol) -> Self {
        Condition::Symbol(symbol)
    }

    pub fn or(symbols: impl IntoIterator<Item = Symbol>) -> Self {
        Condition::Or(symbols.into_iter().map(Condition::Symbol).collect())
    }

    pub fn negate(condition: Condition) -> Self {
        Condition::Not(Box::new(condition))
    }

    /// Environments in which the condition holds.
    pub fn evaluate(&self) -> Environments {
        match self {
            Condition::Symbol(symbol) => symbol.environments(),
            Condition::Not(inner) => inner.evaluate().complement(),
            Condition::And(parts) => parts
                .iter()
                .fold(Environments::all(), |acc, part| acc.intersection(part.evaluate())),
            Condition::Or(parts) => parts
                .iter()
                .fold(Environments::empty(), |acc, part| acc.union(part.evaluate())),
        }
    }
}

// ============================================================================
// Compilation directives
// ============================================================================

/// Method-level compilation directive (`&AtServer` and friends).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompilationDirective {
    AtClient,
    AtServer,
    AtServerNoContext,
    AtClientAtServerNoContext,
    AtClientAtServer,
}

const DIRECTIVE_NAMES: &[(CompilationDirective, &str, &str)] = &[
    (CompilationDirective::AtClient, "НаКлиенте", "AtClient"),
    (CompilationDirective::AtServer, "НаСервере", "AtServer"),
    (
        CompilationDirective::AtServerNoContext,
        "НаСервереБезКонтекста",
        "AtServerNoContext",
    ),
    (
        CompilationDirective::AtClientAtServerNoContext,
        "НаКлиентеНаСервереБезКонтекста",
        "AtClientAtServerNoContext",
    ),
    (
        CompilationDirective::AtClientAtServer,
        "НаКлиентеНаСервере",
        "AtClientAtServer",
    ),
];

impl CompilationDirective {
    /// Parse either spelling, with or without the leading `&`.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().trim_start_matches('&').to_lowercase();
        DIRECTIVE_NAMES
            .iter()
            .find(|(_, primary, alternate)| {
                primary.to_lowercase() == lower || alternate.to_lowercase() == lower
            })
            .map(|(directive, _, _)| *directive)
    }

    pub fn environments(&self) -> Environments {
        match self {
            CompilationDirective::AtClient => Environments::client(),
            CompilationDirective::AtServer | CompilationDirective::AtServerNoContext => {
                Environments::server()
            }
            CompilationDirective::AtClientAtServerNoContext
            | CompilationDirective::AtClientAtServer => {
                Environments::client().union(Environments::server())
            }
        }
    }
}

/// Union of the environments allowed by `directives`; all environments when
/// the routine carries no directive.
pub fn directive_environments(directives: &[CompilationDirective]) -> Environments {
    if directives.is_empty() {
        return Environments::all();
    }
    directives
        .iter()
        .fold(Environments::empty(), |acc, d| acc.union(d.environments()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::ScriptVariant;

    #[test]
    fn subset_checks() {
        let client = Environments::client();
        let both = client.union(Environments::server());
        assert!(both.contains_all(client));
        assert!(!client.contains_all(both));
        assert!(client.contains_all(Environments::empty()));
    }

    #[test]
    fn complement_round_trips() {
        let server = Environments::server();
        assert_eq!(server.complement().complement(), server);
        assert!(!server.complement().intersects(server));
        assert_eq!(server.union(server.complement()), Environments::all());
    }

    #[test]
    fn symbols_parse_in_both_spellings() {
        assert_eq!(Symbol::from_name("Сервер"), Some(Symbol::Server));
        assert_eq!(Symbol::from_name("server"), Some(Symbol::Server));
        assert_eq!(Symbol::from_name("ВНЕШНЕЕСОЕДИНЕНИЕ"), Some(Symbol::ExternalConnection));
        assert_eq!(Symbol::from_name("Nowhere"), None);
        assert_eq!(Symbol::ThinClient.name(ScriptVariant::Primary), "ТонкийКлиент");
        assert_eq!(Symbol::ThinClient.name(ScriptVariant::Alternate), "ThinClient");
    }

    #[test]
    fn condition_evaluation() {
        let cond = Condition::or([Symbol::Server, Symbol::ExternalConnection]);
        let envs = cond.evaluate();
        assert!(envs.contains(Environment::Server));
        assert!(envs.contains(Environment::ExternalConnection));
        assert!(!envs.contains(Environment::ThinClient));

        let not_client = Condition::negate(Condition::symbol(Symbol::Client));
        assert!(not_client.evaluate().contains(Environment::Server));
        assert!(!not_client.evaluate().contains(Environment::WebClient));

        let narrowed = Condition::And(vec![
            Condition::symbol(Symbol::Client),
            Condition::negate(Condition::symbol(Symbol::WebClient)),
        ]);
        assert!(narrowed.evaluate().contains(Environment::ThinClient));
        assert!(!narrowed.evaluate().contains(Environment::WebClient));
    }

    #[test]
    fn directives_restrict_environments() {
        assert_eq!(
            CompilationDirective::from_name("&НаСервереБезКонтекста"),
            Some(CompilationDirective::AtServerNoContext)
        );
        assert_eq!(directive_environments(&[]), Environments::all());
        let client_only = directive_environments(&[CompilationDirective::AtClient]);
        assert!(!client_only.contains(Environment::Server));
    }

    #[test]
    fn environments_serialize_as_lists() {
        let envs = Environments::only(Environment::Server);
        let json = serde_json::to_string(&envs).unwrap();
        assert_eq!(json, r#"["server"]"#);
        let back: Environments = serde_json::from_str(&json).unwrap();
        assert_eq!(back, envs);
    }
}
