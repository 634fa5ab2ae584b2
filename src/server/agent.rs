//! Agent registry — maps a name to the `(card, runner)` pair that serves it.
//!
//! The teacher wires exactly one `Arc<dyn AgentExecutor>` into its server.
//! This crate's `agentName?` parameter on `message/send` and
//! `agent/extendedCard` implies more than one agent can be registered in
//! the same process, so the single wire is generalized into a lookup table
//! keyed by name, falling back to the first-registered entry when the
//! caller doesn't name one.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{A2aError, A2aResult};
use crate::server::runner::Runner;
use crate::types::AgentCard;

/// The opaque handle passed to `Runner::run`. Holds the card so the server
/// can answer `agent/extendedCard` without a second lookup.
#[derive(Clone, Debug)]
pub struct Agent {
    pub name: String,
    pub card: AgentCard,
}

struct RegisteredAgent {
    agent: Agent,
    runner: Arc<dyn Runner>,
}

/// Lookup table of registered agents, preserving registration order so
/// "the first registered card" is well-defined.
#[derive(Default)]
pub struct AgentRegistry {
    order: Vec<String>,
    agents: HashMap<String, RegisteredAgent>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent under `card.name`. Re-registering the same name
    /// replaces the prior entry without changing its position in `order`.
    pub fn register(&mut self, card: AgentCard, runner: Arc<dyn Runner>) {
        let name = card.name.clone();
        if !self.agents.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.agents.insert(
            name.clone(),
            RegisteredAgent {
                agent: Agent { name, card },
                runner,
            },
        );
    }

    /// Resolve `name`, or the first-registered agent when `name` is `None`.
    pub fn resolve(&self, name: Option<&str>) -> A2aResult<(&Agent, &Arc<dyn Runner>)> {
        let key = match name {
            Some(n) => n.to_string(),
            None => self
                .order
                .first()
                .cloned()
                .ok_or_else(|| A2aError::agent_not_found("no agents registered"))?,
        };
        self.agents
            .get(&key)
            .map(|r| (&r.agent, &r.runner))
            .ok_or_else(|| A2aError::agent_not_found(key))
    }

    /// Like [`resolve`](Self::resolve), but returns owned clones so the
    /// result can be moved into a spawned task.
    pub fn resolve_owned(&self, name: Option<&str>) -> A2aResult<(Agent, Arc<dyn Runner>)> {
        let (agent, runner) = self.resolve(name)?;
        Ok((agent.clone(), Arc::clone(runner)))
    }

    /// All registered cards, in registration order.
    pub fn cards(&self) -> Vec<&AgentCard> {
        self.order
            .iter()
            .filter_map(|name| self.agents.get(name).map(|r| &r.agent.card))
            .collect()
    }

    /// A single card — named, or the first registered — for
    /// `agent/extendedCard` and the well-known route.
    pub fn card(&self, name: Option<&str>) -> A2aResult<&AgentCard> {
        self.resolve(name).map(|(agent, _)| &agent.card)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::runner::{RunOptions, RunResult};
    use async_trait::async_trait;

    struct NullRunner;

    #[async_trait]
    impl Runner for NullRunner {
        async fn run(&self, _agent: &Agent, _options: RunOptions) -> A2aResult<RunResult> {
            Ok(RunResult::default())
        }
    }

    fn card(name: &str) -> AgentCard {
        AgentCard {
            name: name.to_string(),
            description: "test agent".to_string(),
            url: "http://localhost".to_string(),
            version: "0.1.0".to_string(),
            capabilities: Default::default(),
            skills: vec![],
            default_input_modes: vec!["text".to_string()],
            default_output_modes: vec!["text".to_string()],
            provider: None,
            security_schemes: None,
            signature: None,
        }
    }

    #[test]
    fn resolves_named_agent() {
        let mut registry = AgentRegistry::new();
        registry.register(card("alpha"), Arc::new(NullRunner));
        registry.register(card("beta"), Arc::new(NullRunner));

        let (agent, _) = registry.resolve(Some("beta")).unwrap();
        assert_eq!(agent.name, "beta");
    }

    #[test]
    fn defaults_to_first_registered() {
        let mut registry = AgentRegistry::new();
        registry.register(card("alpha"), Arc::new(NullRunner));
        registry.register(card("beta"), Arc::new(NullRunner));

        let (agent, _) = registry.resolve(None).unwrap();
        assert_eq!(agent.name, "alpha");
    }

    #[test]
    fn unknown_name_is_agent_not_found() {
        let mut registry = AgentRegistry::new();
        registry.register(card("alpha"), Arc::new(NullRunner));

        let err = registry.resolve(Some("missing")).unwrap_err();
        assert_eq!(err.code(), crate::error::AGENT_NOT_FOUND);
    }

    #[test]
    fn empty_registry_is_agent_not_found() {
        let registry = AgentRegistry::new();
        assert!(registry.resolve(None).is_err());
    }

    #[test]
    fn cards_preserve_registration_order() {
        let mut registry = AgentRegistry::new();
        registry.register(card("alpha"), Arc::new(NullRunner));
        registry.register(card("beta"), Arc::new(NullRunner));
        let names: Vec<_> = registry.cards().into_iter().map(|c| c.name.clone()).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }
}
