//! Flattened index over an agent hierarchy.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::AgentError;
use crate::events::USER_AUTHOR;

use super::agent::LlmAgent;

#[derive(Debug, Clone)]
pub struct AgentTree {
    root: Arc<LlmAgent>,
    agents: HashMap<String, Arc<LlmAgent>>,
    parents: HashMap<String, String>,
}

impl AgentTree {
    /// Index `root` and every agent below it. Names must be unique.
    pub fn new(root: Arc<LlmAgent>) -> Result<Self, AgentError> {
        let mut agents = HashMap::new();
        let mut parents = HashMap::new();
        let mut pending = vec![(Arc::clone(&root), None::<String>)];

        while let Some((agent, parent)) = pending.pop() {
            let name = agent.name().to_string();
            if name.trim().is_empty() || name == USER_AUTHOR {
                return Err(AgentError::Configuration(format!(
                    "invalid agent name '{name}'"
                )));
            }
            if agents.contains_key(&name) {
                return Err(AgentError::Configuration(format!(
                    "duplicate agent name '{name}'"
                )));
            }
            for child in agent.sub_agents() {
                pending.push((Arc::clone(child), Some(name.clone())));
            }
            if let Some(parent) = parent {
                parents.insert(name.clone(), parent);
            }
            agents.insert(name, agent);
        }

        Ok(Self {
            root,
            agents,
            parents,
        })
    }

    pub fn root(&self) -> &Arc<LlmAgent> {
        &self.root
    }

    pub fn get(&self, name: &str) -> Option<&Arc<LlmAgent>> {
        self.agents.get(name)
    }

    pub fn parent_of(&self, name: &str) -> Option<&Arc<LlmAgent>> {
        self.parents.get(name).and_then(|p| self.agents.get(p))
    }

    /// Agents `name` may hand a turn to: its sub-agents, then its parent.
    pub fn transfer_targets(&self, name: &str) -> Vec<Arc<LlmAgent>> {
        let mut targets: Vec<Arc<LlmAgent>> = self
            .get(name)
            .map(|a| a.sub_agents().to_vec())
            .unwrap_or_default();
        if let Some(parent) = self.parent_of(name) {
            targets.push(Arc::clone(parent));
        }
        targets
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
