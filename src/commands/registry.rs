//! Command registry
//!
//! Centralized registry for all available commands.
//! This allows loose coupling between command implementations and the dispatcher.

use super::{admin, counter, key, string, ttl, CommandHandler};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of all available commands
pub struct CommandRegistry {
    commands: HashMap<String, Arc<dyn CommandHandler>>,
}

impl CommandRegistry {
    /// Create a new command registry and register all commands
    pub fn new() -> Self {
        let mut registry = CommandRegistry {
            commands: HashMap::new(),
        };

        // Register string commands
        registry.register(Arc::new(string::SetCommand));
        registry.register(Arc::new(string::GetCommand));

        // Register key commands
        registry.register(Arc::new(key::DelCommand));
        registry.register(Arc::new(key::ExistsCommand));

        // Register TTL commands
        registry.register(Arc::new(ttl::TtlCommand));
        registry.register(Arc::new(ttl::ExpireCommand));
        registry.register(Arc::new(ttl::ExpireAtCommand));
        registry.register(Arc::new(ttl::PersistCommand));

        // Register counter commands
        registry.register(Arc::new(counter::IncrByCommand));
        registry.register(Arc::new(counter::DecrByCommand));

        // Register admin commands
        registry.register(Arc::new(admin::BgSaveCommand));

        registry
    }

    /// Register a command
    fn register(&mut self, command: Arc<dyn CommandHandler>) {
        let name = command.name().to_uppercase();
        self.commands.insert(name, command);
    }

    /// Get a command by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<Arc<dyn CommandHandler>> {
        self.commands.get(&name.to_uppercase()).cloned()
    }

    /// Check if a command exists
    pub fn has_command(&self, name: &str) -> bool {
        self.commands.contains_key(&name.to_uppercase())
    }

    /// All commands, sorted by name
    pub fn handlers(&self) -> Vec<Arc<dyn CommandHandler>> {
        let mut handlers: Vec<_> = self.commands.values().cloned().collect();
        handlers.sort_by_key(|h| h.name());
        handlers
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = CommandRegistry::new();
        assert!(registry.has_command("set"));
        assert!(registry.has_command("ExpireAt"));
        assert_eq!(registry.get("incrby").unwrap().name(), "INCRBY");
        assert!(registry.get("HSET").is_none());
    }

    #[test]
    fn test_handlers_sorted() {
        let names: Vec<_> = CommandRegistry::new()
            .handlers()
            .iter()
            .map(|h| h.name())
            .collect();
        assert_eq!(
            names,
            vec![
                "BGSAVE", "DECRBY", "DEL", "EXISTS", "EXPIRE", "EXPIREAT", "GET", "INCRBY",
                "PERSIST", "SET", "TTL"
            ]
        );
    }
}
