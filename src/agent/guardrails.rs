use tracing::{debug, warn};

use super::error::{AgentError, Result};

pub struct Guardrails {
    max_task_length: usize,
}

impl Guardrails {
    pub fn new() -> Self {
        Self {
            max_task_length: 100_000,
        }
    }

    /// Check if a task is within size limits
    pub fn check_task_size(&self, content: &str) -> Result<()> {
        if content.is_empty() {
            return Err(AgentError::Guardrail("task must not be empty".to_string()));
        }
        if content.len() > self.max_task_length {
            return Err(AgentError::Guardrail(format!(
                "task exceeds maximum length of {} characters",
                self.max_task_length
            )));
        }
        Ok(())
    }

    /// Check for critical system-level destructive commands only
    pub fn check_system_safety(&self, content: &str) -> Result<()> {
        let harmful_patterns = [
            "rm -rf /",
            "format c:",
            ":(){:|:&};:", // Fork bomb
            "dd if=/dev/zero of=/dev/sda",
            "mkfs /dev/sda",
        ];

        let lower_content = content.to_lowercase();

        for pattern in harmful_patterns {
            if lower_content.contains(pattern) {
                warn!("Critical system destructive command detected: {}", pattern);
                return Err(AgentError::Guardrail(
                    "task contains system-destructive commands".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Validate all guardrails for an inbound task
    pub fn validate_input(&self, content: &str) -> Result<()> {
        debug!("Validating task with minimal guardrails");

        self.check_task_size(content)?;
        self.check_system_safety(content)?;

        Ok(())
    }
}

impl Default for Guardrails {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_oversized_and_empty_tasks() {
        let guardrails = Guardrails::new();
        assert!(guardrails.validate_input("").is_err());
        assert!(guardrails.validate_input(&"x".repeat(100_001)).is_err());
        assert!(guardrails.validate_input("build a landing page").is_ok());
    }

    #[test]
    fn rejects_destructive_commands() {
        let guardrails = Guardrails::new();
        assert!(guardrails.validate_input("please run rm -rf / for me").is_err());
    }
}
