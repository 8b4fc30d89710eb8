//! Scripted [`CommandRunner`] that records every invocation.

use std::sync::{Arc, Mutex, MutexGuard};

use myqtt_system::{CommandOutput, CommandRunner, CommandSpec, SystemResult};

type Responder = Arc<dyn Fn(&CommandSpec) -> CommandOutput + Send + Sync>;

#[derive(Clone)]
struct Rule {
    prefix: String,
    responder: Responder,
}

/// Shared, cloneable log of the commands a [`ScriptedRunner`] received.
#[derive(Clone, Default)]
pub struct CallLog {
    inner: Arc<Mutex<Vec<CommandSpec>>>,
}

impl CallLog {
    fn guard(&self) -> MutexGuard<'_, Vec<CommandSpec>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn record(&self, spec: &CommandSpec) {
        self.guard().push(spec.clone());
    }

    /// Every command rendered as a single line, in call order.
    #[must_use]
    pub fn commands(&self) -> Vec<String> {
        self.guard().iter().map(ToString::to_string).collect()
    }

    /// First recorded command whose rendering starts with `prefix`.
    #[must_use]
    pub fn find(&self, prefix: &str) -> Option<CommandSpec> {
        self.guard()
            .iter()
            .find(|spec| spec.to_string().starts_with(prefix))
            .cloned()
    }

    /// Number of recorded commands starting with `prefix`.
    #[must_use]
    pub fn count(&self, prefix: &str) -> usize {
        self.guard()
            .iter()
            .filter(|spec| spec.to_string().starts_with(prefix))
            .count()
    }
}

/// Command runner answering from prefix-matched rules.
///
/// Rules added later take precedence, so a test can override fixture defaults.
/// Unmatched commands get the default output (success with empty stdout).
#[derive(Clone)]
pub struct ScriptedRunner {
    rules: Vec<Rule>,
    default: CommandOutput,
    log: CallLog,
}

impl Default for ScriptedRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedRunner {
    /// Runner that accepts every command.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            default: CommandOutput::success(""),
            log: CallLog::default(),
        }
    }

    /// Answer commands starting with `prefix` with a fixed output.
    #[must_use]
    pub fn respond(self, prefix: &str, output: CommandOutput) -> Self {
        self.respond_with(prefix, move |_| output.clone())
    }

    /// Answer commands starting with `prefix` by calling `responder`.
    #[must_use]
    pub fn respond_with<F>(mut self, prefix: &str, responder: F) -> Self
    where
        F: Fn(&CommandSpec) -> CommandOutput + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            prefix: prefix.to_string(),
            responder: Arc::new(responder),
        });
        self
    }

    /// Handle onto the call log; stays valid after the runner is moved.
    #[must_use]
    pub fn calls(&self) -> CallLog {
        self.log.clone()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, spec: &CommandSpec) -> SystemResult<CommandOutput> {
        self.log.record(spec);
        let rendered = spec.to_string();
        let output = self
            .rules
            .iter()
            .rev()
            .find(|rule| rendered.starts_with(&rule.prefix))
            .map_or_else(|| self.default.clone(), |rule| (rule.responder)(spec));
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_rules_override_earlier_ones() -> SystemResult<()> {
        let runner = ScriptedRunner::new()
            .respond("service", CommandOutput::success("first"))
            .respond("service myqtt", CommandOutput::failure(1, "second"));
        let log = runner.calls();

        let output = runner.run(&CommandSpec::new("service").args(["myqtt", "restart"]))?;
        assert_eq!(output.status, Some(1));
        let other = runner.run(&CommandSpec::new("service").args(["other", "restart"]))?;
        assert_eq!(other.stdout, "first");
        let unmatched = runner.run(&CommandSpec::new("id").arg("myqttd"))?;
        assert!(unmatched.is_success());

        assert_eq!(log.count("service"), 2);
        assert_eq!(
            log.commands(),
            [
                "service myqtt restart",
                "service other restart",
                "id myqttd"
            ]
        );
        assert!(log.find("id").is_some());
        Ok(())
    }
}
