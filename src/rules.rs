//! Rule installation: shells out to `auditctl` to flush and install the
//! configured audit rules before the netlink transport starts receiving.

use std::process::Command;

use crate::error::RulesError;

/// Abstraction over running an external command, so tests can substitute a
/// fake executor instead of shelling out.
pub trait Executor {
    fn run(&self, program: &str, args: &[&str]) -> std::io::Result<bool>;
}

pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run(&self, program: &str, args: &[&str]) -> std::io::Result<bool> {
        Ok(Command::new(program).args(args).status()?.success())
    }
}

/// Flushes existing audit rules, then installs each rule string verbatim
/// as arguments to the `auditctl` invocation.
pub fn apply(rules: &[String], executor: &impl Executor) -> Result<(), RulesError> {
    let flushed = executor.run("auditctl", &["-D"]).map_err(RulesError::Flush)?;
    if !flushed {
        return Err(RulesError::Flush(std::io::Error::other("auditctl -D exited non-zero")));
    }
    log::info!("flushed existing audit rules");

    let non_empty: Vec<&String> = rules.iter().filter(|r| !r.is_empty()).collect();
    if non_empty.is_empty() {
        return Err(RulesError::NoRulesConfigured);
    }

    for (index, rule) in non_empty.iter().enumerate() {
        let args: Vec<&str> = rule.split_whitespace().collect();
        let ok = executor
            .run("auditctl", &args)
            .map_err(|source| RulesError::AddRule { index, source })?;
        if !ok {
            return Err(RulesError::AddRule {
                index,
                source: std::io::Error::other(format!("auditctl {} exited non-zero", rule)),
            });
        }
        log::info!("added audit rule #{}", index + 1);
    }

    Ok(())
}
