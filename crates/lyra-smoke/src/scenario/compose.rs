//! `extends` resolution and static checks.
//!
//! A resolved scenario's steps are its parent's resolved steps followed by
//! its own, so every scenario is a superset prefix of what it extends.

use super::schema::{Catalog, CatalogError, ScenarioDef, Step};
use super::state::{check_phase_path, Phase};
use super::vars::placeholders;
use std::collections::HashSet;

/// A scenario with its inheritance flattened
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedScenario {
    /// Scenario name
    pub name: String,
    /// Description, if any
    pub description: Option<String>,
    /// Ancestors then the scenario itself, root first
    pub lineage: Vec<String>,
    /// Steps in execution order
    pub steps: Vec<Step>,
    /// Phase the scenario is in after its last `enter`
    pub final_phase: Phase,
}

impl ResolvedScenario {
    /// Steps that will actually execute
    #[must_use]
    pub fn active_steps(&self) -> usize {
        self.steps.iter().filter(|s| !s.skip).count()
    }
}

impl Catalog {
    /// Flatten one scenario and check it.
    ///
    /// # Errors
    ///
    /// Unknown names, `extends` cycles, duplicate step names, unresolvable
    /// `${...}` or variable references, and illegal phase sequences.
    pub fn resolve(&self, name: &str) -> Result<ResolvedScenario, CatalogError> {
        let chain = self.lineage(name)?;
        let mut steps = Vec::new();
        for def in &chain {
            steps.extend(def.steps.iter().cloned());
        }

        let resolved_name = name.to_string();
        check_unique_steps(&resolved_name, &steps)?;
        self.check_references(&resolved_name, &steps)?;
        let final_phase = check_phase_path(
            steps
                .iter()
                .filter(|s| !s.skip)
                .filter_map(|s| s.enter.map(|phase| (s.name.as_str(), phase))),
        )
        .map_err(|e| CatalogError::InvalidPhase {
            scenario: resolved_name.clone(),
            message: e.to_string(),
        })?;

        let description = chain.last().and_then(|def| def.description.clone());
        Ok(ResolvedScenario {
            name: resolved_name,
            description,
            lineage: chain.iter().map(|def| def.name.clone()).collect(),
            steps,
            final_phase,
        })
    }

    /// Resolve every runnable (non-abstract) scenario in declaration order.
    ///
    /// # Errors
    ///
    /// The first scenario that fails to resolve.
    pub fn resolve_all(&self) -> Result<Vec<ResolvedScenario>, CatalogError> {
        self.scenarios
            .iter()
            .filter(|s| !s.is_abstract)
            .map(|s| self.resolve(&s.name))
            .collect()
    }

    /// Resolve only `names`, keeping the given order.
    ///
    /// # Errors
    ///
    /// Unknown names and everything [`Catalog::resolve`] rejects.
    pub fn resolve_selected(
        &self,
        names: &[String],
    ) -> Result<Vec<ResolvedScenario>, CatalogError> {
        names.iter().map(|name| self.resolve(name)).collect()
    }

    /// Root-first chain of definitions ending at `name`
    fn lineage(&self, name: &str) -> Result<Vec<&ScenarioDef>, CatalogError> {
        let mut chain: Vec<&ScenarioDef> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut current = self
            .scenario(name)
            .ok_or_else(|| CatalogError::UnknownScenario(name.to_string()))?;

        loop {
            if !seen.insert(current.name.as_str()) {
                let mut cycle: Vec<String> = chain.iter().map(|d| d.name.clone()).collect();
                cycle.push(current.name.clone());
                return Err(CatalogError::InheritanceCycle(cycle));
            }
            chain.push(current);
            let Some(parent) = &current.extends else {
                break;
            };
            current = self
                .scenario(parent)
                .ok_or_else(|| CatalogError::UnknownParent {
                    scenario: current.name.clone(),
                    parent: parent.clone(),
                })?;
        }

        chain.reverse();
        Ok(chain)
    }

    /// Every `${name}` must be a catalog locator or captured by an earlier
    /// step; every variable read must be captured earlier.
    fn check_references(&self, scenario: &str, steps: &[Step]) -> Result<(), CatalogError> {
        let mut captured: HashSet<&str> = HashSet::new();
        // Skipped steps neither run nor capture.
        for step in steps.iter().filter(|step| !step.skip) {
            let invalid = |message: String| CatalogError::InvalidReference {
                scenario: scenario.to_string(),
                step: step.name.clone(),
                message,
            };

            for template in step.action.locator_templates() {
                let names = placeholders(template).map_err(|e| invalid(e.to_string()))?;
                for name in names {
                    if !captured.contains(name) && !self.locators.contains_key(name) {
                        return Err(invalid(format!("unknown locator reference '${{{name}}}'")));
                    }
                }
            }
            for var in step.action.variable_reads() {
                if !captured.contains(var) {
                    return Err(invalid(format!("'{var}' is not captured by an earlier step")));
                }
            }
            if let Some(into) = step.action.captures() {
                let _ = captured.insert(into);
            }
        }
        Ok(())
    }
}

fn check_unique_steps(scenario: &str, steps: &[Step]) -> Result<(), CatalogError> {
    let mut names = HashSet::new();
    for step in steps {
        if !names.insert(step.name.as_str()) {
            return Err(CatalogError::DuplicateStep {
                scenario: scenario.to_string(),
                step: step.name.clone(),
            });
        }
    }
    Ok(())
}
