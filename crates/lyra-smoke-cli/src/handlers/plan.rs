//! Plan command handler: validate a catalog and list resolved steps.

use crate::commands::PlanArgs;
use crate::error::CliResult;
use lyra_smoke::scenario::{Catalog, ResolvedScenario};

/// Load the catalog and resolve the selected scenarios
pub fn load_plan(args: &PlanArgs) -> CliResult<(Catalog, Vec<ResolvedScenario>)> {
    let catalog = Catalog::from_path(&args.catalog)?;
    let scenarios = select(&catalog, &args.scenario)?;
    Ok((catalog, scenarios))
}

/// Every runnable scenario, or just `names` in the order given
pub fn select(catalog: &Catalog, names: &[String]) -> CliResult<Vec<ResolvedScenario>> {
    Ok(if names.is_empty() {
        catalog.resolve_all()?
    } else {
        catalog.resolve_selected(names)?
    })
}

/// Human-readable plan
#[must_use]
pub fn render_plan(catalog: &Catalog, scenarios: &[ResolvedScenario]) -> String {
    let mut out = format!("Catalog '{}': {} scenario(s)\n", catalog.name, scenarios.len());
    for scenario in scenarios {
        out.push_str(&format!("\n{}", scenario.name));
        if scenario.lineage.len() > 1 {
            out.push_str(&format!(" ({})", scenario.lineage.join(" > ")));
        }
        out.push('\n');
        if let Some(description) = &scenario.description {
            out.push_str(&format!("  {description}\n"));
        }
        for (index, step) in scenario.steps.iter().enumerate() {
            let mut line = format!("  {:>2}. {}: {}", index + 1, step.name, step.action.describe());
            if step.retries > 0 {
                line.push_str(&format!(" [retries {}]", step.retries));
            }
            if let Some(phase) = step.enter {
                line.push_str(&format!(" -> {phase}"));
            }
            if step.skip {
                line.push_str(" [skip]");
            }
            out.push_str(&line);
            out.push('\n');
        }
        out.push_str(&format!("  ends in {}\n", scenario.final_phase));
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
version: "1.0"
name: mini
locators:
  menu: "//Menu"
scenarios:
  - name: launch
    description: menu comes up
    steps:
      - name: menu_visible
        wait_for: { locator: "${menu}" }
  - name: play
    extends: launch
    steps:
      - name: hud
        wait_for: { locator: "//HUD", timeout_s: 60 }
        enter: in_match
      - name: later
        pause: { ms: 10 }
        skip: true
"#;

    #[test]
    fn test_render_plan_lists_inherited_steps() {
        let catalog = Catalog::from_yaml(CATALOG).unwrap();
        let scenarios = select(&catalog, &[]).unwrap();
        let plan = render_plan(&catalog, &scenarios);

        assert!(plan.starts_with("Catalog 'mini': 2 scenario(s)"));
        assert!(plan.contains("play (launch > play)"));
        assert!(plan.contains("   1. menu_visible: wait for ${menu}"));
        assert!(plan.contains("   2. hud: wait for //HUD (up to 60s) -> in_match"));
        assert!(plan.contains("later: pause 10ms [skip]"));
        assert!(plan.contains("ends in in_match"));
    }

    #[test]
    fn test_select_named() {
        let catalog = Catalog::from_yaml(CATALOG).unwrap();
        let scenarios = select(&catalog, &["play".to_string()]).unwrap();
        assert_eq!(scenarios.len(), 1);
        assert!(select(&catalog, &["nope".to_string()]).is_err());
    }

    #[test]
    fn test_load_plan_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.yaml");
        std::fs::write(&path, CATALOG).unwrap();
        let (catalog, scenarios) = load_plan(&PlanArgs {
            catalog: path,
            scenario: Vec::new(),
        })
        .unwrap();
        assert_eq!(catalog.name, "mini");
        assert_eq!(scenarios.len(), 2);
    }
}
