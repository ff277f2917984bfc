//! Dependency resolution
//!
//! Turns a requested tool into an ordered install plan: every transitive
//! dependency exactly once, dependencies before dependents.

use std::collections::HashSet;

use tracing::debug;

use crate::error::CoreError;
use crate::registry::{ToolDescriptor, ToolRegistry};

/// Ordered tools to process for one request
#[derive(Debug, Clone, Default)]
pub struct InstallPlan {
    steps: Vec<ToolDescriptor>,
}

impl InstallPlan {
    /// Steps in execution order
    #[must_use]
    pub fn steps(&self) -> &[ToolDescriptor] {
        &self.steps
    }

    /// Tool ids in execution order
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.steps.iter().map(|t| t.id.as_str()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Position in one tool's dependency list during the walk
struct Frame<'a> {
    tool: &'a ToolDescriptor,
    next_dep: usize,
}

/// Depth-first walk from `root`, appending finished tools to `steps`
///
/// `done` carries across calls so a shared dependency is emitted once.
fn visit<'a>(
    registry: &'a ToolRegistry,
    root: &'a ToolDescriptor,
    done: &mut HashSet<&'a str>,
    steps: &mut Vec<ToolDescriptor>,
) -> Result<(), CoreError> {
    if done.contains(root.id.as_str()) {
        return Ok(());
    }

    // active path, root first; mirrors `stack`
    let mut path: Vec<&'a str> = vec![root.id.as_str()];
    let mut visiting: HashSet<&'a str> = HashSet::from([root.id.as_str()]);
    let mut stack = vec![Frame {
        tool: root,
        next_dep: 0,
    }];

    while let Some(frame) = stack.last_mut() {
        let tool = frame.tool;

        let Some(dep_id) = tool.depends_on.get(frame.next_dep) else {
            stack.pop();
            path.pop();
            visiting.remove(tool.id.as_str());
            done.insert(tool.id.as_str());
            steps.push(tool.clone());
            continue;
        };
        frame.next_dep += 1;

        if done.contains(dep_id.as_str()) {
            continue;
        }
        if visiting.contains(dep_id.as_str()) {
            let start = path.iter().position(|id| *id == dep_id.as_str()).unwrap_or(0);
            let mut cycle: Vec<String> = path[start..].iter().map(|id| (*id).to_string()).collect();
            cycle.push(dep_id.clone());
            return Err(CoreError::CyclicDependency { cycle });
        }

        let dep = registry.lookup(dep_id)?;
        path.push(dep.id.as_str());
        visiting.insert(dep.id.as_str());
        stack.push(Frame {
            tool: dep,
            next_dep: 0,
        });
    }

    Ok(())
}

/// Build the install plan for `tool_id`
///
/// # Errors
/// Returns `CoreError::UnknownTool` if the tool (or a dependency) is not
/// registered, or `CoreError::CyclicDependency` naming the cycle.
pub fn resolve(registry: &ToolRegistry, tool_id: &str) -> Result<InstallPlan, CoreError> {
    let root = registry.lookup(tool_id)?;
    let mut done = HashSet::new();
    let mut steps = Vec::new();
    visit(registry, root, &mut done, &mut steps)?;

    let plan = InstallPlan { steps };
    debug!(tool = tool_id, plan = ?plan.ids(), "resolved install plan");
    Ok(plan)
}

/// Resolve every registered tool into one combined plan
///
/// Used to validate a registry up front; fails on the first cycle found.
///
/// # Errors
/// Returns `CoreError::CyclicDependency` if any tool is part of a cycle
pub fn resolve_all(registry: &ToolRegistry) -> Result<InstallPlan, CoreError> {
    let mut done = HashSet::new();
    let mut steps = Vec::new();
    for tool in registry.all() {
        visit(registry, tool, &mut done, &mut steps)?;
    }
    Ok(InstallPlan { steps })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(id: &str, deps: &[&str]) -> ToolDescriptor {
        ToolDescriptor::new(id)
            .with_package_everywhere(id)
            .depends_on(deps.iter().copied())
    }

    fn registry(tools: Vec<ToolDescriptor>) -> ToolRegistry {
        ToolRegistry::from_descriptors(tools).unwrap()
    }

    #[test]
    fn test_builtin_xyce_plan() {
        let registry = ToolRegistry::builtin().unwrap();
        let plan = resolve(&registry, "xyce").unwrap();
        assert_eq!(plan.ids(), vec!["ngspice", "xyce"]);

        let plan = resolve(&registry, "kicad").unwrap();
        assert_eq!(plan.ids(), vec!["kicad"]);
    }

    #[test]
    fn test_chain() {
        let registry = registry(vec![
            tool("a", &["b"]),
            tool("b", &["c"]),
            tool("c", &[]),
        ]);
        assert_eq!(resolve(&registry, "a").unwrap().ids(), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_diamond_emits_shared_dependency_once() {
        let registry = registry(vec![
            tool("t", &["a", "b"]),
            tool("a", &["c"]),
            tool("b", &["c"]),
            tool("c", &[]),
        ]);
        assert_eq!(resolve(&registry, "t").unwrap().ids(), vec!["c", "a", "b", "t"]);
    }

    #[test]
    fn test_declared_order_is_kept() {
        let registry = registry(vec![
            tool("t", &["z", "a", "m"]),
            tool("z", &[]),
            tool("a", &[]),
            tool("m", &[]),
        ]);
        for _ in 0..3 {
            assert_eq!(
                resolve(&registry, "t").unwrap().ids(),
                vec!["z", "a", "m", "t"]
            );
        }
    }

    #[test]
    fn test_cycle() {
        let registry = registry(vec![
            tool("a", &["b"]),
            tool("b", &["c"]),
            tool("c", &["a"]),
        ]);
        let err = resolve(&registry, "a").unwrap_err();
        match err {
            CoreError::CyclicDependency { cycle } => assert_eq!(cycle, vec!["a", "b", "c", "a"]),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_cycle_below_root() {
        let registry = registry(vec![
            tool("app", &["a"]),
            tool("a", &["b"]),
            tool("b", &["a"]),
        ]);
        let err = resolve(&registry, "app").unwrap_err();
        assert_eq!(err.to_string(), "cyclic dependency: a -> b -> a");
    }

    #[test]
    fn test_self_dependency() {
        let registry = registry(vec![tool("a", &["a"])]);
        assert!(matches!(
            resolve(&registry, "a"),
            Err(CoreError::CyclicDependency { cycle }) if cycle == vec!["a", "a"]
        ));
    }

    #[test]
    fn test_unknown_root() {
        let registry = ToolRegistry::builtin().unwrap();
        assert!(matches!(
            resolve(&registry, "spice"),
            Err(CoreError::UnknownTool(_))
        ));
    }

    #[test]
    fn test_resolve_all() {
        let registry = ToolRegistry::builtin().unwrap();
        let plan = resolve_all(&registry).unwrap();
        assert_eq!(plan.ids(), vec!["ngspice", "kicad", "xyce"]);

        let cyclic = registry_with_cycle();
        assert!(resolve_all(&cyclic).is_err());
    }

    fn registry_with_cycle() -> ToolRegistry {
        registry(vec![
            tool("ngspice", &[]),
            tool("x", &["y"]),
            tool("y", &["x"]),
        ])
    }
}
