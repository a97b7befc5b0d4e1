//! Dependencies command - print the dependency tree

use crate::error::{BossError, BossResult};
use crate::graph::{DirtyTracker, GraphItem};
use crate::installer::MODULES_DIR;
use crate::lock::PackageLock;
use crate::manifest::Package;
use console::style;
use std::collections::HashSet;
use std::path::Path;
use tracing::warn;

/// Execute the dependencies command
pub async fn execute(project_dir: &Path) -> BossResult<()> {
    let package = Package::load_project(project_dir)?;
    let roots: Vec<String> = package
        .dependency_list()?
        .iter()
        .map(|dep| dep.key())
        .collect();

    println!("{}", style(&package.name).bold());
    if roots.is_empty() {
        println!("{}", style("No dependencies").dim());
        return Ok(());
    }

    let modules_dir = project_dir.join(MODULES_DIR);
    let graph = GraphItem::load(&package.dependency_list()?, &modules_dir);
    let rebuild = pending_rebuilds(&graph, &package.lock, &modules_dir)?;

    for line in render_tree(&graph, &package.lock, &rebuild, &roots) {
        println!("{}", line);
    }
    Ok(())
}

/// Keys an install would rebuild right now
fn pending_rebuilds(
    graph: &GraphItem,
    lock: &PackageLock,
    modules_dir: &Path,
) -> BossResult<HashSet<String>> {
    let mut lock = lock.clone();
    for node in graph.nodes() {
        if let Some(version) = lock.get(&node.dependency).map(|e| e.version.clone()) {
            lock.need_update(&node.dependency, &version, modules_dir);
        }
    }
    match graph.queue(&mut lock, false) {
        Ok(queue) => Ok(queue.into_iter().map(|node| node.key).collect()),
        // dirtiness was already spread into `lock` before ordering failed
        Err(BossError::CycleDetected(members)) => {
            warn!("Dependency cycle between: {}", members.join(", "));
            let mut outdated: HashSet<String> = graph
                .nodes()
                .map(|node| node.key.clone())
                .filter(|key| lock.is_dirty(key))
                .collect();
            outdated.extend(members);
            Ok(outdated)
        }
        Err(e) => Err(e),
    }
}

/// Tree lines below the project name, one per node occurrence
fn render_tree(
    graph: &GraphItem,
    lock: &PackageLock,
    rebuild: &HashSet<String>,
    roots: &[String],
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut path = Vec::new();
    render_level(graph, lock, rebuild, roots, "", &mut path, &mut lines);
    lines
}

fn render_level(
    graph: &GraphItem,
    lock: &PackageLock,
    rebuild: &HashSet<String>,
    keys: &[String],
    prefix: &str,
    path: &mut Vec<String>,
    lines: &mut Vec<String>,
) {
    for (i, key) in keys.iter().enumerate() {
        let Some(node) = graph.node(key) else {
            continue;
        };
        let last = i + 1 == keys.len();
        let branch = if last { "└── " } else { "├── " };

        let version = match lock.get(&node.dependency) {
            Some(entry) => entry.version.clone(),
            None => "not installed".to_string(),
        };
        let mut line = format!(
            "{}{}{} {}",
            prefix,
            branch,
            node.name(),
            style(format!("@{}", version)).dim()
        );
        if rebuild.contains(key) {
            line.push_str(&format!(" {}", style("(outdated)").yellow()));
        }

        if path.contains(key) {
            line.push_str(&format!(" {}", style("(cycle)").red()));
            lines.push(line);
            continue;
        }
        lines.push(line);

        path.push(key.clone());
        let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
        render_level(
            graph,
            lock,
            rebuild,
            graph.depends_on(key),
            &child_prefix,
            path,
            lines,
        );
        path.pop();
    }
}
