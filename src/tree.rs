use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Represents a single path segment in the file tree
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TreeNode {
    pub name: String,
    pub path: String,
    pub is_dir: bool,
    pub children: HashMap<String, TreeNode>,
}

impl TreeNode {
    /// Create a new tree node
    pub fn new(name: String, path: String, is_dir: bool) -> Self {
        Self {
            name,
            path,
            is_dir,
            children: HashMap::new(),
        }
    }

    /// Create the unnamed root of a tree
    pub fn root() -> Self {
        Self::new(String::new(), String::new(), true)
    }

    /// Insert a file path, creating intermediate directories as needed.
    ///
    /// The final segment starts out as a leaf. A segment that an earlier path
    /// created as a leaf is promoted to a directory once a later path walks
    /// through it. Inserting the same path twice is a no-op.
    pub fn insert_path(&mut self, path: &str) {
        self.insert_segments(path, false);
    }

    /// Insert a directory marker. Every segment, including the last, is a directory.
    pub fn insert_marker(&mut self, path: &str) {
        self.insert_segments(path, true);
    }

    fn insert_segments(&mut self, path: &str, last_is_dir: bool) {
        let segments: Vec<&str> = path.split('/').collect();
        let last = segments.len() - 1;
        let mut current = self;
        let mut prefix = String::new();

        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                prefix.push('/');
            }
            prefix.push_str(segment);

            let is_dir = i < last || last_is_dir;
            let child = current
                .children
                .entry((*segment).to_string())
                .or_insert_with(|| TreeNode::new((*segment).to_string(), prefix.clone(), is_dir));
            // Only ever promote: a directory never turns back into a leaf
            if is_dir {
                child.is_dir = true;
            }
            current = child;
        }
    }

    /// Find a child node by segment name
    pub fn child(&self, name: &str) -> Option<&TreeNode> {
        self.children.get(name)
    }

    /// Find a node by its full slash-delimited path
    pub fn find(&self, path: &str) -> Option<&TreeNode> {
        path.split('/')
            .try_fold(self, |node, segment| node.children.get(segment))
    }

    /// Children ordered for display: directories first, then files, each by name
    pub fn sorted_children(&self) -> Vec<&TreeNode> {
        let mut children: Vec<&TreeNode> = self.children.values().collect();
        children.sort_by(|a, b| match (a.is_dir, b.is_dir) {
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            _ => a.name.cmp(&b.name),
        });
        children
    }

    /// Count descendant leaves. Sub-repository markers count as one entry each.
    pub fn file_count(&self, sub_repos: &HashSet<String>) -> usize {
        self.children
            .values()
            .map(|child| {
                if sub_repos.contains(&child.path) || !child.is_dir {
                    1
                } else {
                    child.file_count(sub_repos)
                }
            })
            .sum()
    }

    /// True when the node has exactly one child and that child is a directory
    pub fn has_single_dir_child(&self) -> bool {
        self.children.len() == 1 && self.children.values().all(|child| child.is_dir)
    }
}

/// Build a tree from a flat list of slash-delimited paths
pub fn build<S: AsRef<str>>(paths: &[S]) -> TreeNode {
    let mut root = TreeNode::root();
    for path in paths {
        root.insert_path(path.as_ref());
    }
    root
}

/// Graft marker paths into a tree as directory nodes
pub fn insert_markers<S: AsRef<str>>(root: &mut TreeNode, markers: &[S]) {
    for marker in markers {
        root.insert_marker(marker.as_ref());
    }
}

/// One row of the display sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatItem {
    pub path: String,
    pub name: String,
    pub is_dir: bool,
    pub depth: usize,
    pub is_expanded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_sub_repo: bool,
}

impl FlatItem {
    /// A row for the repository list
    pub fn repo(path: String, label: String, description: String) -> Self {
        Self {
            path,
            name: label.clone(),
            is_dir: false,
            depth: 0,
            is_expanded: false,
            file_count: None,
            label: Some(label),
            description: Some(description),
            is_sub_repo: false,
        }
    }

    /// True for rows the cursor may land on in tree mode
    pub fn is_selectable_file(&self) -> bool {
        !self.is_dir
    }
}

/// Expansion context threaded through a flatten pass
#[derive(Debug, Clone, Copy)]
pub struct FlattenOptions<'a> {
    pub auto_expand: bool,
    pub expanded_dirs: &'a HashSet<String>,
    pub manually_collapsed: &'a HashSet<String>,
    pub sub_repos: &'a HashSet<String>,
}

/// Flatten the children of `node` into display rows starting at `depth`
pub fn flatten(node: &TreeNode, depth: usize, options: &FlattenOptions) -> Vec<FlatItem> {
    let mut items = Vec::new();
    flatten_into(node, depth, options, &mut items);
    items
}

fn flatten_into(node: &TreeNode, depth: usize, options: &FlattenOptions, items: &mut Vec<FlatItem>) {
    let force_expand = node.has_single_dir_child();

    for child in node.sorted_children() {
        // Markers win over every expansion rule
        if options.sub_repos.contains(&child.path) {
            items.push(FlatItem {
                path: child.path.clone(),
                name: child.name.clone(),
                is_dir: false,
                depth,
                is_expanded: false,
                file_count: None,
                label: None,
                description: None,
                is_sub_repo: true,
            });
            continue;
        }

        let is_expanded = child.is_dir && is_expanded(child, force_expand, options);

        items.push(FlatItem {
            path: child.path.clone(),
            name: child.name.clone(),
            is_dir: child.is_dir,
            depth,
            is_expanded,
            file_count: child.is_dir.then(|| child.file_count(options.sub_repos)),
            label: None,
            description: None,
            is_sub_repo: false,
        });

        if is_expanded {
            flatten_into(child, depth + 1, options, items);
        }
    }
}

fn is_expanded(dir: &TreeNode, force_expand: bool, options: &FlattenOptions) -> bool {
    if force_expand {
        true
    } else if options.auto_expand {
        !options.manually_collapsed.contains(&dir.path)
    } else {
        options.expanded_dirs.contains(&dir.path)
    }
}

/// Every ancestor directory of a path, outermost first
pub fn ancestors(path: &str) -> Vec<String> {
    path.match_indices('/')
        .map(|(idx, _)| path[..idx].to_string())
        .collect()
}
