//! Directory tree derived from the discovered file list.

use std::collections::BTreeSet;

use crate::models::FolderNode;

/// Build the folder tree for `file_paths` (forward-slash, root-relative).
/// `file_count` counts the files directly inside each directory.
pub fn build_folder_tree(root_name: &str, file_paths: &[String]) -> FolderNode {
    let mut root = FolderNode {
        name: root_name.to_string(),
        path: String::new(),
        children: Vec::new(),
        file_count: 0,
    };

    for path in file_paths {
        let mut parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
        if parts.pop().is_none() {
            continue;
        }
        let mut node = &mut root;
        let mut prefix = String::new();
        for part in parts {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(part);
            let idx = match node.children.iter().position(|c| c.name == part) {
                Some(idx) => idx,
                None => {
                    node.children.push(FolderNode {
                        name: part.to_string(),
                        path: prefix.clone(),
                        children: Vec::new(),
                        file_count: 0,
                    });
                    node.children.len() - 1
                }
            };
            node = &mut node.children[idx];
        }
        node.file_count += 1;
    }

    sort_tree(&mut root);
    root
}

fn sort_tree(root: &mut FolderNode) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        node.children.sort_by(|a, b| a.name.cmp(&b.name));
        stack.extend(node.children.iter_mut());
    }
}

/// Every directory of the tree, both by bare name and by full relative path.
pub fn collect_all_dirs(tree: &FolderNode) -> BTreeSet<String> {
    let mut dirs = BTreeSet::new();
    let mut stack: Vec<&FolderNode> = tree.children.iter().collect();
    while let Some(node) = stack.pop() {
        dirs.insert(node.name.clone());
        dirs.insert(node.path.clone());
        stack.extend(node.children.iter());
    }
    dirs
}

/// Same as [`collect_all_dirs`] but straight from file paths.
pub fn dirs_from_paths(file_paths: &[String]) -> BTreeSet<String> {
    let mut dirs = BTreeSet::new();
    for path in file_paths {
        let parts: Vec<&str> = path.split('/').collect();
        let dir_parts = &parts[..parts.len().saturating_sub(1)];
        for i in 0..dir_parts.len() {
            dirs.insert(dir_parts[i].to_string());
            dirs.insert(dir_parts[..=i].join("/"));
        }
    }
    dirs
}

/// Whether a directory named `dir` exists anywhere in `dirs`.
pub fn dir_exists(dirs: &BTreeSet<String>, dir: &str) -> bool {
    dirs.iter()
        .any(|d| d == dir || d.ends_with(&format!("/{dir}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_build_folder_tree() {
        let tree = build_folder_tree(
            "app",
            &paths(&["src/index.ts", "src/hooks/useAuth.ts", "src/hooks/useUser.ts", "main.ts"]),
        );
        assert_eq!(tree.file_count, 1);
        assert_eq!(tree.children.len(), 1);
        let src = &tree.children[0];
        assert_eq!(src.name, "src");
        assert_eq!(src.file_count, 1);
        assert_eq!(src.children[0].path, "src/hooks");
        assert_eq!(src.children[0].file_count, 2);
    }

    #[test]
    fn test_dir_sets_agree() {
        let files = paths(&["src/features/auth/login.ts", "lib/a.ts"]);
        let tree = build_folder_tree("root", &files);
        assert_eq!(collect_all_dirs(&tree), dirs_from_paths(&files));
        let dirs = dirs_from_paths(&files);
        assert!(dir_exists(&dirs, "auth"));
        assert!(dir_exists(&dirs, "features/auth"));
        assert!(!dir_exists(&dirs, "hooks"));
    }

    #[test]
    fn test_deep_tree_does_not_recurse() {
        let deep: String = (0..2000).map(|i| format!("d{i}/")).collect::<String>() + "f.ts";
        let tree = build_folder_tree("root", &[deep]);
        // "d0" is both the first name and the first path.
        assert_eq!(collect_all_dirs(&tree).len(), 3999);
    }
}
