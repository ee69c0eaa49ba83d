use crate::openapi::PathItem;
use std::collections::BTreeMap;

/// Groups paths by their leading alphanumeric run (`/users/{p1}` and
/// `/users` share `users`). Operations of groups with two or more paths get
/// that tag unless they already carry tags.
pub fn suggest_tags(paths: &mut BTreeMap<String, PathItem>) {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for path in paths.keys() {
        let key = group_key(path);
        if !key.is_empty() {
            groups.entry(key.to_string()).or_default().push(path.clone());
        }
    }

    for (tag, members) in groups.into_iter().filter(|(_, members)| members.len() >= 2) {
        for path in members {
            let Some(item) = paths.get_mut(&path) else {
                continue;
            };
            for (_, op) in item.operations_mut() {
                if op.tags.is_empty() {
                    op.tags.push(tag.clone());
                }
            }
        }
    }
}

fn group_key(path: &str) -> &str {
    let trimmed = path.trim_start_matches('/');
    let end = trimmed
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(trimmed.len());
    &trimmed[..end]
}
