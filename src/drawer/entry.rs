use crate::apps::AppInfo;

/// Name given to folders created by dropping one app onto another.
pub const DEFAULT_FOLDER_NAME: &str = "Folder";

#[derive(Debug, Clone, PartialEq)]
pub struct Folder {
    pub name: String,
    pub apps: Vec<AppInfo>,
}

/// One slot of the drawer or the pinned row.
///
/// A folder is never empty; loading and every mutation below uphold that.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    App(AppInfo),
    Folder(Folder),
}

impl Entry {
    pub fn label(&self) -> &str {
        match self {
            Entry::App(app) => &app.name,
            Entry::Folder(folder) => &folder.name,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Entry::Folder(_))
    }

    pub fn as_app(&self) -> Option<&AppInfo> {
        match self {
            Entry::App(app) => Some(app),
            Entry::Folder(_) => None,
        }
    }
}

/// Move the entry at `from` so it ends up at index `to`, shifting the
/// entries in between. Out-of-range indices leave the sequence untouched.
pub fn reorder(entries: &mut Vec<Entry>, from: usize, to: usize) -> bool {
    if from >= entries.len() || to >= entries.len() {
        return false;
    }
    if from == to {
        return false;
    }
    let entry = entries.remove(from);
    entries.insert(to, entry);
    true
}

/// Merge the app at `from` onto the app at `to`, producing a folder holding
/// `[dragged, target]` in the target's slot. The source slot is removed
/// afterwards, so the folder keeps the target's position in the sequence.
///
/// Fails without mutating when either index is out of range, the indices
/// are equal, or either slot is not a plain app.
pub fn merge_apps(entries: &mut Vec<Entry>, from: usize, to: usize) -> bool {
    if from >= entries.len() || to >= entries.len() || from == to {
        return false;
    }
    let (Entry::App(dragged), Entry::App(target)) = (&entries[from], &entries[to]) else {
        return false;
    };
    let folder = Folder {
        name: DEFAULT_FOLDER_NAME.to_string(),
        apps: vec![dragged.clone(), target.clone()],
    };
    entries[to] = Entry::Folder(folder);
    entries.remove(from);
    true
}

/// Append the app at `from` to the folder at `to` and remove the source
/// slot. Fails without mutating unless `from` is an app and `to` a folder.
pub fn add_to_folder(entries: &mut Vec<Entry>, from: usize, to: usize) -> bool {
    if from >= entries.len() || to >= entries.len() || from == to {
        return false;
    }
    let Entry::App(dragged) = entries[from].clone() else {
        return false;
    };
    let Entry::Folder(folder) = &mut entries[to] else {
        return false;
    };
    folder.apps.push(dragged);
    entries.remove(from);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(id: &str) -> AppInfo {
        AppInfo {
            name: id.to_uppercase(),
            id: id.to_string(),
            exec: id.to_string(),
            icon: None,
        }
    }

    fn apps(ids: &[&str]) -> Vec<Entry> {
        ids.iter().map(|id| Entry::App(app(id))).collect()
    }

    fn ids(entries: &[Entry]) -> Vec<String> {
        entries
            .iter()
            .map(|e| match e {
                Entry::App(a) => a.id.clone(),
                Entry::Folder(f) => format!("[{}]", f.apps.iter().map(|a| a.id.as_str()).collect::<Vec<_>>().join(",")),
            })
            .collect()
    }

    #[test]
    fn reorder_preserves_relative_order_of_the_rest() {
        let mut entries = apps(&["a", "b", "c", "d", "e"]);
        assert!(reorder(&mut entries, 1, 3));
        assert_eq!(ids(&entries), ["a", "c", "d", "b", "e"]);

        let mut entries = apps(&["a", "b", "c", "d", "e"]);
        assert!(reorder(&mut entries, 3, 0));
        assert_eq!(ids(&entries), ["d", "a", "b", "c", "e"]);
    }

    #[test]
    fn reorder_out_of_bounds_is_a_no_op() {
        let mut entries = apps(&["a", "b"]);
        let before = entries.clone();
        assert!(!reorder(&mut entries, 0, 5));
        assert!(!reorder(&mut entries, 5, 0));
        assert!(!reorder(&mut entries, 1, 1));
        assert_eq!(entries, before);
    }

    #[test]
    fn merge_creates_folder_at_target_slot() {
        let mut entries = apps(&["a", "b", "c", "d"]);
        assert!(merge_apps(&mut entries, 0, 2));
        assert_eq!(entries.len(), 3);
        let Entry::Folder(folder) = &entries[1] else {
            panic!("expected folder at the target's slot");
        };
        assert_eq!(folder.name, DEFAULT_FOLDER_NAME);
        assert_eq!(folder.apps, vec![app("a"), app("c")]);
        assert_eq!(entries[0], Entry::App(app("b")));
        assert_eq!(entries[2], Entry::App(app("d")));
    }

    #[test]
    fn merge_with_source_after_target_keeps_target_index() {
        let mut entries = apps(&["a", "b", "c", "d"]);
        assert!(merge_apps(&mut entries, 3, 1));
        let Entry::Folder(folder) = &entries[1] else {
            panic!("expected folder");
        };
        assert_eq!(folder.apps, vec![app("d"), app("b")]);
        assert_eq!(entries.len(), 3);
    }

    #[test]
    fn merge_refuses_folders_and_bad_indices() {
        let mut entries = apps(&["a", "b"]);
        entries.push(Entry::Folder(Folder {
            name: "Games".into(),
            apps: vec![app("c")],
        }));
        let before = entries.clone();
        assert!(!merge_apps(&mut entries, 0, 2));
        assert!(!merge_apps(&mut entries, 2, 0));
        assert!(!merge_apps(&mut entries, 0, 0));
        assert!(!merge_apps(&mut entries, 0, 9));
        assert_eq!(entries, before);
    }

    #[test]
    fn add_to_folder_appends_and_removes_source() {
        let mut entries = vec![
            Entry::App(app("a")),
            Entry::Folder(Folder {
                name: "Tools".into(),
                apps: vec![app("x"), app("y")],
            }),
        ];
        assert!(add_to_folder(&mut entries, 0, 1));
        assert_eq!(entries.len(), 1);
        let Entry::Folder(folder) = &entries[0] else {
            panic!("expected folder");
        };
        assert_eq!(folder.name, "Tools");
        assert_eq!(folder.apps, vec![app("x"), app("y"), app("a")]);
    }

    #[test]
    fn add_to_folder_rejects_non_folder_target() {
        let mut entries = apps(&["a", "b"]);
        let before = entries.clone();
        assert!(!add_to_folder(&mut entries, 0, 1));
        assert_eq!(entries, before);
    }
}
