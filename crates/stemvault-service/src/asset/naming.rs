//! Collision-free name generation for created folders and copies.

/// Pick a name for a new unnamed folder among its siblings.
///
/// `untitled folder` is used whenever it is free; once taken, later ones
/// count up from the highest existing suffix (`untitled folder 2`,
/// `untitled folder 3`, ...), so deleting a numbered folder in the middle
/// never recycles a name still in use. Matching is case-insensitive.
pub fn untitled_folder_name<S: AsRef<str>>(siblings: &[S]) -> String {
    const BASE: &str = "untitled folder";

    let mut bare_taken = false;
    let mut highest = 1u64;
    for name in siblings {
        let lower = name.as_ref().to_lowercase();
        let Some(rest) = lower.strip_prefix(BASE) else {
            continue;
        };
        if rest.is_empty() {
            bare_taken = true;
        } else if let Some(n) = rest.strip_prefix(' ').and_then(|s| s.parse::<u64>().ok()) {
            highest = highest.max(n);
        }
    }

    if bare_taken {
        format!("{BASE} {}", highest + 1)
    } else {
        BASE.to_string()
    }
}

/// Pick a title for a copy of `title`, avoiding the given existing titles.
///
/// Tries `Title (copy)` first, then `Title (copy 2)`, `Title (copy 3)` and
/// so on, taking the lowest unused suffix. Matching is case-insensitive.
pub fn copy_title<S: AsRef<str>>(title: &str, existing: &[S]) -> String {
    let taken = |candidate: &str| {
        let lower = candidate.to_lowercase();
        existing.iter().any(|t| t.as_ref().to_lowercase() == lower)
    };

    let first = format!("{title} (copy)");
    if !taken(&first) {
        return first;
    }
    let mut n = 2u64;
    loop {
        let candidate = format!("{title} (copy {n})");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
