//! Link rendering inside sidenote text.
//!
//! Rewrites `[label](target)` tokens into link elements, at most once per
//! content version: a note whose rendered-flag is set is skipped until the
//! mutation watch clears the flag again.

use smol_str::SmolStr;

use crate::guard::MutationGuard;
use crate::host::SidenoteTree;
use crate::links::{could_contain_link, segments};

/// Convert link tokens in every unrendered note. Returns the number of link
/// elements created.
///
/// The edits run with `guard` raised. `settle` is called after the last edit
/// while the guard is still up; hosts that deliver mutation records
/// asynchronously use it to drop the records these edits produced.
pub fn render_links<T: SidenoteTree>(
    tree: &mut T,
    notes: &[T::Element],
    allowed: &[SmolStr],
    guard: &MutationGuard,
    settle: impl FnOnce(),
) -> usize {
    let _quiet = guard.suppress();

    let mut created = 0;
    for note in notes {
        if tree.is_rendered(note) {
            continue;
        }

        let mut changed = false;
        for unit in tree.text_units(note) {
            let Some(text) = tree.text(&unit) else {
                continue;
            };
            if !could_contain_link(&text) {
                continue;
            }
            let Some(pieces) = segments(&text, allowed) else {
                continue;
            };

            match tree.replace_text(&unit, &pieces) {
                Ok(()) => {
                    created += pieces.iter().filter(|p| p.is_link()).count();
                    changed = true;
                }
                Err(e) => tracing::warn!("failed to render links in sidenote: {}", e),
            }
        }

        // Notes without conversions stay unflagged so a later pass can retry
        // once their content is populated.
        if changed {
            if let Err(e) = tree.set_rendered(note, true) {
                tracing::warn!("failed to mark sidenote rendered: {}", e);
            }
        }
    }

    settle();
    created
}
