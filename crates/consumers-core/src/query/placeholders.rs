// crates/consumers-core/src/query/placeholders.rs
// ============================================================================
// Module: Placeholder Renumbering
// Description: Positional placeholder scanning and renumbering.
// Purpose: Let statement fragments be rendered at any placeholder offset.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Fragments are written with local placeholders starting at `$1`. Rendering
//! a fragment at offset `n` rewrites every `$k` token to `$(n + k)`. Tokens
//! are matched whole, so `$1` and `$12` never collide.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

// ============================================================================
// SECTION: Renumbering
// ============================================================================

/// Rewrites every `$k` placeholder in `fragment` to `$(offset + k)`.
#[must_use]
pub fn renumber(fragment: &str, offset: usize) -> String {
    let mut output = String::with_capacity(fragment.len() + 4);
    let mut rest = fragment;
    while let Some(position) = rest.find('$') {
        output.push_str(&rest[.. position]);
        let after = &rest[position + 1 ..];
        let digits = after.bytes().take_while(u8::is_ascii_digit).count();
        match after[.. digits].parse::<usize>() {
            Ok(index) if digits > 0 => {
                output.push('$');
                output.push_str(&(offset + index).to_string());
            }
            _ => {
                output.push('$');
                output.push_str(&after[.. digits]);
            }
        }
        rest = &after[digits ..];
    }
    output.push_str(rest);
    output
}

/// Returns the distinct placeholder indices referenced by `sql`.
#[must_use]
pub fn placeholder_indices(sql: &str) -> BTreeSet<usize> {
    sql.split('$')
        .skip(1)
        .filter_map(|segment| {
            let digits = segment.bytes().take_while(u8::is_ascii_digit).count();
            segment[.. digits].parse::<usize>().ok()
        })
        .collect()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
